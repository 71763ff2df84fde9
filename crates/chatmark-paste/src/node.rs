use scraper::ElementRef;

/// The closed set of element shapes the converter dispatches on. Raw DOM
/// elements are classified once, here, so the walk itself stays an
/// exhaustive match instead of an open-ended tag switch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum NodeKind {
    Heading(u8),
    Paragraph,
    List { ordered: bool },
    ListItem,
    Strong,
    Em,
    Del,
    InlineCode,
    CodeBlock,
    Link,
    Image,
    Emoji,
    Math { display: bool },
    LineBreak,
    Table,
    /// Elements with no textual content worth keeping (style, script,
    /// document metadata).
    Ignored,
    /// Anything else: transparent, recursed for its text.
    Generic,
}

pub(crate) fn classify(el: ElementRef) -> NodeKind {
    if has_class(el, "katex-display") {
        return NodeKind::Math { display: true };
    }
    if has_class(el, "katex") {
        return NodeKind::Math { display: false };
    }
    if has_class(el, "emoji") {
        return NodeKind::Emoji;
    }
    match el.value().name() {
        "h1" => NodeKind::Heading(1),
        "h2" => NodeKind::Heading(2),
        "h3" => NodeKind::Heading(3),
        "h4" => NodeKind::Heading(4),
        "h5" => NodeKind::Heading(5),
        "h6" => NodeKind::Heading(6),
        "p" | "div" => NodeKind::Paragraph,
        "ol" => NodeKind::List { ordered: true },
        "ul" => NodeKind::List { ordered: false },
        "li" => NodeKind::ListItem,
        "b" | "strong" => NodeKind::Strong,
        "i" | "em" => NodeKind::Em,
        "del" | "s" | "strike" => NodeKind::Del,
        "code" => NodeKind::InlineCode,
        "pre" => NodeKind::CodeBlock,
        "a" => NodeKind::Link,
        "img" => NodeKind::Image,
        "br" => NodeKind::LineBreak,
        "table" => NodeKind::Table,
        "style" | "script" | "head" | "meta" | "link" | "title" => NodeKind::Ignored,
        _ => NodeKind::Generic,
    }
}

pub(crate) fn has_class(el: ElementRef, class: &str) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|value| value.split_whitespace().any(|entry| entry == class))
}
