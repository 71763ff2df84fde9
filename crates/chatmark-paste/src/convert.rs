use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

use crate::node::{NodeKind, classify};

/// Caret surroundings in the target textarea, used to decide whether a
/// single-line code paste may be wrapped in backticks.
#[derive(Clone, Debug)]
pub struct TextareaContext {
    pub value: String,
    pub caret: usize,
}

impl TextareaContext {
    fn backtick_at_caret(&self) -> bool {
        let caret = self.caret.min(self.value.len());
        let before = self.value.get(..caret).unwrap_or("");
        let after = self.value.get(caret..).unwrap_or("");
        before.ends_with('`') || after.starts_with('`')
    }
}

struct WalkCtx {
    caret_adjacent_backtick: bool,
}

/// Converts clipboard HTML into markdown-ish message source.
///
/// Input with no markup at all is returned as its literal text, unchanged;
/// the walk never fails on malformed HTML.
pub fn paste_handler_converter(html: &str, context: Option<&TextareaContext>) -> String {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();
    if !subtree_has_markup(root) {
        return root.text().collect();
    }
    let ctx = WalkCtx {
        caret_adjacent_backtick: context.is_some_and(TextareaContext::backtick_at_caret),
    };
    convert_block_children(root, &ctx).trim().to_string()
}

fn subtree_has_markup(root: ElementRef) -> bool {
    root.descendants()
        .skip(1)
        .any(|node| node.value().is_element())
}

fn convert_block_children(el: ElementRef, ctx: &WalkCtx) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut inline = String::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_inline_text(&mut inline, &text.text),
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                match classify(child_el) {
                    NodeKind::Heading(level) => {
                        flush_inline(&mut blocks, &mut inline);
                        let title = convert_inline_children(child_el, ctx);
                        blocks.push(format!(
                            "{} {}",
                            "#".repeat(usize::from(level)),
                            title.trim()
                        ));
                    }
                    NodeKind::Paragraph => {
                        flush_inline(&mut blocks, &mut inline);
                        let body = convert_block_children(child_el, ctx);
                        if !body.trim().is_empty() {
                            blocks.push(body.trim().to_string());
                        }
                    }
                    NodeKind::List { .. } => {
                        flush_inline(&mut blocks, &mut inline);
                        let list = convert_list(child_el, ctx, 0);
                        if !list.is_empty() {
                            blocks.push(list);
                        }
                    }
                    NodeKind::CodeBlock => {
                        flush_inline(&mut blocks, &mut inline);
                        blocks.push(convert_pre(child_el, ctx));
                    }
                    NodeKind::Math { display: true } => {
                        flush_inline(&mut blocks, &mut inline);
                        blocks.push(convert_math(child_el, true));
                    }
                    NodeKind::Table => {
                        flush_inline(&mut blocks, &mut inline);
                        let table = convert_table(child_el);
                        if !table.is_empty() {
                            blocks.push(table);
                        }
                    }
                    NodeKind::ListItem => {
                        // A stray li without its list wrapper still reads
                        // as a line of its own.
                        flush_inline(&mut blocks, &mut inline);
                        let body = convert_inline_children(child_el, ctx);
                        if !body.trim().is_empty() {
                            blocks.push(body.trim().to_string());
                        }
                    }
                    NodeKind::Ignored => {}
                    NodeKind::LineBreak => {
                        // A bare <br> between blocks adds nothing beyond
                        // the paragraph join.
                        if !inline.trim().is_empty() {
                            inline.push('\n');
                        }
                    }
                    _ => inline.push_str(&convert_inline_element(child_el, ctx)),
                }
            }
            _ => {}
        }
    }
    flush_inline(&mut blocks, &mut inline);
    blocks.join("\n\n")
}

fn flush_inline(blocks: &mut Vec<String>, inline: &mut String) {
    let text = std::mem::take(inline);
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        blocks.push(trimmed.to_string());
    }
}

// Source HTML indents lines after a <br>; that indentation is layout, not
// content, so it is dropped when the run already ends in a newline.
fn push_inline_text(out: &mut String, text: &str) {
    let collapsed = collapse_ws(text);
    if out.ends_with('\n') {
        out.push_str(collapsed.trim_start());
    } else {
        out.push_str(&collapsed);
    }
}

fn convert_inline_element(el: ElementRef, ctx: &WalkCtx) -> String {
    match classify(el) {
        NodeKind::Strong => wrap_emphasis("**", el, ctx),
        NodeKind::Em => wrap_emphasis("*", el, ctx),
        NodeKind::Del => wrap_emphasis("~~", el, ctx),
        NodeKind::InlineCode => {
            let text: String = el.text().collect();
            if text.is_empty() {
                String::new()
            } else {
                format!("`{}`", text)
            }
        }
        NodeKind::Link => {
            let href = el.value().attr("href").unwrap_or("");
            let text = convert_inline_children(el, ctx);
            let label = text.trim();
            if href.is_empty() {
                text
            } else if label == href {
                href.to_string()
            } else {
                format!("[{}]({})", label, href)
            }
        }
        NodeKind::Image => {
            let src = el.value().attr("src").unwrap_or("");
            let alt = el.value().attr("alt").unwrap_or("");
            if src.is_empty() {
                alt.to_string()
            } else if alt.is_empty() {
                src.to_string()
            } else {
                format!("[{}]({})", alt, src)
            }
        }
        NodeKind::Emoji => convert_emoji(el),
        NodeKind::Math { display } => convert_math(el, display),
        NodeKind::LineBreak => "\n".to_string(),
        NodeKind::CodeBlock => convert_pre(el, ctx),
        NodeKind::Ignored => String::new(),
        NodeKind::Heading(_)
        | NodeKind::Paragraph
        | NodeKind::List { .. }
        | NodeKind::ListItem
        | NodeKind::Table
        | NodeKind::Generic => convert_inline_children(el, ctx),
    }
}

fn convert_inline_children(el: ElementRef, ctx: &WalkCtx) -> String {
    let mut out = String::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_inline_text(&mut out, &text.text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    out.push_str(&convert_inline_element(child_el, ctx));
                }
            }
            _ => {}
        }
    }
    out
}

fn wrap_emphasis(marker: &str, el: ElementRef, ctx: &WalkCtx) -> String {
    let inner = convert_inline_children(el, ctx);
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return inner;
    }
    format!("{}{}{}", marker, trimmed, marker)
}

fn convert_emoji(el: ElementRef) -> String {
    if el.value().name() == "img" {
        if let Some(alt) = el.value().attr("alt") {
            if alt.starts_with(':') && alt.ends_with(':') && alt.len() > 1 {
                return alt.to_string();
            }
            return format!(":{}:", alt);
        }
    }
    let text: String = el.text().collect();
    let trimmed = text.trim();
    if trimmed.starts_with(':') && trimmed.ends_with(':') && trimmed.len() > 1 {
        return trimmed.to_string();
    }
    if let Some(title) = el.value().attr("title") {
        return format!(":{}:", title.replace(' ', "_"));
    }
    text
}

static TEX_ANNOTATION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"annotation[encoding="application/x-tex"]"#).expect("static selector")
});

fn convert_math(el: ElementRef, display: bool) -> String {
    // The annotation carries the original source verbatim, so consecutive
    // newlines in block math survive the round trip.
    let tex: String = match el.select(&TEX_ANNOTATION).next() {
        Some(annotation) => annotation.text().collect(),
        None => el.text().collect(),
    };
    if display {
        format!("$$\n{}\n$$", tex)
    } else {
        format!("$${}$$", tex)
    }
}

fn convert_pre(el: ElementRef, ctx: &WalkCtx) -> String {
    let code_el = el
        .children()
        .find_map(|child| ElementRef::wrap(child).filter(|e| e.value().name() == "code"));
    let text: String = match code_el {
        Some(code) => code.text().collect(),
        None => el.text().collect(),
    };
    let text = text.trim_end_matches('\n');
    if let Some(lang) = detect_language(el, code_el) {
        return format!("```{}\n{}\n```", lang, text);
    }
    if !text.contains('\n') {
        // Single line, no language: collapse to inline code, unless the
        // caret already touches a backtick and wrapping would produce
        // triple-backtick adjacency.
        if ctx.caret_adjacent_backtick {
            return text.to_string();
        }
        return format!("`{}`", text);
    }
    format!("```\n{}\n```", text)
}

fn detect_language(pre: ElementRef, code: Option<ElementRef>) -> Option<String> {
    for el in code.into_iter().chain(std::iter::once(pre)) {
        if let Some(class) = el.value().attr("class") {
            for entry in class.split_whitespace() {
                if let Some(lang) = entry.strip_prefix("language-") {
                    if !lang.is_empty() {
                        return Some(lang.to_string());
                    }
                }
            }
        }
    }
    // Rendered-message form: <div class="codehilite" data-code-language=...>
    let parent = pre.parent().and_then(ElementRef::wrap)?;
    parent
        .value()
        .attr("data-code-language")
        .map(|value| value.to_string())
}

fn convert_list(el: ElementRef, ctx: &WalkCtx, depth: usize) -> String {
    let ordered = matches!(classify(el), NodeKind::List { ordered: true });
    let mut number: u64 = el
        .value()
        .attr("start")
        .and_then(|value| value.parse().ok())
        .unwrap_or(1);
    let indent = "  ".repeat(depth);
    let mut lines: Vec<String> = Vec::new();
    for child in el.children() {
        let Some(item) = ElementRef::wrap(child) else {
            continue;
        };
        match classify(item) {
            NodeKind::ListItem => {}
            NodeKind::List { .. } => {
                lines.push(convert_list(item, ctx, depth + 1));
                continue;
            }
            _ => continue,
        }
        let mut content = String::new();
        let mut nested: Vec<String> = Vec::new();
        for part in item.children() {
            match part.value() {
                Node::Text(text) => content.push_str(&collapse_ws(&text.text)),
                Node::Element(_) => {
                    let Some(part_el) = ElementRef::wrap(part) else {
                        continue;
                    };
                    match classify(part_el) {
                        NodeKind::List { .. } => {
                            nested.push(convert_list(part_el, ctx, depth + 1));
                        }
                        NodeKind::Paragraph => {
                            content.push_str(&convert_inline_children(part_el, ctx));
                        }
                        _ => content.push_str(&convert_inline_element(part_el, ctx)),
                    }
                }
                _ => {}
            }
        }
        let marker = if ordered {
            let marker = format!("{}. ", number);
            number += 1;
            marker
        } else {
            "* ".to_string()
        };
        lines.push(format!("{}{}{}", indent, marker, content.trim()));
        lines.extend(nested);
    }
    lines.join("\n")
}

static TABLE_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("static selector"));
static TABLE_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("static selector"));

fn convert_table(el: ElementRef) -> String {
    let mut rows = Vec::new();
    for row in el.select(&TABLE_ROW) {
        let cells: Vec<String> = row
            .select(&TABLE_CELL)
            .map(|cell| {
                let text: String = cell.text().collect();
                collapse_ws(&text).trim().to_string()
            })
            .collect();
        if !cells.is_empty() {
            rows.push(cells.join("\t"));
        }
    }
    rows.join("\n")
}

fn collapse_ws(text: &str) -> String {
    let mut out = String::new();
    let mut in_whitespace = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
                in_whitespace = true;
            }
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}
