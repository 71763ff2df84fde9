use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("static selector"));

/// Classifies a clipboard payload as image-like rather than text.
///
/// The body qualifies when its meaningful children (whitespace-only text
/// nodes and one trailing `<br>` ignored) reduce to a single `<img>` or a
/// single `<table>`. Spreadsheet exports arrive as a lone table; pasting
/// those as literal markdown tables is worse than pasting an image. A
/// single table authored in a word processor is indistinguishable by DOM
/// shape and classifies the same way.
pub fn is_single_image(html: &str) -> bool {
    let document = Html::parse_document(html);
    let Some(body) = document.select(&BODY).next() else {
        return false;
    };
    let mut elements: Vec<ElementRef> = Vec::new();
    for child in body.children() {
        match child.value() {
            Node::Text(text) => {
                if !text.text.trim().is_empty() {
                    return false;
                }
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    elements.push(el);
                }
            }
            _ => {}
        }
    }
    if elements.len() > 1 && elements.last().is_some_and(|el| el.value().name() == "br") {
        elements.pop();
    }
    match elements.as_slice() {
        [only] => matches!(only.value().name(), "img" | "table"),
        _ => false,
    }
}

/// Rewrites known clipboard shapes into canonical HTML before conversion.
///
/// Currently that means IDE code exports: a single `white-space: pre`
/// styled `<div>` becomes one code block built from the plain-text
/// clipboard flavor.
pub fn maybe_transform_html(html: &str, plain_text: &str) -> String {
    if is_white_space_pre(html) {
        debug!("rewriting white-space:pre paste into a code block");
        return format!("<pre><code>{}</code></pre>", escape_html(plain_text));
    }
    html.to_string()
}

fn is_white_space_pre(html: &str) -> bool {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();
    let mut elements: Vec<ElementRef> = Vec::new();
    for child in root.children() {
        match child.value() {
            Node::Text(text) => {
                if !text.text.trim().is_empty() {
                    return false;
                }
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    elements.push(el);
                }
            }
            _ => {}
        }
    }
    match elements.as_slice() {
        [only] => {
            only.value().name() == "div"
                && only
                    .value()
                    .attr("style")
                    .is_some_and(style_declares_white_space_pre)
        }
        _ => false,
    }
}

fn style_declares_white_space_pre(style: &str) -> bool {
    style.split(';').any(|declaration| {
        let mut parts = declaration.splitn(2, ':');
        match (parts.next(), parts.next()) {
            (Some(property), Some(value)) => {
                property.trim().eq_ignore_ascii_case("white-space")
                    && value.trim().eq_ignore_ascii_case("pre")
            }
            _ => false,
        }
    })
}

fn escape_html(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
