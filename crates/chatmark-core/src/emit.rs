use std::collections::{HashMap, HashSet};

use ammonia::Builder;

use crate::ast::{Block, Inline, List};
use crate::hash::{by_stream_topic_url, by_stream_url};
use crate::helper::HelperConfig;
use crate::linkifier::LinkifierTable;
use crate::parser::parse;

/// Renders raw message source to sanitized HTML: parse plus
/// `emit_html_sanitized`.
pub fn render(raw_content: &str, helper: &HelperConfig, linkifiers: &LinkifierTable) -> String {
    emit_html_sanitized(&parse(raw_content, helper, linkifiers))
}

/// Emits raw, un-sanitized HTML from a slice of blocks.
pub fn emit_html(blocks: &[Block]) -> String {
    let mut writer = HtmlWriter::new();
    for block in blocks {
        emit_block(&mut writer, block);
    }
    writer.finish()
}

/// Emits HTML and sanitizes it against an allow-list covering the engine's
/// own markup shapes.
pub fn emit_html_sanitized(blocks: &[Block]) -> String {
    let raw_html = emit_html(blocks);

    let tags: HashSet<&'static str> = [
        "a",
        "annotation",
        "blockquote",
        "br",
        "code",
        "del",
        "div",
        "em",
        "img",
        "li",
        "ol",
        "p",
        "pre",
        "span",
        "strong",
        "ul",
    ]
    .iter()
    .copied()
    .collect();

    let mut generic_attributes: HashSet<&'static str> = HashSet::new();
    generic_attributes.insert("class");
    generic_attributes.insert("title");

    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", ["href", "data-stream-id"].iter().copied().collect());
    tag_attributes.insert(
        "span",
        ["aria-label", "role", "data-user-id", "data-user-group-id"]
            .iter()
            .copied()
            .collect(),
    );
    tag_attributes.insert("img", ["alt", "src"].iter().copied().collect());
    tag_attributes.insert("ol", ["start"].iter().copied().collect());
    tag_attributes.insert("div", ["data-code-language"].iter().copied().collect());
    tag_attributes.insert("annotation", ["encoding"].iter().copied().collect());

    let mut generic_attribute_prefixes = HashSet::new();
    generic_attribute_prefixes.insert("data-");

    Builder::new()
        .tags(tags)
        .generic_attributes(generic_attributes)
        .tag_attributes(tag_attributes)
        .generic_attribute_prefixes(generic_attribute_prefixes)
        .link_rel(None)
        .clean(&raw_html)
        .to_string()
}

struct HtmlWriter {
    out: String,
    indent: usize,
}

impl HtmlWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn finish(mut self) -> String {
        if self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out
    }
}

fn emit_block(writer: &mut HtmlWriter, block: &Block) {
    match block {
        Block::Paragraph { content } => {
            writer.line(&format!("<p>{}</p>", render_inlines(content)));
        }
        Block::CodeBlock { lang, text } => {
            let escaped = escape_html(text);
            match lang {
                Some(lang) => {
                    writer.out.push_str(&format!(
                        "<div class=\"codehilite\" data-code-language=\"{}\"><pre><code>",
                        escape_attr(lang)
                    ));
                    writer.out.push_str(&escaped);
                    if !escaped.ends_with('\n') {
                        writer.out.push('\n');
                    }
                    writer.out.push_str("</code></pre></div>\n");
                }
                None => {
                    writer.out.push_str("<pre><code>");
                    writer.out.push_str(&escaped);
                    if !escaped.ends_with('\n') {
                        writer.out.push('\n');
                    }
                    writer.out.push_str("</code></pre>\n");
                }
            }
        }
        Block::MathBlock { tex } => {
            // The annotation carries the verbatim source, blank lines and
            // all; the paste converter reads it back out.
            writer.line(&format!(
                "<p><span class=\"katex-display\"><span class=\"katex\">\
<annotation encoding=\"application/x-tex\">{}</annotation></span></span></p>",
                escape_html(tex)
            ));
        }
        Block::BlockQuote { blocks } => {
            writer.line("<blockquote>");
            writer.indent += 1;
            for child in blocks {
                emit_block(writer, child);
            }
            writer.indent -= 1;
            writer.line("</blockquote>");
        }
        Block::List(List {
            ordered,
            start,
            items,
        }) => {
            let tag = if *ordered { "ol" } else { "ul" };
            let start_attr = if *ordered && *start != 1 {
                format!(" start=\"{}\"", start)
            } else {
                String::new()
            };
            writer.line(&format!("<{}{}>", tag, start_attr));
            writer.indent += 1;
            for item in items {
                writer.line(&format!("<li>{}</li>", render_inlines(item)));
            }
            writer.indent -= 1;
            writer.line(&format!("</{}>", tag));
        }
    }
}

fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::CodeSpan(text) => {
                out.push_str("<code>");
                out.push_str(&escape_html(text));
                out.push_str("</code>");
            }
            Inline::Strong(children) => {
                out.push_str("<strong>");
                out.push_str(&render_inlines(children));
                out.push_str("</strong>");
            }
            Inline::Emph(children) => {
                out.push_str("<em>");
                out.push_str(&render_inlines(children));
                out.push_str("</em>");
            }
            Inline::Strikethrough(children) => {
                out.push_str("<del>");
                out.push_str(&render_inlines(children));
                out.push_str("</del>");
            }
            Inline::HardBreak => out.push_str("<br>\n"),
            Inline::Link { url, text } => {
                out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape_url_attr(url),
                    escape_html(text)
                ));
            }
            Inline::Linkified { text, url } => {
                out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape_url_attr(url),
                    escape_html(text)
                ));
            }
            Inline::UserMention {
                user_id,
                name,
                silent,
            } => {
                let class = if *silent {
                    "user-mention silent"
                } else {
                    "user-mention"
                };
                let id_attr = match user_id {
                    Some(id) => id.to_string(),
                    None => "*".to_string(),
                };
                let display = if *silent {
                    escape_html(name)
                } else {
                    format!("@{}", escape_html(name))
                };
                out.push_str(&format!(
                    "<span class=\"{}\" data-user-id=\"{}\">{}</span>",
                    class, id_attr, display
                ));
            }
            Inline::GroupMention {
                group_id,
                name,
                silent,
            } => {
                let class = if *silent {
                    "user-group-mention silent"
                } else {
                    "user-group-mention"
                };
                let display = if *silent {
                    escape_html(name)
                } else {
                    format!("@{}", escape_html(name))
                };
                out.push_str(&format!(
                    "<span class=\"{}\" data-user-group-id=\"{}\">{}</span>",
                    class, group_id, display
                ));
            }
            Inline::StreamLink { stream_id, name } => {
                out.push_str(&format!(
                    "<a class=\"stream\" data-stream-id=\"{}\" href=\"{}\">#{}</a>",
                    stream_id,
                    escape_url_attr(&by_stream_url(*stream_id, name)),
                    escape_html(name)
                ));
            }
            Inline::StreamTopicLink {
                stream_id,
                name,
                topic,
            } => {
                out.push_str(&format!(
                    "<a class=\"stream-topic\" data-stream-id=\"{}\" href=\"{}\">#{} &gt; {}</a>",
                    stream_id,
                    escape_url_attr(&by_stream_topic_url(*stream_id, name, topic)),
                    escape_html(name),
                    escape_html(topic)
                ));
            }
            Inline::UnicodeEmoji { name, codepoint } => {
                out.push_str(&format!(
                    "<span aria-label=\"{name}\" class=\"emoji emoji-{codepoint}\" \
role=\"img\" title=\"{name}\">:{name}:</span>",
                    name = escape_attr(name),
                    codepoint = escape_attr(codepoint)
                ));
            }
            Inline::RealmEmoji { name, url } => {
                out.push_str(&format!(
                    "<img alt=\":{name}:\" class=\"emoji\" src=\"{src}\" title=\"{name}\">",
                    name = escape_attr(name),
                    src = escape_url_attr(url)
                ));
            }
            Inline::MathInline { tex } => {
                out.push_str(&format!(
                    "<span class=\"katex\"><annotation encoding=\"application/x-tex\">{}</annotation></span>",
                    escape_html(tex)
                ));
            }
        }
    }
    out
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

fn escape_attr(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_url_attr(text: &str) -> String {
    let mut encoded = String::new();
    for &byte in text.as_bytes() {
        match byte {
            b' ' => encoded.push_str("%20"),
            b'\\' => encoded.push_str("%5C"),
            0x00..=0x1F | 0x7F..=0xFF => {
                encoded.push_str(&format!("%{:02X}", byte));
            }
            _ => encoded.push(byte as char),
        }
    }
    escape_attr(&encoded)
}
