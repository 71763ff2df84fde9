use chatmark_core::{HelperConfig, decode_stream_topic_from_url};
use tracing::debug;

/// Rewrites a pasted same-realm narrow URL into `#**Stream>Topic**`
/// syntax, or a markdown link fallback when the compact syntax would
/// break. Returns None when the URL is foreign, malformed, or references
/// an unknown stream; the caller should then insert the raw text.
pub fn try_stream_topic_syntax_text(url: &str, helper: &HelperConfig) -> Option<String> {
    let stream_topic = decode_stream_topic_from_url(url, helper)?;
    let Some(stream) = helper.stream_by_id(stream_topic.stream_id) else {
        debug!(url, "narrow url did not resolve to a known stream");
        return None;
    };
    let stream_name = stream.name.as_str();
    let topic = stream_topic.topic.as_str();

    if breaks_stream_topic_syntax(stream_name) || breaks_stream_topic_syntax(topic) {
        let marker = if stream_topic.near.is_some() {
            " @ \u{1F4AC}"
        } else {
            ""
        };
        return Some(format!(
            "[#{} > {}{}]({})",
            escape_stream_topic_characters(stream_name),
            escape_stream_topic_characters(topic),
            marker,
            url
        ));
    }
    Some(format!("#**{}>{}**", stream_name, topic))
}

// Characters that corrupt the compact `#**Stream>Topic**` syntax when they
// appear in either operand.
fn breaks_stream_topic_syntax(text: &str) -> bool {
    text.chars()
        .any(|ch| matches!(ch, '`' | '*' | '$' | '>' | '&' | '<' | '[' | ']'))
}

fn escape_stream_topic_characters(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '`' => out.push_str("&#96;"),
            '*' => out.push_str("&#42;"),
            '$' => out.push_str("&#36;"),
            '[' => out.push_str("&#91;"),
            ']' => out.push_str("&#93;"),
            _ => out.push(ch),
        }
    }
    out
}
