use crate::helper::HelperConfig;

/// Encodes a narrow-URL hash component. Each byte outside the unreserved
/// set is replaced by `.` followed by two uppercase hex digits; `.` itself
/// is escaped so decoding is unambiguous and `decode(encode(s)) == s`
/// holds for every string.
pub fn encode_hash_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &byte in text.as_bytes() {
        if is_unreserved(byte) {
            out.push(byte as char);
        } else {
            out.push('.');
            out.push(hex_digit(byte >> 4));
            out.push(hex_digit(byte & 0x0F));
        }
    }
    out
}

/// Decodes a hash component. Returns None for malformed escapes or byte
/// sequences that are not valid UTF-8.
pub fn decode_hash_component(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'.' {
            if i + 2 >= bytes.len() {
                return None;
            }
            let hi = hex_value(bytes[i + 1])?;
            let lo = hex_value(bytes[i + 2])?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'-' | b'_' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

fn hex_digit(value: u8) -> char {
    match value {
        0..=9 => (b'0' + value) as char,
        _ => (b'A' + value - 10) as char,
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// The `<id>-<slug>` channel operand, e.g. `5-Denmark`.
pub fn stream_slug(stream_id: u64, stream_name: &str) -> String {
    let dashed: String = stream_name
        .chars()
        .map(|ch| if ch == ' ' { '-' } else { ch })
        .collect();
    format!("{}-{}", stream_id, encode_hash_component(&dashed))
}

pub fn by_stream_url(stream_id: u64, stream_name: &str) -> String {
    format!("#narrow/channel/{}", stream_slug(stream_id, stream_name))
}

pub fn by_stream_topic_url(stream_id: u64, stream_name: &str, topic: &str) -> String {
    format!(
        "#narrow/channel/{}/topic/{}",
        stream_slug(stream_id, stream_name),
        encode_hash_component(topic)
    )
}

/// The stream/topic coordinates recovered from a pasted narrow URL.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamTopic {
    pub stream_id: u64,
    pub topic: String,
    /// Message id from a `/near/<id>` (or `/with/<id>`) anchor.
    pub near: Option<u64>,
}

/// Parses a same-realm narrow URL of the shape
/// `<realm>/#narrow/channel/<id>-<slug>/topic/<encoded>[/near/<id>|/with/<id>]`.
///
/// Foreign origins, unknown streams and malformed shapes all yield None;
/// the caller is expected to leave the pasted text untouched in that case.
pub fn decode_stream_topic_from_url(url: &str, helper: &HelperConfig) -> Option<StreamTopic> {
    let rest = url.strip_prefix(helper.realm_url())?;
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    let rest = rest.strip_prefix("#narrow/")?;

    let mut segments = rest.split('/');
    match segments.next()? {
        "channel" | "stream" => {}
        _ => return None,
    }
    let slug = segments.next()?;
    let id_part = slug.split('-').next()?;
    let stream_id: u64 = id_part.parse().ok()?;

    if segments.next()? != "topic" {
        return None;
    }
    let topic = decode_hash_component(segments.next()?)?;

    let mut near = None;
    match segments.next() {
        None => {}
        Some("near") | Some("with") => {
            near = Some(segments.next()?.parse().ok()?);
            if segments.next().is_some() {
                return None;
            }
        }
        Some(_) => return None,
    }

    Some(StreamTopic {
        stream_id,
        topic,
        near,
    })
}
