mod ast;
mod emit;
mod hash;
mod helper;
mod linkifier;
mod parser;
mod topic;

pub use ast::{Block, Inline, InlineSeq, List};
pub use emit::{emit_html, emit_html_sanitized, render};
pub use hash::{
    StreamTopic, by_stream_topic_url, by_stream_url, decode_hash_component,
    decode_stream_topic_from_url, encode_hash_component, stream_slug,
};
pub use helper::{HelperConfig, Stream, User, UserGroup};
pub use linkifier::{LinkSpan, LinkifierError, LinkifierTable};
pub use parser::parse;
pub use topic::{TopicLink, get_topic_links};
