use crate::linkifier::{LinkifierTable, link_spans};

/// A link derived from a topic string, ordered by match position.
#[derive(Clone, Debug, PartialEq)]
pub struct TopicLink {
    pub text: String,
    pub url: String,
}

/// Applies linkifier matching to a topic string only. No mention, emoji or
/// markdown handling; duplicate URLs collapse to their first occurrence.
pub fn get_topic_links(topic: &str, linkifiers: &LinkifierTable) -> Vec<TopicLink> {
    let mut links: Vec<TopicLink> = Vec::new();
    for span in link_spans(topic, linkifiers) {
        if links.iter().any(|link| link.url == span.url) {
            continue;
        }
        links.push(TopicLink {
            text: span.text,
            url: span.url,
        });
    }
    links
}
