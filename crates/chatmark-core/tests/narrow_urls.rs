use chatmark_core::{
    HelperConfig, StreamTopic, by_stream_topic_url, by_stream_url, decode_hash_component,
    decode_stream_topic_from_url, encode_hash_component, stream_slug,
};

fn helper() -> HelperConfig {
    let mut helper = HelperConfig::new("http://zulip.zulipdev.com");
    helper.add_stream(4, "Rome");
    helper.add_stream(7, "social media");
    helper
}

#[test]
fn encoding_escapes_reserved_bytes_as_dot_hex() {
    assert_eq!(encode_hash_component("some topic"), "some.20topic");
    assert_eq!(encode_hash_component("old FAILED EXPORT"), "old.20FAILED.20EXPORT");
    assert_eq!(encode_hash_component("100% done."), "100.25.20done.2E");
    assert_eq!(encode_hash_component("a/b"), "a.2Fb");
    assert_eq!(encode_hash_component("café"), "caf.C3.A9");
}

#[test]
fn unreserved_characters_pass_through() {
    assert_eq!(encode_hash_component("ok-_!~*'()"), "ok-_!~*'()");
}

#[test]
fn decoding_inverts_encoding() {
    for topic in [
        "plain",
        "old FAILED EXPORT",
        "100% / §",
        "dots.and.more.dots",
        "emoji 💬 inside",
        "",
    ] {
        assert_eq!(
            decode_hash_component(&encode_hash_component(topic)).as_deref(),
            Some(topic)
        );
    }
}

#[test]
fn malformed_escapes_decode_to_none() {
    assert_eq!(decode_hash_component("abc."), None);
    assert_eq!(decode_hash_component("ab.G1"), None);
    assert_eq!(decode_hash_component("ab.1"), None);
    // Lone continuation byte is not valid UTF-8.
    assert_eq!(decode_hash_component(".C3"), None);
}

#[test]
fn stream_slug_dashes_spaces_before_encoding() {
    assert_eq!(stream_slug(7, "social media"), "7-social-media");
    assert_eq!(stream_slug(4, "Rome"), "4-Rome");
}

#[test]
fn narrow_url_shapes() {
    assert_eq!(by_stream_url(4, "Rome"), "#narrow/channel/4-Rome");
    assert_eq!(
        by_stream_topic_url(4, "Rome", "old FAILED EXPORT"),
        "#narrow/channel/4-Rome/topic/old.20FAILED.20EXPORT"
    );
}

#[test]
fn decode_same_realm_topic_url() {
    let url = "http://zulip.zulipdev.com/#narrow/channel/4-Rome/topic/old.20FAILED.20EXPORT";
    assert_eq!(
        decode_stream_topic_from_url(url, &helper()),
        Some(StreamTopic {
            stream_id: 4,
            topic: "old FAILED EXPORT".to_string(),
            near: None,
        })
    );
}

#[test]
fn decode_accepts_legacy_stream_segment() {
    let url = "http://zulip.zulipdev.com/#narrow/stream/4-Rome/topic/plans";
    assert_eq!(
        decode_stream_topic_from_url(url, &helper()).map(|st| st.stream_id),
        Some(4)
    );
}

#[test]
fn decode_reads_near_and_with_anchors() {
    let near = "http://zulip.zulipdev.com/#narrow/channel/4-Rome/topic/plans/near/12345";
    assert_eq!(
        decode_stream_topic_from_url(near, &helper()).and_then(|st| st.near),
        Some(12345)
    );
    let with = "http://zulip.zulipdev.com/#narrow/channel/4-Rome/topic/plans/with/99";
    assert_eq!(
        decode_stream_topic_from_url(with, &helper()).and_then(|st| st.near),
        Some(99)
    );
}

#[test]
fn decode_rejects_foreign_and_malformed_urls() {
    let helper = helper();
    for url in [
        "https://other.example.com/#narrow/channel/4-Rome/topic/plans",
        "http://zulip.zulipdev.com/#settings",
        "http://zulip.zulipdev.com/#narrow/channel/4-Rome",
        "http://zulip.zulipdev.com/#narrow/channel/x-Rome/topic/plans",
        "http://zulip.zulipdev.com/#narrow/channel/4-Rome/topic/plans/near/12/extra",
        "http://zulip.zulipdev.com/#narrow/channel/4-Rome/topic/bad.ZZ",
    ] {
        assert_eq!(decode_stream_topic_from_url(url, &helper), None, "{}", url);
    }
}

#[test]
fn trailing_slash_on_realm_url_is_ignored() {
    let helper = HelperConfig::new("http://zulip.zulipdev.com/");
    let url = "http://zulip.zulipdev.com/#narrow/channel/4-Rome/topic/plans";
    assert!(decode_stream_topic_from_url(url, &helper).is_some());
}
