use chatmark_core::{HelperConfig, LinkifierTable, emit_html, parse, render};

fn helper() -> HelperConfig {
    let mut helper = HelperConfig::new("http://zulip.zulipdev.com");
    helper.add_user(8, "King Hamlet");
    helper.add_user(101, "Cordelia, Lear's daughter");
    helper.add_user_group(2, "backend");
    helper.add_stream(5, "Denmark");
    helper.add_stream(4, "Rome");
    helper.add_emoji("smile", "1f642");
    helper.add_emoji("heart", "2764");
    helper.add_realm_emoji("zulip", "/user_avatars/2/emoji/zulip.png");
    helper
}

fn raw(source: &str) -> String {
    emit_html(&parse(source, &helper(), &LinkifierTable::new()))
}

#[test]
fn mention_by_name() {
    assert_eq!(
        raw("@**King Hamlet** hi"),
        "<p><span class=\"user-mention\" data-user-id=\"8\">@King Hamlet</span> hi</p>"
    );
}

#[test]
fn mention_by_name_and_id() {
    assert_eq!(
        raw("@**King Hamlet|8**"),
        "<p><span class=\"user-mention\" data-user-id=\"8\">@King Hamlet</span></p>"
    );
}

#[test]
fn mention_by_id_alone_uses_canonical_name() {
    assert_eq!(
        raw("@**|8**"),
        "<p><span class=\"user-mention\" data-user-id=\"8\">@King Hamlet</span></p>"
    );
}

#[test]
fn unknown_mention_stays_literal() {
    assert_eq!(raw("@**Ophelia**"), "<p>@**Ophelia**</p>");
}

#[test]
fn stale_name_for_id_stays_literal() {
    assert_eq!(raw("@**Wrong Name|8**"), "<p>@**Wrong Name|8**</p>");
    assert_eq!(raw("@**King Hamlet|99**"), "<p>@**King Hamlet|99**</p>");
}

#[test]
fn silent_mention_drops_the_at_sign() {
    assert_eq!(
        raw("@_**King Hamlet**"),
        "<p><span class=\"user-mention silent\" data-user-id=\"8\">King Hamlet</span></p>"
    );
}

#[test]
fn wildcard_mention_uses_star_id() {
    assert_eq!(
        raw("@**everyone**"),
        "<p><span class=\"user-mention\" data-user-id=\"*\">@everyone</span></p>"
    );
    assert_eq!(
        raw("@**topic**"),
        "<p><span class=\"user-mention\" data-user-id=\"*\">@topic</span></p>"
    );
}

#[test]
fn group_mention() {
    assert_eq!(
        raw("cc @*backend*"),
        "<p>cc <span class=\"user-group-mention\" data-user-group-id=\"2\">@backend</span></p>"
    );
    assert_eq!(raw("@*nobody*"), "<p>@*nobody*</p>");
}

#[test]
fn stream_link() {
    assert_eq!(
        raw("#**Denmark**"),
        "<p><a class=\"stream\" data-stream-id=\"5\" \
href=\"#narrow/channel/5-Denmark\">#Denmark</a></p>"
    );
}

#[test]
fn stream_topic_link() {
    assert_eq!(
        raw("#**Denmark>plans**"),
        "<p><a class=\"stream-topic\" data-stream-id=\"5\" \
href=\"#narrow/channel/5-Denmark/topic/plans\">#Denmark &gt; plans</a></p>"
    );
}

#[test]
fn unknown_stream_stays_literal() {
    assert_eq!(raw("#**Atlantis**"), "<p>#**Atlantis**</p>");
}

#[test]
fn unicode_emoji() {
    assert_eq!(
        raw(":smile:"),
        "<p><span aria-label=\"smile\" class=\"emoji emoji-1f642\" role=\"img\" \
title=\"smile\">:smile:</span></p>"
    );
}

#[test]
fn realm_emoji_shadows_unicode_and_renders_as_img() {
    let mut helper = helper();
    helper.add_realm_emoji("smile", "/user_avatars/2/emoji/smile.png");
    let html = emit_html(&parse(":smile:", &helper, &LinkifierTable::new()));
    assert_eq!(
        html,
        "<p><img alt=\":smile:\" class=\"emoji\" src=\"/user_avatars/2/emoji/smile.png\" \
title=\"smile\"></p>"
    );
}

#[test]
fn unknown_emoji_name_stays_literal() {
    assert_eq!(raw(":unknownthing:"), "<p>:unknownthing:</p>");
}

#[test]
fn emoticon_translation_is_opt_in() {
    let mut on = helper();
    on.set_translate_emoticons(true);
    let html = emit_html(&parse("I <3 this :)", &on, &LinkifierTable::new()));
    assert_eq!(
        html,
        "<p>I <span aria-label=\"heart\" class=\"emoji emoji-2764\" role=\"img\" \
title=\"heart\">:heart:</span> this <span aria-label=\"smile\" class=\"emoji emoji-1f642\" \
role=\"img\" title=\"smile\">:smile:</span></p>"
    );

    assert_eq!(raw("I <3 this :)"), "<p>I &lt;3 this :)</p>");
}

#[test]
fn emoticon_inside_a_word_is_left_alone() {
    let mut on = helper();
    on.set_translate_emoticons(true);
    let html = emit_html(&parse("http://x.test/:(path", &on, &LinkifierTable::new()));
    assert!(html.contains(":(path"), "got {}", html);
}

#[test]
fn body_linkifiers_apply() {
    let mut table = LinkifierTable::new();
    table
        .add("#(?P<id>[0-9]+)", "https://trac.example.com/ticket/{id}")
        .unwrap();
    let html = emit_html(&parse("see #123 and #456", &helper(), &table));
    assert_eq!(
        html,
        "<p>see <a href=\"https://trac.example.com/ticket/123\">#123</a> and \
<a href=\"https://trac.example.com/ticket/456\">#456</a></p>"
    );
}

#[test]
fn raw_urls_become_links() {
    assert_eq!(
        raw("visit https://example.com/x. now"),
        "<p>visit <a href=\"https://example.com/x\">https://example.com/x</a>. now</p>"
    );
}

#[test]
fn code_span_suppresses_linkifiers_and_mentions() {
    let mut table = LinkifierTable::new();
    table
        .add("#(?P<id>[0-9]+)", "https://trac.example.com/ticket/{id}")
        .unwrap();
    let html = emit_html(&parse("`#123`", &helper(), &table));
    assert_eq!(html, "<p><code>#123</code></p>");
    assert_eq!(
        raw("`@**King Hamlet**`"),
        "<p><code>@**King Hamlet**</code></p>"
    );
}

#[test]
fn emphasis_and_strikethrough() {
    assert_eq!(
        raw("**bold** *it* ~~gone~~"),
        "<p><strong>bold</strong> <em>it</em> <del>gone</del></p>"
    );
}

#[test]
fn explicit_link() {
    assert_eq!(
        raw("[docs](https://example.com/docs)"),
        "<p><a href=\"https://example.com/docs\">docs</a></p>"
    );
}

#[test]
fn fenced_code_block_with_language() {
    assert_eq!(
        raw("```python\nprint(1)\n```"),
        "<div class=\"codehilite\" data-code-language=\"python\">\
<pre><code>print(1)\n</code></pre></div>"
    );
}

#[test]
fn fenced_code_block_without_language() {
    assert_eq!(raw("```\nlet x;\n```"), "<pre><code>let x;\n</code></pre>");
}

#[test]
fn unclosed_fence_runs_to_end() {
    assert_eq!(raw("```\ncode"), "<pre><code>code\n</code></pre>");
}

#[test]
fn block_quote() {
    assert_eq!(
        raw("> hello"),
        "<blockquote>\n  <p>hello</p>\n</blockquote>"
    );
}

#[test]
fn lists() {
    assert_eq!(raw("* a\n* b"), "<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>");
    assert_eq!(
        raw("3. a\n4. b"),
        "<ol start=\"3\">\n  <li>a</li>\n  <li>b</li>\n</ol>"
    );
    assert_eq!(raw("1. a"), "<ol>\n  <li>a</li>\n</ol>");
}

#[test]
fn math_block_carries_verbatim_tex_annotation() {
    assert_eq!(
        raw("$$\nx^2\n$$"),
        "<p><span class=\"katex-display\"><span class=\"katex\">\
<annotation encoding=\"application/x-tex\">x^2</annotation></span></span></p>"
    );
}

#[test]
fn inline_math() {
    assert_eq!(
        raw("cost is $$n \\log n$$"),
        "<p>cost is <span class=\"katex\">\
<annotation encoding=\"application/x-tex\">n \\log n</annotation></span></p>"
    );
}

#[test]
fn hard_break_between_paragraph_lines() {
    assert_eq!(raw("line one\nline two"), "<p>line one<br>\nline two</p>");
}

#[test]
fn html_in_source_is_escaped() {
    assert_eq!(
        raw("<script>alert(1)</script>"),
        "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
    );
}

#[test]
fn sanitized_render_keeps_engine_markup() {
    let html = render("hi @**King Hamlet**", &helper(), &LinkifierTable::new());
    assert!(html.contains("data-user-id=\"8\""), "got {}", html);
    assert!(html.contains("class=\"user-mention\""), "got {}", html);

    let html = render("<script>alert(1)</script>", &helper(), &LinkifierTable::new());
    assert!(html.contains("&lt;script&gt;"), "got {}", html);
    assert!(!html.contains("<script>"), "got {}", html);
}

#[test]
fn mixed_blocks() {
    assert_eq!(
        raw("intro\n\n> quoted\n\n* a\n* b"),
        "<p>intro</p>\n\
<blockquote>\n  <p>quoted</p>\n</blockquote>\n\
<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>"
    );
}
