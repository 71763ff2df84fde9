use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::ast::{Block, Inline, InlineSeq, List};
use crate::helper::HelperConfig;
use crate::linkifier::{LinkSpan, LinkifierTable, link_spans};

/// Parses raw message source into blocks. Pure function of its inputs;
/// never panics on arbitrary input, and unresolvable entity references
/// degrade to literal text rather than failing the message.
pub fn parse(source: &str, helper: &HelperConfig, linkifiers: &LinkifierTable) -> Vec<Block> {
    let lines: Vec<&str> = source.lines().collect();
    parse_blocks(&lines, helper, linkifiers)
}

fn parse_blocks(lines: &[&str], helper: &HelperConfig, linkifiers: &LinkifierTable) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }

        if let Some((block, next)) = parse_fenced_block(lines, i) {
            blocks.push(block);
            i = next;
            continue;
        }

        if let Some((block, next)) = parse_math_block(lines, i) {
            blocks.push(block);
            i = next;
            continue;
        }

        if let Some((block, next)) = parse_block_quote(lines, i, helper, linkifiers) {
            blocks.push(block);
            i = next;
            continue;
        }

        if let Some((block, next)) = parse_list(lines, i, helper, linkifiers) {
            blocks.push(block);
            i = next;
            continue;
        }

        let (block, next) = parse_paragraph(lines, i, helper, linkifiers);
        blocks.push(block);
        i = next;
    }
    blocks
}

fn parse_fenced_block(lines: &[&str], start: usize) -> Option<(Block, usize)> {
    let info = lines[start].trim_start().strip_prefix("```")?;
    let lang = info.trim();
    let mut body = Vec::new();
    let mut i = start + 1;
    while i < lines.len() && lines[i].trim() != "```" {
        body.push(lines[i]);
        i += 1;
    }
    // An unclosed fence runs to the end of the message.
    let next = if i < lines.len() { i + 1 } else { i };
    let text = body.join("\n");
    let block = if lang == "math" {
        Block::MathBlock { tex: text }
    } else {
        Block::CodeBlock {
            lang: if lang.is_empty() {
                None
            } else {
                Some(lang.to_string())
            },
            text,
        }
    };
    Some((block, next))
}

fn parse_math_block(lines: &[&str], start: usize) -> Option<(Block, usize)> {
    if lines[start].trim() != "$$" {
        return None;
    }
    let mut body = Vec::new();
    let mut i = start + 1;
    while i < lines.len() && lines[i].trim() != "$$" {
        body.push(lines[i]);
        i += 1;
    }
    let next = if i < lines.len() { i + 1 } else { i };
    Some((
        Block::MathBlock {
            tex: body.join("\n"),
        },
        next,
    ))
}

fn parse_block_quote<'a>(
    lines: &[&'a str],
    start: usize,
    helper: &HelperConfig,
    linkifiers: &LinkifierTable,
) -> Option<(Block, usize)> {
    if !lines[start].trim_start().starts_with('>') {
        return None;
    }
    let mut inner: Vec<&'a str> = Vec::new();
    let mut i = start;
    while i < lines.len() {
        let trimmed = lines[i].trim_start();
        match trimmed.strip_prefix('>') {
            Some(rest) => {
                inner.push(rest.strip_prefix(' ').unwrap_or(rest));
                i += 1;
            }
            None => break,
        }
    }
    Some((
        Block::BlockQuote {
            blocks: parse_blocks(&inner, helper, linkifiers),
        },
        i,
    ))
}

fn list_marker(line: &str) -> Option<(bool, u64, &str)> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed
        .strip_prefix("* ")
        .or_else(|| trimmed.strip_prefix("- "))
    {
        return Some((false, 1, rest));
    }
    let digits = trimmed
        .bytes()
        .take_while(|byte| byte.is_ascii_digit())
        .count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix(". ") {
            let number = trimmed[..digits].parse().ok()?;
            return Some((true, number, rest));
        }
    }
    None
}

fn parse_list(
    lines: &[&str],
    start: usize,
    helper: &HelperConfig,
    linkifiers: &LinkifierTable,
) -> Option<(Block, usize)> {
    let (ordered, start_number, first_rest) = list_marker(lines[start])?;
    let mut items = vec![parse_inline_line(first_rest, helper, linkifiers)];
    let mut i = start + 1;
    while i < lines.len() {
        match list_marker(lines[i]) {
            Some((item_ordered, _, rest)) if item_ordered == ordered => {
                items.push(parse_inline_line(rest, helper, linkifiers));
                i += 1;
            }
            _ => break,
        }
    }
    Some((
        Block::List(List {
            ordered,
            start: start_number,
            items,
        }),
        i,
    ))
}

fn parse_paragraph(
    lines: &[&str],
    start: usize,
    helper: &HelperConfig,
    linkifiers: &LinkifierTable,
) -> (Block, usize) {
    let mut content = InlineSeq::new();
    let mut i = start;
    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() || (i > start && starts_new_block(line)) {
            break;
        }
        if i > start {
            content.push(Inline::HardBreak);
        }
        content.extend(parse_inline_line(line, helper, linkifiers));
        i += 1;
    }
    (Block::Paragraph { content }, i.max(start + 1))
}

fn starts_new_block(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```")
        || trimmed == "$$"
        || trimmed.starts_with('>')
        || list_marker(line).is_some()
}

fn parse_inline_line(line: &str, helper: &HelperConfig, linkifiers: &LinkifierTable) -> InlineSeq {
    if helper.should_translate_emoticons() {
        let translated = helper.translate_emoticons(line);
        scan_inlines(&translated, helper, linkifiers)
    } else {
        scan_inlines(line, helper, linkifiers)
    }
}

fn scan_inlines(text: &str, helper: &HelperConfig, linkifiers: &LinkifierTable) -> InlineSeq {
    let spans = link_spans(text, linkifiers);
    let mut scanner = InlineScanner {
        text,
        pos: 0,
        out: InlineSeq::new(),
        buffer: String::new(),
        helper,
        linkifiers,
        spans,
        span_idx: 0,
    };
    scanner.run();
    scanner.finish()
}

static EMOJI_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([a-zA-Z0-9_+-]+):").expect("static emoji pattern"));

const WILDCARD_MENTIONS: [&str; 4] = ["all", "everyone", "stream", "topic"];

enum Wrap {
    Strong,
    Emph,
    Strikethrough,
}

struct InlineScanner<'a> {
    text: &'a str,
    pos: usize,
    out: InlineSeq,
    buffer: String,
    helper: &'a HelperConfig,
    linkifiers: &'a LinkifierTable,
    spans: Vec<LinkSpan>,
    span_idx: usize,
}

impl<'a> InlineScanner<'a> {
    fn run(&mut self) {
        while self.pos < self.text.len() {
            // Linkifier spans beginning inside an already-consumed
            // construct (a code span, say) are dead.
            while self.span_idx < self.spans.len() && self.spans[self.span_idx].start < self.pos {
                self.span_idx += 1;
            }
            if self.span_idx < self.spans.len() && self.spans[self.span_idx].start == self.pos {
                let span = self.spans[self.span_idx].clone();
                self.flush();
                self.out.push(Inline::Linkified {
                    text: span.text,
                    url: span.url,
                });
                self.pos = span.end;
                self.span_idx += 1;
                continue;
            }

            let rest = &self.text[self.pos..];
            let handled = match rest.as_bytes()[0] {
                b'`' => self.try_code_span(),
                b'$' if rest.starts_with("$$") => self.try_inline_math(),
                b'@' => self.try_mention(),
                b'#' if rest.starts_with("#**") => self.try_stream_link(),
                b':' => self.try_emoji(),
                b'[' => self.try_link(),
                b'~' if rest.starts_with("~~") => self.try_delimited("~~", Wrap::Strikethrough),
                b'*' if rest.starts_with("**") => self.try_delimited("**", Wrap::Strong),
                b'*' => self.try_delimited("*", Wrap::Emph),
                _ => false,
            };
            if !handled {
                self.push_char();
            }
        }
    }

    fn finish(mut self) -> InlineSeq {
        self.flush();
        self.out
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            let text = std::mem::take(&mut self.buffer);
            self.out.push(Inline::Text(text));
        }
    }

    // Appends a syntactically well-formed but unresolvable token verbatim
    // so its delimiters are not rescanned as emphasis.
    fn consume_literal(&mut self, len: usize) {
        self.buffer.push_str(&self.text[self.pos..self.pos + len]);
        self.pos += len;
    }

    fn push_char(&mut self) {
        let text = self.text;
        let Some(ch) = text[self.pos..].chars().next() else {
            self.pos = text.len();
            return;
        };
        self.buffer.push(ch);
        self.pos += ch.len_utf8();
    }

    fn try_code_span(&mut self) -> bool {
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(close) = rest[1..].find('`') else {
            return false;
        };
        if close == 0 {
            return false;
        }
        let inner = &rest[1..1 + close];
        self.flush();
        self.out.push(Inline::CodeSpan(inner.to_string()));
        self.pos += close + 2;
        true
    }

    fn try_inline_math(&mut self) -> bool {
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(close) = rest[2..].find("$$") else {
            return false;
        };
        if close == 0 {
            return false;
        }
        let inner = &rest[2..2 + close];
        self.flush();
        self.out.push(Inline::MathInline {
            tex: inner.to_string(),
        });
        self.pos += close + 4;
        true
    }

    fn try_delimited(&mut self, delim: &str, wrap: Wrap) -> bool {
        let text = self.text;
        let rest = &text[self.pos..];
        let inner_start = delim.len();
        let Some(close) = rest[inner_start..].find(delim) else {
            return false;
        };
        if close == 0 {
            return false;
        }
        let inner = &rest[inner_start..inner_start + close];
        let children = scan_inlines(inner, self.helper, self.linkifiers);
        self.flush();
        self.out.push(match wrap {
            Wrap::Strong => Inline::Strong(children),
            Wrap::Emph => Inline::Emph(children),
            Wrap::Strikethrough => Inline::Strikethrough(children),
        });
        self.pos += inner_start + close + delim.len();
        true
    }

    fn try_mention(&mut self) -> bool {
        let text = self.text;
        let rest = &text[self.pos..];
        let (silent, offset) = if rest[1..].starts_with('_') {
            (true, 2)
        } else {
            (false, 1)
        };
        let after = &rest[offset..];

        if let Some(body) = after.strip_prefix("**") {
            let Some(close) = body.find("**") else {
                return false;
            };
            let content = &body[..close];
            let token_len = offset + 2 + close + 2;
            let Some(inline) = resolve_user_mention(content, silent, self.helper) else {
                debug!(content, "unresolved user mention left literal");
                self.consume_literal(token_len);
                return true;
            };
            self.flush();
            self.out.push(inline);
            self.pos += token_len;
            return true;
        }

        if let Some(body) = after.strip_prefix('*') {
            let Some(close) = body.find('*') else {
                return false;
            };
            let content = &body[..close];
            let token_len = offset + 1 + close + 1;
            let Some(group) = self.helper.group_by_name(content) else {
                debug!(content, "unresolved group mention left literal");
                self.consume_literal(token_len);
                return true;
            };
            self.flush();
            self.out.push(Inline::GroupMention {
                group_id: group.id,
                name: group.name.clone(),
                silent,
            });
            self.pos += token_len;
            return true;
        }

        false
    }

    fn try_stream_link(&mut self) -> bool {
        let text = self.text;
        let rest = &text[self.pos..];
        let body = &rest[3..];
        let Some(close) = body.find("**") else {
            return false;
        };
        let content = &body[..close];
        if content.is_empty() {
            return false;
        }
        let (stream_name, topic) = match content.split_once('>') {
            Some((name, topic)) => (name, Some(topic)),
            None => (content, None),
        };
        let Some(stream) = self.helper.stream_by_name(stream_name) else {
            debug!(stream_name, "unresolved stream link left literal");
            self.consume_literal(3 + close + 2);
            return true;
        };
        self.flush();
        match topic {
            Some(topic) => self.out.push(Inline::StreamTopicLink {
                stream_id: stream.id,
                name: stream.name.clone(),
                topic: topic.to_string(),
            }),
            None => self.out.push(Inline::StreamLink {
                stream_id: stream.id,
                name: stream.name.clone(),
            }),
        }
        self.pos += 3 + close + 2;
        true
    }

    fn try_emoji(&mut self) -> bool {
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(caps) = EMOJI_NAME.captures(rest) else {
            return false;
        };
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            return false;
        };
        let name = name.as_str();
        // Realm emoji shadow unicode emoji of the same name.
        if let Some(url) = self.helper.realm_emoji_url(name) {
            let url = url.to_string();
            self.flush();
            self.out.push(Inline::RealmEmoji {
                name: name.to_string(),
                url,
            });
        } else if let Some(codepoint) = self.helper.emoji_codepoint(name) {
            let codepoint = codepoint.to_string();
            self.flush();
            self.out.push(Inline::UnicodeEmoji {
                name: name.to_string(),
                codepoint,
            });
        } else {
            return false;
        }
        self.pos += whole.len();
        true
    }

    fn try_link(&mut self) -> bool {
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(close_bracket) = rest.find(']') else {
            return false;
        };
        if !rest[close_bracket + 1..].starts_with('(') {
            return false;
        }
        let label = &rest[1..close_bracket];
        let after = &rest[close_bracket + 2..];
        let Some(close_paren) = after.find(')') else {
            return false;
        };
        let url = &after[..close_paren];
        if url.is_empty() || url.contains(' ') {
            return false;
        }
        self.flush();
        self.out.push(Inline::Link {
            url: url.to_string(),
            text: label.to_string(),
        });
        self.pos += close_bracket + 2 + close_paren + 1;
        true
    }
}

fn resolve_user_mention(content: &str, silent: bool, helper: &HelperConfig) -> Option<Inline> {
    if let Some((name_part, id_part)) = content.rsplit_once('|') {
        let id: u64 = id_part.trim().parse().ok()?;
        let user = helper.user_by_id(id)?;
        // A stale display name no longer matching the id fails open.
        if !name_part.is_empty() && name_part != user.full_name {
            return None;
        }
        return Some(Inline::UserMention {
            user_id: Some(user.id),
            name: user.full_name.clone(),
            silent,
        });
    }
    if WILDCARD_MENTIONS.contains(&content) {
        return Some(Inline::UserMention {
            user_id: None,
            name: content.to_string(),
            silent,
        });
    }
    let user = helper.user_by_name(content)?;
    Some(Inline::UserMention {
        user_id: Some(user.id),
        name: user.full_name.clone(),
        silent,
    })
}
