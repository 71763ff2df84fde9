use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: u64,
    pub full_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserGroup {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stream {
    pub id: u64,
    pub name: String,
}

/// The lookup collaborator threaded through every rendering call.
///
/// All lookups are pure; the engine never mutates a config it was handed.
/// Tables are keyed deterministically so repeated calls cannot observe
/// iteration-order differences.
#[derive(Clone, Debug, Default)]
pub struct HelperConfig {
    realm_url: String,
    users: Vec<User>,
    groups: Vec<UserGroup>,
    streams: Vec<Stream>,
    emoji_codepoints: BTreeMap<String, String>,
    realm_emoji: BTreeMap<String, String>,
    translate_emoticons: bool,
}

impl HelperConfig {
    pub fn new(realm_url: impl Into<String>) -> Self {
        let mut realm_url = realm_url.into();
        while realm_url.ends_with('/') {
            realm_url.pop();
        }
        Self {
            realm_url,
            ..Self::default()
        }
    }

    pub fn add_user(&mut self, id: u64, full_name: impl Into<String>) {
        self.users.push(User {
            id,
            full_name: full_name.into(),
        });
    }

    pub fn add_user_group(&mut self, id: u64, name: impl Into<String>) {
        self.groups.push(UserGroup {
            id,
            name: name.into(),
        });
    }

    pub fn add_stream(&mut self, id: u64, name: impl Into<String>) {
        self.streams.push(Stream {
            id,
            name: name.into(),
        });
    }

    /// Registers a unicode emoji, e.g. `("smile", "1f642")`.
    pub fn add_emoji(&mut self, name: impl Into<String>, codepoint: impl Into<String>) {
        self.emoji_codepoints.insert(name.into(), codepoint.into());
    }

    /// Registers a realm-custom emoji backed by an image URL.
    pub fn add_realm_emoji(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.realm_emoji.insert(name.into(), url.into());
    }

    pub fn set_translate_emoticons(&mut self, enabled: bool) {
        self.translate_emoticons = enabled;
    }

    pub fn realm_url(&self) -> &str {
        &self.realm_url
    }

    pub fn should_translate_emoticons(&self) -> bool {
        self.translate_emoticons
    }

    pub fn user_by_id(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn user_by_name(&self, full_name: &str) -> Option<&User> {
        self.users.iter().find(|user| user.full_name == full_name)
    }

    pub fn group_by_id(&self, id: u64) -> Option<&UserGroup> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&UserGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn stream_by_id(&self, id: u64) -> Option<&Stream> {
        self.streams.iter().find(|stream| stream.id == id)
    }

    pub fn stream_by_name(&self, name: &str) -> Option<&Stream> {
        self.streams.iter().find(|stream| stream.name == name)
    }

    pub fn emoji_codepoint(&self, name: &str) -> Option<&str> {
        self.emoji_codepoints.get(name).map(String::as_str)
    }

    pub fn realm_emoji_url(&self, name: &str) -> Option<&str> {
        self.realm_emoji.get(name).map(String::as_str)
    }

    /// Rewrites whitespace-bounded emoticons into `:name:` colon syntax.
    ///
    /// Applied by the parser before emoji-name resolution, and only when
    /// `should_translate_emoticons()` is set.
    pub fn translate_emoticons(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (pattern, replacement) in EMOTICON_RULES.iter() {
            out = pattern.replace_all(&out, replacement.as_str()).into_owned();
        }
        out
    }
}

static EMOTICON_RULES: Lazy<Vec<(Regex, String)>> = Lazy::new(|| {
    [
        (":)", "smile"),
        ("(:", "smile"),
        (":(", "frown"),
        ("<3", "heart"),
        (":|", "neutral"),
        (":/", "confused"),
    ]
    .iter()
    .map(|(emoticon, name)| {
        let pattern = format!(r"(^|\s){}($|\s)", regex::escape(emoticon));
        let regex = Regex::new(&pattern).expect("static emoticon pattern");
        (regex, format!("${{1}}:{}:${{2}}", name))
    })
    .collect()
});
