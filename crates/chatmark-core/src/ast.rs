pub type InlineSeq = Vec<Inline>;

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph {
        content: InlineSeq,
    },
    CodeBlock {
        lang: Option<String>,
        text: String,
    },
    // Display math. `tex` is the verbatim source between the delimiters,
    // blank lines included.
    MathBlock {
        tex: String,
    },
    BlockQuote {
        blocks: Vec<Block>,
    },
    List(List),
}

#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub ordered: bool,
    pub start: u64,
    pub items: Vec<InlineSeq>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    Text(String),
    CodeSpan(String),
    Strong(InlineSeq),
    Emph(InlineSeq),
    Strikethrough(InlineSeq),
    HardBreak,
    Link {
        url: String,
        text: String,
    },
    // A span matched by a configured linkifier or the raw-URL detector.
    Linkified {
        text: String,
        url: String,
    },
    // `user_id` is None for wildcard mentions (@**all** and friends).
    UserMention {
        user_id: Option<u64>,
        name: String,
        silent: bool,
    },
    GroupMention {
        group_id: u64,
        name: String,
        silent: bool,
    },
    StreamLink {
        stream_id: u64,
        name: String,
    },
    StreamTopicLink {
        stream_id: u64,
        name: String,
        topic: String,
    },
    UnicodeEmoji {
        name: String,
        codepoint: String,
    },
    RealmEmoji {
        name: String,
        url: String,
    },
    MathInline {
        tex: String,
    },
}
