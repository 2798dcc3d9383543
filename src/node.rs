/// A node in a parsed markdown document.
///
/// The tree mirrors the CommonMark block/inline structure. Nodes are built once by the
/// parser adapter (or by hand) and only ever read by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Document(Vec<Node>),
    Heading {
        level: u8,
        children: Vec<Node>,
    },
    Paragraph(Vec<Node>),
    BlockQuote(Vec<Node>),
    OrderedList {
        /// Number of the first item. Not validated, may be negative.
        start: i64,
        delimiter: char,
        children: Vec<Node>,
    },
    BulletList {
        marker: char,
        children: Vec<Node>,
    },
    ListItem(Vec<Node>),
    FencedCodeBlock {
        info: String,
        literal: String,
        fence_char: char,
        fence_length: usize,
        fence_indent: usize,
    },
    IndentedCodeBlock(String),
    HtmlBlock(String),
    Link {
        destination: String,
        title: Option<String>,
        children: Vec<Node>,
    },
    Image {
        destination: String,
        title: Option<String>,
        children: Vec<Node>,
    },
    Emphasis(Vec<Node>),
    StrongEmphasis(Vec<Node>),
    Code(String),
    HtmlInline(String),
    Text(String),
    SoftLineBreak,
    HardLineBreak,
    ThematicBreak,
    /// A construct with no dedicated rendering (tables, strikethrough, footnotes, ...).
    /// Its children are still rendered.
    Unsupported {
        name: String,
        children: Vec<Node>,
    },
}

impl Node {
    /// Shorthand for a text leaf.
    pub fn text(literal: impl Into<String>) -> Self {
        Node::Text(literal.into())
    }

    /// Child nodes, empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document(children)
            | Node::Paragraph(children)
            | Node::BlockQuote(children)
            | Node::ListItem(children)
            | Node::Emphasis(children)
            | Node::StrongEmphasis(children) => children,
            Node::Heading { children, .. }
            | Node::OrderedList { children, .. }
            | Node::BulletList { children, .. }
            | Node::Link { children, .. }
            | Node::Image { children, .. }
            | Node::Unsupported { children, .. } => children,
            Node::FencedCodeBlock { .. }
            | Node::IndentedCodeBlock(_)
            | Node::HtmlBlock(_)
            | Node::Code(_)
            | Node::HtmlInline(_)
            | Node::Text(_)
            | Node::SoftLineBreak
            | Node::HardLineBreak
            | Node::ThematicBreak => &[],
        }
    }

    /// The literal content of leaf nodes that carry one.
    pub fn literal(&self) -> Option<&str> {
        match self {
            Node::FencedCodeBlock { literal, .. } => Some(literal),
            Node::IndentedCodeBlock(literal)
            | Node::HtmlBlock(literal)
            | Node::Code(literal)
            | Node::HtmlInline(literal)
            | Node::Text(literal) => Some(literal),
            _ => None,
        }
    }

    /// Whether the node lives inside a paragraph rather than at block level.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Node::Link { .. }
                | Node::Image { .. }
                | Node::Emphasis(_)
                | Node::StrongEmphasis(_)
                | Node::Code(_)
                | Node::HtmlInline(_)
                | Node::Text(_)
                | Node::SoftLineBreak
                | Node::HardLineBreak
        )
    }

    pub fn kind_name(&self) -> &str {
        match self {
            Node::Document(_) => "Document",
            Node::Heading { .. } => "Heading",
            Node::Paragraph(_) => "Paragraph",
            Node::BlockQuote(_) => "BlockQuote",
            Node::OrderedList { .. } => "OrderedList",
            Node::BulletList { .. } => "BulletList",
            Node::ListItem(_) => "ListItem",
            Node::FencedCodeBlock { .. } => "FencedCodeBlock",
            Node::IndentedCodeBlock(_) => "IndentedCodeBlock",
            Node::HtmlBlock(_) => "HtmlBlock",
            Node::Link { .. } => "Link",
            Node::Image { .. } => "Image",
            Node::Emphasis(_) => "Emphasis",
            Node::StrongEmphasis(_) => "StrongEmphasis",
            Node::Code(_) => "Code",
            Node::HtmlInline(_) => "HtmlInline",
            Node::Text(_) => "Text",
            Node::SoftLineBreak => "SoftLineBreak",
            Node::HardLineBreak => "HardLineBreak",
            Node::ThematicBreak => "ThematicBreak",
            Node::Unsupported { name, .. } => name,
        }
    }

    /// Number of items in a list node. Assumes every item is a direct child.
    pub fn number_of_items(&self) -> usize {
        match self {
            Node::OrderedList { children, .. } | Node::BulletList { children, .. } => {
                children.len()
            }
            _ => 0,
        }
    }

    /// The prefix number of the last item of an ordered list.
    pub fn largest_prefix(&self) -> Option<i64> {
        match self {
            Node::OrderedList { start, .. } => {
                Some(start.saturating_add(self.number_of_items() as i64 - 1))
            }
            _ => None,
        }
    }
}
