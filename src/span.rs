use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use url::Url;

use crate::config::Color;
use crate::node::Node;

/// Callback invoked when a rendered link is activated.
pub type LinkCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// The priority indicates which spans should be considered first when several
/// annotations cover the same position, e.g. while reconstructing a tree from spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A tappable link target.
#[derive(Clone)]
pub struct LinkAction {
    url: String,
    custom_scheme: Option<String>,
    on_click: LinkCallback,
}

impl LinkAction {
    pub fn new(url: impl Into<String>, custom_scheme: Option<String>, on_click: LinkCallback) -> Self {
        Self {
            url: url.into(),
            custom_scheme,
            on_click,
        }
    }

    /// The destination as written in the document.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The url handed to the callback. Destinations using the app's own scheme pass
    /// through untouched, anything else is normalized into an absolute url.
    pub fn resolved_url(&self) -> String {
        if let Some(scheme) = &self.custom_scheme {
            if self.url.starts_with(scheme.as_str()) {
                return self.url.clone();
            }
        }
        guess_url(&self.url)
    }

    pub fn activate(&self) {
        let url = self.resolved_url();
        tracing::debug!(%url, "link activated");
        (self.on_click)(&url);
    }
}

fn guess_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(url) = Url::parse(trimmed) {
        return url.to_string();
    }
    match Url::parse(&format!("http://{trimmed}")) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}

// Equality ignores the callback.
impl PartialEq for LinkAction {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url && self.custom_scheme == other.custom_scheme
    }
}

impl fmt::Debug for LinkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkAction")
            .field("url", &self.url)
            .field("custom_scheme", &self.custom_scheme)
            .finish_non_exhaustive()
    }
}

/// An atomic style instruction. Pixel values are already scaled by the display density.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    RelativeSize(f32),
    AbsoluteSize(i32),
    ParagraphSpacing {
        before: i32,
        after: i32,
    },
    Bold,
    Italic,
    Monospace,
    ForegroundColor(Color),
    QuoteStripe {
        color: Color,
        stripe_width: i32,
        gap_width: i32,
    },
    /// Indentation of the first line of each paragraph and of every following line.
    LeadingMargin {
        first: i32,
        rest: i32,
    },
    TabStop(i32),
    /// Draws the spanned prefix right aligned in `digits` cells of `digit_width` each,
    /// one character per cell, independent of the font's own digit metrics.
    ListPrefix {
        digits: u32,
        digit_width: i32,
        color: Color,
    },
    LinkAction(LinkAction),
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::RelativeSize(multiplier) => write!(f, "relative-size({multiplier})"),
            Directive::AbsoluteSize(size) => write!(f, "absolute-size({size})"),
            Directive::ParagraphSpacing { before, after } => {
                write!(f, "paragraph-spacing({before}, {after})")
            }
            Directive::Bold => f.write_str("bold"),
            Directive::Italic => f.write_str("italic"),
            Directive::Monospace => f.write_str("monospace"),
            Directive::ForegroundColor(color) => write!(f, "foreground({color})"),
            Directive::QuoteStripe {
                color,
                stripe_width,
                gap_width,
            } => write!(f, "quote-stripe({color}, {stripe_width}, {gap_width})"),
            Directive::LeadingMargin { first, rest } => {
                write!(f, "leading-margin({first}, {rest})")
            }
            Directive::TabStop(location) => write!(f, "tab-stop({location})"),
            Directive::ListPrefix {
                digits,
                digit_width,
                color,
            } => write!(f, "list-prefix({digits}, {digit_width}, {color})"),
            Directive::LinkAction(action) => write!(f, "link({})", action.url()),
        }
    }
}

/// The markdown unit a span stands for, with the attributes needed to rebuild it.
#[derive(Debug, Clone, PartialEq)]
pub enum SpanKind {
    /// Also used as the neutral placeholder for nodes without a dedicated style.
    Document,
    Heading { level: u8 },
    Paragraph,
    BlockQuote,
    OrderedList { start: i64, delimiter: char },
    BulletList { marker: char },
    ListItem,
    FencedCodeBlock,
    IndentedCodeBlock,
    HtmlBlock,
    Link { destination: String },
    Image { destination: String },
    Emphasis,
    StrongEmphasis,
    Code,
    HtmlInline,
    Text,
    SoftLineBreak,
    HardLineBreak,
    ThematicBreak,
}

impl SpanKind {
    pub fn name(&self) -> &'static str {
        match self {
            SpanKind::Document => "Document",
            SpanKind::Heading { .. } => "Heading",
            SpanKind::Paragraph => "Paragraph",
            SpanKind::BlockQuote => "BlockQuote",
            SpanKind::OrderedList { .. } => "OrderedList",
            SpanKind::BulletList { .. } => "BulletList",
            SpanKind::ListItem => "ListItem",
            SpanKind::FencedCodeBlock => "FencedCodeBlock",
            SpanKind::IndentedCodeBlock => "IndentedCodeBlock",
            SpanKind::HtmlBlock => "HtmlBlock",
            SpanKind::Link { .. } => "Link",
            SpanKind::Image { .. } => "Image",
            SpanKind::Emphasis => "Emphasis",
            SpanKind::StrongEmphasis => "StrongEmphasis",
            SpanKind::Code => "Code",
            SpanKind::HtmlInline => "HtmlInline",
            SpanKind::Text => "Text",
            SpanKind::SoftLineBreak => "SoftLineBreak",
            SpanKind::HardLineBreak => "HardLineBreak",
            SpanKind::ThematicBreak => "ThematicBreak",
        }
    }
}

/// A group of directives that together style a single markdown unit. Since the span
/// describes a markdown unit over a range of text, it also identifies which units are
/// present in a rendered document.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpan {
    kind: SpanKind,
    directives: Vec<Directive>,
}

impl GroupSpan {
    pub fn new(kind: SpanKind) -> Self {
        Self {
            kind,
            directives: Vec::new(),
        }
    }

    /// Appends a directive. Later directives win over earlier ones affecting the same
    /// visual property.
    pub fn add(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    pub fn with(mut self, directive: Directive) -> Self {
        self.add(directive);
        self
    }

    pub fn kind(&self) -> &SpanKind {
        &self.kind
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn priority(&self) -> Priority {
        match self.kind {
            SpanKind::Document => Priority::High,
            SpanKind::Code | SpanKind::Text => Priority::Low,
            _ => Priority::Medium,
        }
    }

    /// A representative node for this span. Leaf kinds take `literal` as their content,
    /// falling back to an empty string.
    pub fn to_node(&self, literal: Option<&str>) -> Node {
        let literal = literal.unwrap_or_default().to_string();
        match &self.kind {
            SpanKind::Document => Node::Document(Vec::new()),
            SpanKind::Heading { level } => Node::Heading {
                level: *level,
                children: Vec::new(),
            },
            SpanKind::Paragraph => Node::Paragraph(Vec::new()),
            SpanKind::BlockQuote => Node::BlockQuote(Vec::new()),
            SpanKind::OrderedList { start, delimiter } => Node::OrderedList {
                start: *start,
                delimiter: *delimiter,
                children: Vec::new(),
            },
            SpanKind::BulletList { marker } => Node::BulletList {
                marker: *marker,
                children: Vec::new(),
            },
            SpanKind::ListItem => Node::ListItem(Vec::new()),
            SpanKind::FencedCodeBlock => Node::FencedCodeBlock {
                info: String::new(),
                literal,
                fence_char: '`',
                fence_length: 3,
                fence_indent: 4,
            },
            SpanKind::IndentedCodeBlock => Node::IndentedCodeBlock(literal),
            SpanKind::HtmlBlock => Node::HtmlBlock(literal),
            SpanKind::Link { destination } => Node::Link {
                destination: destination.clone(),
                title: None,
                children: Vec::new(),
            },
            SpanKind::Image { destination } => Node::Image {
                destination: destination.clone(),
                title: None,
                children: Vec::new(),
            },
            SpanKind::Emphasis => Node::Emphasis(Vec::new()),
            SpanKind::StrongEmphasis => Node::StrongEmphasis(Vec::new()),
            SpanKind::Code => Node::Code(literal),
            SpanKind::HtmlInline => Node::HtmlInline(literal),
            SpanKind::Text => Node::Text(literal),
            SpanKind::SoftLineBreak => Node::SoftLineBreak,
            SpanKind::HardLineBreak => Node::HardLineBreak,
            SpanKind::ThematicBreak => Node::ThematicBreak,
        }
    }
}

/// What an annotation applies: a whole markdown unit, or a single layout directive the
/// renderer computes itself (list prefixes, item margins, tab stops, item spacing).
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Span(GroupSpan),
    Layout(Directive),
}

/// A mark over the half-open byte range `[start, end)` of the rendered text.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub mark: Mark,
    pub range: Range<usize>,
}

impl Annotation {
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    pub fn span(&self) -> Option<&GroupSpan> {
        match &self.mark {
            Mark::Span(span) => Some(span),
            Mark::Layout(_) => None,
        }
    }

    pub fn layout(&self) -> Option<&Directive> {
        match &self.mark {
            Mark::Span(_) => None,
            Mark::Layout(directive) => Some(directive),
        }
    }
}
