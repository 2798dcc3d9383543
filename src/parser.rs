use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag};

use crate::node::Node;

/// Containers nested deeper than this are folded into their innermost kept ancestor,
/// which bounds the depth of every parsed tree.
pub const MAX_NESTING: usize = 512;

/// Parse CommonMark text into a document tree
pub fn parse(markdown: &str) -> Node {
    parse_with_limit(markdown, MAX_NESTING)
}

/// Like [`parse`], keeping at most `max_nesting` open containers below the document.
pub fn parse_with_limit(markdown: &str, max_nesting: usize) -> Node {
    let parser = Parser::new(markdown).into_offset_iter();
    let mut state = ParseState::new(max_nesting);

    for (event, range) in parser {
        process_event(event, range, markdown, &mut state);
    }

    state.finish()
}

/// What an open container becomes once its end event arrives.
enum Pending {
    Document,
    Paragraph,
    Heading(u8),
    BlockQuote,
    OrderedList { start: i64, delimiter: char },
    BulletList { marker: char },
    Item,
    FencedCode(Fence),
    IndentedCode,
    HtmlBlock,
    Emphasis,
    Strong,
    Link { destination: String, title: Option<String> },
    Image { destination: String, title: Option<String> },
    Other(&'static str),
}

struct Fence {
    info: String,
    fence_char: char,
    fence_length: usize,
    fence_indent: usize,
}

struct Frame {
    pending: Pending,
    children: Vec<Node>,
    // Raw content of code and html blocks
    literal: String,
}

impl Frame {
    fn new(pending: Pending) -> Self {
        Self {
            pending,
            children: Vec::new(),
            literal: String::new(),
        }
    }

    fn collects_literal(&self) -> bool {
        matches!(
            self.pending,
            Pending::FencedCode(_) | Pending::IndentedCode | Pending::HtmlBlock
        )
    }

    fn push(&mut self, node: Node) {
        // Adjacent text runs are merged so each run of plain text is a single leaf.
        if let (Node::Text(next), Some(Node::Text(previous))) = (&node, self.children.last_mut())
        {
            previous.push_str(next);
            return;
        }
        self.children.push(node);
    }

    fn into_node(self) -> Node {
        let Frame {
            pending,
            children,
            literal,
        } = self;
        match pending {
            Pending::Document => Node::Document(children),
            Pending::Paragraph => Node::Paragraph(children),
            Pending::Heading(level) => Node::Heading { level, children },
            Pending::BlockQuote => Node::BlockQuote(children),
            Pending::OrderedList { start, delimiter } => Node::OrderedList {
                start,
                delimiter,
                children,
            },
            Pending::BulletList { marker } => Node::BulletList { marker, children },
            Pending::Item => Node::ListItem(wrap_inline_runs(children)),
            Pending::FencedCode(fence) => Node::FencedCodeBlock {
                info: fence.info,
                literal,
                fence_char: fence.fence_char,
                fence_length: fence.fence_length,
                fence_indent: fence.fence_indent,
            },
            Pending::IndentedCode => Node::IndentedCodeBlock(literal),
            Pending::HtmlBlock => Node::HtmlBlock(literal),
            Pending::Emphasis => Node::Emphasis(children),
            Pending::Strong => Node::StrongEmphasis(children),
            Pending::Link { destination, title } => Node::Link {
                destination,
                title,
                children,
            },
            Pending::Image { destination, title } => Node::Image {
                destination,
                title,
                children,
            },
            Pending::Other(name) => Node::Unsupported {
                name: name.to_string(),
                children,
            },
        }
    }
}

struct ParseState {
    // Open containers, the document at the bottom
    stack: Vec<Frame>,
    max_nesting: usize,
    // Containers opened past `max_nesting` and not closed yet
    folded: usize,
}

impl ParseState {
    fn new(max_nesting: usize) -> Self {
        Self {
            stack: vec![Frame::new(Pending::Document)],
            max_nesting,
            folded: 0,
        }
    }

    fn top(&mut self) -> &mut Frame {
        // The document frame is never popped by an end event.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn open(&mut self, pending: Pending) {
        if self.stack.len() > self.max_nesting {
            if self.folded == 0 {
                tracing::debug!(
                    limit = self.max_nesting,
                    "nesting limit reached, folding deeper containers"
                );
            }
            self.folded += 1;
            return;
        }
        self.stack.push(Frame::new(pending));
    }

    fn close(&mut self) {
        if self.folded > 0 {
            self.folded -= 1;
            return;
        }
        if self.stack.len() < 2 {
            tracing::debug!("ignoring unbalanced end event");
            return;
        }
        if let Some(frame) = self.stack.pop() {
            let node = frame.into_node();
            self.top().push(node);
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.close();
        }
        match self.stack.pop() {
            Some(frame) => frame.into_node(),
            None => Node::Document(Vec::new()),
        }
    }
}

fn process_event(event: Event, range: Range<usize>, source: &str, state: &mut ParseState) {
    match event {
        Event::Start(tag) => {
            let pending = match tag {
                Tag::Paragraph => Pending::Paragraph,
                Tag::Heading { level, .. } => Pending::Heading(heading_level_to_u8(level)),
                Tag::BlockQuote(_) => Pending::BlockQuote,
                Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                    Pending::FencedCode(fence_at(&source[range], info.into_string()))
                }
                Tag::CodeBlock(CodeBlockKind::Indented) => Pending::IndentedCode,
                Tag::HtmlBlock => Pending::HtmlBlock,
                Tag::List(Some(start)) => Pending::OrderedList {
                    start: i64::try_from(start).unwrap_or(i64::MAX),
                    delimiter: ordered_delimiter(&source[range]),
                },
                Tag::List(None) => Pending::BulletList {
                    marker: bullet_marker(&source[range]),
                },
                Tag::Item => Pending::Item,
                Tag::Emphasis => Pending::Emphasis,
                Tag::Strong => Pending::Strong,
                Tag::Link {
                    dest_url, title, ..
                } => Pending::Link {
                    destination: dest_url.into_string(),
                    title: non_empty(title.into_string()),
                },
                Tag::Image {
                    dest_url, title, ..
                } => Pending::Image {
                    destination: dest_url.into_string(),
                    title: non_empty(title.into_string()),
                },
                _ => Pending::Other("Unsupported"),
            };
            state.open(pending);
        }
        Event::End(_) => state.close(),

        Event::Text(text) => {
            let top = state.top();
            if top.collects_literal() {
                top.literal.push_str(&text);
            } else {
                top.push(Node::Text(text.into_string()));
            }
        }
        Event::Html(html) => {
            let top = state.top();
            if top.collects_literal() {
                top.literal.push_str(&html);
            } else {
                top.push(Node::HtmlInline(html.into_string()));
            }
        }
        Event::InlineHtml(html) => state.top().push(Node::HtmlInline(html.into_string())),
        Event::Code(code) => state.top().push(Node::Code(code.into_string())),
        Event::SoftBreak => state.top().push(Node::SoftLineBreak),
        Event::HardBreak => state.top().push(Node::HardLineBreak),
        Event::Rule => state.top().push(Node::ThematicBreak),

        // Ignore other events
        _ => {}
    }
}

/// Tight list items hold their inline content directly. Wrap each run of inline nodes
/// in a paragraph so every item has the same block structure as a loose one.
fn wrap_inline_runs(children: Vec<Node>) -> Vec<Node> {
    let mut blocks = Vec::new();
    let mut run = Vec::new();
    for child in children {
        if child.is_inline() {
            run.push(child);
        } else {
            if !run.is_empty() {
                blocks.push(Node::Paragraph(std::mem::take(&mut run)));
            }
            blocks.push(child);
        }
    }
    if !run.is_empty() {
        blocks.push(Node::Paragraph(run));
    }
    blocks
}

fn marker_text(source: &str) -> &str {
    source.trim_start_matches(|c: char| c.is_whitespace() || c == '>')
}

fn bullet_marker(source: &str) -> char {
    match marker_text(source).chars().next() {
        Some(c @ ('-' | '+' | '*')) => c,
        _ => '*',
    }
}

fn ordered_delimiter(source: &str) -> char {
    match marker_text(source)
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .chars()
        .next()
    {
        Some(')') => ')',
        _ => '.',
    }
}

fn fence_at(source: &str, info: String) -> Fence {
    let fence_indent = source.len() - source.trim_start_matches(' ').len();
    let rest = &source[fence_indent..];
    let fence_char = match rest.chars().next() {
        Some('~') => '~',
        _ => '`',
    };
    let fence_length = rest.chars().take_while(|c| *c == fence_char).count();
    Fence {
        info,
        fence_char,
        fence_length,
        fence_indent,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(markdown: &str) -> Vec<Node> {
        match parse(markdown) {
            Node::Document(children) => children,
            other => panic!("expected document, got {other:?}"),
        }
    }

    #[test]
    fn heading_and_paragraph() {
        assert_eq!(
            blocks("# H1\nbody"),
            vec![
                Node::Heading {
                    level: 1,
                    children: vec![Node::text("H1")],
                },
                Node::Paragraph(vec![Node::text("body")]),
            ]
        );
    }

    #[test]
    fn adjacent_text_is_merged() {
        assert_eq!(
            blocks("he'd [not]"),
            vec![Node::Paragraph(vec![Node::text("he'd [not]")])]
        );
    }

    #[test]
    fn tight_list_items_get_paragraphs() {
        assert_eq!(
            blocks("3. a\n4. b"),
            vec![Node::OrderedList {
                start: 3,
                delimiter: '.',
                children: vec![
                    Node::ListItem(vec![Node::Paragraph(vec![Node::text("a")])]),
                    Node::ListItem(vec![Node::Paragraph(vec![Node::text("b")])]),
                ],
            }]
        );
    }

    #[test]
    fn list_markers_come_from_source() {
        let parsed = blocks("- a\n\n1) b");
        assert!(matches!(parsed[0], Node::BulletList { marker: '-', .. }));
        assert!(matches!(
            parsed[1],
            Node::OrderedList {
                delimiter: ')',
                ..
            }
        ));
    }

    #[test]
    fn nested_list_stays_inside_item() {
        let parsed = blocks("* a\n  1. x\n* b");
        let Node::BulletList { children, .. } = &parsed[0] else {
            panic!("expected bullet list");
        };
        assert_eq!(children.len(), 2);
        let Node::ListItem(first) = &children[0] else {
            panic!("expected item");
        };
        assert_eq!(first[0], Node::Paragraph(vec![Node::text("a")]));
        assert!(matches!(first[1], Node::OrderedList { start: 1, .. }));
    }

    #[test]
    fn fenced_code_keeps_literal_and_fence() {
        let parsed = blocks("~~~~rust\nlet x = 1;\n~~~~");
        assert_eq!(
            parsed,
            vec![Node::FencedCodeBlock {
                info: "rust".to_string(),
                literal: "let x = 1;\n".to_string(),
                fence_char: '~',
                fence_length: 4,
                fence_indent: 0,
            }]
        );
    }

    #[test]
    fn inline_leaves() {
        assert_eq!(
            blocks("a `b` <em>c</em>\\\nd"),
            vec![Node::Paragraph(vec![
                Node::text("a "),
                Node::Code("b".to_string()),
                Node::text(" "),
                Node::HtmlInline("<em>".to_string()),
                Node::text("c"),
                Node::HtmlInline("</em>".to_string()),
                Node::HardLineBreak,
                Node::text("d"),
            ])]
        );
    }

    #[test]
    fn link_destination_and_title() {
        assert_eq!(
            blocks("[had](wire.com \"t\")"),
            vec![Node::Paragraph(vec![Node::Link {
                destination: "wire.com".to_string(),
                title: Some("t".to_string()),
                children: vec![Node::text("had")],
            }])]
        );
    }

    #[test]
    fn leading_rules_are_markdown() {
        assert_eq!(
            blocks("---\nfoo\n---\nbar"),
            vec![
                Node::ThematicBreak,
                Node::Heading {
                    level: 2,
                    children: vec![Node::text("foo")],
                },
                Node::Paragraph(vec![Node::text("bar")]),
            ]
        );
    }

    #[test]
    fn extension_syntax_stays_literal() {
        assert_eq!(
            blocks("~~x~~ y"),
            vec![Node::Paragraph(vec![Node::text("~~x~~ y")])]
        );
        assert_eq!(
            blocks("| A | B |\n|---|---|\n| 1 | 2 |"),
            vec![Node::Paragraph(vec![
                Node::text("| A | B |"),
                Node::SoftLineBreak,
                Node::text("|---|---|"),
                Node::SoftLineBreak,
                Node::text("| 1 | 2 |"),
            ])]
        );
    }

    fn depth(node: &Node) -> usize {
        1 + node.children().iter().map(depth).max().unwrap_or(0)
    }

    #[test]
    fn deep_nesting_is_folded() {
        let parsed = parse(&(">".repeat(20_000) + " a"));
        assert!(depth(&parsed) <= MAX_NESTING + 2);

        let parsed = parse_with_limit(&(">".repeat(10) + " a"), 3);
        assert_eq!(
            parsed,
            Node::Document(vec![Node::BlockQuote(vec![Node::BlockQuote(vec![
                Node::BlockQuote(vec![Node::text("a")])
            ])])])
        );
    }
}
