use std::ops::{Range, RangeInclusive};

use crate::config::RenderOptions;
use crate::error::RenderError;
use crate::list::{ListKind, ListStack, number_of_digits};
use crate::node::Node;
use crate::span::{Annotation, Directive, GroupSpan};
use crate::style::{Placement, StyleSheet};
use crate::writer::TextWriter;

/// Plain text plus the annotations styling it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub annotations: Vec<Annotation>,
}

impl Rendered {
    pub fn text_at(&self, annotation: &Annotation) -> &str {
        &self.text[annotation.range.clone()]
    }

    /// Group spans with their ranges, in the order they were set.
    pub fn spans(&self) -> impl Iterator<Item = (&GroupSpan, Range<usize>)> {
        self.annotations
            .iter()
            .filter_map(|a| a.span().map(|span| (span, a.range.clone())))
    }

    /// The text under every span of the named kind.
    pub fn span_texts(&self, kind: &str) -> Vec<&str> {
        self.spans()
            .filter(|(span, _)| span.kind().name() == kind)
            .map(|(_, range)| &self.text[range])
            .collect()
    }

    /// Layout directives set over exactly `range`.
    pub fn layouts_in(&self, range: Range<usize>) -> Vec<&Directive> {
        self.annotations
            .iter()
            .filter(|a| a.range == range)
            .filter_map(Annotation::layout)
            .collect()
    }

    /// Rebuilds the markdown unit at `offset` from the innermost span covering it.
    /// Spans over the same range are ordered by priority.
    pub fn node_at(&self, offset: usize) -> Option<Node> {
        self.spans()
            .filter(|(_, range)| range.contains(&offset))
            .min_by_key(|(span, range)| (range.len(), span.priority()))
            .map(|(span, range)| span.to_node(Some(&self.text[range])))
    }
}

/// Column geometry of one list item prefix.
#[derive(Debug, Clone, Copy)]
struct PrefixGeometry {
    digits: u32,
    digit_width: i32,
    tab_location: i32,
    indentation: i32,
}

/// Walks a document tree depth first and writes its text, marking each markdown unit
/// with the span the style sheet provides for it. Text is written on the way down,
/// spans are set on the way up once the unit's extent is known.
///
/// A renderer holds the traversal state of a single document and is consumed by
/// [`Renderer::render`].
#[derive(Debug)]
pub struct Renderer<'a> {
    style: &'a StyleSheet,
    options: RenderOptions,
    writer: TextWriter,
    lists: ListStack,
    // Extent of every list rendered so far, from its saved start to the cursor after it
    list_ranges: Vec<RangeInclusive<usize>>,
    depth: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(style: &'a StyleSheet) -> Self {
        Self {
            style,
            options: style.config().render.clone(),
            writer: TextWriter::new(),
            lists: ListStack::new(),
            list_ranges: Vec::new(),
            depth: 0,
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn render(mut self, document: &Node) -> Result<Rendered, RenderError> {
        tracing::debug!(root = document.kind_name(), "rendering document");
        self.visit(document, None)?;
        debug_assert_eq!(self.writer.saved_depth(), 0);
        debug_assert!(!self.lists.is_active());

        let (text, annotations) = self.writer.finish();
        tracing::debug!(
            len = text.len(),
            annotations = annotations.len(),
            "rendered document"
        );
        Ok(Rendered { text, annotations })
    }

    fn visit(&mut self, node: &Node, parent: Option<&Node>) -> Result<(), RenderError> {
        if self.depth >= self.options.max_depth {
            return Err(RenderError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = self.visit_node(node, parent);
        self.depth -= 1;
        result
    }

    fn visit_children(&mut self, node: &Node) -> Result<(), RenderError> {
        for child in node.children() {
            self.visit(child, Some(node))?;
        }
        Ok(())
    }

    /// Saves the cursor, runs `body` with it and retrieves it again, whether or not
    /// `body` succeeded. Returns the saved start.
    fn enclose(
        &mut self,
        body: impl FnOnce(&mut Self, usize) -> Result<(), RenderError>,
    ) -> Result<usize, RenderError> {
        let start = self.writer.save_cursor();
        let result = body(self, start);
        let saved = self.writer.retrieve_cursor()?;
        result.map(|()| saved)
    }

    /// Marks `[start, cursor)` with the node's span.
    fn set_span(&mut self, node: &Node, parent: Option<&Node>, start: usize) {
        let span = self.style.span_for(node, placement(parent));
        self.writer.set_span(span, start);
    }

    /// Block units end with exactly one newline, except paragraphs nested in another
    /// block, whose container handles the line ending.
    fn line_if_needed(&mut self, node: &Node, parent: Option<&Node>) {
        if matches!(node, Node::Paragraph(_)) && placement(parent) == Placement::Nested {
            return;
        }
        self.writer.line_if_needed();
    }

    fn visit_node(&mut self, node: &Node, parent: Option<&Node>) -> Result<(), RenderError> {
        match node {
            Node::Document(_) => self.visit_children(node),

            Node::Heading { .. } | Node::Paragraph(_) => {
                let start = self.enclose(|r, _| {
                    r.visit_children(node)?;
                    r.line_if_needed(node, parent);
                    Ok(())
                })?;
                self.set_span(node, parent, start);
                Ok(())
            }

            Node::BlockQuote(_) => self.visit_block_quote(node, parent),

            Node::OrderedList { start, .. } => {
                let first = *start;
                let largest = node.largest_prefix().unwrap_or(first);
                self.visit_list(node, parent, |lists| lists.push_ordered(first, largest))
            }

            Node::BulletList { marker, .. } => {
                let marker = *marker;
                self.visit_list(node, parent, |lists| lists.push_bulleted(marker))
            }

            Node::ListItem(_) => self.visit_list_item(node, parent),

            Node::FencedCodeBlock { literal, .. } | Node::IndentedCodeBlock(literal) => {
                let start = self.enclose(|r, _| {
                    r.writer.write(literal);
                    Ok(())
                })?;
                self.set_span(node, parent, start);
                Ok(())
            }

            Node::HtmlBlock(literal) => {
                let start = self.enclose(|r, _| {
                    r.writer.write(literal);
                    r.line_if_needed(node, parent);
                    Ok(())
                })?;
                self.set_span(node, parent, start);
                Ok(())
            }

            Node::Link { .. } | Node::Image { .. } | Node::Emphasis(_) | Node::StrongEmphasis(_) => {
                let start = self.enclose(|r, _| r.visit_children(node))?;
                self.set_span(node, parent, start);
                Ok(())
            }

            Node::Code(literal) | Node::HtmlInline(literal) | Node::Text(literal) => {
                let start = self.enclose(|r, _| {
                    r.writer.write(literal);
                    Ok(())
                })?;
                self.set_span(node, parent, start);
                Ok(())
            }

            Node::SoftLineBreak => {
                let as_line = self.options.soft_breaks_as_hard_breaks;
                let start = self.enclose(|r, _| {
                    if as_line {
                        r.writer.line();
                    } else {
                        r.writer.space();
                    }
                    Ok(())
                })?;
                self.set_span(node, parent, start);
                Ok(())
            }

            Node::HardLineBreak => {
                let start = self.enclose(|r, _| {
                    r.writer.line();
                    Ok(())
                })?;
                self.set_span(node, parent, start);
                Ok(())
            }

            Node::ThematicBreak => {
                let start = self.enclose(|r, _| {
                    r.writer.write("---\n");
                    Ok(())
                })?;
                self.set_span(node, parent, start);
                Ok(())
            }

            Node::Unsupported { name, .. } => {
                tracing::debug!(%name, "no dedicated rendering, using placeholder span");
                let start = self.enclose(|r, _| r.visit_children(node))?;
                self.set_span(node, parent, start);
                Ok(())
            }
        }
    }

    /// Quotes nested in quotes are flattened into the outermost one: they get a line of
    /// their own but, unless configured otherwise, no span.
    fn visit_block_quote(&mut self, node: &Node, parent: Option<&Node>) -> Result<(), RenderError> {
        if matches!(parent, Some(Node::BlockQuote(_))) {
            self.writer.line();
        }
        let start = self.enclose(|r, _| {
            r.visit_children(node)?;
            r.line_if_needed(node, parent);
            Ok(())
        })?;
        if placement(parent) == Placement::Outermost || !self.options.flatten_nested_quotes {
            self.set_span(node, parent, start);
        }
        Ok(())
    }

    fn visit_list(
        &mut self,
        node: &Node,
        parent: Option<&Node>,
        enter: impl FnOnce(&mut ListStack),
    ) -> Result<(), RenderError> {
        let start = self.enclose(|r, _| {
            // a nested list starts on its own line
            if r.lists.is_active() {
                r.writer.line();
            }
            enter(&mut r.lists);
            let result = r.visit_children(node);
            r.lists.pop()?;
            result?;
            r.line_if_needed(node, parent);
            Ok(())
        })?;
        self.set_span(node, parent, start);
        self.list_ranges.push(start..=self.writer.cursor());
        Ok(())
    }

    /// Prefix text and geometry for the next item of the innermost list. Items outside
    /// any list get no prefix and the standard geometry.
    fn next_prefix(&mut self) -> (String, PrefixGeometry) {
        let digit_width = self.style.max_digit_width();
        let content_margin = self.style.list_item_content_margin();
        let gap = self.style.list_prefix_gap_width();

        let Some(context) = self.lists.current_mut() else {
            let geometry = PrefixGeometry {
                digits: 3,
                digit_width,
                tab_location: content_margin,
                indentation: 0,
            };
            return (String::new(), geometry);
        };

        let depth = i32::try_from(context.depth).unwrap_or(i32::MAX);
        let indentation = depth.saturating_mul(content_margin);
        let geometry = match context.kind {
            ListKind::Ordered { largest_prefix, .. } => {
                // room for the widest number in this list, at least two digits, plus "."
                let digits = number_of_digits(largest_prefix).max(2) + 1;
                PrefixGeometry {
                    digits,
                    digit_width,
                    tab_location: (digits as i32).saturating_mul(digit_width).saturating_add(gap),
                    indentation,
                }
            }
            // one bullet as wide as three digits, aligned with number prefixes
            ListKind::Bulleted { .. } => PrefixGeometry {
                digits: 1,
                digit_width: digit_width.saturating_mul(3),
                tab_location: content_margin,
                indentation,
            },
        };
        (context.next_prefix(), geometry)
    }

    fn visit_list_item(&mut self, node: &Node, parent: Option<&Node>) -> Result<(), RenderError> {
        let (prefix, geometry) = self.next_prefix();
        let content_margin = self.style.list_item_content_margin();

        let start = self.enclose(|r, prefix_start| {
            r.writer.write(&prefix);
            let prefix_end = r.writer.cursor();
            r.writer.set_layout(
                Directive::AbsoluteSize(r.style.base_font_size()),
                prefix_start,
                prefix_end,
            );
            r.writer.set_layout(
                Directive::ListPrefix {
                    digits: geometry.digits,
                    digit_width: geometry.digit_width,
                    color: r.style.list_prefix_color(),
                },
                prefix_start,
                prefix_end,
            );

            r.writer.tab_if_needed();
            r.visit_children(node)?;
            r.line_if_needed(node, parent);
            Ok(())
        })?;

        // An item may hold up to three differently indented parts:
        //
        //   1.<tab>first paragraph        the tab stop places the content, so the
        //          wrapped lines          first line needs no margin and the rest one
        //          second paragraph       content margin on every line
        //          - nested list          indented by its own items
        //
        // The first part runs to `b1`, the second from `b1` to `b2`.
        let end = self.writer.cursor();
        let (b1, b2) = self.item_boundaries(start, end);
        tracing::trace!(start, b1, ?b2, end, "list item boundaries");

        let indentation = geometry.indentation;
        self.writer.set_layout(
            Directive::LeadingMargin {
                first: indentation,
                rest: indentation.saturating_add(content_margin),
            },
            start,
            b1,
        );
        self.writer
            .set_layout(Directive::TabStop(geometry.tab_location), start, b1);

        if let Some(b2) = b2 {
            self.writer.set_layout(
                Directive::LeadingMargin {
                    first: indentation.saturating_add(content_margin),
                    rest: indentation.saturating_add(content_margin),
                },
                b1,
                b2,
            );
        }

        // a nested list carries its own item spacing
        self.writer.set_layout(
            Directive::ParagraphSpacing {
                before: self.style.list_item_spacing_before(),
                after: self.style.list_item_spacing_after(),
            },
            start,
            b2.unwrap_or(b1),
        );

        self.set_span(node, parent, start);
        Ok(())
    }

    /// Splits the item `[start, end)` at its second paragraph and at its first nested
    /// list. Both positions point at the newline that precedes the part; the newline
    /// stays with the part before it.
    fn item_boundaries(&mut self, start: usize, end: usize) -> (usize, Option<usize>) {
        let last = end.saturating_sub(1);
        let second_paragraph = self.writer.as_str()[start..]
            .find('\n')
            .map(|offset| start + offset)
            .filter(|index| (start..last).contains(index));

        self.list_ranges.sort_by_key(|range| *range.start());
        let nested_list = self
            .list_ranges
            .iter()
            .find(|range| *range.start() > start && *range.end() <= end)
            .map(|range| *range.start());

        match (second_paragraph, nested_list) {
            (Some(paragraph), None) => (paragraph + 1, Some(end)),
            (None, Some(list)) => (list + 1, None),
            (Some(paragraph), Some(list)) if paragraph == list => (list + 1, None),
            (Some(paragraph), Some(list)) => (paragraph + 1, Some(list)),
            (None, None) => (end, None),
        }
    }
}

fn placement(parent: Option<&Node>) -> Placement {
    match parent {
        None | Some(Node::Document(_)) => Placement::Outermost,
        Some(_) => Placement::Nested,
    }
}
