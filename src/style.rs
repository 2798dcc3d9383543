use std::fmt;
use std::sync::Arc;

use crate::config::{Color, Config};
use crate::node::Node;
use crate::span::{Directive, GroupSpan, LinkAction, LinkCallback, SpanKind};

/// Where a node sits relative to the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The node is the root or a direct child of the document.
    Outermost,
    Nested,
}

/// Defines the style of every markdown unit. The renderer queries it for each node as
/// it walks the tree.
#[derive(Clone)]
pub struct StyleSheet {
    config: Config,
    on_click_link: LinkCallback,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleSheet")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StyleSheet {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            on_click_link: Arc::new(|_: &str| {}),
        }
    }

    /// Sets the handler called with the url of an activated link.
    pub fn with_link_handler(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_click_link = Arc::new(handler);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn scaled(&self, points: i32) -> i32 {
        (points as f32 * self.config.density) as i32
    }

    pub fn base_font_size(&self) -> i32 {
        self.scaled(self.config.font.size)
    }

    /// Width of the widest digit, in pixels.
    pub fn max_digit_width(&self) -> i32 {
        (self.config.list.digit_width * self.config.density) as i32
    }

    pub fn list_prefix_gap_width(&self) -> i32 {
        self.scaled(self.config.list.prefix_gap_width)
    }

    /// The standard leading margin of a list item: three monospace digits plus the
    /// prefix gap. This is where item content, including wrapped lines, begins.
    pub fn list_item_content_margin(&self) -> i32 {
        self.max_digit_width()
            .saturating_mul(3)
            .saturating_add(self.list_prefix_gap_width())
    }

    pub fn list_item_spacing_before(&self) -> i32 {
        self.scaled(self.config.list.item_spacing_before)
    }

    pub fn list_item_spacing_after(&self) -> i32 {
        self.scaled(self.config.list.item_spacing_after)
    }

    pub fn list_prefix_color(&self) -> Color {
        self.config.list.prefix_color
    }

    fn paragraph_spacing(&self) -> Directive {
        Directive::ParagraphSpacing {
            before: self.scaled(self.config.paragraph.spacing_before),
            after: self.scaled(self.config.paragraph.spacing_after),
        }
    }

    fn code_block(&self, kind: SpanKind) -> GroupSpan {
        let indentation = self.scaled(self.config.code.block_indentation);
        GroupSpan::new(kind)
            .with(Directive::Monospace)
            .with(Directive::LeadingMargin {
                first: indentation,
                rest: indentation,
            })
            .with(Directive::ForegroundColor(self.config.code.color))
            .with(self.paragraph_spacing())
    }

    fn link(&self, kind: SpanKind, destination: &str) -> GroupSpan {
        let action = LinkAction::new(
            destination,
            self.config.links.custom_scheme.clone(),
            Arc::clone(&self.on_click_link),
        );
        GroupSpan::new(kind)
            .with(Directive::LinkAction(action))
            .with(Directive::ForegroundColor(self.config.links.color))
    }

    /// Returns the configured span for the node.
    pub fn span_for(&self, node: &Node, placement: Placement) -> GroupSpan {
        match node {
            Node::Heading { level, .. } => GroupSpan::new(SpanKind::Heading { level: *level })
                .with(Directive::RelativeSize(
                    self.config.heading.multiplier_for(*level).unwrap_or(1.0),
                ))
                .with(self.paragraph_spacing())
                .with(Directive::Bold),
            Node::Paragraph(_) => {
                let spacing = match placement {
                    Placement::Outermost => self.paragraph_spacing(),
                    // the enclosing unit (e.g. a list item) supplies the spacing
                    Placement::Nested => Directive::ParagraphSpacing {
                        before: 0,
                        after: 0,
                    },
                };
                GroupSpan::new(SpanKind::Paragraph).with(spacing)
            }
            Node::BlockQuote(_) => {
                let quote = &self.config.quote;
                GroupSpan::new(SpanKind::BlockQuote)
                    .with(Directive::QuoteStripe {
                        color: quote.stripe_color,
                        stripe_width: self.scaled(quote.stripe_width),
                        gap_width: self.scaled(quote.gap_width),
                    })
                    .with(Directive::ParagraphSpacing {
                        before: self.scaled(quote.spacing_before),
                        after: self.scaled(quote.spacing_after),
                    })
                    .with(Directive::ForegroundColor(quote.color))
            }
            Node::OrderedList {
                start, delimiter, ..
            } => GroupSpan::new(SpanKind::OrderedList {
                start: *start,
                delimiter: *delimiter,
            }),
            Node::BulletList { marker, .. } => {
                GroupSpan::new(SpanKind::BulletList { marker: *marker })
            }
            Node::ListItem(_) => GroupSpan::new(SpanKind::ListItem),
            Node::FencedCodeBlock { .. } => self.code_block(SpanKind::FencedCodeBlock),
            Node::IndentedCodeBlock(_) => self.code_block(SpanKind::IndentedCodeBlock),
            Node::HtmlBlock(_) => self.code_block(SpanKind::HtmlBlock),
            Node::Link { destination, .. } => self.link(
                SpanKind::Link {
                    destination: destination.clone(),
                },
                destination,
            ),
            Node::Image { destination, .. } => self.link(
                SpanKind::Image {
                    destination: destination.clone(),
                },
                destination,
            ),
            Node::Emphasis(_) => GroupSpan::new(SpanKind::Emphasis).with(Directive::Italic),
            Node::StrongEmphasis(_) => {
                GroupSpan::new(SpanKind::StrongEmphasis).with(Directive::Bold)
            }
            Node::Code(_) => GroupSpan::new(SpanKind::Code)
                .with(Directive::Monospace)
                .with(Directive::ForegroundColor(self.config.code.color)),
            Node::HtmlInline(_) => GroupSpan::new(SpanKind::HtmlInline)
                .with(Directive::Monospace)
                .with(Directive::ForegroundColor(self.config.code.color)),
            Node::Text(_) => GroupSpan::new(SpanKind::Text)
                .with(Directive::AbsoluteSize(self.base_font_size()))
                .with(Directive::ForegroundColor(self.config.font.color)),
            Node::SoftLineBreak => GroupSpan::new(SpanKind::SoftLineBreak),
            Node::HardLineBreak => GroupSpan::new(SpanKind::HardLineBreak),
            Node::ThematicBreak => GroupSpan::new(SpanKind::ThematicBreak),
            Node::Document(_) | Node::Unsupported { .. } => GroupSpan::new(SpanKind::Document),
        }
    }
}
