mod config;
mod error;
mod list;
mod node;
mod parser;
mod render;
mod span;
mod style;
mod tree;
mod writer;

pub use config::{
    CodeConfig, Color, Config, FontConfig, HeadingConfig, LinksConfig, ListConfig,
    ParagraphConfig, QuoteConfig, RenderOptions,
};
pub use error::{ConfigError, RenderError};
pub use list::{BULLET, ListContext, ListKind, ListStack, number_of_digits};
pub use node::Node;
pub use parser::{MAX_NESTING, parse_with_limit};
pub use render::{Rendered, Renderer};
pub use span::{Annotation, Directive, GroupSpan, LinkAction, LinkCallback, Mark, Priority, SpanKind};
pub use style::{Placement, StyleSheet};
pub use tree::{MAX_PRINT_DEPTH, TreeDisplay, log_tree, print_tree};
pub use writer::TextWriter;

/// Parse markdown text into a document tree.
pub fn parse(markdown: &str) -> Node {
    parser::parse(markdown)
}

/// Render a document tree into plain text and its annotations, with the render
/// options of the style sheet's configuration.
pub fn render(document: &Node, style: &StyleSheet) -> Result<Rendered, RenderError> {
    Renderer::new(style).render(document)
}

/// Like [`render`], overriding the configured render options.
pub fn render_with_options(
    document: &Node,
    style: &StyleSheet,
    options: RenderOptions,
) -> Result<Rendered, RenderError> {
    Renderer::new(style).with_options(options).render(document)
}

/// Parse and render markdown text.
pub fn render_markdown(markdown: &str, style: &StyleSheet) -> Result<Rendered, RenderError> {
    let document = parse(markdown);
    log_tree(&document);
    render(&document, style)
}
