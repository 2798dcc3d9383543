use std::fmt;

use crate::node::Node;

/// Nodes below this depth are elided from the dump.
pub const MAX_PRINT_DEPTH: usize = 256;

/// Displays the tree rooted at a node, one node per line, children indented by two
/// spaces under their parent.
pub struct TreeDisplay<'a>(pub &'a Node);

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self.0, 0)
    }
}

pub fn print_tree(node: &Node) -> String {
    TreeDisplay(node).to_string()
}

/// Emits the tree at debug level.
pub fn log_tree(node: &Node) {
    tracing::debug!("document tree\n{}", TreeDisplay(node));
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    if depth >= MAX_PRINT_DEPTH {
        return writeln!(f, "{indent}...");
    }

    write!(f, "{indent}{}", node.kind_name())?;
    match node {
        Node::Heading { level, .. } => write!(f, " level={level}")?,
        Node::OrderedList {
            start, delimiter, ..
        } => write!(f, " start={start} delimiter={delimiter:?}")?,
        Node::BulletList { marker, .. } => write!(f, " marker={marker:?}")?,
        Node::Link { destination, .. } | Node::Image { destination, .. } => {
            write!(f, " destination={destination:?}")?
        }
        Node::FencedCodeBlock { info, .. } if !info.is_empty() => write!(f, " info={info:?}")?,
        _ => {}
    }
    if let Some(literal) = node.literal() {
        write!(f, " {literal:?}")?;
    }
    writeln!(f)?;

    for child in node.children() {
        write_node(f, child, depth + 1)?;
    }
    Ok(())
}
