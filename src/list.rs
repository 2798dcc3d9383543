use crate::error::RenderError;

/// Glyph written in front of every bullet list item, whatever the source marker.
pub const BULLET: &str = "\u{2022}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListKind {
    Ordered {
        start: i64,
        /// Number of the next item.
        counter: i64,
        /// Number of the last item, sizes the prefix column of the whole list.
        largest_prefix: i64,
    },
    Bulleted {
        marker: char,
    },
}

/// Traversal state of one open list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListContext {
    pub kind: ListKind,
    /// Number of enclosing lists.
    pub depth: usize,
}

impl ListContext {
    /// The prefix text of the next item. Advances the counter of ordered lists.
    pub fn next_prefix(&mut self) -> String {
        match &mut self.kind {
            ListKind::Ordered { counter, .. } => {
                let prefix = format!("{counter}.");
                *counter = counter.saturating_add(1);
                prefix
            }
            ListKind::Bulleted { .. } => BULLET.to_string(),
        }
    }
}

/// The open lists, innermost last.
#[derive(Debug, Default)]
pub struct ListStack {
    contexts: Vec<ListContext>,
}

impl ListStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.contexts.is_empty()
    }

    /// Depth a newly pushed list would get.
    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    /// Enters an ordered list whose last item is numbered `largest_prefix`.
    pub fn push_ordered(&mut self, start: i64, largest_prefix: i64) {
        self.push(ListKind::Ordered {
            start,
            counter: start,
            largest_prefix,
        });
    }

    pub fn push_bulleted(&mut self, marker: char) {
        self.push(ListKind::Bulleted { marker });
    }

    fn push(&mut self, kind: ListKind) {
        let depth = self.depth();
        self.contexts.push(ListContext { kind, depth });
    }

    pub fn pop(&mut self) -> Result<ListContext, RenderError> {
        self.contexts.pop().ok_or(RenderError::ListUnderflow)
    }

    pub fn current(&self) -> Option<&ListContext> {
        self.contexts.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut ListContext> {
        self.contexts.last_mut()
    }
}

/// Number of decimal digits of `n`. Anything below 10, negatives included, has one.
pub fn number_of_digits(n: i64) -> u32 {
    let mut digits = 1;
    let mut bound: i128 = 10;
    while i128::from(n) >= bound {
        digits += 1;
        bound *= 10;
    }
    digits
}
