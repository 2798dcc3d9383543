use crate::error::RenderError;
use crate::span::{Annotation, Directive, GroupSpan, Mark};

/// Builds the rendered text and its annotations with simple declarative methods to
/// append content and mark ranges.
///
/// Cursor positions saved with [`TextWriter::save_cursor`] live on a stack; every save
/// must be matched by exactly one [`TextWriter::retrieve_cursor`].
#[derive(Debug, Default)]
pub struct TextWriter {
    buffer: String,
    cursor_stack: Vec<usize>,
    annotations: Vec<Annotation>,
}

impl TextWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current write position (a byte offset). Grows whenever content is appended.
    pub fn cursor(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Number of saved cursors not yet retrieved.
    pub fn saved_depth(&self) -> usize {
        self.cursor_stack.len()
    }

    pub fn write(&mut self, content: &str) {
        self.buffer.push_str(content);
    }

    /// Appends `ch` unless it is already the last char. Returns true if appended.
    pub fn append_if_needed(&mut self, ch: char) -> bool {
        if self.buffer.ends_with(ch) {
            return false;
        }
        self.buffer.push(ch);
        true
    }

    pub fn line(&mut self) {
        self.write("\n");
    }

    pub fn line_if_needed(&mut self) -> bool {
        self.append_if_needed('\n')
    }

    pub fn space(&mut self) {
        self.write(" ");
    }

    pub fn space_if_needed(&mut self) -> bool {
        self.append_if_needed(' ')
    }

    pub fn tab(&mut self) {
        self.write("\t");
    }

    pub fn tab_if_needed(&mut self) -> bool {
        self.append_if_needed('\t')
    }

    /// Pushes the current cursor and returns it.
    pub fn save_cursor(&mut self) -> usize {
        let cursor = self.cursor();
        self.cursor_stack.push(cursor);
        cursor
    }

    /// Pops the most recently saved cursor.
    pub fn retrieve_cursor(&mut self) -> Result<usize, RenderError> {
        self.cursor_stack.pop().ok_or(RenderError::CursorUnderflow)
    }

    pub fn set(&mut self, mark: Mark, start: usize, end: usize) {
        debug_assert!(start <= end && end <= self.cursor());
        self.annotations.push(Annotation {
            mark,
            range: start..end,
        });
    }

    /// Marks `[start, cursor)` with the group span.
    pub fn set_span(&mut self, span: GroupSpan, start: usize) {
        let end = self.cursor();
        self.set(Mark::Span(span), start, end);
    }

    pub fn set_layout(&mut self, directive: Directive, start: usize, end: usize) {
        self.set(Mark::Layout(directive), start, end);
    }

    /// Trims surrounding whitespace from the text and re-bases the annotations onto the
    /// trimmed text. Annotations clamped to nothing are dropped, except zero length ones
    /// that still sit inside the kept text.
    pub fn finish(self) -> (String, Vec<Annotation>) {
        let leading = self.buffer.len() - self.buffer.trim_start().len();
        let text = self.buffer.trim().to_string();
        let len = text.len();

        let annotations = self
            .annotations
            .into_iter()
            .filter_map(|annotation| {
                let start = annotation.range.start.saturating_sub(leading).min(len);
                let end = annotation.range.end.saturating_sub(leading).min(len);
                let empty = annotation.range.is_empty();
                let inside = annotation.range.start >= leading
                    && annotation.range.start - leading <= len;
                if start < end || (empty && inside) {
                    Some(Annotation {
                        mark: annotation.mark,
                        range: start..end,
                    })
                } else {
                    None
                }
            })
            .collect();

        (text, annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanKind;

    #[test]
    fn write_advances_cursor() {
        let mut writer = TextWriter::new();
        writer.write("abc");
        writer.write("•");
        assert_eq!(writer.cursor(), 3 + '•'.len_utf8());
        assert_eq!(writer.as_str(), "abc•");
    }

    #[test]
    fn append_if_needed_skips_duplicates() {
        let mut writer = TextWriter::new();
        assert!(writer.line_if_needed());
        assert!(!writer.line_if_needed());
        assert!(writer.tab_if_needed());
        assert!(!writer.tab_if_needed());
        assert!(writer.space_if_needed());
        writer.space();
        writer.tab();
        writer.line();
        assert_eq!(writer.as_str(), "\n\t  \t\n");
    }

    #[test]
    fn cursor_stack_is_lifo() {
        let mut writer = TextWriter::new();
        assert_eq!(writer.save_cursor(), 0);
        writer.write("ab");
        assert_eq!(writer.save_cursor(), 2);
        assert_eq!(writer.saved_depth(), 2);
        assert_eq!(writer.retrieve_cursor(), Ok(2));
        assert_eq!(writer.retrieve_cursor(), Ok(0));
        assert_eq!(writer.retrieve_cursor(), Err(RenderError::CursorUnderflow));
    }

    #[test]
    fn set_span_covers_saved_start_to_cursor() {
        let mut writer = TextWriter::new();
        writer.write("x");
        writer.save_cursor();
        writer.write("bold");
        let start = writer.retrieve_cursor().unwrap();
        writer.set_span(GroupSpan::new(SpanKind::StrongEmphasis), start);
        let (text, annotations) = writer.finish();
        assert_eq!(&text[annotations[0].range.clone()], "bold");
    }

    #[test]
    fn finish_trims_and_rebases() {
        let mut writer = TextWriter::new();
        writer.line();
        writer.write("ab\n");
        writer.set_span(GroupSpan::new(SpanKind::Paragraph), 0);
        writer.set_span(GroupSpan::new(SpanKind::Text), 1);
        writer.set_span(GroupSpan::new(SpanKind::HardLineBreak), 3);
        writer.set_layout(Directive::Bold, 0, 1);
        writer.set_span(GroupSpan::new(SpanKind::Document), 1);
        let (text, annotations) = writer.finish();

        assert_eq!(text, "ab");
        let ranges: Vec<_> = annotations.iter().map(|a| a.range.clone()).collect();
        // the leading newline mark and the trailing break vanish with the whitespace
        assert_eq!(ranges, vec![0..2, 0..2, 0..2]);
    }

    #[test]
    fn finish_keeps_zero_length_marks_inside_text() {
        let mut writer = TextWriter::new();
        writer.write("a");
        writer.set_span(GroupSpan::new(SpanKind::Document), 1);
        writer.write("b");
        let (_, annotations) = writer.finish();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].range, 1..1);
    }
}
