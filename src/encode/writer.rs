//! Indent-aware line buffer behind the encoder.

/// Collects `(depth, content)` pairs and renders them with the configured
/// indentation unit. Content is right-trimmed at flush time and the final
/// document carries no trailing newline.
pub(crate) struct Writer {
    indent: usize,
    lines: Vec<(usize, String)>,
}

impl Writer {
    pub(crate) fn new(indent: usize) -> Self {
        Self { indent, lines: Vec::new() }
    }

    pub(crate) fn push(&mut self, depth: usize, content: String) {
        self.lines.push((depth, content));
    }

    pub(crate) fn into_lines(self) -> Vec<String> {
        let Self { indent, lines } = self;
        lines
            .into_iter()
            .map(|(depth, content)| {
                let content = content.trim_end();
                let mut line = String::with_capacity(depth * indent + content.len());
                for _ in 0..depth * indent {
                    line.push(' ');
                }
                line.push_str(content);
                line
            })
            .collect()
    }

    pub(crate) fn finish(self) -> String {
        self.into_lines().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_indents_by_depth() {
        let mut writer = Writer::new(2);
        writer.push(0, "a:".to_string());
        writer.push(1, "b: 1".to_string());
        writer.push(2, "c: 2".to_string());
        assert_eq!(writer.finish(), "a:\n  b: 1\n    c: 2");
    }

    #[rstest::rstest]
    fn test_trims_trailing_whitespace_only() {
        let mut writer = Writer::new(4);
        writer.push(1, "key: value  ".to_string());
        assert_eq!(writer.finish(), "    key: value");
    }

    #[rstest::rstest]
    fn test_no_trailing_newline_and_empty_lines() {
        let mut writer = Writer::new(2);
        writer.push(0, "a: 1".to_string());
        writer.push(0, String::new());
        writer.push(0, "b: 2".to_string());
        assert_eq!(writer.finish(), "a: 1\n\nb: 2");

        let empty = Writer::new(2);
        assert_eq!(empty.finish(), "");
    }

    #[rstest::rstest]
    fn test_into_lines_matches_finish() {
        let mut writer = Writer::new(2);
        writer.push(0, "a:".to_string());
        writer.push(1, "b: 1".to_string());
        assert_eq!(writer.into_lines(), vec!["a:".to_string(), "  b: 1".to_string()]);
    }
}
