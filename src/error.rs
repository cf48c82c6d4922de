use std::fmt;

/// Which array layout a length check was validating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Inline,
    Tabular,
    List,
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequenceKind::Inline => "inline",
            SequenceKind::Tabular => "tabular",
            SequenceKind::List => "list",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    TabsNotAllowed,
    IndentNotMultiple { indent: usize, unit: usize },
    BadHeader,
    LengthMismatch { expected: usize, actual: usize, kind: SequenceKind },
    BadEscape { sequence: String },
    BadNumber { token: String },
    ExpectedValue,
    InvalidObjectListItem,
    DepthExceeded { limit: usize },
    ExpansionConflict { path: String },
    Incomplete,
    Syntax,
    Serialize,
    Deserialize,
}

/// 1-based position of the offending line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
    pub line_content: Option<String>,
    pub suggestion: Option<&'static str>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            line_content: None,
            suggestion: None,
        }
    }

    pub fn tabs_not_allowed() -> Self {
        Self::new(
            ErrorKind::TabsNotAllowed,
            "tabs are not allowed in indentation",
        )
        .with_suggestion("indent with spaces, or decode with strict = false")
    }

    pub fn indent_not_multiple(indent: usize, unit: usize) -> Self {
        Self::new(
            ErrorKind::IndentNotMultiple { indent, unit },
            format!("indentation of {indent} is not a multiple of {unit}"),
        )
    }

    pub fn bad_header(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadHeader, message)
    }

    pub fn length_mismatch(expected: usize, actual: usize, kind: SequenceKind) -> Self {
        Self::new(
            ErrorKind::LengthMismatch { expected, actual, kind },
            format!("{kind} array declared {expected} elements but has {actual}"),
        )
    }

    pub fn bad_escape(sequence: impl Into<String>) -> Self {
        let sequence = sequence.into();
        let message = format!("invalid escape sequence `{sequence}`");
        Self::new(ErrorKind::BadEscape { sequence }, message)
            .with_suggestion("only \\\\, \\\", \\n, \\r and \\t are recognized")
    }

    pub fn bad_number(token: impl Into<String>) -> Self {
        let token = token.into();
        let message = format!("`{token}` looks numeric but is not a finite number");
        Self::new(ErrorKind::BadNumber { token }, message)
    }

    pub fn expected_value() -> Self {
        Self::new(
            ErrorKind::ExpectedValue,
            "array header promises elements but none follow",
        )
    }

    pub fn invalid_object_list_item() -> Self {
        Self::new(
            ErrorKind::InvalidObjectListItem,
            "list item is followed by nested lines but has no `:`",
        )
        .with_suggestion("write the item as `- key: value`")
    }

    pub fn depth_exceeded(limit: usize) -> Self {
        Self::new(
            ErrorKind::DepthExceeded { limit },
            format!("value nesting exceeds the limit of {limit}"),
        )
    }

    pub fn expansion_conflict(path: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("path `{path}` expands into conflicting values");
        Self::new(ErrorKind::ExpansionConflict { path }, message)
    }

    pub fn incomplete() -> Self {
        Self::new(ErrorKind::Incomplete, "event stream ended inside a container")
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn serialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialize, message)
    }

    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Deserialize, message)
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Some(Location { line, column });
        self
    }

    pub fn on_line(mut self, line: usize) -> Self {
        self.location = Some(Location { line, column: 1 });
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.line_content = Some(content.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &'static str) -> Self {
        self.suggestion = Some(suggestion);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = self.location {
            write!(f, "line {}, column {}: ", location.line, location.column)?;
        }
        f.write_str(&self.message)?;
        if let Some(content) = &self.line_content {
            write!(f, " in `{content}`")?;
        }
        if let Some(suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_display_carries_position_and_suggestion() {
        let err = Error::tabs_not_allowed().at(3, 1).with_content("\tkey: 1");
        let text = err.to_string();
        assert!(text.starts_with("line 3, column 1:"));
        assert!(text.contains("tabs are not allowed"));
        assert!(text.contains("strict = false"));
    }

    #[rstest::rstest]
    fn test_length_mismatch_message() {
        let err = Error::length_mismatch(2, 1, SequenceKind::List);
        assert_eq!(
            err.kind,
            ErrorKind::LengthMismatch { expected: 2, actual: 1, kind: SequenceKind::List }
        );
        assert!(err.to_string().contains("declared 2 elements but has 1"));
    }
}
