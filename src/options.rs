use std::fmt;

/// Delimiter separating inline array values and tabular row cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Pipe => '|',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ',' => Some(Delimiter::Comma),
            '\t' => Some(Delimiter::Tab),
            '|' => Some(Delimiter::Pipe),
            _ => None,
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Indentation unit. Only space indentation exists in TOON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
}

impl Indent {
    pub fn spaces(count: usize) -> Self {
        Indent::Spaces(count)
    }

    pub(crate) fn width(self) -> usize {
        let Indent::Spaces(count) = self;
        count.max(1)
    }
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(2)
    }
}

/// Whether the encoder folds single-key object chains into dotted keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCollapsing {
    #[default]
    Off,
    Safe,
}

/// Whether the decoder splits dotted keys back into nested objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpandPaths {
    #[default]
    Off,
    Safe,
}

pub(crate) const DEFAULT_MAX_DEPTH: usize = 1000;

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub indent: Indent,
    pub delimiter: Delimiter,
    pub key_collapsing: KeyCollapsing,
    /// Maximum number of key segments a collapsed chain may use; `None`
    /// means unlimited.
    pub flatten_depth: Option<usize>,
    /// Value nesting limit enforced by the normalizer.
    pub max_depth: usize,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_key_collapsing(mut self, key_collapsing: KeyCollapsing) -> Self {
        self.key_collapsing = key_collapsing;
        self
    }

    pub fn with_flatten_depth(mut self, flatten_depth: Option<usize>) -> Self {
        self.flatten_depth = flatten_depth;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            indent: Indent::default(),
            delimiter: Delimiter::default(),
            key_collapsing: KeyCollapsing::default(),
            flatten_depth: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub indent: Indent,
    pub strict: bool,
    pub expand_paths: ExpandPaths,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_expand_paths(mut self, expand_paths: ExpandPaths) -> Self {
        self.expand_paths = expand_paths;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            indent: Indent::default(),
            strict: true,
            expand_paths: ExpandPaths::default(),
        }
    }
}
