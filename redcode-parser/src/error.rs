use core::fmt;

/// The recognized kinds of per-line diagnostics.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParseErrorKind {
    /// A line holds the wrong number of whitespace-separated tokens for
    /// its opcode
    InvalidArgumentsLength,
    /// The first token of a line is not a registered opcode mnemonic
    InvalidOpcodeName,
    /// The source contains no instructions at all
    EmptyCode,
    /// An operand token carries neither a mode prefix nor a bare decimal
    /// value
    OperandPrefix,
    /// An operand token has a recognizable shape but its numeric part
    /// does not parse
    OperandValue,
}

/// A single located diagnostic produced by the validator.
///
/// `line_index` is 1-based.  [`ParseErrorKind::EmptyCode`] is the one
/// kind with no location to point at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    /// What went wrong
    pub kind: ParseErrorKind,
    /// Human-readable description of the failure
    pub message: String,
    /// 1-based index of the offending line, where one exists
    pub line_index: Option<usize>,
    /// Original text of the offending line, where one exists
    pub line: Option<String>,
}

impl ParseError {
    /// The diagnostic for a source with no instructions in it.
    #[must_use]
    pub fn empty_code() -> Self {
        Self {
            kind: ParseErrorKind::EmptyCode,
            message: "empty code".into(),
            line_index: None,
            line: None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line_index, self.line.as_deref()) {
            (Some(index), Some(text)) => {
                write!(f, "{} at line {index}: {text}", self.message)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

/// A diagnostic that knows its kind and message but not yet its line.
///
/// Token-level checks produce these; the validator attaches the line
/// location with [`PartialParseError::at`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartialParseError {
    /// What went wrong
    pub kind: ParseErrorKind,
    /// Human-readable description of the failure
    pub message: String,
}

impl PartialParseError {
    /// Create a diagnostic that still needs a location.
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Attach the 1-based line index and line text.
    #[must_use]
    pub fn at(self, line_index: usize, line: &str) -> ParseError {
        ParseError {
            kind: self.kind,
            message: self.message,
            line_index: Some(line_index),
            line: Some(line.into()),
        }
    }
}

/// Why a source failed to turn into a program.
///
/// `Invalid` keeps the complete diagnostic list rather than flattening
/// it, so callers can report every bad line at once.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseFailure {
    /// The validator rejected one or more lines
    Invalid(Vec<ParseError>),
    /// The program parsed but holds more instructions than allowed
    SizeLimit {
        /// Number of instructions the source parsed into
        size: usize,
        /// Configured maximum program size
        max: usize,
    },
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Invalid(ref errors) => {
                writeln!(f, "code parsing failed:")?;
                for error in errors {
                    writeln!(f, "  {error}")?;
                }
                Ok(())
            }
            Self::SizeLimit { size, max } => {
                write!(f, "program size exceeded: {size} > {max}")
            }
        }
    }
}
