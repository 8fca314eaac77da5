use core::fmt;

use redcode::{DecodeError, Mode};
use redcode_parser::ParseFailure;

/// Result type shared by the machine API
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/// A failure that kills the process whose tick raised it.
///
/// Runtime errors never escape [`crate::Process::tick`]; they are
/// recorded as the process's death reason while the rest of the battle
/// continues.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RuntimeError {
    /// The cell under the instruction pointer does not decode
    Decode(DecodeError),
    /// An operand with this addressing mode has no core address
    BadMode(Mode),
    /// A `DAT` cell was executed
    Dat,
}

impl From<DecodeError> for RuntimeError {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Decode(error) => write!(f, "{error}"),
            Self::BadMode(mode) => {
                write!(f, "operand mode {mode:?} has no core address")
            }
            Self::Dat => write!(f, "DAT instruction encountered"),
        }
    }
}

/// Possible error kinds for operations on the machine API
#[derive(Debug)]
pub enum CoreError {
    /// Out of range or otherwise illegal inputs
    InvalidParam(&'static str),

    /// No free sector is large enough for the requested allocation
    OutOfMemory {
        /// Number of cells the allocation asked for
        requested: usize,
    },

    /// The warrior source was rejected; carries the full diagnostic set
    Parse(ParseFailure),

    /// `run` was called on a machine that has already ticked
    AlreadyRunning,

    /// A warrior file could not be read
    Io(std::io::Error),
}

impl From<ParseFailure> for CoreError {
    fn from(failure: ParseFailure) -> Self {
        Self::Parse(failure)
    }
}

impl From<std::io::Error> for CoreError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::InvalidParam(msg) => {
                write!(f, "invalid machine parameter: {msg}")
            }
            Self::OutOfMemory { requested } => {
                write!(f, "no free sector large enough for {requested} cells")
            }
            Self::Parse(ref failure) => write!(f, "{failure}"),
            Self::AlreadyRunning => {
                write!(f, "machine has already started running")
            }
            Self::Io(ref error) => write!(f, "failed to read warrior: {error}"),
        }
    }
}
