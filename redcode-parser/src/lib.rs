//! Validator and parser for the restricted redcode dialect
//!
//! The grammar is line oriented: one instruction per line, operands
//! separated by whitespace and optional commas, `;` starting a comment
//! that runs to the end of the line.  An operand is a decimal integer
//! with an optional addressing-mode prefix (`#` immediate, `@` indirect,
//! none relative).
//!
//! [`validate`] walks the whole source and collects one [`ParseError`]
//! per bad line instead of stopping at the first, so a warrior author
//! gets the full diagnostic set in one pass.  [`parse`] validates, then
//! emits the instruction list in source order and enforces the
//! program-size limit.

// Make clippy as annoying as possible
#![deny(
    // All typically enabled warnings are converted into errors
    // includes correctness, suspicious, style, complexity, and perf
    clippy::all,
    // Error on cargo lints
    clippy::cargo,
)]
#![warn(
    // Warn on pedantic and in-development nursery lints
    clippy::pedantic,
    clippy::nursery,
    // Lints from "restriction" group - enforce a consistent if arbitrary style
    clippy::alloc_instead_of_core,
    clippy::arithmetic_side_effects,
    clippy::unnecessary_cast,
    clippy::as_underscore,
    clippy::dbg_macro,
    clippy::default_numeric_fallback,
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::if_then_some_else_none,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    clippy::mod_module_files,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::pattern_type_mismatch,
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::shadow_unrelated,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::str_to_string,
    clippy::todo,
    clippy::unimplemented,
    clippy::unreachable,
    clippy::unwrap_in_result,
    clippy::unwrap_used,
    clippy::use_debug,
)]

/// Character that starts a comment running to the end of the line
pub const COMMENT_SIGN: char = ';';

/// Parse error taxonomy: per-line diagnostics and the grouped failure
mod error;
pub use error::{ParseError, ParseErrorKind, ParseFailure, PartialParseError};

/// nom parsers for the grammar atoms: integers and opcode names
mod primitives;

/// Line analysis shared by the validator and the parser
mod parser;
pub use parser::{parse, validate};
