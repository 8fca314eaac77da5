//! Representations for the restricted Redcode dialect used by the MARS
//! simulator
//!
//! The dialect covers eight opcodes (`DAT`, `MOV`, `ADD`, `SUB`, `JMP`,
//! `JMZ`, `DJZ`, `CMP`) and three addressing modes (immediate `#`,
//! relative, indirect `@`).  Every instruction packs into a 32-bit word:
//! a 4-bit opcode, two 2-bit addressing modes, and two signed 12-bit
//! operand fields.
//!
//! This crate holds the data model and the wire encoding.  Execution
//! semantics live in `mars-core`, and the text parser lives in
//! `redcode-parser`.

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

// used to convert redcode enums to numerical values
#[macro_use]
extern crate num_derive;

/// Standard representations for redcode instructions and their wire form
mod instruction;
pub use crate::instruction::*;
