//! # MARS-Core
//!
//! MARS-Core hosts battles between redcode warriors: it owns the shared
//! circular core memory, loads each warrior into a randomly allocated
//! free sector, and steps the resulting processes under a round-robin
//! scheduler until at most one remains alive.
//!
//! ## Usage
//!
//! [`Machine`] is the whole public surface.  Feed it warrior source
//! text, run it, and read the outcome back through its views:
//!
//! ```rust
//! use mars_core::Machine;
//!
//! let mut machine = Machine::new(64, false).unwrap();
//! machine.load_code("MOV 0, 1", "imp").unwrap();
//! machine.load_code("ADD #4, -1\nMOV #0, @-2\nJMP -2", "dwarf").unwrap();
//! machine.run(1_000).unwrap();
//!
//! // Either the battle ended early or the tick budget ran out
//! for process in machine.processes() {
//!     println!("{process}");
//! }
//! ```
//!
//! Warriors with syntax errors are rejected at load time with the full
//! diagnostic list.  A warrior that crashes at runtime (executing a
//! `DAT`, addressing through an immediate operand, or decoding garbage)
//! dies in place and the battle continues without it; its memory image
//! stays behind for the survivors to overwrite.
//!
//! Allocation draws from the operating system's entropy source, so
//! warriors cannot predict their placement.  Once loading is done a run
//! is fully deterministic: scheduling is single-threaded, in insertion
//! order, one instruction per living process per round.

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
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive duplicates pinned by unrelated upstream crates"
)]

/// An index into the core, valid from 0 to `memory.len() - 1` inclusive.
pub type CoreAddr = usize;

/// Identifier of a loaded process, assigned densely from 0 at load time.
pub type Pid = usize;

/// Default machine parameters, overridable at machine construction
pub mod config;

/// Error types shared across the crate
mod error;
pub use error::{CoreError, CoreResult, RuntimeError};

/// Closed-open interval algebra backing the free-sector allocator
mod sector;
pub use sector::{Sector, SectorSet};

/// The circular core: cells, addressing modes, and random allocation
mod memory;
pub use memory::Memory;

/// Per-opcode execution semantics
mod ops;
pub use ops::{InstructionResult, Write};

/// A warrior's process: instruction pointer, liveness, and tick protocol
mod process;
pub use process::{Diff, Process};

/// The machine: warrior loading, scheduler, history, and snapshots
mod machine;
pub use machine::{Machine, Snapshot};
