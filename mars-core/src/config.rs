/// Default number of cells in the core.
pub const MEMORY_SIZE: usize = 8192;

/// Default cap on the number of instructions in one warrior.
pub const MAX_PROGRAM_SIZE: usize = 8;

/// Default tick budget for [`crate::Machine::run`].
pub const MAX_TICKS: u64 = 80_000;
