use std::path::Path;

use rand::{rngs::OsRng, RngCore};
use redcode::Instruction;

use crate::{
    config,
    error::{CoreError, CoreResult},
    memory::Memory,
    process::{Diff, Process},
    Pid,
};

/// A structural snapshot of a machine at the moment a run began.
///
/// Holds its own copies of the core, the process list, and the start
/// map, so the initial battle layout can be replayed while the live
/// machine mutates freely.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    /// Copy of the core as it was laid out at start time
    pub memory: Memory,
    /// Copy of every process, all at their starting instruction pointers
    pub processes: Vec<Process>,
    /// Copy of the cell-ownership map
    pub start_map: Vec<Option<Pid>>,
}

/// The machine hosting a battle.
///
/// Warriors load into randomly allocated free sectors of the shared
/// core and run under a cooperative round-robin scheduler, one
/// instruction per living process per round, in load order.  The battle
/// halts when fewer than two processes remain alive (or, with
/// `allow_single_process`, when none does).
pub struct Machine {
    /// The shared circular core
    memory: Memory,
    /// Every loaded process, dead ones included, in load order
    processes: Vec<Process>,
    /// Deep copy of the machine taken when `run` first begins
    start_state: Option<Box<Snapshot>>,
    /// Which PID initially owned each cell, `None` elsewhere
    start_map: Vec<Option<Pid>>,
    /// One entry per tick, `None` for ticks that executed nothing
    history: Vec<Option<Diff>>,
    /// Total ticks executed across all rounds
    ticks: u64,
    /// Halt only when no process remains, instead of fewer than two
    allow_single_process: bool,
    /// Cap on warrior program size, `None` to disable
    program_limit: Option<usize>,
    /// Entropy source for warrior placement
    rng: Box<dyn RngCore>,
}

impl Machine {
    /// Construct a machine with a zeroed core of `memory_size` cells.
    ///
    /// Placement randomness comes from the operating system, so
    /// warriors cannot predict their location.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParam`] for a zero memory size.
    pub fn new(
        memory_size: usize,
        allow_single_process: bool,
    ) -> CoreResult<Self> {
        Self::with_rng(memory_size, allow_single_process, Box::new(OsRng))
    }

    /// Test hook: construct with a caller-supplied entropy source.
    ///
    /// Battles are deterministic once loading is done, so seeding the
    /// source replays a whole battle exactly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParam`] for a zero memory size.
    pub fn with_rng(
        memory_size: usize,
        allow_single_process: bool,
        rng: Box<dyn RngCore>,
    ) -> CoreResult<Self> {
        Ok(Self {
            memory: Memory::new(memory_size)?,
            processes: Vec::new(),
            start_state: None,
            start_map: vec![None; memory_size],
            history: Vec::new(),
            ticks: 0,
            allow_single_process,
            program_limit: Some(config::MAX_PROGRAM_SIZE),
            rng,
        })
    }

    /// Replace the default warrior size cap, `None` to disable it.
    #[must_use]
    pub fn with_program_limit(mut self, limit: Option<usize>) -> Self {
        self.program_limit = limit;
        self
    }

    /// Validate, parse, and load a warrior, spawning its process.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] carrying every diagnostic when the
    /// source is invalid or over the size limit, and
    /// [`CoreError::OutOfMemory`] when no free sector can hold the
    /// program; in both cases no process is spawned.
    pub fn load_code(
        &mut self,
        source: &str,
        player_name: &str,
    ) -> CoreResult<()> {
        let program = redcode_parser::parse(source, self.program_limit)?;
        self.spawn_process(&program, player_name)
    }

    /// Load a warrior from a file.  See [`Machine::load_code`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] when the file cannot be read, plus
    /// everything [`Machine::load_code`] returns.
    pub fn load_file(
        &mut self,
        path: impl AsRef<Path>,
        player_name: &str,
    ) -> CoreResult<()> {
        let source = std::fs::read_to_string(path)?;
        self.load_code(&source, player_name)
    }

    /// Run one scheduler round: one tick per process, in load order.
    ///
    /// Does nothing once the battle has halted.  Every tick appends one
    /// entry to the history, `None` for a process that executed nothing.
    pub fn round(&mut self) {
        if self.halted() {
            return;
        }
        for index in 0..self.processes.len() {
            let diff = match self.processes.get_mut(index) {
                Some(process) => process.tick(&mut self.memory),
                None => None,
            };
            self.history.push(diff);
            self.ticks = self.ticks.saturating_add(1);
        }
    }

    /// Run rounds until the battle halts or the tick budget runs out.
    ///
    /// The first call snapshots the machine into
    /// [`Machine::start_state`] so the initial layout stays available
    /// for replay.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyRunning`] when the machine has
    /// already ticked.
    pub fn run(&mut self, max_ticks: u64) -> CoreResult<()> {
        if self.ticks > 0 {
            return Err(CoreError::AlreadyRunning);
        }
        if self.start_state.is_none() {
            self.start_state = Some(Box::new(self.snapshot()));
        }
        while self.ticks <= max_ticks && !self.halted() {
            self.round();
        }
        Ok(())
    }

    /// Return the machine to its freshly constructed state, keeping the
    /// core size, the halting mode, and the program limit.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.processes.clear();
        self.start_state = None;
        self.start_map = vec![None; self.memory.len()];
        self.history.clear();
        self.ticks = 0;
    }

    /// Whether the battle is over.
    ///
    /// With `allow_single_process` a lone warrior keeps running until it
    /// dies; otherwise the battle ends with one survivor or with mutual
    /// destruction.
    #[must_use]
    pub fn halted(&self) -> bool {
        let alive = self.alive_count();
        if self.allow_single_process {
            alive == 0
        } else {
            alive < 2
        }
    }

    /// Number of processes still alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.processes
            .iter()
            .filter(|process| process.is_alive())
            .count()
    }

    /// The shared core
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Every loaded process, dead ones included, in load order
    #[must_use]
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// The snapshot taken when `run` first began, if it has
    #[must_use]
    pub fn start_state(&self) -> Option<&Snapshot> {
        self.start_state.as_deref()
    }

    /// Which PID initially owned each cell, `None` elsewhere
    #[must_use]
    pub fn start_map(&self) -> &[Option<Pid>] {
        &self.start_map
    }

    /// One entry per executed tick, in execution order
    #[must_use]
    pub fn history(&self) -> &[Option<Diff>] {
        &self.history
    }

    /// Total ticks executed so far
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The history as a JSON array, `null` for empty ticks.
    ///
    /// # Errors
    ///
    /// Passes through any `serde_json` serialization failure.
    pub fn history_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.history)
    }

    /// Allocate a sector for a parsed program and register its process.
    fn spawn_process(
        &mut self,
        program: &[Instruction],
        name: &str,
    ) -> CoreResult<()> {
        let code_start = self.memory.allocate(program, false, self.rng.as_mut())?;
        let pid = self.processes.len();
        for owner in self
            .start_map
            .iter_mut()
            .skip(code_start)
            .take(program.len())
        {
            *owner = Some(pid);
        }
        self.processes.push(Process::new(pid, None, code_start, name));
        Ok(())
    }

    /// Copy the parts of the machine a replay needs.
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            memory: self.memory.clone(),
            processes: self.processes.clone(),
            start_map: self.start_map.clone(),
        }
    }
}
