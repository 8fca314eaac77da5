use core::fmt;

use serde::Serialize;

use crate::{error::RuntimeError, memory::Memory, ops, CoreAddr, Pid};

/// The record of one successful tick's effect on the core.
///
/// `ip` is the instruction pointer after the tick.  `index` and `value`
/// describe the cell the tick wrote, with `value` holding the assembly
/// rendering of the cell after the write (`"???"` when it no longer
/// decodes); both are `None` for a tick that wrote nothing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diff {
    /// Process that executed the tick
    pub pid: Pid,
    /// Instruction pointer after the tick
    pub ip: CoreAddr,
    /// Core address written this tick, if any
    pub index: Option<CoreAddr>,
    /// Rendering of the written cell, if any
    pub value: Option<String>,
}

/// One warrior's thread of execution.
///
/// A process is born alive at its warrior's first instruction.  Any
/// runtime failure during a tick kills it in place, recording the cause;
/// dead processes persist in the machine but no longer execute.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Process {
    /// Dense identifier assigned by the machine at load time
    pid: Pid,
    /// Process that spawned this one, when not loaded directly
    parent: Option<Pid>,
    /// Player name given at load time
    name: String,
    /// Core address of the warrior's first instruction
    code_start: CoreAddr,
    /// Next instruction to execute
    ip: CoreAddr,
    /// Whether the process still executes
    alive: bool,
    /// Why the process died, while `alive` is false
    reason: Option<RuntimeError>,
}

impl Process {
    /// Create a live process with its instruction pointer at
    /// `code_start`.
    pub fn new(
        pid: Pid,
        parent: Option<Pid>,
        code_start: CoreAddr,
        name: impl Into<String>,
    ) -> Self {
        Self {
            pid,
            parent,
            name: name.into(),
            code_start,
            ip: code_start,
            alive: true,
            reason: None,
        }
    }

    /// Identifier assigned by the machine
    #[must_use]
    pub const fn pid(&self) -> Pid {
        self.pid
    }

    /// Process that spawned this one, if any
    #[must_use]
    pub const fn parent(&self) -> Option<Pid> {
        self.parent
    }

    /// Player name given at load time
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Core address where the warrior was loaded
    #[must_use]
    pub const fn code_start(&self) -> CoreAddr {
        self.code_start
    }

    /// Address of the next instruction to execute
    #[must_use]
    pub const fn ip(&self) -> CoreAddr {
        self.ip
    }

    /// Whether the process still executes
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Why the process died, while it is dead
    #[must_use]
    pub const fn reason(&self) -> Option<RuntimeError> {
        self.reason
    }

    /// Execute one instruction.
    ///
    /// The cell under the instruction pointer is decoded first; a cell
    /// that no longer decodes kills the process on the spot.  A dead
    /// process ticks to `None` without touching the core.  A successful
    /// tick advances the instruction pointer and reports the write it
    /// performed, if any.
    pub fn tick(&mut self, memory: &mut Memory) -> Option<Diff> {
        let instruction = match memory.instruction_at(self.ip as i64) {
            Ok(instruction) => instruction,
            Err(error) => {
                self.die(error.into());
                return None;
            }
        };
        if !self.alive {
            return None;
        }

        match ops::execute(&instruction, self.ip, memory) {
            Err(error) => {
                self.die(error);
                None
            }
            Ok(result) => {
                self.ip = result.new_ip;
                let index = result.write.map(|write| write.index);
                let value = index.map(|written| memory.render(written as i64));
                Some(Diff {
                    pid: self.pid,
                    ip: self.ip,
                    index,
                    value,
                })
            }
        }
    }

    /// Mark the process dead, recording why.
    fn die(&mut self, reason: RuntimeError) {
        self.alive = false;
        self.reason = Some(reason);
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process {} ({})", self.pid, self.name)?;
        match self.reason {
            None if self.alive => write!(f, " alive at {}", self.ip),
            Some(ref reason) => write!(f, " dead ({reason}) at {}", self.ip),
            None => write!(f, " dead at {}", self.ip),
        }
    }
}

#[cfg(test)]
mod tests {
    use redcode::{DecodeError, Instruction, Mode, Opcode};

    use super::*;

    fn imp() -> Instruction {
        Instruction::new(Opcode::Mov, Mode::Relative, 0, Mode::Relative, 1)
    }

    #[test]
    fn a_tick_executes_and_reports_its_write() {
        let mut memory = Memory::new(8).unwrap();
        memory.write(0, imp().encode() as i32);
        let mut process = Process::new(0, None, 0, "imp");

        let diff = process.tick(&mut memory);
        assert_eq!(
            diff,
            Some(Diff {
                pid: 0,
                ip: 1,
                index: Some(1),
                value: Some("MOV 0, 1".into()),
            })
        );
        assert_eq!(process.ip(), 1);
        assert!(process.is_alive());
    }

    #[test]
    fn a_jump_tick_reports_no_write() {
        let mut memory = Memory::new(8).unwrap();
        memory.write(2, Instruction::unary(Opcode::Jmp, Mode::Relative, -2).encode() as i32);
        let mut process = Process::new(1, None, 2, "jumper");

        let diff = process.tick(&mut memory);
        assert_eq!(
            diff,
            Some(Diff {
                pid: 1,
                ip: 0,
                index: None,
                value: None,
            })
        );
    }

    #[test]
    fn executing_a_dat_kills_the_process() {
        let mut memory = Memory::new(8).unwrap();
        let mut process = Process::new(0, None, 5, "doomed");

        assert_eq!(process.tick(&mut memory), None);
        assert!(!process.is_alive());
        assert_eq!(process.reason(), Some(RuntimeError::Dat));
    }

    #[test]
    fn an_undecodable_cell_kills_the_process() {
        let mut memory = Memory::new(8).unwrap();
        memory.write(3, (11_u32 << 28) as i32);
        let mut process = Process::new(0, None, 3, "lost");

        assert_eq!(process.tick(&mut memory), None);
        assert!(!process.is_alive());
        assert_eq!(
            process.reason(),
            Some(RuntimeError::Decode(DecodeError::BadOpcode(11)))
        );
    }

    #[test]
    fn dead_processes_tick_to_none_without_executing() {
        let mut memory = Memory::new(8).unwrap();
        let mut process = Process::new(0, None, 0, "corpse");
        assert_eq!(process.tick(&mut memory), None); // dies on the DAT

        memory.write(0, imp().encode() as i32);
        let before = memory.clone();
        assert_eq!(process.tick(&mut memory), None);
        assert_eq!(memory, before, "a dead process must not touch the core");
        assert_eq!(process.reason(), Some(RuntimeError::Dat));
    }

    #[test]
    fn diffs_serialize_with_the_expected_keys() {
        let diff = Diff {
            pid: 0,
            ip: 1,
            index: Some(1),
            value: Some("MOV 0, 1".into()),
        };
        assert_eq!(
            serde_json::to_string(&diff).unwrap(),
            r#"{"pid":0,"ip":1,"index":1,"value":"MOV 0, 1"}"#
        );
    }

    #[test]
    fn display_reports_liveness_and_cause() {
        let mut memory = Memory::new(8).unwrap();
        let mut process = Process::new(2, None, 4, "imp");
        assert_eq!(process.to_string(), "Process 2 (imp) alive at 4");

        process.tick(&mut memory); // dies on the fresh core's DAT
        assert_eq!(
            process.to_string(),
            "Process 2 (imp) dead (DAT instruction encountered) at 4"
        );
    }
}
