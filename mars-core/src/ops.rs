use redcode::{Instruction, Opcode};

use crate::{error::RuntimeError, memory::Memory, CoreAddr};

/// The record of one executed instruction: where control goes next, and
/// what cell (if any) was written this step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InstructionResult {
    /// Address of the next instruction to execute
    pub new_ip: CoreAddr,
    /// The write performed by this step, consumed by the diff stream
    pub write: Option<Write>,
}

/// A single-cell write performed by an instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Write {
    /// Core address that was written
    pub index: CoreAddr,
    /// The value stored there, before truncation to a cell word
    pub value: i64,
}

/// Execute one decoded instruction at `ip`.
///
/// All instruction-pointer arithmetic wraps modulo the core size.
///
/// # Errors
///
/// Returns the [`RuntimeError`] that kills the executing process:
/// [`RuntimeError::Dat`] for a `DAT`, [`RuntimeError::BadMode`] when an
/// operand that needs a core address is immediate.
pub fn execute(
    instruction: &Instruction,
    ip: CoreAddr,
    memory: &mut Memory,
) -> Result<InstructionResult, RuntimeError> {
    match instruction.opcode {
        Opcode::Dat => dat_op(),
        Opcode::Mov => mov_op(instruction, ip, memory),
        Opcode::Add => add_op(instruction, ip, memory),
        Opcode::Sub => sub_op(instruction, ip, memory),
        Opcode::Jmp => jmp_op(instruction, ip, memory),
        Opcode::Jmz => jmz_op(instruction, ip, memory),
        Opcode::Djz => djz_op(instruction, ip, memory),
        Opcode::Cmp => cmp_op(instruction, ip, memory),
    }
}

/// The address one past `ip`, wrapped.
fn advance(ip: CoreAddr, memory: &Memory) -> CoreAddr {
    memory.wrap(ip as i64 + 1)
}

/// `DAT`: executing a data cell kills the process.
const fn dat_op() -> Result<InstructionResult, RuntimeError> {
    Err(RuntimeError::Dat)
}

/// `MOV`: write the A-value into the B-address.
fn mov_op(
    instruction: &Instruction,
    ip: CoreAddr,
    memory: &mut Memory,
) -> Result<InstructionResult, RuntimeError> {
    let value = memory.value(instruction.mode_a, instruction.a, ip)?;
    let target = memory.address(instruction.mode_b, instruction.b, ip)?;
    memory.write(target as i64, value as i32);
    Ok(InstructionResult {
        new_ip: advance(ip, memory),
        write: Some(Write {
            index: target,
            value,
        }),
    })
}

/// `ADD`: write the sum of the A-value and B-value into the B-address.
fn add_op(
    instruction: &Instruction,
    ip: CoreAddr,
    memory: &mut Memory,
) -> Result<InstructionResult, RuntimeError> {
    let a_value = memory.value(instruction.mode_a, instruction.a, ip)?;
    let b_value = memory.value(instruction.mode_b, instruction.b, ip)?;
    let target = memory.address(instruction.mode_b, instruction.b, ip)?;
    let answer = a_value + b_value;
    memory.write(target as i64, answer as i32);
    Ok(InstructionResult {
        new_ip: advance(ip, memory),
        write: Some(Write {
            index: target,
            value: answer,
        }),
    })
}

/// `SUB`: write the B-value minus the A-value into the B-address.
fn sub_op(
    instruction: &Instruction,
    ip: CoreAddr,
    memory: &mut Memory,
) -> Result<InstructionResult, RuntimeError> {
    let a_value = memory.value(instruction.mode_a, instruction.a, ip)?;
    let b_value = memory.value(instruction.mode_b, instruction.b, ip)?;
    let target = memory.address(instruction.mode_b, instruction.b, ip)?;
    let answer = b_value - a_value;
    memory.write(target as i64, answer as i32);
    Ok(InstructionResult {
        new_ip: advance(ip, memory),
        write: Some(Write {
            index: target,
            value: answer,
        }),
    })
}

/// `JMP`: jump to the B-address.
///
/// The operand resolves through [`Memory::address`], so an immediate
/// jump target is a [`RuntimeError::BadMode`] death.
fn jmp_op(
    instruction: &Instruction,
    ip: CoreAddr,
    memory: &mut Memory,
) -> Result<InstructionResult, RuntimeError> {
    let target = memory.address(instruction.mode_b, instruction.b, ip)?;
    Ok(InstructionResult {
        new_ip: target,
        write: None,
    })
}

/// `JMZ`: jump to the B-value if the A-value is zero.
fn jmz_op(
    instruction: &Instruction,
    ip: CoreAddr,
    memory: &mut Memory,
) -> Result<InstructionResult, RuntimeError> {
    let a_value = memory.value(instruction.mode_a, instruction.a, ip)?;
    let b_value = memory.value(instruction.mode_b, instruction.b, ip)?;
    let new_ip = if a_value == 0 {
        memory.wrap(b_value)
    } else {
        advance(ip, memory)
    };
    Ok(InstructionResult {
        new_ip,
        write: None,
    })
}

/// `DJZ`: decrement the A-target in place, then jump to the B-value if
/// the result reached zero.
fn djz_op(
    instruction: &Instruction,
    ip: CoreAddr,
    memory: &mut Memory,
) -> Result<InstructionResult, RuntimeError> {
    let target = memory.address(instruction.mode_a, instruction.a, ip)?;
    let a_value = memory.value(instruction.mode_a, instruction.a, ip)?;
    let b_value = memory.value(instruction.mode_b, instruction.b, ip)?;
    let answer = a_value - 1;
    memory.write(target as i64, answer as i32);
    let new_ip = if answer == 0 {
        memory.wrap(b_value)
    } else {
        advance(ip, memory)
    };
    Ok(InstructionResult {
        new_ip,
        write: Some(Write {
            index: target,
            value: answer,
        }),
    })
}

/// `CMP`: skip the next instruction if the A-value equals the B-value.
fn cmp_op(
    instruction: &Instruction,
    ip: CoreAddr,
    memory: &mut Memory,
) -> Result<InstructionResult, RuntimeError> {
    let a_value = memory.value(instruction.mode_a, instruction.a, ip)?;
    let b_value = memory.value(instruction.mode_b, instruction.b, ip)?;
    let step = if a_value == b_value { 2 } else { 1 };
    Ok(InstructionResult {
        new_ip: memory.wrap(ip as i64 + step),
        write: None,
    })
}
