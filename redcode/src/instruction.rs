use core::fmt;

use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

/// A signed operand field, held normalized to the 12-bit two's-complement
/// range `[-2048, 2047]`.
pub type FieldValue = i32;

/// Shift applied to the opcode nibble in the packed word
const OPCODE_SHIFT: u32 = 28;
/// Shift applied to the A addressing mode in the packed word
const MODE_A_SHIFT: u32 = 26;
/// Shift applied to the B addressing mode in the packed word
const MODE_B_SHIFT: u32 = 24;
/// Shift applied to the A field in the packed word
const A_FIELD_SHIFT: u32 = 12;
/// Mask for one 12-bit operand field
const FIELD_MASK: u32 = 0xFFF;
/// Mask for one 2-bit addressing mode
const MODE_MASK: u32 = 0b11;
/// Mask for the 4-bit opcode
const OPCODE_MASK: u32 = 0xF;

/// The addressing mode applied to one operand of an instruction.
///
/// The wire tags are normative: immediate is 0, relative is 1, indirect
/// is 2.  Tag 3 never names a mode and is rejected when decoding.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    FromPrimitive,
    ToPrimitive,
    Serialize,
    Deserialize,
)]
pub enum Mode {
    /// Written `#`.  The operand is a literal value with no core address.
    Immediate = 0,
    /// Written with no prefix.  The operand is an offset from the current
    /// instruction pointer.
    Relative = 1,
    /// Written `@`.  The operand points (relative to the instruction
    /// pointer) at a cell whose value is a second relative offset.
    Indirect = 2,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Immediate => write!(f, "#"),
            Self::Relative => Ok(()),
            Self::Indirect => write!(f, "@"),
        }
    }
}

/// The operation performed by an instruction.
///
/// The discriminants are the wire opcodes.  The set is closed: a word
/// whose opcode nibble is outside it fails to decode.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    FromPrimitive,
    ToPrimitive,
    Serialize,
    Deserialize,
)]
pub enum Opcode {
    /// Data cell.  Executing it kills the process.
    Dat = 0,

    /// Replace the B-target with the A-value
    Mov = 1,

    /// Replace the B-target with the sum of the A-value and B-value
    Add = 2,

    /// Replace the B-target with the B-value minus the A-value
    Sub = 3,

    /// Jump to the B-address
    Jmp = 4,

    /// Jump to the B-value if the A-value is zero
    Jmz = 5,

    /// Decrement the A-target, then jump to the B-value if the result is
    /// zero
    Djz = 6,

    /// Skip the next instruction if the A-value equals the B-value
    Cmp = 7,
}

impl Opcode {
    /// Number of operands the assembly form of this opcode expects.
    ///
    /// `DAT` and `JMP` are written with a single operand; the other six
    /// opcodes take two.
    #[must_use]
    pub const fn operand_count(self) -> usize {
        match self {
            Self::Dat | Self::Jmp => 1,
            Self::Mov
            | Self::Add
            | Self::Sub
            | Self::Jmz
            | Self::Djz
            | Self::Cmp => 2,
        }
    }

    /// Look up an opcode by its assembly mnemonic, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "DAT" => Some(Self::Dat),
            "MOV" => Some(Self::Mov),
            "ADD" => Some(Self::Add),
            "SUB" => Some(Self::Sub),
            "JMP" => Some(Self::Jmp),
            "JMZ" => Some(Self::Jmz),
            "DJZ" => Some(Self::Djz),
            "CMP" => Some(Self::Cmp),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match *self {
            Self::Dat => "DAT",
            Self::Mov => "MOV",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Jmp => "JMP",
            Self::Jmz => "JMZ",
            Self::Djz => "DJZ",
            Self::Cmp => "CMP",
        };
        write!(f, "{mnemonic}")
    }
}

/// A word that failed to decode into an [`Instruction`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DecodeError {
    /// The opcode nibble is not one of the eight registered opcodes
    BadOpcode(u8),
    /// The A-mode bits are not a valid addressing mode tag
    BadModeA(u8),
    /// The B-mode bits are not a valid addressing mode tag
    BadModeB(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::BadOpcode(op) => write!(f, "bad opcode {op}"),
            Self::BadModeA(mode) => write!(f, "bad mode {mode} for field A"),
            Self::BadModeB(mode) => write!(f, "bad mode {mode} for field B"),
        }
    }
}

/// A complete redcode instruction: an opcode and two operands, each with
/// an addressing mode and a signed 12-bit field.
///
/// Fields are expected to hold normalized values; the constructors
/// normalize any integer input.  Equality over normalized instructions
/// coincides with equality of their encoded words.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation performed by this instruction
    pub opcode: Opcode,
    /// Addressing mode of the A operand
    pub mode_a: Mode,
    /// The A field, in `[-2048, 2047]`
    pub a: FieldValue,
    /// Addressing mode of the B operand
    pub mode_b: Mode,
    /// The B field, in `[-2048, 2047]`
    pub b: FieldValue,
}

impl Instruction {
    /// Construct an instruction, normalizing both operand fields into the
    /// signed 12-bit range.
    #[must_use]
    pub fn new(
        opcode: Opcode,
        mode_a: Mode,
        a: i64,
        mode_b: Mode,
        b: i64,
    ) -> Self {
        Self {
            opcode,
            mode_a,
            a: to_signed_12_bit(a),
            mode_b,
            b: to_signed_12_bit(b),
        }
    }

    /// The one-operand assembly shorthand used by `DAT` and `JMP`.
    ///
    /// The single operand becomes the B operand and the A operand is
    /// filled with an immediate zero, so `JMP 2` is `JMP #0, 2`.
    #[must_use]
    pub fn unary(opcode: Opcode, mode: Mode, value: i64) -> Self {
        Self::new(opcode, Mode::Immediate, 0, mode, value)
    }

    /// A data cell holding `value`: `DAT #0, #value`.
    ///
    /// `Instruction::dat(0)` encodes to the zero word, the value fresh
    /// core cells hold.
    #[must_use]
    pub fn dat(value: i64) -> Self {
        Self::unary(Opcode::Dat, Mode::Immediate, value)
    }

    /// Pack this instruction into its 32-bit wire form.
    #[must_use]
    pub fn encode(&self) -> u32 {
        let a = (self.a as u32) & FIELD_MASK;
        let b = (self.b as u32) & FIELD_MASK;
        ((self.opcode as u32) << OPCODE_SHIFT)
            | ((self.mode_a as u32) << MODE_A_SHIFT)
            | ((self.mode_b as u32) << MODE_B_SHIFT)
            | (a << A_FIELD_SHIFT)
            | b
    }

    /// Unpack a 32-bit word into an instruction.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the opcode nibble or either mode tag
    /// does not name a registered opcode or mode.
    pub fn decode(word: u32) -> Result<Self, DecodeError> {
        let op_bits = (word >> OPCODE_SHIFT) & OPCODE_MASK;
        let opcode = Opcode::from_u32(op_bits)
            .ok_or(DecodeError::BadOpcode(op_bits as u8))?;

        let mode_a_bits = (word >> MODE_A_SHIFT) & MODE_MASK;
        let mode_a = Mode::from_u32(mode_a_bits)
            .ok_or(DecodeError::BadModeA(mode_a_bits as u8))?;

        let mode_b_bits = (word >> MODE_B_SHIFT) & MODE_MASK;
        let mode_b = Mode::from_u32(mode_b_bits)
            .ok_or(DecodeError::BadModeB(mode_b_bits as u8))?;

        Ok(Self {
            opcode,
            mode_a,
            a: sign_extend_12((word >> A_FIELD_SHIFT) & FIELD_MASK),
            mode_b,
            b: sign_extend_12(word & FIELD_MASK),
        })
    }
}

impl fmt::Display for Instruction {
    /// Formats an instruction in the canonical assembly syntax.
    ///
    /// ```
    /// # use redcode::*;
    /// let mov = Instruction::new(Opcode::Mov, Mode::Immediate, 5, Mode::Indirect, 20);
    /// assert_eq!(mov.to_string(), "MOV #5, @20");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}, {}{}",
            self.opcode, self.mode_a, self.a, self.mode_b, self.b
        )
    }
}

/// Reduce any integer to the signed 12-bit value with the same residue
/// modulo 4096.
fn to_signed_12_bit(n: i64) -> FieldValue {
    let residue = n.rem_euclid(4096);
    (if residue >= 2048 { residue - 4096 } else { residue }) as FieldValue
}

/// Reinterpret a raw 12-bit field as a signed value.
fn sign_extend_12(raw: u32) -> FieldValue {
    if raw >= 2048 {
        (raw as FieldValue) - 4096
    } else {
        raw as FieldValue
    }
}

/// Utilities for enumerating valid redcode instructions in tests
pub mod test_utils {
    use super::{Instruction, Mode, Opcode};

    /// All eight opcodes of the dialect, in wire order
    pub const OPCODES: [Opcode; 8] = [
        Opcode::Dat,
        Opcode::Mov,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Jmp,
        Opcode::Jmz,
        Opcode::Djz,
        Opcode::Cmp,
    ];

    /// All three addressing modes, in wire order
    pub const MODES: [Mode; 3] = [Mode::Immediate, Mode::Relative, Mode::Indirect];

    /// Operand field values covering both 12-bit extremes, zero, and a few
    /// interior points
    pub const FIELD_SAMPLES: [i64; 8] =
        [-2048, -1024, -1, 0, 1, 5, 1024, 2047];

    /// Iterate over every opcode and addressing-mode combination with
    /// zeroed fields
    pub fn all_shapes() -> impl Iterator<Item = Instruction> {
        itertools::iproduct!(OPCODES.iter(), MODES.iter(), MODES.iter()).map(
            |(op, mode_a, mode_b)| Instruction::new(*op, *mode_a, 0, *mode_b, 0),
        )
    }
}
