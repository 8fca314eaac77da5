use nom::{
    character::complete::{alpha1, i64},
    combinator::map_opt,
    IResult,
};
use redcode::Opcode;

/// Parse a decimal integer with an optional leading sign.
pub fn number(input: &str) -> IResult<&str, i64> {
    i64(input)
}

/// Consume an opcode mnemonic, case-insensitively.
pub fn opcode(input: &str) -> IResult<&str, Opcode> {
    map_opt(alpha1, Opcode::from_name)(input)
}
