use nom::combinator::all_consuming;
use redcode::{Instruction, Mode, Opcode};

use crate::{
    error::{ParseError, ParseErrorKind, ParseFailure, PartialParseError},
    primitives, COMMENT_SIGN,
};

/// Check a whole source text, collecting one diagnostic per bad line.
///
/// The returned list is empty exactly when the source is valid.  Line
/// indices are 1-based and count the lines of the trimmed source,
/// comments and blank lines included.  A source with no instructions at
/// all yields the single [`ParseErrorKind::EmptyCode`] diagnostic.
#[must_use]
pub fn validate(source: &str) -> Vec<ParseError> {
    let lines = clean_lines(source);
    if lines.iter().all(|line| line.trim().is_empty()) {
        return vec![ParseError::empty_code()];
    }

    let mut errors = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if let Err(partial) = instruction_from_line(line) {
            errors.push(partial.at(index.saturating_add(1), line));
        }
    }
    errors
}

/// Parse a source text into its instruction list.
///
/// The source is validated first, so a bad warrior reports every broken
/// line.  `instruction_limit` bounds the program size; `None` disables
/// the check.
///
/// # Errors
///
/// Returns [`ParseFailure::Invalid`] carrying the full diagnostic list,
/// or [`ParseFailure::SizeLimit`] when the program exceeds the limit.
pub fn parse(
    source: &str,
    instruction_limit: Option<usize>,
) -> Result<Vec<Instruction>, ParseFailure> {
    let errors = validate(source);
    if !errors.is_empty() {
        return Err(ParseFailure::Invalid(errors));
    }

    let mut instructions = Vec::new();
    for (index, line) in clean_lines(source).iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let instruction = instruction_from_line(line).map_err(|partial| {
            ParseFailure::Invalid(vec![partial.at(index.saturating_add(1), line)])
        })?;
        instructions.push(instruction);
    }

    if let Some(max) = instruction_limit {
        if instructions.len() > max {
            return Err(ParseFailure::SizeLimit {
                size: instructions.len(),
                max,
            });
        }
    }
    Ok(instructions)
}

/// Split the trimmed source into lines with comments stripped.
fn clean_lines(source: &str) -> Vec<&str> {
    source
        .trim()
        .lines()
        .map(|line| line.split(COMMENT_SIGN).next().unwrap_or(""))
        .collect()
}

/// Split a line into tokens: whitespace separated, commas trimmed from
/// token edges.
fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace()
        .map(|token| token.trim_matches(','))
        .collect()
}

/// Analyze one non-blank line into an instruction.
///
/// Checks run in a fixed order so each bad line reports a single
/// diagnostic: token count, opcode mnemonic, per-opcode operand count,
/// then each operand left to right.
fn instruction_from_line(line: &str) -> Result<Instruction, PartialParseError> {
    let tokens = tokenize(line);
    let arguments_error = || {
        PartialParseError::new(
            ParseErrorKind::InvalidArgumentsLength,
            format!("wrong number of arguments in {tokens:?}"),
        )
    };

    let Some((mnemonic, operands)) = tokens.split_first() else {
        return Err(arguments_error());
    };
    if operands.is_empty() || operands.len() > 2 {
        return Err(arguments_error());
    }

    let opcode = opcode_from_token(mnemonic)?;
    if operands.len() != opcode.operand_count() {
        return Err(PartialParseError::new(
            ParseErrorKind::InvalidArgumentsLength,
            format!("wrong number of arguments {operands:?} for {opcode}"),
        ));
    }

    match operands {
        [single] => {
            let (mode, value) = operand_from_token(single)?;
            Ok(Instruction::unary(opcode, mode, value))
        }
        [a_token, b_token] => {
            let (mode_a, a) = operand_from_token(a_token)?;
            let (mode_b, b) = operand_from_token(b_token)?;
            Ok(Instruction::new(opcode, mode_a, a, mode_b, b))
        }
        _ => Err(arguments_error()),
    }
}

/// Resolve an opcode mnemonic token.
fn opcode_from_token(token: &str) -> Result<Opcode, PartialParseError> {
    all_consuming(primitives::opcode)(token)
        .map(|(_, opcode)| opcode)
        .map_err(|_| {
            PartialParseError::new(
                ParseErrorKind::InvalidOpcodeName,
                format!("unknown opcode `{token}`"),
            )
        })
}

/// Classify and parse one operand token.
///
/// A `#` or `@` prefix fixes the mode, and whatever follows must be a
/// number.  A bare token is relative only if it is built from digits and
/// dashes; anything else is a prefix error rather than a value error.
fn operand_from_token(token: &str) -> Result<(Mode, i64), PartialParseError> {
    if let Some(rest) = token.strip_prefix('#') {
        Ok((Mode::Immediate, integer_value(rest)?))
    } else if let Some(rest) = token.strip_prefix('@') {
        Ok((Mode::Indirect, integer_value(rest)?))
    } else if token.contains(|c: char| c.is_ascii_digit())
        && token.chars().all(|c| c.is_ascii_digit() || c == '-')
    {
        Ok((Mode::Relative, integer_value(token)?))
    } else {
        Err(PartialParseError::new(
            ParseErrorKind::OperandPrefix,
            format!("bad operand `{token}`"),
        ))
    }
}

/// Parse the numeric part of an operand token.
fn integer_value(text: &str) -> Result<i64, PartialParseError> {
    all_consuming(primitives::number)(text)
        .map(|(_, value)| value)
        .map_err(|_| {
            PartialParseError::new(
                ParseErrorKind::OperandValue,
                format!("bad numeric value `{text}`"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_the_imp() {
        let parsed = parse("MOV 0, 1", None);
        assert_eq!(
            parsed,
            Ok(vec![Instruction::new(
                Opcode::Mov,
                Mode::Relative,
                0,
                Mode::Relative,
                1
            )])
        );
    }

    #[test]
    fn parse_is_case_insensitive_and_comma_tolerant() {
        let imp = Instruction::new(Opcode::Mov, Mode::Relative, 0, Mode::Relative, 1);
        for source in ["mov 0, 1", "MoV 0 1", "MOV 0, 1 ; an imp"] {
            assert_eq!(parse(source, None), Ok(vec![imp]), "parsing {source:?}");
        }
    }

    #[test]
    fn parse_single_operand_shorthand() {
        let parsed = parse("JMP 2\nDAT #0\nJMP @-1", None);
        assert_eq!(
            parsed,
            Ok(vec![
                Instruction::unary(Opcode::Jmp, Mode::Relative, 2),
                Instruction::dat(0),
                Instruction::unary(Opcode::Jmp, Mode::Indirect, -1),
            ])
        );
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let source = "; a warrior\n\nADD #4, -1\n   \nMOV #0, @-2 ; bomb\nJMP -2\n";
        let parsed = parse(source, None).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(
            parsed.first(),
            Some(&Instruction::new(
                Opcode::Add,
                Mode::Immediate,
                4,
                Mode::Relative,
                -1
            ))
        );
    }

    #[test]
    fn missing_comma_space_is_a_prefix_error() {
        // "0,1" survives edge trimming as a single token and is not a
        // well-formed operand
        let errors = validate("MOV 0,1");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.first().map(|e| e.kind),
            Some(ParseErrorKind::OperandPrefix)
        );
    }

    #[test]
    fn validate_reports_each_bad_line_at_its_index() {
        // Lines 11 and 16 are broken; every other line is fine.
        let mut lines = vec!["MOV 0, 1"; 10];
        lines.push("FOO 1, 2");
        lines.extend(["MOV 0, 1"; 4]);
        lines.push("MOV #x, 1");
        let source = lines.join("\n");

        let errors = validate(&source);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.first().map(|e| (e.kind, e.line_index)),
            Some((ParseErrorKind::InvalidOpcodeName, Some(11)))
        );
        assert_eq!(
            errors.get(1).map(|e| (e.kind, e.line_index)),
            Some((ParseErrorKind::OperandValue, Some(16)))
        );
        assert_eq!(errors.get(1).and_then(|e| e.line.clone()), Some("MOV #x, 1".into()));
    }

    #[test]
    fn validate_classifies_error_kinds() {
        let cases = [
            ("MOV 1", ParseErrorKind::InvalidArgumentsLength),
            ("MOV 1 2 3", ParseErrorKind::InvalidArgumentsLength),
            ("DAT 1, 2", ParseErrorKind::InvalidArgumentsLength),
            ("JMZ 1", ParseErrorKind::InvalidArgumentsLength),
            ("FOO 1, 2", ParseErrorKind::InvalidOpcodeName),
            ("MOV $1, 2", ParseErrorKind::OperandPrefix),
            ("MOV x, 2", ParseErrorKind::OperandPrefix),
            ("MOV #x, 2", ParseErrorKind::OperandValue),
            ("MOV @1-, 2", ParseErrorKind::OperandValue),
            ("MOV 1-2, 0", ParseErrorKind::OperandValue),
        ];
        for (source, kind) in cases {
            let errors = validate(source);
            assert_eq!(errors.len(), 1, "validating {source:?}");
            assert_eq!(errors.first().map(|e| e.kind), Some(kind), "validating {source:?}");
            assert_eq!(errors.first().and_then(|e| e.line_index), Some(1));
        }
    }

    #[test]
    fn validate_reports_one_error_per_bad_line() {
        // The opcode check fires before either broken operand is seen
        let errors = validate("FOO #x, $y");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.first().map(|e| e.kind),
            Some(ParseErrorKind::InvalidOpcodeName)
        );
    }

    #[test]
    fn empty_sources_yield_the_empty_code_diagnostic() {
        for source in ["", "   \n \n", "; only a comment\n;and another"] {
            let errors = validate(source);
            assert_eq!(errors.len(), 1, "validating {source:?}");
            assert_eq!(
                errors.first().map(|e| (e.kind, e.line_index)),
                Some((ParseErrorKind::EmptyCode, None))
            );
        }
    }

    #[test]
    fn size_limit_bounds_the_program() {
        let source = ["MOV 0, 1"; 9].join("\n");
        assert_eq!(
            parse(&source, Some(8)),
            Err(ParseFailure::SizeLimit { size: 9, max: 8 })
        );
        assert_eq!(parse(&source, Some(9)).map(|p| p.len()), Ok(9));
        assert_eq!(parse(&source, None).map(|p| p.len()), Ok(9));
    }

    #[test]
    fn parse_normalizes_large_operands() {
        let parsed = parse("MOV #4097, -2049", None);
        assert_eq!(
            parsed,
            Ok(vec![Instruction::new(
                Opcode::Mov,
                Mode::Immediate,
                1,
                Mode::Relative,
                2047
            )])
        );
    }
}
