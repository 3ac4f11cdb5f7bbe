//! Script-line → Command conversion
//!
//! One command per line, `name(arg, arg, ...)` shaped. `//` starts a
//! comment (whole-line or trailing) and whitespace around tokens is
//! stripped. Transaction and variable tokens carry their `T`/`x` prefix.

use repkv_core::{TranId, VarId};
use repkv_engine::Command;
use thiserror::Error;

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The command name is not part of the grammar.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    /// The line is not `name(args)` shaped.
    #[error("malformed command `{0}`")]
    Malformed(String),
    /// Wrong number of arguments for the command.
    #[error("`{command}` expects {expected} argument(s), got {got}")]
    WrongArity {
        /// The command name.
        command: String,
        /// Arguments the grammar requires.
        expected: usize,
        /// Arguments the line supplied.
        got: usize,
    },
    /// A transaction token without a `T<number>` shape.
    #[error("bad transaction ID `{0}`")]
    BadTransaction(String),
    /// A variable token without an `x<number>` shape.
    #[error("bad variable ID `{0}`")]
    BadVariable(String),
    /// A token that should have been an integer.
    #[error("bad integer `{0}`")]
    BadInteger(String),
}

/// Parse one script line.
///
/// Returns `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let code = match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    };
    let code = code.trim();
    if code.is_empty() {
        return Ok(None);
    }

    let open = code
        .find('(')
        .ok_or_else(|| ParseError::Malformed(code.to_string()))?;
    if !code.ends_with(')') {
        return Err(ParseError::Malformed(code.to_string()));
    }
    let name = code[..open].trim();
    let body = &code[open + 1..code.len() - 1];
    let args: Vec<&str> = if body.trim().is_empty() {
        Vec::new()
    } else {
        body.split(',').map(str::trim).collect()
    };

    let command = match name {
        "begin" => Command::Begin(parse_tran(arg(name, &args, 0, 1)?)?),
        "R" => {
            expect_arity(name, &args, 2)?;
            Command::Read(parse_tran(args[0])?, parse_var(args[1])?)
        }
        "W" => {
            expect_arity(name, &args, 3)?;
            Command::Write(parse_tran(args[0])?, parse_var(args[1])?, parse_int(args[2])?)
        }
        "end" => Command::End(parse_tran(arg(name, &args, 0, 1)?)?),
        "fail" => Command::Fail(parse_site(arg(name, &args, 0, 1)?)?),
        "recover" => Command::Recover(parse_site(arg(name, &args, 0, 1)?)?),
        "dump" => {
            expect_arity(name, &args, 0)?;
            Command::Dump
        }
        "queryState" => {
            expect_arity(name, &args, 0)?;
            Command::QueryState
        }
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn expect_arity(command: &str, args: &[&str], expected: usize) -> Result<(), ParseError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ParseError::WrongArity {
            command: command.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn arg<'a>(
    command: &str,
    args: &[&'a str],
    index: usize,
    expected: usize,
) -> Result<&'a str, ParseError> {
    expect_arity(command, args, expected)?;
    Ok(args[index])
}

fn parse_tran(token: &str) -> Result<TranId, ParseError> {
    token
        .strip_prefix('T')
        .and_then(|digits| digits.parse::<u32>().ok())
        .map(TranId::new)
        .ok_or_else(|| ParseError::BadTransaction(token.to_string()))
}

fn parse_var(token: &str) -> Result<VarId, ParseError> {
    token
        .strip_prefix('x')
        .and_then(|digits| digits.parse::<u32>().ok())
        .map(VarId::new)
        .ok_or_else(|| ParseError::BadVariable(token.to_string()))
}

fn parse_site(token: &str) -> Result<u32, ParseError> {
    token
        .parse::<u32>()
        .map_err(|_| ParseError::BadInteger(token.to_string()))
}

fn parse_int(token: &str) -> Result<i64, ParseError> {
    token
        .parse::<i64>()
        .map_err(|_| ParseError::BadInteger(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_begin() {
        assert_eq!(
            parse_line("begin(T1)"),
            Ok(Some(Command::Begin(TranId::new(1))))
        );
    }

    #[test]
    fn test_parse_read_and_write() {
        assert_eq!(
            parse_line("R(T2, x4)"),
            Ok(Some(Command::Read(TranId::new(2), VarId::new(4))))
        );
        assert_eq!(
            parse_line("W(T1, x6, -12)"),
            Ok(Some(Command::Write(TranId::new(1), VarId::new(6), -12)))
        );
    }

    #[test]
    fn test_parse_end_fail_recover() {
        assert_eq!(parse_line("end(T3)"), Ok(Some(Command::End(TranId::new(3)))));
        assert_eq!(parse_line("fail(7)"), Ok(Some(Command::Fail(7))));
        assert_eq!(parse_line("recover(7)"), Ok(Some(Command::Recover(7))));
    }

    #[test]
    fn test_parse_zero_argument_commands() {
        assert_eq!(parse_line("dump()"), Ok(Some(Command::Dump)));
        assert_eq!(parse_line("queryState()"), Ok(Some(Command::QueryState)));
    }

    #[test]
    fn test_whitespace_is_stripped() {
        assert_eq!(
            parse_line("  W( T1 , x2 , 5 )  "),
            Ok(Some(Command::Write(TranId::new(1), VarId::new(2), 5)))
        );
    }

    #[test]
    fn test_comments_and_blank_lines() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("// a comment"), Ok(None));
        assert_eq!(
            parse_line("begin(T1) // trailing note"),
            Ok(Some(Command::Begin(TranId::new(1))))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_line("frobnicate(T1)"),
            Err(ParseError::UnknownCommand("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(parse_line("begin T1"), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_line("begin(T1"), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(
            parse_line("R(T1)"),
            Err(ParseError::WrongArity {
                command: "R".to_string(),
                expected: 2,
                got: 1,
            })
        );
    }

    #[test]
    fn test_bad_tokens() {
        assert_eq!(
            parse_line("begin(1)"),
            Err(ParseError::BadTransaction("1".to_string()))
        );
        assert_eq!(
            parse_line("R(T1, 4)"),
            Err(ParseError::BadVariable("4".to_string()))
        );
        assert_eq!(
            parse_line("W(T1, x4, lots)"),
            Err(ParseError::BadInteger("lots".to_string()))
        );
        assert_eq!(
            parse_line("fail(x1)"),
            Err(ParseError::BadInteger("x1".to_string()))
        );
    }
}
