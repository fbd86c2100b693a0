//! Assembly parser
//!
//! Splits the token stream into one statement per line:
//! `[%result =] OpName operand...`.

use logos::Logos;
use spirv_vm_spec::Op;

use crate::error::{AssemblerError, Result};
use crate::lexer::Token;

/// One operand as written in the source
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Id(String),
    Integer(i64),
    /// Hex literal, taken as raw bits
    Bits(u64),
    /// Decimal float as written
    Float(String),
    Str(String),
    /// Enumerant or extended instruction name
    Word(String),
}

impl Operand {
    /// How the operand reads in an error message
    pub fn describe(&self) -> String {
        match self {
            Operand::Id(name) => format!("%{name}"),
            Operand::Integer(v) => v.to_string(),
            Operand::Bits(v) => format!("{v:#x}"),
            Operand::Float(text) => text.clone(),
            Operand::Str(s) => format!("{s:?}"),
            Operand::Word(w) => w.clone(),
        }
    }
}

/// One parsed instruction line
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// 1-based source line
    pub line: usize,
    pub result: Option<String>,
    pub op: Op,
    pub operands: Vec<Operand>,
}

/// Parse a whole source text into statements
pub fn parse(source: &str) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    let mut line = 1;
    let mut line_start = 0;
    let mut current: Vec<Token> = Vec::new();

    let mut lex = Token::lexer(source);
    while let Some(token) = lex.next() {
        let span = lex.span();
        match token {
            Ok(Token::Newline) => {
                if let Some(stmt) = parse_line(line, std::mem::take(&mut current))? {
                    statements.push(stmt);
                }
                line += 1;
                line_start = span.end;
            }
            Ok(token) => current.push(token),
            Err(()) => {
                return Err(AssemblerError::SyntaxError {
                    line,
                    column: span.start - line_start + 1,
                    message: format!("unexpected input {:?}", lex.slice()),
                })
            }
        }
    }
    if let Some(stmt) = parse_line(line, current)? {
        statements.push(stmt);
    }
    Ok(statements)
}

/// Parse the tokens of one line; blank lines yield `None`
pub fn parse_line(line: usize, tokens: Vec<Token>) -> Result<Option<Statement>> {
    let mut tokens = tokens.into_iter();
    let result = match tokens.next() {
        None => return Ok(None),
        Some(Token::Id(result)) => match tokens.next() {
            Some(Token::Equals) => Some(result),
            _ => {
                return Err(AssemblerError::SyntaxError {
                    line,
                    column: 1,
                    message: format!("expected '=' after %{result}"),
                })
            }
        },
        Some(Token::Word(mnemonic)) => {
            return finish(line, None, &mnemonic, tokens).map(Some);
        }
        Some(other) => {
            return Err(AssemblerError::SyntaxError {
                line,
                column: 1,
                message: format!("expected an instruction, found {other:?}"),
            })
        }
    };

    match tokens.next() {
        Some(Token::Word(mnemonic)) => finish(line, result, &mnemonic, tokens).map(Some),
        _ => Err(AssemblerError::SyntaxError {
            line,
            column: 1,
            message: "expected an opcode after '='".to_string(),
        }),
    }
}

fn finish(
    line: usize,
    result: Option<String>,
    mnemonic: &str,
    tokens: impl Iterator<Item = Token>,
) -> Result<Statement> {
    let op = Op::from_name(mnemonic).ok_or_else(|| AssemblerError::UnknownInstruction {
        line,
        mnemonic: mnemonic.to_string(),
    })?;
    let operands = tokens
        .map(|token| match token {
            Token::Id(name) => Ok(Operand::Id(name)),
            Token::Word(word) => Ok(Operand::Word(word)),
            Token::Integer(v) => Ok(Operand::Integer(v)),
            Token::Hex(v) => Ok(Operand::Bits(v)),
            Token::Float(v) => Ok(Operand::Float(v)),
            Token::Str(s) => Ok(Operand::Str(s)),
            Token::Equals | Token::Newline => Err(AssemblerError::SyntaxError {
                line,
                column: 1,
                message: format!("unexpected {token:?} in operands of {mnemonic}"),
            }),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Statement {
        line,
        result,
        op,
        operands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_statement() {
        let stmts = parse("%float = OpTypeFloat 32").unwrap();
        assert_eq!(
            stmts,
            vec![Statement {
                line: 1,
                result: Some("float".to_string()),
                op: Op::TypeFloat,
                operands: vec![Operand::Integer(32)],
            }]
        );
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let source = r#"
            ; header comment
            OpCapability Shader

            OpMemoryModel Logical GLSL450 ; trailing
        "#;
        let stmts = parse(source).unwrap();
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].line, 3);
        assert_eq!(stmts[0].op, Op::Capability);
        assert_eq!(
            stmts[1].operands,
            vec![
                Operand::Word("Logical".to_string()),
                Operand::Word("GLSL450".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_unknown_opcode() {
        assert!(matches!(
            parse("OpBogus %1"),
            Err(AssemblerError::UnknownInstruction { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_missing_equals() {
        assert!(matches!(
            parse("%1 OpTypeVoid"),
            Err(AssemblerError::SyntaxError { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_bad_character_position() {
        match parse("OpNop\n  OpNop $") {
            Err(AssemblerError::SyntaxError { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 9);
            }
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }
}
