//! # Lexer for textual SPIR-V

use logos::Logos;

/// Tokens of the `spirv-dis` text form
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip whitespace (not newlines)
#[logos(skip r";[^\n]*")] // Skip comments
pub enum Token {
    /// Result or operand ID, without the `%`
    #[regex(r"%[a-zA-Z0-9_.]+", |lex| lex.slice()[1..].to_string())]
    Id(String),

    /// Opcode mnemonic, enumerant or extended instruction name
    ///
    /// Mask enumerants are spelled with `|` between the bits.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*(\|[a-zA-Z_][a-zA-Z0-9_]*)*", |lex| lex.slice().to_string())]
    Word(String),

    /// Decimal integer
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse().ok())]
    Integer(i64),

    /// Hexadecimal integer, kept as raw bits
    #[regex(r"0x[0-9a-fA-F]+", |lex| u64::from_str_radix(&lex.slice()[2..], 16).ok())]
    Hex(u64),

    /// Decimal float, kept as text so each width parses it exactly
    #[regex(r"-?[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"-?[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().to_string())]
    Float(String),

    /// Quoted string with `\"` and `\\` escapes
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    #[token("=")]
    Equals,

    #[regex(r"\n")]
    Newline,
}

fn unescape(quoted: &str) -> Option<String> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next()?);
        } else {
            out.push(c);
        }
    }
    Some(out)
}
