//! Tokenizer for Micro-C source text.
//!
//! Built on `nom`/`nom_locate` the way `brane-dsl`'s parser layer is,
//! though considerably simpler: Micro-C's lexical grammar has no
//! nested string escapes or indentation sensitivity, so a single pass
//! of `nom` combinators over a `LocatedSpan` is enough to produce a
//! flat token stream with line numbers attached. `mc-parser` consumes
//! that stream with its own hand-written recursive-descent grammar.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace1},
    combinator::{map, recognize, value},
    multi::many0,
    sequence::pair,
    IResult,
};
use nom_locate::LocatedSpan;

pub type Span<'a> = LocatedSpan<&'a str>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    If,
    Else,
    While,
    Int,
    Read,
    Write,
    True,
    False,
    Ident(String),
    Number(i64),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Semi,
    Comma,
    Dot,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Gt,
    Lte,
    Gte,
    EqEq,
    Neq,
    And,
    Or,
    Not,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: usize,
}

/// Whitespace, and `//` line comments ("two or more slashes begin a
/// comment" per the source-language summary — `//`, `///`, `////`, ...
/// all start one).
fn skip_trivia(mut input: Span) -> Span {
    loop {
        if let Ok((rest, _)) = multispace1::<Span, nom::error::Error<Span>>(input) {
            input = rest;
            continue;
        }
        if input.fragment().starts_with("//") {
            use nom::Slice;
            let consumed = match input.fragment().find('\n') {
                Some(pos) => pos,
                None => input.fragment().len(),
            };
            input = input.slice(consumed..);
            continue;
        }
        break;
    }
    input
}

fn ident_or_keyword(input: Span) -> IResult<Span, TokenKind> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |s: Span| match *s.fragment() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "int" => TokenKind::Int,
            "read" => TokenKind::Read,
            "write" => TokenKind::Write,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            other => TokenKind::Ident(other.to_string()),
        },
    )(input)
}

fn number(input: Span) -> IResult<Span, TokenKind> {
    map(digit1, |s: Span| {
        TokenKind::Number(s.fragment().parse().expect("digit1 guarantees parseable i64"))
    })(input)
}

fn operator_or_punct(input: Span) -> IResult<Span, TokenKind> {
    alt((
        value(TokenKind::Assign, tag(":=")),
        value(TokenKind::Lte, tag("<=")),
        value(TokenKind::Gte, tag(">=")),
        value(TokenKind::EqEq, tag("==")),
        value(TokenKind::Neq, tag("!=")),
        value(TokenKind::LBrace, char('{')),
        value(TokenKind::RBrace, char('}')),
        value(TokenKind::LBracket, char('[')),
        value(TokenKind::RBracket, char(']')),
        value(TokenKind::LParen, char('(')),
        value(TokenKind::RParen, char(')')),
        value(TokenKind::Semi, char(';')),
        value(TokenKind::Comma, char(',')),
        value(TokenKind::Dot, char('.')),
        value(TokenKind::Plus, char('+')),
        value(TokenKind::Minus, char('-')),
        value(TokenKind::Star, char('*')),
        value(TokenKind::Slash, char('/')),
        value(TokenKind::Percent, char('%')),
        value(TokenKind::Lt, char('<')),
        value(TokenKind::Gt, char('>')),
        value(TokenKind::And, char('&')),
        value(TokenKind::Or, char('|')),
        value(TokenKind::Not, char('!')),
    ))(input)
}

fn one_token(input: Span) -> IResult<Span, TokenKind> {
    alt((ident_or_keyword, number, operator_or_punct))(input)
}

/// Tokenize the whole source. Unrecognized characters are skipped
/// silently (spec: lexical errors recover without aborting) — the
/// parser is left to report a syntax error once the surrounding
/// tokens don't form a valid construct.
pub fn lex(src: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut input = Span::new(src);

    loop {
        input = skip_trivia(input);
        if input.fragment().is_empty() {
            break;
        }
        let line = input.location_line();
        let column = input.get_utf8_column();
        match one_token(input) {
            Ok((rest, kind)) => {
                tokens.push(Token { kind, line, column });
                input = rest;
            }
            Err(_) => {
                use nom::Slice;
                // Unknown character: drop it and keep scanning.
                input = input.slice(1..);
            }
        }
    }

    let eof_line = input.location_line();
    let eof_column = input.get_utf8_column();
    tokens.push(Token {
        kind: TokenKind::Eof,
        line: eof_line,
        column: eof_column,
    });
    tokens
}
