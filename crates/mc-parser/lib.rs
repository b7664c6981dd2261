//! Recursive-descent parser turning a Micro-C token stream into an
//! `mc_ast::Program`, plus the semantic checks the spec assigns to
//! parse time (redeclaration, assignment-shape mismatch, undeclared
//! identifiers).
//!
//! `mc-lexer` hands us a flat `Vec<Token>`; from here on this is a
//! straightforward hand-written grammar, not a `nom` combinator chain
//! — token-level recursive descent reads closer to the grammar table
//! in the language summary than a combinator pipeline would, and it
//! is where precedence climbing for `aexpr`/`bexpr` naturally lives.

use std::collections::HashMap;

use mc_ast::*;
use mc_lexer::{lex, Token, TokenKind};
use mc_str::{Interner, StrId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}, column {column}: syntax error near '{excerpt}'")]
    Syntax {
        line: u32,
        column: usize,
        excerpt: String,
    },
    #[error("line {line}: '{name}' is already declared")]
    Redeclaration { name: String, line: Option<u32> },
    #[error("line {line}: assignment shape mismatch: {detail}")]
    AssignmentShapeMismatch { detail: String, line: Option<u32> },
    #[error("line {line}: use of undeclared identifier '{name}'")]
    UndeclaredIdentifier { name: String, line: Option<u32> },
    #[error("line {line}: type mismatch: {detail}")]
    TypeMismatch { detail: String, line: Option<u32> },
}

impl ParseError {
    fn line(&self) -> Option<u32> {
        match self {
            ParseError::Syntax { line, .. } => Some(*line),
            ParseError::Redeclaration { line, .. } => *line,
            ParseError::AssignmentShapeMismatch { line, .. } => *line,
            ParseError::UndeclaredIdentifier { line, .. } => *line,
            ParseError::TypeMismatch { line, .. } => *line,
        }
    }
}

/// Result of parsing a source file: the interner built up while
/// parsing (needed to render identifiers back to text), the program
/// if construction got far enough to produce one, and any errors
/// encountered. A non-empty `errors` with `program: Some(_)` means
/// only semantic errors were found; syntax errors abort construction.
pub struct ParseOutcome {
    pub program: Option<Program>,
    pub interner: Interner,
    pub errors: Vec<ParseError>,
}

pub fn parse(src: &str) -> ParseOutcome {
    let tokens = lex(src);
    let mut parser = Parser {
        tokens,
        pos: 0,
        interner: Interner::new(),
        errors: Vec::new(),
        declared: HashMap::new(),
    };
    let program = match parser.parse_program() {
        Ok(p) => Some(p),
        Err(e) => {
            parser.errors.push(e);
            None
        }
    };
    let mut errors = parser.errors;
    errors.sort_by_key(|e| e.line().unwrap_or(0));
    ParseOutcome {
        program,
        interner: parser.interner,
        errors,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    interner: Interner,
    errors: Vec<ParseError>,
    declared: HashMap<StrId, (DeclKind, Option<Lineno>)>,
}

type PResult<T> = Result<T, ParseError>;

enum Postfix {
    Identifier(StrId),
    ArrayDeref { base: StrId, index: Box<AExpr> },
    RecordDeref { base: StrId, field: Field },
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn syntax_error(&self, msg: &str) -> ParseError {
        let tok = self.peek();
        let excerpt = format!("{:?} ({})", tok.kind, msg);
        ParseError::Syntax {
            line: tok.line,
            column: tok.column,
            excerpt,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if *self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.syntax_error(&format!("expected {:?}", kind)))
        }
    }

    fn expect_ident(&mut self) -> PResult<(StrId, u32)> {
        let line = self.peek().line;
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((self.interner.intern(name), line))
            }
            _ => Err(self.syntax_error("expected an identifier")),
        }
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    // program := block+
    fn parse_program(&mut self) -> PResult<Program> {
        let mut blocks = Vec::new();
        while !self.at_eof() {
            blocks.push(self.parse_block()?);
        }
        if blocks.is_empty() {
            return Err(self.syntax_error("expected at least one block"));
        }
        Ok(Program { blocks })
    }

    // block := { decls stmts }
    fn parse_block(&mut self) -> PResult<Block> {
        self.expect(TokenKind::LBrace)?;
        let mut decls = Vec::new();
        while matches!(self.peek_kind(), TokenKind::Int | TokenKind::LBrace) {
            decls.push(self.parse_decl()?);
        }
        let mut stmts = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Block { decls, stmts })
    }

    // nested_block := { stmts } (no declarations)
    fn parse_nested_block(&mut self) -> PResult<NestedBlock> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn declare(&mut self, name: StrId, kind: DeclKind, line: Option<Lineno>) {
        if let Some((_, prev_line)) = self.declared.get(&name) {
            self.errors.push(ParseError::Redeclaration {
                name: self.interner.lookup(name).to_string(),
                line: line.or(*prev_line),
            });
            return;
        }
        self.declared.insert(name, (kind, line));
    }

    fn check_declared(&mut self, name: StrId, line: Option<Lineno>) {
        if !self.declared.contains_key(&name) {
            self.errors.push(ParseError::UndeclaredIdentifier {
                name: self.interner.lookup(name).to_string(),
                line,
            });
        }
    }

    // a declaration is `int ID` or `int[LIT] ID` or `{ int fst; int snd } ID`
    fn parse_decl(&mut self) -> PResult<Decl> {
        let line = self.peek().line;
        if matches!(self.peek_kind(), TokenKind::LBrace) {
            self.advance();
            self.expect(TokenKind::Int)?;
            self.expect_ident()?; // `fst`, spelled out by the grammar
            self.expect(TokenKind::Semi)?;
            self.expect(TokenKind::Int)?;
            self.expect_ident()?; // `snd`
            self.expect(TokenKind::Semi)?;
            self.expect(TokenKind::RBrace)?;
            let (name, _) = self.expect_ident()?;
            self.expect(TokenKind::Semi)?;
            self.declare(name, DeclKind::Record, Some(line));
            return Ok(Decl {
                name,
                kind: DeclKind::Record,
                lineno: Some(line),
            });
        }
        self.expect(TokenKind::Int)?;
        if matches!(self.peek_kind(), TokenKind::LBracket) {
            self.advance();
            let size_line = self.peek().line;
            let size = match self.peek_kind().clone() {
                TokenKind::Number(n) => {
                    self.advance();
                    n
                }
                _ => return Err(self.syntax_error("expected array size literal")),
            };
            self.expect(TokenKind::RBracket)?;
            let (name, _) = self.expect_ident()?;
            self.expect(TokenKind::Semi)?;
            self.declare(name, DeclKind::Array { size }, Some(size_line));
            return Ok(Decl {
                name,
                kind: DeclKind::Array { size },
                lineno: Some(line),
            });
        }
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::Semi)?;
        self.declare(name, DeclKind::Variable, Some(line));
        Ok(Decl {
            name,
            kind: DeclKind::Variable,
            lineno: Some(line),
        })
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        let line = self.peek().line;
        let kind = match self.peek_kind().clone() {
            TokenKind::If => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_bexpr()?;
                self.expect(TokenKind::RParen)?;
                let then_body = self.parse_nested_block()?;
                if matches!(self.peek_kind(), TokenKind::Else) {
                    self.advance();
                    let else_body = self.parse_nested_block()?;
                    StmtKind::IfElse {
                        cond,
                        then_body,
                        else_body,
                    }
                } else {
                    StmtKind::If {
                        cond,
                        body: then_body,
                    }
                }
            }
            TokenKind::While => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_bexpr()?;
                self.expect(TokenKind::RParen)?;
                let body = self.parse_nested_block()?;
                StmtKind::While { cond, body }
            }
            TokenKind::Read => {
                self.advance();
                let lvalue = self.parse_lvalue()?;
                self.expect(TokenKind::Semi)?;
                StmtKind::Call(Call::Read(lvalue, Some(line)))
            }
            TokenKind::Write => {
                self.advance();
                let e = self.parse_aexpr()?;
                self.expect(TokenKind::Semi)?;
                StmtKind::Call(Call::Write(e, Some(line)))
            }
            _ => {
                let lvalue = self.parse_lvalue()?;
                self.expect(TokenKind::Assign)?;
                let rhs = self.parse_rhs(&lvalue, line)?;
                self.check_assignment_types(&lvalue, &rhs, line);
                self.expect(TokenKind::Semi)?;
                StmtKind::Assignment(Assignment {
                    lhs: lvalue,
                    rhs,
                    lineno: Some(line),
                })
            }
        };
        Ok(Stmt {
            kind,
            lineno: Some(line),
        })
    }

    fn parse_rhs(&mut self, lhs: &LValue, line: u32) -> PResult<Rhs> {
        if matches!(self.peek_kind(), TokenKind::LParen) {
            // Could be a parenthesized aexpr OR a record initializer
            // list `(a, b)`. Peek past the first aexpr for a comma.
            let checkpoint = self.pos;
            self.advance();
            let first = self.parse_aexpr()?;
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
                let second = self.parse_aexpr()?;
                self.expect(TokenKind::RParen)?;
                if !matches!(lhs, LValue::Identifier(_)) {
                    self.errors.push(ParseError::AssignmentShapeMismatch {
                        detail: "record initializer list assigned to a non-scalar lvalue"
                            .to_string(),
                        line: Some(line),
                    });
                } else if !matches!(
                    self.declared.get(&lhs.base()).map(|(k, _)| k),
                    Some(DeclKind::Record)
                ) {
                    self.errors.push(ParseError::AssignmentShapeMismatch {
                        detail: "record initializer list assigned to a non-record variable"
                            .to_string(),
                        line: Some(line),
                    });
                }
                return Ok(Rhs::RecordInit(first, second));
            }
            self.pos = checkpoint;
        }
        let e = self.parse_aexpr()?;
        Ok(Rhs::AExpr(e))
    }

    /// Checks spec.md §7 assigns to `parse_rhs`/the assignment shape
    /// family but that weren't yet implemented: a scalar identifier
    /// can't take a plain expression when it's declared an array (an
    /// explicit example in spec.md §7's shape-mismatch list), a record
    /// needs an initializer list, and every base an lvalue/rvalue
    /// derefs through must actually have been declared with the
    /// matching aggregate kind.
    fn check_assignment_types(&mut self, lhs: &LValue, rhs: &Rhs, line: u32) {
        let lhs_kind = self.declared.get(&lhs.base()).map(|(k, _)| k.clone());
        match lhs {
            LValue::Identifier(_) => match lhs_kind {
                Some(DeclKind::Array { .. }) => {
                    self.errors.push(ParseError::AssignmentShapeMismatch {
                        detail: "cannot assign an expression to a variable with array type"
                            .to_string(),
                        line: Some(line),
                    });
                }
                Some(DeclKind::Record) if !matches!(rhs, Rhs::RecordInit(_, _)) => {
                    self.errors.push(ParseError::AssignmentShapeMismatch {
                        detail: "a record must be initialized with a record initializer list"
                            .to_string(),
                        line: Some(line),
                    });
                }
                _ => {}
            },
            LValue::ArrayDeref { base, .. } => {
                if matches!(lhs_kind, Some(k) if !matches!(k, DeclKind::Array { .. })) {
                    self.errors.push(ParseError::TypeMismatch {
                        detail: format!("'{}' is not an array", self.interner.lookup(*base)),
                        line: Some(line),
                    });
                }
            }
            LValue::RecordDeref { base, .. } => {
                if matches!(lhs_kind, Some(k) if k != DeclKind::Record) {
                    self.errors.push(ParseError::TypeMismatch {
                        detail: format!("'{}' is not a record", self.interner.lookup(*base)),
                        line: Some(line),
                    });
                }
            }
        }
        match rhs {
            Rhs::AExpr(e) => self.check_rvalue(e, line),
            Rhs::RecordInit(fst, snd) => {
                self.check_rvalue(fst, line);
                self.check_rvalue(snd, line);
            }
        }
    }

    /// Recursively checks that every identifier an arithmetic
    /// expression reads through matches its declared kind: a plain
    /// identifier must be a scalar, an `ArrayDeref` base must be an
    /// array, a `RecordDeref` base must be a record.
    fn check_rvalue(&mut self, e: &AExpr, line: u32) {
        match &e.kind {
            AExprKind::Number(_) => {}
            AExprKind::Identifier(id) => match self.declared.get(id).map(|(k, _)| k.clone()) {
                Some(DeclKind::Array { .. }) => {
                    self.errors.push(ParseError::TypeMismatch {
                        detail: format!("'{}' is an array, not a scalar", self.interner.lookup(*id)),
                        line: Some(line),
                    });
                }
                Some(DeclKind::Record) => {
                    self.errors.push(ParseError::TypeMismatch {
                        detail: format!("'{}' is a record, not a scalar", self.interner.lookup(*id)),
                        line: Some(line),
                    });
                }
                _ => {}
            },
            AExprKind::ArrayDeref { base, index } => {
                if matches!(self.declared.get(base).map(|(k, _)| k.clone()), Some(k) if !matches!(k, DeclKind::Array { .. }))
                {
                    self.errors.push(ParseError::TypeMismatch {
                        detail: format!("'{}' is not an array", self.interner.lookup(*base)),
                        line: Some(line),
                    });
                }
                self.check_rvalue(index, line);
            }
            AExprKind::RecordDeref { base, .. } => {
                if matches!(self.declared.get(base).map(|(k, _)| k.clone()), Some(k) if k != DeclKind::Record)
                {
                    self.errors.push(ParseError::TypeMismatch {
                        detail: format!("'{}' is not a record", self.interner.lookup(*base)),
                        line: Some(line),
                    });
                }
            }
            AExprKind::BinOp { lhs, rhs, .. } => {
                self.check_rvalue(lhs, line);
                self.check_rvalue(rhs, line);
            }
        }
    }

    fn parse_lvalue(&mut self) -> PResult<LValue> {
        let line = self.peek().line;
        match self.parse_postfix_ident()? {
            Postfix::Identifier(id) => {
                self.check_declared(id, Some(line));
                Ok(LValue::Identifier(id))
            }
            Postfix::ArrayDeref { base, index } => {
                self.check_declared(base, Some(line));
                Ok(LValue::ArrayDeref { base, index })
            }
            Postfix::RecordDeref { base, field } => {
                self.check_declared(base, Some(line));
                Ok(LValue::RecordDeref { base, field })
            }
        }
    }

    /// `ID`, `ID[aexpr]`, or `ID.fst|snd` — the shared shape between an
    /// lvalue and an arithmetic-expression atom referring to a
    /// variable.
    fn parse_postfix_ident(&mut self) -> PResult<Postfix> {
        let (name, _line) = self.expect_ident()?;
        if matches!(self.peek_kind(), TokenKind::LBracket) {
            self.advance();
            let index = self.parse_aexpr()?;
            self.expect(TokenKind::RBracket)?;
            return Ok(Postfix::ArrayDeref {
                base: name,
                index: Box::new(index),
            });
        }
        if matches!(self.peek_kind(), TokenKind::Dot) {
            self.advance();
            let (field_name, line) = self.expect_ident()?;
            let field = if Some(field_name) == self.interner.get("fst") {
                Field::Fst
            } else if Some(field_name) == self.interner.get("snd") {
                Field::Snd
            } else {
                return Err(ParseError::Syntax {
                    line,
                    column: 0,
                    excerpt: "expected 'fst' or 'snd' field name".to_string(),
                });
            };
            return Ok(Postfix::RecordDeref { base: name, field });
        }
        Ok(Postfix::Identifier(name))
    }

    // bexpr precedence (lowest to highest): | , & , relation/not
    fn parse_bexpr(&mut self) -> PResult<BExpr> {
        self.parse_bexpr_or()
    }

    fn parse_bexpr_or(&mut self) -> PResult<BExpr> {
        let mut lhs = self.parse_bexpr_and()?;
        while matches!(self.peek_kind(), TokenKind::Or) {
            let line = self.advance().line;
            let rhs = self.parse_bexpr_and()?;
            lhs = BExpr::new(BExprKind::Or(Box::new(lhs), Box::new(rhs)), Some(line));
        }
        Ok(lhs)
    }

    fn parse_bexpr_and(&mut self) -> PResult<BExpr> {
        let mut lhs = self.parse_bexpr_not()?;
        while matches!(self.peek_kind(), TokenKind::And) {
            let line = self.advance().line;
            let rhs = self.parse_bexpr_not()?;
            lhs = BExpr::new(BExprKind::And(Box::new(lhs), Box::new(rhs)), Some(line));
        }
        Ok(lhs)
    }

    fn parse_bexpr_not(&mut self) -> PResult<BExpr> {
        if matches!(self.peek_kind(), TokenKind::Not) {
            let line = self.advance().line;
            let inner = self.parse_bexpr_not()?;
            return Ok(BExpr::new(BExprKind::Not(Box::new(inner)), Some(line)));
        }
        self.parse_bexpr_atom()
    }

    fn parse_bexpr_atom(&mut self) -> PResult<BExpr> {
        let line = self.peek().line;
        match self.peek_kind().clone() {
            TokenKind::True => {
                self.advance();
                Ok(BExpr::new(BExprKind::BoolLiteral(true), Some(line)))
            }
            TokenKind::False => {
                self.advance();
                Ok(BExpr::new(BExprKind::BoolLiteral(false), Some(line)))
            }
            TokenKind::LParen => {
                // Disambiguate `(bexpr)` from a relation `aexpr relop aexpr`
                // by trying the relation first: both start with an aexpr,
                // but a bare parenthesized bexpr only ever wraps `|`/`&`/`!`
                // constructs or another parenthesized bexpr, never a lone
                // relational comparison without an enclosing paren of its
                // own at this position.
                self.advance();
                let inner = self.parse_bexpr_or()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => {
                let lhs = self.parse_aexpr()?;
                let op = self.parse_relop()?;
                let rhs = self.parse_aexpr()?;
                Ok(BExpr::new(
                    BExprKind::Relation { op, lhs, rhs },
                    Some(line),
                ))
            }
        }
    }

    fn parse_relop(&mut self) -> PResult<RelOp> {
        let op = match self.peek_kind() {
            TokenKind::Lt => RelOp::Lt,
            TokenKind::Gt => RelOp::Gt,
            TokenKind::Lte => RelOp::Lte,
            TokenKind::Gte => RelOp::Gte,
            TokenKind::EqEq => RelOp::Eq,
            TokenKind::Neq => RelOp::Neq,
            _ => return Err(self.syntax_error("expected a relational operator")),
        };
        self.advance();
        Ok(op)
    }

    // aexpr precedence: + - (lowest), * / % (higher)
    fn parse_aexpr(&mut self) -> PResult<AExpr> {
        let mut lhs = self.parse_aexpr_mul()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => ABinOp::Add,
                TokenKind::Minus => ABinOp::Sub,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_aexpr_mul()?;
            lhs = AExpr::new(
                AExprKind::BinOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                Some(line),
            );
        }
        Ok(lhs)
    }

    fn parse_aexpr_mul(&mut self) -> PResult<AExpr> {
        let mut lhs = self.parse_aexpr_atom()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => ABinOp::Mul,
                TokenKind::Slash => ABinOp::Div,
                TokenKind::Percent => ABinOp::Mod,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_aexpr_atom()?;
            lhs = AExpr::new(
                AExprKind::BinOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                Some(line),
            );
        }
        Ok(lhs)
    }

    fn parse_aexpr_atom(&mut self) -> PResult<AExpr> {
        let line = self.peek().line;
        match self.peek_kind().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(AExpr::new(AExprKind::Number(n), Some(line)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_aexpr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(_) => {
                let kind = match self.parse_postfix_ident()? {
                    Postfix::Identifier(id) => {
                        self.check_declared(id, Some(line));
                        AExprKind::Identifier(id)
                    }
                    Postfix::ArrayDeref { base, index } => {
                        self.check_declared(base, Some(line));
                        AExprKind::ArrayDeref { base, index }
                    }
                    Postfix::RecordDeref { base, field } => {
                        self.check_declared(base, Some(line));
                        AExprKind::RecordDeref { base, field }
                    }
                };
                Ok(AExpr::new(kind, Some(line)))
            }
            _ => Err(self.syntax_error("expected a number, identifier, or '('")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_scalar_program_parses() {
        let src = "{ int x; int y;\n  x := 1;\n  y := x + 2; }";
        let outcome = parse(src);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        let program = outcome.program.expect("program");
        assert_eq!(program.blocks.len(), 1);
        assert_eq!(program.blocks[0].decls.len(), 2);
        assert_eq!(program.blocks[0].stmts.len(), 2);
    }

    #[test]
    fn redeclaration_is_reported() {
        let src = "{ int x; int x; x := 1; }";
        let outcome = parse(src);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::Redeclaration { .. })));
    }

    #[test]
    fn undeclared_identifier_is_reported() {
        let src = "{ int x; y := 1; }";
        let outcome = parse(src);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::UndeclaredIdentifier { .. })));
    }

    #[test]
    fn record_initializer_to_scalar_is_a_shape_mismatch() {
        let src = "{ int x; x := (1, 2); }";
        let outcome = parse(src);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::AssignmentShapeMismatch { .. })));
    }

    #[test]
    fn expression_assigned_to_array_variable_is_a_shape_mismatch() {
        let src = "{ int[3] A; A := 1; }";
        let outcome = parse(src);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::AssignmentShapeMismatch { .. })));
    }

    #[test]
    fn record_assigned_a_plain_expression_is_a_shape_mismatch() {
        let src = "{ {int fst; int snd} r; r := 1; }";
        let outcome = parse(src);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::AssignmentShapeMismatch { .. })));
    }

    #[test]
    fn array_identifier_used_as_a_scalar_rvalue_is_a_type_mismatch() {
        let src = "{ int[3] A; int x; x := A; }";
        let outcome = parse(src);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::TypeMismatch { .. })));
    }

    #[test]
    fn record_identifier_used_as_a_scalar_rvalue_is_a_type_mismatch() {
        let src = "{ {int fst; int snd} r; int x; x := r; }";
        let outcome = parse(src);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::TypeMismatch { .. })));
    }

    #[test]
    fn indexing_a_non_array_variable_is_a_type_mismatch() {
        let src = "{ int x; int y; y := x[0]; }";
        let outcome = parse(src);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::TypeMismatch { .. })));
    }

    #[test]
    fn dereferencing_a_field_on_a_non_record_variable_is_a_type_mismatch() {
        let src = "{ int x; int y; y := x.fst; }";
        let outcome = parse(src);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::TypeMismatch { .. })));
    }

    #[test]
    fn record_round_trips() {
        let src = "{ {int fst; int snd} r; r := (1, 2); r.fst := r.snd; }";
        let outcome = parse(src);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    }

    #[test]
    fn if_else_and_while_parse() {
        let src = "{ int x;\n  if (x < 1) { x := x + 1; } else { x := 0; }\n  while (x < 10) { x := x + 1; } }";
        let outcome = parse(src);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        let program = outcome.program.unwrap();
        assert_eq!(program.blocks[0].stmts.len(), 2);
    }

    #[test]
    fn precedence_matches_the_table() {
        // `1 + 2 * 3` should parse as `1 + (2 * 3)`.
        let src = "{ int x; x := 1 + 2 * 3; }";
        let outcome = parse(src);
        assert!(outcome.errors.is_empty());
        let program = outcome.program.unwrap();
        let StmtKind::Assignment(a) = &program.blocks[0].stmts[0].kind else {
            panic!("expected assignment");
        };
        let Rhs::AExpr(e) = &a.rhs else {
            panic!("expected aexpr rhs");
        };
        let AExprKind::BinOp { op, rhs, .. } = &e.kind else {
            panic!("expected binop");
        };
        assert_eq!(*op, ABinOp::Add);
        assert!(matches!(rhs.kind, AExprKind::BinOp { op: ABinOp::Mul, .. }));
    }

    #[test]
    fn syntax_error_reports_line() {
        let src = "{ int x\n  x := 1; }";
        let outcome = parse(src);
        assert!(outcome.program.is_none());
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], ParseError::Syntax { .. }));
    }
}
