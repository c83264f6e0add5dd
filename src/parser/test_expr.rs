//! `[[ EXPR ]]` conditional-expression mini-grammar (spec.md §4.3).
//!
//! Operates directly on the shared token cursor rather than on
//! pre-split words, because `<` and `>` are ordinary lexer operators
//! (`Operator::Less`/`Great`) that mean string comparison here instead
//! of redirection — only a parser with the `[[ ... ]]` context can tell
//! the difference.

use crate::error::ParseError;
use crate::lexer::token::{Operator, TokenKind};
use crate::parser::ast::{ArithExpr, TestExpr, TestUnaryOp, Word};
use crate::parser::words;
use crate::parser::Tokens;

/// Parses the body of a `[[ ... ]]`, stopping just before the closing
/// `]]` (which the caller consumes).
pub fn parse_test_expr<'a>(tokens: &mut Tokens<'a>) -> Result<TestExpr<'a>, ParseError> {
    parse_or(tokens)
}

fn parse_or<'a>(tokens: &mut Tokens<'a>) -> Result<TestExpr<'a>, ParseError> {
    let mut lhs = parse_and(tokens)?;
    while tokens.eat_operator(Operator::Or) {
        let rhs = parse_and(tokens)?;
        lhs = TestExpr::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_and<'a>(tokens: &mut Tokens<'a>) -> Result<TestExpr<'a>, ParseError> {
    let mut lhs = parse_unary_not(tokens)?;
    while tokens.eat_operator(Operator::And) {
        let rhs = parse_unary_not(tokens)?;
        lhs = TestExpr::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_unary_not<'a>(tokens: &mut Tokens<'a>) -> Result<TestExpr<'a>, ParseError> {
    if tokens.eat_operator(Operator::Bang) {
        let inner = parse_unary_not(tokens)?;
        return Ok(TestExpr::Not(Box::new(inner)));
    }
    parse_primary(tokens)
}

fn parse_primary<'a>(tokens: &mut Tokens<'a>) -> Result<TestExpr<'a>, ParseError> {
    if tokens.eat_operator(Operator::LParen) {
        let inner = parse_or(tokens)?;
        tokens.expect_operator(Operator::RParen)?;
        return Ok(TestExpr::Group(Box::new(inner)));
    }

    let first = tokens.next_word_raw()?;
    if let Some(op) = file_test_operator(first.0) {
        let operand = parse_operand(tokens)?;
        return Ok(TestExpr::UnaryFile(op, operand));
    }

    let lhs = words::parse_word(first.0, first.1)?;

    if let Some(binop) = tokens.peek_comparison_operator() {
        tokens.advance();
        let rhs_raw = tokens.next_word_raw()?;
        let rhs = words::parse_word(rhs_raw.0, rhs_raw.1)?;
        return build_string_or_numeric(binop, lhs, rhs);
    }

    Ok(TestExpr::Truthy(lhs))
}

fn parse_operand<'a>(tokens: &mut Tokens<'a>) -> Result<Word<'a>, ParseError> {
    let (text, offset) = tokens.next_word_raw()?;
    words::parse_word(text, offset)
}

fn file_test_operator(word: &str) -> Option<TestUnaryOp> {
    Some(match word {
        "-f" => TestUnaryOp::IsFile,
        "-d" => TestUnaryOp::IsDir,
        "-e" => TestUnaryOp::Exists,
        "-r" => TestUnaryOp::IsReadable,
        "-w" => TestUnaryOp::IsWritable,
        "-x" => TestUnaryOp::IsExecutable,
        "-s" => TestUnaryOp::IsNonEmptyFile,
        "-z" => TestUnaryOp::IsEmptyString,
        "-n" => TestUnaryOp::IsNonEmptyString,
        _ => return None,
    })
}

/// Comparison operator recognized between two operands inside `[[ ]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    StringEq,
    StringNe,
    StringLt,
    StringGt,
    Regex,
    NumEq,
    NumNe,
    NumLt,
    NumLe,
    NumGt,
    NumGe,
}

impl<'a> Tokens<'a> {
    /// Peeks for a `[[ ]]` comparison operator, consuming nothing. Covers
    /// both lexer-level operators (`Less`, `Great`) and word-shaped
    /// operators (`==`, `=`, `!=`, `=~`, numeric `-eq` etc. are words).
    fn peek_comparison_operator(&mut self) -> Option<CompareOp> {
        if let Some(tok) = self.peek() {
            match &tok.kind {
                TokenKind::Operator(Operator::Less) => return Some(CompareOp::StringLt),
                TokenKind::Operator(Operator::Great) => return Some(CompareOp::StringGt),
                TokenKind::Word(w) => {
                    return match *w {
                        "==" | "=" => Some(CompareOp::StringEq),
                        "!=" => Some(CompareOp::StringNe),
                        "=~" => Some(CompareOp::Regex),
                        "-eq" => Some(CompareOp::NumEq),
                        "-ne" => Some(CompareOp::NumNe),
                        "-lt" => Some(CompareOp::NumLt),
                        "-le" => Some(CompareOp::NumLe),
                        "-gt" => Some(CompareOp::NumGt),
                        "-ge" => Some(CompareOp::NumGe),
                        _ => None,
                    };
                }
                _ => {}
            }
        }
        None
    }
}

fn build_string_or_numeric<'a>(op: CompareOp, lhs: Word<'a>, rhs: Word<'a>) -> Result<TestExpr<'a>, ParseError> {
    Ok(match op {
        CompareOp::StringEq => TestExpr::StringEq(lhs, rhs),
        CompareOp::StringNe => TestExpr::StringNe(lhs, rhs),
        CompareOp::StringLt => TestExpr::StringLt(lhs, rhs),
        CompareOp::StringGt => TestExpr::StringGt(lhs, rhs),
        CompareOp::Regex => TestExpr::Regex(lhs, rhs),
        CompareOp::NumEq | CompareOp::NumNe | CompareOp::NumLt | CompareOp::NumLe
        | CompareOp::NumGt | CompareOp::NumGe => {
            let lhs_arith = word_to_arith(&lhs)?;
            let rhs_arith = word_to_arith(&rhs)?;
            match op {
                CompareOp::NumEq => TestExpr::NumEq(lhs_arith, rhs_arith),
                CompareOp::NumNe => TestExpr::NumNe(lhs_arith, rhs_arith),
                CompareOp::NumLt => TestExpr::NumLt(lhs_arith, rhs_arith),
                CompareOp::NumLe => TestExpr::NumLe(lhs_arith, rhs_arith),
                CompareOp::NumGt => TestExpr::NumGt(lhs_arith, rhs_arith),
                CompareOp::NumGe => TestExpr::NumGe(lhs_arith, rhs_arith),
                _ => unreachable!(),
            }
        }
    })
}

/// Turns a word used as a numeric test operand into an `ArithExpr`: a bare
/// variable reference or integer literal parses directly (unwrapping one
/// layer of double-quoting first, since `[[ "$x" -gt 0 ]]` is as ordinary
/// as `[[ $x -gt 0 ]]` to bash), anything else re-parses as arithmetic
/// text. Per spec.md §4.4, an operand this can't make sense of must refuse
/// rather than silently stand in for `0` — the caller routes that refusal
/// to passthrough instead of emitting an always-wrong comparison.
fn word_to_arith<'a>(word: &Word<'a>) -> Result<ArithExpr<'a>, ParseError> {
    use crate::parser::ast::WordFragment;
    let unwrapped = match word.fragments.as_slice() {
        [WordFragment::DoubleQuoted(inner)] => inner.as_slice(),
        other => other,
    };
    if let [WordFragment::VarSimple(name)] = unwrapped {
        return Ok(ArithExpr::Var(name));
    }
    if let [WordFragment::Literal(text)] = unwrapped {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(ArithExpr::Literal(n));
        }
        return super::arith::parse_arith(text);
    }
    Err(ParseError::Unsupported(format!(
        "numeric test operand {word:?} is not a bare variable or integer literal"
    )))
}
