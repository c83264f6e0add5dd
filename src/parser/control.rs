//! Compound statement productions: `if`, `for`, `while`/`until`, `case`,
//! function definitions, subshells, groups, and the `(( ))` arithmetic
//! command, per spec.md §4.3.

use crate::error::ParseError;
use crate::lexer::scan;
use crate::lexer::token::{Keyword, Operator};
use crate::parser::ast::{ArithExpr, BashAst, CaseArm, CaseTerminator};
use crate::parser::words;
use crate::parser::Tokens;

pub fn parse_if<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    tokens.expect_keyword(Keyword::If)?;
    let mut branches = Vec::new();
    loop {
        let cond = tokens.parse_stmts_until(|t| t.at_keyword(Keyword::Then))?;
        tokens.expect_keyword(Keyword::Then)?;
        let body = tokens.parse_stmts_until(|t| {
            t.at_keyword(Keyword::Elif) || t.at_keyword(Keyword::Else) || t.at_keyword(Keyword::Fi)
        })?;
        branches.push((cond, body));
        if tokens.eat_keyword(Keyword::Elif) {
            continue;
        }
        break;
    }
    let else_branch = if tokens.eat_keyword(Keyword::Else) {
        Some(Box::new(tokens.parse_stmts_until(|t| t.at_keyword(Keyword::Fi))?))
    } else {
        None
    };
    tokens.expect_keyword(Keyword::Fi)?;
    Ok(BashAst::If { branches, else_branch })
}

pub fn parse_for<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    tokens.expect_keyword(Keyword::For)?;
    if tokens.eat_operator(Operator::DoubleLParen) {
        return parse_for_arith(tokens);
    }

    let name = tokens.expect_word_text()?;
    tokens.skip_separators();

    let words_list = if tokens.eat_keyword(Keyword::In) {
        let mut list = Vec::new();
        while let Some((text, offset)) = tokens.try_next_word_raw() {
            list.push(words::parse_word(text, offset)?);
        }
        tokens.eat_operator(Operator::Semi);
        tokens.skip_separators();
        list
    } else {
        tokens.eat_operator(Operator::Semi);
        tokens.skip_separators();
        Vec::new()
    };

    tokens.expect_keyword(Keyword::Do)?;
    let body = tokens.parse_stmts_until(|t| t.at_keyword(Keyword::Done))?;
    tokens.expect_keyword(Keyword::Done)?;
    Ok(BashAst::For {
        name,
        words: words_list,
        body: Box::new(body),
    })
}

fn parse_for_arith<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    // `tokens` cursor is already positioned right after the `((` token;
    // re-derive the raw span from the source so the three clauses can be
    // parsed with the arithmetic grammar rather than the statement
    // tokenizer (arithmetic uses `<`, `;` etc. with different meaning).
    let open_tok = tokens.previous_span_start();
    let end = find_matching_double_paren(tokens.input, open_tok)
        .ok_or_else(|| ParseError::MissingTerminator {
            terminator: "))".to_string(),
            offset: open_tok,
        })?;
    let raw = &tokens.input[open_tok + 2..end - 2];
    let clauses = split_top_level(raw, ';');
    if clauses.len() != 3 {
        return Err(ParseError::Unsupported(
            "C-style for loop requires exactly three ;-separated clauses".to_string(),
        ));
    }
    let init = parse_opt_arith(clauses[0])?;
    let cond = parse_opt_arith(clauses[1])?;
    let update = parse_opt_arith(clauses[2])?;
    tokens.seek_to_byte(end);
    tokens.eat_operator(Operator::Semi);
    tokens.skip_separators();
    tokens.expect_keyword(Keyword::Do)?;
    let body = tokens.parse_stmts_until(|t| t.at_keyword(Keyword::Done))?;
    tokens.expect_keyword(Keyword::Done)?;
    Ok(BashAst::ForArith {
        init,
        cond,
        update,
        body: Box::new(body),
    })
}

pub fn parse_while_or_until<'a>(tokens: &mut Tokens<'a>, until: bool) -> Result<BashAst<'a>, ParseError> {
    if until {
        tokens.expect_keyword(Keyword::Until)?;
    } else {
        tokens.expect_keyword(Keyword::While)?;
    }
    let cond = tokens.parse_stmts_until(|t| t.at_keyword(Keyword::Do))?;
    tokens.expect_keyword(Keyword::Do)?;
    let body = tokens.parse_stmts_until(|t| t.at_keyword(Keyword::Done))?;
    tokens.expect_keyword(Keyword::Done)?;
    Ok(BashAst::While {
        cond: Box::new(cond),
        body: Box::new(body),
        until,
    })
}

pub fn parse_case<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    tokens.expect_keyword(Keyword::Case)?;
    let (scrutinee_text, scrutinee_off) = tokens.next_word_raw()?;
    let scrutinee = words::parse_word(scrutinee_text, scrutinee_off)?;
    tokens.skip_separators();
    tokens.expect_keyword(Keyword::In)?;
    tokens.skip_separators();

    let mut arms = Vec::new();
    while !tokens.at_keyword(Keyword::Esac) && !tokens.at_eof() {
        tokens.eat_operator(Operator::LParen);
        let mut patterns = Vec::new();
        loop {
            let (text, off) = tokens.next_word_raw()?;
            patterns.push(words::parse_word(text, off)?);
            if tokens.eat_pipe_in_pattern() {
                continue;
            }
            break;
        }
        tokens.expect_operator(Operator::RParen)?;
        tokens.skip_separators();

        let body = tokens.parse_stmts_until(|t| {
            t.at_operator(Operator::SemiSemi)
                || t.at_operator(Operator::SemiAmp)
                || t.at_operator(Operator::SemiSemiAmp)
                || t.at_keyword(Keyword::Esac)
        })?;

        let terminator = if tokens.eat_operator(Operator::SemiSemi) {
            CaseTerminator::Stop
        } else if tokens.eat_operator(Operator::SemiAmp) {
            CaseTerminator::FallThrough
        } else if tokens.eat_operator(Operator::SemiSemiAmp) {
            CaseTerminator::ContinueMatching
        } else {
            CaseTerminator::Stop
        };

        arms.push(CaseArm {
            patterns,
            body: Box::new(body),
            terminator,
        });
        tokens.skip_separators();
    }
    tokens.expect_keyword(Keyword::Esac)?;
    Ok(BashAst::Case { scrutinee, arms })
}

pub fn parse_function_def<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    let explicit_keyword = tokens.eat_keyword(Keyword::Function);
    let name = tokens.expect_word_text()?;
    if tokens.eat_operator(Operator::LParen) {
        tokens.expect_operator(Operator::RParen)?;
    } else if !explicit_keyword {
        return Err(ParseError::Unexpected {
            expected: "'(' or 'function'".to_string(),
            found: name.to_string(),
            offset: 0,
        });
    }
    tokens.skip_separators();
    let body = super::parse_command(tokens)?;
    Ok(BashAst::FunctionDef {
        name,
        body: Box::new(body),
    })
}

pub fn parse_subshell<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    tokens.expect_operator(Operator::LParen)?;
    let body = tokens.parse_stmts_until(|t| t.at_operator(Operator::RParen))?;
    tokens.expect_operator(Operator::RParen)?;
    Ok(BashAst::Subshell(Box::new(body)))
}

pub fn parse_group<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    tokens.expect_operator(Operator::LBrace)?;
    let body = tokens.parse_stmts_until(|t| t.at_operator(Operator::RBrace))?;
    tokens.expect_operator(Operator::RBrace)?;
    Ok(BashAst::Group(Box::new(body)))
}

pub fn parse_double_bracket<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    tokens.expect_operator(Operator::DoubleLBracket)?;
    let expr = super::test_expr::parse_test_expr(tokens)?;
    tokens.expect_operator(Operator::DoubleRBracket)?;
    Ok(BashAst::DoubleBracket(expr))
}

pub fn parse_arithmetic_command<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    tokens.expect_operator(Operator::DoubleLParen)?;
    let open = tokens.previous_span_start();
    let end = find_matching_double_paren(tokens.input, open).ok_or_else(|| {
        ParseError::MissingTerminator {
            terminator: "))".to_string(),
            offset: open,
        }
    })?;
    let raw = &tokens.input[open + 2..end - 2];
    let expr = super::arith::parse_arith(raw.trim())?;
    tokens.seek_to_byte(end);
    Ok(BashAst::Arithmetic(expr))
}

fn parse_opt_arith(s: &str) -> Result<Option<ArithExpr<'_>>, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        Ok(None)
    } else {
        Ok(Some(super::arith::parse_arith(s)?))
    }
}

/// Finds the index just past the `))` matching the `((` at `s[start..start+2]`.
fn find_matching_double_paren(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.get(start..start + 2) != Some(b"((") {
        return None;
    }
    let mut i = start + 2;
    let mut depth = 1i32;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                if depth == 1 && bytes.get(i + 1) == Some(&b')') {
                    return Some(i + 2);
                }
                depth -= 1;
                i += 1;
            }
            b'\'' => i = scan::skip_single_quoted(s, i).ok()?,
            b'"' => i = scan::skip_double_quoted(s, i).ok()?,
            _ => i += 1,
        }
    }
    None
}

/// Splits `s` on `sep` at paren/quote depth zero. Used for the three
/// clauses of a C-style `for ((init; cond; update))`.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
            }
            b'\'' => {
                i = scan::skip_single_quoted(s, i).unwrap_or(bytes.len());
            }
            b'"' => {
                i = scan::skip_double_quoted(s, i).unwrap_or(bytes.len());
            }
            b if depth == 0 && b as char == sep => {
                parts.push(&s[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(&s[start..]);
    parts
}
