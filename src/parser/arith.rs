//! Recursive-descent parser for the C-like arithmetic grammar used by
//! `$(( ))`, `(( ))`, and substring/offset operands inside parameter
//! expansions (spec.md §3's `ArithExpr`).
//!
//! A small hand-written Pratt parser over a byte cursor, in the same
//! style as the rest of the front end rather than a separate tokenizer —
//! arithmetic sub-expressions are short enough that a second token
//! stream would only add indirection.

use crate::error::ParseError;
use crate::parser::ast::{ArithBinaryOp, ArithExpr, ArithUnaryOp};

pub fn parse_arith(input: &str) -> Result<ArithExpr<'_>, ParseError> {
    let mut p = ArithParser { input, pos: 0 };
    p.skip_ws();
    let expr = p.parse_assignment()?;
    p.skip_ws();
    if p.pos != input.len() {
        return Err(ParseError::Unexpected {
            expected: "end of arithmetic expression".to_string(),
            found: input[p.pos..].to_string(),
            offset: p.pos,
        });
    }
    Ok(expr)
}

struct ArithParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ArithParser<'a> {
    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn skip_ws(&mut self) {
        while matches!(self.bytes().get(self.pos), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eat(&mut self, s: &str) -> bool {
        self.skip_ws();
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::Unexpected {
            expected: expected.to_string(),
            found: self.input[self.pos..].chars().take(8).collect(),
            offset: self.pos,
        }
    }

    /// Lowest precedence: ternary and simple/compound assignment.
    fn parse_assignment(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let start = self.pos;
        if let Some(name) = self.try_identifier_at(self.pos) {
            let after_name = self.pos + name.len();
            let mut probe = ArithParser {
                input: self.input,
                pos: after_name,
            };
            probe.skip_ws();
            for (tok, op) in COMPOUND_ASSIGN_OPS {
                if probe.starts_with(tok) && !probe.starts_with(&format!("{tok}=")) {
                    probe.pos += tok.len();
                    self.pos = probe.pos;
                    let rhs = self.parse_assignment()?;
                    return Ok(ArithExpr::CompoundAssign(*op, name, Box::new(rhs)));
                }
            }
            if probe.starts_with("=") && !probe.starts_with("==") {
                probe.pos += 1;
                self.pos = probe.pos;
                let rhs = self.parse_assignment()?;
                return Ok(ArithExpr::Assign(name, Box::new(rhs)));
            }
        }
        self.pos = start;
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let cond = self.parse_logical_or()?;
        if self.eat("?") {
            let then_branch = self.parse_assignment()?;
            if !self.eat(":") {
                return Err(self.unexpected("':'"));
            }
            let else_branch = self.parse_assignment()?;
            Ok(ArithExpr::Ternary(
                Box::new(cond),
                Box::new(then_branch),
                Box::new(else_branch),
            ))
        } else {
            Ok(cond)
        }
    }

    fn parse_logical_or(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_logical_and()?;
        loop {
            if self.eat("||") {
                let rhs = self.parse_logical_and()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Or, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_logical_and(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_bit_or()?;
        loop {
            if self.eat("&&") {
                let rhs = self.parse_bit_or()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::And, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_bit_or(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_bit_xor()?;
        loop {
            self.skip_ws();
            if self.starts_with("||") || self.starts_with("|=") || !self.starts_with("|") {
                return Ok(lhs);
            }
            self.pos += 1;
            let rhs = self.parse_bit_xor()?;
            lhs = ArithExpr::Binary(ArithBinaryOp::BitOr, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_bit_xor(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_bit_and()?;
        loop {
            self.skip_ws();
            if self.starts_with("^=") || !self.starts_with("^") {
                return Ok(lhs);
            }
            self.pos += 1;
            let rhs = self.parse_bit_and()?;
            lhs = ArithExpr::Binary(ArithBinaryOp::BitXor, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_bit_and(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_equality()?;
        loop {
            self.skip_ws();
            if self.starts_with("&&") || self.starts_with("&=") || !self.starts_with("&") {
                return Ok(lhs);
            }
            self.pos += 1;
            let rhs = self.parse_equality()?;
            lhs = ArithExpr::Binary(ArithBinaryOp::BitAnd, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_equality(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_relational()?;
        loop {
            if self.eat("==") {
                let rhs = self.parse_relational()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Eq, Box::new(lhs), Box::new(rhs));
            } else if self.eat("!=") {
                let rhs = self.parse_relational()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Ne, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_relational(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_shift()?;
        loop {
            if self.eat("<=") {
                let rhs = self.parse_shift()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Le, Box::new(lhs), Box::new(rhs));
            } else if self.eat(">=") {
                let rhs = self.parse_shift()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Ge, Box::new(lhs), Box::new(rhs));
            } else {
                self.skip_ws();
                if self.starts_with("<<") || self.starts_with("<") && !self.starts_with("<=") {
                    if self.starts_with("<<") {
                        return Ok(lhs);
                    }
                    self.pos += 1;
                    let rhs = self.parse_shift()?;
                    lhs = ArithExpr::Binary(ArithBinaryOp::Lt, Box::new(lhs), Box::new(rhs));
                    continue;
                }
                if self.starts_with(">>") || (self.starts_with(">") && !self.starts_with(">=")) {
                    if self.starts_with(">>") {
                        return Ok(lhs);
                    }
                    self.pos += 1;
                    let rhs = self.parse_shift()?;
                    lhs = ArithExpr::Binary(ArithBinaryOp::Gt, Box::new(lhs), Box::new(rhs));
                    continue;
                }
                return Ok(lhs);
            }
        }
    }

    fn parse_shift(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            if self.eat("<<") {
                let rhs = self.parse_additive()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Shl, Box::new(lhs), Box::new(rhs));
            } else if self.eat(">>") {
                let rhs = self.parse_additive()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Shr, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_additive(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            self.skip_ws();
            if self.starts_with("++") || self.starts_with("--") {
                return Ok(lhs);
            }
            if self.eat("+") {
                let rhs = self.parse_multiplicative()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Add, Box::new(lhs), Box::new(rhs));
            } else if self.eat("-") {
                let rhs = self.parse_multiplicative()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Sub, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let mut lhs = self.parse_power()?;
        loop {
            if self.eat("*") {
                let rhs = self.parse_power()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Mul, Box::new(lhs), Box::new(rhs));
            } else if self.eat("/") {
                let rhs = self.parse_power()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Div, Box::new(lhs), Box::new(rhs));
            } else if self.eat("%") {
                let rhs = self.parse_power()?;
                lhs = ArithExpr::Binary(ArithBinaryOp::Rem, Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_power(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let base = self.parse_unary()?;
        if self.eat("**") {
            let exp = self.parse_power()?; // right-associative
            Ok(ArithExpr::Binary(ArithBinaryOp::Pow, Box::new(base), Box::new(exp)))
        } else {
            Ok(base)
        }
    }

    fn parse_unary(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        self.skip_ws();
        if self.eat("++") {
            let name = self.expect_identifier()?;
            return Ok(ArithExpr::PreIncrement(name));
        }
        if self.eat("--") {
            let name = self.expect_identifier()?;
            return Ok(ArithExpr::PreDecrement(name));
        }
        if self.eat("!") {
            let inner = self.parse_unary()?;
            return Ok(ArithExpr::Unary(ArithUnaryOp::Not, Box::new(inner)));
        }
        if self.eat("~") {
            let inner = self.parse_unary()?;
            return Ok(ArithExpr::Unary(ArithUnaryOp::BitNot, Box::new(inner)));
        }
        if self.eat("-") {
            let inner = self.parse_unary()?;
            return Ok(ArithExpr::Unary(ArithUnaryOp::Neg, Box::new(inner)));
        }
        if self.eat("+") {
            let inner = self.parse_unary()?;
            return Ok(ArithExpr::Unary(ArithUnaryOp::Plus, Box::new(inner)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let primary = self.parse_primary()?;
        self.skip_ws();
        if let ArithExpr::Var(name) = primary {
            if self.eat("++") {
                return Ok(ArithExpr::PostIncrement(name));
            }
            if self.eat("--") {
                return Ok(ArithExpr::PostDecrement(name));
            }
        }
        Ok(primary)
    }

    fn parse_primary(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let inner = self.parse_assignment()?;
                if !self.eat(")") {
                    return Err(self.unexpected("')'"));
                }
                Ok(ArithExpr::Group(Box::new(inner)))
            }
            Some(b'$') if self.bytes().get(self.pos + 1) == Some(&b'{') => {
                // `${name}` used inside arithmetic: treat as a bare variable.
                self.pos += 2;
                let name = self.expect_identifier()?;
                if !self.eat("}") {
                    return Err(self.unexpected("'}'"));
                }
                Ok(ArithExpr::Var(name))
            }
            Some(b'$') => {
                self.pos += 1;
                let name = self.expect_identifier()?;
                Ok(ArithExpr::Var(name))
            }
            Some(b) if b.is_ascii_digit() => self.parse_number(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {
                let name = self.expect_identifier()?;
                Ok(ArithExpr::Var(name))
            }
            _ => Err(self.unexpected("arithmetic operand")),
        }
    }

    fn parse_number(&mut self) -> Result<ArithExpr<'a>, ParseError> {
        let start = self.pos;
        if self.starts_with("0x") || self.starts_with("0X") {
            self.pos += 2;
            while matches!(self.peek(), Some(b) if b.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let text = &self.input[start + 2..self.pos];
            let value = i64::from_str_radix(text, 16).map_err(|_| self.unexpected("hex literal"))?;
            return Ok(ArithExpr::Literal(value));
        }
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        let text = &self.input[start..self.pos];
        let value: i64 = text.parse().map_err(|_| self.unexpected("integer literal"))?;
        Ok(ArithExpr::Literal(value))
    }

    fn try_identifier_at(&self, at: usize) -> Option<&'a str> {
        let bytes = self.bytes();
        let b0 = *bytes.get(at)?;
        if !(b0.is_ascii_alphabetic() || b0 == b'_') {
            return None;
        }
        let mut end = at + 1;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        Some(&self.input[at..end])
    }

    fn expect_identifier(&mut self) -> Result<&'a str, ParseError> {
        self.skip_ws();
        match self.try_identifier_at(self.pos) {
            Some(name) => {
                self.pos += name.len();
                Ok(name)
            }
            None => Err(self.unexpected("identifier")),
        }
    }
}

const COMPOUND_ASSIGN_OPS: &[(&str, ArithBinaryOp)] = &[
    ("+=", ArithBinaryOp::Add),
    ("-=", ArithBinaryOp::Sub),
    ("*=", ArithBinaryOp::Mul),
    ("/=", ArithBinaryOp::Div),
    ("%=", ArithBinaryOp::Rem),
    ("<<=", ArithBinaryOp::Shl),
    (">>=", ArithBinaryOp::Shr),
    ("&=", ArithBinaryOp::BitAnd),
    ("|=", ArithBinaryOp::BitOr),
    ("^=", ArithBinaryOp::BitXor),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal() {
        assert_eq!(parse_arith("42").unwrap(), ArithExpr::Literal(42));
    }

    #[test]
    fn addition_and_precedence() {
        let e = parse_arith("1 + 2 * 3").unwrap();
        assert_eq!(
            e,
            ArithExpr::Binary(
                ArithBinaryOp::Add,
                Box::new(ArithExpr::Literal(1)),
                Box::new(ArithExpr::Binary(
                    ArithBinaryOp::Mul,
                    Box::new(ArithExpr::Literal(2)),
                    Box::new(ArithExpr::Literal(3))
                ))
            )
        );
    }

    #[test]
    fn grouping() {
        let e = parse_arith("(1 + 2) * 3").unwrap();
        assert_eq!(
            e,
            ArithExpr::Binary(
                ArithBinaryOp::Mul,
                Box::new(ArithExpr::Group(Box::new(ArithExpr::Binary(
                    ArithBinaryOp::Add,
                    Box::new(ArithExpr::Literal(1)),
                    Box::new(ArithExpr::Literal(2))
                )))),
                Box::new(ArithExpr::Literal(3))
            )
        );
    }

    #[test]
    fn variable_and_dollar_variable() {
        assert_eq!(parse_arith("x").unwrap(), ArithExpr::Var("x"));
        assert_eq!(parse_arith("$x").unwrap(), ArithExpr::Var("x"));
    }

    #[test]
    fn ternary() {
        let e = parse_arith("x > 0 ? 1 : -1").unwrap();
        assert!(matches!(e, ArithExpr::Ternary(..)));
    }

    #[test]
    fn post_and_pre_increment() {
        assert_eq!(parse_arith("i++").unwrap(), ArithExpr::PostIncrement("i"));
        assert_eq!(parse_arith("++i").unwrap(), ArithExpr::PreIncrement("i"));
    }

    #[test]
    fn compound_assignment() {
        let e = parse_arith("i += 1").unwrap();
        assert_eq!(
            e,
            ArithExpr::CompoundAssign(ArithBinaryOp::Add, "i", Box::new(ArithExpr::Literal(1)))
        );
    }

    #[test]
    fn power_right_associative() {
        let e = parse_arith("2 ** 3 ** 2").unwrap();
        assert_eq!(
            e,
            ArithExpr::Binary(
                ArithBinaryOp::Pow,
                Box::new(ArithExpr::Literal(2)),
                Box::new(ArithExpr::Binary(
                    ArithBinaryOp::Pow,
                    Box::new(ArithExpr::Literal(3)),
                    Box::new(ArithExpr::Literal(2))
                ))
            )
        );
    }

    #[test]
    fn shift_vs_relational() {
        let e = parse_arith("1 << 2 < 3").unwrap();
        assert_eq!(
            e,
            ArithExpr::Binary(
                ArithBinaryOp::Lt,
                Box::new(ArithExpr::Binary(
                    ArithBinaryOp::Shl,
                    Box::new(ArithExpr::Literal(1)),
                    Box::new(ArithExpr::Literal(2))
                )),
                Box::new(ArithExpr::Literal(3))
            )
        );
    }
}
