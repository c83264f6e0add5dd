//! `[[ ... ]]` emission into fish `test`/`string match` boolean chains,
//! per spec.md §4.4. Fish's `test` builtin is POSIX-shaped enough that
//! most unary file tests and numeric comparisons carry over unchanged;
//! string equality/ordering and regex matching lean on `string match`
//! and quoted comparison operators since `<`/`>` would otherwise be
//! parsed as redirections.

use crate::emitter::{arith, words};
use crate::error::EmitError;
use crate::parser::ast::{TestExpr, TestUnaryOp};

pub fn emit_test_expr(expr: &TestExpr<'_>) -> Result<String, EmitError> {
    match expr {
        TestExpr::UnaryFile(op, word) => {
            let flag = unary_flag(*op);
            Ok(format!("test {flag} {}", words::emit_word(word)?))
        }
        TestExpr::StringEq(l, r) => Ok(format!(
            "test {} = {}",
            words::emit_word(l)?,
            words::emit_word(r)?
        )),
        TestExpr::StringNe(l, r) => Ok(format!(
            "test {} != {}",
            words::emit_word(l)?,
            words::emit_word(r)?
        )),
        TestExpr::StringLt(l, r) => Ok(format!(
            "test {} '<' {}",
            words::emit_word(l)?,
            words::emit_word(r)?
        )),
        TestExpr::StringGt(l, r) => Ok(format!(
            "test {} '>' {}",
            words::emit_word(l)?,
            words::emit_word(r)?
        )),
        TestExpr::Regex(l, r) => Ok(format!(
            "string match --quiet --regex -- {} {}",
            words::emit_word(r)?,
            words::emit_word(l)?
        )),
        TestExpr::NumEq(l, r) => numeric(l, r, "eq"),
        TestExpr::NumNe(l, r) => numeric(l, r, "ne"),
        TestExpr::NumLt(l, r) => numeric(l, r, "lt"),
        TestExpr::NumLe(l, r) => numeric(l, r, "le"),
        TestExpr::NumGt(l, r) => numeric(l, r, "gt"),
        TestExpr::NumGe(l, r) => numeric(l, r, "ge"),
        TestExpr::And(l, r) => Ok(format!("{}; and {}", emit_test_expr(l)?, emit_test_expr(r)?)),
        TestExpr::Or(l, r) => Ok(format!("{}; or {}", emit_test_expr(l)?, emit_test_expr(r)?)),
        TestExpr::Not(inner) => Ok(format!("not {}", emit_test_expr(inner)?)),
        TestExpr::Group(inner) => Ok(format!("begin; {}; end", emit_test_expr(inner)?)),
        TestExpr::Truthy(word) => Ok(format!("test -n {}", words::emit_word(word)?)),
    }
}

fn numeric(
    lhs: &crate::parser::ast::ArithExpr<'_>,
    rhs: &crate::parser::ast::ArithExpr<'_>,
    flag: &str,
) -> Result<String, EmitError> {
    Ok(format!(
        "test {} -{flag} {}",
        arith::emit_value_substitution(lhs)?,
        arith::emit_value_substitution(rhs)?
    ))
}

fn unary_flag(op: TestUnaryOp) -> &'static str {
    match op {
        TestUnaryOp::IsFile => "-f",
        TestUnaryOp::IsDir => "-d",
        TestUnaryOp::Exists => "-e",
        TestUnaryOp::IsReadable => "-r",
        TestUnaryOp::IsWritable => "-w",
        TestUnaryOp::IsExecutable => "-x",
        TestUnaryOp::IsNonEmptyFile => "-s",
        TestUnaryOp::IsNonEmptyString => "-n",
        TestUnaryOp::IsEmptyString => "-z",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{ArithExpr, Span, WordFragment};

    fn lit(text: &'static str) -> crate::parser::ast::Word<'static> {
        crate::parser::ast::Word {
            fragments: vec![WordFragment::Literal(text)],
            span: Span::new(0, text.len()),
        }
    }

    #[test]
    fn file_test_renders_flag() {
        let e = TestExpr::UnaryFile(TestUnaryOp::IsFile, lit("/etc/passwd"));
        assert_eq!(emit_test_expr(&e).unwrap(), "test -f /etc/passwd");
    }

    #[test]
    fn string_lt_quotes_operator() {
        let e = TestExpr::StringLt(lit("a"), lit("b"));
        assert_eq!(emit_test_expr(&e).unwrap(), "test a '<' b");
    }

    #[test]
    fn numeric_eq_uses_math() {
        let e = TestExpr::NumEq(ArithExpr::Literal(1), ArithExpr::Literal(2));
        assert_eq!(emit_test_expr(&e).unwrap(), "test (math \"1\") -eq (math \"2\")");
    }

    #[test]
    fn and_chains_with_semicolon_and() {
        let e = TestExpr::And(
            Box::new(TestExpr::Truthy(lit("a"))),
            Box::new(TestExpr::Truthy(lit("b"))),
        );
        assert_eq!(emit_test_expr(&e).unwrap(), "test -n a; and test -n b");
    }
}
