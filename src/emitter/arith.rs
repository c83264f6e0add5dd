//! Renders `ArithExpr` trees into fish source, per spec.md §4.4's
//! arithmetic-expansion row.
//!
//! fish has no arithmetic-expansion syntax of its own; `math EXPR`
//! evaluates a string and prints the result. Three distinct rendering
//! modes fall out of that:
//!
//! - [`emit_value`] — pure expression text to embed inside `math "..."`,
//!   used for `$(( ))` substitutions and parameter-expansion offsets.
//!   Returns `Unsupported` for anything with a side effect (assignment,
//!   increment) or that `math` can't evaluate (logical/bitwise ops),
//!   since those only make sense as statements.
//! - [`emit_condition`] — a fish command whose exit status reflects the
//!   expression's truth value, used for `(( expr ))` in `if`/`while` and
//!   `for ((;cond;))`. Logical `&&`/`||`/`!` are lowered to `and`/`or`/
//!   `not` job chaining here instead of being passed to `math`.
//! - [`emit_statement`] — full `(( expr ))` command statement, handling
//!   assignment and increment/decrement forms by lowering to `set`.

use crate::error::EmitError;
use crate::parser::ast::{ArithBinaryOp, ArithExpr, ArithUnaryOp};

/// Pure arithmetic text suitable for `math "..."` (no assignment, no
/// logical/bitwise operators — `math` only understands numeric algebra).
pub fn emit_value(expr: &ArithExpr<'_>) -> Result<String, EmitError> {
    match expr {
        ArithExpr::Literal(n) => Ok(n.to_string()),
        ArithExpr::Var(name) => Ok(format!("${name}")),
        ArithExpr::Group(inner) => Ok(format!("({})", emit_value(inner)?)),
        ArithExpr::Unary(op, inner) => {
            let inner_text = emit_value(inner)?;
            match op {
                ArithUnaryOp::Neg => Ok(format!("-{inner_text}")),
                ArithUnaryOp::Plus => Ok(inner_text),
                ArithUnaryOp::Not | ArithUnaryOp::BitNot => Err(unsupported("logical/bitwise NOT in arithmetic value position")),
            }
        }
        ArithExpr::Binary(op, lhs, rhs) => {
            let symbol = match op {
                ArithBinaryOp::Add => "+",
                ArithBinaryOp::Sub => "-",
                ArithBinaryOp::Mul => "*",
                ArithBinaryOp::Div => "/",
                ArithBinaryOp::Rem => "%",
                ArithBinaryOp::Pow => "^",
                ArithBinaryOp::Lt => "<",
                ArithBinaryOp::Le => "<=",
                ArithBinaryOp::Gt => ">",
                ArithBinaryOp::Ge => ">=",
                ArithBinaryOp::Eq => "==",
                ArithBinaryOp::Ne => "!=",
                ArithBinaryOp::Shl
                | ArithBinaryOp::Shr
                | ArithBinaryOp::BitAnd
                | ArithBinaryOp::BitOr
                | ArithBinaryOp::BitXor => {
                    return Err(unsupported("bitwise operator in arithmetic value position"));
                }
                ArithBinaryOp::And | ArithBinaryOp::Or => {
                    return Err(unsupported("logical operator in arithmetic value position"));
                }
            };
            Ok(format!("{} {symbol} {}", emit_value(lhs)?, emit_value(rhs)?))
        }
        ArithExpr::Ternary(..) => Err(unsupported("ternary operator in arithmetic value position")),
        ArithExpr::Assign(..)
        | ArithExpr::CompoundAssign(..)
        | ArithExpr::PreIncrement(_)
        | ArithExpr::PreDecrement(_)
        | ArithExpr::PostIncrement(_)
        | ArithExpr::PostDecrement(_) => {
            Err(unsupported("assignment/increment inside an arithmetic expansion value"))
        }
    }
}

/// `(math "TEXT")` — a pure arithmetic value wrapped for embedding as a
/// fish word fragment.
pub fn emit_value_substitution(expr: &ArithExpr<'_>) -> Result<String, EmitError> {
    Ok(format!("(math \"{}\")", emit_value(expr)?))
}

/// A fish command whose success/failure mirrors `expr`'s truth value
/// (bash: nonzero arithmetic result is true).
pub fn emit_condition(expr: &ArithExpr<'_>) -> Result<String, EmitError> {
    match expr {
        ArithExpr::Binary(ArithBinaryOp::And, lhs, rhs) => {
            Ok(format!("{}; and {}", emit_condition(lhs)?, emit_condition(rhs)?))
        }
        ArithExpr::Binary(ArithBinaryOp::Or, lhs, rhs) => {
            Ok(format!("{}; or {}", emit_condition(lhs)?, emit_condition(rhs)?))
        }
        ArithExpr::Unary(ArithUnaryOp::Not, inner) => Ok(format!("not {}", emit_condition(inner)?)),
        ArithExpr::Group(inner) => emit_condition(inner),
        _ => Ok(format!("test (math \"{}\") -ne 0", emit_value(expr)?)),
    }
}

/// Full `(( expr ))` statement: lowers assignment/increment forms to
/// `set`, everything else to the condition-test form (exit status only,
/// matching bash's `(( expr ))` command semantics).
pub fn emit_statement(expr: &ArithExpr<'_>) -> Result<String, EmitError> {
    match expr {
        ArithExpr::Assign(name, rhs) => Ok(format!("set -g {name} (math \"{}\")", emit_value(rhs)?)),
        ArithExpr::CompoundAssign(op, name, rhs) => {
            let symbol = binary_symbol(*op)?;
            Ok(format!(
                "set -g {name} (math \"${name} {symbol} {}\")",
                emit_value(rhs)?
            ))
        }
        ArithExpr::PreIncrement(name) | ArithExpr::PostIncrement(name) => {
            Ok(format!("set -g {name} (math \"${name} + 1\")"))
        }
        ArithExpr::PreDecrement(name) | ArithExpr::PostDecrement(name) => {
            Ok(format!("set -g {name} (math \"${name} - 1\")"))
        }
        _ => emit_condition(expr),
    }
}

fn binary_symbol(op: ArithBinaryOp) -> Result<&'static str, EmitError> {
    Ok(match op {
        ArithBinaryOp::Add => "+",
        ArithBinaryOp::Sub => "-",
        ArithBinaryOp::Mul => "*",
        ArithBinaryOp::Div => "/",
        ArithBinaryOp::Rem => "%",
        ArithBinaryOp::Pow => "^",
        _ => return Err(unsupported("compound-assignment operator not supported by math")),
    })
}

fn unsupported(msg: &str) -> EmitError {
    EmitError::Unsupported(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_var() {
        assert_eq!(emit_value(&ArithExpr::Literal(5)).unwrap(), "5");
        assert_eq!(emit_value(&ArithExpr::Var("x")).unwrap(), "$x");
    }

    #[test]
    fn binary_add() {
        let e = ArithExpr::Binary(
            ArithBinaryOp::Add,
            Box::new(ArithExpr::Var("x")),
            Box::new(ArithExpr::Literal(1)),
        );
        assert_eq!(emit_value(&e).unwrap(), "$x + 1");
    }

    #[test]
    fn condition_wraps_with_test_math() {
        let e = ArithExpr::Var("x");
        assert_eq!(emit_condition(&e).unwrap(), "test (math \"$x\") -ne 0");
    }

    #[test]
    fn and_condition_uses_job_chaining() {
        let e = ArithExpr::Binary(
            ArithBinaryOp::And,
            Box::new(ArithExpr::Var("a")),
            Box::new(ArithExpr::Var("b")),
        );
        assert_eq!(
            emit_condition(&e).unwrap(),
            "test (math \"$a\") -ne 0; and test (math \"$b\") -ne 0"
        );
    }

    #[test]
    fn increment_lowers_to_set() {
        assert_eq!(
            emit_statement(&ArithExpr::PostIncrement("i")).unwrap(),
            "set -g i (math \"$i + 1\")"
        );
    }

    #[test]
    fn bitwise_op_is_unsupported() {
        let e = ArithExpr::Binary(
            ArithBinaryOp::BitAnd,
            Box::new(ArithExpr::Var("a")),
            Box::new(ArithExpr::Literal(1)),
        );
        assert!(emit_value(&e).is_err());
    }
}
