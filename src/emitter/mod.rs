//! AST-directed code generator: `BashAst` → fish source, per spec.md §4.4.
//!
//! Split the way the parser is split (one submodule per grammar layer)
//! rather than as one large match: word/expansion rendering
//! ([`words`], [`param`]), arithmetic ([`arith`]), `[[ ]]` ([`test_expr`]),
//! glob-pattern helpers ([`glob`]), and statement/control-flow emission
//! ([`control`]), with [`quoting`] underneath all of them for fish's
//! string-escaping rules.
//!
//! Every constructor here returns [`EmitError::Unsupported`] instead of
//! guessing at an approximation whenever bash semantics can't be carried
//! over faithfully — callers (see [`crate::translate`]) treat that as a
//! signal to fall back to [`crate::passthrough::bash_exec`], never as a
//! hard failure.

pub mod arith;
pub mod control;
pub mod glob;
pub mod param;
pub mod quoting;
pub mod test_expr;
pub mod words;

use crate::error::EmitError;
use crate::parser::ast::BashAst;

/// Translates a full parsed bash program into fish source.
pub fn emit(ast: &BashAst<'_>) -> Result<String, EmitError> {
    control::emit_stmt(ast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn translate(input: &str) -> String {
        let ast = parse(input).unwrap();
        emit(&ast).unwrap()
    }

    #[test]
    fn simple_command_passes_through() {
        assert_eq!(translate("echo hello"), "echo hello");
    }

    #[test]
    fn export_becomes_set_gx() {
        assert_eq!(translate("export FOO=bar"), "set -gx FOO bar");
    }

    #[test]
    fn and_list_becomes_and_keyword() {
        assert_eq!(translate("make && make install"), "make; and make install");
    }

    #[test]
    fn if_statement_structure() {
        let out = translate("if true; then echo yes; fi");
        assert!(out.starts_with("if true; echo yes; end"));
    }

    #[test]
    fn for_loop_keeps_in_keyword() {
        assert_eq!(translate("for x in a b c; do echo $x; done"), "for x in a b c; echo $x; end");
    }

    #[test]
    fn double_bracket_file_test() {
        assert_eq!(translate("[[ -f /etc/passwd ]]"), "test -f /etc/passwd");
    }

    #[test]
    fn arithmetic_substitution() {
        assert_eq!(translate("echo $((1 + 2))"), "echo (math \"1 + 2\")");
    }

    #[test]
    fn process_substitution_is_unsupported() {
        let ast = parse("diff <(sort a) <(sort b)").unwrap();
        assert!(emit(&ast).is_err());
    }
}
