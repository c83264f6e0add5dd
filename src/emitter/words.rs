//! Renders `Word`/`WordFragment` trees into fish source text.
//!
//! A bash `Word` always becomes exactly one fish argument-expression —
//! even brace/range expansions, which fan a single bash word out into
//! several argv entries, are emitted as one unquoted command
//! substitution (`(seq ...)`/`(printf ...)`) that fish itself splits on
//! newlines at runtime, the same place bash's own fan-out happens.
//! Literal fragments get two renderings depending on whether they sit in
//! a bare or double-quoted position: bare literals keep glob
//! metacharacters unescaped so fish's own globbing still fires, quoted
//! literals never glob regardless of their text.

use crate::emitter::{arith, glob, param, quoting};
use crate::error::EmitError;
use crate::parser::ast::{BraceExpansion, ProcSubstDirection, Word, WordFragment};

/// Renders a full `Word` as a single fish argument.
pub fn emit_word(word: &Word<'_>) -> Result<String, EmitError> {
    if let [WordFragment::BraceExpansion(b)] = word.fragments.as_slice() {
        return emit_standalone_brace(b);
    }
    let mut out = String::new();
    for frag in &word.fragments {
        out.push_str(&emit_fragment_bare(frag)?);
    }
    Ok(out)
}

/// Renders a fragment that sits directly in the command line (not nested
/// inside a `DoubleQuoted` span), where literal text still globs.
fn emit_fragment_bare(frag: &WordFragment<'_>) -> Result<String, EmitError> {
    match frag {
        WordFragment::Literal(text) => Ok(quoting::escape_bare_word_preserving_glob(text)),
        WordFragment::SingleQuoted(text) => Ok(quoting::single_quote(text)),
        WordFragment::DoubleQuoted(inner) => emit_double_quoted(inner),
        WordFragment::VarSimple(name) => Ok(format!("${name}")),
        WordFragment::VarBraced(expansion) => param::emit_param_expansion(expansion, &emit_word),
        WordFragment::CommandSubst(ast) => emit_command_subst_bare(ast),
        WordFragment::Backtick(ast) => emit_command_subst_bare(ast),
        WordFragment::ArithSubst(expr) => arith::emit_value_substitution(expr),
        WordFragment::ProcSubst(..) => Err(EmitError::Unsupported(
            "process substitution (<(...)/>(...)) has no fish equivalent".to_string(),
        )),
        WordFragment::BraceExpansion(_) => Err(EmitError::Unsupported(
            "brace/range expansion combined with surrounding literal text in the same word".to_string(),
        )),
        WordFragment::Tilde(user) => Ok(format!("~{}", user.unwrap_or(""))),
    }
}

/// Renders a fragment nested inside a `"..."` span: literal text no
/// longer globs (bash never globs quoted text), everything else expands
/// exactly as it would bare, since fish doesn't re-glob expansion
/// results either way.
fn emit_fragment_quoted(frag: &WordFragment<'_>) -> Result<String, EmitError> {
    match frag {
        WordFragment::Literal(text) => Ok(quoting::escape_double_quoted_literal(text)),
        WordFragment::SingleQuoted(text) => Ok(quoting::escape_double_quoted_literal(text)),
        WordFragment::DoubleQuoted(inner) => {
            // Nested double quotes don't occur from the bash grammar, but
            // stay correct if the parser ever produces one.
            let mut out = String::new();
            for f in inner {
                out.push_str(&emit_fragment_quoted(f)?);
            }
            Ok(out)
        }
        WordFragment::CommandSubst(ast) => emit_command_subst_collected(ast),
        WordFragment::Backtick(ast) => emit_command_subst_collected(ast),
        _ => emit_fragment_bare(frag),
    }
}

fn emit_double_quoted(fragments: &[WordFragment<'_>]) -> Result<String, EmitError> {
    let mut inner = String::new();
    for frag in fragments {
        inner.push_str(&emit_fragment_quoted(frag)?);
    }
    Ok(format!("\"{inner}\""))
}

/// Bare `(cmd)`: in command-argument position fish splits the captured
/// output into one list element per line, same as bash's unquoted
/// `$(cmd)` word-splitting the result on `$IFS`.
fn emit_command_subst_bare(ast: &crate::parser::ast::BashAst<'_>) -> Result<String, EmitError> {
    Ok(format!("({})", crate::emitter::control::emit_stmt(ast)?))
}

/// `$(cmd | string collect)`: the `$(...)` alias additionally joins a
/// multi-line result into a single string when used inside a `"..."`
/// span, matching bash's quoted `"$(cmd)"` — which never word-splits —
/// where bare `(cmd)` would instead space-join the captured lines.
fn emit_command_subst_collected(ast: &crate::parser::ast::BashAst<'_>) -> Result<String, EmitError> {
    Ok(format!("$({} | string collect)", crate::emitter::control::emit_stmt(ast)?))
}

fn emit_standalone_brace(brace: &BraceExpansion<'_>) -> Result<String, EmitError> {
    match brace {
        BraceExpansion::List(items) => {
            let rendered: Vec<String> = items.iter().map(|i| quoting::quote_literal(i)).collect();
            Ok(format!("(printf '%s\\n' {})", rendered.join(" ")))
        }
        BraceExpansion::NumericRange { from, to, step } => {
            let increment = step.unwrap_or(if *to >= *from { 1 } else { -1 });
            Ok(format!("(seq {from} {increment} {to})"))
        }
        BraceExpansion::CharRange { from, to } => {
            let (lo, hi) = if from <= to { (*from, *to) } else { (*to, *from) };
            let mut chars: Vec<char> = (lo as u32..=hi as u32).filter_map(char::from_u32).collect();
            if from > to {
                chars.reverse();
            }
            let rendered: Vec<String> = chars.iter().map(|c| quoting::quote_literal(&c.to_string())).collect();
            Ok(format!("(printf '%s\\n' {})", rendered.join(" ")))
        }
    }
}

/// Validates a `[[ x == pattern ]]` / `case` glob pattern word before use,
/// by rendering it to plain text (it must be a single literal fragment —
/// expansion-bearing patterns are matched literally by fish's `case`
/// too, so no special handling is needed beyond normal word rendering).
pub fn emit_pattern_word(word: &Word<'_>) -> Result<String, EmitError> {
    if let [WordFragment::Literal(text)] = word.fragments.as_slice() {
        glob::validate_glob(text)?;
    }
    emit_word(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Span;

    fn lit(text: &'static str) -> Word<'static> {
        Word {
            fragments: vec![WordFragment::Literal(text)],
            span: Span::new(0, text.len()),
        }
    }

    #[test]
    fn bare_glob_chars_pass_through() {
        assert_eq!(emit_word(&lit("*.txt")).unwrap(), "*.txt");
    }

    #[test]
    fn bare_word_with_space_is_escaped() {
        assert_eq!(emit_word(&lit("a b")).unwrap(), "a\\ b");
    }

    #[test]
    fn simple_var_renders_dollar_name() {
        let w = Word {
            fragments: vec![WordFragment::VarSimple("HOME")],
            span: Span::new(0, 5),
        };
        assert_eq!(emit_word(&w).unwrap(), "$HOME");
    }

    #[test]
    fn double_quoted_literal_does_not_glob() {
        let w = Word {
            fragments: vec![WordFragment::DoubleQuoted(vec![WordFragment::Literal("*.txt")])],
            span: Span::new(0, 7),
        };
        assert_eq!(emit_word(&w).unwrap(), "\"*.txt\"");
    }

    #[test]
    fn quoted_command_subst_uses_dollar_paren_collect() {
        let ast = crate::parser::ast::BashAst::Simple {
            assignments: vec![],
            words: vec![lit("date")],
            redirects: vec![],
        };
        let w = Word {
            fragments: vec![WordFragment::DoubleQuoted(vec![WordFragment::CommandSubst(Box::new(ast))])],
            span: Span::new(0, 10),
        };
        assert_eq!(emit_word(&w).unwrap(), "\"$(date | string collect)\"");
    }

    #[test]
    fn bare_command_subst_uses_plain_parens() {
        let ast = crate::parser::ast::BashAst::Simple {
            assignments: vec![],
            words: vec![lit("date")],
            redirects: vec![],
        };
        let w = Word {
            fragments: vec![WordFragment::CommandSubst(Box::new(ast))],
            span: Span::new(0, 10),
        };
        assert_eq!(emit_word(&w).unwrap(), "(date)");
    }

    #[test]
    fn standalone_numeric_range_uses_seq() {
        let w = Word {
            fragments: vec![WordFragment::BraceExpansion(BraceExpansion::NumericRange {
                from: 1,
                to: 3,
                step: None,
            })],
            span: Span::new(0, 6),
        };
        assert_eq!(emit_word(&w).unwrap(), "(seq 1 1 3)");
    }

    #[test]
    fn brace_mixed_with_literal_is_unsupported() {
        let w = Word {
            fragments: vec![
                WordFragment::Literal("file"),
                WordFragment::BraceExpansion(BraceExpansion::List(vec!["1", "2"])),
            ],
            span: Span::new(0, 10),
        };
        assert!(emit_word(&w).is_err());
    }
}
