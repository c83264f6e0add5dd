//! `${name<op>}` emission — the bulk of spec.md §4.4's translation table.
//!
//! Every operator here renders to a `(...)` fish command substitution
//! that prints the expanded value on stdout via `printf '%s'`, mirroring
//! the pattern fish scripts use in place of bash's inline string
//! operators (fish has no equivalent expansion-operator syntax of its
//! own). `AssignDefault`/`ErrorIfUnset` are refused: a bash `${v:=d}`
//! mutates the variable as a side effect of expansion, and a fish
//! command substitution runs in a forked context whose variable writes
//! don't escape back to the caller, so there is no faithful translation.

use crate::emitter::{arith, glob, quoting};
use crate::error::EmitError;
use crate::parser::ast::{ParamExpansion, ParamOp, Word};

/// Emits `${name<op>}` as fish source text (not necessarily parenthesized
/// as a single word — callers splice this directly into the surrounding
/// word text).
pub fn emit_param_expansion(
    expansion: &ParamExpansion<'_>,
    emit_word: &dyn Fn(&Word<'_>) -> Result<String, EmitError>,
) -> Result<String, EmitError> {
    let name = expansion.name;
    match &expansion.op {
        ParamOp::Plain => Ok(format!("${name}")),
        ParamOp::Length => Ok(format!("(string length -- \"${name}\")")),
        ParamOp::Default(word, with_colon) => {
            let value = emit_word(word)?;
            let guard = presence_guard(name, *with_colon);
            Ok(format!(
                "(if {guard}; printf '%s' \"${name}\"; else; printf '%s' {value}; end)"
            ))
        }
        ParamOp::AlternateValue(word, with_colon) => {
            let value = emit_word(word)?;
            let guard = presence_guard(name, *with_colon);
            Ok(format!("(if {guard}; printf '%s' {value}; else; printf '%s' ''; end)"))
        }
        ParamOp::AssignDefault(..) => Err(EmitError::Unsupported(format!(
            "${{{name}:=default}} assigns as a side effect of expansion, not expressible in fish"
        ))),
        ParamOp::ErrorIfUnset(word, with_colon) => {
            let message = emit_word(word)?;
            let guard = presence_guard(name, *with_colon);
            Ok(format!(
                "(if {guard}; printf '%s' \"${name}\"; else; echo {message} 1>&2; exit 1; end)"
            ))
        }
        ParamOp::StripPrefixShort(pat) => strip(name, pat, false, Anchor::Prefix),
        ParamOp::StripPrefixLong(pat) => strip(name, pat, true, Anchor::Prefix),
        ParamOp::StripSuffixShort(pat) => strip(name, pat, false, Anchor::Suffix),
        ParamOp::StripSuffixLong(pat) => strip(name, pat, true, Anchor::Suffix),
        ParamOp::SubstituteFirst(pat, rep) => substitute(name, pat, rep, false, Anchor::None),
        ParamOp::SubstituteAll(pat, rep) => substitute(name, pat, rep, true, Anchor::None),
        ParamOp::SubstitutePrefix(pat, rep) => substitute(name, pat, rep, false, Anchor::Prefix),
        ParamOp::SubstituteSuffix(pat, rep) => substitute(name, pat, rep, false, Anchor::Suffix),
        ParamOp::UpperAll => Ok(format!("(string upper -- \"${name}\")")),
        ParamOp::LowerAll => Ok(format!("(string lower -- \"${name}\")")),
        ParamOp::UpperFirst => Ok(format!(
            "(string upper -- (string sub -l 1 -- \"${name}\"))(string sub -s 2 -- \"${name}\")"
        )),
        ParamOp::LowerFirst => Ok(format!(
            "(string lower -- (string sub -l 1 -- \"${name}\"))(string sub -s 2 -- \"${name}\")"
        )),
        ParamOp::Substring(offset, length) => emit_substring(name, offset, length.as_ref()),
        // `${!REF}`: REF's runtime value names the variable to read. The
        // escaped `\$` becomes a literal '$' once fish expands this double
        // quoted string; the following `$REF` is expanded first by fish to
        // REF's value, so the text handed to `eval` ends up e.g. "$BAR".
        ParamOp::Indirect => Ok(format!("(eval \"printf '%s' \\$${name}\")")),
        ParamOp::QuotedExpansion => Ok(format!("(string escape -- \"${name}\")")),
        ParamOp::ArrayLength => Err(EmitError::Unsupported(format!(
            "${{#{name}[@]}} array-length expansion has no indexed-array model in this translator"
        ))),
    }
}

/// `set -q name` (unset test) or additionally a non-empty test, for the
/// `:`-prefixed family of operators (`${v:-d}` vs `${v-d}`).
fn presence_guard(name: &str, with_colon: bool) -> String {
    if with_colon {
        format!("set -q {name}; and test -n \"${name}\"")
    } else {
        format!("set -q {name}")
    }
}

#[derive(Clone, Copy)]
enum Anchor {
    None,
    Prefix,
    Suffix,
}

fn strip(name: &str, pattern: &str, greedy: bool, anchor: Anchor) -> Result<String, EmitError> {
    glob::validate_glob(pattern)?;
    let regex = glob::glob_to_regex(pattern, greedy)?;
    let anchored = match anchor {
        Anchor::Prefix => format!("^{regex}"),
        Anchor::Suffix => format!("{regex}$"),
        Anchor::None => regex,
    };
    Ok(format!(
        "(string replace --regex -- {} '' \"${name}\")",
        quoting::single_quote(&anchored)
    ))
}

fn substitute(name: &str, pattern: &str, replacement: &str, all: bool, anchor: Anchor) -> Result<String, EmitError> {
    glob::validate_glob(pattern)?;
    let regex = glob::glob_to_regex(pattern, true)?;
    let anchored = match anchor {
        Anchor::Prefix => format!("^{regex}"),
        Anchor::Suffix => format!("{regex}$"),
        Anchor::None => regex,
    };
    let flag = if all { " --all" } else { "" };
    Ok(format!(
        "(string replace --regex{flag} -- {} {} \"${name}\")",
        quoting::single_quote(&anchored),
        quoting::double_quote(replacement)
    ))
}

fn emit_substring(name: &str, offset: &crate::parser::ast::ArithExpr<'_>, length: Option<&crate::parser::ast::ArithExpr<'_>>) -> Result<String, EmitError> {
    let start = emit_substring_start(offset)?;
    let mut cmd = format!("string sub -s {start}");
    if let Some(len) = length {
        cmd.push_str(&format!(" -l {}", arith::emit_value_substitution(len)?));
    }
    Ok(format!("({cmd} -- \"${name}\")"))
}

fn emit_substring_start(offset: &crate::parser::ast::ArithExpr<'_>) -> Result<String, EmitError> {
    use crate::parser::ast::ArithExpr;
    if let ArithExpr::Literal(n) = offset {
        let fish_start = if *n >= 0 { n + 1 } else { *n };
        return Ok(fish_start.to_string());
    }
    let text = arith::emit_value(offset)?;
    Ok(format!(
        "(set -l __reef_off (math \"{text}\"); test $__reef_off -ge 0; and math \"$__reef_off + 1\"; or echo $__reef_off)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{ArithExpr, Span, WordFragment};

    fn word(text: &str) -> Word<'_> {
        Word {
            fragments: vec![WordFragment::Literal(text)],
            span: Span::new(0, text.len()),
        }
    }

    fn emit_word(w: &Word<'_>) -> Result<String, EmitError> {
        match w.fragments.as_slice() {
            [WordFragment::Literal(t)] => Ok(quoting::quote_literal(t)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn plain_expansion() {
        let e = ParamExpansion { name: "x", op: ParamOp::Plain };
        assert_eq!(emit_param_expansion(&e, &emit_word).unwrap(), "$x");
    }

    #[test]
    fn default_with_colon_checks_non_empty() {
        let e = ParamExpansion {
            name: "x",
            op: ParamOp::Default(Box::new(word("fallback")), true),
        };
        let out = emit_param_expansion(&e, &emit_word).unwrap();
        assert!(out.contains("set -q x"));
        assert!(out.contains("test -n \"$x\""));
        assert!(out.contains("fallback"));
    }

    #[test]
    fn assign_default_is_unsupported() {
        let e = ParamExpansion {
            name: "x",
            op: ParamOp::AssignDefault(Box::new(word("d")), true),
        };
        assert!(emit_param_expansion(&e, &emit_word).is_err());
    }

    #[test]
    fn strip_prefix_short_uses_nongreedy_regex() {
        let e = ParamExpansion { name: "x", op: ParamOp::StripPrefixShort("*/") };
        let out = emit_param_expansion(&e, &emit_word).unwrap();
        assert!(out.contains("string replace --regex"));
        assert!(out.contains(".*?"));
    }

    #[test]
    fn substring_literal_offset_is_one_indexed() {
        let out = emit_substring("x", &ArithExpr::Literal(2), None).unwrap();
        assert!(out.contains("string sub -s 3"));
    }
}
