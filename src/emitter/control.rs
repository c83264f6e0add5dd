//! Statement-level emission: every `BashAst` variant becomes fish source
//! text here, per spec.md §4.4. This is the module most of the
//! translation table's "keyword" rows live in (`export`, `unset`,
//! `for`/`if`/`case`/function defs, scoped assignment, redirections);
//! word- and expression-level concerns are delegated to the sibling
//! `words`/`arith`/`test_expr` modules.

use std::env;

use crate::emitter::{arith, quoting, test_expr, words};
use crate::error::EmitError;
use crate::parser::ast::{
    Assignment, BashAst, CaseArm, CaseTerminator, Redirect, RedirectKind, Word, WordFragment,
};

/// Emits a full `BashAst` node as fish source. Every statement-level
/// node collapses to a single line (`;`-joined where it contains more
/// than one command), matching the "sequence of host-shell statements"
/// framing in spec.md §4.4.
pub fn emit_stmt(ast: &BashAst<'_>) -> Result<String, EmitError> {
    match ast {
        BashAst::Simple { assignments, words, redirects } => emit_simple(assignments, words, redirects),
        BashAst::Pipeline { negated, stages } => emit_pipeline(*negated, stages),
        BashAst::ListAnd(l, r) => Ok(format!("{}; and {}", emit_stmt(l)?, emit_stmt(r)?)),
        BashAst::ListOr(l, r) => Ok(format!("{}; or {}", emit_stmt(l)?, emit_stmt(r)?)),
        BashAst::Sequence(items) => {
            let parts: Result<Vec<String>, EmitError> = items.iter().map(emit_stmt).collect();
            Ok(parts?.join("; "))
        }
        BashAst::Background(inner) => Ok(format!("{} &", emit_stmt(inner)?)),
        BashAst::If { branches, else_branch } => emit_if(branches, else_branch.as_deref()),
        BashAst::For { name, words: items, body } => emit_for(name, items, body),
        BashAst::ForArith { init, cond, update, body } => emit_for_arith(init, cond, update, body),
        BashAst::While { cond, body, until } => emit_while(cond, body, *until),
        BashAst::Case { scrutinee, arms } => emit_case(scrutinee, arms),
        BashAst::FunctionDef { name, body } => Ok(format!("function {name}; {}; end", emit_stmt(body)?)),
        BashAst::Subshell(inner) => {
            let body = emit_stmt(inner)?;
            Ok(format!("fish -c {}", quoting::single_quote(&body)))
        }
        BashAst::Group(inner) => Ok(format!("begin; {}; end", emit_stmt(inner)?)),
        BashAst::DoubleBracket(expr) => test_expr::emit_test_expr(expr),
        BashAst::Arithmetic(expr) => arith::emit_statement(expr),
        BashAst::AssignOnly(assignments) => emit_assign_only(assignments),
        BashAst::Empty => Ok(String::new()),
    }
}

fn emit_pipeline(negated: bool, stages: &[BashAst<'_>]) -> Result<String, EmitError> {
    let parts: Result<Vec<String>, EmitError> = stages.iter().map(emit_stmt).collect();
    let joined = parts?.join(" | ");
    Ok(if negated { format!("not {joined}") } else { joined })
}

fn emit_if(branches: &[(BashAst<'_>, BashAst<'_>)], else_branch: Option<&BashAst<'_>>) -> Result<String, EmitError> {
    let mut out = String::new();
    for (i, (cond, body)) in branches.iter().enumerate() {
        if i == 0 {
            out.push_str("if ");
        } else {
            out.push_str("; else if ");
        }
        out.push_str(&emit_condition(cond)?);
        out.push_str("; ");
        out.push_str(&emit_stmt(body)?);
    }
    if let Some(else_body) = else_branch {
        out.push_str("; else; ");
        out.push_str(&emit_stmt(else_body)?);
    }
    out.push_str("; end");
    Ok(out)
}

fn emit_while(cond: &BashAst<'_>, body: &BashAst<'_>, until: bool) -> Result<String, EmitError> {
    let cond_text = emit_condition(cond)?;
    let cond_text = if until { format!("not {cond_text}") } else { cond_text };
    Ok(format!("while {cond_text}; {}; end", emit_stmt(body)?))
}

/// A condition slot (`if`/`while` head) is itself a `BashAst` node — bash
/// treats any command's exit status as the test, `[[ ]]` and `(( ))`
/// included, so no special-casing is needed beyond the normal dispatcher.
fn emit_condition(cond: &BashAst<'_>) -> Result<String, EmitError> {
    emit_stmt(cond)
}

fn emit_for(name: &str, items: &[Word<'_>], body: &BashAst<'_>) -> Result<String, EmitError> {
    let rendered: Result<Vec<String>, EmitError> = items.iter().map(words::emit_word).collect();
    Ok(format!("for {name} in {}; {}; end", rendered?.join(" "), emit_stmt(body)?))
}

fn emit_for_arith(
    init: &Option<crate::parser::ast::ArithExpr<'_>>,
    cond: &Option<crate::parser::ast::ArithExpr<'_>>,
    update: &Option<crate::parser::ast::ArithExpr<'_>>,
    body: &BashAst<'_>,
) -> Result<String, EmitError> {
    let mut out = String::new();
    if let Some(init) = init {
        out.push_str(&arith::emit_statement(init)?);
        out.push_str("; ");
    }
    let cond_text = match cond {
        Some(c) => arith::emit_condition(c)?,
        None => "true".to_string(),
    };
    out.push_str(&format!("while {cond_text}; {}", emit_stmt(body)?));
    if let Some(update) = update {
        out.push_str("; ");
        out.push_str(&arith::emit_statement(update)?);
    }
    out.push_str("; end");
    Ok(out)
}

fn emit_case(scrutinee: &Word<'_>, arms: &[CaseArm<'_>]) -> Result<String, EmitError> {
    if arms.iter().any(|a| a.terminator == CaseTerminator::ContinueMatching) {
        return Err(EmitError::Unsupported(
            "`;;&` requires re-testing later patterns after a match, which fish's switch can't express".to_string(),
        ));
    }
    let mut out = format!("switch {}", words::emit_word(scrutinee)?);
    for (i, arm) in arms.iter().enumerate() {
        let patterns: Result<Vec<String>, EmitError> = arm.patterns.iter().map(words::emit_pattern_word).collect();
        out.push_str(&format!("; case {}", patterns?.join(" ")));
        out.push_str("; ");
        out.push_str(&emit_stmt(&arm.body)?);
        // `;&` falls through unconditionally into the following arm's
        // body; inline that body's text here too. Since only one `switch`
        // arm ever runs per invocation, this duplicates source text rather
        // than double-executing it at runtime — safe only when the
        // duplicated body has no observable side effect if it somehow ran
        // twice along some future edit path, so side-effecting bodies are
        // refused rather than silently duplicated.
        if arm.terminator == CaseTerminator::FallThrough {
            let mut j = i + 1;
            while let Some(next) = arms.get(j) {
                if !is_assignment_only(&next.body) {
                    return Err(EmitError::Unsupported(
                        "`;&` fall-through would duplicate a side-effecting command body into the matched arm".to_string(),
                    ));
                }
                out.push_str("; ");
                out.push_str(&emit_stmt(&next.body)?);
                if next.terminator == CaseTerminator::FallThrough {
                    j += 1;
                } else {
                    break;
                }
            }
        }
    }
    out.push_str("; end");
    Ok(out)
}

/// Whether duplicating `ast` into a preceding `;&` arm is safe: true only
/// for plain-assignment statements and groupings of them, never for
/// anything that runs a command, pipeline, or redirect.
fn is_assignment_only(ast: &BashAst<'_>) -> bool {
    match ast {
        BashAst::AssignOnly(_) | BashAst::Empty => true,
        BashAst::Sequence(items) => items.iter().all(is_assignment_only),
        _ => false,
    }
}

const BUILTIN_NAMES: &[&str] = &["export", "unset", "local", "declare", "readonly", "typeset"];

fn emit_simple(assignments: &[Assignment<'_>], words_: &[Word<'_>], redirects: &[Redirect<'_>]) -> Result<String, EmitError> {
    if let Some(first) = words_.first() {
        if let [WordFragment::Literal(name)] = first.fragments.as_slice() {
            if BUILTIN_NAMES.contains(name) {
                return emit_builtin(name, &words_[1..]);
            }
        }
    }

    let mut prefix_pipe: Option<String> = None;
    let mut pieces = Vec::new();

    for assignment in assignments {
        if assignment.plus {
            return Err(EmitError::Unsupported(
                "scoped `NAME+=value command` prefix assignment has no `env`-based equivalent".to_string(),
            ));
        }
        let value = words::emit_word(&assignment.value)?;
        pieces.push(format!("{}={value}", assignment.name));
    }
    if !assignments.is_empty() {
        pieces.insert(0, "env".to_string());
    }

    for word in words_ {
        pieces.push(words::emit_word(word)?);
    }

    let mut suffix = Vec::new();
    for redirect in redirects {
        match emit_redirect(redirect)? {
            RedirectRender::Suffix(text) => suffix.push(text),
            RedirectRender::InputPipe(text) => {
                if prefix_pipe.is_some() {
                    return Err(EmitError::Unsupported(
                        "multiple here-document/here-string redirects on one command".to_string(),
                    ));
                }
                prefix_pipe = Some(text);
            }
        }
    }

    let mut line = pieces.join(" ");
    if !suffix.is_empty() {
        line.push(' ');
        line.push_str(&suffix.join(" "));
    }
    if let Some(pipe) = prefix_pipe {
        Ok(format!("{pipe} | {line}"))
    } else {
        Ok(line)
    }
}

enum RedirectRender {
    Suffix(String),
    InputPipe(String),
}

fn emit_redirect(redirect: &Redirect<'_>) -> Result<RedirectRender, EmitError> {
    let fd_prefix = redirect.fd.map(|fd| fd.to_string()).unwrap_or_default();
    Ok(match &redirect.kind {
        RedirectKind::Input(word) => RedirectRender::Suffix(format!("{fd_prefix}< {}", words::emit_word(word)?)),
        RedirectKind::Output(word) => RedirectRender::Suffix(format!("{fd_prefix}> {}", words::emit_word(word)?)),
        RedirectKind::Append(word) => RedirectRender::Suffix(format!("{fd_prefix}>> {}", words::emit_word(word)?)),
        RedirectKind::DuplicateInput(target) => {
            RedirectRender::Suffix(format!("{fd_prefix}<&{target}"))
        }
        RedirectKind::DuplicateOutput(target) => {
            RedirectRender::Suffix(format!("{fd_prefix}>&{target}"))
        }
        RedirectKind::OutputAndError(word) => {
            RedirectRender::Suffix(format!("&> {}", words::emit_word(word)?))
        }
        RedirectKind::AppendOutputAndError(word) => {
            RedirectRender::Suffix(format!(">> {} 2>&1", words::emit_word(word)?))
        }
        RedirectKind::HereString(word) => {
            RedirectRender::InputPipe(format!("printf '%s' {}", words::emit_word(word)?))
        }
        RedirectKind::HereDoc { quoted, body, .. } => {
            let rendered = if *quoted {
                quoting::single_quote(body)
            } else {
                emit_heredoc_body_interpolated(body)?
            };
            RedirectRender::InputPipe(format!("printf '%s' {rendered}"))
        }
    })
}

/// An unquoted-delimiter here-doc body expands `$var`/`$(...)`/`$(( ))`
/// the same as a double-quoted string; re-parse it as one so those
/// expansions translate instead of being emitted as inert literal text.
fn emit_heredoc_body_interpolated(body: &str) -> Result<String, EmitError> {
    let fragments = crate::parser::words::parse_word(body, 0)
        .map_err(|e| EmitError::Unsupported(format!("here-document body: {e}")))?
        .fragments;
    let mut inner = String::new();
    for frag in &fragments {
        inner.push_str(&emit_heredoc_fragment(frag)?);
    }
    Ok(format!("\"{inner}\""))
}

fn emit_heredoc_fragment(frag: &WordFragment<'_>) -> Result<String, EmitError> {
    match frag {
        WordFragment::Literal(text) => Ok(quoting::escape_double_quoted_literal(text)),
        other => words::emit_word(&Word { fragments: vec![other.clone()], span: crate::parser::ast::Span::new(0, 0) }),
    }
}

fn emit_builtin(name: &str, args: &[Word<'_>]) -> Result<String, EmitError> {
    match name {
        "export" => emit_export(args),
        "unset" => emit_unset(args),
        "local" | "declare" | "readonly" | "typeset" => emit_local_like(args),
        _ => unreachable!(),
    }
}

fn emit_export(args: &[Word<'_>]) -> Result<String, EmitError> {
    let mut stmts = Vec::new();
    for word in args {
        if let [WordFragment::Literal(flag)] = word.fragments.as_slice() {
            if flag.starts_with('-') {
                return Err(EmitError::Unsupported(format!("export flag {flag:?} is not supported")));
            }
        }
        match split_name_value(word) {
            Some((name, value_word)) => {
                let value = words::emit_word(&value_word)?;
                if is_pathlist_var(name) {
                    stmts.push(format!("set -gx {name} (string split ':' -- {value})"));
                } else {
                    stmts.push(format!("set -gx {name} {value}"));
                }
            }
            None => {
                let name = bare_name(word)?;
                stmts.push(format!("set -gx {name} ${name}"));
            }
        }
    }
    Ok(stmts.join("; "))
}

fn emit_unset(args: &[Word<'_>]) -> Result<String, EmitError> {
    let mut stmts = Vec::new();
    for word in args {
        let name = bare_name(word)?;
        stmts.push(format!("set -e {name}"));
    }
    Ok(stmts.join("; "))
}

fn emit_local_like(args: &[Word<'_>]) -> Result<String, EmitError> {
    let mut stmts = Vec::new();
    for word in args {
        if let [WordFragment::Literal(flag)] = word.fragments.as_slice() {
            if flag.starts_with('-') {
                return Err(EmitError::Unsupported(format!(
                    "declare/local/readonly flag {flag:?} has no fish equivalent (associative/indexed arrays and typed attributes aren't modeled)"
                )));
            }
        }
        match split_name_value(word) {
            Some((name, value_word)) => {
                let value = words::emit_word(&value_word)?;
                stmts.push(format!("set -l {name} {value}"));
            }
            None => {
                let name = bare_name(word)?;
                stmts.push(format!("set -l {name}"));
            }
        }
    }
    Ok(stmts.join("; "))
}

fn emit_assign_only(assignments: &[Assignment<'_>]) -> Result<String, EmitError> {
    let mut stmts = Vec::new();
    for assignment in assignments {
        let value = words::emit_word(&assignment.value)?;
        let name = assignment.name;
        if assignment.plus {
            stmts.push(format!("set -g {name} \"${name}\"{value}"));
        } else {
            stmts.push(format!("set -g {name} {value}"));
        }
    }
    Ok(stmts.join("; "))
}

/// Splits a word of the form `NAME=value...` (as produced by the lexer
/// for e.g. `export NAME=value`, where `NAME=value` arrives as a single
/// plain argument word, not a recognized `Assignment`) into the name and
/// the remaining fragments making up the value.
fn split_name_value<'a>(word: &Word<'a>) -> Option<(&'a str, Word<'a>)> {
    let first = word.fragments.first()?;
    let WordFragment::Literal(text) = first else { return None };
    let (name, rest) = text.split_once('=')?;
    if name.is_empty() || !quoting::is_valid_identifier(name) {
        return None;
    }
    let mut fragments = Vec::new();
    if !rest.is_empty() {
        fragments.push(WordFragment::Literal(rest));
    }
    fragments.extend(word.fragments[1..].iter().cloned());
    Some((
        name,
        Word {
            fragments,
            span: word.span,
        },
    ))
}

fn bare_name<'a>(word: &Word<'a>) -> Result<&'a str, EmitError> {
    match word.fragments.as_slice() {
        [WordFragment::Literal(name)] => Ok(name),
        _ => Err(EmitError::Unsupported("expected a bare variable name".to_string())),
    }
}

/// `export PATH=...`-style variables get their value split on `:` into a
/// fish list rather than kept as one colon-joined string, per spec.md's
/// resolved PATH heuristic: any name ending in `PATH` (case-sensitive),
/// extendable via a comma-separated `REEF_PATHLIST_VARS` env var read at
/// translate time.
pub(crate) fn is_pathlist_var(name: &str) -> bool {
    if name.ends_with("PATH") {
        return true;
    }
    env::var("REEF_PATHLIST_VARS")
        .map(|list| list.split(',').any(|n| n == name))
        .unwrap_or(false)
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
    fn export_plain_value() {
        let out = emit_export(&[lit("FOO=bar")]).unwrap();
        assert_eq!(out, "set -gx FOO bar");
    }

    #[test]
    fn export_path_splits_on_colon() {
        let out = emit_export(&[lit("PATH=/usr/bin:/bin")]).unwrap();
        assert!(out.contains("string split ':'"));
    }

    #[test]
    fn export_bare_name_reexports_current_value() {
        let out = emit_export(&[lit("FOO")]).unwrap();
        assert_eq!(out, "set -gx FOO $FOO");
    }

    #[test]
    fn unset_multiple_names() {
        let out = emit_unset(&[lit("A"), lit("B")]).unwrap();
        assert_eq!(out, "set -e A; set -e B");
    }

    #[test]
    fn simple_command_renders_plain() {
        let ast = BashAst::Simple {
            assignments: vec![],
            words: vec![lit("echo"), lit("hi")],
            redirects: vec![],
        };
        assert_eq!(emit_stmt(&ast).unwrap(), "echo hi");
    }

    #[test]
    fn scoped_assignment_uses_env() {
        let ast = BashAst::Simple {
            assignments: vec![Assignment { name: "FOO", plus: false, value: lit("bar") }],
            words: vec![lit("cmd")],
            redirects: vec![],
        };
        assert_eq!(emit_stmt(&ast).unwrap(), "env FOO=bar cmd");
    }

    #[test]
    fn case_fallthrough_into_command_body_is_unsupported() {
        let arms = vec![
            CaseArm {
                patterns: vec![lit("a")],
                body: Box::new(BashAst::Empty),
                terminator: CaseTerminator::FallThrough,
            },
            CaseArm {
                patterns: vec![lit("b")],
                body: Box::new(BashAst::Simple { assignments: vec![], words: vec![lit("echo")], redirects: vec![] }),
                terminator: CaseTerminator::Stop,
            },
        ];
        assert!(emit_case(&lit("x"), &arms).is_err());
    }

    #[test]
    fn case_fallthrough_into_assignment_only_body_inlines() {
        let arms = vec![
            CaseArm {
                patterns: vec![lit("a")],
                body: Box::new(BashAst::Empty),
                terminator: CaseTerminator::FallThrough,
            },
            CaseArm {
                patterns: vec![lit("b")],
                body: Box::new(BashAst::AssignOnly(vec![Assignment { name: "FOO", plus: false, value: lit("bar") }])),
                terminator: CaseTerminator::Stop,
            },
        ];
        let out = emit_case(&lit("x"), &arms).unwrap();
        assert!(out.contains("set -g FOO bar"));
    }

    #[test]
    fn case_with_continue_matching_is_unsupported() {
        let arms = vec![CaseArm {
            patterns: vec![lit("a")],
            body: Box::new(BashAst::Empty),
            terminator: CaseTerminator::ContinueMatching,
        }];
        assert!(emit_case(&lit("x"), &arms).is_err());
    }
}
