//! Decomposition of a lexer `Word` token's raw text into the fragment
//! model from spec.md §3.
//!
//! The lexer only finds a word's outer boundary (so that embedded
//! whitespace inside quotes/expansions doesn't split it early); this
//! module re-walks that same text to classify each piece, reusing
//! `lexer::scan`'s balanced-span helpers so the two passes never
//! disagree about where a construct ends.

use crate::error::ParseError;
use crate::lexer::scan;
use crate::parser::ast::{
    ArithExpr, BraceExpansion, ParamExpansion, ParamOp, Span, Word, WordFragment,
};

pub fn parse_word(text: &str, offset: usize) -> Result<Word<'_>, ParseError> {
    let fragments = parse_fragments(text, offset)?;
    Ok(Word {
        fragments,
        span: Span::new(offset, offset + text.len()),
    })
}

/// Parses a run of text into top-level fragments (used both for a whole
/// word and for the contents of a double-quoted span).
fn parse_fragments(text: &str, base_offset: usize) -> Result<Vec<WordFragment<'_>>, ParseError> {
    let mut fragments = Vec::new();
    let mut literal_start = 0usize;
    let bytes = text.as_bytes();
    let mut i = 0usize;

    macro_rules! flush_literal {
        ($end:expr) => {
            if $end > literal_start {
                fragments.push(WordFragment::Literal(&text[literal_start..$end]));
            }
        };
    }

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                flush_literal!(i);
                let end = scan::skip_single_quoted(text, i).map_err(ParseError::Lex)?;
                fragments.push(WordFragment::SingleQuoted(&text[i + 1..end - 1]));
                i = end;
                literal_start = i;
            }
            b'"' => {
                flush_literal!(i);
                let end = scan::skip_double_quoted(text, i).map_err(ParseError::Lex)?;
                let inner = &text[i + 1..end - 1];
                let inner_fragments = parse_fragments(inner, base_offset + i + 1)?;
                fragments.push(WordFragment::DoubleQuoted(inner_fragments));
                i = end;
                literal_start = i;
            }
            b'`' => {
                flush_literal!(i);
                let end = scan::skip_backtick(text, i).map_err(ParseError::Lex)?;
                let inner = unescape_backtick(&text[i + 1..end - 1]);
                let ast = super::parse(&inner).map_err(|e| {
                    ParseError::Unsupported(format!("invalid command substitution: {e}"))
                })?;
                fragments.push(WordFragment::Backtick(Box::new(ast)));
                i = end;
                literal_start = i;
            }
            b'~' if i == 0 => {
                let (end, user) = scan_tilde(text, i);
                if end > i {
                    flush_literal!(i);
                    fragments.push(WordFragment::Tilde(user));
                    i = end;
                    literal_start = i;
                } else {
                    i += 1;
                }
            }
            b'{' => {
                if let Some((end, brace)) = try_brace_expansion(text, i) {
                    flush_literal!(i);
                    fragments.push(WordFragment::BraceExpansion(brace));
                    i = end;
                    literal_start = i;
                } else {
                    i += 1;
                }
            }
            b'$' => {
                flush_literal!(i);
                let frag_end = scan::skip_dollar(text, i).map_err(ParseError::Lex)?;
                if frag_end == i + 1 {
                    // Bare '$' with nothing recognizable following: literal.
                    literal_start = i;
                    i += 1;
                    continue;
                }
                let fragment = parse_dollar(text, i, frag_end, base_offset)?;
                fragments.push(fragment);
                i = frag_end;
                literal_start = i;
            }
            b'\\' => {
                // A backslash escape: keep both bytes as literal text (the
                // emitter re-quotes based on the surrounding fragment kind
                // so raw source text is preserved verbatim here).
                i = (i + 2).min(bytes.len());
            }
            _ => i += 1,
        }
    }
    flush_literal!(bytes.len());
    Ok(fragments)
}

fn parse_dollar<'a>(
    text: &'a str,
    start: usize,
    end: usize,
    base_offset: usize,
) -> Result<WordFragment<'a>, ParseError> {
    let bytes = text.as_bytes();
    match bytes[start + 1] {
        b'(' if bytes.get(start + 2) == Some(&b'(') => {
            let inner = &text[start + 3..end - 2];
            let expr = super::arith::parse_arith(inner)?;
            Ok(WordFragment::ArithSubst(expr))
        }
        b'(' => {
            let inner = &text[start + 2..end - 1];
            let ast = super::parse(inner).map_err(|e| {
                ParseError::Unsupported(format!("invalid command substitution: {e}"))
            })?;
            Ok(WordFragment::CommandSubst(Box::new(ast)))
        }
        b'{' => {
            let inner = &text[start + 2..end - 1];
            let param = parse_param_expansion(inner, base_offset + start + 2)?;
            Ok(WordFragment::VarBraced(param))
        }
        _ => Ok(WordFragment::VarSimple(&text[start + 1..end])),
    }
}

fn scan_tilde(text: &str, start: usize) -> (usize, Option<&str>) {
    let bytes = text.as_bytes();
    let mut i = start + 1;
    while i < bytes.len()
        && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'-')
    {
        i += 1;
    }
    match bytes.get(i) {
        None | Some(b'/') => {
            let user = if i > start + 1 {
                Some(&text[start + 1..i])
            } else {
                None
            };
            (i, user)
        }
        _ => (start, None),
    }
}

/// Attempts to parse `{...}` starting at `start` as a brace expansion
/// (comma list or numeric/char range). Returns `None` if it doesn't match
/// the grammar, in which case the caller treats `{` as a literal byte.
fn try_brace_expansion(text: &str, start: usize) -> Option<(usize, BraceExpansion<'_>)> {
    let close = find_matching_brace(text, start)?;
    let inner = &text[start + 1..close];

    if let Some((from, to, step)) = parse_numeric_range(inner) {
        return Some((close + 1, BraceExpansion::NumericRange { from, to, step }));
    }
    if let Some((from, to)) = parse_char_range(inner) {
        return Some((close + 1, BraceExpansion::CharRange { from, to }));
    }
    if inner.contains(',') {
        let items: Vec<&str> = inner.split(',').collect();
        return Some((close + 1, BraceExpansion::List(items)));
    }
    None
}

fn find_matching_brace(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

fn parse_numeric_range(inner: &str) -> Option<(i64, i64, Option<i64>)> {
    let mut parts = inner.split("..");
    let from: i64 = parts.next()?.parse().ok()?;
    let to: i64 = parts.next()?.parse().ok()?;
    let step = match parts.next() {
        Some(s) => Some(s.parse().ok()?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((from, to, step))
}

fn parse_char_range(inner: &str) -> Option<(char, char)> {
    let mut parts = inner.split("..");
    let from = single_char(parts.next()?)?;
    let to = single_char(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((from, to))
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        None
    } else {
        Some(c)
    }
}

fn unescape_backtick(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('$') | Some('`') | Some('\\') => {
                    out.push(chars.next().unwrap());
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// Parses the body of a `${...}` braced expansion into a [`ParamExpansion`].
fn parse_param_expansion(inner: &str, offset: usize) -> Result<ParamExpansion<'_>, ParseError> {
    let bytes = inner.as_bytes();

    if inner.starts_with('#') && inner.len() > 1 && inner != "#" {
        // `${#name}` length, distinct from `${#}` (positional count, a
        // plain simple-parameter form we let fall to the `Plain` arm).
        let name = &inner[1..];
        if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Ok(ParamExpansion {
                name,
                op: ParamOp::Length,
            });
        }
    }

    if let Some(name) = inner.strip_prefix('!') {
        return Ok(ParamExpansion {
            name,
            op: ParamOp::Indirect,
        });
    }

    let name_len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count();
    let name = &inner[..name_len];
    let rest = &inner[name_len..];

    if rest.is_empty() {
        return Ok(ParamExpansion {
            name,
            op: ParamOp::Plain,
        });
    }

    let op = if let Some(w) = rest.strip_prefix(":-") {
        ParamOp::Default(Box::new(parse_word(w, offset)?), true)
    } else if let Some(w) = rest.strip_prefix('-') {
        ParamOp::Default(Box::new(parse_word(w, offset)?), false)
    } else if let Some(w) = rest.strip_prefix(":=") {
        ParamOp::AssignDefault(Box::new(parse_word(w, offset)?), true)
    } else if let Some(w) = rest.strip_prefix('=') {
        ParamOp::AssignDefault(Box::new(parse_word(w, offset)?), false)
    } else if let Some(w) = rest.strip_prefix(":?") {
        ParamOp::ErrorIfUnset(Box::new(parse_word(w, offset)?), true)
    } else if let Some(w) = rest.strip_prefix('?') {
        ParamOp::ErrorIfUnset(Box::new(parse_word(w, offset)?), false)
    } else if let Some(w) = rest.strip_prefix(":+") {
        ParamOp::AlternateValue(Box::new(parse_word(w, offset)?), true)
    } else if let Some(w) = rest.strip_prefix('+') {
        ParamOp::AlternateValue(Box::new(parse_word(w, offset)?), false)
    } else if let Some(p) = rest.strip_prefix("##") {
        ParamOp::StripPrefixLong(p)
    } else if let Some(p) = rest.strip_prefix('#') {
        ParamOp::StripPrefixShort(p)
    } else if let Some(p) = rest.strip_prefix("%%") {
        ParamOp::StripSuffixLong(p)
    } else if let Some(p) = rest.strip_prefix('%') {
        ParamOp::StripSuffixShort(p)
    } else if let Some(p) = rest.strip_prefix("//") {
        let (pat, rep) = split_once_unescaped(p, '/');
        ParamOp::SubstituteAll(pat, rep)
    } else if let Some(p) = rest.strip_prefix("/#") {
        let (pat, rep) = split_once_unescaped(p, '/');
        ParamOp::SubstitutePrefix(pat, rep)
    } else if let Some(p) = rest.strip_prefix("/%") {
        let (pat, rep) = split_once_unescaped(p, '/');
        ParamOp::SubstituteSuffix(pat, rep)
    } else if let Some(p) = rest.strip_prefix('/') {
        let (pat, rep) = split_once_unescaped(p, '/');
        ParamOp::SubstituteFirst(pat, rep)
    } else if rest == "^^" {
        ParamOp::UpperAll
    } else if rest == "^" {
        ParamOp::UpperFirst
    } else if rest == ",," {
        ParamOp::LowerAll
    } else if rest == "," {
        ParamOp::LowerFirst
    } else if rest == "@Q" {
        ParamOp::QuotedExpansion
    } else if let Some(p) = rest.strip_prefix(':') {
        let (off, len) = parse_substring_spec(p)?;
        ParamOp::Substring(off, len)
    } else {
        return Err(ParseError::Unsupported(format!(
            "unrecognized parameter expansion operator: {rest:?}"
        )));
    };

    Ok(ParamExpansion { name, op })
}

fn split_once_unescaped(s: &str, sep: char) -> (&str, &str) {
    match s.find(sep) {
        Some(idx) => (&s[..idx], &s[idx + sep.len_utf8()..]),
        None => (s, ""),
    }
}

fn parse_substring_spec(s: &str) -> Result<(ArithExpr<'_>, Option<ArithExpr<'_>>), ParseError> {
    let (off_text, len_text) = split_once_unescaped(s, ':');
    let offset = super::arith::parse_arith(off_text)?;
    let length = if len_text.is_empty() {
        None
    } else {
        Some(super::arith::parse_arith(len_text)?)
    };
    Ok((offset, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_word() {
        let w = parse_word("hello", 0).unwrap();
        assert_eq!(w.fragments, vec![WordFragment::Literal("hello")]);
    }

    #[test]
    fn single_quoted_fragment() {
        let w = parse_word("'a b'", 0).unwrap();
        assert_eq!(w.fragments, vec![WordFragment::SingleQuoted("a b")]);
    }

    #[test]
    fn mixed_fragments() {
        let w = parse_word(r#"foo"bar $x"baz"#, 0).unwrap();
        assert_eq!(w.fragments.len(), 3);
        assert_eq!(w.fragments[0], WordFragment::Literal("foo"));
        match &w.fragments[1] {
            WordFragment::DoubleQuoted(inner) => {
                assert_eq!(inner[0], WordFragment::Literal("bar "));
                assert_eq!(inner[1], WordFragment::VarSimple("x"));
            }
            other => panic!("expected DoubleQuoted, got {other:?}"),
        }
        assert_eq!(w.fragments[2], WordFragment::Literal("baz"));
    }

    #[test]
    fn simple_var() {
        let w = parse_word("$HOME", 0).unwrap();
        assert_eq!(w.fragments, vec![WordFragment::VarSimple("HOME")]);
    }

    #[test]
    fn braced_default_param() {
        let w = parse_word("${VAR:-default}", 0).unwrap();
        match &w.fragments[0] {
            WordFragment::VarBraced(p) => {
                assert_eq!(p.name, "VAR");
                match &p.op {
                    ParamOp::Default(word, true) => {
                        assert_eq!(word.fragments, vec![WordFragment::Literal("default")]);
                    }
                    other => panic!("expected Default, got {other:?}"),
                }
            }
            other => panic!("expected VarBraced, got {other:?}"),
        }
    }

    #[test]
    fn length_param() {
        let w = parse_word("${#VAR}", 0).unwrap();
        match &w.fragments[0] {
            WordFragment::VarBraced(p) => assert_eq!(p.op, ParamOp::Length),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn substitution_all() {
        let w = parse_word("${VAR//a/b}", 0).unwrap();
        match &w.fragments[0] {
            WordFragment::VarBraced(p) => {
                assert_eq!(p.op, ParamOp::SubstituteAll("a", "b"));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn tilde_expansion() {
        let w = parse_word("~/bin", 0).unwrap();
        assert_eq!(w.fragments[0], WordFragment::Tilde(None));
        assert_eq!(w.fragments[1], WordFragment::Literal("/bin"));
    }

    #[test]
    fn tilde_user_expansion() {
        let w = parse_word("~alice/bin", 0).unwrap();
        assert_eq!(w.fragments[0], WordFragment::Tilde(Some("alice")));
    }

    #[test]
    fn numeric_brace_range() {
        let w = parse_word("{1..5}", 0).unwrap();
        assert_eq!(
            w.fragments[0],
            WordFragment::BraceExpansion(BraceExpansion::NumericRange {
                from: 1,
                to: 5,
                step: None
            })
        );
    }

    #[test]
    fn char_brace_range() {
        let w = parse_word("{a..z}", 0).unwrap();
        assert_eq!(
            w.fragments[0],
            WordFragment::BraceExpansion(BraceExpansion::CharRange { from: 'a', to: 'z' })
        );
    }

    #[test]
    fn brace_list() {
        let w = parse_word("{foo,bar,baz}", 0).unwrap();
        assert_eq!(
            w.fragments[0],
            WordFragment::BraceExpansion(BraceExpansion::List(vec!["foo", "bar", "baz"]))
        );
    }

    #[test]
    fn command_substitution_dollar_paren() {
        let w = parse_word("$(echo hi)", 0).unwrap();
        assert!(matches!(w.fragments[0], WordFragment::CommandSubst(_)));
    }

    #[test]
    fn arithmetic_substitution() {
        let w = parse_word("$((1 + 2))", 0).unwrap();
        assert!(matches!(w.fragments[0], WordFragment::ArithSubst(_)));
    }
}
