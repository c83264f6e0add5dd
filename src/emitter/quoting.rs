//! String-escaping primitives for fish source, grounded on the teacher's
//! `emitter::escape` module but targeting fish's quoting rules instead of
//! POSIX sh's (spec.md §4.4's quoting rule).

/// Wraps `s` in fish single quotes, escaping any embedded single quote by
/// closing the quote, inserting an escaped quote, and reopening — the
/// same `'...'\''...'` pattern POSIX shells use, which fish also parses
/// correctly since adjacent quoted/unquoted spans concatenate into one
/// argument.
pub fn single_quote(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Byte-level equivalent of [`single_quote`] for values that aren't
/// necessarily valid UTF-8 (e.g. an environment variable's raw value —
/// spec.md §1 requires the passthrough's state-diffing protocol to stay
/// correct for arbitrary binary content, so this must not round-trip
/// through `String`/`char` anywhere).
pub fn single_quote_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'\'');
    for &b in bytes {
        if b == b'\'' {
            out.extend_from_slice(b"'\\''");
        } else {
            out.push(b);
        }
    }
    out.push(b'\'');
    out
}

/// Escapes `s` for placement inside a fish double-quoted span: `$`, `"`,
/// and `\` are the only characters double quotes don't pass through
/// literally.
pub fn escape_double_quoted_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '$' | '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Wraps `s` in fish double quotes, escaping its contents first.
pub fn double_quote(s: &str) -> String {
    format!("\"{}\"", escape_double_quoted_literal(s))
}

/// True if `s` can appear bare in a fish command line without quoting —
/// conservative on purpose, since an unnecessary quote is harmless but a
/// missing one can change meaning.
pub fn is_safe_unquoted(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-' | '+' | ':' | '@'))
}

/// Emits a literal text fragment as bare text if safe, else single-quoted.
/// Used for fragments outside any surrounding double-quoted span.
pub fn quote_literal(s: &str) -> String {
    if is_safe_unquoted(s) {
        s.to_string()
    } else {
        single_quote(s)
    }
}

/// Escapes a *bare* (unquoted-in-source) literal fragment for fish, while
/// deliberately leaving glob metacharacters (`*`, `?`, `[`, `]`) alone —
/// an unquoted bash word like `*.txt` relies on the shell's own globbing,
/// and fish globs bare words the same way bash does, so passing them
/// through unescaped keeps that behavior. Only characters that would
/// otherwise be misread by fish (whitespace and its other syntactic
/// metacharacters) are individually backslash-escaped.
pub fn escape_bare_word_preserving_glob(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_whitespace() || matches!(c, '$' | '(' | ')' | '{' | '}' | '\'' | '"' | '\\' | ';' | '|' | '&' | '<' | '>' | '#' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// True if `name` is safe to interpolate as a fish variable reference
/// (`$name`) without braces.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_quote_no_embedded_quote() {
        assert_eq!(single_quote("hello world"), "'hello world'");
    }

    #[test]
    fn single_quote_with_embedded_quote() {
        assert_eq!(single_quote("don't"), "'don'\\''t'");
    }

    #[test]
    fn single_quote_bytes_escapes_embedded_quote() {
        assert_eq!(single_quote_bytes(b"don't"), b"'don'\\''t'".to_vec());
    }

    #[test]
    fn single_quote_bytes_passes_through_invalid_utf8() {
        let raw = [b'a', 0xFF, b'b'];
        let quoted = single_quote_bytes(&raw);
        assert_eq!(quoted, vec![b'\'', b'a', 0xFF, b'b', b'\'']);
    }

    #[test]
    fn double_quote_escapes_dollar_and_quote() {
        assert_eq!(double_quote(r#"a$b"c"#), r#""a\$b\"c""#);
    }

    #[test]
    fn safe_unquoted_literal_stays_bare() {
        assert_eq!(quote_literal("path/to/file-1.0"), "path/to/file-1.0");
    }

    #[test]
    fn unsafe_literal_gets_single_quoted() {
        assert_eq!(quote_literal("has space"), "'has space'");
    }
}
