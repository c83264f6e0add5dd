//! Bash glob-pattern helpers used by the emitter: validating a pattern
//! is well-formed (via the `glob` crate, the teacher's pack-wide choice
//! for filesystem-glob matching) and converting a pattern into a regular
//! expression for the `${v#pat}`-family parameter expansions, which fish
//! has no native glob-stripping builtin for.

use crate::error::EmitError;

/// Validates that `pattern` is a well-formed glob, the way a `[[ x == pat ]]`
/// or `case` arm pattern would be interpreted by bash. We don't use the
/// match result itself (fish's own `string match --glob` / `case` do the
/// actual runtime matching) — this is a translate-time sanity check so a
/// malformed pattern fails fast as `Unsupported` rather than producing a
/// fish script that errors at runtime.
pub fn validate_glob(pattern: &str) -> Result<(), EmitError> {
    glob::Pattern::new(pattern)
        .map(|_| ())
        .map_err(|e| EmitError::Unsupported(format!("invalid glob pattern {pattern:?}: {e}")))
}

/// Converts a bash glob pattern into a regular expression suitable for
/// fish's `string replace --regex`. `greedy` selects whether `*` maps to
/// a greedy (`.*`, matching bash's `##`/`%%` "longest match") or
/// non-greedy (`.*?`, matching `#`/`%` "shortest match") repetition.
///
/// Validated by compiling the result with the `regex` crate before
/// returning it, so a translation bug surfaces as `Unsupported` instead
/// of a fish script carrying a regex fish's engine then rejects.
pub fn glob_to_regex(pattern: &str, greedy: bool) -> Result<String, EmitError> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(if greedy { ".*" } else { ".*?" }),
            '?' => out.push('.'),
            '[' => {
                out.push('[');
                if matches!(chars.peek(), Some('!')) {
                    chars.next();
                    out.push('^');
                }
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == ']' {
                        break;
                    }
                }
            }
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex::Regex::new(&out)
        .map_err(|e| EmitError::Unsupported(format!("pattern {pattern:?} produced invalid regex: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_becomes_dot_star() {
        assert_eq!(glob_to_regex("*", true).unwrap(), ".*");
        assert_eq!(glob_to_regex("*", false).unwrap(), ".*?");
    }

    #[test]
    fn literal_chars_are_escaped() {
        assert_eq!(glob_to_regex("a.b", true).unwrap(), "a\\.b");
    }

    #[test]
    fn bracket_class_passthrough() {
        assert_eq!(glob_to_regex("[abc]", true).unwrap(), "[abc]");
        assert_eq!(glob_to_regex("[!abc]", true).unwrap(), "[^abc]");
    }

    #[test]
    fn validate_rejects_unbalanced_brackets() {
        assert!(validate_glob("[abc").is_err());
    }
}
