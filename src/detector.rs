//! Bash detection: a sub-millisecond, allocation-free scanner deciding
//! whether a line of input contains bash-specific syntax.
//!
//! Grounded on the teacher's habit (`bash_parser::lexer`) of a manual
//! byte-cursor scanner rather than a regex engine — here that choice is
//! load-bearing, not stylistic: spec.md §4.1 requires O(n), no regex
//! engine, no allocation, because this runs on every keypress in the host
//! shell via an external invocation.

/// Keywords that signal bash syntax when they appear at a command position
/// (start of input, or immediately after `;`, `&`, `|`, or a newline).
const COMMAND_POSITION_KEYWORDS: &[&str] =
    &["export ", "unset ", "declare ", "local ", "readonly "];

/// Operator sequences that are bash-specific regardless of position.
const ANYWHERE_OPERATORS: &[&str] = &["$(", "$((", "<<<", "[[", "]]", "<(", ">(", "${"];

/// `; keyword` or newline-separated keyword sequences that only make sense
/// inside bash compound statements.
const STATEMENT_SEPARATOR_KEYWORDS: &[&str] = &["then", "do", "fi", "done", "esac"];

/// `looks_like_bash(input) -> bool`, per spec.md §4.1.
///
/// False positives are suppressed for occurrences entirely inside a
/// single-quoted span or immediately preceded by a backslash escape. False
/// negatives are acceptable: the caller still attempts a full parse
/// regardless of this function's answer.
pub fn looks_like_bash(input: &str) -> bool {
    let _span = tracing::trace_span!("detect", len = input.len()).entered();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut in_single_quote = false;
    let mut at_command_position = true;
    let mut i = 0usize;

    while i < len {
        let b = bytes[i];

        if in_single_quote {
            if b == b'\'' {
                in_single_quote = false;
            }
            i += 1;
            continue;
        }

        if b == b'\\' {
            // Skip the escaped character entirely; it can't start a match.
            i += 2;
            continue;
        }

        if b == b'\'' {
            in_single_quote = true;
            i += 1;
            continue;
        }

        if b == b'`' {
            return true;
        }

        if at_command_position {
            for kw in COMMAND_POSITION_KEYWORDS {
                if bytes[i..].starts_with(kw.as_bytes()) {
                    return true;
                }
            }
        }

        for op in ANYWHERE_OPERATORS {
            if bytes[i..].starts_with(op.as_bytes()) {
                return true;
            }
        }

        if b == b';' || b == b'\n' {
            if semicolon_or_newline_keyword_follows(&input[i + 1..]) {
                return true;
            }
            at_command_position = true;
            i += 1;
            continue;
        }

        if matches!(b, b'&' | b'|') {
            at_command_position = true;
            i += 1;
            continue;
        }

        if b == b' ' || b == b'\t' {
            i += 1;
            continue;
        }

        // For C-style for loops: `for ((`.
        if bytes[i..].starts_with(b"for ((") {
            return true;
        }

        at_command_position = false;
        i += 1;
    }

    false
}

fn semicolon_or_newline_keyword_follows(rest: &str) -> bool {
    let trimmed = rest.trim_start_matches(' ');
    STATEMENT_SEPARATOR_KEYWORDS
        .iter()
        .any(|kw| word_matches_at_start(trimmed, kw))
}

fn word_matches_at_start(s: &str, kw: &str) -> bool {
    s.strip_prefix(kw)
        .is_some_and(|rest| rest.is_empty() || !rest.as_bytes()[0].is_ascii_alphanumeric())
}
