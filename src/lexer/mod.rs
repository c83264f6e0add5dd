//! Zero-copy bash lexer.
//!
//! Grounded on the teacher's `bash_parser::lexer::Lexer` (a manual
//! byte/char cursor with `advance`/`peek_char`/`is_at_end` helpers) but
//! generalized per spec.md §3/§4.2: tokens borrow slices of the input
//! rather than allocating, and a state stack tracks here-doc collection
//! and command position across the whole stream rather than per-call.

pub mod scan;
pub mod token;

use std::borrow::Cow;
use std::collections::VecDeque;

pub use token::{HereDocRequest, Keyword, Operator, Token, TokenKind};

use crate::error::LexError;

/// Bytes that always end a bare word (outside of quoting/expansion
/// nesting, which is handled by the dedicated `skip_*` scanners).
const WORD_BREAK: &[u8] = b" \t\n|&;()<>";

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// True when the next word-like token should be checked against the
    /// keyword/assignment rules (spec.md §4.2: resets after `;`, `&`,
    /// `&&`, `||`, `|`, newline, `(`, `{`, `then`, `else`, `do`, and each
    /// case-arm body boundary).
    command_position: bool,
    pending_heredocs: VecDeque<HereDocRequest<'a>>,
    queued: VecDeque<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            command_position: true,
            pending_heredocs: VecDeque::new(),
            queued: VecDeque::new(),
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    /// Tokenize the whole input eagerly. Convenience wrapper for callers
    /// (e.g. the parser) that prefer a `Vec` over manual iteration; the
    /// lexer itself streams lazily via [`Lexer::next_token`].
    pub fn tokenize(input: &'a str) -> Result<Vec<Token<'a>>, LexError> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.is_eof();
            out.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(out)
    }

    pub fn next_token(&mut self) -> Result<Token<'a>, LexError> {
        if let Some(tok) = self.queued.pop_front() {
            return Ok(tok);
        }

        self.skip_inline_whitespace();

        if self.at_end() {
            return Ok(Token::new(TokenKind::Eof, self.pos, self.pos));
        }

        let start = self.pos;
        let b = self.peek().unwrap();

        if b == b'#' {
            self.skip_comment();
            return self.next_token();
        }

        if b == b'\n' {
            self.pos += 1;
            if !self.pending_heredocs.is_empty() {
                self.collect_heredocs(start)?;
                return Ok(self.queued.pop_front().unwrap());
            }
            self.command_position = true;
            return Ok(Token::new(TokenKind::Newline, start, self.pos));
        }

        if let Some(tok) = self.try_operator(start)? {
            return Ok(tok);
        }

        self.scan_word_or_keyword(start)
    }

    fn skip_inline_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    /// Recognizes multi-char operators longest-first, then single-char
    /// operators. Returns `None` if the current position isn't an
    /// operator start (so the caller falls through to word scanning).
    fn try_operator(&mut self, start: usize) -> Result<Option<Token<'a>>, LexError> {
        use Operator::*;

        macro_rules! op {
            ($len:expr, $kind:expr) => {{
                self.pos += $len;
                self.after_operator($kind);
                return Ok(Some(Token::new(TokenKind::Operator($kind), start, self.pos)));
            }};
        }

        if self.starts_with("<<<") {
            op!(3, LessLessLess);
        }
        if self.starts_with("<<-") {
            op!(3, LessLessDash);
        }
        if self.starts_with("<<") {
            op!(2, LessLess);
        }
        if self.starts_with("<(") {
            op!(2, ProcSubstIn);
        }
        if self.starts_with(">(") {
            op!(2, ProcSubstOut);
        }
        if self.starts_with("&>>") {
            op!(3, AmpGreatGreat);
        }
        if self.starts_with("&>") {
            op!(2, AmpGreat);
        }
        if self.starts_with("&&") {
            op!(2, And);
        }
        if self.starts_with("||") {
            op!(2, Or);
        }
        if self.starts_with(";;&") {
            op!(3, SemiSemiAmp);
        }
        if self.starts_with(";;") {
            op!(2, SemiSemi);
        }
        if self.starts_with(";&") {
            op!(2, SemiAmp);
        }
        if self.starts_with("[[") {
            op!(2, DoubleLBracket);
        }
        if self.starts_with("]]") {
            op!(2, DoubleRBracket);
        }
        if self.starts_with("((") {
            op!(2, DoubleLParen);
        }
        if self.starts_with("))") {
            op!(2, DoubleRParen);
        }
        if self.starts_with(">>") {
            op!(2, GreatGreat);
        }

        match self.peek() {
            Some(b'|') => op!(1, Pipe),
            Some(b'&') => op!(1, Amp),
            Some(b';') => op!(1, Semi),
            Some(b'(') => op!(1, LParen),
            Some(b')') => op!(1, RParen),
            Some(b'<') => {
                self.pos += 1;
                self.after_operator(Less);
                return Ok(Some(Token::new(TokenKind::Operator(Less), start, self.pos)));
            }
            Some(b'>') => op!(1, Great),
            Some(b'!') if self.word_is_standalone(self.pos) => op!(1, Bang),
            _ => Ok(None),
        }
    }

    /// True if the character at `at` forms a complete word by itself,
    /// i.e. is immediately followed by whitespace, an operator, or EOF.
    /// Used to distinguish reserved single-character words (`!`, `{`,
    /// `}`) from the same character used literally inside a word.
    fn word_is_standalone(&self, at: usize) -> bool {
        match self.bytes().get(at + 1) {
            None => true,
            Some(b) => WORD_BREAK.contains(b),
        }
    }

    fn after_operator(&mut self, op: Operator) {
        use Operator::*;
        match op {
            Pipe | And | Or | Semi | SemiSemi | SemiAmp | SemiSemiAmp | Amp | LParen => {
                self.command_position = true;
            }
            _ => {}
        }

        if op == Operator::LessLessLess {
            // <<< takes a here-string word, handled by the parser reading
            // the following word normally; no pending heredoc to queue.
        }
        if matches!(op, Operator::LessLess | Operator::LessLessDash) {
            self.queue_heredoc_request(op == Operator::LessLessDash);
        }
    }

    /// After lexing `<<` or `<<-`, the next word is the delimiter. We eagerly
    /// consume it here (skipping inline whitespace first) and enqueue a
    /// pending here-doc request rather than emitting it as an ordinary Word
    /// token, so the parser sees a single `HereDoc` redirect node.
    fn queue_heredoc_request(&mut self, strip_tabs: bool) {
        self.skip_inline_whitespace();
        let start = self.pos;
        let quoted = matches!(self.peek(), Some(b'\'') | Some(b'"'));
        let delimiter = self.scan_heredoc_delimiter(start);
        self.pending_heredocs.push_back(HereDocRequest {
            delimiter,
            quoted,
            strip_tabs,
        });
    }

    fn scan_heredoc_delimiter(&mut self, start: usize) -> &'a str {
        // Quoted delimiters (`<<"EOF"`, `<<'EOF'`) disable expansion in the
        // body (spec.md §4.2); we store the raw delimiter text including
        // quotes stripped for comparison, matching on the unquoted form.
        if matches!(self.peek(), Some(b'\'')) {
            if let Ok(end) = scan::skip_single_quoted(self.input, self.pos) {
                self.pos = end;
                return &self.input[start + 1..end - 1];
            }
        }
        if matches!(self.peek(), Some(b'"')) {
            if let Ok(end) = scan::skip_double_quoted(self.input, self.pos) {
                self.pos = end;
                return &self.input[start + 1..end - 1];
            }
        }
        while let Some(b) = self.peek() {
            if WORD_BREAK.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Called once a `\n` ends a line that had pending here-docs queued.
    /// Collects each body in FIFO order and queues `HereDocBody` tokens
    /// followed by the `Newline` itself.
    fn collect_heredocs(&mut self, newline_start: usize) -> Result<(), LexError> {
        while let Some(req) = self.pending_heredocs.pop_front() {
            let body_start = self.pos;
            let (body, end) = self.scan_heredoc_body(req.delimiter, req.strip_tabs)?;
            self.pos = end;
            self.queued.push_back(Token::new(
                TokenKind::HereDocBody {
                    delimiter: req.delimiter,
                    quoted: req.quoted,
                    body,
                },
                body_start,
                end,
            ));
        }
        self.command_position = true;
        self.queued
            .push_back(Token::new(TokenKind::Newline, newline_start, newline_start + 1));
        Ok(())
    }

    fn scan_heredoc_body(
        &self,
        delimiter: &str,
        strip_tabs: bool,
    ) -> Result<(Cow<'a, str>, usize), LexError> {
        let mut pos = self.pos;
        let body_start = pos;
        loop {
            let line_start = pos;
            let line_end = self.input[pos..]
                .find('\n')
                .map(|i| pos + i)
                .unwrap_or(self.input.len());
            let line = &self.input[line_start..line_end];
            let check = if strip_tabs {
                line.trim_start_matches('\t')
            } else {
                line
            };
            if check == delimiter {
                let raw = &self.input[body_start..line_start];
                let body = if strip_tabs {
                    Cow::Owned(strip_leading_tabs(raw))
                } else {
                    Cow::Borrowed(raw)
                };
                let after = if line_end < self.input.len() {
                    line_end + 1
                } else {
                    line_end
                };
                return Ok((body, after));
            }
            if line_end >= self.input.len() {
                return Err(LexError::UnterminatedHereDoc {
                    delimiter: delimiter.to_string(),
                    offset: body_start,
                });
            }
            pos = line_end + 1;
        }
    }

    fn scan_word_or_keyword(&mut self, start: usize) -> Result<Token<'a>, LexError> {
        // `{` / `}` are reserved words only when they stand alone.
        if matches!(self.peek(), Some(b'{')) && self.word_is_standalone(self.pos) {
            self.pos += 1;
            self.command_position = true;
            return Ok(Token::new(TokenKind::Operator(Operator::LBrace), start, self.pos));
        }
        if matches!(self.peek(), Some(b'}')) && self.word_is_standalone(self.pos) {
            self.pos += 1;
            return Ok(Token::new(TokenKind::Operator(Operator::RBrace), start, self.pos));
        }

        // Assignment recognition: IDENT=... or IDENT+=... at command
        // position (spec.md §4.2).
        if self.command_position {
            if let Some((name_end, plus)) = self.try_match_assignment_prefix(start) {
                let name = &self.input[start..name_end];
                self.pos = name_end + if plus { 2 } else { 1 };
                let kind = if plus {
                    TokenKind::PlusAssignment(name)
                } else {
                    TokenKind::Assignment(name)
                };
                return Ok(Token::new(kind, start, self.pos));
            }
        }

        let word_end = self.scan_word_span()?;
        let text = &self.input[start..word_end];
        self.pos = word_end;

        if self.command_position {
            if let Some(kw) = Keyword::from_word(text) {
                if matches!(kw, Keyword::Then | Keyword::Else | Keyword::Do) {
                    self.command_position = true;
                } else {
                    self.command_position = false;
                }
                return Ok(Token::new(TokenKind::Keyword(kw), start, word_end));
            }
        }
        self.command_position = false;
        Ok(Token::new(TokenKind::Word(text), start, word_end))
    }

    /// If an identifier at `start` is immediately followed by `=` (but not
    /// `==`) or `+=`, returns `(end_of_identifier, is_plus_form)`.
    fn try_match_assignment_prefix(&self, start: usize) -> Option<(usize, bool)> {
        let bytes = self.bytes();
        let mut i = start;
        if i >= bytes.len() || !(bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
            return None;
        }
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        if i == start {
            return None;
        }
        match (bytes.get(i), bytes.get(i + 1)) {
            (Some(b'+'), Some(b'=')) => Some((i, true)),
            (Some(b'='), Some(b'=')) => None,
            (Some(b'='), _) => Some((i, false)),
            _ => None,
        }
    }

    /// Scans a single word, honoring quote/expansion nesting so that
    /// embedded whitespace or operator characters don't end it early.
    fn scan_word_span(&self) -> Result<usize, LexError> {
        let bytes = self.bytes();
        let mut i = self.pos;
        let mut any = false;
        loop {
            if i >= bytes.len() {
                break;
            }
            let b = bytes[i];
            if WORD_BREAK.contains(&b) {
                break;
            }
            any = true;
            match b {
                b'\'' => i = scan::skip_single_quoted(self.input, i)?,
                b'"' => i = scan::skip_double_quoted(self.input, i)?,
                b'`' => i = scan::skip_backtick(self.input, i)?,
                b'$' => i = scan::skip_dollar(self.input, i)?,
                b'\\' => i += 2,
                _ => i += 1,
            }
        }
        if !any {
            // Shouldn't happen: caller only invokes this when `peek()` is
            // not a word-break byte.
            i += 1;
        }
        Ok(i)
    }
}

fn strip_leading_tabs(s: &str) -> String {
    s.lines()
        .map(|line| line.trim_start_matches('\t'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        Lexer::tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn simple_command() {
        let ks = kinds("echo hello");
        assert_eq!(ks, vec![TokenKind::Word("echo"), TokenKind::Word("hello"), TokenKind::Eof]);
    }

    #[test]
    fn assignment_at_command_position() {
        let ks = kinds("FOO=bar");
        assert_eq!(ks, vec![TokenKind::Assignment("FOO"), TokenKind::Word("bar"), TokenKind::Eof]);
    }

    #[test]
    fn assignment_not_recognized_mid_command() {
        let ks = kinds("echo FOO=bar");
        assert_eq!(
            ks,
            vec![TokenKind::Word("echo"), TokenKind::Word("FOO=bar"), TokenKind::Eof]
        );
    }

    #[test]
    fn plus_assignment() {
        let ks = kinds("FOO+=bar");
        assert_eq!(ks, vec![TokenKind::PlusAssignment("FOO"), TokenKind::Word("bar"), TokenKind::Eof]);
    }

    #[test]
    fn double_quoted_word_with_embedded_space_is_one_token() {
        let ks = kinds(r#"echo "hello world""#);
        assert_eq!(
            ks,
            vec![TokenKind::Word("echo"), TokenKind::Word("\"hello world\""), TokenKind::Eof]
        );
    }

    #[test]
    fn pipeline_operator() {
        let ks = kinds("a | b");
        assert_eq!(
            ks,
            vec![
                TokenKind::Word("a"),
                TokenKind::Operator(Operator::Pipe),
                TokenKind::Word("b"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn longest_match_operators() {
        assert_eq!(
            kinds("a &>> b"),
            vec![
                TokenKind::Word("a"),
                TokenKind::Operator(Operator::AmpGreatGreat),
                TokenKind::Word("b"),
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("a && b"),
            vec![
                TokenKind::Word("a"),
                TokenKind::Operator(Operator::And),
                TokenKind::Word("b"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn if_then_fi_keywords() {
        let ks = kinds("if true; then echo hi; fi");
        assert_eq!(
            ks,
            vec![
                TokenKind::Keyword(Keyword::If),
                TokenKind::Word("true"),
                TokenKind::Operator(Operator::Semi),
                TokenKind::Keyword(Keyword::Then),
                TokenKind::Word("echo"),
                TokenKind::Word("hi"),
                TokenKind::Operator(Operator::Semi),
                TokenKind::Keyword(Keyword::Fi),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn heredoc_basic() {
        let input = "cat <<EOF\nhello\nworld\nEOF\necho done";
        let ks = kinds(input);
        assert_eq!(
            ks,
            vec![
                TokenKind::Word("cat"),
                TokenKind::Operator(Operator::LessLess),
                TokenKind::HereDocBody {
                    delimiter: "EOF",
                    quoted: false,
                    body: Cow::Borrowed("hello\nworld\n"),
                },
                TokenKind::Newline,
                TokenKind::Word("echo"),
                TokenKind::Word("done"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn heredoc_delimiter_as_substring_does_not_end_body() {
        let input = "cat <<EOF\nEOFOO\nEOF\n";
        let ks = kinds(input);
        match &ks[2] {
            TokenKind::HereDocBody { body, .. } => assert_eq!(body.as_ref(), "EOFOO\n"),
            other => panic!("expected HereDocBody, got {other:?}"),
        }
    }

    #[test]
    fn heredoc_dash_strips_leading_tabs() {
        let input = "cat <<-EOF\n\t\thello\n\tEOF\n";
        let ks = kinds(input);
        match &ks[2] {
            TokenKind::HereDocBody { body, .. } => assert_eq!(body.as_ref(), "hello\n"),
            other => panic!("expected HereDocBody, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_command_substitution_is_lex_error() {
        let err = Lexer::tokenize("echo $(foo").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedQuote { .. }));
    }

    #[test]
    fn double_bracket_test_operator() {
        let ks = kinds("[[ -n $x ]]");
        assert_eq!(
            ks,
            vec![
                TokenKind::Operator(Operator::DoubleLBracket),
                TokenKind::Word("-n"),
                TokenKind::Word("$x"),
                TokenKind::Operator(Operator::DoubleRBracket),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn double_bracket_with_bracket_inside_quoted_word_does_not_terminate() {
        let ks = kinds(r#"[[ "a]" == "a]" ]]"#);
        assert_eq!(
            ks,
            vec![
                TokenKind::Operator(Operator::DoubleLBracket),
                TokenKind::Word("\"a]\""),
                TokenKind::Word("=="),
                TokenKind::Word("\"a]\""),
                TokenKind::Operator(Operator::DoubleRBracket),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn process_substitution_operators() {
        let ks = kinds("diff <(ls a) <(ls b)");
        assert_eq!(
            ks,
            vec![
                TokenKind::Word("diff"),
                TokenKind::Operator(Operator::ProcSubstIn),
                TokenKind::Word("ls"),
                TokenKind::Word("a"),
                TokenKind::Operator(Operator::RParen),
                TokenKind::Operator(Operator::ProcSubstIn),
                TokenKind::Word("ls"),
                TokenKind::Word("b"),
                TokenKind::Operator(Operator::RParen),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn case_arm_terminators() {
        let ks = kinds("pattern) ;; next) ;& more) ;;&");
        assert!(ks.contains(&TokenKind::Operator(Operator::SemiSemi)));
        assert!(ks.contains(&TokenKind::Operator(Operator::SemiAmp)));
        assert!(ks.contains(&TokenKind::Operator(Operator::SemiSemiAmp)));
    }
}
