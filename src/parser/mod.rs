//! Recursive-descent parser turning a bash token stream into a [`BashAst`].
//!
//! Grounded on the teacher's `bash_parser::parser::BashParser` (a
//! `Vec<Token>` plus cursor, with one method per production) but the
//! token stream here is produced by our zero-copy lexer and command
//! words are decomposed lazily by [`words::parse_word`] rather than at
//! lex time.

pub mod arith;
pub mod ast;
pub mod control;
pub mod test_expr;
pub mod words;

use std::collections::HashMap;

use crate::error::ParseError;
use crate::lexer::token::{Keyword, Operator, Token, TokenKind};
use crate::lexer::Lexer;

pub use ast::{ArithExpr, BashAst, BashExpr, ParamExpansion, Word, WordFragment};

use ast::{Assignment, ProcSubstDirection, Redirect, RedirectKind};

/// Parses a complete bash program (or subshell/command-substitution
/// body) into an AST.
pub fn parse(input: &str) -> Result<BashAst<'_>, ParseError> {
    let raw_tokens = Lexer::tokenize(input)?;
    let heredoc_links = link_heredocs(&raw_tokens);
    let mut tokens = Tokens {
        input,
        tokens: raw_tokens,
        pos: 0,
        heredoc_links,
        last_consumed_start: 0,
        last_consumed_end: 0,
    };
    let ast = tokens.parse_stmts_until(|_| false)?;
    if !tokens.at_eof() {
        let tok = tokens.peek().unwrap();
        return Err(ParseError::Unexpected {
            expected: "end of input".to_string(),
            found: describe(&tok.kind),
            offset: tok.start,
        });
    }
    Ok(ast)
}

/// Maps each here-doc-introducing operator token index to the index of
/// the `HereDocBody` token that carries its content, since bodies are
/// collected (by the lexer) only once the logical line's newline is
/// reached — not interleaved with the commands that requested them.
fn link_heredocs(tokens: &[Token<'_>]) -> HashMap<usize, usize> {
    let mut pending = std::collections::VecDeque::new();
    let mut links = HashMap::new();
    for (i, tok) in tokens.iter().enumerate() {
        match &tok.kind {
            TokenKind::Operator(Operator::LessLess) | TokenKind::Operator(Operator::LessLessDash) => {
                pending.push_back(i);
            }
            TokenKind::HereDocBody { .. } => {
                if let Some(op_idx) = pending.pop_front() {
                    links.insert(op_idx, i);
                }
            }
            _ => {}
        }
    }
    links
}

fn describe(kind: &TokenKind<'_>) -> String {
    match kind {
        TokenKind::Word(w) => format!("word {w:?}"),
        TokenKind::Assignment(n) => format!("assignment {n}="),
        TokenKind::PlusAssignment(n) => format!("assignment {n}+="),
        TokenKind::Operator(op) => format!("operator {op:?}"),
        TokenKind::Keyword(kw) => format!("keyword {kw:?}"),
        TokenKind::Newline => "newline".to_string(),
        TokenKind::HereDocBody { delimiter, .. } => format!("here-doc body ({delimiter})"),
        TokenKind::Eof => "end of input".to_string(),
    }
}

/// Cursor over the token stream shared by every production in this
/// module and its submodules.
pub struct Tokens<'a> {
    input: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    heredoc_links: HashMap<usize, usize>,
    last_consumed_start: usize,
    last_consumed_end: usize,
}

impl<'a> Tokens<'a> {
    fn skip_heredoc_bodies(&mut self) {
        while matches!(self.tokens.get(self.pos).map(|t| &t.kind), Some(TokenKind::HereDocBody { .. })) {
            self.pos += 1;
        }
    }

    pub fn peek(&mut self) -> Option<&Token<'a>> {
        self.skip_heredoc_bodies();
        self.tokens.get(self.pos)
    }

    pub fn at_eof(&mut self) -> bool {
        matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Eof) | None)
    }

    pub fn advance(&mut self) -> Token<'a> {
        self.skip_heredoc_bodies();
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::new(
            TokenKind::Eof,
            self.input.len(),
            self.input.len(),
        ));
        self.last_consumed_start = tok.start;
        self.last_consumed_end = tok.end;
        self.pos += 1;
        tok
    }

    fn previous_span_start(&self) -> usize {
        self.last_consumed_start
    }

    fn previous_span_end(&self) -> usize {
        self.last_consumed_end
    }

    /// Repositions the cursor to the first token starting at or after
    /// `offset`. Used after consuming a raw `(( ... ))` span directly
    /// from the source text rather than token-by-token.
    fn seek_to_byte(&mut self, offset: usize) {
        while let Some(tok) = self.tokens.get(self.pos) {
            if tok.start >= offset || matches!(tok.kind, TokenKind::Eof) {
                break;
            }
            self.pos += 1;
        }
    }

    pub fn at_operator(&mut self, op: Operator) -> bool {
        matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Operator(o)) if *o == op)
    }

    pub fn eat_operator(&mut self, op: Operator) -> bool {
        if self.at_operator(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_operator(&mut self, op: Operator) -> Result<(), ParseError> {
        if self.eat_operator(op) {
            Ok(())
        } else {
            let (found, offset) = self.describe_current();
            Err(ParseError::Unexpected {
                expected: format!("{op:?}"),
                found,
                offset,
            })
        }
    }

    pub fn at_keyword(&mut self, kw: Keyword) -> bool {
        matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Keyword(k)) if *k == kw)
    }

    pub fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            let (found, offset) = self.describe_current();
            Err(ParseError::Unexpected {
                expected: format!("{kw:?}"),
                found,
                offset,
            })
        }
    }

    fn describe_current(&mut self) -> (String, usize) {
        match self.peek() {
            Some(tok) => (describe(&tok.kind), tok.start),
            None => ("end of input".to_string(), self.input.len()),
        }
    }

    /// Consumes a `Word` token and returns its raw text and offset, for
    /// callers (like `case` patterns and `[[ ]]` operands) that need the
    /// un-decomposed text alongside its position.
    pub fn next_word_raw(&mut self) -> Result<(&'a str, usize), ParseError> {
        match self.try_next_word_raw() {
            Some(pair) => Ok(pair),
            None => {
                let (found, offset) = self.describe_current();
                Err(ParseError::Unexpected {
                    expected: "word".to_string(),
                    found,
                    offset,
                })
            }
        }
    }

    pub fn try_next_word_raw(&mut self) -> Option<(&'a str, usize)> {
        match self.peek().map(|t| (t.kind.clone(), t.start)) {
            Some((TokenKind::Word(w), start)) => {
                self.advance();
                Some((w, start))
            }
            _ => None,
        }
    }

    fn expect_word_text(&mut self) -> Result<&'a str, ParseError> {
        self.next_word_raw().map(|(text, _)| text)
    }

    /// In a `case` pattern list (`a|b|c)`), `|` separates alternative
    /// patterns rather than starting a pipeline.
    fn eat_pipe_in_pattern(&mut self) -> bool {
        self.eat_operator(Operator::Pipe)
    }

    /// Skips any run of `;` / newline separators, reporting whether at
    /// least one was consumed.
    fn skip_separators(&mut self) -> bool {
        let mut any = false;
        loop {
            if self.eat_operator(Operator::Semi) {
                any = true;
                continue;
            }
            if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Newline)) {
                self.advance();
                any = true;
                continue;
            }
            break;
        }
        any
    }

    /// Parses zero or more statements, each separated by `;`/newline,
    /// until `stop` reports true (without consuming the stopping token)
    /// or input ends.
    fn parse_stmts_until(
        &mut self,
        stop: impl Fn(&mut Tokens<'a>) -> bool,
    ) -> Result<BashAst<'a>, ParseError> {
        let mut stmts = Vec::new();
        self.skip_separators();
        while !self.at_eof() && !stop(self) {
            let stmt = parse_and_or(self)?;
            let stmt = if self.eat_operator(Operator::Amp) {
                BashAst::Background(Box::new(stmt))
            } else {
                stmt
            };
            stmts.push(stmt);
            if !self.skip_separators() {
                break;
            }
        }
        Ok(match stmts.len() {
            0 => BashAst::Empty,
            1 => stmts.into_iter().next().unwrap(),
            _ => BashAst::Sequence(stmts),
        })
    }
}

fn parse_and_or<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    let mut lhs = parse_pipeline(tokens)?;
    loop {
        if tokens.eat_operator(Operator::And) {
            skip_newlines(tokens);
            let rhs = parse_pipeline(tokens)?;
            lhs = BashAst::ListAnd(Box::new(lhs), Box::new(rhs));
        } else if tokens.eat_operator(Operator::Or) {
            skip_newlines(tokens);
            let rhs = parse_pipeline(tokens)?;
            lhs = BashAst::ListOr(Box::new(lhs), Box::new(rhs));
        } else {
            return Ok(lhs);
        }
    }
}

fn skip_newlines(tokens: &mut Tokens<'_>) {
    while matches!(tokens.peek().map(|t| &t.kind), Some(TokenKind::Newline)) {
        tokens.advance();
    }
}

fn parse_pipeline<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    let negated = tokens.eat_operator(Operator::Bang);
    let mut stages = vec![parse_command(tokens)?];
    while tokens.eat_operator(Operator::Pipe) {
        skip_newlines(tokens);
        stages.push(parse_command(tokens)?);
    }
    if !negated && stages.len() == 1 {
        Ok(stages.pop().unwrap())
    } else {
        Ok(BashAst::Pipeline { negated, stages })
    }
}

fn parse_command<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    if tokens.at_keyword(Keyword::If) {
        return control::parse_if(tokens);
    }
    if tokens.at_keyword(Keyword::For) {
        return control::parse_for(tokens);
    }
    if tokens.at_keyword(Keyword::While) {
        return control::parse_while_or_until(tokens, false);
    }
    if tokens.at_keyword(Keyword::Until) {
        return control::parse_while_or_until(tokens, true);
    }
    if tokens.at_keyword(Keyword::Case) {
        return control::parse_case(tokens);
    }
    if tokens.at_keyword(Keyword::Function) {
        return control::parse_function_def(tokens);
    }
    if tokens.at_operator(Operator::DoubleLBracket) {
        return control::parse_double_bracket(tokens);
    }
    if tokens.at_operator(Operator::DoubleLParen) {
        return control::parse_arithmetic_command(tokens);
    }
    if tokens.at_operator(Operator::LBrace) {
        return control::parse_group(tokens);
    }
    if tokens.at_operator(Operator::LParen) {
        return control::parse_subshell(tokens);
    }
    if tokens.at_keyword(Keyword::Time) {
        tokens.advance();
        return parse_pipeline(tokens);
    }
    if is_function_shorthand(tokens) {
        return control::parse_function_def(tokens);
    }
    parse_simple_command(tokens)
}

/// Detects `name()` used without the `function` keyword by peeking at
/// the next two tokens without consuming them.
fn is_function_shorthand(tokens: &mut Tokens<'_>) -> bool {
    let save = tokens.pos;
    let is_word = matches!(tokens.peek().map(|t| &t.kind), Some(TokenKind::Word(_)));
    if !is_word {
        return false;
    }
    tokens.advance();
    let result = tokens.at_operator(Operator::LParen);
    tokens.pos = save;
    result
}

fn parse_simple_command<'a>(tokens: &mut Tokens<'a>) -> Result<BashAst<'a>, ParseError> {
    let mut assignments = Vec::new();
    loop {
        match tokens.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Assignment(name)) => {
                tokens.advance();
                let value = parse_assignment_value(tokens)?;
                assignments.push(Assignment { name, plus: false, value });
            }
            Some(TokenKind::PlusAssignment(name)) => {
                tokens.advance();
                let value = parse_assignment_value(tokens)?;
                assignments.push(Assignment { name, plus: true, value });
            }
            _ => break,
        }
    }

    let mut cmd_words = Vec::new();
    let mut redirects = Vec::new();
    loop {
        if let Some(r) = try_parse_redirect(tokens)? {
            redirects.push(r);
            continue;
        }
        match tokens.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Word(text)) => {
                let start = tokens.peek().unwrap().start;
                tokens.advance();
                cmd_words.push(words::parse_word(text, start)?);
            }
            Some(TokenKind::Operator(op)) if matches!(op, Operator::ProcSubstIn | Operator::ProcSubstOut) => {
                cmd_words.push(parse_proc_subst(tokens, op)?);
            }
            _ => break,
        }
    }

    if cmd_words.is_empty() && redirects.is_empty() {
        if assignments.is_empty() {
            return Ok(BashAst::Empty);
        }
        return Ok(BashAst::AssignOnly(assignments));
    }

    Ok(BashAst::Simple {
        assignments,
        words: cmd_words,
        redirects,
    })
}

/// Parses `<(cmds)` / `>(cmds)` as a standalone word. The lexer hands us
/// the opening operator and leaves the body as ordinary tokens (nested
/// parens are consumed by whatever inner construct owns them, same as a
/// subshell), so we just run the normal statement grammar up to the
/// matching `)`.
fn parse_proc_subst<'a>(tokens: &mut Tokens<'a>, op: Operator) -> Result<Word<'a>, ParseError> {
    tokens.advance();
    let start = tokens.previous_span_start();
    let direction = if op == Operator::ProcSubstIn {
        ProcSubstDirection::In
    } else {
        ProcSubstDirection::Out
    };
    let body = tokens.parse_stmts_until(|t| t.at_operator(Operator::RParen))?;
    tokens.expect_operator(Operator::RParen)?;
    let end = tokens.previous_span_end();
    Ok(Word {
        fragments: vec![WordFragment::ProcSubst(direction, Box::new(body))],
        span: ast::Span::new(start, end),
    })
}

fn parse_assignment_value<'a>(tokens: &mut Tokens<'a>) -> Result<Word<'a>, ParseError> {
    match tokens.peek().map(|t| t.kind.clone()) {
        Some(TokenKind::Word(text)) => {
            let start = tokens.peek().unwrap().start;
            tokens.advance();
            words::parse_word(text, start)
        }
        _ => Ok(Word {
            fragments: vec![],
            span: ast::Span::new(tokens.previous_span_start(), tokens.previous_span_start()),
        }),
    }
}

fn is_redirect_operator(op: Operator) -> bool {
    matches!(
        op,
        Operator::Less
            | Operator::Great
            | Operator::GreatGreat
            | Operator::LessLess
            | Operator::LessLessDash
            | Operator::LessLessLess
            | Operator::AmpGreat
            | Operator::AmpGreatGreat
    )
}

/// Looks ahead (without committing) for a redirect: either the current
/// token is directly a redirect operator, or it's an all-digit `Word`
/// immediately adjacent to one (`2>&1`'s `2`) — adjacency meaning no gap
/// between the word's end and the operator's start, since the lexer
/// tokenizes the fd prefix and the operator as two separate tokens.
/// Returns `(consumed_token_count, explicit_fd, operator)`.
fn peek_redirect(tokens: &mut Tokens<'_>) -> Option<(usize, Option<u32>, Operator)> {
    tokens.skip_heredoc_bodies();
    let idx = tokens.pos;
    match tokens.tokens.get(idx).map(|t| t.kind.clone()) {
        Some(TokenKind::Operator(op)) if is_redirect_operator(op) => return Some((1, None, op)),
        Some(TokenKind::Word(w)) if !w.is_empty() && w.bytes().all(|b| b.is_ascii_digit()) => {
            let word_end = tokens.tokens[idx].end;
            if let Some(next) = tokens.tokens.get(idx + 1) {
                if next.start == word_end {
                    if let TokenKind::Operator(op) = next.kind {
                        if is_redirect_operator(op) {
                            return Some((2, w.parse().ok(), op));
                        }
                    }
                }
            }
            None
        }
        _ => None,
    }
}

fn try_parse_redirect<'a>(tokens: &mut Tokens<'a>) -> Result<Option<Redirect<'a>>, ParseError> {
    let (consumed, explicit_fd, op) = match peek_redirect(tokens) {
        Some(found) => found,
        None => return Ok(None),
    };
    for _ in 0..consumed {
        tokens.advance();
    }

    let redirect = match op {
        Operator::Less => {
            if tokens.eat_operator(Operator::Amp) {
                let fd = expect_fd_word(tokens)?;
                RedirectKind::DuplicateInput(fd)
            } else {
                RedirectKind::Input(next_redirect_target(tokens)?)
            }
        }
        Operator::Great => {
            if tokens.eat_operator(Operator::Amp) {
                let fd = expect_fd_word(tokens)?;
                RedirectKind::DuplicateOutput(fd)
            } else {
                RedirectKind::Output(next_redirect_target(tokens)?)
            }
        }
        Operator::GreatGreat => RedirectKind::Append(next_redirect_target(tokens)?),
        Operator::LessLessLess => RedirectKind::HereString(next_redirect_target(tokens)?),
        Operator::AmpGreat => RedirectKind::OutputAndError(next_redirect_target(tokens)?),
        Operator::AmpGreatGreat => RedirectKind::AppendOutputAndError(next_redirect_target(tokens)?),
        Operator::LessLess | Operator::LessLessDash => {
            let op_index = tokens.pos - 1;
            let op_offset = tokens.tokens[op_index].start;
            let body_index = tokens.heredoc_links.get(&op_index).copied();
            match body_index.and_then(|i| tokens.tokens.get(i)) {
                Some(Token {
                    kind: TokenKind::HereDocBody { delimiter, quoted, body },
                    ..
                }) => RedirectKind::HereDoc {
                    delimiter,
                    quoted: *quoted,
                    strip_tabs: op == Operator::LessLessDash,
                    body: body.clone(),
                },
                _ => {
                    return Err(ParseError::MissingTerminator {
                        terminator: "here-doc body".to_string(),
                        offset: op_offset,
                    })
                }
            }
        }
        _ => unreachable!(),
    };

    Ok(Some(Redirect { fd: explicit_fd, kind: redirect }))
}

fn expect_fd_word(tokens: &mut Tokens<'_>) -> Result<u32, ParseError> {
    let (text, offset) = tokens.next_word_raw()?;
    text.parse().map_err(|_| ParseError::Unexpected {
        expected: "file descriptor number".to_string(),
        found: text.to_string(),
        offset,
    })
}

fn next_redirect_target<'a>(tokens: &mut Tokens<'a>) -> Result<Word<'a>, ParseError> {
    let (text, offset) = tokens.next_word_raw()?;
    words::parse_word(text, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{RedirectKind, WordFragment};

    fn parse_ok(input: &str) -> BashAst<'_> {
        parse(input).unwrap_or_else(|e| panic!("parse failed for {input:?}: {e}"))
    }

    #[test]
    fn simple_command() {
        let ast = parse_ok("echo hello world");
        match ast {
            BashAst::Simple { words, .. } => {
                assert_eq!(words.len(), 3);
                assert!(words[0].is_bare("echo"));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn assignment_scoped_to_command() {
        let ast = parse_ok("FOO=bar echo $FOO");
        match ast {
            BashAst::Simple { assignments, words, .. } => {
                assert_eq!(assignments.len(), 1);
                assert_eq!(assignments[0].name, "FOO");
                assert_eq!(words.len(), 2);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn assign_only_statement() {
        let ast = parse_ok("FOO=bar");
        assert!(matches!(ast, BashAst::AssignOnly(_)));
    }

    #[test]
    fn pipeline() {
        let ast = parse_ok("a | b | c");
        match ast {
            BashAst::Pipeline { negated, stages } => {
                assert!(!negated);
                assert_eq!(stages.len(), 3);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn list_and_or() {
        let ast = parse_ok("a && b || c");
        assert!(matches!(ast, BashAst::ListOr(..)));
    }

    #[test]
    fn sequence_of_statements() {
        let ast = parse_ok("a; b; c");
        match ast {
            BashAst::Sequence(stmts) => assert_eq!(stmts.len(), 3),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn background_statement() {
        let ast = parse_ok("sleep 1 &");
        assert!(matches!(ast, BashAst::Background(_)));
    }

    #[test]
    fn if_statement() {
        let ast = parse_ok("if true; then echo yes; else echo no; fi");
        match ast {
            BashAst::If { branches, else_branch } => {
                assert_eq!(branches.len(), 1);
                assert!(else_branch.is_some());
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn if_elif_chain() {
        let ast = parse_ok("if a; then b; elif c; then d; fi");
        match ast {
            BashAst::If { branches, else_branch } => {
                assert_eq!(branches.len(), 2);
                assert!(else_branch.is_none());
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn for_in_words() {
        let ast = parse_ok("for i in a b c; do echo $i; done");
        match ast {
            BashAst::For { name, words, .. } => {
                assert_eq!(name, "i");
                assert_eq!(words.len(), 3);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn for_arith() {
        let ast = parse_ok("for ((i=0;i<3;i++)); do echo $i; done");
        assert!(matches!(ast, BashAst::ForArith { .. }));
    }

    #[test]
    fn while_loop() {
        let ast = parse_ok("while true; do echo hi; done");
        match ast {
            BashAst::While { until, .. } => assert!(!until),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn until_loop() {
        let ast = parse_ok("until false; do echo hi; done");
        match ast {
            BashAst::While { until, .. } => assert!(until),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn case_statement_basic() {
        let ast = parse_ok("case $x in a) echo a ;; b|c) echo bc ;; *) echo other ;; esac");
        match ast {
            BashAst::Case { arms, .. } => assert_eq!(arms.len(), 3),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn case_empty_body_terminates() {
        let ast = parse_ok("case $x in a) ;; esac");
        match ast {
            BashAst::Case { arms, .. } => {
                assert_eq!(arms.len(), 1);
                assert!(matches!(*arms[0].body, BashAst::Empty));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn function_definition_posix_form() {
        let ast = parse_ok("f() { echo hi; }");
        assert!(matches!(ast, BashAst::FunctionDef { .. }));
    }

    #[test]
    fn function_definition_keyword_form() {
        let ast = parse_ok("function f { echo hi; }");
        assert!(matches!(ast, BashAst::FunctionDef { .. }));
    }

    #[test]
    fn subshell_and_group() {
        assert!(matches!(parse_ok("(echo hi)"), BashAst::Subshell(_)));
        assert!(matches!(parse_ok("{ echo hi; }"), BashAst::Group(_)));
    }

    #[test]
    fn double_bracket_test() {
        let ast = parse_ok("[[ -f foo.txt ]]");
        assert!(matches!(ast, BashAst::DoubleBracket(_)));
    }

    #[test]
    fn arithmetic_command() {
        let ast = parse_ok("(( x = 1 + 2 ))");
        assert!(matches!(ast, BashAst::Arithmetic(_)));
    }

    #[test]
    fn redirect_output_and_input() {
        let ast = parse_ok("sort < in.txt > out.txt");
        match ast {
            BashAst::Simple { redirects, .. } => {
                assert_eq!(redirects.len(), 2);
                assert!(matches!(redirects[0].kind, RedirectKind::Input(_)));
                assert!(matches!(redirects[1].kind, RedirectKind::Output(_)));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn redirect_fd_duplication() {
        let ast = parse_ok("cmd 2>&1");
        match ast {
            BashAst::Simple { redirects, .. } => {
                assert_eq!(redirects.len(), 1);
                assert_eq!(redirects[0].fd, Some(2));
                assert!(matches!(redirects[0].kind, RedirectKind::DuplicateOutput(1)));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn heredoc_attaches_to_command() {
        let ast = parse_ok("cat <<EOF\nhello\nEOF\n");
        match ast {
            BashAst::Simple { redirects, .. } => match &redirects[0].kind {
                RedirectKind::HereDoc { delimiter, body, .. } => {
                    assert_eq!(*delimiter, "EOF");
                    assert_eq!(body.as_ref(), "hello\n");
                }
                other => panic!("{other:?}"),
            },
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn here_string() {
        let ast = parse_ok("cat <<< \"hi\"");
        match ast {
            BashAst::Simple { redirects, .. } => {
                assert!(matches!(redirects[0].kind, RedirectKind::HereString(_)));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn empty_input_is_empty_ast() {
        assert!(matches!(parse_ok(""), BashAst::Empty));
    }

    #[test]
    fn process_substitution_word() {
        let ast = parse_ok("diff <(ls a) <(ls b)");
        match ast {
            BashAst::Simple { words, .. } => {
                assert_eq!(words.len(), 3);
                match &words[1].fragments[0] {
                    WordFragment::ProcSubst(dir, _) => {
                        assert_eq!(*dir, crate::parser::ast::ProcSubstDirection::In)
                    }
                    other => panic!("{other:?}"),
                }
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn command_substitution_word_nested_parses() {
        let ast = parse_ok("for i in $(seq 3); do echo $i; done");
        match ast {
            BashAst::For { words, .. } => {
                assert_eq!(words.len(), 1);
                assert!(matches!(words[0].fragments[0], WordFragment::CommandSubst(_)));
            }
            other => panic!("{other:?}"),
        }
    }
}
