//! # reef — a bash compatibility layer for interactive host shells
//!
//! `reef` lets a user type bash syntax at the prompt of a different
//! interactive shell (the *host* shell) and have it run correctly. It is
//! organized as a small pipeline:
//!
//! 1. [`detector`] decides, in sub-millisecond time, whether a line of input
//!    looks like bash at all.
//! 2. [`lexer`] tokenizes bash source into a borrowed, zero-copy token
//!    stream.
//! 3. [`parser`] turns that token stream into an AST.
//! 4. [`emitter`] turns the AST into host-shell (fish) source, refusing
//!    constructs it cannot faithfully translate.
//! 5. [`passthrough`] runs input under a real bash subprocess and reflects
//!    the environment delta back as host-shell source, for anything the
//!    emitter refuses.
//!
//! The [`cli`] module wires these into the four subcommands documented in
//! the project README: `detect`, `translate`, `bash-exec`, `daemon`.
#![allow(clippy::needless_return)]

/// Bash detection heuristic (tier-1 fast path).
pub mod detector;
/// Zero-copy bash tokenizer.
pub mod lexer;
/// Recursive-descent bash parser and AST.
pub mod parser;
/// AST-directed fish code generator.
pub mod emitter;
/// Bash subprocess execution and environment-delta capture.
pub mod passthrough;
/// Persistent bash coprocess manager (Unix-domain-socket daemon).
pub mod daemon;
/// Command-line interface.
pub mod cli;
/// Shared error taxonomy.
pub mod error;

pub use error::{EmitError, ExecError, LexError, ParseError, ReefError};
pub use parser::ast::{ArithExpr, BashAst, ParamExpansion, TestExpr, Word, WordFragment};

/// Attempt to translate a bash input string into fish source.
///
/// This is the library-level equivalent of the `translate` subcommand: it
/// runs detection (informationally only — detection never blocks
/// translation), lexing, parsing, and emission, returning `Ok(None)` when
/// the emitter cleanly refuses (the caller should fall back to
/// [`passthrough::bash_exec`]).
pub fn translate(input: &str) -> Result<Option<String>, ReefError> {
    let ast = parser::parse(input)?;
    match emitter::emit(&ast) {
        Ok(fish_src) => Ok(Some(fish_src)),
        Err(EmitError::Unsupported(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
