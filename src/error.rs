//! Error taxonomy for every fallible stage of the pipeline.
//!
//! Each stage owns a narrow error type (grounded in the teacher's
//! `bash_parser::lexer::LexerError` / `bash_parser::parser::ParseError`
//! pattern of one `thiserror::Error` enum per module); [`ReefError`] unifies
//! them for callers that cross stage boundaries, such as the CLI.

use std::fmt;
use std::io;

use thiserror::Error;

/// Byte offset into the original input, used for diagnostics.
pub type Offset = usize;

/// Errors raised while tokenizing bash source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated quote starting at byte {offset}")]
    UnterminatedQuote { offset: Offset },

    #[error("unterminated brace expansion starting at byte {offset}")]
    UnterminatedBrace { offset: Offset },

    #[error("unterminated here-document (delimiter {delimiter:?}) starting at byte {offset}")]
    UnterminatedHereDoc { delimiter: String, offset: Offset },

    #[error("invalid escape sequence at byte {offset}")]
    BadEscape { offset: Offset },

    #[error("invalid arithmetic expression at byte {offset}: {message}")]
    BadArith { offset: Offset, message: String },
}

impl LexError {
    pub fn offset(&self) -> Offset {
        match self {
            LexError::UnterminatedQuote { offset }
            | LexError::UnterminatedBrace { offset }
            | LexError::UnterminatedHereDoc { offset, .. }
            | LexError::BadEscape { offset }
            | LexError::BadArith { offset, .. } => *offset,
        }
    }
}

/// Errors raised while parsing a token stream into an AST.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected token at byte {offset}: expected {expected}, found {found}")]
    Unexpected {
        expected: String,
        found: String,
        offset: Offset,
    },

    #[error("missing terminator {terminator:?} for construct opened at byte {offset}")]
    MissingTerminator { terminator: String, offset: Offset },

    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

/// Errors raised by the emitter when a construct cannot be faithfully
/// translated. This is not a hard failure of the program — the caller
/// falls back to [`crate::passthrough::bash_exec`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

/// Errors raised while executing bash in a subprocess.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("bash executable not found on PATH")]
    BashMissing,

    #[error("failed to spawn bash subprocess: {0}")]
    Spawn(#[source] io::Error),

    #[error("I/O error talking to bash subprocess: {0}")]
    Io(String),
}

impl From<io::Error> for ExecError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            ExecError::BashMissing
        } else {
            ExecError::Io(e.to_string())
        }
    }
}

/// Unified error type for callers crossing more than one pipeline stage
/// (principally the CLI layer).
#[derive(Error, Debug)]
pub enum ReefError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Process exit codes, per spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    Internal = 2,
    BashMissing = 127,
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as i32)
    }
}

impl ReefError {
    /// Map an error to the process exit code it should produce, per
    /// spec.md §7's propagation rules.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ReefError::Lex(_) | ReefError::Parse(_) | ReefError::Emit(_) => ExitCode::Failure,
            ReefError::Exec(ExecError::BashMissing) => ExitCode::BashMissing,
            ReefError::Exec(_) => ExitCode::Failure,
            ReefError::Internal(_) => ExitCode::Internal,
        }
    }
}
