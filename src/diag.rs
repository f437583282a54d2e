//! Diagnostic values and the sink they are reported to.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;

use crate::eval::RuntimeError;

/// Line number (starting at one).
pub type Position = u32;

/// Token context quoted in a syntax diagnostic.
#[derive(Debug, PartialEq, Clone)]
pub enum At {
    /// Raised by the scanner, before there is a token to quote.
    Source,
    /// Raised at a token.
    Token(String),
    /// Raised at end of input.
    End,
}

impl fmt::Display for At {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            At::Source => Ok(()),
            At::Token(lexeme) => write!(f, " at '{}'", lexeme),
            At::End => write!(f, " at end"),
        }
    }
}

/// A lexical or syntactic error with enough context to render its
/// diagnostic line.
#[derive(Debug, PartialEq, Clone, Error)]
#[error("[line {pos}] Error {at} : {error}")]
pub struct FullParseError {
    pub pos: Position,
    pub at: At,
    pub error: ParseError,
}

/// What went wrong; `Display` is the user-facing message.
#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParseError {
    #[error("Unexpected character.")]
    UnexpectedChar,

    #[error("Unterminated string.")]
    UnterminatedString,

    #[error("Unterminated block comment.")]
    UnterminatedBlockComment,

    // Unreachable under the number grammar, kept so the scanner need not
    // panic on a failed float conversion.
    #[error("Unable to parse number literal.")]
    BadNumberLiteral,

    #[error("Expect expression.")]
    ExpectedExpression,

    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,

    #[error("{0}")]
    Expected(&'static str),
}

/// Diagnostic sink shared by the scanner, the parser and the interpreter,
/// plus the two flags the driver maps to exit codes.
///
/// The sink is `stderr` in the command-line driver and an in-memory buffer
/// in tests.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    sink: RefCell<W>,
    had_error: Cell<bool>,
    had_runtime_error: Cell<bool>,
}

impl<W: Write> Reporter<W> {
    /// Returns an `Rc` because the sink is shared between pipeline stages.
    pub fn new(sink: W) -> Rc<Reporter<W>> {
        Rc::new(Reporter {
            sink: RefCell::new(sink),
            had_error: Cell::new(false),
            had_runtime_error: Cell::new(false),
        })
    }

    pub fn syntax_error(&self, err: &FullParseError) {
        self.had_error.set(true);
        writeln!(self.sink.borrow_mut(), "{}", err).ok();
    }

    pub fn runtime_error(&self, err: &RuntimeError) {
        self.had_runtime_error.set(true);
        writeln!(self.sink.borrow_mut(), "{}", err).ok();
    }

    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error.get()
    }

    /// Clears the syntax-error flag so a REPL can accept its next line.
    pub fn reset(&self) {
        self.had_error.set(false);
    }

    /// Borrow the underlying stream, e.g. to inspect captured diagnostics.
    pub fn sink(&self) -> Ref<'_, W> {
        self.sink.borrow()
    }
}
