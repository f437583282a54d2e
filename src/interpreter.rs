//! API to control the interpreter.

use std::io::prelude::*;
use std::rc::Rc;

use log::{debug, trace};

use crate::diag::Reporter;
use crate::eval::Evaluator;
use crate::parser::Parser;

pub use crate::eval::RuntimeError;
pub use crate::parser::ParserError;

/// Tree-walk interpreter.
///
/// Drives source text through the scanner and parser, then evaluates the
/// statements in a global environment that persists across [`run`] calls.
/// Diagnostics go to the shared [`Reporter`]; only read failures from the
/// input stream surface as errors.
///
/// [`run`]: Interpreter::run
///
/// # Example
///
/// ```
/// use treelox::diag::Reporter;
/// use treelox::interpreter::Interpreter;
///
/// let mut output: Vec<u8> = Vec::new();
/// let reporter = Reporter::new(Vec::new());
/// let mut interp = Interpreter::new(&mut output, reporter);
///
/// interp.run("var greeting = \"hello\";".as_bytes())?;
/// interp.run("print greeting;".as_bytes())?;
///
/// assert_eq!(output, b"hello\n");
/// # Ok::<(), treelox::interpreter::ParserError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write, E: Write> {
    evaluator: Evaluator<'t, W>,
    reporter: Rc<Reporter<E>>,
}

impl<'t, W: Write, E: Write> Interpreter<'t, W, E> {
    pub fn new(output: &'t mut W, reporter: Rc<Reporter<E>>) -> Interpreter<'t, W, E> {
        Interpreter {
            evaluator: Evaluator::new(output),
            reporter,
        }
    }

    /// Run one program: parse all of it, then evaluate it only if no syntax
    /// error was reported.  A runtime error stops evaluation and is
    /// forwarded to the reporter; it is not returned.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<(), ParserError> {
        let mut parser = Parser::new(input, Rc::clone(&self.reporter));
        let prg = parser.parse_program()?;
        trace!("parsed {} statements", prg.len());

        if self.reporter.had_error() {
            debug!("skipping evaluation: syntax errors were reported");
            return Ok(());
        }

        if let Err(e) = self.evaluator.eval_stmts_in_global_env(&prg) {
            self.reporter.runtime_error(&e);
        }
        Ok(())
    }
}
