//! Lox interpreter command-line.
//!
//! Without arguments it drops into an interactive read-evaluate-print loop
//! whose global environment persists from line to line.
//!
//! With a script path it runs the script and exits with the conventional
//! codes: 65 after a syntax error, 70 after a runtime error.

use std::env;
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::BufReader;
use std::process;
use std::rc::Rc;

use anyhow::Context;

use treelox::diag::Reporter;
use treelox::interpreter::Interpreter;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    match args.as_slice() {
        [] => run_prompt()?,
        [path] => run_file(path)?,
        _ => {
            println!("Usage: treelox [script]");
            process::exit(64);
        }
    }
    Ok(())
}

fn run_file(path: &str) -> Result<(), anyhow::Error> {
    let reader =
        BufReader::new(File::open(path).with_context(|| format!("failed to open {}", path))?);

    let mut stdout = io::stdout();
    let reporter = Reporter::new(io::stderr());
    let mut interp = Interpreter::new(&mut stdout, Rc::clone(&reporter));
    interp.run(reader)?;

    if reporter.had_error() {
        process::exit(65);
    }
    if reporter.had_runtime_error() {
        process::exit(70);
    }
    Ok(())
}

fn run_prompt() -> Result<(), anyhow::Error> {
    let stdin = io::stdin();
    let mut repl_stdout = io::stdout();
    let mut interp_stdout = io::stdout();

    let reporter = Reporter::new(io::stderr());
    let mut interp = Interpreter::new(&mut interp_stdout, Rc::clone(&reporter));

    let mut input = String::new();
    loop {
        repl_stdout.write_all(b"> ")?;
        repl_stdout.flush()?;

        input.clear();
        let nbytes = stdin.read_line(&mut input)?;
        if nbytes == 0 {
            break;
        }

        if let Err(e) = interp.run(input.as_bytes()) {
            eprintln!("{}", e);
        }
        reporter.reset();
    }

    Ok(())
}
