use std::io::{Stdout, Write};

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::stmt::Stmt;
use crate::value::Value;

/// Native stack for the thread that drives a session.  Sized so that
/// [`MAX_CALL_DEPTH`](crate::interpreter::MAX_CALL_DEPTH) nested Lox calls report `Stack overflow.` as a runtime
/// error well before the host stack runs out, even in unoptimised builds.
pub const STACK_SIZE: usize = 128 * 1024 * 1024;

/// A Lox session: one interpreter whose globals survive between `run` calls
/// (a REPL feeds it line by line; a script runs once).
pub struct Lox<W: Write> {
    interpreter: Interpreter<W>,
}

impl Lox<Stdout> {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }
}

impl Default for Lox<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Lox<W> {
    pub fn with_output(out: W) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    pub fn output(&self) -> &W {
        self.interpreter.output()
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }

    /// Scan, parse, resolve and execute `source`.
    ///
    /// Static errors (lexical, syntax, resolution) are all collected and stop
    /// the program before it runs.  A runtime error is returned alone, after
    /// whatever output preceded it.
    pub fn run(&mut self, source: &str) -> Vec<LoxError> {
        let statements: Vec<Stmt> = match Self::front_end(source) {
            Ok(statements) => statements,
            Err(errors) => return errors,
        };

        let locals = match Resolver::new().resolve(&statements) {
            Ok(locals) => locals,
            Err(errors) => return errors,
        };

        match self.interpreter.interpret(&statements, locals) {
            Ok(()) => Vec::new(),
            Err(e) => {
                debug!("Runtime error: {}", e);
                vec![e]
            }
        }
    }

    /// Evaluate a single expression and return its value.
    pub fn evaluate(&mut self, source: &str) -> Result<Value, Vec<LoxError>> {
        let (tokens, mut errors) = scan_tokens(source);

        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expression();
        errors.extend(parser.take_errors());

        let Some(expr) = expr.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };

        let locals = Resolver::new().resolve_expression(&expr)?;
        self.interpreter.resolve(locals);

        self.interpreter.evaluate(&expr).map_err(|e| vec![e])
    }

    /// Scanning and parsing; both run to completion so every lexical and
    /// syntax error is reported together.
    fn front_end(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, mut errors) = scan_tokens(source);

        let mut parser = Parser::new(tokens);
        let statements: Vec<Stmt> = parser.parse();
        errors.extend(parser.take_errors());

        if errors.is_empty() {
            info!("Front end produced {} statement(s)", statements.len());
            Ok(statements)
        } else {
            Err(errors)
        }
    }
}
