//! Scanning, parsing, resolution and interpretation behind one call.
//!
//! A [`Lox`] session owns a single [`Interpreter`], so definitions made by
//! one `run` are visible to the next (this is what the REPL relies on).

use std::io::Write;

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::{LoxError, RunError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::{scan_partial, scan_tokens};
use crate::token::Token;
use crate::value::Value;

pub struct Lox {
    interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to stdout.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// A session printing to `output`.
    pub fn with_output(output: impl Write + 'static) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
        }
    }

    /// Access to the interpreter, e.g. to register extra natives.
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Run one unit of source (a file or a REPL line).
    ///
    /// Nothing executes unless scanning, parsing and resolution all succeed.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        info!("Running {} byte(s) of source", source.len());

        let statements: Vec<Stmt> = parse_program(source).map_err(RunError::Static)?;

        debug!("Parsed {} statements", statements.len());

        Resolver::new(&mut self.interpreter)
            .resolve(&statements)
            .map_err(RunError::Static)?;

        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)
    }

    /// Evaluate a single expression and return its value.
    pub fn evaluate(&mut self, source: &str) -> Result<Value, RunError> {
        let tokens: Vec<Token> = scan_tokens(source).map_err(RunError::Static)?;
        let expr = Parser::new(tokens)
            .parse_expression()
            .map_err(RunError::Static)?;

        self.interpreter.evaluate(&expr).map_err(RunError::Runtime)
    }
}

/// Scan and parse `source`, reporting lexical and syntax errors together.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, mut errors) = scan_partial(source);

    // Parse the tokens that did scan so syntax errors surface in the same pass.
    match Parser::new(tokens).parse() {
        Ok(statements) if errors.is_empty() => Ok(statements),
        Ok(_) => Err(errors),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            Err(errors)
        }
    }
}
