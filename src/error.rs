//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All pipeline stages (scanner, parser, resolver, runtime) convert their
//! failure modes into one of the variants defined here.  Every variant knows
//! the source line, a short *context* (usually ` at 'lexeme'` or ` at end`)
//! and a human‑readable message, which is exactly what a driver needs to
//! present a diagnostic.
//!
//! The module **does not** print diagnostics itself.

use std::io;

use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error{context}: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// Where in the line the problem sits (may be empty).
        context: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{context}: {message}")]
    Parse {
        message: String,
        context: String,
        line: usize,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error{context}: {message}")]
    Resolve {
        message: String,
        context: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime {
        message: String,
        context: String,
        line: usize,
    },

    /// Failure of the program output sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Which pipeline stage produced a [`Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Scan,
    Parse,
    Resolve,
    Runtime,
    Io,
}

/// Flat, serializable view of a [`LoxError`] handed to drivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub kind: ErrorKind,
    pub line: usize,
    pub context: String,
    pub message: String,
}

/// Render the conventional location suffix for a token.
fn context_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex {
            message,
            context: String::new(),
            line,
        }
    }

    /// Helper constructor for the **parser**, positioned at `token`.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            context: context_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**, positioned at `token`.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            context: context_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for **runtime** failures, positioned at `token`.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            context: context_of(token),
            line: token.line,
        }
    }

    /// Source line of the error (`0` for I/O failures).
    pub fn line(&self) -> usize {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. }
            | LoxError::Runtime { line, .. } => *line,
            LoxError::Io(_) => 0,
        }
    }

    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            LoxError::Io(e) => e.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoxError::Lex { .. } => ErrorKind::Scan,
            LoxError::Parse { .. } => ErrorKind::Parse,
            LoxError::Resolve { .. } => ErrorKind::Resolve,
            LoxError::Runtime { .. } => ErrorKind::Runtime,
            LoxError::Io(_) => ErrorKind::Io,
        }
    }

    /// Flatten into the `{line, context, message}` shape drivers present.
    pub fn report(&self) -> Report {
        let context: String = match self {
            LoxError::Lex { context, .. }
            | LoxError::Parse { context, .. }
            | LoxError::Resolve { context, .. }
            | LoxError::Runtime { context, .. } => context.clone(),
            LoxError::Io(_) => String::new(),
        };

        Report {
            kind: self.kind(),
            line: self.line(),
            context,
            message: self.message(),
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Outcome of running one unit of source through the whole pipeline.
#[derive(Debug, Error)]
pub enum RunError {
    /// Scan, parse or resolution errors; nothing was executed.
    #[error("{} static error(s)", .0.len())]
    Static(Vec<LoxError>),

    /// Execution started and aborted on this error.
    #[error("{0}")]
    Runtime(LoxError),
}

impl RunError {
    /// Conventional process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => 65,
            RunError::Runtime(_) => 70,
        }
    }

    /// All underlying errors, in the order they were found.
    pub fn errors(&self) -> Vec<&LoxError> {
        match self {
            RunError::Static(errors) => errors.iter().collect(),
            RunError::Runtime(error) => vec![error],
        }
    }
}
