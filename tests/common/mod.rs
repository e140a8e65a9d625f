#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use lox_interpreter::error::RunError;
use lox_interpreter::lox::Lox;

/// In-memory `print` sink that the test keeps a handle to.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `source` in a fresh session, returning what it printed and the outcome.
pub fn run(source: &str) -> (String, Result<(), RunError>) {
    let out = SharedBuf::default();
    let mut session = Lox::with_output(out.clone());
    let result = session.run(source);

    (out.contents(), result)
}

/// Run `source`, panicking on any error, and return its output.
pub fn run_ok(source: &str) -> String {
    let (output, result) = run(source);

    if let Err(e) = result {
        let messages: Vec<String> = e.errors().iter().map(|e| e.to_string()).collect();
        panic!("unexpected failure: {:?}\noutput so far: {}", messages, output);
    }

    output
}

/// Messages of every error `source` produces.
pub fn error_messages(source: &str) -> Vec<String> {
    match run(source).1 {
        Ok(()) => Vec::new(),
        Err(e) => e.errors().iter().map(|e| e.message()).collect(),
    }
}
