//! Callable runtime objects: user functions (with their closures) and
//! host‑provided native functions.  Classes implement [`Callable`] as well,
//! see [`crate::class`].

use std::fmt;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Interpreter, Signal};
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear to the left of `(...)`.
pub trait Callable {
    /// Number of arguments the callee expects.
    fn arity(&self) -> usize;

    /// Invoke with already‑evaluated, arity‑checked `arguments`.
    /// `call_site` is the closing paren of the call, for error positions.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        call_site: &Token,
    ) -> Result<Value>;
}

/// A user‑defined function or method plus the frame it closes over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A copy of this method whose closure has `this` bound to `instance`.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        debug!("Binding method '{}' to {}", self.name(), instance);

        let environment: EnvRef = Environment::child_of(&self.closure);
        environment.borrow_mut().define("this", instance);

        LoxFunction::new(Rc::clone(&self.declaration), environment)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _call_site: &Token,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        // Parent is the defining frame, not the caller's.
        let environment: EnvRef = Environment::child_of(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            debug!("Binding parameter '{}' to {}", param.lexeme, argument);

            environment.borrow_mut().define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => Ok(Value::Nil),
            Err(Signal::Return(value)) => {
                info!("Function '{}' returned: {}", self.name(), value);

                Ok(value)
            }
            Err(Signal::Error(e)) => Err(e),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// Signature of a host operation exposed to Lox code.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

/// A host‑provided function with a fixed arity.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        call_site: &Token,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        let result: Value =
            (self.func)(&arguments).map_err(|message| LoxError::runtime(call_site, message))?;

        info!("Native function '{}' returned: {}", self.name, result);

        Ok(result)
    }
}
