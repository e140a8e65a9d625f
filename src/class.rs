use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::function::{Callable, LoxFunction};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Name of the method run when a class is called.
pub const INITIALIZER: &str = "init";

/// A class: its own method table plus an optional superclass link.
pub struct LoxClass {
    pub name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    superclass: Option<Rc<LoxClass>>,
}

impl LoxClass {
    pub fn new(
        name: impl Into<String>,
        methods: HashMap<String, Rc<LoxFunction>>,
        superclass: Option<Rc<LoxClass>>,
    ) -> Self {
        Self {
            name: name.into(),
            methods,
            superclass,
        }
    }

    /// Nearest definition of `name`, searching this class first and then
    /// each superclass in turn.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }
}

impl Callable for Rc<LoxClass> {
    /// The arity of `init`, or zero when the class has none.
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map(|init| init.arity())
            .unwrap_or(0)
    }

    /// Allocate an instance and run `init` on it.  The result is always the
    /// instance, whatever `init` returns.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        call_site: &Token,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance: Value = Value::Instance(Rc::new(RefCell::new(LoxInstance::new(Rc::clone(
            self,
        )))));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(instance.clone())
                .call(interpreter, arguments, call_site)?;
        }

        Ok(instance)
    }
}

/// An object: its class plus lazily created fields.
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property read: own fields first, then methods bound to `instance`.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(&name.lexeme) {
            let bound: LoxFunction = method.bind(Value::Instance(Rc::clone(instance)));

            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(LoxError::runtime(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Property write; creates the field if it does not exist yet.
    pub fn set(&mut self, name: &Token, value: Value) {
        debug!("Setting field '{}' on {}", name.lexeme, self.class.name);

        self.fields.insert(name.lexeme.clone(), value);
    }
}
