use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::function::{LoxFunction, NativeFn, NativeFunction};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Why execution of a statement stopped early.
///
/// `Return` is ordinary control flow: it unwinds to the nearest function
/// call and is consumed there.  Only `Error` ever leaves the interpreter.
#[derive(Debug)]
pub enum Signal {
    Error(LoxError),
    Return(Value),
}

impl From<LoxError> for Signal {
    fn from(error: LoxError) -> Self {
        Signal::Error(error)
    }
}

/// Deepest chain of nested calls before a program is stopped.
pub const MAX_CALL_DEPTH: usize = 4096;

/// Convenient alias for statement execution results.
pub type ExecResult = std::result::Result<(), Signal>;

/// Tree‑walking evaluator.  One instance lives for a whole session so that
/// globals survive across REPL lines.
pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an Interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// Creates an Interpreter writing `print` output to `output`, with native
    /// functions such as `clock` already defined.
    pub fn with_output(output: impl Write + 'static) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output: Box::new(output),
            call_depth: 0,
        };

        debug!("Defining native function 'clock'");

        interpreter.define_native("clock", 0, |_args: &[Value]| {
            let millis: i64 = Utc::now().timestamp_millis();

            Ok(Value::Number(millis as f64 / 1000.0))
        });

        interpreter
    }

    /// Expose a host function to Lox code as a global.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        let native = NativeFunction {
            name: name.to_string(),
            arity,
            func,
        };

        self.globals
            .borrow_mut()
            .define(name, Value::NativeFunction(Rc::new(native)));
    }

    /// Is `name` currently bound in the globals?
    pub fn is_global(&self, name: &str) -> bool {
        self.globals.borrow().contains(name)
    }

    /// Record that the reference `id` binds `depth` frames above the frame
    /// active when it is evaluated.  Called by the resolver.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let mut outcome: Result<()> = Ok(());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(Signal::Error(e)) => {
                    debug!("Runtime debug: {}", e);

                    outcome = Err(e);
                    break;
                }
                // The resolver rejects top‑level `return`; if one slips
                // through it just ends the unit.
                Err(Signal::Return(_)) => break,
            }
        }

        // Whatever was printed before a runtime error still reaches the sink.
        self.output.flush()?;
        outcome?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────────── statements ──────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value).map_err(LoxError::from)?;

                debug!("Printed value: {}", value);
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Variable '{}' defined with value: {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let environment: EnvRef = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment));

                info!(
                    "Function '{}' defined with {} parameters",
                    declaration.name.lexeme,
                    declaration.params.len()
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Err(Signal::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Run `statements` with `environment` as the active frame, restoring
    /// the previous frame on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> ExecResult {
        debug!("Entering block with {} statements", statements.len());

        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let result: ExecResult = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> ExecResult {
        debug!("Declaring class '{}'", name.lexeme);

        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let at: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };

                    return Err(LoxError::runtime(at, "Superclass must be a class.").into());
                }
            },
            None => None,
        };

        // Methods of a subclass close over a frame binding `super`.
        let enclosing: EnvRef = Rc::clone(&self.environment);

        if let Some(class) = &superclass {
            self.environment = Environment::child_of(&enclosing);
            self.environment
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(class)));
        }

        let table: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(Rc::clone(method), Rc::clone(&self.environment));

                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        self.environment = enclosing;

        let class = LoxClass::new(name.lexeme.clone(), table, superclass);

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        info!("Class '{}' defined", name.lexeme);
        Ok(())
    }

    // ───────────────────────────── expressions ─────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                // The deciding operand itself is the result, not a boolean.
                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                debug!("Assigned value {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(&callee, args, paren)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    /// Invoke `callee` after checking it is callable with this many arguments.
    fn call_value(&mut self, callee: &Value, args: Vec<Value>, paren: &Token) -> Result<Value> {
        let Some(callable) = callee.as_callable() else {
            return Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if args.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    args.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        debug!("Calling {} with {} argument(s)", callee, args.len());

        self.call_depth += 1;
        let result: Result<Value> = callable.call(self, args, paren);
        self.call_depth -= 1;

        result
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        let value: Value = match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name)?,
            None => self.globals.borrow().get(name)?,
        };

        debug!("Variable '{}' evaluated to: {}", name.lexeme, value);
        Ok(value)
    }

    /// `super.method`: the method comes from the superclass captured when the
    /// enclosing class was declared, `this` from the frame just inside it.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let Some(&distance) = self.locals.get(&id) else {
            return Err(LoxError::runtime(
                keyword,
                "Can't use 'super' outside of a class.",
            ));
        };

        let Value::Class(superclass) = Environment::get_at(&self.environment, distance, keyword)?
        else {
            return Err(LoxError::runtime(keyword, "Superclass must be a class."));
        };

        let this_token = Token::new(TokenType::THIS, "this", keyword.line);
        let object: Value =
            Environment::get_at(&self.environment, distance.saturating_sub(1), &this_token)?;

        match superclass.find_method(&method.lexeme) {
            Some(function) => Ok(Value::Function(Rc::new(function.bind(object)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(
                    op,
                    format!("Operand of '{}' must be a number.", op.lexeme),
                )),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(op, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary expression.
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        debug!(
            "Binary '{}' on {:?} and {:?}",
            op.lexeme, left_val, right_val
        );

        match op.token_type {
            TokenType::PLUS => match (&left_val, &right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", left_val, right_val)))
                }
                _ => Err(LoxError::runtime(
                    op,
                    "Operands of '+' must be two numbers or include a string.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(op, "Invalid binary operator.")),
        }
    }
}

/// Both operands as numbers, or a type error naming the operator.
fn number_operands(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(
            op,
            format!(
                "Operands of '{}' must be numbers, got {} and {}.",
                op.lexeme,
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}
