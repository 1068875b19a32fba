use std::collections::HashMap;
use std::io::{self, Stdout, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::class::{LoxClass, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::function::{Callable, LoxFunction, NativeFunction};
use crate::resolver::Locals;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.  `return` unwinds through enclosing statements
/// as `Flow::Return` until the call boundary consumes it; it is never an error.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Deepest chain of nested Lox calls before `Stack overflow.` is raised.
/// Each level costs several native frames, so the host thread needs a stack
/// of at least [`crate::runner::STACK_SIZE`] bytes to reach it.
pub const MAX_CALL_DEPTH: usize = 2048;

/// Tree‑walking evaluator.  One instance lives for a whole session so globals
/// and resolved distances persist across `interpret` calls.
pub struct Interpreter<W: Write> {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    depth: usize,
    out: W,
}

impl Interpreter<Stdout> {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Creates a new Interpreter writing `print` output to `out`, with the
    /// native `clock` predefined.
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_ref();

        debug!("Defining native function 'clock'");
        globals
            .borrow_mut()
            .define("clock", Value::NativeFunction(Rc::new(NativeFunction::clock())));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            depth: 0,
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Merge scope distances computed by the resolver.
    ///
    /// Entries are kept for the whole session: a closure created by one REPL
    /// line may still run expressions resolved on that line, and ids are never
    /// reused, so stale entries cost memory but never shadow live ones.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts the rest of the program.
    pub fn interpret(&mut self, statements: &[Stmt], locals: Locals) -> Result<()> {
        self.resolve(locals);

        debug!("Interpreting {} statements", statements.len());
        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                // The resolver rejects top-level `return`; nothing to unwind to.
                break;
            }
        }

        self.out.flush()?;
        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let env: EnvRef = Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();
                self.execute_block(statements, env)
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
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.execute_class(name, superclass.as_ref(), methods)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `env`, restoring the current scope afterwards
    /// whether they finish, return, or fail.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, env);

        let mut result: Result<Flow> = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Defining class '{}'", name.lexeme);

        // Define first so method closures already see the class's own slot.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(LoxError::runtime(
                        expr.line().unwrap_or(name.line),
                        "Superclass must be a class.",
                    ))
                }
            },
            None => None,
        };

        let enclosing: Option<EnvRef> = superclass.as_ref().map(|class| {
            let mut env: Environment = Environment::with_enclosing(Rc::clone(&self.environment));
            env.define("super", Value::Class(Rc::clone(class)));
            std::mem::replace(&mut self.environment, env.into_ref())
        });

        let methods: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|decl| {
                let function = LoxFunction::new(
                    Rc::clone(decl),
                    Rc::clone(&self.environment),
                    decl.name.lexeme == INITIALIZER,
                );
                (decl.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), superclass, methods);

        if let Some(enclosing) = enclosing {
            self.environment = enclosing;
        }

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)), name.line)?;

        info!("Class '{}' defined", name.lexeme);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::Bool(b) => Value::Bool(*b),
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
            } => self.evaluate_logical(left, operator, right),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => self.evaluate_assign(*id, name, value),

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => self.evaluate_set(object, name, value),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    // Out of line: `evaluate` sits on the native stack several times per Lox call.

    #[inline(never)]
    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;

        // The deciding operand is the result, not a coerced boolean.
        let short_circuit: bool = match op.token_type {
            TokenType::OR => left_val.is_truthy(),
            _ => !left_val.is_truthy(),
        };

        if short_circuit {
            Ok(left_val)
        } else {
            self.evaluate(right)
        }
    }

    #[inline(never)]
    fn evaluate_assign(&mut self, id: ExprId, name: &Token, value: &Expr) -> Result<Value> {
        let value: Value = self.evaluate(value)?;

        match self.locals.get(&id) {
            Some(&distance) => Environment::assign_at(
                &self.environment,
                distance,
                &name.lexeme,
                value.clone(),
                name.line,
            )?,
            None => self
                .globals
                .borrow_mut()
                .assign(&name.lexeme, value.clone(), name.line)?,
        }

        Ok(value)
    }

    #[inline(never)]
    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let callee: Value = self.evaluate(callee)?;

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate(arg)?);
        }

        self.call_value(callee, paren, args)
    }

    #[inline(never)]
    fn evaluate_get(&mut self, object: &Expr, name: &Token) -> Result<Value> {
        match self.evaluate(object)? {
            Value::Instance(instance) => instance.get(name),
            _ => Err(LoxError::runtime(
                name.line,
                "Only instances have properties.",
            )),
        }
    }

    #[inline(never)]
    fn evaluate_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> Result<Value> {
        let Value::Instance(instance) = self.evaluate(object)? else {
            return Err(LoxError::runtime(name.line, "Only instances have fields."));
        };

        let value: Value = self.evaluate(value)?;
        instance.set(name, value.clone());
        Ok(value)
    }

    #[inline(never)]
    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op.line, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(
                op.line,
                format!("Invalid unary operator '{}'.", op.lexeme),
            )),
        }
    }

    #[inline(never)]
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => {
                    let mut joined: String = String::with_capacity(a.len() + b.len());
                    joined.push_str(&a);
                    joined.push_str(&b);
                    Ok(Value::from(joined))
                }
                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => {
                let (Value::Number(a), Value::Number(b)) = (&left_val, &right_val) else {
                    return Err(LoxError::runtime(op.line, "Operands must be numbers."));
                };
                let (a, b) = (*a, *b);

                Ok(match op.token_type {
                    TokenType::MINUS => Value::Number(a - b),
                    TokenType::STAR => Value::Number(a * b),
                    // IEEE semantics: x/0 is ±Infinity or NaN.
                    TokenType::SLASH => Value::Number(a / b),
                    TokenType::GREATER => Value::Bool(a > b),
                    TokenType::GREATER_EQUAL => Value::Bool(a >= b),
                    TokenType::LESS => Value::Bool(a < b),
                    TokenType::LESS_EQUAL => Value::Bool(a <= b),
                    _ => {
                        return Err(LoxError::runtime(
                            op.line,
                            format!("Invalid binary operator '{}'.", op.lexeme),
                        ))
                    }
                })
            }
        }
    }

    #[inline(never)]
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = *self.locals.get(&id).ok_or_else(|| {
            LoxError::runtime(keyword.line, "Can't use 'super' outside of a subclass.")
        })?;

        let Value::Class(superclass) =
            Environment::get_at(&self.environment, distance, "super", keyword.line)?
        else {
            return Err(LoxError::runtime(keyword.line, "Superclass must be a class."));
        };

        // `this` always lives one scope inside `super`.
        let Value::Instance(instance) =
            Environment::get_at(
                &self.environment,
                distance.saturating_sub(1),
                "this",
                keyword.line,
            )?
        else {
            return Err(LoxError::runtime(keyword.line, "'this' is not an instance."));
        };

        let found: Rc<LoxFunction> = superclass.find_method(&method.lexeme).ok_or_else(|| {
            LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )
        })?;

        Ok(Value::Function(Rc::new(found.bind(instance))))
    }

    /// Resolved names jump straight to their scope; everything else is global.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, &name.lexeme, name.line)
            }
            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }

    /// Invokes a callable (native function, user function, or class).  Calls
    /// nested deeper than [`MAX_CALL_DEPTH`] fail with a runtime error.
    #[inline(never)]
    fn call_value(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            debug!("Call depth limit {} reached", MAX_CALL_DEPTH);
            return Err(LoxError::runtime(paren.line, "Stack overflow."));
        }

        self.depth += 1;
        let result: Result<Value> = self.dispatch_call(callee, paren, args);
        self.depth -= 1;

        result
    }

    fn dispatch_call(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::NativeFunction(native) => self.invoke(native.as_ref(), paren, args),
            Value::Function(function) => self.invoke(function.as_ref(), paren, args),
            Value::Class(class) => self.invoke(&class, paren, args),
            other => Err(LoxError::runtime(
                paren.line,
                format!(
                    "Can only call functions and classes, not {}.",
                    other.type_name()
                ),
            )),
        }
    }

    fn invoke<C: Callable>(&mut self, callable: &C, paren: &Token, args: Vec<Value>) -> Result<Value> {
        if args.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren.line,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    args.len()
                ),
            ));
        }

        callable.call(self, args, paren.line)
    }
}
