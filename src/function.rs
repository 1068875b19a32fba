//! Callable runtime objects: host‑provided natives and user closures.
//!
//! Classes are callable too (construction); see [`crate::class`].

use std::fmt;
use std::io::Write;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// Anything a call expression may target.
pub trait Callable {
    fn arity(&self) -> usize;

    /// Invoke with already‑evaluated arguments.  Arity has been checked by the
    /// caller; `line` locates errors raised by the callee itself.
    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value>;
}

/// Function implemented by the host.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl NativeFunction {
    /// `clock()`: seconds since the Unix epoch, millisecond resolution.
    pub fn clock() -> Self {
        NativeFunction {
            name: "clock".to_string(),
            arity: 0,
            func: |_args: &[Value]| {
                let millis: i64 = Utc::now().timestamp_millis();
                Ok(Value::Number(millis as f64 / 1000.0))
            },
        }
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call<W: Write>(
        &self,
        _interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        let result: Value = (self.func)(&arguments).map_err(|msg| LoxError::runtime(line, msg))?;

        info!("Native function '{}' returned: {}", self.name, result);
        Ok(result)
    }
}

/// A user function or method paired with the scope it was declared in.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl fmt::Debug for LoxFunction {
    // The closure may contain this very function; never print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.declaration.name.lexeme)
            .field("arity", &self.declaration.params.len())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A copy of this method whose closure is a one‑entry scope holding
    /// `this`, parented at the original closure.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let mut env: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        env.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: env.into_ref(),
            is_initializer: self.is_initializer,
        }
    }

    /// The bound receiver; only meaningful for initializers.
    fn this(&self, line: usize) -> Result<Value> {
        Environment::get_at(&self.closure, 0, "this", line)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let mut env: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, arg) in self.declaration.params.iter().zip(arguments) {
            env.define(&param.lexeme, arg);
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, env.into_ref())?;

        if self.is_initializer {
            return self.this(line);
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        })
    }
}
