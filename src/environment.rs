use crate::error::{LoxError, Result};
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Closures and active call frames hold these; a
/// scope lives as long as its longest holder.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: a name → value table plus a link to the scope it is
/// nested in.  The global scope is the only one without `enclosing`.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into a fresh shared handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this scope, replacing any previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Chain‑walking lookup, innermost scope first.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Chain‑walking assignment; the name must already be bound somewhere.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Read `name` from the scope exactly `distance` hops out of `env`.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str, line: usize) -> Result<Value> {
        let scope: EnvRef = Self::ancestor(env, distance, line)?;
        let value: Option<Value> = scope.borrow().values.get(name).cloned();

        debug!("get_at({}, '{}') -> {:?}", distance, name, value.is_some());

        value.ok_or_else(|| LoxError::runtime(line, format!("Undefined variable '{}'.", name)))
    }

    /// Write `name` in the scope exactly `distance` hops out of `env`.
    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let scope: EnvRef = Self::ancestor(env, distance, line)?;
        scope.borrow_mut().values.insert(name.to_string(), value);
        Ok(())
    }

    fn ancestor(env: &EnvRef, distance: usize, line: usize) -> Result<EnvRef> {
        let mut scope: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef = scope.borrow().enclosing.clone().ok_or_else(|| {
                LoxError::runtime(line, "Resolved scope lies outside the environment chain.")
            })?;
            scope = next;
        }

        Ok(scope)
    }
}
