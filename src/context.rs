use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use regex::Regex;

use crate::errors::{EvalError, Result};
use crate::registry::{Condition, TypeDefinition};
use crate::value::Value;

/// Capabilities a host exposes to the evaluators.
///
/// One context serves one logical resolution: it owns the [`CycleGuard`] for
/// that thread of control, so it is deliberately not required to be `Sync`.
pub trait EvaluationContext {
    /// Look up a property by name; `None` when unset.
    fn lookup_property(&self, name: &str) -> Result<Option<String>>;

    /// Store a property; used by the set-default operator.
    fn set_property(&self, name: &str, value: &str) -> Result<()>;

    fn cycle_guard(&self) -> &CycleGuard;

    /// Whether `name` is set but its value is still being expanded.
    ///
    /// Operators treat such a property as not applicable rather than unset.
    fn is_in_flight(&self, _name: &str) -> bool {
        false
    }

    /// Compile a regular expression. Hosts may override to tune the engine.
    fn compile_pattern(&self, source: &str) -> Result<Regex> {
        Ok(Regex::new(source)?)
    }

    fn lookup_type(&self, _name: &str) -> Option<TypeDefinition> {
        None
    }

    fn create_condition(&self, _name: &str) -> Option<Box<dyn Condition>> {
        None
    }

    fn lookup_reference(&self, _id: &str) -> Option<Value> {
        None
    }

    fn register_reference(&self, _id: &str, _value: &Value) {}

    /// Consume the next property reference in `input` starting at `*pos`.
    ///
    /// On `Some`, `*pos` has moved past the consumed reference.
    fn parse_next_nested(&self, _input: &str, _pos: &mut usize) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Identifies the owner of cycle guard frames, usually one chain instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuardScope(usize);

impl GuardScope {
    pub fn new() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        GuardScope(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for GuardScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokens currently being resolved, scoped to one thread of control.
#[derive(Debug, Default)]
pub struct CycleGuard {
    frames: RefCell<Vec<(GuardScope, String)>>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, scope: GuardScope, token: &str) -> bool {
        self.frames
            .borrow()
            .iter()
            .any(|(s, t)| *s == scope && t == token)
    }

    pub fn push(&self, scope: GuardScope, token: &str) {
        self.frames.borrow_mut().push((scope, token.to_string()));
    }

    /// Push a frame that is released when the returned handle drops, panics
    /// included.
    pub fn enter<'a>(&'a self, scope: GuardScope, token: &'a str) -> GuardFrame<'a> {
        self.push(scope, token);
        GuardFrame {
            guard: self,
            scope,
            token,
            open: true,
        }
    }

    /// Pop the top frame, which must be exactly `(scope, token)`.
    pub fn pop(&self, scope: GuardScope, token: &str) -> Result<()> {
        let mut frames = self.frames.borrow_mut();
        match frames.last() {
            Some((s, t)) if *s == scope && t == token => {
                frames.pop();
                Ok(())
            }
            Some((_, t)) => Err(EvalError::InternalConsistency(format!(
                "stack out of balance: expected `{token}` on top, found `{t}`"
            ))),
            None => Err(EvalError::InternalConsistency(format!(
                "stack out of balance: `{token}` popped from an empty guard"
            ))),
        }
    }

    /// Drop the most recent frame owned by `scope`, wherever it sits.
    pub fn release(&self, scope: GuardScope) {
        let mut frames = self.frames.borrow_mut();
        if let Some(idx) = frames.iter().rposition(|(s, _)| *s == scope) {
            frames.remove(idx);
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.borrow().is_empty()
    }
}

/// A frame pushed by [`CycleGuard::enter`].
#[must_use]
#[derive(Debug)]
pub struct GuardFrame<'a> {
    guard: &'a CycleGuard,
    scope: GuardScope,
    token: &'a str,
    open: bool,
}

impl GuardFrame<'_> {
    /// Pop the frame, which must be on top of the guard.
    pub fn close(mut self) -> Result<()> {
        self.open = false;
        self.guard.pop(self.scope, self.token)
    }
}

impl Drop for GuardFrame<'_> {
    fn drop(&mut self) {
        if self.open {
            self.guard.release(self.scope);
        }
    }
}
