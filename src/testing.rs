use std::cell::RefCell;
use std::collections::HashMap;

use crate::context::{CycleGuard, EvaluationContext};
use crate::errors::Result;

/// Bare property map used by unit tests.
#[derive(Debug, Default)]
pub(crate) struct MapContext {
    properties: RefCell<HashMap<String, String>>,
    guard: CycleGuard,
}

impl MapContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(pairs: &[(&str, &str)]) -> Self {
        let ctx = Self::new();
        for (k, v) in pairs {
            ctx.properties
                .borrow_mut()
                .insert(k.to_string(), v.to_string());
        }
        ctx
    }

    pub(crate) fn get(&self, name: &str) -> Option<String> {
        self.properties.borrow().get(name).cloned()
    }
}

impl EvaluationContext for MapContext {
    fn lookup_property(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name))
    }

    fn set_property(&self, name: &str, value: &str) -> Result<()> {
        self.properties
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn cycle_guard(&self) -> &CycleGuard {
        &self.guard
    }
}
