//! In-memory host: a property store plus per-resolution sessions.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::chain::EvaluatorChain;
use crate::config::Settings;
use crate::context::{CycleGuard, EvaluationContext, GuardScope};
use crate::errors::Result;
use crate::evaluator::PropertyEvaluator;
use crate::nested::NestedExpansionParser;
use crate::registry::{Condition, ConditionRegistry, TypeDefinition, TypeRegistry};
use crate::value::Value;

/// Shared property and reference storage. Safe to use from many threads;
/// every resolution runs in its own [`Session`].
#[derive(Debug)]
pub struct PropertyStore {
    properties: DashMap<String, String>,
    references: DashMap<String, Value>,
    types: TypeRegistry,
    conditions: ConditionRegistry,
    chain: Arc<EvaluatorChain>,
    expander: NestedExpansionParser,
    scope: GuardScope,
}

impl PropertyStore {
    pub fn new(chain: Arc<EvaluatorChain>) -> Self {
        Self::with_registries(
            chain,
            TypeRegistry::with_builtins(),
            ConditionRegistry::with_builtins(),
        )
    }

    pub fn with_registries(
        chain: Arc<EvaluatorChain>,
        types: TypeRegistry,
        conditions: ConditionRegistry,
    ) -> Self {
        Self {
            properties: DashMap::new(),
            references: DashMap::new(),
            types,
            conditions,
            chain,
            expander: NestedExpansionParser::new(),
            scope: GuardScope::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = Self::new(Arc::new(settings.chain.build()?));
        for (name, value) in &settings.properties {
            store.set_property(name, value);
        }
        Ok(store)
    }

    pub fn chain(&self) -> &Arc<EvaluatorChain> {
        &self.chain
    }

    pub fn set_property(&self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }

    /// The stored, unexpanded value.
    pub fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).map(|v| v.value().clone())
    }

    pub fn add_reference(&self, id: &str, value: Value) {
        self.references.insert(id.to_string(), value);
    }

    pub fn reference(&self, id: &str) -> Option<Value> {
        self.references.get(id).map(|v| v.value().clone())
    }

    pub fn session(&self) -> Session<'_> {
        Session {
            store: self,
            guard: CycleGuard::new(),
        }
    }

    pub fn resolve(&self, token: &str) -> Result<Option<Value>> {
        self.session().resolve(token)
    }

    pub fn expand(&self, text: &str) -> Result<String> {
        self.session().expand(text)
    }
}

/// One resolution against a [`PropertyStore`], owning its cycle guard.
#[derive(Debug)]
pub struct Session<'a> {
    store: &'a PropertyStore,
    guard: CycleGuard,
}

impl Session<'_> {
    /// Run `token` through the chain.
    pub fn resolve(&self, token: &str) -> Result<Option<Value>> {
        self.store.chain.evaluate(token, self)
    }

    /// Stored value with its references expanded, else the chain's answer.
    pub fn property_value(&self, name: &str) -> Result<Option<Value>> {
        let Some(raw) = self.store.property(name) else {
            return self.resolve(name);
        };
        if self.guard.contains(self.store.scope, name) {
            debug!(name, "property refers to itself");
            return Ok(None);
        }
        let frame = self.guard.enter(self.store.scope, name);
        let expanded = self.expand(&raw);
        frame.close()?;
        Ok(Some(Value::String(expanded?)))
    }

    /// Replace every `${...}` in `text`; `$$` stands for a literal `$`.
    pub fn expand(&self, text: &str) -> Result<String> {
        if !text.contains('$') {
            return Ok(text.to_string());
        }
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;
        while let Some(rest) = text.get(pos..) {
            let Some(c) = rest.chars().next() else {
                break;
            };
            if rest.starts_with("$$") {
                out.push('$');
                pos += 2;
                continue;
            }
            if let Some(value) = self.parse_next_nested(text, &mut pos)? {
                out.push_str(&value.to_string());
                continue;
            }
            out.push(c);
            pos += c.len_utf8();
        }
        Ok(out)
    }
}

impl EvaluationContext for Session<'_> {
    fn lookup_property(&self, name: &str) -> Result<Option<String>> {
        // constructed objects have no text value to operate on
        Ok(match self.property_value(name)? {
            Some(Value::Object(_)) | None => None,
            Some(value) => Some(value.to_string()),
        })
    }

    fn set_property(&self, name: &str, value: &str) -> Result<()> {
        self.store.set_property(name, value);
        Ok(())
    }

    fn cycle_guard(&self) -> &CycleGuard {
        &self.guard
    }

    fn is_in_flight(&self, name: &str) -> bool {
        self.guard.contains(self.store.scope, name) && self.store.properties.contains_key(name)
    }

    fn lookup_type(&self, name: &str) -> Option<TypeDefinition> {
        self.store.types.get(name)
    }

    fn create_condition(&self, name: &str) -> Option<Box<dyn Condition>> {
        self.store.conditions.create(name)
    }

    fn lookup_reference(&self, id: &str) -> Option<Value> {
        self.store.reference(id)
    }

    fn register_reference(&self, id: &str, value: &Value) {
        self.store.add_reference(id, value.clone());
    }

    fn parse_next_nested(&self, input: &str, pos: &mut usize) -> Result<Option<Value>> {
        let start = *pos;
        let Some(name) = self.store.expander.parse_property_name(input, pos, self)? else {
            return Ok(None);
        };
        match self.property_value(&name)? {
            Some(value) => Ok(Some(value)),
            None => {
                debug!(name, "property has not been set");
                Ok(Some(Value::String(input[start..*pos].to_string())))
            }
        }
    }
}
