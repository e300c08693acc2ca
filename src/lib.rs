//! Resolution of property expressions such as `${name:-default}`,
//! `${src//*.java/*.class}` or `${true&!false}`.
//!
//! A token is offered to an [`EvaluatorChain`] of strategies; the first one
//! that recognizes its syntax produces the [`Value`]. A [`CycleGuard`] owned
//! by the [`EvaluationContext`] stops tokens that refer back to themselves.

pub mod adapters;
pub mod chain;
pub mod config;
pub mod context;
pub mod errors;
pub mod evaluator;
pub mod glob;
pub mod host;
pub mod logical;
pub mod nested;
pub mod prefixed;
pub mod registry;
pub mod stringops;
pub mod value;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use chain::{Balance, EvaluatorChain};
pub use config::{ChainConfig, EvaluatorKind, Settings};
pub use context::{CycleGuard, EvaluationContext, GuardScope};
pub use errors::{EvalError, Result};
pub use evaluator::{MatchGroups, PropertyEvaluator, RegexBased, RegexPattern};
pub use host::{PropertyStore, Session};
pub use logical::LogicalOperationEvaluator;
pub use nested::NestedExpansionParser;
pub use prefixed::{PrefixPattern, PrefixedEvaluator, StaticPrefix};
pub use registry::{Condition, ConditionRegistry, TypeDefinition, TypeRegistry};
pub use value::{ObjectRef, Value};

/// The default chain: references, URL encoding, string operations, logical
/// operations, conditions, then type construction.
pub fn standard_chain() -> Result<EvaluatorChain> {
    ChainConfig::default().build()
}

/// Convenience: expand `text` against a throwaway store holding `properties`.
pub fn expand(text: &str, properties: &[(&str, &str)]) -> Result<String> {
    let store = PropertyStore::new(Arc::new(standard_chain()?));
    for (name, value) in properties {
        store.set_property(name, value);
    }
    store.expand(text)
}
