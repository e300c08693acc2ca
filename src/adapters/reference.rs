use crate::context::EvaluationContext;
use crate::errors::Result;
use crate::prefixed::{PrefixPattern, PrefixedEvaluator, StaticPrefix};
use crate::value::Value;

pub const DEFAULT_PREFIX: &str = "ref";

/// `ref:<id>` returns the object the host registered under `<id>`.
#[derive(Debug)]
pub struct ReferenceResolvingEvaluator {
    prefix: StaticPrefix,
}

impl ReferenceResolvingEvaluator {
    pub fn new() -> Self {
        Self {
            prefix: StaticPrefix::new(DEFAULT_PREFIX),
        }
    }

    pub fn with_delimiter(delimiter: &str) -> Result<Self> {
        Ok(Self {
            prefix: StaticPrefix::with_delimiter(DEFAULT_PREFIX, delimiter)?,
        })
    }
}

impl Default for ReferenceResolvingEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixedEvaluator for ReferenceResolvingEvaluator {
    fn prefix_pattern(&self) -> &PrefixPattern {
        self.prefix.pattern()
    }

    fn can_interpret(&self, prefix: &str) -> Result<bool> {
        self.prefix.can_interpret(prefix)
    }

    fn evaluate_prefixed(
        &self,
        property: &str,
        _prefix: &str,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        Ok(ctx.lookup_reference(property))
    }
}
