use tracing::debug;

use crate::context::EvaluationContext;
use crate::errors::{EvalError, Result};
use crate::evaluator::PropertyEvaluator;
use crate::prefixed::DEFAULT_DELIMITER;
use crate::value::Value;

/// `<type>:<argument>` constructs a registered type from the argument.
///
/// A failed construction is not an error, the token is simply not
/// applicable. A constructed object is registered with the host under the
/// full token.
#[derive(Debug)]
pub struct ComponentTypeEvaluator {
    delimiter: String,
}

impl ComponentTypeEvaluator {
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }

    pub fn with_delimiter(delimiter: &str) -> Result<Self> {
        let mut ev = Self::new();
        ev.set_delimiter(delimiter)?;
        Ok(ev)
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn set_delimiter(&mut self, delimiter: &str) -> Result<()> {
        if delimiter.is_empty() {
            return Err(EvalError::configuration("invalid delimiter: empty"));
        }
        self.delimiter = delimiter.to_string();
        Ok(())
    }
}

impl Default for ComponentTypeEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyEvaluator for ComponentTypeEvaluator {
    fn evaluate(&self, token: &str, ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
        let Some((type_name, arg)) = token.split_once(self.delimiter.as_str()) else {
            return Ok(None);
        };
        let Some(definition) = ctx.lookup_type(type_name) else {
            return Ok(None);
        };
        match definition.construct(ctx, arg) {
            Ok(object) => {
                let value = Value::Object(object);
                ctx.register_reference(token, &value);
                Ok(Some(value))
            }
            Err(e) => {
                debug!(type_name, arg, error = %e, "construction failed");
                Ok(None)
            }
        }
    }
}
