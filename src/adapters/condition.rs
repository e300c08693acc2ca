use crate::context::EvaluationContext;
use crate::errors::{EvalError, Result};
use crate::evaluator::{MatchGroups, RegexBased, RegexPattern};
use crate::value::Value;

const ASSIGN_ATTR: &str = "(?:.+?)=(?:.+?)";

/// `[!]name(key=value,...)` evaluates a registered condition.
#[derive(Debug)]
pub struct ConditionTypeEvaluator {
    pattern: RegexPattern,
}

impl ConditionTypeEvaluator {
    pub fn new() -> Self {
        Self {
            pattern: RegexPattern::new(format!(
                r"^(!)?(.+?)\(({ASSIGN_ATTR}(?:,{ASSIGN_ATTR})*)\)$"
            )),
        }
    }
}

impl Default for ConditionTypeEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexBased for ConditionTypeEvaluator {
    fn pattern(&self) -> &RegexPattern {
        &self.pattern
    }

    fn evaluate_groups(
        &self,
        groups: &MatchGroups,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        let negate = groups.get(1).is_some();
        let name = groups.text(2);
        let Some(mut condition) = ctx.create_condition(name) else {
            return Ok(None);
        };
        for attribute in groups.text(3).split(',') {
            let (key, value) = attribute.split_once('=').ok_or_else(|| {
                EvalError::failure(format!("malformed attribute `{attribute}` for {name}"))
            })?;
            condition.set_attribute(key.trim(), value.trim())?;
        }
        Ok(Some(Value::Bool(condition.eval(ctx)? ^ negate)))
    }
}
