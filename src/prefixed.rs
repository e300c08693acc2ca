use std::fmt;

use crate::context::EvaluationContext;
use crate::errors::{EvalError, Result};
use crate::evaluator::{MatchGroups, RegexBased, RegexPattern};
use crate::value::Value;

pub const DEFAULT_DELIMITER: &str = ":";

/// `^(.*?)<delimiter>(.*)$`: shortest prefix, literal delimiter, remainder.
#[derive(Debug)]
pub struct PrefixPattern {
    delimiter: String,
    pattern: RegexPattern,
}

impl PrefixPattern {
    pub fn new(delimiter: &str) -> Result<Self> {
        let mut p = Self {
            delimiter: String::new(),
            pattern: RegexPattern::default(),
        };
        p.set_delimiter(delimiter)?;
        Ok(p)
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Change the delimiter; the underlying pattern is rebuilt immediately.
    pub fn set_delimiter(&mut self, delimiter: &str) -> Result<()> {
        if delimiter.is_empty() {
            return Err(EvalError::configuration("invalid delimiter: empty"));
        }
        self.pattern
            .set_source(format!("^(.*?){}(.*)$", regex::escape(delimiter)));
        self.delimiter = delimiter.to_string();
        Ok(())
    }

    pub fn pattern(&self) -> &RegexPattern {
        &self.pattern
    }
}

impl Default for PrefixPattern {
    fn default() -> Self {
        let delimiter = DEFAULT_DELIMITER.to_string();
        let pattern = RegexPattern::new(format!("^(.*?){}(.*)$", regex::escape(&delimiter)));
        Self { delimiter, pattern }
    }
}

/// Strategies keyed on a `prefix<delimiter>property` token.
pub trait PrefixedEvaluator: Send + Sync + fmt::Debug {
    fn prefix_pattern(&self) -> &PrefixPattern;

    fn can_interpret(&self, prefix: &str) -> Result<bool>;

    fn evaluate_prefixed(
        &self,
        property: &str,
        prefix: &str,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>>;
}

impl<T: PrefixedEvaluator> RegexBased for T {
    fn pattern(&self) -> &RegexPattern {
        self.prefix_pattern().pattern()
    }

    fn evaluate_groups(
        &self,
        groups: &MatchGroups,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        let prefix = groups.text(1);
        if self.can_interpret(prefix)? {
            self.evaluate_prefixed(groups.text(2), prefix, ctx)
        } else {
            Ok(None)
        }
    }
}

/// Prefix matching against one configured constant.
#[derive(Debug, Default)]
pub struct StaticPrefix {
    pattern: PrefixPattern,
    prefix: Option<String>,
}

impl StaticPrefix {
    pub fn new(prefix: &str) -> Self {
        Self {
            pattern: PrefixPattern::default(),
            prefix: Some(prefix.to_string()),
        }
    }

    pub fn with_delimiter(prefix: &str, delimiter: &str) -> Result<Self> {
        Ok(Self {
            pattern: PrefixPattern::new(delimiter)?,
            prefix: Some(prefix.to_string()),
        })
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn set_prefix(&mut self, prefix: &str) {
        self.prefix = Some(prefix.to_string());
    }

    pub fn set_delimiter(&mut self, delimiter: &str) -> Result<()> {
        self.pattern.set_delimiter(delimiter)
    }

    pub fn pattern(&self) -> &PrefixPattern {
        &self.pattern
    }

    pub fn can_interpret(&self, prefix: &str) -> Result<bool> {
        let required = self
            .prefix
            .as_deref()
            .ok_or_else(|| EvalError::configuration("prefix unset"))?;
        Ok(required == prefix)
    }
}
