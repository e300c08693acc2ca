use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::context::EvaluationContext;
use crate::errors::{EvalError, Result};
use crate::value::Value;

/// Property naming the host's regex implementation. Never resolved here.
pub const REGEXP_IMPL_PROPERTY: &str = "ant.regexp.regexpimpl";

/// One recognizer/resolver strategy.
///
/// `Ok(None)` means "not applicable": the token is not in this strategy's
/// syntax, or the property it refers to is unset.
pub trait PropertyEvaluator: Send + Sync + fmt::Debug {
    fn evaluate(&self, token: &str, ctx: &dyn EvaluationContext) -> Result<Option<Value>>;
}

/// Capture groups of a successful match; group 0 is the whole token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroups(Vec<Option<String>>);

impl MatchGroups {
    fn from_captures(caps: &Captures<'_>) -> Self {
        Self(
            caps.iter()
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|g| g.as_deref())
    }

    /// Group text, empty when the group did not participate.
    pub fn text(&self, index: usize) -> &str {
        self.get(index).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A strategy's regex source plus its lazily compiled form.
#[derive(Debug, Default)]
pub struct RegexPattern {
    source: Option<String>,
    compiled: OnceLock<Regex>,
}

impl RegexPattern {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            compiled: OnceLock::new(),
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Replace the source; the cached compilation is discarded.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
        self.compiled = OnceLock::new();
    }

    pub fn compiled(&self, ctx: &dyn EvaluationContext) -> Result<&Regex> {
        if let Some(re) = self.compiled.get() {
            return Ok(re);
        }
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| EvalError::configuration("pattern not set"))?;
        let re = ctx.compile_pattern(&format!("^(?:{source})$"))?;
        // a racing thread may have won; both compiled the same source
        Ok(self.compiled.get_or_init(|| re))
    }

    /// Match the whole token and collect its groups.
    pub fn match_groups(
        &self,
        token: &str,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<MatchGroups>> {
        if token == REGEXP_IMPL_PROPERTY {
            return Ok(None);
        }
        let re = self.compiled(ctx)?;
        Ok(re.captures(token).map(|caps| MatchGroups::from_captures(&caps)))
    }
}

/// Strategies driven by one fixed regular expression.
///
/// Every implementor is a [`PropertyEvaluator`]: the token is matched against
/// [`RegexBased::pattern`] and, on success, the groups are handed to
/// [`RegexBased::evaluate_groups`].
pub trait RegexBased: Send + Sync + fmt::Debug {
    fn pattern(&self) -> &RegexPattern;

    fn evaluate_groups(
        &self,
        groups: &MatchGroups,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>>;
}

impl<T: RegexBased> PropertyEvaluator for T {
    fn evaluate(&self, token: &str, ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
        match self.pattern().match_groups(token, ctx)? {
            Some(groups) => self.evaluate_groups(&groups, ctx),
            None => Ok(None),
        }
    }
}
