use crate::context::EvaluationContext;
use crate::errors::{EvalError, Result};
use crate::evaluator::{MatchGroups, RegexBased, RegexPattern};
use crate::glob;
use crate::value::Value;

use super::Operand;

const DEFAULT_REQUIRE_MESSAGE: &str = "Missing required property ";

/// Property name in front of `:-`, `:=` or `:?`. It may hold colons, but
/// never one that starts another of these operators.
const NAME: &str = r"((?:[^:]|:[^-=?])*?)";

/// `name:start` or `name:start:end`, character indices, end exclusive.
#[derive(Debug)]
pub struct Substring {
    pattern: RegexPattern,
}

impl Substring {
    pub fn new() -> Self {
        Self {
            pattern: RegexPattern::new(r"^(.*?):(\d+)(?::(\d+))?$"),
        }
    }
}

impl Default for Substring {
    fn default() -> Self {
        Self::new()
    }
}

// digits only, so failure means overflow: saturate and let the range check fail
fn parse_index(digits: &str) -> usize {
    digits.parse().unwrap_or(usize::MAX)
}

impl RegexBased for Substring {
    fn pattern(&self) -> &RegexPattern {
        &self.pattern
    }

    fn evaluate_groups(
        &self,
        groups: &MatchGroups,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        let name = groups.text(1);
        let Some(value) = Operand::lookup(ctx, name)?.into_value() else {
            return Ok(None);
        };
        let len = value.chars().count();
        let start = parse_index(groups.text(2));
        let end = groups.get(3).map(parse_index).unwrap_or(len);
        if start > end || end > len {
            return Err(EvalError::IndexOutOfRange {
                name: name.to_string(),
                start,
                end,
                len,
            });
        }
        let sub: String = value.chars().skip(start).take(end - start).collect();
        Ok(Some(Value::String(sub)))
    }
}

/// `name:-default`
#[derive(Debug)]
pub struct DefaultValue {
    pattern: RegexPattern,
}

impl DefaultValue {
    pub fn new() -> Self {
        Self {
            pattern: RegexPattern::new(format!("^{NAME}:-(.*)$")),
        }
    }
}

impl Default for DefaultValue {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexBased for DefaultValue {
    fn pattern(&self) -> &RegexPattern {
        &self.pattern
    }

    fn evaluate_groups(
        &self,
        groups: &MatchGroups,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        Ok(match Operand::lookup(ctx, groups.text(1))? {
            Operand::Set(value) => Some(Value::String(value)),
            Operand::Unset => Some(Value::from(groups.text(2))),
            Operand::InFlight => None,
        })
    }
}

/// `name:=default`; an unset property is assigned the default.
#[derive(Debug)]
pub struct SetDefaultValue {
    pattern: RegexPattern,
}

impl SetDefaultValue {
    pub fn new() -> Self {
        Self {
            pattern: RegexPattern::new(format!("^{NAME}:=(.*)$")),
        }
    }
}

impl Default for SetDefaultValue {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexBased for SetDefaultValue {
    fn pattern(&self) -> &RegexPattern {
        &self.pattern
    }

    fn evaluate_groups(
        &self,
        groups: &MatchGroups,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        let name = groups.text(1);
        match Operand::lookup(ctx, name)? {
            Operand::Set(value) => Ok(Some(Value::String(value))),
            Operand::Unset => {
                let default = groups.text(2);
                ctx.set_property(name, default)?;
                Ok(Some(Value::from(default)))
            }
            Operand::InFlight => Ok(None),
        }
    }
}

/// `name:tr/from/to`, a `tr(1)`-style character remap.
///
/// `a-z` ranges expand, a short `to` set repeats its last character and an
/// empty one deletes every character found in `from`.
#[derive(Debug)]
pub struct Translate {
    pattern: RegexPattern,
}

impl Translate {
    pub fn new() -> Self {
        Self {
            pattern: RegexPattern::new(r"^(.*?):tr/((?:\\/|[^/])+)/((?:\\/|[^/])*)$"),
        }
    }
}

impl Default for Translate {
    fn default() -> Self {
        Self::new()
    }
}

fn expand_set(raw: &str) -> Vec<char> {
    let mut unescaped = raw.to_string();
    glob::de_escape('/', &mut unescaped);
    let chars: Vec<char> = unescaped.chars().collect();
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if i + 2 < chars.len() && chars[i + 1] == '-' && chars[i] <= chars[i + 2] {
            out.extend(chars[i]..=chars[i + 2]);
            i += 3;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

pub(crate) fn transliterate(value: &str, from: &[char], to: &[char]) -> String {
    value
        .chars()
        .filter_map(|c| match from.iter().position(|f| *f == c) {
            Some(idx) => to.get(idx).or(to.last()).copied(),
            None => Some(c),
        })
        .collect()
}

impl RegexBased for Translate {
    fn pattern(&self) -> &RegexPattern {
        &self.pattern
    }

    fn evaluate_groups(
        &self,
        groups: &MatchGroups,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        let Some(value) = Operand::lookup(ctx, groups.text(1))?.into_value() else {
            return Ok(None);
        };
        let from = expand_set(groups.text(2));
        let to = expand_set(groups.text(3));
        Ok(Some(Value::String(transliterate(&value, &from, &to))))
    }
}

/// `name:?message`; fails the build when the property is unset.
#[derive(Debug)]
pub struct RequireProperty {
    pattern: RegexPattern,
}

impl RequireProperty {
    pub fn new() -> Self {
        Self {
            pattern: RegexPattern::new(format!(r"^{NAME}:\?(.*)$")),
        }
    }
}

impl Default for RequireProperty {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexBased for RequireProperty {
    fn pattern(&self) -> &RegexPattern {
        &self.pattern
    }

    fn evaluate_groups(
        &self,
        groups: &MatchGroups,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        let name = groups.text(1);
        match Operand::lookup(ctx, name)? {
            Operand::Set(value) => Ok(Some(Value::String(value))),
            Operand::InFlight => Ok(None),
            Operand::Unset => {
                let message = match groups.text(2) {
                    "" => format!("{DEFAULT_REQUIRE_MESSAGE}{name}"),
                    given => given.to_string(),
                };
                Err(EvalError::Failure(message))
            }
        }
    }
}
