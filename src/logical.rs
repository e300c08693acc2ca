//! Boolean combinations of already-resolved `true`/`false` literals.
//!
//! Precedence, tightest first: AND (`&` or `+`), XOR (`^`), OR (`|`). There
//! are no parentheses; grouping comes from nested references that have
//! already been reduced to a literal.

use regex::Regex;

use crate::context::EvaluationContext;
use crate::errors::Result;
use crate::evaluator::{MatchGroups, RegexBased, RegexPattern};
use crate::value::Value;

const BOOL: &str = "(?:true|false)";
const AND: &str = r"\s*(?:&|\+)\s*";
const XOR: &str = r"\s*\^\s*";
const OR: &str = r"\s*\|\s*";

fn grammar() -> String {
    let negated = format!("!{BOOL}");
    let operand = format!("(?:{BOOL}|{negated})");
    let op = format!("(?:{AND}|{XOR}|{OR}){operand}");
    format!("^(?:{operand}(?:{op})+|{negated})$")
}

#[derive(Debug)]
pub struct LogicalOperationEvaluator {
    pattern: RegexPattern,
    and: Regex,
    xor: Regex,
    or: Regex,
}

impl LogicalOperationEvaluator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: RegexPattern::new(grammar()),
            and: Regex::new(AND)?,
            xor: Regex::new(XOR)?,
            or: Regex::new(OR)?,
        })
    }

    fn operand(term: &str) -> bool {
        match term.strip_prefix('!') {
            Some(rest) => rest.trim() != "true",
            None => term.trim() == "true",
        }
    }

    /// Evaluate an expression already known to match the grammar.
    pub fn fold(&self, expr: &str) -> bool {
        self.or.split(expr).any(|disjunct| {
            self.xor.split(disjunct).fold(false, |acc, conjunction| {
                acc ^ self.and.split(conjunction).all(Self::operand)
            })
        })
    }
}

impl RegexBased for LogicalOperationEvaluator {
    fn pattern(&self) -> &RegexPattern {
        &self.pattern
    }

    fn evaluate_groups(
        &self,
        groups: &MatchGroups,
        _ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        Ok(Some(Value::Bool(self.fold(groups.text(0)))))
    }
}
