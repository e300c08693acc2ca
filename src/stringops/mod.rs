//! Shell-style string operators over property values.
//!
//! | token                 | result                                      |
//! |-----------------------|---------------------------------------------|
//! | `name:start[:end]`    | substring by character index                |
//! | `name:-default`       | value, or `default` when unset              |
//! | `name:=default`       | value, or store and return `default`        |
//! | `name:tr/from/to`     | per-character translation                   |
//! | `name:?message`       | value, or fail with `message`               |
//! | `name#glob`           | delete shortest matching prefix             |
//! | `name##glob`          | delete longest matching prefix              |
//! | `name%glob`           | delete shortest matching suffix             |
//! | `name%%glob`          | delete longest matching suffix              |
//! | `name/glob/repl`      | replace first match                         |
//! | `name//glob/repl`     | replace every match                         |

mod basic;
mod pattern;

use std::sync::Arc;

use crate::chain::EvaluatorChain;
use crate::context::EvaluationContext;
use crate::errors::Result;

pub use basic::{DefaultValue, RequireProperty, SetDefaultValue, Substring, Translate};
pub use pattern::{Anchor, DeletePart, Replace};

/// A property as the operators see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operand {
    Set(String),
    Unset,
    /// Set, but its own value is being expanded right now.
    InFlight,
}

impl Operand {
    pub(crate) fn lookup(ctx: &dyn EvaluationContext, name: &str) -> Result<Self> {
        if ctx.is_in_flight(name) {
            return Ok(Operand::InFlight);
        }
        Ok(match ctx.lookup_property(name)? {
            Some(value) => Operand::Set(value),
            None => Operand::Unset,
        })
    }

    pub(crate) fn into_value(self) -> Option<String> {
        match self {
            Operand::Set(value) => Some(value),
            Operand::Unset | Operand::InFlight => None,
        }
    }
}

/// The operators above, in precedence order, behind one strict chain.
pub fn string_operations() -> EvaluatorChain {
    EvaluatorChain::strict(vec![
        Arc::new(Substring::new()),
        Arc::new(DefaultValue::new()),
        Arc::new(SetDefaultValue::new()),
        Arc::new(Translate::new()),
        Arc::new(RequireProperty::new()),
        Arc::new(DeletePart::from_start_greedy()),
        Arc::new(DeletePart::from_start_reluctant()),
        Arc::new(DeletePart::from_end_greedy()),
        Arc::new(DeletePart::from_end_reluctant()),
        Arc::new(Replace::new()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::PropertyEvaluator;
    use crate::testing::MapContext;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn eval(token: &str) -> Option<String> {
        let ctx = MapContext::with(&[("file", "dir/sub/name.tar.gz"), ("v", "a.b.c")]);
        string_operations()
            .evaluate(token, &ctx)
            .unwrap()
            .map(|v| v.to_string())
    }

    #[test]
    fn operators_dispatch_in_order() {
        assert_eq!(eval("v:2"), Some("b.c".into()));
        assert_eq!(eval("v:0:1"), Some("a".into()));
        assert_eq!(eval("missing:-fallback"), Some("fallback".into()));
        assert_eq!(eval("v:tr/./_"), Some("a_b_c".into()));
        assert_eq!(eval("file##*/"), Some("name.tar.gz".into()));
        assert_eq!(eval("file#*/"), Some("sub/name.tar.gz".into()));
        assert_eq!(eval("file%%.*"), Some("dir/sub/name".into()));
        assert_eq!(eval("file%.*"), Some("dir/sub/name.tar".into()));
        assert_eq!(eval("v/./-"), Some("a-b.c".into()));
        assert_eq!(eval("v//./-"), Some("a-b-c".into()));
    }

    #[test]
    fn plain_names_are_not_applicable() {
        assert_eq!(eval("v"), None);
        assert_eq!(eval("already resolved text"), None);
    }

    #[test]
    fn unset_property_is_not_applicable() {
        assert_eq!(eval("nope:1"), None);
        assert_eq!(eval("nope/a/b"), None);
        assert_eq!(eval("nope##*"), None);
    }

    #[test]
    fn set_default_writes_through() {
        let ctx = MapContext::new();
        let chain = string_operations();
        assert_eq!(
            chain.evaluate("fresh:=seed", &ctx).unwrap(),
            Some(Value::from("seed"))
        );
        assert_eq!(ctx.get("fresh"), Some("seed".into()));
        assert!(ctx.cycle_guard().is_empty());
    }
}
