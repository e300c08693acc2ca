use crate::context::EvaluationContext;
use crate::errors::Result;
use crate::evaluator::{MatchGroups, RegexBased, RegexPattern};
use crate::glob;
use crate::value::Value;

use super::Operand;

/// Which end of the value a [`DeletePart`] trims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
}

/// Removes the part of a property value matched by a glob anchored at one end.
///
/// The value is returned unchanged when the glob does not match.
#[derive(Debug)]
pub struct DeletePart {
    pattern: RegexPattern,
    anchor: Anchor,
    greedy: bool,
}

impl DeletePart {
    fn new(source: &str, anchor: Anchor, greedy: bool) -> Self {
        Self {
            pattern: RegexPattern::new(source),
            anchor,
            greedy,
        }
    }

    /// `name##glob`
    pub fn from_start_greedy() -> Self {
        Self::new(r"^(.*?)##(.*)$", Anchor::Start, true)
    }

    /// `name#glob`
    pub fn from_start_reluctant() -> Self {
        Self::new(r"^(.*?)#(.*)$", Anchor::Start, false)
    }

    /// `name%%glob`
    pub fn from_end_greedy() -> Self {
        Self::new(r"^(.*?)%%(.*)$", Anchor::End, true)
    }

    /// `name%glob`
    pub fn from_end_reluctant() -> Self {
        Self::new(r"^(.*?)%(.*)$", Anchor::End, false)
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    /// Full regex whose group 1 is what survives the deletion.
    fn specialize(&self, fragment: &str) -> String {
        match (self.anchor, self.greedy) {
            (Anchor::Start, _) => format!("(?s)^(?:{fragment})(.*)$"),
            (Anchor::End, true) => format!("(?s)^(.*?)(?:{fragment})$"),
            (Anchor::End, false) => format!("(?s)^(.*)(?:{fragment})$"),
        }
    }
}

impl RegexBased for DeletePart {
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
        let fragment = glob::translate(groups.text(2), self.greedy);
        let re = ctx.compile_pattern(&self.specialize(&fragment))?;
        let rest = match re.captures(&value).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().to_string(),
            None => value,
        };
        Ok(Some(Value::String(rest)))
    }
}

const WORD: &str = r"(?:\\/|[^/])*";

/// `name/glob/replacement` (first match) or `name//glob/replacement` (all).
///
/// In the replacement `\N` inserts capture group N and `\x` is a literal `x`.
#[derive(Debug)]
pub struct Replace {
    pattern: RegexPattern,
}

impl Replace {
    pub fn new() -> Self {
        Self {
            pattern: RegexPattern::new(format!("^({WORD})(//?)({WORD})/({WORD})$")),
        }
    }
}

impl Default for Replace {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite a `\N`-style replacement into the regex crate's `${N}` syntax.
fn replacement_template(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(d) if d.is_ascii_digit() => {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                Some('$') => out.push_str("$$"),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out
}

impl RegexBased for Replace {
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
        let mut raw = groups.text(3).to_string();
        glob::de_escape('/', &mut raw);
        let re = ctx.compile_pattern(&glob::translate(&raw, true))?;
        let replacement = replacement_template(groups.text(4));
        let replaced = if groups.text(2) == "//" {
            re.replace_all(&value, replacement.as_str())
        } else {
            re.replace(&value, replacement.as_str())
        };
        Ok(Some(Value::String(replaced.into_owned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::PropertyEvaluator;
    use crate::testing::MapContext;
    use pretty_assertions::assert_eq;

    fn run(op: &dyn PropertyEvaluator, token: &str, value: &str) -> Option<String> {
        let ctx = MapContext::with(&[("p", value)]);
        op.evaluate(token, &ctx).unwrap().map(|v| v.to_string())
    }

    #[test]
    fn delete_from_start() {
        assert_eq!(run(&DeletePart::from_start_greedy(), "p##a*", "aaabc"), Some("".into()));
        assert_eq!(run(&DeletePart::from_start_reluctant(), "p#a*", "aaabc"), Some("aabc".into()));
        assert_eq!(run(&DeletePart::from_start_reluctant(), "p#a*b", "aaabc"), Some("c".into()));
        assert_eq!(run(&DeletePart::from_start_greedy(), "p##?", "xyz"), Some("yz".into()));
    }

    #[test]
    fn delete_from_end() {
        let path = "/usr/local/lib";
        assert_eq!(run(&DeletePart::from_end_reluctant(), "p%/*", path), Some("/usr/local".into()));
        assert_eq!(run(&DeletePart::from_end_greedy(), "p%%/*", path), Some("".into()));
        assert_eq!(run(&DeletePart::from_end_greedy(), "p%%l*", path), Some("/usr/".into()));
    }

    #[test]
    fn no_match_keeps_value() {
        assert_eq!(run(&DeletePart::from_start_greedy(), "p##z*", "abc"), Some("abc".into()));
        assert_eq!(run(&DeletePart::from_end_reluctant(), "p%z", "abc"), Some("abc".into()));
    }

    #[test]
    fn backslash_separator_matches_both_forms() {
        assert_eq!(
            run(&DeletePart::from_start_greedy(), "p##*/", r"C:\work\file.txt"),
            Some("file.txt".into())
        );
    }

    #[test]
    fn unset_property_is_not_applicable() {
        let ctx = MapContext::new();
        assert_eq!(DeletePart::from_end_greedy().evaluate("p%%*", &ctx).unwrap(), None);
        assert_eq!(Replace::new().evaluate("p/a/b", &ctx).unwrap(), None);
    }

    #[test]
    fn replace_first_and_all() {
        assert_eq!(run(&Replace::new(), "p/./-", "a.b.c"), Some("a-b.c".into()));
        assert_eq!(run(&Replace::new(), "p//./-", "a.b.c"), Some("a-b-c".into()));
        assert_eq!(run(&Replace::new(), "p//?/x", "abc"), Some("xxx".into()));
        assert_eq!(run(&Replace::new(), "p/z/x", "abc"), Some("abc".into()));
    }

    #[test]
    fn replace_with_groups_and_escapes() {
        assert_eq!(run(&Replace::new(), r"p/(b*)c/<\1>", "abbc"), Some("a<bb>".into()));
        assert_eq!(run(&Replace::new(), r"p//b/$", "abb"), Some("a$$".into()));
        assert_eq!(run(&Replace::new(), r"p//\//.", "a/b/c"), Some("a.b.c".into()));
    }

    #[test]
    fn replacement_template_rewrites_backrefs() {
        assert_eq!(replacement_template(r"\1-\2"), "${1}-${2}");
        assert_eq!(replacement_template(r"cost: $5 \$"), "cost: $$5 $$");
        assert_eq!(replacement_template(r"a\\b\"), r"a\b\");
    }
}
