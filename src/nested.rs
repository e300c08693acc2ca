use tracing::debug;

use crate::context::EvaluationContext;
use crate::errors::Result;

/// Recognizes `${...}` whose body may itself contain references.
///
/// The body is assembled by asking the host to consume one reference at a
/// time (`EvaluationContext::parse_next_nested`); characters the host does
/// not consume are copied verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedExpansionParser;

const OPEN: &str = "${";
const CLOSE: char = '}';

// `None` at the end of input, and also when a host left `pos` out of
// bounds or inside a character.
fn next_char(input: &str, pos: usize) -> Option<char> {
    input.get(pos..).and_then(|rest| rest.chars().next())
}

impl NestedExpansionParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse the property name starting at `*pos`.
    ///
    /// On success `*pos` points just past the closing brace. Without an
    /// opener, or without a matching close, `*pos` is left where it started
    /// and `None` is returned.
    pub fn parse_property_name(
        &self,
        input: &str,
        pos: &mut usize,
        ctx: &dyn EvaluationContext,
    ) -> Result<Option<String>> {
        let start = *pos;
        let Some(rest) = input.get(start..) else {
            return Ok(None);
        };
        // `${` plus at least one more character
        if !rest.starts_with(OPEN) || rest.len() < OPEN.len() + 1 {
            return Ok(None);
        }
        debug!(input, start, "attempting nested property processing");
        *pos = start + OPEN.len();
        let mut name = String::new();
        while let Some(c) = next_char(input, *pos) {
            if c == CLOSE {
                *pos += CLOSE.len_utf8();
                return Ok(Some(name));
            }
            match ctx.parse_next_nested(input, pos)? {
                Some(value) => name.push_str(&value.to_string()),
                None => {
                    // the host may have moved the position without consuming
                    let Some(c) = next_char(input, *pos) else {
                        break;
                    };
                    name.push(c);
                    *pos += c.len_utf8();
                }
            }
        }
        *pos = start;
        Ok(None)
    }
}
