use tracing::error;
use url::Url;

use crate::context::EvaluationContext;
use crate::errors::Result;
use crate::prefixed::{PrefixPattern, PrefixedEvaluator, StaticPrefix};
use crate::value::Value;

pub const DEFAULT_PREFIX: &str = "encodeURL";

/// `encodeURL:<url>` returns the URL in percent-encoded ASCII form.
#[derive(Debug)]
pub struct EncodeUrlEvaluator {
    prefix: StaticPrefix,
}

impl EncodeUrlEvaluator {
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

impl Default for EncodeUrlEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixedEvaluator for EncodeUrlEvaluator {
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
        _ctx: &dyn EvaluationContext,
    ) -> Result<Option<Value>> {
        match Url::parse(property) {
            Ok(url) => Ok(Some(Value::String(url.as_str().to_string()))),
            Err(e) => {
                error!(text = property, error = %e, "cannot encode URL text; aborting");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::PropertyEvaluator;
    use crate::testing::MapContext;
    use pretty_assertions::assert_eq;

    fn encode(token: &str) -> Option<String> {
        EncodeUrlEvaluator::new()
            .evaluate(token, &MapContext::new())
            .unwrap()
            .map(|v| v.to_string())
    }

    #[test]
    fn encodes_path_and_query() {
        assert_eq!(
            encode("encodeURL:http://example.com/a dir/file?q=x y#top"),
            Some("http://example.com/a%20dir/file?q=x%20y#top".into())
        );
    }

    #[test]
    fn non_url_text_is_not_applicable() {
        assert_eq!(encode("encodeURL:not a url"), None);
        assert_eq!(encode("other:http://example.com/"), None);
    }
}
