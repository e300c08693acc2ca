use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::{
    ComponentTypeEvaluator, ConditionTypeEvaluator, EncodeUrlEvaluator,
    ReferenceResolvingEvaluator,
};
use crate::chain::EvaluatorChain;
use crate::errors::Result;
use crate::evaluator::PropertyEvaluator;
use crate::logical::LogicalOperationEvaluator;
use crate::prefixed::DEFAULT_DELIMITER;
use crate::stringops;

/// Strategies a chain can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    References,
    EncodeUrl,
    StringOperations,
    Logical,
    Conditions,
    ComponentTypes,
}

fn default_evaluators() -> Vec<EvaluatorKind> {
    vec![
        EvaluatorKind::References,
        EvaluatorKind::EncodeUrl,
        EvaluatorKind::StringOperations,
        EvaluatorKind::Logical,
        EvaluatorKind::Conditions,
        EvaluatorKind::ComponentTypes,
    ]
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// Which strategies to chain, in which order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    #[serde(default = "default_evaluators")]
    pub evaluators: Vec<EvaluatorKind>,

    /// Delimiter of the `ref:` and `encodeURL:` prefixes.
    #[serde(default = "default_delimiter")]
    pub prefix_delimiter: String,

    /// Delimiter between type name and argument for type construction.
    #[serde(default = "default_delimiter")]
    pub component_delimiter: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            evaluators: default_evaluators(),
            prefix_delimiter: default_delimiter(),
            component_delimiter: default_delimiter(),
        }
    }
}

impl ChainConfig {
    pub fn build(&self) -> Result<EvaluatorChain> {
        let delegates = self
            .evaluators
            .iter()
            .map(|kind| self.build_one(*kind))
            .collect::<Result<Vec<_>>>()?;
        Ok(EvaluatorChain::new(delegates))
    }

    fn build_one(&self, kind: EvaluatorKind) -> Result<Arc<dyn PropertyEvaluator>> {
        let evaluator: Arc<dyn PropertyEvaluator> = match kind {
            EvaluatorKind::References => Arc::new(ReferenceResolvingEvaluator::with_delimiter(
                &self.prefix_delimiter,
            )?),
            EvaluatorKind::EncodeUrl => {
                Arc::new(EncodeUrlEvaluator::with_delimiter(&self.prefix_delimiter)?)
            }
            EvaluatorKind::StringOperations => Arc::new(stringops::string_operations()),
            EvaluatorKind::Logical => Arc::new(LogicalOperationEvaluator::new()?),
            EvaluatorKind::Conditions => Arc::new(ConditionTypeEvaluator::new()),
            EvaluatorKind::ComponentTypes => Arc::new(ComponentTypeEvaluator::with_delimiter(
                &self.component_delimiter,
            )?),
        };
        Ok(evaluator)
    }
}

/// Everything a host needs to start resolving: initial properties and the
/// chain layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    #[serde(default)]
    pub chain: ChainConfig,
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EvalError;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_settings_use_defaults() {
        let settings = Settings::from_json_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.chain.evaluators.len(), 6);
        assert_eq!(settings.chain.build().unwrap().delegates().len(), 6);
    }

    #[test]
    fn explicit_order_and_delimiters() {
        let settings = Settings::from_json_str(
            r#"{
                "properties": { "app.name": "demo" },
                "chain": {
                    "evaluators": ["logical", "string_operations"],
                    "prefix_delimiter": "::"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(settings.properties["app.name"], "demo");
        assert_eq!(
            settings.chain.evaluators,
            vec![EvaluatorKind::Logical, EvaluatorKind::StringOperations]
        );
        assert_eq!(settings.chain.prefix_delimiter, "::");
        assert_eq!(settings.chain.component_delimiter, ":");
    }

    #[test]
    fn malformed_settings_are_rejected() {
        assert!(matches!(
            Settings::from_json_str(r#"{"chain": {"evaluators": ["nope"]}}"#),
            Err(EvalError::InvalidSettings(_))
        ));
        assert!(Settings::from_json_str(r#"{"propertys": {}}"#).is_err());
    }

    #[test]
    fn empty_delimiter_fails_to_build() {
        let config = ChainConfig {
            prefix_delimiter: String::new(),
            ..ChainConfig::default()
        };
        assert!(matches!(config.build(), Err(EvalError::Configuration(_))));
    }
}
