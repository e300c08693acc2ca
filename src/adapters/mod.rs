//! Strategies backed by host collaborators: type construction, conditions,
//! the reference store, and URL encoding.

mod component;
mod condition;
mod encode_url;
mod reference;

pub use component::ComponentTypeEvaluator;
pub use condition::ConditionTypeEvaluator;
pub use encode_url::EncodeUrlEvaluator;
pub use reference::ReferenceResolvingEvaluator;
