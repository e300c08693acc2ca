use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::context::EvaluationContext;
use crate::errors::Result;
use crate::value::ObjectRef;

type StringArgFn = dyn Fn(&str) -> Result<ObjectRef> + Send + Sync;
type ContextArgFn = dyn Fn(&dyn EvaluationContext, &str) -> Result<ObjectRef> + Send + Sync;

/// The single constructor signature a type is registered with.
#[derive(Clone)]
pub enum Factory {
    StringArg(Arc<StringArgFn>),
    ContextAndString(Arc<ContextArgFn>),
}

/// A named, constructible type.
#[derive(Clone)]
pub struct TypeDefinition {
    name: String,
    factory: Factory,
}

impl TypeDefinition {
    pub fn string_arg<F>(name: &str, factory: F) -> Self
    where
        F: Fn(&str) -> Result<ObjectRef> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            factory: Factory::StringArg(Arc::new(factory)),
        }
    }

    pub fn context_and_string<F>(name: &str, factory: F) -> Self
    where
        F: Fn(&dyn EvaluationContext, &str) -> Result<ObjectRef> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            factory: Factory::ContextAndString(Arc::new(factory)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn construct(&self, ctx: &dyn EvaluationContext, arg: &str) -> Result<ObjectRef> {
        match &self.factory {
            Factory::StringArg(f) => f(arg),
            Factory::ContextAndString(f) => f(ctx, arg),
        }
    }
}

impl fmt::Debug for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.factory {
            Factory::StringArg(_) => "string",
            Factory::ContextAndString(_) => "context+string",
        };
        f.debug_struct("TypeDefinition")
            .field("name", &self.name)
            .field("factory", &kind)
            .finish()
    }
}

/// Thread-safe type registry.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    inner: Arc<HashMap<String, TypeDefinition>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(TypeDefinition::string_arg("url", builtins::url));
        reg.register(TypeDefinition::string_arg("path", builtins::path));
        reg.register(TypeDefinition::context_and_string("regex", builtins::regex));
        reg
    }

    /// Register a type, replacing any earlier definition of the same name.
    pub fn register(&mut self, def: TypeDefinition) {
        Arc::make_mut(&mut self.inner).insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<TypeDefinition> {
        self.inner.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.inner.keys().map(String::as_str).sorted().collect()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// A boolean test configured through string attributes.
pub trait Condition: Send {
    fn set_attribute(&mut self, name: &str, value: &str) -> Result<()>;
    fn eval(&self, ctx: &dyn EvaluationContext) -> Result<bool>;
}

type ConditionFactory = Arc<dyn Fn() -> Box<dyn Condition> + Send + Sync>;

/// Thread-safe condition registry.
#[derive(Clone, Default)]
pub struct ConditionRegistry {
    inner: Arc<HashMap<String, ConditionFactory>>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register("equals", || Box::new(builtins::Equals::default()));
        reg.register("istrue", || Box::new(builtins::IsTrue::default()));
        reg.register("isfalse", || Box::new(builtins::IsFalse::default()));
        reg.register("isset", || Box::new(builtins::IsSet::default()));
        reg.register("contains", || Box::new(builtins::Contains::default()));
        reg.register("matches", || Box::new(builtins::Matches::default()));
        reg
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Condition> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.inner).insert(name.to_string(), Arc::new(factory));
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Condition>> {
        self.inner.get(name).map(|factory| factory())
    }

    pub fn names(&self) -> Vec<&str> {
        self.inner.keys().map(String::as_str).sorted().collect()
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

pub mod builtins {
    use std::path::PathBuf;

    use super::*;
    use crate::errors::EvalError;

    pub fn url(arg: &str) -> Result<ObjectRef> {
        let url = url::Url::parse(arg)
            .map_err(|e| EvalError::failure(format!("invalid url `{arg}`: {e}")))?;
        let label = url.as_str().to_string();
        Ok(ObjectRef::new(url, label))
    }

    pub fn path(arg: &str) -> Result<ObjectRef> {
        Ok(ObjectRef::new(PathBuf::from(arg), arg))
    }

    pub fn regex(ctx: &dyn EvaluationContext, arg: &str) -> Result<ObjectRef> {
        let re = ctx.compile_pattern(arg)?;
        Ok(ObjectRef::new(re, arg))
    }

    /// `on`, `true` and `yes` (any case) are true; everything else is false.
    pub fn to_boolean(value: &str) -> bool {
        matches!(value.to_ascii_lowercase().as_str(), "on" | "true" | "yes")
    }

    fn unsupported(condition: &str, attribute: &str) -> EvalError {
        EvalError::failure(format!(
            "{condition} doesn't support the \"{attribute}\" attribute."
        ))
    }

    #[derive(Debug)]
    pub struct Equals {
        arg1: Option<String>,
        arg2: Option<String>,
        case_sensitive: bool,
        trim: bool,
    }

    impl Default for Equals {
        fn default() -> Self {
            Self {
                arg1: None,
                arg2: None,
                case_sensitive: true,
                trim: false,
            }
        }
    }

    impl Condition for Equals {
        fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
            match name.to_ascii_lowercase().as_str() {
                "arg1" => self.arg1 = Some(value.to_string()),
                "arg2" => self.arg2 = Some(value.to_string()),
                "casesensitive" => self.case_sensitive = to_boolean(value),
                "trim" => self.trim = to_boolean(value),
                _ => return Err(unsupported("equals", name)),
            }
            Ok(())
        }

        fn eval(&self, _ctx: &dyn EvaluationContext) -> Result<bool> {
            let (Some(a), Some(b)) = (&self.arg1, &self.arg2) else {
                return Err(EvalError::failure("both arg1 and arg2 are required in equals"));
            };
            let (a, b) = if self.trim { (a.trim(), b.trim()) } else { (a.as_str(), b.as_str()) };
            Ok(if self.case_sensitive {
                a == b
            } else {
                a.to_lowercase() == b.to_lowercase()
            })
        }
    }

    #[derive(Debug, Default)]
    pub struct IsTrue {
        value: Option<String>,
    }

    impl Condition for IsTrue {
        fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
            match name.to_ascii_lowercase().as_str() {
                "value" => self.value = Some(value.to_string()),
                _ => return Err(unsupported("istrue", name)),
            }
            Ok(())
        }

        fn eval(&self, _ctx: &dyn EvaluationContext) -> Result<bool> {
            self.value
                .as_deref()
                .map(to_boolean)
                .ok_or_else(|| EvalError::failure("Nothing to test for truth"))
        }
    }

    #[derive(Debug, Default)]
    pub struct IsFalse {
        value: Option<String>,
    }

    impl Condition for IsFalse {
        fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
            match name.to_ascii_lowercase().as_str() {
                "value" => self.value = Some(value.to_string()),
                _ => return Err(unsupported("isfalse", name)),
            }
            Ok(())
        }

        fn eval(&self, _ctx: &dyn EvaluationContext) -> Result<bool> {
            self.value
                .as_deref()
                .map(|v| !to_boolean(v))
                .ok_or_else(|| EvalError::failure("Nothing to test for falsehood"))
        }
    }

    #[derive(Debug, Default)]
    pub struct IsSet {
        property: Option<String>,
    }

    impl Condition for IsSet {
        fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
            match name.to_ascii_lowercase().as_str() {
                "property" => self.property = Some(value.to_string()),
                _ => return Err(unsupported("isset", name)),
            }
            Ok(())
        }

        fn eval(&self, ctx: &dyn EvaluationContext) -> Result<bool> {
            let name = self
                .property
                .as_deref()
                .ok_or_else(|| EvalError::failure("No property specified for isset condition"))?;
            Ok(ctx.is_in_flight(name) || ctx.lookup_property(name)?.is_some())
        }
    }

    #[derive(Debug)]
    pub struct Contains {
        string: Option<String>,
        substring: Option<String>,
        case_sensitive: bool,
    }

    impl Default for Contains {
        fn default() -> Self {
            Self {
                string: None,
                substring: None,
                case_sensitive: true,
            }
        }
    }

    impl Condition for Contains {
        fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
            match name.to_ascii_lowercase().as_str() {
                "string" => self.string = Some(value.to_string()),
                "substring" => self.substring = Some(value.to_string()),
                "casesensitive" => self.case_sensitive = to_boolean(value),
                _ => return Err(unsupported("contains", name)),
            }
            Ok(())
        }

        fn eval(&self, _ctx: &dyn EvaluationContext) -> Result<bool> {
            let (Some(s), Some(sub)) = (&self.string, &self.substring) else {
                return Err(EvalError::failure(
                    "both string and substring are required in contains",
                ));
            };
            Ok(if self.case_sensitive {
                s.contains(sub.as_str())
            } else {
                s.to_lowercase().contains(&sub.to_lowercase())
            })
        }
    }

    #[derive(Debug)]
    pub struct Matches {
        string: Option<String>,
        pattern: Option<String>,
        case_sensitive: bool,
    }

    impl Default for Matches {
        fn default() -> Self {
            Self {
                string: None,
                pattern: None,
                case_sensitive: true,
            }
        }
    }

    impl Condition for Matches {
        fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
            match name.to_ascii_lowercase().as_str() {
                "string" => self.string = Some(value.to_string()),
                "pattern" => self.pattern = Some(value.to_string()),
                "casesensitive" => self.case_sensitive = to_boolean(value),
                _ => return Err(unsupported("matches", name)),
            }
            Ok(())
        }

        fn eval(&self, ctx: &dyn EvaluationContext) -> Result<bool> {
            let s = self
                .string
                .as_deref()
                .ok_or_else(|| EvalError::failure("Parameter string is required in matches."))?;
            let pattern = self
                .pattern
                .as_deref()
                .ok_or_else(|| EvalError::failure("No regular expression specified."))?;
            let source = if self.case_sensitive {
                pattern.to_string()
            } else {
                format!("(?i){pattern}")
            };
            Ok(ctx.compile_pattern(&source)?.is_match(s))
        }
    }
}
