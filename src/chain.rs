use std::sync::Arc;

use tracing::{debug, trace};

use crate::context::{EvaluationContext, GuardScope};
use crate::errors::Result;
use crate::evaluator::PropertyEvaluator;
use crate::value::Value;

/// How a chain returns its cycle guard frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    /// Drop this chain's latest frame.
    Lenient,
    /// The frame on top must be the one this call pushed; anything else is
    /// an internal consistency error.
    Strict,
}

/// Ordered delegates, first non-`None` answer wins.
///
/// A token already in flight through this chain (on the current context's
/// guard) answers `None` instead of recursing.
#[derive(Debug)]
pub struct EvaluatorChain {
    scope: GuardScope,
    balance: Balance,
    delegates: Vec<Arc<dyn PropertyEvaluator>>,
}

impl EvaluatorChain {
    pub fn new(delegates: Vec<Arc<dyn PropertyEvaluator>>) -> Self {
        Self {
            scope: GuardScope::new(),
            balance: Balance::Lenient,
            delegates,
        }
    }

    pub fn strict(delegates: Vec<Arc<dyn PropertyEvaluator>>) -> Self {
        Self {
            balance: Balance::Strict,
            ..Self::new(delegates)
        }
    }

    pub fn push<E: PropertyEvaluator + 'static>(&mut self, evaluator: E) {
        self.delegates.push(Arc::new(evaluator));
    }

    pub fn delegates(&self) -> &[Arc<dyn PropertyEvaluator>] {
        &self.delegates
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    fn try_delegates(&self, token: &str, ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
        for (idx, delegate) in self.delegates.iter().enumerate() {
            if let Some(value) = delegate.evaluate(token, ctx)? {
                trace!(token, delegate = idx, "resolved");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

impl PropertyEvaluator for EvaluatorChain {
    fn evaluate(&self, token: &str, ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
        let guard = ctx.cycle_guard();
        if guard.contains(self.scope, token) {
            debug!(token, "already resolving; breaking cycle");
            return Ok(None);
        }
        let frame = guard.enter(self.scope, token);
        let result = self.try_delegates(token, ctx);
        match self.balance {
            Balance::Strict => frame.close()?,
            Balance::Lenient => drop(frame),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CycleGuard;
    use crate::errors::EvalError;
    use crate::testing::MapContext;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Fixed(Option<&'static str>, Arc<AtomicUsize>);

    impl PropertyEvaluator for Fixed {
        fn evaluate(&self, _token: &str, _ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.map(Value::from))
        }
    }

    /// Looks the token up again through a shared chain.
    #[derive(Debug)]
    struct Reenter(Arc<std::sync::OnceLock<Arc<EvaluatorChain>>>);

    impl PropertyEvaluator for Reenter {
        fn evaluate(&self, token: &str, ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
            let chain = self.0.get().expect("chain installed");
            let inner = chain.evaluate(token, ctx)?;
            Ok(Some(Value::from(format!("inner={inner:?}"))))
        }
    }

    #[derive(Debug)]
    struct Unbalanced;

    impl PropertyEvaluator for Unbalanced {
        fn evaluate(&self, _token: &str, ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
            ctx.cycle_guard().push(GuardScope::new(), "leaked");
            Ok(Some(Value::from("x")))
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl PropertyEvaluator for Failing {
        fn evaluate(&self, _token: &str, _ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
            Err(EvalError::failure("boom"))
        }
    }

    #[test]
    fn first_answer_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = EvaluatorChain::new(vec![
            Arc::new(Fixed(None, calls.clone())),
            Arc::new(Fixed(Some("second"), calls.clone())),
            Arc::new(Fixed(Some("third"), calls.clone())),
        ]);
        let ctx = MapContext::new();
        assert_eq!(chain.evaluate("t", &ctx).unwrap(), Some(Value::from("second")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(ctx.cycle_guard().is_empty());
    }

    #[test]
    fn reentry_with_same_token_is_not_applicable() {
        let slot = Arc::new(std::sync::OnceLock::new());
        let chain = Arc::new(EvaluatorChain::new(vec![Arc::new(Reenter(slot.clone()))]));
        slot.set(chain.clone()).unwrap();
        let ctx = MapContext::new();
        assert_eq!(
            chain.evaluate("self", &ctx).unwrap(),
            Some(Value::from("inner=None"))
        );
        assert!(ctx.cycle_guard().is_empty());
    }

    #[test]
    fn guard_is_released_on_error() {
        let chain = EvaluatorChain::strict(vec![Arc::new(Failing)]);
        let ctx = MapContext::new();
        assert!(matches!(chain.evaluate("t", &ctx), Err(EvalError::Failure(_))));
        assert!(ctx.cycle_guard().is_empty());
        // and the token can be tried again
        assert!(chain.evaluate("t", &ctx).is_err());
    }

    #[derive(Debug)]
    struct Panicking;

    impl PropertyEvaluator for Panicking {
        fn evaluate(&self, _token: &str, _ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
            panic!("user factory panicked")
        }
    }

    #[test]
    fn guard_is_released_when_a_delegate_panics() {
        for chain in [
            EvaluatorChain::new(vec![Arc::new(Panicking)]),
            EvaluatorChain::strict(vec![Arc::new(Panicking)]),
        ] {
            let ctx = MapContext::new();
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                chain.evaluate("t", &ctx)
            }));
            assert!(outcome.is_err());
            assert!(ctx.cycle_guard().is_empty());
        }
    }

    #[test]
    fn strict_chain_detects_imbalance() {
        let chain = EvaluatorChain::strict(vec![Arc::new(Unbalanced)]);
        let ctx = MapContext::new();
        assert!(matches!(
            chain.evaluate("t", &ctx),
            Err(EvalError::InternalConsistency(_))
        ));
    }

    #[test]
    fn lenient_chain_tolerates_foreign_frames() {
        let chain = EvaluatorChain::new(vec![Arc::new(Unbalanced)]);
        let ctx = MapContext::new();
        assert_eq!(chain.evaluate("t", &ctx).unwrap(), Some(Value::from("x")));
        assert_eq!(ctx.cycle_guard().depth(), 1);
    }

    #[test]
    fn separate_guards_do_not_interfere() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = EvaluatorChain::new(vec![Arc::new(Fixed(Some("v"), calls))]);
        let busy = MapContext::new();
        let other = CycleGuard::new();
        busy.cycle_guard().push(chain.scope, "t");
        assert!(!other.contains(chain.scope, "t"));
        assert_eq!(chain.evaluate("t", &busy).unwrap(), None);
        assert_eq!(chain.evaluate("t", &MapContext::new()).unwrap(), Some(Value::from("v")));
    }
}
