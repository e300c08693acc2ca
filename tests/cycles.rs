use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use property_expressions::{
    standard_chain, EvalError, EvaluationContext, EvaluatorChain, GuardScope, PropertyEvaluator,
    PropertyStore, Result, Value,
};

fn standard_store() -> PropertyStore {
    PropertyStore::new(Arc::new(standard_chain().unwrap()))
}

/// Answers every token by looking the same token up again.
#[derive(Debug)]
struct LookupSelf;

impl PropertyEvaluator for LookupSelf {
    fn evaluate(&self, token: &str, ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
        Ok(ctx.lookup_property(token)?.map(Value::from))
    }
}

/// Pushes a frame it never pops.
#[derive(Debug)]
struct Leaky(GuardScope);

impl PropertyEvaluator for Leaky {
    fn evaluate(&self, token: &str, ctx: &dyn EvaluationContext) -> Result<Option<Value>> {
        ctx.cycle_guard().push(self.0, token);
        Ok(None)
    }
}

#[test]
fn test_default_referring_to_itself_terminates() {
    let store = standard_store();
    store.set_property("t", "${t:-d}");
    assert_eq!(
        store.resolve("t:-d").unwrap(),
        Some(Value::from("${t:-d}"))
    );
}

#[test]
fn test_self_referencing_set_default_leaves_store_alone() {
    let store = standard_store();
    store.set_property("a", "${a:=z}");
    assert_eq!(store.expand("${a}").unwrap(), "${a:=z}");
    assert_eq!(store.property("a").as_deref(), Some("${a:=z}"));
}

#[test]
fn test_self_referencing_default_agrees_across_entry_points() {
    let store = standard_store();
    store.set_property("t", "${t:-d}");
    assert_eq!(store.expand("${t}").unwrap(), "${t:-d}");
    assert_eq!(store.expand("${t:-d}").unwrap(), "${t:-d}");
}

#[test]
fn test_self_referencing_require_does_not_fail() {
    let store = standard_store();
    store.set_property("r", "${r:?must be set}");
    assert_eq!(store.expand("${r}").unwrap(), "${r:?must be set}");
    store.set_property("flag", "${isset(property=flag)}");
    assert_eq!(store.expand("${flag}").unwrap(), "true");
}

#[test]
fn test_mutual_references_terminate() {
    let store = standard_store();
    store.set_property("a", "${b}");
    store.set_property("b", "${a}");
    assert_eq!(store.expand("${a}").unwrap(), "${a}");
    assert_eq!(store.expand("${b}").unwrap(), "${b}");
}

#[test]
fn test_reentrant_strategy_declines() {
    let store = PropertyStore::new(Arc::new(EvaluatorChain::new(vec![Arc::new(LookupSelf)])));
    let session = store.session();
    assert_eq!(session.resolve("anything").unwrap(), None);
    assert!(session.cycle_guard().is_empty());
}

#[test]
fn test_guard_is_balanced_after_errors() {
    let store = standard_store();
    let session = store.session();
    assert!(session.expand("${x:?}").is_err());
    assert!(session.cycle_guard().is_empty());
    assert_eq!(session.expand("${x:-ok}").unwrap(), "ok");
}

#[test]
fn test_strict_chain_reports_imbalance() {
    let chain = EvaluatorChain::strict(vec![Arc::new(Leaky(GuardScope::new()))]);
    let store = PropertyStore::new(Arc::new(chain));
    let err = store.resolve("token").unwrap_err();
    assert!(matches!(err, EvalError::InternalConsistency(_)));
}

#[test]
fn test_lenient_chain_tolerates_imbalance() {
    let chain = EvaluatorChain::new(vec![Arc::new(Leaky(GuardScope::new()))]);
    let store = PropertyStore::new(Arc::new(chain));
    let session = store.session();
    assert_eq!(session.resolve("token").unwrap(), None);
    // only the stray frame is left behind
    assert_eq!(session.cycle_guard().depth(), 1);
}

#[test]
fn test_concurrent_resolutions_do_not_share_guards() {
    let store = Arc::new(standard_store());
    store.set_property("base", "/srv");
    store.set_property("dir", "${base}/app");
    store.set_property("loop", "${loop:-x}");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..200)
                    .map(|_| {
                        (
                            store.expand("${dir##*/}:${dir}").unwrap(),
                            store.resolve("loop:-x").unwrap(),
                        )
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for (text, looped) in handle.join().unwrap() {
            assert_eq!(text, "app:/srv/app");
            assert_eq!(looped, Some(Value::from("${loop:-x}")));
        }
    }
}
