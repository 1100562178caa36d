//! Integration tests for Tincan Setup

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tincan_setup::{
    arg, assemble, bind, create_effect, define_setup_store, Error, Registry, SetupStore, Store,
};

fn add_to_count(store: &Store, by: i64) -> tincan_setup::Result<Value> {
    store.update("count", |count| {
        *count = json!(count.as_i64().unwrap_or(0) + by);
        count.clone()
    })
}

fn counter_registry() -> Registry {
    let mut registry = Registry::new("counter");
    registry.declare_state("count", 0).unwrap();
    registry
        .declare_getter("doubledCount", |state| json!(state.get_i64("count").unwrap_or(0) * 2))
        .unwrap();
    registry
        .declare_action("increment", |store: &Store| {
            let store = store.clone();
            move |args: &[Value]| {
                let by = arg(args, 0)?
                    .as_i64()
                    .ok_or_else(|| Error::action("increment expects an integer"))?;
                add_to_count(&store, by)
            }
        })
        .unwrap();
    registry
        .declare_action("double", |store: &Store| {
            let store = store.clone();
            move |_args: &[Value]| {
                let count = store.get("count").unwrap_or(Value::Null);
                store.dispatch("increment", &[count])
            }
        })
        .unwrap();
    registry
}

#[test]
fn declared_state_matches_initial_values() {
    let store = define_setup_store("profile", |setup| {
        setup.declare_state("name", "ada")?;
        setup.declare_state("age", 36)?;
        setup.declare_state("tags", json!(["math", "engines"]))?;
        setup.declare_state("address", json!({ "city": "London" }))?;
        setup.declare_state("nickname", Value::Null)?;
        Ok(())
    })
    .unwrap()
    .get_store()
    .unwrap();

    assert_eq!(store.get("name"), Some(json!("ada")));
    assert_eq!(store.get("age"), Some(json!(36)));
    assert_eq!(store.get("tags"), Some(json!(["math", "engines"])));
    assert_eq!(store.get("address"), Some(json!({ "city": "London" })));
    assert_eq!(store.get("nickname"), Some(Value::Null));
    assert_eq!(store.snapshot().len(), 5);
}

#[test]
fn duplicate_names_are_rejected_at_declaration() {
    let mut setup = SetupStore::new("dupes");
    setup.state("value", 1).unwrap();

    let err = setup
        .action("value", |_store: &Store| |_args: &[Value]| Ok(Value::Null))
        .unwrap_err();
    assert!(matches!(err, Error::NameCollision { ref name, .. } if name == "value"));
    assert_eq!(setup.registry().len(), 1);

    let store = setup.get_store().unwrap();
    assert_eq!(store.get("value"), Some(json!(1)));
    assert!(store.action_names().is_empty());
}

#[test]
fn arguments_are_forwarded_in_order_once_per_call() {
    let calls: Arc<Mutex<Vec<Vec<Value>>>> = Arc::new(Mutex::new(Vec::new()));

    let mut setup = SetupStore::new("recorder");
    let log = Arc::clone(&calls);
    setup
        .action("record", move |_store: &Store| {
            let log = Arc::clone(&log);
            move |args: &[Value]| {
                log.lock().push(args.to_vec());
                Ok(json!(args.len()))
            }
        })
        .unwrap();

    let store = setup.get_store().unwrap();
    assert_eq!(
        store.dispatch("record", &[json!(1), json!("two"), json!([3])]).unwrap(),
        json!(3)
    );
    assert_eq!(store.dispatch("record", &[]).unwrap(), json!(0));

    let calls = calls.lock();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], vec![json!(1), json!("two"), json!([3])]);
    assert!(calls[1].is_empty());
}

#[test]
fn cross_action_calls_resolve_after_binding() {
    let registry = counter_registry();
    let store = assemble(&registry);
    bind(&registry, &store).unwrap();

    store.dispatch("double", &[]).unwrap();
    assert_eq!(store.get("count"), Some(json!(0)));

    store.dispatch("increment", &[json!(5)]).unwrap();
    assert_eq!(store.get("count"), Some(json!(5)));

    store.dispatch("double", &[]).unwrap();
    assert_eq!(store.get("count"), Some(json!(10)));
}

#[test]
fn undeclared_action_is_an_error() {
    let registry = counter_registry();
    let store = assemble(&registry);
    bind(&registry, &store).unwrap();

    let err = store.dispatch("reset", &[]).unwrap_err();
    assert!(matches!(err, Error::UnboundAction { ref name, .. } if name == "reset"));
    assert_eq!(store.get("count"), Some(json!(0)));
}

#[test]
fn second_bind_fails_and_first_keeps_working() {
    let registry = counter_registry();
    let store = assemble(&registry);
    let bound = bind(&registry, &store).unwrap();

    let err = bind(&registry, &store).unwrap_err();
    assert!(matches!(err, Error::AlreadyBound { .. }));

    bound.dispatch("increment", &[json!(2)]).unwrap();
    store.dispatch("double", &[]).unwrap();
    assert_eq!(store.get("count"), Some(json!(4)));
}

#[test]
fn getters_follow_action_updates() {
    let registry = counter_registry();
    let store = assemble(&registry);
    bind(&registry, &store).unwrap();

    assert_eq!(store.getter("doubledCount"), Some(json!(0)));
    store.dispatch("increment", &[json!(3)]).unwrap();
    assert_eq!(store.getter("doubledCount"), Some(json!(6)));
    store.dispatch("double", &[]).unwrap();
    assert_eq!(store.getter("doubledCount"), Some(json!(12)));
}

#[test]
fn action_errors_reach_the_caller() {
    let registry = counter_registry();
    let store = assemble(&registry);
    bind(&registry, &store).unwrap();

    let err = store.dispatch("increment", &[]).unwrap_err();
    assert!(matches!(err, Error::MissingArgument { index: 0 }));

    let err = store.dispatch("increment", &[json!("five")]).unwrap_err();
    assert!(matches!(err, Error::Action(_)));
    assert_eq!(store.get("count"), Some(json!(0)));
}

#[test]
fn listeners_see_nested_dispatches() {
    let registry = counter_registry();
    let store = assemble(&registry);
    bind(&registry, &store).unwrap();

    let names = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&names);
    store.on_action(move |call| sink.lock().push(call.name.to_string()));

    store.dispatch("increment", &[json!(1)]).unwrap();
    store.dispatch("double", &[]).unwrap();

    assert_eq!(*names.lock(), vec!["increment", "double", "increment"]);
}

#[test]
fn effect_reruns_when_action_changes_getter() {
    let registry = counter_registry();
    let store = assemble(&registry);
    bind(&registry, &store).unwrap();

    let runs = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(Mutex::new(Value::Null));
    let _effect = create_effect({
        let store = store.clone();
        let runs = Arc::clone(&runs);
        let last = Arc::clone(&last);
        move || {
            *last.lock() = store.getter("doubledCount").unwrap_or(Value::Null);
            runs.fetch_add(1, Ordering::SeqCst);
        }
    });

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(*last.lock(), json!(0));

    store.dispatch("increment", &[json!(7)]).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(*last.lock(), json!(14));
}

#[test]
fn disposed_store_stops_dispatching() {
    let setup = define_setup_store("disposable", |setup| {
        setup.declare_state("count", 1)?;
        setup.declare_action("bump", |store: &Store| {
            let store = store.clone();
            move |_args: &[Value]| add_to_count(&store, 1)
        })
    })
    .unwrap();

    let store = setup.get_store().unwrap();
    store.dispatch("bump", &[]).unwrap();
    store.dispose();

    assert!(matches!(
        store.dispatch("bump", &[]).unwrap_err(),
        Error::Disposed { .. }
    ));
    assert_eq!(store.get("count"), Some(json!(2)));
}
