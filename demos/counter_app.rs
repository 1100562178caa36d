//! Complete counter application demonstrating all features together

use serde_json::{json, Value};
use tincan_setup::{arg, create_effect, define_setup_store, Error, Store};

fn add(store: &Store, by: i64) -> tincan_setup::Result<Value> {
    store.update("count", |count| {
        *count = json!(count.as_i64().unwrap_or(0) + by);
        count.clone()
    })?;
    store.update("history", |history| {
        if let Some(history) = history.as_array_mut() {
            history.push(json!(by));
        }
    })?;
    Ok(Value::Null)
}

fn main() -> Result<(), Error> {
    println!("=== Complete Counter Application ===\n");

    println!("1. Declaring the counter store");
    let counter = define_setup_store("counter", |setup| {
        setup.declare_state("count", 0)?;
        setup.declare_state("step", 1)?;
        setup.declare_state("history", json!([]))?;

        setup.declare_getter("doubled", |state| {
            json!(state.get_i64("count").unwrap_or(0) * 2)
        })?;
        setup.declare_getter("changes", |state| {
            json!(state.with("history", |h| h.as_array().map_or(0, Vec::len)))
        })?;

        setup.declare_action("increment", |store: &Store| {
            let store = store.clone();
            move |_args: &[Value]| {
                let step = store.state().get_i64("step").unwrap_or(1);
                add(&store, step)
            }
        })?;
        setup.declare_action("decrement", |store: &Store| {
            let store = store.clone();
            move |_args: &[Value]| {
                let step = store.state().get_i64("step").unwrap_or(1);
                add(&store, -step)
            }
        })?;
        setup.declare_action("set_step", |store: &Store| {
            let store = store.clone();
            move |args: &[Value]| {
                store.set("step", arg(args, 0)?.clone())?;
                Ok(Value::Null)
            }
        })?;
        setup.declare_action("double", |store: &Store| {
            let store = store.clone();
            move |_args: &[Value]| {
                let count = store.get("count").unwrap_or(Value::Null);
                store.dispatch("set_step", &[count])?;
                store.dispatch("increment", &[])
            }
        })
    })?;

    let store = counter.get_store()?;

    println!("\n2. Logging actions and state changes");
    store.on_action(|call| println!("   [Action] {}({:?})", call.name, call.args));
    store.subscribe(|mutation| println!("   [State] {:?} {:?}", mutation.kind, mutation.keys));

    let _effect = create_effect({
        let store = store.clone();
        move || {
            println!(
                "   [Effect] doubled = {}",
                store.getter("doubled").unwrap_or(Value::Null)
            );
        }
    });

    println!("\n3. Dispatching actions");
    store.dispatch("increment", &[])?;
    store.dispatch("increment", &[])?;
    store.dispatch("set_step", &[json!(5)])?;
    store.dispatch("decrement", &[])?;
    store.dispatch("double", &[])?;

    println!("\n4. Unknown actions are reported");
    if let Err(err) = store.dispatch("explode", &[]) {
        println!("   {err}");
    }

    println!("\n5. Final state");
    println!("   {:?}", store.snapshot());
    println!("   changes recorded: {:?}", store.getter("changes"));

    store.reset();
    println!("\n6. After reset: {:?}", store.snapshot());

    store.dispose();
    Ok(())
}
