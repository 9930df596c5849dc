//! Property tests for resolution order and diamond sharing.

mod common;

use common::{int, setup};
use lodestar_loader::{Factory, Loader, Value};
use proptest::prelude::*;
use proptest::sample::Index;
use std::sync::{Arc, Mutex};

/// Per-module dependency picks plus a definition order.
fn graphs() -> impl Strategy<Value = (Vec<Vec<Index>>, Vec<usize>)> {
    (1usize..8).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(any::<Index>(), 0..4), n),
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
        )
    })
}

fn id(index: usize) -> String {
    format!("module-{index}")
}

type Received = Arc<Mutex<Vec<(usize, Vec<Option<i32>>)>>>;

fn define_recorded(loader: &Loader, index: usize, deps: &[usize], received: &Received) {
    let received = Arc::clone(received);
    let names: Vec<String> = deps.iter().map(|&dep| id(dep)).collect();
    loader
        .define(
            id(index),
            names,
            Factory::call(move |args| {
                let args = args.iter().map(int).collect();
                received.lock().expect("lock").push((index, args));
                Value::new(i32::try_from(index).expect("small index"))
            }),
        )
        .expect("valid definition");
}

proptest! {
    /// Every module of an acyclic graph fires exactly once, whatever order it
    /// is defined in, and sees its dependencies in declared order.
    #[test]
    fn acyclic_graphs_fire_once_in_declared_order((picks, order) in graphs()) {
        let (_document, loader) = setup();
        let received: Received = Arc::default();

        // Module i may only depend on modules before it.
        let deps: Vec<Vec<usize>> = picks
            .iter()
            .enumerate()
            .map(|(i, picks)| if i == 0 { Vec::new() } else { picks.iter().map(|p| p.index(i)).collect() })
            .collect();

        for &index in &order {
            define_recorded(&loader, index, &deps[index], &received);
        }

        let received = received.lock().expect("lock");
        prop_assert_eq!(received.len(), deps.len());
        prop_assert_eq!(loader.pending_count(), 0);

        for (index, args) in received.iter() {
            let expected: Vec<Option<i32>> = deps[*index]
                .iter()
                .map(|&dep| i32::try_from(dep).ok())
                .collect();
            prop_assert_eq!(args, &expected);
        }

        let mut fired: Vec<usize> = received.iter().map(|(index, _)| *index).collect();
        fired.sort_unstable();
        fired.dedup();
        prop_assert_eq!(fired.len(), deps.len());
    }

    /// Any number of dependents on one late id all fire once with the same value.
    #[test]
    fn diamond_dependents_share_one_value(dependents in 1usize..12) {
        let (_document, loader) = setup();
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();

        for n in 0..dependents {
            let seen = Arc::clone(&seen);
            loader
                .define(format!("dependent-{n}"), ["late"], Factory::call(move |mut args| {
                    seen.lock().expect("lock").push(args.remove(0));
                    Value::undefined()
                }))
                .expect("valid definition");
        }
        prop_assert_eq!(loader.pending_count(), dependents);

        loader.define("late", (), Factory::value(String::from("late"))).expect("define late");

        let seen = seen.lock().expect("lock");
        prop_assert_eq!(seen.len(), dependents);
        let late = loader.get("late").expect("defined");
        prop_assert!(seen.iter().all(|value| value.ptr_eq(&late)));
    }
}
