#![forbid(unsafe_code)]

//! Property tests: every delivered diff replays onto the previous snapshot
//! to produce exactly the envelope's value, rejected operations are
//! side-effect free, and insert/remove round-trips are identities.

use std::sync::{Arc, Mutex};

use diffcast::{ArrayDiff, ArraySubject, Update};
use proptest::prelude::*;

/// Apply a diff to a shadow copy the way a list-view consumer would.
fn apply(shadow: &mut Vec<i32>, diff: &ArrayDiff<i32>) {
    match diff {
        ArrayDiff::Insert { index, element } => shadow.insert(*index, *element),
        ArrayDiff::Remove { index, .. } => {
            shadow.remove(*index);
        }
        ArrayDiff::Move { from, to, .. } => {
            let element = shadow.remove(*from);
            shadow.insert(*to, element);
        }
        ArrayDiff::Replace { index, new, .. } => shadow[*index] = *new,
    }
}

#[derive(Debug, Clone)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Move(usize, usize),
    Replace(usize, i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..12, any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        (0usize..12).prop_map(Op::Remove),
        (0usize..12, 0usize..12).prop_map(|(f, t)| Op::Move(f, t)),
        (0usize..12, any::<i32>()).prop_map(|(i, v)| Op::Replace(i, v)),
    ]
}

type Log = Arc<Mutex<Vec<Update<Vec<i32>, ArrayDiff<i32>>>>>;

fn recording(initial: Vec<i32>) -> (ArraySubject<i32>, Log, diffcast::Subscription) {
    let subject = ArraySubject::new(initial);
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let sub = subject.subscribe(move |u| sink.lock().unwrap().push(u.clone()));
    (subject, log, sub)
}

proptest! {
    #[test]
    fn diffs_replay_onto_snapshots(
        initial in proptest::collection::vec(any::<i32>(), 0..8),
        ops in proptest::collection::vec(op_strategy(), 0..32),
    ) {
        let (subject, log, _sub) = recording(initial);

        for op in &ops {
            let before = subject.current_value();
            let result = match *op {
                Op::Insert(index, value) => subject.insert(value, index),
                Op::Remove(index) => subject.remove_at(index),
                Op::Move(from, to) => subject.move_item(from, to),
                Op::Replace(index, value) => subject.replace_at(index, value),
            };
            if result.is_err() {
                // A rejected operation leaves the value untouched.
                prop_assert_eq!(subject.current_value(), before);
            }
        }

        let log = log.lock().unwrap();
        prop_assert!(log[0].is_replay());
        let mut shadow = log[0].value.clone();
        for update in log.iter().skip(1) {
            let diff = update.diff().expect("only the first envelope is a replay");
            apply(&mut shadow, diff);
            prop_assert_eq!(&shadow, &update.value);
        }
        prop_assert_eq!(shadow, subject.current_value());
    }

    #[test]
    fn insert_then_remove_is_identity(
        initial in proptest::collection::vec(any::<i32>(), 0..8),
        element in any::<i32>(),
        index_seed in any::<usize>(),
    ) {
        let index = index_seed % (initial.len() + 1);
        let (subject, log, _sub) = recording(initial.clone());

        subject.insert(element, index).unwrap();
        subject.remove_at(index).unwrap();

        prop_assert_eq!(subject.current_value(), initial);
        let log = log.lock().unwrap();
        prop_assert_eq!(log.len(), 3);
        prop_assert_eq!(log[1].diff(), Some(&ArrayDiff::Insert { index, element }));
        prop_assert_eq!(log[2].diff(), Some(&ArrayDiff::Remove { index, element }));
    }

    #[test]
    fn out_of_bounds_never_notifies(
        initial in proptest::collection::vec(any::<i32>(), 0..5),
        index_past_end in 0usize..4,
    ) {
        let (subject, log, _sub) = recording(initial.clone());
        let bad = initial.len() + 1 + index_past_end;

        prop_assert!(subject.insert(0, bad).is_err());
        prop_assert!(subject.remove_at(bad).is_err());
        prop_assert!(subject.replace_at(bad, 0).is_err());
        prop_assert!(subject.move_item(bad, 0).is_err());

        prop_assert_eq!(subject.current_value(), initial);
        prop_assert_eq!(subject.version(), 0);
        prop_assert_eq!(log.lock().unwrap().len(), 1);
    }
}
