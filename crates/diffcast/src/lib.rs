#![forbid(unsafe_code)]

//! Thread-safe observable values that broadcast structural diffs.
//!
//! A [`DiffSubject<V, D>`] holds a value of type `V`. Every mutation goes
//! through the subject, describes itself as a diff of type `D`, and is
//! broadcast to all subscribers as an [`Update`] envelope carrying the full
//! post-mutation value alongside the diff. New subscribers synchronously
//! receive a replay of the current value before any live updates, so a
//! consumer (a list view, say) can render once from the replay and then
//! apply each diff incrementally — animated insertions instead of full
//! re-renders.
//!
//! For vector-shaped values, [`ArraySubject`] adds bounds-checked
//! insert/remove/move/replace helpers that produce the matching
//! [`ArrayDiff`] variant.
//!
//! ```
//! use diffcast::{ArrayDiff, ArraySubject, UpdateKind};
//!
//! let roster: ArraySubject<String> = ArraySubject::new(vec!["A".into(), "B".into()]);
//! let sub = roster.subscribe(|update| match &update.kind {
//!     UpdateKind::Replay => println!("initial: {:?}", update.value),
//!     UpdateKind::Changed(ArrayDiff::Insert { index, element }) => {
//!         println!("animate {element} into row {index}");
//!     }
//!     UpdateKind::Changed(diff) => println!("apply {diff:?}"),
//! });
//!
//! roster.insert("C".into(), 1)?;
//! assert_eq!(roster.current_value(), vec!["A", "C", "B"]);
//! sub.cancel();
//! # Ok::<(), diffcast::BoundsError>(())
//! ```

pub mod array;
pub mod subject;
pub mod update;

pub use array::{ArrayDiff, ArraySubject, BoundsError, BoundsOp};
pub use subject::{DiffSubject, Subscription};
pub use update::{Update, UpdateKind};
