#![forbid(unsafe_code)]

//! Observable value container that broadcasts diffs to subscribers.
//!
//! # Design
//!
//! [`DiffSubject<V, D>`] wraps a value of type `V` in shared storage
//! (`Arc<Mutex<..>>`). Every committed mutation produces exactly one
//! [`Update`] envelope carrying the post-mutation value and a caller-supplied
//! diff of type `D`. Each new subscriber first receives a replay envelope
//! with the value as of subscription time, then every later change in commit
//! order.
//!
//! Notification fan-out runs with the lock **released**: committed envelopes
//! go into a FIFO queue, and the first thread to find no active dispatcher
//! drains it, re-acquiring the lock only between deliveries. This is a hard
//! contract, not an optimization — holding the lock across fan-out would
//! deadlock any subscriber that mutates the subject from its own callback.
//!
//! # Invariants
//!
//! 1. Mutations are totally ordered by lock acquisition; `version` increments
//!    by exactly 1 per committed mutation.
//! 2. Per subscriber, the delivered sequence is one `Replay` followed by the
//!    `Changed` envelopes of all mutations committed after its subscription,
//!    in commit order, with no gaps and no duplicates.
//! 3. A failed [`try_mutate`](DiffSubject::try_mutate) commits nothing and
//!    delivers nothing.
//! 4. Callbacks run with the lock released, so `current_value`, `mutate`,
//!    `subscribe`, and cancellation are all safe from inside a callback.
//!
//! # Failure Modes
//!
//! - **Mutator panic**: the mutex is poisoned and subsequent calls panic.
//!   Signal failure through [`try_mutate`](DiffSubject::try_mutate) instead.
//! - **Callback captures the subject**: a callback holding a clone of its own
//!   subject keeps the shared state alive until the subscription is
//!   cancelled. Capture a [`Clone`] handle deliberately or cancel explicitly.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::trace;

use crate::update::Update;

const LOCK_MSG: &str = "diff subject lock poisoned";

/// A subscriber callback, shared so fan-out can run without the lock.
type Callback<V, D> = Arc<dyn Fn(&Update<V, D>) + Send + Sync>;

struct Entry<V, D> {
    id: u64,
    /// Sequence number at registration. Changes committed at or before this
    /// point are already reflected in the subscriber's replay envelope.
    joined_seq: u64,
    callback: Callback<V, D>,
}

/// A queued envelope awaiting delivery. `target` is set for replay
/// envelopes, which go to exactly one subscriber.
struct Pending<V, D> {
    seq: u64,
    target: Option<u64>,
    update: Update<V, D>,
}

struct State<V, D> {
    value: V,
    /// Monotonic commit counter. 0 = initial value, no mutations yet.
    seq: u64,
    next_id: u64,
    subscribers: Vec<Entry<V, D>>,
    queue: VecDeque<Pending<V, D>>,
    /// True while some thread is draining the queue. At most one dispatcher
    /// runs at a time, which is what makes delivery order global.
    dispatching: bool,
}

/// A shared, observable value that reports each mutation as a diff.
///
/// Cloning a `DiffSubject` creates a new handle to the **same** inner state —
/// both handles see the same value and share subscribers.
pub struct DiffSubject<V, D> {
    state: Arc<Mutex<State<V, D>>>,
}

impl<V, D> Clone for DiffSubject<V, D> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<V: std::fmt::Debug, D> std::fmt::Debug for DiffSubject<V, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect(LOCK_MSG);
        f.debug_struct("DiffSubject")
            .field("value", &state.value)
            .field("version", &state.seq)
            .field("subscriber_count", &state.subscribers.len())
            .finish()
    }
}

impl<V, D> DiffSubject<V, D>
where
    V: Clone + Send + 'static,
    D: Send + 'static,
{
    /// Create a subject holding `initial`. No subscribers are registered and
    /// the version is 0.
    #[must_use]
    pub fn new(initial: V) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                value: initial,
                seq: 0,
                next_id: 0,
                subscribers: Vec::new(),
                queue: VecDeque::new(),
                dispatching: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<V, D>> {
        self.state.lock().expect(LOCK_MSG)
    }

    /// Get a clone of the latest committed value.
    ///
    /// Takes the lock for the duration of the read, so it never observes a
    /// partially applied mutation. Safe to call from within a subscriber
    /// callback.
    #[must_use]
    pub fn current_value(&self) -> V {
        self.lock().value.clone()
    }

    /// Access the latest committed value by reference without cloning.
    ///
    /// The lock is held while `f` runs; do not call back into the subject
    /// from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.lock().value)
    }

    /// Number of committed mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.lock().seq
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Apply an infallible mutation and broadcast it.
    ///
    /// The mutator receives the current value by mutable reference and
    /// returns the diff describing the edit it made. Exactly one `Changed`
    /// envelope is emitted per call, after the lock is released.
    ///
    /// The lock is held while the mutator runs; do not call back into the
    /// subject from inside it. (Subscriber callbacks have no such
    /// restriction.)
    pub fn mutate(&self, mutator: impl FnOnce(&mut V) -> D) {
        {
            let mut state = self.lock();
            let diff = mutator(&mut state.value);
            state.seq += 1;
            let seq = state.seq;
            let value = state.value.clone();
            trace!(seq, "mutation committed");
            state.queue.push_back(Pending {
                seq,
                target: None,
                update: Update::changed(value, diff),
            });
        }
        self.dispatch();
    }

    /// Apply a fallible mutation and broadcast it on success.
    ///
    /// The mutator runs against a scratch copy of the value; on `Err` the
    /// copy is discarded, nothing is committed, no envelope is emitted, and
    /// the error propagates to the caller. On `Ok` the behavior matches
    /// [`mutate`](Self::mutate).
    pub fn try_mutate<E>(&self, mutator: impl FnOnce(&mut V) -> Result<D, E>) -> Result<(), E> {
        {
            let mut state = self.lock();
            let mut scratch = state.value.clone();
            let diff = mutator(&mut scratch)?;
            state.value = scratch;
            state.seq += 1;
            let seq = state.seq;
            let value = state.value.clone();
            trace!(seq, "mutation committed");
            state.queue.push_back(Pending {
                seq,
                target: None,
                update: Update::changed(value, diff),
            });
        }
        self.dispatch();
        Ok(())
    }

    /// Register a subscriber callback.
    ///
    /// The callback first receives one `Replay` envelope carrying the value
    /// current at subscription time, then every subsequent change in commit
    /// order. Returns a [`Subscription`] handle; cancelling it (or dropping
    /// it) stops future deliveries.
    ///
    /// When no delivery is in progress — in particular, always, for a
    /// single-threaded caller — the replay is delivered before `subscribe`
    /// returns. If another thread is mid-delivery, that thread delivers the
    /// replay, still strictly before any change committed after this call.
    pub fn subscribe(&self, callback: impl Fn(&Update<V, D>) + Send + Sync + 'static) -> Subscription {
        let id;
        {
            let mut state = self.lock();
            id = state.next_id;
            state.next_id += 1;
            let joined_seq = state.seq;
            state.subscribers.push(Entry {
                id,
                joined_seq,
                callback: Arc::new(callback),
            });
            let value = state.value.clone();
            trace!(id, subscribers = state.subscribers.len(), "subscriber registered");
            state.queue.push_back(Pending {
                seq: joined_seq,
                target: Some(id),
                update: Update::replay(value),
            });
        }
        self.dispatch();

        let weak = Arc::downgrade(&self.state);
        Subscription {
            cancel: Some(Box::new(move || cancel_subscriber(&weak, id))),
        }
    }

    /// Drain the pending queue unless another dispatcher is already at it.
    ///
    /// The lock is dropped around each delivery and re-acquired afterwards,
    /// so callbacks may freely re-enter the subject. A re-entrant mutation
    /// lands in the queue and is delivered by the dispatcher further up the
    /// same stack, after the current callback returns.
    fn dispatch(&self) {
        let mut state = self.lock();
        if state.dispatching {
            return;
        }
        state.dispatching = true;
        loop {
            let Some(pending) = state.queue.pop_front() else {
                break;
            };
            // Snapshot the recipients under the lock; cancellations that land
            // after this point no longer recall the delivery.
            let recipients: Vec<Callback<V, D>> = match pending.target {
                Some(id) => state
                    .subscribers
                    .iter()
                    .filter(|e| e.id == id)
                    .map(|e| Arc::clone(&e.callback))
                    .collect(),
                None => state
                    .subscribers
                    .iter()
                    .filter(|e| e.joined_seq < pending.seq)
                    .map(|e| Arc::clone(&e.callback))
                    .collect(),
            };
            drop(state);
            for callback in &recipients {
                callback(&pending.update);
            }
            state = self.lock();
        }
        state.dispatching = false;
    }
}

fn cancel_subscriber<V, D>(state: &Weak<Mutex<State<V, D>>>, id: u64) {
    if let Some(state) = state.upgrade() {
        let mut state = state.lock().expect(LOCK_MSG);
        state.subscribers.retain(|e| e.id != id);
        trace!(id, subscribers = state.subscribers.len(), "subscriber cancelled");
    }
}

/// Cancellation handle for a subscriber registered via
/// [`DiffSubject::subscribe`].
///
/// Hold on to this: dropping it cancels the subscription.
///
/// Cancelling removes the callback from the subscriber registry; envelopes
/// whose fan-out already snapshotted the callback may still arrive, but
/// nothing after that. Dropping the handle cancels as well. Safe to invoke
/// from within the subscriber's own callback.
#[must_use = "dropping the handle cancels the subscription"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Stop future deliveries to this subscriber.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
