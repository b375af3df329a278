#![forbid(unsafe_code)]

//! Notification envelope pairing a value snapshot with its update kind.

/// Why a subscriber is receiving an [`Update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind<D> {
    /// Synthetic first notification: the value as of subscription time.
    Replay,
    /// A committed mutation, with the diff describing what changed.
    Changed(D),
}

/// One notification delivered to a subscriber.
///
/// `value` is always the full state *after* the change described by `kind`
/// (for [`UpdateKind::Replay`] there is no change; the value is simply the
/// state at subscription time). Envelopes are built once per notification
/// and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update<V, D> {
    /// Full state after the described change.
    pub value: V,
    /// Whether this is a replay or a described change.
    pub kind: UpdateKind<D>,
}

impl<V, D> Update<V, D> {
    /// Build a replay envelope carrying the current state.
    #[must_use]
    pub fn replay(value: V) -> Self {
        Self {
            value,
            kind: UpdateKind::Replay,
        }
    }

    /// Build a change envelope carrying the post-mutation state and its diff.
    #[must_use]
    pub fn changed(value: V, diff: D) -> Self {
        Self {
            value,
            kind: UpdateKind::Changed(diff),
        }
    }

    /// Whether this envelope is the subscription replay.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        matches!(self.kind, UpdateKind::Replay)
    }

    /// The diff, if this envelope describes a change.
    #[must_use]
    pub fn diff(&self) -> Option<&D> {
        match &self.kind {
            UpdateKind::Replay => None,
            UpdateKind::Changed(diff) => Some(diff),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
