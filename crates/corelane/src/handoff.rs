//! One-shot, cross-thread ownership transfer of a single value.
//!
//! A handoff cell holds at most one value through three states: empty, filled,
//! and taken. It is the low-level primitive beneath [`spawn_with`](crate::thread::spawn_with)
//! and the lane's ticket/completion pairing: anywhere a value needs to move from
//! "produced on thread A" to "consumed on thread B" exactly once, with the second
//! thread able to tell the difference between "not yet there" and "already taken".
//!
//! Two usage shapes share the same state machine:
//! - *Cell → token → take*: [`HandoffCell::new`] creates an already-filled cell
//!   and a [`HandoffToken`] to consume it; the consumer calls
//!   [`HandoffToken::take`] exactly once.
//! - *Storage → token.store → take*: the consumer creates an empty
//!   [`HandoffStorage`], hands a [`HandoffToken`] obtained from it into an
//!   escaping closure, the producer calls [`HandoffToken::store`] from inside
//!   that closure, and the consumer later calls [`HandoffStorage::take`] (or
//!   [`take_if_stored`](HandoffStorage::take_if_stored)) after a happens-before
//!   edge such as a channel receive or thread join.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const EMPTY: u8 = 0;
const FILLED: u8 = 1;
const TAKEN: u8 = 2;

struct Inner<T> {
    state: AtomicU8,
    slot: UnsafeCell<Option<T>>,
}

// SAFETY: access to `slot` is gated by the `state` atomic: only the thread that
// wins the EMPTY -> FILLED transition writes it, and only the thread that wins
// the FILLED -> TAKEN transition reads it. The two transitions cannot both
// succeed for the same cell, so there is never concurrent access to the slot.
unsafe impl<T: Send> Send for Inner<T> {}
unsafe impl<T: Send> Sync for Inner<T> {}

impl<T> Inner<T> {
    fn empty() -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(EMPTY),
            slot: UnsafeCell::new(None),
        })
    }

    fn filled(value: T) -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(FILLED),
            slot: UnsafeCell::new(Some(value)),
        })
    }

    fn store(&self, value: T) {
        if self
            .state
            .compare_exchange(EMPTY, FILLED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            panic!("HandoffCell: store called on a cell that already holds a value");
        }
        // SAFETY: we just won the EMPTY -> FILLED transition, so we are the
        // sole writer of `slot` for this cell's lifetime.
        unsafe { *self.slot.get() = Some(value) };
    }

    fn take(&self) -> T {
        self.take_if_stored()
            .expect("HandoffCell: take called on a cell with no value stored, or already taken")
    }

    fn take_if_stored(&self) -> Option<T> {
        if self
            .state
            .compare_exchange(FILLED, TAKEN, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        // SAFETY: we just won the FILLED -> TAKEN transition, so we are the
        // sole reader of `slot`, and the writer happened-before us per the
        // Acquire/AcqRel pairing on `state`.
        unsafe { (*self.slot.get()).take() }
    }

    fn is_taken(&self) -> bool {
        self.state.load(Ordering::Acquire) == TAKEN
    }
}

/// The producer side of a handoff, created already filled by [`HandoffCell::new`].
///
/// Exists as a distinct type from [`HandoffToken`] so a cell's constructor can
/// return "the thing that keeps the slot alive" and "the thing that consumes it"
/// as two values with different roles, even though both simply hold the shared
/// cell state.
#[derive(Clone)]
pub struct HandoffCell<T> {
    inner: Arc<Inner<T>>,
}

/// The consumer- or producer-side handle to a handoff. `Clone`: multiple copies
/// may exist, but at most one [`store`](Self::store) and at most one
/// [`take`](Self::take)/[`take_if_stored`](Self::take_if_stored) across all
/// copies will ever succeed, enforced purely by the shared cell's atomic state.
#[derive(Clone)]
pub struct HandoffToken<T> {
    inner: Arc<Inner<T>>,
}

/// The consumer side of the *storage → token.store → take* usage shape: an
/// empty cell that a producer fills from the far side of a closure boundary.
pub struct HandoffStorage<T> {
    inner: Arc<Inner<T>>,
}

impl<T> HandoffCell<T> {
    /// Creates a filled cell and returns the cell (producer handle) and a
    /// [`HandoffToken`] (consumer handle) that share it.
    pub fn new(value: T) -> (Self, HandoffToken<T>) {
        let inner = Inner::filled(value);
        (
            Self {
                inner: Arc::clone(&inner),
            },
            HandoffToken { inner },
        )
    }

    /// Whether the value has already been taken out of the cell.
    #[must_use]
    pub fn is_taken(&self) -> bool {
        self.inner.is_taken()
    }
}

impl<T> HandoffStorage<T> {
    /// Creates an empty storage slot with no value yet.
    #[must_use]
    pub fn empty() -> Self {
        Self { inner: Inner::empty() }
    }

    /// Returns a [`HandoffToken`] sharing this storage's cell, for handing into
    /// the closure that will eventually call [`HandoffToken::store`].
    #[must_use]
    pub fn token(&self) -> HandoffToken<T> {
        HandoffToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Takes the value out of storage.
    ///
    /// # Panics
    ///
    /// Panics if no value has been stored yet, or if it was already taken.
    /// Callers that cannot guarantee a happens-before edge with the store
    /// should use [`take_if_stored`](Self::take_if_stored) instead.
    pub fn take(&self) -> T {
        self.inner.take()
    }

    /// Takes the value out of storage if one has been stored, tolerating the
    /// not-yet-stored case by returning `None` instead of panicking.
    pub fn take_if_stored(&self) -> Option<T> {
        self.inner.take_if_stored()
    }

    /// Whether the value has already been taken out of storage.
    #[must_use]
    pub fn is_taken(&self) -> bool {
        self.inner.is_taken()
    }
}

impl<T> HandoffToken<T> {
    /// Stores `value` into the cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell already holds a value (from a prior `store` on this
    /// token or a clone of it, or because this token came from
    /// [`HandoffCell::new`], which is created already filled).
    pub fn store(&self, value: T) {
        self.inner.store(value);
    }

    /// Takes the value out of the cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is still empty, or if the value was already taken by
    /// this token or a clone of it. Use [`take_if_stored`](Self::take_if_stored)
    /// when a racing take is possible and should be tolerated.
    pub fn take(&self) -> T {
        self.inner.take()
    }

    /// Takes the value out of the cell if it has been stored, tolerating the
    /// not-yet-filled case by returning `None` instead of panicking.
    ///
    /// Returns `None`, not a second value, when the cell was already taken by
    /// this token or a clone of it.
    pub fn take_if_stored(&self) -> Option<T> {
        self.inner.take_if_stored()
    }

    /// Whether the value has already been taken out of the cell.
    #[must_use]
    pub fn is_taken(&self) -> bool {
        self.inner.is_taken()
    }
}
