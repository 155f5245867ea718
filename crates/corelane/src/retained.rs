//! Self-owning references for escaping into callback-style APIs.
//!
//! [`RetainedToken`] lets a value keep itself alive across an FFI-style boundary
//! that only gives back an opaque pointer (no destructor hook, no typed handle):
//! leak an `Arc` into a raw pointer, hand the pointer out, and later reclaim the
//! `Arc` from that same pointer to let normal reference counting take back over.

use std::sync::Arc;

/// An opaque, move-only token produced by [`RetainedToken::retain`], wrapping
/// exactly one outstanding strong reference.
///
/// Deliberately not `Clone`/`Copy`: there is exactly one token per retained
/// reference, and [`take`](Self::take) consumes it by value, so the type system
/// rules out calling `take` twice on what looks like "the same" token. Must be
/// passed to [`take`](Self::take) with the same `T` it was created with exactly
/// once, or the underlying value leaks forever — there is no `Drop` impl to
/// catch a forgotten token, since reconstructing ownership from the bit pattern
/// at drop time would require knowing whether some other copy already did.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RetainedToken<T> {
    ptr: *const T,
}

// SAFETY: a RetainedToken is the sole handle to a leaked Arc<T> strong count, so
// sending or sharing it is exactly as sound as sending or sharing that Arc<T>
// itself — hence the same `T: Send + Sync` bound `Arc<T>` requires for its own
// conditional Send/Sync impls.
unsafe impl<T: Send + Sync> Send for RetainedToken<T> {}
unsafe impl<T: Send + Sync> Sync for RetainedToken<T> {}

impl<T> RetainedToken<T> {
    /// Leaks an `Arc<T>`'s strong reference into a [`RetainedToken`] that can be
    /// handed to code which only understands raw pointers.
    #[must_use]
    pub fn retain(value: Arc<T>) -> Self {
        Self {
            ptr: Arc::into_raw(value),
        }
    }

    /// Reclaims the `Arc<T>` previously leaked by [`retain`](Self::retain),
    /// consuming this token and yielding ownership back to the caller.
    ///
    /// # Safety
    ///
    /// `self` must have been produced by [`retain`](Self::retain) with the same
    /// `T`. Because `self` is consumed by value and the token is not `Clone`,
    /// there is no way to call `take` twice on the same retain from safe code.
    #[must_use]
    pub unsafe fn take(self) -> Arc<T> {
        // SAFETY: forwarded to the caller's obligations documented above.
        unsafe { Arc::from_raw(self.ptr) }
    }

    /// Borrows the retained value without affecting its reference count or
    /// consuming the token.
    ///
    /// # Safety
    ///
    /// `self` must refer to a still-live retain (not yet passed to `take`), and
    /// the returned reference must not outlive that retain.
    #[must_use]
    pub unsafe fn borrow<'a>(&self) -> &'a T {
        // SAFETY: forwarded to the caller's obligations documented above.
        unsafe { &*self.ptr }
    }

    /// The raw address backing this token, for logging or identity comparisons.
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }
}
