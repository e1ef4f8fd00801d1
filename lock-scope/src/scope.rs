use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::lock_api::{
    ArcRwLockReadGuard, ArcRwLockWriteGuard, RawRwLock, RawRwLockTimed, RwLockReadGuard,
    RwLockWriteGuard,
};

use crate::error::{validate_timeout, LockError};
use crate::factory::{LockCore, SharedLock};
use crate::mode::LockMode;

/// Per-factory bookkeeping shared by every scope it mints.
#[derive(Debug)]
pub(crate) struct ScopeTracker {
    label: Option<String>,
    live: AtomicUsize,
}

impl ScopeTracker {
    pub(crate) fn new(label: Option<String>) -> Self {
        Self {
            label,
            live: AtomicUsize::new(0),
        }
    }

    pub(crate) fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn entered(&self) {
        self.live.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn exited(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The guard a scope keeps, by mode. Held only so that dropping it unlocks.
#[allow(dead_code)]
pub(crate) enum ScopeHold<S, X> {
    Read(S),
    Write(X),
}

type BorrowedHold<'a, R> = ScopeHold<RwLockReadGuard<'a, R, ()>, RwLockWriteGuard<'a, R, ()>>;
type ArcHold<R> = ScopeHold<ArcRwLockReadGuard<R, ()>, ArcRwLockWriteGuard<R, ()>>;

pub(crate) fn trace_acquired(mode: LockMode, label: Option<&str>, started: Instant) {
    tracing::trace!(
        %mode,
        label = label.unwrap_or_default(),
        waited_ms = started.elapsed().as_millis() as u64,
        "lock scope acquired"
    );
}

pub(crate) fn trace_released(mode: LockMode, label: Option<&str>) {
    tracing::trace!(%mode, label = label.unwrap_or_default(), "lock scope released");
}

/// A live, mode-tagged hold on a borrowed [`SharedLock`].
///
/// A `LockScope` only exists while the hold is in place: [`acquire`](Self::acquire)
/// either returns a held scope or an error with the lock untouched. Dropping
/// the scope releases the hold exactly once, with the release that matches
/// [`mode`](Self::mode), whichever way control leaves the owning block.
///
/// The scope borrows the lock, so it can never outlive it:
///
/// ```compile_fail
/// use lock_scope::{LockMode, LockScopeFactory};
/// use std::time::Duration;
///
/// let scope = {
///     let factory = LockScopeFactory::new(Duration::from_secs(1)).unwrap();
///     factory.create_scope(LockMode::Read).unwrap()
/// }; // ERROR: `factory` dropped while borrowed
/// ```
#[must_use = "dropping a LockScope releases the lock immediately"]
pub struct LockScope<'a, R: RawRwLock> {
    hold: Option<BorrowedHold<'a, R>>,
    mode: LockMode,
    tracker: Option<&'a ScopeTracker>,
}

impl<'a, R> LockScope<'a, R>
where
    R: RawRwLockTimed<Duration = Duration>,
{
    /// Acquire `lock` in `mode`, waiting at most `timeout`.
    ///
    /// `mode` may be a [`LockMode`] or any raw value with a validating
    /// conversion (`i32`, `u8`, `&str`).
    ///
    /// # Errors
    ///
    /// - [`LockError::InvalidMode`] if `mode` is not `Read` or `Write`.
    /// - [`LockError::InvalidConfiguration`] if `timeout` is zero.
    /// - [`LockError::AcquisitionTimeout`] if the hold was not granted in time.
    pub fn acquire<M>(lock: &'a SharedLock<R>, mode: M, timeout: Duration) -> Result<Self, LockError>
    where
        M: TryInto<LockMode>,
        LockError: From<M::Error>,
    {
        let mode = mode.try_into()?;
        let timeout = validate_timeout(timeout)?;
        Self::acquire_tracked(lock, mode, timeout, None)
    }

    pub(crate) fn acquire_tracked(
        lock: &'a SharedLock<R>,
        mode: LockMode,
        timeout: Duration,
        tracker: Option<&'a ScopeTracker>,
    ) -> Result<Self, LockError> {
        let started = Instant::now();
        // The timed primitives either take the hold or give up without one.
        let hold = match mode {
            LockMode::Read => lock.try_read_for(timeout).map(ScopeHold::Read),
            LockMode::Write => lock.try_write_for(timeout).map(ScopeHold::Write),
        }
        .ok_or(LockError::AcquisitionTimeout { mode, timeout })?;

        if let Some(tracker) = tracker {
            tracker.entered();
        }
        trace_acquired(mode, tracker.and_then(ScopeTracker::label), started);
        Ok(Self {
            hold: Some(hold),
            mode,
            tracker,
        })
    }
}

impl<R: RawRwLock> LockScope<'_, R> {
    /// The mode this scope was acquired in.
    #[inline]
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Release the hold now instead of at the end of the enclosing block.
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl<R: RawRwLock> Drop for LockScope<'_, R> {
    fn drop(&mut self) {
        // Unlock before the count goes down.
        drop(self.hold.take());
        if let Some(tracker) = self.tracker {
            tracker.exited();
        }
        trace_released(self.mode, self.tracker.and_then(ScopeTracker::label));
    }
}

impl<R: RawRwLock> fmt::Debug for LockScope<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockScope")
            .field("mode", &self.mode)
            .field("label", &self.tracker.and_then(ScopeTracker::label))
            .finish()
    }
}

/// A [`LockScope`] that keeps its factory's lock alive through an `Arc`
/// instead of borrowing it.
///
/// Useful when the hold has to be stored in a struct or returned from a
/// function. The lock is freed only after the factory and every owned scope
/// are gone.
#[must_use = "dropping an OwnedLockScope releases the lock immediately"]
pub struct OwnedLockScope<R: RawRwLock> {
    hold: Option<ArcHold<R>>,
    mode: LockMode,
    core: Arc<LockCore<R>>,
}

impl<R> OwnedLockScope<R>
where
    R: RawRwLockTimed<Duration = Duration>,
{
    /// Acquire through `core`, failing with `MissingDependency` once the
    /// factory is closed.
    pub(crate) fn acquire(core: Arc<LockCore<R>>, mode: LockMode) -> Result<Self, LockError> {
        // Counted before the closed check: a concurrent `try_close` either
        // sees this request or this request sees the close.
        core.tracker.entered();
        if core.is_closed() {
            core.tracker.exited();
            return Err(LockError::MissingDependency { what: "lock" });
        }

        let started = Instant::now();
        let timeout = core.timeout;
        let hold = match mode {
            LockMode::Read => core.lock.try_read_arc_for(timeout).map(ScopeHold::Read),
            LockMode::Write => core.lock.try_write_arc_for(timeout).map(ScopeHold::Write),
        };
        let Some(hold) = hold else {
            core.tracker.exited();
            return Err(LockError::AcquisitionTimeout { mode, timeout });
        };

        trace_acquired(mode, core.tracker.label(), started);
        Ok(Self {
            hold: Some(hold),
            mode,
            core,
        })
    }
}

impl<R: RawRwLock> OwnedLockScope<R> {
    #[inline]
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl<R: RawRwLock> Drop for OwnedLockScope<R> {
    fn drop(&mut self) {
        drop(self.hold.take());
        self.core.tracker.exited();
        trace_released(self.mode, self.core.tracker.label());
    }
}

impl<R: RawRwLock> fmt::Debug for OwnedLockScope<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedLockScope")
            .field("mode", &self.mode)
            .field("label", &self.core.tracker.label())
            .finish()
    }
}
