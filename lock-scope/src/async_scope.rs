use std::fmt;
use std::time::{Duration, Instant};

use async_lock::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{validate_timeout, LockError};
use crate::mode::LockMode;
use crate::scope::{trace_acquired, trace_released, ScopeHold, ScopeTracker};

type AsyncHold<'a> = ScopeHold<RwLockReadGuard<'a, ()>, RwLockWriteGuard<'a, ()>>;

/// Async counterpart of [`LockScopeFactory`](crate::LockScopeFactory).
///
/// Waiting suspends the calling task instead of the thread. The bounded wait
/// uses tokio's timer, so scopes must be requested from inside a tokio
/// runtime with the time driver enabled.
///
/// ```rust
/// use lock_scope::{AsyncLockScopeFactory, LockMode};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let factory = AsyncLockScopeFactory::new(Duration::from_millis(100)).unwrap();
/// {
///     let _read = factory.create_scope(LockMode::Read).await.unwrap();
///     assert!(factory.create_scope(LockMode::Write).await.is_err());
/// }
/// let _write = factory.create_scope(LockMode::Write).await.unwrap();
/// # });
/// ```
pub struct AsyncLockScopeFactory {
    lock: RwLock<()>,
    timeout: Duration,
    tracker: ScopeTracker,
}

impl AsyncLockScopeFactory {
    /// # Errors
    ///
    /// [`LockError::InvalidConfiguration`] if `timeout` is zero.
    pub fn new(timeout: Duration) -> Result<Self, LockError> {
        Self::from_parts(timeout, None)
    }

    /// Same as [`new`](Self::new), with a name attached to tracing events.
    pub fn with_label(timeout: Duration, label: impl Into<String>) -> Result<Self, LockError> {
        Self::from_parts(timeout, Some(label.into()))
    }

    fn from_parts(timeout: Duration, label: Option<String>) -> Result<Self, LockError> {
        Ok(Self {
            lock: RwLock::new(()),
            timeout: validate_timeout(timeout)?,
            tracker: ScopeTracker::new(label),
        })
    }

    /// Acquire a scope in `mode`, waiting up to the factory timeout.
    ///
    /// Dropping the returned future before it resolves abandons the attempt
    /// without leaving a hold behind.
    ///
    /// # Errors
    ///
    /// - [`LockError::InvalidMode`] if `mode` is not `Read` or `Write`.
    /// - [`LockError::AcquisitionTimeout`] if the hold was not granted in time.
    pub async fn create_scope<M>(&self, mode: M) -> Result<AsyncLockScope<'_>, LockError>
    where
        M: TryInto<LockMode>,
        LockError: From<M::Error>,
    {
        let mode = mode.try_into()?;
        let timeout = self.timeout;
        let started = Instant::now();
        let hold = match mode {
            LockMode::Read => tokio::time::timeout(timeout, self.lock.read())
                .await
                .map(ScopeHold::Read),
            LockMode::Write => tokio::time::timeout(timeout, self.lock.write())
                .await
                .map(ScopeHold::Write),
        }
        .map_err(|_| LockError::AcquisitionTimeout { mode, timeout })?;

        self.tracker.entered();
        trace_acquired(mode, self.label(), started);
        Ok(AsyncLockScope {
            hold: Some(hold),
            mode,
            tracker: &self.tracker,
        })
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.tracker.label()
    }

    #[inline]
    pub fn live_scopes(&self) -> usize {
        self.tracker.live()
    }

    /// Whether the lock is held in any mode right now. Racy; for diagnostics.
    pub fn is_locked(&self) -> bool {
        self.lock.try_write().is_none()
    }
}

impl fmt::Debug for AsyncLockScopeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLockScopeFactory")
            .field("label", &self.label())
            .field("timeout", &self.timeout)
            .field("live_scopes", &self.live_scopes())
            .finish()
    }
}

/// A live hold minted by [`AsyncLockScopeFactory`]. Released on drop.
#[must_use = "dropping an AsyncLockScope releases the lock immediately"]
pub struct AsyncLockScope<'a> {
    hold: Option<AsyncHold<'a>>,
    mode: LockMode,
    tracker: &'a ScopeTracker,
}

impl AsyncLockScope<'_> {
    #[inline]
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for AsyncLockScope<'_> {
    fn drop(&mut self) {
        // Unlock before the count goes down.
        drop(self.hold.take());
        self.tracker.exited();
        trace_released(self.mode, self.tracker.label());
    }
}

impl fmt::Debug for AsyncLockScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLockScope")
            .field("mode", &self.mode())
            .field("label", &self.tracker.label())
            .finish()
    }
}
