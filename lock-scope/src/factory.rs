use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::lock_api::{RawRwLock, RawRwLockTimed, RwLock};

use crate::error::{validate_timeout, LockError};
use crate::mode::LockMode;
use crate::scope::{LockScope, OwnedLockScope, ScopeTracker};

/// The primitive used when no other is named.
pub type DefaultRawRwLock = parking_lot::RawRwLock;

/// A reader/writer lock that guards no data, only a critical section.
pub type SharedLock<R = DefaultRawRwLock> = RwLock<R, ()>;

/// The lock plus everything a scope needs to find through it.
pub(crate) struct LockCore<R> {
    pub(crate) lock: Arc<SharedLock<R>>,
    pub(crate) timeout: Duration,
    pub(crate) tracker: ScopeTracker,
    closed: AtomicBool,
}

impl<R> LockCore<R> {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Owns one reader/writer lock and mints timeout-bounded scopes over it.
///
/// Every scope created here waits at most [`timeout`](Self::timeout) for its
/// hold. Borrowed scopes ([`create_scope`](Self::create_scope)) cannot outlive
/// the factory; owned scopes ([`create_owned_scope`](Self::create_owned_scope))
/// keep the lock alive on their own and are counted so that
/// [`try_close`](Self::try_close) can refuse to tear down under them.
///
/// `R` is the lock primitive. Anything implementing
/// [`RawRwLockTimed`] with `std::time::Duration` works; the default is
/// [`parking_lot::RawRwLock`].
pub struct LockScopeFactory<R = DefaultRawRwLock> {
    core: Arc<LockCore<R>>,
}

impl LockScopeFactory {
    /// Create a factory over a fresh [`DefaultRawRwLock`].
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidConfiguration`] if `timeout` is zero.
    pub fn new(timeout: Duration) -> Result<Self, LockError> {
        Self::with_primitive(timeout)
    }

    /// Start configuring a factory. See [`LockScopeFactoryBuilder`].
    pub fn builder(timeout: Duration) -> LockScopeFactoryBuilder {
        LockScopeFactoryBuilder {
            timeout,
            label: None,
            _primitive: PhantomData,
        }
    }
}

impl<R> LockScopeFactory<R>
where
    R: RawRwLockTimed<Duration = Duration>,
{
    /// Create a factory over a fresh lock of primitive type `R`.
    pub fn with_primitive(timeout: Duration) -> Result<Self, LockError> {
        Self::from_parts(timeout, None)
    }

    fn from_parts(timeout: Duration, label: Option<String>) -> Result<Self, LockError> {
        let timeout = validate_timeout(timeout)?;
        Ok(Self {
            core: Arc::new(LockCore {
                lock: Arc::new(RwLock::new(())),
                timeout,
                tracker: ScopeTracker::new(label),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Acquire a scope in `mode`, blocking up to the factory timeout.
    ///
    /// `mode` is validated before the lock is touched, so a rejected request
    /// leaves the lock exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`LockError::InvalidMode`] if `mode` is not `Read` or `Write`.
    /// - [`LockError::AcquisitionTimeout`] if the hold was not granted in time.
    pub fn create_scope<M>(&self, mode: M) -> Result<LockScope<'_, R>, LockError>
    where
        M: TryInto<LockMode>,
        LockError: From<M::Error>,
    {
        let mode = mode.try_into()?;
        LockScope::acquire_tracked(
            &self.core.lock,
            mode,
            self.core.timeout,
            Some(&self.core.tracker),
        )
    }

    /// Like [`create_scope`](Self::create_scope), but the scope holds its own
    /// reference to the lock instead of borrowing the factory.
    pub fn create_owned_scope<M>(&self, mode: M) -> Result<OwnedLockScope<R>, LockError>
    where
        M: TryInto<LockMode>,
        LockError: From<M::Error>,
    {
        let mode = mode.try_into()?;
        OwnedLockScope::acquire(Arc::clone(&self.core), mode)
    }

    /// A handle that can mint owned scopes without keeping the factory open.
    pub fn downgrade(&self) -> WeakLockScopeFactory<R> {
        WeakLockScopeFactory {
            core: Arc::downgrade(&self.core),
        }
    }

    /// Tear the factory down if no owned scope is live; hand it back otherwise.
    ///
    /// Borrowed scopes need no check here: while one exists the factory is
    /// borrowed and cannot be passed by value. Requests racing through a
    /// [`WeakLockScopeFactory`] either make this call refuse or fail with
    /// [`LockError::MissingDependency`]. While a refused close is in flight a
    /// weak request may also see `MissingDependency`.
    pub fn try_close(self) -> Result<(), Self> {
        // Closed first, count second; the weak path does the reverse.
        self.core.closed.store(true, Ordering::SeqCst);
        if self.live_scopes() == 0 {
            Ok(())
        } else {
            self.core.closed.store(false, Ordering::SeqCst);
            Err(self)
        }
    }
}

impl<R> LockScopeFactory<R> {
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.core.timeout
    }

    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.core.tracker.label()
    }

    /// Number of scopes from this factory that are currently held.
    ///
    /// A request through a [`WeakLockScopeFactory`] is counted from the moment
    /// it starts waiting.
    #[inline]
    pub fn live_scopes(&self) -> usize {
        self.core.tracker.live()
    }
}

impl<R: RawRwLock> LockScopeFactory<R> {
    /// Whether the lock is held in any mode right now.
    ///
    /// Racy by nature; meant for diagnostics and tests.
    pub fn is_locked(&self) -> bool {
        self.core.lock.is_locked()
    }
}

impl<R> Drop for LockScopeFactory<R> {
    fn drop(&mut self) {
        self.core.closed.store(true, Ordering::SeqCst);
    }
}

impl<R> fmt::Debug for LockScopeFactory<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockScopeFactory")
            .field("label", &self.label())
            .field("timeout", &self.timeout())
            .field("live_scopes", &self.live_scopes())
            .finish()
    }
}

/// Non-owning handle to a [`LockScopeFactory`].
///
/// Once the factory is torn down, every request through the handle fails with
/// [`LockError::MissingDependency`].
pub struct WeakLockScopeFactory<R = DefaultRawRwLock> {
    core: Weak<LockCore<R>>,
}

impl<R> WeakLockScopeFactory<R>
where
    R: RawRwLockTimed<Duration = Duration>,
{
    pub fn create_scope<M>(&self, mode: M) -> Result<OwnedLockScope<R>, LockError>
    where
        M: TryInto<LockMode>,
        LockError: From<M::Error>,
    {
        let core = self
            .core
            .upgrade()
            .ok_or(LockError::MissingDependency { what: "lock" })?;
        let mode = mode.try_into()?;
        OwnedLockScope::acquire(core, mode)
    }
}

impl<R> WeakLockScopeFactory<R> {
    /// `false` once the factory has been torn down.
    pub fn is_open(&self) -> bool {
        self.core
            .upgrade()
            .is_some_and(|core| !core.is_closed())
    }
}

impl<R> Clone for WeakLockScopeFactory<R> {
    fn clone(&self) -> Self {
        Self {
            core: Weak::clone(&self.core),
        }
    }
}

impl<R> fmt::Debug for WeakLockScopeFactory<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakLockScopeFactory")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Configures a [`LockScopeFactory`].
///
/// ```rust
/// use lock_scope::{LockMode, LockScopeFactory};
/// use std::time::Duration;
///
/// let factory = LockScopeFactory::builder(Duration::from_millis(250))
///     .label("sessions")
///     .build()
///     .unwrap();
/// assert_eq!(factory.label(), Some("sessions"));
/// let _scope = factory.create_scope(LockMode::Read).unwrap();
/// ```
#[must_use]
pub struct LockScopeFactoryBuilder<R = DefaultRawRwLock> {
    timeout: Duration,
    label: Option<String>,
    _primitive: PhantomData<fn() -> R>,
}

impl<R> LockScopeFactoryBuilder<R> {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Name attached to this factory's tracing events.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Switch the lock primitive.
    pub fn primitive<P>(self) -> LockScopeFactoryBuilder<P> {
        LockScopeFactoryBuilder {
            timeout: self.timeout,
            label: self.label,
            _primitive: PhantomData,
        }
    }
}

impl<R> LockScopeFactoryBuilder<R>
where
    R: RawRwLockTimed<Duration = Duration>,
{
    /// # Errors
    ///
    /// [`LockError::InvalidConfiguration`] if the timeout is zero.
    pub fn build(self) -> Result<LockScopeFactory<R>, LockError> {
        LockScopeFactory::from_parts(self.timeout, self.label)
    }
}

impl<R> fmt::Debug for LockScopeFactoryBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockScopeFactoryBuilder")
            .field("timeout", &self.timeout)
            .field("label", &self.label)
            .finish()
    }
}
