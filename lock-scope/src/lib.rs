//! Timeout-bounded reader/writer **lock scopes** minted by a lock-owning factory.
//!
//! A [`LockScopeFactory`] owns exactly one reader/writer lock and a fixed
//! acquisition timeout. Ask it for a scope in [`LockMode::Read`] (shared) or
//! [`LockMode::Write`] (exclusive) and you get back either a live
//! [`LockScope`] or an error; the wait never exceeds the timeout. The scope
//! releases its hold exactly once when dropped, on every exit path, with the
//! release that matches the mode it was acquired in.
//!
//! # Quick Start
//!
//! ```rust
//! use lock_scope::{LockError, LockMode, LockScopeFactory};
//! use std::time::Duration;
//!
//! let factory = LockScopeFactory::new(Duration::from_millis(500))?;
//!
//! {
//!     let _a = factory.create_scope(LockMode::Read)?;
//!     let _b = factory.create_scope(LockMode::Read)?; // readers share
//!     assert_eq!(factory.live_scopes(), 2);
//! } // both released here
//!
//! let scope = factory.create_scope(LockMode::Write)?;
//! assert!(scope.mode().is_write());
//! # Ok::<(), LockError>(())
//! ```
//!
//! # Validated modes
//!
//! [`LockMode`] has no default and no placeholder variant. Raw values coming
//! from outside are validated at the boundary:
//!
//! ```rust
//! # use lock_scope::{LockError, LockMode, LockScopeFactory};
//! # use std::time::Duration;
//! # let factory = LockScopeFactory::new(Duration::from_millis(500)).unwrap();
//! assert!(matches!(factory.create_scope(0), Err(LockError::InvalidMode { .. })));
//! assert!(matches!(factory.create_scope("upgrade"), Err(LockError::InvalidMode { .. })));
//! assert!(!factory.is_locked());
//!
//! let scope = factory.create_scope("write").unwrap();
//! assert_eq!(scope.mode(), LockMode::Write);
//! ```
//!
//! # Timeouts
//!
//! A request that cannot be granted in time fails with
//! [`LockError::AcquisitionTimeout`], the only retryable error:
//!
//! ```rust
//! # use lock_scope::{LockError, LockMode, LockScopeFactory};
//! # use std::time::Duration;
//! let factory = LockScopeFactory::new(Duration::from_millis(20)).unwrap();
//! let owned = factory.create_owned_scope(LockMode::Write).unwrap();
//!
//! let handle = factory.downgrade();
//! let err = std::thread::spawn(move || handle.create_scope(LockMode::Read).map(drop))
//!     .join()
//!     .unwrap()
//!     .unwrap_err();
//! assert!(err.is_retryable());
//! drop(owned);
//! ```
//!
//! # Function-level scopes
//!
//! `#[lock_scope(read | write, factory = <expr>)]` runs a function body inside
//! a scope and turns a failed acquisition into an early `Err`:
//!
//! ```rust
//! use lock_scope::{lock_scope, LockError, LockScopeFactory};
//! use std::time::Duration;
//!
//! struct Registry {
//!     locks: LockScopeFactory,
//! }
//!
//! impl Registry {
//!     #[lock_scope(write, factory = self.locks)]
//!     fn rebuild(&self) -> Result<usize, LockError> {
//!         Ok(self.locks.live_scopes())
//!     }
//! }
//!
//! let registry = Registry { locks: LockScopeFactory::new(Duration::from_millis(100))? };
//! assert_eq!(registry.rebuild()?, 1);
//! assert_eq!(registry.locks.live_scopes(), 0);
//! # Ok::<(), LockError>(())
//! ```
//!
//! The function must return something a [`LockError`] can be `?`-ed into:
//!
//! ```compile_fail
//! # use lock_scope::{lock_scope, LockScopeFactory};
//! # use std::time::Duration;
//! # let factory = LockScopeFactory::new(Duration::from_millis(100)).unwrap();
//! #[lock_scope(write, factory = factory)]
//! fn rebuild() {}
//! ```
//!
//! and the mode is `read` or `write`, nothing else:
//!
//! ```compile_fail
//! # use lock_scope::{lock_scope, LockError, LockScopeFactory};
//! # fn factory() -> &'static LockScopeFactory { unimplemented!() }
//! #[lock_scope(upgradable, factory = factory())]
//! fn rebuild() -> Result<(), LockError> {
//!     Ok(())
//! }
//! ```
//!
//! # Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`LockScopeFactory`] | Owns the lock and the timeout, mints scopes |
//! | [`LockScope`] | Borrowed live hold, released on drop |
//! | [`OwnedLockScope`] | Live hold that keeps the lock alive through an `Arc` |
//! | [`WeakLockScopeFactory`] | Non-owning handle; `MissingDependency` after teardown |
//! | `AsyncLockScopeFactory` | Task-suspending variant (`async` feature) |

#[cfg(feature = "async")]
mod async_scope;
mod error;
mod factory;
mod mode;
mod scope;

#[cfg(feature = "async")]
pub use async_scope::{AsyncLockScope, AsyncLockScopeFactory};
pub use error::LockError;
pub use factory::{
    DefaultRawRwLock, LockScopeFactory, LockScopeFactoryBuilder, SharedLock, WeakLockScopeFactory,
};
pub use lock_scope_derive::lock_scope;
pub use mode::LockMode;
pub use parking_lot::lock_api::{RawRwLock, RawRwLockTimed};
pub use scope::{LockScope, OwnedLockScope};
