//! Async tasks sharing one `AsyncLockScopeFactory`.
//!
//! Run with: `cargo run --example async_tasks --features async`

use lock_scope::{lock_scope, AsyncLockScopeFactory, LockError, LockMode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Counter {
    locks: AsyncLockScopeFactory,
    value: AtomicU64,
}

impl Counter {
    #[lock_scope(write, factory = self.locks)]
    async fn bump(&self) -> Result<u64, LockError> {
        Ok(self.value.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[tokio::main]
async fn main() -> Result<(), LockError> {
    let counter = Arc::new(Counter {
        locks: AsyncLockScopeFactory::with_label(Duration::from_millis(200), "counter")?,
        value: AtomicU64::new(0),
    });

    let mut handles = vec![];
    for _ in 0..4 {
        let c = counter.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..100 {
                c.bump().await?;
            }
            Ok::<(), LockError>(())
        }));
    }
    for h in handles {
        h.await.expect("task panicked")?;
    }

    let scope = counter.locks.create_scope(LockMode::Read).await?;
    println!("{} scope sees {}", scope.mode(), counter.value.load(Ordering::Relaxed));
    Ok(())
}
