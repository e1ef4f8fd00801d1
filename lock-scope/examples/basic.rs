//! Minimal lock-scope example.
//!
//! Run with: `cargo run --example basic`

use lock_scope::{LockError, LockMode, LockScopeFactory};
use std::time::Duration;

fn main() -> Result<(), LockError> {
    let factory = LockScopeFactory::new(Duration::from_millis(500))?;

    {
        let a = factory.create_scope(LockMode::Read)?;
        let b = factory.create_scope(LockMode::Read)?;
        println!("{} and {} scopes held together: {}", a.mode(), b.mode(), factory.live_scopes());
    }

    let writer = factory.create_scope(LockMode::Write)?;
    println!("{} scope held alone: {}", writer.mode(), factory.live_scopes());
    drop(writer);

    match factory.create_scope(0) {
        Err(err) => println!("rejected: {err}"),
        Ok(_) => unreachable!("0 is not a lock mode"),
    }

    Ok(())
}
