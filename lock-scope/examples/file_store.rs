//! Readers and writers sharing a directory on disk.
//!
//! The files themselves carry no lock; every access goes through a scope from
//! one `LockScopeFactory`. Writers that time out back off and retry, since
//! `AcquisitionTimeout` is the only retryable error.
//!
//! Run with: `RUST_LOG=lock_scope=trace cargo run --example file_store`

use lock_scope::{LockError, LockMode, LockScopeFactory};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum StoreError {
    Lock(LockError),
    Io(io::Error),
}

impl From<LockError> for StoreError {
    fn from(err: LockError) -> Self {
        StoreError::Lock(err)
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

struct FileStore {
    root: PathBuf,
    locks: LockScopeFactory,
}

impl FileStore {
    fn open(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root)?;
        let locks = LockScopeFactory::builder(Duration::from_millis(50))
            .label("file-store")
            .build()?;
        Ok(Self {
            root: root.to_path_buf(),
            locks,
        })
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _scope = self.locks.create_scope(LockMode::Write)?;
        fs::write(self.root.join(key), value)?;
        // Hold long enough for readers to notice.
        thread::sleep(Duration::from_millis(20));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _scope = self.locks.create_scope(LockMode::Read)?;
        match fs::read_to_string(self.root.join(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put_with_retry(&self, key: &str, value: &str, attempts: u32) -> Result<(), StoreError> {
        let mut attempt = 1;
        loop {
            match self.put(key, value) {
                Err(StoreError::Lock(err)) if err.is_retryable() && attempt < attempts => {
                    tracing::info!(key, attempt, "write lock busy, retrying");
                    attempt += 1;
                    thread::sleep(Duration::from_millis(10));
                }
                other => return other,
            }
        }
    }
}

fn main() -> Result<(), StoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let root = std::env::temp_dir().join("lock-scope-file-store");
    let store = FileStore::open(&root)?;

    thread::scope(|s| {
        for writer in 0..2 {
            let store = &store;
            s.spawn(move || {
                for i in 0..5 {
                    let key = format!("key-{}", i % 3);
                    if let Err(err) = store.put_with_retry(&key, &format!("w{writer}:{i}"), 5) {
                        tracing::warn!(?err, "write gave up");
                    }
                }
            });
        }
        for _ in 0..4 {
            let store = &store;
            s.spawn(move || {
                for i in 0..10 {
                    match store.get(&format!("key-{}", i % 3)) {
                        Ok(value) => tracing::debug!(?value, "read"),
                        Err(err) => tracing::debug!(?err, "read skipped"),
                    }
                }
            });
        }
    });

    println!("final key-0 = {:?}", store.get("key-0")?);
    fs::remove_dir_all(&root)?;
    Ok(())
}
