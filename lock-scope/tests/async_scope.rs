use lock_scope::{lock_scope, AsyncLockScopeFactory, LockError, LockMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

const TIMEOUT: Duration = Duration::from_millis(200);
const SLACK: Duration = Duration::from_millis(250);

fn factory() -> Arc<AsyncLockScopeFactory> {
    Arc::new(AsyncLockScopeFactory::new(TIMEOUT).unwrap())
}

/// Hold a `mode` scope on another task until the returned sender fires.
async fn hold_on_other_task(
    factory: &Arc<AsyncLockScopeFactory>,
    mode: LockMode,
) -> (oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let f = factory.clone();
    let handle = tokio::spawn(async move {
        let _scope = f.create_scope(mode).await.unwrap();
        entered_tx.send(()).unwrap();
        let _ = release_rx.await;
    });
    entered_rx.await.unwrap();
    (release_tx, handle)
}

#[test]
fn zero_timeout_is_invalid_configuration() {
    assert!(matches!(
        AsyncLockScopeFactory::new(Duration::ZERO),
        Err(LockError::InvalidConfiguration { .. })
    ));
}

#[tokio::test]
async fn invalid_modes_never_touch_the_lock() {
    let factory = factory();
    for code in [0, 3, 123, -7] {
        assert!(matches!(
            factory.create_scope(code).await,
            Err(LockError::InvalidMode { .. })
        ));
    }
    assert!(matches!(
        factory.create_scope("undefined").await,
        Err(LockError::InvalidMode { .. })
    ));
    assert_eq!(factory.live_scopes(), 0);
    assert!(!factory.is_locked());
}

#[tokio::test]
async fn concurrent_readers_both_succeed() {
    let factory = factory();
    let (a, b) = tokio::join!(
        factory.create_scope(LockMode::Read),
        factory.create_scope(LockMode::Read)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(factory.live_scopes(), 2);
    assert_eq!(a.mode(), LockMode::Read);
    assert_eq!(b.mode(), LockMode::Read);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_times_out_while_writer_holds() {
    let factory = factory();
    let (release, holder) = hold_on_other_task(&factory, LockMode::Write).await;

    let started = Instant::now();
    let err = factory.create_scope(LockMode::Read).await.unwrap_err();
    let elapsed = started.elapsed();
    assert_eq!(
        err,
        LockError::AcquisitionTimeout {
            mode: LockMode::Read,
            timeout: TIMEOUT
        }
    );
    assert!(elapsed >= TIMEOUT, "{elapsed:?}");
    assert!(elapsed < TIMEOUT + SLACK, "{elapsed:?}");

    release.send(()).unwrap();
    holder.await.unwrap();
    assert!(!factory.is_locked());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn write_times_out_while_reader_or_writer_holds() {
    for held in [LockMode::Read, LockMode::Write] {
        let factory = factory();
        let (release, holder) = hold_on_other_task(&factory, held).await;

        let err = factory.create_scope(LockMode::Write).await.unwrap_err();
        assert!(err.is_retryable());

        release.send(()).unwrap();
        holder.await.unwrap();

        // The abandoned write attempt left nothing behind.
        let scope = factory.create_scope(LockMode::Write).await.unwrap();
        assert_eq!(scope.mode(), LockMode::Write);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn release_unblocks_a_waiting_request() {
    let factory = Arc::new(AsyncLockScopeFactory::new(Duration::from_secs(5)).unwrap());
    let (release, holder) = hold_on_other_task(&factory, LockMode::Write).await;

    let f = factory.clone();
    let waiter = tokio::spawn(async move {
        let started = Instant::now();
        let mode = f.create_scope(LockMode::Read).await.map(|scope| scope.mode());
        (mode, started.elapsed())
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    release.send(()).unwrap();
    holder.await.unwrap();

    let (mode, waited) = waiter.await.unwrap();
    assert_eq!(mode, Ok(LockMode::Read));
    assert!(waited < factory.timeout(), "{waited:?}");
}

#[tokio::test]
async fn sequential_scopes_without_contention_are_immediate() {
    let factory = AsyncLockScopeFactory::new(Duration::from_millis(1000)).unwrap();
    let started = Instant::now();
    factory.create_scope(LockMode::Read).await.unwrap().release();
    factory.create_scope(LockMode::Write).await.unwrap().release();
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(factory.live_scopes(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writers_never_overlap_with_anyone() {
    let factory = Arc::new(AsyncLockScopeFactory::new(Duration::from_secs(10)).unwrap());
    let readers = Arc::new(AtomicUsize::new(0));
    let writers = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];
    for task in 0..8 {
        let (f, readers, writers) = (factory.clone(), readers.clone(), writers.clone());
        handles.push(tokio::spawn(async move {
            for _ in 0..100 {
                if task % 2 == 0 {
                    let _scope = f.create_scope(LockMode::Write).await.unwrap();
                    assert_eq!(writers.fetch_add(1, Ordering::SeqCst), 0);
                    assert_eq!(readers.load(Ordering::SeqCst), 0);
                    tokio::task::yield_now().await;
                    writers.fetch_sub(1, Ordering::SeqCst);
                } else {
                    let _scope = f.create_scope(LockMode::Read).await.unwrap();
                    readers.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(writers.load(Ordering::SeqCst), 0);
                    tokio::task::yield_now().await;
                    readers.fetch_sub(1, Ordering::SeqCst);
                }
            }
        }));
    }

    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(factory.live_scopes(), 0);
}

struct Ledger {
    locks: AsyncLockScopeFactory,
    entries: AtomicUsize,
}

impl Ledger {
    #[lock_scope(write, factory = self.locks)]
    async fn append(&self) -> Result<usize, LockError> {
        tokio::task::yield_now().await;
        Ok(self.entries.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[lock_scope(read, factory = self.locks)]
    async fn len(&self) -> Result<(usize, usize), LockError> {
        Ok((self.entries.load(Ordering::SeqCst), self.locks.live_scopes()))
    }
}

#[tokio::test]
async fn attribute_awaits_on_async_functions() {
    let ledger = Ledger {
        locks: AsyncLockScopeFactory::with_label(TIMEOUT, "ledger").unwrap(),
        entries: AtomicUsize::new(0),
    };

    assert_eq!(ledger.append().await, Ok(1));
    assert_eq!(ledger.append().await, Ok(2));
    assert_eq!(ledger.len().await, Ok((2, 1)));
    assert_eq!(ledger.locks.live_scopes(), 0);
    assert_eq!(ledger.locks.label(), Some("ledger"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lock_is_free_once_the_count_reaches_zero() {
    for mode in [LockMode::Read, LockMode::Write] {
        let factory = factory();
        let scope = factory.create_scope(mode).await.unwrap();
        assert_eq!(factory.live_scopes(), 1);

        std::thread::scope(|s| {
            let observer = s.spawn(|| loop {
                if factory.live_scopes() == 0 {
                    return factory.is_locked();
                }
                std::hint::spin_loop();
            });
            drop(scope);
            assert!(!observer.join().unwrap(), "{mode} hold outlived its count");
        });
    }
}
