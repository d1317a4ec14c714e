use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use pathstate_types::Tree;

use crate::adapter::Persistence;

/// Background writer that rate-limits snapshot writes.
///
/// `save` only records the newest tree and returns. The writer task writes the
/// first tree it sees at once, then waits out the throttle interval; whatever
/// was saved meanwhile is written as one trailing write. Writes run on the
/// blocking pool. Write failures are logged and otherwise ignored.
pub struct ThrottledWriter {
    latest: watch::Sender<Option<Arc<Tree>>>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ThrottledWriter {
    /// Spawn the writer task on the current tokio runtime.
    pub fn spawn(persistence: Arc<Persistence>) -> Self {
        let (latest, rx) = watch::channel(None);
        let wake = Arc::new(Notify::new());
        let interval = persistence.config().throttle;
        let task = tokio::spawn(run(persistence, rx, Arc::clone(&wake), interval));
        Self { latest, wake, task }
    }

    /// Schedule `tree` to be written. Never blocks.
    pub fn save(&self, tree: Arc<Tree>) {
        self.latest.send_replace(Some(tree));
    }

    /// Write any pending tree now and stop the writer.
    pub async fn close(self) {
        let Self { latest, wake, task } = self;
        drop(latest);
        wake.notify_one();
        if let Err(e) = task.await {
            warn!(error = %e, "snapshot writer task failed");
        }
    }
}

impl std::fmt::Debug for ThrottledWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottledWriter")
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}

async fn run(
    persistence: Arc<Persistence>,
    mut rx: watch::Receiver<Option<Arc<Tree>>>,
    wake: Arc<Notify>,
    interval: Duration,
) {
    // `changed` still reports an unseen value after the sender is dropped, so
    // the trailing write survives `close`.
    while rx.changed().await.is_ok() {
        let pending = rx.borrow_and_update().clone();
        if let Some(tree) = pending {
            let target = Arc::clone(&persistence);
            match tokio::task::spawn_blocking(move || target.write(&tree)).await {
                Ok(Ok(())) => debug!("throttled snapshot written"),
                Ok(Err(e)) => warn!(error = %e, "failed to persist state snapshot"),
                Err(e) => warn!(error = %e, "snapshot write task failed"),
            }
        }
        if rx.has_changed().is_err() {
            // Sender gone: flush without waiting out the interval.
            continue;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = wake.notified() => {}
        }
    }
    debug!("snapshot writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pathstate_store::{InMemorySessionStore, SessionStore, StoreError, StoreResult};
    use serde_json::json;

    use crate::config::PersistConfig;

    /// Counts writes to the state entry and forwards to an in-memory store.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemorySessionStore,
        writes: AtomicUsize,
    }

    impl SessionStore for CountingStore {
        fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get_item(key)
        }
        fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_item(key, value)
        }
        fn remove_item(&self, key: &str) -> StoreResult<bool> {
            self.inner.remove_item(key)
        }
        fn keys(&self) -> StoreResult<Vec<String>> {
            self.inner.keys()
        }
        fn clear(&self) -> StoreResult<()> {
            self.inner.clear()
        }
    }

    /// Takes `delay` to complete every write.
    struct SlowStore {
        inner: InMemorySessionStore,
        delay: Duration,
    }

    impl SessionStore for SlowStore {
        fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get_item(key)
        }
        fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
            std::thread::sleep(self.delay);
            self.inner.set_item(key, value)
        }
        fn remove_item(&self, key: &str) -> StoreResult<bool> {
            self.inner.remove_item(key)
        }
        fn keys(&self) -> StoreResult<Vec<String>> {
            self.inner.keys()
        }
        fn clear(&self) -> StoreResult<()> {
            self.inner.clear()
        }
    }

    struct ReadOnlyStore;

    impl SessionStore for ReadOnlyStore {
        fn get_item(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }
        fn set_item(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
        fn remove_item(&self, _key: &str) -> StoreResult<bool> {
            Ok(false)
        }
        fn keys(&self) -> StoreResult<Vec<String>> {
            Ok(Vec::new())
        }
        fn clear(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    fn config(throttle_ms: u64) -> PersistConfig {
        PersistConfig {
            version: Some("v1".into()),
            throttle: Duration::from_millis(throttle_ms),
            ..Default::default()
        }
    }

    fn stored(store: &CountingStore) -> Option<Tree> {
        store
            .get_item("pathstate-state")
            .unwrap()
            .map(|s| serde_json::from_str(&s).unwrap())
    }

    #[tokio::test]
    async fn first_save_is_written_immediately() {
        let store = Arc::new(CountingStore::default());
        let persistence = Arc::new(Persistence::new(config(10_000), store.clone()));
        let writer = ThrottledWriter::spawn(persistence);

        writer.save(Arc::new(json!({"n": 1})));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stored(&store), Some(json!({"n": 1})));
        writer.close().await;
    }

    #[tokio::test]
    async fn saves_within_interval_are_coalesced() {
        let store = Arc::new(CountingStore::default());
        let persistence = Arc::new(Persistence::new(config(100), store.clone()));
        let writer = ThrottledWriter::spawn(persistence);

        for n in 0..10 {
            writer.save(Arc::new(json!({"n": n})));
        }
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(stored(&store), Some(json!({"n": 9})));
        assert!(store.writes.load(Ordering::SeqCst) <= 2);
        writer.close().await;
    }

    #[tokio::test]
    async fn close_flushes_trailing_write() {
        let store = Arc::new(CountingStore::default());
        let persistence = Arc::new(Persistence::new(config(60_000), store.clone()));
        let writer = ThrottledWriter::spawn(persistence);

        writer.save(Arc::new(json!({"n": 1})));
        tokio::time::sleep(Duration::from_millis(30)).await;
        writer.save(Arc::new(json!({"n": 2})));
        writer.close().await;

        assert_eq!(stored(&store), Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn round_trip_after_throttle_window() {
        let store = Arc::new(CountingStore::default());
        let persistence = Arc::new(Persistence::new(config(20), store.clone()));
        let tree = json!({"foo": {"bar": 6, "baz": [3, 4]}});
        persistence.load(&json!({}));

        let writer = ThrottledWriter::spawn(Arc::clone(&persistence));
        writer.save(Arc::new(tree.clone()));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(persistence.load(&json!({})), tree);
        writer.close().await;
    }

    #[tokio::test]
    async fn slow_store_does_not_stall_the_runtime() {
        let store = Arc::new(SlowStore {
            inner: InMemorySessionStore::new(),
            delay: Duration::from_millis(400),
        });
        let persistence = Arc::new(Persistence::new(config(10), store.clone()));
        let writer = ThrottledWriter::spawn(persistence);

        writer.save(Arc::new(json!({"n": 1})));
        let started = tokio::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(started.elapsed() < Duration::from_millis(300));

        writer.close().await;
        let raw = store.get_item("pathstate-state").unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Tree>(&raw).unwrap(), json!({"n": 1}));
    }

    #[tokio::test]
    async fn write_failures_do_not_stop_the_writer() {
        let persistence = Arc::new(Persistence::new(config(5), Arc::new(ReadOnlyStore)));
        let writer = ThrottledWriter::spawn(persistence);
        writer.save(Arc::new(json!(1)));
        tokio::time::sleep(Duration::from_millis(30)).await;
        writer.save(Arc::new(json!(2)));
        writer.close().await;
    }
}
