//! Total ordering of state mutations.
//!
//! The serializer is a single-consumer task reading operations from an
//! unbounded channel. Each operation is applied to the tree committed by its
//! predecessor, so operations fired back-to-back without awaiting land in
//! submission order. The caller gets a [`Completion`] that resolves once the
//! operation has been committed (or rejected).

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use pathstate_path::PathResolver;
use pathstate_persist::ThrottledWriter;
use pathstate_types::Tree;

use crate::error::{ApplyError, ContainerError, ContainerResult};
use crate::operation::Operation;

/// Resolves when the submitted operation has been applied.
///
/// Dropping a `Completion` does not cancel the operation; it is still applied
/// in order.
#[must_use = "a Completion only reports the outcome; the operation runs either way"]
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<ContainerResult<()>>,
}

impl Completion {
    fn new(rx: oneshot::Receiver<ContainerResult<()>>) -> Self {
        Self { rx }
    }
}

impl Future for Completion {
    type Output = ContainerResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ContainerError::Closed)))
    }
}

enum Command {
    Apply {
        operation: Operation,
        reply: oneshot::Sender<ContainerResult<()>>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// Commits applied operations: replaces the tree, logs, schedules a write.
pub(crate) struct Committer {
    pub(crate) tree: watch::Sender<Arc<Tree>>,
    pub(crate) resolver: Arc<dyn PathResolver>,
    pub(crate) writer: Option<ThrottledWriter>,
    pub(crate) log: bool,
}

impl Committer {
    fn commit(&self, operation: &Operation) -> ContainerResult<()> {
        let current = self.tree.borrow().clone();
        let applied = panic::catch_unwind(AssertUnwindSafe(|| {
            operation.apply(self.resolver.as_ref(), &current)
        }))
        .unwrap_or_else(|payload| {
            Err(ApplyError::Panicked {
                operation: operation.kind(),
                message: panic_message(payload.as_ref()),
            })
        });
        match applied {
            Ok(next) => {
                let next = Arc::new(next);
                if self.log {
                    info!(
                        operation = %operation.kind(),
                        path = %operation.path(),
                        detail = %operation.detail(),
                        state = %next,
                        "state updated"
                    );
                } else {
                    debug!(operation = %operation.kind(), path = %operation.path(), "committed");
                }
                self.tree.send_replace(Arc::clone(&next));
                if let Some(writer) = &self.writer {
                    writer.save(next);
                }
                Ok(())
            }
            Err(e) if e.is_programming() => {
                error!(error = %e, "operation rejected");
                Err(ContainerError::Programming(e))
            }
            Err(e) => {
                warn!(error = %e, "operation skipped");
                Ok(())
            }
        }
    }

    async fn shutdown(self) {
        if let Some(writer) = self.writer {
            writer.close().await;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle to the serializer task. Cheap to clone.
#[derive(Clone, Debug)]
pub struct OperationSerializer {
    tx: mpsc::UnboundedSender<Command>,
}

impl OperationSerializer {
    /// Spawn the serializer task on the current tokio runtime.
    pub(crate) fn spawn(committer: Committer) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(committer, rx));
        Self { tx }
    }

    /// Enqueue `operation` behind every operation submitted before it.
    pub fn submit(&self, operation: Operation) -> Completion {
        let (reply, rx) = oneshot::channel();
        // A failed send drops `reply`, which resolves the completion as closed.
        let _ = self.tx.send(Command::Apply { operation, reply });
        Completion::new(rx)
    }

    /// Whether the serializer has stopped accepting operations.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Apply everything already enqueued, flush persistence, then stop.
    ///
    /// Operations submitted after this call resolve with
    /// [`ContainerError::Closed`]. Closing twice is harmless.
    pub async fn close(&self) {
        let (reply, done) = oneshot::channel();
        if self.tx.send(Command::Close { reply }).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run(committer: Committer, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Apply { operation, reply } => {
                let _ = reply.send(committer.commit(&operation));
            }
            Command::Close { reply } => {
                rx.close();
                while let Some(late) = rx.recv().await {
                    reject(late);
                }
                committer.shutdown().await;
                debug!("operation serializer closed");
                let _ = reply.send(());
                return;
            }
        }
    }
    committer.shutdown().await;
    debug!("operation serializer stopped");
}

fn reject(command: Command) {
    match command {
        Command::Apply { reply, .. } => {
            let _ = reply.send(Err(ContainerError::Closed));
        }
        Command::Close { reply } => {
            let _ = reply.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathstate_path::DottedPathResolver;
    use pathstate_types::{OperationKind, Tree};
    use serde_json::json;

    use crate::operation::Payload;

    fn spawn(initial: Tree) -> (OperationSerializer, watch::Receiver<Arc<Tree>>) {
        let (tree, rx) = watch::channel(Arc::new(initial));
        let serializer = OperationSerializer::spawn(Committer {
            tree,
            resolver: Arc::new(DottedPathResolver),
            writer: None,
            log: false,
        });
        (serializer, rx)
    }

    #[tokio::test]
    async fn operations_apply_in_submission_order() {
        let (s, rx) = spawn(json!({"foo": {"bar": 2, "baz": [1, 2, 3, 4]}}));
        let a = s.submit(Operation::increment("foo.bar", 1));
        let b = s.submit(Operation::transform("foo.bar", |v| {
            json!(v.and_then(Tree::as_i64).unwrap_or(0) * 2)
        }));
        let c = s.submit(Operation::filter("foo.baz", |v| v.as_i64().unwrap_or(0) > 2));
        c.await.unwrap();
        a.await.unwrap();
        b.await.unwrap();

        let tree = rx.borrow().clone();
        assert_eq!(tree["foo"]["bar"], json!(6));
        assert_eq!(tree["foo"]["baz"], json!([3, 4]));
    }

    #[tokio::test]
    async fn chain_recovers_after_programming_error() {
        let (s, rx) = spawn(json!({"n": 1}));
        let bad = s.submit(Operation::new(OperationKind::Push, "n", Payload::None));
        let good = s.submit(Operation::increment("n", 1));

        assert!(matches!(bad.await, Err(ContainerError::Programming(_))));
        good.await.unwrap();
        assert_eq!(rx.borrow()["n"], json!(2));
    }

    #[tokio::test]
    async fn chain_recovers_after_panicking_callback() {
        let (s, rx) = spawn(json!({"n": 1, "list": [1, 2]}));
        let bad = s.submit(Operation::map("list", |_| panic!("callback failed")));
        let good = s.submit(Operation::increment("n", 1));

        match bad.await {
            Err(ContainerError::Programming(ApplyError::Panicked { operation, message })) => {
                assert_eq!(operation, OperationKind::Map);
                assert_eq!(message, "callback failed");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        good.await.unwrap();
        assert_eq!(rx.borrow()["n"], json!(2));
        assert_eq!(rx.borrow()["list"], json!([1, 2]));
        assert!(!s.is_closed());
    }

    #[tokio::test]
    async fn shape_mismatch_is_a_no_op() {
        let (s, rx) = spawn(json!({"n": "x"}));
        s.submit(Operation::increment("n", 1)).await.unwrap();
        assert_eq!(rx.borrow()["n"], json!("x"));
    }

    #[tokio::test]
    async fn close_drains_then_rejects() {
        let (s, rx) = spawn(json!({"n": 0}));
        let queued = s.submit(Operation::increment("n", 5));
        s.close().await;
        queued.await.unwrap();
        assert_eq!(rx.borrow()["n"], json!(5));

        assert!(s.is_closed());
        let late = s.submit(Operation::increment("n", 1)).await;
        assert!(matches!(late, Err(ContainerError::Closed)));
        s.close().await;
    }

    #[tokio::test]
    async fn dropped_completion_still_applies() {
        let (s, rx) = spawn(json!({"flag": false}));
        drop(s.submit(Operation::toggle("flag")));
        s.submit(Operation::set("other", 1)).await.unwrap();
        assert_eq!(rx.borrow()["flag"], json!(true));
    }
}
