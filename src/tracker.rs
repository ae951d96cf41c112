//! Loading/value/error tracking for a retryable asynchronous lookup.
//!
//! A tracker starts its operation as soon as it is created and keeps the latest
//! outcome in a `watch` channel. Each start (the initial one and every retry)
//! gets a new generation number, and an outcome is only written if its
//! generation is still the current one. The comparison and the write happen
//! under the channel's lock, so a superseded call can never overwrite the
//! state of a newer one.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error};

use crate::types::StatusError;

/// Observable state of a tracked operation.
#[derive(Debug, Clone)]
pub enum AsyncResult<T> {
    Loading,
    Ready(T),
    Failed(StatusError),
}

impl<T> AsyncResult<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, AsyncResult::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            AsyncResult::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StatusError> {
        match self {
            AsyncResult::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Receives every failure a tracker observes, before it becomes visible.
pub trait ErrorSink: Send + Sync {
    fn post(&self, error: &StatusError);
}

/// Error sink that reports failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn post(&self, err: &StatusError) {
        error!(kind = %err.kind(), error = %err, "Argo CD status lookup failed");
    }
}

/// Current generation together with its result.
#[derive(Debug, Clone)]
pub struct TrackedState<T> {
    pub generation: u64,
    pub result: AsyncResult<T>,
}

type BoxedFuture<T> = Pin<Box<dyn Future<Output = Result<T, StatusError>> + Send>>;
type BoxedOperation<T> = Arc<dyn Fn() -> BoxedFuture<T> + Send + Sync>;

pub struct AsyncTracker<T> {
    operation: BoxedOperation<T>,
    sink: Arc<dyn ErrorSink>,
    state: Arc<watch::Sender<TrackedState<T>>>,
}

impl<T> AsyncTracker<T>
where
    T: Send + Sync + 'static,
{
    /// Start tracking `operation`. The first run is spawned immediately, so
    /// this must be called from within a tokio runtime.
    ///
    /// Results are converted with `Into<T>`; tracking an operation that returns a
    /// single application as `AsyncTracker<ApplicationStatusList>` wraps it in a
    /// one-item list.
    pub fn track<F, Fut, R>(operation: F, sink: Arc<dyn ErrorSink>) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, StatusError>> + Send + 'static,
        R: Into<T> + Send + 'static,
    {
        let operation: BoxedOperation<T> = Arc::new(move || -> BoxedFuture<T> {
            let pending = operation();
            Box::pin(async move { pending.await.map(Into::into) })
        });
        let (state, _) = watch::channel(TrackedState {
            generation: 0,
            result: AsyncResult::Loading,
        });

        let tracker = Self {
            operation,
            sink,
            state: Arc::new(state),
        };
        tracker.spawn(0);
        tracker
    }

    /// Run the operation again from scratch. Any call still in flight is
    /// superseded and its outcome is dropped when it arrives.
    pub fn retry(&self) {
        let mut generation = 0;
        self.state.send_modify(|tracked| {
            tracked.generation += 1;
            tracked.result = AsyncResult::Loading;
            generation = tracked.generation;
        });
        debug!(generation, "Retrying tracked operation");
        self.spawn(generation);
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackedState<T>> {
        self.state.subscribe()
    }

    fn spawn(&self, generation: u64) {
        let pending = (self.operation)();
        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);

        tokio::spawn(async move {
            let result = match pending.await {
                Ok(value) => AsyncResult::Ready(value),
                Err(err) => {
                    sink.post(&err);
                    AsyncResult::Failed(err)
                }
            };

            let applied = state.send_if_modified(|tracked| {
                if tracked.generation != generation {
                    return false;
                }
                tracked.result = result;
                true
            });
            if !applied {
                debug!(generation, "Discarding result of superseded operation");
            }
        });
    }
}

impl<T> AsyncTracker<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn state(&self) -> AsyncResult<T> {
        self.state.borrow().result.clone()
    }

    /// Wait until the current generation has a value or an error.
    pub async fn settled(&self) -> AsyncResult<T> {
        let mut receiver = self.state.subscribe();
        let settled = receiver
            .wait_for(|tracked| !tracked.result.is_loading())
            .await
            .map(|tracked| tracked.result.clone());
        match settled {
            Ok(result) => result,
            Err(_) => self.state(),
        }
    }
}
