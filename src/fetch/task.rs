//! Cancellable background fetch of one collection
//!
//! A `FetchTask` performs a single remote call on the tokio worker pool and
//! reports the result to its listener exactly once, unless it was cancelled
//! before the call resolved.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, trace, warn};

use crate::api::CollectionSource;
use crate::fetch::controller::{FetchState, TaskEvent};
use crate::fetch::FetchError;
use crate::models::{CollectionKind, Entry};

/// Result delivered by a finished fetch
pub type Outcome<T> = Result<Vec<T>, FetchError>;

/// Identifies one task instance within a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Listener
// =============================================================================

/// Receives the single completion of a task.
///
/// Called from the worker that ran the fetch. Implementations that need
/// another execution context hop to it themselves (see `ChannelListener`).
pub trait FetchListener<T>: Send + Sync + 'static {
    fn on_success(&self, task: TaskId, items: Vec<T>);
    fn on_failure(&self, task: TaskId, reason: FetchError);
}

/// Listener that forwards completions to the controller's channel
pub struct ChannelListener<T> {
    tx: UnboundedSender<TaskEvent>,
    _entry: PhantomData<fn(T)>,
}

impl<T> ChannelListener<T> {
    pub fn new(tx: UnboundedSender<TaskEvent>) -> Self {
        Self {
            tx,
            _entry: PhantomData,
        }
    }

    fn send(&self, event: TaskEvent) {
        if self.tx.send(event).is_err() {
            // Controller is gone, nobody left to deliver to
            trace!("completion dropped, receiver closed");
        }
    }
}

impl<T: Entry> FetchListener<T> for ChannelListener<T> {
    fn on_success(&self, task: TaskId, items: Vec<T>) {
        self.send(T::into_event(task, Ok(items)));
    }

    fn on_failure(&self, task: TaskId, reason: FetchError) {
        self.send(T::into_event(task, Err(reason)));
    }
}

// =============================================================================
// Task
// =============================================================================

const PENDING: u8 = 0;
const DELIVERED: u8 = 1;
const CANCELLED: u8 = 2;

/// One asynchronous retrieval of a collection for one movie
pub struct FetchTask<T> {
    id: TaskId,
    kind: CollectionKind,
    source: Arc<dyn CollectionSource<T>>,
    listener: Arc<dyn FetchListener<T>>,
    /// Delivery tag shared with the worker. Whoever moves it off PENDING
    /// first decides between delivery and cancellation.
    tag: Arc<AtomicU8>,
    started: bool,
    /// Worker that awaits the fetch and delivers its outcome
    handle: Option<JoinHandle<()>>,
    fetch: Option<AbortHandle>,
}

impl<T> FetchTask<T> {
    pub fn new(
        id: TaskId,
        kind: CollectionKind,
        source: Arc<dyn CollectionSource<T>>,
        listener: Arc<dyn FetchListener<T>>,
    ) -> Self {
        Self {
            id,
            kind,
            source,
            listener,
            tag: Arc::new(AtomicU8::new(PENDING)),
            started: false,
            handle: None,
            fetch: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Cancel the task if it has not resolved yet.
    ///
    /// Returns `true` if this call prevented delivery. Once the remote call
    /// has resolved this is a no-op.
    pub fn cancel(&mut self) -> bool {
        let won = self
            .tag
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.abort_workers();
            debug!(task = %self.id, kind = %self.kind, "fetch cancelled");
        }
        won
    }

    pub fn state(&self) -> FetchState {
        match self.tag.load(Ordering::Acquire) {
            CANCELLED => FetchState::Cancelled,
            DELIVERED => FetchState::Completed,
            _ if self.started => FetchState::InFlight,
            _ => FetchState::NotStarted,
        }
    }

    fn abort_workers(&mut self) {
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl<T: Send + 'static> FetchTask<T> {
    /// Begin the retrieval on the runtime's worker pool. Returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, movie_id: u64) -> Result<(), FetchError> {
        if self.started {
            return Err(FetchError::AlreadyStarted);
        }
        self.started = true;

        if self.tag.load(Ordering::Acquire) == CANCELLED {
            debug!(task = %self.id, kind = %self.kind, "task cancelled before start");
            return Ok(());
        }

        let id = self.id;
        let kind = self.kind;
        let source = Arc::clone(&self.source);
        let listener = Arc::clone(&self.listener);
        let tag = Arc::clone(&self.tag);

        debug!(task = %id, %kind, movie_id, "fetch started");
        // Separate task for the remote call, so a panicking source still
        // resolves as a failure
        let fetch = tokio::spawn(async move { source.fetch_collection(movie_id).await });
        self.fetch = Some(fetch.abort_handle());
        self.handle = Some(tokio::spawn(async move {
            let result = match fetch.await {
                Ok(result) => result.map_err(|err| FetchError::failed(&err)),
                Err(err) if err.is_panic() => {
                    let reason = panic_reason(err.into_panic());
                    warn!(task = %id, %kind, %reason, "fetch panicked");
                    Err(FetchError::FetchFailed(format!("fetch panicked: {}", reason)))
                }
                Err(_) => {
                    debug!(task = %id, %kind, "fetch aborted");
                    return;
                }
            };

            if tag
                .compare_exchange(PENDING, DELIVERED, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                debug!(task = %id, %kind, "fetch resolved after cancel, dropping result");
                return;
            }

            match result {
                Ok(items) => {
                    debug!(task = %id, %kind, count = items.len(), "fetch resolved");
                    listener.on_success(id, items);
                }
                Err(reason) => {
                    debug!(task = %id, %kind, error = %reason, "fetch failed");
                    listener.on_failure(id, reason);
                }
            }
        }));
        Ok(())
    }
}

/// Message carried by a panic payload, if it has one
fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown panic".into()),
    }
}

impl<T> Drop for FetchTask<T> {
    fn drop(&mut self) {
        if self
            .tag
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.abort_workers();
        }
    }
}

impl<T> fmt::Debug for FetchTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTask")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("tag", &self.tag.load(Ordering::Relaxed))
            .field("started", &self.started)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::{mpsc, oneshot};

    type Delivery = (TaskId, Outcome<String>);

    /// Source that resolves when the test releases it
    struct Gated {
        gate: Mutex<Option<oneshot::Receiver<anyhow::Result<Vec<String>>>>>,
    }

    impl Gated {
        fn new() -> (Arc<Self>, oneshot::Sender<anyhow::Result<Vec<String>>>) {
            let (tx, rx) = oneshot::channel();
            (
                Arc::new(Self {
                    gate: Mutex::new(Some(rx)),
                }),
                tx,
            )
        }
    }

    #[async_trait]
    impl CollectionSource<String> for Gated {
        async fn fetch_collection(&self, _movie_id: u64) -> anyhow::Result<Vec<String>> {
            let rx = self.gate.lock().unwrap().take().expect("fetched twice");
            rx.await.unwrap_or_else(|_| Err(anyhow::anyhow!("gate dropped")))
        }
    }

    struct Panicking;

    #[async_trait]
    impl CollectionSource<String> for Panicking {
        async fn fetch_collection(&self, _movie_id: u64) -> anyhow::Result<Vec<String>> {
            panic!("source exploded")
        }
    }

    struct Recorder(mpsc::UnboundedSender<Delivery>);

    impl FetchListener<String> for Recorder {
        fn on_success(&self, task: TaskId, items: Vec<String>) {
            let _ = self.0.send((task, Ok(items)));
        }

        fn on_failure(&self, task: TaskId, reason: FetchError) {
            let _ = self.0.send((task, Err(reason)));
        }
    }

    fn task(source: Arc<dyn CollectionSource<String>>) -> (FetchTask<String>, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = FetchTask::new(
            TaskId(1),
            CollectionKind::Trailers,
            source,
            Arc::new(Recorder(tx)),
        );
        (task, rx)
    }

    #[tokio::test]
    async fn test_delivers_success_once() {
        let (source, gate) = Gated::new();
        let (mut task, mut rx) = task(source);

        task.start(42).unwrap();
        assert_eq!(task.state(), FetchState::InFlight);

        gate.send(Ok(vec!["a".into(), "b".into()])).unwrap();
        let (id, outcome) = rx.recv().await.unwrap();
        assert_eq!(id, TaskId(1));
        assert_eq!(outcome.unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(task.state(), FetchState::Completed);

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delivers_failure() {
        let (source, gate) = Gated::new();
        let (mut task, mut rx) = task(source);

        task.start(42).unwrap();
        gate.send(Err(anyhow::anyhow!("HTTP 500"))).unwrap();

        let (_, outcome) = rx.recv().await.unwrap();
        assert_eq!(outcome, Err(FetchError::FetchFailed("HTTP 500".into())));
    }

    #[tokio::test]
    async fn test_panicking_source_delivers_failure_once() {
        let (mut task, mut rx) = task(Arc::new(Panicking));

        task.start(42).unwrap();
        let (id, outcome) = rx.recv().await.unwrap();
        assert_eq!(id, TaskId(1));
        assert_eq!(
            outcome,
            Err(FetchError::FetchFailed("fetch panicked: source exploded".into()))
        );
        assert_eq!(task.state(), FetchState::Completed);

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let (source, _gate) = Gated::new();
        let (mut task, _rx) = task(source);

        task.start(42).unwrap();
        assert_eq!(task.start(42), Err(FetchError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_cancel_before_resolution_suppresses_delivery() {
        let (source, gate) = Gated::new();
        let (mut task, mut rx) = task(source);

        task.start(42).unwrap();
        assert!(task.cancel());
        assert_eq!(task.state(), FetchState::Cancelled);

        // The worker was aborted, so the gate receiver is gone
        let _ = gate.send(Ok(vec!["late".into()]));
        let res = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(matches!(res, Ok(None) | Err(_)));
    }

    #[tokio::test]
    async fn test_cancel_after_resolution_is_noop() {
        let (source, gate) = Gated::new();
        let (mut task, mut rx) = task(source);

        task.start(42).unwrap();
        gate.send(Ok(vec!["a".into()])).unwrap();
        rx.recv().await.unwrap();

        assert!(!task.cancel());
        assert_eq!(task.state(), FetchState::Completed);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let (source, _gate) = Gated::new();
        let (mut task, mut rx) = task(source);

        assert_eq!(task.state(), FetchState::NotStarted);
        assert!(task.cancel());
        task.start(42).unwrap();
        assert_eq!(task.state(), FetchState::Cancelled);
        assert!(rx.try_recv().is_err());
    }
}
