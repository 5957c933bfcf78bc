//! Fetch-and-reconcile controller for one detail view instance
//!
//! Owns the trailer and review stores, decides per kind whether to restore
//! from a snapshot or launch a fetch, and applies completions on the main
//! context. All mutation happens through `&mut self`; workers only hand
//! immutable results across the channel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::api::CollectionSource;
use crate::fetch::task::{ChannelListener, FetchListener, FetchTask, Outcome, TaskId};
use crate::fetch::{CollectionStore, FetchError, Snapshot};
use crate::models::{CollectionKind, Entry, Review, Trailer};
use crate::open::ExternalTarget;

// =============================================================================
// Public Types
// =============================================================================

/// Lifecycle of one collection kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    NotStarted,
    InFlight,
    Completed,
    Cancelled,
}

/// Completion handed from a worker to the controller
#[derive(Debug)]
pub enum TaskEvent {
    Trailers { task: TaskId, outcome: Outcome<Trailer> },
    Reviews { task: TaskId, outcome: Outcome<Review> },
}

impl TaskEvent {
    pub fn kind(&self) -> CollectionKind {
        match self {
            TaskEvent::Trailers { .. } => CollectionKind::Trailers,
            TaskEvent::Reviews { .. } => CollectionKind::Reviews,
        }
    }

    pub fn task(&self) -> TaskId {
        match self {
            TaskEvent::Trailers { task, .. } | TaskEvent::Reviews { task, .. } => *task,
        }
    }
}

/// Full, ordered contents of a store after it changed
#[derive(Debug, Clone, Copy)]
pub enum CollectionUpdate<'a> {
    Trailers(&'a [Trailer]),
    Reviews(&'a [Review]),
}

impl CollectionUpdate<'_> {
    pub fn kind(&self) -> CollectionKind {
        match self {
            CollectionUpdate::Trailers(_) => CollectionKind::Trailers,
            CollectionUpdate::Reviews(_) => CollectionKind::Reviews,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CollectionUpdate::Trailers(items) => items.len(),
            CollectionUpdate::Reviews(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Presentation layer as seen by the controller
///
/// `render_update` always carries the complete list, so rendering the same
/// contents twice must be harmless.
pub trait DetailPresenter {
    fn render_update(&mut self, update: CollectionUpdate<'_>);

    /// Observability hook for failed fetches. The list still renders empty.
    fn report_failure(&mut self, _kind: CollectionKind, _reason: &FetchError) {}
}

/// Headless presenter
impl DetailPresenter for () {
    fn render_update(&mut self, _update: CollectionUpdate<'_>) {}
}

// =============================================================================
// Per-kind Slots
// =============================================================================

#[derive(Debug)]
struct Slot<T> {
    store: CollectionStore<T>,
    state: FetchState,
    task: Option<FetchTask<T>>,
    /// Completed through a failure; such kinds are not snapshotted
    failed: bool,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            store: CollectionStore::new(),
            state: FetchState::NotStarted,
            task: None,
            failed: false,
        }
    }

    fn cancel(&mut self) {
        // Mark first so a completion racing with cancel is rejected here
        if self.state == FetchState::InFlight {
            self.state = FetchState::Cancelled;
        }
        if let Some(task) = self.task.as_mut() {
            task.cancel();
        }
    }
}

#[derive(Debug)]
struct Slots {
    trailers: Slot<Trailer>,
    reviews: Slot<Review>,
}

/// Maps an entry type to its slot and update variant
trait Reconciled: Entry {
    fn slot(slots: &Slots) -> &Slot<Self>;
    fn slot_mut(slots: &mut Slots) -> &mut Slot<Self>;
    fn update(items: &[Self]) -> CollectionUpdate<'_>;
}

impl Reconciled for Trailer {
    fn slot(slots: &Slots) -> &Slot<Self> {
        &slots.trailers
    }

    fn slot_mut(slots: &mut Slots) -> &mut Slot<Self> {
        &mut slots.trailers
    }

    fn update(items: &[Self]) -> CollectionUpdate<'_> {
        CollectionUpdate::Trailers(items)
    }
}

impl Reconciled for Review {
    fn slot(slots: &Slots) -> &Slot<Self> {
        &slots.reviews
    }

    fn slot_mut(slots: &mut Slots) -> &mut Slot<Self> {
        &mut slots.reviews
    }

    fn update(items: &[Self]) -> CollectionUpdate<'_> {
        CollectionUpdate::Reviews(items)
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Drives the trailer and review fetches for one view instance
///
/// Never shared between view instances. A recreated view gets a new
/// controller, seeded from the old one's `capture_snapshot()`.
pub struct FetchController<S, P> {
    movie_id: u64,
    source: Arc<S>,
    presenter: P,
    slots: Slots,
    tx: Option<UnboundedSender<TaskEvent>>,
    rx: UnboundedReceiver<TaskEvent>,
    next_task: u64,
    torn_down: bool,
}

impl<S, P> FetchController<S, P> {
    pub fn movie_id(&self) -> u64 {
        self.movie_id
    }

    pub fn state(&self, kind: CollectionKind) -> FetchState {
        match kind {
            CollectionKind::Trailers => self.slots.trailers.state,
            CollectionKind::Reviews => self.slots.reviews.state,
        }
    }

    pub fn trailers(&self) -> &[Trailer] {
        self.slots.trailers.store.as_slice()
    }

    pub fn reviews(&self) -> &[Review] {
        self.slots.reviews.store.as_slice()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn has_in_flight(&self) -> bool {
        CollectionKind::ALL
            .iter()
            .any(|&k| self.state(k) == FetchState::InFlight)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Resolve a user selection to the resource it should open
    pub fn select(&self, kind: CollectionKind, index: usize) -> Option<ExternalTarget> {
        match kind {
            CollectionKind::Trailers => self
                .slots
                .trailers
                .store
                .get(index)
                .map(ExternalTarget::for_trailer),
            CollectionKind::Reviews => self
                .slots
                .reviews
                .store
                .get(index)
                .map(ExternalTarget::for_review),
        }
    }

    /// Cancel in-flight fetches. Nothing reaches the presenter afterwards.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.slots.trailers.cancel();
        self.slots.reviews.cancel();
        self.tx = None;
        self.rx.close();
        info!(movie_id = self.movie_id, "detail controller torn down");
    }

    /// Capture both stores for the next view instance.
    ///
    /// Kinds still in flight, or whose fetch failed, are left out so that
    /// the next instance fetches them again.
    pub fn capture_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new(self.movie_id);
        capture_kind(&self.slots.trailers, &mut snapshot);
        capture_kind(&self.slots.reviews, &mut snapshot);
        snapshot
    }
}

fn capture_kind<T: Entry>(slot: &Slot<T>, snapshot: &mut Snapshot) {
    if slot.state != FetchState::Completed || slot.failed {
        return;
    }
    if let Err(err) = snapshot.put(slot.store.as_slice()) {
        warn!(kind = %T::KIND, error = %err, "could not capture collection");
    }
}

impl<S, P> FetchController<S, P>
where
    S: CollectionSource<Trailer> + CollectionSource<Review>,
    P: DetailPresenter,
{
    /// Create a controller with empty stores. Nothing is fetched until
    /// `initialize`.
    pub fn new(movie_id: u64, source: Arc<S>, presenter: P) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            movie_id,
            source,
            presenter,
            slots: Slots {
                trailers: Slot::new(),
                reviews: Slot::new(),
            },
            tx: Some(tx),
            rx,
            next_task: 0,
            torn_down: false,
        }
    }

    /// Restore or fetch each kind.
    ///
    /// A kind recorded in `snapshot` is restored synchronously and rendered
    /// right away; any other kind gets a fetch task. Kinds already in
    /// flight or completed are left alone. Must run inside a tokio runtime.
    pub fn initialize(&mut self, snapshot: Option<&Snapshot>) -> Result<(), FetchError> {
        if self.torn_down {
            warn!(movie_id = self.movie_id, "initialize after teardown ignored");
            return Ok(());
        }

        let snapshot = snapshot.filter(|s| {
            if s.movie_id == self.movie_id {
                true
            } else {
                warn!(
                    movie_id = self.movie_id,
                    snapshot_movie_id = s.movie_id,
                    "ignoring snapshot captured for another movie"
                );
                false
            }
        });

        self.initialize_kind::<Trailer>(snapshot)?;
        self.initialize_kind::<Review>(snapshot)?;
        Ok(())
    }

    fn initialize_kind<T: Reconciled>(&mut self, snapshot: Option<&Snapshot>) -> Result<(), FetchError>
    where
        S: CollectionSource<T>,
    {
        let state = T::slot(&self.slots).state;
        if !matches!(state, FetchState::NotStarted | FetchState::Cancelled) {
            debug!(kind = %T::KIND, ?state, "kind already initialized");
            return Ok(());
        }

        let restored = snapshot.and_then(|s| match s.get::<T>() {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err, "falling back to fetch");
                None
            }
        });

        match restored {
            Some(items) => {
                let slot = T::slot_mut(&mut self.slots);
                slot.store.restore(items);
                slot.state = FetchState::Completed;
                info!(
                    movie_id = self.movie_id,
                    kind = %T::KIND,
                    count = slot.store.len(),
                    "restored from snapshot"
                );
                self.presenter.render_update(T::update(slot.store.as_slice()));
                Ok(())
            }
            None => self.launch::<T>(),
        }
    }

    fn launch<T: Reconciled>(&mut self) -> Result<(), FetchError>
    where
        S: CollectionSource<T>,
    {
        let Some(tx) = self.tx.as_ref() else {
            return Ok(());
        };

        self.next_task += 1;
        let id = TaskId(self.next_task);
        let source: Arc<dyn CollectionSource<T>> = self.source.clone();
        let listener: Arc<dyn FetchListener<T>> = Arc::new(ChannelListener::<T>::new(tx.clone()));

        let mut task = FetchTask::new(id, T::KIND, source, listener);
        task.start(self.movie_id)?;

        let slot = T::slot_mut(&mut self.slots);
        slot.task = Some(task);
        slot.state = FetchState::InFlight;
        Ok(())
    }

    /// Apply one completion. Returns `false` if it was ignored.
    pub fn handle_event(&mut self, event: TaskEvent) -> bool {
        match event {
            TaskEvent::Trailers { task, outcome } => self.complete::<Trailer>(task, outcome),
            TaskEvent::Reviews { task, outcome } => self.complete::<Review>(task, outcome),
        }
    }

    fn complete<T: Reconciled>(&mut self, task: TaskId, outcome: Outcome<T>) -> bool {
        let slot = T::slot_mut(&mut self.slots);
        let current = slot.task.as_ref().map(|t| t.id());

        if self.torn_down || slot.state != FetchState::InFlight || current != Some(task) {
            let err = FetchError::DuplicateDelivery(T::KIND);
            debug!(%task, state = ?slot.state, torn_down = self.torn_down, "{}", err);
            return false;
        }

        slot.state = FetchState::Completed;
        match outcome {
            Ok(items) => {
                info!(
                    movie_id = self.movie_id,
                    kind = %T::KIND,
                    count = items.len(),
                    "collection loaded"
                );
                slot.store.append(items);
            }
            Err(reason) => {
                slot.failed = true;
                warn!(
                    movie_id = self.movie_id,
                    kind = %T::KIND,
                    error = %reason,
                    "fetch failed, showing empty list"
                );
                self.presenter.report_failure(T::KIND, &reason);
            }
        }

        self.presenter.render_update(T::update(slot.store.as_slice()));
        true
    }

    /// Wait for the next completion and apply it.
    ///
    /// Returns `false` without waiting when nothing is in flight.
    pub async fn next_event(&mut self) -> bool {
        if !self.has_in_flight() {
            return false;
        }
        match self.rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply every completion that is already waiting, without blocking
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            if self.handle_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Run until no kind is in flight
    pub async fn settle(&mut self) {
        while self.next_event().await {}
    }
}

impl<S, P> Drop for FetchController<S, P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<S, P> std::fmt::Debug for FetchController<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchController")
            .field("movie_id", &self.movie_id)
            .field("trailers", &self.slots.trailers.state)
            .field("reviews", &self.slots.reviews.state)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
