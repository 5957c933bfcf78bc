//! Asynchronous fetch-and-reconcile core
//!
//! - `store`: append-only per-kind collection store
//! - `task`: cancellable single-shot background fetch
//! - `controller`: restore-or-fetch orchestration for one view instance
//! - `snapshot`: state handed across a view recreate boundary

pub mod controller;
pub mod error;
pub mod snapshot;
pub mod store;
pub mod task;

pub use controller::{CollectionUpdate, DetailPresenter, FetchController, FetchState, TaskEvent};
pub use error::FetchError;
pub use snapshot::Snapshot;
pub use store::CollectionStore;
pub use task::{ChannelListener, FetchListener, FetchTask, Outcome, TaskId};
