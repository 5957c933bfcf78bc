//! PopMovies - movie details, trailers and reviews in the terminal
//!
//! A detail screen for one movie. Trailers and reviews load concurrently in
//! the background and survive a view recreate through a snapshot.
//!
//! # Modules
//!
//! - `models` - Movie, trailer, review and star rating types
//! - `api` - Remote collection sources (TMDB)
//! - `fetch` - Fetch-and-reconcile core: stores, tasks, controller, snapshot
//! - `open` - Opening trailers and reviews outside the app
//! - `ui` - TUI components
//! - `app` - Application state for the interactive mode
//! - `cli`, `commands` - Scriptable command line interface
//! - `config`, `logging` - Ambient setup

pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod open;
pub mod ui;

// Re-export commonly used types
pub use models::{star_state, CollectionKind, Movie, Review, Star, Trailer};

pub use api::{CollectionSource, TmdbClient, TmdbError};
pub use app::App;
pub use fetch::{DetailPresenter, FetchController, FetchError, FetchState, Snapshot};
pub use open::{ExternalTarget, Launcher};
