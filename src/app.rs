//! App state and core application logic
//!
//! `App` hosts one detail view instance at a time. The view and its fetch
//! controller live and die together: `recreate` tears the current pair
//! down and builds a new one, carrying the loaded collections across in a
//! snapshot.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::api::CollectionSource;
use crate::fetch::{FetchController, FetchError, Snapshot};
use crate::models::{Movie, Review, Trailer};
use crate::open::Launcher;
use crate::ui::DetailView;

/// Main application state
pub struct App<S> {
    /// Whether the app is running
    pub running: bool,
    /// Message from the last user action that failed
    pub error: Option<String>,
    /// Message from the last user action that succeeded
    pub status: Option<String>,
    source: Arc<S>,
    controller: FetchController<S, DetailView>,
    launcher: Box<dyn Launcher>,
    /// Number of view instances created so far
    generation: u32,
}

impl<S> App<S>
where
    S: CollectionSource<Trailer> + CollectionSource<Review>,
{
    /// Create the first view instance for `movie`. Nothing is fetched until
    /// `start`.
    pub fn new(movie: Movie, source: Arc<S>, launcher: Box<dyn Launcher>) -> Self {
        let controller = FetchController::new(movie.id, Arc::clone(&source), DetailView::new(movie));
        Self {
            running: true,
            error: None,
            status: None,
            source,
            controller,
            launcher,
            generation: 1,
        }
    }

    /// Initialize the current view instance. Must run inside a tokio runtime.
    pub fn start(&mut self, snapshot: Option<&Snapshot>) -> Result<(), FetchError> {
        self.controller.initialize(snapshot)
    }

    pub fn view(&self) -> &DetailView {
        self.controller.presenter()
    }

    pub fn controller(&self) -> &FetchController<S, DetailView> {
        &self.controller
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Apply completions that arrived since the last tick
    pub fn tick(&mut self) -> usize {
        self.controller.drain_ready()
    }

    /// Replace the view instance.
    ///
    /// Captures the current stores, tears the old controller down and
    /// seeds a fresh one from the capture. Kinds that were still loading
    /// are fetched again by the new instance. Focus and selection carry
    /// over.
    pub fn recreate(&mut self) -> Result<(), FetchError> {
        let snapshot = self.controller.capture_snapshot();
        self.controller.teardown();

        let old = self.controller.presenter();
        let mut view = DetailView::new(old.movie.clone());
        view.focus = old.focus;
        view.selected_trailer = old.selected_trailer;
        view.selected_review = old.selected_review;
        view.overview_scroll = old.overview_scroll;

        // Dropping the old controller here is a no-op, it is already torn down
        self.controller = FetchController::new(snapshot.movie_id, Arc::clone(&self.source), view);
        self.generation += 1;
        info!(
            movie_id = snapshot.movie_id,
            generation = self.generation,
            "detail view recreated"
        );
        self.controller.initialize(Some(&snapshot))
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.running = false;
        self.controller.teardown();
    }

    /// Open the entry under the cursor. Returns `false` if nothing is
    /// selected.
    pub fn open_selected(&mut self) -> bool {
        let Some((kind, index)) = self.view().selected() else {
            return false;
        };
        let Some(target) = self.controller.select(kind, index) else {
            return false;
        };

        match self.launcher.launch(&target) {
            Ok(()) => self.status = Some(format!("Opened {}", target)),
            Err(e) => {
                warn!(url = %target.url, error = %e, "could not open target");
                self.error = Some(e.to_string());
            }
        }
        true
    }

    // -------------------------------------------------------------------------
    // Keyboard Event Handling
    // -------------------------------------------------------------------------

    /// Handle keyboard event, returns true if event was consumed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Clear messages on any keypress
        self.error = None;
        self.status = None;

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.quit();
                true
            }
            KeyCode::Tab => {
                self.controller.presenter_mut().focus_next();
                true
            }
            KeyCode::BackTab => {
                self.controller.presenter_mut().focus_prev();
                true
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.controller.presenter_mut().up();
                true
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.controller.presenter_mut().down();
                true
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('r') => {
                if let Err(e) = self.recreate() {
                    self.error = Some(e.to_string());
                }
                true
            }
            _ => false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
