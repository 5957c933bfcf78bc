//! Terminal UI components
//!
//! Built with ratatui. Keyboard-first navigation throughout.

pub mod theme;
pub mod detail;

pub use detail::{DetailFocus, DetailView};
pub use theme::Theme;
