//! External resources opened from the detail view
//!
//! Selecting a trailer opens its YouTube watch page, selecting a review
//! opens the review's page. Dispatch goes through the system browser.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::models::{CollectionKind, Review, Trailer};

/// Something the user asked to open outside the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalTarget {
    pub kind: CollectionKind,
    /// Entry title for display ("Official Trailer", review author)
    pub label: String,
    pub url: String,
}

impl ExternalTarget {
    pub fn for_trailer(trailer: &Trailer) -> Self {
        Self {
            kind: CollectionKind::Trailers,
            label: trailer.name.clone(),
            url: trailer.watch_url(),
        }
    }

    pub fn for_review(review: &Review) -> Self {
        Self {
            kind: CollectionKind::Reviews,
            label: review.author.clone(),
            url: review.url.clone(),
        }
    }
}

impl fmt::Display for ExternalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.label, self.url)
    }
}

/// Errors from opening an external target
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("Refusing to open non-http URL: {0}")]
    UnsupportedUrl(String),
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(#[from] std::io::Error),
}

/// Dispatches targets outside the application
pub trait Launcher {
    fn launch(&self, target: &ExternalTarget) -> Result<(), OpenError>;
}

/// Opens targets in the system web browser
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserLauncher;

impl Launcher for BrowserLauncher {
    fn launch(&self, target: &ExternalTarget) -> Result<(), OpenError> {
        check_url(&target.url)?;
        info!(url = %target.url, "opening in browser");
        webbrowser::open(&target.url)?;
        Ok(())
    }
}

/// Only web links are handed to the browser
pub fn check_url(url: &str) -> Result<(), OpenError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(OpenError::UnsupportedUrl(url.to_string()))
    }
}
