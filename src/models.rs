//! Data structures and types for PopMovies
//!
//! Core types for the movie detail screen: the movie itself, the two
//! related collections (trailers and reviews) and the star rating row.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fetch::{Outcome, TaskEvent, TaskId};

/// TMDB image CDN base
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// YouTube watch page base, `key` is appended
pub const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

// =============================================================================
// Movie
// =============================================================================

/// A single movie as shown on the detail screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub overview: String,
    /// Release date as provided by TMDB ("2022-03-01")
    pub release_date: Option<String>,
    /// User rating on a 0-10 scale
    pub vote_average: Option<f32>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

impl Movie {
    /// Poster image URL (w185)
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|p| format!("{}/w185{}", IMAGE_BASE_URL, p))
    }

    /// Backdrop image URL (w780)
    pub fn backdrop_url(&self) -> Option<String> {
        self.backdrop_path
            .as_deref()
            .map(|p| format!("{}/w780{}", IMAGE_BASE_URL, p))
    }

    /// Release year, if the date string carries one
    pub fn year(&self) -> Option<u16> {
        self.release_date.as_deref().and_then(extract_year)
    }

    /// Star row for this movie's rating
    pub fn stars(&self) -> [Star; STAR_COUNT] {
        star_state(self.vote_average)
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year() {
            Some(year) => write!(f, "{} ({})", self.title, year),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Extract year from a date string like "2022-03-04"
pub fn extract_year(date: &str) -> Option<u16> {
    date.get(..4).and_then(|y| y.parse().ok())
}

// =============================================================================
// Collection Kinds
// =============================================================================

/// The two related collections fetched for a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Trailers,
    Reviews,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 2] = [CollectionKind::Trailers, CollectionKind::Reviews];
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Trailers => write!(f, "trailers"),
            CollectionKind::Reviews => write!(f, "reviews"),
        }
    }
}

/// An entry of one of the related collections
///
/// Entries are immutable values that cross from the fetch workers to the
/// main context, and are serialized into snapshots.
pub trait Entry: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Which collection this entry belongs to
    const KIND: CollectionKind;

    /// Wrap a fetch outcome for delivery to the controller
    fn into_event(task: TaskId, outcome: Outcome<Self>) -> TaskEvent;
}

// =============================================================================
// Trailer
// =============================================================================

/// A trailer (TMDB video) for a movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trailer {
    pub id: String,
    /// Site-specific video key (YouTube video id)
    pub key: String,
    pub name: String,
    pub site: String,
    /// TMDB video type: "Trailer", "Teaser", "Clip", ...
    #[serde(default)]
    pub kind: String,
}

impl Trailer {
    /// Watch page URL for this trailer
    pub fn watch_url(&self) -> String {
        format!("{}{}", YOUTUBE_WATCH_URL, urlencoding::encode(&self.key))
    }

    /// Thumbnail for the list cell
    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/0.jpg", urlencoding::encode(&self.key))
    }
}

impl Entry for Trailer {
    const KIND: CollectionKind = CollectionKind::Trailers;

    fn into_event(task: TaskId, outcome: Outcome<Self>) -> TaskEvent {
        TaskEvent::Trailers { task, outcome }
    }
}

impl fmt::Display for Trailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} [{}]", self.name, self.kind)
        }
    }
}

// =============================================================================
// Review
// =============================================================================

/// A user review for a movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub content: String,
    /// Direct link to the full review
    pub url: String,
}

impl Review {
    /// First line of the review, trimmed to `max` characters
    pub fn excerpt(&self, max: usize) -> String {
        let first = self.content.lines().next().unwrap_or_default().trim();
        if first.chars().count() <= max {
            first.to_string()
        } else {
            let cut: String = first.chars().take(max.saturating_sub(1)).collect();
            format!("{}…", cut)
        }
    }
}

impl Entry for Review {
    const KIND: CollectionKind = CollectionKind::Reviews;

    fn into_event(task: TaskId, outcome: Outcome<Self>) -> TaskEvent {
        TaskEvent::Reviews { task, outcome }
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.author, self.excerpt(60))
    }
}

// =============================================================================
// Star Rating
// =============================================================================

/// Number of glyphs in the rating row
pub const STAR_COUNT: usize = 5;

/// One glyph of the rating row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Star {
    Empty,
    Half,
    Full,
}

impl Star {
    pub fn glyph(self) -> char {
        match self {
            Star::Empty => '☆',
            Star::Half => '⯪',
            Star::Full => '★',
        }
    }
}

/// Star row for a 0-10 rating
///
/// The rating is halved onto a 0-5 scale. Star `i` is full once the scaled
/// rating reaches `i + 1` and half once it reaches `i + 0.5`. The first star
/// needs strictly more than `0.5` to show half.
pub fn star_state(rating: Option<f32>) -> [Star; STAR_COUNT] {
    let mut stars = [Star::Empty; STAR_COUNT];
    let scaled = match rating {
        Some(r) if r.is_finite() && r > 0.0 => (r / 2.0).min(STAR_COUNT as f32),
        _ => return stars,
    };

    for (i, star) in stars.iter_mut().enumerate() {
        let half = if i == 0 {
            scaled > 0.5
        } else {
            scaled >= i as f32 + 0.5
        };
        if scaled >= i as f32 + 1.0 {
            *star = Star::Full;
        } else if half {
            *star = Star::Half;
        }
    }
    stars
}

/// Render a star row as glyphs
pub fn star_string(stars: &[Star]) -> String {
    stars.iter().map(|s| s.glyph()).collect()
}

/// Rating text shown next to the stars, hidden when there is no rating
pub fn rating_label(rating: Option<f32>) -> Option<String> {
    rating
        .filter(|r| r.is_finite())
        .map(|r| format!("{:.1}/10", r))
}

// =============================================================================
// Tests
// =============================================================================
