//! State carried across a view recreate boundary

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fetch::FetchError;
use crate::models::{CollectionKind, Entry};

/// Captured contents of both collections for one movie.
///
/// Only kinds that finished loading are recorded. An absent kind means
/// "fetch again"; a present but empty kind means "known to be empty".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub movie_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trailers: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reviews: Option<serde_json::Value>,
}

impl Snapshot {
    pub fn new(movie_id: u64) -> Self {
        Self {
            movie_id,
            ..Self::default()
        }
    }

    fn slot(&self, kind: CollectionKind) -> &Option<serde_json::Value> {
        match kind {
            CollectionKind::Trailers => &self.trailers,
            CollectionKind::Reviews => &self.reviews,
        }
    }

    fn slot_mut(&mut self, kind: CollectionKind) -> &mut Option<serde_json::Value> {
        match kind {
            CollectionKind::Trailers => &mut self.trailers,
            CollectionKind::Reviews => &mut self.reviews,
        }
    }

    /// Record the contents of one kind
    pub fn put<T: Entry>(&mut self, items: &[T]) -> Result<(), FetchError> {
        let value = serde_json::to_value(items).map_err(|e| FetchError::SnapshotCorrupt {
            kind: T::KIND,
            reason: e.to_string(),
        })?;
        *self.slot_mut(T::KIND) = Some(value);
        Ok(())
    }

    /// Decode one kind. `Ok(None)` if the kind was not recorded.
    pub fn get<T: Entry>(&self) -> Result<Option<Vec<T>>, FetchError> {
        match self.slot(T::KIND) {
            None => Ok(None),
            Some(value) => Vec::<T>::deserialize(value)
                .map(Some)
                .map_err(|e| FetchError::SnapshotCorrupt {
                    kind: T::KIND,
                    reason: e.to_string(),
                }),
        }
    }

    /// Whether a kind was recorded (possibly empty)
    pub fn contains(&self, kind: CollectionKind) -> bool {
        self.slot(kind).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.trailers.is_none() && self.reviews.is_none()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("encoding snapshot")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("decoding snapshot")
    }

    /// Write the snapshot to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("writing snapshot to {}", path.display()))
    }

    /// Read a snapshot from a file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot from {}", path.display()))?;
        Self::from_json(&json)
    }
}
