//! TMDB (The Movie Database) API client
//!
//! Provides movie metadata plus the trailer and review collections.
//! API docs: https://developer.themoviedb.org/docs

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::api::CollectionSource;
use crate::config::Config;
use crate::models::{Movie, Review, Trailer};

/// Default API base
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB API error types
#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("Unauthorized (401), check the TMDB API key")]
    Unauthorized,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// TMDB API client
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl TmdbClient {
    /// Create a new TMDB client with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::build(api_key.into(), base_url.into(), Duration::from_secs(30))
    }

    /// Create a client from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.tmdb_api_key()?;
        Ok(Self::build(
            api_key,
            config.api_base_url(),
            Duration::from_secs(config.request_timeout_secs()),
        ))
    }

    fn build(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Make an authenticated GET request. One attempt, no retry.
    async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%endpoint, "TMDB request");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(TmdbError::from)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(TmdbError::from)?;
                let parsed: T = serde_json::from_str(&body).map_err(|e| {
                    TmdbError::InvalidResponse(format!("JSON parse error: {}", e))
                })?;
                Ok(parsed)
            }
            StatusCode::NOT_FOUND => Err(TmdbError::NotFound.into()),
            StatusCode::UNAUTHORIZED => Err(TmdbError::Unauthorized.into()),
            status => Err(TmdbError::ServerError(status.as_u16()).into()),
        }
    }

    /// Get movie details by ID
    pub async fn movie_detail(&self, id: u64) -> Result<Movie> {
        let endpoint = format!("/movie/{}", id);
        let response: MovieResponse = self
            .get(&endpoint)
            .await
            .with_context(|| format!("loading movie {}", id))?;
        Ok(response.into_movie())
    }

    /// Get trailers for a movie, in the order TMDB lists them
    pub async fn trailers(&self, id: u64) -> Result<Vec<Trailer>> {
        let endpoint = format!("/movie/{}/videos", id);
        let response: VideosResponse = self
            .get(&endpoint)
            .await
            .with_context(|| format!("loading trailers for movie {}", id))?;
        Ok(response.into_trailers())
    }

    /// Get reviews for a movie (first page)
    pub async fn reviews(&self, id: u64) -> Result<Vec<Review>> {
        let endpoint = format!("/movie/{}/reviews", id);
        let response: ReviewsResponse = self
            .get(&endpoint)
            .await
            .with_context(|| format!("loading reviews for movie {}", id))?;
        Ok(response.into_reviews())
    }
}

#[async_trait]
impl CollectionSource<Trailer> for TmdbClient {
    async fn fetch_collection(&self, movie_id: u64) -> Result<Vec<Trailer>> {
        self.trailers(movie_id).await
    }
}

#[async_trait]
impl CollectionSource<Review> for TmdbClient {
    async fn fetch_collection(&self, movie_id: u64) -> Result<Vec<Review>> {
        self.reviews(movie_id).await
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct MovieResponse {
    id: u64,
    title: String,
    overview: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

impl MovieResponse {
    fn into_movie(self) -> Movie {
        Movie {
            id: self.id,
            title: self.title,
            overview: self.overview.unwrap_or_default(),
            release_date: self.release_date.filter(|d| !d.is_empty()),
            vote_average: self.vote_average,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    results: Vec<VideoRaw>,
}

impl VideosResponse {
    fn into_trailers(self) -> Vec<Trailer> {
        self.results
            .into_iter()
            .filter_map(|v| v.into_trailer())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct VideoRaw {
    id: String,
    key: String,
    name: Option<String>,
    site: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl VideoRaw {
    fn into_trailer(self) -> Option<Trailer> {
        // Only YouTube keys can be turned into a watch URL
        if !self.site.eq_ignore_ascii_case("youtube") || self.key.is_empty() {
            return None;
        }

        Some(Trailer {
            id: self.id,
            key: self.key,
            name: self.name.unwrap_or_default(),
            site: self.site,
            kind: self.kind.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReviewsResponse {
    results: Vec<ReviewRaw>,
}

impl ReviewsResponse {
    fn into_reviews(self) -> Vec<Review> {
        self.results.into_iter().map(|r| r.into_review()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct ReviewRaw {
    id: String,
    author: String,
    content: Option<String>,
    url: String,
}

impl ReviewRaw {
    fn into_review(self) -> Review {
        Review {
            id: self.id,
            author: self.author,
            content: self.content.unwrap_or_default(),
            url: self.url,
        }
    }
}
