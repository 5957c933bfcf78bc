//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the appropriate backend services.
//! Each handler takes CLI args, the resolved config and Output, returns
//! ExitCode.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::api::{TmdbClient, TmdbError};
use crate::cli::{
    CollectionCmd, CollectionStates, DetailCmd, DetailResponse, ExitCode, OpenCmd, Output,
    StarsCmd, StarsResponse,
};
use crate::config::Config;
use crate::fetch::{CollectionUpdate, DetailPresenter, FetchController, FetchError, FetchState, Snapshot};
use crate::models::{rating_label, star_state, star_string, CollectionKind, Review, Trailer};
use crate::open::{BrowserLauncher, ExternalTarget, Launcher};

/// Map a remote failure onto the CLI's exit codes
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<TmdbError>() {
        Some(TmdbError::NotFound) => ExitCode::NotFound,
        Some(TmdbError::RequestFailed(_)) | Some(TmdbError::ServerError(_)) => ExitCode::NetworkError,
        _ => ExitCode::Error,
    }
}

fn client(config: &Config, output: &Output) -> Result<Arc<TmdbClient>, ExitCode> {
    TmdbClient::from_config(config)
        .map(Arc::new)
        .map_err(|e| output.error(format!("{:#}", e), ExitCode::Error))
}

/// Headless presenter that keeps the failures the controller reports
#[derive(Debug, Default)]
struct FailureLog {
    failures: BTreeMap<CollectionKind, String>,
}

impl DetailPresenter for FailureLog {
    fn render_update(&mut self, _update: CollectionUpdate<'_>) {}

    fn report_failure(&mut self, kind: CollectionKind, reason: &FetchError) {
        self.failures.insert(kind, reason.to_string());
    }
}

// =============================================================================
// Detail Command
// =============================================================================

pub async fn detail_cmd(cmd: DetailCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let snapshot = match cmd.restore.as_deref().map(Snapshot::load).transpose() {
        Ok(s) => s,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };

    // Collections load in the background while the movie itself is fetched
    let mut controller = FetchController::new(cmd.id, Arc::clone(&client), FailureLog::default());
    if let Err(e) = controller.initialize(snapshot.as_ref()) {
        return output.error(e.to_string(), ExitCode::Error);
    }
    let restored: Vec<CollectionKind> = CollectionKind::ALL
        .into_iter()
        .filter(|&k| controller.state(k) == FetchState::Completed)
        .collect();

    output.info(format!("Loading movie {}...", cmd.id));
    let movie = match client.movie_detail(cmd.id).await {
        Ok(m) => m,
        Err(e) => return output.error(format!("{:#}", e), exit_code_for(&e)),
    };

    controller.settle().await;

    if let Some(path) = &cmd.save {
        if let Err(e) = controller.capture_snapshot().save(path) {
            return output.error(format!("{:#}", e), ExitCode::Error);
        }
        output.info(format!("Snapshot saved to {}", path.display()));
    }

    for (kind, reason) in &controller.presenter().failures {
        output.info(format!("Could not load {}: {}", kind, reason));
    }

    let response = DetailResponse {
        stars: star_string(&movie.stars()),
        rating: rating_label(movie.vote_average),
        trailers: controller.trailers().to_vec(),
        reviews: controller.reviews().to_vec(),
        state: CollectionStates {
            trailers: controller.state(CollectionKind::Trailers),
            reviews: controller.state(CollectionKind::Reviews),
        },
        restored,
        movie,
    };

    if output.json {
        return print(&response, output);
    }

    output.line(&response.movie);
    match &response.rating {
        Some(label) => output.line(format!("{}  {}", response.stars, label)),
        None => output.line(&response.stars),
    }
    if let Some(date) = &response.movie.release_date {
        output.line(format!("Released: {}", date));
    }
    if !response.movie.overview.is_empty() {
        output.line("");
        output.line(&response.movie.overview);
    }
    output.line("");
    print_trailers(&response.trailers, output);
    output.line("");
    print_reviews(&response.reviews, output);
    ExitCode::Success
}

fn print<T: Serialize>(data: &T, output: &Output) -> ExitCode {
    if let Err(e) = output.print(data) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

fn print_trailers(trailers: &[Trailer], output: &Output) {
    output.line(format!("Trailers ({}):", trailers.len()));
    if trailers.is_empty() {
        output.line("  No trailers");
    }
    for (i, trailer) in trailers.iter().enumerate() {
        output.line(format!("  [{}] {}  {}", i, trailer, trailer.watch_url()));
        output.line(format!("      thumbnail: {}", trailer.thumbnail_url()));
    }
}

fn print_reviews(reviews: &[Review], output: &Output) {
    output.line(format!("Reviews ({}):", reviews.len()));
    if reviews.is_empty() {
        output.line("  No reviews");
    }
    for (i, review) in reviews.iter().enumerate() {
        output.line(format!("  [{}] {}", i, review));
    }
}

// =============================================================================
// Trailers / Reviews Commands
// =============================================================================

pub async fn trailers_cmd(cmd: CollectionCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    output.info(format!("Fetching trailers for movie {}...", cmd.id));
    match client.trailers(cmd.id).await {
        Ok(trailers) if output.json => print(&trailers, output),
        Ok(trailers) => {
            print_trailers(&trailers, output);
            ExitCode::Success
        }
        Err(e) => output.error(format!("{:#}", e), exit_code_for(&e)),
    }
}

pub async fn reviews_cmd(cmd: CollectionCmd, config: &Config, output: &Output) -> ExitCode {
    let client = match client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    output.info(format!("Fetching reviews for movie {}...", cmd.id));
    match client.reviews(cmd.id).await {
        Ok(reviews) if output.json => print(&reviews, output),
        Ok(reviews) => {
            print_reviews(&reviews, output);
            ExitCode::Success
        }
        Err(e) => output.error(format!("{:#}", e), exit_code_for(&e)),
    }
}

// =============================================================================
// Open Command
// =============================================================================

pub async fn open_cmd(cmd: OpenCmd, config: &Config, output: &Output) -> ExitCode {
    open_with(cmd, config, output, &BrowserLauncher).await
}

/// `open` with an explicit launcher
pub async fn open_with(
    cmd: OpenCmd,
    config: &Config,
    output: &Output,
    launcher: &dyn Launcher,
) -> ExitCode {
    let client = match client(config, output) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let kind = CollectionKind::from(cmd.kind);
    let mut controller = FetchController::new(cmd.id, client, FailureLog::default());
    if let Err(e) = controller.initialize(None) {
        return output.error(e.to_string(), ExitCode::Error);
    }
    controller.settle().await;

    if let Some(reason) = controller.presenter().failures.get(&kind) {
        return output.error(format!("Could not load {}: {}", kind, reason), ExitCode::NetworkError);
    }

    let target: ExternalTarget = match controller.select(kind, cmd.index) {
        Some(t) => t,
        None => {
            let available = match kind {
                CollectionKind::Trailers => controller.trailers().len(),
                CollectionKind::Reviews => controller.reviews().len(),
            };
            return output.error(
                format!("No {} at index {} ({} available)", kind, cmd.index, available),
                ExitCode::NotFound,
            );
        }
    };

    if cmd.print {
        if output.json {
            return print(&target, output);
        }
        output.line(&target.url);
        return ExitCode::Success;
    }

    match launcher.launch(&target) {
        Ok(()) => {
            output.info(format!("Opened {}", target));
            if output.json {
                return print(&target, output);
            }
            ExitCode::Success
        }
        Err(e) => output.error(e.to_string(), ExitCode::Error),
    }
}

// =============================================================================
// Stars Command
// =============================================================================

pub fn stars_cmd(cmd: StarsCmd, output: &Output) -> ExitCode {
    let rating = Some(cmd.rating);
    let stars = star_state(rating);
    let glyphs = star_string(&stars);

    if output.json {
        return print(
            &StarsResponse {
                rating: cmd.rating,
                stars: stars.to_vec(),
                glyphs,
            },
            output,
        );
    }

    match rating_label(rating) {
        Some(label) => output.line(format!("{}  {}", glyphs, label)),
        None => output.line(glyphs),
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let not_found = anyhow::Error::from(TmdbError::NotFound).context("loading movie 1");
        assert_eq!(exit_code_for(&not_found), ExitCode::NotFound);

        let server = anyhow::Error::from(TmdbError::ServerError(503));
        assert_eq!(exit_code_for(&server), ExitCode::NetworkError);

        let auth = anyhow::Error::from(TmdbError::Unauthorized);
        assert_eq!(exit_code_for(&auth), ExitCode::Error);

        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), ExitCode::Error);
    }

    #[test]
    fn test_failure_log_records_kind() {
        let mut log = FailureLog::default();
        log.report_failure(CollectionKind::Reviews, &FetchError::FetchFailed("HTTP 500".into()));
        assert_eq!(log.failures.len(), 1);
        assert!(log.failures[&CollectionKind::Reviews].contains("HTTP 500"));
    }

    #[test]
    fn test_stars_cmd_succeeds() {
        let output = Output {
            json: true,
            quiet: true,
        };
        assert_eq!(stars_cmd(StarsCmd { rating: 7.3 }, &output), ExitCode::Success);
    }
}
