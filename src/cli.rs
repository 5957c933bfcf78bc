//! CLI - Command Line Interface for PopMovies
//!
//! Every detail-screen action is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Movie, trailers, reviews and star row
//! popmovies detail 550 --json
//!
//! # Keep the loaded collections for a later run
//! popmovies detail 550 --save fight-club.json
//! popmovies detail 550 --restore fight-club.json
//!
//! # Open the first trailer
//! popmovies open 550 trailer 0
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::fetch::FetchState;
use crate::models::{CollectionKind, Movie, Review, Star, Trailer};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Unknown movie or entry index out of range
    NotFound = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// PopMovies - movie details, trailers and reviews from TMDB
///
/// Run with `--movie ID` and no subcommand to launch the interactive TUI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "popmovies",
    version,
    about = "Movie details, trailers and reviews in the terminal",
    long_about = "Shows a movie's details together with its trailers and \
                  reviews, loaded concurrently from TMDB.\n\n\
                  Run with --movie ID to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  popmovies --movie 550               Launch interactive TUI\n\
                  popmovies detail 550 --json         Print everything as JSON\n\
                  popmovies open 550 trailer 0        Open the first trailer\n\
                  popmovies stars 7.3                 Print a star row"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// TMDB movie id to show in the TUI
    #[arg(long, short = 'm')]
    pub movie: Option<u64>,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a movie with its trailers, reviews and star rating
    #[command(visible_alias = "d")]
    Detail(DetailCmd),

    /// List a movie's trailers
    #[command(visible_alias = "t")]
    Trailers(CollectionCmd),

    /// List a movie's reviews
    #[command(visible_alias = "r")]
    Reviews(CollectionCmd),

    /// Open a trailer or review in the browser
    #[command(visible_alias = "o")]
    Open(OpenCmd),

    /// Print the star row for a 0-10 rating
    Stars(StarsCmd),
}

// =============================================================================
// Detail Command
// =============================================================================

/// Load a movie and both collections, optionally through a snapshot file
#[derive(Args, Debug)]
pub struct DetailCmd {
    /// TMDB movie id
    #[arg(required = true)]
    pub id: u64,

    /// Restore collections from a snapshot written by --save
    #[arg(long)]
    pub restore: Option<PathBuf>,

    /// Write a snapshot of the loaded collections
    #[arg(long)]
    pub save: Option<PathBuf>,
}

// =============================================================================
// Trailers / Reviews Commands
// =============================================================================

/// Fetch a single collection
#[derive(Args, Debug)]
pub struct CollectionCmd {
    /// TMDB movie id
    #[arg(required = true)]
    pub id: u64,
}

// =============================================================================
// Open Command
// =============================================================================

/// Open a trailer or review page
#[derive(Args, Debug)]
pub struct OpenCmd {
    /// TMDB movie id
    #[arg(required = true)]
    pub id: u64,

    /// Which collection the entry belongs to
    #[arg(value_enum)]
    pub kind: TargetKind,

    /// Position in the list, as printed by `trailers` / `reviews` (0-based)
    pub index: usize,

    /// Print the URL instead of launching a browser
    #[arg(long, short = 'p')]
    pub print: bool,
}

/// Collection selector for `open`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Trailer,
    Review,
}

impl From<TargetKind> for CollectionKind {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Trailer => CollectionKind::Trailers,
            TargetKind::Review => CollectionKind::Reviews,
        }
    }
}

// =============================================================================
// Stars Command
// =============================================================================

/// Print the star row for a rating
#[derive(Args, Debug)]
pub struct StarsCmd {
    /// Rating on a 0-10 scale
    #[arg(required = true, allow_negative_numbers = true)]
    pub rating: f32,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            success: false,
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Per-kind fetch outcome reported by `detail`
#[derive(Debug, Serialize)]
pub struct CollectionStates {
    pub trailers: FetchState,
    pub reviews: FetchState,
}

/// `detail` response
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub movie: Movie,
    pub stars: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    pub trailers: Vec<Trailer>,
    pub reviews: Vec<Review>,
    pub state: CollectionStates,
    /// Kinds that were restored from the snapshot instead of fetched
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub restored: Vec<CollectionKind>,
}

/// `stars` response
#[derive(Debug, Serialize)]
pub struct StarsResponse {
    pub rating: f32,
    pub stars: Vec<Star>,
    pub glyphs: String,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data as JSON
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let output = JsonOutput::success(data);
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    /// Print a human-readable line (suppressed in JSON mode)
    pub fn line(&self, msg: impl std::fmt::Display) {
        if !self.json {
            println!("{}", msg);
        }
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_is_tui_mode() {
        let cli = Cli::parse_from(["popmovies", "--movie", "550"]);
        assert!(!cli.is_cli_mode());
        assert_eq!(cli.movie, Some(550));
    }

    #[test]
    fn test_detail_command() {
        let cli = Cli::parse_from([
            "popmovies",
            "detail",
            "550",
            "--restore",
            "in.json",
            "--save",
            "out.json",
        ]);
        assert!(cli.is_cli_mode());
        if let Some(Command::Detail(cmd)) = cli.command {
            assert_eq!(cmd.id, 550);
            assert_eq!(cmd.restore, Some(PathBuf::from("in.json")));
            assert_eq!(cmd.save, Some(PathBuf::from("out.json")));
        } else {
            panic!("Expected Detail command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "popmovies",
            "trailers",
            "550",
            "--json",
            "--quiet",
            "--config",
            "/tmp/popmovies.toml",
        ]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/popmovies.toml")));
        assert!(matches!(cli.command, Some(Command::Trailers(CollectionCmd { id: 550 }))));
    }

    #[test]
    fn test_open_command() {
        let cli = Cli::parse_from(["popmovies", "open", "550", "review", "2", "--print"]);
        if let Some(Command::Open(cmd)) = cli.command {
            assert_eq!(cmd.id, 550);
            assert_eq!(cmd.kind, TargetKind::Review);
            assert_eq!(CollectionKind::from(cmd.kind), CollectionKind::Reviews);
            assert_eq!(cmd.index, 2);
            assert!(cmd.print);
        } else {
            panic!("Expected Open command");
        }
    }

    #[test]
    fn test_open_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["popmovies", "open", "550", "poster", "0"]).is_err());
    }

    #[test]
    fn test_non_numeric_id_rejected() {
        assert!(Cli::try_parse_from(["popmovies", "detail", "tt0137523"]).is_err());
    }

    #[test]
    fn test_stars_accepts_negative() {
        let cli = Cli::parse_from(["popmovies", "stars", "-1"]);
        if let Some(Command::Stars(cmd)) = cli.command {
            assert_eq!(cmd.rating, -1.0);
        } else {
            panic!("Expected Stars command");
        }
    }

    #[test]
    fn test_json_envelope() {
        let json = serde_json::to_value(JsonOutput::success(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2]}));

        let json = serde_json::to_value(JsonOutput::<()>::error_msg("nope", ExitCode::NotFound)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "nope", "exit_code": 4})
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::NotFound), 4);
    }
}
