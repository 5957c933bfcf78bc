//! Integration tests for PopMovies
//!
//! Tests are organized by component:
//! - tmdb_test: TMDB API client tests
//! - controller_test: Fetch controller ordering, restore and teardown
//! - ui_test: Detail view rendering and navigation
//! - cli_test: Argument parsing, JSON output and exit codes
//! - e2e_test: End-to-end flow tests (Load -> Recreate -> Open, CLI commands)

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
