//! PopMovies - movie details, trailers and reviews in the terminal
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! popmovies --movie 550
//!
//! # CLI mode (for automation)
//! popmovies detail 550 --json
//! popmovies open 550 trailer 0
//! ```

use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tracing::{info, warn};

use popmovies::api::TmdbClient;
use popmovies::app::App;
use popmovies::cli::{Cli, Command, ExitCode, Output};
use popmovies::commands;
use popmovies::config::Config;
use popmovies::fetch::FetchState;
use popmovies::logging::{self, LogTarget};
use popmovies::models::CollectionKind;
use popmovies::open::BrowserLauncher;
use popmovies::ui::Theme;

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;

    if cli.is_cli_mode() {
        // CLI mode: execute command and exit
        logging::init(LogTarget::Stderr, config.log_level())?;
        let exit_code = run_cli(cli, &config).await;
        std::process::exit(exit_code.into());
    }

    let Some(movie_id) = cli.movie else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "either a subcommand or --movie <ID> is required",
            )
            .exit()
    };

    // The TUI owns the terminal, so logs go to a file
    if let Some(path) = LogTarget::default_file() {
        logging::init(LogTarget::File(path), config.log_level())?;
    }
    run_tui(movie_id, &config).await
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: &Config) -> ExitCode {
    let output = Output::new(&cli);

    match cli.command {
        Some(Command::Detail(cmd)) => commands::detail_cmd(cmd, config, &output).await,

        Some(Command::Trailers(cmd)) => commands::trailers_cmd(cmd, config, &output).await,

        Some(Command::Reviews(cmd)) => commands::reviews_cmd(cmd, config, &output).await,

        Some(Command::Open(cmd)) => commands::open_cmd(cmd, config, &output).await,

        Some(Command::Stars(cmd)) => commands::stars_cmd(cmd, &output),

        None => {
            // This shouldn't happen (handled by is_cli_mode check)
            ExitCode::Success
        }
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run interactive TUI
async fn run_tui(movie_id: u64, config: &Config) -> Result<()> {
    let client = Arc::new(TmdbClient::from_config(config)?);
    let movie = client.movie_detail(movie_id).await?;
    info!(movie_id, title = %movie.title, "opening detail view");

    let mut app = App::new(movie, client, Box::new(BrowserLauncher));
    app.start(None)?;

    let mut terminal = init_terminal()?;

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;

    result
}

/// Main event loop - applies completions, handles input, renders UI
async fn run_event_loop(terminal: &mut Tui, app: &mut App<TmdbClient>) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(100);

    while app.running {
        // Completions from the fetch workers are applied here, on this loop
        app.tick();

        terminal.draw(|frame| render_ui(frame, app))?;

        if event::poll(TICK_RATE)? {
            match event::read()? {
                // Only handle key press events (ignore releases on Windows)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key);
                }
                Event::Resize(width, height) => {
                    info!(width, height, "terminal resized");
                    if let Err(e) = app.recreate() {
                        warn!(error = %e, "recreate after resize failed");
                        app.error = Some(e.to_string());
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}

// =============================================================================
// UI Rendering
// =============================================================================

fn render_ui(frame: &mut Frame, app: &App<TmdbClient>) {
    let area = frame.area();

    // Clear with background color
    frame.render_widget(Clear, area);
    frame.render_widget(
        Block::default().style(Style::default().bg(Theme::BACKGROUND)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    app.view().render(frame, chunks[0]);
    render_status_bar(frame, chunks[1], app);

    if let Some(ref error) = app.error {
        render_error_popup(frame, area, error);
    }
}

/// Render status bar at bottom
fn render_status_bar(frame: &mut Frame, area: Rect, app: &App<TmdbClient>) {
    let loading: Vec<String> = CollectionKind::ALL
        .iter()
        .filter(|&&k| app.controller().state(k) == FetchState::InFlight)
        .map(|k| k.to_string())
        .collect();

    let activity = if loading.is_empty() {
        Span::styled(" READY ", Style::default().fg(Theme::BACKGROUND).bg(Theme::PRIMARY))
    } else {
        Span::styled(format!(" ⟳ loading {} ", loading.join(", ")), Theme::loading())
    };

    let message = match &app.status {
        Some(status) => Span::styled(format!(" {} ", status), Theme::text()),
        None => Span::raw(""),
    };

    let help = Span::styled(
        " Tab:focus  ↑↓:move  Enter:open  r:reload view  q:quit ",
        Theme::dimmed(),
    );

    let status_line = Line::from(vec![activity, message, Span::raw(" │ "), help]);

    let status = Paragraph::new(status_line).style(Theme::status_bar());
    frame.render_widget(status, area);
}

/// Render error popup overlay
fn render_error_popup(frame: &mut Frame, area: Rect, error: &str) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(popup_width)) / 2,
        y: area.y + (area.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let error_block = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(error, Theme::error())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Theme::error())
            .title(Span::styled(" ✗ ERROR ", Theme::error()))
            .style(Style::default().bg(Theme::BACKGROUND)),
    );

    frame.render_widget(error_block, popup_area);
}
