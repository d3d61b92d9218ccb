//! rss-mixin — mixes several RSS/Atom feeds fairly into one live timeline.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ poll() ┌─────────────┐ pop() ┌──────────┐ Message ┌──────────┐
//! │ poll.rs  │ ─────► │ FeedSource  │ ◄──── │ drain.rs │ ──────► │  app.rs  │
//! │ (timer)  │        │ ×N registry │       │ (timer)  │ channel │ timeline │
//! └──────────┘        └─────────────┘       └──────────┘         └──────────┘
//!      │ fetch failure                                                ▲
//!      └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! * **`source/`** — `FeedSource` (queue + dedup watermark), the
//!   `FeedParser` trait and its HTTP RSS/Atom implementation.
//! * **`registry`** — the fixed pool of feed slots.
//! * **`poll`** / **`drain`** — the two self-rearming coordinators.
//! * **`aggregator`** — wires them together; start, reconfigure, shutdown.
//! * **`app`** / **`ui`** / **`input`** — the terminal timeline that
//!   receives every emitted message.
//! * **`main`** — wires everything together: parse args, load config, set up
//!   the terminal, and run the event loop.

mod aggregator;
mod app;
mod config;
mod drain;
mod error;
mod input;
mod logging;
mod message;
mod poll;
mod registry;
mod schedule;
mod source;
#[cfg(test)]
mod testing;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use aggregator::Aggregator;
use app::App;
use config::{Config, FeedSourceConfig};
use source::HttpFeedParser;

/// Mix several RSS/Atom feeds into one live terminal timeline.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "rss-mixin.toml")]
    config: PathBuf,

    /// Feed URLs, one per slot.  Overrides the feeds in the config file.
    urls: Vec<String>,
}

impl Args {
    /// Load the config file and apply command-line overrides.  The result is
    /// not yet normalized.
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        if !self.urls.is_empty() {
            config.feeds = self
                .urls
                .iter()
                .map(|url| FeedSourceConfig {
                    url: url.clone(),
                    ..Default::default()
                })
                .collect();
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    install_panic_hook();

    // -- configuration and logging -------------------------------------------
    let args = Args::parse();
    let mut config = args.load_config()?;
    logging::init(&config.log_level, &config.log_file)
        .with_context(|| format!("opening log file {}", config.log_file.display()))?;
    config.normalize_logged();
    info!(config = %args.config.display(), feeds = config.feeds.len(), "starting");

    // The blocking HTTP client must be created (and dropped) outside the
    // async runtime, so it is declared before the runtime and outlives it.
    let parser = Arc::new(HttpFeedParser::new(config.fetch_timeout())?);
    let runtime = tokio::runtime::Runtime::new()?;

    // -- start polling and draining ------------------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel();
    let running = Aggregator::new(&config, parser.clone(), Arc::new(tx)).start(runtime.handle());

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new();

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Move any emitted messages onto the timeline.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    //   4. Re-read the config file if asked to.
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = rx.try_recv() {
            app.push_message(msg);
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.reload_requested {
            app.reload_requested = false;
            match args.load_config() {
                Ok(mut new_config) => {
                    new_config.normalize_logged();
                    running.reconfigure(&new_config);
                    let configured = running
                        .registry()
                        .iter()
                        .filter(|source| !source.config().url.is_empty())
                        .count();
                    app.status = format!("Configuration reloaded ({configured} feeds)");
                }
                Err(e) => {
                    warn!(error = %e, "config reload failed");
                    app.status = format!("Reload failed: {e:#}");
                }
            }
        }

        if app.quit {
            break;
        }
    }

    runtime.block_on(running.shutdown());
    Ok(())
}
