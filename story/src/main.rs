//! Interactive story reader.
//!
//! A terminal interface for reading branching stories told by an LLM
//! narrator. Stories come from a CSV catalog; each chapter ends with two
//! options, A and B.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripting:
//!
//! ```bash
//! cargo run -p story -- --headless --story 1
//! ```

mod app;
mod events;
mod headless;
mod ui;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use story_core::{Catalog, Narrator, StoryConfig, StoryGame, StoryId};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use app::{App, PendingAction};
use events::{handle_event, EventResult};
use ui::render::render;

/// File the TUI logs to, so log lines never land on the screen.
const TUI_LOG_FILE: &str = "story.log";

#[derive(Debug, Parser)]
#[command(name = "story", version, about = "Interactive stories told by an LLM narrator")]
struct Cli {
    /// Config file (default: config/story.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Story catalog CSV, overriding the config file
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Model name, overriding the config file and STORY_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Run in headless mode (text-only, no TUI)
    #[arg(long)]
    headless: bool,

    /// Start reading this story right away
    #[arg(long)]
    story: Option<StoryId>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.headless)?;

    let game = match build_game(&cli) {
        Ok(game) => game,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if cli.headless {
        return headless::run_headless(game).await.map_err(|e| e.into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(game)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

/// Log to stderr in headless mode and to a file under the TUI.
fn init_tracing(headless: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        let file = File::create(TUI_LOG_FILE)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

/// Load config and catalog and wire the narrator. Any failure here is fatal.
fn build_game(cli: &Cli) -> Result<StoryGame, Box<dyn std::error::Error>> {
    let mut config = StoryConfig::load(cli.config.as_deref())?;
    if let Some(model) = &cli.model {
        config = config.with_model(model.clone());
    }
    if let Some(path) = &cli.catalog {
        config = config.with_catalog_path(path.clone());
    }
    config.validate()?;

    let catalog = Catalog::load(&config.catalog.path)?;
    let generator = config.generator()?;
    info!(
        model = generator.model(),
        base_url = %config.model.base_url,
        stories = catalog.len(),
        "narrator ready"
    );

    let narrator = Narrator::new(Arc::new(catalog), Arc::new(generator), config.narrator_config());
    let mut game = StoryGame::new(narrator);
    if let Some(id) = cli.story {
        game.select_story(id)?;
    }
    Ok(game)
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        // Render
        terminal.draw(|f| render(f, &app))?;

        // Run any pending narration, showing the waiting state first
        if let Some(action) = app.pending.take() {
            app.narrating = true;
            app.set_status("The narrator is writing...");
            terminal.draw(|f| render(f, &app))?;

            let result = match action {
                PendingAction::Start => app.game.start().await.map(str::to_string),
                PendingAction::Choose(choice) => {
                    app.game.choose(choice).await.map(str::to_string)
                }
            };
            if let Err(e) = &result {
                error!(error = %e, "narration failed");
            }
            app.finish_narration(action, result);
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            if handle_event(&mut app, ev) == EventResult::Quit {
                return Ok(());
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
