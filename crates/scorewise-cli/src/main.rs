mod app;
mod commands;

use anyhow::Result;
use app::{App, ui};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use scorewise_config::Config;
use scorewise_engine::io;
use std::{
    env,
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    match args.get(1).map(String::as_str) {
        Some("diff") => {
            let (Some(before), Some(after)) = (args.get(2), args.get(3)) else {
                eprintln!("Usage: {} diff <before.txt> <after.txt>", args[0]);
                process::exit(1);
            };
            let granularity = config
                .as_ref()
                .map(|c| c.diff.granularity)
                .unwrap_or_default();
            match commands::diff_files(Path::new(before), Path::new(after), granularity) {
                Ok(out) => println!("{out}"),
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    process::exit(1);
                }
            }
            Ok(())
        }
        Some("render") => {
            let Some(file) = args.get(2) else {
                eprintln!("Usage: {} render <file.review.json>", args[0]);
                process::exit(1);
            };
            let options = config.map(|c| c.overlay).unwrap_or_default();
            match commands::render_review_file(Path::new(file), &options) {
                Ok(markup) => println!("{markup}"),
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    process::exit(1);
                }
            }
            Ok(())
        }
        _ => run_viewer(&args, config, &config_path),
    }
}

/// Determine the reviews folder from CLI args or config file, then run the TUI.
fn run_viewer(args: &[String], config: Option<Config>, config_path: &Path) -> Result<()> {
    let from_config = args.len() < 2;
    let (reviews_path, granularity) = match (args.get(1), config) {
        (Some(path), config) if args.len() == 2 => (
            PathBuf::from(path),
            config.map(|c| c.diff.granularity).unwrap_or_default(),
        ),
        (None, Some(config)) => (config.reviews_path, config.diff.granularity),
        (None, None) => {
            eprintln!("Error: No reviews path provided and no config file found");
            eprintln!("Usage: {} <reviews-folder-path>", args[0]);
            eprintln!("Or create a config file at {}", config_path.display());
            process::exit(1);
        }
        _ => {
            eprintln!("Usage: {} [reviews-folder-path]", args[0]);
            eprintln!("       {} diff <before.txt> <after.txt>", args[0]);
            eprintln!("       {} render <file.review.json>", args[0]);
            process::exit(1);
        }
    };

    // Validate reviews directory using engine
    if let Err(e) = io::validate_reviews_dir(&reviews_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Reviews path '{}'{} is invalid: {e}",
            reviews_path.display(),
            source
        );
        process::exit(1);
    }

    let mut app = App::new(reviews_path, granularity)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_file(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_file(),
                KeyCode::Tab => app.cycle_mode(),
                _ => {}
            }
        }
    }
}
