mod audio;
mod config;
mod pitch;
mod session;
#[cfg(test)]
mod testing;
mod types;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::info;

use audio::output::{AudioOutput, list_output_devices};
use config::TrainerConfig;
use pitch::estimator::McLeodEstimator;
use pitch::input::{Microphone, list_input_devices};
use session::state::{Mode, Session};
use types::note::random_note_name;
use ui::{app::App, events, render};

/// Musical interval ear trainer
#[derive(Parser, Debug)]
#[command(name = "interval-trainer")]
#[command(about = "Recognize played intervals and sing them back", long_about = None)]
struct Args {
    /// Configuration file (YAML)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// List available devices and exit
    #[arg(short = 'l', long = "list")]
    list_devices: bool,

    /// Starting mode
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = StartMode::Recognition)]
    mode: StartMode,

    /// Write logs to this file
    #[arg(long = "log", value_name = "FILE")]
    log: Option<PathBuf>,

    /// Print a random note name every SECONDS instead of starting the trainer
    #[arg(
        long = "notes",
        value_name = "SECONDS",
        num_args = 0..=1,
        default_missing_value = "5"
    )]
    notes: Option<f64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StartMode {
    Recognition,
    Production,
}

impl From<StartMode> for Mode {
    fn from(mode: StartMode) -> Self {
        match mode {
            StartMode::Recognition => Mode::Recognition,
            StartMode::Production => Mode::Production,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(path) = &args.log {
        init_logging(path)?;
    }

    // Handle --list flag
    if args.list_devices {
        println!("Available Audio Input Devices:");
        for (i, device) in list_input_devices().iter().enumerate() {
            println!("  {}: {}", i, device);
        }
        println!("\nAvailable Audio Output Devices:");
        for (i, device) in list_output_devices().iter().enumerate() {
            println!("  {}: {}", i, device);
        }
        return Ok(());
    }

    if let Some(seconds) = args.notes {
        return run_note_drill(seconds);
    }

    let config = match &args.config {
        Some(path) => TrainerConfig::load(path)?,
        None => TrainerConfig::default(),
    };

    run_trainer(config, args.mode.into())
}

/// Send tracing output to a file; the terminal belongs to the UI
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

const MAX_DRILL_INTERVAL: Duration = Duration::from_secs(86_400);

/// Print a random note name at a fixed interval until interrupted
fn run_note_drill(seconds: f64) -> Result<()> {
    let interval = Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|d| !d.is_zero() && *d <= MAX_DRILL_INTERVAL)
        .context("--notes interval must be between 0 and 86400 seconds")?;

    println!("--- Random Note Drill ---");
    println!("A note will be shown every {} seconds.", seconds);
    println!("Press Ctrl+C to stop.");

    // Raw mode so Ctrl+C arrives as a key instead of killing the process
    enable_raw_mode()?;
    let result = drill_loop(interval);
    disable_raw_mode()?;

    println!("\n--- Note Drill Stopped ---");
    info!("note drill stopped");
    result
}

fn drill_loop(interval: Duration) -> Result<()> {
    let mut stdout = io::stdout();
    let mut rng = StdRng::from_entropy();
    loop {
        write!(stdout, "\r\nRandom Note: {}\r\n", random_note_name(&mut rng))?;
        stdout.flush()?;

        if wait_for_stop(interval)? {
            return Ok(());
        }
    }
}

/// Sleep for `interval`, returning true early if a stop key is pressed
fn wait_for_stop(interval: Duration) -> Result<bool> {
    let deadline = Instant::now() + interval;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }
        if event::poll(remaining)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && is_stop_key(&key) {
                    return Ok(true);
                }
            }
        }
    }
}

/// Ctrl+C, q or Esc
fn is_stop_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q') | KeyCode::Esc => true,
        _ => false,
    }
}

/// Open the devices and run the trainer UI
fn run_trainer(config: TrainerConfig, mode: Mode) -> Result<()> {
    let output = AudioOutput::open(config.devices.audioout.as_deref(), config.playback.volume)
        .context("Failed to open audio output")?;
    let microphone = Microphone::new(config.devices.audioin.clone());
    let estimator = McLeodEstimator::new(
        config.detection.window_size,
        config.detection.power_threshold,
    );

    let mut session = Session::new(
        Box::new(output),
        Box::new(microphone),
        Box::new(estimator),
        &config,
        StdRng::from_entropy(),
    );
    session.set_mode(mode);
    info!(mode = mode.name(), "trainer started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let result = run_ui_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Run UI loop
/// Each pass drives the session (pitch sampling, feedback expiry) before drawing
fn run_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.session.tick(Instant::now());

        // Render UI
        terminal.draw(|f| render::render(f, app))?;

        // Handle events
        events::handle_events(app)?;

        // Check if should quit
        if app.should_quit {
            break;
        }

        // Small sleep to reduce CPU usage
        std::thread::sleep(Duration::from_millis(6));
    }

    info!("trainer stopped");
    Ok(())
}
