use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, warn};

use sightword::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    export::ExportFormat,
    runtime::{CrosstermEventSource, QuizEvent, Runner, TICK_RATE_MS},
    speech::{speaker_from_settings, SilentSpeaker},
    store::{KeyValueStore, MemoryStore, SqliteStore},
};

const IN_MEMORY_DB: &str = ":memory:";

/// sight-word reading trainer with prompt fading and mastery tracking
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal sight-word trainer for one-on-one reading practice. Words are spoken, then a visual prompt fades in after the first two sessions; accuracy and mastery are tracked per participant."
)]
pub struct Cli {
    /// participant whose progress to load (defaults to the configured one)
    #[clap(short = 'p', long)]
    participant: Option<String>,

    /// start a session at this level right away (0 = the participant's target words)
    #[clap(short = 'l', long, value_parser = clap::value_parser!(u8).range(0..=3))]
    level: Option<u8>,

    /// start an untimed, unprompted baseline probe right away
    #[clap(long, conflicts_with = "level")]
    baseline: bool,

    /// do not speak the words
    #[clap(long)]
    mute: bool,

    /// progress database to use; ":memory:" keeps nothing
    #[clap(long)]
    db: Option<PathBuf>,

    /// write the participant's session history in this format and exit
    #[clap(long, value_enum)]
    export: Option<ExportFormat>,

    /// export destination
    #[clap(short = 'o', long, requires = "export")]
    output: Option<PathBuf>,

    /// log at debug level
    #[clap(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    /// Layer command-line flags over the stored configuration
    fn apply(&self, mut config: Config) -> Config {
        if let Some(p) = &self.participant {
            config.participant_id = p.clone();
        }
        if let Some(level) = self.level {
            config.level = level;
        }
        if self.mute {
            config.mute = true;
        }
        config
    }
}

fn setup_logging(verbose: bool) -> Result<(), Box<dyn Error>> {
    let Some(log_path) = AppDirs::log_path() else {
        return Ok(());
    };
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)?;
    }

    // the TUI owns the terminal, so logs only go to the file
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let log_file = fs::File::create(&log_path)?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("logging initialized (verbose: {verbose})");
    Ok(())
}

fn open_store(db: Option<&Path>) -> Result<Box<dyn KeyValueStore>, Box<dyn Error>> {
    let store: Box<dyn KeyValueStore> = match db {
        Some(path) if path.as_os_str() == IN_MEMORY_DB => Box::new(MemoryStore::new()),
        Some(path) => Box::new(SqliteStore::open(path)?),
        None => Box::new(SqliteStore::open_default()?),
    };
    Ok(store)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let config_store = FileConfigStore::new();
    let stored = config_store.load();
    let config = cli.apply(stored.clone());
    let store = open_store(cli.db.as_deref())?;

    if let Some(format) = cli.export {
        let mut app = App::new(config, store, Box::new(SilentSpeaker));
        let path = match &cli.output {
            Some(path) => {
                app.export_history_to(path, format)?;
                path.clone()
            }
            None => app.export_history(format)?,
        };
        println!("{}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let speaker = speaker_from_settings(config.mute, config.speech_command.as_deref());
    let mut app = App::new(config, store, speaker);
    if cli.baseline {
        let _ = app.start_baseline();
    } else if let Some(level) = cli.level {
        let _ = app.start_session(level);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    // remember who was practising for next time, keep the rest of the file as the user wrote it
    let remembered = Config {
        participant_id: app.participant().to_string(),
        level: app.level,
        ..stored
    };
    if let Err(e) = config_store.save(&remembered) {
        warn!("could not save config to {}: {e}", config_store.path().display());
    }

    result
}

fn draw<B: Backend>(terminal: &mut Terminal<B>, app: &App) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(app, f.area()))?;
    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    draw(terminal, app)?;

    while !app.should_quit {
        match runner.step() {
            QuizEvent::Tick(dt) => {
                // only a running session changes between ticks
                if app.session.is_some() {
                    app.on_tick(dt);
                    draw(terminal, app)?;
                }
            }
            QuizEvent::Resize => draw(terminal, app)?,
            QuizEvent::Key(key) => {
                app.on_key(key);
                draw(terminal, app)?;
            }
        }
    }

    info!("quitting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["sightword", "-p", "P4", "-l", "2", "--mute"]);
        let config = cli.apply(Config::default());
        assert_eq!(config.participant_id, "P4");
        assert_eq!(config.level, 2);
        assert!(config.mute);
    }

    #[test]
    fn test_cli_keeps_config_when_flags_absent() {
        let stored = Config {
            participant_id: "P7".into(),
            mute: true,
            ..Config::default()
        };
        let cli = Cli::parse_from(["sightword"]);
        assert_eq!(cli.apply(stored.clone()), stored);
    }

    #[test]
    fn test_cli_rejects_bad_combinations() {
        assert!(Cli::try_parse_from(["sightword", "-l", "7"]).is_err());
        assert!(Cli::try_parse_from(["sightword", "-l", "1", "--baseline"]).is_err());
        assert!(Cli::try_parse_from(["sightword", "-o", "out.csv"]).is_err());
        assert!(Cli::try_parse_from(["sightword", "--export", "json", "-o", "out.json"]).is_ok());
    }

    #[test]
    fn test_in_memory_store_option() {
        let mut store = open_store(Some(Path::new(IN_MEMORY_DB))).unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_draw_home_screen() {
        let app = App::new(
            Config::default(),
            Box::new(MemoryStore::new()),
            Box::new(SilentSpeaker),
        );
        let backend = TestBackend::new(100, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        draw(&mut terminal, &app).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Sight Word Practice"));
    }
}
