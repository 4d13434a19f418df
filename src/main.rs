//! unibos CLI
//!
//! Keyboard-driven console for the UNIBOS dev, manager, server and client
//! profiles.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use unibos_console::config::{self, Config, ConfigError};
use unibos_console::error::{ConsoleError, HandlerError};
use unibos_console::logging::init_file_logging;
use unibos_console::profile::{build, build_console};
use unibos_console::report::format_menu;
use unibos_console::tui::run::run;
use unibos_console::types::{OutputFormat, Profile, Tone};

#[derive(Parser)]
#[command(name = "unibos")]
#[command(about = "Keyboard-driven console for UNIBOS")]
#[command(version)]
struct Cli {
    /// Config file (default: $UNIBOS_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive console (the default)
    Tui {
        /// Profile to load (default: from config)
        #[arg(long, value_enum)]
        profile: Option<Profile>,
    },

    /// Print a profile's menu
    List {
        /// Profile to list (default: from config)
        #[arg(long, value_enum)]
        profile: Option<Profile>,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Run one menu item and print what it shows
    Run {
        /// Item id, as printed by `list`
        item: String,

        /// Profile the item belongs to (default: from config)
        #[arg(long, value_enum)]
        profile: Option<Profile>,
    },

    /// Show the resolved configuration
    Config,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = config::load(cli.config.as_deref())
        .map_err(ConsoleError::from)
        .and_then(|(config, path)| {
            start_logging(&config, &path);
            match cli.command.unwrap_or(Commands::Tui { profile: None }) {
                Commands::Tui { profile } => cmd_tui(&config, profile),
                Commands::List { profile, format } => cmd_list(&config, profile, format.into()),
                Commands::Run { item, profile } => cmd_run(&config, profile, &item),
                Commands::Config => cmd_config(&config, &path),
            }
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logging is best-effort: the console runs without it.
fn start_logging(config: &Config, config_path: &Path) {
    let log_path = config.log_path();
    if let Err(e) = init_file_logging(&log_path, &config.logging.level) {
        eprintln!("Warning: logging disabled ({}): {}", log_path.display(), e);
        return;
    }
    tracing::info!(
        config = %config_path.display(),
        version = env!("CARGO_PKG_VERSION"),
        "unibos starting"
    );
}

// ============================================================================
// PROGRESS HELPERS
// ============================================================================

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn cmd_tui(config: &Config, profile: Option<Profile>) -> Result<(), ConsoleError> {
    let profile = profile.unwrap_or(config.default_profile);
    let mut tui = build_console(profile, config)?;
    run(&mut tui, Duration::from_millis(config.ui.tick_ms))?;
    tracing::info!(profile = %profile, "console closed");
    Ok(())
}

fn cmd_list(config: &Config, profile: Option<Profile>, format: OutputFormat) -> Result<(), ConsoleError> {
    let profile = profile.unwrap_or(config.default_profile);
    let (menu, _) = build(profile, config)?;
    print!("{}", format_menu(profile, menu.sections(), format)?);
    Ok(())
}

fn cmd_run(config: &Config, profile: Option<Profile>, item: &str) -> Result<(), ConsoleError> {
    let profile = profile.unwrap_or(config.default_profile);
    let mut tui = build_console(profile, config)?;

    let sp = spinner(&format!("Running {}...", item));
    let outcome = tui.activate_id(item);
    sp.finish_and_clear();

    let (title, lines, tone) = outcome?;
    println!("=== {} ===", title);
    for line in &lines {
        println!("{}", line);
    }

    if tone == Tone::Error {
        return Err(HandlerError::Failed {
            item: item.to_string(),
            reason: "finished with an error".to_string(),
        }
        .into());
    }
    Ok(())
}

fn cmd_config(config: &Config, path: &Path) -> Result<(), ConsoleError> {
    let note = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("Config file: {}{}", path.display(), note);
    println!("Log file:    {}", config.log_path().display());
    println!();

    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ConfigError::Message(format!("cannot render configuration: {}", e)))?;
    print!("{}", rendered);
    Ok(())
}
