//! Oyster Timer entry point.
//!
//! A "time since pulled" display for the terminal.  The user records when a
//! batch was pulled and the screen counts up from that instant; title, label,
//! background, font, and layout are cosmetic settings persisted alongside it.
//!
//! # Usage
//!
//! ```text
//! oyster-timer [--data-dir DIR] [--config FILE] [COMMAND]
//!
//! Commands:
//!   watch      Live display; type edit commands while it runs (default)
//!   show       Print the current settings and timer once
//!   set        Set the pulled-at time from local YYYY-MM-DDTHH:MM
//!   now        Set the pulled-at time to now
//!   clear      Clear the pulled-at time
//!   bg         Background: type | solid | gradient | angle | photo | remove-photo
//!   font       Font scale and family
//!   style      Layout preset
//!   glow       Glow intensity
//!   text       Title and label
//!   display    Display chrome toggles
//!   reset      Restore defaults, keeping the pulled-at time
//!   assets     Install and query the offline asset cache
//!   config     Print the effective configuration
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Description                                 |
//! |-------------------|---------------------------------------------|
//! | `OYSTER_DATA_DIR` | Directory holding the settings document     |
//! | `OYSTER_CONFIG`   | Explicit config file (must exist)           |
//! | `RUST_LOG`        | Log filter; overrides `[app] log_level`     |

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Context};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use oyster_timer::application::edit_settings::SettingsEditor;
use oyster_timer::application::settings_store::SettingsStore;
use oyster_timer::infrastructure::image_ingest::JpegDataUrlIngestor;
use oyster_timer::infrastructure::offline_cache::{AssetCache, DirectoryAssetSource, ASSET_MANIFEST};
use oyster_timer::infrastructure::storage::config::{
    config_file_path, load_config, load_config_from, resolve_data_dir, save_config, AppConfig,
};
use oyster_timer::infrastructure::storage::key_value::FileKeyValueStore;
use oyster_timer::infrastructure::terminal::commands::EditCommand;
use oyster_timer::infrastructure::terminal::session::{run_session, SessionOptions};
use oyster_timer::infrastructure::terminal::TerminalRenderer;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Oyster Timer: counts up from when a batch was pulled.
#[derive(Debug, Parser)]
#[command(name = "oyster-timer", about = "Terminal \"time since pulled\" display", version)]
struct Cli {
    /// Directory holding the settings document.
    #[arg(long, global = true, env = "OYSTER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file to use instead of the platform default.
    #[arg(long, global = true, env = "OYSTER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Live display; edit commands typed on stdin apply immediately.
    Watch {
        /// Do not read commands from stdin.
        #[arg(long)]
        no_input: bool,
    },

    /// Print the current settings and timer once.
    Show {
        /// Print document, presentation, and timer as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Pre-fetch the offline asset manifest from a directory and resolve paths.
    Assets {
        /// Directory standing in for the network.
        #[arg(long)]
        source: PathBuf,
        /// Request paths to resolve; defaults to the manifest.
        paths: Vec<String>,
    },

    /// Print the effective configuration.
    Config {
        /// Write the default configuration file if none exists.
        #[arg(long)]
        init: bool,
    },

    #[command(flatten)]
    Edit(EditCommand),
}

impl Cli {
    /// Loads the config file named by `--config`, or the platform default.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed.  A missing
    /// default file is not an error.
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        match &self.config {
            Some(path) => load_config_from(path).with_context(|| format!("loading config {}", path.display())),
            None => load_config().context("loading config"),
        }
    }

    fn open_editor(&self, config: &AppConfig) -> anyhow::Result<SettingsEditor<FileKeyValueStore, Local>> {
        let dir = resolve_data_dir(self.data_dir.as_deref(), config).context("resolving data directory")?;
        info!("settings directory: {}", dir.display());
        let store = SettingsStore::new(FileKeyValueStore::new(dir));
        Ok(SettingsEditor::open(store, Local))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let result = runtime.block_on(run(cli, config));
    // A stdin read may still be parked on a blocking thread; do not wait for it.
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the config file's level.  Logs go to stderr
    // so they never interleave with the timer line on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.app.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let ingestor = JpegDataUrlIngestor::new(config.photo.max_width, config.photo.jpeg_quality);

    match &cli.command {
        None => watch(&cli, &config, &ingestor, false).await,
        Some(Command::Watch { no_input }) => watch(&cli, &config, &ingestor, *no_input).await,
        Some(Command::Show { json }) => show(&cli, &config, *json),
        Some(Command::Assets { source, paths }) => assets(source.clone(), paths).await,
        Some(Command::Config { init }) => print_config(&cli, &config, *init),
        Some(Command::Edit(command)) => {
            let mut editor = cli.open_editor(&config)?;
            let outcome = command.clone().apply(&mut editor, &ingestor, Utc::now()).await;

            let mut renderer = TerminalRenderer::new(std::io::stdout().lock(), false);
            renderer.render_presentation(&outcome.presentation)?;
            renderer.render_frame(&editor.tick(Utc::now()), editor.document().display, outcome.status)?;

            match outcome.status {
                Some(status) if status.is_error() => bail!("{status}"),
                _ => Ok(()),
            }
        }
    }
}

async fn watch(
    cli: &Cli,
    config: &AppConfig,
    ingestor: &JpegDataUrlIngestor,
    no_input: bool,
) -> anyhow::Result<()> {
    let mut editor = cli.open_editor(config)?;

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, stopping");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => warn!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let stdout = std::io::stdout();
    let ansi = stdout.is_terminal();
    let mut renderer = TerminalRenderer::new(stdout.lock(), ansi);
    let input = (!no_input).then(|| BufReader::new(tokio::io::stdin()));
    let options = SessionOptions {
        tick_interval: config.timer.tick_interval(),
        status_ttl: config.timer.status_ttl(),
        follow_storage: true,
    };

    run_session(&mut editor, ingestor, &mut renderer, input, options, running)
        .await
        .context("writing to terminal")?;
    Ok(())
}

fn show(cli: &Cli, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let editor = cli.open_editor(config)?;
    let presentation = editor.presentation();
    let frame = editor.tick(Utc::now());

    if json {
        let out = serde_json::json!({
            "document": editor.document(),
            "presentation": presentation,
            "timer": frame.timer_text,
            "pulledAtLine": frame.pulled_at_text,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut renderer = TerminalRenderer::new(std::io::stdout().lock(), false);
    renderer.render_presentation(&presentation)?;
    renderer.render_frame(&frame, editor.document().display, None)?;
    Ok(())
}

async fn assets(source_dir: PathBuf, paths: &[String]) -> anyhow::Result<()> {
    let source = DirectoryAssetSource::new(&source_dir);
    let mut cache = AssetCache::default();

    cache
        .install(&source, &ASSET_MANIFEST)
        .await
        .with_context(|| format!("installing offline assets from {}", source_dir.display()))?;
    for name in cache.activate() {
        info!("removed stale cache {name}");
    }
    println!("cache {} ready ({} assets)", cache.current_name(), ASSET_MANIFEST.len());

    let requested: Vec<String> = if paths.is_empty() {
        ASSET_MANIFEST.iter().map(|p| p.to_string()).collect()
    } else {
        paths.to_vec()
    };
    for path in &requested {
        match cache.fetch(path, &source).await {
            Ok(response) => println!("{path}\t{:?}\t{} bytes", response.served, response.body.len()),
            Err(e) => println!("{path}\terror: {e}"),
        }
    }
    Ok(())
}

fn print_config(cli: &Cli, config: &AppConfig, init: bool) -> anyhow::Result<()> {
    if init {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => config_file_path().context("locating config directory")?,
        };
        if path.exists() {
            println!("# {} already exists", path.display());
        } else {
            save_config(&AppConfig::default(), &path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("# wrote {}", path.display());
        }
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
