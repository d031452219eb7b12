mod console;
mod signals;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use prjtrx_core::config::{
    load_config_data, load_settings, resolve_icon_dir_with_source, resolve_logfile_with_source,
    resolve_tooltip, settings_search_dirs,
};
use prjtrx_core::session::{SessionController, SessionOptions};

use crate::console::ConsoleSurface;

#[derive(Parser)]
#[command(name = "prjtrx", version, about = "Project context status indicator")]
struct Cli {
    /// Path of the project config (JSON)
    config_file: PathBuf,
    /// Path of the change log [default: prjtrx_events.log]
    #[arg(long)]
    logfile: Option<PathBuf>,
    /// Directory searched for myIcon_<name>.ico files [default: .]
    #[arg(long)]
    icon_dir: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if !cli.config_file.exists() {
        eprintln!("Unable to load {}", cli.config_file.display());
        std::process::exit(1);
    }
    let config = load_config_data(&cli.config_file)
        .with_context(|| format!("load project config {}", cli.config_file.display()))?;

    let cwd = std::env::current_dir().context("resolve working directory")?;
    let settings = load_settings(&settings_search_dirs(&cli.config_file, &cwd)).map(
        |(settings, path)| {
            tracing::debug!(path = %path.display(), "loaded settings");
            settings
        },
    );
    let (logfile, logfile_source) =
        resolve_logfile_with_source(cli.logfile.as_deref(), settings.as_ref());
    let (icon_dir, icon_dir_source) =
        resolve_icon_dir_with_source(cli.icon_dir.as_deref(), settings.as_ref());
    tracing::debug!(
        logfile = %logfile.display(),
        logfile_source,
        icon_dir = %icon_dir.display(),
        icon_dir_source,
        "resolved settings"
    );
    let options = SessionOptions {
        logfile,
        icon_dir,
        tooltip: resolve_tooltip(settings.as_ref()),
    };

    let controller = SessionController::start(&config, &options, ConsoleSurface::new)
        .context("start session")?;
    let signals = signals::install(&controller).context("install signal handlers")?;
    let outcome = controller.run();
    signals.close();
    outcome.context("run event loop")?;
    Ok(())
}
