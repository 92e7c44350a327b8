pub(crate) mod assign;
pub(crate) mod batch;
pub(crate) mod catalogue;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod metar;
pub(crate) mod output;
pub(crate) mod runway;
pub(crate) mod util;
pub(crate) mod wind;

use std::{path::PathBuf, time::Instant};

use clap::Parser;
use itertools::Itertools;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    batch::run_batch,
    config::{ArasConfig, aras_project_dir},
    error::ApplicationResult,
    metar::MetarWindSource,
    output::write_rwy_file,
};

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[clap(long, short)]
    /// FIR to assign runways for. Repeat for several. Defaults to every configured FIR
    fir: Vec<String>,
    #[clap(long, short)]
    /// Rwy file to write, instead of the configured `rwy_file_path`
    output: Option<PathBuf>,
    #[clap(long)]
    /// Config file to use instead of the one in the user config directory
    config: Option<PathBuf>,
    #[clap(long)]
    /// Resets the config file (but keeps the rwy file path)
    clean_config: bool,
    #[clap(long)]
    /// Print the configured FIRs and their airports, then exit
    list_firs: bool,
    #[clap(long)]
    /// Print the rwy file content instead of writing it
    dry_run: bool,
}

async fn run(cli: Cli) -> ApplicationResult<()> {
    let config = ArasConfig::load(cli.config.as_deref(), cli.clean_config)?;
    info!(
        config = %config.config_file_path().display(),
        airports = config.catalogue().len(),
        "Runway catalogue ready"
    );

    if cli.list_firs {
        for (fir, airports) in config.firs() {
            println!("{fir}: {}", airports.iter().join(", "));
        }
        return Ok(());
    }

    let firs = if cli.fir.is_empty() {
        config.firs().keys().cloned().collect_vec()
    } else {
        cli.fir
    };

    let source = MetarWindSource::new(config.metar_url(), config.fetch_timeout())?;
    let start = Instant::now();
    let mut lines = Vec::new();

    for fir in &firs {
        let airports = config.airports_for_fir(fir)?;
        if airports.is_empty() {
            warn!(fir = %fir, "No airports configured");
            continue;
        }
        info!(fir = %fir, airports = airports.len(), "Assigning runways");

        let outcome = run_batch(
            &source,
            airports,
            config.catalogue(),
            config.gust_policy(),
            config.fetch_timeout(),
        )
        .await;

        if !outcome.skipped.is_empty() {
            warn!(
                fir = %fir,
                skipped = %outcome.skipped.keys().join(", "),
                "Airports left without runway"
            );
        }
        lines.extend(outcome.lines());
    }

    if cli.dry_run {
        for line in &lines {
            println!("{line}");
        }
    } else {
        let path = config.rwy_file_path(cli.output.as_deref())?;
        write_rwy_file(&path, &lines)?;
        info!(path = %path.display(), lines = lines.len(), "Rwy file written");
    }

    info!(elapsed = ?start.elapsed(), "Runway assignment completed");
    Ok(())
}

/// Creates the log directory. Errors are reported once logging is up.
fn prepare_log_dir(dir: PathBuf) -> Result<PathBuf, String> {
    match std::fs::create_dir_all(&dir) {
        Ok(()) => Ok(dir),
        Err(e) => Err(format!("{}: {e}", dir.display())),
    }
}

/// Logs to the console and to `aras.log` in the user data directory.
fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_dir =
        aras_project_dir().map(|dirs| prepare_log_dir(dirs.data_local_dir().to_path_buf()));

    let (file_layer, guard) = match &log_dir {
        Some(Ok(dir)) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, "aras.log"));
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    match log_dir {
        Some(Ok(_)) => (),
        Some(Err(e)) => warn!("Cannot create log directory, logging to console only: {}", e),
        None => warn!("No home directory, logging to console only"),
    }
    guard
}

fn main() -> ApplicationResult<()> {
    let _guard = init_logging();
    let cli = Cli::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting ARAS");
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))?;
    Ok(())
}
