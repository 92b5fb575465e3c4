#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod drive;
mod error_fmt;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::drive::RunOverrides;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
    }

    if let Err(err) = real_main(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        tracing::error!(error = ?err, "command failed");
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let mut cfg = load_config(cli.config.as_deref())?;

    // Overrides land before validation so they are checked too
    if let Commands::Sim {
        duration_s: Some(d),
        ..
    } = cli.cmd
    {
        cfg.sim.duration_s = d;
    }
    cfg.validate().wrap_err("invalid configuration")?;

    // Flushes the file sink on drop
    let _file_guard = init_tracing(&cli.log_level, cli.json, &cfg.logging);
    tracing::debug!(config = ?cli.config, "configuration loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler; continuing without it");
        }
    }

    match cli.cmd {
        Commands::Replay {
            log,
            max_cycles,
            pace,
        } => {
            drive::run_replay(
                &cfg,
                &log,
                RunOverrides { max_cycles, pace },
                cli.json,
                &shutdown,
            )?;
        }
        Commands::Sim {
            max_cycles, pace, ..
        } => {
            drive::run_sim(&cfg, RunOverrides { max_cycles, pace }, cli.json, &shutdown)?;
        }
        Commands::SelfCheck => drive::self_check(&cfg, cli.json)?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> eyre::Result<longplan_config::Config> {
    let Some(path) = path else {
        return Ok(longplan_config::Config::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    longplan_config::load_toml(&text)
        .map_err(eyre::Report::new)
        .wrap_err("invalid configuration")
}

/// Console layer on stderr (pretty or JSON) filtered by `RUST_LOG` or
/// `--log-level`, plus an optional JSON file sink from `[logging]`.
fn init_tracing(
    cli_level: &str,
    json: bool,
    logging: &longplan_config::Logging,
) -> Option<WorkerGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli_level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    let mut guard = None;
    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "longplan.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        let level = logging.level.as_deref().unwrap_or(cli_level);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(level))
                .boxed(),
        );
    }

    if let Err(e) = tracing_subscriber::registry().with(layers).try_init() {
        eprintln!("failed to initialise logging: {e}");
    }
    guard
}
