//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use args::{Cli, Commands, LogCommands};
use clap::Parser;
use sinkhole_config::settings::DebugSettings;
use sinkhole_config::ConfigStore;
use sinkhole_fifo::{FifoLayer, FifoWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Run the CLI application.
pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Config is read before the final subscriber exists, so its own
    // diagnostics go through a temporary one.
    let store = {
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(env_filter(cli.verbose, &DebugSettings::default()))
                .finish(),
        );
        ConfigStore::load(&cli.config)
            .with_context(|| format!("cannot read {}", cli.config.display()))?
    };
    let settings = store.snapshot();

    // `log record` takes the writer role before logging starts so that
    // `--self-log` can route this process's events into the ring.
    let recorder = match &cli.command {
        Commands::Log(args::LogArgs {
            command: LogCommands::Record { self_log },
        }) => Some((
            commands::log::open_recorder(&settings)?,
            *self_log,
        )),
        _ => None,
    };
    let fifo_layer = recorder
        .as_ref()
        .filter(|(_, self_log)| *self_log)
        .map(|(writer, _)| FifoLayer::<FifoWriter>::new(writer.clone()));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color)
                .with_filter(env_filter(cli.verbose, &settings.debug)),
        )
        .with(fifo_layer)
        .try_init()
        .context("cannot install log subscriber")?;

    if settings.debug.config {
        sinkhole_config::loader::report(&settings);
    }

    let ctx = commands::Context {
        config_path: cli.config,
        store: Arc::new(store),
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Config(args) => commands::config::execute(ctx, args).await,
        Commands::Log(args) => {
            commands::log::execute(ctx, args, recorder.map(|(writer, _)| writer)).await
        }
    }
}

/// Filter from `RUST_LOG`, or from `-v` plus the `[debug]` areas.
fn env_filter(verbose: u8, debug: &DebugSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(verbose, debug)))
}

fn directives(verbose: u8, debug: &DebugSettings) -> String {
    let base = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let mut directives = vec![base];
    if debug.all || debug.config {
        directives.push("sinkhole_config=debug");
    }
    if debug.all || debug.shmem {
        directives.push("sinkhole_fifo=debug");
    } else if debug.api {
        directives.push("sinkhole_fifo::tail=debug");
    }
    directives.join(",")
}
