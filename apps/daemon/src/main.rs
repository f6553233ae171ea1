use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use modeglue_engine::{Config, Runtime};
use modeglue_events::{EventSinkRef, SourceEvent};
use modeglue_input::PlatformPoster;
use modeglue_variables::KarabinerCli;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "modeglue", version, about)]
struct Cli {
    /// Config file. Defaults to $MODEGLUE_CONFIG, then
    /// ~/.config/modeglue/config.json
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,modeglue=debug")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    tracing::info!("Starting modeglue");

    if !modeglue_input::ensure_accessibility_access() {
        tracing::error!("accessibility not granted; restart modeglue after granting it");
    }

    let ax = Arc::new(
        modeglue_ax::platform::open().context("failed to open accessibility capability")?,
    );
    let probe = Arc::new(modeglue_context::platform::probe());
    let variables = Arc::new(KarabinerCli::new(config.karabiner_cli.clone()));
    let poster = Arc::new(PlatformPoster::new());

    let runtime = Runtime::start(&config, ax, probe, variables, poster)
        .context("failed to start runtime")?;
    forward_signals(runtime.handle())?;

    runtime.run();
    tracing::info!("modeglue stopped");
    Ok(())
}

/// Turn SIGINT and SIGTERM into a shutdown request.
fn forward_signals(sink: EventSinkRef) -> Result<()> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to register signal handler")?;

    // Lives until process exit.
    thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            for signal in signals.forever() {
                let name = if signal == SIGTERM { "SIGTERM" } else { "SIGINT" };
                tracing::info!(signal = name, "received signal, shutting down");
                sink.send(SourceEvent::Shutdown);
            }
        })
        .context("failed to spawn signal thread")?;

    Ok(())
}
