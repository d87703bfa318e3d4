//! gesture_pilot command-line entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use gesture_pilot::app::{self, AppConfig, SourceKind};
use gesture_pilot::backend::BackendOptions;
use gesture_pilot::settings::{self, EngineOverrides};

#[derive(Parser, Debug)]
#[command(name = "gesture_pilot", version, about = "Control the mouse and volume with hand gestures")]
struct Cli {
    /// Where hand landmarks come from
    #[arg(long, value_enum, default_value_t = SourceKind::Sim)]
    source: SourceKind,

    /// Detector command for `--source spawn`; it prints JSON lines on stdout
    #[arg(long)]
    detector_cmd: Option<String>,

    /// JSON engine config; fields left out keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output commands instead of performing them
    #[arg(long)]
    dry_run: bool,

    /// Run without the preview window
    #[arg(long)]
    no_preview: bool,

    /// Top of the volume range, in percent of nominal
    #[arg(long, default_value_t = 100.0)]
    max_volume: f32,

    /// PulseAudio / PipeWire sink name
    #[arg(long, default_value = "@DEFAULT_SINK@")]
    sink: String,

    #[command(flatten)]
    engine: EngineOverrides,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_pilot=info,mode_engine=info".into()),
        )
        .init();

    info!("gesture_pilot v{} starting", env!("CARGO_PKG_VERSION"));

    let engine = settings::resolve(cli.config.as_deref(), &cli.engine)
        .context("loading engine configuration")?;

    let cfg = AppConfig {
        engine,
        source:       cli.source,
        detector_cmd: cli.detector_cmd,
        preview:      !cli.no_preview,
        backend: BackendOptions {
            dry_run:    cli.dry_run,
            sink:       cli.sink,
            max_volume: cli.max_volume,
            ..BackendOptions::default()
        },
    };

    app::run(cfg)
}
