//! Application wiring: pick a landmark source, start the capture session and
//! drive the preview window on the main thread.

use std::sync::mpsc;

use anyhow::{anyhow, bail, Context};
use clap::ValueEnum;
use tracing::{info, warn};

use mode_engine::EngineConfig;

use crate::backend::{open_surfaces, BackendOptions};
use crate::preview::Preview;
use crate::session::{FrameReport, Session, SessionError, SessionEvent, StopHandle};
use crate::sim::{SimInput, SimSource};
use crate::source::{JsonLinesSource, LandmarkSource, SourceError};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Mouse and keyboard in the preview window
    Sim,
    /// JSON lines on standard input
    Stdin,
    /// JSON lines from a detector child process
    Spawn,
    /// LeapMotion controller
    #[cfg(feature = "leap")]
    Leap,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub engine:       EngineConfig,
    pub source:       SourceKind,
    /// Command line for [`SourceKind::Spawn`].
    pub detector_cmd: Option<String>,
    pub preview:      bool,
    pub backend:      BackendOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            engine:       EngineConfig::default(),
            source:       SourceKind::Sim,
            detector_cmd: None,
            preview:      true,
            backend:      BackendOptions::default(),
        }
    }
}

type SourceFactory = Box<dyn FnOnce() -> Result<Box<dyn LandmarkSource>, SourceError> + Send>;

fn boxed<S: LandmarkSource + 'static>(src: S) -> Result<Box<dyn LandmarkSource>, SourceError> {
    Ok(Box::new(src))
}

fn source_factory(cfg: &AppConfig, sim_rx: Option<mpsc::Receiver<SimInput>>) -> anyhow::Result<SourceFactory> {
    let factory: SourceFactory = match cfg.source {
        SourceKind::Sim => {
            let rx = sim_rx.ok_or_else(|| anyhow!("the sim source needs the preview window"))?;
            Box::new(move || boxed(SimSource { rx }))
        }
        SourceKind::Stdin => Box::new(|| boxed(JsonLinesSource::stdin())),
        SourceKind::Spawn => {
            let cmd = cfg.detector_cmd.clone()
                .ok_or_else(|| anyhow!("--source spawn needs --detector-cmd"))?;
            Box::new(move || JsonLinesSource::spawn(&cmd).and_then(boxed))
        }
        #[cfg(feature = "leap")]
        SourceKind::Leap => Box::new(|| crate::leap::LeapSource::open().and_then(boxed)),
    };
    Ok(factory)
}

// ════════════════════════════════════════════════════════════════════════════
// run()
// ════════════════════════════════════════════════════════════════════════════

/// Run until the window closes, the source ends or the session fails.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    if cfg.source == SourceKind::Sim && !cfg.preview {
        bail!("the sim source is driven from the preview window; drop --no-preview");
    }

    // ── Preview first, so a missing display fails before any output ──────
    let (sim_tx, sim_rx) = if cfg.source == SourceKind::Sim {
        let (tx, rx) = mpsc::channel::<SimInput>();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };
    let preview = if cfg.preview {
        let p = Preview::new(cfg.engine.active_zone, sim_tx)
            .map_err(|e| anyhow!("cannot open preview window: {}", e))?;
        Some(p)
    } else {
        None
    };

    let open_source = source_factory(&cfg, sim_rx)?;
    let backend = cfg.backend.clone();
    info!(source = ?cfg.source, preview = cfg.preview, dry_run = backend.dry_run, "starting");

    let session = Session::start(cfg.engine, open_source, move || open_surfaces(&backend))
        .context("cannot start the session worker")?;
    install_interrupt(session.stop_handle());

    let result = match preview {
        Some(preview) => preview_loop(preview, session),
        None => session.wait(),
    };
    result.context("gesture session failed")
}

/// Ctrl-C asks the session to stop, so held buttons are released before
/// the process exits.  Only one handler can be installed per process.
fn install_interrupt(stop: StopHandle) {
    let installed = ctrlc::set_handler(move || {
        info!("interrupted, stopping");
        stop.stop();
    });
    if let Err(e) = installed {
        warn!("cannot install Ctrl-C handler: {}", e);
    }
}

fn preview_loop(mut preview: Preview, session: Session) -> Result<(), SessionError> {
    let mut latest: Option<FrameReport> = None;
    let mut ended = None;

    while preview.poll_input() {
        for ev in session.drain() {
            match ev {
                SessionEvent::Frame(r) => latest = Some(r),
                SessionEvent::Ended(r) => ended = Some(r),
            }
        }
        if ended.is_some() { break; }
        preview.render(latest.as_ref());
    }

    // Stop before closing the window: the sim source sees its channel close
    // and must not report that as a lost source.
    session.stop();
    drop(preview);
    let waited = session.wait();
    ended.unwrap_or(waited)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_without_preview_is_rejected() {
        let cfg = AppConfig { preview: false, ..AppConfig::default() };
        let err = run(cfg).unwrap_err();
        assert!(err.to_string().contains("preview"));
    }

    #[test]
    fn spawn_needs_a_command() {
        let cfg = AppConfig { source: SourceKind::Spawn, preview: false, ..AppConfig::default() };
        assert!(source_factory(&cfg, None).is_err());
    }

    #[test]
    fn headless_detector_runs_until_the_stream_ends() {
        let cfg = AppConfig {
            source:       SourceKind::Spawn,
            detector_cmd: Some("printf READY\\n".to_string()),
            preview:      false,
            backend:      BackendOptions { dry_run: true, ..BackendOptions::default() },
            ..AppConfig::default()
        };
        // End of stream is a lost source.
        let err = run(cfg).unwrap_err();
        assert!(format!("{:#}", err).contains("landmark source lost"));
    }
}
