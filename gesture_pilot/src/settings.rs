//! Layered engine settings: built-in defaults, then an optional JSON file,
//! then command-line overrides.  The merged result is validated once.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use thiserror::Error;
use tracing::info;

use mode_engine::{ConfigError, EngineConfig, ScreenSize, ZoneOverflow};

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read config file {path}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("cannot parse config file {path}")]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
    #[error("invalid configuration")]
    Invalid(#[from] ConfigError),
}

/// Read `path` as a (possibly partial) JSON [`EngineConfig`].  No path means
/// the defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigFileError> {
    let Some(path) = path else { return Ok(EngineConfig::default()) };
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigFileError::Io { path: path.to_path_buf(), source })?;
    let cfg = serde_json::from_str(&text)
        .map_err(|source| ConfigFileError::Parse { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), "loaded engine config");
    Ok(cfg)
}

/// Load, apply overrides and validate.
pub fn resolve(path: Option<&Path>, overrides: &EngineOverrides) -> Result<EngineConfig, ConfigFileError> {
    let mut cfg = load_config(path)?;
    overrides.apply(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

// ════════════════════════════════════════════════════════════════════════════
// Command-line overrides
// ════════════════════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug, Default)]
pub struct EngineOverrides {
    /// Cursor EMA factor in (0, 1]
    #[arg(long)]
    pub smoothing: Option<f32>,

    /// Gesture history length
    #[arg(long)]
    pub history_len: Option<usize>,

    /// Votes a gesture needs within the history
    #[arg(long)]
    pub quorum: Option<usize>,

    /// Handless frames before the idle reset
    #[arg(long)]
    pub idle_frames: Option<u32>,

    /// Scroll amount per frame
    #[arg(long)]
    pub scroll_step: Option<i32>,

    /// Landmark moving-average window (1 disables it)
    #[arg(long)]
    pub landmark_window: Option<usize>,

    /// Landmark id that steers the cursor
    #[arg(long)]
    pub cursor_landmark: Option<usize>,

    /// Fixed screen size, e.g. 2560x1440
    #[arg(long, value_parser = parse_screen)]
    pub screen: Option<ScreenSize>,

    /// Fingertips outside the active zone: extrapolate or clamp
    #[arg(long, value_parser = parse_overflow)]
    pub zone_overflow: Option<ZoneOverflow>,
}

impl EngineOverrides {
    pub fn apply(&self, cfg: &mut EngineConfig) {
        if let Some(v) = self.smoothing       { cfg.smoothing = v; }
        if let Some(v) = self.history_len     { cfg.history_len = v; }
        if let Some(v) = self.quorum          { cfg.quorum = v; }
        if let Some(v) = self.idle_frames     { cfg.idle_frames = v; }
        if let Some(v) = self.scroll_step     { cfg.scroll_step = v; }
        if let Some(v) = self.landmark_window { cfg.landmark_window = v; }
        if let Some(v) = self.cursor_landmark { cfg.cursor_landmark = v; }
        if let Some(v) = self.screen          { cfg.screen = Some(v); }
        if let Some(v) = self.zone_overflow   { cfg.zone_overflow = v; }
    }
}

pub fn parse_screen(s: &str) -> Result<ScreenSize, String> {
    let (w, h) = s.split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("width: {}", e))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("height: {}", e))?;
    Ok(ScreenSize::new(w, h))
}

pub fn parse_overflow(s: &str) -> Result<ZoneOverflow, String> {
    match s.to_ascii_lowercase().as_str() {
        "extrapolate" => Ok(ZoneOverflow::Extrapolate),
        "clamp"       => Ok(ZoneOverflow::Clamp),
        other         => Err(format!("unknown zone overflow {:?} (extrapolate, clamp)", other)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
