// config.rs: viewer tuning values and launch options
//
// The "feel" constants (drag sensitivity, projection factors, autoplay speed,
// simulated progress) are empirical. They live here so a deployment can tune
// them without a rebuild.
//
// Lookup order for the config file:
// - CLI: --config <path>
// - Env: PANORAMA_CONFIG
// - <exe_dir>/assets/viewer.json, then ./assets/viewer.json
// - built-in defaults

use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

use crate::panorama::DEFAULT_SENSITIVITY;
use crate::zoom::DEFAULT_WHEEL_RATE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Degrees of rotation per dragged pixel.
    pub drag_sensitivity: f32,
    /// Degrees of FOV per wheel pixel.
    pub wheel_rate: f32,
    /// Background position percent per degree of yaw.
    pub yaw_factor: f32,
    /// Background position percent per degree of pitch.
    pub pitch_factor: f32,
    /// Backdrop width (percent of the viewport) at the default FOV.
    pub base_scale_percent: f32,
    pub autoplay_interval_ms: u64,
    pub autoplay_step_deg: f32,
    pub progress_interval_ms: u64,
    pub progress_step: u8,
    pub progress_cap: u8,
    /// Smoothing applied to programmatic view changes. 0 disables it.
    pub transition_ms: u64,
    /// Longest frame gap replayed into the timers at once.
    pub max_catchup_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: DEFAULT_SENSITIVITY,
            wheel_rate: DEFAULT_WHEEL_RATE,
            yaw_factor: 0.5,
            pitch_factor: 0.5,
            base_scale_percent: 200.0,
            autoplay_interval_ms: 16,
            autoplay_step_deg: 0.1,
            progress_interval_ms: 200,
            progress_step: 10,
            progress_cap: 90,
            transition_ms: 300,
            max_catchup_ms: 250,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Resolves the config file and loads it. Any failure is logged and the
    /// defaults are used instead; a bad config never stops the viewer.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let Some(path) = explicit.map(Path::to_path_buf).or_else(find_config_file) else {
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("loaded viewer config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("ignoring viewer config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("drag_sensitivity", self.drag_sensitivity)?;
        positive("wheel_rate", self.wheel_rate)?;
        positive("yaw_factor", self.yaw_factor)?;
        positive("pitch_factor", self.pitch_factor)?;
        positive("base_scale_percent", self.base_scale_percent)?;
        if !self.autoplay_step_deg.is_finite() {
            return Err(invalid("autoplay_step_deg", "must be finite"));
        }
        if self.autoplay_interval_ms == 0 {
            return Err(invalid("autoplay_interval_ms", "must be at least 1"));
        }
        if self.progress_interval_ms == 0 {
            return Err(invalid("progress_interval_ms", "must be at least 1"));
        }
        if self.progress_step == 0 {
            return Err(invalid("progress_step", "must be at least 1"));
        }
        if self.progress_cap >= 100 {
            return Err(invalid("progress_cap", "must stay below 100"));
        }
        Ok(())
    }

    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn transition(&self) -> Option<Duration> {
        (self.transition_ms > 0).then(|| Duration::from_millis(self.transition_ms))
    }

    pub fn max_catchup(&self) -> Duration {
        Duration::from_millis(self.max_catchup_ms)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be a positive number, got {value}")))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn find_config_file() -> Option<PathBuf> {
    if let Ok(v) = std::env::var("PANORAMA_CONFIG") {
        if !v.trim().is_empty() {
            return Some(PathBuf::from(v));
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("viewer.json");
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("viewer.json");
    p.exists().then_some(p)
}

/// Embedding props, taken from the command line.
///
/// `panorama_tour [--title T] [--thumbnail P] [--auto-rotate] [--lang L] [--config C] [PANORAMA]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchOptions {
    pub panorama: Option<String>,
    pub thumbnail: Option<String>,
    pub title: Option<String>,
    pub auto_rotate: bool,
    pub lang: Option<String>,
    pub config: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    /// Unknown flags are logged and skipped.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut opts = Self::default();
        let mut it = args.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "--title" => opts.title = it.next(),
                "--thumbnail" => opts.thumbnail = it.next(),
                "--lang" => opts.lang = it.next(),
                "--config" => opts.config = it.next().map(PathBuf::from),
                "--auto-rotate" => opts.auto_rotate = true,
                flag if flag.starts_with("--") => {
                    log::warn!("unknown option {flag}");
                }
                _ => opts.panorama = Some(a),
            }
        }
        opts
    }

    /// Title shown on the trigger surface, falling back to the file stem.
    pub fn display_title(&self) -> Option<String> {
        self.title.clone().or_else(|| {
            let p = self.panorama.as_deref()?;
            Path::new(p)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
    }
}
