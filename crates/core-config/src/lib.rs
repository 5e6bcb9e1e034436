//! Configuration loading and parsing.
//!
//! Parses `oxidized-ime.toml` (or an override path provided by the embedder):
//!
//! ```toml
//! [session]
//! idle_delay_ms = 0        # 0 = next paint tick
//! frame_interval_ms = 16
//! max_burst_len = 256
//!
//! [quirks]
//! profile = "api28"        # "api26" | "api28"
//! settle_delay_ms = 100
//! ```
//!
//! Every field has a default. Unknown fields are ignored (TOML deserialization
//! tolerance) and a file that fails to parse yields defaults, so a bad config
//! never disables input handling. Raw parsed values are retained; the clamped
//! values used at runtime live in the `effective_*` fields and are computed by
//! `Config::normalize` (clamps logged at `info` under the `config` target).

use anyhow::Result;
use core_session::{IdleInterval, SessionSettings};
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::{debug, info, warn};

pub const CONFIG_FILE_NAME: &str = "oxidized-ime.toml";

const FRAME_INTERVAL_RANGE: (u64, u64) = (1, 1000);
const SETTLE_DELAY_MAX: u64 = 2000;

/// Which built-in quirk handler set to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuirkProfile {
    /// Input methods that cannot cancel Enter and report suggestions late.
    Api26,
    /// Input methods that can cancel Enter.
    #[default]
    Api28,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default)]
    pub idle_delay_ms: u64,
    #[serde(default = "SessionConfig::default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "SessionConfig::default_max_burst_len")]
    pub max_burst_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_delay_ms: 0,
            frame_interval_ms: Self::default_frame_interval_ms(),
            max_burst_len: Self::default_max_burst_len(),
        }
    }
}

impl SessionConfig {
    const fn default_frame_interval_ms() -> u64 {
        16
    }
    const fn default_max_burst_len() -> usize {
        256
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuirksConfig {
    #[serde(default)]
    pub profile: QuirkProfile,
    #[serde(default = "QuirksConfig::default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for QuirksConfig {
    fn default() -> Self {
        Self {
            profile: QuirkProfile::default(),
            settle_delay_ms: Self::default_settle_delay_ms(),
        }
    }
}

impl QuirksConfig {
    const fn default_settle_delay_ms() -> u64 {
        100
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub quirks: QuirksConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>,  // original file string (optional)
    pub file: ConfigFile,     // parsed (or default) data
    pub path: Option<PathBuf>,
    pub effective_frame_interval_ms: u64,
    pub effective_settle_delay_ms: u64,
    pub effective_max_burst_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default(), None, None)
    }
}

/// Best-effort config path: working directory first, then the platform config
/// dir (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxidized-ime").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(parse_str(&content, Some(path))),
        Err(err) => {
            debug!(target: "config", path = %path.display(), error = %err, "config_missing_using_defaults");
            Ok(Config::default())
        }
    }
}

/// Parse TOML text; a parse error falls back to defaults.
pub fn parse_str(content: &str, path: Option<PathBuf>) -> Config {
    match toml::from_str::<ConfigFile>(content) {
        Ok(file) => Config::from_file(file, Some(content.to_string()), path),
        Err(err) => {
            warn!(target: "config", error = %err, "config_parse_failed_using_defaults");
            Config::default()
        }
    }
}

impl Config {
    fn from_file(file: ConfigFile, raw: Option<String>, path: Option<PathBuf>) -> Self {
        let mut cfg = Self {
            raw,
            file,
            path,
            effective_frame_interval_ms: 0,
            effective_settle_delay_ms: 0,
            effective_max_burst_len: 0,
        };
        cfg.normalize();
        cfg
    }

    /// Recompute the `effective_*` fields from `file`, clamping out-of-range
    /// values. Returns true when any value was clamped.
    pub fn normalize(&mut self) -> bool {
        let (lo, hi) = FRAME_INTERVAL_RANGE;
        let raw_frame = self.file.session.frame_interval_ms;
        let frame = raw_frame.clamp(lo, hi);
        if frame != raw_frame {
            info!(target: "config", raw = raw_frame, clamped = frame, min = lo, max = hi, "session_frame_interval_clamped");
        }

        let raw_settle = self.file.quirks.settle_delay_ms;
        let settle = raw_settle.min(SETTLE_DELAY_MAX);
        if settle != raw_settle {
            info!(target: "config", raw = raw_settle, clamped = settle, max = SETTLE_DELAY_MAX, "quirks_settle_delay_clamped");
        }

        let raw_cap = self.file.session.max_burst_len;
        let cap = raw_cap.max(1);
        if cap != raw_cap {
            info!(target: "config", raw = raw_cap, clamped = cap, "session_max_burst_len_clamped");
        }

        self.effective_frame_interval_ms = frame;
        self.effective_settle_delay_ms = settle;
        self.effective_max_burst_len = cap;
        frame != raw_frame || settle != raw_settle || cap != raw_cap
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            idle: IdleInterval::from_millis(self.file.session.idle_delay_ms),
            frame_interval: Duration::from_millis(self.effective_frame_interval_ms),
            max_burst_len: self.effective_max_burst_len,
        }
    }

    pub fn profile(&self) -> QuirkProfile {
        self.file.quirks.profile
    }

    /// Delay handlers wait for the platform to finish mutating the surface.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.effective_settle_delay_ms)
    }
}
