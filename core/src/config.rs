
use crate::error;
use crate::gate::{GateController, GatePolicy, GateState, Threshold};

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    /// Poll a boolean voice-activity property of the detector element.
    Presence,
    /// Listen for level measurements posted on the pipeline bus.
    #[default]
    Level,
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence => write!(f, "presence"),
            Self::Level => write!(f, "level"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gate: GateConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> error::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> error::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> error::Result<()> {
        self.gate.validate()?;
        self.pipeline.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub mode: DetectionMode,
    /// Level at or above which the microphone counts as speaking, in dB.
    /// Unused in presence mode.
    pub threshold_db: f64,
    pub policy: GatePolicy,
    pub initial_state: GateState,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            mode: DetectionMode::default(),
            threshold_db: Threshold::DEFAULT.db(),
            policy: GatePolicy::default(),
            initial_state: GateState::default(),
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> error::Result<()> {
        Threshold::new(self.threshold_db).map(|_| ())
    }

    pub fn threshold(&self) -> error::Result<Option<Threshold>> {
        match self.mode {
            DetectionMode::Presence => Ok(None),
            DetectionMode::Level => Threshold::new(self.threshold_db).map(Some),
        }
    }

    pub fn controller(&self) -> error::Result<GateController> {
        Ok(GateController::new(
            self.policy,
            self.threshold()?,
            self.initial_state,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tone: ToneConfig,
    pub presence: PresenceConfig,
    pub level: LevelConfig,
    /// How long a bus read blocks before the watcher checks for shutdown.
    pub bus_poll_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tone: ToneConfig::default(),
            presence: PresenceConfig::default(),
            level: LevelConfig::default(),
            bus_poll_timeout_ms: 100,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> error::Result<()> {
        self.tone.validate()?;
        self.presence.validate()?;
        self.level.validate()?;
        non_zero("pipeline.bus_poll_timeout_ms", self.bus_poll_timeout_ms)
    }

    pub fn bus_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.bus_poll_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Nickname of an `audiotestsrc` waveform, e.g. `sine` or `square`.
    pub wave: String,
    pub freq: f64,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            wave: String::from("sine"),
            freq: 440.0,
        }
    }
}

impl ToneConfig {
    pub const WAVES: &'static [&'static str] = &[
        "sine",
        "square",
        "saw",
        "triangle",
        "silence",
        "white-noise",
        "pink-noise",
        "sine-table",
        "ticks",
        "gaussian-noise",
        "red-noise",
        "blue-noise",
        "violet-noise",
    ];

    pub fn validate(&self) -> error::Result<()> {
        if !Self::WAVES.contains(&self.wave.as_str()) {
            return Err(error::Error::InvalidConfig(format!(
                "pipeline.tone.wave must be one of {}, got {:?}",
                Self::WAVES.join(", "),
                self.wave
            )));
        }

        if !self.freq.is_finite() || self.freq <= 0.0 {
            return Err(error::Error::InvalidConfig(format!(
                "pipeline.tone.freq must be a positive frequency, got {}",
                self.freq
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Factory name of the voice-activity detector element.
    pub element: String,
    /// Boolean property the detector exposes.
    pub property: String,
    pub poll_interval_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            element: String::from("voiceactivitydetection"),
            property: String::from("voice-activity"),
            poll_interval_ms: 100,
        }
    }
}

impl PresenceConfig {
    pub fn validate(&self) -> error::Result<()> {
        non_empty("pipeline.presence.element", &self.element)?;
        non_empty("pipeline.presence.property", &self.property)?;
        non_zero("pipeline.presence.poll_interval_ms", self.poll_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub interval_ms: u64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self { interval_ms: 50 }
    }
}

impl LevelConfig {
    pub fn validate(&self) -> error::Result<()> {
        non_zero("pipeline.level.interval_ms", self.interval_ms)?;
        self.interval_ns().map(|_| ())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// The interval as `level` takes it, in nanoseconds.
    pub fn interval_ns(&self) -> error::Result<u64> {
        u64::try_from(self.interval().as_nanos()).map_err(|_| {
            error::Error::InvalidConfig(format!(
                "pipeline.level.interval_ms is too large: {}",
                self.interval_ms
            ))
        })
    }
}

fn non_empty(field: &str, value: &str) -> error::Result<()> {
    if value.trim().is_empty() {
        return Err(error::Error::InvalidConfig(format!("{field} must not be empty")));
    }

    Ok(())
}

fn non_zero(field: &str, value: u64) -> error::Result<()> {
    if value == 0 {
        return Err(error::Error::InvalidConfig(format!("{field} must be greater than zero")));
    }

    Ok(())
}
