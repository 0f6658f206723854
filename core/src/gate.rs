
use crate::error;
use crate::observation::Observation;

use std::fmt;
use std::sync::Arc;

use crossbeam_utils::atomic::AtomicCell;
use serde::{Deserialize, Serialize};

/// A single voice-activity observation delivered by an external detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivitySignal {
    /// Whether the detector currently reports speech.
    Presence(bool),
    /// A level measurement in decibels.
    Level(f64),
}

impl fmt::Display for ActivitySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence(present) => write!(f, "presence({present})"),
            Self::Level(db) => write!(f, "level({db:.2} dB)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: Self = Self(-30.0);

    pub fn new(db: f64) -> error::Result<Self> {
        if !db.is_finite() {
            return Err(error::Error::InvalidConfig(format!(
                "threshold must be a finite decibel value, got {db}"
            )));
        }

        Ok(Self(db))
    }

    pub fn db(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Volume written to the controlled sink. Only the fully muted and the
/// fully unmuted values can be constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeCommand(f64);

impl VolumeCommand {
    pub const MUTED: Self = Self(0.0);
    pub const UNMUTED: Self = Self(1.0);

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn state(self) -> GateState {
        if self == Self::MUTED {
            GateState::Muted
        } else {
            GateState::Unmuted
        }
    }
}

impl fmt::Display for VolumeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateState {
    Muted,
    #[default]
    Unmuted,
}

impl GateState {
    pub fn command(self) -> VolumeCommand {
        match self {
            Self::Muted => VolumeCommand::MUTED,
            Self::Unmuted => VolumeCommand::UNMUTED,
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Muted => write!(f, "muted"),
            Self::Unmuted => write!(f, "unmuted"),
        }
    }
}

/// Which gate state speech selects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GatePolicy {
    #[default]
    MuteOnSpeech,
    UnmuteOnSpeech,
}

impl GatePolicy {
    pub fn state_for(self, speech: bool) -> GateState {
        match (self, speech) {
            (Self::MuteOnSpeech, true) | (Self::UnmuteOnSpeech, false) => GateState::Muted,
            (Self::MuteOnSpeech, false) | (Self::UnmuteOnSpeech, true) => GateState::Unmuted,
        }
    }

    pub fn evaluate(
        self,
        signal: ActivitySignal,
        threshold: Option<Threshold>,
    ) -> error::Result<VolumeCommand> {
        let speech = is_speech(signal, threshold)?;

        Ok(self.state_for(speech).command())
    }
}

/// Decides whether a signal means speech. A level equal to the threshold
/// counts as speech.
pub fn is_speech(signal: ActivitySignal, threshold: Option<Threshold>) -> error::Result<bool> {
    match signal {
        ActivitySignal::Presence(present) => Ok(present),
        ActivitySignal::Level(db) if !db.is_finite() => Err(error::Error::InvalidSignal(
            format!("level {db} is not a finite measurement"),
        )),
        ActivitySignal::Level(db) => {
            let Some(threshold) = threshold else {
                return Err(error::Error::InvalidSignal(String::from(
                    "level measurement has no threshold to compare against",
                )));
            };

            Ok(db >= threshold.db())
        }
    }
}

/// Maps a signal to a volume command, muting while speech is present.
pub fn evaluate(signal: ActivitySignal, threshold: Option<Threshold>) -> error::Result<VolumeCommand> {
    GatePolicy::MuteOnSpeech.evaluate(signal, threshold)
}

/// Turns observations into volume commands and remembers the last one issued.
///
/// The controller holds no history besides the last command: every valid
/// observation fully determines the next command, and an invalid one leaves
/// it untouched. Methods take `&self`, so the controller can be shared, but a
/// single observation source per controller is expected.
pub struct GateController {
    policy: GatePolicy,
    threshold: Option<Threshold>,
    last: Arc<AtomicCell<VolumeCommand>>,
}

impl GateController {
    pub fn new(policy: GatePolicy, threshold: Option<Threshold>, initial: GateState) -> Self {
        Self {
            policy,
            threshold,
            last: Arc::new(AtomicCell::new(initial.command())),
        }
    }

    pub fn presence(policy: GatePolicy) -> Self {
        Self::new(policy, None, GateState::default())
    }

    pub fn level(policy: GatePolicy, threshold: Threshold) -> Self {
        Self::new(policy, Some(threshold), GateState::default())
    }

    pub fn observe(&self, observation: Observation) -> error::Result<VolumeCommand> {
        let signal = observation?;
        let command = self.policy.evaluate(signal, self.threshold)?;
        self.last.store(command);

        Ok(command)
    }

    pub fn last_command(&self) -> VolumeCommand {
        self.last.load()
    }

    pub fn state(&self) -> GateState {
        self.last_command().state()
    }

    pub fn policy(&self) -> GatePolicy {
        self.policy
    }

    pub fn threshold(&self) -> Option<Threshold> {
        self.threshold
    }

    pub fn monitor(&self) -> VolumeMonitor {
        VolumeMonitor(self.last.clone())
    }
}

/// Read-only view of the last command issued by a [`GateController`].
#[derive(Clone)]
pub struct VolumeMonitor(Arc<AtomicCell<VolumeCommand>>);

impl VolumeMonitor {
    pub fn last_command(&self) -> VolumeCommand {
        self.0.load()
    }

    pub fn state(&self) -> GateState {
        self.last_command().state()
    }
}
