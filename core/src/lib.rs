pub mod config;
pub mod driver;
pub mod error;
pub mod gate;
pub mod observation;
pub mod sink;
pub mod util;

pub use config::{Config, DetectionMode, GateConfig, PipelineConfig};
pub use driver::GateDriver;
pub use gate::{
    evaluate, ActivitySignal, GateController, GatePolicy, GateState, Threshold, VolumeCommand,
    VolumeMonitor,
};
pub use observation::{
    observation_stream, NextObservation, Observation, ObservationSender, ObservationStream,
};
pub use sink::VolumeSink;
