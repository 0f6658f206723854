mod gst_context;
mod observer;

pub use gst_context::{GstContext, PIPELINE_NAME};
pub use observer::{parse_level_rms, read_presence, BusWatcher, PresencePoller, SILENCE_DB};

use vgate_core::error;
use vgate_core::gate::VolumeCommand;
use vgate_core::sink::VolumeSink;

use gst::prelude::*;
use gstreamer as gst;

/// Drives the `volume` property of a GStreamer element.
pub struct GstVolumeSink {
    element: gst::Element,
}

impl GstVolumeSink {
    const PROPERTY: &'static str = "volume";

    pub fn new(element: gst::Element) -> Self {
        Self { element }
    }

    pub fn current(&self) -> error::Result<f64> {
        self.check()?;

        self.element
            .property_value(Self::PROPERTY)
            .get::<f64>()
            .map_err(|e| error::Error::ActuationFailure(e.to_string()))
    }

    fn check(&self) -> error::Result<()> {
        let Some(pspec) = self.element.find_property(Self::PROPERTY) else {
            return Err(error::Error::ActuationFailure(format!(
                "{} has no {} property",
                self.element.name(),
                Self::PROPERTY
            )));
        };
        if pspec.value_type() != f64::static_type() {
            return Err(error::Error::ActuationFailure(format!(
                "{}::{} is a {}, not a double",
                self.element.name(),
                Self::PROPERTY,
                pspec.value_type()
            )));
        }

        Ok(())
    }
}

impl VolumeSink for GstVolumeSink {
    fn apply(&mut self, command: VolumeCommand) -> error::Result<()> {
        self.check()?;
        self.element.set_property(Self::PROPERTY, command.value());

        Ok(())
    }
}
