#[cfg(test)]
mod tests;

use crate::observer::{BusWatcher, PresencePoller};
use crate::GstVolumeSink;

use vgate_core::config::{DetectionMode, PipelineConfig};
use vgate_core::error;
use vgate_core::observation::ObservationSender;

use gst::prelude::*;
use gstreamer as gst;
use tracing::debug;

pub const PIPELINE_NAME: &str = "voice-gated-mixer";

/// The mixing pipeline: a test tone behind a volume element and the
/// microphone behind a voice detector, both feeding one mixer.
///
/// ```text
/// audiotestsrc -> audioconvert -> volume ---------> audiomixer -> autoaudiosink
/// autoaudiosrc -> audioconvert -> <detector> ----/
/// ```
pub struct GstContext {
    mode: DetectionMode,
    config: PipelineConfig,

    pipeline: gst::Pipeline,

    volume: gst::Element,
    detector: gst::Element,
}

impl GstContext {
    pub fn new(config: &PipelineConfig, mode: DetectionMode) -> error::Result<Self> {
        config.validate()?;

        let pipeline = gst::Pipeline::new(Some(PIPELINE_NAME));

        let tone = gst::ElementFactory::make("audiotestsrc")
            .name("tone")
            .property_from_str("wave", &config.tone.wave)
            .property("freq", config.tone.freq)
            .build()
            .map_err(|e| creation_failed("audiotestsrc", e))?;
        let tone_convert = make("audioconvert", "tone_convert")?;
        let volume = make("volume", "tone_volume")?;

        let mic = make("autoaudiosrc", "mic")?;
        let mic_convert = make("audioconvert", "mic_convert")?;
        let detector = match mode {
            DetectionMode::Presence => make(&config.presence.element, "detector")?,
            DetectionMode::Level => gst::ElementFactory::make("level")
                .name("detector")
                .property("post-messages", true)
                .property("interval", config.level.interval_ns()?)
                .build()
                .map_err(|e| creation_failed("level", e))?,
        };

        let mixer = make("audiomixer", "mixer")?;
        let sink = make("autoaudiosink", "output")?;

        pipeline
            .add_many(&[
                &tone,
                &tone_convert,
                &volume,
                &mic,
                &mic_convert,
                &detector,
                &mixer,
                &sink,
            ])
            .map_err(|e| error::Error::Pipeline(format!("Failed to add elements: {e}")))?;

        gst::Element::link_many(&[&tone, &tone_convert, &volume, &mixer])
            .map_err(|e| link_failed("tone", e))?;
        gst::Element::link_many(&[&mic, &mic_convert, &detector, &mixer])
            .map_err(|e| link_failed("microphone", e))?;
        gst::Element::link_many(&[&mixer, &sink]).map_err(|e| link_failed("output", e))?;

        debug!("Built {mode} pipeline {PIPELINE_NAME}");

        Ok(Self {
            mode,
            config: config.clone(),

            pipeline,

            volume,
            detector,
        })
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn pipeline(&self) -> &gst::Pipeline {
        &self.pipeline
    }

    pub fn volume_sink(&self) -> GstVolumeSink {
        GstVolumeSink::new(self.volume.clone())
    }

    /// Hands the only observation sender to the source matching the
    /// detection mode: the presence poller, or the bus watcher for level
    /// messages. The watcher is always returned since it also reports
    /// errors and the end of stream.
    pub fn observe(
        &self,
        send: ObservationSender,
    ) -> error::Result<(BusWatcher, Option<PresencePoller>)> {
        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| error::Error::Pipeline(String::from("Pipeline has no bus")))?;
        let timeout = self.config.bus_poll_timeout();

        match self.mode {
            DetectionMode::Presence => {
                let poller = PresencePoller::new(
                    self.detector.clone(),
                    &self.config.presence.property,
                    self.config.presence.poll_interval(),
                    send,
                );

                Ok((BusWatcher::new(bus, timeout, None), Some(poller)))
            }
            DetectionMode::Level => Ok((BusWatcher::new(bus, timeout, Some(send)), None)),
        }
    }

    pub fn make_playing(&self) -> error::Result<()> {
        self.set_state(gst::State::Playing)
    }

    pub fn make_null(&self) -> error::Result<()> {
        self.set_state(gst::State::Null)
    }

    fn set_state(&self, state: gst::State) -> error::Result<()> {
        self.pipeline.set_state(state).map_err(|e| {
            error::Error::Pipeline(format!("Failed to set pipeline to {state:?}: {e}"))
        })?;

        Ok(())
    }
}

impl Drop for GstContext {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

fn make(factory: &str, name: &str) -> error::Result<gst::Element> {
    gst::ElementFactory::make(factory)
        .name(name)
        .build()
        .map_err(|e| creation_failed(factory, e))
}

fn creation_failed(factory: &str, e: impl std::fmt::Display) -> error::Error {
    error::Error::Pipeline(format!("Failed to create {factory}: {e}"))
}

fn link_failed(branch: &str, e: impl std::fmt::Display) -> error::Error {
    error::Error::Pipeline(format!("Failed to link the {branch} branch: {e}"))
}
