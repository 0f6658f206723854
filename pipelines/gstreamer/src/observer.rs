
use crate::gst_context::PIPELINE_NAME;

use vgate_core::error;
use vgate_core::gate::ActivitySignal;
use vgate_core::observation::{Observation, ObservationSender};
use vgate_core::util::{ControlFlow, Runnable, Timer};

use std::time::Duration;

use gst::glib;
use gst::prelude::*;
use gstreamer as gst;
use tracing::{debug, info, trace, warn};

/// Level reported for a channel that is digitally silent. The `level`
/// element posts `-inf` there, which the gate would reject.
pub const SILENCE_DB: f64 = -200.0;

/// Reads the detector's boolean voice-activity property on a fixed
/// interval.
pub struct PresencePoller {
    detector: gst::Element,
    property: String,
    timer: Timer,
    send: ObservationSender,
}

impl PresencePoller {
    pub fn new(
        detector: gst::Element,
        property: &str,
        interval: Duration,
        send: ObservationSender,
    ) -> Self {
        Self {
            detector,
            property: property.to_string(),
            timer: Timer::new(interval),
            send,
        }
    }
}

impl Runnable for PresencePoller {
    fn update(&mut self, control_flow: &mut ControlFlow) -> error::Result<()> {
        self.timer.wait();

        let observation = read_presence(&self.detector, &self.property);
        trace!("Polled {}: {observation:?}", self.property);

        if self.send.send(observation).is_err() {
            debug!("Nobody listens to presence observations anymore");
            *control_flow = ControlFlow::Break;
        }

        Ok(())
    }

    fn on_start(&mut self) {
        info!(
            "Polling {}::{} every {:?}",
            self.detector.name(),
            self.property,
            self.timer.interval()
        );
        self.timer.restart();
    }
}

pub fn read_presence(detector: &gst::Element, property: &str) -> Observation {
    if detector.find_property(property).is_none() {
        return Err(error::Error::InvalidSignal(format!(
            "{} has no {property} property",
            detector.name()
        )));
    }

    detector
        .property_value(property)
        .get::<bool>()
        .map(ActivitySignal::Presence)
        .map_err(|e| error::Error::InvalidSignal(format!("{property} is not a boolean: {e}")))
}

/// Drains the pipeline bus: logs errors, warnings and state changes, stops on
/// error or end of stream and, when given a sender, forwards `level`
/// measurements as observations.
pub struct BusWatcher {
    bus: gst::Bus,
    timeout: Duration,
    level: Option<ObservationSender>,
}

impl BusWatcher {
    const MESSAGE_TYPES: &'static [gst::MessageType] = &[
        gst::MessageType::Error,
        gst::MessageType::Warning,
        gst::MessageType::Eos,
        gst::MessageType::StateChanged,
        gst::MessageType::Element,
    ];

    pub fn new(bus: gst::Bus, timeout: Duration, level: Option<ObservationSender>) -> Self {
        Self {
            bus,
            timeout,
            level,
        }
    }

    pub fn forwards_levels(&self) -> bool {
        self.level.is_some()
    }

    pub fn handle(
        &mut self,
        msg: &gst::Message,
        control_flow: &mut ControlFlow,
    ) -> error::Result<()> {
        use gst::MessageView;

        match msg.view() {
            MessageView::Error(err) => {
                *control_flow = ControlFlow::Break;

                let src = msg.src().map(|src| src.path_string());
                return Err(error::Error::Pipeline(format!(
                    "Error from {src:?}: {} ({:?})",
                    err.error(),
                    err.debug()
                )));
            }
            MessageView::Warning(warning) => {
                let src = msg.src().map(|src| src.path_string());
                warn!("Warning from {src:?}: {}", warning.error());
            }
            MessageView::Eos(..) => {
                info!("End of stream");
                *control_flow = ControlFlow::Break;
            }
            MessageView::StateChanged(state) => {
                let from_pipeline = msg
                    .src()
                    .map_or(false, |src| src.name().as_str() == PIPELINE_NAME);
                if from_pipeline {
                    info!("State changed: {:?} -> {:?}", state.old(), state.current());
                }
            }
            MessageView::Element(..) => {
                let Some(structure) = msg.structure() else {
                    return Ok(());
                };
                if !structure.has_name("level") {
                    return Ok(());
                }
                let Some(send) = self.level.as_ref() else {
                    return Ok(());
                };

                let observation = parse_level_rms(structure).map(ActivitySignal::Level);
                trace!("Level message: {observation:?}");

                if send.send(observation).is_err() {
                    debug!("Nobody listens to level observations anymore");
                    self.level = None;
                }
            }
            _ => {}
        }

        Ok(())
    }
}

impl Runnable for BusWatcher {
    fn update(&mut self, control_flow: &mut ControlFlow) -> error::Result<()> {
        let timeout = gst::ClockTime::from_nseconds(self.timeout.as_nanos() as u64);
        let Some(msg) = self.bus.timed_pop_filtered(timeout, Self::MESSAGE_TYPES) else {
            return Ok(());
        };

        self.handle(&msg, control_flow)
    }
}

/// Extracts the loudest channel's RMS level, in dB, from a `level` message.
///
/// `level` posts one double per channel in a `GValueArray`. A plain double or
/// a `GstValueArray` is accepted as well.
pub fn parse_level_rms(structure: &gst::StructureRef) -> error::Result<f64> {
    let value = structure.value("rms").map_err(|_| {
        error::Error::InvalidSignal(String::from("level message has no rms field"))
    })?;

    let channels = if let Ok(db) = value.get::<f64>() {
        vec![db]
    } else if let Ok(array) = value.get::<&glib::ValueArray>() {
        channel_levels(array.iter())?
    } else if let Ok(array) = value.get::<gst::Array>() {
        channel_levels(array.iter().map(|value| &**value))?
    } else {
        return Err(error::Error::InvalidSignal(format!(
            "rms field is a {}, not a list of doubles",
            value.type_()
        )));
    };

    loudest(&channels)
}

fn channel_levels<'a>(
    values: impl IntoIterator<Item = &'a glib::Value>,
) -> error::Result<Vec<f64>> {
    values
        .into_iter()
        .map(|value| {
            value.get::<f64>().map_err(|e| {
                error::Error::InvalidSignal(format!("rms channel is not a double: {e}"))
            })
        })
        .collect()
}

fn loudest(channels: &[f64]) -> error::Result<f64> {
    if channels.is_empty() {
        return Err(error::Error::InvalidSignal(String::from(
            "rms field has no channels",
        )));
    }
    if channels.iter().any(|db| db.is_nan()) {
        return Err(error::Error::InvalidSignal(format!(
            "rms field has a NaN channel: {channels:?}"
        )));
    }

    let db = channels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if db == f64::NEG_INFINITY {
        return Ok(SILENCE_DB);
    }

    Ok(db)
}
