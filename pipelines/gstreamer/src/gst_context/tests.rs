use super::*;

use vgate_core::config::PresenceConfig;
use vgate_core::gate::VolumeCommand;
use vgate_core::observation::observation_stream;
use vgate_core::sink::VolumeSink;

const LEVEL_ELEMENTS: &[&str] = &[
    "audiotestsrc",
    "audioconvert",
    "volume",
    "autoaudiosrc",
    "level",
    "audiomixer",
    "autoaudiosink",
];

fn has_elements(factories: &[&str]) -> bool {
    gst::init().unwrap();
    let missing: Vec<_> = factories
        .iter()
        .filter(|factory| gst::ElementFactory::find(factory).is_none())
        .collect();
    if !missing.is_empty() {
        eprintln!("skipped: missing GStreamer elements {missing:?}");
    }

    missing.is_empty()
}

fn presence_config() -> PipelineConfig {
    PipelineConfig {
        presence: PresenceConfig {
            element: String::from("identity"),
            property: String::from("silent"),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_level_pipeline_wires_bus_watcher() {
    if !has_elements(LEVEL_ELEMENTS) {
        return;
    }

    let context = GstContext::new(&PipelineConfig::default(), DetectionMode::Level).unwrap();
    assert_eq!(context.mode(), DetectionMode::Level);
    assert_eq!(context.pipeline().name().as_str(), PIPELINE_NAME);

    let (send, _stream) = observation_stream();
    let (watcher, poller) = context.observe(send).unwrap();
    assert!(watcher.forwards_levels());
    assert!(poller.is_none());
}

#[test]
fn test_presence_pipeline_wires_poller() {
    if !has_elements(LEVEL_ELEMENTS) || !has_elements(&["identity"]) {
        return;
    }

    let context = GstContext::new(&presence_config(), DetectionMode::Presence).unwrap();

    let (send, _stream) = observation_stream();
    let (watcher, poller) = context.observe(send).unwrap();
    assert!(!watcher.forwards_levels());
    assert!(poller.is_some());
}

#[test]
fn test_missing_detector_fails() {
    gst::init().unwrap();

    let mut config = PipelineConfig::default();
    config.presence.element = String::from("no-such-voice-detector");

    let res = GstContext::new(&config, DetectionMode::Presence);
    assert!(matches!(res, Err(error::Error::Pipeline(_))));
}

#[test]
fn test_invalid_config_is_rejected() {
    gst::init().unwrap();

    let mut config = PipelineConfig::default();
    config.tone.wave = String::from("kazoo");

    let res = GstContext::new(&config, DetectionMode::Level);
    assert!(matches!(res, Err(error::Error::InvalidConfig(_))));
}

#[test]
fn test_volume_sink_drives_volume_element() {
    if !has_elements(&["volume"]) {
        return;
    }

    let volume = gst::ElementFactory::make("volume").build().unwrap();
    let mut sink = GstVolumeSink::new(volume);

    sink.apply(VolumeCommand::MUTED).unwrap();
    assert_eq!(sink.current().unwrap(), 0.0);

    sink.apply(VolumeCommand::UNMUTED).unwrap();
    assert_eq!(sink.current().unwrap(), 1.0);
}

#[test]
fn test_volume_sink_without_volume_property() {
    if !has_elements(&["identity"]) {
        return;
    }

    let identity = gst::ElementFactory::make("identity").build().unwrap();
    let mut sink = GstVolumeSink::new(identity);

    assert!(matches!(
        sink.apply(VolumeCommand::MUTED),
        Err(error::Error::ActuationFailure(_))
    ));
}
