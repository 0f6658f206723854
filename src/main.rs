#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use gst_pipeline::GstContext;
use vgate_core::util::{RunnableStateMachine, RunnableThread};
use vgate_core::{observation_stream, Config, DetectionMode, GateDriver, GatePolicy};

/// Mutes a test tone while someone speaks into the microphone
#[derive(Parser)]
#[command(name = "vgate", version, long_about = None)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How voice activity is observed
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Level threshold in dB, used in level mode
    #[arg(short, long, allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// What speech does to the test tone
    #[arg(short, long, value_enum)]
    policy: Option<Policy>,

    /// Test tone waveform (sine, square, saw, ...)
    #[arg(short, long)]
    wave: Option<String>,

    /// Stop after this many seconds (0 = until end of stream or error)
    #[arg(short, long, default_value_t = 0)]
    duration: u64,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Presence,
    Level,
}

impl From<Mode> for DetectionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Presence => DetectionMode::Presence,
            Mode::Level => DetectionMode::Level,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    MuteOnSpeech,
    UnmuteOnSpeech,
}

impl From<Policy> for GatePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::MuteOnSpeech => GatePolicy::MuteOnSpeech,
            Policy::UnmuteOnSpeech => GatePolicy::UnmuteOnSpeech,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, &directives))
        .init();

    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        Config::default()
    };

    if let Some(mode) = cli.mode {
        config.gate.mode = mode.into();
    }
    if let Some(threshold) = cli.threshold {
        config.gate.threshold_db = threshold;
    }
    if let Some(policy) = cli.policy {
        config.gate.policy = policy.into();
    }
    if let Some(wave) = cli.wave {
        config.pipeline.tone.wave = wave;
    }
    config.validate().context("Invalid configuration")?;

    let duration = (cli.duration > 0).then(|| Duration::from_secs(cli.duration));

    run(config, duration)
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// `RUST_LOG` directives win; `-v` only sets the level when none are given.
fn log_filter(verbose: u8, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(log_level(verbose).into())
        .parse_lossy(directives)
}

fn run(config: Config, duration: Option<Duration>) -> Result<()> {
    gst::init().context("Failed to initialize GStreamer")?;

    let context = GstContext::new(&config.pipeline, config.gate.mode)
        .context("Failed to build the pipeline")?;
    let controller = config.gate.controller()?;
    let monitor = controller.monitor();

    let (send, stream) = observation_stream();
    let (watcher, poller) = context.observe(send)?;

    let driver = GateDriver::new(controller, stream, context.volume_sink());
    let driver_thread = RunnableThread::spawn("gate-driver", driver)?;
    let poller_thread = poller
        .map(|poller| RunnableThread::spawn("presence-poller", poller))
        .transpose()?;

    context
        .make_playing()
        .context("Failed to start the pipeline")?;
    info!(
        "Running in {} mode, tone {}",
        config.gate.mode, config.pipeline.tone.wave
    );

    let started = Instant::now();
    let mut watcher_sm = RunnableStateMachine::new_running(watcher);
    let mut outcome = Ok(());
    while let Some(res) = watcher_sm.proceed() {
        if let Err(e) = res {
            outcome = Err(e);
            break;
        }
        if duration.is_some_and(|duration| started.elapsed() >= duration) {
            info!("Requested duration elapsed");
            break;
        }
        if driver_thread.is_finished() {
            break;
        }
    }
    drop(watcher_sm);

    if let Some(poller_thread) = poller_thread {
        poller_thread.finish();
    }
    driver_thread.finish();
    context.make_null()?;

    info!("Stopped with the tone {}", monitor.state());

    outcome.context("Pipeline failed")
}
