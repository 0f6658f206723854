
use crate::error;
use crate::gate::{GateController, VolumeCommand};
use crate::observation::{NextObservation, Observation, ObservationStream};
use crate::sink::VolumeSink;
use crate::util::{ControlFlow, Runnable};

use std::time::Duration;

use tracing::{debug, info, warn};

/// Feeds observations from a stream through a [`GateController`] and applies
/// the resulting commands to a sink.
pub struct GateDriver<S: VolumeSink> {
    controller: GateController,
    stream: ObservationStream,
    sink: S,

    poll_timeout: Duration,
    applied: Option<VolumeCommand>,
}

impl<S: VolumeSink> GateDriver<S> {
    pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

    pub fn new(controller: GateController, stream: ObservationStream, sink: S) -> Self {
        Self {
            controller,
            stream,
            sink,

            poll_timeout: Self::DEFAULT_POLL_TIMEOUT,
            applied: None,
        }
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn controller(&self) -> &GateController {
        &self.controller
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Last command the sink accepted.
    pub fn applied(&self) -> Option<VolumeCommand> {
        self.applied
    }

    /// Evaluates one observation and actuates the sink if the command differs
    /// from the last one it accepted.
    pub fn handle(&mut self, observation: Observation) -> error::Result<VolumeCommand> {
        let previous = self.controller.state();
        let command = self.controller.observe(observation)?;

        if command.state() != previous {
            info!("Gate changed: {previous} -> {}", command.state());
        }

        self.actuate(command)?;

        Ok(command)
    }

    fn actuate(&mut self, command: VolumeCommand) -> error::Result<()> {
        if self.applied == Some(command) {
            return Ok(());
        }

        self.sink.apply(command)?;
        self.applied = Some(command);
        debug!("Applied volume {command}");

        Ok(())
    }
}

impl<S: VolumeSink> Runnable for GateDriver<S> {
    fn update(&mut self, control_flow: &mut ControlFlow) -> error::Result<()> {
        let observation = match self.stream.next_timeout(self.poll_timeout) {
            NextObservation::Ready(observation) => observation,
            NextObservation::Pending => return Ok(()),
            NextObservation::Closed => {
                debug!("Observation stream closed");
                *control_flow = ControlFlow::Break;
                return Ok(());
            }
        };

        match self.handle(observation) {
            Err(error::Error::InvalidSignal(reason)) => {
                warn!(
                    "Ignoring invalid signal, keeping volume {}: {reason}",
                    self.controller.last_command()
                );
                Ok(())
            }
            Err(error::Error::ActuationFailure(reason)) => {
                tracing::error!("Failed to apply volume, retrying on next observation: {reason}");
                Ok(())
            }
            res => res.map(|_| ()),
        }
    }

    fn on_start(&mut self) {
        let initial = self.controller.last_command();
        info!(
            "Gate driver started, initial state {} (policy {:?}, threshold {:?})",
            initial.state(),
            self.controller.policy(),
            self.controller.threshold().map(|threshold| threshold.db()),
        );

        if let Err(e) = self.actuate(initial) {
            tracing::error!("Failed to apply initial volume: {e}");
        }
    }

    fn on_stop(&mut self) {
        info!(
            "Gate driver stopped, last volume {}",
            self.controller.last_command()
        );
    }
}
