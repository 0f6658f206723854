#[cfg(test)]
mod tests;

use crate::error;
use crate::gate::ActivitySignal;

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, SendError, Sender};

/// An observation an adapter managed to extract from the detector, or the
/// reason it couldn't.
pub type Observation = error::Result<ActivitySignal>;

/// Creates the only sender and the only stream of a new observation channel.
pub fn observation_stream() -> (ObservationSender, ObservationStream) {
    let (send, recv) = unbounded();

    (ObservationSender(send), ObservationStream(recv))
}

/// Write end of an observation channel. It can't be cloned, so a stream has
/// exactly one source.
pub struct ObservationSender(Sender<Observation>);

impl ObservationSender {
    pub fn send(&self, observation: Observation) -> error::Result<()> {
        self.0
            .send(observation)
            .map_err(|SendError(_)| error::Error::Other(String::from("observation stream is closed")))
    }

    pub fn signal(&self, signal: ActivitySignal) -> error::Result<()> {
        self.send(Ok(signal))
    }

    pub fn invalid(&self, reason: impl Into<String>) -> error::Result<()> {
        self.send(Err(error::Error::InvalidSignal(reason.into())))
    }
}

/// Read end of an observation channel. Observations come out in arrival
/// order; the stream ends once its sender is dropped and can't be restarted.
pub struct ObservationStream(Receiver<Observation>);

#[derive(Debug)]
pub enum NextObservation {
    Ready(Observation),
    Pending,
    Closed,
}

impl ObservationStream {
    pub fn next_timeout(&self, timeout: Duration) -> NextObservation {
        match self.0.recv_timeout(timeout) {
            Ok(observation) => NextObservation::Ready(observation),
            Err(RecvTimeoutError::Timeout) => NextObservation::Pending,
            Err(RecvTimeoutError::Disconnected) => NextObservation::Closed,
        }
    }

    pub fn pending(&self) -> usize {
        self.0.len()
    }
}

impl Iterator for ObservationStream {
    type Item = Observation;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.recv().ok()
    }
}
