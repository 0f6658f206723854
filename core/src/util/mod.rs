#[cfg(test)]
mod tests;

mod runnable;
mod thread;

pub use runnable::*;
pub use thread::*;

use std::cell::Cell;
use std::time::*;

pub struct Timer {
    start: Cell<Instant>,
    interval: Duration,
}

impl Timer {
    pub fn new(interval: Duration) -> Self {
        Self {
            start: Cell::new(Instant::now()),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn restart(&self) {
        self.start.set(Instant::now());
    }

    pub fn remaining(&self) -> Duration {
        self.interval.saturating_sub(self.start.get().elapsed())
    }

    pub fn is_time_out(&self) -> bool {
        if self.start.get().elapsed() >= self.interval {
            self.start.set(Instant::now());
            return true;
        }

        false
    }

    /// Blocks until the current interval elapses and starts the next one.
    pub fn wait(&self) {
        std::thread::sleep(self.remaining());
        self.restart();
    }
}
