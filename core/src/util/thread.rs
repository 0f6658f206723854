use crate::error;

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TryRecvError};
use tracing::debug;

use super::runnable::report;
use super::{Runnable, RunnableStateMachine};

/// Runs a [`Runnable`] on a dedicated thread until it breaks, fails or is
/// finished by its owner.
pub struct RunnableThread {
    name: String,
    handle: Option<JoinHandle<()>>,
    send: Sender<()>,
}

impl RunnableThread {
    pub fn spawn<R>(name: &str, runnable: R) -> error::Result<Self>
    where
        R: Runnable + Send + 'static,
    {
        let (send, recv) = bounded(1);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut runnable_sm = RunnableStateMachine::new_running(runnable);

                while matches!(recv.try_recv(), Err(TryRecvError::Empty)) {
                    let Some(res) = runnable_sm.proceed() else {
                        break;
                    };
                    if !report(res) {
                        break;
                    }
                }
            })?;
        debug!("Spawned runnable thread {name}");

        Ok(Self {
            name: name.to_string(),
            handle: Some(handle),
            send,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    pub fn finish(mut self) {
        self.inner_finish();
    }

    fn inner_finish(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        let _ = self.send.try_send(());
        if handle.join().is_err() {
            tracing::error!("Runnable thread {} panicked", self.name);
        }
        debug!("Finished runnable thread {}", self.name);
    }
}

impl Drop for RunnableThread {
    fn drop(&mut self) {
        self.inner_finish();
    }
}
