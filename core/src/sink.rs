use crate::error;
use crate::gate::VolumeCommand;

/// The audio path whose volume the gate controls.
pub trait VolumeSink: Send {
    fn apply(&mut self, command: VolumeCommand) -> error::Result<()>;
}
