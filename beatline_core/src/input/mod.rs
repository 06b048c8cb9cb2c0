//! Player commands travelling from input threads to the tick loop.
//!
//! Key readers run on their own threads and only hold a [`Sender`]. The tick
//! loop owns the [`InputQueue`] and takes one batch per frame, so a press made
//! mid-frame is judged at the start of the next tick.

pub mod events;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::trace;

use self::events::InputCommand;

pub struct InputQueue {
    sender: Sender<InputCommand>,
    receiver: Receiver<InputCommand>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Handle for a key-reader thread. The queue stays open while `self` lives,
    /// even after every handed-out sender is dropped.
    pub fn sender(&self) -> Sender<InputCommand> {
        self.sender.clone()
    }

    pub fn push(&self, command: InputCommand) {
        // Cannot fail: `self.receiver` keeps the channel connected.
        let _ = self.sender.send(command);
    }

    /// Commands queued so far, oldest first. Stops at what was queued when the
    /// call began, so a reader that keeps pushing cannot stall the frame.
    pub fn drain(&self) -> impl Iterator<Item = InputCommand> + '_ {
        let queued = self.receiver.len();
        if queued > 0 {
            trace!(queued, "draining input");
        }
        self.receiver.try_iter().take(queued)
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
