//! Serialized event intake shared by concurrent producers.
//!
//! Producers hold [`Publisher`] handles; the director owns the single
//! receiving end and drains it in arrival order. Dropping the director closes
//! the intake, after which every publish attempt fails instead of reaching a
//! torn-down director.

use std::sync::{
    mpsc::{self, Receiver, Sender, TryRecvError},
    Arc,
};

use pacing_director_core::Event;
use thiserror::Error;

/// Failure to hand an event to the director.
#[derive(Debug, Error, PartialEq)]
pub enum IntakeError {
    /// The director was torn down; the event was dropped.
    #[error("director intake is closed")]
    Closed(Box<Event>),
}

/// Cloneable handle producers use to publish events to the director.
#[derive(Clone, Debug)]
pub struct Publisher {
    sender: Sender<Event>,
    _attachment: Arc<()>,
}

impl Publisher {
    /// Queues an event for the director's next pump.
    ///
    /// Never blocks. Fails with [`IntakeError::Closed`], handing the event
    /// back, once the director has been dropped.
    pub fn publish(&self, event: Event) -> Result<(), IntakeError> {
        self.sender
            .send(event)
            .map_err(|error| IntakeError::Closed(Box::new(error.0)))
    }
}

/// Receiving end of the intake channel, owned by the director.
#[derive(Debug)]
pub(crate) struct Intake {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
    attachment: Arc<()>,
}

impl Intake {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            attachment: Arc::new(()),
        }
    }

    pub(crate) fn publisher(&self) -> Publisher {
        Publisher {
            sender: self.sender.clone(),
            _attachment: Arc::clone(&self.attachment),
        }
    }

    /// Number of publisher handles still alive.
    pub(crate) fn attached(&self) -> usize {
        Arc::strong_count(&self.attachment) - 1
    }

    /// Moves up to `limit` queued events into `out`, preserving arrival order.
    pub(crate) fn drain_into(&self, limit: usize, out: &mut Vec<Event>) -> usize {
        let mut drained = 0;
        while drained < limit {
            match self.receiver.try_recv() {
                Ok(event) => out.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
            drained += 1;
        }
        drained
    }
}
