//! Seams towards the platform: the interconnect and the scheduler.

use crate::message::Envelope;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// The endpoint is not bound yet; the send may succeed later.
    NotReady,
    /// The endpoint rejected the frame.
    Failed,
}

/// One direction of the cross-core interconnect.
pub trait Transport {
    fn send(&mut self, envelope: &Envelope) -> Result<(), SendError>;
}

/// Blocking millisecond sleep, provided by the platform scheduler.
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}
