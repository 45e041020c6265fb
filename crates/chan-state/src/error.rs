//! Error types for channel state processing

use thiserror::Error;

/// Errors surfaced at the channel actor boundary
///
/// The synchronous core never fails: broadcasts without a subscriber are
/// no-ops and unknown events are ignored. Errors only exist where a caller
/// talks to the channel across a task boundary.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The actor task has stopped and can no longer accept commands
    #[error("channel state actor has stopped")]
    ActorStopped,

    /// A query referenced a timeslot the channel does not have
    #[error("invalid timeslot {timeslot}: channel has {count} timeslots")]
    InvalidTimeslot {
        /// Requested timeslot
        timeslot: usize,
        /// Number of timeslots the channel has
        count: usize,
    },
}
