//! Channel event stream types
//!
//! All channel activity flows through a small set of immutable event types:
//! decoder state events exchanged between decoder states and the channel
//! state, source events from the tuning source, channel lifecycle requests to
//! the host, and decode events for call logging. Events that can circulate
//! back to their emitter carry an [`OriginId`] so receivers can drop their
//! own broadcasts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chan_identifier::Identifier;

use crate::state::State;

/// Identity token for an event-emitting component
///
/// Tokens are allocated from a global counter, so equality is identity: a
/// receiver drops any event whose origin matches its own token, which is what
/// prevents a component from re-processing events it broadcast itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginId(u64);

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

impl OriginId {
    /// Allocate a fresh, unique origin token
    pub fn new() -> Self {
        Self(NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw token value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for OriginId {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind of decoder state event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderStateEventKind {
    /// Call or data decode started
    Start,
    /// Decode activity continues
    Continuation,
    /// A message was decoded
    Decode,
    /// Call or data decode ended
    End,
    /// Decoder states should reset
    Reset,
    /// Hold the squelch gate open permanently
    ///
    /// Used for decoders that cannot detect silence.
    AlwaysUnsquelch,
    /// Retune the inactivity fade timeout
    ChangeCallTimeout(Duration),
    /// The tuned source frequency changed (Hz)
    SourceFrequency(u64),
}

/// Event exchanged between decoder states and the channel state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderStateEvent {
    /// Component that emitted this event
    pub origin: OriginId,
    /// What happened
    pub kind: DecoderStateEventKind,
    /// State the emitter is in, or requests entry into
    pub state: State,
    /// Timeslot the event applies to
    pub timeslot: usize,
}

impl DecoderStateEvent {
    /// Create a new decoder state event
    pub fn new(
        origin: OriginId,
        kind: DecoderStateEventKind,
        state: State,
        timeslot: usize,
    ) -> Self {
        Self {
            origin,
            kind,
            state,
            timeslot,
        }
    }

    /// Check if this event reports ongoing decode activity
    pub fn is_activity(&self) -> bool {
        matches!(
            self.kind,
            DecoderStateEventKind::Start
                | DecoderStateEventKind::Continuation
                | DecoderStateEventKind::Decode
        )
    }
}

/// Event from the tuning source feeding the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// The tuned center frequency changed
    FrequencyChange {
        /// New frequency in Hz
        hz: u64,
    },
    /// The source measured a frequency error estimate
    MeasuredFrequencyError {
        /// Measured error in Hz
        hz: i64,
    },
    /// Frequency error measured while the channel had synchronization lock
    ///
    /// The re-broadcast form of a measured error; only errors observed during
    /// an active state are worth feeding back to tuner calibration.
    FrequencyErrorSyncLocked {
        /// Measured error in Hz
        hz: i64,
    },
}

/// Kind of channel lifecycle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEventKind {
    /// The channel should be disabled and reclaimed
    RequestDisable,
}

/// Channel lifecycle request to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    /// Name of the channel the request concerns
    pub channel: String,
    /// The request
    pub kind: ChannelEventKind,
}

/// A decoded call or data event produced by a decoder
///
/// The channel state routes these to its decode event subscriber for call
/// logging; it never produces them itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeEvent {
    /// Short description of the event (e.g. "GROUP CALL")
    pub description: String,
    /// Additional free-form details
    pub details: Option<String>,
    /// Timeslot the event occurred on
    pub timeslot: usize,
    /// Identifiers involved in the event
    pub identifiers: Vec<Identifier>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_tokens_are_unique() {
        let a = OriginId::new();
        let b = OriginId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_activity_classification() {
        let origin = OriginId::new();
        let start =
            DecoderStateEvent::new(origin, DecoderStateEventKind::Start, State::Call, 0);
        assert!(start.is_activity());

        let end = DecoderStateEvent::new(origin, DecoderStateEventKind::End, State::Call, 0);
        assert!(!end.is_activity());

        let timeout = DecoderStateEvent::new(
            origin,
            DecoderStateEventKind::ChangeCallTimeout(Duration::from_secs(60)),
            State::Idle,
            0,
        );
        assert!(!timeout.is_activity());
    }
}
