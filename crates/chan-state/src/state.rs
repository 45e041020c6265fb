//! Channel decode states
//!
//! A channel moves through a fixed lifecycle: idle, decoding (one of the call
//! states), a fade grace period that keeps call details visible after
//! activity stops, and finally reset back to idle. Traffic channels end in
//! teardown instead, so the host can reclaim them. The transition table here
//! is the single authority on which moves are legal; everything else requests
//! transitions and accepts rejection silently.

use std::fmt;

/// Decode state of a channel timeslot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// No call or data activity
    Idle,
    /// Channel is allocated and hot, awaiting decode activity
    Active,
    /// Voice call in progress
    Call,
    /// Data call in progress
    Data,
    /// Encrypted call in progress
    Encrypted,
    /// Control channel signalling in progress
    Control,
    /// Post-call grace period retaining call details
    Fade,
    /// Terminal phase for a traffic channel pending disable
    Teardown,
    /// Transient state that clears runtime identifiers on the way to idle
    Reset,
}

impl State {
    /// States entered only by explicit decode activity
    pub const CALL_STATES: [State; 4] =
        [State::Call, State::Data, State::Encrypted, State::Control];

    /// Check whether this is a decode (call) state
    pub fn is_call_state(&self) -> bool {
        matches!(
            self,
            State::Call | State::Data | State::Encrypted | State::Control
        )
    }

    /// Check whether the channel has synchronization lock in this state
    ///
    /// Frequency error measurements are only meaningful while active.
    pub fn is_active(&self) -> bool {
        *self == State::Active || self.is_call_state()
    }

    /// Check whether a transition to `next` is legal
    ///
    /// Reset and teardown chains are deliberately one-way: RESET only yields
    /// IDLE and TEARDOWN only yields RESET, which bounds the cascade of
    /// follow-on transitions a single trigger can produce.
    pub fn can_transition_to(&self, next: State) -> bool {
        if *self == next {
            return false;
        }

        match self {
            State::Idle => {
                next == State::Active
                    || next.is_call_state()
                    || next == State::Teardown
                    || next == State::Reset
            }
            State::Active | State::Call | State::Data | State::Encrypted | State::Control => {
                next.is_call_state()
                    || matches!(next, State::Fade | State::Teardown | State::Reset)
            }
            State::Fade => {
                next.is_call_state() || matches!(next, State::Teardown | State::Reset)
            }
            State::Reset => next == State::Idle,
            State::Teardown => next == State::Reset,
        }
    }

    /// Returns a human-readable name for the state
    pub fn name(&self) -> &'static str {
        match self {
            State::Idle => "IDLE",
            State::Active => "ACTIVE",
            State::Call => "CALL",
            State::Data => "DATA",
            State::Encrypted => "ENCRYPTED",
            State::Control => "CONTROL",
            State::Fade => "FADE",
            State::Teardown => "TEARDOWN",
            State::Reset => "RESET",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_state_classification() {
        for state in State::CALL_STATES {
            assert!(state.is_call_state());
            assert!(state.is_active());
        }
        assert!(State::Active.is_active());
        assert!(!State::Active.is_call_state());
        assert!(!State::Fade.is_active());
        assert!(!State::Idle.is_active());
    }

    #[test]
    fn test_reset_chain_is_one_way() {
        assert!(State::Teardown.can_transition_to(State::Reset));
        assert!(!State::Teardown.can_transition_to(State::Idle));
        assert!(State::Reset.can_transition_to(State::Idle));
        assert!(!State::Reset.can_transition_to(State::Call));
        assert!(!State::Idle.can_transition_to(State::Fade));
    }

    #[test]
    fn test_fade_revival() {
        assert!(State::Fade.can_transition_to(State::Call));
        assert!(State::Fade.can_transition_to(State::Reset));
        assert!(!State::Fade.can_transition_to(State::Active));
    }

    #[test]
    fn test_call_states_interchange() {
        assert!(State::Call.can_transition_to(State::Encrypted));
        assert!(State::Data.can_transition_to(State::Control));
        assert!(!State::Call.can_transition_to(State::Call));
    }
}
