//! Channel state machine
//!
//! Tracks the decode state of every timeslot of a channel together with the
//! fade and end timers. The machine itself only validates and commits
//! transitions; side effects live with the owner. Committed transitions are
//! recorded into an internal buffer the owner drains after every entry point,
//! re-applying `set_state` as side effects demand until no transitions
//! remain. The transition table bounds that loop: reset chains cannot revisit
//! themselves.
//!
//! Timers are not scheduled; [`StateMachine::check_state`] is a cheap
//! comparison of stored timestamps against the fade and end buffers, meant to
//! be polled on a steady external cadence.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{ChannelType, DEFAULT_CALL_TIMEOUT, FADE_TIMEOUT_DELAY, RESET_TIMEOUT_DELAY};
use crate::state::State;

/// A committed state transition awaiting side-effect processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    /// State entered
    pub state: State,
    /// Timeslot that transitioned
    pub timeslot: usize,
}

#[derive(Debug)]
struct TimeslotState {
    state: State,
    last_activity: Instant,
}

/// Timer-driven state machine for every timeslot of a channel
#[derive(Debug)]
pub struct StateMachine {
    timeslots: Vec<TimeslotState>,
    fade_timeout: Duration,
    end_timeout: Duration,
    transitions: Vec<StateTransition>,
}

impl StateMachine {
    /// Create a state machine with the given number of timeslots, all idle
    pub fn new(timeslot_count: usize) -> Self {
        let now = Instant::now();
        Self {
            timeslots: (0..timeslot_count.max(1))
                .map(|_| TimeslotState {
                    state: State::Idle,
                    last_activity: now,
                })
                .collect(),
            fade_timeout: FADE_TIMEOUT_DELAY,
            end_timeout: RESET_TIMEOUT_DELAY,
            transitions: Vec::new(),
        }
    }

    /// Number of timeslots tracked by this machine
    pub fn timeslot_count(&self) -> usize {
        self.timeslots.len()
    }

    /// Current state of a timeslot
    pub fn state(&self, timeslot: usize) -> Option<State> {
        self.timeslots.get(timeslot).map(|slot| slot.state)
    }

    /// Select the fade timeout default for the channel type
    ///
    /// Standard channels fade on a short display-oriented delay; traffic
    /// channels fade on the protocol default call timeout. An explicit
    /// [`StateMachine::set_fade_timeout_buffer`] call afterwards overrides
    /// the default.
    pub fn set_channel_type(&mut self, channel_type: ChannelType) {
        self.fade_timeout = match channel_type {
            ChannelType::Standard => FADE_TIMEOUT_DELAY,
            ChannelType::Traffic => DEFAULT_CALL_TIMEOUT,
        };
    }

    /// Set the inactivity delay before a call state fades
    pub fn set_fade_timeout_buffer(&mut self, buffer: Duration) {
        self.fade_timeout = buffer;
    }

    /// Current fade timeout buffer
    pub fn fade_timeout_buffer(&self) -> Duration {
        self.fade_timeout
    }

    /// Set the delay between entering fade and resetting
    pub fn set_end_timeout_buffer(&mut self, buffer: Duration) {
        self.end_timeout = buffer;
    }

    /// Current end timeout buffer
    pub fn end_timeout_buffer(&self) -> Duration {
        self.end_timeout
    }

    /// Request a state change for a timeslot
    ///
    /// Transitions the table forbids are rejected silently. Re-requesting
    /// the current state refreshes the inactivity timer while the slot is
    /// active — continuation traffic keeps a call alive this way — but
    /// records no transition.
    pub fn set_state(&mut self, state: State, timeslot: usize) {
        let Some(slot) = self.timeslots.get_mut(timeslot) else {
            debug!("ignoring state request for unknown timeslot {}", timeslot);
            return;
        };

        if slot.state == state {
            if state.is_active() {
                slot.last_activity = Instant::now();
            }
            return;
        }

        if !slot.state.can_transition_to(state) {
            debug!(
                "rejected transition {} -> {} on timeslot {}",
                slot.state, state, timeslot
            );
            return;
        }

        debug!("state {} -> {} on timeslot {}", slot.state, state, timeslot);
        slot.state = state;
        slot.last_activity = Instant::now();
        self.transitions.push(StateTransition { state, timeslot });
    }

    /// Poll for timer expiry
    ///
    /// A call state past the fade buffer fades; a faded slot past the end
    /// buffer resets. At most one transition per timeslot per poll, and idle
    /// or reset slots never move.
    pub fn check_state(&mut self) {
        let now = Instant::now();
        for timeslot in 0..self.timeslots.len() {
            let (state, elapsed) = {
                let slot = &self.timeslots[timeslot];
                (slot.state, now.duration_since(slot.last_activity))
            };

            if state.is_call_state() && elapsed >= self.fade_timeout {
                self.set_state(State::Fade, timeslot);
            } else if state == State::Fade && elapsed >= self.end_timeout {
                self.set_state(State::Reset, timeslot);
            }
        }
    }

    /// Drain transitions committed since the last call
    pub fn take_transitions(&mut self) -> Vec<StateTransition> {
        std::mem::take(&mut self.transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transition_commits() {
        let mut machine = StateMachine::new(1);
        machine.set_state(State::Call, 0);

        assert_eq!(machine.state(0), Some(State::Call));
        assert_eq!(
            machine.take_transitions(),
            vec![StateTransition {
                state: State::Call,
                timeslot: 0
            }]
        );
    }

    #[test]
    fn test_illegal_transition_is_silent() {
        let mut machine = StateMachine::new(1);
        machine.set_state(State::Fade, 0);

        assert_eq!(machine.state(0), Some(State::Idle));
        assert!(machine.take_transitions().is_empty());
    }

    #[test]
    fn test_same_state_records_no_transition() {
        let mut machine = StateMachine::new(1);
        machine.set_state(State::Call, 0);
        machine.take_transitions();

        machine.set_state(State::Call, 0);
        assert!(machine.take_transitions().is_empty());
    }

    #[test]
    fn test_unknown_timeslot_is_ignored() {
        let mut machine = StateMachine::new(1);
        machine.set_state(State::Call, 3);

        assert_eq!(machine.state(0), Some(State::Idle));
        assert!(machine.take_transitions().is_empty());
    }

    #[test]
    fn test_check_state_fades_then_resets() {
        let mut machine = StateMachine::new(1);
        machine.set_fade_timeout_buffer(Duration::ZERO);
        machine.set_end_timeout_buffer(Duration::ZERO);
        machine.set_state(State::Call, 0);
        machine.take_transitions();

        // One transition per poll: fade first, reset on the next poll
        machine.check_state();
        assert_eq!(machine.state(0), Some(State::Fade));

        machine.check_state();
        assert_eq!(machine.state(0), Some(State::Reset));
    }

    #[test]
    fn test_check_state_leaves_idle_alone() {
        let mut machine = StateMachine::new(1);
        machine.set_fade_timeout_buffer(Duration::ZERO);
        machine.set_end_timeout_buffer(Duration::ZERO);

        machine.check_state();
        assert_eq!(machine.state(0), Some(State::Idle));
        assert!(machine.take_transitions().is_empty());
    }

    #[test]
    fn test_channel_type_selects_fade_default() {
        let mut machine = StateMachine::new(1);
        machine.set_channel_type(ChannelType::Traffic);
        assert_eq!(machine.fade_timeout_buffer(), DEFAULT_CALL_TIMEOUT);

        machine.set_channel_type(ChannelType::Standard);
        assert_eq!(machine.fade_timeout_buffer(), FADE_TIMEOUT_DELAY);
    }

    #[test]
    fn test_timeslots_are_independent() {
        let mut machine = StateMachine::new(2);
        machine.set_state(State::Call, 1);

        assert_eq!(machine.state(0), Some(State::Idle));
        assert_eq!(machine.state(1), Some(State::Call));
    }
}
