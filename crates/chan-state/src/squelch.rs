//! Squelch gating derived from channel state
//!
//! The squelch controller consumes state transitions and derives the audio
//! gate position: open while the channel is active, closed otherwise. It
//! never looks at identifiers. An override lock holds the gate open
//! regardless of state, for decoders that cannot detect silence. Subscribers
//! only hear about the gate when its effective position changes.

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::state::State;

/// Audio gate position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquelchState {
    /// Audio is gated off
    Squelch,
    /// Audio is passed through
    Unsquelch,
}

/// Squelch gate change for one timeslot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquelchStateEvent {
    /// New gate position
    pub squelch: SquelchState,
    /// Timeslot the gate belongs to
    pub timeslot: usize,
}

#[derive(Debug)]
struct SquelchSlot {
    state: State,
    squelch: SquelchState,
}

/// Derives squelch lock/unlock from state transitions
#[derive(Debug)]
pub struct SquelchController {
    slots: Vec<SquelchSlot>,
    lock: bool,
    listener: Option<UnboundedSender<SquelchStateEvent>>,
}

impl SquelchController {
    /// Create a controller with every timeslot squelched
    pub fn new(timeslot_count: usize) -> Self {
        Self {
            slots: (0..timeslot_count.max(1))
                .map(|_| SquelchSlot {
                    state: State::Idle,
                    squelch: SquelchState::Squelch,
                })
                .collect(),
            lock: false,
            listener: None,
        }
    }

    /// Register the squelch state subscriber, replacing any previous one
    pub fn set_squelch_state_listener(&mut self, listener: UnboundedSender<SquelchStateEvent>) {
        self.listener = Some(listener);
    }

    /// Remove the squelch state subscriber
    pub fn remove_squelch_state_listener(&mut self) {
        self.listener = None;
    }

    /// Current gate position for a timeslot
    pub fn squelch_state(&self, timeslot: usize) -> Option<SquelchState> {
        self.slots.get(timeslot).map(|slot| slot.squelch)
    }

    /// Check whether the override lock is holding the gate open
    pub fn is_squelch_locked(&self) -> bool {
        self.lock
    }

    /// Consume a state transition and re-derive the gate for that timeslot
    pub fn state_changed(&mut self, state: State, timeslot: usize) {
        if let Some(slot) = self.slots.get_mut(timeslot) {
            slot.state = state;
        }
        self.apply(timeslot);
    }

    /// Set or release the override lock
    ///
    /// Changing the lock re-derives the gate for every timeslot.
    pub fn set_squelch_lock(&mut self, locked: bool) {
        if self.lock == locked {
            return;
        }
        self.lock = locked;
        for timeslot in 0..self.slots.len() {
            self.apply(timeslot);
        }
    }

    fn apply(&mut self, timeslot: usize) {
        let Some(slot) = self.slots.get_mut(timeslot) else {
            return;
        };

        let desired = if self.lock || slot.state.is_active() {
            SquelchState::Unsquelch
        } else {
            SquelchState::Squelch
        };

        if slot.squelch != desired {
            slot.squelch = desired;
            debug!("squelch {:?} on timeslot {}", desired, timeslot);
            if let Some(listener) = &self.listener {
                let _ = listener.send(SquelchStateEvent {
                    squelch: desired,
                    timeslot,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn drain(rx: &mut UnboundedReceiver<SquelchStateEvent>) -> Vec<SquelchStateEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_call_unsquelches_and_fade_squelches() {
        let (tx, mut rx) = unbounded_channel();
        let mut controller = SquelchController::new(1);
        controller.set_squelch_state_listener(tx);

        controller.state_changed(State::Call, 0);
        controller.state_changed(State::Fade, 0);

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                SquelchStateEvent {
                    squelch: SquelchState::Unsquelch,
                    timeslot: 0
                },
                SquelchStateEvent {
                    squelch: SquelchState::Squelch,
                    timeslot: 0
                },
            ]
        );
    }

    #[test]
    fn test_emits_only_on_change() {
        let (tx, mut rx) = unbounded_channel();
        let mut controller = SquelchController::new(1);
        controller.set_squelch_state_listener(tx);

        controller.state_changed(State::Call, 0);
        controller.state_changed(State::Encrypted, 0);
        controller.state_changed(State::Call, 0);

        // Gate stayed open across three active states
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn test_lock_overrides_state() {
        let (tx, mut rx) = unbounded_channel();
        let mut controller = SquelchController::new(1);
        controller.set_squelch_state_listener(tx);

        controller.set_squelch_lock(true);
        assert_eq!(controller.squelch_state(0), Some(SquelchState::Unsquelch));

        // State says squelch, lock says otherwise
        controller.state_changed(State::Fade, 0);
        assert_eq!(controller.squelch_state(0), Some(SquelchState::Unsquelch));

        controller.set_squelch_lock(false);
        assert_eq!(controller.squelch_state(0), Some(SquelchState::Squelch));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_no_listener_is_a_noop() {
        let mut controller = SquelchController::new(1);
        controller.state_changed(State::Call, 0);
        assert_eq!(controller.squelch_state(0), Some(SquelchState::Unsquelch));
    }

    #[test]
    fn test_timeslots_gate_independently() {
        let (tx, mut rx) = unbounded_channel();
        let mut controller = SquelchController::new(2);
        controller.set_squelch_state_listener(tx);

        controller.state_changed(State::Call, 1);

        assert_eq!(controller.squelch_state(0), Some(SquelchState::Squelch));
        assert_eq!(controller.squelch_state(1), Some(SquelchState::Unsquelch));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timeslot, 1);
    }
}
