//! Channel state orchestration
//!
//! [`ChannelState`] composes the state machine, squelch controller,
//! identifier collection and channel metadata for one decode channel, and
//! routes every event between them and the outside world:
//!
//! - decoder state events request call states, end calls, retune the fade
//!   timeout or lock the squelch gate
//! - source events re-broadcast frequency changes to downstream decoders and
//!   forward sync-locked frequency error measurements
//! - every committed state transition updates a state identifier, feeds the
//!   squelch controller, and may cascade further transitions (fade to reset,
//!   reset to idle, teardown to disable request)
//!
//! # Feedback-free identifier propagation
//!
//! The identifier collection is the source of truth; the channel metadata is
//! the unconditional terminus that sees every notification. The external
//! identifier-update subscriber hears only notifications this channel itself
//! originated, and never silent adds — a silent add accompanies an event the
//! subscriber already receives (the re-broadcast frequency change), so
//! forwarding it too would say everything twice. Notifications received from
//! other channels are applied and never re-broadcast. Together these rules
//! make notification storms between cooperating channels impossible.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use chan_identifier::{
    Identifier, IdentifierClass, IdentifierCollection, IdentifierForm,
    IdentifierUpdateNotification, IdentifierValue,
};

use crate::config::{ChannelConfig, RESET_TIMEOUT_DELAY};
use crate::events::{
    ChannelEvent, ChannelEventKind, DecodeEvent, DecoderStateEvent, DecoderStateEventKind,
    OriginId, SourceEvent,
};
use crate::machine::StateMachine;
use crate::metadata::ChannelMetadata;
use crate::squelch::{SquelchController, SquelchStateEvent};
use crate::state::State;

/// Create the state identifier recorded on every transition
pub fn state_identifier(state: State) -> Identifier {
    Identifier::new(
        IdentifierClass::State,
        IdentifierForm::ChannelState,
        IdentifierValue::Text(state.name().to_string()),
    )
}

/// Single-slot forwarder to the external identifier-update subscriber
///
/// Silent notifications are dropped here: the subscriber learns of those
/// changes through the event that accompanies them.
#[derive(Debug, Default)]
pub struct NotificationProxy {
    listener: Option<UnboundedSender<IdentifierUpdateNotification>>,
}

impl NotificationProxy {
    /// Register the subscriber, replacing any previous one
    pub fn set_listener(&mut self, listener: UnboundedSender<IdentifierUpdateNotification>) {
        self.listener = Some(listener);
    }

    /// Remove the subscriber
    pub fn remove_listener(&mut self) {
        self.listener = None;
    }

    /// Forward a notification unless it is silent
    pub fn receive(&self, notification: &IdentifierUpdateNotification) {
        if notification.is_silent() {
            return;
        }
        if let Some(listener) = &self.listener {
            let _ = listener.send(notification.clone());
        }
    }
}

/// Lifecycle and event routing for one decode channel
pub struct ChannelState {
    config: ChannelConfig,
    origin: OriginId,
    machine: StateMachine,
    squelch: SquelchController,
    identifiers: IdentifierCollection,
    proxy: NotificationProxy,
    metadata: ChannelMetadata,
    decode_event_listener: Option<UnboundedSender<DecodeEvent>>,
    channel_event_listener: Option<UnboundedSender<ChannelEvent>>,
    decoder_state_listener: Option<UnboundedSender<DecoderStateEvent>>,
    source_event_listener: Option<UnboundedSender<SourceEvent>>,
    source_overflow: bool,
    disposed: bool,
}

impl ChannelState {
    /// Create a channel state from its static configuration
    ///
    /// Configuration identifiers are established here and persist until the
    /// channel is destroyed; a reset never touches them.
    pub fn new(config: ChannelConfig) -> Self {
        let timeslot_count = config.decoder_type.timeslots();
        let mut machine = StateMachine::new(timeslot_count);
        machine.set_channel_type(config.channel_type);
        machine.set_end_timeout_buffer(RESET_TIMEOUT_DELAY);

        let mut channel_state = Self {
            origin: OriginId::new(),
            machine,
            squelch: SquelchController::new(timeslot_count),
            identifiers: IdentifierCollection::new(0),
            proxy: NotificationProxy::default(),
            metadata: ChannelMetadata::new(timeslot_count),
            decode_event_listener: None,
            channel_event_listener: None,
            decoder_state_listener: None,
            source_event_listener: None,
            source_overflow: false,
            disposed: false,
            config,
        };
        channel_state.create_configuration_identifiers();
        channel_state
    }

    /// Record an identifier at the base timeslot and route its notification
    /// to the metadata terminus and the external proxy
    fn apply_update(&mut self, identifier: Identifier) {
        let notification = self.identifiers.update(identifier);
        self.metadata.receive(&notification);
        self.proxy.receive(&notification);
    }

    fn create_configuration_identifiers(&mut self) {
        let config = self.config.clone();

        self.apply_update(Identifier::decoder_type(config.decoder_type.name()));
        if let Some(system) = &config.system {
            self.apply_update(Identifier::system(system.as_str()));
        }
        if let Some(site) = &config.site {
            self.apply_update(Identifier::site(site.as_str()));
        }
        if !config.name.is_empty() {
            self.apply_update(Identifier::channel_name(config.name.as_str()));
        }
        if let Some(alias_list) = &config.alias_list {
            self.apply_update(Identifier::alias_list(alias_list.as_str()));
        }
        if let Some(frequency) = config.source.preferred_frequency() {
            self.apply_update(Identifier::frequency(frequency));
        }
    }

    /// Identity token carried by events this channel broadcasts
    pub fn origin(&self) -> OriginId {
        self.origin
    }

    /// Static configuration of this channel
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Current state of a timeslot
    pub fn state(&self, timeslot: usize) -> Option<State> {
        self.machine.state(timeslot)
    }

    /// Number of timeslots this channel carries
    pub fn timeslot_count(&self) -> usize {
        self.machine.timeslot_count()
    }

    /// Latest-value metadata snapshot
    pub fn channel_metadata(&self) -> &ChannelMetadata {
        &self.metadata
    }

    /// Current identifier collection
    pub fn identifiers(&self) -> &IdentifierCollection {
        &self.identifiers
    }

    /// Set the inactivity delay before a call state fades
    pub fn set_fade_timeout_buffer(&mut self, buffer: Duration) {
        self.machine.set_fade_timeout_buffer(buffer);
    }

    /// Current fade timeout buffer
    pub fn fade_timeout_buffer(&self) -> Duration {
        self.machine.fade_timeout_buffer()
    }

    /// Set the delay between entering fade and resetting
    pub fn set_end_timeout_buffer(&mut self, buffer: Duration) {
        self.machine.set_end_timeout_buffer(buffer);
    }

    /// Check whether the source overflow fault flag is set
    pub fn is_source_overflow(&self) -> bool {
        self.source_overflow
    }

    /// Set or clear the source overflow fault flag
    pub fn set_source_overflow(&mut self, overflow: bool) {
        if overflow && !self.source_overflow {
            warn!("channel {}: source buffer overflow", self.config.name);
        }
        self.source_overflow = overflow;
    }

    // -------------------------------------------------------------------------
    // Listener registration (single subscriber per surface, replace-on-set)
    // -------------------------------------------------------------------------

    /// Register the identifier update subscriber
    pub fn set_identifier_update_listener(
        &mut self,
        listener: UnboundedSender<IdentifierUpdateNotification>,
    ) {
        self.proxy.set_listener(listener);
    }

    /// Remove the identifier update subscriber
    pub fn remove_identifier_update_listener(&mut self) {
        self.proxy.remove_listener();
    }

    /// Register the squelch state subscriber
    pub fn set_squelch_state_listener(&mut self, listener: UnboundedSender<SquelchStateEvent>) {
        self.squelch.set_squelch_state_listener(listener);
    }

    /// Remove the squelch state subscriber
    pub fn remove_squelch_state_listener(&mut self) {
        self.squelch.remove_squelch_state_listener();
    }

    /// Register the decode event subscriber
    pub fn set_decode_event_listener(&mut self, listener: UnboundedSender<DecodeEvent>) {
        self.decode_event_listener = Some(listener);
    }

    /// Remove the decode event subscriber
    pub fn remove_decode_event_listener(&mut self) {
        self.decode_event_listener = None;
    }

    /// Register the channel event subscriber
    pub fn set_channel_event_listener(&mut self, listener: UnboundedSender<ChannelEvent>) {
        self.channel_event_listener = Some(listener);
    }

    /// Remove the channel event subscriber
    pub fn remove_channel_event_listener(&mut self) {
        self.channel_event_listener = None;
    }

    /// Register the decoder state event subscriber
    pub fn set_decoder_state_listener(&mut self, listener: UnboundedSender<DecoderStateEvent>) {
        self.decoder_state_listener = Some(listener);
    }

    /// Remove the decoder state event subscriber
    pub fn remove_decoder_state_listener(&mut self) {
        self.decoder_state_listener = None;
    }

    /// Register the source event subscriber
    pub fn set_source_event_listener(&mut self, listener: UnboundedSender<SourceEvent>) {
        self.source_event_listener = Some(listener);
    }

    /// Remove the source event subscriber
    pub fn remove_source_event_listener(&mut self) {
        self.source_event_listener = None;
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Start channel processing
    ///
    /// Replays the full identifier collection so freshly attached consumers
    /// see complete state rather than deltas. Traffic channels are allocated
    /// for a call already in progress, so they go active immediately.
    pub fn start(&mut self) {
        for notification in self.identifiers.broadcast_identifiers() {
            self.metadata.receive(&notification);
            self.proxy.receive(&notification);
        }

        if self.config.is_traffic_channel() {
            for timeslot in 0..self.machine.timeslot_count() {
                self.machine.set_state(State::Active, timeslot);
            }
        }
        self.process_transitions();
    }

    /// Stop channel processing, releasing the squelch override
    pub fn stop(&mut self) {
        self.squelch.set_squelch_lock(false);
    }

    /// Reset the channel and prepare it for reuse
    pub fn reset(&mut self) {
        for timeslot in 0..self.machine.timeslot_count() {
            self.machine.set_state(State::Reset, timeslot);
        }
        self.clear_runtime_state(0);
        self.process_transitions();
    }

    /// Detach the decode and decoder state subscribers
    ///
    /// Event entry points become no-ops afterwards; disposal order between
    /// the host and its producers does not matter.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.decode_event_listener = None;
        self.decoder_state_listener = None;
    }

    /// Evaluate the fade and end timers
    ///
    /// Meant to be invoked on a steady external cadence; a call with no
    /// expired timer does nothing.
    pub fn check_state(&mut self) {
        if self.disposed {
            return;
        }
        self.machine.check_state();
        self.process_transitions();
    }

    // -------------------------------------------------------------------------
    // Event entry points
    // -------------------------------------------------------------------------

    /// Receive a decoder state event from a decoder or another channel
    pub fn receive_decoder_state_event(&mut self, event: DecoderStateEvent) {
        if self.disposed {
            return;
        }
        if event.origin == self.origin {
            return;
        }

        match event.kind {
            DecoderStateEventKind::Start
            | DecoderStateEventKind::Continuation
            | DecoderStateEventKind::Decode => {
                // External events may only request decode states
                if event.state.is_call_state() {
                    self.machine.set_state(event.state, event.timeslot);
                }
            }
            DecoderStateEventKind::ChangeCallTimeout(timeout) => {
                // Retunes the fade timer only; never requests a transition
                self.machine.set_fade_timeout_buffer(timeout);
            }
            DecoderStateEventKind::End => {
                if self.config.is_traffic_channel() {
                    self.machine.set_state(State::Teardown, event.timeslot);
                } else {
                    self.machine.set_state(State::Fade, event.timeslot);
                }
            }
            DecoderStateEventKind::Reset => {
                // The channel only resets through its own reset transition
            }
            DecoderStateEventKind::AlwaysUnsquelch => {
                self.squelch.set_squelch_lock(true);
            }
            DecoderStateEventKind::SourceFrequency(_) => {
                debug!("ignoring decoder state event kind {:?}", event.kind);
            }
        }

        self.process_transitions();
    }

    /// Receive an event from the tuning source
    pub fn receive_source_event(&mut self, event: SourceEvent) {
        if self.disposed {
            return;
        }

        match event {
            SourceEvent::FrequencyChange { hz } => {
                // Re-broadcast for downstream decoders; the accompanying
                // identifier update is silent so external consumers hear
                // about the retune exactly once
                let current = self.machine.state(0).unwrap_or(State::Idle);
                self.broadcast_decoder_state(
                    DecoderStateEventKind::SourceFrequency(hz),
                    current,
                    0,
                );

                let notification =
                    IdentifierUpdateNotification::silent_add(Identifier::frequency(hz), 0);
                self.identifiers.receive(&notification);
                self.metadata.receive(&notification);
                self.proxy.receive(&notification);
            }
            SourceEvent::MeasuredFrequencyError { hz } => {
                // Error measurements are meaningless without sync lock
                let active = (0..self.machine.timeslot_count())
                    .any(|timeslot| self.machine.state(timeslot).is_some_and(|s| s.is_active()));
                if active {
                    self.broadcast_source_event(SourceEvent::FrequencyErrorSyncLocked { hz });
                }
            }
            SourceEvent::FrequencyErrorSyncLocked { .. } => {}
        }
    }

    /// Apply an identifier update originating outside this channel
    ///
    /// The update lands in the collection and the metadata; it is never
    /// re-broadcast.
    pub fn receive_identifier_update(&mut self, notification: IdentifierUpdateNotification) {
        if self.disposed {
            return;
        }
        self.identifiers.receive(&notification);
        self.metadata.receive(&notification);
    }

    /// Route a decoder's decode event to the decode event subscriber
    pub fn broadcast_decode_event(&self, event: DecodeEvent) {
        if let Some(listener) = &self.decode_event_listener {
            let _ = listener.send(event);
        }
    }

    // -------------------------------------------------------------------------
    // Transition processing
    // -------------------------------------------------------------------------

    /// Drain committed transitions and apply side effects to a fixed point
    ///
    /// Side effects may request further transitions (reset forces idle,
    /// teardown forces reset on standard channels); the loop runs until the
    /// machine commits nothing new. Termination is guaranteed by the
    /// transition table: reset chains are one-way.
    fn process_transitions(&mut self) {
        loop {
            let transitions = self.machine.take_transitions();
            if transitions.is_empty() {
                break;
            }
            for transition in transitions {
                self.state_changed(transition.state, transition.timeslot);
                self.squelch.state_changed(transition.state, transition.timeslot);
            }
        }
    }

    fn state_changed(&mut self, state: State, timeslot: usize) {
        // Every transition is recorded as a state identifier; the metadata
        // terminus sees it regardless of external listener wiring
        let notification = self
            .identifiers
            .update_for_timeslot(state_identifier(state), timeslot);
        self.metadata.receive(&notification);
        self.proxy.receive(&notification);

        match state {
            State::Idle => {
                self.broadcast_decoder_state(DecoderStateEventKind::Reset, State::Idle, timeslot);
            }
            State::Reset => {
                self.clear_runtime_state(timeslot);
                self.machine.set_state(State::Idle, timeslot);
            }
            State::Teardown => {
                if self.config.is_traffic_channel() {
                    info!(
                        "traffic channel {} torn down, requesting disable",
                        self.config.name
                    );
                    self.broadcast_channel_event(ChannelEventKind::RequestDisable);
                } else {
                    self.machine.set_state(State::Reset, timeslot);
                }
            }
            _ => {}
        }
    }

    fn clear_runtime_state(&mut self, timeslot: usize) {
        self.broadcast_decoder_state(DecoderStateEventKind::Reset, State::Idle, timeslot);
        self.identifiers.remove(IdentifierClass::User);
        self.set_source_overflow(false);
    }

    fn broadcast_decoder_state(&self, kind: DecoderStateEventKind, state: State, timeslot: usize) {
        if let Some(listener) = &self.decoder_state_listener {
            let _ = listener.send(DecoderStateEvent::new(self.origin, kind, state, timeslot));
        }
    }

    fn broadcast_channel_event(&self, kind: ChannelEventKind) {
        if let Some(listener) = &self.channel_event_listener {
            let _ = listener.send(ChannelEvent {
                channel: self.config.name.clone(),
                kind,
            });
        }
    }

    fn broadcast_source_event(&self, event: SourceEvent) {
        if let Some(listener) = &self.source_event_listener {
            let _ = listener.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelType, DecoderType, SourceConfig};

    fn config() -> ChannelConfig {
        ChannelConfig {
            name: "Dispatch North".into(),
            system: Some("Metro".into()),
            site: Some("North Simulcast".into()),
            alias_list: Some("Metro Aliases".into()),
            decoder_type: DecoderType::Nbfm,
            channel_type: ChannelType::Standard,
            source: SourceConfig::Tuner {
                frequency: 154_250_000,
            },
        }
    }

    #[test]
    fn test_configuration_identifiers_created() {
        let channel_state = ChannelState::new(config());
        let identifiers = channel_state.identifiers();

        assert_eq!(identifiers.len(), 6);
        assert_eq!(
            channel_state.channel_metadata().channel_name(),
            Some("Dispatch North")
        );
        assert_eq!(
            channel_state.channel_metadata().frequency(),
            Some(154_250_000)
        );
    }

    #[test]
    fn test_empty_source_yields_no_frequency() {
        let mut cfg = config();
        cfg.source = SourceConfig::TunerMultipleFrequencies {
            frequencies: Vec::new(),
        };
        let channel_state = ChannelState::new(cfg);

        assert_eq!(channel_state.channel_metadata().frequency(), None);
        assert_eq!(channel_state.identifiers().len(), 5);
    }

    #[test]
    fn test_transition_updates_state_identifier() {
        let mut channel_state = ChannelState::new(config());
        let decoder = OriginId::new();

        channel_state.receive_decoder_state_event(DecoderStateEvent::new(
            decoder,
            DecoderStateEventKind::Start,
            State::Call,
            0,
        ));

        assert_eq!(channel_state.state(0), Some(State::Call));
        assert_eq!(channel_state.channel_metadata().channel_state(0), Some("CALL"));
    }

    #[test]
    fn test_proxy_drops_silent_notifications() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut proxy = NotificationProxy::default();
        proxy.set_listener(tx);

        proxy.receive(&IdentifierUpdateNotification::silent_add(
            Identifier::frequency(1),
            0,
        ));
        assert!(rx.try_recv().is_err());

        proxy.receive(&IdentifierUpdateNotification::add(
            Identifier::frequency(2),
            0,
        ));
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_dispose_makes_entry_points_noops() {
        let mut channel_state = ChannelState::new(config());
        channel_state.dispose();

        let decoder = OriginId::new();
        channel_state.receive_decoder_state_event(DecoderStateEvent::new(
            decoder,
            DecoderStateEventKind::Start,
            State::Call,
            0,
        ));

        assert_eq!(channel_state.state(0), Some(State::Idle));
    }
}
