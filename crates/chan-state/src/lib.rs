//! Decode Channel Lifecycle Engine
//!
//! This crate tracks the lifecycle of a radio decode channel as it moves
//! through idle, active call, fade and teardown, driven by events from a
//! decoder pipeline and a tuning source plus a periodic inactivity poll.
//!
//! # Architecture
//!
//! Three concerns stay consistent through every transition:
//!
//! - the logical [`State`] of each channel timeslot, owned by the
//!   [`StateMachine`] and its fade/end timers
//! - the identifier collection describing what the channel currently is
//!   (configuration, current state, call activity), with feedback-free
//!   update propagation through the [`NotificationProxy`] and the
//!   [`ChannelMetadata`] terminus
//! - squelch gating derived purely from state by the [`SquelchController`]
//!
//! [`ChannelState`] composes the three and routes events between them and
//! six single-subscriber surfaces: identifier updates, squelch state, decode
//! events, channel lifecycle requests, decoder state events and source
//! events.
//!
//! The core is synchronous and assumes one caller at a time; the
//! [`actor`] module provides the serializing task that marshals decoder,
//! tuner and timer activity onto one execution context per channel.
//!
//! # Example
//!
//! ```rust
//! use chan_state::{
//!     ChannelConfig, ChannelState, DecoderStateEvent, DecoderStateEventKind, DecoderType,
//!     OriginId, SourceConfig, State,
//! };
//!
//! let config = ChannelConfig {
//!     name: "Dispatch North".into(),
//!     decoder_type: DecoderType::Nbfm,
//!     source: SourceConfig::Tuner {
//!         frequency: 154_250_000,
//!     },
//!     ..Default::default()
//! };
//!
//! let mut channel = ChannelState::new(config);
//! channel.start();
//!
//! // A decoder reports the start of a voice call
//! let decoder = OriginId::new();
//! channel.receive_decoder_state_event(DecoderStateEvent::new(
//!     decoder,
//!     DecoderStateEventKind::Start,
//!     State::Call,
//!     0,
//! ));
//!
//! assert_eq!(channel.state(0), Some(State::Call));
//! assert_eq!(channel.channel_metadata().channel_state(0), Some("CALL"));
//! ```

pub mod actor;
pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod machine;
pub mod metadata;
pub mod squelch;
pub mod state;

// Re-export actor types
pub use actor::{run_channel_state_actor, ChannelCommand, ChannelHandle, DEFAULT_POLL_INTERVAL};

// Re-export orchestration types
pub use channel::{state_identifier, ChannelState, NotificationProxy};

// Re-export configuration types
pub use config::{
    ChannelConfig, ChannelType, DecoderType, SourceConfig, DEFAULT_CALL_TIMEOUT,
    FADE_TIMEOUT_DELAY, RESET_TIMEOUT_DELAY,
};

// Re-export event types
pub use events::{
    ChannelEvent, ChannelEventKind, DecodeEvent, DecoderStateEvent, DecoderStateEventKind,
    OriginId, SourceEvent,
};

pub use error::ChannelError;
pub use machine::{StateMachine, StateTransition};
pub use metadata::ChannelMetadata;
pub use squelch::{SquelchController, SquelchState, SquelchStateEvent};
pub use state::State;
