//! Channel state actor
//!
//! Decoder pipelines, tuner callbacks and the inactivity monitor live on
//! different tasks, but the channel core assumes serialized entry. This actor
//! owns a [`ChannelState`] and funnels every entry point through a single
//! command channel, so producers never touch the core concurrently. The
//! actor also drives the `check_state` poll on a steady cadence, replacing
//! the external monitor a host would otherwise need.
//!
//! # Example
//!
//! ```rust,no_run
//! use chan_state::{ChannelConfig, ChannelState};
//! use chan_state::actor::{run_channel_state_actor, ChannelHandle, DEFAULT_POLL_INTERVAL};
//!
//! # async fn demo() {
//! let channel_state = ChannelState::new(ChannelConfig::default());
//! let (handle, command_rx) = ChannelHandle::new(256);
//!
//! tokio::spawn(run_channel_state_actor(
//!     channel_state,
//!     command_rx,
//!     DEFAULT_POLL_INTERVAL,
//! ));
//!
//! handle.start().await.unwrap();
//! # }
//! ```

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::channel::ChannelState;
use crate::error::ChannelError;
use crate::events::{DecoderStateEvent, SourceEvent};
use crate::state::State;

/// Default `check_state` polling cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Commands accepted by the channel state actor
#[derive(Debug)]
pub enum ChannelCommand {
    /// Start channel processing
    Start,
    /// Stop channel processing
    Stop,
    /// Reset the channel for reuse
    Reset,
    /// Deliver a decoder state event
    DecoderStateEvent(DecoderStateEvent),
    /// Deliver a tuning source event
    SourceEvent(SourceEvent),
    /// Query the current state of a timeslot
    QueryState {
        /// Timeslot to query
        timeslot: usize,
        /// Channel to send the state back on
        response: oneshot::Sender<Result<State, ChannelError>>,
    },
    /// Shut down the actor
    Shutdown,
}

/// Run the channel state actor until shutdown
///
/// The caller spawns this future. Listeners should be registered on the
/// [`ChannelState`] before handing it over; the actor disposes the channel
/// when it exits.
pub async fn run_channel_state_actor(
    mut channel_state: ChannelState,
    mut command_rx: mpsc::Receiver<ChannelCommand>,
    poll_interval: Duration,
) {
    let mut poll = interval(poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("channel state actor started");

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                match command {
                    Some(ChannelCommand::Start) => channel_state.start(),
                    Some(ChannelCommand::Stop) => channel_state.stop(),
                    Some(ChannelCommand::Reset) => channel_state.reset(),
                    Some(ChannelCommand::DecoderStateEvent(event)) => {
                        channel_state.receive_decoder_state_event(event);
                    }
                    Some(ChannelCommand::SourceEvent(event)) => {
                        channel_state.receive_source_event(event);
                    }
                    Some(ChannelCommand::QueryState { timeslot, response }) => {
                        let result = channel_state.state(timeslot).ok_or(
                            ChannelError::InvalidTimeslot {
                                timeslot,
                                count: channel_state.timeslot_count(),
                            },
                        );
                        let _ = response.send(result);
                    }
                    Some(ChannelCommand::Shutdown) | None => break,
                }
            }
            _ = poll.tick() => channel_state.check_state(),
        }
    }

    channel_state.dispose();
    info!("channel state actor stopped");
}

/// Cloneable handle for submitting commands to a channel state actor
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    command_tx: mpsc::Sender<ChannelCommand>,
}

impl ChannelHandle {
    /// Create a handle and the command receiver to pass to the actor
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ChannelCommand>) {
        let (command_tx, command_rx) = mpsc::channel(buffer);
        (Self { command_tx }, command_rx)
    }

    /// Start channel processing
    pub async fn start(&self) -> Result<(), ChannelError> {
        self.send(ChannelCommand::Start).await
    }

    /// Stop channel processing
    pub async fn stop(&self) -> Result<(), ChannelError> {
        self.send(ChannelCommand::Stop).await
    }

    /// Reset the channel for reuse
    pub async fn reset(&self) -> Result<(), ChannelError> {
        self.send(ChannelCommand::Reset).await
    }

    /// Deliver a decoder state event
    pub async fn decoder_state_event(&self, event: DecoderStateEvent) -> Result<(), ChannelError> {
        self.send(ChannelCommand::DecoderStateEvent(event)).await
    }

    /// Deliver a tuning source event
    pub async fn source_event(&self, event: SourceEvent) -> Result<(), ChannelError> {
        self.send(ChannelCommand::SourceEvent(event)).await
    }

    /// Query the current state of a timeslot
    pub async fn query_state(&self, timeslot: usize) -> Result<State, ChannelError> {
        let (response, rx) = oneshot::channel();
        self.send(ChannelCommand::QueryState { timeslot, response })
            .await?;
        rx.await.map_err(|_| ChannelError::ActorStopped)?
    }

    /// Shut down the actor
    pub async fn shutdown(&self) -> Result<(), ChannelError> {
        self.send(ChannelCommand::Shutdown).await
    }

    async fn send(&self, command: ChannelCommand) -> Result<(), ChannelError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ChannelError::ActorStopped)
    }
}
