//! Channel metadata snapshot
//!
//! The metadata is the terminus of identifier update notifications: it
//! receives every notification unconditionally — including silent adds that
//! never reach the external subscriber — and emits nothing back. Consumers
//! (displays, audio tagging) read the latest value per identifier from here
//! rather than replaying notification streams themselves.

use chan_identifier::{
    IdentifierClass, IdentifierCollection, IdentifierForm, IdentifierUpdateNotification,
    IdentifierValue,
};

/// Latest-value snapshot of a channel's identifiers
#[derive(Debug, Clone)]
pub struct ChannelMetadata {
    identifiers: IdentifierCollection,
    timeslot_count: usize,
}

impl ChannelMetadata {
    /// Create an empty snapshot for a channel with the given timeslot count
    pub fn new(timeslot_count: usize) -> Self {
        Self {
            identifiers: IdentifierCollection::new(0),
            timeslot_count: timeslot_count.max(1),
        }
    }

    /// Apply an identifier update notification
    pub fn receive(&mut self, notification: &IdentifierUpdateNotification) {
        self.identifiers.receive(notification);
    }

    /// Number of timeslots the channel carries
    pub fn timeslot_count(&self) -> usize {
        self.timeslot_count
    }

    /// Configured channel name
    pub fn channel_name(&self) -> Option<&str> {
        self.text(IdentifierClass::Configuration, IdentifierForm::ChannelName)
    }

    /// Radio system name
    pub fn system(&self) -> Option<&str> {
        self.text(IdentifierClass::Configuration, IdentifierForm::System)
    }

    /// Site name
    pub fn site(&self) -> Option<&str> {
        self.text(IdentifierClass::Configuration, IdentifierForm::Site)
    }

    /// Configured decoder type
    pub fn decoder_type(&self) -> Option<&str> {
        self.text(IdentifierClass::Configuration, IdentifierForm::DecoderType)
    }

    /// Current channel frequency in Hz
    pub fn frequency(&self) -> Option<u64> {
        self.number(
            IdentifierClass::Configuration,
            IdentifierForm::ChannelFrequency,
        )
    }

    /// Format the channel frequency for display
    pub fn frequency_display(&self) -> String {
        match self.frequency() {
            Some(hz) => {
                let mhz = hz as f64 / 1_000_000.0;
                format!("{:.4} MHz", mhz)
            }
            None => "---".to_string(),
        }
    }

    /// Decode state of a timeslot, as display text
    pub fn channel_state(&self, timeslot: usize) -> Option<&str> {
        match self
            .identifiers
            .get_for_timeslot(IdentifierClass::State, IdentifierForm::ChannelState, timeslot)
            .map(|identifier| identifier.value())
        {
            Some(IdentifierValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Talkgroup active on the channel
    pub fn talkgroup(&self) -> Option<u64> {
        self.number(IdentifierClass::User, IdentifierForm::Talkgroup)
    }

    /// Individual radio unit active on the channel
    pub fn radio_id(&self) -> Option<u64> {
        self.number(IdentifierClass::User, IdentifierForm::RadioId)
    }

    fn text(&self, class: IdentifierClass, form: IdentifierForm) -> Option<&str> {
        match self.identifiers.get(class, form).map(|id| id.value()) {
            Some(IdentifierValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    fn number(&self, class: IdentifierClass, form: IdentifierForm) -> Option<u64> {
        match self.identifiers.get(class, form).map(|id| id.value()) {
            Some(IdentifierValue::Number(number)) => Some(*number),
            _ => None,
        }
    }
}
