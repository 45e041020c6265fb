//! Identifier types and update notifications
//!
//! An identifier is a classified, immutable fact about a channel. The channel
//! core treats identifier payloads as opaque values; the constructors here
//! cover the standard catalog, and [`Identifier::new`] is the seam for other
//! crates to define protocol-specific forms.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of an identifier within a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierClass {
    /// Static channel configuration, established at channel creation
    Configuration,
    /// Current decode state of a channel timeslot
    State,
    /// Runtime facts derived from call activity
    User,
}

impl IdentifierClass {
    /// Returns a human-readable name for the classification
    pub fn name(&self) -> &'static str {
        match self {
            IdentifierClass::Configuration => "Configuration",
            IdentifierClass::State => "State",
            IdentifierClass::User => "User",
        }
    }
}

/// The specific fact an identifier describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierForm {
    /// Configured channel name
    ChannelName,
    /// Radio system the channel belongs to
    System,
    /// Site within the radio system
    Site,
    /// Alias list assigned to the channel
    AliasList,
    /// Decoder protocol configured for the channel
    DecoderType,
    /// Tuned channel frequency in Hz
    ChannelFrequency,
    /// Decode state of a channel timeslot
    ChannelState,
    /// Talkgroup active on the channel
    Talkgroup,
    /// Individual radio unit active on the channel
    RadioId,
    /// Call progress tone sequence
    CallProgressTone,
}

impl IdentifierForm {
    /// Returns a human-readable name for the form
    pub fn name(&self) -> &'static str {
        match self {
            IdentifierForm::ChannelName => "Channel Name",
            IdentifierForm::System => "System",
            IdentifierForm::Site => "Site",
            IdentifierForm::AliasList => "Alias List",
            IdentifierForm::DecoderType => "Decoder",
            IdentifierForm::ChannelFrequency => "Frequency",
            IdentifierForm::ChannelState => "Channel State",
            IdentifierForm::Talkgroup => "Talkgroup",
            IdentifierForm::RadioId => "Radio ID",
            IdentifierForm::CallProgressTone => "Call Progress Tone",
        }
    }
}

/// Payload of an identifier
///
/// Opaque to the channel core; consumers interpret the value according to the
/// identifier's form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierValue {
    /// Free-text value
    Text(String),
    /// Numeric value (frequencies, talkgroups, radio ids)
    Number(u64),
    /// Ordered list of text values (tone sequences)
    TextList(Vec<String>),
}

impl fmt::Display for IdentifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierValue::Text(text) => write!(f, "{}", text),
            IdentifierValue::Number(number) => write!(f, "{}", number),
            IdentifierValue::TextList(values) => write!(f, "{}", values.join(",")),
        }
    }
}

/// A classified, immutable fact about a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    class: IdentifierClass,
    form: IdentifierForm,
    value: IdentifierValue,
}

impl Identifier {
    /// Create an identifier from raw parts
    ///
    /// The standard catalog is covered by the factory constructors below;
    /// this is the seam for protocol-specific identifier factories defined
    /// in other crates.
    pub fn new(class: IdentifierClass, form: IdentifierForm, value: IdentifierValue) -> Self {
        Self { class, form, value }
    }

    /// Classification of this identifier
    pub fn class(&self) -> IdentifierClass {
        self.class
    }

    /// Form of this identifier
    pub fn form(&self) -> IdentifierForm {
        self.form
    }

    /// Payload value
    pub fn value(&self) -> &IdentifierValue {
        &self.value
    }

    /// Configured channel name
    pub fn channel_name(name: impl Into<String>) -> Self {
        Self::new(
            IdentifierClass::Configuration,
            IdentifierForm::ChannelName,
            IdentifierValue::Text(name.into()),
        )
    }

    /// Radio system name
    pub fn system(system: impl Into<String>) -> Self {
        Self::new(
            IdentifierClass::Configuration,
            IdentifierForm::System,
            IdentifierValue::Text(system.into()),
        )
    }

    /// Site name
    pub fn site(site: impl Into<String>) -> Self {
        Self::new(
            IdentifierClass::Configuration,
            IdentifierForm::Site,
            IdentifierValue::Text(site.into()),
        )
    }

    /// Alias list name
    pub fn alias_list(name: impl Into<String>) -> Self {
        Self::new(
            IdentifierClass::Configuration,
            IdentifierForm::AliasList,
            IdentifierValue::Text(name.into()),
        )
    }

    /// Configured decoder type
    pub fn decoder_type(name: impl Into<String>) -> Self {
        Self::new(
            IdentifierClass::Configuration,
            IdentifierForm::DecoderType,
            IdentifierValue::Text(name.into()),
        )
    }

    /// Tuned channel frequency in Hz
    pub fn frequency(hz: u64) -> Self {
        Self::new(
            IdentifierClass::Configuration,
            IdentifierForm::ChannelFrequency,
            IdentifierValue::Number(hz),
        )
    }

    /// Talkgroup active on the channel
    pub fn talkgroup(value: u64) -> Self {
        Self::new(
            IdentifierClass::User,
            IdentifierForm::Talkgroup,
            IdentifierValue::Number(value),
        )
    }

    /// Individual radio unit active on the channel
    pub fn radio_id(value: u64) -> Self {
        Self::new(
            IdentifierClass::User,
            IdentifierForm::RadioId,
            IdentifierValue::Number(value),
        )
    }

    /// Call progress tone sequence
    pub fn call_progress_tones(tones: Vec<String>) -> Self {
        Self::new(
            IdentifierClass::User,
            IdentifierForm::CallProgressTone,
            IdentifierValue::TextList(tones),
        )
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.form.name(), self.value)
    }
}

/// How an identifier update should be propagated
///
/// A silent add is applied to identifier collections and the channel metadata
/// but is never forwarded to the external identifier-update subscriber; it is
/// used when the subscriber learns of the change through another event and a
/// second notification would duplicate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierOperation {
    /// Apply and broadcast
    Add,
    /// Apply without external re-broadcast
    SilentAdd,
}

/// Notification of a change to an identifier collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierUpdateNotification {
    /// The identifier that changed
    pub identifier: Identifier,
    /// How the change should be propagated
    pub operation: IdentifierOperation,
    /// Timeslot the change applies to (0 for channel-wide)
    pub timeslot: usize,
}

impl IdentifierUpdateNotification {
    /// Notification that applies and broadcasts
    pub fn add(identifier: Identifier, timeslot: usize) -> Self {
        Self {
            identifier,
            operation: IdentifierOperation::Add,
            timeslot,
        }
    }

    /// Notification that applies without external re-broadcast
    pub fn silent_add(identifier: Identifier, timeslot: usize) -> Self {
        Self {
            identifier,
            operation: IdentifierOperation::SilentAdd,
            timeslot,
        }
    }

    /// Check whether this notification is suppressed from external broadcast
    pub fn is_silent(&self) -> bool {
        self.operation == IdentifierOperation::SilentAdd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_classifications() {
        assert_eq!(
            Identifier::channel_name("Dispatch").class(),
            IdentifierClass::Configuration
        );
        assert_eq!(
            Identifier::frequency(154_250_000).class(),
            IdentifierClass::Configuration
        );
        assert_eq!(Identifier::talkgroup(4571).class(), IdentifierClass::User);
        assert_eq!(Identifier::radio_id(90210).class(), IdentifierClass::User);
        assert_eq!(
            Identifier::call_progress_tones(vec!["350".into(), "440".into()]).class(),
            IdentifierClass::User
        );
    }

    #[test]
    fn test_display() {
        let frequency = Identifier::frequency(453_075_000);
        assert_eq!(frequency.to_string(), "Frequency: 453075000");

        let tones = Identifier::call_progress_tones(vec!["350".into(), "440".into()]);
        assert_eq!(tones.to_string(), "Call Progress Tone: 350,440");
    }

    #[test]
    fn test_notification_silence() {
        let add = IdentifierUpdateNotification::add(Identifier::talkgroup(1), 0);
        assert!(!add.is_silent());

        let silent = IdentifierUpdateNotification::silent_add(Identifier::frequency(1), 0);
        assert!(silent.is_silent());
    }

    #[test]
    fn test_serde_round_trip() {
        let identifier = Identifier::call_progress_tones(vec!["480".into(), "620".into()]);
        let json = serde_json::to_string(&identifier).unwrap();
        let decoded: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, identifier);
    }
}
