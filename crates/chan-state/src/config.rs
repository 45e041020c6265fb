//! Channel configuration types
//!
//! Static configuration for a decode channel: how it was allocated, which
//! decoder protocol it runs, its naming within a radio system, and the tuning
//! source it draws samples from. Configuration is read once when the channel
//! state is created and turned into configuration identifiers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Inactivity delay before a standard channel fades after decode activity
pub const FADE_TIMEOUT_DELAY: Duration = Duration::from_millis(1200);

/// Delay between entering fade and resetting, for all channel types
pub const RESET_TIMEOUT_DELAY: Duration = Duration::from_millis(2000);

/// Protocol default call timeout, used as the fade delay for traffic channels
///
/// Traffic channels carry a single call, so inactivity is judged against the
/// protocol call duration policy rather than the short display-oriented
/// standard delay.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(45);

/// How a channel was allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelType {
    /// Persistently configured channel
    #[default]
    Standard,
    /// Dynamically allocated for a single call and torn down afterwards
    Traffic,
}

impl ChannelType {
    /// Returns a human-readable name for the channel type
    pub fn name(&self) -> &'static str {
        match self {
            ChannelType::Standard => "Standard",
            ChannelType::Traffic => "Traffic",
        }
    }
}

/// Decoder protocol configured for a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoderType {
    /// Narrowband FM analog
    Nbfm,
    /// LTR trunking
    Ltr,
    /// MPT-1327 trunking
    Mpt1327,
    /// APCO-25 Phase 1 (FDMA)
    P25Phase1,
    /// APCO-25 Phase 2 (two-slot TDMA)
    P25Phase2,
    /// DMR (two-slot TDMA)
    Dmr,
}

impl DecoderType {
    /// Returns a human-readable name for the decoder
    pub fn name(&self) -> &'static str {
        match self {
            DecoderType::Nbfm => "NBFM",
            DecoderType::Ltr => "LTR",
            DecoderType::Mpt1327 => "MPT-1327",
            DecoderType::P25Phase1 => "P25 Phase 1",
            DecoderType::P25Phase2 => "P25 Phase 2",
            DecoderType::Dmr => "DMR",
        }
    }

    /// Number of timeslots this protocol divides a channel into
    pub fn timeslots(&self) -> usize {
        match self {
            DecoderType::P25Phase2 | DecoderType::Dmr => 2,
            _ => 1,
        }
    }
}

/// Tuning source configuration for a channel
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceConfig {
    /// No tuning source assigned
    #[default]
    None,
    /// Single tuner frequency in Hz
    Tuner {
        /// Tuned frequency in Hz
        frequency: u64,
    },
    /// Ordered list of candidate frequencies in Hz
    TunerMultipleFrequencies {
        /// Candidate frequencies, preferred first
        frequencies: Vec<u64>,
    },
}

impl SourceConfig {
    /// First configured frequency, if any
    ///
    /// An empty multi-frequency list is a valid degenerate configuration and
    /// yields no frequency.
    pub fn preferred_frequency(&self) -> Option<u64> {
        match self {
            SourceConfig::None => None,
            SourceConfig::Tuner { frequency } => Some(*frequency),
            SourceConfig::TunerMultipleFrequencies { frequencies } => {
                frequencies.first().copied()
            }
        }
    }
}

/// Static configuration for a decode channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel name
    pub name: String,
    /// Radio system the channel belongs to
    pub system: Option<String>,
    /// Site within the radio system
    pub site: Option<String>,
    /// Alias list assigned to the channel
    pub alias_list: Option<String>,
    /// Decoder protocol
    pub decoder_type: DecoderType,
    /// How the channel was allocated
    pub channel_type: ChannelType,
    /// Tuning source
    pub source: SourceConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            system: None,
            site: None,
            alias_list: None,
            decoder_type: DecoderType::Nbfm,
            channel_type: ChannelType::Standard,
            source: SourceConfig::None,
        }
    }
}

impl ChannelConfig {
    /// Check whether this channel was allocated for a single call
    pub fn is_traffic_channel(&self) -> bool {
        self.channel_type == ChannelType::Traffic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeslot_counts() {
        assert_eq!(DecoderType::Nbfm.timeslots(), 1);
        assert_eq!(DecoderType::P25Phase1.timeslots(), 1);
        assert_eq!(DecoderType::P25Phase2.timeslots(), 2);
        assert_eq!(DecoderType::Dmr.timeslots(), 2);
    }

    #[test]
    fn test_preferred_frequency() {
        assert_eq!(SourceConfig::None.preferred_frequency(), None);
        assert_eq!(
            SourceConfig::Tuner {
                frequency: 154_250_000
            }
            .preferred_frequency(),
            Some(154_250_000)
        );
        assert_eq!(
            SourceConfig::TunerMultipleFrequencies {
                frequencies: vec![851_062_500, 852_300_000]
            }
            .preferred_frequency(),
            Some(851_062_500)
        );
        assert_eq!(
            SourceConfig::TunerMultipleFrequencies {
                frequencies: Vec::new()
            }
            .preferred_frequency(),
            None
        );
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = ChannelConfig {
            name: "Dispatch North".into(),
            system: Some("Metro".into()),
            site: Some("North Simulcast".into()),
            alias_list: Some("Metro Aliases".into()),
            decoder_type: DecoderType::P25Phase2,
            channel_type: ChannelType::Traffic,
            source: SourceConfig::Tuner {
                frequency: 851_062_500,
            },
        };

        let json = serde_json::to_string(&config).unwrap();
        let decoded: ChannelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);
    }
}
