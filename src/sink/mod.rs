pub mod asound;
pub mod probe;
pub mod resolve;

use alsa::pcm::Format;
use std::collections::BTreeSet;
use std::fmt;

/// Sample formats the sink pipeline considers, best precision first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    S32,
    S24_3,
    S16,
}

impl SinkFormat {
    /// Preference order used wherever a single format has to be picked.
    pub const RANKED: [SinkFormat; 3] = [SinkFormat::S32, SinkFormat::S24_3, SinkFormat::S16];

    pub fn alsa(self) -> Format {
        match self {
            SinkFormat::S32 => Format::s32(),
            SinkFormat::S24_3 => Format::S243LE,
            SinkFormat::S16 => Format::s16(),
        }
    }

    /// Name as it appears in asound.conf and on aplay/speaker-test command
    /// lines.
    pub fn alsa_name(self) -> &'static str {
        match self {
            SinkFormat::S32 => "S32_LE",
            SinkFormat::S24_3 => "S24_3LE",
            SinkFormat::S16 => "S16_LE",
        }
    }
}

impl fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alsa_name())
    }
}

/// A physical playback device and its discovered capabilities. Read-only;
/// refreshed by re-probing.
#[derive(Debug, Clone)]
pub struct PlaybackEndpoint {
    pub card_index: i32,
    /// Short ALSA card id, e.g. "CODEC". Stable across reboots for USB DACs,
    /// unlike the card index.
    pub id: String,
    pub name: String,
    pub device: u32,
    pub rates: BTreeSet<u32>,
    /// Ranked subset of [`SinkFormat::RANKED`] this endpoint accepted.
    pub formats: Vec<SinkFormat>,
    pub channels: u32,
}

impl PlaybackEndpoint {
    pub fn pcm_name(&self) -> String {
        format!("hw:CARD={},DEV={}", self.id, self.device)
    }

    /// Channels this endpoint contributes to the combined sink. The combiner
    /// drives each DAC as a stereo slave, so anything wider is capped.
    pub fn route_channels(&self) -> u32 {
        self.channels.clamp(1, 2)
    }

    /// One-line capability summary for logs and error messages.
    pub fn caps_summary(&self) -> String {
        let rates: Vec<String> = self.rates.iter().map(|r| r.to_string()).collect();
        let formats: Vec<&str> = self.formats.iter().map(|f| f.alsa_name()).collect();
        format!(
            "rates [{}], formats [{}], max {} ch",
            rates.join(", "),
            formats.join(", "),
            self.channels
        )
    }
}

/// The common operating point of two endpoints: one rate and one format that
/// both accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityIntersection {
    pub rate: u32,
    pub format: SinkFormat,
}
