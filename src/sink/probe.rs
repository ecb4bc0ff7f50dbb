use super::{PlaybackEndpoint, SinkFormat};
use crate::error::ProbeError;
use alsa::card;
use alsa::ctl::Ctl;
use alsa::pcm::{Access, HwParams, PCM};
use alsa::{Direction, ValueOr};
use std::collections::BTreeSet;
use tracing::debug;

/// Rates worth testing for membership. Hardware reports rate support as
/// ranges, so exact membership is established by narrowing a fresh parameter
/// space per candidate and reading back.
pub const CANDIDATE_RATES: [u32; 11] = [
    8_000, 11_025, 16_000, 22_050, 32_000, 44_100, 48_000, 88_200, 96_000, 176_400, 192_000,
];

/// A playback card as reported by the control interface, before probing.
#[derive(Debug, Clone)]
pub struct CardSummary {
    pub index: i32,
    pub id: String,
    pub name: String,
}

/// Lists cards that expose playback device 0. A card held open by another
/// process still shows up here; only the parameter query later fails on it.
pub fn playback_cards() -> Vec<CardSummary> {
    let mut out = Vec::new();
    for card in card::Iter::new() {
        let Ok(card) = card else { continue };
        let Ok(ctl) = Ctl::from_card(&card, false) else {
            continue;
        };
        let Ok(info) = ctl.card_info() else { continue };
        let (Ok(id), Ok(name)) = (info.get_id(), info.get_name()) else {
            continue;
        };
        let pcm_name = format!("hw:CARD={id},DEV=0");
        let playback = match PCM::new(&pcm_name, Direction::Playback, false) {
            Ok(_) => true,
            Err(e) => e.errno() == libc::EBUSY,
        };
        if playback {
            out.push(CardSummary {
                index: card.get_index(),
                id: id.to_string(),
                name: name.to_string(),
            });
        } else {
            debug!(card = id, "skipping card without playback device");
        }
    }
    out
}

/// Queries supported rates, formats and the channel maximum of one card.
/// Read-only; the PCM handle is dropped before returning.
pub fn probe(summary: &CardSummary, device: u32) -> Result<PlaybackEndpoint, ProbeError> {
    let device_name = format!("hw:CARD={},DEV={}", summary.id, device);
    let pcm =
        PCM::new(&device_name, Direction::Playback, false).map_err(|e| open_error(&device_name, e))?;

    let mut rates = BTreeSet::new();
    for &rate in &CANDIDATE_RATES {
        if supports_rate(&pcm, rate) {
            rates.insert(rate);
        }
    }

    let mut formats = Vec::new();
    for format in SinkFormat::RANKED {
        if supports_format(&pcm, format) {
            formats.push(format);
        }
    }

    let channels = max_channels(&pcm);

    if rates.is_empty() {
        return Err(ProbeError::Unsupported {
            device: device_name,
            what: "sample rate",
        });
    }
    if formats.is_empty() {
        return Err(ProbeError::Unsupported {
            device: device_name,
            what: "sample format",
        });
    }

    debug!(
        device = %device_name,
        ?rates,
        ?formats,
        channels,
        "probed endpoint"
    );
    Ok(PlaybackEndpoint {
        card_index: summary.index,
        id: summary.id.clone(),
        name: summary.name.clone(),
        device,
        rates,
        formats,
        channels,
    })
}

fn open_error(device: &str, e: alsa::Error) -> ProbeError {
    match e.errno() {
        libc::EBUSY => ProbeError::Busy {
            device: device.to_string(),
        },
        libc::ENOENT | libc::ENODEV | libc::ENXIO => ProbeError::NotFound {
            device: device.to_string(),
        },
        _ => ProbeError::Alsa {
            device: device.to_string(),
            source: e,
        },
    }
}

fn supports_rate(pcm: &PCM, rate: u32) -> bool {
    let Ok(hwp) = HwParams::any(pcm) else {
        return false;
    };
    if hwp.set_access(Access::RWInterleaved).is_err() {
        return false;
    }
    hwp.set_rate(rate, ValueOr::Nearest).is_ok()
        && hwp.get_rate().map(|r| r == rate).unwrap_or(false)
}

fn supports_format(pcm: &PCM, format: SinkFormat) -> bool {
    let Ok(hwp) = HwParams::any(pcm) else {
        return false;
    };
    if hwp.set_access(Access::RWInterleaved).is_err() {
        return false;
    }
    hwp.set_format(format.alsa()).is_ok()
}

fn max_channels(pcm: &PCM) -> u32 {
    let Ok(hwp) = HwParams::any(pcm) else {
        return 2;
    };
    if hwp.set_access(Access::RWInterleaved).is_err() {
        return 2;
    }
    hwp.get_channels_max().unwrap_or(2).max(1)
}
