use super::{CapabilityIntersection, PlaybackEndpoint, SinkFormat};
use crate::error::ResolveError;
use std::collections::BTreeSet;

/// Computes the common operating point of two endpoints.
///
/// Rate: 48000 when both support it, otherwise the highest common rate.
/// Format: the highest-ranked entry of [`SinkFormat::RANKED`] both support.
/// An empty intersection on either axis fails; nothing is guessed.
pub fn resolve(
    a: &PlaybackEndpoint,
    b: &PlaybackEndpoint,
) -> Result<CapabilityIntersection, ResolveError> {
    let common: BTreeSet<u32> = a.rates.intersection(&b.rates).copied().collect();
    let rate = if common.contains(&48_000) {
        48_000
    } else {
        *common
            .iter()
            .next_back()
            .ok_or_else(|| no_common("sample rate", a, b))?
    };

    let format = SinkFormat::RANKED
        .into_iter()
        .find(|f| a.formats.contains(f) && b.formats.contains(f))
        .ok_or_else(|| no_common("sample format", a, b))?;

    Ok(CapabilityIntersection { rate, format })
}

fn no_common(missing: &'static str, a: &PlaybackEndpoint, b: &PlaybackEndpoint) -> ResolveError {
    ResolveError::NoCommonFormat {
        missing,
        a: a.pcm_name(),
        b: b.pcm_name(),
        a_caps: a.caps_summary(),
        b_caps: b.caps_summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::error::ResolveError;
    use crate::sink::{PlaybackEndpoint, SinkFormat};

    fn endpoint(id: &str, rates: &[u32], formats: &[SinkFormat]) -> PlaybackEndpoint {
        PlaybackEndpoint {
            card_index: 0,
            id: id.to_string(),
            name: id.to_string(),
            device: 0,
            rates: rates.iter().copied().collect(),
            formats: formats.to_vec(),
            channels: 2,
        }
    }

    #[test]
    fn prefers_48000_when_common() {
        let a = endpoint("A", &[44_100, 48_000, 192_000], &[SinkFormat::S16]);
        let b = endpoint("B", &[48_000, 96_000, 192_000], &[SinkFormat::S16]);
        let picked = resolve(&a, &b).unwrap();
        assert_eq!(picked.rate, 48_000);
    }

    #[test]
    fn falls_back_to_highest_common_rate() {
        let a = endpoint("A", &[44_100, 96_000, 192_000], &[SinkFormat::S16]);
        let b = endpoint("B", &[44_100, 96_000], &[SinkFormat::S16]);
        let picked = resolve(&a, &b).unwrap();
        assert_eq!(picked.rate, 96_000);
    }

    #[test]
    fn picks_highest_ranked_common_format() {
        let a = endpoint(
            "A",
            &[48_000],
            &[SinkFormat::S32, SinkFormat::S24_3, SinkFormat::S16],
        );
        let b = endpoint("B", &[48_000], &[SinkFormat::S24_3, SinkFormat::S16]);
        let picked = resolve(&a, &b).unwrap();
        assert_eq!(picked.format, SinkFormat::S24_3);
    }

    #[test]
    fn disjoint_rates_fail() {
        let a = endpoint("A", &[44_100], &[SinkFormat::S16]);
        let b = endpoint("B", &[48_000], &[SinkFormat::S16]);
        let err = resolve(&a, &b).unwrap_err();
        let ResolveError::NoCommonFormat { missing, .. } = err;
        assert_eq!(missing, "sample rate");
    }

    #[test]
    fn disjoint_formats_fail() {
        let a = endpoint("A", &[48_000], &[SinkFormat::S32]);
        let b = endpoint("B", &[48_000], &[SinkFormat::S16]);
        let err = resolve(&a, &b).unwrap_err();
        let ResolveError::NoCommonFormat { missing, .. } = err;
        assert_eq!(missing, "sample format");
    }

    #[test]
    fn mixed_capability_example() {
        let a = endpoint(
            "A",
            &[44_100, 48_000, 96_000],
            &[SinkFormat::S32, SinkFormat::S16],
        );
        let b = endpoint("B", &[48_000, 96_000], &[SinkFormat::S24_3, SinkFormat::S16]);
        let picked = resolve(&a, &b).unwrap();
        assert_eq!(picked.rate, 48_000);
        assert_eq!(picked.format, SinkFormat::S16);
    }
}
