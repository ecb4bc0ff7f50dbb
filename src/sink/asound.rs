use super::{CapabilityIntersection, PlaybackEndpoint};
use std::fmt::Write;
use std::ops::Range;

/// Fixed assignment of logical channel ranges to the two endpoints. Decided
/// once per synthesis run, never reassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingMap {
    pub first: Range<u32>,
    pub second: Range<u32>,
}

/// The emitted artifact: a raw multi-endpoint combiner plus a plug layer that
/// pins the resolved rate/format on top of it. Rendering is a pure function
/// of this value.
#[derive(Debug, Clone)]
pub struct VirtualSinkDescription {
    pub first: PlaybackEndpoint,
    pub second: PlaybackEndpoint,
    pub pinned: CapabilityIntersection,
    pub map: RoutingMap,
}

/// Builds the layered description. Caller order is significant: `a` owns the
/// low logical channels, `b` the high ones.
pub fn synthesize(
    a: PlaybackEndpoint,
    b: PlaybackEndpoint,
    pinned: CapabilityIntersection,
) -> VirtualSinkDescription {
    let ka = a.route_channels();
    let kb = b.route_channels();
    VirtualSinkDescription {
        map: RoutingMap {
            first: 0..ka,
            second: ka..ka + kb,
        },
        first: a,
        second: b,
        pinned,
    }
}

impl VirtualSinkDescription {
    pub fn total_channels(&self) -> u32 {
        self.map.second.end
    }

    /// Name of the conversion-wrapped device downstream consumers open.
    pub fn plug_name(&self) -> String {
        format!("convert{}", self.total_channels())
    }

    /// Renders the asound.conf text. The inner `pcm.both` multiplexes the two
    /// DACs at their native hardware parameters; the outer plug converts any
    /// requested rate/format exactly once, at the boundary.
    pub fn render(&self) -> String {
        let a = &self.first;
        let b = &self.second;
        let total = self.total_channels();
        let fmt = self.pinned.format;
        let rate = self.pinned.rate;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "# ============================================================"
        );
        let _ = writeln!(
            out,
            "# Generated by uacmix: one virtual {total}ch playback device over two DACs."
        );
        let _ = writeln!(out, "#");
        let _ = writeln!(
            out,
            "# Device A: card {} ({})  -> {}   channels {}-{}",
            a.card_index,
            a.id,
            a.pcm_name(),
            self.map.first.start,
            self.map.first.end - 1
        );
        let _ = writeln!(
            out,
            "# Device B: card {} ({})  -> {}   channels {}-{}",
            b.card_index,
            b.id,
            b.pcm_name(),
            self.map.second.start,
            self.map.second.end - 1
        );
        let _ = writeln!(out, "#");
        let _ = writeln!(
            out,
            "# Pinned common hw params: rate={rate}, format={fmt}, channels={total}"
        );
        let _ = writeln!(out, "# User-facing device: \"{}\"", self.plug_name());
        let _ = writeln!(
            out,
            "# ============================================================"
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "pcm.both {{");
        let _ = writeln!(out, "  type route;");
        let _ = writeln!(out, "  slave.pcm {{");
        let _ = writeln!(out, "    type multi;");
        let _ = writeln!(out);
        let _ = writeln!(out, "    slaves.a.pcm \"{}\";", a.pcm_name());
        let _ = writeln!(out, "    slaves.a.channels {};", self.map.first.len());
        let _ = writeln!(out);
        let _ = writeln!(out, "    slaves.b.pcm \"{}\";", b.pcm_name());
        let _ = writeln!(out, "    slaves.b.channels {};", self.map.second.len());
        let _ = writeln!(out);
        for ch in self.map.first.clone() {
            let _ = writeln!(
                out,
                "    bindings.{ch}.slave a; bindings.{ch}.channel {};",
                ch - self.map.first.start
            );
        }
        for ch in self.map.second.clone() {
            let _ = writeln!(
                out,
                "    bindings.{ch}.slave b; bindings.{ch}.channel {};",
                ch - self.map.second.start
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "    hint {{ description \"Combo HW ({}+{}) raw {total}ch\" }}",
            a.id, b.id
        );
        let _ = writeln!(out, "  }}");
        let _ = writeln!(out);
        for ch in 0..total {
            let _ = writeln!(out, "  ttable.{ch}.{ch} 1;");
        }
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);

        let _ = writeln!(out, "ctl.both {{");
        let _ = writeln!(out, "  type hw;");
        let _ = writeln!(out, "  card {};", a.id);
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);

        let _ = writeln!(out, "pcm.{} {{", self.plug_name());
        let _ = writeln!(out, "  type plug");
        let _ = writeln!(out, "  slave {{");
        let _ = writeln!(out, "    pcm both");
        let _ = writeln!(out, "    format {fmt}");
        let _ = writeln!(out, "    channels {total}");
        let _ = writeln!(out, "    rate {rate}");
        let _ = writeln!(out, "  }}");
        let _ = writeln!(
            out,
            "  hint {{ description \"Combo Converted {total}ch {fmt} {rate}Hz\" }}"
        );
        let _ = writeln!(out, "}}");

        out
    }
}

#[cfg(test)]
mod tests {
    use super::synthesize;
    use crate::sink::{CapabilityIntersection, PlaybackEndpoint, SinkFormat};

    fn endpoint(id: &str, index: i32) -> PlaybackEndpoint {
        PlaybackEndpoint {
            card_index: index,
            id: id.to_string(),
            name: id.to_string(),
            device: 0,
            rates: [48_000].into_iter().collect(),
            formats: vec![SinkFormat::S16],
            channels: 2,
        }
    }

    fn pinned() -> CapabilityIntersection {
        CapabilityIntersection {
            rate: 48_000,
            format: SinkFormat::S16,
        }
    }

    #[test]
    fn caller_order_decides_channel_ranges() {
        let ab = synthesize(endpoint("A", 3), endpoint("B", 4), pinned());
        assert_eq!(ab.map.first, 0..2);
        assert_eq!(ab.map.second, 2..4);
        assert_eq!(ab.first.id, "A");

        let ba = synthesize(endpoint("B", 4), endpoint("A", 3), pinned());
        assert_eq!(ba.first.id, "B");
        assert_eq!(ba.map.first, 0..2);
        assert_eq!(ba.map.second, 2..4);
    }

    #[test]
    fn renders_bindings_and_pinned_params() {
        let desc = synthesize(endpoint("A", 3), endpoint("B", 4), pinned());
        assert_eq!(desc.plug_name(), "convert4");
        let text = desc.render();

        assert!(text.contains("slaves.a.pcm \"hw:CARD=A,DEV=0\";"));
        assert!(text.contains("slaves.b.pcm \"hw:CARD=B,DEV=0\";"));
        assert!(text.contains("bindings.0.slave a; bindings.0.channel 0;"));
        assert!(text.contains("bindings.1.slave a; bindings.1.channel 1;"));
        assert!(text.contains("bindings.2.slave b; bindings.2.channel 0;"));
        assert!(text.contains("bindings.3.slave b; bindings.3.channel 1;"));
        assert!(text.contains("ttable.3.3 1;"));
        assert!(text.contains("pcm.convert4 {"));
        assert!(text.contains("format S16_LE"));
        assert!(text.contains("rate 48000"));
        assert!(text.contains("channels 4"));
        assert!(text.contains("card A;"));
    }

    #[test]
    fn swapped_inputs_swap_only_slave_assignment() {
        let ab = synthesize(endpoint("A", 3), endpoint("B", 4), pinned()).render();
        let ba = synthesize(endpoint("B", 4), endpoint("A", 3), pinned()).render();
        assert!(ab.contains("slaves.a.pcm \"hw:CARD=A,DEV=0\";"));
        assert!(ba.contains("slaves.a.pcm \"hw:CARD=B,DEV=0\";"));
        assert!(ab.contains("pcm.convert4 {"));
        assert!(ba.contains("pcm.convert4 {"));
    }
}
