//! Transport-layer packet classification.

use securenet_common::{tcp_flags, Classification, PacketRecord, TransportProtocol};

/// Classify one decoded packet. Pure function, no shared state.
///
/// A TCP header with only the SYN flag set is a port-scan candidate. The tag
/// drives diagnostic logging; the volume threshold in the monitor never reads
/// it, though callers may use it for per-class thresholds later.
pub fn classify(packet: &PacketRecord) -> Classification {
    match packet.protocol {
        TransportProtocol::Tcp if packet.flags == tcp_flags::SYN => Classification::SynProbe,
        TransportProtocol::Icmp => Classification::Icmp,
        _ => Classification::Other,
    }
}
