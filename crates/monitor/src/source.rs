//! Capture sources: live datalink capture and in-memory replay.
//!
//! The monitor only requires ordered per-packet delivery and a terminal
//! signal, so both sources implement the same synchronous pull interface.
//! The live source is expected to run on a dedicated blocking thread.

use std::collections::VecDeque;
use std::net::IpAddr;
use std::time::SystemTime;

use pnet::datalink::{self, Channel, DataLinkReceiver};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::Packet;
use tracing::debug;

use securenet_common::{
    CaptureSource, PacketRecord, SecureNetError, SecureNetResult, TransportProtocol,
};

/// Live capture over a pnet datalink channel. Owns the channel handle; it is
/// released when the source is dropped, on any monitor exit path.
pub struct LiveCapture {
    interface: String,
    rx: Box<dyn DataLinkReceiver>,
}

impl LiveCapture {
    /// Open a channel on the named interface, or on the first up,
    /// non-loopback interface with an address when no name is given.
    pub fn open(interface: Option<&str>) -> SecureNetResult<Self> {
        let interfaces = datalink::interfaces();
        let iface = match interface {
            Some(name) => interfaces
                .into_iter()
                .find(|i| i.name == name)
                .ok_or_else(|| SecureNetError::Capture(format!("no such interface: {name}")))?,
            None => interfaces
                .into_iter()
                .find(|i| i.is_up() && !i.is_loopback() && !i.ips.is_empty())
                .ok_or_else(|| {
                    SecureNetError::Capture("no suitable capture interface found".into())
                })?,
        };

        let rx = match datalink::channel(&iface, datalink::Config::default()) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => {
                return Err(SecureNetError::Capture(
                    "unsupported datalink channel type".into(),
                ))
            }
            Err(e) => {
                return Err(SecureNetError::Capture(format!(
                    "failed to open {}: {e}",
                    iface.name
                )))
            }
        };

        Ok(Self {
            interface: iface.name,
            rx,
        })
    }
}

impl CaptureSource for LiveCapture {
    fn next_packet(&mut self) -> SecureNetResult<Option<PacketRecord>> {
        loop {
            let frame = self
                .rx
                .next()
                .map_err(|e| SecureNetError::Capture(e.to_string()))?;
            if let Some(record) = decode_frame(frame) {
                return Ok(Some(record));
            }
            debug!("skipping undecodable frame");
        }
    }

    fn describe(&self) -> String {
        format!("interface {}", self.interface)
    }
}

/// Decode an Ethernet frame into a transport-layer record. Header fields
/// only; payload bytes are never inspected or retained.
pub fn decode_frame(frame: &[u8]) -> Option<PacketRecord> {
    let eth = EthernetPacket::new(frame)?;
    match eth.get_ethertype() {
        EtherTypes::Ipv4 => {
            let ip = Ipv4Packet::new(eth.payload())?;
            decode_transport(
                ip.get_next_level_protocol(),
                ip.payload(),
                IpAddr::V4(ip.get_source()),
            )
        }
        EtherTypes::Ipv6 => {
            let ip = Ipv6Packet::new(eth.payload())?;
            decode_transport(
                ip.get_next_header(),
                ip.payload(),
                IpAddr::V6(ip.get_source()),
            )
        }
        _ => None,
    }
}

fn decode_transport(
    protocol: IpNextHeaderProtocol,
    payload: &[u8],
    src: IpAddr,
) -> Option<PacketRecord> {
    let timestamp = SystemTime::now();
    let record = match protocol {
        IpNextHeaderProtocols::Tcp => {
            let tcp = TcpPacket::new(payload)?;
            PacketRecord {
                protocol: TransportProtocol::Tcp,
                src: Some(src),
                flags: (tcp.get_flags() & 0xff) as u8,
                timestamp,
            }
        }
        IpNextHeaderProtocols::Udp => PacketRecord {
            protocol: TransportProtocol::Udp,
            src: Some(src),
            flags: 0,
            timestamp,
        },
        IpNextHeaderProtocols::Icmp | IpNextHeaderProtocols::Icmpv6 => PacketRecord {
            protocol: TransportProtocol::Icmp,
            src: Some(src),
            flags: 0,
            timestamp,
        },
        _ => PacketRecord {
            protocol: TransportProtocol::Other,
            src: Some(src),
            flags: 0,
            timestamp,
        },
    };
    Some(record)
}

/// Replays a fixed sequence of records, then signals either a clean end of
/// stream or an injected capture fault. The compatibility harness for the
/// monitor.
pub struct ReplaySource {
    packets: VecDeque<PacketRecord>,
    fault: Option<String>,
}

impl ReplaySource {
    #[must_use]
    pub fn new(packets: Vec<PacketRecord>) -> Self {
        Self {
            packets: packets.into(),
            fault: None,
        }
    }

    /// End the stream with a capture fault instead of a clean stop.
    #[must_use]
    pub fn with_fault(mut self, message: impl Into<String>) -> Self {
        self.fault = Some(message.into());
        self
    }
}

impl CaptureSource for ReplaySource {
    fn next_packet(&mut self) -> SecureNetResult<Option<PacketRecord>> {
        if let Some(packet) = self.packets.pop_front() {
            return Ok(Some(packet));
        }
        match self.fault.take() {
            Some(message) => Err(SecureNetError::Capture(message)),
            None => Ok(None),
        }
    }

    fn describe(&self) -> String {
        format!("replay of {} packet(s)", self.packets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use securenet_common::tcp_flags;
    use std::net::Ipv4Addr;

    /// Ethernet + IPv4 + TCP frame with the given flags, built by hand.
    fn tcp_frame(flags: u8) -> Vec<u8> {
        let mut frame = vec![0u8; 54];
        // Ethernet: dst/src MACs zeroed, ethertype IPv4
        frame[12..14].copy_from_slice(&0x0800u16.to_be_bytes());
        // IPv4 header
        frame[14] = 0x45; // version 4, IHL 5
        frame[16..18].copy_from_slice(&40u16.to_be_bytes()); // total length
        frame[22] = 64; // TTL
        frame[23] = 6; // protocol: TCP
        frame[26..30].copy_from_slice(&Ipv4Addr::new(192, 168, 1, 9).octets());
        frame[30..34].copy_from_slice(&Ipv4Addr::new(10, 0, 0, 1).octets());
        // TCP header
        frame[34..36].copy_from_slice(&12345u16.to_be_bytes());
        frame[36..38].copy_from_slice(&80u16.to_be_bytes());
        frame[46] = 0x50; // data offset 5
        frame[47] = flags;
        frame
    }

    fn icmp_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 42];
        frame[12..14].copy_from_slice(&0x0800u16.to_be_bytes());
        frame[14] = 0x45;
        frame[16..18].copy_from_slice(&28u16.to_be_bytes());
        frame[22] = 64;
        frame[23] = 1; // protocol: ICMP
        frame[26..30].copy_from_slice(&Ipv4Addr::new(192, 168, 1, 7).octets());
        frame[30..34].copy_from_slice(&Ipv4Addr::new(10, 0, 0, 1).octets());
        frame[34] = 8; // echo request
        frame
    }

    #[test]
    fn decodes_tcp_syn_frame() {
        let record = decode_frame(&tcp_frame(tcp_flags::SYN)).unwrap();
        assert_eq!(record.protocol, TransportProtocol::Tcp);
        assert_eq!(record.flags, tcp_flags::SYN);
        assert_eq!(
            record.src,
            Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9)))
        );
    }

    #[test]
    fn decodes_icmp_frame() {
        let record = decode_frame(&icmp_frame()).unwrap();
        assert_eq!(record.protocol, TransportProtocol::Icmp);
        assert_eq!(record.flags, 0);
    }

    #[test]
    fn non_ip_frame_is_skipped() {
        let mut frame = vec![0u8; 60];
        frame[12..14].copy_from_slice(&0x0806u16.to_be_bytes()); // ARP
        assert!(decode_frame(&frame).is_none());
    }

    #[test]
    fn truncated_frame_is_skipped() {
        assert!(decode_frame(&[0u8; 10]).is_none());
    }

    #[test]
    fn replay_delivers_in_order_then_ends() {
        let mut source = ReplaySource::new(vec![
            PacketRecord::tcp(tcp_flags::SYN),
            PacketRecord::icmp(),
        ]);
        assert_eq!(
            source.next_packet().unwrap().unwrap().protocol,
            TransportProtocol::Tcp
        );
        assert_eq!(
            source.next_packet().unwrap().unwrap().protocol,
            TransportProtocol::Icmp
        );
        assert!(source.next_packet().unwrap().is_none());
        // Terminal: stays ended.
        assert!(source.next_packet().unwrap().is_none());
    }

    #[test]
    fn replay_fault_is_raised_once_after_packets() {
        let mut source = ReplaySource::new(vec![PacketRecord::icmp()]).with_fault("boom");
        assert!(source.next_packet().unwrap().is_some());
        assert!(matches!(
            source.next_packet(),
            Err(SecureNetError::Capture(_))
        ));
    }
}
