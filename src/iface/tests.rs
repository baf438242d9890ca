use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::*;
use crate::wire::{arp, icmpv4};
use crate::wire::{
    arp_packet, ethernet_frame, icmpv4_packet, ipv4_packet, ArpOperation, ArpRepr,
    EthernetRepr, Icmpv4DstUnreachable as Unreachable, Icmpv4Message, Icmpv4Repr, Ipv4Repr,
    UdpRepr,
};

const LOCAL_MAC: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x01]);
const LOCAL_IP: Ipv4Address = Ipv4Address::new(10, 0, 0, 1);
const PEER_MAC: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x02]);
const PEER_IP: Ipv4Address = Ipv4Address::new(10, 0, 0, 2);

#[derive(Default)]
struct TestDevice {
    sent: Vec<Vec<u8>>,
    queued: VecDeque<Vec<u8>>,
}

impl Device for TestDevice {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn receive(&mut self, frame: &mut [u8]) -> Result<Option<usize>> {
        match self.queued.pop_front() {
            Some(data) => {
                frame[..data.len()].copy_from_slice(&data);
                Ok(Some(data.len()))
            }
            None => Ok(None),
        }
    }
}

fn iface() -> Interface {
    Interface::new(LOCAL_MAC, LOCAL_IP)
}

/// A frame from the peer to us, padded to the medium's minimum.
fn eth_frame(ethertype: EthernetProtocol, payload: &[u8]) -> Vec<u8> {
    let padded = payload.len().max(ethernet::MIN_PAYLOAD);
    let mut bytes = vec![0; ethernet::HEADER_LEN + padded];
    let frame = ethernet_frame::new_unchecked_mut(&mut bytes);
    EthernetRepr {
        src_addr: PEER_MAC,
        dst_addr: LOCAL_MAC,
        ethertype,
    }
    .emit(frame);
    frame.payload_mut_slice()[..payload.len()].copy_from_slice(payload);
    bytes
}

fn arp_reply_frame() -> Vec<u8> {
    let mut payload = [0; arp::PACKET_LEN];
    ArpRepr {
        operation: ArpOperation::Reply,
        source_hardware_addr: PEER_MAC,
        source_protocol_addr: PEER_IP,
        target_hardware_addr: LOCAL_MAC,
        target_protocol_addr: LOCAL_IP,
    }
    .emit(arp_packet::new_unchecked_mut(&mut payload));
    eth_frame(EthernetProtocol::Arp, &payload)
}

fn ip_packet(protocol: IpProtocol, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0; ipv4::HEADER_LEN + payload.len()];
    {
        let ip = ipv4_packet::new_unchecked_mut(&mut bytes);
        Ipv4Repr {
            src_addr: PEER_IP,
            dst_addr: LOCAL_IP,
            protocol,
            payload_len: payload.len(),
            hop_limit: 64,
        }
        .emit(ip);
        ip.fill_checksum();
    }
    bytes[ipv4::HEADER_LEN..].copy_from_slice(payload);
    bytes
}

fn udp_datagram(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0; udp_wire::HEADER_LEN + payload.len()];
    let out = udp_packet::new_unchecked_mut(&mut bytes);
    UdpRepr {
        src_port,
        dst_port,
        payload_len: payload.len(),
    }
    .emit(out);
    out.payload_mut_slice().copy_from_slice(payload);
    out.fill_checksum(PEER_IP, LOCAL_IP);
    bytes
}

fn echo_request(ident: u16, seq_no: u16, data: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0; icmpv4::HEADER_LEN + data.len()];
    let out = icmpv4_packet::new_unchecked_mut(&mut bytes);
    Icmpv4Repr::EchoRequest { ident, seq_no }.emit(out);
    out.data_mut_slice().copy_from_slice(data);
    out.fill_checksum();
    bytes
}

#[test]
fn pending_datagram_released_by_resolution() {
    let now = Instant::from_secs(0);
    let mut device = TestDevice::default();
    let mut iface = iface();

    // Unresolved destination: the datagram parks, a request broadcasts.
    iface.send_udp(&mut device, now, b"hello ipv4", 3000, PEER_IP, 7).unwrap();
    assert_eq!(device.sent.len(), 1);
    let frame = ethernet_frame::new_checked(&device.sent[0][..]).unwrap();
    assert_eq!(frame.ethertype(), EthernetProtocol::Arp);
    assert_eq!(frame.dst_addr(), EthernetAddress::BROADCAST);
    let request = ArpRepr::parse(arp_packet::new_checked(frame.payload_slice()).unwrap()).unwrap();
    assert_eq!(request.operation, ArpOperation::Request);
    assert_eq!(request.target_protocol_addr, PEER_IP);

    // A second datagram to the unresolved peer is dropped, and no second
    // request goes out while the slot is live.
    iface.send_udp(&mut device, now, b"dropped", 3000, PEER_IP, 7).unwrap();
    assert_eq!(device.sent.len(), 1);

    // The reply releases the parked datagram to the learned address.
    device.queued.push_back(arp_reply_frame());
    assert!(iface.poll(&mut device, now).unwrap());
    assert_eq!(device.sent.len(), 2);

    let frame = ethernet_frame::new_checked(&device.sent[1][..]).unwrap();
    assert_eq!(frame.dst_addr(), PEER_MAC);
    assert_eq!(frame.ethertype(), EthernetProtocol::Ipv4);

    let ip = ipv4_packet::new_checked(frame.payload_slice()).unwrap();
    assert!(ip.verify_checksum());
    assert_eq!(ip.dst_addr(), PEER_IP);
    assert_eq!(usize::from(ip.total_len()),
               ipv4::HEADER_LEN + udp_wire::HEADER_LEN + 10);

    let datagram = udp_packet::new_checked(ip.payload_slice()).unwrap();
    assert!(datagram.verify_checksum(LOCAL_IP, PEER_IP));
    assert_eq!(datagram.dst_port(), 7);
    assert_eq!(datagram.payload_slice(), b"hello ipv4");
}

#[test]
fn corrupted_header_checksum_is_silence() {
    let now = Instant::from_secs(0);
    let mut device = TestDevice::default();
    let mut iface = iface();
    iface.neighbors_mut().fill(PEER_IP, PEER_MAC, now);

    let mut packet = ip_packet(IpProtocol::Icmp, &echo_request(1, 1, b"abcd"));
    packet[8] ^= 0x01; // flip a bit inside the checksummed header

    device.queued.push_back(eth_frame(EthernetProtocol::Ipv4, &packet));
    assert!(iface.poll(&mut device, now).unwrap());
    assert!(device.sent.is_empty());
}

#[test]
fn echo_request_is_answered_verbatim() {
    let now = Instant::from_secs(0);
    let mut device = TestDevice::default();
    let mut iface = iface();
    iface.neighbors_mut().fill(PEER_IP, PEER_MAC, now);

    let packet = ip_packet(IpProtocol::Icmp, &echo_request(0x1234, 7, b"payload bytes"));
    device.queued.push_back(eth_frame(EthernetProtocol::Ipv4, &packet));
    assert!(iface.poll(&mut device, now).unwrap());
    assert_eq!(device.sent.len(), 1);

    let frame = ethernet_frame::new_checked(&device.sent[0][..]).unwrap();
    assert_eq!(frame.dst_addr(), PEER_MAC);
    let ip = ipv4_packet::new_checked(frame.payload_slice()).unwrap();
    assert_eq!(ip.dst_addr(), PEER_IP);

    let reply = icmpv4_packet::new_checked(ip.payload_slice()).unwrap();
    assert!(reply.verify_checksum());
    assert_eq!(reply.msg_type(), Icmpv4Message::EchoReply);
    assert_eq!(reply.echo_ident(), 0x1234);
    assert_eq!(reply.echo_seq_no(), 7);
    assert_eq!(reply.data_slice(), b"payload bytes");
}

#[test]
fn datagram_is_delivered_to_the_port_handler() {
    let now = Instant::from_secs(0);
    let mut device = TestDevice::default();
    let mut iface = iface();

    let received: Rc<RefCell<Vec<(Vec<u8>, Ipv4Address, u16)>>> = Rc::default();
    let sink = Rc::clone(&received);
    iface.open(7, Box::new(move |payload: &[u8], src_addr: Ipv4Address, src_port: u16| {
        sink.borrow_mut().push((payload.to_vec(), src_addr, src_port));
    }));

    let packet = ip_packet(IpProtocol::Udp, &udp_datagram(4000, 7, b"knock knock"));
    device.queued.push_back(eth_frame(EthernetProtocol::Ipv4, &packet));
    assert!(iface.poll(&mut device, now).unwrap());

    let received = received.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, b"knock knock");
    assert_eq!(received[0].1, PEER_IP);
    assert_eq!(received[0].2, 4000);
    // Nothing to answer.
    assert!(device.sent.is_empty());
}

#[test]
fn closed_port_is_answered_with_port_unreachable() {
    let now = Instant::from_secs(0);
    let mut device = TestDevice::default();
    let mut iface = iface();
    iface.neighbors_mut().fill(PEER_IP, PEER_MAC, now);

    let packet = ip_packet(IpProtocol::Udp, &udp_datagram(4000, 9, b"anyone home?"));
    device.queued.push_back(eth_frame(EthernetProtocol::Ipv4, &packet));
    assert!(iface.poll(&mut device, now).unwrap());
    assert_eq!(device.sent.len(), 1);

    let frame = ethernet_frame::new_checked(&device.sent[0][..]).unwrap();
    let ip = ipv4_packet::new_checked(frame.payload_slice()).unwrap();
    assert_eq!(ip.dst_addr(), PEER_IP);

    let report = icmpv4_packet::new_checked(ip.payload_slice()).unwrap();
    assert!(report.verify_checksum());
    assert_eq!(report.msg_type(), Icmpv4Message::DstUnreachable);
    assert_eq!(report.msg_code(), u8::from(Unreachable::PortUnreachable));

    // The quote is the offending header plus its first eight octets,
    // which for a datagram is exactly the transport header.
    let quote = report.data_slice();
    assert_eq!(quote.len(), ipv4::HEADER_LEN + icmpv4::UNREACHABLE_QUOTE);
    assert_eq!(&quote[..ipv4::HEADER_LEN], &packet[..ipv4::HEADER_LEN]);
    assert_eq!(&quote[ipv4::HEADER_LEN..],
               &packet[ipv4::HEADER_LEN..ipv4::HEADER_LEN + icmpv4::UNREACHABLE_QUOTE]);
}

#[test]
fn unknown_protocol_is_answered_with_proto_unreachable() {
    let now = Instant::from_secs(0);
    let mut device = TestDevice::default();
    let mut iface = iface();
    iface.neighbors_mut().fill(PEER_IP, PEER_MAC, now);

    let packet = ip_packet(IpProtocol::Unknown(0x2a), &[0xde, 0xad, 0xbe, 0xef]);
    device.queued.push_back(eth_frame(EthernetProtocol::Ipv4, &packet));
    assert!(iface.poll(&mut device, now).unwrap());
    assert_eq!(device.sent.len(), 1);

    let frame = ethernet_frame::new_checked(&device.sent[0][..]).unwrap();
    let ip = ipv4_packet::new_checked(frame.payload_slice()).unwrap();
    let report = icmpv4_packet::new_checked(ip.payload_slice()).unwrap();
    assert!(report.verify_checksum());
    assert_eq!(report.msg_type(), Icmpv4Message::DstUnreachable);
    assert_eq!(report.msg_code(), u8::from(Unreachable::ProtoUnreachable));
    // The whole four-octet payload fits inside the quote.
    assert_eq!(&report.data_slice()[..ipv4::HEADER_LEN], &packet[..ipv4::HEADER_LEN]);
    assert_eq!(&report.data_slice()[ipv4::HEADER_LEN..], &[0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn large_payload_is_fragmented() {
    let now = Instant::from_secs(0);
    let mut device = TestDevice::default();
    let mut iface = iface();
    iface.neighbors_mut().fill(PEER_IP, PEER_MAC, now);

    let payload: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
    iface.send_udp(&mut device, now, &payload, 4000, PEER_IP, 9).unwrap();
    assert_eq!(device.sent.len(), 3);

    let expected = [(0, true), (1480, true), (2960, false)];
    let mut idents = Vec::new();
    let mut reassembled = Vec::new();
    for (bytes, &(offset, more_frags)) in device.sent.iter().zip(&expected) {
        let frame = ethernet_frame::new_checked(&bytes[..]).unwrap();
        let ip = ipv4_packet::new_checked(frame.payload_slice()).unwrap();
        assert!(ip.verify_checksum());
        assert_eq!(ip.frag_offset(), offset);
        assert_eq!(ip.more_frags(), more_frags);
        idents.push(ip.ident());
        reassembled.extend_from_slice(ip.payload_slice());
    }
    assert_eq!(idents[0], idents[1]);
    assert_eq!(idents[1], idents[2]);

    // The concatenated fragments are the original datagram.
    assert_eq!(reassembled.len(), udp_wire::HEADER_LEN + payload.len());
    let datagram = udp_packet::new_checked(&reassembled[..]).unwrap();
    assert!(datagram.verify_checksum(LOCAL_IP, PEER_IP));
    assert_eq!(datagram.payload_slice(), &payload[..]);
}

#[test]
fn consecutive_sends_use_fresh_identifiers() {
    let now = Instant::from_secs(0);
    let mut device = TestDevice::default();
    let mut iface = iface();
    iface.neighbors_mut().fill(PEER_IP, PEER_MAC, now);

    iface.send_udp(&mut device, now, b"first", 4000, PEER_IP, 9).unwrap();
    iface.send_udp(&mut device, now, b"second", 4000, PEER_IP, 9).unwrap();
    assert_eq!(device.sent.len(), 2);

    let idents: Vec<u16> = device.sent.iter().map(|bytes| {
        let frame = ethernet_frame::new_checked(&bytes[..]).unwrap();
        // A cached destination never triggers another request.
        assert_eq!(frame.ethertype(), EthernetProtocol::Ipv4);
        ipv4_packet::new_checked(frame.payload_slice()).unwrap().ident()
    }).collect();
    assert_ne!(idents[0], idents[1]);
}

#[test]
fn announce_broadcasts_a_gratuitous_request() {
    let mut device = TestDevice::default();
    let mut iface = iface();
    iface.announce(&mut device).unwrap();

    let frame = ethernet_frame::new_checked(&device.sent[0][..]).unwrap();
    assert_eq!(frame.dst_addr(), EthernetAddress::BROADCAST);
    let request = ArpRepr::parse(arp_packet::new_checked(frame.payload_slice()).unwrap()).unwrap();
    assert_eq!(request.operation, ArpOperation::Request);
    assert_eq!(request.source_protocol_addr, LOCAL_IP);
    assert_eq!(request.target_protocol_addr, LOCAL_IP);
}

#[test]
fn unknown_ethertype_is_dropped_silently() {
    let now = Instant::from_secs(0);
    let mut device = TestDevice::default();
    let mut iface = iface();

    device.queued.push_back(eth_frame(EthernetProtocol::Unknown(0x86dd), &[0; 40]));
    assert!(iface.poll(&mut device, now).unwrap());
    assert!(device.sent.is_empty());

    // An idle device reports no work.
    assert!(!iface.poll(&mut device, now).unwrap());
}
