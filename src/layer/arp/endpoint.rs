use log::{debug, trace};

use crate::layer::eth;
use crate::layer::Result;
use crate::nic::Device;
use crate::storage::PacketBuffer;
use crate::time::Instant;
use crate::wire::{arp, ethernet};
use crate::wire::{
    arp_packet, ArpOperation, ArpRepr, EthernetAddress, EthernetProtocol, Ipv4Address,
};

use super::{neighbor, pending};

/// The resolution state of the interface.
#[derive(Debug, Default)]
pub struct Endpoint {
    neighbors: neighbor::Cache,
    pending: pending::Slots,
}

impl Endpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache of resolved neighbors.
    pub fn neighbors(&self) -> &neighbor::Cache {
        &self.neighbors
    }

    pub fn neighbors_mut(&mut self) -> &mut neighbor::Cache {
        &mut self.neighbors
    }

    /// Handle a received ARP packet, its Ethernet header already stripped.
    ///
    /// Every valid packet refreshes the cache with the sender's mapping
    /// and releases a packet parked on the sender. Requests for
    /// `local_ip` are answered with our own mapping.
    pub fn process<D: Device>(
        &mut self,
        eth: &mut eth::Endpoint,
        device: &mut D,
        now: Instant,
        local_ip: Ipv4Address,
        packet: &PacketBuffer,
    ) -> Result<()> {
        let repr = ArpRepr::parse(arp_packet::new_checked(packet.payload())?)?;

        self.neighbors
            .fill(repr.source_protocol_addr, repr.source_hardware_addr, now);
        trace!(
            "arp: {} is at {}",
            repr.source_protocol_addr,
            repr.source_hardware_addr
        );

        if let Some(mut parked) = self.pending.take(repr.source_protocol_addr, now) {
            trace!("arp: releasing parked packet to {}", repr.source_protocol_addr);
            eth.transmit(device, &mut parked, repr.source_hardware_addr, EthernetProtocol::Ipv4)?;
        }

        if repr.operation == ArpOperation::Request && repr.target_protocol_addr == local_ip {
            self.reply(eth, device, local_ip, repr.source_hardware_addr, repr.source_protocol_addr)?;
        }

        Ok(())
    }

    /// Send an IP packet, resolving the destination's hardware address.
    ///
    /// An unresolved destination parks the packet and broadcasts a
    /// request. While a slot is live for the destination, further packets
    /// to it are dropped and no new request goes out.
    pub fn dispatch<D: Device>(
        &mut self,
        eth: &mut eth::Endpoint,
        device: &mut D,
        now: Instant,
        local_ip: Ipv4Address,
        mut packet: PacketBuffer,
        dst_ip: Ipv4Address,
    ) -> Result<()> {
        if dst_ip.is_broadcast() {
            return eth.transmit(device, &mut packet, EthernetAddress::BROADCAST, EthernetProtocol::Ipv4);
        }

        if let Some(hardware_addr) = self.neighbors.lookup(dst_ip, now) {
            return eth.transmit(device, &mut packet, hardware_addr, EthernetProtocol::Ipv4);
        }

        if self.pending.park(dst_ip, packet, now) {
            self.request(eth, device, local_ip, dst_ip)
        } else {
            debug!("arp: {} unresolved with a packet already parked, dropping", dst_ip);
            Ok(())
        }
    }

    /// Broadcast a request for `target_ip`.
    pub fn request<D: Device>(
        &mut self,
        eth: &mut eth::Endpoint,
        device: &mut D,
        local_ip: Ipv4Address,
        target_ip: Ipv4Address,
    ) -> Result<()> {
        let repr = ArpRepr {
            operation: ArpOperation::Request,
            source_hardware_addr: eth.addr(),
            source_protocol_addr: local_ip,
            target_hardware_addr: EthernetAddress::default(),
            target_protocol_addr: target_ip,
        };
        trace!("arp: who has {}?", target_ip);
        Self::transmit(eth, device, repr, EthernetAddress::BROADCAST)
    }

    /// Announce our own mapping with a gratuitous request.
    pub fn announce<D: Device>(
        &mut self,
        eth: &mut eth::Endpoint,
        device: &mut D,
        local_ip: Ipv4Address,
    ) -> Result<()> {
        self.request(eth, device, local_ip, local_ip)
    }

    fn reply<D: Device>(
        &mut self,
        eth: &mut eth::Endpoint,
        device: &mut D,
        local_ip: Ipv4Address,
        target_hardware_addr: EthernetAddress,
        target_protocol_addr: Ipv4Address,
    ) -> Result<()> {
        let repr = ArpRepr {
            operation: ArpOperation::Reply,
            source_hardware_addr: eth.addr(),
            source_protocol_addr: local_ip,
            target_hardware_addr,
            target_protocol_addr,
        };
        trace!("arp: telling {} that {} is at {}", target_protocol_addr, local_ip, eth.addr());
        Self::transmit(eth, device, repr, target_hardware_addr)
    }

    fn transmit<D: Device>(
        eth: &mut eth::Endpoint,
        device: &mut D,
        repr: ArpRepr,
        dst_addr: EthernetAddress,
    ) -> Result<()> {
        let mut packet = PacketBuffer::alloc(
            ethernet::HEADER_LEN,
            arp::PACKET_LEN,
            ethernet::MIN_PAYLOAD - arp::PACKET_LEN,
        );
        repr.emit(arp_packet::new_unchecked_mut(packet.payload_mut()));
        eth.transmit(device, &mut packet, dst_addr, EthernetProtocol::Arp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nic::Loopback;
    use crate::wire::ethernet_frame;

    const LOCAL_MAC: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x01]);
    const LOCAL_IP: Ipv4Address = Ipv4Address::new(10, 0, 0, 1);
    const PEER_MAC: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x02]);
    const PEER_IP: Ipv4Address = Ipv4Address::new(10, 0, 0, 2);

    fn request_from_peer(target_ip: Ipv4Address) -> PacketBuffer {
        let mut packet = PacketBuffer::alloc(0, arp::PACKET_LEN, 0);
        ArpRepr {
            operation: ArpOperation::Request,
            source_hardware_addr: PEER_MAC,
            source_protocol_addr: PEER_IP,
            target_hardware_addr: EthernetAddress::default(),
            target_protocol_addr: target_ip,
        }
        .emit(arp_packet::new_unchecked_mut(packet.payload_mut()));
        packet
    }

    fn sent_arp(device: &mut Loopback) -> ArpRepr {
        let mut frame = [0; 1514];
        let len = device.receive(&mut frame).unwrap().unwrap();
        let frame = ethernet_frame::new_checked(&frame[..len]).unwrap();
        assert_eq!(frame.ethertype(), EthernetProtocol::Arp);
        ArpRepr::parse(arp_packet::new_checked(frame.payload_slice()).unwrap()).unwrap()
    }

    #[test]
    fn requests_for_us_are_answered() {
        let now = Instant::from_secs(0);
        let mut device = Loopback::new();
        let mut eth = eth::Endpoint::new(LOCAL_MAC);
        let mut endpoint = Endpoint::new();

        let packet = request_from_peer(LOCAL_IP);
        endpoint.process(&mut eth, &mut device, now, LOCAL_IP, &packet).unwrap();

        let reply = sent_arp(&mut device);
        assert_eq!(reply.operation, ArpOperation::Reply);
        assert_eq!(reply.source_hardware_addr, LOCAL_MAC);
        assert_eq!(reply.source_protocol_addr, LOCAL_IP);
        assert_eq!(reply.target_hardware_addr, PEER_MAC);
        assert_eq!(reply.target_protocol_addr, PEER_IP);

        // The sender was learned as a side effect.
        assert_eq!(endpoint.neighbors().lookup(PEER_IP, now), Some(PEER_MAC));
    }

    #[test]
    fn requests_for_others_only_fill_the_cache() {
        let now = Instant::from_secs(0);
        let mut device = Loopback::new();
        let mut eth = eth::Endpoint::new(LOCAL_MAC);
        let mut endpoint = Endpoint::new();

        let packet = request_from_peer(Ipv4Address::new(10, 0, 0, 99));
        endpoint.process(&mut eth, &mut device, now, LOCAL_IP, &packet).unwrap();

        assert_eq!(device.queued(), 0);
        assert_eq!(endpoint.neighbors().lookup(PEER_IP, now), Some(PEER_MAC));
    }

    #[test]
    fn dispatch_resolves_before_sending() {
        let now = Instant::from_secs(0);
        let mut device = Loopback::new();
        let mut eth = eth::Endpoint::new(LOCAL_MAC);
        let mut endpoint = Endpoint::new();

        let mut packet = PacketBuffer::alloc(ethernet::HEADER_LEN, 20, ethernet::MIN_PAYLOAD);
        packet.payload_mut()[0] = 0x45;
        endpoint
            .dispatch(&mut eth, &mut device, now, LOCAL_IP, packet.clone(), PEER_IP)
            .unwrap();

        // The packet was parked; only a request went out.
        let request = sent_arp(&mut device);
        assert_eq!(request.operation, ArpOperation::Request);
        assert_eq!(request.target_protocol_addr, PEER_IP);
        assert_eq!(device.queued(), 0);

        // A second packet to the unresolved peer is dropped silently.
        endpoint
            .dispatch(&mut eth, &mut device, now, LOCAL_IP, packet, PEER_IP)
            .unwrap();
        assert_eq!(device.queued(), 0);

        // The reply releases the parked packet.
        let mut reply = PacketBuffer::alloc(0, arp::PACKET_LEN, 0);
        ArpRepr {
            operation: ArpOperation::Reply,
            source_hardware_addr: PEER_MAC,
            source_protocol_addr: PEER_IP,
            target_hardware_addr: LOCAL_MAC,
            target_protocol_addr: LOCAL_IP,
        }
        .emit(arp_packet::new_unchecked_mut(reply.payload_mut()));
        endpoint.process(&mut eth, &mut device, now, LOCAL_IP, &reply).unwrap();

        let mut frame = [0; 1514];
        let len = device.receive(&mut frame).unwrap().unwrap();
        let frame = ethernet_frame::new_checked(&frame[..len]).unwrap();
        assert_eq!(frame.ethertype(), EthernetProtocol::Ipv4);
        assert_eq!(frame.dst_addr(), PEER_MAC);
        assert_eq!(frame.payload_slice()[0], 0x45);
    }

    #[test]
    fn broadcast_skips_resolution() {
        let now = Instant::from_secs(0);
        let mut device = Loopback::new();
        let mut eth = eth::Endpoint::new(LOCAL_MAC);
        let mut endpoint = Endpoint::new();

        let packet = PacketBuffer::alloc(ethernet::HEADER_LEN, 20, ethernet::MIN_PAYLOAD);
        endpoint
            .dispatch(&mut eth, &mut device, now, LOCAL_IP, packet, Ipv4Address::BROADCAST)
            .unwrap();

        let mut frame = [0; 1514];
        let len = device.receive(&mut frame).unwrap().unwrap();
        let frame = ethernet_frame::new_checked(&frame[..len]).unwrap();
        assert_eq!(frame.dst_addr(), EthernetAddress::BROADCAST);
    }
}
