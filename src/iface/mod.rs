//! The interface: one stack context owning all protocol state.
//!
//! An [`Interface`] is configured with one hardware and one protocol
//! address and owns the endpoints of every layer: the neighbor cache,
//! the pending-packet slots, the datagram identifier and the table of
//! open ports. It is driven by an explicit [`poll`](Interface::poll)
//! loop; each poll receives at most one frame and processes it to
//! completion, so there is no internal locking and no timer thread.
//! Expiring state is checked lazily against the timestamp the caller
//! passes in.

#[cfg(test)]
mod tests;

use log::debug;

use crate::layer::{arp, eth, icmp, ip, udp};
use crate::layer::{Error, Result};
use crate::nic::Device;
use crate::storage::PacketBuffer;
use crate::time::Instant;
use crate::wire::{ethernet, ipv4, udp as udp_wire};
use crate::wire::{
    udp_packet, EthernetAddress, EthernetProtocol, Icmpv4DstUnreachable, IpProtocol, Ipv4Address,
};

const UDP_HEADROOM: usize = ethernet::HEADER_LEN + ipv4::HEADER_LEN + udp_wire::HEADER_LEN;

/// A single network interface and all of its protocol state.
pub struct Interface {
    eth: eth::Endpoint,
    arp: arp::Endpoint,
    ip: ip::Endpoint,
    icmp: icmp::Endpoint,
    udp: udp::Endpoint,
}

impl Interface {
    /// Create an interface with the given addresses and empty tables.
    pub fn new(hardware_addr: EthernetAddress, protocol_addr: Ipv4Address) -> Self {
        Interface {
            eth: eth::Endpoint::new(hardware_addr),
            arp: arp::Endpoint::new(),
            ip: ip::Endpoint::new(protocol_addr),
            icmp: icmp::Endpoint::new(),
            udp: udp::Endpoint::new(),
        }
    }

    /// The hardware address of the interface.
    pub fn hardware_addr(&self) -> EthernetAddress {
        self.eth.addr()
    }

    /// The protocol address of the interface.
    pub fn protocol_addr(&self) -> Ipv4Address {
        self.ip.addr()
    }

    /// The cache of resolved neighbors.
    pub fn neighbors(&self) -> &arp::NeighborCache {
        self.arp.neighbors()
    }

    pub fn neighbors_mut(&mut self) -> &mut arp::NeighborCache {
        self.arp.neighbors_mut()
    }

    /// Bind `handler` to a datagram port, replacing any previous handler.
    pub fn open(&mut self, port: u16, handler: Box<dyn udp::Handler>) {
        self.udp.open(port, handler)
    }

    /// Unbind a datagram port.
    pub fn close(&mut self, port: u16) {
        self.udp.close(port)
    }

    /// Announce our address mapping with a gratuitous request.
    pub fn announce<D: Device>(&mut self, device: &mut D) -> Result<()> {
        let local_ip = self.ip.addr();
        self.arp.announce(&mut self.eth, device, local_ip)
    }

    /// Receive and fully process at most one frame.
    ///
    /// Returns whether a frame was consumed from the device. A dropped
    /// frame still counts as consumed; the drop reason only shows up in
    /// the log, since the sender of a broken packet cannot be trusted.
    pub fn poll<D: Device>(&mut self, device: &mut D, now: Instant) -> Result<bool> {
        let mut frame = [0; ethernet::HEADER_LEN + ethernet::MTU];
        let len = match device.receive(&mut frame)? {
            Some(len) => len,
            None => return Ok(false),
        };

        let mut packet = PacketBuffer::from_frame(&frame[..len]);
        if let Err(err) = self.frame_in(device, now, &mut packet) {
            debug!("dropping frame: {}", err);
        }
        Ok(true)
    }

    /// Send a datagram payload from `src_port` to `dst_addr:dst_port`.
    pub fn send_udp<D: Device>(
        &mut self,
        device: &mut D,
        now: Instant,
        payload: &[u8],
        src_port: u16,
        dst_addr: Ipv4Address,
        dst_port: u16,
    ) -> Result<()> {
        let mut packet = PacketBuffer::alloc(UDP_HEADROOM, payload.len(), ethernet::MIN_PAYLOAD);
        packet.payload_mut().copy_from_slice(payload);

        let mut sender = ip::Sender {
            endpoint: &mut self.ip,
            arp: &mut self.arp,
            eth: &mut self.eth,
            device,
        };
        self.udp.send(&mut sender, now, packet, src_port, dst_addr, dst_port)
    }

    fn frame_in<D: Device>(
        &mut self,
        device: &mut D,
        now: Instant,
        packet: &mut PacketBuffer,
    ) -> Result<()> {
        let frame = self.eth.accept(packet)?;
        match frame.ethertype {
            EthernetProtocol::Arp => {
                let local_ip = self.ip.addr();
                self.arp.process(&mut self.eth, device, now, local_ip, packet)
            }
            EthernetProtocol::Ipv4 => self.ip_in(device, now, packet),
            EthernetProtocol::Unknown(_) => Err(Error::Unhandled),
        }
    }

    fn ip_in<D: Device>(
        &mut self,
        device: &mut D,
        now: Instant,
        packet: &mut PacketBuffer,
    ) -> Result<()> {
        let (protocol, src_addr, header_len) = self.ip.accept(packet)?;
        match protocol {
            IpProtocol::Icmp => {
                let mut sender = ip::Sender {
                    endpoint: &mut self.ip,
                    arp: &mut self.arp,
                    eth: &mut self.eth,
                    device,
                };
                self.icmp.process(&mut sender, now, packet, src_addr)
            }
            IpProtocol::Udp => self.udp_in(device, now, packet, src_addr, header_len),
            IpProtocol::Unknown(_) => {
                debug!("ip: no handler for {}, reporting unreachable", protocol);
                packet.prepend(header_len)?;
                let mut sender = ip::Sender {
                    endpoint: &mut self.ip,
                    arp: &mut self.arp,
                    eth: &mut self.eth,
                    device,
                };
                self.icmp.unreachable(
                    &mut sender,
                    now,
                    packet,
                    src_addr,
                    Icmpv4DstUnreachable::ProtoUnreachable,
                )
            }
        }
    }

    fn udp_in<D: Device>(
        &mut self,
        device: &mut D,
        now: Instant,
        packet: &mut PacketBuffer,
        src_addr: Ipv4Address,
        ip_header_len: usize,
    ) -> Result<()> {
        let local_addr = self.ip.addr();
        let repr = self.udp.accept(packet, src_addr, local_addr)?;

        match self.udp.handler_mut(repr.dst_port) {
            Some(handler) => {
                let datagram = udp_packet::new_unchecked(packet.payload());
                handler.receive(datagram.payload_slice(), src_addr, repr.src_port);
                Ok(())
            }
            None => {
                debug!("udp: port {} is closed, reporting unreachable", repr.dst_port);
                packet.prepend(ip_header_len)?;
                let mut sender = ip::Sender {
                    endpoint: &mut self.ip,
                    arp: &mut self.arp,
                    eth: &mut self.eth,
                    device,
                };
                self.icmp.unreachable(
                    &mut sender,
                    now,
                    packet,
                    src_addr,
                    Icmpv4DstUnreachable::PortUnreachable,
                )
            }
        }
    }
}
