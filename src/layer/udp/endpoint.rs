use log::trace;

use crate::layer::ip;
use crate::layer::{Error, Result};
use crate::nic::Device;
use crate::storage::PacketBuffer;
use crate::time::Instant;
use crate::wire::udp;
use crate::wire::{udp_packet, IpProtocol, Ipv4Address, UdpRepr};

/// A consumer of datagrams delivered to one port.
///
/// Any `FnMut(&[u8], Ipv4Address, u16)` closure implements this, taking
/// the payload and the sender's address and port.
pub trait Handler {
    fn receive(&mut self, payload: &[u8], src_addr: Ipv4Address, src_port: u16);
}

impl<F> Handler for F
where
    F: FnMut(&[u8], Ipv4Address, u16),
{
    fn receive(&mut self, payload: &[u8], src_addr: Ipv4Address, src_port: u16) {
        self(payload, src_addr, src_port)
    }
}

/// The datagram layer state: the table of open ports.
#[derive(Default)]
pub struct Endpoint {
    ports: Vec<(u16, Box<dyn Handler>)>,
}

impl Endpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `port`, replacing any previous handler.
    pub fn open(&mut self, port: u16, handler: Box<dyn Handler>) {
        match self.lookup_index(port) {
            Ok(index) => self.ports[index].1 = handler,
            Err(index) => self.ports.insert(index, (port, handler)),
        }
    }

    /// Unbind `port`. Closing a port that is not open does nothing.
    pub fn close(&mut self, port: u16) {
        if let Ok(index) = self.lookup_index(port) {
            self.ports.remove(index);
        }
    }

    /// Whether a handler is bound to `port`.
    pub fn is_open(&self, port: u16) -> bool {
        self.lookup_index(port).is_ok()
    }

    /// The handler bound to `port`, if any.
    pub fn handler_mut(&mut self, port: u16) -> Option<&mut dyn Handler> {
        match self.lookup_index(port) {
            Ok(index) => Some(&mut *self.ports[index].1),
            Err(_) => None,
        }
    }

    fn lookup_index(&self, port: u16) -> core::result::Result<usize, usize> {
        self.ports.binary_search_by_key(&port, |&(p, _)| p)
    }

    /// Validate a received datagram, leaving the buffer untouched.
    ///
    /// The caller looks up the handler for the returned destination port,
    /// so an unbound port can still be answered with an unreachable
    /// report quoting the intact datagram.
    pub fn accept(
        &self,
        packet: &PacketBuffer,
        src_addr: Ipv4Address,
        dst_addr: Ipv4Address,
    ) -> Result<UdpRepr> {
        let datagram = udp_packet::new_checked(packet.payload())?;
        // A zero checksum marks the checksum as not computed.
        if datagram.checksum() != 0 && !datagram.verify_checksum(src_addr, dst_addr) {
            return Err(Error::WrongChecksum);
        }
        Ok(UdpRepr::parse(datagram)?)
    }

    /// Wrap a payload into a datagram and send it.
    pub fn send<D: Device>(
        &mut self,
        ip: &mut ip::Sender<'_, D>,
        now: Instant,
        mut packet: PacketBuffer,
        src_port: u16,
        dst_addr: Ipv4Address,
        dst_port: u16,
    ) -> Result<()> {
        let payload_len = packet.len();
        let src_addr = ip.endpoint.addr();

        packet.prepend(udp::HEADER_LEN)?;
        {
            let datagram = udp_packet::new_unchecked_mut(packet.payload_mut());
            UdpRepr { src_port, dst_port, payload_len }.emit(datagram);
            datagram.fill_checksum(src_addr, dst_addr);
        }

        trace!("udp: tx {} octets {}:{} -> {}:{}", payload_len, src_addr, src_port, dst_addr, dst_port);
        ip.send(now, packet, dst_addr, IpProtocol::Udp)
    }
}
