use log::{debug, trace};

use crate::layer::{arp, eth};
use crate::layer::{Error, Result};
use crate::nic::Device;
use crate::storage::PacketBuffer;
use crate::time::Instant;
use crate::wire::{ethernet, ipv4};
use crate::wire::{ipv4_packet, IpProtocol, Ipv4Address, Ipv4Repr};

/// The internet layer state: our address and the datagram identifier.
pub struct Endpoint {
    addr: Ipv4Address,
    ident: u16,
}

impl Endpoint {
    pub fn new(addr: Ipv4Address) -> Self {
        Endpoint { addr, ident: 0 }
    }

    /// The protocol address packets are accepted on and sent from.
    pub fn addr(&self) -> Ipv4Address {
        self.addr
    }

    /// Validate a received packet and strip its header.
    ///
    /// Packets with a bad version, contradictory lengths, a wrong header
    /// checksum or a foreign destination are dropped. Link padding past
    /// the declared total length is trimmed before the header is
    /// stripped, so the remaining payload is exactly the datagram.
    ///
    /// Returns the protocol, the sender and the stripped header length;
    /// the latter lets a failed upper-layer dispatch prepend the header
    /// again and quote it in an unreachable reply.
    pub fn accept(&mut self, packet: &mut PacketBuffer) -> Result<(IpProtocol, Ipv4Address, usize)> {
        let (repr, header_len, total_len) = {
            let ip = ipv4_packet::new_checked(packet.payload())?;
            let repr = Ipv4Repr::parse(ip)?;
            (repr, usize::from(ip.header_len()), usize::from(ip.total_len()))
        };

        if repr.dst_addr != self.addr && !repr.dst_addr.is_broadcast() {
            debug!("ip: {} is not for us", repr.dst_addr);
            return Err(Error::NotOurs);
        }

        packet.truncate(total_len)?;
        packet.strip(header_len)?;
        trace!("ip: rx {} octets of {} from {}", repr.payload_len, repr.protocol, repr.src_addr);
        Ok((repr.protocol, repr.src_addr, header_len))
    }
}

/// The downward send path: the internet endpoint and everything below it.
///
/// Bundling the borrows keeps the signatures of the transport layers to a
/// single collaborator and lets them send replies mid-processing.
pub struct Sender<'a, D> {
    pub endpoint: &'a mut Endpoint,
    pub arp: &'a mut arp::Endpoint,
    pub eth: &'a mut eth::Endpoint,
    pub device: &'a mut D,
}

impl<'a, D: Device> Sender<'a, D> {
    /// Send a transport packet to `dst_addr`, fragmenting when needed.
    ///
    /// The buffer's headroom must cover the internet and link headers.
    /// Payloads above the fragment maximum are split into maximum-size
    /// fragments with offsets in eight-octet units and the more-fragments
    /// flag on all but the last. All fragments of one call share one
    /// identifier; the counter increments once per call and wraps
    /// silently.
    pub fn send(
        &mut self,
        now: Instant,
        packet: PacketBuffer,
        dst_addr: Ipv4Address,
        protocol: IpProtocol,
    ) -> Result<()> {
        let ident = self.endpoint.ident;
        self.endpoint.ident = ident.wrapping_add(1);

        let total = packet.len();
        if total <= ipv4::MAX_FRAGMENT_PAYLOAD {
            return self.fragment(now, packet, dst_addr, protocol, ident, 0, false);
        }

        let mut offset = 0;
        while offset < total {
            let chunk = core::cmp::min(ipv4::MAX_FRAGMENT_PAYLOAD, total - offset);
            let more_frags = offset + chunk < total;

            let mut fragment = PacketBuffer::alloc(
                ethernet::HEADER_LEN + ipv4::HEADER_LEN,
                chunk,
                ethernet::MIN_PAYLOAD,
            );
            fragment
                .payload_mut()
                .copy_from_slice(&packet.payload()[offset..offset + chunk]);
            self.fragment(now, fragment, dst_addr, protocol, ident, offset, more_frags)?;

            offset += chunk;
        }
        Ok(())
    }

    fn fragment(
        &mut self,
        now: Instant,
        mut packet: PacketBuffer,
        dst_addr: Ipv4Address,
        protocol: IpProtocol,
        ident: u16,
        offset: usize,
        more_frags: bool,
    ) -> Result<()> {
        let payload_len = packet.len();
        packet.prepend(ipv4::HEADER_LEN)?;
        {
            let ip = ipv4_packet::new_unchecked_mut(packet.payload_mut());
            Ipv4Repr {
                src_addr: self.endpoint.addr,
                dst_addr,
                protocol,
                payload_len,
                hop_limit: ipv4::DEFAULT_TTL,
            }
            .emit(ip);
            ip.set_ident(ident);
            ip.set_frag_offset(offset as u16);
            ip.set_more_frags(more_frags);
            ip.fill_checksum();
        }

        trace!("ip: tx {} octets of {} to {} (offset {})", payload_len, protocol, dst_addr, offset);
        self.arp
            .dispatch(self.eth, self.device, now, self.endpoint.addr, packet, dst_addr)
    }
}
