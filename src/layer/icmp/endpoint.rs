use log::{debug, trace};

use crate::layer::ip;
use crate::layer::{Error, Result};
use crate::nic::Device;
use crate::storage::PacketBuffer;
use crate::time::Instant;
use crate::wire::{ethernet, icmpv4, ipv4};
use crate::wire::{
    icmpv4_packet, ipv4_packet, Icmpv4DstUnreachable, Icmpv4Repr, IpProtocol, Ipv4Address,
};

const HEADROOM: usize = ethernet::HEADER_LEN + ipv4::HEADER_LEN;

/// The control message layer owns no state.
#[derive(Debug, Default)]
pub struct Endpoint;

impl Endpoint {
    pub fn new() -> Self {
        Endpoint
    }

    /// Handle a received control message addressed to this host.
    ///
    /// Echo requests are answered with a reply quoting the identifier,
    /// sequence number and payload verbatim. Replies and error reports
    /// terminate here; nothing above consumes them.
    pub fn process<D: Device>(
        &mut self,
        ip: &mut ip::Sender<'_, D>,
        now: Instant,
        packet: &PacketBuffer,
        src_addr: Ipv4Address,
    ) -> Result<()> {
        let message = icmpv4_packet::new_checked(packet.payload())?;
        if !message.verify_checksum() {
            return Err(Error::WrongChecksum);
        }

        match Icmpv4Repr::parse(message)? {
            Icmpv4Repr::EchoRequest { ident, seq_no } => {
                trace!("icmp: echo request {}/{} from {}", ident, seq_no, src_addr);
                let data = message.data_slice();

                let mut reply = PacketBuffer::alloc(
                    HEADROOM,
                    icmpv4::HEADER_LEN + data.len(),
                    ethernet::MIN_PAYLOAD,
                );
                {
                    let out = icmpv4_packet::new_unchecked_mut(reply.payload_mut());
                    Icmpv4Repr::EchoReply { ident, seq_no }.emit(out);
                    out.data_mut_slice().copy_from_slice(data);
                    out.fill_checksum();
                }
                ip.send(now, reply, src_addr, IpProtocol::Icmp)
            }
            other => {
                trace!("icmp: ignoring {:?} from {}", other, src_addr);
                Ok(())
            }
        }
    }

    /// Report an undeliverable packet back to its sender.
    ///
    /// `original` must hold the offending packet from its internet header
    /// onward. The report quotes that header and the first eight payload
    /// octets, per RFC 792.
    pub fn unreachable<D: Device>(
        &mut self,
        ip: &mut ip::Sender<'_, D>,
        now: Instant,
        original: &PacketBuffer,
        dst_addr: Ipv4Address,
        reason: Icmpv4DstUnreachable,
    ) -> Result<()> {
        let header_len = {
            let offender = ipv4_packet::new_checked(original.payload())?;
            usize::from(offender.header_len())
        };
        let quote = core::cmp::min(
            original.payload().len(),
            header_len + icmpv4::UNREACHABLE_QUOTE,
        );

        let mut report = PacketBuffer::alloc(
            HEADROOM,
            icmpv4::HEADER_LEN + quote,
            ethernet::MIN_PAYLOAD,
        );
        {
            let out = icmpv4_packet::new_unchecked_mut(report.payload_mut());
            Icmpv4Repr::DstUnreachable { reason }.emit(out);
            out.data_mut_slice().copy_from_slice(&original.payload()[..quote]);
            out.fill_checksum();
        }

        debug!("icmp: reporting unreachable to {}", dst_addr);
        ip.send(now, report, dst_addr, IpProtocol::Icmp)
    }
}
