use log::trace;

use crate::layer::Result;
use crate::nic::Device;
use crate::storage::PacketBuffer;
use crate::wire::ethernet;
use crate::wire::{ethernet_frame, EthernetAddress, EthernetProtocol, EthernetRepr};

/// The Ethernet layer state: the hardware address of the interface.
pub struct Endpoint {
    addr: EthernetAddress,
}

impl Endpoint {
    pub fn new(addr: EthernetAddress) -> Self {
        Endpoint { addr }
    }

    /// The hardware address frames are sent from.
    pub fn addr(&self) -> EthernetAddress {
        self.addr
    }

    /// Unwrap a received frame, stripping its header.
    ///
    /// Frames shorter than a header are dropped. Destination filtering is
    /// left to the upper layers; a tap or loopback medium only ever
    /// delivers frames meant for us anyway.
    pub fn accept(&mut self, packet: &mut PacketBuffer) -> Result<EthernetRepr> {
        let repr = EthernetRepr::parse(ethernet_frame::new_checked(packet.payload())?)?;
        packet.strip(ethernet::HEADER_LEN)?;
        trace!("eth: rx {} from {}", repr.ethertype, repr.src_addr);
        Ok(repr)
    }

    /// Frame a payload and hand it to the device.
    ///
    /// Payloads below the medium's minimum are padded with zeroes first;
    /// the buffer must have reserved the tailroom for that.
    pub fn transmit<D: Device>(
        &mut self,
        device: &mut D,
        packet: &mut PacketBuffer,
        dst_addr: EthernetAddress,
        ethertype: EthernetProtocol,
    ) -> Result<()> {
        if packet.len() < ethernet::MIN_PAYLOAD {
            let missing = ethernet::MIN_PAYLOAD - packet.len();
            packet.append(missing)?;
        }

        packet.prepend(ethernet::HEADER_LEN)?;
        let frame = ethernet_frame::new_unchecked_mut(packet.payload_mut());
        EthernetRepr {
            src_addr: self.addr,
            dst_addr,
            ethertype,
        }
        .emit(frame);

        trace!("eth: tx {} to {}", ethertype, dst_addr);
        device.transmit(packet.payload())
    }
}
