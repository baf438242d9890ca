use core::fmt;
use byteorder::{ByteOrder, NetworkEndian};

use crate::wire::{Error, Result};
use super::ipv4::checksum;

enum_with_unknown! {
    /// Internet Control Message Protocol v4 message type.
    pub enum Message(u8) {
        /// Echo reply.
        EchoReply = 0,
        /// Destination unreachable.
        DstUnreachable = 3,
        /// Echo request.
        EchoRequest = 8,
    }
}

enum_with_unknown! {
    /// Code of the destination-unreachable message type.
    pub enum DstUnreachable(u8) {
        /// The transport protocol is not supported by the destination host.
        ProtoUnreachable = 2,
        /// No process is listening on the destination port.
        PortUnreachable = 3,
    }
}

/// Length of an ICMP header including the echo/rest-of-header word.
pub const HEADER_LEN: usize = 8;

/// How many octets of the offending packet an unreachable message carries:
/// the IP header and the first eight payload octets, per RFC 792.
pub const UNREACHABLE_QUOTE: usize = 8;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Message::EchoReply => write!(f, "echo reply"),
            Message::DstUnreachable => write!(f, "destination unreachable"),
            Message::EchoRequest => write!(f, "echo request"),
            Message::Unknown(id) => write!(f, "0x{:02x}", id),
        }
    }
}

byte_wrapper! {
    /// A byte sequence representing an ICMPv4 message.
    #[derive(Debug, PartialEq, Eq)]
    pub struct icmpv4([u8]);
}

mod field {
    use crate::wire::field::*;

    pub(crate) const TYPE:     usize = 0;
    pub(crate) const CODE:     usize = 1;
    pub(crate) const CHECKSUM: Field = 2..4;
    pub(crate) const IDENT:    Field = 4..6;
    pub(crate) const SEQ_NO:   Field = 6..8;
    pub(crate) const DATA:     Rest  = 8..;
}

impl icmpv4 {
    /// Imbue a raw octet buffer with ICMPv4 message structure.
    pub fn new_unchecked(data: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(data)
    }

    /// Imbue a mutable octet buffer with ICMPv4 message structure.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&Self> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// Ensure that no accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is too short.
    pub fn check_len(&self) -> Result<()> {
        if self.0.len() < field::DATA.start {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Return the message type field.
    pub fn msg_type(&self) -> Message {
        Message::from(self.0[field::TYPE])
    }

    /// Return the message code field.
    pub fn msg_code(&self) -> u8 {
        self.0[field::CODE]
    }

    /// Return the checksum field.
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Return the echo identifier field.
    pub fn echo_ident(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::IDENT])
    }

    /// Return the echo sequence number field.
    pub fn echo_seq_no(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::SEQ_NO])
    }

    /// Validate the checksum over the whole message.
    pub fn verify_checksum(&self) -> bool {
        checksum::data(&self.0) == !0
    }

    /// Set the message type field.
    pub fn set_msg_type(&mut self, value: Message) {
        self.0[field::TYPE] = value.into()
    }

    /// Set the message code field.
    pub fn set_msg_code(&mut self, value: u8) {
        self.0[field::CODE] = value
    }

    /// Set the checksum field.
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    /// Set the echo identifier field.
    pub fn set_echo_ident(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::IDENT], value)
    }

    /// Set the echo sequence number field.
    pub fn set_echo_seq_no(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::SEQ_NO], value)
    }

    /// Compute and fill in the checksum over the whole message.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = !checksum::data(&self.0);
        self.set_checksum(checksum)
    }

    /// Return the data following the header as a byte slice.
    pub fn data_slice(&self) -> &[u8] {
        &self.0[field::DATA]
    }

    /// Return the data following the header as a mutable byte slice.
    pub fn data_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[field::DATA]
    }
}

impl AsRef<[u8]> for icmpv4 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A high-level representation of the messages this stack consumes or emits.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Repr {
    /// An echo request carrying its identifier and sequence number.
    EchoRequest { ident: u16, seq_no: u16 },
    /// An echo reply carrying its identifier and sequence number.
    EchoReply { ident: u16, seq_no: u16 },
    /// A destination unreachable report.
    DstUnreachable { reason: DstUnreachable },
}

impl Repr {
    /// Parse an ICMPv4 message header into a high-level representation.
    pub fn parse(packet: &icmpv4) -> Result<Repr> {
        packet.check_len()?;

        match (packet.msg_type(), packet.msg_code()) {
            (Message::EchoRequest, 0) => Ok(Repr::EchoRequest {
                ident: packet.echo_ident(),
                seq_no: packet.echo_seq_no(),
            }),
            (Message::EchoReply, 0) => Ok(Repr::EchoReply {
                ident: packet.echo_ident(),
                seq_no: packet.echo_seq_no(),
            }),
            (Message::DstUnreachable, code) => Ok(Repr::DstUnreachable {
                reason: DstUnreachable::from(code),
            }),
            _ => Err(Error::Unrecognized),
        }
    }

    /// Emit the header of a high-level representation into a message.
    ///
    /// The checksum is left zeroed; call [`icmpv4::fill_checksum`] after the
    /// data following the header is in place.
    pub fn emit(&self, packet: &mut icmpv4) {
        packet.set_checksum(0);
        match *self {
            Repr::EchoRequest { ident, seq_no } => {
                packet.set_msg_type(Message::EchoRequest);
                packet.set_msg_code(0);
                packet.set_echo_ident(ident);
                packet.set_echo_seq_no(seq_no);
            }
            Repr::EchoReply { ident, seq_no } => {
                packet.set_msg_type(Message::EchoReply);
                packet.set_msg_code(0);
                packet.set_echo_ident(ident);
                packet.set_echo_seq_no(seq_no);
            }
            Repr::DstUnreachable { reason } => {
                packet.set_msg_type(Message::DstUnreachable);
                packet.set_msg_code(reason.into());
                // The rest-of-header word is unused for this type.
                packet.set_echo_ident(0);
                packet.set_echo_seq_no(0);
            }
        }
    }
}
