/*! Low-level packet access and construction.

Each protocol module provides two levels of functionality:

 * A lowercase, dynamically sized byte wrapper (e.g. [`ethernet_frame`],
   [`udp_packet`]) with field accessors and setters over a raw octet
   sequence. After `check_len()` returned `Ok(())` no accessor panics.
 * A compact `Repr` struct or enum that can be parsed from and emitted into
   such a wrapper, validating the fixed fields a conforming packet must
   carry.

When parsing untrusted input it is necessary to use the `new_checked`
constructors; when emitting into a reused buffer it is necessary *not* to,
since stale bytes may fail validation nondeterministically.

[`ethernet_frame`]: struct.ethernet_frame.html
[`udp_packet`]: struct.udp_packet.html
*/

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
    pub(crate) type Rest  = ::core::ops::RangeFrom<usize>;
}

pub mod arp;
pub mod ethernet;
pub mod icmpv4;
pub mod ipv4;
pub mod udp;

use core::fmt;

/// A parsing error of some wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The buffer is shorter than the format requires.
    Truncated,
    /// A length field contradicts the actual octets.
    Malformed,
    /// A fixed field does not hold the value the protocol assigns.
    Unrecognized,
    /// The checksum does not cover the content.
    WrongChecksum,
}

/// The result type of wire parsing.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Error::Truncated => "truncated packet",
            Error::Malformed => "malformed length",
            Error::Unrecognized => "unrecognized field value",
            Error::WrongChecksum => "wrong checksum",
        })
    }
}

pub use self::ethernet::{
    ethernet as ethernet_frame,
    Address as EthernetAddress,
    EtherType as EthernetProtocol,
    Repr as EthernetRepr};

pub use self::arp::{
    arp as arp_packet,
    Hardware as ArpHardware,
    Operation as ArpOperation,
    Repr as ArpRepr};

pub use self::ipv4::{
    ipv4 as ipv4_packet,
    checksum,
    Address as Ipv4Address,
    Protocol as IpProtocol,
    Repr as Ipv4Repr};

pub use self::icmpv4::{
    icmpv4 as icmpv4_packet,
    DstUnreachable as Icmpv4DstUnreachable,
    Message as Icmpv4Message,
    Repr as Icmpv4Repr};

pub use self::udp::{
    udp as udp_packet,
    Repr as UdpRepr};
