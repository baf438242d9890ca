//! The protocol layers and the state each of them owns.
//!
//! Every layer is an *endpoint*: a struct holding exactly the state that
//! protocol needs and methods that consume or produce packet buffers. The
//! endpoints do not reference each other; calls thread the lower endpoints
//! through explicitly, so all state stays inside the owning
//! [`Interface`](crate::iface::Interface) and tests can wire layers up in
//! isolation.
//!
//! Inbound errors almost always mean "drop the packet": the sender of a
//! truncated or semantically broken packet cannot reliably be identified,
//! so no reply is generated and the error only surfaces to the caller of
//! `poll` as a drop. The exception is a well-formed packet nobody consumes,
//! which earns an ICMP unreachable reply.

pub mod arp;
pub mod eth;
pub mod icmp;
pub mod ip;
pub mod udp;

use core::fmt;

use crate::storage;
use crate::wire;

/// The error type of layer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The packet is shorter than its format requires.
    Truncated,
    /// The packet contradicts itself or the protocol's fixed fields.
    Malformed,
    /// A checksum did not cover the content.
    WrongChecksum,
    /// The packet is not addressed to this host.
    NotOurs,
    /// No handler consumes the packet's protocol or port.
    Unhandled,
    /// A buffer or table ran out of reserved space.
    Exhausted,
    /// The device could not transmit or receive.
    Device,
}

/// The result type of layer operations.
pub type Result<T> = core::result::Result<T, Error>;

impl From<wire::Error> for Error {
    fn from(error: wire::Error) -> Error {
        match error {
            wire::Error::Truncated => Error::Truncated,
            wire::Error::Malformed => Error::Malformed,
            wire::Error::Unrecognized => Error::Malformed,
            wire::Error::WrongChecksum => Error::WrongChecksum,
        }
    }
}

impl From<storage::Error> for Error {
    fn from(_: storage::Error) -> Error {
        Error::Exhausted
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Error::Truncated => "truncated packet",
            Error::Malformed => "malformed packet",
            Error::WrongChecksum => "wrong checksum",
            Error::NotOurs => "not addressed to this host",
            Error::Unhandled => "no handler registered",
            Error::Exhausted => "out of reserved space",
            Error::Device => "device error",
        })
    }
}
