//! The Ethernet framing layer.
mod endpoint;

pub use self::endpoint::Endpoint;
