//! Byte storage underlying the packet pipeline.
mod buffer;

pub use self::buffer::{Error, PacketBuffer, Result};
