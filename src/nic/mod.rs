//! The network interface cards or other devices carrying frames.
//!
//! A [`Device`] moves raw Ethernet frames between the stack and some
//! medium. It owns no protocol state; the stack passes it into every
//! operation that touches the wire, so a single interface can be driven
//! over different backends (an in-memory [`Loopback`], a Linux tap
//! device) without changing protocol code.

mod loopback;
#[cfg(feature = "sys")]
pub mod sys;

pub use self::loopback::Loopback;

use crate::layer::Result;

/// A frame-level packet transport.
pub trait Device {
    /// Send one complete frame.
    fn transmit(&mut self, frame: &[u8]) -> Result<()>;

    /// Receive one complete frame into `frame`, without blocking.
    ///
    /// Returns the length of the received frame, or `None` when no frame
    /// is currently queued.
    fn receive(&mut self, frame: &mut [u8]) -> Result<Option<usize>>;
}

impl<D: Device + ?Sized> Device for &mut D {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        (**self).transmit(frame)
    }

    fn receive(&mut self, frame: &mut [u8]) -> Result<Option<usize>> {
        (**self).receive(frame)
    }
}
