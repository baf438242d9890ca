use std::collections::VecDeque;

use crate::layer::{Error, Result};
use super::Device;

/// A software device delivering transmitted frames back for reception.
#[derive(Debug, Default)]
pub struct Loopback {
    queue: VecDeque<Vec<u8>>,
}

impl Loopback {
    /// Create a loopback device with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of frames waiting to be received.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl Device for Loopback {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        self.queue.push_back(frame.to_vec());
        Ok(())
    }

    fn receive(&mut self, frame: &mut [u8]) -> Result<Option<usize>> {
        match self.queue.pop_front() {
            Some(data) => {
                if data.len() > frame.len() {
                    return Err(Error::Exhausted);
                }
                frame[..data.len()].copy_from_slice(&data);
                Ok(Some(data.len()))
            }
            None => Ok(None),
        }
    }
}
