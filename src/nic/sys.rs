//! The Linux tap backend.
//!
//! Opens `/dev/net/tun` and attaches to an existing tap interface, reading
//! and writing whole Ethernet frames without the packet-information
//! prefix. The descriptor is opened non-blocking so `receive` fits the
//! polling model of the [`Device`] trait.
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;

use crate::layer::{Error, Result};
use super::Device;

const TUNSETIFF: libc::c_ulong = 0x4004_54ca;
const IFF_TAP: libc::c_short = 0x0002;
const IFF_NO_PI: libc::c_short = 0x1000;

#[repr(C)]
struct Ifreq {
    ifr_name: [u8; libc::IF_NAMESIZE],
    ifr_flags: libc::c_short,
    // The ioctl argument is a union larger than the flags member.
    _pad: [u8; 22],
}

/// A tap interface carrying Ethernet frames through the kernel.
#[derive(Debug)]
pub struct TapDevice {
    file: File,
}

impl TapDevice {
    /// Attach to the tap interface `name`, which must already exist.
    pub fn open(name: &str) -> io::Result<TapDevice> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open("/dev/net/tun")?;

        let mut request = Ifreq {
            ifr_name: [0; libc::IF_NAMESIZE],
            ifr_flags: IFF_TAP | IFF_NO_PI,
            _pad: [0; 22],
        };

        let name = name.as_bytes();
        // Leave room for the terminating nul the kernel expects.
        if name.len() >= libc::IF_NAMESIZE {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        request.ifr_name[..name.len()].copy_from_slice(name);

        // SAFETY: the request struct outlives the call and matches the
        // layout TUNSETIFF reads.
        let status = unsafe {
            libc::ioctl(file.as_raw_fd(), TUNSETIFF as _, &request)
        };
        if status < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(TapDevice { file })
    }
}

impl Device for TapDevice {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        // A tap write either consumes one whole frame or fails.
        match self.file.write(frame) {
            Ok(_) => Ok(()),
            Err(_) => Err(Error::Device),
        }
    }

    fn receive(&mut self, frame: &mut [u8]) -> Result<Option<usize>> {
        match self.file.read(frame) {
            Ok(len) => Ok(Some(len)),
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(_) => Err(Error::Device),
        }
    }
}
