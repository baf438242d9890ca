//! The packet buffer shared by all layers.
use core::fmt;

/// Error raised when a cursor would leave the fixed allocation.
///
/// The buffer never reallocates and never corrupts neighboring data; a
/// request for more room than was reserved is reported here instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Prepending would move the data start before the allocation.
    NoHeadroom,
    /// Appending would move the data end past the allocation.
    NoTailroom,
    /// Stripping or truncating more bytes than the payload holds.
    Exhausted,
}

/// Result type of buffer cursor operations.
pub type Result<T> = core::result::Result<T, Error>;

/// A fixed-capacity byte region with two movable cursors.
///
/// The payload is the region between `begin` and `end` inside one owned
/// allocation. Headers are added by moving `begin` backwards into reserved
/// headroom and removed by moving it forwards again; the bytes themselves
/// never move. That makes a strip followed by a prepend of the same size an
/// exact inverse, which the IP layer relies on to restore a stripped header
/// before building an ICMP unreachable message.
#[derive(Clone, PartialEq, Eq)]
pub struct PacketBuffer {
    storage: Box<[u8]>,
    begin: usize,
    end: usize,
}

impl PacketBuffer {
    /// Allocate a buffer holding `len` zeroed payload bytes.
    ///
    /// `headroom` bytes before the payload are reserved for headers
    /// prepended later; tailroom is whatever `tailroom` reserves beyond the
    /// payload (link-layer padding needs a little).
    pub fn alloc(headroom: usize, len: usize, tailroom: usize) -> Self {
        PacketBuffer {
            storage: vec![0; headroom + len + tailroom].into_boxed_slice(),
            begin: headroom,
            end: headroom + len,
        }
    }

    /// Wrap a received frame, copying it into an owned allocation.
    ///
    /// Inbound buffers only ever shrink (headers are stripped, padding is
    /// trimmed) until an unreachable reply restores what was stripped, so no
    /// extra room is reserved.
    pub fn from_frame(frame: &[u8]) -> Self {
        PacketBuffer {
            storage: frame.to_vec().into_boxed_slice(),
            begin: 0,
            end: frame.len(),
        }
    }

    /// The current payload length.
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Bytes available for prepending.
    pub fn headroom(&self) -> usize {
        self.begin
    }

    /// Bytes available for appending.
    pub fn tailroom(&self) -> usize {
        self.storage.len() - self.end
    }

    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.storage[self.begin..self.end]
    }

    /// The payload bytes, mutably.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.begin..self.end]
    }

    /// Grow the payload by `size` bytes at the front.
    ///
    /// Returns the new front region. Bytes previously stripped from the
    /// front reappear unchanged; room beyond that is whatever the headroom
    /// held before, so callers overwrite it.
    pub fn prepend(&mut self, size: usize) -> Result<&mut [u8]> {
        if size > self.begin {
            return Err(Error::NoHeadroom);
        }

        self.begin -= size;
        Ok(&mut self.storage[self.begin..self.begin + size])
    }

    /// Remove `size` bytes from the front of the payload.
    ///
    /// The bytes stay in the allocation and can be re-exposed by `prepend`.
    pub fn strip(&mut self, size: usize) -> Result<()> {
        if size > self.len() {
            return Err(Error::Exhausted);
        }

        self.begin += size;
        Ok(())
    }

    /// Grow the payload by `size` zeroed bytes at the tail.
    pub fn append(&mut self, size: usize) -> Result<&mut [u8]> {
        if size > self.tailroom() {
            return Err(Error::NoTailroom);
        }

        let start = self.end;
        self.end += size;
        for byte in &mut self.storage[start..self.end] {
            *byte = 0;
        }
        Ok(&mut self.storage[start..self.end])
    }

    /// Shrink the payload to `len` bytes, dropping bytes from the tail.
    pub fn truncate(&mut self, len: usize) -> Result<()> {
        if len > self.len() {
            return Err(Error::Exhausted);
        }

        self.end = self.begin + len;
        Ok(())
    }
}

impl fmt::Debug for PacketBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PacketBuffer")
            .field("headroom", &self.headroom())
            .field("len", &self.len())
            .field("tailroom", &self.tailroom())
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Error::NoHeadroom => "headroom exhausted",
            Error::NoTailroom => "tailroom exhausted",
            Error::Exhausted => "payload exhausted",
        })
    }
}
