//! Time structures.
//!
//! The stack never reads a clock. Every operation that touches expiring
//! state takes an [`Instant`] supplied by the caller, and expiry is
//! evaluated lazily at lookup time against that timestamp.
use core::{fmt, ops};

/// A relative amount of time, in milliseconds.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct Duration {
    millis: u64,
}

/// An absolute point in time, in milliseconds since an arbitrary epoch.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct Instant {
    millis: i64,
}

/// The expiry of a table entry.
///
/// Entries without a timestamp never expire, which orders them after every
/// finite expiry point.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Expiration {
    /// Expires at a point in time.
    When(Instant),
    /// Does not ever expire.
    Never,
}

impl Duration {
    /// Create a duration from milliseconds.
    pub const fn from_millis(millis: u64) -> Duration {
        Duration { millis }
    }

    /// Create a duration from seconds.
    pub const fn from_secs(secs: u64) -> Duration {
        Duration { millis: secs * 1000 }
    }

    /// The duration as milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.millis
    }
}

impl Instant {
    /// Create an instant from milliseconds since the epoch.
    pub const fn from_millis(millis: i64) -> Instant {
        Instant { millis }
    }

    /// Create an instant from seconds since the epoch.
    pub const fn from_secs(secs: i64) -> Instant {
        Instant { millis: secs * 1000 }
    }

    /// The instant as milliseconds since the epoch.
    pub const fn as_millis(&self) -> i64 {
        self.millis
    }

    /// The current time according to the system clock.
    pub fn now() -> Instant {
        Self::from(std::time::SystemTime::now())
    }
}

impl From<std::time::SystemTime> for Instant {
    fn from(other: std::time::SystemTime) -> Instant {
        let elapsed = other.duration_since(std::time::UNIX_EPOCH)
            .expect("clock predates unix epoch");
        Instant::from_millis(elapsed.as_millis() as i64)
    }
}

impl ops::Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant::from_millis(self.millis + rhs.millis as i64)
    }
}

impl ops::Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, rhs: Duration) -> Instant {
        Instant::from_millis(self.millis - rhs.millis as i64)
    }
}

impl ops::Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Duration {
        debug_assert!(self.millis >= rhs.millis);
        Duration::from_millis((self.millis - rhs.millis) as u64)
    }
}

impl Expiration {
    /// Whether the expiry has passed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self {
            Expiration::When(at) => *at <= now,
            Expiration::Never => false,
        }
    }
}

impl Default for Expiration {
    fn default() -> Self {
        Expiration::Never
    }
}

impl From<Option<Instant>> for Expiration {
    fn from(when: Option<Instant>) -> Self {
        match when {
            Some(at) => Expiration::When(at),
            None => Expiration::Never,
        }
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:03}s", self.millis / 1000, self.millis % 1000)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:03}s", self.millis / 1000, self.millis % 1000)
    }
}
