//! The internet layer.
mod endpoint;

pub use self::endpoint::{Endpoint, Sender};
