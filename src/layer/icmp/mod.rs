//! The control message layer.
mod endpoint;

pub use self::endpoint::Endpoint;
