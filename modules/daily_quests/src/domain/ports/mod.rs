pub mod mail;

pub use mail::{EmailTransport, OutboundEmail, TransportError};
