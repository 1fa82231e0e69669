//! AT Command Protocol
//!
//! Implements the line-based AT command protocol spoken by serial relay boards.
//!
//! Commands are uppercase ASCII lines terminated by CRLF. Every command gets
//! exactly one response line; there is no pipelining.

pub mod codec;
pub mod commands;
mod connection;
mod error;
pub mod mock;
pub mod serial;

pub use commands::{Channel, Command};
pub use connection::{Connection, TrafficCounters};
pub use error::{ErrorKind, RelayError, Result};
pub use mock::MockTransport;
pub use serial::{SerialTransport, Transport};

/// Default baud rate for relay board communication
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default timeout for a single response line in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Maximum accepted response line length
pub const MAX_LINE_LENGTH: usize = 256;

/// Prefix of every well-formed success response
pub const SUCCESS_PREFIX: &str = "OK+";

/// Exact response to the bare `AT` liveness check
pub const LIVENESS_RESPONSE: &str = "OK";

/// Frame terminator
pub const LINE_TERMINATOR: &str = "\r\n";
