//! # AT Relay Core Library
//!
//! Driver for serial-attached relay boards that speak a line-based AT command set.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - AT command framing and response parsing
//! - A half-duplex command/response driver with reconnect-on-drop
//! - A board model with channel discovery and on/off/toggle helpers
//! - Baud rate reconfiguration
//!
//! ## Wire protocol
//!
//! | operation            | frame            | success response   |
//! |----------------------|------------------|--------------------|
//! | liveness check       | `AT`             | `OK`               |
//! | channel count query  | `AT+NUM=?`       | `OK+NUM=<n>`       |
//! | channel state read   | `AT+CH<c>=?`     | `OK+CH<c>=<0\|1>`  |
//! | channel state write  | `AT+CH<c>=<0\|1>`| `OK+CH<c>=<0\|1>`  |
//! | firmware version     | `AT+VER=?`       | any non-empty line |
//! | baud rate change     | `AT+BAUD=<n>`    | `OK+BAUD=<n>`      |
//!
//! Every frame is terminated by CRLF.
//!
//! ## Example
//!
//! ```rust,ignore
//! use at_relay_core::prelude::*;
//!
//! let mut board = Board::connect(BoardConfig::new("/dev/ttyACM0").with_initial_state(false))?;
//! board.on(1)?;
//! let now_on = board.toggle(2)?;
//! println!("firmware: {}", board.version()?);
//! board.close();
//! ```

pub mod board;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::board::{configure_baudrate, Board, BoardConfig, ConnectionState};
    pub use crate::protocol::{
        Channel, Command, Connection, ErrorKind, MockTransport, RelayError, SerialTransport,
        Transport,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
