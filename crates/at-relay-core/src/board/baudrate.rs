//! Baud rate reconfiguration
//!
//! The board stores the new rate but keeps using the current one until it
//! is power cycled. Nothing here verifies the switch.

use crate::protocol::{Command, Connection, Result, SerialTransport, Transport};

use super::BoardConfig;

/// Ask the board at `device` to use `new_baud_rate` after its next power cycle
///
/// Opens a short-lived session at `baud_rate`, independent of any
/// [`Board`](super::Board). Returns `true` only when the board echoes
/// `OK+BAUD=<new_baud_rate>`; any other response, including none, is `false`.
///
/// # Errors
/// Returns [`RelayError::Communication`](crate::protocol::RelayError::Communication)
/// if the port cannot be opened.
pub fn configure_baudrate(device: &str, baud_rate: u32, new_baud_rate: u32) -> Result<bool> {
    let timeout = BoardConfig::new(device).timeout();
    let transport = SerialTransport::open(device, baud_rate, timeout)?;
    request_baudrate(transport, new_baud_rate)
}

/// Send the baud rate change over an already opened session, then close it
pub fn request_baudrate<T: Transport>(transport: T, new_baud_rate: u32) -> Result<bool> {
    let command = Command::SetBaudRate(new_baud_rate);
    let mut conn = Connection::new(transport);

    let result = conn.exchange(&command);
    conn.close();
    let response = result?;

    let accepted = command.expected_echo().as_deref() == Some(response.as_str());

    if accepted {
        tracing::info!(new_baud_rate, "baud rate change accepted, power cycle the board");
    } else {
        tracing::warn!(new_baud_rate, "baud rate change not confirmed");
    }
    Ok(accepted)
}
