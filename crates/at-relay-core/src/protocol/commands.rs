//! Protocol commands
//!
//! Defines the AT commands understood by relay boards.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::SUCCESS_PREFIX;

/// Relay channel number, valid range is `1..=num_channels`
pub type Channel = u16;

/// AT commands for relay board communication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Liveness check (`AT`)
    Identify,

    /// Query number of channels (`AT+NUM=?`)
    GetChannelCount,

    /// Read one channel (`AT+CH<c>=?`)
    GetChannel(Channel),

    /// Switch one channel (`AT+CH<c>=<0|1>`)
    SetChannel(Channel, bool),

    /// Query firmware version (`AT+VER=?`)
    GetVersion,

    /// Change the baud rate, effective after a power cycle (`AT+BAUD=<n>`)
    SetBaudRate(u32),
}

impl Command {
    /// Command key, the part of the frame before `=`
    pub fn key(&self) -> String {
        match self {
            Command::Identify => "AT".to_string(),
            Command::GetChannelCount => "AT+NUM".to_string(),
            Command::GetChannel(channel) | Command::SetChannel(channel, _) => {
                format!("AT+CH{}", channel)
            }
            Command::GetVersion => "AT+VER".to_string(),
            Command::SetBaudRate(_) => "AT+BAUD".to_string(),
        }
    }

    /// Payload after `=`, if the command has one
    pub fn payload(&self) -> Option<String> {
        match self {
            Command::Identify => None,
            Command::GetChannelCount | Command::GetChannel(_) | Command::GetVersion => {
                Some("?".to_string())
            }
            Command::SetChannel(_, state) => Some(if *state { "1" } else { "0" }.to_string()),
            Command::SetBaudRate(baud) => Some(baud.to_string()),
        }
    }

    /// Full uppercase command line without terminator
    pub fn frame(&self) -> String {
        let mut line = self.key();
        if let Some(payload) = self.payload() {
            line.push('=');
            line.push_str(&payload);
        }
        line.to_ascii_uppercase()
    }

    /// Key a success response must start with (`AT+CH1` -> `OK+CH1`)
    ///
    /// `None` for the liveness check and version query, whose responses
    /// do not follow the `OK+` grammar.
    pub fn echo_key(&self) -> Option<String> {
        if !self.requires_success_prefix() {
            return None;
        }
        self.key()
            .strip_prefix("AT+")
            .map(|rest| format!("{}{}", SUCCESS_PREFIX, rest))
    }

    /// Exact response expected for commands that echo their payload
    ///
    /// A write echoes the new value back, e.g. `AT+BAUD=115200` -> `OK+BAUD=115200`.
    pub fn expected_echo(&self) -> Option<String> {
        match self {
            Command::SetChannel(..) | Command::SetBaudRate(_) => {
                let key = self.echo_key()?;
                let payload = self.payload()?;
                Some(format!("{}={}", key, payload))
            }
            _ => None,
        }
    }

    /// Whether the response must begin with `OK+` to count as success
    pub fn requires_success_prefix(&self) -> bool {
        !matches!(self, Command::Identify | Command::GetVersion)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.frame())
    }
}
