//! Board configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::protocol::{Channel, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Constructor-time configuration of a [`Board`](super::Board)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Serial device path (e.g. "/dev/ttyACM0" or "COM3")
    pub device: String,
    /// Channel count, queried from the board when `None`
    #[serde(default)]
    pub num_channels: Option<Channel>,
    /// Baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// State pushed to every channel after validation
    #[serde(default)]
    pub initial_state: Option<bool>,
    /// Response timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            num_channels: None,
            baud_rate: DEFAULT_BAUD_RATE,
            initial_state: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl BoardConfig {
    /// Configuration for `device` with defaults for everything else
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    /// Use a fixed channel count instead of querying the board
    pub fn with_num_channels(mut self, num_channels: Channel) -> Self {
        self.num_channels = Some(num_channels);
        self
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Switch every channel to `state` during construction
    pub fn with_initial_state(mut self, state: bool) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the response timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Response timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
