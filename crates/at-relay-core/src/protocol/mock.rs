//! Mock relay board for testing
//!
//! Emulates a relay board without hardware. Boards built with
//! [`MockTransport::with_channels`] keep relay state: `AT+CH<c>=<0|1>`
//! switches a relay and `AT+CH<c>=?` reports it. Any other response is
//! scripted as a stub mapping a received command line to the line sent back.
//! Stubs take precedence over the simulated relays.
//!
//! [`MockTransport`] is a cheap handle: clones share one device, so a test
//! can hand one clone to a [`Board`](crate::board::Board) and keep another to
//! edit stubs and inspect what was written.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Channel, Transport, LINE_TERMINATOR};

#[derive(Debug, Default)]
struct MockDevice {
    /// Command line (without terminator) -> response line
    stubs: HashMap<String, String>,
    /// Commands whose response only arrives after the first read timed out
    late: HashSet<String>,
    /// Simulated relays, index 0 is channel 1
    relays: Vec<bool>,
    /// Lines waiting to be read
    pending: VecDeque<Vec<u8>>,
    /// Every frame written, in order
    written: Vec<Vec<u8>>,
    open: bool,
    open_count: usize,
    fail_writes: bool,
    fail_reopen: bool,
}

impl MockDevice {
    fn relay_mut(&mut self, channel: Channel) -> Option<&mut bool> {
        let index = usize::from(channel).checked_sub(1)?;
        self.relays.get_mut(index)
    }

    /// Answer `AT+CH<c>=?|0|1` from the simulated relays
    fn relay_response(&mut self, command: &str) -> Option<String> {
        let (channel, value) = command.strip_prefix("AT+CH")?.split_once('=')?;
        let channel: Channel = channel.parse().ok()?;
        let relay = self.relay_mut(channel)?;
        match value {
            "?" => {}
            "1" => *relay = true,
            "0" => *relay = false,
            _ => return None,
        }
        Some(format!("OK+CH{}={}", channel, u8::from(*relay)))
    }
}

/// In-memory stand-in for a relay board session
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    device: Arc<Mutex<MockDevice>>,
}

impl MockTransport {
    /// Create an open session with no stubs
    pub fn new() -> Self {
        let mock = Self::default();
        {
            let mut device = mock.device();
            device.open = true;
            device.open_count = 1;
        }
        mock
    }

    /// Create a board that answers the liveness check, reports `num_channels`
    /// and simulates that many relays, all off
    pub fn with_channels(num_channels: Channel) -> Self {
        let mock = Self::new();
        mock.stub("AT", "OK");
        mock.stub("AT+NUM=?", format!("OK+NUM={}", num_channels));
        mock.device().relays = vec![false; usize::from(num_channels)];
        mock
    }

    fn device(&self) -> MutexGuard<'_, MockDevice> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer `command` with `response`, replacing any earlier stub
    pub fn stub(&self, command: impl Into<String>, response: impl Into<String>) {
        self.device().stubs.insert(command.into(), response.into());
    }

    /// Deliver the response to `command` one read late, as a slow board would
    pub fn stub_late(&self, command: impl Into<String>, response: impl Into<String>) {
        let command = command.into();
        let mut device = self.device();
        device.late.insert(command.clone());
        device.stubs.insert(command, response.into());
    }

    /// Switch a simulated relay behind the driver's back
    pub fn set_relay(&self, channel: Channel, state: bool) {
        if let Some(relay) = self.device().relay_mut(channel) {
            *relay = state;
        }
    }

    /// State of a simulated relay, `None` outside the simulated channels
    pub fn relay(&self, channel: Channel) -> Option<bool> {
        self.device().relay_mut(channel).map(|relay| *relay)
    }

    /// Remove the stub for `command`; the device stays silent for it
    pub fn remove_stub(&self, command: &str) {
        self.device().stubs.remove(command);
    }

    /// Every frame written so far, decoded and without terminator
    pub fn written_lines(&self) -> Vec<String> {
        self.device()
            .written
            .iter()
            .map(|frame| String::from_utf8_lossy(frame).trim_end().to_string())
            .collect()
    }

    /// Forget the write log
    pub fn clear_written(&self) {
        self.device().written.clear();
    }

    /// Number of times the session was opened
    pub fn open_count(&self) -> usize {
        self.device().open_count
    }

    /// Simulate the device disappearing, e.g. a USB unplug
    pub fn disconnect(&self) {
        let mut device = self.device();
        device.open = false;
        device.pending.clear();
    }

    /// Make every write fail with a broken pipe
    pub fn set_fail_writes(&self, fail: bool) {
        self.device().fail_writes = fail;
    }

    /// Make reopening the session fail
    pub fn set_fail_reopen(&self, fail: bool) {
        self.device().fail_reopen = fail;
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut device = self.device();
        if !device.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "mock is closed"));
        }
        if device.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
        }

        device.written.push(data.to_vec());

        let line = String::from_utf8_lossy(data);
        let command = line.trim_end_matches(LINE_TERMINATOR).trim_end();
        let stubbed = device.stubs.get(command).cloned();
        let response = stubbed.or_else(|| device.relay_response(command));
        if let Some(response) = response {
            if device.late.contains(command) {
                device.pending.push_back(Vec::new());
            }
            let mut frame = response.into_bytes();
            frame.extend_from_slice(LINE_TERMINATOR.as_bytes());
            device.pending.push_back(frame);
        }
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut device = self.device();
        if !device.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "mock is closed"));
        }
        Ok(device.pending.pop_front().unwrap_or_default())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.device().pending.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.device().open
    }

    fn reopen(&mut self) -> io::Result<()> {
        let mut device = self.device();
        if device.fail_reopen {
            return Err(io::Error::new(io::ErrorKind::NotFound, "mock device missing"));
        }
        if !device.open {
            device.open = true;
            device.open_count += 1;
        }
        Ok(())
    }

    fn close(&mut self) {
        let mut device = self.device();
        device.open = false;
        device.pending.clear();
    }
}
