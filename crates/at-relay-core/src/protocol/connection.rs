//! Connection management
//!
//! Owns the transport session and runs one command/response exchange at a time.

use serde::Serialize;

use super::codec::{self, Response};
use super::{Command, RelayError, Result, Transport};

/// Cumulative traffic counters for one connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrafficCounters {
    /// Command frames written
    pub frames_sent: u64,
    /// Non-empty response lines received
    pub frames_received: u64,
    /// Exchanges whose write or read failed at the transport level
    pub failed_exchanges: u64,
    /// Successful reopens of a dropped session
    pub reconnects: u64,
}

/// Half-duplex AT command driver
///
/// Methods take `&mut self`, so a connection can only have one command in
/// flight. Sharing one between threads needs external locking.
pub struct Connection<T: Transport> {
    transport: T,
    counters: TrafficCounters,
}

impl<T: Transport> Connection<T> {
    /// Wrap an open transport session
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            counters: TrafficCounters::default(),
        }
    }

    /// Get cumulative traffic counters
    pub fn counters(&self) -> TrafficCounters {
        self.counters
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Check if the transport session is open
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Close the transport session. Safe to call more than once.
    pub fn close(&mut self) {
        self.transport.close();
    }

    /// Reopen the session if it was dropped
    fn ensure_open(&mut self) -> Result<()> {
        if self.transport.is_open() {
            return Ok(());
        }

        tracing::warn!("transport closed, reconnecting");
        self.transport
            .reopen()
            .map_err(|e| RelayError::Communication(format!("reconnect failed: {}", e)))?;
        self.counters.reconnects = self.counters.reconnects.saturating_add(1);
        Ok(())
    }

    /// Send a command and return the raw response line
    ///
    /// Unread input, such as a reply that arrived after an earlier timeout,
    /// is discarded before the write so every response matches its command.
    /// Transport failures during the write or read are logged and yield an
    /// empty line. Only a failed reconnect is reported as an error.
    pub fn exchange(&mut self, command: &Command) -> Result<String> {
        self.ensure_open()?;

        if let Err(e) = self.transport.discard_input() {
            tracing::debug!(error = %e, "could not discard stale input");
        }

        let frame = codec::encode(command);
        tracing::debug!(command = %command, "tx");

        let raw = match self.transport.write_all(&frame) {
            Ok(()) => {
                self.counters.frames_sent = self.counters.frames_sent.saturating_add(1);
                self.transport.read_line()
            }
            Err(e) => Err(e),
        };

        let response = match raw {
            Ok(bytes) => codec::decode_line(&bytes),
            Err(e) => {
                tracing::warn!(command = %command, error = %e, "transport error, treating response as empty");
                self.counters.failed_exchanges = self.counters.failed_exchanges.saturating_add(1);
                String::new()
            }
        };

        if !response.is_empty() {
            self.counters.frames_received = self.counters.frames_received.saturating_add(1);
        }
        tracing::debug!(command = %command, response = %response, "rx");

        Ok(response)
    }

    /// Send a command and check the response grammar
    ///
    /// Commands that [require the success prefix](Command::requires_success_prefix)
    /// fail with [`RelayError::CommandFailed`] unless the response starts
    /// with `OK+`. The liveness check and version query return the raw line.
    pub fn send(&mut self, command: &Command) -> Result<String> {
        let response = self.exchange(command)?;

        if command.requires_success_prefix() && !Response::parse(&response).is_success() {
            return Err(RelayError::command_failed(command.frame(), response));
        }

        Ok(response)
    }
}
