//! Relay board model
//!
//! A [`Board`] owns one transport session to a relay board. Construction runs
//! the full connect sequence and only returns a board that passed it:
//!
//! 1. open the transport at the configured baud rate
//! 2. liveness check, the board must answer `AT` with exactly `OK`
//! 3. channel count query, unless the count was configured
//! 4. read every channel, pushing the initial state if one was configured
//!
//! Any failing step aborts construction and closes the transport.

mod baudrate;
mod config;

pub use baudrate::{configure_baudrate, request_baudrate};
pub use config::BoardConfig;

use serde::{Deserialize, Serialize};

use crate::protocol::{
    codec, Channel, Command, Connection, ErrorKind, RelayError, Result, SerialTransport,
    TrafficCounters, Transport, LIVENESS_RESPONSE,
};

/// Connection state of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Transport session is closed
    Disconnected,
    /// Transport open, liveness not yet checked
    Unverified,
    /// Board answered the liveness check
    Verified,
    /// Channel count known and validated
    Ready,
}

/// Relay board controlled via AT commands
///
/// All methods take `&mut self`; one board runs one command at a time.
pub struct Board<T: Transport = SerialTransport> {
    conn: Connection<T>,
    device: String,
    baud_rate: u32,
    num_channels: Channel,
    state: ConnectionState,
}

impl Board<SerialTransport> {
    /// Open the serial device in `config` and run the connect sequence
    ///
    /// # Errors
    /// - [`RelayError::Communication`] if the port cannot be opened or the
    ///   liveness check fails
    /// - [`RelayError::ChannelCountMismatch`] if fewer channels respond than
    ///   configured or reported
    pub fn connect(config: BoardConfig) -> Result<Self> {
        let transport = SerialTransport::open(&config.device, config.baud_rate, config.timeout())?;
        Self::with_transport(transport, &config)
    }
}

impl<T: Transport> Board<T> {
    /// Run the connect sequence over an already opened transport
    ///
    /// `config.device` and `config.baud_rate` are recorded for reporting only.
    pub fn with_transport(transport: T, config: &BoardConfig) -> Result<Self> {
        let mut board = Self {
            conn: Connection::new(transport),
            device: config.device.clone(),
            baud_rate: config.baud_rate,
            num_channels: config.num_channels.unwrap_or(0),
            state: ConnectionState::Unverified,
        };

        board.check_liveness()?;
        board.set_connection_state(ConnectionState::Verified);

        if config.num_channels.is_none() {
            board.num_channels = board.discover_channel_count()?;
        }

        board.validate_channels(config.initial_state)?;
        board.set_connection_state(ConnectionState::Ready);

        tracing::info!(
            device = %board.device,
            num_channels = board.num_channels,
            "relay board ready"
        );
        Ok(board)
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        tracing::debug!(device = %self.device, from = ?self.state, to = ?state, "board state");
        self.state = state;
    }

    fn check_liveness(&mut self) -> Result<()> {
        let response = self.conn.send(&Command::Identify)?;
        if response != LIVENESS_RESPONSE {
            return Err(RelayError::Communication(format!(
                "{} answered {:?} to AT",
                self.device, response
            )));
        }
        Ok(())
    }

    /// Ask the board for its channel count, assuming 1 if it cannot say
    fn discover_channel_count(&mut self) -> Result<Channel> {
        match self.conn.send(&Command::GetChannelCount) {
            Ok(line) => codec::decode_channel_count(&line),
            Err(e) if e.kind() == ErrorKind::CommandFailure => {
                tracing::warn!(
                    device = %self.device,
                    response = ?e.response(),
                    "board cannot report its channel count, assuming 1"
                );
                Ok(1)
            }
            Err(e) => Err(e),
        }
    }

    /// Read every channel and push `initial_state` to each one that answers
    fn validate_channels(&mut self, initial_state: Option<bool>) -> Result<()> {
        for channel in 1..=self.num_channels {
            let mut result = self.get_state(channel).map(|_| ());
            if result.is_ok() {
                if let Some(state) = initial_state {
                    result = self.set_state(channel, state);
                }
            }

            if let Err(e) = result {
                tracing::warn!(device = %self.device, channel, error = %e, "channel validation failed");
                return Err(RelayError::ChannelCountMismatch {
                    requested: self.num_channels,
                    actual: channel - 1,
                });
            }
        }
        Ok(())
    }

    fn check_channel(&self, channel: Channel) -> Result<()> {
        if channel == 0 || channel > self.num_channels {
            return Err(RelayError::InvalidChannel {
                channel,
                num_channels: self.num_channels,
            });
        }
        Ok(())
    }

    /// Check if the board answers the liveness check
    pub fn communication_ok(&mut self) -> bool {
        self.check_liveness().is_ok()
    }

    /// Number of relay channels on the board
    pub fn num_channels(&self) -> Channel {
        self.num_channels
    }

    /// Device path the board was opened on
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Baud rate the board was opened with
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Current connection state
    ///
    /// A board whose transport dropped reports `Disconnected` until the next
    /// command reconnects it.
    pub fn state(&self) -> ConnectionState {
        if self.conn.is_open() {
            self.state
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Traffic counters of the underlying connection
    pub fn counters(&self) -> TrafficCounters {
        self.conn.counters()
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        self.conn.transport()
    }

    /// Read the state of a relay
    pub fn get_state(&mut self, channel: Channel) -> Result<bool> {
        self.check_channel(channel)?;

        let command = Command::GetChannel(channel);
        let line = self.conn.send(&command)?;
        codec::decode_channel_state(&command, &line)
    }

    /// Switch a relay on or off
    pub fn set_state(&mut self, channel: Channel, state: bool) -> Result<()> {
        self.check_channel(channel)?;

        let command = Command::SetChannel(channel, state);
        let line = self.conn.send(&command)?;
        codec::decode_channel_state(&command, &line)?;
        Ok(())
    }

    /// Switch on a relay
    pub fn on(&mut self, channel: Channel) -> Result<()> {
        self.set_state(channel, true)
    }

    /// Switch off a relay
    pub fn off(&mut self, channel: Channel) -> Result<()> {
        self.set_state(channel, false)
    }

    /// Invert a relay and return its new state
    ///
    /// Reads then writes; a change made by someone else in between is lost.
    pub fn toggle(&mut self, channel: Channel) -> Result<bool> {
        let new_state = !self.get_state(channel)?;
        self.set_state(channel, new_state)?;
        Ok(new_state)
    }

    /// Firmware version string
    ///
    /// # Errors
    /// [`RelayError::CommandFailed`] if the board sends an empty line.
    pub fn version(&mut self) -> Result<String> {
        let command = Command::GetVersion;
        let response = self.conn.send(&command)?;
        if response.is_empty() {
            return Err(RelayError::command_failed(command.frame(), response));
        }
        Ok(response)
    }

    /// Close the transport session
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.state != ConnectionState::Disconnected {
            self.conn.close();
            self.state = ConnectionState::Disconnected;
            tracing::info!(device = %self.device, "relay board closed");
        }
    }
}

impl<T: Transport> Drop for Board<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MockTransport;
    use pretty_assertions::assert_eq;

    fn board(mock: &MockTransport) -> Board<MockTransport> {
        Board::with_transport(mock.clone(), &BoardConfig::new("mock")).unwrap()
    }

    #[test]
    fn test_connect_sequence_frames() {
        let mock = MockTransport::with_channels(2);
        let board = board(&mock);

        assert_eq!(board.num_channels(), 2);
        assert_eq!(board.state(), ConnectionState::Ready);
        assert_eq!(
            mock.written_lines(),
            vec!["AT", "AT+NUM=?", "AT+CH1=?", "AT+CH2=?"]
        );
    }

    #[test]
    fn test_initial_state_pushed_in_order() {
        let mock = MockTransport::with_channels(2);
        let config = BoardConfig::new("mock").with_initial_state(true);
        let _board = Board::with_transport(mock.clone(), &config).unwrap();

        assert_eq!(
            mock.written_lines(),
            vec!["AT", "AT+NUM=?", "AT+CH1=?", "AT+CH1=1", "AT+CH2=?", "AT+CH2=1"]
        );
    }

    #[test]
    fn test_configured_count_skips_discovery() {
        let mock = MockTransport::with_channels(4);
        let config = BoardConfig::new("mock").with_num_channels(2);
        let board = Board::with_transport(mock.clone(), &config).unwrap();

        assert_eq!(board.num_channels(), 2);
        assert!(!mock.written_lines().contains(&"AT+NUM=?".to_string()));
    }

    #[test]
    fn test_invalid_channel_writes_nothing() {
        let mock = MockTransport::with_channels(1);
        let mut board = board(&mock);
        mock.clear_written();

        assert!(matches!(
            board.get_state(0),
            Err(RelayError::InvalidChannel { channel: 0, .. })
        ));
        assert!(matches!(
            board.set_state(2, true),
            Err(RelayError::InvalidChannel {
                channel: 2,
                num_channels: 1
            })
        ));
        assert!(mock.written_lines().is_empty());
    }

    #[test]
    fn test_failed_construction_closes_transport() {
        let mock = MockTransport::new();
        mock.stub("AT", "FOO");

        let result = Board::with_transport(mock.clone(), &BoardConfig::new("mock"));
        assert!(matches!(result, Err(RelayError::Communication(_))));
        assert!(!mock.is_open());
    }

    #[test]
    fn test_close_releases_transport() {
        let mock = MockTransport::with_channels(1);
        let board = board(&mock);

        board.close();
        assert!(!mock.is_open());
        assert_eq!(mock.open_count(), 1);
    }

    #[test]
    fn test_state_reports_dropped_session() {
        let mock = MockTransport::with_channels(1);
        let mut board = board(&mock);

        mock.disconnect();
        assert_eq!(board.state(), ConnectionState::Disconnected);

        assert!(!board.get_state(1).unwrap());
        assert_eq!(board.state(), ConnectionState::Ready);
        assert_eq!(board.counters().reconnects, 1);
    }

    #[test]
    fn test_communication_ok() {
        let mock = MockTransport::with_channels(1);
        let mut board = board(&mock);
        assert!(board.communication_ok());

        mock.remove_stub("AT");
        assert!(!board.communication_ok());
    }

    #[test]
    fn test_late_version_reply_is_not_mistaken_for_liveness() {
        let mock = MockTransport::with_channels(1);
        mock.stub_late("AT+VER=?", "OK");
        let mut board = board(&mock);

        assert!(board.version().is_err());
        assert!(board.communication_ok());
        assert!(!board.get_state(1).unwrap());
    }
}
