//! Protocol errors

use thiserror::Error;

use super::Channel;

/// Errors that can occur while talking to a relay board
#[derive(Error, Debug)]
pub enum RelayError {
    /// The board did not pass the liveness check or the port could not be opened
    #[error("Cannot communicate with relay board: {0}")]
    Communication(String),

    /// Fewer channels answered than were requested
    #[error("Invalid number of channels: requested {requested}, relay reports only {actual} channels")]
    ChannelCountMismatch {
        /// Channel count the board was constructed with
        requested: Channel,
        /// Number of channels that actually responded
        actual: Channel,
    },

    /// A command got an empty, malformed or rejected response
    #[error("Command {command} failed, response from relay: {response:?}")]
    CommandFailed {
        /// Command line that was sent, without terminator
        command: String,
        /// Raw response line, empty on timeout or transport failure
        response: String,
    },

    /// Channel number outside `1..=num_channels`
    #[error("Invalid channel number {channel} (board has {num_channels} channels)")]
    InvalidChannel {
        /// Requested channel
        channel: Channel,
        /// Channel count of the board
        num_channels: Channel,
    },
}

/// Classification of a [`RelayError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Liveness check or port open failed
    Communication,
    /// Channel count mismatch during construction
    Configuration,
    /// Per-call command failure
    CommandFailure,
    /// Argument rejected before any I/O
    InvalidArgument,
}

impl RelayError {
    /// Build a [`RelayError::CommandFailed`] from a command line and its response
    pub fn command_failed(command: impl Into<String>, response: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            response: response.into(),
        }
    }

    /// Get the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Communication(_) => ErrorKind::Communication,
            RelayError::ChannelCountMismatch { .. } => ErrorKind::Configuration,
            RelayError::CommandFailed { .. } => ErrorKind::CommandFailure,
            RelayError::InvalidChannel { .. } => ErrorKind::InvalidArgument,
        }
    }

    /// Raw response line attached to a command failure
    pub fn response(&self) -> Option<&str> {
        match self {
            RelayError::CommandFailed { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Result alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            RelayError::Communication("no answer".into()).kind(),
            ErrorKind::Communication
        );
        assert_eq!(
            RelayError::ChannelCountMismatch {
                requested: 4,
                actual: 2
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            RelayError::command_failed("AT+CH1=?", "").kind(),
            ErrorKind::CommandFailure
        );
        assert_eq!(
            RelayError::InvalidChannel {
                channel: 0,
                num_channels: 4
            }
            .kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_response_diagnostic() {
        let err = RelayError::command_failed("AT+NUM=?", "Error");
        assert_eq!(err.response(), Some("Error"));
        assert!(err.to_string().contains("AT+NUM=?"));
        assert!(err.to_string().contains("\"Error\""));

        assert_eq!(RelayError::Communication("x".into()).response(), None);
    }

    #[test]
    fn test_mismatch_message_reports_actual_count() {
        let err = RelayError::ChannelCountMismatch {
            requested: 2,
            actual: 1,
        };
        assert!(err.to_string().contains("relay reports only 1 channels"));
    }
}
