//! Line codec for AT commands and responses.
//!
//! Outgoing frames are the uppercase command line followed by CRLF. Incoming
//! frames are single lines; the terminator and surrounding whitespace are
//! stripped before classification.
//!
//! A response is a success when it begins with `OK+`. The payload is the text
//! after the first `=`.

use super::{Channel, Command, RelayError, Result, LINE_TERMINATOR, SUCCESS_PREFIX};

/// Classified response line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `OK+<KEY>[=<payload>]`
    Success {
        /// Text before the first `=`, including the `OK+` prefix
        key: String,
        /// Text after the first `=`
        payload: Option<String>,
    },

    /// Non-empty line without the success prefix (`OK`, `Error`, firmware banners)
    Other(String),

    /// Nothing received before the timeout
    Empty,
}

impl Response {
    /// Classify a decoded response line
    pub fn parse(line: &str) -> Response {
        let line = line.trim();

        if line.is_empty() {
            return Response::Empty;
        }

        if !has_success_prefix(line) {
            return Response::Other(line.to_string());
        }

        match line.split_once('=') {
            Some((key, payload)) => Response::Success {
                key: key.to_string(),
                payload: Some(payload.trim().to_string()),
            },
            None => Response::Success {
                key: line.to_string(),
                payload: None,
            },
        }
    }

    /// Check if this is a well-formed success response
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}

/// Encode a command for transmission, appending CRLF
pub fn encode(command: &Command) -> Vec<u8> {
    let frame = command.frame();
    let mut buf = Vec::with_capacity(frame.len() + LINE_TERMINATOR.len());
    buf.extend_from_slice(frame.as_bytes());
    buf.extend_from_slice(LINE_TERMINATOR.as_bytes());
    buf
}

/// Decode raw received bytes into a trimmed response line
///
/// Invalid UTF-8 is replaced rather than rejected so the line still reaches
/// the grammar check.
pub fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

fn has_success_prefix(line: &str) -> bool {
    line.starts_with(SUCCESS_PREFIX)
}

/// Extract the payload of a success response whose key echoes `command`
///
/// The key comparison is ASCII case-insensitive since the wire protocol is.
fn echoed_payload(command: &Command, line: &str) -> Result<String> {
    let malformed = || RelayError::command_failed(command.frame(), line);
    let expected_key = command.echo_key().ok_or_else(malformed)?;

    match Response::parse(line) {
        Response::Success {
            key,
            payload: Some(payload),
        } if key.trim().eq_ignore_ascii_case(&expected_key) => Ok(payload),
        _ => Err(malformed()),
    }
}

/// Decode a channel state response (`OK+CH<c>=<0|1>`)
pub fn decode_channel_state(command: &Command, line: &str) -> Result<bool> {
    match echoed_payload(command, line)?.as_str() {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(RelayError::command_failed(command.frame(), line)),
    }
}

/// Decode a channel count response (`OK+NUM=<n>`)
pub fn decode_channel_count(line: &str) -> Result<Channel> {
    let command = Command::GetChannelCount;
    echoed_payload(&command, line)?
        .parse::<Channel>()
        .map_err(|_| RelayError::command_failed(command.frame(), line))
}
