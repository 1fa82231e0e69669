//! Tests for the command/response driver and the line codec

use at_relay_core::protocol::codec::{self, Response};
use at_relay_core::protocol::{Command, Connection, MockTransport, RelayError, Transport};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn test_relay_error_display() {
    let err = RelayError::command_failed("AT+CH1=?", "");
    assert!(!err.to_string().is_empty());
    assert!(!format!("{:?}", err).is_empty());
}

#[test]
fn test_frames_on_the_wire() {
    init_tracing();
    let mock = MockTransport::with_channels(1);
    let mut conn = Connection::new(mock.clone());

    conn.send(&Command::Identify).unwrap();
    conn.send(&Command::SetChannel(1, true)).unwrap();

    assert_eq!(mock.written_lines(), vec!["AT", "AT+CH1=1"]);
}

#[test]
fn test_lowercase_stub_never_matches_uppercase_frame() {
    let mock = MockTransport::new();
    mock.stub("at+num=?", "OK+NUM=2");
    let mut conn = Connection::new(mock);

    assert!(conn.send(&Command::GetChannelCount).is_err());
}

#[test]
fn test_response_classification() {
    assert!(Response::parse("OK+CH1=1").is_success());
    assert!(!Response::parse("OK").is_success());
    assert!(!Response::parse("").is_success());
    assert!(!Response::parse("Error").is_success());
}

#[test]
fn test_mock_round_trip_through_transport() {
    let mut mock = MockTransport::with_channels(2);
    mock.write_all(&codec::encode(&Command::GetChannel(2))).unwrap();
    let line = codec::decode_line(&mock.read_line().unwrap());

    assert_eq!(line, "OK+CH2=0");
    assert!(!codec::decode_channel_state(&Command::GetChannel(2), &line).unwrap());
}

#[test]
fn test_transport_error_is_normalized() {
    init_tracing();
    let mock = MockTransport::with_channels(1);
    let mut conn = Connection::new(mock.clone());
    mock.set_fail_writes(true);

    match conn.send(&Command::GetChannel(1)) {
        Err(RelayError::CommandFailed { command, response }) => {
            assert_eq!(command, "AT+CH1=?");
            assert_eq!(response, "");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
