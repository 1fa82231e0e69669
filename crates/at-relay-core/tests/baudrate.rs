//! Tests for baud rate reconfiguration

use at_relay_core::board::{configure_baudrate, request_baudrate};
use at_relay_core::protocol::{ErrorKind, MockTransport, Transport};
use pretty_assertions::assert_eq;

#[test]
fn test_configure_baudrate() {
    let mock = MockTransport::new();
    mock.stub("AT+BAUD=115200", "OK+BAUD=115200");
    assert!(request_baudrate(mock.clone(), 115200).unwrap());
    assert_eq!(mock.written_lines(), vec!["AT+BAUD=115200".to_string()]);

    let mock = MockTransport::new();
    mock.stub("AT+BAUD=115200", "OK+BAUD=9600");
    assert!(!request_baudrate(mock, 115200).unwrap());

    let mock = MockTransport::new();
    assert!(!request_baudrate(mock, 115200).unwrap());
}

#[test]
fn test_configure_baudrate_closes_session() {
    let mock = MockTransport::new();
    mock.stub("AT+BAUD=19200", "OK+BAUD=19200");

    assert!(request_baudrate(mock.clone(), 19200).unwrap());
    assert!(!mock.is_open());
}

#[test]
fn test_configure_baudrate_write_failure_is_false() {
    let mock = MockTransport::new();
    mock.stub("AT+BAUD=115200", "OK+BAUD=115200");
    mock.set_fail_writes(true);

    assert!(!request_baudrate(mock, 115200).unwrap());
}

#[test]
fn test_configure_baudrate_missing_device() {
    let err = configure_baudrate("/dev/at-relay-missing", 9600, 115200).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Communication);
}
