//! Serial port handling
//!
//! Provides the transport session the driver talks through, and the
//! `serialport`-backed implementation used for real hardware.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use super::{RelayError, Result, MAX_LINE_LENGTH};

/// A line-oriented transport session to a relay board
///
/// The read timeout is fixed for the lifetime of the session and applies to
/// every [`read_line`](Transport::read_line).
pub trait Transport {
    /// Write raw bytes to the line
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read one line, including its terminator if one arrived
    ///
    /// Returns the bytes received so far (possibly none) once the session
    /// timeout expires.
    fn read_line(&mut self) -> io::Result<Vec<u8>>;

    /// Drop any received bytes not read yet, such as a reply that arrived
    /// after its read timed out
    fn discard_input(&mut self) -> io::Result<()>;

    /// Check if the session is currently open
    fn is_open(&self) -> bool;

    /// Reopen a closed session with its original settings
    fn reopen(&mut self) -> io::Result<()>;

    /// Close the session. Closing a closed session is a no-op.
    fn close(&mut self);
}

/// Serial port session to a relay board
pub struct SerialTransport {
    /// Serial port handle, `None` once closed
    port: Option<Box<dyn SerialPort>>,
    /// Device path (e.g. "/dev/ttyACM0" or "COM3")
    path: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialTransport {
    /// Open a serial port session
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = open_port(path, baud_rate, timeout)
            .map_err(|e| RelayError::Communication(format!("{}: {}", path, e)))?;

        tracing::info!(path, baud_rate, "opened serial port");

        Ok(Self {
            port: Some(port),
            path: path.to_string(),
            baud_rate,
            timeout,
        })
    }

    /// Device path of this session
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Baud rate of this session
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Drop the port after a hard I/O error so the next send reconnects
    fn mark_closed_on(&mut self, err: &io::Error) {
        if !matches!(
            err.kind(),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
        ) {
            tracing::warn!(path = %self.path, error = %err, "serial port failed, closing session");
            self.port = None;
        }
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let port = self.port.as_mut().ok_or_else(not_connected)?;
        let result = port.write_all(data).and_then(|_| port.flush());
        if let Err(ref e) = result {
            self.mark_closed_on(e);
        }
        result
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let timeout = self.timeout;
        let port = self.port.as_mut().ok_or_else(not_connected)?;
        let result = read_line_from(port.as_mut(), timeout);
        if let Err(ref e) = result {
            self.mark_closed_on(e);
        }
        result
    }

    fn discard_input(&mut self) -> io::Result<()> {
        let port = self.port.as_mut().ok_or_else(not_connected)?;
        port.clear(serialport::ClearBuffer::Input)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn reopen(&mut self) -> io::Result<()> {
        if self.port.is_none() {
            let port = open_port(&self.path, self.baud_rate, self.timeout)
                .map_err(|e| io::Error::new(io::ErrorKind::NotConnected, e))?;
            tracing::info!(path = %self.path, "reopened serial port");
            self.port = Some(port);
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::info!(path = %self.path, "closed serial port");
        }
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "serial port is closed")
}

/// Open and configure a serial port for relay board communication
pub fn open_port(
    path: &str,
    baud_rate: u32,
    timeout: Duration,
) -> std::result::Result<Box<dyn SerialPort>, serialport::Error> {
    let mut port = serialport::new(path, baud_rate).timeout(timeout).open()?;
    configure_port(port.as_mut())?;
    Ok(port)
}

/// Configure a serial port for 8N1 without flow control
pub fn configure_port(port: &mut dyn SerialPort) -> std::result::Result<(), serialport::Error> {
    port.set_data_bits(serialport::DataBits::Eight)?;
    port.set_parity(serialport::Parity::None)?;
    port.set_stop_bits(serialport::StopBits::One)?;
    port.set_flow_control(serialport::FlowControl::None)?;
    Ok(())
}

/// Read bytes until `\n` or the timeout
///
/// A timeout is not an error: whatever arrived so far is returned. Lines
/// longer than [`MAX_LINE_LENGTH`] are truncated, but the rest of the line is
/// still consumed so it cannot pose as the next response.
pub fn read_line_from<R: Read + ?Sized>(reader: &mut R, timeout: Duration) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    let start = Instant::now();

    while start.elapsed() <= timeout {
        match reader.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if line.len() < MAX_LINE_LENGTH {
                    line.push(byte[0]);
                }
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock =>
            {
                break;
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(line)
}
