use std::io::{ErrorKind, Read};
use std::time::Duration;

use bytes::Bytes;
use serialport::{ClearBuffer, SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::error::{Result, SourceError};
use crate::traits::ByteSource;

/// Default baud rate. USB CDC links ignore it, real UARTs do not.
pub const DEFAULT_BAUD_RATE: u32 = 256_000;

/// Upper bound on a single read, whatever the port reports as queued.
const MAX_READ_CHUNK: usize = 64 * 1024;

/// Configuration for opening a serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed in baud.
    pub baud_rate: u32,
    /// Longest time a single `read` may wait for the first byte.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// Live serial transport.
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    name: String,
    config: SerialConfig,
}

impl SerialSource {
    /// Open `port` with default settings.
    pub fn open(port: &str) -> Result<Self> {
        Self::open_with_config(port, SerialConfig::default())
    }

    /// Open `port` with explicit settings.
    pub fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        let handle = serialport::new(port, config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|err| SourceError::Open {
                port: port.to_string(),
                kind: io_kind(&err),
                message: err.description,
            })?;

        info!(port, baud_rate = config.baud_rate, "serial port opened");

        Ok(Self {
            port: handle,
            name: port.to_string(),
            config,
        })
    }

    /// Discard everything the driver has buffered so far.
    pub fn clear_input(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    /// Port name this source was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Settings this source was opened with.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl ByteSource for SerialSource {
    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        // Nothing queued: wait up to the timeout for one byte so an idle poll
        // loop blocks in the driver instead of spinning.
        let len = max_bytes.clamp(1, MAX_READ_CHUNK);

        let mut chunk = vec![0u8; len];
        let read = loop {
            match self.port.read(&mut chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    break 0
                }
                Err(err) => return Err(SourceError::Io(err)),
            }
        };

        chunk.truncate(read);
        Ok(Bytes::from(chunk))
    }
}

impl std::fmt::Debug for SerialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSource")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}

/// Description of a serial port found on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// "usb", "pci", "bluetooth" or "unknown".
    pub kind: &'static str,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

/// List the serial ports visible to this process.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()
        .map_err(|err| SourceError::Enumerate(err.description))?;
    debug!(count = ports.len(), "enumerated serial ports");

    Ok(ports
        .into_iter()
        .map(|port| match port.port_type {
            SerialPortType::UsbPort(usb) => PortInfo {
                name: port.port_name,
                kind: "usb",
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
            },
            other => PortInfo {
                name: port.port_name,
                kind: match other {
                    SerialPortType::PciPort => "pci",
                    SerialPortType::BluetoothPort => "bluetooth",
                    _ => "unknown",
                },
                vid: None,
                pid: None,
                manufacturer: None,
                product: None,
                serial_number: None,
            },
        })
        .collect())
}

fn io_kind(err: &serialport::Error) -> ErrorKind {
    match err.kind() {
        serialport::ErrorKind::NoDevice => ErrorKind::NotFound,
        serialport::ErrorKind::InvalidInput => ErrorKind::InvalidInput,
        serialport::ErrorKind::Io(kind) => kind,
        _ => ErrorKind::Other,
    }
}
