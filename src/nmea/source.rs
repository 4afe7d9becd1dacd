// src/nmea/source.rs
//! Byte sources feeding the scanner: a serial device or a recorded file.

use crate::error::{NmeaError, Result};
use std::{
    fs::File,
    io::{ErrorKind, Read},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

/// Where captured bytes come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ByteSource {
    Serial { port: String, baud_rate: u32, timeout: Duration },
    File(PathBuf),
}

impl ByteSource {
    /// A regular file is replayed; anything else is opened as a serial device.
    pub fn detect(input: &str, baud_rate: u32, timeout: Duration) -> Self {
        let path = Path::new(input);
        if path.is_file() {
            ByteSource::File(path.to_path_buf())
        } else {
            ByteSource::Serial {
                port: input.to_string(),
                baud_rate,
                timeout,
            }
        }
    }

    /// Open the source. Reads stop at the next boundary once `running` is cleared.
    pub fn open(&self, running: Arc<AtomicBool>) -> Result<Box<dyn Read + Send>> {
        match self {
            ByteSource::Serial { port, baud_rate, timeout } => {
                log::info!("Opening {} at {} baud, 8N1", port, baud_rate);
                let serial = tokio_serial::new(port.as_str(), *baud_rate)
                    .data_bits(tokio_serial::DataBits::Eight)
                    .parity(tokio_serial::Parity::None)
                    .stop_bits(tokio_serial::StopBits::One)
                    .flow_control(tokio_serial::FlowControl::None)
                    .timeout(*timeout)
                    .open()
                    .map_err(|e| {
                        NmeaError::Connection(format!("Failed to open serial port {}: {}", port, e))
                    })?;
                Ok(Box::new(Interruptible::new(serial, running)))
            }
            ByteSource::File(path) => {
                log::info!("Reading recorded stream from {}", path.display());
                let file = File::open(path)?;
                Ok(Box::new(Interruptible::new(file, running)))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ByteSource::Serial { port, baud_rate, .. } => format!("{} @ {} baud", port, baud_rate),
            ByteSource::File(path) => path.display().to_string(),
        }
    }
}

/// Reader that reports end of stream once its running flag is cleared.
///
/// Read timeouts of the inner source are retried, so a quiet device keeps
/// the scan alive until the caller stops it.
pub struct Interruptible<R> {
    inner: R,
    running: Arc<AtomicBool>,
}

impl<R: Read> Interruptible<R> {
    pub fn new(inner: R, running: Arc<AtomicBool>) -> Self {
        Self { inner, running }
    }
}

impl<R: Read> Read for Interruptible<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            if !self.running.load(Ordering::Relaxed) {
                return Ok(0);
            }
            match self.inner.read(buf) {
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    log::debug!("Timeout, still listening");
                }
                other => return other,
            }
        }
    }
}

/// List available serial ports
pub fn list_serial_ports() -> Result<Vec<tokio_serial::SerialPortInfo>> {
    Ok(tokio_serial::available_ports()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Quiet {
        timeouts: usize,
        data: Cursor<Vec<u8>>,
    }

    impl Read for Quiet {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.timeouts > 0 {
                self.timeouts -= 1;
                return Err(std::io::Error::new(ErrorKind::TimedOut, "quiet"));
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_timeouts_are_retried() {
        let running = Arc::new(AtomicBool::new(true));
        let quiet = Quiet { timeouts: 3, data: Cursor::new(b"$GP".to_vec()) };
        let mut reader = Interruptible::new(quiet, running);
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "$GP");
    }

    #[test]
    fn test_stopped_reader_reports_eof() {
        let running = Arc::new(AtomicBool::new(true));
        let mut reader = Interruptible::new(Cursor::new(b"abc".to_vec()), Arc::clone(&running));
        let mut buf = [0u8; 1];
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        running.store(false, Ordering::Relaxed);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_detect_source() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let input = file.path().to_str().unwrap();
        assert_eq!(
            ByteSource::detect(input, 4800, Duration::from_secs(2)),
            ByteSource::File(file.path().to_path_buf())
        );
        assert!(matches!(
            ByteSource::detect("/dev/does-not-exist", 4800, Duration::from_secs(2)),
            ByteSource::Serial { baud_rate: 4800, .. }
        ));
    }
}
