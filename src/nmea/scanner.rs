// src/nmea/scanner.rs
//! Frame scanner for a raw NMEA-0183 byte stream.
//!
//! A frame is `('$'|'!') payload '*' hh`, where `hh` is the XOR of every
//! payload byte in hexadecimal. The stream has no other boundaries: line
//! endings are tolerated between frames, anything outside a frame is noise.
//! Broken frames are logged and skipped; the scan resumes at the next start
//! marker. End of the underlying stream ends the iteration.

use crate::error::{NmeaError, Result};
use std::io::{BufReader, Bytes, ErrorKind, Read};

/// Longest payload accepted before the frame is abandoned as noise.
pub const MAX_FRAME_LEN: usize = 512;

/// Running totals for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub frames: usize,
    pub checksum_errors: usize,
    pub malformed: usize,
}

/// XOR of all payload bytes.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, b| acc ^ b)
}

/// Frame a field list as `$payload*hh\r\n`.
pub fn encode_frame<S: AsRef<str>>(fields: &[S]) -> String {
    let payload = fields
        .iter()
        .map(|f| f.as_ref())
        .collect::<Vec<_>>()
        .join(",");
    format!("${}*{:02X}\r\n", payload, checksum(payload.as_bytes()))
}

/// Validate a single framed sentence and split it into fields.
pub fn validate(line: &[u8]) -> Result<Vec<String>> {
    let mut scanner = Scanner::new(line);
    match scanner.read_frame() {
        Some(result) => result,
        None => Err(NmeaError::Frame(format!(
            "sentence fragment: {:?}",
            String::from_utf8_lossy(line)
        ))),
    }
}

/// Pull-based iterator of checksum-clean field lists.
///
/// The scanner owns its byte source; dropping the scanner closes it.
pub struct Scanner<R: Read> {
    bytes: Bytes<BufReader<R>>,
    payload: Vec<u8>,
    restart: bool,
    finished: bool,
    stats: ScanStats,
}

impl<R: Read> Scanner<R> {
    pub fn new(source: R) -> Self {
        Self {
            bytes: BufReader::new(source).bytes(),
            payload: Vec::with_capacity(96),
            restart: false,
            finished: false,
            stats: ScanStats::default(),
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    fn next_byte(&mut self) -> Option<u8> {
        while !self.finished {
            match self.bytes.next() {
                Some(Ok(byte)) => return Some(byte),
                Some(Err(e)) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    log::debug!("Timeout waiting for data");
                }
                Some(Err(e)) => {
                    log::error!("Read failed, ending scan: {}", e);
                    self.finished = true;
                }
                None => self.finished = true,
            }
        }
        None
    }

    /// Read the next frame. `None` at end of stream; a partial frame is discarded.
    pub fn read_frame(&mut self) -> Option<Result<Vec<String>>> {
        if !self.restart {
            loop {
                if matches!(self.next_byte()?, b'$' | b'!') {
                    break;
                }
            }
        }
        self.restart = false;
        self.payload.clear();

        loop {
            match self.next_byte()? {
                b'*' => break,
                b'$' | b'!' => {
                    self.restart = true;
                    return Some(Err(self.broken("start marker inside frame")));
                }
                b'\r' | b'\n' => return Some(Err(self.broken("missing checksum"))),
                byte => {
                    self.payload.push(byte);
                    if self.payload.len() > MAX_FRAME_LEN {
                        return Some(Err(self.broken("frame too long")));
                    }
                }
            }
        }

        // Check each digit as it is read so a start marker is never consumed.
        let high = match self.trailer_digit()? {
            Ok(digit) => digit,
            Err(e) => return Some(Err(e)),
        };
        let low = match self.trailer_digit()? {
            Ok(digit) => digit,
            Err(e) => return Some(Err(e)),
        };
        let expected = high << 4 | low;

        let actual = checksum(&self.payload);
        if actual != expected {
            return Some(Err(NmeaError::Checksum {
                expected,
                actual,
                frame: String::from_utf8_lossy(&self.payload).into_owned(),
            }));
        }
        if !self.payload.is_ascii() {
            return Some(Err(self.broken("payload is not ASCII")));
        }

        let text = String::from_utf8_lossy(&self.payload);
        Some(Ok(text.split(',').map(str::to_string).collect()))
    }

    /// One hex digit of the `*hh` trailer. A start marker in its place
    /// begins the next frame.
    fn trailer_digit(&mut self) -> Option<Result<u8>> {
        let byte = self.next_byte()?;
        match hex_value(byte) {
            Some(digit) => Some(Ok(digit)),
            None => {
                self.restart = matches!(byte, b'$' | b'!');
                Some(Err(self.broken("checksum is not two hex digits")))
            }
        }
    }

    fn broken(&self, reason: &str) -> NmeaError {
        NmeaError::Frame(format!(
            "{}: {:?}",
            reason,
            String::from_utf8_lossy(&self.payload)
        ))
    }
}

impl<R: Read> Iterator for Scanner<R> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.read_frame()? {
                Ok(fields) => {
                    self.stats.frames += 1;
                    return Some(fields);
                }
                Err(e) if e.is_recoverable() => {
                    match e {
                        NmeaError::Checksum { .. } => self.stats.checksum_errors += 1,
                        _ => self.stats.malformed += 1,
                    }
                    log::warn!("Dropped frame: {}", e);
                }
                Err(e) => {
                    log::error!("Scan stopped: {}", e);
                    self.finished = true;
                    return None;
                }
            }
        }
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}
