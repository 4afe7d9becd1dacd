// src/error.rs
//! Error types for the NMEA tools

use std::fmt;

pub type Result<T> = std::result::Result<T, NmeaError>;

#[derive(Debug)]
pub enum NmeaError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Xml(quick_xml::Error),
    Connection(String),
    /// Frame checksum did not match the `*hh` trailer.
    Checksum { expected: u8, actual: u8, frame: String },
    /// Frame is structurally broken (missing trailer, bad hex, not ASCII).
    Frame(String),
    /// A field could not be converted under its sentence schema.
    Decode(String),
    /// Pre-flight problem that halts the whole run.
    Configuration(String),
    Other(String),
}

impl NmeaError {
    /// Errors that drop one unit of data while the stream keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NmeaError::Checksum { .. } | NmeaError::Frame(_) | NmeaError::Decode(_)
        )
    }
}

impl fmt::Display for NmeaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NmeaError::Io(e) => write!(f, "IO error: {}", e),
            NmeaError::Serial(e) => write!(f, "Serial error: {}", e),
            NmeaError::Json(e) => write!(f, "JSON error: {}", e),
            NmeaError::Xml(e) => write!(f, "XML error: {}", e),
            NmeaError::Connection(msg) => write!(f, "Connection error: {}", msg),
            NmeaError::Checksum { expected, actual, frame } => write!(
                f,
                "Checksum error: expected {:02X}, computed {:02X} in {:?}",
                expected, actual, frame
            ),
            NmeaError::Frame(msg) => write!(f, "Frame error: {}", msg),
            NmeaError::Decode(msg) => write!(f, "Decode error: {}", msg),
            NmeaError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            NmeaError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for NmeaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NmeaError::Io(e) => Some(e),
            NmeaError::Serial(e) => Some(e),
            NmeaError::Json(e) => Some(e),
            NmeaError::Xml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NmeaError {
    fn from(error: std::io::Error) -> Self {
        NmeaError::Io(error)
    }
}

impl From<tokio_serial::Error> for NmeaError {
    fn from(error: tokio_serial::Error) -> Self {
        NmeaError::Serial(error)
    }
}

impl From<serde_json::Error> for NmeaError {
    fn from(error: serde_json::Error) -> Self {
        NmeaError::Json(error)
    }
}

impl From<quick_xml::Error> for NmeaError {
    fn from(error: quick_xml::Error) -> Self {
        NmeaError::Xml(error)
    }
}

impl From<quick_xml::events::attributes::AttrError> for NmeaError {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        NmeaError::Xml(error.into())
    }
}

impl From<anyhow::Error> for NmeaError {
    fn from(error: anyhow::Error) -> Self {
        NmeaError::Other(error.to_string())
    }
}
