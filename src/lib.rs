// src/lib.rs
//! NMEA Tools Library
//!
//! Captures waypoints and routes sent by a chartplotter over NMEA-0183,
//! turns them into GPX and friends, and merges newly captured waypoints
//! into a curated master set by position rather than by name.

pub mod assemble;
pub mod capture;
pub mod config;
pub mod display;
pub mod error;
pub mod geo;
pub mod gpx;
pub mod merge;
pub mod nmea;
pub mod waypoint;

// Re-export main types for convenience
pub use assemble::{Assembler, Assembly};
pub use capture::{run_capture, CaptureFilter, CaptureStats, FilterConfig};
pub use config::ToolConfig;
pub use error::{NmeaError, Result};
pub use merge::{MergeOutcome, MergeReport, NearDuplicate, PossibleDuplicate, Reconciler};
pub use nmea::{Scanner, Sentence, SentenceDecoder, SentenceKind};
pub use waypoint::{Route, Waypoint, WaypointExporter, WaypointFormat, WaypointSet};
