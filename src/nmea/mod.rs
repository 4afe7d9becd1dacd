// src/nmea/mod.rs
//! NMEA-0183 framing, decoding and byte sources

pub mod fields;
pub mod scanner;
pub mod sentence;
pub mod source;

pub use scanner::{encode_frame, Scanner, ScanStats};
pub use sentence::{Sentence, SentenceData, SentenceDecoder, SentenceKind};
pub use source::ByteSource;
