// src/display/mod.rs
//! Interactive reporting for capture sessions

pub mod terminal;

use crate::{capture::CaptureStats, error::{NmeaError, Result}, nmea::Sentence};

/// Receives the classification of every sentence a capture filter sees.
///
/// Observers never change what the filter yields.
pub trait CaptureObserver {
    /// A background sentence was discarded.
    fn ignored(&mut self, sentence: &Sentence);

    /// A sentence was kept for persistence.
    fn retained(&mut self, sentence: &Sentence);

    /// A checksum-clean frame failed to decode.
    fn dropped(&mut self, _fields: &[String], _error: &NmeaError) {}

    /// Called once when the capture ends.
    fn finish(&mut self, _stats: &CaptureStats) -> Result<()> {
        Ok(())
    }
}

/// Observer for non-interactive runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl CaptureObserver for NullObserver {
    fn ignored(&mut self, _sentence: &Sentence) {}
    fn retained(&mut self, _sentence: &Sentence) {}
}

impl<T: CaptureObserver + ?Sized> CaptureObserver for &mut T {
    fn ignored(&mut self, sentence: &Sentence) {
        (**self).ignored(sentence)
    }

    fn retained(&mut self, sentence: &Sentence) {
        (**self).retained(sentence)
    }

    fn dropped(&mut self, fields: &[String], error: &NmeaError) {
        (**self).dropped(fields, error)
    }

    fn finish(&mut self, stats: &CaptureStats) -> Result<()> {
        (**self).finish(stats)
    }
}
