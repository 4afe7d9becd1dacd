// src/capture.rs
//! Capture filter and persisted capture documents
//!
//! A chartplotter sending waypoints or routes keeps emitting its routine
//! navigation sentences in between. The [`CaptureFilter`] decodes every
//! frame, discards the configured background types and yields the rest.
//! The retained sentences are persisted as a JSON array so a session can
//! be replayed without the device.

use crate::{
    config::DEFAULT_BACKGROUND,
    display::CaptureObserver,
    error::Result,
    nmea::{ScanStats, Scanner, Sentence, SentenceDecoder},
};
use std::{
    collections::{BTreeMap, HashSet},
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Which sentences count as background noise.
///
/// An identifier matches either the bare sentence type (`RMC`, any talker)
/// or the full header (`GPRMC`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    background: HashSet<String>,
}

impl FilterConfig {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            background: identifiers
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_background(&self, sentence: &Sentence) -> bool {
        self.background.contains(&sentence.sentence_type) || self.background.contains(&sentence.header())
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND)
    }
}

/// Counters for one capture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureStats {
    pub retained: usize,
    pub ignored: usize,
    pub decode_errors: usize,
    pub by_type: BTreeMap<String, usize>,
    pub scan: ScanStats,
}

/// Iterator over non-background sentences decoded from a frame stream.
pub struct CaptureFilter<I, O> {
    frames: I,
    decoder: SentenceDecoder,
    config: FilterConfig,
    observer: O,
    running: Option<Arc<AtomicBool>>,
    stats: CaptureStats,
}

impl<I, O> CaptureFilter<I, O>
where
    I: Iterator<Item = Vec<String>>,
    O: CaptureObserver,
{
    pub fn new(frames: I, config: FilterConfig, observer: O) -> Self {
        Self {
            frames,
            decoder: SentenceDecoder::new(),
            config,
            observer,
            running: None,
            stats: CaptureStats::default(),
        }
    }

    /// Stop yielding at the next frame boundary once `running` is cleared.
    pub fn with_running(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    pub fn into_parts(self) -> (CaptureStats, O) {
        (self.stats, self.observer)
    }
}

impl<I, O> Iterator for CaptureFilter<I, O>
where
    I: Iterator<Item = Vec<String>>,
    O: CaptureObserver,
{
    type Item = Sentence;

    fn next(&mut self) -> Option<Sentence> {
        loop {
            if let Some(running) = &self.running {
                if !running.load(Ordering::Relaxed) {
                    return None;
                }
            }

            let fields = self.frames.next()?;
            let sentence = match self.decoder.decode(&fields) {
                Ok(sentence) => sentence,
                Err(e) if e.is_recoverable() => {
                    log::warn!("Dropped sentence {:?}: {}", fields, e);
                    self.stats.decode_errors += 1;
                    self.observer.dropped(&fields, &e);
                    continue;
                }
                Err(e) => {
                    log::error!("Capture stopped: {}", e);
                    return None;
                }
            };

            *self.stats.by_type.entry(sentence.header()).or_insert(0) += 1;
            if self.config.is_background(&sentence) {
                log::debug!("Ignored {}", sentence.header());
                self.stats.ignored += 1;
                self.observer.ignored(&sentence);
            } else {
                log::debug!("Retained {}", sentence);
                self.stats.retained += 1;
                self.observer.retained(&sentence);
                return Some(sentence);
            }
        }
    }
}

/// Scan `source` until it ends or `running` is cleared, then persist the
/// retained sentences to `out`.
pub fn run_capture<R, O, W>(
    source: R,
    config: FilterConfig,
    running: Arc<AtomicBool>,
    observer: O,
    out: W,
) -> Result<CaptureStats>
where
    R: Read,
    O: CaptureObserver,
    W: Write,
{
    let mut scanner = Scanner::new(source);
    let mut filter = CaptureFilter::new(scanner.by_ref(), config, observer).with_running(running);
    let sentences: Vec<Sentence> = filter.by_ref().collect();
    let (mut stats, mut observer) = filter.into_parts();
    stats.scan = scanner.stats();
    drop(scanner);

    observer.finish(&stats)?;
    write_capture(out, &sentences)?;

    log::info!("Ignored  {}", stats.ignored);
    log::info!("Captured {}", stats.retained);
    if stats.decode_errors > 0 || stats.scan.checksum_errors > 0 || stats.scan.malformed > 0 {
        log::warn!(
            "Dropped {} undecodable sentences, {} checksum failures, {} malformed frames",
            stats.decode_errors,
            stats.scan.checksum_errors,
            stats.scan.malformed
        );
    }
    Ok(stats)
}

/// Write sentences as a pretty JSON array.
pub fn write_capture<W: Write>(out: W, sentences: &[Sentence]) -> Result<()> {
    let mut out = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut out, sentences)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Read a persisted capture.
pub fn read_capture<R: Read>(input: R) -> Result<Vec<Sentence>> {
    Ok(serde_json::from_reader(BufReader::new(input))?)
}

pub fn load_capture(path: &Path) -> Result<Vec<Sentence>> {
    log::info!("Read capture from {}", path.display());
    let sentences = read_capture(File::open(path)?)?;
    log::info!("{} sentences read", sentences.len());
    Ok(sentences)
}
