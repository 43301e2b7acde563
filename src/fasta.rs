//! In-memory FASTA reference used by the command-line tool.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::region::Region;
use crate::sequence;

/// Errors produced while loading or querying a reference.
#[derive(Debug, Error)]
pub enum FastaError {
    #[error("failed to read reference: {0}")]
    Io(#[from] std::io::Error),

    /// Sequence data before the first `>` header.
    #[error("sequence data on line {0} precedes any FASTA header")]
    MissingHeader(usize),

    #[error("entry '{0}' not found in reference")]
    UnknownEntry(String),

    /// Region bounds outside the entry.
    #[error("region {region} outside valid range {entry}:1-{length}")]
    OutOfRange {
        region: String,
        entry: String,
        length: usize,
    },
}

/// A named reference sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaEntry {
    /// First word of the header line.
    pub name: String,
    pub sequence: Vec<u8>,
}

/// All entries of a FASTA file, in file order.
#[derive(Debug, Clone, Default)]
pub struct FastaReference {
    entries: Vec<FastaEntry>,
}

impl FastaReference {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, FastaError> {
        let mut entries: Vec<FastaEntry> = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if let Some(header) = line.strip_prefix('>') {
                let name = header.split_whitespace().next().unwrap_or_default();
                entries.push(FastaEntry {
                    name: name.to_string(),
                    sequence: Vec::new(),
                });
            } else if !line.is_empty() {
                let entry = entries
                    .last_mut()
                    .ok_or(FastaError::MissingHeader(idx + 1))?;
                entry
                    .sequence
                    .extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
            }
        }
        debug!(entries = entries.len(), "loaded reference");
        Ok(Self { entries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FastaError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn entries(&self) -> &[FastaEntry] {
        &self.entries
    }

    /// Full sequence of an entry.
    pub fn sequence(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.sequence.as_slice())
    }

    /// Forward-strand bases of the region, `start..end` in 1-based positions.
    pub fn fetch_forward(&self, region: &Region) -> Result<&[u8], FastaError> {
        let seq = self
            .sequence(region.entry())
            .ok_or_else(|| FastaError::UnknownEntry(region.entry().to_string()))?;
        let (start, end) = (region.start() as usize, region.end() as usize);
        if start < 1 || end > seq.len() + 1 {
            return Err(FastaError::OutOfRange {
                region: region.to_string(),
                entry: region.entry().to_string(),
                length: seq.len(),
            });
        }
        Ok(&seq[start - 1..end - 1])
    }

    /// Region bases in reading orientation; reverse regions are
    /// reverse-complemented.
    pub fn fetch(&self, region: &Region) -> Result<Vec<u8>, FastaError> {
        let forward = self.fetch_forward(region)?;
        if region.is_reverse() {
            Ok(sequence::reverse_complement(forward))
        } else {
            Ok(forward.to_vec())
        }
    }
}
