//! Pileup records and per-position statistics.
//!
//! Lines are parsed into [`PileupRecord`]s, whose read-bases column is
//! decoded into a [`ReadBaseTally`]. From the tally come [`BaseCounts`],
//! [`AlleleFrequency`] and the two consensus policies.

mod bases;
mod consensus;
mod record;

use std::io::BufRead;

use thiserror::Error;

pub use bases::{AlleleFrequency, BaseCounts, ReadBaseTally};
pub use consensus::{iupac_consensus, majority_consensus, ConsensusCall};
pub use record::{
    IndelColumns, LegacyColumns, PileupLayout, PileupParseError, PileupRecord, INDEL_MARKER,
};

use crate::config::ParseMode;

/// Errors produced while streaming pileup lines.
#[derive(Debug, Error)]
pub enum PileupError {
    /// Reading the underlying source failed.
    #[error("failed to read pileup input: {0}")]
    Io(#[from] std::io::Error),

    /// A line was rejected in strict mode.
    #[error("line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Underlying parse failure.
        source: PileupParseError,
    },
}

/// Pull-based iterator over the records of a pileup text stream.
///
/// Blank lines and `#` comments are skipped; malformed lines are skipped or
/// reported depending on the [`ParseMode`].
#[derive(Debug)]
pub struct PileupReader<R> {
    inner: R,
    mode: ParseMode,
    buffer: String,
    line_no: usize,
    skipped: usize,
}

impl<R: BufRead> PileupReader<R> {
    /// Wrap a buffered reader.
    pub fn new(inner: R, mode: ParseMode) -> Self {
        Self {
            inner,
            mode,
            buffer: String::new(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Lines dropped so far by lenient parsing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for PileupReader<R> {
    type Item = Result<PileupRecord, PileupError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.inner.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }
            self.line_no += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match PileupRecord::parse(line, self.mode) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => self.skipped += 1,
                Err(source) => {
                    return Some(Err(PileupError::Parse {
                        line: self.line_no,
                        source,
                    }))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const INPUT: &str = "\
# comment
chr1\t1\tA\t2\t..\tII

chr1\t2\tC\ttruncated
chr1\t3\tG\t1\tt\tI
";

    #[test]
    fn lenient_reader_skips_bad_lines() {
        let mut reader = PileupReader::new(Cursor::new(INPUT), ParseMode::Lenient);
        let positions: Vec<u32> = reader
            .by_ref()
            .map(|r| r.expect("lenient reader does not fail").pos)
            .collect();
        assert_eq!(positions, vec![1, 3]);
        assert_eq!(reader.skipped(), 1);
    }

    #[test]
    fn strict_reader_reports_line_number() {
        let reader = PileupReader::new(Cursor::new(INPUT), ParseMode::Strict);
        let results: Vec<_> = reader.collect();
        assert_eq!(results.len(), 3);
        match &results[1] {
            Err(PileupError::Parse { line, source }) => {
                assert_eq!(*line, 4);
                assert_eq!(*source, PileupParseError::FieldCount { found: 4 });
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
