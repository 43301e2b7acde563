//! Genomic regions and the region-level consensus aggregator.
//!
//! A [`Region`] names a span on a reference entry together with the strand
//! it is read from. [`RegionAggregator`] folds the pileup records of that span
//! into per-position arrays and assembles the consensus sequence, producing
//! [`RegionStats`] once every record has been seen.

mod aggregator;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use aggregator::{RegionAggregator, RegionStats};

/// Errors produced by region parsing and aggregation.
#[derive(Debug, Error, PartialEq)]
pub enum RegionError {
    /// A region string not of the form `entry:start-end`.
    #[error("invalid region '{0}'")]
    InvalidRegion(String),

    /// The reference handed to the aggregator does not span the region.
    #[error("reference of length {found} does not match the region length {expected}")]
    ReferenceLength {
        /// Region length.
        expected: usize,
        /// Reference length supplied.
        found: usize,
    },
}

/// Strand a region is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Orientation {
    /// Consensus is kept in reference order.
    #[default]
    Forward,
    /// Consensus is reverse-complemented on assembly.
    Reverse,
}

/// A span on a named reference sequence.
///
/// Bounds are stored normalised and half-open (`start..end`, 1-based), with
/// the strand kept in [`Orientation`]. The length is `end - start`, and the
/// position at offset `i` is `start + i`.
///
/// The text form used by [`FromStr`] and [`Display`](fmt::Display) is the
/// samtools notation `entry:first-last` with both bounds inclusive, so
/// `"chr1:5-8"` covers positions 5, 6, 7 and 8.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Region {
    entry: String,
    start: u32,
    end: u32,
    orientation: Orientation,
}

impl Region {
    /// Forward region; bounds given in reverse order produce a reverse region.
    pub fn new(entry: impl Into<String>, start: u32, end: u32) -> Self {
        if end < start {
            Self::with_orientation(entry, end, start, Orientation::Reverse)
        } else {
            Self::with_orientation(entry, start, end, Orientation::Forward)
        }
    }

    /// Region with explicit orientation; bounds are swapped if needed.
    pub fn with_orientation(
        entry: impl Into<String>,
        start: u32,
        end: u32,
        orientation: Orientation,
    ) -> Self {
        Self {
            entry: entry.into(),
            start: start.min(end),
            end: start.max(end),
            orientation,
        }
    }

    /// Reference entry the region lies on.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// First position of the region.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// One past the last position of the region.
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Strand the consensus is assembled on.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Whether the region is read from the minus strand.
    pub fn is_reverse(&self) -> bool {
        self.orientation == Orientation::Reverse
    }

    /// Number of positions in the region (`end - start`).
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Whether the region covers no position.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Offset of a 1-based position, if it lies inside the region.
    pub fn offset_of(&self, pos: u32) -> Option<usize> {
        if pos >= self.start && pos < self.end {
            Some((pos - self.start) as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for Region {
    /// `entry:first-last`, inclusive, with the bounds in reading order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.end.saturating_sub(1);
        match self.orientation {
            Orientation::Forward => write!(f, "{}:{}-{}", self.entry, self.start, last),
            Orientation::Reverse => write!(f, "{}:{}-{}", self.entry, last, self.start),
        }
    }
}

impl FromStr for Region {
    type Err = RegionError;

    /// Parse `entry:first-last` with inclusive bounds; single quotes are
    /// ignored and `last < first` marks a reverse region.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|&c| c != '\'').collect();
        let invalid = || RegionError::InvalidRegion(cleaned.clone());

        let fields: Vec<&str> = cleaned.split(':').collect();
        let [entry, span] = fields.as_slice() else {
            return Err(invalid());
        };
        let bounds: Vec<&str> = span.split('-').collect();
        let [start, end] = bounds.as_slice() else {
            return Err(invalid());
        };
        let first: u32 = start.trim().parse().map_err(|_| invalid())?;
        let last: u32 = end.trim().parse().map_err(|_| invalid())?;

        let orientation = if last < first {
            Orientation::Reverse
        } else {
            Orientation::Forward
        };
        let end = first.max(last).checked_add(1).ok_or_else(invalid)?;
        Ok(Region::with_orientation(
            *entry,
            first.min(last),
            end,
            orientation,
        ))
    }
}

/// Region argument as received at the boundary: either text still to be
/// parsed or an already structured region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionQuery {
    Raw(String),
    Structured(Region),
}

impl RegionQuery {
    /// Resolve into a [`Region`], parsing raw text.
    pub fn resolve(self) -> Result<Region, RegionError> {
        match self {
            RegionQuery::Raw(text) => text.parse(),
            RegionQuery::Structured(region) => Ok(region),
        }
    }
}

impl From<Region> for RegionQuery {
    fn from(region: Region) -> Self {
        RegionQuery::Structured(region)
    }
}

impl From<&str> for RegionQuery {
    fn from(text: &str) -> Self {
        RegionQuery::Raw(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn parses_forward_region() {
        let region: Region = "chr1:100-200".parse().unwrap();
        assert_eq!(region.entry(), "chr1");
        assert_eq!(region.start(), 100);
        assert_eq!(region.end(), 201);
        assert_eq!(region.orientation(), Orientation::Forward);
        assert_eq!(region.len(), 101);
        assert_eq!(region.offset_of(200), Some(100));
        assert_eq!(region.to_string(), "chr1:100-200");
    }

    #[test]
    fn reversed_bounds_mark_reverse_orientation() {
        let region: Region = "'chr1:200-100'".parse().unwrap();
        assert_eq!(region.start(), 100);
        assert_eq!(region.end(), 201);
        assert!(region.is_reverse());
        assert_eq!(region.len(), 101);
        assert_eq!(region.to_string(), "chr1:200-100");
    }

    #[test]
    fn single_position_region() {
        let region: Region = "chr1:5-5".parse().unwrap();
        assert_eq!(region.len(), 1);
        assert_eq!(region.offset_of(5), Some(0));
        assert_eq!(region.to_string(), "chr1:5-5");
    }

    #[test_case("chr1" ; "missing colon")]
    #[test_case("chr1:100" ; "missing dash")]
    #[test_case("chr1:a-b" ; "non numeric bounds")]
    #[test_case("chr1:1-2-3" ; "too many dashes")]
    #[test_case("chr:1:1-2" ; "too many colons")]
    #[test_case("chr1:1-4294967295" ; "end past the last position")]
    fn rejects_malformed_regions(text: &str) {
        assert!(matches!(
            text.parse::<Region>(),
            Err(RegionError::InvalidRegion(_))
        ));
    }

    #[test]
    fn offsets_are_half_open() {
        let region = Region::new("chr1", 10, 13);
        assert_eq!(region.offset_of(9), None);
        assert_eq!(region.offset_of(10), Some(0));
        assert_eq!(region.offset_of(12), Some(2));
        assert_eq!(region.offset_of(13), None);
    }

    #[test]
    fn zero_length_region() {
        let region = Region::new("chr1", 5, 5);
        assert!(region.is_empty());
        assert_eq!(region.offset_of(5), None);
    }

    #[test]
    fn query_resolves_both_shapes() {
        let region = Region::new("chr2", 1, 51);
        assert_eq!(RegionQuery::from("chr2:1-50").resolve(), Ok(region.clone()));
        assert_eq!(RegionQuery::from(region.clone()).resolve(), Ok(region));
        assert!(RegionQuery::from("chr2").resolve().is_err());
    }
}
