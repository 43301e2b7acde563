//! Per-position consensus calling.
//!
//! Two policies are provided. [`majority_consensus`] reports the most
//! frequent base(s) and exposes ties as a multi-letter string. [`iupac_consensus`]
//! folds every base above a ratio threshold into one IUPAC code and is the
//! policy used when rewriting a region's reference.

use std::fmt;

use crate::iupac::BaseSet;
use crate::pileup::BaseCounts;
use crate::sequence::Nucleotide;

/// Reference-match ratio above which the reference base wins outright.
const REFERENCE_MAJORITY: f64 = 0.5;

/// Outcome of the threshold consensus at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ConsensusCall {
    /// No base passed the threshold; carries the lowercase reference base.
    Reference(u8),
    /// Uppercase IUPAC code for the bases that passed the threshold.
    Called(u8),
}

impl ConsensusCall {
    /// Symbol for the call: lowercase for a retained reference, uppercase for
    /// a called code.
    pub fn as_byte(self) -> u8 {
        match self {
            ConsensusCall::Reference(base) | ConsensusCall::Called(base) => base,
        }
    }

    /// Whether any base passed the threshold.
    pub fn is_called(self) -> bool {
        matches!(self, ConsensusCall::Called(_))
    }
}

impl fmt::Display for ConsensusCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// Most frequent base(s) at a position.
///
/// The reference base is returned when reference matches exceed half the
/// coverage. Otherwise all bases tied for the highest count in `counts` (which
/// already carries the reference-match count) are concatenated in
/// alphabetical order, so a multi-letter result signals a tie. Returns `None`
/// when no nucleotide was observed.
pub fn majority_consensus(
    counts: &BaseCounts,
    ref_count: u32,
    coverage: u32,
    reference: u8,
) -> Option<String> {
    if coverage > 0 && f64::from(ref_count) / f64::from(coverage) > REFERENCE_MAJORITY {
        return Some((reference as char).to_string());
    }

    let max = counts.max();
    if max == 0 {
        return None;
    }
    Some(
        counts
            .iter()
            .filter(|&(_, count)| count == max)
            .map(|(base, _)| base.as_char())
            .collect(),
    )
}

/// Threshold consensus: every nucleotide with `count / coverage > min_ratio`
/// joins the call, and the resulting set is reported as one IUPAC code.
///
/// Zero coverage admits no candidate, so the lowercase reference is returned.
pub fn iupac_consensus(
    counts: &BaseCounts,
    coverage: u32,
    reference: u8,
    min_ratio: f64,
) -> ConsensusCall {
    let candidates: BaseSet = if coverage == 0 {
        BaseSet::empty()
    } else {
        Nucleotide::ALL
            .into_iter()
            .filter(|&base| f64::from(counts.get(base)) / f64::from(coverage) > min_ratio)
            .collect()
    };

    if candidates.is_empty() {
        ConsensusCall::Reference(reference.to_ascii_lowercase())
    } else {
        ConsensusCall::Called(candidates.code())
    }
}
