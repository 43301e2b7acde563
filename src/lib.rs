//! # Pileup consensus
//!
//! Statistics over samtools pileup output: per-position allele counts and
//! frequencies, majority and IUPAC-threshold consensus calls, region-level
//! consensus assembly and VCF genotype derivation.
//!
//! ## Pipeline
//!
//! 1. **Parse**: each pileup line becomes a [`PileupRecord`] (6-column mpileup
//!    or 10-13 column legacy `pileup -c`)
//! 2. **Count**: the read-bases column is tallied into [`BaseCounts`] and
//!    [`AlleleFrequency`]
//! 3. **Call**: [`iupac_consensus`] folds every base above `min_per` into an
//!    ambiguity code
//! 4. **Aggregate**: [`RegionAggregator`] overwrites the region reference at
//!    called positions and reverse-complements minus-strand regions
//!
//! ## Usage Example
//!
//! ```
//! use pileup_consensus::{call_region, ConsensusConfig, PileupRecord, Region};
//!
//! let records: Vec<PileupRecord> = [
//!     "chr1\t1\tA\t4\t..GG\tIIII",
//!     "chr1\t2\tC\t4\t....\tIIII",
//! ]
//! .iter()
//! .map(|line| line.parse().unwrap())
//! .collect();
//!
//! let region: Region = "chr1:1-3".parse().unwrap();
//! let stats = call_region(region, b"ACG", records, ConsensusConfig::default()).unwrap();
//! assert_eq!(stats.consensus_str(), "RCg");
//! assert_eq!(stats.called(), 2);
//! ```

#![warn(missing_debug_implementations)]

pub mod config; // Calling thresholds and parse policy
pub mod fasta; // In-memory reference access
pub mod iupac; // Ambiguity code tables
pub mod pileup; // Record parsing, base counts, consensus
pub mod region; // Region descriptor and aggregator
pub mod sequence; // Nucleotides and sequence helpers
pub mod vcf; // Genotypes and VCF lines

pub use config::{ConfigError, ConsensusConfig, ParseMode};
pub use fasta::{FastaError, FastaReference};
pub use pileup::{
    iupac_consensus, majority_consensus, AlleleFrequency, BaseCounts, ConsensusCall,
    PileupReader, PileupRecord,
};
pub use region::{Orientation, Region, RegionAggregator, RegionError, RegionQuery, RegionStats};
pub use sequence::Nucleotide;
pub use vcf::{Genotype, VariantCall, VcfLine};

/// Fold `records` into `region` and return the finished statistics.
///
/// `reference` holds exactly the forward-strand bases of `region`.
pub fn call_region<I>(
    region: Region,
    reference: &[u8],
    records: I,
    config: ConsensusConfig,
) -> Result<RegionStats, RegionError>
where
    I: IntoIterator<Item = PileupRecord>,
{
    let mut aggregator = RegionAggregator::new(region, reference, config)?;
    aggregator.extend(records);
    Ok(aggregator.finish())
}
