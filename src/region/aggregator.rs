use bitvec::prelude::*;
use tracing::debug;

use crate::config::ConsensusConfig;
use crate::iupac;
use crate::pileup::{AlleleFrequency, BaseCounts, PileupRecord};
use crate::region::{Region, RegionError};
use crate::sequence::{self, Nucleotide};

/// Single-pass fold of pileup records into one region.
///
/// The reference buffer starts as the lowercased reference of the span and
/// each record whose coverage exceeds `min_cov` overwrites its position with
/// the uppercased threshold consensus. Positions that receive no such record
/// keep their lowercase reference base. The aggregator owns its buffers
/// exclusively; partial state is inspectable through [`called`](Self::called)
/// and [`total_cov`](Self::total_cov) at any point.
#[derive(Debug)]
pub struct RegionAggregator {
    region: Region,
    config: ConsensusConfig,
    reference: Vec<u8>,
    buffer: Vec<u8>,
    coverages: Vec<u32>,
    bases: Vec<BaseCounts>,
    allele_freq: Vec<AlleleFrequency>,
    called_mask: BitVec,
    total_cov: u64,
    out_of_span: usize,
    indel_lines: usize,
}

impl RegionAggregator {
    /// Start aggregating `region` over its forward-strand reference.
    ///
    /// `reference` must hold exactly the `region.len()` bases starting at
    /// `region.start()`.
    pub fn new(
        region: Region,
        reference: &[u8],
        config: ConsensusConfig,
    ) -> Result<Self, RegionError> {
        let len = region.len();
        if reference.len() != len {
            return Err(RegionError::ReferenceLength {
                expected: len,
                found: reference.len(),
            });
        }

        let reference = reference.to_ascii_lowercase();
        Ok(Self {
            buffer: reference.clone(),
            reference,
            coverages: vec![0; len],
            bases: vec![BaseCounts::default(); len],
            allele_freq: vec![AlleleFrequency::default(); len],
            called_mask: bitvec![0; len],
            total_cov: 0,
            out_of_span: 0,
            indel_lines: 0,
            region,
            config,
        })
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Fold one record into the region.
    ///
    /// Records outside the span (other entry or position) are ignored and do
    /// not contribute to the total coverage. Legacy indel lines share their
    /// position with the substitution line and are ignored as well.
    pub fn push(&mut self, record: &PileupRecord) {
        if record.is_indel() {
            self.indel_lines += 1;
            return;
        }

        let offset = match self.region.offset_of(record.pos) {
            Some(offset) if record.ref_name == self.region.entry() => offset,
            _ => {
                debug!(
                    entry = %record.ref_name,
                    pos = record.pos,
                    region = %self.region,
                    "ignoring pileup record outside region"
                );
                self.out_of_span += 1;
                return;
            }
        };

        if record.coverage > self.config.min_cov {
            let call = record.consensus_iupac(self.config.min_per);
            self.buffer[offset] = call.as_byte().to_ascii_uppercase();
            self.coverages[offset] = record.coverage;
            self.bases[offset] = record.bases();
            self.allele_freq[offset] = record.allele_freq().unwrap_or_default();
            self.called_mask.set(offset, true);
        }
        self.total_cov += u64::from(record.coverage);
    }

    /// Parse and fold one pileup line under the configured parse mode.
    ///
    /// Returns `Ok(false)` when a lenient parse dropped the line.
    pub fn push_line(&mut self, line: &str) -> Result<bool, crate::pileup::PileupParseError> {
        match PileupRecord::parse(line, self.config.parse_mode)? {
            Some(record) => {
                self.push(&record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Positions called so far.
    pub fn called(&self) -> usize {
        self.called_mask.count_ones()
    }

    /// Coverage summed over every in-span record seen so far.
    pub fn total_cov(&self) -> u64 {
        self.total_cov
    }

    /// Records ignored for falling outside the region.
    pub fn out_of_span(&self) -> usize {
        self.out_of_span
    }

    /// Legacy indel lines ignored so far.
    pub fn indel_lines(&self) -> usize {
        self.indel_lines
    }

    /// Assemble the consensus and return the region statistics.
    pub fn finish(self) -> RegionStats {
        let len = self.region.len();
        let (consensus, reference) = if self.region.is_reverse() {
            (
                sequence::reverse_complement(&self.buffer),
                sequence::reverse_complement(&self.reference),
            )
        } else {
            (self.buffer, self.reference)
        };
        let average_coverage = (len > 0).then(|| self.total_cov as f64 / len as f64);

        let stats = RegionStats {
            region: self.region,
            reference,
            consensus,
            coverages: self.coverages,
            bases: self.bases,
            allele_freq: self.allele_freq,
            called_mask: self.called_mask,
            total_cov: self.total_cov,
            average_coverage,
        };
        debug!(
            region = %stats.region,
            called = stats.called(),
            total_cov = stats.total_cov,
            indel_lines = self.indel_lines,
            snp_distance = stats.snp_distance(),
            "region consensus assembled"
        );
        stats
    }
}

impl Extend<PileupRecord> for RegionAggregator {
    fn extend<I: IntoIterator<Item = PileupRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(&record);
        }
    }
}

impl<'a> Extend<&'a PileupRecord> for RegionAggregator {
    fn extend<I: IntoIterator<Item = &'a PileupRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

/// Finalised statistics of one region.
///
/// Per-position arrays are indexed by forward offset (`pos - start`); the
/// `consensus` and `reference` sequences are in region orientation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegionStats {
    pub region: Region,
    /// Lowercased reference in region orientation.
    pub reference: Vec<u8>,
    /// Uppercase at called positions, lowercase reference elsewhere.
    pub consensus: Vec<u8>,
    pub coverages: Vec<u32>,
    pub bases: Vec<BaseCounts>,
    /// All-zero at positions never called.
    pub allele_freq: Vec<AlleleFrequency>,
    called_mask: BitVec,
    pub total_cov: u64,
    /// `None` for a zero-length region.
    pub average_coverage: Option<f64>,
}

impl RegionStats {
    /// Number of called positions.
    pub fn called(&self) -> usize {
        self.called_mask.count_ones()
    }

    /// Whether the position at forward offset `offset` was called.
    pub fn is_called(&self, offset: usize) -> bool {
        self.called_mask.get(offset).is_some_and(|bit| *bit)
    }

    /// Frequency of `base` at every forward offset.
    pub fn allele_freq_for_base(&self, base: Nucleotide) -> Vec<f64> {
        self.allele_freq.iter().map(|freq| freq.get(base)).collect()
    }

    /// Positions at which the consensus differs from the reference.
    pub fn snp_distance(&self) -> usize {
        sequence::snps_between(&self.reference, &self.consensus)
    }

    /// Number of IUPAC ambiguity codes in the consensus.
    pub fn ambiguity_count(&self) -> usize {
        iupac::count_ambiguities(&self.consensus)
    }

    /// Consensus as a string.
    pub fn consensus_str(&self) -> String {
        String::from_utf8_lossy(&self.consensus).into_owned()
    }

    /// FASTA record named after the region, wrapped at 80 columns.
    pub fn to_fasta(&self) -> String {
        sequence::format_fasta(&self.region.to_string(), &self.consensus)
    }
}
