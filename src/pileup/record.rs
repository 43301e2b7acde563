use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::config::ParseMode;
use crate::pileup::consensus::{iupac_consensus, majority_consensus, ConsensusCall};
use crate::pileup::{AlleleFrequency, BaseCounts, ReadBaseTally};
use crate::vcf::{self, derive_indel, derive_snp, VariantCall};

/// Reference-base column value marking a legacy indel line.
pub const INDEL_MARKER: &str = "*";

/// Errors raised while parsing a pileup line in strict mode.
#[derive(Debug, Error, PartialEq)]
pub enum PileupParseError {
    /// The line has a column count matching no known layout.
    #[error("expected 6 or 10-13 tab-separated fields, found {found}")]
    FieldCount {
        /// Number of fields on the line.
        found: usize,
    },

    /// An integer column could not be parsed.
    #[error("invalid integer in column {field}: '{value}'")]
    InvalidInteger {
        /// Column name.
        field: &'static str,
        /// Raw value.
        value: String,
    },

    /// A quality column could not be parsed.
    #[error("invalid number in column {field}: '{value}'")]
    InvalidFloat {
        /// Column name.
        field: &'static str,
        /// Raw value.
        value: String,
    },

    /// The reference base column is empty.
    #[error("empty reference base column")]
    MissingReferenceBase,

    /// The quality string does not pair one-to-one with the read symbols.
    #[error("{bases} read symbols but {quals} base qualities")]
    QualityLengthMismatch {
        /// Per-read symbols found in the read-bases column.
        bases: u32,
        /// Characters in the quality column.
        quals: usize,
    },
}

/// Column layout a record was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PileupLayout {
    /// Six-column `mpileup` output.
    Mpileup,
    /// Legacy `pileup -c` substitution/identity line (10 columns).
    LegacySnp,
    /// Legacy `pileup -c` indel line (10-13 columns, reference `*`).
    LegacyIndel,
}

/// Columns only present in the legacy `pileup -c` output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LegacyColumns {
    /// Called genotype (IUPAC code, or `a/b` alleles on indel lines).
    pub consensus: String,
    /// Phred-scaled probability that the genotype is wrong.
    pub consensus_quality: f64,
    /// Phred-scaled probability that the genotype equals the reference.
    pub snp_quality: f64,
    /// Root-mean-square mapping quality.
    pub rms_mapq: f64,
    /// Indel alleles and their supporting read counts (indel lines only).
    pub indel: Option<IndelColumns>,
}

/// Trailing columns of a legacy indel line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IndelColumns {
    /// First indel allele.
    pub indel_1: String,
    /// Second indel allele.
    pub indel_2: String,
    /// Reads supporting the first, second and a third allele, when present.
    pub allele_reads: Vec<String>,
}

/// One parsed pileup line.
///
/// The read-bases column is tallied once during parsing; every derived
/// statistic is a pure function of that tally, so repeated queries always
/// return the same value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PileupRecord {
    /// Reference sequence name.
    pub ref_name: String,
    /// 1-based position.
    pub pos: u32,
    /// Reference base as printed (`*` on legacy indel lines).
    pub ref_base: u8,
    /// Number of reads covering the position.
    pub coverage: u32,
    /// Encoded read bases (empty on indel lines).
    pub read_bases: String,
    /// Base qualities (empty on indel lines).
    pub read_quals: String,
    /// Legacy `-c` columns, if the line came from that format.
    pub legacy: Option<LegacyColumns>,
    tally: ReadBaseTally,
}

impl PileupRecord {
    /// Parse one pileup line under the given policy.
    ///
    /// In [`ParseMode::Lenient`] a malformed line yields `Ok(None)`; in
    /// [`ParseMode::Strict`] it yields the parse error.
    pub fn parse(line: &str, mode: ParseMode) -> Result<Option<Self>, PileupParseError> {
        match mode {
            ParseMode::Strict => Self::parse_strict(line).map(Some),
            ParseMode::Lenient => match Self::parse_columns(line) {
                Ok(record) => Ok(Some(record)),
                Err(err) => {
                    debug!(error = %err, line = line.trim_end(), "skipping malformed pileup line");
                    Ok(None)
                }
            },
        }
    }

    /// Strict parsing additionally requires one base quality per read symbol.
    fn parse_strict(line: &str) -> Result<Self, PileupParseError> {
        let record = Self::parse_columns(line)?;
        if record.layout() != PileupLayout::LegacyIndel {
            let bases = record.tally.symbol_count();
            if bases as usize != record.read_quals.len() {
                return Err(PileupParseError::QualityLengthMismatch {
                    bases,
                    quals: record.read_quals.len(),
                });
            }
        }
        Ok(record)
    }

    fn parse_columns(line: &str) -> Result<Self, PileupParseError> {
        let cols: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();

        let record = match cols.len() {
            // 6 columns from mpileup; 10-13 from the deprecated `pileup -c`.
            6 => Self::build(
                cols[0],
                cols[1],
                cols[2],
                cols[3],
                cols[4].to_string(),
                cols[5].to_string(),
                None,
            )?,
            10..=13 => {
                let legacy = |indel: Option<IndelColumns>| -> Result<LegacyColumns, PileupParseError> {
                    Ok(LegacyColumns {
                        consensus: cols[3].to_string(),
                        consensus_quality: parse_float("consensus_quality", cols[4])?,
                        snp_quality: parse_float("snp_quality", cols[5])?,
                        rms_mapq: parse_float("rms_mapq", cols[6])?,
                        indel,
                    })
                };
                if cols[2] == INDEL_MARKER {
                    let indel = IndelColumns {
                        indel_1: cols[8].to_string(),
                        indel_2: cols[9].to_string(),
                        allele_reads: cols[10..].iter().map(|s| s.to_string()).collect(),
                    };
                    Self::build(
                        cols[0],
                        cols[1],
                        cols[2],
                        cols[7],
                        String::new(),
                        String::new(),
                        Some(legacy(Some(indel))?),
                    )?
                } else {
                    Self::build(
                        cols[0],
                        cols[1],
                        cols[2],
                        cols[7],
                        cols[8].to_string(),
                        cols[9].to_string(),
                        Some(legacy(None)?),
                    )?
                }
            }
            found => return Err(PileupParseError::FieldCount { found }),
        };
        Ok(record)
    }

    fn build(
        ref_name: &str,
        pos: &str,
        ref_base: &str,
        coverage: &str,
        read_bases: String,
        read_quals: String,
        legacy: Option<LegacyColumns>,
    ) -> Result<Self, PileupParseError> {
        let ref_base = *ref_base
            .as_bytes()
            .first()
            .ok_or(PileupParseError::MissingReferenceBase)?;
        let tally = ReadBaseTally::from_read_bases(&read_bases);
        Ok(Self {
            ref_name: ref_name.to_string(),
            pos: parse_int("position", pos)?,
            ref_base,
            coverage: parse_int("coverage", coverage)?,
            read_bases,
            read_quals,
            legacy,
            tally,
        })
    }

    /// Column layout of the source line.
    pub fn layout(&self) -> PileupLayout {
        match &self.legacy {
            None => PileupLayout::Mpileup,
            Some(LegacyColumns { indel: None, .. }) => PileupLayout::LegacySnp,
            Some(LegacyColumns { indel: Some(_), .. }) => PileupLayout::LegacyIndel,
        }
    }

    /// Whether this is a legacy indel line.
    pub fn is_indel(&self) -> bool {
        self.ref_base == b'*'
    }

    /// Decoded read-bases tally.
    pub fn tally(&self) -> &ReadBaseTally {
        &self.tally
    }

    /// Mismatch counts per nucleotide, without the reference matches.
    pub fn non_refs(&self) -> BaseCounts {
        self.tally.non_refs()
    }

    /// Total mismatching reads.
    pub fn non_ref_count(&self) -> u32 {
        self.tally.non_ref_count()
    }

    /// Reads matching the reference.
    pub fn ref_count(&self) -> u32 {
        self.tally.ref_count
    }

    /// Nucleotide evidence with the reference entry set to the match count.
    pub fn bases(&self) -> BaseCounts {
        self.tally.base_counts(self.ref_base)
    }

    /// Sum of [`bases`](Self::bases).
    pub fn base_coverage(&self) -> u32 {
        self.bases().total()
    }

    /// Allele frequencies; `None` at positions without nucleotide evidence.
    pub fn allele_freq(&self) -> Option<AlleleFrequency> {
        AlleleFrequency::from_counts(&self.bases())
    }

    /// Consensus for the record: the legacy genotype column when present,
    /// otherwise the majority consensus (ties as alphabetical strings).
    pub fn consensus(&self) -> Option<String> {
        match &self.legacy {
            Some(legacy) => Some(legacy.consensus.clone()),
            None => majority_consensus(
                &self.bases(),
                self.ref_count(),
                self.coverage,
                self.ref_base,
            ),
        }
    }

    /// Threshold (IUPAC) consensus with ratios taken against the coverage.
    pub fn consensus_iupac(&self, min_ratio: f64) -> ConsensusCall {
        iupac_consensus(&self.bases(), self.coverage, self.ref_base, min_ratio)
    }

    /// Derive the VCF REF/ALT/GT triple for this position.
    ///
    /// Returns `None` when the genotype cannot be determined (no consensus,
    /// or an indel line without any variant allele).
    pub fn genotype(&self) -> Option<VariantCall> {
        let consensus = self.consensus()?;
        if self.is_indel() {
            let indel = self.legacy.as_ref().and_then(|l| l.indel.as_ref());
            derive_indel(
                &consensus,
                indel.map(|i| i.indel_1.as_str()),
                indel.map(|i| i.indel_2.as_str()),
            )
        } else {
            derive_snp(self.ref_base, &consensus)
        }
    }

    /// Render as a VCF data line; see [`vcf::format_record`].
    pub fn to_vcf_line(&self) -> Option<String> {
        vcf::format_record(self)
    }
}

impl FromStr for PileupRecord {
    type Err = PileupParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(line)
    }
}

impl fmt::Display for PileupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t",
            self.ref_name, self.pos, self.ref_base as char
        )?;
        match &self.legacy {
            None => write!(
                f,
                "{}\t{}\t{}",
                self.coverage, self.read_bases, self.read_quals
            ),
            Some(legacy) => {
                write!(
                    f,
                    "{}\t{}\t{}\t{}\t{}\t",
                    legacy.consensus,
                    legacy.consensus_quality as i64,
                    legacy.snp_quality as i64,
                    legacy.rms_mapq as i64,
                    self.coverage
                )?;
                match &legacy.indel {
                    None => write!(f, "{}\t{}", self.read_bases, self.read_quals),
                    Some(indel) => {
                        write!(f, "{}\t{}", indel.indel_1, indel.indel_2)?;
                        for reads in &indel.allele_reads {
                            write!(f, "\t{reads}")?;
                        }
                        Ok(())
                    }
                }
            }
        }
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<u32, PileupParseError> {
    value.trim().parse().map_err(|_| PileupParseError::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

fn parse_float(field: &'static str, value: &str) -> Result<f64, PileupParseError> {
    value.trim().parse().map_err(|_| PileupParseError::InvalidFloat {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Nucleotide;

    const SIX_COL: &str = "seq1\t272\tT\t24\t,.$.....,,.,.,...,,,.,..^+.\t<<<+;<<<<<<<<<<<=<;<;7<&";
    const TEN_COL: &str = "seq2\t151\tG\tG\t36\t0\t99\t12\t...........A\t:9<;;7=<<<<<";
    const SNP: &str = "seq1\t272\tT\t24\t,.$.....,,.gGgGgGgGgGgGg^+.\t<<<+;<<<<<<<<<<<=<;<;7<&";
    const SNP_TIE: &str = "seq1\t272\tT\t24\t......aaaaaaggggggcccccc$^+\t<<<+;<<<<<<<<<<<=<;<;7<&";
    const SNP_A: &str = "seq1\t272\tT\t24\t......aaaaaaaagggggccccc$^+\t<<<+;<<<<<<<<<<<=<;<;7<&";
    const INDEL: &str = "seq1\t300\t*\t*/+AC\t50\t50\t60\t20\t*\t+AC\t12\t8\t0";

    fn record(line: &str) -> PileupRecord {
        line.parse().expect("fixture line should parse")
    }

    #[test]
    fn parses_six_column_mpileup() {
        let pile = record(SIX_COL);
        assert_eq!(pile.ref_name, "seq1");
        assert_eq!(pile.pos, 272);
        assert_eq!(pile.ref_base, b'T');
        assert_eq!(pile.coverage, 24);
        assert_eq!(pile.read_bases, ",.$.....,,.,.,...,,,.,..^+.");
        assert_eq!(pile.read_quals, "<<<+;<<<<<<<<<<<=<;<;7<&");
        assert_eq!(pile.layout(), PileupLayout::Mpileup);
    }

    #[test]
    fn parses_ten_column_legacy_line() {
        let pile = record(TEN_COL);
        assert_eq!(pile.ref_name, "seq2");
        assert_eq!(pile.pos, 151);
        assert_eq!(pile.ref_base, b'G');
        assert_eq!(pile.coverage, 12);
        assert_eq!(pile.read_bases, "...........A");
        assert_eq!(pile.read_quals, ":9<;;7=<<<<<");
        let legacy = pile.legacy.as_ref().unwrap();
        assert_eq!(legacy.consensus, "G");
        assert_eq!(legacy.consensus_quality, 36.0);
        assert_eq!(legacy.snp_quality, 0.0);
        assert_eq!(legacy.rms_mapq, 99.0);
        assert_eq!(pile.layout(), PileupLayout::LegacySnp);
    }

    #[test]
    fn parses_legacy_indel_line() {
        let pile = record(INDEL);
        assert!(pile.is_indel());
        assert_eq!(pile.coverage, 20);
        assert!(pile.read_bases.is_empty());
        let indel = pile.legacy.as_ref().unwrap().indel.as_ref().unwrap();
        assert_eq!(indel.indel_1, "*");
        assert_eq!(indel.indel_2, "+AC");
        assert_eq!(indel.allele_reads, vec!["12", "8", "0"]);
        assert_eq!(pile.layout(), PileupLayout::LegacyIndel);
    }

    #[test]
    fn non_ref_counts() {
        assert_eq!(record(TEN_COL).non_refs().as_array(), [1, 0, 0, 0]);
        assert_eq!(record(SIX_COL).non_refs().as_array(), [0, 0, 0, 0]);
        assert_eq!(record(SNP).non_ref_count(), 13);
        assert_eq!(record(SNP_TIE).non_ref_count(), 18);
        assert_eq!(record(SNP_A).non_ref_count(), 18);
    }

    #[test]
    fn ref_counts_complete_the_coverage() {
        for (line, refs) in [(SNP, 11), (SNP_TIE, 6), (SNP_A, 6)] {
            let pile = record(line);
            assert_eq!(pile.ref_count(), refs);
            assert_eq!(pile.ref_count() + pile.non_ref_count(), pile.coverage);
        }
    }

    #[test]
    fn majority_consensus_per_record() {
        assert_eq!(record(SIX_COL).consensus().as_deref(), Some("T"));
        assert_eq!(record(SNP).consensus().as_deref(), Some("G"));
        assert_eq!(record(SNP_TIE).consensus().as_deref(), Some("ACGT"));
        assert_eq!(record(SNP_A).consensus().as_deref(), Some("A"));
        assert_eq!(record(TEN_COL).consensus().as_deref(), Some("G"));
    }

    #[test]
    fn iupac_consensus_is_repeatable() {
        let pile = record(SNP);
        let first = pile.consensus_iupac(0.2);
        assert_eq!(first, ConsensusCall::Called(b'K'));
        assert_eq!(pile.consensus_iupac(0.2), first);
        assert_eq!(pile.consensus_iupac(0.5), ConsensusCall::Called(b'G'));
    }

    #[test]
    fn allele_frequencies_use_reference_matches() {
        let freq = record(TEN_COL).allele_freq().unwrap();
        assert!((freq.get(Nucleotide::A) - 1.0 / 12.0).abs() < 1e-12);
        assert!((freq.get(Nucleotide::G) - 11.0 / 12.0).abs() < 1e-12);
        assert_eq!(record(INDEL).allele_freq(), None);
    }

    #[test]
    fn lenient_mode_skips_malformed_lines() {
        assert_eq!(PileupRecord::parse("seq1\t10\tA", ParseMode::Lenient), Ok(None));
        assert_eq!(
            PileupRecord::parse("seq1\tten\tA\t1\t.\t<", ParseMode::Lenient),
            Ok(None)
        );
    }

    #[test]
    fn lenient_mode_tolerates_quality_mismatch() {
        let pile = PileupRecord::parse("seq1\t10\tA\t2\t..\t<", ParseMode::Lenient)
            .unwrap()
            .unwrap();
        assert_eq!(pile.ref_count(), 2);
    }

    #[test]
    fn oversized_indel_length_does_not_abort_parsing() {
        let line = "chr1\t2\tC\t2\t.+18446744073709551615A.\tII";
        let pile = PileupRecord::parse(line, ParseMode::Lenient).unwrap().unwrap();
        assert_eq!(pile.ref_count(), 1);
        assert_eq!(pile.coverage, 2);
    }

    #[test]
    fn strict_mode_reports_malformed_lines() {
        assert_eq!(
            PileupRecord::parse("seq1\t10\tA", ParseMode::Strict),
            Err(PileupParseError::FieldCount { found: 3 })
        );
        assert!(matches!(
            PileupRecord::parse("seq1\tten\tA\t1\t.\t<", ParseMode::Strict),
            Err(PileupParseError::InvalidInteger { field: "position", .. })
        ));
        assert_eq!(
            PileupRecord::parse("seq1\t10\tA\t2\t..\t<", ParseMode::Strict),
            Err(PileupParseError::QualityLengthMismatch { bases: 2, quals: 1 })
        );
    }

    #[test]
    fn display_restores_the_line_shape() {
        for line in [SIX_COL, TEN_COL, INDEL] {
            assert_eq!(record(line).to_string(), line);
        }
        assert_eq!(record(&format!("{SIX_COL}\n")).to_string(), SIX_COL);
    }
}
