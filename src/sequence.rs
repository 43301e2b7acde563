//! Nucleotide alphabet and plain sequence helpers shared by the pileup,
//! region and reference layers.

use crate::iupac;

/// Number of canonical nucleotides tracked per position (A, C, G, T).
pub const NUM_BASES: usize = 4;

/// FASTA line width used when writing consensus sequences.
pub const FASTA_LINE_WIDTH: usize = 80;

/// Canonical DNA nucleotide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Nucleotide {
    /// Adenine.
    A = 0,
    /// Cytosine.
    C = 1,
    /// Guanine.
    G = 2,
    /// Thymine/Uracil.
    T = 3,
}

impl Nucleotide {
    /// All nucleotides in alphabetical order.
    pub const ALL: [Nucleotide; NUM_BASES] =
        [Nucleotide::A, Nucleotide::C, Nucleotide::G, Nucleotide::T];

    /// Attempt to parse an ASCII base (either case; `U` reads as `T`).
    pub fn from_ascii(base: u8) -> Option<Self> {
        match base {
            b'A' | b'a' => Some(Nucleotide::A),
            b'C' | b'c' => Some(Nucleotide::C),
            b'G' | b'g' => Some(Nucleotide::G),
            b'T' | b't' | b'U' | b'u' => Some(Nucleotide::T),
            _ => None,
        }
    }

    /// Index into `[A, C, G, T]` tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Uppercase ASCII representation.
    pub fn as_ascii(self) -> u8 {
        match self {
            Nucleotide::A => b'A',
            Nucleotide::C => b'C',
            Nucleotide::G => b'G',
            Nucleotide::T => b'T',
        }
    }

    /// Uppercase character representation.
    pub fn as_char(self) -> char {
        self.as_ascii() as char
    }

    /// Watson-Crick complement.
    pub fn complement(self) -> Self {
        match self {
            Nucleotide::A => Nucleotide::T,
            Nucleotide::C => Nucleotide::G,
            Nucleotide::G => Nucleotide::C,
            Nucleotide::T => Nucleotide::A,
        }
    }
}

/// Reverse-complement a sequence of ASCII bases.
///
/// IUPAC ambiguity codes are complemented as base sets and the case of each
/// symbol is preserved, so uncalled (lowercase) reference positions stay
/// distinguishable from called (uppercase) positions.
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|&b| iupac::complement(b)).collect()
}

/// Count positions at which two sequences differ, ignoring case.
///
/// Only the overlapping prefix of the two sequences is compared.
pub fn snps_between(left: &[u8], right: &[u8]) -> usize {
    left.iter()
        .zip(right)
        .filter(|(a, b)| !a.eq_ignore_ascii_case(b))
        .count()
}

/// Length of the leading run of characters that are not uppercase ASCII
/// letters.
pub fn upper_case_count(sequence: &[u8]) -> usize {
    sequence
        .iter()
        .take_while(|b| !b.is_ascii_uppercase())
        .count()
}

/// Format a named sequence as FASTA, wrapping the sequence at
/// [`FASTA_LINE_WIDTH`] columns.
pub fn format_fasta(name: &str, sequence: &[u8]) -> String {
    let mut out = String::with_capacity(name.len() + sequence.len() + sequence.len() / 80 + 4);
    out.push('>');
    out.push_str(name);
    out.push('\n');
    for line in sequence.chunks(FASTA_LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nucleotide_parsing_is_case_insensitive() {
        assert_eq!(Nucleotide::from_ascii(b'g'), Some(Nucleotide::G));
        assert_eq!(Nucleotide::from_ascii(b'U'), Some(Nucleotide::T));
        assert_eq!(Nucleotide::from_ascii(b'N'), None);
        assert_eq!(Nucleotide::from_ascii(b'.'), None);
    }

    #[test]
    fn reverse_complement_keeps_case_and_codes() {
        assert_eq!(reverse_complement(b"ACgtN"), b"NacGT".to_vec());
        assert_eq!(reverse_complement(b"RyKm"), b"kMrY".to_vec());
        assert!(reverse_complement(b"").is_empty());
    }

    #[test]
    fn snps_between_ignores_case() {
        assert_eq!(snps_between(b"ACGT", b"acgt"), 0);
        assert_eq!(snps_between(b"ACGT", b"ACGA"), 1);
        assert_eq!(snps_between(b"ACGT", b"RCG"), 1);
    }

    #[test]
    fn upper_case_count_counts_leading_non_upper() {
        assert_eq!(upper_case_count(b"acgTT"), 3);
        assert_eq!(upper_case_count(b"ACGT"), 0);
        assert_eq!(upper_case_count(b"acgt"), 4);
    }

    #[test]
    fn fasta_wraps_at_eighty_columns() {
        let seq = vec![b'A'; 170];
        let fasta = format_fasta("chr1", &seq);
        let lines: Vec<&str> = fasta.lines().collect();
        assert_eq!(lines[0], ">chr1");
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 80);
        assert_eq!(lines[3].len(), 10);
        assert_eq!(lines.len(), 4);
    }
}
