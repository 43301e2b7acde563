use crate::sequence::{Nucleotide, NUM_BASES};

/// Symbol counts decoded from a pileup read-bases column.
///
/// Only symbols that stand for a read base at the position are tallied
/// (`.`/`,`, mismatching letters, `*` placeholders and other base symbols).
/// Read-start markers together with their mapping-quality character, read-end
/// markers and the inserted/deleted sequence following `+N`/`-N` are consumed
/// without being counted as substitution evidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReadBaseTally {
    /// Reads matching the reference (`.` or `,`).
    pub ref_count: u32,
    /// Mismatching reads per nucleotide `[A, C, G, T]`, either strand.
    pub non_ref: [u32; NUM_BASES],
    /// Deletion placeholders (`*`).
    pub deletions: u32,
    /// Other per-read symbols (`N`, reference skips `>`/`<`, unknown bytes).
    pub other: u32,
    /// Insertion or deletion events following a base (`+N...`/`-N...`).
    pub indels: u32,
    /// Read starts (`^`).
    pub read_starts: u32,
    /// Read ends (`$`).
    pub read_ends: u32,
}

impl ReadBaseTally {
    /// Tally the symbols of a read-bases column.
    pub fn from_read_bases(read_bases: &str) -> Self {
        let bytes = read_bases.as_bytes();
        let mut tally = Self::default();
        let mut n = 0usize;

        while n < bytes.len() {
            match bytes[n] {
                b'^' => {
                    // Mapping quality follows the marker.
                    tally.read_starts += 1;
                    n += 2;
                }
                b'$' => {
                    tally.read_ends += 1;
                    n += 1;
                }
                b'.' | b',' => {
                    tally.ref_count += 1;
                    n += 1;
                }
                b'*' => {
                    tally.deletions += 1;
                    n += 1;
                }
                b'+' | b'-' => {
                    let mut offset = n + 1;
                    while offset < bytes.len() && bytes[offset].is_ascii_digit() {
                        offset += 1;
                    }
                    // A length too large for `usize` consumes the rest of the column.
                    let step = match &read_bases[(n + 1)..offset] {
                        "" => 0,
                        digits => {
                            tally.indels += 1;
                            digits.parse::<usize>().unwrap_or(usize::MAX)
                        }
                    };
                    n = offset.saturating_add(step).min(bytes.len());
                }
                byte => {
                    match Nucleotide::from_ascii(byte) {
                        Some(base) => tally.non_ref[base.index()] += 1,
                        None => tally.other += 1,
                    }
                    n += 1;
                }
            }
        }

        tally
    }

    /// Total mismatching reads over all four nucleotides.
    pub fn non_ref_count(&self) -> u32 {
        self.non_ref.iter().sum()
    }

    /// Number of per-read symbols, i.e. the length the quality column should
    /// have.
    pub fn symbol_count(&self) -> u32 {
        self.ref_count + self.non_ref_count() + self.deletions + self.other
    }

    /// Raw mismatch counts as [`BaseCounts`].
    pub fn non_refs(&self) -> BaseCounts {
        BaseCounts(self.non_ref)
    }

    /// Per-nucleotide evidence: mismatch counts with the reference entry
    /// replaced by the reference-match count.
    ///
    /// When the reference base is not a canonical nucleotide the matches
    /// cannot be attributed and only the mismatch counts are returned.
    pub fn base_counts(&self, reference: u8) -> BaseCounts {
        let mut counts = self.non_ref;
        if let Some(base) = Nucleotide::from_ascii(reference) {
            counts[base.index()] = self.ref_count;
        }
        BaseCounts(counts)
    }
}

/// Occurrence count of each nucleotide at a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BaseCounts([u32; NUM_BASES]);

impl BaseCounts {
    /// Construct counts from `[A, C, G, T]`.
    pub fn new(counts: [u32; NUM_BASES]) -> Self {
        Self(counts)
    }

    /// Count for one nucleotide.
    pub fn get(&self, base: Nucleotide) -> u32 {
        self.0[base.index()]
    }

    /// Sum over all nucleotides.
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Largest single count.
    pub fn max(&self) -> u32 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// `(nucleotide, count)` pairs in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = (Nucleotide, u32)> {
        let counts = self.0;
        Nucleotide::ALL.into_iter().map(move |base| (base, counts[base.index()]))
    }

    /// Underlying `[A, C, G, T]` counts.
    pub fn as_array(&self) -> [u32; NUM_BASES] {
        self.0
    }
}

/// Fraction of the position's nucleotide evidence carried by each base.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AlleleFrequency([f64; NUM_BASES]);

impl AlleleFrequency {
    /// Frequencies `count / total`; `None` when no nucleotide was observed.
    pub fn from_counts(counts: &BaseCounts) -> Option<Self> {
        let total = counts.total();
        if total == 0 {
            return None;
        }
        let mut freqs = [0.0; NUM_BASES];
        for (base, count) in counts.iter() {
            freqs[base.index()] = count as f64 / total as f64;
        }
        Some(Self(freqs))
    }

    /// Frequency of one nucleotide.
    pub fn get(&self, base: Nucleotide) -> f64 {
        self.0[base.index()]
    }

    /// Underlying `[A, C, G, T]` frequencies.
    pub fn as_array(&self) -> [f64; NUM_BASES] {
        self.0
    }
}
