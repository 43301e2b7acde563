//! IUPAC nucleotide ambiguity codes.
//!
//! Codes are stored as a fixed table indexed by a 4-bit base set
//! (`A = 1, C = 2, G = 4, T = 8`). The reverse view maps a code back to its
//! base set, so encoding and decoding share one source of truth.

use crate::sequence::Nucleotide;

/// IUPAC code for every non-empty subset of `{A, C, G, T}`, indexed by mask.
const CODE_BY_MASK: [u8; 16] = [
    0, b'A', b'C', b'M', b'G', b'R', b'S', b'V', b'T', b'W', b'Y', b'H', b'K', b'D', b'B', b'N',
];

/// Set of canonical nucleotides, packed as a 4-bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BaseSet(u8);

impl BaseSet {
    /// Empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Add a nucleotide to the set.
    pub fn insert(&mut self, base: Nucleotide) {
        self.0 |= 1 << base.index();
    }

    /// Whether `base` belongs to the set.
    pub fn contains(&self, base: Nucleotide) -> bool {
        self.0 & (1 << base.index()) != 0
    }

    /// Returns `true` when no nucleotide has been added.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of nucleotides in the set.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = Nucleotide> {
        let set = *self;
        Nucleotide::ALL.into_iter().filter(move |b| set.contains(*b))
    }

    /// Uppercase IUPAC code for the set.
    ///
    /// # Panics
    /// Panics if the set is empty: every caller builds the set from observed
    /// bases, so an empty set here is a logic error.
    pub fn code(&self) -> u8 {
        assert!(!self.is_empty(), "empty base set has no IUPAC code");
        CODE_BY_MASK[self.0 as usize]
    }

    /// Base set denoted by an IUPAC code (either case).
    pub fn from_code(code: u8) -> Option<Self> {
        let mask = match code.to_ascii_uppercase() {
            b'U' => 8,
            upper => CODE_BY_MASK.iter().position(|&c| c != 0 && c == upper)? as u8,
        };
        Some(Self(mask))
    }
}

impl FromIterator<Nucleotide> for BaseSet {
    fn from_iter<I: IntoIterator<Item = Nucleotide>>(iter: I) -> Self {
        let mut set = BaseSet::empty();
        for base in iter {
            set.insert(base);
        }
        set
    }
}

/// Encode a collection of ASCII bases as an uppercase IUPAC code.
///
/// Input order, case and duplicates do not matter. Returns `None` for an empty
/// input or for symbols outside `ACGTU`.
pub fn to_iupac<I>(bases: I) -> Option<char>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut set = BaseSet::empty();
    for base in bases {
        for &byte in base.as_ref().as_bytes() {
            set.insert(Nucleotide::from_ascii(byte)?);
        }
    }
    if set.is_empty() {
        None
    } else {
        Some(set.code() as char)
    }
}

/// Decode an IUPAC code into its nucleotides, alphabetically ordered.
pub fn from_iupac(code: u8) -> Option<Vec<Nucleotide>> {
    BaseSet::from_code(code).map(|set| set.iter().collect())
}

/// Whether `base` is one of `acgtACGT`.
pub fn is_unambiguous(base: u8) -> bool {
    matches!(base.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

/// Whether the IUPAC `code` admits `base`.
pub fn is_valid(code: u8, base: u8) -> bool {
    match (BaseSet::from_code(code), Nucleotide::from_ascii(base)) {
        (Some(set), Some(base)) => set.contains(base),
        _ => false,
    }
}

/// Number of symbols in `sequence` that are not unambiguous nucleotides.
pub fn count_ambiguities(sequence: &[u8]) -> usize {
    sequence.iter().filter(|&&b| !is_unambiguous(b)).count()
}

/// Complement of a single ASCII symbol, preserving case.
///
/// Ambiguity codes complement as base sets (`R <-> Y`, `B <-> V`, ...).
/// Symbols outside the IUPAC alphabet are returned unchanged.
pub fn complement(symbol: u8) -> u8 {
    let Some(set) = BaseSet::from_code(symbol) else {
        return symbol;
    };
    let complemented: BaseSet = set.iter().map(Nucleotide::complement).collect();
    let code = complemented.code();
    if symbol.is_ascii_lowercase() {
        code.to_ascii_lowercase()
    } else {
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&["a", "g"], 'R')]
    #[test_case(&["C", "T"], 'Y')]
    #[test_case(&["a", "t"], 'W')]
    #[test_case(&["g", "c"], 'S')]
    #[test_case(&["g", "t"], 'K')]
    #[test_case(&["a", "c"], 'M')]
    #[test_case(&["c", "g", "t"], 'B')]
    #[test_case(&["a", "g", "t"], 'D')]
    #[test_case(&["a", "c", "t"], 'H')]
    #[test_case(&["a", "c", "g"], 'V')]
    #[test_case(&["a", "c", "g", "t"], 'N')]
    #[test_case(&["t"], 'T')]
    #[test_case(&["g", "g", "a"], 'R')]
    fn encodes_base_sets(bases: &[&str], expected: char) {
        assert_eq!(to_iupac(bases), Some(expected));
    }

    #[test]
    fn r_decodes_to_a_and_g() {
        assert_eq!(to_iupac(["a", "g"]), Some('R'));
        assert_eq!(from_iupac(b'R'), Some(vec![Nucleotide::A, Nucleotide::G]));
        assert_eq!(from_iupac(b'r'), Some(vec![Nucleotide::A, Nucleotide::G]));
    }

    #[test]
    fn rejects_unknown_symbols() {
        assert_eq!(to_iupac(["a", "x"]), None);
        assert_eq!(to_iupac(Vec::<&str>::new()), None);
        assert_eq!(from_iupac(b'*'), None);
        assert_eq!(from_iupac(b'.'), None);
    }

    #[test]
    fn every_code_round_trips_through_its_base_set() {
        for mask in 1u8..16 {
            let code = CODE_BY_MASK[mask as usize];
            assert_eq!(BaseSet::from_code(code), Some(BaseSet(mask)));
        }
    }

    #[test]
    fn membership_checks() {
        assert!(is_valid(b'R', b'a'));
        assert!(is_valid(b'n', b'T'));
        assert!(!is_valid(b'Y', b'G'));
        assert!(!is_valid(b'*', b'A'));
        assert!(is_unambiguous(b'c'));
        assert!(!is_unambiguous(b'N'));
        assert_eq!(count_ambiguities(b"ACRTnY"), 3);
    }

    #[test]
    fn complements_ambiguity_codes() {
        assert_eq!(complement(b'R'), b'Y');
        assert_eq!(complement(b'b'), b'v');
        assert_eq!(complement(b'N'), b'N');
        assert_eq!(complement(b'S'), b'S');
        assert_eq!(complement(b'-'), b'-');
    }

    #[test]
    #[should_panic(expected = "empty base set")]
    fn empty_set_has_no_code() {
        BaseSet::empty().code();
    }
}
