use std::fmt;

use crate::iupac;
use crate::sequence::Nucleotide;

/// Diploid genotype relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Genotype {
    /// `0/0`
    HomRef,
    /// `0/1`
    Het,
    /// `1/1`
    HomAlt,
    /// `1/2`
    HetAlt,
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Genotype::HomRef => "0/0",
            Genotype::Het => "0/1",
            Genotype::HomAlt => "1/1",
            Genotype::HetAlt => "1/2",
        })
    }
}

/// One allele of a legacy indel genotype.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum IndelAllele {
    /// Deletion of `n` reference bases (`-ACG` -> `D3`).
    Deletion(usize),
    /// Insertion of the given bases (`+AC` -> `IAC`).
    Insertion(String),
}

impl IndelAllele {
    /// Parse a `-bases`/`+bases` allele; `*` and anything else mean no variant.
    pub fn parse(allele: &str) -> Option<Self> {
        if let Some(deleted) = allele.strip_prefix('-') {
            Some(IndelAllele::Deletion(deleted.len()))
        } else {
            allele
                .strip_prefix('+')
                .map(|inserted| IndelAllele::Insertion(inserted.to_string()))
        }
    }
}

impl fmt::Display for IndelAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndelAllele::Deletion(len) => write!(f, "D{len}"),
            IndelAllele::Insertion(bases) => write!(f, "I{bases}"),
        }
    }
}

/// VCF-style REF/ALT/GT triple for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariantCall {
    /// Reference allele (`*` on indel lines).
    pub reference: String,
    /// Alternate alleles; empty when the genotype is homozygous reference.
    pub alt: Vec<String>,
    /// Genotype.
    pub genotype: Genotype,
}

impl VariantCall {
    /// ALT column: comma-joined alleles, or `.` when there are none.
    pub fn alt_field(&self) -> String {
        if self.alt.is_empty() {
            ".".to_string()
        } else {
            self.alt.join(",")
        }
    }
}

/// Derive the genotype of a substitution/identity position.
///
/// `consensus` is either a single IUPAC code or a string of tied bases; it
/// is decoded into its nucleotides and compared against the reference. ALT
/// lists every decoded base other than the reference, so a tie of three or
/// four bases gives a multi-allelic ALT. The genotype is heterozygous when
/// the reference is among the decoded bases and homozygous-alternate
/// otherwise. Returns `None` if the consensus contains a symbol that is not a
/// nucleotide or IUPAC code.
pub fn derive_snp(reference: u8, consensus: &str) -> Option<VariantCall> {
    let ref_field = (reference as char).to_string();
    if consensus.as_bytes().eq_ignore_ascii_case(&[reference]) {
        return Some(VariantCall {
            reference: ref_field,
            alt: Vec::new(),
            genotype: Genotype::HomRef,
        });
    }

    let decoded = decode_consensus(consensus)?;
    let ref_base = Nucleotide::from_ascii(reference);
    let alt: Vec<String> = decoded
        .iter()
        .filter(|&&base| Some(base) != ref_base)
        .map(|base| base.as_char().to_string())
        .collect();

    let genotype = if alt.is_empty() {
        Genotype::HomRef
    } else if alt.len() < decoded.len() {
        Genotype::Het
    } else {
        Genotype::HomAlt
    };

    Some(VariantCall {
        reference: ref_field,
        alt,
        genotype,
    })
}

/// Derive the genotype of a legacy indel position.
///
/// `consensus` holds two `/`-separated alleles. When both are `*` the
/// alleles are taken from the indel columns instead. Returns `None` when
/// neither haplotype carries a variant.
pub fn derive_indel(
    consensus: &str,
    indel_1: Option<&str>,
    indel_2: Option<&str>,
) -> Option<VariantCall> {
    let mut alleles = consensus.splitn(2, '/');
    let mut first = alleles.next().unwrap_or("*");
    let mut second = alleles.next().unwrap_or("*");
    if first == "*" && second == "*" {
        first = indel_1.unwrap_or("*");
        second = indel_2.unwrap_or("*");
    }

    let (alt, genotype) = match (IndelAllele::parse(first), IndelAllele::parse(second)) {
        (None, None) => return None,
        (Some(allele), None) | (None, Some(allele)) => (vec![allele.to_string()], Genotype::Het),
        (Some(a), Some(b)) if a == b => (vec![a.to_string()], Genotype::HomAlt),
        (Some(a), Some(b)) => (vec![a.to_string(), b.to_string()], Genotype::HetAlt),
    };

    Some(VariantCall {
        reference: "*".to_string(),
        alt,
        genotype,
    })
}

fn decode_consensus(consensus: &str) -> Option<Vec<Nucleotide>> {
    match consensus.as_bytes() {
        [] => None,
        [code] => iupac::from_iupac(*code),
        bases => {
            let mut decoded: Vec<Nucleotide> = bases
                .iter()
                .map(|&b| Nucleotide::from_ascii(b))
                .collect::<Option<_>>()?;
            decoded.sort();
            decoded.dedup();
            Some(decoded)
        }
    }
}
