//! VCF genotype derivation from pileup consensus calls, VCF line output for
//! pileup records, and a reader for existing VCF data lines.

mod genotype;
mod line;
mod writer;

pub use genotype::{derive_indel, derive_snp, Genotype, IndelAllele, VariantCall};
pub use line::{SampleValues, VcfError, VcfLine};
pub use writer::{format_record, VCF_HEADER};
