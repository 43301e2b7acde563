use crate::pileup::PileupRecord;

/// Header matching the data lines produced by [`format_record`].
pub const VCF_HEADER: &str = "##fileformat=VCFv3.3\n\
##INFO=DP,1,Integer,\"Total Depth\"\n\
##FORMAT=GT,1,String,\"Genotype\"\n\
##FORMAT=GQ,1,Integer,\"Genotype Quality\"\n\
##FORMAT=DP,1,Integer,\"Read Depth\"\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tDATA\n";

/// Render a pileup record as one VCF data line (without trailing newline).
///
/// Quality columns come from the legacy `-c` fields and are written as
/// integers; records without them report `0`. Returns `None` when no
/// genotype can be derived for the position.
pub fn format_record(record: &PileupRecord) -> Option<String> {
    let call = record.genotype()?;
    let (snp_quality, consensus_quality) = record
        .legacy
        .as_ref()
        .map(|l| (l.snp_quality as i64, l.consensus_quality as i64))
        .unwrap_or((0, 0));

    Some(format!(
        "{}\t{}\t.\t{}\t{}\t{}\t0\tDP={}\tGT:GQ:DP\t{}:{}:{}",
        record.ref_name,
        record.pos,
        call.reference,
        call.alt_field(),
        snp_quality,
        record.coverage,
        call.genotype,
        consensus_quality,
        record.coverage,
    ))
}
