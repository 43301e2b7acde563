use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pileup_consensus::vcf::VCF_HEADER;
use pileup_consensus::{
    ConsensusConfig, FastaReference, ParseMode, PileupReader, Region, RegionAggregator,
    RegionQuery, RegionStats,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pileup-consensus",
    about = "Consensus sequences and VCF genotypes from samtools pileup output"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite reference entries with the consensus called from pileup lines.
    Consensus {
        /// Reference FASTA with the contigs.
        #[arg(long, short = 'r')]
        reference: PathBuf,
        /// Pileup lines (`-` for stdin).
        #[arg(long, short = 'p', default_value = "-")]
        pileup: PathBuf,
        /// Restrict to one region (`entry:start-end`, reversed bounds for the minus strand).
        #[arg(long)]
        region: Option<String>,
        /// Positions need strictly more reads than this to be called.
        #[arg(long, short = 'm', default_value_t = 5)]
        min_cov: u32,
        /// Minimum percentage for a base to enter the call; several passing
        /// bases produce an ambiguity code.
        #[arg(long, default_value_t = 50.0)]
        min_percentage: f64,
        /// File listing the entries to process, one per line.
        #[arg(long, short = 'f')]
        filter_entries: Option<PathBuf>,
        /// Only write entries whose consensus differs from the reference.
        #[arg(long)]
        only_changed: bool,
        /// Fail on malformed pileup lines instead of skipping them.
        #[arg(long)]
        strict: bool,
        /// Output FASTA (default: stdout).
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Convert legacy `pileup -c` lines into VCF.
    Vcf {
        /// Pileup lines (`-` for stdin).
        #[arg(long, short = 'p', default_value = "-")]
        pileup: PathBuf,
        /// Fail on malformed pileup lines instead of skipping them.
        #[arg(long)]
        strict: bool,
        /// Output VCF (default: stdout).
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Consensus {
            reference,
            pileup,
            region,
            min_cov,
            min_percentage,
            filter_entries,
            only_changed,
            strict,
            output,
        } => {
            let config = ConsensusConfig::new(min_cov, min_percentage / 100.0)
                .context("invalid calling thresholds")?
                .with_parse_mode(parse_mode(strict));
            let options = ConsensusOptions {
                region,
                filter_entries,
                only_changed,
            };
            run_consensus(&reference, &pileup, output.as_deref(), config, options)?
        }
        Commands::Vcf {
            pileup,
            strict,
            output,
        } => run_vcf(&pileup, output.as_deref(), parse_mode(strict))?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn parse_mode(strict: bool) -> ParseMode {
    if strict {
        ParseMode::Strict
    } else {
        ParseMode::Lenient
    }
}

struct ConsensusOptions {
    region: Option<String>,
    filter_entries: Option<PathBuf>,
    only_changed: bool,
}

fn run_consensus(
    reference_path: &Path,
    pileup_path: &Path,
    output_path: Option<&Path>,
    config: ConsensusConfig,
    options: ConsensusOptions,
) -> Result<()> {
    let reference = FastaReference::from_path(reference_path)
        .with_context(|| format!("failed to load reference {}", reference_path.display()))?;
    let reader = PileupReader::new(open_input(pileup_path)?, config.parse_mode);
    let mut output = open_output(output_path)?;

    let stats = match &options.region {
        Some(text) => {
            let region = RegionQuery::Raw(text.clone()).resolve()?;
            let sequence = reference
                .fetch_forward(&region)
                .with_context(|| format!("failed to fetch {region}"))?;
            let mut aggregator = RegionAggregator::new(region, sequence, config)?;
            for record in reader {
                aggregator.push(&record?);
            }
            vec![aggregator.finish()]
        }
        None => {
            let wanted = match &options.filter_entries {
                Some(path) => Some(read_entry_filter(path)?),
                None => None,
            };
            call_entries(&reference, reader, config, wanted.as_ref())?
        }
    };

    let mut written = 0usize;
    for region_stats in &stats {
        if options.only_changed && region_stats.snp_distance() == 0 {
            continue;
        }
        write!(output, "{}", fasta_record(region_stats, options.region.is_some()))?;
        written += 1;
    }
    output.flush()?;
    info!(regions = stats.len(), written, "consensus written");

    Ok(())
}

/// One aggregator per reference entry, each spanning the whole entry.
fn call_entries<R: BufRead>(
    reference: &FastaReference,
    reader: PileupReader<R>,
    config: ConsensusConfig,
    wanted: Option<&HashSet<String>>,
) -> Result<Vec<RegionStats>> {
    let mut order = Vec::new();
    let mut aggregators: HashMap<String, RegionAggregator> = HashMap::new();
    for entry in reference.entries() {
        if wanted.is_some_and(|set| !set.contains(&entry.name)) {
            continue;
        }
        let end = u32::try_from(entry.sequence.len() + 1)
            .with_context(|| format!("entry {} is too long", entry.name))?;
        let region = Region::new(entry.name.clone(), 1, end);
        aggregators.insert(
            entry.name.clone(),
            RegionAggregator::new(region, &entry.sequence, config.clone())?,
        );
        order.push(entry.name.clone());
    }

    let mut unknown = 0usize;
    for record in reader {
        let record = record?;
        match aggregators.get_mut(&record.ref_name) {
            Some(aggregator) => aggregator.push(&record),
            None => unknown += 1,
        }
    }
    if unknown > 0 {
        warn!(records = unknown, "pileup records for entries not processed");
    }

    Ok(order
        .iter()
        .filter_map(|name| aggregators.remove(name))
        .map(RegionAggregator::finish)
        .collect())
}

fn fasta_record(stats: &RegionStats, name_by_region: bool) -> String {
    if name_by_region {
        stats.to_fasta()
    } else {
        pileup_consensus::sequence::format_fasta(stats.region.entry(), &stats.consensus)
    }
}

fn run_vcf(pileup_path: &Path, output_path: Option<&Path>, mode: ParseMode) -> Result<()> {
    let reader = PileupReader::new(open_input(pileup_path)?, mode);
    let mut output = open_output(output_path)?;

    output.write_all(VCF_HEADER.as_bytes())?;
    let (mut lines, mut no_call) = (0usize, 0usize);
    for record in reader {
        match record?.to_vcf_line() {
            Some(line) => {
                writeln!(output, "{line}")?;
                lines += 1;
            }
            None => no_call += 1,
        }
    }
    output.flush()?;
    info!(lines, no_call, "vcf written");

    Ok(())
}

fn read_entry_filter(path: &Path) -> Result<HashSet<String>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open entry list {}", path.display()))?;
    let mut entries = HashSet::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            entries.insert(name.to_string());
        }
    }
    Ok(entries)
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path)
        .with_context(|| format!("failed to open pileup file {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}
