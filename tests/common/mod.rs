#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use pileup_consensus::PileupRecord;

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("PILEUP_CONSENSUS_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set PILEUP_CONSENSUS_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// `ACGT` repeated to `len` bases.
pub fn cyclic_reference(len: usize) -> Vec<u8> {
    b"ACGT".iter().copied().cycle().take(len).collect()
}

/// Six-column mpileup line with one quality per read symbol.
pub fn mpileup_line(entry: &str, pos: u32, ref_base: u8, read_bases: &str) -> String {
    let coverage = read_bases.len();
    format!(
        "{entry}\t{pos}\t{}\t{coverage}\t{read_bases}\t{}",
        ref_base as char,
        "I".repeat(coverage)
    )
}

pub fn record(line: &str) -> PileupRecord {
    line.parse()
        .unwrap_or_else(|err| panic!("fixture line {line:?} should parse: {err}"))
}

/// Complement of an unambiguous uppercase base.
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        other => panic!("no fixture complement for {}", other as char),
    }
}
