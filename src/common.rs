use anyhow::Result;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::sequence::Direction;

/// Outcome of one input record after a collapse run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqStatus {
    /// The record the seed index was built from.
    Reference,
    /// Retired: aligned against the reference.
    Repeat,
    /// Survived every trial in every pass.
    Unique,
}

impl fmt::Display for SeqStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SeqStatus::Reference => "reference",
            SeqStatus::Repeat => "repeat",
            SeqStatus::Unique => "unique",
        };
        f.write_str(s)
    }
}

/// Where and how a retired query anchored on the reference.
#[derive(Debug, Clone, Copy)]
pub struct MatchDetail {
    pub dir: Direction,
    pub q_off: usize,
    pub r_off: usize,
    pub cost: i32,
    /// Query bases covered by the accepted alignment.
    pub matched: usize,
}

/// One report row. `pass` is the pass that retired the record; for the
/// reference it is 0, for unique records the number of passes survived.
#[derive(Debug, Clone)]
pub struct SeqReport {
    pub seq: usize,
    pub len: usize,
    pub status: SeqStatus,
    pub pass: usize,
    pub detail: Option<MatchDetail>,
}

/// Write report rows as tab-separated values, one per input record, to the
/// given path or stdout. Columns without a value print as `.`.
pub fn write_report(reports: &[SeqReport], out_path: Option<&PathBuf>) -> Result<()> {
    let stdout = io::stdout();
    let mut writer: Box<dyn Write> = if let Some(path) = out_path {
        Box::new(BufWriter::new(File::create(path)?))
    } else {
        Box::new(BufWriter::new(stdout.lock()))
    };

    for report in reports {
        match &report.detail {
            Some(detail) => {
                let dir = match detail.dir {
                    Direction::Forward => '+',
                    Direction::Backward => '-',
                };
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    report.seq,
                    report.len,
                    report.status,
                    report.pass,
                    dir,
                    detail.q_off,
                    detail.r_off,
                    detail.cost,
                    detail.matched
                )?;
            }
            None => {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}\t.\t.\t.\t.\t.",
                    report.seq, report.len, report.status, report.pass
                )?;
            }
        }
    }
    Ok(())
}
