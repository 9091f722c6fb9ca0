//! Repeat detection against a spaced-seed index.
//!
//! One pass builds the seed index for the current reference, scans every
//! remaining query for candidate anchors near both of its ends, confirms
//! candidates with the banded aligner, and retires the queries that align.
//! With `--refine`, retired queries vote a consensus that becomes the next
//! pass's reference.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::cell::RefCell;
use std::path::PathBuf;

use crate::align::{self, Alignment, BandWorkspace};
use crate::common::{write_report, MatchDetail, SeqReport, SeqStatus};
use crate::seed::{parse_pattern, SeedMap, SEED_WINDOW};
use crate::sequence::{Direction, PackedSeq};
use crate::store::SeqStore;
use crate::vote::Consensus;

/// Trial offsets probed per query per scan direction.
pub const N_TRIAL: usize = 20;

#[derive(Args, Debug)]
pub struct CollapseArgs {
    /// Packed sequence file
    #[arg(short, long)]
    pub input: PathBuf,
    /// Spaced-seed pattern over {0,1}, up to 16 positions
    #[arg(short, long)]
    pub pattern: String,
    /// Maximum difference ratio accepted by the aligner
    #[arg(short, long, default_value_t = align::MAX_RATIO)]
    pub ratio: f64,
    /// Trial offsets probed per query per direction
    #[arg(long, default_value_t = N_TRIAL)]
    pub trials: usize,
    /// Rebuild the reference from retired queries and run further passes
    #[arg(long, default_value_t = false)]
    pub refine: bool,
    #[arg(short = 'n', long, default_value_t = 0)]
    pub num_threads: usize,
    /// Report output (stdout when omitted)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

thread_local! {
    /// Per-thread aligner workspace, reused across every candidate a worker
    /// confirms.
    static ALIGN_MEM: RefCell<BandWorkspace> = RefCell::new(BandWorkspace::new());
}

/// A query confirmed against the reference.
pub struct QueryMatch {
    pub dir: Direction,
    pub q_off: usize,
    pub r_off: usize,
    pub alignment: Alignment,
}

impl QueryMatch {
    /// Reference position of the first base the edit script consumes.
    pub fn ref_start(&self) -> usize {
        match self.dir {
            Direction::Forward => self.r_off,
            Direction::Backward => self.r_off + SEED_WINDOW - 1,
        }
    }
}

/// Try every candidate anchor of one probe; first alignment wins.
fn try_anchor(
    query: &PackedSeq,
    reference: &PackedSeq,
    map: &SeedMap,
    q_off: usize,
    dir: Direction,
    ratio: f64,
    workspace: &mut BandWorkspace,
) -> Option<QueryMatch> {
    for &r_off in map.probe(query, q_off) {
        let r_off = r_off as usize;
        let (mut seg_a, mut seg_b) = match dir {
            Direction::Forward => (
                reference.accessor(r_off, Direction::Forward),
                query.accessor(q_off, Direction::Forward),
            ),
            Direction::Backward => (
                reference.accessor(r_off + SEED_WINDOW - 1, Direction::Backward),
                query.accessor(q_off + SEED_WINDOW - 1, Direction::Backward),
            ),
        };
        if let Some(alignment) = align::align(&mut seg_a, &mut seg_b, ratio, workspace) {
            return Some(QueryMatch {
                dir,
                q_off,
                r_off,
                alignment,
            });
        }
    }
    None
}

/// Scan one query for an alignment against the reference.
///
/// Probes the seed index at up to `trials` offsets, each trial forward from
/// the query's start and backward from its end, and stops at the first
/// candidate the aligner confirms. Queries shorter than the seed window
/// have no trial offsets and never match.
pub fn scan_query(
    query: &PackedSeq,
    reference: &PackedSeq,
    map: &SeedMap,
    ratio: f64,
    trials: usize,
    workspace: &mut BandWorkspace,
) -> Option<QueryMatch> {
    if query.len() < SEED_WINDOW {
        return None;
    }
    let last_window = query.len() - SEED_WINDOW;
    for trial in 0..trials.min(last_window + 1) {
        if let Some(found) = try_anchor(
            query,
            reference,
            map,
            trial,
            Direction::Forward,
            ratio,
            workspace,
        ) {
            return Some(found);
        }
        if let Some(found) = try_anchor(
            query,
            reference,
            map,
            last_window - trial,
            Direction::Backward,
            ratio,
            workspace,
        ) {
            return Some(found);
        }
    }
    None
}

pub fn run(args: CollapseArgs) -> Result<()> {
    let num_threads = if args.num_threads == 0 {
        num_cpus::get()
    } else {
        args.num_threads
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .context("Failed to build thread pool")?;

    let store = SeqStore::load(&args.input)?;
    let ref_idx = match store.longest() {
        Some(idx) => idx,
        None => return Ok(()),
    };

    let mask = parse_pattern(&args.pattern);
    if mask == 0 {
        eprintln!("[WARN] seed pattern selects no positions; every window will collide");
    }
    if args.verbose {
        eprintln!(
            "[INFO] {} sequences, reference is record {} ({} bases), seed mask {:#010x}",
            store.len(),
            ref_idx,
            store.seqs[ref_idx].len(),
            mask
        );
    }

    let mut reference = store.seqs[ref_idx].clone();
    let mut remaining: Vec<usize> = (0..store.len()).filter(|&i| i != ref_idx).collect();
    let mut reports: Vec<Option<SeqReport>> = vec![None; store.len()];
    reports[ref_idx] = Some(SeqReport {
        seq: ref_idx,
        len: store.seqs[ref_idx].len(),
        status: SeqStatus::Reference,
        pass: 0,
        detail: None,
    });

    let mut pass = 0usize;
    loop {
        pass += 1;
        let map = SeedMap::build(&reference, mask);
        if args.verbose {
            eprintln!(
                "[INFO] pass {}: seed index holds {} positions under {} keys",
                pass,
                map.num_positions(),
                map.num_keys()
            );
        }

        let bar = ProgressBar::new(remaining.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap(),
        );

        let outcomes: Vec<(usize, Option<QueryMatch>)> = remaining
            .par_iter()
            .map(|&idx| {
                let found = ALIGN_MEM.with(|mem| {
                    scan_query(
                        &store.seqs[idx],
                        &reference,
                        &map,
                        args.ratio,
                        args.trials,
                        &mut mem.borrow_mut(),
                    )
                });
                bar.inc(1);
                (idx, found)
            })
            .collect();
        bar.finish_and_clear();

        let mut consensus = Consensus::seeded_from(&reference);
        let mut retired = 0usize;
        let mut survivors = Vec::new();
        for (idx, outcome) in outcomes {
            match outcome {
                Some(found) => {
                    consensus.record(&found.alignment.edits, found.ref_start(), found.dir);
                    reports[idx] = Some(SeqReport {
                        seq: idx,
                        len: store.seqs[idx].len(),
                        status: SeqStatus::Repeat,
                        pass,
                        detail: Some(MatchDetail {
                            dir: found.dir,
                            q_off: found.q_off,
                            r_off: found.r_off,
                            cost: found.alignment.cost,
                            matched: found.alignment.matlen_b,
                        }),
                    });
                    retired += 1;
                }
                None => survivors.push(idx),
            }
        }
        remaining = survivors;

        if args.verbose {
            eprintln!(
                "[INFO] pass {}: retired {} queries, {} remaining",
                pass,
                retired,
                remaining.len()
            );
        }

        if args.refine && retired > 0 && !remaining.is_empty() {
            reference = consensus.synthesize();
            continue;
        }
        break;
    }

    for idx in remaining {
        reports[idx] = Some(SeqReport {
            seq: idx,
            len: store.seqs[idx].len(),
            status: SeqStatus::Unique,
            pass,
            detail: None,
        });
    }

    let reports: Vec<SeqReport> = reports.into_iter().flatten().collect();
    let repeats = reports
        .iter()
        .filter(|r| r.status == SeqStatus::Repeat)
        .count();
    write_report(&reports, args.out.as_ref())?;
    eprintln!(
        "collapsed {} of {} sequences in {} pass{}",
        repeats,
        reports.len(),
        pass,
        if pass == 1 { "" } else { "es" }
    );
    Ok(())
}
