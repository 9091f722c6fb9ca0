//! Per-position base voting for consensus synthesis.

use crate::align::EditOp;
use crate::sequence::{Direction, PackedSeq};

/// Saturating tally of the four bases observed at one reference position.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vote {
    a: u8,
    c: u8,
    g: u8,
    t: u8,
}

impl Vote {
    /// Count one observation of the given 2-bit base code.
    pub fn add(&mut self, code: u8) {
        match code {
            0 => self.a = self.a.saturating_add(1),
            1 => self.c = self.c.saturating_add(1),
            2 => self.g = self.g.saturating_add(1),
            _ => self.t = self.t.saturating_add(1),
        }
    }

    /// The tally for one base code.
    pub fn count(&self, code: u8) -> u8 {
        match code {
            0 => self.a,
            1 => self.c,
            2 => self.g,
            _ => self.t,
        }
    }

    /// Majority base code. A base wins only with a strict majority, probed
    /// in A, C, G order; T is the fallback on ties.
    pub fn call(&self) -> u8 {
        if self.a > self.c && self.a > self.g && self.a > self.t {
            0
        } else if self.c > self.a && self.c > self.g && self.c > self.t {
            1
        } else if self.g > self.a && self.g > self.c && self.g > self.t {
            2
        } else {
            3
        }
    }
}

/// Vote tallies over every position of the current reference.
///
/// Seeded with one vote per reference base so uncovered positions keep
/// their call, accumulated over one pass, consumed once by
/// [`Consensus::synthesize`], then discarded.
pub struct Consensus {
    votes: Vec<Vote>,
}

impl Consensus {
    pub fn seeded_from(reference: &PackedSeq) -> Self {
        let mut votes = vec![Vote::default(); reference.len()];
        for (i, vote) in votes.iter_mut().enumerate() {
            vote.add(reference.base(i));
        }
        Self { votes }
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Fold one aligned query into the tallies.
    ///
    /// The edit script is walked with a reference cursor starting at
    /// `ref_start` and stepping along `dir`: a match votes the consumed
    /// query base at the cursor, a delete only moves the cursor, an insert
    /// consumes query without touching the reference.
    pub fn record(&mut self, edits: &[EditOp], ref_start: usize, dir: Direction) {
        let mut pos = ref_start as isize;
        for op in edits {
            match *op {
                EditOp::Match(base) => {
                    if let Some(vote) = usize::try_from(pos)
                        .ok()
                        .and_then(|p| self.votes.get_mut(p))
                    {
                        vote.add(base);
                    }
                    pos += dir.step();
                }
                EditOp::Delete => {
                    pos += dir.step();
                }
                EditOp::Insert(_) => {}
            }
        }
    }

    /// Majority-call every position into a fresh reference sequence.
    pub fn synthesize(&self) -> PackedSeq {
        let codes: Vec<u8> = self.votes.iter().map(Vote::call).collect();
        PackedSeq::from_codes(&codes)
    }
}
