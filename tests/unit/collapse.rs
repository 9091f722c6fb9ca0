//! End-to-end repeat detection over a small synthetic store.

use repseed::algorithm::collapse::scan_query;
use repseed::align::BandWorkspace;
use repseed::seed::{parse_pattern, SeedMap};
use repseed::sequence::{Direction, PackedSeq};
use repseed::vote::Consensus;

use crate::helpers::{random_text, substitute};

const PATTERN: &str = "1111111111111111";

#[test]
fn test_driver_scenario_retires_repeats_only() {
    let ref_text = random_text(400, 11);
    let reference = PackedSeq::from_text(&ref_text).unwrap();

    let exact_copy = reference.clone();

    let mut with_subs = ref_text.clone();
    substitute(&mut with_subs, 100);
    substitute(&mut with_subs, 250);
    let near_copy = PackedSeq::from_text(&with_subs).unwrap();

    let unrelated = PackedSeq::from_text(&random_text(400, 500_009)).unwrap();

    let map = SeedMap::build(&reference, parse_pattern(PATTERN));
    let mut workspace = BandWorkspace::new();

    let exact = scan_query(&exact_copy, &reference, &map, 0.3, 20, &mut workspace)
        .expect("exact copy must retire");
    assert_eq!(exact.q_off, 0);
    assert_eq!(exact.r_off, 0);
    assert_eq!(exact.dir, Direction::Forward);
    assert_eq!(exact.alignment.cost, 0);

    let near = scan_query(&near_copy, &reference, &map, 0.3, 20, &mut workspace)
        .expect("2-substitution copy must retire");
    assert_eq!(near.alignment.cost, 2);

    assert!(scan_query(&unrelated, &reference, &map, 0.3, 20, &mut workspace).is_none());
}

#[test]
fn test_tail_fragment_found_by_backward_scan() {
    let ref_text = random_text(400, 21);
    let reference = PackedSeq::from_text(&ref_text).unwrap();

    // A fragment of the reference tail whose head has been mutated beyond
    // every forward trial window: only the backward scan can anchor it.
    let mut frag = ref_text[200..].to_vec();
    for pos in 0..40 {
        substitute(&mut frag, pos);
    }
    let query = PackedSeq::from_text(&frag).unwrap();

    let map = SeedMap::build(&reference, parse_pattern(PATTERN));
    let mut workspace = BandWorkspace::new();
    let found = scan_query(&query, &reference, &map, 0.3, 20, &mut workspace)
        .expect("tail fragment must anchor");
    assert_eq!(found.dir, Direction::Backward);
    // The accepted segment still covers the mutated head, so the cost is
    // bounded by the substitution count but not zero.
    assert!(found.alignment.cost >= 1);
    assert!(found.alignment.cost <= 40);
}

#[test]
fn test_short_query_never_matches() {
    let reference = PackedSeq::from_text(&random_text(100, 3)).unwrap();
    let query = PackedSeq::from_text(b"ACGTACGTACG").unwrap();
    let map = SeedMap::build(&reference, parse_pattern(PATTERN));
    let mut workspace = BandWorkspace::new();
    assert!(scan_query(&query, &reference, &map, 0.3, 20, &mut workspace).is_none());
}

#[test]
fn test_failed_scan_leaves_consensus_untouched() {
    let reference = PackedSeq::from_text(&random_text(100, 7)).unwrap();
    let unrelated = PackedSeq::from_text(&random_text(100, 999_983)).unwrap();

    let map = SeedMap::build(&reference, parse_pattern(PATTERN));
    let before = SeedMap::build(&reference, parse_pattern(PATTERN));
    let mut workspace = BandWorkspace::new();
    let consensus = Consensus::seeded_from(&reference);

    assert!(scan_query(&unrelated, &reference, &map, 0.3, 20, &mut workspace).is_none());
    // The index is bit-identical to a fresh build and the consensus still
    // synthesizes the reference.
    assert_eq!(map, before);
    assert_eq!(consensus.synthesize(), reference);
}

#[test]
fn test_consensus_pass_converges_to_query_base() {
    // Three retired queries disagree with the reference at one position;
    // the synthesized consensus adopts their call.
    let ref_text = random_text(200, 17);
    let reference = PackedSeq::from_text(&ref_text).unwrap();
    let mut variant = ref_text.clone();
    substitute(&mut variant, 120);
    let query = PackedSeq::from_text(&variant).unwrap();

    let map = SeedMap::build(&reference, parse_pattern(PATTERN));
    let mut workspace = BandWorkspace::new();
    let mut consensus = Consensus::seeded_from(&reference);
    for _ in 0..3 {
        let found = scan_query(&query, &reference, &map, 0.3, 20, &mut workspace).unwrap();
        consensus.record(&found.alignment.edits, found.ref_start(), found.dir);
    }

    let refined = consensus.synthesize();
    assert_eq!(refined.to_text(), variant);
}
