//! Unit tests for the packed sequence codec.

use repseed::sequence::{Direction, PackedSeq};

use crate::helpers::random_text;

#[test]
fn test_text_round_trip_assorted_lengths() {
    for len in 1..50 {
        let text = random_text(len, len as u32 + 1);
        let packed = PackedSeq::from_text(&text).unwrap();
        assert_eq!(packed.to_text(), text, "length {}", len);
    }
}

#[test]
fn test_payload_round_trip() {
    for len in [1usize, 4, 7, 16, 17, 33, 64, 100] {
        let text = random_text(len, 0xBEEF);
        let packed = PackedSeq::from_text(&text).unwrap();
        let bytes = packed.to_packed_bytes();
        assert_eq!(bytes.len(), (len + 3) / 4);
        assert_eq!(PackedSeq::from_packed_bytes(&bytes, len), packed);
    }
}

#[test]
fn test_invalid_base_reports_offset() {
    let result = PackedSeq::from_text(b"ACGTNACGT");
    assert_eq!(result, Err(4));
}

#[test]
fn test_window_agrees_with_base_access() {
    let text = random_text(70, 42);
    let seq = PackedSeq::from_text(&text).unwrap();
    for pos in 0..=(70 - 16) {
        let mut expect = 0u32;
        for i in 0..16 {
            expect = (expect << 2) | seq.base(pos + i) as u32;
        }
        assert_eq!(seq.window(pos), expect, "window at {}", pos);
    }
}

#[test]
fn test_accessor_directions_agree() {
    let text = random_text(30, 9);
    let seq = PackedSeq::from_text(&text).unwrap();
    let fwd = seq.accessor(0, Direction::Forward);
    let bwd = seq.accessor(29, Direction::Backward);
    for i in 0..30 {
        assert_eq!(fwd.at(i), bwd.at(29 - i));
    }
}
