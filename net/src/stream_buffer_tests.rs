//! Stream buffer regression suite.
//!
//! Covers: capacity accounting, cursor ordering across every mutator,
//! append/consume round trips, peek idempotence, wraparound at LENGTH = 8,
//! short writes and reads, mid saturation, speculative staging and
//! promotion, and the zero-copy run at `tail`.
//!
//! Runs under the in-tree harness (`itests` feature).

use ringnet_lib::testing::TestResult;
use ringnet_lib::{assert_eq_test, assert_test, define_test_suite, fail, pass};

use crate::stream_buffer::StreamBuffer;

fn make(length: usize) -> Option<StreamBuffer> {
    StreamBuffer::new(length).ok()
}

fn invariants_hold(s: &StreamBuffer) -> bool {
    s.writable_space() + s.readable_size() == s.capacity() && s.check_invariants()
}

// =============================================================================
// 1. Capacity and ordering
// =============================================================================

pub fn test_stream_capacity_invariant_scripted() -> TestResult {
    let Some(mut s) = make(8) else {
        return fail!("alloc length 8");
    };
    let mut scratch = [0u8; 8];

    assert_test!(invariants_hold(&s), "fresh stream");
    s.add(0, b"ABCDE");
    assert_test!(invariants_hold(&s), "after append");
    s.add(1, b"Z");
    assert_test!(invariants_hold(&s), "after staged write");
    s.move_mid(3);
    assert_test!(invariants_hold(&s), "after move_mid");
    s.get(0, &mut scratch[..4], false);
    assert_test!(invariants_hold(&s), "after consume");
    s.add(0, b"FGHIJK");
    assert_test!(invariants_hold(&s), "after wrapping append");
    s.get(2, &mut scratch[..3], true);
    assert_test!(invariants_hold(&s), "after peek");
    s.discard(100);
    assert_test!(invariants_hold(&s), "after discard");
    s.clear();
    assert_test!(invariants_hold(&s), "after clear");
    pass!()
}

pub fn test_stream_ordering_after_each_mutator() -> TestResult {
    let Some(mut s) = make(16) else {
        return fail!("alloc length 16");
    };
    let mut scratch = [0u8; 16];
    for round in 0..40usize {
        match round % 5 {
            0 => {
                s.add(0, &[round as u8; 5]);
            }
            1 => {
                let offset = 2.min(s.writable_space());
                s.add(offset, &[0xEE; 3]);
            }
            2 => {
                s.move_mid(2);
            }
            3 => {
                s.get(0, &mut scratch[..4], false);
            }
            _ => {
                s.promote(1);
            }
        }
        let c = s.cursors();
        assert_test!(s.less_or_equal(c.tail, c.mid), "tail<=mid round {}", round);
        assert_test!(s.less_or_equal(c.mid, c.head), "mid<=head round {}", round);
        assert_test!(s.less_or_equal(c.head, c.front), "head<=front round {}", round);
    }
    pass!()
}

// =============================================================================
// 2. Data movement
// =============================================================================

pub fn test_stream_round_trip() -> TestResult {
    let Some(mut s) = make(64) else {
        return fail!("alloc length 64");
    };
    // Offset the cursors so the round trip crosses the physical end.
    s.add(0, &[0u8; 50]);
    s.discard(50);

    let data: [u8; 40] = core::array::from_fn(|i| (i * 7) as u8);
    let tail_before = s.tail();
    assert_eq_test!(s.add(0, &data), 40, "append");
    let mut out = [0u8; 40];
    assert_eq_test!(s.get(0, &mut out, false), 40, "consume");
    assert_test!(out == data, "bytes differ after round trip");
    assert_eq_test!(s.distance(tail_before, s.tail()), 40, "tail advance");
    pass!()
}

pub fn test_stream_peek_idempotent() -> TestResult {
    let Some(mut s) = make(32) else {
        return fail!("alloc length 32");
    };
    s.add(0, b"peekaboo");
    let mut a = [0u8; 8];
    let mut b = [0u8; 8];
    assert_eq_test!(s.get(0, &mut a, true), 8);
    assert_eq_test!(s.get(0, &mut b, true), 8);
    assert_test!(a == b, "peeks differ");
    assert_eq_test!(s.tail(), 0, "tail moved by peek");
    assert_eq_test!(s.readable_size(), 8);
    pass!()
}

pub fn test_stream_wraparound_length_8() -> TestResult {
    let Some(mut s) = make(8) else {
        return fail!("alloc length 8");
    };
    assert_eq_test!(s.add(0, b"ABCDEFG"), 7, "fill");
    assert_test!(s.is_full(), "stream should be full");

    let mut out = [0u8; 3];
    assert_eq_test!(s.get(0, &mut out, false), 3);
    assert_test!(&out == b"ABC", "consumed wrong bytes");
    assert_eq_test!(s.writable_space(), 3, "freed slots");

    assert_eq_test!(s.add(0, b"XYZ"), 3, "wrapping append");
    assert_test!(s.head() < s.tail(), "head should have wrapped");

    let mut rest = [0u8; 7];
    assert_eq_test!(s.read(&mut rest), 7);
    assert_test!(&rest == b"DEFGXYZ", "wrapped read order");
    pass!()
}

pub fn test_stream_short_write_and_read() -> TestResult {
    let Some(mut s) = make(8) else {
        return fail!("alloc length 8");
    };
    s.add(0, b"abc");
    let space = s.writable_space();
    assert_eq_test!(s.add(0, &[1u8; 20]), space, "short write");
    assert_eq_test!(s.add(0, b"more"), 0, "write when full");

    let mut out = [0u8; 20];
    assert_eq_test!(s.get(0, &mut out, false), 7, "short read");
    assert_eq_test!(s.get(0, &mut out, false), 0, "read when empty");
    pass!()
}

// =============================================================================
// 3. Mid, staging, zero-copy
// =============================================================================

pub fn test_stream_move_mid_saturates() -> TestResult {
    let Some(mut s) = make(32) else {
        return fail!("alloc length 32");
    };
    s.add(0, b"0123456789");
    let pending = s.pending_size();
    assert_eq_test!(s.move_mid(pending + 100), pending);
    assert_eq_test!(s.mid(), s.head(), "mid should stop at head");
    assert_eq_test!(s.pending_size(), 0);
    pass!()
}

pub fn test_stream_speculative_staging() -> TestResult {
    let Some(mut s) = make(32) else {
        return fail!("alloc length 32");
    };
    s.add(0, b"abc");
    let head = s.head();
    let readable = s.readable_size();
    let speculative = s.speculative_space();

    assert_eq_test!(s.add(5, b"xyz"), 3, "staged write");
    assert_eq_test!(s.head(), head, "head moved by staged write");
    assert_eq_test!(s.readable_size(), readable, "readable changed");
    assert_eq_test!(s.front(), head + 8, "front");
    assert_eq_test!(s.speculative_space(), speculative - 8, "speculative space");

    assert_eq_test!(s.add(0, b"defgh"), 5, "gap fill");
    assert_eq_test!(s.promote(3), 3, "promote");
    let mut out = [0u8; 11];
    assert_eq_test!(s.read(&mut out), 11);
    assert_test!(&out == b"abcdefghxyz", "promoted bytes out of order");
    pass!()
}

pub fn test_stream_get_ptr_bounds() -> TestResult {
    let Some(mut s) = make(8) else {
        return fail!("alloc length 8");
    };
    s.add(0, b"123456");
    s.discard(4);
    s.add(0, b"789");
    let run = s.get_ptr();
    assert_test!(run.len() <= s.readable_size(), "run exceeds readable");
    assert_test!(run.len() <= s.length() - s.tail(), "run crosses end");
    assert_test!(run == b"5678", "run contents");
    pass!()
}

define_test_suite!(
    stream_buffer,
    [
        test_stream_capacity_invariant_scripted,
        test_stream_ordering_after_each_mutator,
        test_stream_round_trip,
        test_stream_peek_idempotent,
        test_stream_wraparound_length_8,
        test_stream_short_write_and_read,
        test_stream_move_mid_saturates,
        test_stream_speculative_staging,
        test_stream_get_ptr_bounds,
    ]
);
