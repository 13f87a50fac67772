//! Tests for the FifoBuffer
//!
//! These tests follow the order of the main file. Later sections only lean on methods that have
//! already been covered above them.

#![expect(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::unwrap_used,
    reason = "Okay in tests"
)]

use super::*;
use proptest::prelude::*;
use std::collections::VecDeque;

// -----------------------------------------------------------------------------
// FifoBuffer - Creation
// -----------------------------------------------------------------------------

/* Note: The `impl Default` is a wrapper over the `new` constructor, and `new` and
 * `with_capacity` are wrappers over `with_limits`. Only the limits are checked for them.
 */

#[test]
fn test_buffer_new() {
    let buffer = FifoBuffer::new();

    // Check internal state matches expectations
    assert_eq!(buffer.buf.len(), DEFAULT_CAPACITY);
    assert_eq!(buffer.cap, DEFAULT_CAPACITY);
    assert_eq!(buffer.max_cap, DEFAULT_MAX_CAPACITY);
    assert_eq!(buffer.start, 0);
    assert_eq!(buffer.end, 0);
}

#[test]
fn test_buffer_with_capacity() {
    let buffer = FifoBuffer::with_capacity(100);
    assert_eq!(buffer.capacity(), 100); // Exact, no rounding
    assert_eq!(buffer.max_capacity(), DEFAULT_MAX_CAPACITY);

    // A capacity above the default maximum raises the maximum
    let buffer = FifoBuffer::with_capacity(DEFAULT_MAX_CAPACITY * 2);
    assert_eq!(buffer.max_capacity(), DEFAULT_MAX_CAPACITY * 2);
}

#[test]
fn test_buffer_with_limits() {
    let buffer = FifoBuffer::with_limits(16, 64);
    assert_eq!(buffer.capacity(), 16);
    assert_eq!(buffer.max_capacity(), 64);

    // Max below capacity is raised to match
    let buffer = FifoBuffer::with_limits(16, 8);
    assert_eq!(buffer.max_capacity(), 16);
}

// -----------------------------------------------------------------------------
// FifoBuffer - Accessors
// -----------------------------------------------------------------------------

#[test]
fn test_buffer_len_and_is_empty() {
    let mut buffer = FifoBuffer::new();
    assert_eq!(buffer.len(), 0);
    assert!(buffer.is_empty());

    // Fake a window in the middle of the store
    buffer.start = 3;
    buffer.end = 10;
    assert_eq!(buffer.len(), 7);
    assert!(!buffer.is_empty());

    // An empty window anywhere is still empty
    buffer.start = 10;
    assert!(buffer.is_empty());
}

#[test]
fn test_buffer_peek() {
    let mut buffer = FifoBuffer::new();
    assert_eq!(buffer.peek(), b"");

    let data = b"Hello, World!";
    buffer.buf[..data.len()].copy_from_slice(data);
    buffer.start = 7;
    buffer.end = data.len();

    // Only the window is visible
    assert_eq!(buffer.peek(), b"World!");
}

#[test]
fn test_buffer_clear() {
    let mut buffer = FifoBuffer::with_capacity(64);
    buffer.push(b"data").unwrap();
    buffer.clear();

    assert!(buffer.is_empty());
    assert_eq!(buffer.start, 0);
    assert_eq!(buffer.end, 0);
    assert_eq!(buffer.capacity(), 64); // Capacity unchanged
}

// -----------------------------------------------------------------------------
// FifoBuffer - Compaction
// -----------------------------------------------------------------------------

#[test]
fn test_buffer_compact() {
    let mut buffer = FifoBuffer::new();
    let data = b"Hello, World!";
    buffer.buf[..data.len()].copy_from_slice(data);
    buffer.start = 7;
    buffer.end = data.len();

    buffer.compact();

    // Unread bytes moved to the front
    assert_eq!(buffer.start, 0);
    assert_eq!(buffer.end, 6);
    assert_eq!(buffer.peek(), b"World!");

    // Compacting an already compact buffer changes nothing
    buffer.compact();
    assert_eq!(buffer.peek(), b"World!");
}

// -----------------------------------------------------------------------------
// FifoBuffer - Push
// -----------------------------------------------------------------------------

#[test]
fn test_buffer_push() {
    let mut buffer = FifoBuffer::new();
    buffer.push(b"Hello").unwrap();
    buffer.push(b", World!").unwrap();

    assert_eq!(buffer.peek(), b"Hello, World!");
    assert_eq!(buffer.start, 0);
    assert_eq!(buffer.end, 13);

    // Empty pushes are a no-op
    buffer.push(b"").unwrap();
    assert_eq!(buffer.len(), 13);
}

#[test]
fn test_buffer_push_compacts_before_growing() {
    let mut buffer = FifoBuffer::with_limits(8, 8);
    buffer.push(b"abcdef").unwrap();
    buffer.start = 4; // Pretend "abcd" was consumed

    // "ef" + "ghij" only fits after moving "ef" to the front
    buffer.push(b"ghij").unwrap();
    assert_eq!(buffer.start, 0);
    assert_eq!(buffer.peek(), b"efghij");
    assert_eq!(buffer.capacity(), 8); // No growth was needed
}

#[test]
fn test_buffer_push_grows() {
    let mut buffer = FifoBuffer::with_limits(4, 64);
    buffer.push(b"abc").unwrap();
    buffer.push(b"defgh").unwrap();

    // 8 bytes needed, power of two
    assert_eq!(buffer.capacity(), 8);
    assert_eq!(buffer.buf.len(), 8);
    assert_eq!(buffer.peek(), b"abcdefgh");

    // 9 bytes needed rounds up to 16
    buffer.push(b"i").unwrap();
    assert_eq!(buffer.capacity(), 16);

    // Growth is clamped at the maximum
    buffer.push(&[b'x'; 40]).unwrap();
    assert_eq!(buffer.capacity(), 64);
    assert_eq!(buffer.len(), 49);
}

#[test]
fn test_buffer_push_overflow() {
    let mut buffer = FifoBuffer::with_limits(4, 8);
    buffer.push(b"abcdef").unwrap();

    let err = buffer.push(b"ghi").unwrap_err();
    assert!(matches!(
        err,
        Error::Overflow {
            requested: 9,
            max_capacity: 8
        }
    ));

    // A failed push leaves the buffer untouched
    assert_eq!(buffer.peek(), b"abcdef");

    // Exactly filling the maximum is fine
    buffer.push(b"gh").unwrap();
    assert_eq!(buffer.len(), 8);
}

#[test]
fn test_buffer_push_overflow_counts_unread_only() {
    let mut buffer = FifoBuffer::with_limits(8, 8);
    buffer.push(b"abcdefgh").unwrap();
    assert_eq!(buffer.pop(6), b"abcdef");

    // Consumed bytes do not count against the maximum
    buffer.push(b"ijklmn").unwrap();
    assert_eq!(buffer.peek(), b"ghijklmn");
}

// -----------------------------------------------------------------------------
// FifoBuffer - Pop
// -----------------------------------------------------------------------------

#[test]
fn test_buffer_pop() {
    let mut buffer = FifoBuffer::new();
    buffer.push(b"Hello, World!").unwrap();

    assert_eq!(buffer.pop(5), b"Hello");
    assert_eq!(buffer.start, 5);

    assert_eq!(buffer.pop(2), b", ");
    assert_eq!(buffer.pop(100), b"World!");

    // Draining resets the window to the front
    assert_eq!(buffer.start, 0);
    assert_eq!(buffer.end, 0);

    // Popping from an empty buffer returns nothing
    assert!(buffer.pop(3).is_empty());
    assert!(buffer.pop(0).is_empty());
}

#[test]
fn test_buffer_pop_line() {
    let mut buffer = FifoBuffer::new();
    buffer.push(b"one\r\ntwo\nthr").unwrap();

    // Delimiters stay attached
    assert_eq!(buffer.pop_line(), b"one\r\n");
    assert_eq!(buffer.pop_line(), b"two\n");

    // No delimiter left, the rest is drained
    assert_eq!(buffer.pop_line(), b"thr");
    assert!(buffer.is_empty());

    // Empty buffer, empty result
    assert!(buffer.pop_line().is_empty());
}

#[test]
fn test_buffer_pop_line_lone_delimiter() {
    let mut buffer = FifoBuffer::new();
    buffer.push(b"\n\nx").unwrap();

    assert_eq!(buffer.pop_line(), b"\n");
    assert_eq!(buffer.pop_line(), b"\n");
    assert_eq!(buffer.pop_line(), b"x");
}

#[test]
fn test_buffer_consume() {
    let mut buffer = FifoBuffer::new();
    buffer.push(b"abcdef").unwrap();

    buffer.consume(2);
    assert_eq!(buffer.peek(), b"cdef");

    // Over-consuming is clamped and resets the window
    buffer.consume(100);
    assert!(buffer.is_empty());
    assert_eq!(buffer.start, 0);
}

// -----------------------------------------------------------------------------
// FifoBuffer - Properties
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Push(Vec<u8>),
    Pop(usize),
    PopLine,
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        prop::collection::vec(prop_oneof![Just(b'\n'), any::<u8>()], 0..48).prop_map(Op::Push),
        (0usize..64).prop_map(Op::Pop),
        Just(Op::PopLine),
    ];
    prop::collection::vec(op, 0..64)
}

proptest! {
    #[test]
    fn prop_behaves_like_a_bounded_queue(ops in ops()) {
        let mut buffer = FifoBuffer::with_limits(16, 128);
        let mut model: VecDeque<u8> = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(data) => {
                    let fits = model.len() + data.len() <= 128;
                    prop_assert_eq!(buffer.push(&data).is_ok(), fits);
                    if fits {
                        model.extend(data);
                    }
                }
                Op::Pop(n) => {
                    let n = n.min(model.len());
                    let expected: Vec<u8> = model.drain(..n).collect();
                    prop_assert_eq!(buffer.pop(n), expected);
                }
                Op::PopLine => {
                    let n = model.iter().position(|b| *b == b'\n').map_or(model.len(), |i| i + 1);
                    let expected: Vec<u8> = model.drain(..n).collect();
                    prop_assert_eq!(buffer.pop_line(), expected);
                }
            }

            prop_assert_eq!(buffer.len(), model.len());
            prop_assert!(buffer.start <= buffer.end);
            prop_assert!(buffer.end <= buffer.cap);
            prop_assert_eq!(buffer.cap, buffer.buf.len());
            prop_assert!(buffer.cap <= buffer.max_cap);
        }

        prop_assert_eq!(buffer.peek(), &*model.make_contiguous());
    }
}
