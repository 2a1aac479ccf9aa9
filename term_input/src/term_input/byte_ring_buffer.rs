// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Fixed-capacity circular byte storage. See [`ByteRingBuffer`] for details.

/// A fixed-capacity FIFO of bytes, addressed by a read index, a write index, and a
/// wrap flag.
///
/// This type has no synchronization of its own. [`BoundedByteChannel`] owns one behind
/// a mutex and is the only thing that mutates it.
///
/// # Full / empty disambiguation
///
/// With only two indices in `[0, C)`, `read_index == write_index` is ambiguous: the
/// buffer is either empty, or the writer has lapped the reader and the buffer is
/// completely full. The wrap flag resolves it:
///
/// - It is set when `write_index` wraps past the end back to `0`.
/// - It is cleared when `read_index` subsequently wraps past the end back to `0`.
///
/// So `wrapped == true` means "the writer is one lap ahead of the reader", and:
///
/// | `wrapped` | Indices        | State                          |
/// | :-------- | :------------- | :----------------------------- |
/// | `false`   | `read == write` | empty                         |
/// | `false`   | `read < write`  | `write - read` bytes readable |
/// | `true`    | `read == write` | full (`C` bytes readable)     |
/// | `true`    | `read > write`  | `C - read + write` readable   |
///
/// `wrapped == false && read > write` and `wrapped == true && read < write` are
/// unreachable.
///
/// The indices plus flag are the only source of truth. [`len()`] derives the count on
/// demand rather than tracking a separate counter that could drift.
///
/// # Example
///
/// Capacity 4, push `A B C D E`:
///
/// ```text
/// push A  [A . . .]  r=0 w=1 wrapped=false
/// push B  [A B . .]  r=0 w=2 wrapped=false
/// push C  [A B C .]  r=0 w=3 wrapped=false
/// push D  [A B C D]  r=0 w=0 wrapped=true    <- write index wrapped
/// push E  rejected: wrapped && w == r, so the buffer is full
/// ```
///
/// [`BoundedByteChannel`]: crate::BoundedByteChannel
/// [`len()`]: Self::len
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRingBuffer {
    storage: Box<[u8]>,
    read_index: usize,
    write_index: usize,
    wrapped: bool,
}

impl ByteRingBuffer {
    /// Allocates all `capacity` slots up front. A capacity of `0` is bumped to `1`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity.max(1)].into_boxed_slice(),
            read_index: 0,
            write_index: 0,
            wrapped: false,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize { self.storage.len() }

    /// Number of unread bytes, derived from the indices and the wrap flag.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.wrapped {
            self.capacity() - self.read_index + self.write_index
        } else {
            self.write_index - self.read_index
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { !self.read_allowed() }

    #[must_use]
    pub fn is_full(&self) -> bool { !self.write_allowed() }

    /// A read is allowed when the reader is behind the writer on the same lap, or when
    /// the writer has lapped the reader.
    fn read_allowed(&self) -> bool {
        let same_lap = !self.wrapped && self.read_index < self.write_index;
        let writer_lapped = self.wrapped && self.read_index >= self.write_index;
        same_lap || writer_lapped
    }

    /// A write is allowed unless the writer has lapped the reader and caught up to it.
    /// On a full buffer the new byte is rejected, never written over unread data.
    fn write_allowed(&self) -> bool { !self.wrapped || self.write_index < self.read_index }

    /// Appends `byte`. Returns `false` (and drops the byte) when the buffer is full.
    pub fn push(&mut self, byte: u8) -> bool {
        if !self.write_allowed() {
            return false;
        }
        self.storage[self.write_index] = byte;
        self.write_index = (self.write_index + 1) % self.capacity();
        if self.write_index == 0 {
            self.wrapped = true;
        }
        true
    }

    /// Removes the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        if !self.read_allowed() {
            return None;
        }
        let byte = self.storage[self.read_index];
        self.read_index = (self.read_index + 1) % self.capacity();
        if self.read_index == 0 {
            self.wrapped = false;
        }
        Some(byte)
    }

    /// Forgets all unread bytes. Storage is kept.
    pub fn clear(&mut self) {
        self.read_index = 0;
        self.write_index = 0;
        self.wrapped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn drain(buffer: &mut ByteRingBuffer) -> Vec<u8> {
        std::iter::from_fn(|| buffer.pop()).collect()
    }

    #[test]
    fn test_empty_ring_buffer() {
        let mut buffer = ByteRingBuffer::new(4);
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.pop(), None);
    }

    #[test]
    fn test_fifo_order() {
        let mut buffer = ByteRingBuffer::new(16);
        for byte in b"hello" {
            assert!(buffer.push(*byte));
        }
        assert_eq!(buffer.len(), 5);
        assert_eq!(drain(&mut buffer), b"hello".to_vec());
    }

    #[test]
    fn test_capacity_drops_newest() {
        let mut buffer = ByteRingBuffer::new(4);
        let accepted: Vec<bool> = b"ABCDE".iter().map(|it| buffer.push(*it)).collect();
        assert_eq!(accepted, vec![true, true, true, true, false]);
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), 4);
        assert_eq!(drain(&mut buffer), b"ABCD".to_vec());
    }

    /// Regression test for the read/write index collision: after filling to capacity
    /// and draining completely, both indices are back at `0` and the buffer must report
    /// empty rather than full.
    #[test]
    fn test_empty_after_fill_and_drain() {
        let mut buffer = ByteRingBuffer::new(4);
        for byte in b"ABCD" {
            assert!(buffer.push(*byte));
        }
        assert_eq!(drain(&mut buffer).len(), 4);

        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.pop(), None);

        // And it is fully usable again.
        for byte in b"WXYZ" {
            assert!(buffer.push(*byte));
        }
        assert!(!buffer.push(b'!'));
        assert_eq!(drain(&mut buffer), b"WXYZ".to_vec());
    }

    #[test]
    fn test_interleaved_wrap_around() {
        let mut buffer = ByteRingBuffer::new(3);
        assert!(buffer.push(1));
        assert!(buffer.push(2));
        assert_eq!(buffer.pop(), Some(1));
        // Write index wraps here.
        assert!(buffer.push(3));
        assert!(buffer.push(4));
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.push(5));
        assert_eq!(buffer.pop(), Some(2));
        assert!(buffer.push(6));
        assert_eq!(drain(&mut buffer), vec![3, 4, 6]);
        assert!(buffer.is_empty());
    }

    #[test_case(1 ; "single slot")]
    #[test_case(2 ; "two slots")]
    #[test_case(7 ; "odd capacity")]
    #[test_case(1_000 ; "default capacity")]
    fn test_many_laps_preserve_order(capacity: usize) {
        let mut buffer = ByteRingBuffer::new(capacity);
        let mut expected = Vec::new();
        let mut actual = Vec::new();
        for round in 0..(capacity * 3 + 5) {
            #[allow(clippy::cast_possible_truncation)]
            let byte = (round % 251) as u8;
            if buffer.push(byte) {
                expected.push(byte);
            }
            if round % 2 == 1 {
                actual.extend(buffer.pop());
            }
            assert!(buffer.len() <= capacity);
        }
        actual.extend(drain(&mut buffer));
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_zero_capacity_is_bumped_to_one() {
        let mut buffer = ByteRingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        assert!(buffer.push(9));
        assert!(!buffer.push(10));
        assert_eq!(buffer.pop(), Some(9));
    }

    #[test]
    fn test_clear() {
        let mut buffer = ByteRingBuffer::new(2);
        buffer.push(1);
        buffer.push(2);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }
}
