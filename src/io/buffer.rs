/*
 * Circular Byte Buffer
 *
 * Fixed-size ring used for the receive and transmit queues of buffered
 * devices. One side is fed from interrupt context, the other drained from
 * application context; callers provide the mutual exclusion.
 *
 * Bytes are written at the head and read from the tail, and both indices
 * move *downwards*: each operation pre-decrements its index (wrapping from
 * 0 to N-1) and then touches the slot it lands on. The head may only equal
 * the tail when the buffer is empty, so one slot is always sacrificed and
 * an N-slot buffer holds N-1 bytes.
 *
 * Indices are u8, which bounds N to 256 slots.
 */

use super::device::XioError;

/// Ring buffer with `N` slots and `N - 1` bytes of capacity.
#[derive(Debug)]
pub struct CircularBuffer<const N: usize> {
    buf: [u8; N],

    /// Slot of the most recently written byte.
    head: u8,

    /// Slot of the most recently read byte.
    tail: u8,
}

impl<const N: usize> CircularBuffer<N> {
    /// A single-slot ring is permanently "full" and can never hold data.
    const GEOMETRY: () = assert!(N >= 2 && N <= 256, "circular buffer needs 2..=256 slots");

    pub const fn new() -> Self {
        let () = Self::GEOMETRY;
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
        }
    }

    #[inline]
    fn prev(index: u8) -> u8 {
        if index == 0 { (N - 1) as u8 } else { index - 1 }
    }

    /// Write one byte at the head.
    ///
    /// A full buffer is left untouched and `BufferFullNonFatal` returned.
    pub fn push_front(&mut self, byte: u8) -> Result<(), XioError> {
        let head = Self::prev(self.head);
        if head == self.tail {
            return Err(XioError::BufferFullNonFatal);
        }
        self.buf[head as usize] = byte;
        self.head = head;
        Ok(())
    }

    /// Read the oldest byte from the tail.
    pub fn pop_back(&mut self) -> Result<u8, XioError> {
        if self.head == self.tail {
            return Err(XioError::BufferEmpty);
        }
        self.tail = Self::prev(self.tail);
        Ok(self.buf[self.tail as usize])
    }

    /// Number of bytes waiting to be read.
    pub fn len(&self) -> usize {
        (self.tail as usize + N - self.head as usize) % N
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        Self::prev(self.head) == self.tail
    }

    /// Usable bytes (`N - 1`).
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Drop everything queued.
    pub fn clear(&mut self) {
        self.tail = self.head;
    }
}

impl<const N: usize> Default for CircularBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fifo_roundtrip<const N: usize>() {
        for count in 0..N {
            let mut ring = CircularBuffer::<N>::new();
            for i in 0..count {
                ring.push_front(i as u8).unwrap();
            }
            assert_eq!(ring.len(), count);
            for i in 0..count {
                assert_eq!(ring.pop_back(), Ok(i as u8));
            }
            assert!(ring.is_empty());
            assert_eq!(ring.pop_back(), Err(XioError::BufferEmpty));
        }
    }

    #[test]
    fn reads_return_writes_in_order() {
        fifo_roundtrip::<2>();
        fifo_roundtrip::<3>();
        fifo_roundtrip::<16>();
        fifo_roundtrip::<256>();
    }

    #[test]
    fn two_slot_buffer_holds_exactly_one_byte() {
        let mut ring = CircularBuffer::<2>::new();
        assert_eq!(ring.capacity(), 1);
        ring.push_front(b'a').unwrap();
        assert!(ring.is_full());
        assert_eq!(ring.push_front(b'b'), Err(XioError::BufferFullNonFatal));
        assert_eq!(ring.pop_back(), Ok(b'a'));
    }

    #[test]
    fn write_to_full_buffer_changes_nothing() {
        let mut ring = CircularBuffer::<4>::new();
        for b in b"xyz" {
            ring.push_front(*b).unwrap();
        }
        let head = ring.head;
        let snapshot = ring.buf;

        assert_eq!(ring.push_front(b'!'), Err(XioError::BufferFullNonFatal));
        assert_eq!(ring.head, head);
        assert_eq!(ring.buf, snapshot);
        assert_eq!(ring.len(), 3);

        for b in b"xyz" {
            assert_eq!(ring.pop_back(), Ok(*b));
        }
    }

    #[test]
    fn empty_buffer_never_returns_stale_data() {
        let mut ring = CircularBuffer::<8>::new();
        ring.push_front(0x42).unwrap();
        assert_eq!(ring.pop_back(), Ok(0x42));
        assert_eq!(ring.pop_back(), Err(XioError::BufferEmpty));
        assert_eq!(ring.pop_back(), Err(XioError::BufferEmpty));
    }

    #[test]
    fn indices_wrap_across_many_cycles() {
        let mut ring = CircularBuffer::<5>::new();
        let mut next_in = 0u8;
        let mut next_out = 0u8;
        for round in 0..100 {
            let burst = round % 4 + 1;
            for _ in 0..burst {
                ring.push_front(next_in).unwrap();
                next_in = next_in.wrapping_add(1);
            }
            for _ in 0..burst {
                assert_eq!(ring.pop_back(), Ok(next_out));
                next_out = next_out.wrapping_add(1);
            }
            assert!(ring.is_empty());
        }
    }

    #[test]
    fn clear_discards_pending_bytes() {
        let mut ring = CircularBuffer::<8>::new();
        ring.push_front(1).unwrap();
        ring.push_front(2).unwrap();
        ring.clear();
        assert!(ring.is_empty());
        ring.push_front(3).unwrap();
        assert_eq!(ring.pop_back(), Ok(3));
    }
}
