use std::mem;

use num_traits::PrimInt;

// Bit stream
//------------------------------------------------------------------------------

/// Growable, bounded sequence of bits with O(1) amortized append, indexed
/// read/write and byte-aligned export. Allocated fresh for every encode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    data: Vec<u8>,
    // Bit length
    len: usize,
    // Max bit capacity
    capacity: usize,
    // Pointer to take bits
    cursor: usize,
}

impl BitStream {
    pub fn new(capacity: usize) -> Self {
        Self { data: vec![0; (capacity + 7) >> 3], len: 0, capacity, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..(self.len + 7) >> 3]
    }

    pub fn bit(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "Bit index out of bounds: {index}, len {}", self.len);

        (self.data[index >> 3] >> (7 - (index & 7))) & 1 == 1
    }

    pub fn set(&mut self, index: usize, bit: bool) {
        debug_assert!(index < self.len, "Bit index out of bounds: {index}, len {}", self.len);

        let mask = 0b1000_0000 >> (index & 7);
        if bit {
            self.data[index >> 3] |= mask;
        } else {
            self.data[index >> 3] &= !mask;
        }
    }
}

// Push bits for bit stream
//------------------------------------------------------------------------------

impl BitStream {
    pub fn push_bits<T>(&mut self, bits: T, size: usize)
    where
        T: PrimInt,
    {
        let max_bits = mem::size_of::<T>() * 8;
        let bits = bits.to_u64().expect("Bit value must be non-negative");
        debug_assert!(size <= max_bits, "Bit count exceeds type width: {size}");
        debug_assert!(
            size >= 64 - bits.leading_zeros() as usize,
            "Bit count shouldn't exceed bit length: Length {size}, Bits {bits}"
        );
        debug_assert!(
            self.len + size <= self.capacity,
            "Insufficient capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + size
        );

        let mut rem = size;
        while rem > 8 {
            rem -= 8;
            self.push_u8((bits >> rem) as u8, 8);
        }
        self.push_u8((bits & ((1 << rem) - 1)) as u8, rem);
    }

    fn push_u8(&mut self, bits: u8, size: usize) {
        if size == 0 {
            return;
        }

        let offset = self.len & 7;
        let pos = self.len >> 3;

        if offset + size <= 8 {
            self.data[pos] |= bits << (8 - size - offset);
        } else {
            self.data[pos] |= bits >> (size + offset - 8);
            self.data[pos + 1] = bits << (16 - size - offset);
        }

        self.len += size;
    }

    pub fn push(&mut self, bit: bool) {
        debug_assert!(
            self.len < self.capacity,
            "Insufficient capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + 1
        );

        if bit {
            let offset = self.len & 7;
            let pos = self.len >> 3;
            self.data[pos] |= 0b1000_0000 >> offset;
        }

        self.len += 1;
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.push_bits(*b, 8);
        }
    }

    /// Appends the first `size` bits of `other`.
    pub fn append(&mut self, other: &BitStream, size: usize) {
        debug_assert!(size <= other.len(), "Cannot append more bits than present");

        for i in 0..size {
            self.push(other.bit(i));
        }
    }
}

// Take bits from bit stream
//------------------------------------------------------------------------------

impl Iterator for BitStream {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }
        let bit = self.bit(self.cursor);
        self.cursor += 1;
        Some(bit)
    }
}

#[cfg(test)]
mod bit_stream_tests {
    use super::BitStream;

    #[test]
    fn test_len() {
        let mut bs = BitStream::new(152);
        assert_eq!(bs.len(), 0);
        bs.push_bits(0u8, 0);
        assert_eq!(bs.len(), 0);
        bs.push_bits(0b1000u8, 4);
        assert_eq!(bs.len(), 4);
        bs.push_bits(0b1000u8, 8);
        assert_eq!(bs.len(), 12);
        bs.push_bits(0b1000u8, 4);
        assert_eq!(bs.len(), 16);
        bs.push_bits(0b1111111u8, 7);
        assert_eq!(bs.len(), 23);
    }

    #[test]
    fn test_push() {
        let mut bs = BitStream::new(2);
        bs.push(false);
        assert_eq!(bs.data(), &[0b00000000]);
        bs.push(true);
        assert_eq!(bs.data(), &[0b01000000]);
    }

    #[test]
    fn test_push_bits_wide() {
        let mut bs = BitStream::new(64);
        bs.push_bits(0b010u8, 3);
        bs.push_bits(0b110u8, 3);
        bs.push_bits(0b101u8, 3);
        bs.push_bits(0b001_1010u8, 7);
        bs.push_bits(0b1100u8, 4);
        bs.push_bits(0b1011_0110_1101u16, 12);
        bs.push_bits(0b01_1001_0001u16, 10);
        bs.push_bits(0b111_0010_1110_0011u16, 15);
        assert_eq!(
            bs.data(),
            &[
                0b0101_1010,
                0b1001_1010,
                0b1100_1011,
                0b0110_1101,
                0b0110_0100,
                0b0111_1001,
                0b0111_0001,
                0b1000_0000
            ]
        );
    }

    #[test]
    fn test_bit_read_write() {
        let mut bs = BitStream::new(16);
        bs.push_bits(0b1010_1010u8, 8);
        assert!(bs.bit(0));
        assert!(!bs.bit(1));
        bs.set(1, true);
        assert!(bs.bit(1));
        bs.set(0, false);
        assert!(!bs.bit(0));
        assert_eq!(bs.data(), &[0b0110_1010]);
    }

    #[test]
    fn test_append() {
        let mut a = BitStream::new(16);
        a.push_bits(0b1101u8, 4);
        let mut b = BitStream::new(16);
        b.push_bits(0b1111_0000u8, 8);
        a.append(&b, 6);
        assert_eq!(a.len(), 10);
        assert_eq!(a.data(), &[0b1101_1111, 0b0000_0000]);
    }

    #[test]
    fn test_bit_iterator() {
        let mut bs = BitStream::new(8);
        bs.push_bits(0b1100_0101u8, 8);
        let bits = bs.collect::<Vec<_>>();
        assert_eq!(bits, vec![true, true, false, false, false, true, false, true]);
    }

    #[test]
    #[should_panic]
    fn test_push_bits_capacity_overflow() {
        let mut bs = BitStream::new(8);
        bs.push_bits(0u8, 8);
        bs.push(true);
    }
}
