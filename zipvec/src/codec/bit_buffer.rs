//! Bit-level packing over byte slices.
//!
//! The element-at-a-time kernels store each value in exactly `width` bits,
//! little-endian, with no padding between values. A page therefore packs
//! to `ceil(width * Q / 8)` bytes whatever the width.

/// Packs values into a byte slice.
///
/// Holds up to 64 bits of pending output. Complete bytes are written out
/// after every append, so at most 7 bits are pending between appends and
/// a single append of up to 57 bits always fits. A 64-bit append is only
/// valid while no bits are pending, which holds for whole-byte widths.
pub struct BitWriter<'a> {
    out: &'a mut [u8],
    pos: usize,
    buffer: u64,
    bits_available: u32,
}

impl<'a> BitWriter<'a> {
    /// Creates a writer at the start of `out`.
    pub fn new(out: &'a mut [u8]) -> Self {
        Self { out, pos: 0, buffer: 0, bits_available: 0 }
    }

    /// Appends the low `bit_count` bits of `value`.
    ///
    /// ## Arguments
    /// * `value` - The bits to append; bits above `bit_count` must be zero
    /// * `bit_count` - The number of bits to take from value
    #[inline]
    pub fn append(&mut self, value: u64, bit_count: u32) {
        debug_assert!(bit_count + self.bits_available <= 64);
        if bit_count == 64 {
            self.out[self.pos..self.pos + 8].copy_from_slice(&value.to_le_bytes());
            self.pos += 8;
            return;
        }
        self.buffer |= value << self.bits_available;
        self.bits_available += bit_count;
        self.flush_bytes();
    }

    /// Writes out every complete byte in the buffer.
    #[inline]
    fn flush_bytes(&mut self) {
        while self.bits_available >= 8 {
            self.out[self.pos] = self.buffer as u8;
            self.pos += 1;
            self.buffer >>= 8;
            self.bits_available -= 8;
        }
    }

    /// Writes out the final partial byte, if any, and returns the number
    /// of bytes written.
    pub fn finish(mut self) -> usize {
        if self.bits_available > 0 {
            self.out[self.pos] = self.buffer as u8;
            self.pos += 1;
        }
        self.pos
    }
}

/// Unpacks values written by [`BitWriter`].
pub struct BitReader<'a> {
    input: &'a [u8],
    pos: usize,
    buffer: u64,
    bits_available: u32,
}

impl<'a> BitReader<'a> {
    /// Creates a reader at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0, buffer: 0, bits_available: 0 }
    }

    /// Extracts the next `bit_width` bits.
    ///
    /// ## Returns
    /// The extracted bits, zero-extended
    #[inline]
    pub fn extract(&mut self, bit_width: u32) -> u64 {
        if bit_width == 64 {
            debug_assert_eq!(self.bits_available, 0);
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&self.input[self.pos..self.pos + 8]);
            self.pos += 8;
            return u64::from_le_bytes(raw);
        }

        while self.bits_available < bit_width {
            self.buffer |= (self.input[self.pos] as u64) << self.bits_available;
            self.pos += 1;
            self.bits_available += 8;
        }

        let value = self.buffer & ((1u64 << bit_width) - 1);
        self.buffer >>= bit_width;
        self.bits_available -= bit_width;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn packs_across_byte_boundaries() {
        let mut out = [0u8; 4];
        let mut writer = BitWriter::new(&mut out);
        writer.append(0b101, 3);
        writer.append(0b1_1111_1111, 9);
        writer.append(0xabc, 12);
        assert_eq!(writer.finish(), 3);
        assert_eq!(out, [0b1111_1101, 0b1100_1111, 0xab, 0]);

        let mut reader = BitReader::new(&out);
        assert_eq!(reader.extract(3), 0b101);
        assert_eq!(reader.extract(9), 0b1_1111_1111);
        assert_eq!(reader.extract(12), 0xabc);
    }

    #[test_case(8; "bytes")]
    #[test_case(24; "three bytes")]
    #[test_case(48; "six bytes")]
    #[test_case(64; "full words")]
    fn whole_byte_widths_are_little_endian(width: u32) {
        let values = [0x0123_4567_89ab_cdefu64, 0xfedc_ba98_7654_3210, 1];
        let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
        let bytes = width as usize / 8;
        let mut out = vec![0u8; bytes * values.len()];

        let mut writer = BitWriter::new(&mut out);
        for value in values {
            writer.append(value & mask, width);
        }
        assert_eq!(writer.finish(), out.len());

        for (chunk, value) in out.chunks(bytes).zip(values) {
            assert_eq!(chunk, &value.to_le_bytes()[..bytes]);
        }

        let mut reader = BitReader::new(&out);
        for value in values {
            assert_eq!(reader.extract(width), value & mask);
        }
    }
}
