//! Byte arena for stored pages.
//!
//! The arena is one contiguous, 64-byte aligned buffer divided into
//! 64-byte lines. An allocation bitmap holds one bit per line; a bit is set
//! iff its line belongs to exactly one live block. Blocks are addressed by
//! byte offset ([`BlockOffset`]), so they stay valid when the buffer
//! grows and moves.
//!
//! ## Allocation
//!
//! A request for `n` lines scans the bitmap circularly starting at the
//! line after the previous allocation: first `[cursor, len)`, then
//! `[0, cursor)`. The scan hops between runs of clear and set bits and
//! measures every free run to its true end, so neighbouring freed blocks
//! merge on the fly without any eager coalescing. The first run of at
//! least `n` lines wins. When no run is large enough the buffer and the
//! bitmap double, as many times as needed, and the scan runs again.

use bitvec::order::Lsb0;
use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;

use crate::codec::Width;

/// Size and alignment of an arena line.
pub const LINE_BYTES: usize = 64;

/// One arena line.
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, align(64))]
struct Line([u8; LINE_BYTES]);

impl Line {
    const ZERO: Line = Line([0; LINE_BYTES]);
}

/// Byte offset of a block in the arena. Always a multiple of
/// [`LINE_BYTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockOffset(usize);

impl BlockOffset {
    /// The offset in bytes.
    pub const fn get(self) -> usize {
        self.0
    }

    const fn from_line(line: usize) -> Self {
        Self(line * LINE_BYTES)
    }

    const fn line(self) -> usize {
        self.0 / LINE_BYTES
    }
}

/// Growable, line-granular block allocator.
pub struct Arena {
    lines: Vec<Line>,
    bitmap: BitVec<u64, Lsb0>,
    cursor: usize,
    page_len: usize,
}

impl Arena {
    /// Creates an arena for pages of `page_len` elements with room for
    /// `initial_lines` lines.
    pub fn new(page_len: usize, initial_lines: usize) -> Self {
        let initial_lines = initial_lines.max(1);
        Self {
            lines: vec![Line::ZERO; initial_lines],
            bitmap: BitVec::repeat(false, initial_lines),
            cursor: 0,
            page_len,
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.lines.len() * LINE_BYTES
    }

    /// Capacity in lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of lines owned by live blocks.
    pub fn lines_in_use(&self) -> usize {
        self.bitmap.count_ones()
    }

    /// Size of the allocation bitmap in bytes.
    pub fn bitmap_bytes(&self) -> usize {
        self.bitmap.len().div_ceil(8)
    }

    /// The allocation bitmap.
    pub fn bitmap(&self) -> &BitSlice<u64, Lsb0> {
        &self.bitmap
    }

    /// The whole arena as bytes.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.lines)
    }

    /// The whole arena as mutable bytes.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.lines)
    }

    /// The block of a page stored at `width`.
    pub fn block(&self, width: Width, offset: BlockOffset) -> &[u8] {
        let len = width.block_bytes(self.page_len);
        &self.bytes()[offset.get()..offset.get() + len]
    }

    /// The mutable block of a page stored at `width`.
    pub fn block_mut(&mut self, width: Width, offset: BlockOffset) -> &mut [u8] {
        let len = width.block_bytes(self.page_len);
        &mut self.bytes_mut()[offset.get()..offset.get() + len]
    }

    /// Allocates a block for one page at `width`.
    ///
    /// Never fails: the arena grows until the block fits.
    ///
    /// ## Panics
    /// If the scan finds no room right after growing, which would mean the
    /// bitmap is corrupt.
    pub fn allocate(&mut self, width: Width) -> BlockOffset {
        let need = width.block_lines(self.page_len);
        let start = match self.scan(need) {
            Some(start) => start,
            None => {
                self.grow(need);
                match self.scan(need) {
                    Some(start) => start,
                    None => {
                        tracing::error!(need, lines = self.lines.len(), "arena scan failed after growth");
                        panic!("arena has no run of {need} free lines after growth");
                    }
                }
            }
        };

        self.bitmap[start..start + need].fill(true);
        self.cursor = start + need;
        let offset = BlockOffset::from_line(start);
        tracing::trace!(%width, offset = offset.get(), lines = need, "allocated block");
        offset
    }

    /// Returns a block to the arena.
    pub fn free(&mut self, width: Width, offset: BlockOffset) {
        let need = width.block_lines(self.page_len);
        let start = offset.line();
        debug_assert!(self.bitmap[start..start + need].all(), "freeing lines that are not allocated");
        self.bitmap[start..start + need].fill(false);
        tracing::trace!(%width, offset = offset.get(), lines = need, "freed block");
    }

    /// Circular scan for `need` free lines.
    fn scan(&self, need: usize) -> Option<usize> {
        let len = self.bitmap.len();
        let cursor = self.cursor.min(len);
        find_free_run(&self.bitmap, cursor, len, need).or_else(|| find_free_run(&self.bitmap, 0, cursor, need))
    }

    /// Doubles the arena until at least `need` lines were added.
    fn grow(&mut self, need: usize) {
        let old = self.lines.len();
        let mut new = old;
        while new - old < need {
            new *= 2;
        }
        self.lines.resize(new, Line::ZERO);
        self.bitmap.resize(new, false);
        tracing::debug!(from = old * LINE_BYTES, to = new * LINE_BYTES, "grew arena");
    }
}

/// Finds the first run of at least `need` clear bits that starts in
/// `[from, to)`. Runs are measured to their end even past `to`.
fn find_free_run(bits: &BitSlice<u64, Lsb0>, from: usize, to: usize, need: usize) -> Option<usize> {
    let mut pos = from;
    while pos < to {
        let start = pos + bits[pos..].first_zero()?;
        if start >= to {
            return None;
        }
        let end = bits[start..].first_one().map_or(bits.len(), |run| start + run);
        if end - start >= need {
            return Some(start);
        }
        pos = end;
    }
    None
}
