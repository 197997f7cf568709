//! Compression summary of a paged vector's index.

use std::fmt;

use serde::Serialize;

use crate::codec::Format;

/// One page of an [`IndexReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    /// Page number
    pub page: usize,
    /// Stored format
    pub format: Format,
    /// Arena byte offset of the page's block
    pub offset: Option<usize>,
    /// Initial value
    pub iv: i128,
    /// Delta value
    pub dv: i128,
}

/// Per-page formats and whole-vector memory totals.
///
/// Built by [`crate::PagedVec::report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Elements per page
    pub page_len: usize,
    /// Bytes per element
    pub element_bytes: usize,
    /// Bytes per index entry
    pub entry_bytes: usize,
    /// Arena capacity in bytes
    pub arena_bytes: usize,
    /// Allocation bitmap size in bytes
    pub bitmap_bytes: usize,
    /// Every page in the index
    pub pages: Vec<PageSummary>,
}

impl PageSummary {
    /// Packed size of the page in bytes, without line rounding.
    pub fn block_bytes(&self, page_len: usize) -> usize {
        if self.format.is_stored() {
            self.format.width.payload_bytes(page_len)
        } else {
            0
        }
    }
}

impl IndexReport {
    /// Size of an uncompressed page.
    pub fn page_bytes(&self) -> usize {
        self.page_len * self.element_bytes
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Sum of the packed page sizes.
    pub fn used_bytes(&self) -> usize {
        self.pages.iter().map(|p| p.block_bytes(self.page_len)).sum()
    }

    /// Size of the vector if every page were uncompressed.
    pub fn raw_bytes(&self) -> usize {
        self.page_bytes() * self.page_count()
    }

    /// Index plus bitmap.
    pub fn meta_bytes(&self) -> usize {
        self.entry_bytes * self.page_count() + self.bitmap_bytes
    }

    /// Everything the vector holds: metadata plus arena.
    pub fn total_bytes(&self) -> usize {
        self.meta_bytes() + self.arena_bytes
    }

    /// Packed pages as a percentage of raw pages.
    pub fn page_ratio(&self) -> f64 {
        percent(self.used_bytes(), self.raw_bytes())
    }

    /// Total footprint as a percentage of raw pages.
    pub fn total_ratio(&self) -> f64 {
        percent(self.total_bytes(), self.raw_bytes())
    }

    /// Metadata as a percentage of the total footprint.
    pub fn meta_ratio(&self) -> f64 {
        percent(self.meta_bytes(), self.total_bytes())
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl fmt::Display for IndexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let page_bytes = self.page_bytes();
        writeln!(f, "--- dump index ---")?;
        for page in &self.pages {
            let block = page.block_bytes(self.page_len);
            let offset = page.offset.map_or_else(|| "-".to_string(), |o| o.to_string());
            writeln!(
                f,
                "block[{:<5}] fmt={:<10}:{:<3} size=[{:>5}/{:<5}] ({:>5.1}%) offset={:<9} iv={} dv={}",
                page.page,
                page.format.codec.as_ref(),
                page.format.width.bits(),
                block,
                page_bytes,
                percent(block, page_bytes),
                offset,
                page.iv,
                page.dv,
            )?;
        }
        writeln!(f, "--- statistics ---")?;
        writeln!(f, "page_size   : {:<9}", page_bytes)?;
        writeln!(f, "page_count  : {:<9}", self.page_count())?;
        writeln!(f, "vec_used    : {:<9}", self.used_bytes())?;
        writeln!(f, "vec_pages   : {:<9}", self.raw_bytes())?;
        writeln!(f, "arena_total : {:<9}", self.arena_bytes)?;
        writeln!(f, "meta_total  : {:<9}", self.meta_bytes())?;
        writeln!(f, "vec_total   : {:<9}", self.total_bytes())?;
        writeln!(f, "page_ratio  : {:>5.1}%", self.page_ratio())?;
        writeln!(f, "total_ratio : {:>5.1}%", self.total_ratio())?;
        write!(f, "meta_ratio  : {:>5.1}%", self.meta_ratio())
    }
}
