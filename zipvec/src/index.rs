//! Per-page metadata.

use crate::arena::BlockOffset;
use crate::codec::Format;
use crate::codec::Meta;

/// Where and how one page is stored.
///
/// A never-written page has the default entry: codec `none`, width 0, no
/// block, zero metadata. A page with a stored format always has a block
/// of exactly the size its width implies; constant pages never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageEntry<T> {
    /// Codec and width
    pub format: Format,
    /// Arena block, for stored formats
    pub offset: Option<BlockOffset>,
    /// Codec metadata
    pub meta: Meta<T>,
}

/// Number of pages a vector of `len` elements reserves. Capacity rounds
/// `len` up to a power of two first, so repeated growth settles quickly.
pub fn page_count(len: usize, page_len: usize) -> usize {
    len.max(1).next_power_of_two().div_ceil(page_len)
}

/// A growable table of [`PageEntry`].
#[derive(Debug, Clone)]
pub struct PageIndex<T> {
    entries: Vec<PageEntry<T>>,
    page_len: usize,
}

impl<T: Copy + Default> PageIndex<T> {
    /// An index with no pages.
    pub fn new(page_len: usize) -> Self {
        Self { entries: Vec::new(), page_len }
    }

    /// Grows the table to cover `len` elements. Never shrinks.
    pub fn ensure_capacity(&mut self, len: usize) {
        let pages = page_count(len, self.page_len);
        if pages > self.entries.len() {
            tracing::debug!(from = self.entries.len(), to = pages, "grew page index");
            self.entries.resize(pages, PageEntry::default());
        }
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no pages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry of page `page`.
    pub fn get(&self, page: usize) -> Option<&PageEntry<T>> {
        self.entries.get(page)
    }

    pub(crate) fn entry(&self, page: usize) -> PageEntry<T> {
        self.entries[page]
    }

    pub(crate) fn set(&mut self, page: usize, entry: PageEntry<T>) {
        self.entries[page] = entry;
    }

    /// All entries, in page order.
    pub fn iter(&self) -> impl Iterator<Item = &PageEntry<T>> {
        self.entries.iter()
    }
}
