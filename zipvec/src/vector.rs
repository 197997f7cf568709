//! The paged vector.
//!
//! A logical index `i` splits into page `i >> shift` and slot `i & mask`.
//! Exactly one page is resident at a time, in a window that is either the
//! vector's own decode buffer or, for pages stored at native width, the
//! page's arena block itself. Touching a different page switches the
//! window:
//!
//! 1. The resident page is evicted. A clean page needs no work. A dirty
//!    page is scanned, gets a format, and is encoded into a block of that
//!    width (reusing its previous block when the width is unchanged), or
//!    stays in place when it is still native, or stores nothing when it is
//!    constant. A previous block that is no longer used goes back to the
//!    arena.
//! 2. The target page is brought in: native pages are used in place,
//!    other stored and constant pages are decoded into the buffer, and
//!    never-written pages read as zero.

use std::iter::FusedIterator;

use crate::arena::Arena;
use crate::arena::BlockOffset;
use crate::codec::Backend;
use crate::codec::Codec;
use crate::codec::CodecBackend;
use crate::codec::Element;
use crate::codec::Format;
use crate::codec::Meta;
use crate::config::VecConfig;
use crate::error::Error;
use crate::index::PageEntry;
use crate::index::PageIndex;
use crate::report::IndexReport;
use crate::report::PageSummary;
use crate::DEFAULT_PAGE_LEN;

/// Which memory holds the resident page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    /// The vector's decode buffer.
    Buffer,
    /// A native-width block in the arena, read and written directly.
    InPlace(BlockOffset),
}

/// A self-compressing vector of fixed-width integers.
///
/// Access goes through `&mut self` because any read may decode a page.
pub struct PagedVec<T: Element, B: CodecBackend = Backend> {
    len: usize,
    page_len: usize,
    page_shift: u32,
    page_mask: usize,
    index: PageIndex<T>,
    arena: Arena,
    buffer: Vec<T>,
    window: Window,
    active: Option<usize>,
    dirty: bool,
    backend: B,
}

impl<T: Element> PagedVec<T, Backend> {
    /// A zeroed vector of `len` elements with the default page length and
    /// the detected kernels.
    pub fn new(len: usize) -> Self {
        Self::build(len, DEFAULT_PAGE_LEN, Backend::detect())
    }

    /// A zeroed vector of `len` elements with the given settings.
    pub fn with_config(len: usize, config: &VecConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::build(len, config.page_len, config.backend()))
    }
}

impl<T: Element, B: CodecBackend> PagedVec<T, B> {
    /// A zeroed vector of `len` elements using `backend` for its codecs.
    pub fn with_backend(len: usize, page_len: usize, backend: B) -> Result<Self, Error> {
        VecConfig { page_len, ..VecConfig::default() }.validate()?;
        Ok(Self::build(len, page_len, backend))
    }

    fn build(len: usize, page_len: usize, backend: B) -> Self {
        let mut index = PageIndex::new(page_len);
        index.ensure_capacity(len);
        let arena = Arena::new(page_len, 2 * T::NATIVE.block_lines(page_len));
        tracing::debug!(len, page_len, pages = index.len(), "created paged vector");

        Self {
            len,
            page_len,
            page_shift: page_len.trailing_zeros(),
            page_mask: page_len - 1,
            index,
            arena,
            buffer: vec![T::default(); page_len],
            window: Window::Buffer,
            active: None,
            dirty: false,
            backend,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements per page.
    pub fn page_len(&self) -> usize {
        self.page_len
    }

    /// Number of pages in the index.
    pub fn page_count(&self) -> usize {
        self.index.len()
    }

    /// The resident page, if any.
    pub fn active_page(&self) -> Option<usize> {
        self.active
    }

    /// The codec backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The arena holding stored pages.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The stored state of page `page`. The resident page's entry is only
    /// current after [`PagedVec::sync`].
    pub fn page_entry(&self, page: usize) -> Option<&PageEntry<T>> {
        self.index.get(page)
    }

    /// Changes the length. New elements read as zero. Page capacity only
    /// ever grows, so elements cut off by shrinking are kept and reappear
    /// if the vector grows back.
    pub fn resize(&mut self, len: usize) {
        self.index.ensure_capacity(len);
        self.len = len;
    }

    /// Reads element `index`.
    ///
    /// ## Panics
    /// If the codec backend fails on a page, after logging the failure.
    #[inline]
    pub fn get(&mut self, index: usize) -> T {
        self.try_get(index).unwrap_or_else(fatal)
    }

    /// Writes element `index`.
    ///
    /// ## Panics
    /// If the codec backend fails on a page, after logging the failure.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        self.try_set(index, value).unwrap_or_else(fatal)
    }

    /// Reads element `index`, surfacing codec failures.
    pub fn try_get(&mut self, index: usize) -> Result<T, Error> {
        debug_assert!(index < self.len, "index {index} out of bounds for length {}", self.len);
        let slot = self.resolve(index)?;
        Ok(match self.window {
            Window::Buffer => self.buffer[slot],
            Window::InPlace(offset) => T::read_le(&self.arena.bytes()[offset.get() + slot * T::BYTES..]),
        })
    }

    /// Writes element `index`, surfacing codec failures.
    pub fn try_set(&mut self, index: usize, value: T) -> Result<(), Error> {
        debug_assert!(index < self.len, "index {index} out of bounds for length {}", self.len);
        let slot = self.resolve(index)?;
        self.dirty = true;
        match self.window {
            Window::Buffer => self.buffer[slot] = value,
            Window::InPlace(offset) => {
                value.write_le(&mut self.arena.bytes_mut()[offset.get() + slot * T::BYTES..])
            }
        }
        Ok(())
    }

    /// Compresses the resident page, if any, and leaves no page resident.
    ///
    /// ## Panics
    /// If the codec backend fails on the page, after logging the failure.
    pub fn sync(&mut self) {
        self.try_sync().unwrap_or_else(fatal)
    }

    /// Like [`PagedVec::sync`], surfacing codec failures.
    pub fn try_sync(&mut self) -> Result<(), Error> {
        self.switch_page(self.index.len())
    }

    /// Iterates over all elements, bringing pages in one after another.
    pub fn iter(&mut self) -> Iter<'_, T, B> {
        Iter { vec: self, pos: 0 }
    }

    /// Summarises the page index. Call [`PagedVec::sync`] first to include
    /// the resident page.
    pub fn report(&self) -> IndexReport {
        let pages = self
            .index
            .iter()
            .enumerate()
            .map(|(page, entry)| PageSummary {
                page,
                format: entry.format,
                offset: entry.offset.map(BlockOffset::get),
                iv: entry.meta.iv.to_i128(),
                dv: entry.meta.dv.to_i128(),
            })
            .collect();

        IndexReport {
            page_len: self.page_len,
            element_bytes: T::BYTES,
            entry_bytes: std::mem::size_of::<PageEntry<T>>(),
            arena_bytes: self.arena.capacity(),
            bitmap_bytes: self.arena.bitmap_bytes(),
            pages,
        }
    }

    /// Makes the page holding `index` resident and returns the slot.
    #[inline]
    fn resolve(&mut self, index: usize) -> Result<usize, Error> {
        let page = index >> self.page_shift;
        if self.active != Some(page) {
            self.switch_page(page)?;
        }
        Ok(index & self.page_mask)
    }

    fn switch_page(&mut self, target: usize) -> Result<(), Error> {
        if let Some(page) = self.active {
            // A failed eviction keeps the page resident and dirty.
            if self.dirty {
                self.evict(page)?;
            }
            self.active = None;
            self.window = Window::Buffer;
            self.dirty = false;
        }
        if target < self.index.len() {
            self.activate(target)?;
            self.active = Some(target);
        }
        Ok(())
    }

    /// Stores the dirty resident page. Leaves the window untouched.
    fn evict(&mut self, page: usize) -> Result<(), Error> {
        let native = Format::native::<T>();
        let in_place = match self.window {
            Window::InPlace(offset) => Some(offset),
            Window::Buffer => None,
        };

        let mut buffered = in_place.is_none();
        let stats = match in_place.and_then(|offset| self.native_values(offset)) {
            Some(values) => self.backend.scan_combined(values),
            None => {
                if let Some(offset) = in_place {
                    self.load_in_place(page, offset)?;
                    buffered = true;
                }
                self.backend.scan_combined(&self.buffer)
            }
        };
        let format = self.backend.select_format(&stats);
        let meta = self.backend.metadata(&stats, format);
        let previous = self.index.entry(page);

        let offset = match in_place {
            _ if format.is_constant() => None,
            Some(offset) if format == native => Some(offset),
            _ => {
                if let (Some(offset), false) = (in_place, buffered) {
                    self.load_in_place(page, offset)?;
                }
                Some(self.store(page, previous, format, meta)?)
            }
        };

        if let Some(stale) = previous.offset.filter(|&stale| Some(stale) != offset) {
            self.arena.free(previous.format.width, stale);
        }
        self.index.set(page, PageEntry { format, offset, meta });
        tracing::trace!(page, %format, offset = offset.map(BlockOffset::get), "compressed page");
        Ok(())
    }

    /// The elements of a native block, viewed without copying. The block
    /// holds little-endian values, so the view only exists on
    /// little-endian targets.
    fn native_values(&self, offset: BlockOffset) -> Option<&[T]> {
        if cfg!(target_endian = "little") {
            bytemuck::try_cast_slice(self.arena.block(T::NATIVE, offset)).ok()
        } else {
            None
        }
    }

    /// Copies a native block into the buffer.
    fn load_in_place(&mut self, page: usize, offset: BlockOffset) -> Result<(), Error> {
        let native = Format::native::<T>();
        let block = self.arena.block(native.width, offset);
        self.backend
            .decode(block, native, Meta::default(), &mut self.buffer)
            .map_err(|source| Error::Codec { page, source })
    }

    /// Encodes the buffer into a block of `format`'s width, reusing the
    /// previous block when the width is unchanged. A block allocated here
    /// goes back to the arena if encoding fails.
    fn store(
        &mut self,
        page: usize,
        previous: PageEntry<T>,
        format: Format,
        meta: Meta<T>,
    ) -> Result<BlockOffset, Error> {
        let (offset, fresh) = match previous.offset {
            Some(offset) if previous.format.width == format.width => (offset, false),
            _ => (self.arena.allocate(format.width), true),
        };
        let block = self.arena.block_mut(format.width, offset);
        if let Err(source) = self.backend.encode(&self.buffer, format, meta, block) {
            if fresh {
                self.arena.free(format.width, offset);
            }
            return Err(Error::Codec { page, source });
        }
        Ok(offset)
    }

    fn activate(&mut self, page: usize) -> Result<(), Error> {
        let entry = self.index.entry(page);
        let codec_error = |source| Error::Codec { page, source };

        match entry.offset {
            Some(offset) if entry.format == Format::native::<T>() => {
                self.window = Window::InPlace(offset);
            }
            _ if entry.format.codec == Codec::None => self.buffer.fill(T::default()),
            Some(offset) => {
                let block = self.arena.block(entry.format.width, offset);
                self.backend
                    .decode(block, entry.format, entry.meta, &mut self.buffer)
                    .map_err(codec_error)?;
            }
            None => {
                self.backend
                    .decode(&[], entry.format, entry.meta, &mut self.buffer)
                    .map_err(codec_error)?;
            }
        }
        tracing::trace!(page, format = %entry.format, "activated page");
        Ok(())
    }
}

#[cold]
fn fatal<R>(error: Error) -> R {
    tracing::error!(%error, "paged vector codec failure");
    panic!("{error}");
}

/// Iterator over a [`PagedVec`]. See [`PagedVec::iter`].
pub struct Iter<'a, T: Element, B: CodecBackend> {
    vec: &'a mut PagedVec<T, B>,
    pos: usize,
}

impl<T: Element, B: CodecBackend> Iterator for Iter<'_, T, B> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.pos >= self.vec.len {
            return None;
        }
        let value = self.vec.get(self.pos);
        self.pos += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vec.len.saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl<T: Element, B: CodecBackend> ExactSizeIterator for Iter<'_, T, B> {}

impl<T: Element, B: CodecBackend> FusedIterator for Iter<'_, T, B> {}
