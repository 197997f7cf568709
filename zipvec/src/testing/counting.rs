//! A [`CodecBackend`] that counts how often each operation runs.

use std::cell::Cell;

use crate::codec::CodecBackend;
use crate::codec::CodecError;
use crate::codec::Element;
use crate::codec::Format;
use crate::codec::Meta;
use crate::codec::Stats;

/// Wraps a backend and counts scans, encodes and decodes.
#[derive(Debug, Default)]
pub struct CountingBackend<B> {
    inner: B,
    scans: Cell<usize>,
    encodes: Cell<usize>,
    decodes: Cell<usize>,
}

impl<B: CodecBackend> CountingBackend<B> {
    /// Wraps `inner`.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            scans: Cell::new(0),
            encodes: Cell::new(0),
            decodes: Cell::new(0),
        }
    }

    /// Number of scans of any mode.
    pub fn scans(&self) -> usize {
        self.scans.get()
    }

    /// Number of encode calls.
    pub fn encodes(&self) -> usize {
        self.encodes.get()
    }

    /// Number of decode calls, including synthesized pages.
    pub fn decodes(&self) -> usize {
        self.decodes.get()
    }

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }
}

impl<B: CodecBackend> CodecBackend for CountingBackend<B> {
    fn scan_absolute<T: Element>(&self, page: &[T]) -> Stats<T> {
        Self::bump(&self.scans);
        self.inner.scan_absolute(page)
    }

    fn scan_delta<T: Element>(&self, page: &[T]) -> Stats<T> {
        Self::bump(&self.scans);
        self.inner.scan_delta(page)
    }

    fn scan_combined<T: Element>(&self, page: &[T]) -> Stats<T> {
        Self::bump(&self.scans);
        self.inner.scan_combined(page)
    }

    fn select_format<T: Element>(&self, stats: &Stats<T>) -> Format {
        self.inner.select_format(stats)
    }

    fn metadata<T: Element>(&self, stats: &Stats<T>, format: Format) -> Meta<T> {
        self.inner.metadata(stats, format)
    }

    fn encode<T: Element>(
        &self,
        page: &[T],
        format: Format,
        meta: Meta<T>,
        out: &mut [u8],
    ) -> Result<(), CodecError> {
        Self::bump(&self.encodes);
        self.inner.encode(page, format, meta, out)
    }

    fn decode<T: Element>(
        &self,
        bytes: &[u8],
        format: Format,
        meta: Meta<T>,
        page: &mut [T],
    ) -> Result<(), CodecError> {
        Self::bump(&self.decodes);
        self.inner.decode(bytes, format, meta, page)
    }
}
