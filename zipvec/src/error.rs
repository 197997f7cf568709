//! Top-level error type for the zipvec library
//!

use crate::codec::CodecError;

/// Errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The page length must be a power of two so that an index splits
    /// into page and slot with a shift and a mask.
    #[error("page length must be a power of two, got {0}")]
    PageLenNotPowerOfTwo(usize),
    /// The page length is below the smallest supported page.
    #[error("page length {0} is smaller than the minimum of {min}", min = crate::MIN_PAGE_LEN)]
    PageLenTooSmall(usize),
    /// The codec backend rejected a page. Surfaced by the checked
    /// accessors on [`crate::PagedVec`].
    #[error("codec failure on page {page}: {source}")]
    Codec {
        /// The page being encoded or decoded
        page: usize,
        /// The underlying backend error
        #[source]
        source: CodecError,
    },
}
