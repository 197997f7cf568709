#![deny(missing_docs)]

//! # zipvec
//!
//! A self-compressing, randomly indexable vector of fixed-width integers.
//!
//! Logically a [`PagedVec`] is a flat array. Physically it is a sequence of
//! fixed-length pages, each stored in whichever representation is cheapest
//! for its contents: nothing at all for constant runs and arithmetic
//! progressions, packed absolute values or packed deltas for small spreads,
//! and the raw native-width values otherwise. Compressed pages live in a
//! 64-byte aligned [`arena::Arena`]. Exactly one page is decoded at a time.
//!
//! ```
//! use zipvec::PagedVec;
//!
//! let mut vec = PagedVec::<i64>::new(4096);
//! for i in 0..4096 {
//!     vec.set(i, i as i64);
//! }
//! vec.sync();
//! assert_eq!(vec.get(1234), 1234);
//! ```

pub mod arena;
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod report;
pub mod vector;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use codec::{Arch, Backend, Codec, CodecBackend, Element, Format, Meta, Width};
pub use config::VecConfig;
pub use error::Error;
pub use report::IndexReport;
pub use vector::PagedVec;

/// Default number of elements per page.
pub const DEFAULT_PAGE_LEN: usize = 512;

/// Smallest page length accepted by [`VecConfig::validate`].
pub const MIN_PAGE_LEN: usize = 64;
