//! Page codecs.
//!
//! A page of `Q` decoded elements is summarised by a statistics scan
//! ([`Stats`]), the statistics pick a [`Format`] and its [`Meta`], and the
//! page is then packed into (or unpacked from) a byte block of
//! [`Width::block_bytes`] bytes. Constant formats take no bytes at all and
//! are synthesized from their metadata.
//!
//! The kernels come in two flavours behind one [`CodecBackend`]
//! implementation, [`Backend`]: element-at-a-time [`generic`] kernels and
//! lane-chunked [`wide`] kernels. Both produce byte-identical output.

mod bit_buffer;
mod dispatch;
mod element;
pub mod generic;
pub mod select;
pub mod wide;

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

pub use dispatch::Arch;
pub use dispatch::Backend;
pub use element::sign_extend;
pub use element::Element;

use crate::arena::LINE_BYTES;

/// Bits per element of a stored page.
///
/// The arena accepts every code. The codecs only ever select 0, 8, 16,
/// 24, 32, 48 and the element's native width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
#[repr(u8)]
pub enum Width {
    /// Nothing stored
    #[default]
    W0,
    /// 1 bit
    W1,
    /// 2 bits
    W2,
    /// 3 bits
    W3,
    /// 4 bits
    W4,
    /// 6 bits
    W6,
    /// 8 bits
    W8,
    /// 12 bits
    W12,
    /// 16 bits
    W16,
    /// 24 bits
    W24,
    /// 32 bits
    W32,
    /// 48 bits
    W48,
    /// 64 bits
    W64,
}

impl Width {
    /// Widths the format selection step tries, narrowest first, before
    /// falling back to the native width.
    pub const CANDIDATES: [Width; 5] = [Width::W8, Width::W16, Width::W24, Width::W32, Width::W48];

    /// Number of bits per element.
    pub const fn bits(self) -> u32 {
        match self {
            Width::W0 => 0,
            Width::W1 => 1,
            Width::W2 => 2,
            Width::W3 => 3,
            Width::W4 => 4,
            Width::W6 => 6,
            Width::W8 => 8,
            Width::W12 => 12,
            Width::W16 => 16,
            Width::W24 => 24,
            Width::W32 => 32,
            Width::W48 => 48,
            Width::W64 => 64,
        }
    }

    /// Number of 64-byte arena lines a page of `page_len` elements at this
    /// width occupies. Never zero.
    pub const fn block_lines(self, page_len: usize) -> usize {
        let bytes = (self.bits() as usize * page_len).div_ceil(8);
        let lines = bytes.div_ceil(LINE_BYTES);
        if lines == 0 {
            1
        } else {
            lines
        }
    }

    /// Size in bytes of a stored page of `page_len` elements, rounded up
    /// to whole arena lines.
    pub const fn block_bytes(self, page_len: usize) -> usize {
        self.block_lines(page_len) * LINE_BYTES
    }

    /// Exact number of payload bytes for `page_len` elements, without
    /// line rounding.
    pub const fn payload_bytes(self, page_len: usize) -> usize {
        (self.bits() as usize * page_len).div_ceil(8)
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.bits(), f)
    }
}

/// How a page is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(strum::Display, strum::EnumString, strum::AsRefStr)]
#[derive(Serialize, Deserialize)]
#[repr(u8)]
pub enum Codec {
    /// Never written; reads as zero.
    #[default]
    #[strum(serialize = "none")]
    #[serde(rename = "none")]
    None,
    /// Packed deltas from the previous element, seeded by `iv`.
    #[strum(serialize = "block-rel")]
    #[serde(rename = "block-rel")]
    Delta,
    /// Packed absolute values.
    #[strum(serialize = "block-abs")]
    #[serde(rename = "block-abs")]
    Absolute,
    /// `x[i] = iv + dv * (i + 1)`, nothing stored.
    #[strum(serialize = "const-rel")]
    #[serde(rename = "const-rel")]
    ConstantDelta,
    /// `x[i] = iv`, nothing stored.
    #[strum(serialize = "const-abs")]
    #[serde(rename = "const-abs")]
    ConstantAbsolute,
}

/// Codec plus width of a stored page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Format {
    /// Representation
    pub codec: Codec,
    /// Bits per element
    pub width: Width,
}

impl Format {
    /// Builds a format.
    pub const fn new(codec: Codec, width: Width) -> Self {
        Self { codec, width }
    }

    /// The uncompressed format for elements of type `T`.
    pub const fn native<T: Element>() -> Self {
        Self::new(Codec::Absolute, T::NATIVE)
    }

    /// Whether the page is synthesized from metadata alone.
    pub const fn is_constant(&self) -> bool {
        matches!(self.codec, Codec::ConstantDelta | Codec::ConstantAbsolute)
    }

    /// Whether the page owns an arena block.
    pub const fn is_stored(&self) -> bool {
        matches!(self.codec, Codec::Delta | Codec::Absolute)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.codec, self.width)
    }
}

/// Per-page codec metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Meta<T> {
    /// Initial value
    pub iv: T,
    /// Delta value
    pub dv: T,
}

/// Which statistics a scan collects, and so which formats can be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanMode {
    /// Absolute range only.
    Absolute,
    /// Delta range only.
    Delta,
    /// Both ranges; the format selection picks the cheaper.
    #[default]
    Combined,
}

/// Statistics over one decoded page.
///
/// Deltas are taken between consecutive elements, `x[i] - x[i-1]` for
/// `i >= 1`, wrapping at the element width and read as signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats<T> {
    /// The scan that produced these statistics
    pub mode: ScanMode,
    /// Smallest element
    pub amin: T,
    /// Largest element
    pub amax: T,
    /// Smallest delta
    pub dmin: i64,
    /// Largest delta
    pub dmax: i64,
    /// The initial value: `x[0]`, or one step before `x[0]` when every
    /// delta is equal.
    pub iv: T,
}

/// Errors raised by a codec backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The backend has no kernel for this format.
    #[error("no kernel for format {0}")]
    UnsupportedFormat(Format),
    /// The byte block is shorter than the packed page.
    #[error("block of {actual} bytes is too small for {needed} bytes")]
    BlockTooSmall {
        /// Bytes the page needs
        needed: usize,
        /// Bytes provided
        actual: usize,
    },
    /// Synthesis was requested for a format that stores data.
    #[error("format {0} is not a constant format")]
    NotConstant(Format),
}

/// The operations a paged vector needs from its codecs.
///
/// Every method works on exactly one page: `page.len()` is the vector's
/// page length.
pub trait CodecBackend {
    /// Collects the absolute range of a page.
    fn scan_absolute<T: Element>(&self, page: &[T]) -> Stats<T>;

    /// Collects the delta range of a page.
    fn scan_delta<T: Element>(&self, page: &[T]) -> Stats<T>;

    /// Collects both ranges of a page.
    fn scan_combined<T: Element>(&self, page: &[T]) -> Stats<T>;

    /// Picks the cheapest format for the statistics.
    fn select_format<T: Element>(&self, stats: &Stats<T>) -> Format {
        select::select_format(stats)
    }

    /// Derives the metadata stored alongside `format`.
    fn metadata<T: Element>(&self, stats: &Stats<T>, format: Format) -> Meta<T> {
        select::metadata(stats, format)
    }

    /// Packs a page into `out`. Constant formats write nothing.
    fn encode<T: Element>(
        &self,
        page: &[T],
        format: Format,
        meta: Meta<T>,
        out: &mut [u8],
    ) -> Result<(), CodecError>;

    /// Unpacks a page from `bytes`. Constant formats ignore `bytes` and
    /// synthesize the page.
    fn decode<T: Element>(
        &self,
        bytes: &[u8],
        format: Format,
        meta: Meta<T>,
        page: &mut [T],
    ) -> Result<(), CodecError>;

    /// Fills a page from the metadata of a constant format.
    fn synthesize<T: Element>(
        &self,
        format: Format,
        meta: Meta<T>,
        page: &mut [T],
    ) -> Result<(), CodecError> {
        match format.codec {
            Codec::ConstantAbsolute => page.fill(meta.iv),
            Codec::ConstantDelta => {
                let mut value = meta.iv;
                for slot in page.iter_mut() {
                    value = value.wrapping_add(meta.dv);
                    *slot = value;
                }
            }
            _ => return Err(CodecError::NotConstant(format)),
        }
        Ok(())
    }
}

/// Checks that a block can hold `page_len` elements of `format`.
pub(crate) fn check_block(format: Format, page_len: usize, actual: usize) -> Result<(), CodecError> {
    let needed = format.width.payload_bytes(page_len);
    if actual < needed {
        return Err(CodecError::BlockTooSmall { needed, actual });
    }
    Ok(())
}

/// Whether the kernels can pack `format` for elements of type `T`.
pub(crate) fn check_supported<T: Element>(format: Format) -> Result<(), CodecError> {
    let width = format.width;
    let supported = match format.codec {
        Codec::Absolute | Codec::Delta => {
            width == T::NATIVE || (Width::CANDIDATES.contains(&width) && width.bits() < T::BITS)
        }
        Codec::ConstantAbsolute | Codec::ConstantDelta => width == Width::W0,
        Codec::None => false,
    };
    if supported {
        Ok(())
    } else {
        Err(CodecError::UnsupportedFormat(format))
    }
}
