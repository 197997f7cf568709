//! Kernel selection.
//!
//! The first [`Backend::default`] probes the CPU once and caches the
//! answer; every vector built afterwards shares it. Callers that want a
//! particular kernel set, benchmarks mostly, build a [`Backend::new`] with
//! an explicit [`Arch`] instead.

use std::sync::OnceLock;

use serde::Deserialize;
use serde::Serialize;

use super::check_block;
use super::check_supported;
use super::generic;
use super::wide;
use super::Codec;
use super::CodecBackend;
use super::CodecError;
use super::Element;
use super::Format;
use super::Meta;
use super::Stats;

/// A kernel set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// One value at a time.
    Generic,
    /// Eight-lane chunks.
    Wide,
}

impl Arch {
    /// The best kernel set for the running CPU. Probed on first call.
    pub fn detect() -> Arch {
        static DETECTED: OnceLock<Arch> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            let arch = probe();
            tracing::debug!(%arch, "selected codec kernels");
            arch
        })
    }
}

fn probe() -> Arch {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "x86_64")] {
            if std::is_x86_feature_detected!("avx2") {
                Arch::Wide
            } else {
                Arch::Generic
            }
        } else if #[cfg(target_arch = "aarch64")] {
            Arch::Wide
        } else {
            Arch::Generic
        }
    }
}

/// The built-in [`CodecBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backend {
    arch: Arch,
}

impl Backend {
    /// A backend using the given kernel set.
    pub const fn new(arch: Arch) -> Self {
        Self { arch }
    }

    /// A backend using the detected kernel set.
    pub fn detect() -> Self {
        Self::new(Arch::detect())
    }

    /// The kernel set in use.
    pub const fn arch(&self) -> Arch {
        self.arch
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::detect()
    }
}

impl CodecBackend for Backend {
    fn scan_absolute<T: Element>(&self, page: &[T]) -> Stats<T> {
        match self.arch {
            Arch::Generic => generic::scan_absolute(page),
            Arch::Wide => wide::scan_absolute(page),
        }
    }

    fn scan_delta<T: Element>(&self, page: &[T]) -> Stats<T> {
        match self.arch {
            Arch::Generic => generic::scan_delta(page),
            Arch::Wide => wide::scan_delta(page),
        }
    }

    fn scan_combined<T: Element>(&self, page: &[T]) -> Stats<T> {
        match self.arch {
            Arch::Generic => generic::scan_combined(page),
            Arch::Wide => wide::scan_combined(page),
        }
    }

    fn encode<T: Element>(
        &self,
        page: &[T],
        format: Format,
        meta: Meta<T>,
        out: &mut [u8],
    ) -> Result<(), CodecError> {
        check_supported::<T>(format)?;
        let width = format.width;
        match (format.codec, self.arch) {
            (Codec::None, _) => return Err(CodecError::UnsupportedFormat(format)),
            (Codec::ConstantAbsolute | Codec::ConstantDelta, _) => return Ok(()),
            _ => check_block(format, page.len(), out.len())?,
        }
        match (format.codec, self.arch) {
            (Codec::Absolute, Arch::Generic) => {
                generic::encode_absolute(page, width, out);
            }
            (Codec::Absolute, Arch::Wide) => {
                wide::encode_absolute(page, width, out);
            }
            (Codec::Delta, Arch::Generic) => {
                generic::encode_delta(page, width, meta.iv, out);
            }
            (Codec::Delta, Arch::Wide) => {
                wide::encode_delta(page, width, meta.iv, out);
            }
            _ => {}
        }
        Ok(())
    }

    fn decode<T: Element>(
        &self,
        bytes: &[u8],
        format: Format,
        meta: Meta<T>,
        page: &mut [T],
    ) -> Result<(), CodecError> {
        check_supported::<T>(format)?;
        let width = format.width;
        match (format.codec, self.arch) {
            (Codec::None, _) => return Err(CodecError::UnsupportedFormat(format)),
            (Codec::ConstantAbsolute | Codec::ConstantDelta, _) => {
                return self.synthesize(format, meta, page)
            }
            _ => check_block(format, page.len(), bytes.len())?,
        }
        match (format.codec, self.arch) {
            (Codec::Absolute, Arch::Generic) => generic::decode_absolute(bytes, width, page),
            (Codec::Absolute, Arch::Wide) => wide::decode_absolute(bytes, width, page),
            (Codec::Delta, Arch::Generic) => generic::decode_delta(bytes, width, meta.iv, page),
            (Codec::Delta, Arch::Wide) => wide::decode_delta(bytes, width, meta.iv, page),
            _ => {}
        }
        Ok(())
    }
}
