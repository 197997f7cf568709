//! Construction-time settings for a [`crate::PagedVec`].

use serde::Deserialize;
use serde::Serialize;

use crate::codec::Arch;
use crate::codec::Backend;
use crate::error::Error;
use crate::DEFAULT_PAGE_LEN;
use crate::MIN_PAGE_LEN;

/// Settings for a paged vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VecConfig {
    /// Elements per page. A power of two, at least [`MIN_PAGE_LEN`].
    pub page_len: usize,
    /// Kernel set to use; detected from the CPU when unset.
    pub arch: Option<Arch>,
}

impl Default for VecConfig {
    fn default() -> Self {
        Self { page_len: DEFAULT_PAGE_LEN, arch: None }
    }
}

impl VecConfig {
    /// Checks the settings.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.page_len.is_power_of_two() {
            return Err(Error::PageLenNotPowerOfTwo(self.page_len));
        }
        if self.page_len < MIN_PAGE_LEN {
            return Err(Error::PageLenTooSmall(self.page_len));
        }
        Ok(())
    }

    /// The backend these settings select.
    pub fn backend(&self) -> Backend {
        self.arch.map_or_else(Backend::detect, Backend::new)
    }
}
