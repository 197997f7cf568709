//! Test helpers: a deterministic page-pattern generator and a backend
//! wrapper that counts codec calls.

mod block_random;
mod counting;

pub use block_random::BlockRandom;
pub use block_random::DEFAULT_SEED;
pub use block_random::Pattern;
pub use counting::CountingBackend;
