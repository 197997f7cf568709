mod formats;
mod growth;
mod roundtrip;

use zipvec::codec::Arch;
use zipvec::CodecBackend;
use zipvec::Element;
use zipvec::PagedVec;
use zipvec::VecConfig;

/// A vector with the given page length and kernels.
pub fn vector<T: Element>(len: usize, page_len: usize, arch: Arch) -> PagedVec<T> {
    let config = VecConfig { page_len, arch: Some(arch) };
    PagedVec::with_config(len, &config).expect("valid config")
}

/// Checks that the arena bitmap holds exactly the lines of the blocks the
/// index points at, and that no two blocks share a line.
pub fn assert_arena_consistent<T: Element, B: CodecBackend>(vec: &PagedVec<T, B>) {
    let arena = vec.arena();
    let mut owned = vec![false; arena.line_count()];
    for page in 0..vec.page_count() {
        let entry = vec.page_entry(page).unwrap();
        let Some(offset) = entry.offset else {
            assert!(!entry.format.is_stored(), "stored page {page} has no block");
            continue;
        };
        let start = offset.get() / zipvec::arena::LINE_BYTES;
        for line in start..start + entry.format.width.block_lines(vec.page_len()) {
            assert!(!owned[line], "line {line} owned by two pages");
            owned[line] = true;
        }
    }
    for (line, &is_owned) in owned.iter().enumerate() {
        assert_eq!(arena.bitmap()[line], is_owned, "bitmap disagrees at line {line}");
    }
}
