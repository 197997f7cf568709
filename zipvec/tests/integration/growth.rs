//! Vectors that change length.

use zipvec::codec::Arch;
use zipvec::testing::BlockRandom;
use zipvec::PagedVec;

use crate::assert_arena_consistent;
use crate::vector;

#[test_log::test]
fn resize_keeps_written_values() {
    let mut vec = vector::<i64>(1000, 512, Arch::Wide);
    let values: Vec<i64> = BlockRandom::new(512).take(100_000).collect();

    for (i, &value) in values.iter().take(1000).enumerate() {
        vec.set(i, value);
    }
    vec.resize(100_000);
    assert_eq!(vec.len(), 100_000);
    assert_eq!(vec.page_count(), 256);

    for (i, &value) in values.iter().enumerate().skip(1000) {
        vec.set(i, value);
    }
    vec.sync();
    assert_arena_consistent(&vec);

    let collected: Vec<i64> = vec.iter().collect();
    assert_eq!(collected, values);
}

#[test_log::test]
fn grown_tail_reads_zero() {
    let mut vec = PagedVec::<u64>::new(10);
    for i in 0..10 {
        vec.set(i, u64::MAX - i as u64);
    }
    vec.resize(5000);
    assert_eq!(vec.get(9), u64::MAX - 9);
    assert!((10..5000).all(|i| vec.get(i) == 0));
}

#[test]
fn arena_grows_as_pages_fill() {
    let mut vec = vector::<u64>(1 << 15, 512, Arch::Generic);
    let initial = vec.arena().capacity();
    for (i, value) in BlockRandom::new(512).take(vec.len()).enumerate() {
        vec.set(i, value as u64);
    }
    vec.sync();

    assert!(vec.arena().capacity() > initial);
    assert_eq!(vec.arena().capacity() % initial, 0);
    assert_arena_consistent(&vec);
}
