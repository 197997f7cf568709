//! Reads always observe the last write, whatever the pages went through.

use proptest::prelude::*;
use test_case::test_case;
use zipvec::codec::Arch;
use zipvec::testing::BlockRandom;
use zipvec::testing::CountingBackend;
use zipvec::Backend;
use zipvec::Codec;
use zipvec::Element;
use zipvec::Format;
use zipvec::PagedVec;
use zipvec::Width;

use crate::assert_arena_consistent;
use crate::vector;

const Q: usize = 64;

#[derive(Debug, Clone)]
enum Op {
    Set(usize, i64),
    Fill(usize, i64, i64),
    Get(usize),
    Sync,
}

/// Values drawn from a few magnitudes so pages move between formats.
fn value() -> impl Strategy<Value = i64> {
    prop_oneof![
        Just(0i64),
        -100i64..100,
        -(1i64 << 20)..(1i64 << 20),
        any::<i64>(),
    ]
}

fn op(len: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..len, value()).prop_map(|(i, v)| Op::Set(i, v)),
        1 => (0..len / Q, value(), -3i64..3).prop_map(|(p, v, d)| Op::Fill(p, v, d)),
        2 => (0..len).prop_map(Op::Get),
        1 => Just(Op::Sync),
    ]
}

fn run(arch: Arch, ops: Vec<Op>, len: usize) -> Result<(), TestCaseError> {
    let mut vec = vector::<i64>(len, Q, arch);
    let mut model = vec![0i64; len];

    for op in ops {
        match op {
            Op::Set(i, v) => {
                vec.set(i, v);
                model[i] = v;
            }
            Op::Fill(page, start, step) => {
                for slot in 0..Q {
                    let i = page * Q + slot;
                    let v = start.wrapping_add(step.wrapping_mul(slot as i64));
                    vec.set(i, v);
                    model[i] = v;
                }
            }
            Op::Get(i) => {
                prop_assert_eq!(vec.get(i), model[i]);
            }
            Op::Sync => {
                vec.sync();
                assert_arena_consistent(&vec);
            }
        }
    }

    vec.sync();
    assert_arena_consistent(&vec);
    let collected: Vec<i64> = vec.iter().collect();
    prop_assert_eq!(collected, model);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generic_kernels_return_last_writes(ops in prop::collection::vec(op(8 * Q), 1..400)) {
        run(Arch::Generic, ops, 8 * Q)?;
    }

    #[test]
    fn wide_kernels_return_last_writes(ops in prop::collection::vec(op(8 * Q), 1..400)) {
        run(Arch::Wide, ops, 8 * Q)?;
    }

    #[test]
    fn unsigned_narrow_elements(values in prop::collection::vec(any::<u32>(), 1..300)) {
        let mut vec = vector::<u32>(values.len(), Q, Arch::Wide);
        for (i, &v) in values.iter().enumerate().rev() {
            vec.set(i, v);
        }
        vec.sync();
        for (i, &v) in values.iter().enumerate() {
            prop_assert_eq!(vec.get(i), v);
        }
    }
}

#[test_case(Arch::Generic; "generic")]
#[test_case(Arch::Wide; "wide")]
fn index_sum_matches_iterator_sum(arch: Arch) {
    const LEN: usize = 1 << 16;
    let mut vec = vector::<i64>(LEN, 512, arch);
    for (i, value) in BlockRandom::new(512).take(LEN).enumerate() {
        vec.set(i, value);
    }

    let by_index = (0..LEN).fold(0i64, |sum, i| sum.wrapping_add(vec.get(i)));
    let by_iter = vec.iter().fold(0i64, i64::wrapping_add);
    assert_eq!(by_index, by_iter);
}

#[test]
fn both_kernel_sets_store_identical_pages() {
    const LEN: usize = 1 << 14;
    let mut generic = vector::<i64>(LEN, 512, Arch::Generic);
    let mut wide = vector::<i64>(LEN, 512, Arch::Wide);
    for (i, value) in BlockRandom::new(512).take(LEN).enumerate() {
        generic.set(i, value);
        wide.set(i, value);
    }
    generic.sync();
    wide.sync();

    assert_eq!(generic.report(), wide.report());
    assert_eq!(generic.arena().bytes(), wide.arena().bytes());
}

/// Pages of `i32` that land in the narrow delta and sub-native absolute
/// formats, including a run that wraps past `i32::MAX`.
fn signed_pages() -> Vec<(Vec<i32>, Format)> {
    let page = |f: fn(i32) -> i32| (0..Q as i32).map(f).collect::<Vec<_>>();
    vec![
        (
            page(|k| (i32::MAX - 100).wrapping_add(3 * k + k % 2)),
            Format::new(Codec::Delta, Width::W8),
        ),
        (
            page(|k| 1_000_000_000 + 1000 * k + (k * k) % 97),
            Format::new(Codec::Delta, Width::W16),
        ),
        (
            page(|k| (k * 3001) % 20_000 - 10_000),
            Format::new(Codec::Absolute, Width::W16),
        ),
        (
            page(|k| (k * 104_729) % 2_000_000 - 1_000_000),
            Format::new(Codec::Absolute, Width::W24),
        ),
    ]
}

/// Pages of `u32` near `u32::MAX`, one of them wrapping through zero.
fn unsigned_pages() -> Vec<(Vec<u32>, Format)> {
    let page = |f: fn(u32) -> u32| (0..Q as u32).map(f).collect::<Vec<_>>();
    vec![
        (
            page(|k| u32::MAX - (k * 5) % 100),
            Format::new(Codec::Delta, Width::W8),
        ),
        (
            page(|k| (u32::MAX - 50).wrapping_add(2 * k + k % 2)),
            Format::new(Codec::Delta, Width::W8),
        ),
        (
            page(|k| u32::MAX - (k * 13) % 200),
            Format::new(Codec::Delta, Width::W16),
        ),
        (
            page(|k| (k * k * 104_729) % 10_000_000),
            Format::new(Codec::Absolute, Width::W24),
        ),
    ]
}

/// Writes every page, syncs, then writes them again rotated by one so
/// each block changes width. Formats and contents are checked both times.
fn rotate_pages<T: Element>(arch: Arch, pages: &[(Vec<T>, Format)]) {
    let count = pages.len();
    let mut vec = vector::<T>(count * Q, Q, arch);
    let mut model = vec![T::default(); count * Q];

    for shift in 0..2 {
        for page in 0..count {
            let (values, _) = &pages[(page + shift) % count];
            for (slot, &value) in values.iter().enumerate() {
                vec.set(page * Q + slot, value);
                model[page * Q + slot] = value;
            }
        }
        vec.sync();
        assert_arena_consistent(&vec);

        for page in 0..count {
            let (_, format) = &pages[(page + shift) % count];
            assert_eq!(vec.page_entry(page).unwrap().format, *format, "page {page}");
        }
        let collected: Vec<T> = vec.iter().collect();
        assert_eq!(collected, model);
        for (i, &value) in model.iter().enumerate() {
            assert_eq!(vec.get(i), value);
        }
    }
}

#[test_case(Arch::Generic; "generic")]
#[test_case(Arch::Wide; "wide")]
fn signed_narrow_formats_return_last_writes(arch: Arch) {
    rotate_pages(arch, &signed_pages());
}

#[test_case(Arch::Generic; "generic")]
#[test_case(Arch::Wide; "wide")]
fn unsigned_narrow_formats_return_last_writes(arch: Arch) {
    rotate_pages(arch, &unsigned_pages());
}

fn assert_identical_pages<T: Element>(values: &[T]) {
    let mut generic = vector::<T>(values.len(), Q, Arch::Generic);
    let mut wide = vector::<T>(values.len(), Q, Arch::Wide);
    for (i, &value) in values.iter().enumerate() {
        generic.set(i, value);
        wide.set(i, value);
    }
    generic.sync();
    wide.sync();

    assert_eq!(generic.report(), wide.report());
    assert_eq!(generic.arena().bytes(), wide.arena().bytes());
}

#[test]
fn both_kernel_sets_store_identical_i32_pages() {
    let mut values: Vec<i32> = signed_pages().into_iter().flat_map(|(page, _)| page).collect();
    values.extend(BlockRandom::new(Q).take(64 * Q).map(|value| value as i32));
    assert_identical_pages(&values);
}

#[test]
fn both_kernel_sets_store_identical_u32_pages() {
    let mut values: Vec<u32> = unsigned_pages().into_iter().flat_map(|(page, _)| page).collect();
    values.extend(BlockRandom::new(Q).take(64 * Q).map(|value| value as u32));
    assert_identical_pages(&values);
}

#[test]
fn reading_never_rescans() {
    let backend = CountingBackend::new(Backend::new(Arch::Generic));
    let mut vec = PagedVec::<i64, _>::with_backend(16 * Q, Q, backend).unwrap();
    for (i, value) in BlockRandom::new(Q).take(vec.len()).enumerate() {
        vec.set(i, value);
    }
    vec.sync();
    let scans = vec.backend().scans();
    assert_eq!(scans, 16);

    for _ in 0..3 {
        let _: Vec<i64> = vec.iter().collect();
        vec.sync();
    }
    assert_eq!(vec.backend().scans(), scans);
    assert_arena_consistent(&vec);
}
