//! Which format each kind of page ends up in.

use test_case::test_case;
use zipvec::codec::Arch;
use zipvec::testing::BlockRandom;
use zipvec::testing::Pattern;
use zipvec::Codec;
use zipvec::Format;
use zipvec::Meta;
use zipvec::Width;

use crate::assert_arena_consistent;
use crate::vector;

const Q: usize = 512;

#[test_case(Arch::Generic; "generic")]
#[test_case(Arch::Wide; "wide")]
fn counting_sequence_is_constant_delta(arch: Arch) {
    let mut vec = vector::<i64>(8 * Q, Q, arch);
    for i in 0..vec.len() {
        vec.set(i, i as i64);
    }
    vec.sync();

    let first = vec.page_entry(0).unwrap();
    assert_eq!(first.format, Format::new(Codec::ConstantDelta, Width::W0));
    assert_eq!(first.meta, Meta { iv: -1, dv: 1 });
    for page in 1..8 {
        let entry = vec.page_entry(page).unwrap();
        assert_eq!(entry.meta.iv, (page * Q) as i64 - 1);
    }
    assert_eq!(vec.arena().lines_in_use(), 0);
}

#[test_case(Arch::Generic; "generic")]
#[test_case(Arch::Wide; "wide")]
fn small_absolute_values_pack_to_a_byte(arch: Arch) {
    let mut generator = BlockRandom::new(Q);
    let mut vec = vector::<i64>(Q, Q, arch);
    for i in 0..Q {
        vec.set(i, generator.sample(Pattern::AbsI7));
    }
    vec.sync();

    let entry = vec.page_entry(0).unwrap();
    assert_eq!(entry.format, Format::new(Codec::Absolute, Width::W8));
    assert_eq!(entry.meta, Meta::default());
}

#[test_case(Arch::Generic; "generic")]
#[test_case(Arch::Wide; "wide")]
fn small_spreads_around_a_baseline_pack_deltas(arch: Arch) {
    let mut generator = BlockRandom::new(Q);
    // Draw once so the generator has a baseline.
    generator.next_value();
    let mut vec = vector::<i64>(Q, Q, arch);
    for i in 0..Q {
        vec.set(i, generator.sample(Pattern::RelI7));
    }
    let first = vec.get(0);
    vec.sync();

    let entry = vec.page_entry(0).unwrap();
    assert_eq!(entry.format, Format::new(Codec::Delta, Width::W8));
    assert_eq!(entry.meta.iv, first);
    assert_ne!(entry.meta.iv, 0);
}

fn expected(pattern: Pattern) -> Format {
    match pattern {
        Pattern::AbsI7 => Format::new(Codec::Absolute, Width::W8),
        Pattern::AbsI15 => Format::new(Codec::Absolute, Width::W16),
        Pattern::AbsI23 => Format::new(Codec::Absolute, Width::W24),
        Pattern::AbsI31 => Format::new(Codec::Absolute, Width::W32),
        Pattern::AbsI47 => Format::new(Codec::Absolute, Width::W48),
        Pattern::RelI7 => Format::new(Codec::Delta, Width::W8),
        Pattern::RelI15 => Format::new(Codec::Delta, Width::W16),
        Pattern::RelI23 => Format::new(Codec::Delta, Width::W24),
        Pattern::RelI31 => Format::new(Codec::Delta, Width::W32),
        Pattern::RelI47 => Format::new(Codec::Delta, Width::W48),
        Pattern::AbsI63 => Format::new(Codec::Absolute, Width::W64),
        Pattern::Constant => Format::new(Codec::ConstantAbsolute, Width::W0),
        Pattern::Sequence => Format::new(Codec::ConstantDelta, Width::W0),
    }
}

#[test_case(Arch::Generic; "generic")]
#[test_case(Arch::Wide; "wide")]
fn every_pattern_gets_its_format(arch: Arch) {
    const PAGES: usize = 64;
    let mut generator = BlockRandom::new(Q);
    let mut vec = vector::<i64>(PAGES * Q, Q, arch);
    let mut values = Vec::with_capacity(PAGES * Q);
    let mut patterns = Vec::with_capacity(PAGES);

    for i in 0..vec.len() {
        let value = generator.next_value();
        if i % Q == 0 {
            patterns.extend(generator.pattern());
        }
        values.push(value);
        vec.set(i, value);
    }
    vec.sync();

    for (page, &pattern) in patterns.iter().enumerate() {
        let entry = vec.page_entry(page).unwrap();
        assert_eq!(entry.format, expected(pattern), "page {page} holds {pattern}");
    }
    assert_arena_consistent(&vec);

    for (i, &value) in values.iter().enumerate() {
        assert_eq!(vec.get(i), value, "element {i}");
    }
}
