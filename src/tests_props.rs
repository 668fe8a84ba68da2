use crate::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Largest size used by the property tests. Covers several words so that
/// word boundaries and the growth path are exercised.
const MAX_SIZE: u32 = 600;

/// Strategy: a size and a set of positions within `[1, size]`.
fn arb_bitmap() -> impl Strategy<Value = (u32, BTreeSet<u32>)> {
    (1u32..=MAX_SIZE).prop_flat_map(|size| {
        (
            Just(size),
            proptest::collection::btree_set(1..=size, 0..=(size.min(128) as usize)),
        )
    })
}

fn make_bitmap(size: u32, positions: &BTreeSet<u32>) -> Bitmap {
    let mut bitmap = Bitmap::new(size);
    for &x in positions {
        bitmap.set(x);
    }
    bitmap
}

proptest! {
    #[test]
    fn contains_matches_model((size, model) in arb_bitmap()) {
        let bitmap = make_bitmap(size, &model);
        prop_assert_eq!(bitmap.size(), size);
        for x in 1..=size + 70 {
            prop_assert_eq!(bitmap.contains(x), model.contains(&x), "contains({})", x);
        }
    }

    #[test]
    fn remove_matches_model((size, mut model) in arb_bitmap(), victims in proptest::collection::vec(1..=MAX_SIZE, 0..32)) {
        let mut bitmap = make_bitmap(size, &model);
        for x in victims {
            bitmap.remove(x);
            model.remove(&x);
        }
        prop_assert_eq!(bitmap.iter().collect::<Vec<_>>(), model.iter().copied().collect::<Vec<_>>());
        prop_assert_eq!(bitmap.size(), size);
    }

    #[test]
    fn count_to_matches_model((size, model) in arb_bitmap()) {
        let bitmap = make_bitmap(size, &model);
        for until in 0..=size + 10 {
            let expected = model.iter().take_while(|&&x| x <= until).count();
            prop_assert_eq!(bitmap.count_to(until), expected, "count_to({})", until);
        }
        prop_assert_eq!(bitmap.count(), model.len());
    }

    #[test]
    fn selection_matches_model((size, model) in arb_bitmap()) {
        let bitmap = make_bitmap(size, &model);
        prop_assert_eq!(bitmap.min(), model.first().copied());
        prop_assert_eq!(bitmap.max(), model.last().copied());
        prop_assert_eq!(bitmap.min_zero(), (1..=size).find(|x| !model.contains(x)));
        prop_assert_eq!(bitmap.max_zero(), (1..=size).rev().find(|x| !model.contains(x)));
    }

    #[test]
    fn selection_ignores_padding((size, model) in arb_bitmap()) {
        let mut bitmap = make_bitmap(size, &model);
        bitmap.ones();
        for &x in &model {
            bitmap.remove(x);
        }
        prop_assert_eq!(bitmap.min_zero(), model.first().copied());
        prop_assert_eq!(bitmap.max_zero(), model.last().copied());
        prop_assert!(bitmap.max().is_none_or(|x| x <= size));
        prop_assert_eq!(bitmap.count(), size as usize - model.len());
    }

    #[test]
    fn hex_roundtrip((size, model) in arb_bitmap()) {
        let bitmap = make_bitmap(size, &model);
        let hex = bitmap.to_hex();
        prop_assert_eq!(hex.len(), size.div_ceil(4) as usize);
        let decoded = Bitmap::from_hex(&hex, Some(size)).unwrap().unwrap();
        prop_assert_eq!(&decoded, &bitmap);
        prop_assert_eq!(decoded.to_hex(), hex);
    }

    #[test]
    fn bytes_roundtrip((size, model) in arb_bitmap()) {
        let bitmap = make_bitmap(size, &model);
        let bytes = bitmap.to_bytes();
        prop_assert_eq!(bytes.len(), bitmap.word_len() * 8);
        let decoded = Bitmap::from_bytes(&bytes, Some(size)).unwrap().unwrap();
        prop_assert_eq!(decoded.as_words(), bitmap.as_words());
        prop_assert_eq!(decoded, bitmap);
    }

    #[test]
    fn facade_roundtrip((size, model) in arb_bitmap()) {
        let bitmap = make_bitmap(size, &model);
        let hex = HexBitmap::from(&bitmap);
        prop_assert_eq!(hex.to_bitmap().unwrap(), bitmap);
    }

    #[test]
    fn algebra_matches_model((size_a, a) in arb_bitmap(), (size_b, b) in arb_bitmap()) {
        let left = make_bitmap(size_a, &a);
        let right = make_bitmap(size_b, &b);
        let small = size_a.min(size_b);
        let large = size_a.max(size_b);

        let mut union = left.clone();
        union.or([&right]);
        prop_assert_eq!(union.size(), large);
        prop_assert_eq!(union.iter().collect::<BTreeSet<_>>(), &a | &b);

        let mut symmetric = left.clone();
        symmetric.xor([&right]);
        prop_assert_eq!(symmetric.size(), large);
        prop_assert_eq!(symmetric.iter().collect::<BTreeSet<_>>(), &a ^ &b);

        let mut intersection = left.clone();
        intersection.and([&right]);
        prop_assert_eq!(intersection.size(), small);
        prop_assert_eq!(intersection.word_len(), left.word_len().min(right.word_len()));
        prop_assert_eq!(intersection.iter().collect::<BTreeSet<_>>(), &a & &b);

        let mut difference = left.clone();
        difference.and_not([&right]);
        prop_assert_eq!(difference.size(), small);
        let expected: BTreeSet<u32> = (&a - &b).into_iter().filter(|&x| x <= small).collect();
        prop_assert_eq!(difference.iter().collect::<BTreeSet<_>>(), expected);
    }
}
