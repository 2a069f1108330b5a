//! Partition laws: exact cover, contiguity, and near-equal range sizes.

use proptest::prelude::*;

use ftgs_rs::SplitRanges;

proptest! {
    #[test]
    fn partition_covers_every_split_exactly_once(
        num_splits in 1usize..500,
        num_workers in 1usize..64,
    ) {
        let ranges = SplitRanges::new(num_splits, num_workers);
        prop_assert_eq!(ranges.len(), num_workers);

        // Walking the ranges in worker order must visit 0..num_splits in
        // ascending order with no gaps and no repeats.
        let mut next = 0usize;
        for range in ranges.iter() {
            for split in range.splits() {
                prop_assert_eq!(split, next);
                next += 1;
            }
        }
        prop_assert_eq!(next, num_splits);
    }

    #[test]
    fn range_sizes_differ_by_at_most_one(
        num_splits in 1usize..500,
        num_workers in 1usize..64,
    ) {
        let ranges = SplitRanges::new(num_splits, num_workers);
        let sizes: Vec<usize> = ranges.iter().map(|r| r.len()).collect();

        let min = sizes.iter().copied().min().unwrap();
        let max = sizes.iter().copied().max().unwrap();
        prop_assert!(max - min <= 1, "sizes {:?} differ by more than 1", sizes);

        // The larger ranges come first: remainder splits go to low ids.
        let mut seen_small = false;
        for &size in &sizes {
            if size < max {
                seen_small = true;
            } else {
                prop_assert!(!seen_small, "large range after a small one: {:?}", sizes);
            }
        }
    }

    #[test]
    fn empty_ranges_appear_only_when_workers_outnumber_splits(
        num_splits in 1usize..100,
        num_workers in 1usize..100,
    ) {
        let ranges = SplitRanges::new(num_splits, num_workers);
        let empty = ranges.iter().filter(|r| r.is_empty()).count();

        if num_workers <= num_splits {
            prop_assert_eq!(empty, 0);
        } else {
            prop_assert_eq!(empty, num_workers - num_splits);
        }
    }
}
