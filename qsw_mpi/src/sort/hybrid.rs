/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! The hybrid merge/insertion sort shared by both sort families (§4.D):
//! recursive merge-sort down to spans of `threshold` length, insertion sort
//! below. Both families sort a permutation of indices by key rather than the
//! payload directly, so the same routine serves the `(column, value)` pair
//! sort and the `(column, row, value)` triple sort used by the dagger.

/// Returns a stable permutation of `0..keys.len()` such that
/// `keys[perm[i]]` is non-decreasing.
pub fn sort_permutation<K: Ord + Copy>(keys: &[K], threshold: usize) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..keys.len()).collect();
    let mut scratch = vec![0usize; keys.len()];
    merge_sort(&mut perm, &mut scratch, keys, threshold);
    perm
}

fn merge_sort<K: Ord + Copy>(perm: &mut [usize], scratch: &mut [usize], keys: &[K], threshold: usize) {
    let n = perm.len();
    if n <= 1 {
        return;
    }
    if n <= threshold.max(1) {
        insertion_sort(perm, keys);
        return;
    }
    let mid = n / 2;
    let (left, right) = perm.split_at_mut(mid);
    let (left_scratch, right_scratch) = scratch.split_at_mut(mid);
    merge_sort(left, left_scratch, keys, threshold);
    merge_sort(right, right_scratch, keys, threshold);
    merge(left, right, scratch, keys);
    perm.copy_from_slice(&scratch[..n]);
}

fn insertion_sort<K: Ord + Copy>(perm: &mut [usize], keys: &[K]) {
    for i in 1..perm.len() {
        let mut j = i;
        while j > 0 && keys[perm[j - 1]] > keys[perm[j]] {
            perm.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Stable merge of two already-sorted index runs `left`, `right` into
/// `scratch[..left.len() + right.len()]`.
fn merge<K: Ord + Copy>(left: &[usize], right: &[usize], scratch: &mut [usize], keys: &[K]) {
    let mut i = 0;
    let mut j = 0;
    let mut k = 0;
    while i < left.len() && j < right.len() {
        // `<=` on the left run keeps the merge stable: on a tie the element
        // that came from `left` (earlier in the original order) goes first.
        if keys[left[i]] <= keys[right[j]] {
            scratch[k] = left[i];
            i += 1;
        } else {
            scratch[k] = right[j];
            j += 1;
        }
        k += 1;
    }
    while i < left.len() {
        scratch[k] = left[i];
        i += 1;
        k += 1;
    }
    while j < right.len() {
        scratch[k] = right[j];
        j += 1;
        k += 1;
    }
}

/// Reorders `items` according to `perm`, so that `items[i]` afterwards
/// equals the original `items[perm[i]]`.
pub fn apply_permutation<T: Clone>(items: &[T], perm: &[usize]) -> Vec<T> {
    perm.iter().map(|&i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_ascending() {
        let keys = [5, 3, 1, 4, 2];
        let perm = sort_permutation(&keys, 2);
        let sorted: Vec<i32> = perm.iter().map(|&i| keys[i]).collect();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn stability_preserves_original_order_on_ties() {
        // Pairs of (key, original_index) so we can check tie order.
        let keys = [(1, 0), (0, 1), (1, 2), (0, 3)];
        let perm = sort_permutation(&keys, 1);
        let sorted: Vec<(i32, i32)> = perm.iter().map(|&i| keys[i]).collect();
        assert_eq!(sorted, vec![(0, 1), (0, 3), (1, 0), (1, 2)]);
    }

    #[test]
    fn empty_and_singleton() {
        let keys: [i32; 0] = [];
        assert!(sort_permutation(&keys, 512).is_empty());
        let one = [7];
        assert_eq!(sort_permutation(&one, 512), vec![0]);
    }

    #[test]
    fn threshold_of_one_forces_pure_merge_path() {
        let keys = [9, 8, 7, 6, 5, 4, 3, 2, 1, 0];
        let perm = sort_permutation(&keys, 1);
        let sorted: Vec<i32> = perm.iter().map(|&i| keys[i]).collect();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn apply_permutation_reorders_payload() {
        let items = vec!["c", "a", "b"];
        let perm = sort_permutation(&['c', 'a', 'b'], 512);
        let reordered = apply_permutation(&items, &perm);
        assert_eq!(reordered, vec!["a", "b", "c"]);
    }
}
