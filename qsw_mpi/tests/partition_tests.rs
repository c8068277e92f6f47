// SPDX-License-Identifier: MIT
// Copyright (c) "2023" . The DeepCausality Authors. All Rights Reserved.

use qsw_mpi::generate_partition_table;

#[test]
fn partition_table_invariants_hold_across_many_shapes() {
    for rows in [0usize, 1, 2, 5, 17, 100, 257] {
        for size in 1..=12usize {
            let table = generate_partition_table(rows, size);
            assert_eq!(table.size(), size);
            assert_eq!(table.rows(), rows);
            assert_eq!(table.as_slice()[0], 0);
            assert_eq!(*table.as_slice().last().unwrap(), rows);

            let diffs: Vec<usize> = table.as_slice().windows(2).map(|w| w[1] - w[0]).collect();
            assert!(diffs.windows(2).all(|w| w[0] <= w[1]) || diffs.is_empty());
            let max = diffs.iter().copied().max().unwrap_or(0);
            let min = diffs.iter().copied().min().unwrap_or(0);
            assert!(max - min <= 1, "rows={rows} size={size} diffs={diffs:?}");

            for row in 0..rows {
                let owner = table.owner_of(row);
                assert!(table.lo(owner) <= row && row < table.hi(owner));
            }
        }
    }
}
