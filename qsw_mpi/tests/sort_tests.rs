// SPDX-License-Identifier: MIT
// Copyright (c) "2023" . The DeepCausality Authors. All Rights Reserved.

use qsw_mpi::testutil::{build_random_hermitian_triplets, local_world};
use qsw_mpi::{generate_partition_table, sort_csr, reconcile_communications, DistributedCsr, EngineConfig};

#[test]
fn sort_csr_leaves_every_row_strictly_ascending_for_random_matrices() {
    for &n in &[1usize, 2, 10, 97] {
        let triplets = build_random_hermitian_triplets(n, 0.3, n as u64 + 1);
        let table = generate_partition_table(n, 1);
        let mut m = DistributedCsr::from_local_triplets(n, n, "rand", &table, 0, &triplets).unwrap();
        sort_csr(&mut m, &EngineConfig::default());
        assert!(m.check_sorted().is_ok(), "n={n}");
    }
}

#[test]
fn sort_csr_is_insensitive_to_merge_threshold() {
    let triplets = build_random_hermitian_triplets(50, 0.4, 99);
    let table = generate_partition_table(50, 1);

    let mut via_merge = DistributedCsr::from_local_triplets(50, 50, "t", &table, 0, &triplets).unwrap();
    sort_csr(&mut via_merge, &EngineConfig::default().with_sort_merge_threshold(1));

    let mut via_insertion = DistributedCsr::from_local_triplets(50, 50, "t", &table, 0, &triplets).unwrap();
    sort_csr(&mut via_insertion, &EngineConfig::default().with_sort_merge_threshold(4096));

    assert_eq!(via_merge.col_indices(), via_insertion.col_indices());
    assert_eq!(via_merge.values(), via_insertion.values());
}

#[test]
fn reconciling_at_world_size_one_has_no_remote_references() {
    let triplets = build_random_hermitian_triplets(20, 0.5, 5);
    let table = generate_partition_table(20, 1);
    let mut m = DistributedCsr::from_local_triplets(20, 20, "rand", &table, 0, &triplets).unwrap();
    sort_csr(&mut m, &EngineConfig::default());

    let comm = local_world();
    reconcile_communications(&mut m, &table, &comm).unwrap();
    let plan = m.plan().unwrap();
    assert_eq!(plan.total_received(), 0);
    assert_eq!(plan.total_sent(), 0);
    assert_eq!(m.total_extended_len().unwrap(), m.local_row_count());
}

#[test]
fn reconcile_rejects_unsorted_matrix() {
    let table = generate_partition_table(2, 1);
    let mut m = DistributedCsr::from_local_triplets(
        2,
        2,
        "t",
        &table,
        0,
        &[(0, 0, num_complex::Complex64::new(1.0, 0.0)), (0, 1, num_complex::Complex64::new(2.0, 0.0))],
    )
    .unwrap();
    m.col_indices_mut().swap(0, 1);
    let comm = local_world();
    assert!(reconcile_communications(&mut m, &table, &comm).is_err());
}
