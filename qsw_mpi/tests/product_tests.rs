// SPDX-License-Identifier: MIT
// Copyright (c) "2023" . The DeepCausality Authors. All Rights Reserved.

use num_complex::Complex64;
use qsw_mpi::testutil::{
    build_random_hermitian_triplets, dense_matvec, dense_reference_matrix, local_world,
};
use qsw_mpi::{
    distribute_dense_vector, gather_dense_vector, generate_partition_table,
    reconcile_communications, sort_csr, spmm, DenseMatrix, DistributedCsr, EngineConfig,
    SpmvSeries,
};

fn c(re: f64) -> Complex64 {
    Complex64::new(re, 0.0)
}

#[test]
fn gather_after_distribute_round_trips_a_dense_vector() {
    let table = generate_partition_table(7, 1);
    let comm = local_world();
    let original: Vec<Complex64> = (0..7).map(|i| c(i as f64)).collect();

    let local = distribute_dense_vector(Some(&original), &table, 0, &comm).unwrap();
    let gathered = gather_dense_vector(&local, &table, 0, &comm).unwrap();
    assert_eq!(gathered, Some(original));
}

#[test]
fn identity_spmv_series_one_step_matches_input() {
    let table = generate_partition_table(3, 1);
    let triplets = [(0, 0, c(1.0)), (1, 1, c(1.0)), (2, 2, c(1.0))];
    let mut local = DistributedCsr::from_local_triplets(3, 3, "I", &table, 0, &triplets).unwrap();
    sort_csr(&mut local, &EngineConfig::default());
    let comm = local_world();
    reconcile_communications(&mut local, &table, &comm).unwrap();

    let mut series = SpmvSeries::new(&local);
    let u: Vec<Complex64> = [1.0, 2.0, 3.0].iter().map(|&x| c(x)).collect();
    let mut v = vec![c(0.0); 3];
    series.step(&u, &table, 1, 1, 1, 0, &mut v, &comm).unwrap();
    assert_eq!(v, u);
}

#[test]
fn hermitian_spmv_series_matches_dense_reference_over_twenty_iterations() {
    let n = 25;
    let triplets = build_random_hermitian_triplets(n, 0.2, 4242);
    let table = generate_partition_table(n, 1);
    let mut local = DistributedCsr::from_local_triplets(n, n, "H", &table, 0, &triplets).unwrap();
    sort_csr(&mut local, &EngineConfig::default());
    let comm = local_world();
    reconcile_communications(&mut local, &table, &comm).unwrap();

    let dense = dense_reference_matrix(&local, &table, 0, &comm);
    let mut u: Vec<Complex64> = (0..n).map(|i| c(((i % 5) as f64) - 2.0)).collect();
    let mut reference = u.clone();

    let mut series = SpmvSeries::new(&local);
    let mut v = vec![c(0.0); n];
    for it in 1..=20u64 {
        series.step(&u, &table, 1, it, 20, 0, &mut v, &comm).unwrap();
        reference = dense_matvec(&dense, &reference);
        u.clone_from_slice(&v);
        for (a, b) in u.iter().zip(reference.iter()) {
            assert!((a - b).norm() < 1e-10, "iteration {it}: {a} vs {b}");
        }
    }
    series.reset();
}

#[test]
fn spmm_power_two_on_diagonal_matrix_matches_dense_reference() {
    let table = generate_partition_table(4, 1);
    let triplets: Vec<_> = (0..4).map(|i| (i, i, c(2.0))).collect();
    let mut local = DistributedCsr::from_local_triplets(4, 4, "D", &table, 0, &triplets).unwrap();
    sort_csr(&mut local, &EngineConfig::default());
    let comm = local_world();
    reconcile_communications(&mut local, &table, &comm).unwrap();

    let mut b_data = vec![c(0.0); 8];
    b_data[0] = c(1.0);
    b_data[3] = c(1.0);
    let b = DenseMatrix::from_row_major(4, 2, b_data);

    let result = spmm(&local, 2, &b, &table, 0, &comm).unwrap();
    let dense = dense_reference_matrix(&local, &table, 0, &comm);
    let expected_once = qsw_mpi::testutil::dense_matmul(&dense, &b);
    let expected = qsw_mpi::testutil::dense_matmul(&dense, &expected_once);
    assert_eq!(result.as_slice(), expected.as_slice());
}

#[test]
fn reset_sentinel_allows_reuse_with_a_differently_sized_matrix() {
    let table_a = generate_partition_table(3, 1);
    let mut a = DistributedCsr::from_local_triplets(
        3,
        3,
        "A",
        &table_a,
        0,
        &[(0, 0, c(1.0)), (1, 1, c(1.0)), (2, 2, c(1.0))],
    )
    .unwrap();
    sort_csr(&mut a, &EngineConfig::default());
    let comm = local_world();
    reconcile_communications(&mut a, &table_a, &comm).unwrap();

    let mut series = SpmvSeries::new(&a);
    let u = vec![c(1.0); 3];
    let mut v = vec![c(0.0); 3];
    for it in 1..=10u64 {
        series.step(&u, &table_a, 1, it, 10, 0, &mut v, &comm).unwrap();
    }
    series.reset();

    let table_b = generate_partition_table(5, 1);
    let triplets_b: Vec<_> = (0..5).map(|i| (i, i, c(1.0))).collect();
    let mut b = DistributedCsr::from_local_triplets(5, 5, "B", &table_b, 0, &triplets_b).unwrap();
    sort_csr(&mut b, &EngineConfig::default());
    reconcile_communications(&mut b, &table_b, &comm).unwrap();
    let mut series_b = SpmvSeries::new(&b);
    let u_b = vec![c(2.0); 5];
    let mut v_b = vec![c(0.0); 5];
    series_b.step(&u_b, &table_b, 1, 1, 1, 0, &mut v_b, &comm).unwrap();
    assert_eq!(v_b, u_b);
}
