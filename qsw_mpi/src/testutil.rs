/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Test-only support (§10): a lazily initialized size-1 communicator for
//! `cargo test` (no `mpirun` involved), a deterministic RNG for building
//! random test matrices, and a dense reference multiplier used to check
//! distributed products against a serial computation.

use std::sync::OnceLock;

use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Universe;
use num_complex::Complex64;

use crate::types::{DenseMatrix, DistributedCsr, PartitionTable, Rank};

static UNIVERSE: OnceLock<Universe> = OnceLock::new();

/// Returns the process-wide MPI world, initializing it on first use.
/// `cargo test` runs every test in the same process without `mpirun`, so
/// this always yields a communicator of size 1.
pub fn local_world() -> SimpleCommunicator {
    let universe =
        UNIVERSE.get_or_init(|| mpi::initialize().expect("MPI failed to initialize for tests"));
    universe.world()
}

/// Small deterministic xorshift64* generator, used only to build
/// reproducible random test matrices (not for anything cryptographic).
pub struct XorShiftRng {
    state: u64,
}

impl XorShiftRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed | 1,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn next_complex(&mut self) -> Complex64 {
        Complex64::new(self.next_f64() * 2.0 - 1.0, self.next_f64() * 2.0 - 1.0)
    }
}

/// Builds a random Hermitian sparse matrix of order `n` as `(row, col,
/// value)` triplets: for every row/col pair below the chosen `density`, an
/// off-diagonal entry and its conjugate-transpose counterpart are emitted,
/// and every diagonal entry is forced real.
pub fn build_random_hermitian_triplets(
    n: usize,
    density: f64,
    seed: u64,
) -> Vec<(usize, usize, Complex64)> {
    let mut rng = XorShiftRng::new(seed);
    let mut triplets = Vec::new();
    for i in 0..n {
        triplets.push((i, i, Complex64::new(rng.next_f64() * 2.0 - 1.0, 0.0)));
        for j in (i + 1)..n {
            if rng.next_f64() < density {
                let v = rng.next_complex();
                triplets.push((i, j, v));
                triplets.push((j, i, v.conj()));
            }
        }
    }
    triplets
}

/// Converts a size-1 `DistributedCsr` into a dense reference matrix.
/// Meaningful only at world size 1 (the spec drives its numeric checks this
/// way precisely so they do not need multiple processes).
pub fn dense_reference_matrix(
    local: &DistributedCsr,
    table: &PartitionTable,
    _root: Rank,
    comm: &SimpleCommunicator,
) -> DenseMatrix {
    assert_eq!(comm.size(), 1, "dense_reference_matrix is only meaningful at world size 1");
    assert_eq!(table.size(), 1, "dense_reference_matrix requires a single-rank partition table");
    let rows = local.global_rows();
    let cols = local.global_cols();
    let mut dense = DenseMatrix::zeros(rows, cols);
    for row in 0..local.local_row_count() {
        let lo = local.row_starts()[row];
        let hi = local.row_starts()[row + 1];
        for j in lo..hi {
            dense.set(row, local.col_indices()[j], local.values()[j]);
        }
    }
    dense
}

/// Serial reference `dense * u`.
pub fn dense_matvec(dense: &DenseMatrix, u: &[Complex64]) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); dense.rows()];
    for row in 0..dense.rows() {
        let mut acc = Complex64::new(0.0, 0.0);
        for col in 0..dense.cols() {
            acc += dense.get(row, col) * u[col];
        }
        out[row] = acc;
    }
    out
}

/// Serial reference `dense * b`, `b` row-major with `b.cols()` columns.
pub fn dense_matmul(dense: &DenseMatrix, b: &DenseMatrix) -> DenseMatrix {
    assert_eq!(dense.cols(), b.rows());
    let mut out = DenseMatrix::zeros(dense.rows(), b.cols());
    for row in 0..dense.rows() {
        for col in 0..b.cols() {
            let mut acc = Complex64::new(0.0, 0.0);
            for k in 0..dense.cols() {
                acc += dense.get(row, k) * b.get(k, col);
            }
            out.set(row, col, acc);
        }
    }
    out
}
