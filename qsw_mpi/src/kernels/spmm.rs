/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Distributed sparse-times-dense product (§4.F): `C ← A^n · B` for a dense
//! right-hand side with more than one column, reusing the same extended
//! operand-buffer addressing as the vector series.

use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Count;
use num_complex::Complex64;
use num_traits::Zero;

use crate::errors::{QswError, ShapeMismatchError};
use crate::telemetry::spmm_span;
use crate::types::{DenseMatrix, DistributedCsr, PartitionTable, Rank};

/// Computes `A^n · b_local`, `n >= 1`, reconciling one variable-count
/// all-to-all exchange per column of `B` at each power (§4.F). `local` must
/// already be reconciled and column-sorted.
pub fn spmm(
    local: &DistributedCsr,
    n: u32,
    b_local: &DenseMatrix,
    table: &PartitionTable,
    rank: Rank,
    comm: &SimpleCommunicator,
) -> Result<DenseMatrix, QswError> {
    if n == 0 {
        return Err(ShapeMismatchError::new("spmm power must be at least 1", 1, 0).into());
    }
    let plan = local.plan().ok_or_else(|| {
        ShapeMismatchError::new("reconcile_communications must run before spmm", 1, 0)
    })?;
    let local_rows = local.local_row_count();
    if b_local.rows() != local_rows {
        return Err(ShapeMismatchError::new(
            "b_local row count must equal local row count",
            local_rows,
            b_local.rows(),
        )
        .into());
    }
    let _ = table;

    let b_cols = b_local.cols();
    let ext_rows = local_rows + plan.total_received();
    let mut ext = DenseMatrix::zeros(ext_rows, b_cols);
    for row in 0..local_rows {
        for col in 0..b_cols {
            ext.set(row, col, b_local.get(row, col));
        }
    }

    let row_lo = local.row_lo();
    let row_starts = local.row_starts().to_vec();
    let col_map = plan.local_col_inds.clone();
    let values = local.values().to_vec();

    let mut result = DenseMatrix::zeros(local_rows, b_cols);

    for power in 0..n {
        let _span = spmm_span(rank, power + 1, b_cols).entered();

        for col in 0..b_cols {
            let send_values: Vec<Complex64> = plan
                .rhs_send_inds
                .iter()
                .map(|&global_row| ext.get(global_row - row_lo, col))
                .collect();
            let mut rec_values = vec![Complex64::zero(); plan.total_received()];
            {
                let send_counts: Vec<Count> = plan.num_send_inds.iter().map(|&c| c as Count).collect();
                let send_displs: Vec<Count> = plan.send_disps.iter().map(|&d| d as Count).collect();
                let recv_counts: Vec<Count> = plan.num_rec_inds.iter().map(|&c| c as Count).collect();
                let recv_displs: Vec<Count> = plan.rec_disps.iter().map(|&d| d as Count).collect();
                let send_partition = Partition::new(&send_values[..], send_counts, send_displs);
                let mut recv_partition =
                    PartitionMut::new(&mut rec_values[..], recv_counts, recv_displs);
                comm.all_to_all_varcount_into(&send_partition, &mut recv_partition);
            }
            for (k, v) in rec_values.into_iter().enumerate() {
                ext.set(local_rows + k, col, v);
            }
        }

        for row in 0..local_rows {
            for col in 0..b_cols {
                result.set(row, col, Complex64::zero());
            }
        }
        for row in 0..local_rows {
            let lo = row_starts[row];
            let hi = row_starts[row + 1];
            for j in lo..hi {
                let ext_row = col_map[j];
                let coeff = values[j];
                for col in 0..b_cols {
                    let acc = result.get(row, col) + coeff * ext.get(ext_row, col);
                    result.set(row, col, acc);
                }
            }
        }

        if power + 1 < n {
            for row in 0..local_rows {
                for col in 0..b_cols {
                    ext.set(row, col, result.get(row, col));
                }
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::testutil::local_world;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn diagonal_matrix_power_two_scales_identity_slice() {
        let table = PartitionTable::generate(4, 1);
        let triplets: Vec<_> = (0..4).map(|i| (i, i, c(2.0))).collect();
        let mut local = DistributedCsr::from_local_triplets(4, 4, "D", &table, 0, &triplets).unwrap();
        crate::sort::sort_csr(&mut local, &EngineConfig::default());
        let comm = local_world();
        crate::comm::reconcile_communications(&mut local, &table, &comm).unwrap();

        let mut b_data = vec![Complex64::zero(); 8];
        b_data[2 * 2] = c(1.0); // column 0 is the basis vector e_2.
        let b = DenseMatrix::from_row_major(4, 2, b_data);

        let result = spmm(&local, 2, &b, &table, 0, &comm).unwrap();
        for row in 0..4 {
            assert_eq!(result.get(row, 1), Complex64::zero());
            let expected = if row == 2 { c(4.0) } else { Complex64::zero() };
            assert_eq!(result.get(row, 0), expected);
        }
    }

    #[test]
    fn rejects_zero_power() {
        let table = PartitionTable::generate(1, 1);
        let mut local = DistributedCsr::from_local_triplets(1, 1, "D", &table, 0, &[]).unwrap();
        crate::sort::sort_csr(&mut local, &EngineConfig::default());
        let comm = local_world();
        crate::comm::reconcile_communications(&mut local, &table, &comm).unwrap();
        let b = DenseMatrix::zeros(1, 1);
        assert!(spmm(&local, 0, &b, &table, 0, &comm).is_err());
    }
}
