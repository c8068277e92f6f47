/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Iterated sparse matrix-vector product (§4.F, §9): `v ← A^n · u` computed
//! one matrix-vector product at a time, with each intermediate iteration
//! exposed to the caller for Taylor/Krylov-style accumulation.

use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Count;
use num_complex::Complex64;
use num_traits::Zero;

use crate::errors::{QswError, ShapeMismatchError, StateMisuseError};
use crate::telemetry::spmv_step_span;
use crate::types::{DistributedCsr, PartitionTable, Rank};

/// Handle owning the extended operand buffer cached across a run of
/// `step` calls, so the caller is not forced through a single hidden
/// process-wide state machine (see the concurrency notes on shared state).
pub struct SpmvSeries {
    local: DistributedCsr,
    u_ext: Option<Vec<Complex64>>,
}

impl SpmvSeries {
    /// Builds a handle bound to `local`'s sparsity pattern and communication
    /// plan. `local` must already be reconciled (`reconcile_communications`).
    pub fn new(local: &DistributedCsr) -> Self {
        Self {
            local: local.clone(),
            u_ext: None,
        }
    }

    /// Computes one matrix-vector product `v_local ← A · u_local`, advancing
    /// the series from `current_it` within `[start_it, max_it]`.
    ///
    /// The extended buffer is (re)allocated on `current_it == start_it` and
    /// released on `current_it == max_it`, matching the original's
    /// "first call allocates, last call frees" lifecycle without relying on
    /// hidden static state.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        u_local: &[Complex64],
        table: &PartitionTable,
        start_it: u64,
        current_it: u64,
        max_it: u64,
        rank: Rank,
        v_local: &mut [Complex64],
        comm: &SimpleCommunicator,
    ) -> Result<(), QswError> {
        if current_it < start_it || current_it > max_it {
            return Err(StateMisuseError::new(start_it, current_it, max_it).into());
        }
        let _span = spmv_step_span(rank, current_it).entered();

        let plan = self.local.plan().ok_or_else(|| {
            ShapeMismatchError::new("reconcile_communications must run before SpmvSeries::step", 1, 0)
        })?;
        let local_rows = self.local.local_row_count();
        if u_local.len() != local_rows || v_local.len() != local_rows {
            return Err(ShapeMismatchError::new(
                "u_local/v_local length must equal local row count",
                local_rows,
                u_local.len().max(v_local.len()),
            )
            .into());
        }
        let ext_len = local_rows + plan.total_received();

        if current_it == start_it || self.u_ext.is_none() {
            self.u_ext = Some(vec![Complex64::zero(); ext_len]);
        }
        let u_ext = self.u_ext.as_mut().expect("just allocated above");
        u_ext[..local_rows].copy_from_slice(u_local);

        let row_lo = self.local.row_lo();
        let send_values: Vec<Complex64> = plan
            .rhs_send_inds
            .iter()
            .map(|&global_row| u_ext[global_row - row_lo])
            .collect();

        let mut rec_values = vec![Complex64::zero(); plan.total_received()];
        {
            let send_counts: Vec<Count> = plan.num_send_inds.iter().map(|&n| n as Count).collect();
            let send_displs: Vec<Count> = plan.send_disps.iter().map(|&d| d as Count).collect();
            let recv_counts: Vec<Count> = plan.num_rec_inds.iter().map(|&n| n as Count).collect();
            let recv_displs: Vec<Count> = plan.rec_disps.iter().map(|&d| d as Count).collect();
            let send_partition = Partition::new(&send_values[..], send_counts, send_displs);
            let mut recv_partition = PartitionMut::new(&mut rec_values[..], recv_counts, recv_displs);
            comm.all_to_all_varcount_into(&send_partition, &mut recv_partition);
        }
        u_ext[local_rows..].copy_from_slice(&rec_values);

        for v in v_local.iter_mut() {
            *v = Complex64::zero();
        }
        let row_starts = self.local.row_starts();
        let col_indices = plan.local_col_inds.as_slice();
        let values = self.local.values();
        for row in 0..local_rows {
            let lo = row_starts[row];
            let hi = row_starts[row + 1];
            let mut acc = Complex64::zero();
            for j in lo..hi {
                acc += values[j] * u_ext[col_indices[j]];
            }
            v_local[row] = acc;
        }

        let _ = table;
        if current_it == max_it {
            self.u_ext = None;
        }
        Ok(())
    }

    /// Frees any cached extended buffer. Infallible, callable from any
    /// state; the only operation exempt from the iteration-window check.
    pub fn reset(&mut self) {
        self.u_ext = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{dense_reference_matrix, local_world};

    #[test]
    fn step_rejects_iteration_outside_window() {
        let table = PartitionTable::generate(2, 1);
        let local = DistributedCsr::from_local_triplets(2, 2, "I", &table, 0, &[]).unwrap();
        let mut series = SpmvSeries::new(&local);
        let comm = local_world();
        let u = vec![Complex64::zero(); 2];
        let mut v = vec![Complex64::zero(); 2];
        let err = series
            .step(&u, &table, 5, 2, 10, 0, &mut v, &comm)
            .unwrap_err();
        matches!(err, QswError::StateMisuse(_));
    }

    #[test]
    fn identity_product_at_size_one_is_exact() {
        let table = PartitionTable::generate(3, 1);
        let mut local = DistributedCsr::from_local_triplets(
            3,
            3,
            "I",
            &table,
            0,
            &[
                (0, 0, Complex64::new(1.0, 0.0)),
                (1, 1, Complex64::new(1.0, 0.0)),
                (2, 2, Complex64::new(1.0, 0.0)),
            ],
        )
        .unwrap();
        crate::sort::sort_csr(&mut local, &crate::config::EngineConfig::default());
        let comm = local_world();
        crate::comm::reconcile_communications(&mut local, &table, &comm).unwrap();

        let mut series = SpmvSeries::new(&local);
        let u: Vec<Complex64> = [1.0, 2.0, 3.0].iter().map(|&re| Complex64::new(re, 0.0)).collect();
        let mut v = vec![Complex64::zero(); 3];
        series.step(&u, &table, 1, 1, 1, 0, &mut v, &comm).unwrap();
        assert_eq!(v, u);

        let dense = dense_reference_matrix(&local, &table, 0, &comm);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(dense.get(i, j).re, expected);
            }
        }
    }
}
