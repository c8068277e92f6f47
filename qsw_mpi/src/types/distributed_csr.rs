/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! The per-rank slice of a distributed sparse matrix, plus its attached
//! communication plan once reconciled.

use crate::errors::{OrderingViolationError, ShapeMismatchError};
use crate::types::partition_table::{PartitionTable, Rank};
use num_complex::Complex64;
use num_traits::Zero;

/// Precomputed send/receive shape for one distributed matrix, attached to a
/// `DistributedCsr` by `reconcile_communications`.
///
/// `local_col_inds` re-bases every column reference to a zero-based address
/// into the *extended* operand buffer: local columns become `col - row_lo`
/// (landing in `[0, local_row_count)`), remote columns become
/// `local_row_count + rec_disps[r] + offset` (landing in
/// `[local_row_count, local_row_count + total_received)`). This is the same
/// addressing the source achieves via non-zero-based array bounds; rebasing
/// by `row_lo` lets the product kernels index a plain zero-based `Vec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommPlan {
    pub num_send_inds: Vec<usize>,
    pub send_disps: Vec<usize>,
    /// Concatenated, per destination rank: the global row indices this rank
    /// must ship the current value of, in the order the peer expects them.
    pub rhs_send_inds: Vec<usize>,
    pub num_rec_inds: Vec<usize>,
    pub rec_disps: Vec<usize>,
    pub local_col_inds: Vec<usize>,
}

impl CommPlan {
    pub fn total_received(&self) -> usize {
        self.num_rec_inds.iter().sum()
    }

    pub fn total_sent(&self) -> usize {
        self.num_send_inds.iter().sum()
    }
}

/// One rank's slice of a distributed sparse matrix.
///
/// `row_starts`/`col_indices`/`values` follow the usual zero-based CSR
/// convention, local to this rank's own arrays (`row_starts[0] == 0`).
/// `col_indices` are *global* column indices; `row_lo`/`row_hi` give the
/// global row range this rank owns.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributedCsr {
    rows: usize,
    cols: usize,
    tag: String,
    row_lo: usize,
    row_hi: usize,
    row_starts: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<Complex64>,
    plan: Option<CommPlan>,
}

impl DistributedCsr {
    /// Builds an empty, correctly shaped local slice for `rank`'s row range
    /// under `table`, with no nonzeros yet. Used by the distribute/gather
    /// primitives as a scatter destination.
    pub fn empty_for_rank(rows: usize, cols: usize, tag: &str, table: &PartitionTable, rank: Rank) -> Self {
        let row_lo = table.lo(rank);
        let row_hi = table.hi(rank);
        Self {
            rows,
            cols,
            tag: tag.to_string(),
            row_lo,
            row_hi,
            row_starts: vec![0; row_hi - row_lo + 1],
            col_indices: Vec::new(),
            values: Vec::new(),
            plan: None,
        }
    }

    /// Builds a rank's local slice directly from `(row, col, value)`
    /// triplets already restricted to this rank's row range; `row` and `col`
    /// are global indices. Duplicate `(row, col)` pairs are summed and
    /// zero sums dropped, mirroring `GlobalCsr::from_triplets`.
    pub fn from_local_triplets(
        rows: usize,
        cols: usize,
        tag: &str,
        table: &PartitionTable,
        rank: Rank,
        triplets: &[(usize, usize, Complex64)],
    ) -> Result<Self, ShapeMismatchError> {
        let row_lo = table.lo(rank);
        let row_hi = table.hi(rank);
        for &(r, c, _) in triplets {
            if !(row_lo..row_hi).contains(&r) {
                return Err(ShapeMismatchError::new(
                    "triplet row outside this rank's partition",
                    row_hi,
                    r,
                ));
            }
            if c >= cols {
                return Err(ShapeMismatchError::new("triplet col out of bounds", cols, c));
            }
        }

        let local_rows = row_hi - row_lo;
        let mut by_row: Vec<Vec<(usize, Complex64)>> = vec![Vec::new(); local_rows];
        for &(r, c, v) in triplets {
            by_row[r - row_lo].push((c, v));
        }

        let mut row_starts = Vec::with_capacity(local_rows + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        row_starts.push(0);
        for mut entries in by_row {
            entries.sort_by_key(|(c, _)| *c);
            let mut merged: Vec<(usize, Complex64)> = Vec::with_capacity(entries.len());
            for (c, v) in entries {
                if let Some(last) = merged.last_mut() {
                    if last.0 == c {
                        last.1 += v;
                        continue;
                    }
                }
                merged.push((c, v));
            }
            for (c, v) in merged {
                if !v.is_zero() {
                    col_indices.push(c);
                    values.push(v);
                }
            }
            row_starts.push(col_indices.len());
        }

        Ok(Self {
            rows,
            cols,
            tag: tag.to_string(),
            row_lo,
            row_hi,
            row_starts,
            col_indices,
            values,
            plan: None,
        })
    }

    /// Builds a rank's local slice directly from already-computed arrays,
    /// without sorting or deduplicating. Used only by `csr_dagger`, whose
    /// output is not column-sorted until the caller runs `sort_csr`.
    pub(crate) fn from_raw_parts(
        rows: usize,
        cols: usize,
        tag: &str,
        row_lo: usize,
        row_hi: usize,
        row_starts: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<Complex64>,
    ) -> Self {
        Self {
            rows,
            cols,
            tag: tag.to_string(),
            row_lo,
            row_hi,
            row_starts,
            col_indices,
            values,
            plan: None,
        }
    }

    pub fn global_rows(&self) -> usize {
        self.rows
    }

    pub fn global_cols(&self) -> usize {
        self.cols
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn row_lo(&self) -> usize {
        self.row_lo
    }

    pub fn row_hi(&self) -> usize {
        self.row_hi
    }

    pub fn local_row_count(&self) -> usize {
        self.row_hi - self.row_lo
    }

    pub fn row_starts(&self) -> &[usize] {
        &self.row_starts
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn col_indices_mut(&mut self) -> &mut [usize] {
        &mut self.col_indices
    }

    pub fn values(&self) -> &[Complex64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [Complex64] {
        &mut self.values
    }

    pub fn local_nnz(&self) -> usize {
        self.values.len()
    }

    pub fn set_row_starts(&mut self, row_starts: Vec<usize>) {
        self.row_starts = row_starts;
    }

    pub fn set_col_indices(&mut self, col_indices: Vec<usize>) {
        self.col_indices = col_indices;
    }

    pub fn set_values(&mut self, values: Vec<Complex64>) {
        self.values = values;
    }

    pub fn plan(&self) -> Option<&CommPlan> {
        self.plan.as_ref()
    }

    pub fn set_plan(&mut self, plan: CommPlan) {
        self.plan = Some(plan);
    }

    pub fn clear_plan(&mut self) {
        self.plan = None;
    }

    /// Size the extended operand buffer must have once reconciled:
    /// owned rows plus every entry this rank will receive from peers.
    pub fn total_extended_len(&self) -> Result<usize, ShapeMismatchError> {
        let plan = self.plan.as_ref().ok_or_else(|| {
            ShapeMismatchError::new("reconcile_communications must run before this call", 1, 0)
        })?;
        Ok(self.local_row_count() + plan.total_received())
    }

    /// Returns `Err(row)` for the first row whose column indices are not
    /// strictly ascending, checked by every product/reconciliation entry
    /// point before it trusts the sparsity structure.
    pub fn check_sorted(&self) -> Result<(), OrderingViolationError> {
        for row in 0..self.local_row_count() {
            let lo = self.row_starts[row];
            let hi = self.row_starts[row + 1];
            for w in self.col_indices[lo..hi].windows(2) {
                if w[0] >= w[1] {
                    return Err(OrderingViolationError::new(row));
                }
            }
        }
        Ok(())
    }
}

impl DistributedCsr {
    /// Distributes `global` (required on `root`, ignored elsewhere) across
    /// the row blocks of `table` (§4.C, §6).
    pub fn distribute(
        global: Option<&crate::types::GlobalCsr>,
        table: &PartitionTable,
        root: Rank,
        comm: &mpi::topology::SimpleCommunicator,
    ) -> Result<Self, crate::errors::QswError> {
        crate::comm::distribute_csr(global, table, root, comm)
    }
}
