/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Sort kernels (§4.D): a per-row `(column, value)` sort used by every
//! distributed CSR before it can be reconciled or multiplied, and a
//! `(column, row, value)` triple sort used only by the dagger to group its
//! redistributed nonzeros by new row.

mod hybrid;

use crate::config::EngineConfig;
use crate::types::DistributedCsr;
use hybrid::{apply_permutation, sort_permutation};
use num_complex::Complex64;

/// Sorts every local row of `matrix` by ascending column index, in place.
/// Must be called once after construction and once after every
/// `csr_dagger` call, before `reconcile_communications` or any product.
pub fn sort_csr(matrix: &mut DistributedCsr, config: &EngineConfig) {
    let local_rows = matrix.local_row_count();
    let row_starts = matrix.row_starts().to_vec();
    let mut new_cols = matrix.col_indices().to_vec();
    let mut new_vals = matrix.values().to_vec();

    for row in 0..local_rows {
        let lo = row_starts[row];
        let hi = row_starts[row + 1];
        if hi - lo < 2 {
            continue;
        }
        let cols = &matrix.col_indices()[lo..hi];
        let perm = sort_permutation(cols, config.sort_merge_threshold);
        let sorted_cols = apply_permutation(cols, &perm);
        let vals = &matrix.values()[lo..hi];
        let sorted_vals = apply_permutation(vals, &perm);
        new_cols[lo..hi].copy_from_slice(&sorted_cols);
        new_vals[lo..hi].copy_from_slice(&sorted_vals);
    }

    matrix.set_col_indices(new_cols);
    matrix.set_values(new_vals);
}

/// Jointly sorts three parallel arrays `(new_row, new_col, value)` by the
/// primary key `new_row`, stably. Used by `csr_dagger` (§4.G step 6) to
/// group each new row's nonzeros together after the cross-rank exchange;
/// columns within a row are not required to be ascending afterwards —
/// `sort_csr` handles that separately once the dagger rebuilds row_starts.
pub fn sort_triplets_by_row(
    new_rows: &mut Vec<usize>,
    new_cols: &mut Vec<usize>,
    values: &mut Vec<Complex64>,
    config: &EngineConfig,
) {
    if new_rows.len() < 2 {
        return;
    }
    let perm = sort_permutation(new_rows, config.sort_merge_threshold);
    *new_rows = apply_permutation(new_rows, &perm);
    *new_cols = apply_permutation(new_cols, &perm);
    *values = apply_permutation(values, &perm);
}
