/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Distributed conjugate-transpose (§4.G): routes every local nonzero to the
//! rank that owns its column, then rebuilds row structure on the receiving
//! side. The result is not yet column-sorted — the caller must run
//! `sort_csr` before reconciling or multiplying with it.

use mpi::collective::SystemOperation;
use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Count;
use num_complex::Complex64;

use crate::config::EngineConfig;
use crate::errors::{QswError, UnsquareDaggerError};
use crate::sort::sort_triplets_by_row;
use crate::telemetry::{dagger_span, log_exchange};
use crate::types::{DistributedCsr, PartitionTable};

/// Exclusive prefix sum: `out[i]` is the sum of `counts[..i]`.
fn prefix_sum(counts: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(counts.len());
    let mut acc = 0usize;
    for &n in counts {
        out.push(acc);
        acc += n;
    }
    out
}

/// Computes the distributed conjugate-transpose of `local` under `table`.
/// `local` must be square (`global_rows == global_cols`); non-square input
/// is rejected with `UnsquareDaggerError` before any collective is posted.
pub fn csr_dagger(
    local: &DistributedCsr,
    table: &PartitionTable,
    comm: &SimpleCommunicator,
) -> Result<DistributedCsr, QswError> {
    if local.global_rows() != local.global_cols() {
        return Err(UnsquareDaggerError::new(local.global_rows(), local.global_cols()).into());
    }
    let _span = dagger_span(comm.rank(), local.local_nnz()).entered();

    let size = table.size();
    let row_lo = local.row_lo();
    let local_nnz = local.local_nnz();

    // Step 1-2: expand local rows into (row, column, value) triples and
    // classify by the rank owning `column`.
    let mut send_counts = vec![0usize; size];
    let mut targets = Vec::with_capacity(local_nnz);
    for row in 0..local.local_row_count() {
        let lo = local.row_starts()[row];
        let hi = local.row_starts()[row + 1];
        for j in lo..hi {
            let col = local.col_indices()[j];
            let target = table.owner_of(col);
            send_counts[target as usize] += 1;
            targets.push(target as usize);
        }
    }
    let send_disps = prefix_sum(&send_counts);

    // Step 3: scatter-shuffle triples into outbound buffers, conjugating
    // values, using a per-rank running cursor.
    let mut cursor = send_disps.clone();
    let mut rows_out = vec![0u64; local_nnz];
    let mut cols_out = vec![0u64; local_nnz];
    let mut vals_out = vec![Complex64::new(0.0, 0.0); local_nnz];
    let mut k = 0usize;
    for row in 0..local.local_row_count() {
        let lo = local.row_starts()[row];
        let hi = local.row_starts()[row + 1];
        for j in lo..hi {
            let target = targets[k];
            let slot = cursor[target];
            rows_out[slot] = (row_lo + row) as u64;
            cols_out[slot] = local.col_indices()[j] as u64;
            vals_out[slot] = local.values()[j].conj();
            cursor[target] += 1;
            k += 1;
        }
    }

    // Step 4: exchange counts, then learn the global total via an
    // all_reduce — purely informational here since zero-based local
    // addressing needs no global element offset to index A_T.
    let mut rec_counts = vec![0 as Count; size];
    let send_counts_i: Vec<Count> = send_counts.iter().map(|&c| c as Count).collect();
    comm.all_to_all_into(&send_counts_i[..], &mut rec_counts[..]);
    let rec_counts: Vec<usize> = rec_counts.into_iter().map(|c| c as usize).collect();
    let rec_disps = prefix_sum(&rec_counts);

    let local_total = [local_nnz as u64];
    let mut global_total = [0u64];
    comm.all_reduce_into(&local_total[..], &mut global_total[..], SystemOperation::sum());
    log_exchange("csr_dagger", local_nnz, global_total[0] as usize);

    // Step 5: three parallel variable-count all-to-all exchanges.
    let total_in: usize = rec_counts.iter().sum();
    let mut new_rows = vec![0u64; total_in];
    let mut new_cols = vec![0u64; total_in];
    let mut new_vals = vec![Complex64::new(0.0, 0.0); total_in];
    {
        let send_displs: Vec<Count> = send_disps.iter().map(|&d| d as Count).collect();
        let recv_displs: Vec<Count> = rec_disps.iter().map(|&d| d as Count).collect();
        let recv_counts_i: Vec<Count> = rec_counts.iter().map(|&c| c as Count).collect();

        let cols_partition = Partition::new(&cols_out[..], send_counts_i.clone(), send_displs.clone());
        let mut rows_in_partition =
            PartitionMut::new(&mut new_rows[..], recv_counts_i.clone(), recv_displs.clone());
        comm.all_to_all_varcount_into(&cols_partition, &mut rows_in_partition);

        let rows_partition = Partition::new(&rows_out[..], send_counts_i.clone(), send_displs.clone());
        let mut cols_in_partition =
            PartitionMut::new(&mut new_cols[..], recv_counts_i.clone(), recv_displs.clone());
        comm.all_to_all_varcount_into(&rows_partition, &mut cols_in_partition);

        let vals_partition = Partition::new(&vals_out[..], send_counts_i, send_displs);
        let mut vals_in_partition = PartitionMut::new(&mut new_vals[..], recv_counts_i, recv_displs);
        comm.all_to_all_varcount_into(&vals_partition, &mut vals_in_partition);
    }

    let mut new_rows: Vec<usize> = new_rows.into_iter().map(|v| v as usize).collect();
    let mut new_cols: Vec<usize> = new_cols.into_iter().map(|v| v as usize).collect();

    // Step 6: group each new row's nonzeros together.
    let config = EngineConfig::default();
    sort_triplets_by_row(&mut new_rows, &mut new_cols, &mut new_vals, &config);

    // Step 7: rebuild row_starts by histogram, then prefix-sum.
    let my_rank = comm.rank();
    let out_row_lo = table.lo(my_rank);
    let out_row_hi = table.hi(my_rank);
    let local_rows = out_row_hi - out_row_lo;
    let mut row_starts = vec![0usize; local_rows + 1];
    for &r in &new_rows {
        row_starts[r - out_row_lo + 1] += 1;
    }
    for i in 0..local_rows {
        row_starts[i + 1] += row_starts[i];
    }

    Ok(DistributedCsr::from_raw_parts(
        local.global_rows(),
        local.global_cols(),
        local.tag(),
        out_row_lo,
        out_row_hi,
        row_starts,
        new_cols,
        new_vals,
    ))
}
