/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Communication-plan builder (§4.E): turns a sorted `DistributedCsr`'s
//! remote column references into a `CommPlan` — who owes whom which rows,
//! and the zero-based extended-buffer address every nonzero should
//! dereference at product time.

use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Count;

use crate::errors::QswError;
use crate::telemetry::{log_exchange, reconcile_span};
use crate::types::{CommPlan, DistributedCsr, PartitionTable};

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

/// First phase: classifies every non-local column reference by owning rank
/// and produces the receive-side counts, displacements, and remapped column
/// buffer, without yet talking to any peer.
pub fn reconcile_communications_counts(
    local: &DistributedCsr,
    table: &PartitionTable,
) -> (Vec<usize>, Vec<usize>, Vec<usize>, Vec<usize>) {
    let size = table.size();
    let row_lo = local.row_lo();
    let row_hi = local.row_hi();
    let local_row_count = local.local_row_count();

    let mut num_rec_inds = vec![0usize; size];
    for &c in local.col_indices() {
        if c < row_lo || c >= row_hi {
            let owner = table.owner_of(c);
            num_rec_inds[owner as usize] += 1;
        }
    }
    let rec_disps = prefix_sum(&num_rec_inds);

    let mut offset = vec![0usize; size];
    let mut local_col_inds = vec![0usize; local.col_indices().len()];
    let mut rhs_rec_inds = vec![0usize; num_rec_inds.iter().sum()];
    for (k, &c) in local.col_indices().iter().enumerate() {
        if c < row_lo || c >= row_hi {
            let owner = table.owner_of(c) as usize;
            let slot = rec_disps[owner] + offset[owner];
            rhs_rec_inds[slot] = c;
            local_col_inds[k] = local_row_count + slot;
            offset[owner] += 1;
        } else {
            local_col_inds[k] = c - row_lo;
        }
    }

    (num_rec_inds, rec_disps, rhs_rec_inds, local_col_inds)
}

/// Second phase: exchanges the receive-side counts and row-request lists
/// with every peer and assembles the finished `CommPlan`.
pub fn reconcile_communications_finish(
    num_rec_inds: Vec<usize>,
    rec_disps: Vec<usize>,
    rhs_rec_inds: Vec<usize>,
    local_col_inds: Vec<usize>,
    table: &PartitionTable,
    comm: &SimpleCommunicator,
) -> Result<CommPlan, QswError> {
    let size = table.size();

    let mut num_send_inds = vec![0 as Count; size];
    let rec_counts: Vec<Count> = num_rec_inds.iter().map(|&n| n as Count).collect();
    comm.all_to_all_into(&rec_counts[..], &mut num_send_inds[..]);
    let num_send_inds: Vec<usize> = num_send_inds.into_iter().map(|n| n as usize).collect();
    let send_disps = prefix_sum(&num_send_inds);

    let mut rhs_send_inds = vec![0usize; num_send_inds.iter().sum()];
    {
        let send_buf: Vec<u64> = rhs_rec_inds.iter().map(|&v| v as u64).collect();
        let send_counts: Vec<Count> = num_rec_inds.iter().map(|&n| n as Count).collect();
        let send_displs: Vec<Count> = rec_disps.iter().map(|&d| d as Count).collect();
        let recv_counts: Vec<Count> = num_send_inds.iter().map(|&n| n as Count).collect();
        let recv_displs: Vec<Count> = send_disps.iter().map(|&d| d as Count).collect();

        let send_partition = Partition::new(&send_buf[..], send_counts, send_displs);
        let mut recv_buf = vec![0u64; rhs_send_inds.len()];
        let mut recv_partition = PartitionMut::new(&mut recv_buf[..], recv_counts, recv_displs);
        comm.all_to_all_varcount_into(&send_partition, &mut recv_partition);
        rhs_send_inds = recv_buf.into_iter().map(|v| v as usize).collect();
    }

    log_exchange(
        "reconcile_communications",
        num_send_inds.iter().sum(),
        num_rec_inds.iter().sum(),
    );

    Ok(CommPlan {
        num_send_inds,
        send_disps,
        rhs_send_inds,
        num_rec_inds,
        rec_disps,
        local_col_inds,
    })
}

/// Single-pass entry point: runs both phases and attaches the resulting
/// plan to `local`. `local` must already be column-sorted (`sort_csr`).
pub fn reconcile_communications(
    local: &mut DistributedCsr,
    table: &PartitionTable,
    comm: &SimpleCommunicator,
) -> Result<(), QswError> {
    local.check_sorted()?;
    let _span = reconcile_span(comm.rank(), local.local_nnz()).entered();
    let (num_rec_inds, rec_disps, rhs_rec_inds, local_col_inds) =
        reconcile_communications_counts(local, table);
    let plan = reconcile_communications_finish(
        num_rec_inds,
        rec_disps,
        rhs_rec_inds,
        local_col_inds,
        table,
        comm,
    )?;
    local.set_plan(plan);
    Ok(())
}
