/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Distribute / gather primitives (§4.C): moving a whole dense vector, dense
//! matrix, or CSR matrix between a root rank and the row-block slices every
//! rank owns under a `PartitionTable`.

use mpi::datatype::{Partition, PartitionMut};
use mpi::request::scope;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Count;
use num_complex::Complex64;

use crate::errors::{QswError, ShapeMismatchError};
use crate::telemetry::log_point_to_point;
use crate::types::{DenseMatrix, DistributedCsr, GlobalCsr, PartitionTable, Rank};

fn counts_and_displs(table: &PartitionTable, stride: usize) -> (Vec<Count>, Vec<Count>) {
    let size = table.size();
    let counts: Vec<Count> = (0..size as Rank)
        .map(|r| (table.local_row_count(r) * stride) as Count)
        .collect();
    let displs: Vec<Count> = table.as_slice()[..size]
        .iter()
        .map(|&lo| (lo * stride) as Count)
        .collect();
    (counts, displs)
}

/// Distributes a dense vector held on `root` across the row blocks of
/// `table`, via one non-blocking send per non-root rank and a matching
/// blocking receive, ended by a barrier (§4.C).
pub fn distribute_dense_vector(
    vec: Option<&[Complex64]>,
    table: &PartitionTable,
    root: Rank,
    comm: &SimpleCommunicator,
) -> Result<Vec<Complex64>, QswError> {
    let my_rank = comm.rank();
    let local_len = table.local_row_count(my_rank);
    let mut local = vec![Complex64::new(0.0, 0.0); local_len];

    if my_rank == root {
        let full = vec.ok_or_else(|| {
            ShapeMismatchError::new("root must supply data to distribute_dense_vector", 1, 0)
        })?;
        if full.len() != table.rows() {
            return Err(ShapeMismatchError::new(
                "dense vector length must match partition row count",
                table.rows(),
                full.len(),
            )
            .into());
        }
        local.copy_from_slice(&full[table.lo(root)..table.hi(root)]);
        scope(|s| {
            let mut requests = Vec::new();
            for r in 0..table.size() as Rank {
                if r == root {
                    continue;
                }
                let slice = &full[table.lo(r)..table.hi(r)];
                log_point_to_point("distribute_dense_vector", r, slice.len());
                requests.push(comm.process_at_rank(r).immediate_send(s, slice));
            }
            for request in requests {
                request.wait();
            }
        });
    } else {
        comm.process_at_rank(root).receive_into(&mut local[..]);
        log_point_to_point("distribute_dense_vector", root, local.len());
    }
    comm.barrier();
    Ok(local)
}

/// Gathers a dense vector's row blocks back onto `root`, via a
/// variable-count gather keyed on the partition table (§4.C).
pub fn gather_dense_vector(
    slice: &[Complex64],
    table: &PartitionTable,
    root: Rank,
    comm: &SimpleCommunicator,
) -> Result<Option<Vec<Complex64>>, QswError> {
    let my_rank = comm.rank();
    let root_process = comm.process_at_rank(root);
    if my_rank == root {
        let mut full = vec![Complex64::new(0.0, 0.0); table.rows()];
        let (counts, displs) = counts_and_displs(table, 1);
        let mut partition = PartitionMut::new(&mut full[..], counts, displs);
        root_process.gather_varcount_into_root(slice, &mut partition);
        Ok(Some(full))
    } else {
        root_process.gather_varcount_into(slice);
        Ok(None)
    }
}

/// Distributes a dense row-major matrix held on `root` by row block.
pub fn distribute_dense_matrix(
    mat: Option<&DenseMatrix>,
    table: &PartitionTable,
    root: Rank,
    comm: &SimpleCommunicator,
) -> Result<DenseMatrix, QswError> {
    let my_rank = comm.rank();
    let mut cols_buf = [0u64; 1];
    if my_rank == root {
        let m = mat.ok_or_else(|| {
            ShapeMismatchError::new("root must supply data to distribute_dense_matrix", 1, 0)
        })?;
        if m.rows() != table.rows() {
            return Err(ShapeMismatchError::new(
                "dense matrix row count must match partition row count",
                table.rows(),
                m.rows(),
            )
            .into());
        }
        cols_buf[0] = m.cols() as u64;
    }
    comm.process_at_rank(root).broadcast_into(&mut cols_buf);
    let cols = cols_buf[0] as usize;
    let local_rows = table.local_row_count(my_rank);
    let mut local = DenseMatrix::zeros(local_rows, cols);

    if my_rank == root {
        let m = mat.expect("checked above");
        local
            .as_mut_slice()
            .copy_from_slice(&m.as_slice()[table.lo(root) * cols..table.hi(root) * cols]);
        scope(|s| {
            let mut requests = Vec::new();
            for r in 0..table.size() as Rank {
                if r == root {
                    continue;
                }
                let slice = &m.as_slice()[table.lo(r) * cols..table.hi(r) * cols];
                log_point_to_point("distribute_dense_matrix", r, slice.len());
                requests.push(comm.process_at_rank(r).immediate_send(s, slice));
            }
            for request in requests {
                request.wait();
            }
        });
    } else {
        comm.process_at_rank(root)
            .receive_into(local.as_mut_slice());
        log_point_to_point("distribute_dense_matrix", root, local.as_slice().len());
    }
    comm.barrier();
    Ok(local)
}

/// Gathers a dense row-major matrix's row blocks back onto `root`.
pub fn gather_dense_matrix(
    slice: &DenseMatrix,
    table: &PartitionTable,
    root: Rank,
    comm: &SimpleCommunicator,
) -> Result<Option<DenseMatrix>, QswError> {
    let my_rank = comm.rank();
    let root_process = comm.process_at_rank(root);
    let cols = slice.cols();
    if my_rank == root {
        let mut full = DenseMatrix::zeros(table.rows(), cols);
        let (counts, displs) = counts_and_displs(table, cols);
        let mut partition = PartitionMut::new(full.as_mut_slice(), counts, displs);
        root_process.gather_varcount_into_root(slice.as_slice(), &mut partition);
        Ok(Some(full))
    } else {
        root_process.gather_varcount_into(slice.as_slice());
        Ok(None)
    }
}

/// Distributes a whole CSR matrix held on `root` into each rank's row-block
/// slice (§4.C). `row_starts` windows are scattered in their original
/// (root-relative) nnz offsets and then re-based to start at 0 locally;
/// `col_indices`/`values` are scattered as disjoint, variable-length blocks
/// sized from the receiver's own `row_starts` window.
pub fn distribute_csr(
    global: Option<&GlobalCsr>,
    table: &PartitionTable,
    root: Rank,
    comm: &SimpleCommunicator,
) -> Result<DistributedCsr, QswError> {
    let my_rank = comm.rank();
    let root_process = comm.process_at_rank(root);

    let mut shape = [0u64; 2];
    if my_rank == root {
        let g = global.ok_or_else(|| {
            ShapeMismatchError::new("root must supply the global matrix to distribute_csr", 1, 0)
        })?;
        shape = [g.rows() as u64, g.cols() as u64];
    }
    root_process.broadcast_into(&mut shape);
    let (rows, cols) = (shape[0] as usize, shape[1] as usize);

    let local_rows = table.local_row_count(my_rank);
    let mut row_window = vec![0u64; local_rows + 1];
    {
        let row_counts: Vec<Count> = (0..table.size() as Rank)
            .map(|r| (table.local_row_count(r) + 1) as Count)
            .collect();
        let row_displs: Vec<Count> = table.as_slice()[..table.size()]
            .iter()
            .map(|&lo| lo as Count)
            .collect();
        if my_rank == root {
            let g = global.expect("checked above");
            let abs: Vec<u64> = g.row_starts().iter().map(|&v| v as u64).collect();
            let partition = Partition::new(&abs[..], row_counts, row_displs);
            root_process.scatter_varcount_into_root(&partition, &mut row_window[..]);
        } else {
            root_process.scatter_varcount_into(&mut row_window[..]);
        }
    }
    let base = row_window[0];
    let row_starts: Vec<usize> = row_window.iter().map(|&v| (v - base) as usize).collect();
    let local_nnz = row_starts[local_rows];

    let mut col_indices = vec![0u64; local_nnz];
    let mut values = vec![Complex64::new(0.0, 0.0); local_nnz];
    {
        let nnz_counts: Vec<Count> = (0..table.size() as Rank)
            .map(|r| {
                let lo = table.lo(r);
                let hi = table.hi(r);
                if my_rank == root {
                    let g = global.expect("checked above");
                    (g.row_starts()[hi] - g.row_starts()[lo]) as Count
                } else {
                    0
                }
            })
            .collect();
        let nnz_displs: Vec<Count> = if my_rank == root {
            let g = global.expect("checked above");
            (0..table.size() as Rank)
                .map(|r| g.row_starts()[table.lo(r)] as Count)
                .collect()
        } else {
            vec![0; table.size()]
        };

        if my_rank == root {
            let g = global.expect("checked above");
            let cols_u64: Vec<u64> = g.col_indices().iter().map(|&c| c as u64).collect();
            let col_partition = Partition::new(&cols_u64[..], nnz_counts.clone(), nnz_displs.clone());
            root_process.scatter_varcount_into_root(&col_partition, &mut col_indices[..]);
            let val_partition = Partition::new(g.values(), nnz_counts, nnz_displs);
            root_process.scatter_varcount_into_root(&val_partition, &mut values[..]);
        } else {
            root_process.scatter_varcount_into(&mut col_indices[..]);
            root_process.scatter_varcount_into(&mut values[..]);
        }
    }
    comm.barrier();

    let col_indices: Vec<usize> = col_indices.into_iter().map(|c| c as usize).collect();
    let mut local = DistributedCsr::empty_for_rank(rows, cols, "distributed", table, my_rank);
    local.set_row_starts(row_starts);
    local.set_col_indices(col_indices);
    local.set_values(values);
    Ok(local)
}
