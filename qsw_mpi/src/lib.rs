/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Distributed-memory complex sparse-matrix engine for quantum-stochastic-
//! walk simulation: row-block partitioning, a communication-plan-backed
//! CSR type, distributed SpMV/SpMM products, and the distributed conjugate-
//! transpose, all built on top of `mpi`.
//!
//! The crate never calls `mpi::initialize`/`finalize` itself; the embedding
//! process owns the `mpi::topology::SimpleCommunicator` it hands to every
//! entry point here.

pub mod config;
pub mod errors;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod telemetry;
pub mod types;

mod comm;
mod dagger;
mod kernels;
mod sort;

pub use comm::{
    distribute_csr, distribute_dense_matrix, distribute_dense_vector, gather_dense_matrix,
    gather_dense_vector, reconcile_communications, reconcile_communications_counts,
    reconcile_communications_finish,
};
pub use config::EngineConfig;
pub use dagger::csr_dagger;
pub use errors::QswError;
pub use kernels::{spmm, SpmvSeries};
pub use sort::sort_csr;
pub use types::{CommPlan, DenseMatrix, DistributedCsr, GlobalCsr, PartitionTable, Rank};

/// Builds the partition table for `rows` global rows spread over `size`
/// ranks (§4.A, §6).
pub fn generate_partition_table(rows: usize, size: usize) -> PartitionTable {
    PartitionTable::generate(rows, size)
}
