/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Communication layer: moving data between a root and the row blocks of a
//! `PartitionTable` (§4.C), and building the per-matrix communication plan
//! that the product kernels depend on (§4.E).

mod primitives;
mod reconcile;

pub use primitives::{
    distribute_csr, distribute_dense_matrix, distribute_dense_vector, gather_dense_matrix,
    gather_dense_vector,
};
pub use reconcile::{
    reconcile_communications, reconcile_communications_counts, reconcile_communications_finish,
};
