/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! Structured instrumentation around collectives and kernels.
//!
//! The Fortran source wires ad-hoc timing variables through the iterated
//! product; here that becomes `tracing` spans that any subscriber (console,
//! file, or a distributed trace collector) can consume. None of this is
//! part of the `Result`-typed contract in `errors` — it is diagnostic only.
use tracing::{debug, trace, Span};

/// Opens a span for one reconciliation pass over a given rank's local CSR.
pub fn reconcile_span(rank: i32, local_nnz: usize) -> Span {
    tracing::span!(
        tracing::Level::DEBUG,
        "reconcile_communications",
        rank,
        local_nnz
    )
}

/// Opens a span for one iteration of the SpMV series.
pub fn spmv_step_span(rank: i32, current_it: u64) -> Span {
    tracing::span!(tracing::Level::TRACE, "spmv_step", rank, current_it)
}

/// Opens a span for one SpMM power iteration.
pub fn spmm_span(rank: i32, power: u32, b_cols: usize) -> Span {
    tracing::span!(tracing::Level::DEBUG, "spmm", rank, power, b_cols)
}

/// Opens a span for a full dagger pass.
pub fn dagger_span(rank: i32, local_nnz: usize) -> Span {
    tracing::span!(tracing::Level::DEBUG, "csr_dagger", rank, local_nnz)
}

/// Emits a debug event recording how many elements crossed the wire in an
/// all-to-all-varcount exchange.
pub fn log_exchange(label: &str, sent: usize, received: usize) {
    debug!(label, sent, received, "varcount exchange completed");
}

/// Emits a trace event for a single non-blocking send/receive pairing used
/// by the plain distribute/gather primitives.
pub fn log_point_to_point(label: &str, peer: i32, len: usize) {
    trace!(label, peer, len, "point-to-point transfer");
}
