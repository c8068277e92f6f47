/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
use std::error::Error;
use std::fmt;

/// A collective or point-to-point operation did not complete successfully.
///
/// Raised whenever an `mpi` call returns a non-success status, or when the
/// `mpi` crate itself reports a count mismatch between a posted send and its
/// matching receive. There is no local recovery: once ranks disagree about
/// the shape of a collective, the communication plan is no longer trustworthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(context: impl Into<String>) -> Self {
        Self(context.into())
    }
}

impl Error for TransportError {}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TransportError: {}", self.0)
    }
}

impl From<&str> for TransportError {
    fn from(s: &str) -> Self {
        TransportError(s.to_string())
    }
}
