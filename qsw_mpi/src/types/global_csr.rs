/*
 * SPDX-License-Identifier: MIT
 * Copyright (c) 2023 - 2026. The DeepCausality Authors and Contributors. All Rights Reserved.
 */
//! A whole, un-partitioned CSR matrix, held only on the root rank as the
//! input to `DistributedCsr::distribute` / output of a gather.

use crate::errors::ShapeMismatchError;
use num_complex::Complex64;
use num_traits::Zero;

/// The complete sparse matrix, zero-based, as it exists only on a root rank
/// before scattering (or after a full gather).
///
/// Mirrors the triplet-construction convention of an ordinary (non-
/// distributed) CSR matrix type: duplicate `(row, col)` triplets are summed,
/// and entries that sum to exactly zero are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalCsr {
    rows: usize,
    cols: usize,
    row_starts: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<Complex64>,
}

impl GlobalCsr {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row_starts(&self) -> &[usize] {
        &self.row_starts
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn values(&self) -> &[Complex64] {
        &self.values
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Builds a matrix from `(row, col, value)` triplets, summing duplicates
    /// and dropping entries that sum to zero.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        triplets: &[(usize, usize, Complex64)],
    ) -> Result<Self, ShapeMismatchError> {
        for &(r, c, _) in triplets {
            if r >= rows {
                return Err(ShapeMismatchError::new("triplet row out of bounds", rows, r));
            }
            if c >= cols {
                return Err(ShapeMismatchError::new("triplet col out of bounds", cols, c));
            }
        }

        let mut by_row: Vec<Vec<(usize, Complex64)>> = vec![Vec::new(); rows];
        for &(r, c, v) in triplets {
            by_row[r].push((c, v));
        }

        let mut row_starts = Vec::with_capacity(rows + 1);
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
            row_starts,
            col_indices,
            values,
        })
    }

    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        let lo = self.row_starts[row];
        let hi = self.row_starts[row + 1];
        self.col_indices[lo..hi]
            .iter()
            .position(|&c| c == col)
            .map(|offset| self.values[lo + offset])
            .unwrap_or_else(Complex64::zero)
    }
}
