//! Owned row-major matrix used for weights, weight gradients and velocities.
//!
//! Every parameter-shaped buffer of a layer is a `Matrix` with shape
//! `(out_dim, in_dim)`, so weights, gradients and momentum buffers line up
//! element for element.

use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build a matrix from a generator called in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row `r` as a slice of length `cols`.
    ///
    /// Panics if `r >= rows`.
    #[inline]
    pub fn row(&self, r: usize) -> &[f64] {
        assert!(r < self.rows, "row {r} out of bounds for {} rows", self.rows);
        let start = r * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// `out = self * x + bias`.
    pub(crate) fn affine(&self, x: &[f64], bias: &[f64], out: &mut [f64]) {
        debug_assert_eq!(x.len(), self.cols);
        debug_assert_eq!(bias.len(), self.rows);
        debug_assert_eq!(out.len(), self.rows);

        for (r, o) in out.iter_mut().enumerate() {
            let mut sum = bias[r];
            for (&w, &xi) in self.row(r).iter().zip(x) {
                sum = w.mul_add(xi, sum);
            }
            *o = sum;
        }
    }

    /// `out = self^T * v`.
    pub(crate) fn transpose_mul(&self, v: &[f64], out: &mut [f64]) {
        debug_assert_eq!(v.len(), self.rows);
        debug_assert_eq!(out.len(), self.cols);

        out.fill(0.0);
        for (r, &vr) in v.iter().enumerate() {
            for (o, &w) in out.iter_mut().zip(self.row(r)) {
                *o = w.mul_add(vr, *o);
            }
        }
    }

    /// `self += left ⊗ right` (outer product).
    pub(crate) fn add_outer(&mut self, left: &[f64], right: &[f64]) {
        debug_assert_eq!(left.len(), self.rows);
        debug_assert_eq!(right.len(), self.cols);

        for (r, &lr) in left.iter().enumerate() {
            let start = r * self.cols;
            for (g, &rc) in self.data[start..start + self.cols].iter_mut().zip(right) {
                *g = lr.mul_add(rc, *g);
            }
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        assert!(
            r < self.rows && c < self.cols,
            "index ({r}, {c}) out of bounds for ({}, {})",
            self.rows,
            self.cols
        );
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        assert!(
            r < self.rows && c < self.cols,
            "index ({r}, {c}) out of bounds for ({}, {})",
            self.rows,
            self.cols
        );
        &mut self.data[r * self.cols + c]
    }
}
