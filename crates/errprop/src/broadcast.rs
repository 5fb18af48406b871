//! Broadcasting support for measured operands.
//!
//! This module provides NumPy-style broadcasting for 2-D matrices. Instead of
//! materializing expanded copies, an operand is wrapped in a [`Broadcast`]
//! view that maps output indices back into the original storage.

use crate::error::{PropagationError, Result};
use crate::measured::Measured;
use crate::types::{shape_of, DMatrix, Scalar, Shape};

/// Computes the output shape for broadcasting two shapes.
///
/// # Broadcasting Rules:
/// 1. Two dimensions are compatible if they are equal or one is 1
/// 2. The output shape is the max of each dimension pair
pub fn broadcast_shape(shape_a: Shape, shape_b: Shape) -> Result<Shape> {
    let (rows_a, cols_a) = shape_a;
    let (rows_b, cols_b) = shape_b;

    let incompatible = || PropagationError::shapes(shape_a, shape_b);
    let out_rows = broadcast_dim(rows_a, rows_b).ok_or_else(incompatible)?;
    let out_cols = broadcast_dim(cols_a, cols_b).ok_or_else(incompatible)?;

    Ok((out_rows, out_cols))
}

fn broadcast_dim(a: usize, b: usize) -> Option<usize> {
    if a == b {
        Some(a)
    } else if a == 1 {
        Some(b)
    } else if b == 1 {
        Some(a)
    } else {
        None
    }
}

/// Checks that `source` can be broadcast into `target` without changing `target`.
///
/// This is the rule for in-place operators: the left operand is never resized.
pub fn check_broadcast_into(source: Shape, target: Shape) -> Result<()> {
    let fits = |s: usize, t: usize| s == t || s == 1;
    if fits(source.0, target.0) && fits(source.1, target.1) {
        Ok(())
    } else {
        Err(PropagationError::shapes(target, source))
    }
}

/// Read-only view of a matrix broadcast to a larger shape.
#[derive(Debug, Clone, Copy)]
pub struct Broadcast<'a, T: Scalar> {
    data: &'a DMatrix<T>,
    row_step: usize,
    col_step: usize,
}

impl<'a, T: Scalar> Broadcast<'a, T> {
    /// Wraps `data` so that it can be indexed with any index of `target`.
    pub fn to(data: &'a DMatrix<T>, target: Shape) -> Result<Self> {
        let shape = shape_of(data);
        check_broadcast_into(shape, target)?;
        Ok(Self {
            data,
            row_step: usize::from(shape.0 == target.0),
            col_step: usize::from(shape.1 == target.1),
        })
    }

    /// Element at output position `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[(i * self.row_step, j * self.col_step)]
    }
}

/// Broadcast view of a whole measurement (value and variance together).
#[derive(Debug, Clone, Copy)]
pub struct MeasuredView<'a, T: Scalar> {
    value: Broadcast<'a, T>,
    variance: Broadcast<'a, T>,
}

impl<'a, T: Scalar> MeasuredView<'a, T> {
    /// Wraps `measured` so that it can be indexed with any index of `target`.
    pub fn to(measured: &'a Measured<T>, target: Shape) -> Result<Self> {
        Ok(Self {
            value: Broadcast::to(measured.value(), target)?,
            variance: Broadcast::to(measured.variance(), target)?,
        })
    }

    /// `(value, variance)` at output position `(i, j)`.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> (T, T) {
        (self.value.get(i, j), self.variance.get(i, j))
    }
}
