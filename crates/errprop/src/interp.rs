//! Piecewise-linear interpolation of tabulated measurements.
//!
//! A [`Table`] holds points `(xp[i], fp[i], var_fp[i])` with `xp`
//! non-decreasing. Interpolating between two neighbouring points with weight
//! `p` gives
//!
//! ```text
//! F    = p·fp[i] + (1-p)·fp[i+1]
//! varF = p²·var_fp[i] + (1-p)²·var_fp[i+1]
//! ```
//!
//! treating the two tabulated measurements as independent.

use crate::error::{PropagationError, Result};
use crate::measured::Measured;
use crate::types::{DMatrix, DVector, Scalar};

/// Tabulated measurements defining a piecewise-linear function with uncertainty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Table<T: Scalar> {
    xp: DVector<T>,
    fp: DVector<T>,
    var_fp: DVector<T>,
}

impl<T: Scalar> Table<T> {
    /// Builds a table from abscissas, values and value variances.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTable` if the three sequences differ in length, hold
    /// fewer than two points, or if `xp` decreases anywhere or holds NaN.
    /// Repeated abscissas are accepted.
    pub fn new(xp: DVector<T>, fp: DVector<T>, var_fp: DVector<T>) -> Result<Self> {
        if xp.len() != fp.len() || xp.len() != var_fp.len() {
            return Err(PropagationError::invalid_table(format!(
                "xp, fp and var_fp must have equal lengths, got {}, {} and {}",
                xp.len(),
                fp.len(),
                var_fp.len()
            )));
        }
        if xp.len() < 2 {
            return Err(PropagationError::invalid_table(format!(
                "at least two points are required, got {}",
                xp.len()
            )));
        }
        if let Some(i) = xp.iter().position(|v| v.is_nan()) {
            return Err(PropagationError::invalid_table(format!(
                "xp must be non-decreasing, but xp[{}] is NaN",
                i
            )));
        }
        if let Some(i) = (1..xp.len()).find(|&i| xp[i] < xp[i - 1]) {
            return Err(PropagationError::invalid_table(format!(
                "xp must be non-decreasing, but xp[{}] = {} < xp[{}] = {}",
                i,
                xp[i],
                i - 1,
                xp[i - 1]
            )));
        }
        Ok(Self { xp, fp, var_fp })
    }

    /// Builds a table from slices.
    pub fn from_slices(xp: &[T], fp: &[T], var_fp: &[T]) -> Result<Self> {
        Self::new(
            DVector::from_column_slice(xp),
            DVector::from_column_slice(fp),
            DVector::from_column_slice(var_fp),
        )
    }

    /// Number of tabulated points.
    pub fn len(&self) -> usize {
        self.xp.len()
    }

    /// Whether the table holds no points; never true once constructed.
    pub fn is_empty(&self) -> bool {
        self.xp.is_empty()
    }

    /// Abscissas.
    pub fn xp(&self) -> &DVector<T> {
        &self.xp
    }

    /// Tabulated values.
    pub fn fp(&self) -> &DVector<T> {
        &self.fp
    }

    /// Tabulated variances.
    pub fn var_fp(&self) -> &DVector<T> {
        &self.var_fp
    }

    /// Index `i` of the interval `[xp[i], xp[i+1]]` used for `x`.
    ///
    /// Counts the interior break points `xp[1..n-1]` that are `<= x`, i.e.
    /// the right-biased insertion point of `x` among them.
    fn interval(&self, x: T) -> usize {
        let n = self.xp.len();
        self.xp.as_slice()[1..n - 1].partition_point(|&v| v <= x)
    }

    fn evaluate(&self, x: T, left: (T, T), right: (T, T)) -> (T, T) {
        let last = self.xp.len() - 1;
        if x < self.xp[0] {
            return left;
        }
        if x > self.xp[last] {
            return right;
        }
        let i = self.interval(x);
        // Repeated abscissas make this 0/0 at the repeated point.
        let p = (self.xp[i + 1] - x) / (self.xp[i + 1] - self.xp[i]);
        let q = T::one() - p;
        let f = p * self.fp[i] + q * self.fp[i + 1];
        let var_f = p * p * self.var_fp[i] + q * q * self.var_fp[i + 1];
        (f, var_f)
    }

    /// Interpolates at every point of `x`; see [`interp`].
    pub fn interp(
        &self,
        x: &DMatrix<T>,
        left: Option<(T, T)>,
        right: Option<(T, T)>,
    ) -> (DMatrix<T>, DMatrix<T>) {
        let last = self.xp.len() - 1;
        let left = left.unwrap_or((self.fp[0], self.var_fp[0]));
        let right = right.unwrap_or((self.fp[last], self.var_fp[last]));

        let mut f = DMatrix::zeros(x.nrows(), x.ncols());
        let mut var_f = DMatrix::zeros(x.nrows(), x.ncols());
        for ((&xi, fi), vi) in x.iter().zip(f.iter_mut()).zip(var_f.iter_mut()) {
            (*fi, *vi) = self.evaluate(xi, left, right);
        }
        (f, var_f)
    }

    /// Interpolates at every point of `x` and returns the result as a [`Measured`].
    pub fn interp_measured(
        &self,
        x: &DMatrix<T>,
        left: Option<(T, T)>,
        right: Option<(T, T)>,
    ) -> Measured<T> {
        let (f, var_f) = self.interp(x, left, right);
        Measured::from_parts(f, var_f)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Table<T>
where
    T: Scalar + serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Raw<T: Scalar> {
            xp: DVector<T>,
            fp: DVector<T>,
            var_fp: DVector<T>,
        }

        let raw = Raw::<T>::deserialize(deserializer)?;
        Self::new(raw.xp, raw.fp, raw.var_fp).map_err(serde::de::Error::custom)
    }
}

/// Linear interpolation of the query points `x` into `table`.
///
/// `left` is the `(value, variance)` returned for queries below `xp[0]`,
/// defaulting to the first tabulated point; `right` likewise for queries
/// above the last abscissa. Returns interpolated values and variances, both
/// shaped like `x`. The result is NaN at a query that falls exactly on a
/// repeated abscissa whose interval has zero width.
pub fn interp<T: Scalar>(
    x: &DMatrix<T>,
    table: &Table<T>,
    left: Option<(T, T)>,
    right: Option<(T, T)>,
) -> (DMatrix<T>, DMatrix<T>) {
    table.interp(x, left, right)
}
