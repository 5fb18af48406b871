//! Measured arrays: values paired with their variances.

use crate::error::{PropagationError, Result};
use crate::types::{shape_of, DMatrix, Scalar, Shape};

/// A measured quantity: a value array and the variance of each element.
///
/// Both matrices always have the same shape. Variances are expected to be
/// non-negative, but that is the caller's responsibility; operators never
/// check it and simply propagate whatever they are given.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Measured<T: Scalar> {
    value: DMatrix<T>,
    variance: DMatrix<T>,
}

impl<T: Scalar> Measured<T> {
    /// Pairs a value array with its variance array.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the two arrays differ in shape.
    pub fn new(value: DMatrix<T>, variance: DMatrix<T>) -> Result<Self> {
        if shape_of(&value) != shape_of(&variance) {
            return Err(PropagationError::shapes(shape_of(&value), shape_of(&variance)));
        }
        Ok(Self { value, variance })
    }

    /// A single measurement, stored as a 1×1 array that broadcasts against any shape.
    pub fn scalar(value: T, variance: T) -> Self {
        Self {
            value: DMatrix::from_element(1, 1, value),
            variance: DMatrix::from_element(1, 1, variance),
        }
    }

    /// Builds a column vector of measurements from two slices.
    pub fn from_slices(values: &[T], variances: &[T]) -> Result<Self> {
        if values.len() != variances.len() {
            return Err(PropagationError::shapes((values.len(), 1), (variances.len(), 1)));
        }
        Ok(Self {
            value: DMatrix::from_column_slice(values.len(), 1, values),
            variance: DMatrix::from_column_slice(variances.len(), 1, variances),
        })
    }

    /// Pairs a value array with its standard uncertainty (square root of the variance).
    pub fn from_std_dev(value: DMatrix<T>, std_dev: &DMatrix<T>) -> Result<Self> {
        Self::new(value, std_dev.map(|s| s * s))
    }

    /// The value array.
    pub fn value(&self) -> &DMatrix<T> {
        &self.value
    }

    /// The variance array.
    pub fn variance(&self) -> &DMatrix<T> {
        &self.variance
    }

    /// Elementwise standard uncertainty, `sqrt(variance)`.
    pub fn std_dev(&self) -> DMatrix<T> {
        self.variance.map(|v| v.sqrt())
    }

    /// Shape shared by the value and variance arrays.
    pub fn shape(&self) -> Shape {
        shape_of(&self.value)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether the arrays hold no elements.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// True when every variance is non-negative. NaN variances are invalid.
    pub fn has_valid_variance(&self) -> bool {
        self.variance.iter().all(|&v| v >= T::zero())
    }

    /// Splits into `(value, variance)`.
    pub fn into_parts(self) -> (DMatrix<T>, DMatrix<T>) {
        (self.value, self.variance)
    }

    /// Assembles a result whose shapes the caller has already made equal.
    pub(crate) fn from_parts(value: DMatrix<T>, variance: DMatrix<T>) -> Self {
        debug_assert_eq!(shape_of(&value), shape_of(&variance));
        Self { value, variance }
    }

    /// Mutable access to both arrays; the shapes cannot be changed through it.
    pub(crate) fn parts_mut(&mut self) -> (&mut DMatrix<T>, &mut DMatrix<T>) {
        (&mut self.value, &mut self.variance)
    }
}

impl<T: Scalar> From<(T, T)> for Measured<T> {
    fn from((value, variance): (T, T)) -> Self {
        Self::scalar(value, variance)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Measured<T>
where
    T: Scalar + serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Raw<T: Scalar> {
            value: DMatrix<T>,
            variance: DMatrix<T>,
        }

        let raw = Raw::<T>::deserialize(deserializer)?;
        Self::new(raw.value, raw.variance).map_err(serde::de::Error::custom)
    }
}
