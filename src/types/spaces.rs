//! Vector space markers and typed vectors
//!
//! Thin typed wrappers over `nalgebra` static matrices. State, measurement
//! and innovation vectors live in different spaces and cannot be mixed by
//! accident.

use ::core::marker::PhantomData;
use ::core::ops::{Add, Sub};
use nalgebra::{RealField, SMatrix, SVector, Scalar};

// ============================================================================
// Vector Space Markers
// ============================================================================

/// Marker for kinematic state vectors `[x, dx, y, dy]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpace;

/// Marker for observed positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementSpace;

/// Marker for measurement residuals (observed minus predicted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnovationSpace;

// ============================================================================
// Typed Vector
// ============================================================================

/// A vector parameterized by scalar type, dimension, and space.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T: Scalar, const N: usize, Space> {
    inner: SVector<T, N>,
    _marker: PhantomData<Space>,
}

impl<T: Scalar, const N: usize, Space> Vector<T, N, Space> {
    /// Creates a vector from raw components.
    #[inline]
    pub fn from_array(data: [T; N]) -> Self {
        Self {
            inner: SVector::from(data),
            _marker: PhantomData,
        }
    }

    /// Wraps an nalgebra vector.
    #[inline]
    pub fn from_svector(inner: SVector<T, N>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn as_svector(&self) -> &SVector<T, N> {
        &self.inner
    }

    /// Access element at index.
    ///
    /// # Panics
    /// Panics if index is out of bounds.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn index(&self, index: usize) -> &T {
        &self.inner[index]
    }
}

impl<T: Scalar + Copy, const N: usize, Space: Clone> Copy for Vector<T, N, Space> {}

impl<T: RealField + Copy, const N: usize, Space> Add for Vector<T, N, Space> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::from_svector(self.inner + rhs.inner)
    }
}

impl<T: RealField + Copy, const N: usize, Space> Sub for Vector<T, N, Space> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_svector(self.inner - rhs.inner)
    }
}

// ============================================================================
// Type Aliases
// ============================================================================

/// A state vector in state space.
pub type StateVector<T, const N: usize> = Vector<T, N, StateSpace>;

/// A measurement vector in measurement space.
pub type Measurement<T, const M: usize> = Vector<T, M, MeasurementSpace>;

/// An innovation vector in innovation space.
pub type Innovation<T, const M: usize> = Vector<T, M, InnovationSpace>;

// ============================================================================
// Constant-velocity layout
// ============================================================================

/// Accessors for the 2-D constant-velocity layout `[x, dx, y, dy]`.
///
/// Each axis keeps its position and velocity adjacent so the transition
/// and process noise matrices are block diagonal per axis.
impl<T: RealField + Copy> StateVector<T, 4> {
    /// Builds a state from position and velocity components.
    #[inline]
    pub fn from_kinematics(x: T, dx: T, y: T, dy: T) -> Self {
        Self::from_array([x, dx, y, dy])
    }

    #[inline]
    pub fn x(&self) -> T {
        self.inner[0]
    }

    #[inline]
    pub fn dx(&self) -> T {
        self.inner[1]
    }

    #[inline]
    pub fn y(&self) -> T {
        self.inner[2]
    }

    #[inline]
    pub fn dy(&self) -> T {
        self.inner[3]
    }

    /// Returns `(x, y)`.
    #[inline]
    pub fn position(&self) -> [T; 2] {
        [self.x(), self.y()]
    }

    /// Returns `(dx, dy)`.
    #[inline]
    pub fn velocity(&self) -> [T; 2] {
        [self.dx(), self.dy()]
    }

    /// Returns a copy with the velocity replaced.
    #[inline]
    pub fn with_velocity(&self, dx: T, dy: T) -> Self {
        Self::from_kinematics(self.x(), dx, self.y(), dy)
    }
}

// ============================================================================
// Measurement - Measurement = Innovation
// ============================================================================

/// Computes the residual between an observed and a predicted measurement.
///
/// Subtracting two measurements yields an innovation, not another measurement.
pub trait ComputeInnovation<T: RealField, const M: usize> {
    fn innovation(self, predicted: Measurement<T, M>) -> Innovation<T, M>;
}

impl<T: RealField + Copy, const M: usize> ComputeInnovation<T, M> for Measurement<T, M> {
    #[inline]
    fn innovation(self, predicted: Measurement<T, M>) -> Innovation<T, M> {
        Innovation::from_svector(self.inner - predicted.inner)
    }
}

// ============================================================================
// Covariance Matrix
// ============================================================================

/// A covariance matrix bound to a specific vector space.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance<T: Scalar, const N: usize, Space> {
    inner: SMatrix<T, N, N>,
    _marker: PhantomData<Space>,
}

impl<T: Scalar, const N: usize, Space> Covariance<T, N, Space> {
    /// Wraps a raw matrix.
    ///
    /// The caller should ensure the matrix is symmetric and positive semi-definite.
    #[inline]
    pub fn from_matrix(inner: SMatrix<T, N, N>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn as_matrix(&self) -> &SMatrix<T, N, N> {
        &self.inner
    }
}

impl<T: Scalar + Copy, const N: usize, Space: Clone> Copy for Covariance<T, N, Space> where
    SMatrix<T, N, N>: Copy
{
}

impl<T: RealField + Copy, const N: usize, Space> Covariance<T, N, Space> {
    #[inline]
    pub fn identity() -> Self {
        Self::from_matrix(SMatrix::identity())
    }

    #[inline]
    pub fn from_diagonal(diag: &SVector<T, N>) -> Self {
        Self::from_matrix(SMatrix::from_diagonal(diag))
    }

    /// Sum of variances.
    #[inline]
    pub fn trace(&self) -> T {
        self.inner.trace()
    }

    /// Determinant via Cholesky decomposition, `det = (∏ Lᵢᵢ)²`.
    ///
    /// Returns `None` if the matrix is not positive definite.
    pub fn determinant_cholesky(&self) -> Option<T> {
        let chol = nalgebra::Cholesky::new(self.inner)?;
        let l = chol.l();

        let mut det_l = T::one();
        for i in 0..N {
            det_l *= l[(i, i)];
        }
        Some(det_l * det_l)
    }

    /// Determinant of a covariance. `None` unless positive definite.
    #[inline]
    pub fn determinant(&self) -> Option<T> {
        self.determinant_cholesky()
    }

    /// Returns `None` when the matrix is singular.
    #[inline]
    pub fn try_inverse(&self) -> Option<Self> {
        self.inner.try_inverse().map(Self::from_matrix)
    }

    /// Mahalanobis form `vᵗ·self·v`, with `self` an inverse covariance.
    #[inline]
    pub fn quadratic_form<V>(&self, v: &Vector<T, N, V>) -> T {
        let v = v.as_svector();
        (v.transpose() * self.inner * v)[(0, 0)]
    }
}

impl<T: RealField + Copy, const N: usize, Space> Add for Covariance<T, N, Space> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::from_matrix(self.inner + rhs.inner)
    }
}

/// Covariance matrix in state space.
pub type StateCovariance<T, const N: usize> = Covariance<T, N, StateSpace>;

/// Covariance matrix in measurement space.
///
/// The innovation covariance `S = H·P·Hᵗ + R` is kept in measurement space,
/// as is its inverse.
pub type MeasurementCovariance<T, const M: usize> = Covariance<T, M, MeasurementSpace>;
