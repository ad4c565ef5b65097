//! # Numeric Kernel
//!
//! ## Purpose
//! Arithmetic backend of the steady-state solver. Everything above this module is written
//! against the [`NumericKernel`] contract (matrix construction, linear solve, 2-norm,
//! exponential and conversion of `f64` into the working precision) and never against a
//! concrete number type, so switching the precision mode changes accuracy and speed but not
//! the solver logic.
//!
//! ## Backends
//! | Mode | Scalar | Linear solve |
//! |------|--------|--------------|
//! | `double` | `f64` | nalgebra LU |
//! | `double-double` | `twofloat::TwoFloat` (~32 digits) | partial-pivot LU over `DMatrix<TwoFloat>` |
//!
//! The stiffness of surface kinetics (rate constants spread over 10-20 orders of magnitude)
//! puts a floor on the attainable residual in `f64`; the double-double backend lowers that
//! floor by about sixteen orders of magnitude.

use crate::errors::KineticsError;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;
use twofloat::TwoFloat;

/// Scalar type a kernel computes in.
pub trait Real:
    Copy
    + Debug
    + PartialEq
    + PartialOrd
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    fn from_f64(x: f64) -> Self;
    fn to_f64(self) -> f64;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn sqrt(self) -> Self;
    fn abs(self) -> Self;
    /// machine epsilon of the representation
    fn epsilon() -> Self;

    fn zero() -> Self {
        Self::from_f64(0.0)
    }
    fn one() -> Self {
        Self::from_f64(1.0)
    }
    fn powi(self, n: i32) -> Self {
        let mut result = Self::one();
        let mut base = if n < 0 { Self::one() / self } else { self };
        let mut e = n.unsigned_abs();
        while e > 0 {
            if e & 1 == 1 {
                result = result * base;
            }
            base = base * base;
            e >>= 1;
        }
        result
    }
    /// Real power; integral exponents go through `powi` so that negative bases keep working.
    fn powf(self, y: f64) -> Self {
        if y.fract() == 0.0 && y.abs() < i32::MAX as f64 {
            return self.powi(y as i32);
        }
        if self == Self::zero() {
            return Self::zero();
        }
        (self.ln() * Self::from_f64(y)).exp()
    }
    fn max(self, other: Self) -> Self {
        if self >= other { self } else { other }
    }
    fn min(self, other: Self) -> Self {
        if self <= other { self } else { other }
    }
}

impl Real for f64 {
    fn from_f64(x: f64) -> Self {
        x
    }
    fn to_f64(self) -> f64 {
        self
    }
    fn exp(self) -> Self {
        f64::exp(self)
    }
    fn ln(self) -> Self {
        f64::ln(self)
    }
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
    fn abs(self) -> Self {
        f64::abs(self)
    }
    fn epsilon() -> Self {
        f64::EPSILON
    }
    fn powi(self, n: i32) -> Self {
        f64::powi(self, n)
    }
    fn powf(self, y: f64) -> Self {
        f64::powf(self, y)
    }
}

/// unit roundoff of a double-double number
const DOUBLE_DOUBLE_EPSILON: f64 = 4.93038065763132e-32;

impl Real for TwoFloat {
    fn from_f64(x: f64) -> Self {
        TwoFloat::from(x)
    }
    fn to_f64(self) -> f64 {
        self.hi() + self.lo()
    }
    // the inherent math functions of TwoFloat are reached through a reference
    fn exp(self) -> Self {
        (&self).exp()
    }
    fn ln(self) -> Self {
        (&self).ln()
    }
    fn sqrt(self) -> Self {
        (&self).sqrt()
    }
    fn abs(self) -> Self {
        if self < TwoFloat::from(0.0) { -self } else { self }
    }
    fn epsilon() -> Self {
        TwoFloat::from(DOUBLE_DOUBLE_EPSILON)
    }
}

/// Arithmetic precision of the steady-state solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecisionMode {
    Double,
    DoubleDouble,
}

impl FromStr for PrecisionMode {
    type Err = KineticsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "double" | "f64" | "float64" => Ok(PrecisionMode::Double),
            "double-double" | "double_double" | "doubledouble" | "dd" => {
                Ok(PrecisionMode::DoubleDouble)
            }
            other => Err(KineticsError::ConfigurationError(format!(
                "unknown precision mode '{}', expected 'double' or 'double-double'",
                other
            ))),
        }
    }
}

/// Contract between the solvers and the arithmetic library.
pub trait NumericKernel: Send + Sync {
    type Scalar: Real;

    fn mode(&self) -> PrecisionMode;

    /// converts an `f64` into the working precision
    fn mpf(&self, x: f64) -> Self::Scalar {
        Self::Scalar::from_f64(x)
    }

    /// builds a matrix from rows; rows of unequal length are rejected
    fn matrix(&self, rows: &[Vec<Self::Scalar>]) -> Result<DMatrix<Self::Scalar>, KineticsError> {
        let nrows = rows.len();
        let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
        for row in rows {
            if row.len() != ncols {
                return Err(KineticsError::dimension(ncols, row.len(), "matrix row"));
            }
        }
        Ok(DMatrix::from_fn(nrows, ncols, |i, j| rows[i][j]))
    }

    /// solves `a x = b`
    fn solve(
        &self,
        a: &DMatrix<Self::Scalar>,
        b: &DVector<Self::Scalar>,
    ) -> Result<DVector<Self::Scalar>, KineticsError>;

    /// Euclidean norm
    fn norm(&self, v: &[Self::Scalar]) -> Self::Scalar {
        v.iter()
            .fold(Self::Scalar::zero(), |acc, x| acc + *x * *x)
            .sqrt()
    }

    fn exp(&self, x: Self::Scalar) -> Self::Scalar {
        x.exp()
    }

    /// max-row-sum norm, used to estimate the rounding floor of a residual
    fn infinity_norm(&self, a: &DMatrix<Self::Scalar>) -> Self::Scalar {
        let mut largest = Self::Scalar::zero();
        for i in 0..a.nrows() {
            let mut row_sum = Self::Scalar::zero();
            for j in 0..a.ncols() {
                row_sum = row_sum + a[(i, j)].abs();
            }
            largest = largest.max(row_sum);
        }
        largest
    }
}

fn check_square<T: Real>(a: &DMatrix<T>, b: &DVector<T>) -> Result<(), KineticsError> {
    if a.nrows() != a.ncols() {
        return Err(KineticsError::dimension(a.nrows(), a.ncols(), "square matrix"));
    }
    if a.nrows() != b.len() {
        return Err(KineticsError::dimension(a.nrows(), b.len(), "right-hand side"));
    }
    Ok(())
}

/// `f64` arithmetic, nalgebra LU.
#[derive(Debug, Clone, Copy, Default)]
pub struct F64Kernel;

impl NumericKernel for F64Kernel {
    type Scalar = f64;

    fn mode(&self) -> PrecisionMode {
        PrecisionMode::Double
    }

    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, KineticsError> {
        check_square(a, b)?;
        let x = a.clone().lu().solve(b).ok_or_else(|| {
            KineticsError::LinearAlgebraError("singular matrix in LU solve".to_string())
        })?;
        if x.iter().any(|v| !v.is_finite()) {
            return Err(KineticsError::LinearAlgebraError(
                "non-finite solution of linear system".to_string(),
            ));
        }
        Ok(x)
    }
}

/// Double-double arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleDoubleKernel;

impl NumericKernel for DoubleDoubleKernel {
    type Scalar = TwoFloat;

    fn mode(&self) -> PrecisionMode {
        PrecisionMode::DoubleDouble
    }

    fn solve(
        &self,
        a: &DMatrix<TwoFloat>,
        b: &DVector<TwoFloat>,
    ) -> Result<DVector<TwoFloat>, KineticsError> {
        check_square(a, b)?;
        lu_solve(a, b)
    }
}

/// Gaussian elimination with partial pivoting for any [`Real`].
pub fn lu_solve<T: Real>(a: &DMatrix<T>, b: &DVector<T>) -> Result<DVector<T>, KineticsError> {
    let n = a.nrows();
    let mut m = a.clone();
    let mut x = b.clone();
    for k in 0..n {
        let mut pivot_row = k;
        let mut pivot = m[(k, k)].abs();
        for i in (k + 1)..n {
            let candidate = m[(i, k)].abs();
            if candidate > pivot {
                pivot = candidate;
                pivot_row = i;
            }
        }
        if pivot == T::zero() {
            return Err(KineticsError::LinearAlgebraError(format!(
                "singular matrix: zero pivot in column {}",
                k
            )));
        }
        if pivot_row != k {
            m.swap_rows(k, pivot_row);
            x.swap_rows(k, pivot_row);
        }
        for i in (k + 1)..n {
            let factor = m[(i, k)] / m[(k, k)];
            if factor == T::zero() {
                continue;
            }
            for j in k..n {
                m[(i, j)] = m[(i, j)] - factor * m[(k, j)];
            }
            x[i] = x[i] - factor * x[k];
        }
    }
    for k in (0..n).rev() {
        let mut sum = x[k];
        for j in (k + 1)..n {
            sum = sum - m[(k, j)] * x[j];
        }
        x[k] = sum / m[(k, k)];
    }
    Ok(x)
}
