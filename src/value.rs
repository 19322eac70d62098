//! # value.rs
//!
//! Value representations used by the engine and the complex domain.
//!
//! The engine evaluates over [`Numeric`], a closed set of inputs (a real
//! scalar or a complex pair). [`Numeric::to_complex`] is the only place a
//! real value is widened to a [`Complex64`]; everything else in the crate goes
//! through it.
//!
//! [`ComplexExt`] adds the handful of operations the complex library needs
//! that `num_complex` does not provide directly.

use num_complex::Complex64;
use num_traits::Zero;

/// A value in the engine's generic numeric domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    /// A real scalar.
    Real(f64),
    /// A complex pair.
    Complex(Complex64),
}

impl Numeric {
    /// Converts the value into its canonical complex representation.
    ///
    /// Idempotent for values that already are complex.
    pub fn to_complex(self) -> Complex64 {
        match self {
            Self::Real(x) => Complex64::from(x),
            Self::Complex(z) => z,
        }
    }

    /// Returns `true` if the value carries no imaginary part.
    pub fn is_real(&self) -> bool {
        match self {
            Self::Real(_) => true,
            Self::Complex(z) => z.im == 0.0,
        }
    }
}

impl From<f64> for Numeric {
    fn from(x: f64) -> Self {
        Self::Real(x)
    }
}

impl From<Complex64> for Numeric {
    fn from(z: Complex64) -> Self {
        Self::Complex(z)
    }
}

impl From<(f64, f64)> for Numeric {
    fn from((re, im): (f64, f64)) -> Self {
        Self::Complex(Complex64::new(re, im))
    }
}

impl std::fmt::Display for Numeric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real(x) => write!(f, "{}", x),
            Self::Complex(z) => write!(f, "{}", z),
        }
    }
}

/// Extra complex operations used by the domain library.
pub trait ComplexExt: Sized {
    /// Rounds both components up to `places` fractional digits.
    fn ceil_to(&self, places: i32) -> Self;

    /// Rounds both components down to `places` fractional digits.
    fn floor_to(&self, places: i32) -> Self;

    /// Rounds both components to `places` fractional digits, halves toward +∞.
    fn round_to(&self, places: i32) -> Self;

    /// Unit-magnitude direction of the value, or zero for zero.
    fn sign(&self) -> Self;

    /// Principal power `self ^ rhs`, exact on the real subset where possible.
    fn pow_principal(&self, rhs: &Self) -> Self;
}

/// Rounds halves toward +inf. `x + 0.5` is never formed, it may not be
/// representable.
fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

fn componentwise(z: &Complex64, places: i32, round: fn(f64) -> f64) -> Complex64 {
    let scale = 10f64.powi(places);
    Complex64::new(round(z.re * scale) / scale, round(z.im * scale) / scale)
}

impl ComplexExt for Complex64 {
    fn ceil_to(&self, places: i32) -> Self { componentwise(self, places, f64::ceil) }
    fn floor_to(&self, places: i32) -> Self { componentwise(self, places, f64::floor) }
    fn round_to(&self, places: i32) -> Self { componentwise(self, places, round_half_up) }

    fn sign(&self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            Complex64::zero()
        } else {
            *self / norm
        }
    }

    fn pow_principal(&self, rhs: &Self) -> Self {
        if rhs.im == 0.0 {
            if self.is_zero() {
                if rhs.re == 0.0 {
                    return Complex64::new(1.0, 0.0);
                }
                if rhs.re > 0.0 {
                    return Complex64::zero();
                }
            }
            if self.im == 0.0 && self.re > 0.0 {
                return Complex64::from(self.re.powf(rhs.re));
            }
            if rhs.re.fract() == 0.0 && rhs.re.abs() <= i32::MAX as f64 {
                return self.powi(rhs.re as i32);
            }
        }
        self.powc(*rhs)
    }
}

#[cfg(test)]
mod numeric_tests {
    use super::*;

    #[test]
    fn test_to_complex_from_real() {
        assert_eq!(Numeric::Real(3.5).to_complex(), Complex64::new(3.5, 0.0));
    }

    #[test]
    fn test_to_complex_is_idempotent() {
        let z = Complex64::new(-1.25, 4.0);
        let once = Numeric::from(z).to_complex();
        let twice = Numeric::from(once).to_complex();
        assert_eq!(once, z);
        assert_eq!(twice, z);
    }

    #[test]
    fn test_from_pair() {
        assert_eq!(Numeric::from((1.0, 2.0)), Numeric::Complex(Complex64::new(1.0, 2.0)));
    }

    #[test]
    fn test_is_real() {
        assert!(Numeric::Real(2.0).is_real());
        assert!(Numeric::from(Complex64::new(2.0, 0.0)).is_real());
        assert!(!Numeric::from(Complex64::new(2.0, 1.0e-300)).is_real());
    }
}
