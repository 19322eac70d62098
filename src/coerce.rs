//! # coerce.rs
//!
//! Argument coercion combinators used to build every entry of the complex
//! domain library.
//!
//! - [`force_complex`] lifts a function over complex numbers into an
//!   operation body that accepts any [`Numeric`].
//! - [`force_real`] lifts a function over real numbers into an operation body
//!   that rejects any operand carrying an imaginary part.
//!
//! Both are pure; they hold no state besides the wrapped function.

use crate::error::DomainError;
use crate::value::Numeric;
use num_complex::Complex64;

/// Signature shared by every operation body in the library.
pub type OperationFn = dyn Fn(&[Numeric]) -> Result<Complex64, DomainError> + Send + Sync;

/// Wraps a complex function so that all its arguments are converted to
/// [`Complex64`] before it runs.
///
/// The returned closure never fails on its own.
///
/// # Example
/// ```
/// use complexfn::coerce::force_complex;
/// use complexfn::Numeric;
/// use num_complex::Complex64;
///
/// let conj = force_complex(|z: &[Complex64]| z[0].conj());
/// assert_eq!(conj(&[Numeric::from((1.0, 2.0))]), Ok(Complex64::new(1.0, -2.0)));
/// ```
pub fn force_complex<F>(f: F) -> impl Fn(&[Numeric]) -> Result<Complex64, DomainError> + Send + Sync
where
    F: Fn(&[Complex64]) -> Complex64 + Send + Sync,
{
    move |args: &[Numeric]| {
        let args: Vec<Complex64> = args.iter().map(|z| z.to_complex()).collect();
        Ok(f(&args))
    }
}

/// Wraps a real function so that it only ever sees real arguments.
///
/// Every argument is converted to [`Complex64`] first; if any has a nonzero
/// imaginary part the call fails with [`DomainError::ComplexUnsupported`]
/// naming `name`. The real result is returned as a complex value.
///
/// # Example
/// ```
/// use complexfn::coerce::force_real;
/// use complexfn::{DomainError, Numeric};
/// use num_complex::Complex64;
///
/// let floor = force_real("floor", |x: &[f64]| Ok(x[0].floor()));
/// assert_eq!(floor(&[Numeric::Real(2.5)]), Ok(Complex64::new(2.0, 0.0)));
/// assert_eq!(
///     floor(&[Numeric::from((2.5, 1.0))]),
///     Err(DomainError::ComplexUnsupported("floor")),
/// );
/// ```
pub fn force_real<F>(name: &'static str, f: F) -> impl Fn(&[Numeric]) -> Result<Complex64, DomainError> + Send + Sync
where
    F: Fn(&[f64]) -> Result<f64, DomainError> + Send + Sync,
{
    move |args: &[Numeric]| {
        let args = args.iter()
            .map(|z| {
                let z = z.to_complex();
                if z.im != 0.0 {
                    return Err(DomainError::ComplexUnsupported(name));
                }
                Ok(z.re)
            })
            .collect::<Result<Vec<f64>, DomainError>>()?;
        f(&args).map(Complex64::from)
    }
}


#[cfg(test)]
mod force_real_tests {
    use super::*;

    #[test]
    fn test_real_arguments_pass() {
        let rem = force_real("mod", |x: &[f64]| Ok(x[0] % x[1]));
        assert_eq!(rem(&[Numeric::Real(4.0), Numeric::Real(3.0)]), Ok(Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_complex_with_zero_imaginary_part_passes() {
        let rem = force_real("mod", |x: &[f64]| Ok(x[0] % x[1]));
        let result = rem(&[Numeric::from((7.0, 0.0)), Numeric::Real(4.0)]);
        assert_eq!(result, Ok(Complex64::new(3.0, 0.0)));
    }

    #[test]
    fn test_any_complex_argument_fails() {
        let rem = force_real("mod", |x: &[f64]| Ok(x[0] % x[1]));
        assert_eq!(
            rem(&[Numeric::Real(4.0), Numeric::from((3.0, -1.0))]),
            Err(DomainError::ComplexUnsupported("mod")),
        );
    }

    #[test]
    fn test_inner_error_propagates() {
        let fail = force_real("fac", |x: &[f64]| Err(DomainError::Undefined { name: "fac", value: x[0] }));
        assert_eq!(
            fail(&[Numeric::Real(-1.0)]),
            Err(DomainError::Undefined { name: "fac", value: -1.0 }),
        );
    }
}
