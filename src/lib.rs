//! # complexfn
//!
//! `complexfn` turns textual function definitions such as `f(x) = i*x` into
//! callable, **complex-valued** functions.
//!
//! ## Overview
//! - A domain library of operations, functions and constants over
//!   [`num_complex::Complex64`] ([`Library`]).
//! - Coercion combinators bridging real-only and complex operations
//!   ([`coerce::force_complex`], [`coerce::force_real`]).
//! - A small expression engine: tokenizer ([`lexer`]), shunting-yard parser
//!   ([`parser`]) and a compiler to stack programs ([`compiler`]).
//! - [`ComplexFunction`]: the compiled function, wrapped so that every argument
//!   and every result is a [`Complex64`], with its name, declaration, parameter
//!   list and body available for introspection.
//!
//! Internally, the source is tokenized against the library (the identifier
//! `i` being reclassified as the imaginary unit), parsed into a
//! [`parser::Declaration`], compiled into reverse polish programs and wrapped.
//! Every name is resolved at build time; only library entries can fail when
//! the function is called, e.g. `mod` and `fac` on complex operands.
//!
//! ## Example
//! ```rust
//! use complexfn::ComplexFunction;
//! use num_complex::Complex64;
//!
//! let f = ComplexFunction::new("f(x, y) = ix + y^2").unwrap();
//! let z = f.call(&[Complex64::new(1.0, 1.0), Complex64::new(2.0, 0.0)]).unwrap();
//! assert_eq!(z, Complex64::new(3.0, 1.0));
//! ```
//!
//! ## Example: Configuring the build
//! ```rust
//! use complexfn::{Builder, ClausePolicy, LibraryKind};
//!
//! let kind: LibraryKind = "basic".parse().unwrap();
//! let f = Builder::new("f(x) = 0 if x < 0; x!")
//!     .with_library(kind.library())
//!     .with_clauses(ClausePolicy::Keep)
//!     .build()
//!     .unwrap();
//! assert_eq!(f.call(&[4.0]).unwrap().re, 24.0);
//! assert_eq!(f.call(&[-4.0]).unwrap().re, 0.0);
//! ```
//!
//! ## Logging
//! The crate logs through the [`log`] facade (`debug` per built function,
//! `trace` for the tokenizer) and installs no logger itself.
//!
//! ## License
//! Licensed under either **MIT** or **Apache-2.0** at your option.

pub mod coerce;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod library;
pub mod parser;
pub mod value;
mod function;

pub use error::{DomainError, Error, Result};
pub use function::{Builder, ClausePolicy, ComplexFunction, ImaginaryUnit};
pub use library::{Arity, Library, LibraryKind, Operation};
pub use value::{ComplexExt, Numeric};

/// Compiles a function definition with the default configuration.
///
/// Same as [`ComplexFunction::new`]: the standard library is used and the
/// clauses of a piecewise definition are stripped.
///
/// # Example
/// ```rust
/// use num_complex::Complex64;
///
/// let f = complexfn::compile("f() = hypot(3, 4)").unwrap();
/// let z = f.call::<f64>(&[]).unwrap();
/// assert!((z - Complex64::new(5.0, 0.0)).norm() < 1.0e-12);
/// ```
///
/// # Errors
/// Returns the [`Error`] of the tokenizer, parser or compiler.
pub fn compile(source: &str) -> Result<ComplexFunction> {
    ComplexFunction::new(source)
}
