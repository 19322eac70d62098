//! # library.rs
//!
//! The complex domain library: every operation, function and constant the
//! engine may resolve while compiling an expression over complex numbers.
//!
//! A [`Library`] holds three tables:
//! - `operations`: operator bodies (`add`, `sub`, `mul`, `div`, `pow`, `neg`,
//!   `mod`, `fac`, ...), referenced by the parser's operator nodes.
//! - `functions`: named functions callable as `name(args...)`.
//! - `constants`: named complex values.
//!
//! Every entry is built with the combinators of [`crate::coerce`], so every
//! entry returns a [`Complex64`] or a [`DomainError`].
//!
//! Two shapes are provided. [`Library::extended`] is the canonical one and
//! exposes the full function table. [`Library::basic`] keeps arithmetic,
//! `abs`, `mod` and `fac` as operations and has no functions.

use crate::coerce::{force_complex, force_real, OperationFn};
use crate::error::{DomainError, Error};
use crate::value::{ComplexExt, Numeric};
use num_complex::Complex64;
use num_traits::Zero;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Number of operands an operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` operands.
    Exact(usize),
    /// Between `min` and `max` operands, inclusive.
    Range(usize, usize),
    /// `min` operands or more.
    AtLeast(usize),
}

impl Arity {
    /// Returns `true` if `n` operands are acceptable.
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Self::Exact(m) => n == m,
            Self::Range(min, max) => (min..=max).contains(&n),
            Self::AtLeast(min) => n >= min,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{}", n),
            Self::Range(min, max) => write!(f, "{} to {}", min, max),
            Self::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

/// A named operation or function of the library.
#[derive(Clone)]
pub struct Operation {
    name: &'static str,
    arity: Arity,
    func: Arc<OperationFn>,
}

impl Operation {
    /// Creates an operation from its body.
    ///
    /// Bodies are normally produced by [`force_complex`] or [`force_real`].
    pub fn new<F>(name: &'static str, arity: Arity, func: F) -> Self
    where
        F: Fn(&[Numeric]) -> Result<Complex64, DomainError> + Send + Sync + 'static,
    {
        Self { name, arity, func: Arc::new(func) }
    }

    /// Returns the name the operation is registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the accepted number of operands.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Applies the operation.
    ///
    /// Fails with [`Error::Arity`] if the operand count is not accepted, or
    /// with [`Error::Domain`] if the body rejects its operands.
    pub fn call(&self, args: &[Numeric]) -> Result<Complex64, Error> {
        if !self.arity.accepts(args.len()) {
            return Err(Error::Arity {
                name: self.name.to_string(),
                expected: self.arity,
                found: args.len(),
            });
        }
        Ok((self.func)(args)?)
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        // closures carry no meaningful identity, so compare signatures only
        (self.name == other.name) && (self.arity == other.arity)
    }
}

/// Tables of operations, functions and constants resolved by the engine.
#[derive(Clone, Default)]
pub struct Library {
    operations: HashMap<&'static str, Operation>,
    functions: HashMap<&'static str, Operation>,
    constants: HashMap<&'static str, Complex64>,
}

static STANDARD: Lazy<Arc<Library>> = Lazy::new(|| Arc::new(Library::extended()));

/// Applies `$method` of [`Complex64`] to the single operand.
macro_rules! complex_unary {
    ($name:literal, $method:ident) => {
        Operation::new($name, Arity::Exact(1), force_complex(|z: &[Complex64]| z[0].$method()))
    };
}

fn remainder(x: &[f64]) -> Result<f64, DomainError> {
    Ok(x[0] % x[1])
}

fn factorial(x: &[f64]) -> Result<f64, DomainError> {
    let n = x[0];
    if n < 0.0 || n.fract() != 0.0 {
        return Err(DomainError::Undefined { name: "fac", value: n });
    }
    if n > 170.0 {
        return Ok(f64::INFINITY);
    }
    Ok((2..=(n as u64)).map(|k| k as f64).product())
}

fn extremum(x: &[f64], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    x.iter().fold(init, |acc, &v| {
        if acc.is_nan() || v.is_nan() { f64::NAN } else { pick(acc, v) }
    })
}

/// Arithmetic operations shared by both library shapes.
fn arithmetic() -> Vec<Operation> {
    vec![
        Operation::new("add", Arity::Exact(2), force_complex(|z: &[Complex64]| z[0] + z[1])),
        Operation::new("sub", Arity::Exact(2), force_complex(|z: &[Complex64]| z[0] - z[1])),
        Operation::new("mul", Arity::Exact(2), force_complex(|z: &[Complex64]| z[0] * z[1])),
        Operation::new("div", Arity::Exact(2), force_complex(|z: &[Complex64]| z[0] / z[1])),
        Operation::new("pow", Arity::Exact(2), force_complex(|z: &[Complex64]| z[0].pow_principal(&z[1]))),
        Operation::new("neg", Arity::Exact(1), force_complex(|z: &[Complex64]| -z[0])),
        Operation::new("mod", Arity::Exact(2), force_real("mod", remainder)),
        Operation::new("fac", Arity::Exact(1), force_real("fac", factorial)),
    ]
}

fn absolute() -> Operation {
    Operation::new("abs", Arity::Exact(1), force_complex(|z: &[Complex64]| Complex64::from(z[0].norm())))
}

fn constants() -> [(&'static str, Complex64); 3] {
    [
        ("i", Complex64::i()),
        ("pi", Complex64::from(std::f64::consts::PI)),
        ("e", Complex64::from(std::f64::consts::E)),
    ]
}

impl Library {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared, lazily built extended library.
    pub fn standard() -> Arc<Library> {
        Arc::clone(&STANDARD)
    }

    /// Builds the canonical library with the full function table.
    pub fn extended() -> Self {
        let mut lib = Self::new();
        for op in arithmetic() {
            lib.register_operation(op);
        }

        let functions = vec![
            Operation::new("re", Arity::Exact(1), force_complex(|z: &[Complex64]| Complex64::from(z[0].re))),
            Operation::new("im", Arity::Exact(1), force_complex(|z: &[Complex64]| Complex64::from(z[0].im))),
            absolute(),
            complex_unary!("acos", acos),
            complex_unary!("acosh", acosh),
            complex_unary!("asin", asin),
            complex_unary!("asinh", asinh),
            complex_unary!("atan", atan),
            complex_unary!("atanh", atanh),
            Operation::new("cbrt", Arity::Exact(1),
                force_complex(|z: &[Complex64]| z[0].pow_principal(&Complex64::from(1.0 / 3.0)))),
            Operation::new("ceil", Arity::Exact(1), force_complex(|z: &[Complex64]| z[0].ceil_to(0))),
            complex_unary!("cos", cos),
            complex_unary!("cosh", cosh),
            complex_unary!("exp", exp),
            Operation::new("floor", Arity::Exact(1), force_complex(|z: &[Complex64]| z[0].floor_to(0))),
            Operation::new("hypot", Arity::AtLeast(0),
                force_complex(|z: &[Complex64]| z.iter().fold(Complex64::zero(), |acc, z| acc + z * z).sqrt())),
            Operation::new("log_", Arity::Range(1, 2), force_complex(|z: &[Complex64]| {
                let base = z.get(1).copied().unwrap_or(Complex64::from(10.0));
                z[0].ln() / base.ln()
            })),
            complex_unary!("ln", ln),
            Operation::new("max", Arity::AtLeast(1),
                force_real("max", |x: &[f64]| Ok(extremum(x, f64::NEG_INFINITY, f64::max)))),
            Operation::new("min", Arity::AtLeast(1),
                force_real("min", |x: &[f64]| Ok(extremum(x, f64::INFINITY, f64::min)))),
            Operation::new("pow", Arity::Exact(2), force_complex(|z: &[Complex64]| z[0].pow_principal(&z[1]))),
            Operation::new("random", Arity::Exact(0),
                force_complex(|_: &[Complex64]| Complex64::from(rand::random::<f64>()))),
            Operation::new("round", Arity::Exact(1), force_complex(|z: &[Complex64]| z[0].round_to(0))),
            Operation::new("sign", Arity::Exact(1), force_complex(|z: &[Complex64]| z[0].sign())),
            complex_unary!("sin", sin),
            complex_unary!("sinh", sinh),
            complex_unary!("sqrt", sqrt),
            complex_unary!("tan", tan),
            complex_unary!("tanh", tanh),
        ];
        for func in functions {
            lib.register_function(func);
        }

        for (name, value) in constants() {
            lib.register_constant(name, value);
        }
        lib
    }

    /// Builds the reduced library: arithmetic, `abs`, `mod` and `fac` as
    /// operations, no functions.
    pub fn basic() -> Self {
        let mut lib = Self::new();
        for op in arithmetic() {
            lib.register_operation(op);
        }
        lib.register_operation(absolute());
        for (name, value) in constants() {
            lib.register_constant(name, value);
        }
        lib
    }

    /// Registers an operation, replacing any previous one with the same name.
    pub fn register_operation(&mut self, op: Operation) {
        self.operations.insert(op.name(), op);
    }

    /// Registers a function, replacing any previous one with the same name.
    pub fn register_function(&mut self, func: Operation) {
        self.functions.insert(func.name(), func);
    }

    /// Registers a constant, replacing any previous one with the same name.
    pub fn register_constant(&mut self, name: &'static str, value: Complex64) {
        self.constants.insert(name, value);
    }

    /// Looks up an operation by name.
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    /// Looks up a function by name.
    pub fn function(&self, name: &str) -> Option<&Operation> {
        self.functions.get(name)
    }

    /// Looks up a constant by name.
    pub fn constant(&self, name: &str) -> Option<Complex64> {
        self.constants.get(name).copied()
    }

    /// Looks up an operator body: operations first, then functions.
    pub fn resolve(&self, name: &str) -> Option<&Operation> {
        self.operation(name).or_else(|| self.function(name))
    }

    /// Returns `true` if `name` is a constant of the library.
    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    /// Returns `true` if `name` is a function of the library.
    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Sorted operation names.
    pub fn operation_names(&self) -> Vec<&'static str> {
        sorted(self.operations.keys())
    }

    /// Sorted function names.
    pub fn function_names(&self) -> Vec<&'static str> {
        sorted(self.functions.keys())
    }

    /// Sorted constant names.
    pub fn constant_names(&self) -> Vec<&'static str> {
        sorted(self.constants.keys())
    }

    /// Multi-character function and constant names, i.e. every name a
    /// tokenizer has to recognise as a word.
    pub fn words(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys()
            .chain(self.constants.keys())
            .copied()
            .filter(|name| name.len() > 1)
    }
}

fn sorted<'a>(names: impl Iterator<Item = &'a &'static str>) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = names.copied().collect();
    names.sort_unstable();
    names
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("operations", &self.operation_names())
            .field("functions", &self.function_names())
            .field("constants", &self.constant_names())
            .finish()
    }
}

/// Selects one of the two built-in library shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryKind {
    /// [`Library::extended`].
    #[default]
    Extended,
    /// [`Library::basic`].
    Basic,
}

/// Error type for parsing library kind names.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown library kind \"{0}\"")]
pub struct ParseLibraryKindError(String);

impl LibraryKind {
    /// Builds the library of this kind.
    pub fn library(self) -> Library {
        match self {
            Self::Extended => Library::extended(),
            Self::Basic => Library::basic(),
        }
    }
}

impl std::str::FromStr for LibraryKind {
    type Err = ParseLibraryKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extended" => Ok(Self::Extended),
            "basic" => Ok(Self::Basic),
            _ => Err(ParseLibraryKindError(s.to_string())),
        }
    }
}
