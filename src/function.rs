//! # function.rs
//!
//! Builds complex-valued functions from their textual definition.
//!
//! [`Builder`] drives the engine: it scans the source with the library and
//! the [`ImaginaryUnit`] hook, parses it, applies the [`ClausePolicy`],
//! compiles the declaration and wraps the result into a [`ComplexFunction`].
//! The wrapper forces every argument and the result to [`Complex64`] and
//! carries the name, declaration, parameter list and body of the compiled
//! function unchanged.

use crate::compiler::{self, Body, CompiledFunction};
use crate::error::Result;
use crate::lexer::{self, Token, TokenHook, TokenKind};
use crate::library::Library;
use crate::parser::{self, Declaration, Param};
use crate::value::Numeric;
use num_complex::Complex64;
use std::sync::Arc;

/// Tokenizer hook reclassifying the identifier `i` as a constant, so it
/// takes part in implicit multiplication like a number does (`3i`, `ix`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImaginaryUnit;

impl TokenHook for ImaginaryUnit {
    fn patch(&self, token: Token) -> Token {
        if token.is(TokenKind::Identifier, "i") {
            log::trace!("treating 'i' at {} as the imaginary unit", token.start());
            return token.with_kind(TokenKind::Constant);
        }
        token
    }
}

/// What to do with the guarded clauses of a piecewise definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClausePolicy {
    /// Drop every clause; only the unguarded body is compiled.
    #[default]
    Strip,
    /// Compile the clauses and try them before the body.
    Keep,
}

/// Configures and builds a [`ComplexFunction`].
///
/// # Examples
/// ```rust
/// use complexfn::{Builder, ClausePolicy, Library};
///
/// let abs = Builder::new("f(x) = -x if x < 0; x")
///     .with_library(Library::basic())
///     .with_clauses(ClausePolicy::Keep)
///     .build()
///     .unwrap();
/// assert_eq!(abs.call(&[-2.0]).unwrap().re, 2.0);
/// ```
pub struct Builder {
    source: String,
    library: Arc<Library>,
    clauses: ClausePolicy,
    hooks: Vec<Arc<dyn TokenHook + Send + Sync>>,
}

impl Builder {
    /// Creates a builder for `source` using the standard library and
    /// stripping clauses.
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            library: Library::standard(),
            clauses: ClausePolicy::default(),
            hooks: Vec::new(),
        }
    }

    /// Resolves names against `library` instead of the standard one.
    pub fn with_library(mut self, library: impl Into<Arc<Library>>) -> Self {
        self.library = library.into();
        self
    }

    /// Chooses whether guarded clauses are compiled or stripped.
    pub fn with_clauses(mut self, policy: ClausePolicy) -> Self {
        self.clauses = policy;
        self
    }

    /// Adds a tokenizer hook. Hooks run in the order they were added, after
    /// [`ImaginaryUnit`].
    pub fn with_hook(mut self, hook: impl TokenHook + Send + Sync + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Scans, parses and compiles the source.
    ///
    /// # Errors
    /// Any error of the tokenizer, parser or compiler, unchanged. Errors raised
    /// by library entries only surface when the function is called.
    pub fn build(self) -> Result<ComplexFunction> {
        let mut hooks: Vec<&dyn TokenHook> = vec![&ImaginaryUnit];
        hooks.extend(self.hooks.iter().map(|hook| &**hook as &dyn TokenHook));

        let tokens = lexer::scan_with(&self.source, &self.library, &hooks)?;
        let mut decl = parser::parse(&tokens)?;
        let found = decl.clauses.len();
        if self.clauses == ClausePolicy::Strip {
            decl.clauses.clear();
        }
        let compiled = compiler::compile(&decl, &self.library)?;

        log::debug!(
            "built {}({}) with {} of {} clause(s)",
            compiled.name(),
            compiled.param_list().iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", "),
            decl.clauses.len(),
            found,
        );
        Ok(ComplexFunction::from(compiled))
    }
}

type CallFn = dyn Fn(&[Numeric]) -> Result<Complex64> + Send + Sync;

/// A callable complex-valued function with the metadata it was compiled from.
#[derive(Clone)]
pub struct ComplexFunction {
    call: Arc<CallFn>,
    name: String,
    ast: Arc<Declaration>,
    param_list: Vec<Param>,
    body: Arc<Body>,
}

impl ComplexFunction {
    /// Builds a function with the default configuration.
    ///
    /// # Examples
    /// ```rust
    /// use complexfn::ComplexFunction;
    /// use num_complex::Complex64;
    ///
    /// let f = ComplexFunction::new("f(x) = i*x").unwrap();
    /// assert_eq!(f.call(&[2.0]).unwrap(), Complex64::new(0.0, 2.0));
    /// ```
    pub fn new(source: &str) -> Result<Self> {
        Builder::new(source).build()
    }

    /// Calls the function with anything convertible to [`Numeric`].
    pub fn call<A>(&self, args: &[A]) -> Result<Complex64>
    where
        A: Clone + Into<Numeric>,
    {
        let args: Vec<Numeric> = args.iter().cloned().map(Into::into).collect();
        (self.call)(&args)
    }

    /// Calls the function with already converted arguments.
    ///
    /// # Errors
    /// [`Error::ArgumentCount`](crate::Error::ArgumentCount) or a domain error of a library entry.
    pub fn call_numeric(&self, args: &[Numeric]) -> Result<Complex64> {
        (self.call)(args)
    }

    /// Name given in the head of the declaration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaration the function was compiled from.
    pub fn ast(&self) -> &Arc<Declaration> {
        &self.ast
    }

    /// Parameters in declaration order.
    pub fn param_list(&self) -> &[Param] {
        &self.param_list
    }

    /// The compiled body.
    pub fn body(&self) -> &Arc<Body> {
        &self.body
    }

    /// Number of arguments the function takes.
    pub fn arity(&self) -> usize {
        self.param_list.len()
    }
}

impl From<CompiledFunction> for ComplexFunction {
    fn from(compiled: CompiledFunction) -> Self {
        let name = compiled.name().to_string();
        let ast = Arc::clone(compiled.ast());
        let param_list = compiled.param_list().to_vec();
        let body = Arc::clone(compiled.body());

        let call = move |args: &[Numeric]| -> Result<Complex64> {
            let args: Vec<Numeric> = args.iter().map(|arg| Numeric::Complex(arg.to_complex())).collect();
            Ok(compiled.call(&args)?.to_complex())
        };
        Self { call: Arc::new(call), name, ast, param_list, body }
    }
}

impl std::fmt::Debug for ComplexFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<&str> = self.param_list.iter().map(|p| p.name.as_str()).collect();
        f.debug_struct("ComplexFunction")
            .field("name", &self.name)
            .field("params", &params)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for ComplexFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ast)
    }
}


#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::error::{DomainError, Error};

    #[test]
    fn test_clauses_are_stripped_by_default() {
        let f = Builder::new("f(x) = -x if x < 0; x").build().unwrap();
        assert!(f.ast().clauses.is_empty());
        assert!(f.body().clauses().is_empty());
        assert_eq!(f.call(&[-2.0]).unwrap(), Complex64::from(-2.0));
        assert_eq!(f.to_string(), "f(x) = x");
    }

    #[test]
    fn test_keep_clauses() {
        let f = Builder::new("f(x) = -x if x < 0; x")
            .with_clauses(ClausePolicy::Keep)
            .build()
            .unwrap();
        assert_eq!(f.ast().clauses.len(), 1);
        assert_eq!(f.call(&[-2.0]).unwrap(), Complex64::from(2.0));
        assert_eq!(f.call(&[5.0]).unwrap(), Complex64::from(5.0));
        assert_eq!(
            f.call(&[(1.0, 1.0)]).unwrap_err(),
            Error::Domain(DomainError::ComplexUnsupported("comparison")),
        );
    }

    #[test]
    fn test_with_basic_library() {
        let f = Builder::new("f(x) = |x| + x!")
            .with_library(Library::basic())
            .build()
            .unwrap();
        assert_eq!(f.call(&[-3.0]).unwrap_err(), Error::Domain(DomainError::Undefined { name: "fac", value: -3.0 }));
        assert_eq!(f.call(&[3.0]).unwrap(), Complex64::from(9.0));

        // no functions: `sin` is read letter by letter
        assert!(Builder::new("f(x) = sin(x)").with_library(Library::basic()).build().is_err());
    }

    #[test]
    fn test_with_shared_library() {
        let library = Arc::new(Library::extended());
        let f = Builder::new("f() = pi").with_library(Arc::clone(&library)).build().unwrap();
        assert_eq!(f.call::<f64>(&[]).unwrap(), Complex64::from(std::f64::consts::PI));
    }

    #[test]
    fn test_with_hook() {
        let tau = |t: Token| {
            if t.is(TokenKind::Identifier, "t") {
                Token::new(TokenKind::Constant, "pi", t.span().clone())
            } else {
                t
            }
        };
        let f = Builder::new("f(x) = 2t").with_hook(tau).build().unwrap();
        assert_eq!(f.call(&[0.0]).unwrap(), Complex64::from(2.0 * std::f64::consts::PI));
    }

    #[test]
    fn test_hooks_run_after_imaginary_unit() {
        let real_unit = |t: Token| {
            if t.is(TokenKind::Constant, "i") {
                Token::new(TokenKind::Number, "1", t.span().clone())
            } else {
                t
            }
        };
        let f = Builder::new("f(x) = 3i").with_hook(real_unit).build().unwrap();
        assert_eq!(f.call(&[0.0]).unwrap(), Complex64::from(3.0));
    }

    #[test]
    fn test_imaginary_unit_hook() {
        let token = Token::new(TokenKind::Identifier, "i", 0..1);
        assert_eq!(ImaginaryUnit.patch(token).kind(), TokenKind::Constant);
        let token = Token::new(TokenKind::Identifier, "x", 0..1);
        assert_eq!(ImaginaryUnit.patch(token).kind(), TokenKind::Identifier);
        let token = Token::new(TokenKind::Function, "sin", 0..3);
        assert_eq!(ImaginaryUnit.patch(token).kind(), TokenKind::Function);
    }
}
