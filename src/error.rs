//! # error.rs
//!
//! Error types shared by the tokenizer, parser, compiler and the complex
//! domain library.
//!
//! Two families exist:
//! - [`Error`]: everything that can go wrong while turning source text into a
//!   function (lexing, parsing, name resolution, arity) plus the errors raised
//!   when calling one.
//! - [`DomainError`]: raised by library entries at invocation time, most
//!   notably when a real-only operation receives a complex operand.

use crate::library::Arity;
use thiserror::Error;

/// Convenient alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by library operations when they are applied to values
/// outside of their domain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A real-only operation received an operand with a nonzero imaginary part.
    #[error("complex {0} is unsupported")]
    ComplexUnsupported(&'static str),

    /// A real operation received a real operand it is not defined for.
    #[error("{name} is undefined for {value}")]
    Undefined {
        name: &'static str,
        value: f64,
    },
}

impl DomainError {
    /// Returns the name of the operation that raised the error.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ComplexUnsupported(name) => name,
            Self::Undefined { name, .. } => name,
        }
    }
}

/// Errors raised while building or calling a function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The tokenizer met a character that starts no token.
    #[error("unexpected character '{ch}' at {at}")]
    UnexpectedCharacter {
        ch: char,
        at: usize,
    },

    /// A numeric literal could not be read as a number.
    #[error("invalid number \"{text}\" at {at}")]
    InvalidNumber {
        text: String,
        at: usize,
    },

    /// The token stream does not form a valid declaration.
    #[error("syntax error at {at}: {message}")]
    Syntax {
        message: String,
        at: usize,
    },

    /// An identifier is neither a parameter nor a constant of the library.
    #[error("unknown identifier \"{name}\"")]
    UnknownIdentifier {
        name: String,
    },

    /// An operator or function has no entry in the library.
    #[error("unknown operation \"{name}\"")]
    UnknownOperation {
        name: String,
    },

    /// An operation was applied to the wrong number of operands.
    #[error("{name} takes {expected} argument(s) but {found} were supplied")]
    Arity {
        name: String,
        expected: Arity,
        found: usize,
    },

    /// A compiled function was called with the wrong number of arguments.
    #[error("function expects {expected} argument(s) but {found} were supplied")]
    ArgumentCount {
        expected: usize,
        found: usize,
    },

    /// A library entry rejected its operands.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl Error {
    /// Shorthand for a [`Error::Syntax`] value.
    pub(crate) fn syntax(message: impl Into<String>, at: usize) -> Self {
        Self::Syntax { message: message.into(), at }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_domain_error_message() {
        let err = DomainError::ComplexUnsupported("mod");
        assert_eq!(err.to_string(), "complex mod is unsupported");
        assert_eq!(err.operation(), "mod");

        let err = DomainError::Undefined { name: "fac", value: -1.0 };
        assert_eq!(err.to_string(), "fac is undefined for -1");
        assert_eq!(err.operation(), "fac");
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err: Error = DomainError::ComplexUnsupported("fac").into();
        assert_eq!(err.to_string(), "complex fac is unsupported");
        assert_eq!(err, Error::Domain(DomainError::ComplexUnsupported("fac")));
    }

    #[test]
    fn test_arity_message() {
        let err = Error::Arity { name: "log_".into(), expected: Arity::Range(1, 2), found: 3 };
        assert_eq!(err.to_string(), "log_ takes 1 to 2 argument(s) but 3 were supplied");
    }

    #[test]
    fn test_syntax_shorthand() {
        let err = Error::syntax("unexpected end of input", 7);
        assert_eq!(err.to_string(), "syntax error at 7: unexpected end of input");
    }
}
