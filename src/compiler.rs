//! # compiler.rs
//!
//! Compiles a [`Declaration`] into stack programs (reverse polish notation)
//! resolved against a [`Library`], and runs them.
//!
//! Every name is resolved once, at compile time:
//! - constants through [`Library::constant`],
//! - operator nodes through [`Library::resolve`] (operations, then functions),
//! - calls through [`Library::function`].
//!
//! Arity is checked at the same time, so a [`CompiledFunction`] can only fail
//! at call time because of a wrong argument count or a [`DomainError`] raised
//! by a library entry.

use crate::error::{DomainError, Error, Result};
use crate::library::{Library, Operation};
use crate::parser::{Clause, CompareOp, Comparison, Declaration, Expr, Param};
use crate::value::Numeric;
use std::sync::Arc;

/// A single stack instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// Pushes a literal or a resolved constant.
    Push(Numeric),
    /// Pushes the argument at the given index.
    Load(usize),
    /// Pops `argc` values, applies `op` and pushes the result.
    Apply { op: Operation, argc: usize },
}

impl std::fmt::Display for Instr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push(val) => write!(f, "push {}", val),
            Self::Load(index) => write!(f, "load {}", index),
            Self::Apply { op, argc } => write!(f, "apply {}/{}", op.name(), argc),
        }
    }
}

/// A compiled expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    instrs: Vec<Instr>,
}

impl Program {
    /// Returns the instructions in execution order.
    pub fn instructions(&self) -> &[Instr] {
        &self.instrs
    }

    /// Runs the program against `args`.
    pub fn run(&self, args: &[Numeric]) -> Result<Numeric> {
        let mut stack: Vec<Numeric> = Vec::with_capacity(self.instrs.len());
        for instr in &self.instrs {
            match instr {
                Instr::Push(val) => stack.push(*val),
                Instr::Load(index) => {
                    let val = args.get(*index)
                        .ok_or(Error::ArgumentCount { expected: index + 1, found: args.len() })?;
                    stack.push(*val);
                },
                Instr::Apply { op, argc } => {
                    let from = stack.len().checked_sub(*argc)
                        .ok_or_else(|| Error::Arity { name: op.name().to_string(), expected: op.arity(), found: stack.len() })?;
                    let operands = stack.split_off(from);
                    stack.push(Numeric::Complex(op.call(&operands)?));
                },
            }
        }
        stack.pop().ok_or_else(|| Error::syntax("empty program", 0))
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let instrs: Vec<String> = self.instrs.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", instrs.join(", "))
    }
}

/// A compiled guard comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledComparison {
    op: CompareOp,
    left: Program,
    right: Program,
}

impl CompiledComparison {
    /// Evaluates the comparison.
    ///
    /// Ordering comparisons only accept real operands; equality compares both
    /// components.
    pub fn holds(&self, args: &[Numeric]) -> Result<bool> {
        let left = self.left.run(args)?;
        let right = self.right.run(args)?;
        if !self.op.is_ordering() {
            let equal = left.to_complex() == right.to_complex();
            return Ok((self.op == CompareOp::Eq) == equal);
        }

        if !(left.is_real() && right.is_real()) {
            return Err(DomainError::ComplexUnsupported("comparison").into());
        }
        let (l, r) = (left.to_complex().re, right.to_complex().re);
        Ok(match self.op {
            CompareOp::Lt => l < r,
            CompareOp::Le => l <= r,
            CompareOp::Gt => l > r,
            _ => l >= r,
        })
    }
}

/// A compiled clause: its value is used when every comparison holds.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledClause {
    guard: Vec<CompiledComparison>,
    value: Program,
}

impl CompiledClause {
    /// Comparisons that must all hold for the clause to apply.
    pub fn guard(&self) -> &[CompiledComparison] {
        &self.guard
    }

    /// Program evaluated when the guard holds.
    pub fn value(&self) -> &Program {
        &self.value
    }
}

/// The executable body of a function: guarded clauses, tried in order, then
/// the unguarded fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    clauses: Vec<CompiledClause>,
    fallback: Program,
}

impl Body {
    /// Guarded clauses in source order.
    pub fn clauses(&self) -> &[CompiledClause] {
        &self.clauses
    }

    /// Program evaluated when no clause applies.
    pub fn fallback(&self) -> &Program {
        &self.fallback
    }

    /// Evaluates the body; the first clause whose guard holds wins.
    pub fn eval(&self, args: &[Numeric]) -> Result<Numeric> {
        for clause in &self.clauses {
            let mut holds = true;
            for comparison in &clause.guard {
                if !comparison.holds(args)? {
                    holds = false;
                    break;
                }
            }
            if holds {
                return clause.value.run(args);
            }
        }
        self.fallback.run(args)
    }
}

/// Result of [`compile`]: a callable function together with the metadata it
/// was built from.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    name: String,
    ast: Arc<Declaration>,
    param_list: Vec<Param>,
    body: Arc<Body>,
}

impl CompiledFunction {
    /// Name given in the head of the declaration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaration this function was compiled from.
    pub fn ast(&self) -> &Arc<Declaration> {
        &self.ast
    }

    /// Parameters in declaration order.
    pub fn param_list(&self) -> &[Param] {
        &self.param_list
    }

    /// The compiled clauses and fallback.
    pub fn body(&self) -> &Arc<Body> {
        &self.body
    }

    /// Number of arguments the function takes.
    pub fn arity(&self) -> usize {
        self.param_list.len()
    }

    /// Calls the function.
    ///
    /// # Errors
    /// - [`Error::ArgumentCount`] if `args` does not match the parameter list.
    /// - [`Error::Domain`] if a library entry rejects its operands.
    pub fn call(&self, args: &[Numeric]) -> Result<Numeric> {
        if args.len() != self.param_list.len() {
            return Err(Error::ArgumentCount { expected: self.param_list.len(), found: args.len() });
        }
        self.body.eval(args)
    }
}

/// Compiles `decl` against `library`.
///
/// # Errors
/// - [`Error::UnknownIdentifier`] for a constant missing from the library.
/// - [`Error::UnknownOperation`] for an operator or function missing from the library.
/// - [`Error::Arity`] for a call with an unaccepted number of arguments.
pub fn compile(decl: &Declaration, library: &Library) -> Result<CompiledFunction> {
    let clauses = decl.clauses.iter()
        .map(|clause| compile_clause(clause, library))
        .collect::<Result<Vec<_>>>()?;
    let fallback = compile_expr(&decl.body, library)?;

    Ok(CompiledFunction {
        name: decl.name.clone(),
        ast: Arc::new(decl.clone()),
        param_list: decl.params.clone(),
        body: Arc::new(Body { clauses, fallback }),
    })
}

fn compile_clause(clause: &Clause, library: &Library) -> Result<CompiledClause> {
    let guard = clause.guard.iter()
        .map(|c| compile_comparison(c, library))
        .collect::<Result<Vec<_>>>()?;
    Ok(CompiledClause { guard, value: compile_expr(&clause.value, library)? })
}

fn compile_comparison(comparison: &Comparison, library: &Library) -> Result<CompiledComparison> {
    Ok(CompiledComparison {
        op: comparison.op,
        left: compile_expr(&comparison.left, library)?,
        right: compile_expr(&comparison.right, library)?,
    })
}

fn compile_expr(expr: &Expr, library: &Library) -> Result<Program> {
    let mut instrs = Vec::new();
    emit(expr, library, &mut instrs)?;
    Ok(Program { instrs })
}

/// Appends the instructions of `expr`, operands first.
fn emit(expr: &Expr, library: &Library, instrs: &mut Vec<Instr>) -> Result<()> {
    match expr {
        Expr::Number(val) => instrs.push(Instr::Push(Numeric::Real(*val))),
        Expr::Param { index, .. } => instrs.push(Instr::Load(*index)),
        Expr::Constant(name) => {
            let val = library.constant(name)
                .ok_or_else(|| Error::UnknownIdentifier { name: name.clone() })?;
            instrs.push(Instr::Push(Numeric::Complex(val)));
        },
        Expr::Unary { op, expr } => {
            emit(expr, library, instrs)?;
            instrs.push(apply(library.resolve(op), op, 1)?);
        },
        Expr::Binary { op, left, right } => {
            emit(left, library, instrs)?;
            emit(right, library, instrs)?;
            instrs.push(apply(library.resolve(op), op, 2)?);
        },
        Expr::Call { name, args } => {
            for arg in args {
                emit(arg, library, instrs)?;
            }
            instrs.push(apply(library.function(name), name, args.len())?);
        },
    }
    Ok(())
}

fn apply(op: Option<&Operation>, name: &str, argc: usize) -> Result<Instr> {
    let op = op.ok_or_else(|| Error::UnknownOperation { name: name.to_string() })?;
    if !op.arity().accepts(argc) {
        return Err(Error::Arity { name: name.to_string(), expected: op.arity(), found: argc });
    }
    Ok(Instr::Apply { op: op.clone(), argc })
}
