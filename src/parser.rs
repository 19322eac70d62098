//! # parser.rs
//!
//! Turns a token stream into a [`Declaration`]: the function name, its
//! parameter list, the body expression and any guarded clauses.
//!
//! The accepted form is
//!
//! ```text
//! name(p1, p2, ...) = piece; piece; ...
//! piece := expr if guard | expr [otherwise]
//! guard := comparison {and comparison}
//! ```
//!
//! Expressions are parsed with a shunting-yard pass. Operator nodes carry the
//! library names of the operations they stand for (`add`, `neg`, `fac`,
//! `abs`, ...), so the parser never needs to know what those operations do.
//!
//! # Notes
//! - Precedence, lowest first: `+ -`, then `* / % mod` and implicit
//!   multiplication, then unary `-`, then `^` (right associative). Postfix
//!   `!` binds to the value right before it.
//! - A plain identifier may only be implicitly multiplied by a parenthesised
//!   group: `x(x + 1)` is a product, `xy` is an error.
//! - Expression trees deeper than [`MAX_DEPTH`] are rejected with
//!   [`Error::Syntax`], so compiling, printing and dropping a [`Declaration`]
//!   stay within a normal thread stack.

use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Deepest expression tree the parser builds.
pub const MAX_DEPTH: usize = 1024;

/// A parameter of the declared function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Name as written in the head.
    pub name: String,
    /// Position in the argument list.
    pub index: usize,
}

/// Comparison operator of a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Parses a comparison symbol. A lone `=` means `==`.
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "==" | "=" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// Returns the symbol of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Returns `true` for `<`, `<=`, `>` and `>=`.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Self::Eq | Self::Ne)
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single comparison of a guard.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub op: CompareOp,
    pub left: Expr,
    pub right: Expr,
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

/// A piece of a piecewise definition: `value if guard`.
///
/// The guard holds when every comparison holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub guard: Vec<Comparison>,
    pub value: Expr,
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard: Vec<String> = self.guard.iter().map(|c| c.to_string()).collect();
        write!(f, "{} if {}", self.value, guard.join(" and "))
    }
}

/// Expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// Reference to a parameter.
    Param { name: String, index: usize },
    /// Named value, resolved against the library when compiled.
    Constant(String),
    /// Operator applied to one operand (`neg`, `fac`, `abs`).
    Unary { op: &'static str, expr: Box<Expr> },
    /// Operator applied to two operands (`add`, `sub`, `mul`, `div`, `pow`, `mod`).
    Binary { op: &'static str, left: Box<Expr>, right: Box<Expr> },
    /// Function call.
    Call { name: String, args: Vec<Expr> },
}

fn binary_symbol(op: &str) -> &str {
    match op {
        "add" => "+",
        "sub" => "-",
        "mul" => "*",
        "div" => "/",
        "pow" => "^",
        _ => op,
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(val) => write!(f, "{}", val),
            Self::Param { name, .. } => write!(f, "{}", name),
            Self::Constant(name) => write!(f, "{}", name),
            Self::Unary { op: "neg", expr } => write!(f, "(-{})", expr),
            Self::Unary { op: "fac", expr } => write!(f, "({}!)", expr),
            Self::Unary { op: "abs", expr } => write!(f, "|{}|", expr),
            Self::Unary { op, expr } => write!(f, "{}({})", op, expr),
            Self::Binary { op, left, right } => write!(f, "({} {} {})", left, binary_symbol(op), right),
            Self::Call { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", name, args.join(", "))
            },
        }
    }
}

/// A parsed function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Expr,
    pub clauses: Vec<Clause>,
}

impl std::fmt::Display for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        write!(f, "{}({}) = ", self.name, params.join(", "))?;
        for clause in &self.clauses {
            write!(f, "{}; ", clause)?;
        }
        write!(f, "{}", self.body)
    }
}

/// Parses a full function definition.
///
/// # Errors
/// [`Error::Syntax`] when the tokens do not form a declaration, e.g. a
/// missing head, an operator without operands, unbalanced brackets, a
/// duplicate parameter, or a definition with zero or several bodies.
pub fn parse(tokens: &[Token]) -> Result<Declaration> {
    let end = end_of(tokens, 0);
    let (name, params, rest) = parse_head(tokens, end)?;

    let mut body: Option<Expr> = None;
    let mut clauses = Vec::new();
    for piece in rest.split(|t| t.kind() == TokenKind::Semicolon) {
        let Some(first) = piece.first() else {
            continue;
        };
        if let Some(pos) = piece.iter().position(|t| t.is(TokenKind::Keyword, "if")) {
            let value = expression(&piece[..pos], &params, piece[pos].start())?;
            let guard = parse_guard(&piece[(pos + 1)..], &params, end_of(piece, end))?;
            clauses.push(Clause { guard, value });
            continue;
        }

        if body.is_some() {
            return Err(Error::syntax("a definition takes exactly one unguarded body", first.start()));
        }
        let piece = match piece.split_last() {
            Some((last, init)) if last.is(TokenKind::Keyword, "otherwise") => init,
            _ => piece,
        };
        body = Some(expression(piece, &params, end_of(piece, first.start()))?);
    }

    let body = body.ok_or_else(|| Error::syntax("missing unguarded body", end))?;
    Ok(Declaration { name, params, body, clauses })
}

fn end_of(tokens: &[Token], fallback: usize) -> usize {
    tokens.last().map_or(fallback, |t| t.span().end)
}

fn describe(token: Option<&Token>) -> String {
    match token {
        Some(token) => format!("unexpected '{}'", token.text()),
        None => "unexpected end of input".into(),
    }
}

/// Takes the token at `*pos` if it has one of `kinds`.
fn expect<'t>(tokens: &'t [Token], pos: &mut usize, kinds: &[TokenKind], what: &str, end: usize) -> Result<&'t Token> {
    match tokens.get(*pos) {
        Some(token) if kinds.contains(&token.kind()) => {
            *pos += 1;
            Ok(token)
        },
        token => {
            let at = token.map_or(end, |t| t.start());
            Err(Error::syntax(format!("{}, expected {}", describe(token), what), at))
        },
    }
}

/// Parses `name(p, ...) =` and returns the remaining tokens.
fn parse_head(tokens: &[Token], end: usize) -> Result<(String, Vec<Param>, &[Token])> {
    let mut pos = 0;
    let name = expect(tokens, &mut pos, &[TokenKind::Identifier], "a function name", end)?;
    expect(tokens, &mut pos, &[TokenKind::LParen], "'('", end)?;

    let mut params: Vec<Param> = Vec::new();
    if tokens.get(pos).map(|t| t.kind()) == Some(TokenKind::RParen) {
        pos += 1;
    } else {
        loop {
            let param = expect(tokens, &mut pos, &[TokenKind::Identifier], "a parameter name", end)?;
            if params.iter().any(|p| p.name == param.text()) {
                return Err(Error::syntax(format!("duplicate parameter '{}'", param.text()), param.start()));
            }
            params.push(Param { name: param.text().to_string(), index: params.len() });

            let sep = expect(tokens, &mut pos, &[TokenKind::Comma, TokenKind::RParen], "',' or ')'", end)?;
            if sep.kind() == TokenKind::RParen {
                break;
            }
        }
    }
    expect(tokens, &mut pos, &[TokenKind::Equals], "'='", end)?;

    Ok((name.text().to_string(), params, &tokens[pos..]))
}

/// Parses `comparison {and comparison}`; chains expand pairwise.
fn parse_guard(tokens: &[Token], params: &[Param], end: usize) -> Result<Vec<Comparison>> {
    let mut guard = Vec::new();
    for part in tokens.split(|t| t.is(TokenKind::Keyword, "and")) {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        let mut from = 0;
        for (n, token) in part.iter().enumerate() {
            if matches!(token.kind(), TokenKind::Comparison | TokenKind::Equals) {
                let op = CompareOp::from_symbol(token.text())
                    .ok_or_else(|| Error::syntax(describe(Some(token)), token.start()))?;
                operands.push(expression(&part[from..n], params, token.start())?);
                ops.push(op);
                from = n + 1;
            }
        }
        if ops.is_empty() {
            let at = part.first().map_or(end, |t| t.start());
            return Err(Error::syntax("a guard needs a comparison", at));
        }
        operands.push(expression(&part[from..], params, end_of(part, end))?);

        for (n, op) in ops.into_iter().enumerate() {
            guard.push(Comparison { op, left: operands[n].clone(), right: operands[n + 1].clone() });
        }
    }
    Ok(guard)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    /// Start of input, after an operator, `(`, `,` or an opening `|`.
    Operator,
    /// Right after the `(` of a call.
    CallOpen,
    /// After a value that may be implicitly multiplied.
    Value,
    /// After a plain identifier.
    Identifier,
}

impl Last {
    fn is_value(self) -> bool {
        matches!(self, Self::Value | Self::Identifier)
    }
}

#[derive(Debug)]
enum Pending {
    Unary(&'static str),
    Binary(&'static str),
    Group(usize),
    Call { name: String, at: usize, argc: usize },
    Bar(usize),
}

fn precedence(op: &str) -> u8 {
    match op {
        "add" | "sub" => 1,
        "mul" | "div" | "mod" => 2,
        "neg" => 3,
        "pow" => 4,
        _ => 0,
    }
}

/// Shunting-yard state for one expression.
struct ExprParser<'a> {
    params: &'a [Param],
    /// Operands with the depth of their tree.
    output: Vec<(Expr, usize)>,
    pending: Vec<Pending>,
    last: Last,
}

/// Parses a single expression. `end` is reported for errors at the end of
/// `tokens`.
fn expression(tokens: &[Token], params: &[Param], end: usize) -> Result<Expr> {
    let mut parser = ExprParser { params, output: Vec::new(), pending: Vec::new(), last: Last::Operator };
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        let at = token.start();
        match token.kind() {
            TokenKind::Number => {
                parser.begin_value(token)?;
                let val = token.text().parse::<f64>()
                    .map_err(|_| Error::InvalidNumber { text: token.text().to_string(), at })?;
                parser.output.push((Expr::Number(val), 1));
                parser.last = Last::Value;
            },
            TokenKind::Identifier => {
                parser.begin_value(token)?;
                let expr = match parser.params.iter().find(|p| p.name == token.text()) {
                    Some(p) => Expr::Param { name: p.name.clone(), index: p.index },
                    None => Expr::Constant(token.text().to_string()),
                };
                parser.output.push((expr, 1));
                parser.last = Last::Identifier;
            },
            TokenKind::Constant => {
                parser.begin_value(token)?;
                parser.output.push((Expr::Constant(token.text().to_string()), 1));
                parser.last = Last::Value;
            },
            TokenKind::Function => {
                parser.begin_value(token)?;
                match iter.next() {
                    Some(paren) if paren.kind() == TokenKind::LParen => (),
                    other => {
                        let at = other.map_or(end, |t| t.start());
                        return Err(Error::syntax(format!("expected '(' after '{}'", token.text()), at));
                    },
                }
                parser.pending.push(Pending::Call { name: token.text().to_string(), at, argc: 0 });
                parser.last = Last::CallOpen;
            },
            TokenKind::LParen => {
                parser.begin_value(token)?;
                parser.pending.push(Pending::Group(at));
                parser.last = Last::Operator;
            },
            TokenKind::RParen => parser.close_paren(at)?,
            TokenKind::Comma => parser.comma(at)?,
            TokenKind::Bar => {
                if parser.last.is_value() && parser.innermost_is_bar() {
                    parser.close_bar(at)?;
                } else {
                    parser.begin_value(token)?;
                    parser.pending.push(Pending::Bar(at));
                    parser.last = Last::Operator;
                }
            },
            TokenKind::Operator => parser.operator(token)?,
            TokenKind::Keyword if token.text() == "mod" => parser.operator(token)?,
            _ => return Err(Error::syntax(describe(Some(token)), at)),
        }
    }

    parser.finish(end)
}

impl<'a> ExprParser<'a> {
    /// Inserts an implicit multiplication when a value follows a value.
    fn begin_value(&mut self, token: &Token) -> Result<()> {
        match self.last {
            Last::Value => self.push_binary("mul", token.start()),
            Last::Identifier if token.kind() == TokenKind::LParen => self.push_binary("mul", token.start()),
            Last::Identifier => Err(Error::syntax(
                format!("expected an operator before '{}'", token.text()),
                token.start(),
            )),
            Last::Operator | Last::CallOpen => Ok(()),
        }
    }

    fn operator(&mut self, token: &Token) -> Result<()> {
        let at = token.start();
        if token.text() == "!" {
            if !self.last.is_value() {
                return Err(Error::syntax("'!' needs an operand", at));
            }
            self.reduce(Pending::Unary("fac"), at)?;
            self.last = Last::Value;
            return Ok(());
        }

        if !self.last.is_value() {
            match token.text() {
                "-" => self.pending.push(Pending::Unary("neg")),
                "+" => (),
                other => return Err(Error::syntax(format!("'{}' needs a left operand", other), at)),
            }
            self.last = Last::Operator;
            return Ok(());
        }

        let op = match token.text() {
            "+" => "add",
            "-" => "sub",
            "*" => "mul",
            "/" => "div",
            "^" => "pow",
            "%" | "mod" => "mod",
            other => return Err(Error::syntax(format!("unknown operator '{}'", other), at)),
        };
        self.push_binary(op, at)?;
        self.last = Last::Operator;
        Ok(())
    }

    fn push_binary(&mut self, op: &'static str, at: usize) -> Result<()> {
        let prec = precedence(op);
        let right_assoc = op == "pow";
        while let Some(top) = self.pending.last() {
            let top_prec = match top {
                Pending::Unary(top) | Pending::Binary(top) => precedence(top),
                _ => break,
            };
            if top_prec < prec || (top_prec == prec && right_assoc) {
                break;
            }
            if let Some(top) = self.pending.pop() {
                self.reduce(top, at)?;
            }
        }
        self.pending.push(Pending::Binary(op));
        Ok(())
    }

    /// Pops operands for an operator and pushes the resulting node.
    fn reduce(&mut self, pending: Pending, at: usize) -> Result<()> {
        match pending {
            Pending::Unary(op) => {
                let (expr, depth) = self.pop_operand(op, at)?;
                self.push_node(Expr::Unary { op, expr: Box::new(expr) }, depth + 1, at)?;
            },
            Pending::Binary(op) => {
                let (right, r) = self.pop_operand(op, at)?;
                let (left, l) = self.pop_operand(op, at)?;
                self.push_node(Expr::Binary { op, left: Box::new(left), right: Box::new(right) }, l.max(r) + 1, at)?;
            },
            Pending::Group(open) | Pending::Bar(open) | Pending::Call { at: open, .. } => {
                return Err(Error::syntax("unclosed bracket", open));
            },
        }
        Ok(())
    }

    fn push_node(&mut self, expr: Expr, depth: usize, at: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(Error::syntax(format!("expression nested deeper than {} levels", MAX_DEPTH), at));
        }
        self.output.push((expr, depth));
        Ok(())
    }

    fn pop_operand(&mut self, op: &str, at: usize) -> Result<(Expr, usize)> {
        self.output.pop()
            .ok_or_else(|| Error::syntax(format!("missing operand for {}", op), at))
    }

    /// Reduces operators down to the innermost bracket, which is left in place.
    fn reduce_to_bracket(&mut self, at: usize) -> Result<()> {
        while let Some(top) = self.pending.last() {
            if matches!(top, Pending::Group(_) | Pending::Bar(_) | Pending::Call { .. }) {
                break;
            }
            if let Some(top) = self.pending.pop() {
                self.reduce(top, at)?;
            }
        }
        Ok(())
    }

    fn innermost_is_bar(&self) -> bool {
        self.pending.iter().rev()
            .find(|p| matches!(p, Pending::Group(_) | Pending::Bar(_) | Pending::Call { .. }))
            .is_some_and(|p| matches!(p, Pending::Bar(_)))
    }

    fn close_paren(&mut self, at: usize) -> Result<()> {
        if self.last == Last::CallOpen {
            if let Some(Pending::Call { name, .. }) = self.pending.pop() {
                self.output.push((Expr::Call { name, args: Vec::new() }, 1));
            }
            self.last = Last::Value;
            return Ok(());
        }
        if !self.last.is_value() {
            return Err(Error::syntax("expected a value before ')'", at));
        }

        self.reduce_to_bracket(at)?;
        match self.pending.pop() {
            Some(Pending::Group(_)) => (),
            Some(Pending::Call { name, argc, .. }) => {
                let argc = argc + 1;
                if self.output.len() < argc {
                    return Err(Error::syntax(format!("missing arguments for {}", name), at));
                }
                let operands = self.output.split_off(self.output.len() - argc);
                let depth = operands.iter().map(|(_, d)| *d).max().unwrap_or(0) + 1;
                let args = operands.into_iter().map(|(arg, _)| arg).collect();
                self.push_node(Expr::Call { name, args }, depth, at)?;
            },
            _ => return Err(Error::syntax("unmatched ')'", at)),
        }
        self.last = Last::Value;
        Ok(())
    }

    fn close_bar(&mut self, at: usize) -> Result<()> {
        self.reduce_to_bracket(at)?;
        self.pending.pop();
        let (expr, depth) = self.pop_operand("abs", at)?;
        self.push_node(Expr::Unary { op: "abs", expr: Box::new(expr) }, depth + 1, at)?;
        self.last = Last::Value;
        Ok(())
    }

    fn comma(&mut self, at: usize) -> Result<()> {
        if !self.last.is_value() {
            return Err(Error::syntax("expected a value before ','", at));
        }
        self.reduce_to_bracket(at)?;
        match self.pending.last_mut() {
            Some(Pending::Call { argc, .. }) => *argc += 1,
            _ => return Err(Error::syntax("',' outside of an argument list", at)),
        }
        self.last = Last::Operator;
        Ok(())
    }

    fn finish(mut self, end: usize) -> Result<Expr> {
        if !self.last.is_value() {
            return Err(Error::syntax(describe(None), end));
        }
        while let Some(top) = self.pending.pop() {
            self.reduce(top, end)?;
        }
        let (expr, _) = self.output.pop()
            .ok_or_else(|| Error::syntax("expected an expression", end))?;
        if !self.output.is_empty() {
            return Err(Error::syntax("expected an operator", end));
        }
        Ok(expr)
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;
    use crate::lexer::{scan, scan_with};
    use crate::library::Library;

    fn imaginary_unit(t: Token) -> Token {
        if t.is(TokenKind::Identifier, "i") { t.with_kind(TokenKind::Constant) } else { t }
    }

    fn decl(source: &str) -> Result<Declaration> {
        parse(&scan_with(source, &Library::extended(), &[&imaginary_unit])?)
    }

    fn body(source: &str) -> String {
        decl(source).unwrap().body.to_string()
    }

    fn syntax_error(source: &str) -> bool {
        matches!(decl(source), Err(Error::Syntax { .. }))
    }

    #[test]
    fn test_head() {
        let decl = decl("g(x, y2) = x").unwrap();
        assert_eq!(decl.name, "g");
        assert_eq!(
            decl.params,
            vec![
                Param { name: "x".into(), index: 0 },
                Param { name: "y2".into(), index: 1 },
            ],
        );
        assert_eq!(decl.body, Expr::Param { name: "x".into(), index: 0 });
        assert!(decl.clauses.is_empty());
    }

    #[test]
    fn test_head_without_params() {
        let decl = decl("f() = 1").unwrap();
        assert!(decl.params.is_empty());
        assert_eq!(decl.body, Expr::Number(1.0));
    }

    #[test]
    fn test_head_is_mandatory() {
        assert!(syntax_error("x + 1"));
        assert!(syntax_error("f(x) x"));
        assert!(syntax_error("f(x"));
        assert!(syntax_error("f(x y) = x"));
        assert!(syntax_error("f(1) = 1"));
        assert!(syntax_error(""));
    }

    #[test]
    fn test_duplicate_parameter() {
        let err = decl("f(x, x) = x").unwrap_err();
        assert_eq!(err, Error::Syntax { message: "duplicate parameter 'x'".into(), at: 5 });
    }

    #[test]
    fn test_precedence() {
        assert_eq!(body("f(x) = 1 + 2*x^2"), "(1 + (2 * (x ^ 2)))");
        assert_eq!(body("f(x) = 1 - x - 2"), "((1 - x) - 2)");
        assert_eq!(body("f(x) = 8 / x / 2"), "((8 / x) / 2)");
        assert_eq!(body("f(x) = 2^3^x"), "(2 ^ (3 ^ x))");
        assert_eq!(body("f(x) = (1 + x) * 2"), "((1 + x) * 2)");
    }

    #[test]
    fn test_unary() {
        assert_eq!(body("f(x) = -x^2"), "(-(x ^ 2))");
        assert_eq!(body("f(x) = -x + 1"), "((-x) + 1)");
        assert_eq!(body("f(x) = 2^-x"), "(2 ^ (-x))");
        assert_eq!(body("f(x) = 3 * -x"), "(3 * (-x))");
        assert_eq!(body("f(x) = +x"), "x");
        assert_eq!(body("f(x) = --x"), "(-(-x))");
    }

    #[test]
    fn test_factorial() {
        assert_eq!(body("f(x) = x!"), "(x!)");
        assert_eq!(body("f(x) = 2x!"), "(2 * (x!))");
        assert_eq!(body("f(x) = (x + 1)!"), "((x + 1)!)");
        assert_eq!(body("f(x) = -3!"), "(-(3!))");
        assert!(syntax_error("f(x) = !x"));
    }

    #[test]
    fn test_modulo() {
        assert_eq!(body("f(x) = x mod 3"), "(x mod 3)");
        assert_eq!(body("f(x) = x % 3 + 1"), "((x mod 3) + 1)");
    }

    #[test]
    fn test_absolute_value() {
        assert_eq!(body("f(x) = |x - 1|"), "|(x - 1)|");
        assert_eq!(body("f(x) = 2|x|"), "(2 * |x|)");
        assert_eq!(body("f(x) = |x| + |1 - x|"), "(|x| + |(1 - x)|)");
        assert_eq!(body("f(x) = ||x| - 1|"), "|(|x| - 1)|");
        assert!(syntax_error("f(x) = |x"));
        assert!(syntax_error("f(x) = x|x|"));
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(body("f(x) = 3x"), "(3 * x)");
        assert_eq!(body("f(x) = 2pi"), "(2 * pi)");
        assert_eq!(body("f(x) = 3i"), "(3 * i)");
        assert_eq!(body("f(x) = ix"), "(i * x)");
        assert_eq!(body("f(x) = (x + 1)(x - 1)"), "((x + 1) * (x - 1))");
        assert_eq!(body("f(x) = x(x + 1)"), "(x * (x + 1))");
        assert_eq!(body("f(x) = 2sin(x)"), "(2 * sin(x))");
        assert_eq!(body("f(x) = 1/2x"), "((1 / 2) * x)");
        assert_eq!(body("f(x) = -2x"), "((-2) * x)");
    }

    #[test]
    fn test_identifiers_need_an_operator() {
        assert!(syntax_error("f(x, y) = xy"));
        assert!(syntax_error("f(x) = x 2"));
        assert!(syntax_error("f(x) = x sin(x)"));
        assert!(syntax_error("f(x) = xi"));
    }

    #[test]
    fn test_i_without_hook_is_an_identifier() {
        let tokens = scan("f(x) = ix", &Library::extended()).unwrap();
        assert!(matches!(parse(&tokens), Err(Error::Syntax { .. })));

        let tokens = scan("f(x) = i", &Library::extended()).unwrap();
        assert_eq!(parse(&tokens).unwrap().body, Expr::Constant("i".into()));
    }

    #[test]
    fn test_non_parameter_identifiers_are_constants() {
        assert_eq!(decl("f(x) = e").unwrap().body, Expr::Constant("e".into()));
        assert_eq!(decl("f(e) = e").unwrap().body, Expr::Param { name: "e".into(), index: 0 });
        assert_eq!(decl("f(x) = y").unwrap().body, Expr::Constant("y".into()));
    }

    #[test]
    fn test_calls() {
        assert_eq!(body("f() = hypot(3, 4)"), "hypot(3, 4)");
        assert_eq!(body("f() = random()"), "random()");
        assert_eq!(body("f(x) = log_(x, 2) + 1"), "(log_(x, 2) + 1)");
        assert_eq!(body("f(x) = sin(cos(x))"), "sin(cos(x))");
        assert_eq!(body("f(x) = max(x, -x, (x + 1))"), "max(x, (-x), (x + 1))");
        assert_eq!(body("f(x) = sin(x)^2"), "(sin(x) ^ 2)");

        let decl = decl("f(x) = pow(x, 2)").unwrap();
        match decl.body {
            Expr::Call { name, args } => {
                assert_eq!(name, "pow");
                assert_eq!(args.len(), 2);
            },
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn test_call_syntax_errors() {
        assert!(syntax_error("f(x) = sin x"));
        assert!(syntax_error("f(x) = sin"));
        assert!(syntax_error("f(x) = sin(x,)"));
        assert!(syntax_error("f(x) = sin(,x)"));
        assert!(syntax_error("f(x) = (x, 1)"));
        assert!(syntax_error("f(x) = ()"));
    }

    #[test]
    fn test_incomplete_expressions() {
        assert_eq!(
            decl("f(x) = x +").unwrap_err(),
            Error::Syntax { message: "unexpected end of input".into(), at: 10 },
        );
        assert!(syntax_error("f(x) ="));
        assert!(syntax_error("f(x) = * x"));
        assert!(syntax_error("f(x) = (x + 1"));
        assert!(syntax_error("f(x) = x + 1)"));
        assert!(syntax_error("f(x) = x = 1"));
    }

    #[test]
    fn test_clauses() {
        let decl = decl("f(x) = -x if x < 0; x otherwise").unwrap();
        assert_eq!(decl.body, Expr::Param { name: "x".into(), index: 0 });
        assert_eq!(decl.clauses.len(), 1);
        let clause = &decl.clauses[0];
        assert_eq!(clause.value.to_string(), "(-x)");
        assert_eq!(clause.guard.len(), 1);
        assert_eq!(clause.guard[0].op, CompareOp::Lt);
        assert_eq!(clause.guard[0].to_string(), "x < 0");
        assert_eq!(decl.to_string(), "f(x) = (-x) if x < 0; x");
    }

    #[test]
    fn test_body_may_come_first() {
        let decl = decl("f(x) = x; 0 if x = 1").unwrap();
        assert_eq!(decl.body.to_string(), "x");
        assert_eq!(decl.clauses[0].guard[0].op, CompareOp::Eq);
    }

    #[test]
    fn test_guard_chains_and_conjunctions() {
        let decl = decl("f(x) = 1 if 0 < x <= 1 and x != 0.5; 0").unwrap();
        let guard: Vec<String> = decl.clauses[0].guard.iter().map(|c| c.to_string()).collect();
        assert_eq!(guard, vec!["0 < x", "x <= 1", "x != 0.5"]);
    }

    #[test]
    fn test_body_count() {
        assert!(syntax_error("f(x) = 1 if x > 0"));
        assert!(syntax_error("f(x) = 1; 2"));
        assert!(syntax_error("f(x) = 1 if x > 0; 2; 3 otherwise"));
    }

    #[test]
    fn test_guard_syntax_errors() {
        assert!(syntax_error("f(x) = 1 if x; 0"));
        assert!(syntax_error("f(x) = 1 if x < ; 0"));
        assert!(syntax_error("f(x) = 1 if x < 0 and; 0"));
        assert!(syntax_error("f(x) = 1 if; 0"));
    }

    #[test]
    fn test_nesting_depth() {
        let unary = |n: usize| format!("f(x) = {}x", "-".repeat(n));
        assert!(decl(&unary(MAX_DEPTH - 1)).is_ok());
        assert!(syntax_error(&unary(MAX_DEPTH)));
        assert!(syntax_error(&unary(200_000)));

        let chain = |n: usize| format!("f(x) = {}", vec!["x"; n].join("+"));
        assert!(decl(&chain(MAX_DEPTH)).is_ok());
        assert!(syntax_error(&chain(200_000)));

        let nested = |n: usize| format!("f(x) = {}x{}", "sin(".repeat(n), ")".repeat(n));
        assert!(syntax_error(&nested(MAX_DEPTH)));

        // brackets alone do not deepen the tree
        let n = 100_000;
        assert_eq!(body(&format!("f(x) = {}x{}", "(".repeat(n), ")".repeat(n))), "x");
    }

    #[test]
    fn test_compare_op() {
        assert_eq!(CompareOp::from_symbol("="), Some(CompareOp::Eq));
        assert_eq!(CompareOp::from_symbol(">="), Some(CompareOp::Ge));
        assert_eq!(CompareOp::from_symbol("=>"), None);
        assert!(CompareOp::Lt.is_ordering());
        assert!(!CompareOp::Ne.is_ordering());
    }
}
