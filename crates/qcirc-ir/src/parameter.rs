//! Parameter expressions for parameterized gates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

/// Unary transcendental functions allowed in gate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MathFn {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl MathFn {
    /// The function's name as written in QASM source.
    pub fn name(self) -> &'static str {
        match self {
            MathFn::Sin => "sin",
            MathFn::Cos => "cos",
            MathFn::Tan => "tan",
            MathFn::Exp => "exp",
            MathFn::Ln => "ln",
            MathFn::Sqrt => "sqrt",
        }
    }

    /// Apply the function to a value.
    pub fn eval(self, x: f64) -> f64 {
        match self {
            MathFn::Sin => x.sin(),
            MathFn::Cos => x.cos(),
            MathFn::Tan => x.tan(),
            MathFn::Exp => x.exp(),
            MathFn::Ln => x.ln(),
            MathFn::Sqrt => x.sqrt(),
        }
    }
}

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// A symbolic parameter.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Exponentiation.
    Pow(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Transcendental function application.
    Func(MathFn, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbolic parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Raise to a power.
    pub fn pow(self, exponent: ParameterExpression) -> Self {
        ParameterExpression::Pow(Box::new(self), Box::new(exponent))
    }

    /// Apply a transcendental function.
    pub fn apply(func: MathFn, arg: ParameterExpression) -> Self {
        ParameterExpression::Func(func, Box::new(arg))
    }

    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) | ParameterExpression::Func(_, e) => e.is_symbolic(),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b)
            | ParameterExpression::Pow(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Try to evaluate as a concrete f64 value.
    ///
    /// Division by zero and non-finite function results evaluate to `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(v) => Some(*v),
            ParameterExpression::Symbol(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            ParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            ParameterExpression::Sub(a, b) => Some(a.as_f64()? - b.as_f64()?),
            ParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
            ParameterExpression::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.as_f64()? / divisor)
            }
            ParameterExpression::Pow(a, b) => {
                Some(a.as_f64()?.powf(b.as_f64()?)).filter(|v| v.is_finite())
            }
            ParameterExpression::Func(func, e) => {
                Some(func.eval(e.as_f64()?)).filter(|v| v.is_finite())
            }
        }
    }

    /// Get all symbol names in this expression, in sorted order.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        self.collect_symbols(&mut set);
        set
    }

    fn collect_symbols(&self, set: &mut BTreeSet<String>) {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Symbol(name) => {
                set.insert(name.clone());
            }
            ParameterExpression::Neg(e) | ParameterExpression::Func(_, e) => {
                e.collect_symbols(set);
            }
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b)
            | ParameterExpression::Pow(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    /// Bind a symbol to a value, returning a new expression.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        let mut bindings = FxHashMap::default();
        bindings.insert(name.to_string(), ParameterExpression::Constant(value));
        self.substitute(&bindings)
    }

    /// Replace every bound symbol with its expression, then fold constants.
    pub fn substitute(&self, bindings: &FxHashMap<String, ParameterExpression>) -> Self {
        self.replace_symbols(bindings).simplify()
    }

    fn replace_symbols(&self, bindings: &FxHashMap<String, ParameterExpression>) -> Self {
        match self {
            ParameterExpression::Symbol(n) => bindings.get(n).cloned().unwrap_or_else(|| self.clone()),
            _ => self.map_children(|e| e.replace_symbols(bindings)),
        }
    }

    /// Rebuild this node with `f` applied to each direct child.
    fn map_children(&self, mut f: impl FnMut(&ParameterExpression) -> ParameterExpression) -> Self {
        use ParameterExpression as P;
        match self {
            P::Constant(_) | P::Symbol(_) | P::Pi => self.clone(),
            P::Neg(e) => P::Neg(Box::new(f(e))),
            P::Func(func, e) => P::Func(*func, Box::new(f(e))),
            P::Add(a, b) => P::Add(Box::new(f(a)), Box::new(f(b))),
            P::Sub(a, b) => P::Sub(Box::new(f(a)), Box::new(f(b))),
            P::Mul(a, b) => P::Mul(Box::new(f(a)), Box::new(f(b))),
            P::Div(a, b) => P::Div(Box::new(f(a)), Box::new(f(b))),
            P::Pow(a, b) => P::Pow(Box::new(f(a)), Box::new(f(b))),
        }
    }

    /// Simplify the expression by evaluating constant subexpressions.
    pub fn simplify(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return ParameterExpression::Constant(v);
        }
        self.map_children(ParameterExpression::simplify)
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "π"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
            ParameterExpression::Pow(a, b) => write!(f, "({a} ^ {b})"),
            ParameterExpression::Func(func, e) => write!(f, "{}({e})", func.name()),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl From<i32> for ParameterExpression {
    fn from(value: i32) -> Self {
        ParameterExpression::Constant(f64::from(value))
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        ParameterExpression::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for ParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        ParameterExpression::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        ParameterExpression::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for ParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        ParameterExpression::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}
