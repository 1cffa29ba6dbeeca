//! Arithmetic operators and evaluation of ground arithmetic terms.

use num::{
    traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedRem, CheckedSub},
    ToPrimitive,
};

use crate::common::*;

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArithOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Integer division, truncating.
    Div,
    /// Exponentiation, the exponent must be non-negative.
    Pow,
    /// Remainder of the truncating division.
    Mod,
    /// Bitwise exclusive or.
    BitXor,
}

impl ArithOp {
    /// String representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Pow => "**",
            ArithOp::Mod => "\\",
            ArithOp::BitXor => "^",
        }
    }

    /// Applies the operator.
    ///
    /// Returns `None` on overflow, division by zero and negative exponents.
    pub fn apply(self, lft: i64, rgt: i64) -> Option<i64> {
        match self {
            ArithOp::Add => CheckedAdd::checked_add(&lft, &rgt),
            ArithOp::Sub => CheckedSub::checked_sub(&lft, &rgt),
            ArithOp::Mul => CheckedMul::checked_mul(&lft, &rgt),
            ArithOp::Div => CheckedDiv::checked_div(&lft, &rgt),
            ArithOp::Mod => CheckedRem::checked_rem(&lft, &rgt),
            ArithOp::Pow => num::checked_pow(lft, rgt.to_usize()?),
            ArithOp::BitXor => Some(lft ^ rgt),
        }
    }
}

impl_fmt! {
    ArithOp(self, fmt) {
        fmt.write_str(self.as_str())
    }
}

/// Evaluates a ground arithmetic term.
///
/// Returns `None` if the term is not ground, mentions a non-integer leaf, or if some operation
/// is undefined (overflow, division by zero).
///
/// ```rust
/// # use lagro::term::{self, ArithOp};
/// let t = term::arith(ArithOp::Pow, term::int(2), term::int(10));
/// assert_eq!(term::eval(&t), Some(1024));
/// let t = term::arith(ArithOp::Div, term::int(2), term::int(0));
/// assert_eq!(term::eval(&t), None);
/// let t = term::arith(ArithOp::Add, term::sym("a"), term::int(0));
/// assert_eq!(term::eval(&t), None);
/// ```
pub fn eval(term: &Term) -> Option<i64> {
    match term.get() {
        RTerm::Cst(Cst::Int(i)) => Some(*i),
        RTerm::Arith { op, lft, rgt, .. } => op.apply(eval(lft)?, eval(rgt)?),
        _ => None,
    }
}

/// Evaluates all the ground arithmetic subterms of a term.
///
/// Ground arithmetic subterms that cannot be evaluated are left untouched.
pub fn normalize(t: &Term) -> Term {
    match t.get() {
        RTerm::Var(_) | RTerm::Cst(_) => t.clone(),
        RTerm::Fun { sym, args, .. } => {
            if t.is_ground() && !args.iter().any(|arg| has_arith(arg)) {
                return t.clone();
            }
            term::fun(sym.clone(), args.iter().map(normalize).collect())
        }
        RTerm::Arith { op, lft, rgt, .. } => {
            if t.is_ground() {
                if let Some(val) = eval(t) {
                    return term::int(val);
                }
            }
            term::arith(*op, normalize(lft), normalize(rgt))
        }
        RTerm::Interval { lo, hi, .. } => term::interval(normalize(lo), normalize(hi)),
    }
}

/// True if the term has an arithmetic or interval subterm.
pub fn has_arith(t: &Term) -> bool {
    match t.get() {
        RTerm::Var(_) | RTerm::Cst(_) => false,
        RTerm::Fun { args, .. } => args.iter().any(has_arith),
        RTerm::Arith { .. } | RTerm::Interval { .. } => true,
    }
}
