//! Hashconsed terms.
//!
//! # Terms
//!
//! The `R`eal term structure is [`RTerm`] which is hashconsed into [`Term`]. The factory is not
//! directly accessible, terms are created *via* the functions in this module such as [`var`],
//! [`int`], [`sym`], [`fun`], [`arith`] and [`interval`].
//!
//! Hashconsing makes equality and hashing of terms constant time. Note however that the `Ord`
//! implementation of [`Term`] is the creation order of the terms. Use [`cmp`] for the semantic,
//! total order on terms: integers come before symbols, which come before strings, which come
//! before functional terms.
//!
//! # Depth
//!
//! All the traversals of this module are recursive. Programs are checked against
//! [`MAX_TERM_DEPTH`](crate::common::MAX_TERM_DEPTH) when they are built, see
//! [`check_depth`].
//!
//! # Examples
//!
//! ```rust
//! # use lagro::term;
//! # use lagro::term::ArithOp;
//! let x = term::var("X");
//! let t = term::fun("f", vec![term::int(1), term::arith(ArithOp::Add, x.clone(), term::int(2))]);
//! assert!(!t.is_ground());
//! assert_eq!(format!("{}", t), "f(1,X+2)");
//! assert_eq!(t.depth(), 3);
//!
//! let ground = term::arith(ArithOp::Mul, term::int(3), term::int(7));
//! assert_eq!(term::eval(&ground), Some(21));
//! ```

use hashconsing::{HConsed, HashConsign};

use crate::common::*;

mod eval;
#[cfg(test)]
mod test;

pub use self::eval::*;

/// Initial capacity of the term factory.
const TERM_CAPA: usize = 3_000;

hashconsing::consign! {
    /// Term factory.
    let factory = consign(TERM_CAPA) for RTerm;
}

/// Hash consed term.
pub type Term = HConsed<RTerm>;

/// A set of variables, ordered by name.
pub type VarSet = BTreeSet<Var>;

/// A variable, *i.e.* a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(Arc<str>);
impl Var {
    /// Constructor.
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Var(name.as_ref().into())
    }
    /// Name of the variable.
    pub fn name(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for Var {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// A constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cst {
    /// Integer constant.
    Int(i64),
    /// Symbolic constant.
    Sym(String),
    /// String constant.
    Str(String),
}
impl Cst {
    /// Rank of the kind of constant in the term order.
    fn rank(&self) -> u8 {
        match self {
            Cst::Int(_) => 0,
            Cst::Sym(_) => 1,
            Cst::Str(_) => 2,
        }
    }
}
impl fmt::Display for Cst {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cst::Int(i) => write!(fmt, "{}", i),
            Cst::Sym(s) => write_sym(fmt, s),
            Cst::Str(s) => write_quoted(fmt, '"', s),
        }
    }
}

/// True if a symbol can be written as is, *i.e.* it cannot be mistaken for a variable or an
/// integer.
pub fn is_plain_sym(sym: &str) -> bool {
    let mut chars = sym.chars();
    match chars.next() {
        Some(c) if c.is_lowercase() => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// True if a function symbol can be written as is.
///
/// Parentheses follow, so it only needs to be an identifier that does not start with a digit.
pub fn is_plain_fun_sym(sym: &str) -> bool {
    let mut chars = sym.chars();
    match chars.next() {
        Some(c) if !c.is_ascii_digit() && (c.is_alphanumeric() || c == '_') => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Writes a symbol, between single quotes if it is not plain.
fn write_sym(fmt: &mut fmt::Formatter, sym: &str) -> fmt::Result {
    if is_plain_sym(sym) {
        fmt.write_str(sym)
    } else {
        write_quoted(fmt, '\'', sym)
    }
}

/// Writes some text between delimiters, escaping the delimiter and backslashes.
fn write_quoted(fmt: &mut fmt::Formatter, delim: char, text: &str) -> fmt::Result {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push(delim);
    for c in text.chars() {
        if c == delim || c == '\\' {
            escaped.push('\\')
        }
        escaped.push(c)
    }
    escaped.push(delim);
    fmt.write_str(&escaped)
}

/// A real term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RTerm {
    /// A variable.
    Var(Var),
    /// A constant.
    Cst(Cst),
    /// A functional term.
    Fun {
        /// Depth of this term.
        depth: usize,
        /// Function symbol.
        sym: String,
        /// Arguments.
        args: Vec<Term>,
    },
    /// An arithmetic term.
    Arith {
        /// Depth of this term.
        depth: usize,
        /// Operator.
        op: ArithOp,
        /// Left operand.
        lft: Term,
        /// Right operand.
        rgt: Term,
    },
    /// An interval `lo..hi`.
    Interval {
        /// Depth of this term.
        depth: usize,
        /// Lower bound.
        lo: Term,
        /// Upper bound.
        hi: Term,
    },
}

impl RTerm {
    /// Depth of the term, a leaf has depth `1`.
    pub fn depth(&self) -> usize {
        match self {
            RTerm::Var(_) | RTerm::Cst(_) => 1,
            RTerm::Fun { depth, .. } | RTerm::Arith { depth, .. } | RTerm::Interval { depth, .. } => {
                *depth
            }
        }
    }

    /// True if the term mentions no variable.
    pub fn is_ground(&self) -> bool {
        match self {
            RTerm::Var(_) => false,
            RTerm::Cst(_) => true,
            RTerm::Fun { args, .. } => args.iter().all(|arg| arg.is_ground()),
            RTerm::Arith { lft, rgt, .. } => lft.is_ground() && rgt.is_ground(),
            RTerm::Interval { lo, hi, .. } => lo.is_ground() && hi.is_ground(),
        }
    }

    /// Variable behind this term, if it is a variable.
    pub fn var(&self) -> Option<&Var> {
        match self {
            RTerm::Var(var) => Some(var),
            _ => None,
        }
    }

    /// Integer value of this term, if it is an integer constant.
    pub fn int_val(&self) -> Option<i64> {
        match self {
            RTerm::Cst(Cst::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// True if the term is an arithmetic term.
    pub fn is_arith(&self) -> bool {
        matches!(self, RTerm::Arith { .. })
    }

    /// Adds the variables of the term to a set.
    pub fn add_vars(&self, set: &mut VarSet) {
        match self {
            RTerm::Var(var) => {
                set.insert(var.clone());
            }
            RTerm::Cst(_) => (),
            RTerm::Fun { args, .. } => {
                for arg in args {
                    arg.add_vars(set)
                }
            }
            RTerm::Arith { lft, rgt, .. } => {
                lft.add_vars(set);
                rgt.add_vars(set)
            }
            RTerm::Interval { lo, hi, .. } => {
                lo.add_vars(set);
                hi.add_vars(set)
            }
        }
    }

    /// Variables of the term.
    pub fn vars(&self) -> VarSet {
        let mut set = VarSet::new();
        self.add_vars(&mut set);
        set
    }

    /// Adds the variables appearing in the term **outside** of arithmetic terms.
    ///
    /// These are the variables a one-sided match against a ground term can bind.
    pub fn add_matchable_vars(&self, set: &mut VarSet) {
        match self {
            RTerm::Var(var) => {
                set.insert(var.clone());
            }
            RTerm::Fun { args, .. } => {
                for arg in args {
                    arg.add_matchable_vars(set)
                }
            }
            RTerm::Cst(_) | RTerm::Arith { .. } | RTerm::Interval { .. } => (),
        }
    }
}

impl fmt::Display for RTerm {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RTerm::Var(var) => write!(fmt, "{}", var),
            RTerm::Cst(cst) => write!(fmt, "{}", cst),
            RTerm::Fun { sym, args, .. } => {
                if is_plain_fun_sym(sym) {
                    fmt.write_str(sym)?
                } else {
                    write_quoted(fmt, '\'', sym)?
                }
                fmt.write_str("(")?;
                write_sep(fmt, ",", args)?;
                fmt.write_str(")")
            }
            RTerm::Arith { op, lft, rgt, .. } => {
                for (term, is_lft) in [(lft, true), (rgt, false)] {
                    if !is_lft {
                        write!(fmt, "{}", op)?
                    }
                    if term.is_arith() {
                        write!(fmt, "({})", term)?
                    } else {
                        write!(fmt, "{}", term)?
                    }
                }
                Ok(())
            }
            RTerm::Interval { lo, hi, .. } => write!(fmt, "{}..{}", lo, hi),
        }
    }
}

/// Creates a term.
#[inline]
pub fn term(t: RTerm) -> Term {
    factory.mk(t)
}

/// Creates a variable.
#[inline]
pub fn var<S: AsRef<str>>(name: S) -> Term {
    factory.mk(RTerm::Var(Var::new(name)))
}

/// Creates a variable term from a variable.
#[inline]
pub fn of_var(var: &Var) -> Term {
    factory.mk(RTerm::Var(var.clone()))
}

/// Creates a constant.
#[inline]
pub fn cst(cst: Cst) -> Term {
    factory.mk(RTerm::Cst(cst))
}

/// Creates an integer constant.
#[inline]
pub fn int(i: i64) -> Term {
    factory.mk(RTerm::Cst(Cst::Int(i)))
}

/// Creates a symbolic constant.
#[inline]
pub fn sym<S: Into<String>>(s: S) -> Term {
    factory.mk(RTerm::Cst(Cst::Sym(s.into())))
}

/// Creates a string constant.
#[inline]
pub fn string<S: Into<String>>(s: S) -> Term {
    factory.mk(RTerm::Cst(Cst::Str(s.into())))
}

/// Creates a functional term.
pub fn fun<S: Into<String>>(sym: S, args: Vec<Term>) -> Term {
    let depth = 1 + args.iter().map(|arg| arg.depth()).max().unwrap_or(0);
    factory.mk(RTerm::Fun {
        depth,
        sym: sym.into(),
        args,
    })
}

/// Creates an arithmetic term.
pub fn arith(op: ArithOp, lft: Term, rgt: Term) -> Term {
    let depth = 1 + ::std::cmp::max(lft.depth(), rgt.depth());
    factory.mk(RTerm::Arith { depth, op, lft, rgt })
}

/// Creates an interval term.
pub fn interval(lo: Term, hi: Term) -> Term {
    let depth = 1 + ::std::cmp::max(lo.depth(), hi.depth());
    factory.mk(RTerm::Interval { depth, lo, hi })
}

/// Fails if a term is deeper than [`MAX_TERM_DEPTH`](crate::common::MAX_TERM_DEPTH).
pub fn check_depth(term: &Term) -> Res<()> {
    if term.depth() > MAX_TERM_DEPTH {
        bail!(ErrorKind::TermTooDeep(term.to_string(), MAX_TERM_DEPTH))
    }
    Ok(())
}

/// Total semantic order over terms.
///
/// Integers are compared numerically, symbols and strings lexicographically. Integers come
/// before symbols, symbols before strings and strings before functional terms. Functional terms
/// are compared by arity, then symbol, then arguments. Non-ground terms come last and are
/// compared by their string representation.
pub fn cmp(lft: &Term, rgt: &Term) -> Ordering {
    if lft == rgt {
        return Ordering::Equal;
    }
    fn rank(term: &RTerm) -> u8 {
        match term {
            RTerm::Cst(cst) => cst.rank(),
            RTerm::Fun { .. } => 3,
            RTerm::Arith { .. } => 4,
            RTerm::Interval { .. } => 5,
            RTerm::Var(_) => 6,
        }
    }
    match (lft.get(), rgt.get()) {
        (RTerm::Cst(Cst::Int(l)), RTerm::Cst(Cst::Int(r))) => l.cmp(r),
        (RTerm::Cst(Cst::Sym(l)), RTerm::Cst(Cst::Sym(r)))
        | (RTerm::Cst(Cst::Str(l)), RTerm::Cst(Cst::Str(r))) => l.cmp(r),
        (
            RTerm::Fun {
                sym: lsym,
                args: largs,
                ..
            },
            RTerm::Fun {
                sym: rsym,
                args: rargs,
                ..
            },
        ) => largs
            .len()
            .cmp(&rargs.len())
            .then_with(|| lsym.cmp(rsym))
            .then_with(|| cmp_slices(largs, rargs)),
        (l, r) => match rank(l).cmp(&rank(r)) {
            Ordering::Equal => l.to_string().cmp(&r.to_string()),
            ord => ord,
        },
    }
}

/// Lexicographic extension of [`cmp`].
pub fn cmp_slices(lft: &[Term], rgt: &[Term]) -> Ordering {
    for (l, r) in lft.iter().zip(rgt.iter()) {
        match cmp(l, r) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    lft.len().cmp(&rgt.len())
}
