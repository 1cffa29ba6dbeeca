//! Body literals.
//!
//! Literals come in three kinds:
//!
//! - [`BasicLit`]: a possibly negated atom over an ordinary predicate, looked up in working
//!   memory;
//! - [`FixedLit`]: a literal with a fixed interpretation (comparison, interval, external), which
//!   computes its own satisfying substitutions;
//! - [`EnumLit`]: an enumeration literal, binding a stable index for a (id, value) pair.
//!
//! Every literal knows its *binding* variables, the ones it can bind itself, and its
//! *non-binding* variables, the ones that must be bound before it can be evaluated. Grounding
//! orders are built from these two sets.

use crate::common::*;
use crate::program::Atom;
use crate::subst::{specialize, Subst};

/// An external computation: maps ground input terms to output tuples.
pub type ExternalFn = Arc<dyn Fn(&[Term]) -> Res<Vec<Vec<Term>>> + Send + Sync>;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}
impl CmpOp {
    /// Negation of the operator.
    pub fn negate(self) -> Self {
        match self {
            CmpOp::Eq => CmpOp::Ne,
            CmpOp::Ne => CmpOp::Eq,
            CmpOp::Lt => CmpOp::Ge,
            CmpOp::Ge => CmpOp::Lt,
            CmpOp::Le => CmpOp::Gt,
            CmpOp::Gt => CmpOp::Le,
        }
    }

    /// True if the operator holds for some ordering.
    pub fn holds(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}
impl_fmt! {
    CmpOp(self, fmt) {
        fmt.write_str(match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        })
    }
}

/// A possibly negated atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasicLit {
    /// The atom.
    pub atom: Atom,
    /// True if negated.
    pub neg: bool,
}

/// A comparison `lft op rgt`, possibly negated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CmpLit {
    /// Operator.
    pub op: CmpOp,
    /// Left-hand side.
    pub lft: Term,
    /// Right-hand side.
    pub rgt: Term,
    /// True if negated.
    pub neg: bool,
}
impl CmpLit {
    /// Operator, taking negation into account.
    pub fn effective_op(&self) -> CmpOp {
        if self.neg {
            self.op.negate()
        } else {
            self.op
        }
    }

    /// True if the literal is a positive equality or a negated disequality.
    pub fn is_normalized_eq(&self) -> bool {
        self.effective_op() == CmpOp::Eq
    }

    /// True for an equality whose left-hand side is a variable.
    pub fn is_left_assigning(&self) -> bool {
        self.is_normalized_eq() && self.lft.var().is_some()
    }
    /// True for an equality whose right-hand side is a variable.
    pub fn is_right_assigning(&self) -> bool {
        self.is_normalized_eq() && self.rgt.var().is_some()
    }

    /// True if the comparison can be evaluated under some substitution.
    fn can_evaluate(&self, subst: &Subst) -> bool {
        let (lft, rgt) = (subst.apply(&self.lft), subst.apply(&self.rgt));
        match (lft.is_ground(), rgt.is_ground()) {
            (true, true) => true,
            (false, true) => self.is_normalized_eq() && lft.var().is_some(),
            (true, false) => self.is_normalized_eq() && rgt.var().is_some(),
            (false, false) => false,
        }
    }

    /// Substitutions satisfying the comparison.
    fn satisfying(&self, subst: &Subst) -> Res<Vec<Subst>> {
        let (lft, rgt) = (subst.apply(&self.lft), subst.apply(&self.rgt));
        if self.is_normalized_eq() {
            for (assigned, value) in [(&lft, &rgt), (&rgt, &lft)] {
                if let Some(var) = assigned.var() {
                    if !value.is_ground() {
                        bail!(ErrorKind::Unsupported(format!(
                            "cannot evaluate `{} {} {}`, both sides are unbound",
                            self.lft, self.op, self.rgt
                        )))
                    }
                    // Undefined arithmetic, no value.
                    if term::has_arith(value) {
                        return Ok(vec![]);
                    }
                    return Ok(vec![subst.clone().with(var.clone(), value.clone())?]);
                }
            }
        }
        if !lft.is_ground() || !rgt.is_ground() {
            bail!(ErrorKind::Internal(format!(
                "evaluating non-ground comparison `{} {} {}`",
                lft, self.op, rgt
            )))
        }
        if term::has_arith(&lft) || term::has_arith(&rgt) {
            return Ok(vec![]);
        }
        if self.effective_op().holds(term::cmp(&lft, &rgt)) {
            Ok(vec![subst.clone()])
        } else {
            Ok(vec![])
        }
    }
}

/// An interval literal `var in lo..hi`, upper bound included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntervalLit {
    /// Term ranging over the interval, usually a variable.
    pub var: Term,
    /// Lower bound.
    pub lo: Term,
    /// Upper bound.
    pub hi: Term,
}
impl IntervalLit {
    fn can_evaluate(&self, subst: &Subst) -> bool {
        subst.apply(&self.lo).is_ground() && subst.apply(&self.hi).is_ground()
    }

    fn satisfying(&self, subst: &Subst) -> Res<Vec<Subst>> {
        let (lo, hi) = (subst.apply(&self.lo), subst.apply(&self.hi));
        let (lo, hi) = match (lo.int_val(), hi.int_val()) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => bail!(ErrorKind::Unsupported(format!(
                "interval bounds must be integers, found `{}..{}`",
                lo, hi
            ))),
        };
        let var = subst.apply(&self.var);
        if let Some(var) = var.var() {
            let mut res = vec![];
            for val in lo..=hi {
                res.push(subst.clone().with(var.clone(), term::int(val))?)
            }
            Ok(res)
        } else {
            match var.int_val() {
                Some(val) if lo <= val && val <= hi => Ok(vec![subst.clone()]),
                _ => Ok(vec![]),
            }
        }
    }
}

/// An external literal `&name[input](output)`, possibly negated.
#[derive(Clone)]
pub struct ExternalLit {
    /// Name of the external.
    pub name: String,
    /// Computation.
    pub fun: ExternalFn,
    /// Input terms.
    pub input: Vec<Term>,
    /// Output terms.
    pub output: Vec<Term>,
    /// True if negated.
    pub neg: bool,
}
impl fmt::Debug for ExternalLit {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("ExternalLit")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("neg", &self.neg)
            .finish()
    }
}
impl ExternalLit {
    fn can_evaluate(&self, subst: &Subst) -> bool {
        self.input.iter().all(|t| subst.apply(t).is_ground())
            && (!self.neg || self.output.iter().all(|t| subst.apply(t).is_ground()))
    }

    fn satisfying(&self, subst: &Subst) -> Res<Vec<Subst>> {
        let input = subst.apply_all(&self.input);
        let tuples =
            (self.fun)(&input).chain_err(|| format!("while evaluating external `{}`", self.name))?;
        let output = subst.apply_all(&self.output);
        for tuple in &tuples {
            if tuple.len() != output.len() {
                bail!(ErrorKind::ArityMismatch(
                    format!("&{}", self.name),
                    output.len(),
                    tuple.len()
                ))
            }
        }
        if self.neg {
            if tuples.iter().any(|tuple| tuple == &output) {
                Ok(vec![])
            } else {
                Ok(vec![subst.clone()])
            }
        } else {
            Ok(tuples
                .iter()
                .filter_map(|tuple| specialize(&output, tuple, subst))
                .map(Cow::into_owned)
                .collect())
        }
    }
}

/// Literals with a fixed interpretation.
#[derive(Debug, Clone)]
pub enum FixedLit {
    /// Comparison.
    Cmp(CmpLit),
    /// Interval.
    Interval(IntervalLit),
    /// External.
    External(ExternalLit),
}
impl FixedLit {
    /// True if the literal can compute its satisfying substitutions given some substitution.
    ///
    /// Comparisons must be ground, or be an equality with exactly one unbound variable side.
    /// Intervals must have ground bounds. Externals must have a ground input, and a ground
    /// output if negated.
    pub fn can_evaluate(&self, subst: &Subst) -> bool {
        match self {
            FixedLit::Cmp(cmp) => cmp.can_evaluate(subst),
            FixedLit::Interval(interval) => interval.can_evaluate(subst),
            FixedLit::External(external) => external.can_evaluate(subst),
        }
    }

    /// Extensions of a substitution satisfying the literal.
    pub fn satisfying(&self, subst: &Subst) -> Res<Vec<Subst>> {
        match self {
            FixedLit::Cmp(cmp) => cmp.satisfying(subst),
            FixedLit::Interval(interval) => interval.satisfying(subst),
            FixedLit::External(external) => external.satisfying(subst),
        }
    }
}

/// An enumeration literal `_Enumeration(id, value, index)`.
///
/// Binds `index` to a stable positive integer for each `value` of enumeration `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumLit {
    /// Identifier of the enumeration.
    pub id: Term,
    /// Value to enumerate.
    pub value: Term,
    /// Index term, usually a variable.
    pub index: Term,
}

/// A body literal.
#[derive(Debug, Clone)]
pub enum Literal {
    /// Basic literal.
    Basic(BasicLit),
    /// Fixed-interpretation literal.
    Fixed(FixedLit),
    /// Enumeration literal.
    Enum(EnumLit),
}

impl Literal {
    /// Positive literal.
    pub fn pos(atom: Atom) -> Self {
        Literal::Basic(BasicLit { atom, neg: false })
    }
    /// Negative literal.
    pub fn neg(atom: Atom) -> Self {
        Literal::Basic(BasicLit { atom, neg: true })
    }
    /// Comparison.
    pub fn cmp(lft: Term, op: CmpOp, rgt: Term) -> Self {
        Literal::Fixed(FixedLit::Cmp(CmpLit {
            op,
            lft,
            rgt,
            neg: false,
        }))
    }
    /// Negated comparison.
    pub fn not_cmp(lft: Term, op: CmpOp, rgt: Term) -> Self {
        Literal::Fixed(FixedLit::Cmp(CmpLit {
            op,
            lft,
            rgt,
            neg: true,
        }))
    }
    /// Interval literal.
    pub fn interval(var: Term, lo: Term, hi: Term) -> Self {
        Literal::Fixed(FixedLit::Interval(IntervalLit { var, lo, hi }))
    }
    /// External literal.
    pub fn external<S: Into<String>>(
        name: S,
        fun: ExternalFn,
        input: Vec<Term>,
        output: Vec<Term>,
        neg: bool,
    ) -> Self {
        Literal::Fixed(FixedLit::External(ExternalLit {
            name: name.into(),
            fun,
            input,
            output,
            neg,
        }))
    }
    /// Enumeration literal.
    pub fn enumeration(id: Term, value: Term, index: Term) -> Self {
        Literal::Enum(EnumLit { id, value, index })
    }

    /// True if negated.
    pub fn is_neg(&self) -> bool {
        match self {
            Literal::Basic(lit) => lit.neg,
            Literal::Fixed(FixedLit::Cmp(cmp)) => cmp.neg,
            Literal::Fixed(FixedLit::External(ext)) => ext.neg,
            Literal::Fixed(FixedLit::Interval(_)) | Literal::Enum(_) => false,
        }
    }

    /// Basic literal, if any.
    pub fn basic(&self) -> Option<&BasicLit> {
        match self {
            Literal::Basic(lit) => Some(lit),
            _ => None,
        }
    }

    /// True for positive basic literals.
    pub fn is_pos_basic(&self) -> bool {
        matches!(self, Literal::Basic(BasicLit { neg: false, .. }))
    }

    /// All the terms of the literal.
    fn terms(&self) -> Vec<&Term> {
        match self {
            Literal::Basic(lit) => lit.atom.args.iter().collect(),
            Literal::Fixed(FixedLit::Cmp(cmp)) => vec![&cmp.lft, &cmp.rgt],
            Literal::Fixed(FixedLit::Interval(itv)) => vec![&itv.var, &itv.lo, &itv.hi],
            Literal::Fixed(FixedLit::External(ext)) => {
                ext.input.iter().chain(ext.output.iter()).collect()
            }
            Literal::Enum(lit) => vec![&lit.id, &lit.value, &lit.index],
        }
    }

    /// Variables of the literal.
    pub fn vars(&self) -> VarSet {
        let mut set = VarSet::new();
        for t in self.terms() {
            t.add_vars(&mut set)
        }
        set
    }

    /// True if the literal is ground.
    pub fn is_ground(&self) -> bool {
        self.terms().into_iter().all(|t| t.is_ground())
    }

    /// Variables the literal can bind by itself.
    pub fn binding_vars(&self) -> VarSet {
        let mut set = VarSet::new();
        match self {
            Literal::Basic(lit) => {
                if !lit.neg {
                    for arg in &lit.atom.args {
                        arg.add_matchable_vars(&mut set)
                    }
                }
            }
            Literal::Fixed(FixedLit::Cmp(cmp)) => {
                if let Some(var) = cmp.lft.var().filter(|_| cmp.is_normalized_eq()) {
                    set.insert(var.clone());
                } else if let Some(var) = cmp.rgt.var().filter(|_| cmp.is_normalized_eq()) {
                    set.insert(var.clone());
                }
            }
            Literal::Fixed(FixedLit::Interval(itv)) => {
                if let Some(var) = itv.var.var() {
                    set.insert(var.clone());
                }
            }
            Literal::Fixed(FixedLit::External(ext)) => {
                if !ext.neg {
                    for out in &ext.output {
                        out.add_matchable_vars(&mut set)
                    }
                }
            }
            Literal::Enum(lit) => {
                if let Some(var) = lit.index.var() {
                    set.insert(var.clone());
                }
            }
        }
        set
    }

    /// Variables that must be bound before the literal can be evaluated.
    pub fn non_binding_vars(&self) -> VarSet {
        let binding = self.binding_vars();
        self.vars()
            .into_iter()
            .filter(|var| !binding.contains(var))
            .collect()
    }

    /// Applies a substitution to the literal.
    pub fn apply(&self, subst: &Subst) -> Literal {
        match self {
            Literal::Basic(lit) => Literal::Basic(BasicLit {
                atom: lit.atom.apply(subst),
                neg: lit.neg,
            }),
            Literal::Fixed(FixedLit::Cmp(cmp)) => Literal::Fixed(FixedLit::Cmp(CmpLit {
                op: cmp.op,
                lft: subst.apply(&cmp.lft),
                rgt: subst.apply(&cmp.rgt),
                neg: cmp.neg,
            })),
            Literal::Fixed(FixedLit::Interval(itv)) => {
                Literal::interval(subst.apply(&itv.var), subst.apply(&itv.lo), subst.apply(&itv.hi))
            }
            Literal::Fixed(FixedLit::External(ext)) => {
                Literal::Fixed(FixedLit::External(ExternalLit {
                    name: ext.name.clone(),
                    fun: ext.fun.clone(),
                    input: subst.apply_all(&ext.input),
                    output: subst.apply_all(&ext.output),
                    neg: ext.neg,
                }))
            }
            Literal::Enum(lit) => Literal::enumeration(
                subst.apply(&lit.id),
                subst.apply(&lit.value),
                subst.apply(&lit.index),
            ),
        }
    }

    /// Checks the literal is supported.
    pub fn check(&self) -> Res<()> {
        for t in self.terms() {
            term::check_depth(t)?
        }
        match self {
            Literal::Fixed(FixedLit::Cmp(cmp))
                if cmp.is_left_assigning() && cmp.is_right_assigning() =>
            {
                bail!(ErrorKind::Unsupported(format!(
                    "equality between two variables `{}`, should be removed beforehand",
                    self
                )))
            }
            Literal::Fixed(FixedLit::Interval(itv)) if itv.var.var().is_none() => {
                if !itv.var.is_ground() {
                    bail!(ErrorKind::Unsupported(format!(
                        "interval literal `{}` must range over a variable or a ground term",
                        self
                    )))
                }
            }
            _ => (),
        }
        Ok(())
    }
}

impl_fmt! {
    Literal(self, fmt) {
        if self.is_neg() {
            fmt.write_str("not ")?
        }
        match self {
            Literal::Basic(lit) => write!(fmt, "{}", lit.atom),
            Literal::Fixed(FixedLit::Cmp(cmp)) => write!(fmt, "{} {} {}", cmp.lft, cmp.op, cmp.rgt),
            Literal::Fixed(FixedLit::Interval(itv)) => {
                write!(fmt, "{} in {}..{}", itv.var, itv.lo, itv.hi)
            }
            Literal::Fixed(FixedLit::External(ext)) => {
                write!(fmt, "&{}[", ext.name)?;
                write_sep(fmt, ",", &ext.input)?;
                fmt.write_str("](")?;
                write_sep(fmt, ",", &ext.output)?;
                fmt.write_str(")")
            }
            Literal::Enum(lit) => {
                write!(fmt, "_Enumeration({},{},{})", lit.id, lit.value, lit.index)
            }
        }
    }
}
