//! General unification, for static analysis only.

use crate::common::*;
use crate::program::Atom;

/// A unifier: a substitution whose right-hand sides may mention variables.
///
/// The unifier is kept idempotent: the right-hand side of a binding never mentions a bound
/// variable. To do so, it remembers which bindings mention each variable on their right-hand
/// side, and updates exactly these bindings when that variable gets bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unifier {
    /// Bindings.
    map: BTreeMap<Var, Term>,
    /// Maps variables to the bound variables whose right-hand side mention them.
    rhs_occurrences: BTreeMap<Var, VarSet>,
}

impl Unifier {
    /// Empty unifier.
    pub fn new() -> Self {
        Unifier::default()
    }

    /// Term a variable is bound to.
    pub fn get(&self, var: &Var) -> Option<&Term> {
        self.map.get(var)
    }
    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.map.len()
    }
    /// True if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Applies the unifier to a term.
    pub fn apply(&self, t: &Term) -> Term {
        rewrite(t, &|var| self.map.get(var).cloned())
    }

    /// Binds a variable.
    ///
    /// The term is resolved against the current bindings first. Returns `false`, leaving the
    /// unifier untouched, if the variable occurs in the resolved term or is already bound.
    pub fn put(&mut self, var: Var, t: &Term) -> bool {
        if self.map.contains_key(&var) {
            return false;
        }
        let t = self.apply(t);
        let t_vars = t.vars();
        if t_vars.contains(&var) {
            return false;
        }

        if let Some(occurrences) = self.rhs_occurrences.remove(&var) {
            for bound in occurrences {
                if let Some(rhs) = self.map.get_mut(&bound) {
                    *rhs = rewrite(rhs, &|v| if v == &var { Some(t.clone()) } else { None });
                }
                for t_var in &t_vars {
                    self.rhs_occurrences
                        .entry(t_var.clone())
                        .or_insert_with(VarSet::new)
                        .insert(bound.clone());
                }
            }
        }

        for t_var in &t_vars {
            self.rhs_occurrences
                .entry(t_var.clone())
                .or_insert_with(VarSet::new)
                .insert(var.clone());
        }
        self.map.insert(var, t);
        true
    }

    /// Unifies two terms, extending the unifier.
    ///
    /// If `bindable` is some set of variables, only these variables can be bound and only on the
    /// left side, all the other variables behave as constants. On failure the unifier may be
    /// partially extended.
    pub fn unify_terms(&mut self, lft: &Term, rgt: &Term, bindable: Option<&VarSet>) -> bool {
        let lft = self.apply(lft);
        let rgt = self.apply(rgt);
        if lft == rgt {
            return true;
        }
        if let Some(var) = lft.var() {
            if bindable.map(|set| set.contains(var)).unwrap_or(true) {
                return self.put(var.clone(), &rgt);
            }
        }
        if bindable.is_none() {
            if let Some(var) = rgt.var() {
                return self.put(var.clone(), &lft);
            }
        }
        match (lft.get(), rgt.get()) {
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
            ) if lsym == rsym && largs.len() == rargs.len() => largs
                .iter()
                .zip(rargs.iter())
                .all(|(l, r)| self.unify_terms(l, r, bindable)),
            (
                RTerm::Arith {
                    op: lop,
                    lft: l_lft,
                    rgt: l_rgt,
                    ..
                },
                RTerm::Arith {
                    op: rop,
                    lft: r_lft,
                    rgt: r_rgt,
                    ..
                },
            ) if lop == rop => {
                self.unify_terms(l_lft, r_lft, bindable)
                    && self.unify_terms(l_rgt, r_rgt, bindable)
            }
            (
                RTerm::Interval {
                    lo: l_lo, hi: l_hi, ..
                },
                RTerm::Interval {
                    lo: r_lo, hi: r_hi, ..
                },
            ) => {
                self.unify_terms(l_lo, r_lo, bindable) && self.unify_terms(l_hi, r_hi, bindable)
            }
            _ => false,
        }
    }
}

impl_fmt! {
    Unifier(self, fmt) {
        fmt.write_str("{")?;
        let mut sep = "";
        for (var, term) in &self.map {
            write!(fmt, "{}{}->{}", sep, var, term)?;
            sep = ","
        }
        fmt.write_str("}")
    }
}

/// Rewrites the variables of a term.
fn rewrite(t: &Term, f: &impl Fn(&Var) -> Option<Term>) -> Term {
    if t.is_ground() {
        return t.clone();
    }
    match t.get() {
        RTerm::Var(var) => f(var).unwrap_or_else(|| t.clone()),
        RTerm::Cst(_) => t.clone(),
        RTerm::Fun { sym, args, .. } => {
            term::fun(sym.clone(), args.iter().map(|arg| rewrite(arg, f)).collect())
        }
        RTerm::Arith { op, lft, rgt, .. } => term::arith(*op, rewrite(lft, f), rewrite(rgt, f)),
        RTerm::Interval { lo, hi, .. } => term::interval(rewrite(lo, f), rewrite(hi, f)),
    }
}

/// Renames all the variables of a term by appending a suffix to their name.
pub fn rename(t: &Term, suffix: &str) -> Term {
    rewrite(t, &|var| Some(term::var(format!("{}{}", var, suffix))))
}

/// Unifies two atoms.
///
/// The atoms must not share variables. Returns `None` if the atoms do not unify.
pub fn unify_atoms(lft: &Atom, rgt: &Atom) -> Res<Option<Unifier>> {
    let (lft_vars, rgt_vars) = (lft.vars(), rgt.vars());
    if let Some(var) = lft_vars.intersection(&rgt_vars).next() {
        bail!(ErrorKind::Internal(format!(
            "cannot unify `{}` and `{}`, they share variable `{}`",
            lft, rgt, var
        )))
    }
    if lft.pred != rgt.pred {
        return Ok(None);
    }
    let mut unifier = Unifier::new();
    for (l, r) in lft.args.iter().zip(rgt.args.iter()) {
        if !unifier.unify_terms(l, r, None) {
            return Ok(None);
        }
    }
    Ok(Some(unifier))
}

/// Instantiates a general atom so that it becomes a specific one.
///
/// Only the variables of `general` are bound, the variables of `specific` behave as constants.
/// Returns `None` if `specific` is not an instance of `general`.
pub fn instantiate(general: &Atom, specific: &Atom) -> Option<Unifier> {
    if general.pred != specific.pred {
        return None;
    }
    let bindable = general.vars();
    let mut unifier = Unifier::new();
    for (g, s) in general.args.iter().zip(specific.args.iter()) {
        if !unifier.unify_terms(g, s, Some(&bindable)) {
            return None;
        }
    }
    Some(unifier)
}
