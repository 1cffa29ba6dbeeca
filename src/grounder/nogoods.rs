//! NoGood generation for ground rule instantiations.

use crate::atoms::{AtomStore, GroundAtom, RuleAtom};
use crate::common::*;
use crate::grounder::choice::{ChoiceRecorder, WeakConstraintRecorder};
use crate::nogood::{Lit, NoGood};
use crate::program::{Atom, Head, Program, Rule};
use crate::subst::Subst;

/// Generates the nogoods of ground rule instantiations.
#[derive(Debug, Clone, Default)]
pub struct NoGoodGenerator {
    /// Choice points and heads-to-bodies.
    pub choices: ChoiceRecorder,
    /// Weak constraint violation atoms.
    pub weak: WeakConstraintRecorder,
}

impl NoGoodGenerator {
    /// Constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nogoods of the instantiation of a rule by a ground substitution.
    ///
    /// Returns nothing if the instantiation can never fire, or if it was already processed.
    pub fn generate(
        &mut self,
        program: &Program,
        store: &mut dyn AtomStore,
        rule: &Rule,
        subst: &Subst,
    ) -> Res<Vec<NoGood>> {
        let pos = match Self::collect_pos(program, store, rule, subst)? {
            Some(pos) => pos,
            None => return Ok(vec![]),
        };
        let neg = match Self::collect_neg(program, store, rule, subst)? {
            Some(neg) => neg,
            None => return Ok(vec![]),
        };

        let head = match rule.head() {
            Head::Constraint => return Ok(vec![NoGood::from_constraint(&pos, &neg)]),
            Head::Weak(weak) => {
                let (weight, level) = match (
                    subst.apply(&weak.weight).int_val(),
                    subst.apply(&weak.level).int_val(),
                ) {
                    (Some(weight), Some(level)) => (weight, level),
                    _ => bail!(ErrorKind::Unsupported(format!(
                        "weak constraint with non-integer weight or level in `{}` under {}",
                        rule, subst
                    ))),
                };
                let atom = GroundAtom::Basic(Self::ground(&weak.atom, subst)?);
                let known = store.contains(&atom);
                let id = store.put_if_absent(atom);
                if !known {
                    self.weak.add(id, weight, level)
                }
                return Ok(vec![NoGood::from_body_internal(&pos, &neg, Lit::pos(id))]);
            }
            Head::Atom(head) => Self::ground(head, subst)?,
        };

        let body_atom = GroundAtom::Rule(RuleAtom::new(rule.id(), subst.clone()));
        if store.contains(&body_atom) {
            return Ok(vec![]);
        }
        let head = store.put_if_absent(GroundAtom::Basic(head));
        let body = store.put_if_absent(body_atom);
        self.choices.add_head_to_body(head, body);

        let (head, body_lit) = (Lit::pos(head), Lit::pos(body));
        let mut res = Vec::with_capacity(pos.len() + neg.len() + 4);
        // Head holds if the body-representative does.
        res.push(NoGood::head_first(vec![head.negate(), body_lit]));
        // The body-representative holds if the body does.
        let from_body = NoGood::from_body(&pos, &neg, body_lit);
        // And only if.
        for lit in &from_body.lits()[1..] {
            res.push(NoGood::new(vec![body_lit, lit.negate()]))
        }
        res.push(from_body);
        if program.is_unique_head(rule.id()) {
            res.push(NoGood::support(head, body_lit))
        }
        if !neg.is_empty() {
            res.extend(
                self.choices
                    .choice_nogoods(store, &pos, &neg, body_lit.atom()),
            )
        }
        Ok(res)
    }

    /// Applies a substitution to an atom that must become ground.
    fn ground(atom: &Atom, subst: &Subst) -> Res<Atom> {
        let res = atom.apply(subst);
        if !res.is_ground() {
            bail!(ErrorKind::Internal(format!(
                "substitution {} does not ground `{}`",
                subst, atom
            )))
        }
        Ok(res)
    }

    /// Atoms of the positive body, `None` if some can never hold.
    ///
    /// Facts are dropped.
    fn collect_pos(
        program: &Program,
        store: &mut dyn AtomStore,
        rule: &Rule,
        subst: &Subst,
    ) -> Res<Option<Vec<AtomId>>> {
        let mut res = vec![];
        for atom in rule.pos_body() {
            let atom = Self::ground(atom, subst)?;
            if program.is_fact(&atom) {
                continue;
            }
            if !program.is_defined(&atom.pred) {
                return Ok(None);
            }
            res.push(store.put_if_absent(GroundAtom::Basic(atom)))
        }
        Ok(Some(res))
    }

    /// Atoms of the negative body, `None` if some is a fact.
    ///
    /// Atoms over predicates no rule defines are dropped.
    fn collect_neg(
        program: &Program,
        store: &mut dyn AtomStore,
        rule: &Rule,
        subst: &Subst,
    ) -> Res<Option<Vec<AtomId>>> {
        let mut res = vec![];
        for atom in rule.neg_body() {
            let atom = Self::ground(atom, subst)?;
            if program.is_fact(&atom) {
                return Ok(None);
            }
            if !program.is_defined(&atom.pred) {
                continue;
            }
            res.push(store.put_if_absent(GroundAtom::Basic(atom)))
        }
        Ok(Some(res))
    }
}
