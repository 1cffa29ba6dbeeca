//! Literal instantiation.
//!
//! The [`Instantiator`] computes the substitutions extending a partial substitution so that a
//! body literal holds, and tells the binding search how to proceed. How working memory and the
//! assignment are consulted for basic literals is decided by an [`InstantiationStrategy`].

use crate::assignment::Assignment;
use crate::atoms::{AtomStore, GroundAtom};
use crate::common::*;
use crate::grounder::memory::WorkingMemory;
use crate::program::literal::{BasicLit, EnumLit, FixedLit, Literal};
use crate::program::{Atom, Program};
use crate::subst::Subst;

/// Status of a ground atom with respect to the current assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentStatus {
    /// True, or a fact.
    True,
    /// False.
    False,
    /// Not assigned yet.
    Unassigned,
}
impl_fmt! {
    AssignmentStatus(self, fmt) {
        fmt.write_str(match self {
            AssignmentStatus::True => "true",
            AssignmentStatus::False => "false",
            AssignmentStatus::Unassigned => "unassigned",
        })
    }
}

/// Everything the instantiation of a literal reads.
pub struct Context<'a> {
    /// Working memory.
    pub memory: &'a WorkingMemory,
    /// Program.
    pub program: &'a Program,
    /// Atom store.
    pub store: &'a dyn AtomStore,
    /// Current assignment, `None` when grounding independently of any assignment.
    pub assignment: Option<&'a dyn Assignment>,
}

/// Decides how basic literals are instantiated.
pub trait InstantiationStrategy {
    /// Status of a positive ground atom.
    fn atom_status(&mut self, ctx: &Context, atom: &Atom) -> AssignmentStatus;

    /// Status of a negated ground literal.
    fn negated_status(&mut self, ctx: &Context, lit: &BasicLit) -> AssignmentStatus;

    /// True if instances with some status can be used.
    fn accepts(&self, status: AssignmentStatus) -> bool;

    /// Status of a ground basic literal.
    fn ground_literal_status(&mut self, ctx: &Context, lit: &BasicLit) -> AssignmentStatus {
        if lit.neg {
            self.negated_status(ctx, lit)
        } else {
            self.atom_status(ctx, &lit.atom)
        }
    }

    /// Substitutions extending `subst` that match the atom against working memory, with their
    /// status. Only accepted statuses are returned.
    fn accepted_substitutions(
        &mut self,
        ctx: &Context,
        atom: &Atom,
        subst: &Subst,
    ) -> Vec<(Subst, AssignmentStatus)> {
        let mut res = vec![];
        let storage = match ctx.memory.get(&atom.pred) {
            Some(storage) => storage,
            None => return res,
        };
        for instance in storage.candidates(atom) {
            let specialized = match atom.specialize(instance, subst) {
                Some(specialized) => specialized.into_owned(),
                None => continue,
            };
            let status = self.atom_status(ctx, &atom.apply(&specialized));
            if self.accepts(status) {
                res.push((specialized, status))
            }
        }
        res
    }
}

/// Lazy grounding strategy.
///
/// Without an assignment, everything is true. Otherwise facts are true, and atoms have the truth
/// value the search engine gives them, unassigned if they are not known. Atoms found false or
/// unassigned are recorded as stale candidates for removal from working memory, unless the
/// accumulator is on.
#[derive(Debug, Clone, Default)]
pub struct LazyStrategy {
    /// When on, nothing is ever stale.
    accumulator: bool,
    /// Stale atoms, in order.
    stale: Vec<Atom>,
    /// Same as `stale`, for fast lookups.
    stale_set: HashSet<Atom>,
}
impl LazyStrategy {
    /// Constructor.
    pub fn new(accumulator: bool) -> Self {
        LazyStrategy {
            accumulator,
            stale: vec![],
            stale_set: HashSet::new(),
        }
    }

    /// Stale atoms collected so far, the collection is reset.
    pub fn collect_removal_candidates(&mut self) -> Vec<Atom> {
        self.stale_set.clear();
        ::std::mem::take(&mut self.stale)
    }
}

impl InstantiationStrategy for LazyStrategy {
    fn atom_status(&mut self, ctx: &Context, atom: &Atom) -> AssignmentStatus {
        let assignment = match ctx.assignment {
            Some(assignment) => assignment,
            None => return AssignmentStatus::True,
        };
        if ctx.program.is_fact(atom) {
            return AssignmentStatus::True;
        }
        let status = match ctx.store.id_of(&GroundAtom::Basic(atom.clone())) {
            Some(id) => match assignment.truth(id) {
                Some(truth) if truth.to_bool() => AssignmentStatus::True,
                Some(_) => AssignmentStatus::False,
                None => AssignmentStatus::Unassigned,
            },
            None => AssignmentStatus::Unassigned,
        };
        if status != AssignmentStatus::True
            && !self.accumulator
            && self.stale_set.insert(atom.clone())
        {
            self.stale.push(atom.clone())
        }
        status
    }

    fn negated_status(&mut self, _: &Context, _: &BasicLit) -> AssignmentStatus {
        AssignmentStatus::True
    }

    fn accepts(&self, status: AssignmentStatus) -> bool {
        match status {
            AssignmentStatus::True | AssignmentStatus::Unassigned => true,
            AssignmentStatus::False => false,
        }
    }
}

/// Result of the instantiation of a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instantiation {
    /// Binding continues with each of these substitutions.
    Continue(Vec<(Subst, AssignmentStatus)>),
    /// The literal cannot be evaluated yet, it must be pushed back.
    PushBack,
    /// No substitution for now, the literal may be pushed back if the heuristic allows it.
    MaybePushBack,
    /// No substitution, binding stops.
    Stop,
}

/// Stable indices of enumeration values, starting at 1 for each enumeration.
#[derive(Debug, Clone, Default)]
pub struct Enumerations {
    /// Maps enumeration identifiers to the indices of their values.
    map: HashMap<Term, HashMap<Term, i64>>,
}
impl Enumerations {
    /// Index of a value in an enumeration, creating it if needed.
    pub fn index(&mut self, id: &Term, value: &Term) -> i64 {
        let values = self.map.entry(id.clone()).or_insert_with(HashMap::new);
        let next = values.len() as i64 + 1;
        *values.entry(value.clone()).or_insert(next)
    }
}

/// Instantiates literals.
#[derive(Debug, Clone)]
pub struct Instantiator<Strat> {
    /// Strategy for basic literals.
    strategy: Strat,
    /// Enumeration indices.
    enums: Enumerations,
}

impl<Strat: InstantiationStrategy> Instantiator<Strat> {
    /// Constructor.
    pub fn new(strategy: Strat) -> Self {
        Instantiator {
            strategy,
            enums: Enumerations::default(),
        }
    }
    /// Strategy.
    pub fn strategy(&self) -> &Strat {
        &self.strategy
    }
    /// Strategy, mutable version.
    pub fn strategy_mut(&mut self) -> &mut Strat {
        &mut self.strategy
    }

    /// Instantiates a literal given a partial substitution.
    pub fn instantiate(
        &mut self,
        ctx: &Context,
        lit: &Literal,
        subst: &Subst,
    ) -> Res<Instantiation> {
        match lit {
            Literal::Fixed(fixed) => Self::fixed(fixed, subst),
            Literal::Enum(lit) => self.enumeration(lit, subst),
            Literal::Basic(lit) => Ok(self.basic(ctx, lit, subst)),
        }
    }

    /// Fixed interpretation literals compute their own substitutions.
    fn fixed(lit: &FixedLit, subst: &Subst) -> Res<Instantiation> {
        if !lit.can_evaluate(subst) {
            return Ok(Instantiation::PushBack);
        }
        let substs = lit.satisfying(subst)?;
        if substs.is_empty() {
            Ok(Instantiation::Stop)
        } else {
            Ok(Instantiation::Continue(
                substs
                    .into_iter()
                    .map(|subst| (subst, AssignmentStatus::True))
                    .collect(),
            ))
        }
    }

    /// Enumeration literals bind their index.
    fn enumeration(&mut self, lit: &EnumLit, subst: &Subst) -> Res<Instantiation> {
        let (id, value) = (subst.apply(&lit.id), subst.apply(&lit.value));
        if !id.is_ground() || !value.is_ground() {
            bail!(ErrorKind::Unsupported(format!(
                "enumeration of non-ground `{}` in `{}`",
                value, id
            )))
        }
        let index = term::int(self.enums.index(&id, &value));
        let index_term = subst.apply(&lit.index);
        if let Some(var) = index_term.var() {
            let subst = subst.clone().with(var.clone(), index)?;
            Ok(Instantiation::Continue(vec![(subst, AssignmentStatus::True)]))
        } else if index_term == index {
            Ok(Instantiation::Continue(vec![(
                subst.clone(),
                AssignmentStatus::True,
            )]))
        } else {
            Ok(Instantiation::Stop)
        }
    }

    /// Basic literals are looked up in working memory.
    fn basic(&mut self, ctx: &Context, lit: &BasicLit, subst: &Subst) -> Instantiation {
        let atom = lit.atom.apply(subst);
        if atom.is_ground() {
            let ground = BasicLit { atom, neg: lit.neg };
            match self.strategy.ground_literal_status(ctx, &ground) {
                AssignmentStatus::False => Instantiation::Stop,
                status => Instantiation::Continue(vec![(subst.clone(), status)]),
            }
        } else if lit.neg {
            Instantiation::MaybePushBack
        } else {
            let substs = self.strategy.accepted_substitutions(ctx, &atom, subst);
            if substs.is_empty() {
                Instantiation::MaybePushBack
            } else {
                Instantiation::Continue(substs)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assignment::{MapAssignment, ThriceTruth};
    use crate::atoms::AtomTable;
    use crate::program::{CmpOp, RuleDef};

    fn x() -> Term {
        term::var("X")
    }
    fn p(t: Term) -> Atom {
        Atom::of("p", vec![t])
    }

    /// Program with facts `p(1)`, working memory with `p(1)`, `p(2)`, `p(3)`.
    fn setup() -> (Program, WorkingMemory, AtomTable) {
        let program = Program::new(
            vec![p(term::int(1))],
            vec![RuleDef::normal(
                Atom::of("q", vec![x()]),
                vec![Literal::pos(p(x()))],
            )],
        )
        .unwrap();
        let mut memory = WorkingMemory::new();
        for i in 1..=3 {
            memory.add_atom(&p(term::int(i))).unwrap();
        }
        (program, memory, AtomTable::new())
    }

    #[test]
    fn lazy_statuses() {
        let (program, memory, mut store) = setup();
        let p2 = store.put_if_absent(GroundAtom::Basic(p(term::int(2))));
        let mut assignment = MapAssignment::new();
        assignment.assign(p2, ThriceTruth::False);

        let mut strategy = LazyStrategy::new(false);
        let ctx = Context {
            memory: &memory,
            program: &program,
            store: &store,
            assignment: Some(&assignment),
        };
        assert_eq!(strategy.atom_status(&ctx, &p(term::int(1))), AssignmentStatus::True);
        assert_eq!(strategy.atom_status(&ctx, &p(term::int(2))), AssignmentStatus::False);
        assert_eq!(
            strategy.atom_status(&ctx, &p(term::int(3))),
            AssignmentStatus::Unassigned
        );
        let neg = BasicLit {
            atom: p(term::int(2)),
            neg: true,
        };
        assert_eq!(
            strategy.ground_literal_status(&ctx, &neg),
            AssignmentStatus::True
        );

        // False instances are rejected.
        let substs = strategy.accepted_substitutions(&ctx, &p(x()), &Subst::new());
        let substs: Vec<_> = substs
            .into_iter()
            .map(|(subst, status)| format!("{} {}", subst, status))
            .collect();
        assert_eq!(substs, vec!["{X->1} true", "{X->3} unassigned"]);

        let stale: Vec<_> = strategy
            .collect_removal_candidates()
            .iter()
            .map(|atom| atom.to_string())
            .collect();
        assert_eq!(stale, vec!["p(2)", "p(3)"]);
        assert!(strategy.collect_removal_candidates().is_empty());

        // No assignment, everything is true and nothing is stale.
        let ctx = Context {
            memory: &memory,
            program: &program,
            store: &store,
            assignment: None,
        };
        assert_eq!(strategy.atom_status(&ctx, &p(term::int(2))), AssignmentStatus::True);

        // Accumulator, nothing is stale.
        let mut strategy = LazyStrategy::new(true);
        let ctx = Context {
            memory: &memory,
            program: &program,
            store: &store,
            assignment: Some(&assignment),
        };
        strategy.atom_status(&ctx, &p(term::int(2)));
        assert!(strategy.collect_removal_candidates().is_empty());
    }

    #[test]
    fn instantiation() {
        let (program, memory, store) = setup();
        let ctx = Context {
            memory: &memory,
            program: &program,
            store: &store,
            assignment: None,
        };
        let mut inst = Instantiator::new(LazyStrategy::new(false));
        let empty = Subst::new();
        let x_is_2 = Subst::new().with(Var::new("X"), term::int(2)).unwrap();

        // Comparisons.
        let lt = Literal::cmp(x(), CmpOp::Lt, term::int(3));
        assert_eq!(inst.instantiate(&ctx, &lt, &empty).unwrap(), Instantiation::PushBack);
        match inst.instantiate(&ctx, &lt, &x_is_2).unwrap() {
            Instantiation::Continue(substs) => assert_eq!(substs.len(), 1),
            res => panic!("unexpected {:?}", res),
        }
        let gt = Literal::cmp(x(), CmpOp::Gt, term::int(3));
        assert_eq!(inst.instantiate(&ctx, &gt, &x_is_2).unwrap(), Instantiation::Stop);
        let assign = Literal::cmp(x(), CmpOp::Eq, term::int(7));
        match inst.instantiate(&ctx, &assign, &empty).unwrap() {
            Instantiation::Continue(substs) => assert_eq!(substs[0].0.to_string(), "{X->7}"),
            res => panic!("unexpected {:?}", res),
        }

        // Basic literals.
        match inst.instantiate(&ctx, &Literal::pos(p(x())), &empty).unwrap() {
            Instantiation::Continue(substs) => assert_eq!(substs.len(), 3),
            res => panic!("unexpected {:?}", res),
        }
        let missing = Literal::pos(Atom::of("r", vec![x()]));
        assert_eq!(
            inst.instantiate(&ctx, &missing, &empty).unwrap(),
            Instantiation::MaybePushBack
        );
        assert_eq!(
            inst.instantiate(&ctx, &Literal::neg(p(x())), &empty).unwrap(),
            Instantiation::MaybePushBack
        );
        match inst.instantiate(&ctx, &Literal::neg(p(x())), &x_is_2).unwrap() {
            Instantiation::Continue(substs) => {
                assert_eq!(substs, vec![(x_is_2.clone(), AssignmentStatus::True)])
            }
            res => panic!("unexpected {:?}", res),
        }

        // Enumerations.
        let idx = term::var("I");
        let enumeration = Literal::enumeration(term::sym("e"), x(), idx);
        let index_of = |inst: &mut Instantiator<LazyStrategy>, val: i64| {
            let subst = Subst::new().with(Var::new("X"), term::int(val)).unwrap();
            match inst.instantiate(&ctx, &enumeration, &subst).unwrap() {
                Instantiation::Continue(substs) => {
                    substs[0].0.get(&Var::new("I")).and_then(|t| t.int_val())
                }
                _ => None,
            }
        };
        assert_eq!(index_of(&mut inst, 10), Some(1));
        assert_eq!(index_of(&mut inst, 20), Some(2));
        assert_eq!(index_of(&mut inst, 10), Some(1));
    }
}
