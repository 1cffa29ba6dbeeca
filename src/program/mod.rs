//! Compiled programs: predicates, atoms, rules and their grounding information.
//!
//! A [`Program`] is built from ground facts and rule definitions ([`RuleDef`]). Building it
//! validates the rules (arities, term depth, supported literal shapes, safety) and precomputes
//! everything the grounder needs: facts by predicate, the rules defining each predicate, and the
//! grounding orders of each rule.
//!
//! Parsing is not provided, programs are built with the constructors of this module.
//!
//! ```rust
//! # use lagro::common::*;
//! # use lagro::program::{Atom, Literal, Program, RuleDef};
//! let x = term::var("X");
//! let facts = vec![Atom::of("p", vec![term::int(1)]), Atom::of("p", vec![term::int(2)])];
//! let rules = vec![RuleDef::normal(
//!     Atom::of("q", vec![x.clone()]),
//!     vec![Literal::pos(Atom::of("p", vec![x]))],
//! )];
//! let program = Program::new(facts, rules).unwrap();
//! assert_eq!(program.rules().count(), 1);
//! assert!(program.is_fact(&Atom::of("p", vec![term::int(2)])));
//! assert_eq!(
//!     program.to_string(),
//!     "p(1).\np(2).\nq(X) :- p(X).\n"
//! );
//! ```

use hashconsing::{HConsed, HashConsign};

use crate::common::*;
use crate::subst::{self, unify, Subst};

pub mod literal;
pub mod order;

pub use self::literal::{CmpOp, ExternalFn, FixedLit, Literal};
pub use self::order::{GroundingInfo, GroundingOrder};

/// Initial capacity of the predicate factory.
const PRED_CAPA: usize = 100;

hashconsing::consign! {
    /// Predicate factory.
    let factory = consign(PRED_CAPA) for RPred;
}

/// A predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RPred {
    /// Name.
    pub name: String,
    /// Arity.
    pub arity: usize,
    /// True for predicates introduced by program transformations or the grounder.
    pub internal: bool,
    /// True for predicates only the solver reasons about.
    pub solver_internal: bool,
}
impl_fmt! {
    RPred(self, fmt) {
        write!(fmt, "{}/{}", self.name, self.arity)
    }
}

/// Hashconsed predicate.
pub type Pred = HConsed<RPred>;

/// Creates an ordinary predicate.
pub fn pred<S: Into<String>>(name: S, arity: usize) -> Pred {
    factory.mk(RPred {
        name: name.into(),
        arity,
        internal: false,
        solver_internal: false,
    })
}
/// Creates an internal predicate.
pub fn internal_pred<S: Into<String>>(name: S, arity: usize) -> Pred {
    factory.mk(RPred {
        name: name.into(),
        arity,
        internal: true,
        solver_internal: false,
    })
}
/// Creates a solver-internal predicate.
pub fn solver_internal_pred<S: Into<String>>(name: S, arity: usize) -> Pred {
    factory.mk(RPred {
        name: name.into(),
        arity,
        internal: true,
        solver_internal: true,
    })
}

/// Predicate of body-representative atoms.
pub fn rule_atom_pred() -> Pred {
    solver_internal_pred("_R_", 2)
}
/// Predicate of choice enablers.
pub fn choice_on_pred() -> Pred {
    solver_internal_pred("ChoiceOn", 1)
}
/// Predicate of choice disablers.
pub fn choice_off_pred() -> Pred {
    solver_internal_pred("ChoiceOff", 1)
}
/// Predicate of weak constraint violations.
pub fn weak_pred() -> Pred {
    solver_internal_pred("_weakconstraint_", 3)
}

/// An atom: a predicate applied to terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// Predicate.
    pub pred: Pred,
    /// Arguments.
    pub args: Vec<Term>,
}

impl Atom {
    /// Constructor, checks the arity.
    pub fn new(pred: Pred, args: Vec<Term>) -> Res<Self> {
        if pred.arity != args.len() {
            bail!(ErrorKind::ArityMismatch(
                pred.name.clone(),
                pred.arity,
                args.len()
            ))
        }
        Ok(Atom { pred, args })
    }

    /// Atom over an ordinary predicate whose arity is the number of arguments.
    pub fn of<S: Into<String>>(name: S, args: Vec<Term>) -> Self {
        let pred = pred(name, args.len());
        Atom { pred, args }
    }

    /// True if all the arguments are ground.
    pub fn is_ground(&self) -> bool {
        self.args.iter().all(|arg| arg.is_ground())
    }

    /// Variables of the atom.
    pub fn vars(&self) -> VarSet {
        let mut set = VarSet::new();
        for arg in &self.args {
            arg.add_vars(&mut set)
        }
        set
    }

    /// Variables matching the atom against a ground instance binds, those outside of arithmetic.
    pub fn binding_vars(&self) -> VarSet {
        let mut set = VarSet::new();
        for arg in &self.args {
            arg.add_matchable_vars(&mut set)
        }
        set
    }

    /// Applies a substitution.
    pub fn apply(&self, subst: &Subst) -> Atom {
        Atom {
            pred: self.pred.clone(),
            args: subst.apply_all(&self.args),
        }
    }

    /// Specializes the atom against an instance of its predicate.
    pub fn specialize<'a>(&self, instance: &Instance, subst: &'a Subst) -> Option<Cow<'a, Subst>> {
        subst::specialize(&self.args, &instance.args, subst)
    }

    /// Instance corresponding to the arguments of the atom.
    pub fn to_instance(&self) -> Instance {
        Instance::new(self.args.clone())
    }

    /// Renames the variables of the atom apart with some suffix.
    pub fn rename(&self, suffix: &str) -> Atom {
        Atom {
            pred: self.pred.clone(),
            args: self
                .args
                .iter()
                .map(|arg| unify::rename(arg, suffix))
                .collect(),
        }
    }
}

impl_fmt! {
    Atom(self, fmt) {
        fmt.write_str(&self.pred.name)?;
        if !self.args.is_empty() {
            fmt.write_str("(")?;
            write_sep(fmt, ",", &self.args)?;
            fmt.write_str(")")?
        }
        Ok(())
    }
}

/// A ground tuple, stored in working memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instance {
    /// Arguments.
    pub args: Vec<Term>,
}
impl Instance {
    /// Constructor.
    pub fn new(args: Vec<Term>) -> Self {
        Instance { args }
    }
    /// Length of the tuple.
    pub fn len(&self) -> usize {
        self.args.len()
    }
    /// True for the empty tuple.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}
impl_fmt! {
    Instance(self, fmt) {
        fmt.write_str("(")?;
        write_sep(fmt, ",", &self.args)?;
        fmt.write_str(")")
    }
}

/// Head of a weak constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeakHead {
    /// Weight, an integer or a variable.
    pub weight: Term,
    /// Level, an integer or a variable.
    pub level: Term,
    /// Violation atom `_weakconstraint_(weight, level, _tuple(terms))`.
    pub atom: Atom,
}

/// Rule heads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// Normal head.
    Atom(Atom),
    /// No head, constraint.
    Constraint,
    /// Weak constraint.
    Weak(WeakHead),
}
impl Head {
    /// Head atom, if any. For weak constraints, the violation atom.
    pub fn atom(&self) -> Option<&Atom> {
        match self {
            Head::Atom(atom) => Some(atom),
            Head::Weak(weak) => Some(&weak.atom),
            Head::Constraint => None,
        }
    }
    /// True for constraints.
    pub fn is_constraint(&self) -> bool {
        matches!(self, Head::Constraint)
    }
}

/// A rule definition, before compilation.
#[derive(Debug, Clone)]
pub struct RuleDef {
    /// Head.
    pub head: Head,
    /// Body.
    pub body: Vec<Literal>,
}
impl RuleDef {
    /// Normal rule.
    pub fn normal(head: Atom, body: Vec<Literal>) -> Self {
        RuleDef {
            head: Head::Atom(head),
            body,
        }
    }
    /// Constraint.
    pub fn constraint(body: Vec<Literal>) -> Self {
        RuleDef {
            head: Head::Constraint,
            body,
        }
    }
    /// Weak constraint `:~ body. [weight@level, terms]`.
    ///
    /// Fails if the weight or the level are neither integers nor variables.
    pub fn weak(weight: Term, level: Term, terms: Vec<Term>, body: Vec<Literal>) -> Res<Self> {
        for (desc, t) in [("weight", &weight), ("level", &level)] {
            if t.var().is_none() && t.int_val().is_none() {
                bail!(ErrorKind::Unsupported(format!(
                    "weak constraint with non-integer {} `{}`",
                    desc, t
                )))
            }
        }
        let atom = Atom::new(
            weak_pred(),
            vec![weight.clone(), level.clone(), term::fun("_tuple", terms)],
        )?;
        Ok(RuleDef {
            head: Head::Weak(WeakHead {
                weight,
                level,
                atom,
            }),
            body,
        })
    }
}

/// Formats a rule.
fn fmt_rule(fmt: &mut fmt::Formatter, head: &Head, body: &[Literal]) -> fmt::Result {
    match head {
        Head::Atom(atom) => {
            write!(fmt, "{}", atom)?;
            if !body.is_empty() {
                fmt.write_str(" :- ")?
            }
        }
        Head::Constraint => fmt.write_str(":- ")?,
        Head::Weak(_) => fmt.write_str(":~ ")?,
    }
    write_sep(fmt, ", ", body)?;
    fmt.write_str(".")?;
    if let Head::Weak(weak) = head {
        let terms = &weak.atom.args[2];
        write!(fmt, " [{}@{}, {}]", weak.weight, weak.level, terms)?
    }
    Ok(())
}

impl_fmt! {
    RuleDef(self, fmt) {
        fmt_rule(fmt, &self.head, &self.body)
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Identifier.
    id: RuleId,
    /// Head.
    head: Head,
    /// Body.
    body: Vec<Literal>,
    /// Variables of the rule.
    vars: VarSet,
    /// Grounding information.
    info: GroundingInfo,
}

impl Rule {
    /// Compiles a rule.
    ///
    /// Checks the head atom arity and the literals, and computes grounding information. Fails if
    /// the rule is unsafe: some variable of the head is not bound by the body, or some literal
    /// can never be evaluated.
    pub fn new(id: RuleId, def: RuleDef) -> Res<Self> {
        let RuleDef { head, body } = def;
        let mut vars = VarSet::new();
        let mut body_binding = VarSet::new();
        for lit in &body {
            lit.check()
                .chain_err(|| format!("in rule {}", RuleDef::display(&head, &body)))?;
            vars.extend(lit.vars());
            body_binding.extend(lit.binding_vars());
        }
        if let Some(atom) = head.atom() {
            for arg in &atom.args {
                term::check_depth(arg)?
            }
            let head_vars = atom.vars();
            if head_vars.iter().any(|var| !body_binding.contains(var)) {
                bail!(ErrorKind::UnsafeRule(
                    RuleDef::display(&head, &body).to_string()
                ))
            }
            vars.extend(head_vars)
        }
        let ground = vars.is_empty();
        let info = GroundingInfo::new(&RuleDef::display(&head, &body), &body, ground)?;
        Ok(Rule {
            id,
            head,
            body,
            vars,
            info,
        })
    }

    /// Identifier.
    pub fn id(&self) -> RuleId {
        self.id
    }
    /// Head.
    pub fn head(&self) -> &Head {
        &self.head
    }
    /// Body.
    pub fn body(&self) -> &[Literal] {
        &self.body
    }
    /// Literal of the body.
    pub fn literal(&self, idx: LitIdx) -> &Literal {
        &self.body[*idx]
    }
    /// Variables of the rule.
    pub fn vars(&self) -> &VarSet {
        &self.vars
    }
    /// True if the rule mentions no variable.
    pub fn is_ground(&self) -> bool {
        self.vars.is_empty()
    }
    /// True for constraints.
    pub fn is_constraint(&self) -> bool {
        self.head.is_constraint()
    }
    /// Grounding information.
    pub fn info(&self) -> &GroundingInfo {
        &self.info
    }

    /// Positive basic literals of the body.
    pub fn pos_body(&self) -> impl Iterator<Item = &Atom> {
        self.body
            .iter()
            .filter_map(|lit| lit.basic().filter(|lit| !lit.neg).map(|lit| &lit.atom))
    }
    /// Negative basic literals of the body.
    pub fn neg_body(&self) -> impl Iterator<Item = &Atom> {
        self.body
            .iter()
            .filter_map(|lit| lit.basic().filter(|lit| lit.neg).map(|lit| &lit.atom))
    }
}

impl_fmt! {
    Rule(self, fmt) {
        fmt_rule(fmt, &self.head, &self.body)
    }
}

impl RuleDef {
    /// Displayable view of a head and a body.
    fn display<'a>(head: &'a Head, body: &'a [Literal]) -> RuleDisplay<'a> {
        RuleDisplay { head, body }
    }
}
/// Displayable view of a rule.
struct RuleDisplay<'a> {
    head: &'a Head,
    body: &'a [Literal],
}
impl<'a> fmt::Display for RuleDisplay<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt_rule(fmt, self.head, self.body)
    }
}

/// A compiled program.
#[derive(Debug, Clone)]
pub struct Program {
    /// Rules.
    rules: RuleMap<Rule>,
    /// Facts, in order.
    facts: Vec<Atom>,
    /// Facts.
    fact_set: HashSet<Atom>,
    /// Facts by predicate.
    facts_by_pred: HConMap<Pred, Vec<Instance>>,
    /// Maps predicates to the rules whose head mentions them.
    defining: HConMap<Pred, Vec<RuleId>>,
    /// Predicates of the program.
    preds: HConSet<Pred>,
    /// Rules that are the unique justification of their ground heads.
    unique_heads: RuleSet,
}

impl Program {
    /// Builds a program.
    ///
    /// Facts must be ground, rules are compiled with [`Rule::new`].
    pub fn new(facts: Vec<Atom>, rules: Vec<RuleDef>) -> Res<Self> {
        let mut program = Program {
            rules: RuleMap::with_capacity(rules.len()),
            facts: Vec::with_capacity(facts.len()),
            fact_set: HashSet::with_capacity(facts.len()),
            facts_by_pred: HConMap::new(),
            defining: HConMap::new(),
            preds: HConSet::new(),
            unique_heads: RuleSet::new(),
        };
        for fact in facts {
            program.add_fact(fact)?
        }
        for rule in rules {
            program.add_rule(rule)?;
        }
        Ok(program)
    }

    /// Adds a fact.
    fn add_fact(&mut self, fact: Atom) -> Res<()> {
        if !fact.is_ground() {
            bail!(ErrorKind::Unsupported(format!("non-ground fact `{}`", fact)))
        }
        for arg in &fact.args {
            term::check_depth(arg)?
        }
        let fact = Atom {
            pred: fact.pred,
            args: Subst::new().apply_all(&fact.args),
        };
        if self.fact_set.insert(fact.clone()) {
            self.preds.insert(fact.pred.clone());
            self.facts_by_pred
                .entry(fact.pred.clone())
                .or_insert_with(Vec::new)
                .push(fact.to_instance());
            if let Some(rules) = self.defining.get(&fact.pred) {
                for rule in rules {
                    self.unique_heads.remove(rule);
                }
            }
            self.facts.push(fact)
        }
        Ok(())
    }

    /// Compiles and adds a rule.
    pub fn add_rule(&mut self, def: RuleDef) -> Res<RuleId> {
        let id = self.rules.next_index();
        let rule = Rule::new(id, def)?;
        for lit in rule.body() {
            if let Some(lit) = lit.basic() {
                self.preds.insert(lit.atom.pred.clone());
            }
        }
        if let Head::Atom(atom) = rule.head() {
            let pred = atom.pred.clone();
            self.preds.insert(pred.clone());
            let defining = self.defining.entry(pred.clone()).or_insert_with(Vec::new);
            defining.push(id);
            let unique = defining.len() == 1 && !self.facts_by_pred.contains_key(&pred) && {
                // Every variable bound by the positive body is bound by the head.
                let head_vars = atom.binding_vars();
                rule.body()
                    .iter()
                    .filter(|lit| !lit.is_neg())
                    .flat_map(|lit| lit.binding_vars())
                    .all(|var| head_vars.contains(&var))
            };
            if unique {
                self.unique_heads.insert(id);
            } else {
                for rule in defining.iter() {
                    self.unique_heads.remove(rule);
                }
            }
        }
        self.rules.push(rule);
        Ok(id)
    }

    /// Rule corresponding to an identifier.
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }
    /// Iterator over the rules.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
    /// Facts, in order.
    pub fn facts(&self) -> &[Atom] {
        &self.facts
    }
    /// Facts of a predicate.
    pub fn facts_of(&self, pred: &Pred) -> &[Instance] {
        self.facts_by_pred
            .get(pred)
            .map(|facts| facts.as_slice())
            .unwrap_or(&[])
    }
    /// True if a ground atom is a fact.
    pub fn is_fact(&self, atom: &Atom) -> bool {
        self.fact_set.contains(atom)
    }
    /// Rules whose head mentions some predicate.
    pub fn defining_rules(&self, pred: &Pred) -> &[RuleId] {
        self.defining
            .get(pred)
            .map(|rules| rules.as_slice())
            .unwrap_or(&[])
    }
    /// True if the predicate is defined by some rule.
    pub fn is_defined(&self, pred: &Pred) -> bool {
        !self.defining_rules(pred).is_empty()
    }
    /// True if a rule is the only rule deriving its ground heads.
    pub fn is_unique_head(&self, rule: RuleId) -> bool {
        self.unique_heads.contains(&rule)
    }
    /// Predicates mentioned by the facts and the rules.
    pub fn preds(&self) -> &HConSet<Pred> {
        &self.preds
    }

    /// Rules whose head unifies with some atom.
    ///
    /// Heads are renamed apart from the atom before unifying.
    pub fn rules_deriving(&self, atom: &Atom) -> Res<Vec<RuleId>> {
        let mut res = vec![];
        for id in self.defining_rules(&atom.pred) {
            let head = match self.rules[*id].head() {
                Head::Atom(head) => head.rename("_"),
                _ => continue,
            };
            if unify::unify_atoms(&head, &atom.rename("__"))?.is_some() {
                res.push(*id)
            }
        }
        Ok(res)
    }
}

impl_fmt! {
    Program(self, fmt) {
        for fact in &self.facts {
            writeln!(fmt, "{}.", fact)?
        }
        for rule in self.rules.iter() {
            writeln!(fmt, "{}", rule)?
        }
        Ok(())
    }
}

#[cfg(test)]
mod test;
