//! The incremental lazy grounder.
//!
//! # Rounds
//!
//! The [`NaiveGrounder`] is driven by a search engine, one round at a time:
//!
//! - [`NaiveGrounder::update_assignment`] feeds the atoms the engine decided true since the last
//!   round, they enter working memory;
//! - [`NaiveGrounder::get_nogoods`] grounds the rules that can start from the instances added to
//!   working memory since the last round, and returns the nogoods of the new ground
//!   instantiations.
//!
//! The first call to `get_nogoods` bootstraps the grounder: facts enter working memory and the
//! rules with a fixed instantiation are grounded once and for all.
//!
//! # Binding search
//!
//! A rule is grounded from a starting literal, by binding the other literals in the grounding
//! order of that literal. Literals that cannot be bound yet are pushed back to the end of the
//! order. Positive literals whose atom is not assigned yet are accepted only within the
//! *tolerance* of the rule, see [`GrounderConf`].
//!
//! # Examples
//!
//! ```rust
//! # use lagro::common::*;
//! # use lagro::grounder::NaiveGrounder;
//! # use lagro::program::{Atom, Literal, Program, RuleDef};
//! let x = term::var("X");
//! let facts = vec![Atom::of("p", vec![term::int(1)]), Atom::of("p", vec![term::int(2)])];
//! let rules = vec![RuleDef::normal(
//!     Atom::of("q", vec![x.clone()]),
//!     vec![Literal::pos(Atom::of("p", vec![x]))],
//! )];
//! let program = Program::new(facts, rules).unwrap();
//! let mut grounder = NaiveGrounder::new(program, GrounderConf::strict());
//! let nogoods = grounder.get_nogoods(None).unwrap();
//! // Head, body and support nogoods for `q(1)` and `q(2)`.
//! assert_eq!(nogoods.len(), 6);
//! // Nothing new.
//! assert!(grounder.get_nogoods(None).unwrap().is_empty());
//! ```

use crate::assignment::Assignment;
use crate::atoms::{AtomStore, AtomTable};
use crate::common::*;
use crate::nogood::{NoGood, NoGoodRegistry, NoGoodType};
use crate::program::{Atom, GroundingOrder, Pred, Program, Rule, RuleDef};
use crate::subst::Subst;

pub mod answer_set;
pub mod bridge;
pub mod choice;
pub mod instantiation;
pub mod memory;
pub mod nogoods;

#[cfg(test)]
mod test;

use self::answer_set::AnswerSet;
use self::bridge::Bridge;
use self::choice::{ChoiceMap, HeadsToBodies, WeightAtLevel};
use self::instantiation::{
    AssignmentStatus, Context, Instantiation, Instantiator, LazyStrategy,
};
use self::memory::WorkingMemory;
use self::nogoods::NoGoodGenerator;

/// Result of the binding search for a rule.
///
/// Each substitution comes with the number of positive literals it binds that were still
/// unassigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingResult {
    /// Substitutions binding all the variables of the rule.
    pub substs: Vec<Subst>,
    /// Number of unassigned literals of each substitution.
    pub unassigned: Vec<usize>,
}
impl BindingResult {
    /// Empty result.
    pub fn new() -> Self {
        Self::default()
    }
    /// Result with a single substitution.
    pub fn singleton(subst: Subst, unassigned: usize) -> Self {
        BindingResult {
            substs: vec![subst],
            unassigned: vec![unassigned],
        }
    }
    /// Number of substitutions.
    pub fn len(&self) -> usize {
        self.substs.len()
    }
    /// True if there are no substitutions.
    pub fn is_empty(&self) -> bool {
        self.substs.is_empty()
    }
    /// Appends another result.
    pub fn extend(&mut self, other: BindingResult) {
        self.substs.extend(other.substs);
        self.unassigned.extend(other.unassigned)
    }
    /// Iterator over the substitutions and their number of unassigned literals.
    pub fn iter(&self) -> impl Iterator<Item = (&Subst, usize)> {
        self.substs.iter().zip(self.unassigned.iter().cloned())
    }
}

/// Binding search over the body of a rule.
struct BindingSearch<'a> {
    /// Literal instantiator.
    instantiator: &'a mut Instantiator<LazyStrategy>,
    /// Instantiation context.
    ctx: Context<'a>,
    /// Rule being grounded.
    rule: &'a Rule,
}

impl<'a> BindingSearch<'a> {
    /// Binds the literal at position `pos` of `order`, and then the next ones.
    ///
    /// `orig` is the tolerance of the rule, `rem` what remains of it.
    fn bind(
        &mut self,
        order: &GroundingOrder,
        pos: usize,
        orig: i64,
        rem: i64,
        subst: &Subst,
    ) -> Res<BindingResult> {
        let idx = match order.literal_at(pos) {
            Some(idx) => idx,
            None => {
                log! { @debug "  binding complete: {}", subst }
                return Ok(BindingResult::singleton(subst.clone(), (orig - rem) as usize));
            }
        };
        let rule = self.rule;
        let lit = rule.literal(idx);
        log! { @debug "  binding `{}` at {} under {}", lit, pos, subst }

        match self.instantiator.instantiate(&self.ctx, lit, subst)? {
            Instantiation::Continue(substs) => {
                let next = order.consider_until_current_end();
                let mut res = BindingResult::new();
                for (subst, status) in substs {
                    let rem = match status {
                        AssignmentStatus::True => rem,
                        AssignmentStatus::Unassigned => {
                            if rem < 1 {
                                log! { @debug "  tolerance exhausted on `{}`", lit }
                                continue;
                            }
                            rem - 1
                        }
                        AssignmentStatus::False => bail!(ErrorKind::Internal(format!(
                            "instantiation of `{}` yielded a false substitution {}",
                            lit, subst
                        ))),
                    };
                    res.extend(self.bind(&next, pos + 1, orig, rem, &subst)?)
                }
                Ok(res)
            }
            Instantiation::PushBack => self.push_back(order, pos, orig, rem, subst),
            Instantiation::MaybePushBack => {
                if orig > 0 {
                    self.push_back(order, pos, orig, rem, subst)
                } else {
                    Ok(BindingResult::new())
                }
            }
            Instantiation::Stop => Ok(BindingResult::new()),
        }
    }

    /// Pushes back the literal at some position, and keeps binding.
    fn push_back(
        &mut self,
        order: &GroundingOrder,
        pos: usize,
        orig: i64,
        rem: i64,
        subst: &Subst,
    ) -> Res<BindingResult> {
        match order.push_back(pos) {
            Some(order) => {
                log! { @debug "  pushed back: {}", order.to_string_info(self.rule.body()) }
                self.bind(&order, pos + 1, orig, rem, subst)
            }
            None => Ok(BindingResult::new()),
        }
    }
}

/// Filter on the predicates reported in answer sets.
pub type PredFilter = Box<dyn Fn(&Pred) -> bool>;

/// The lazy grounder.
pub struct NaiveGrounder {
    /// Program, grows with the rules bridges yield.
    program: Program,
    /// Atom store.
    store: AtomTable,
    /// Working memory.
    memory: WorkingMemory,
    /// Literal instantiator.
    instantiator: Instantiator<LazyStrategy>,
    /// NoGood generator, with the choice and weak constraint recorders.
    generator: NoGoodGenerator,
    /// NoGood registry.
    registry: NoGoodRegistry,
    /// Heuristics configuration.
    conf: GrounderConf,
    /// Maps predicates to the rules and starting literals they can start from.
    registered: HConMap<Pred, Vec<(RuleId, LitIdx)>>,
    /// Rules with a fixed instantiation.
    fixed: Vec<RuleId>,
    /// True once bootstrapped.
    bootstrapped: bool,
    /// Bridges.
    bridges: Vec<Box<dyn Bridge>>,
    /// Rules yielded by bridges so far.
    bridge_rules: HashSet<String>,
    /// Filter on the predicates of answer sets.
    filter: Option<PredFilter>,
    /// Profiler.
    _profiler: Profiler,
}

impl NaiveGrounder {
    /// Creates a grounder for a program.
    pub fn new(program: Program, gconf: GrounderConf) -> Self {
        let mut registered: HConMap<Pred, Vec<(RuleId, LitIdx)>> = HConMap::new();
        let mut fixed = vec![];
        for rule in program.rules() {
            if rule.info().is_fixed() {
                fixed.push(rule.id());
                continue;
            }
            for start in rule.info().starting_literals() {
                if let Some(lit) = rule.literal(*start).basic() {
                    registered
                        .entry(lit.atom.pred.clone())
                        .or_insert_with(Vec::new)
                        .push((rule.id(), *start))
                }
            }
        }
        NaiveGrounder {
            program,
            store: AtomTable::new(),
            memory: WorkingMemory::new(),
            instantiator: Instantiator::new(LazyStrategy::new(gconf.accumulator)),
            generator: NoGoodGenerator::new(),
            registry: NoGoodRegistry::new(),
            conf: gconf,
            registered,
            fixed,
            bootstrapped: false,
            bridges: vec![],
            bridge_rules: HashSet::new(),
            filter: None,
            _profiler: Profiler::new(),
        }
    }

    /// Adds a bridge.
    pub fn with_bridge<B: Bridge + 'static>(mut self, bridge: B) -> Self {
        self.bridges.push(Box::new(bridge));
        self
    }
    /// Sets the filter on the predicates of answer sets.
    pub fn with_filter<F: Fn(&Pred) -> bool + 'static>(mut self, filter: F) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Program.
    pub fn program(&self) -> &Program {
        &self.program
    }
    /// Rule corresponding to an identifier.
    pub fn rule(&self, id: RuleId) -> &Rule {
        self.program.rule(id)
    }
    /// True if a ground atom is a fact.
    pub fn is_fact(&self, atom: &Atom) -> bool {
        self.program.is_fact(atom)
    }
    /// Rules whose head unifies with some atom.
    pub fn rules_deriving(&self, atom: &Atom) -> Res<Vec<RuleId>> {
        self.program.rules_deriving(atom)
    }
    /// Atom store.
    pub fn atoms(&self) -> &AtomTable {
        &self.store
    }
    /// Working memory.
    pub fn memory(&self) -> &WorkingMemory {
        &self.memory
    }
    /// Heuristics configuration.
    pub fn conf(&self) -> &GrounderConf {
        &self.conf
    }
    /// Profiler, consumes the grounder.
    pub fn into_profiler(self) -> Profiler {
        self._profiler
    }

    /// Registers a nogood the search engine derived, returns its identifier.
    pub fn register(&mut self, nogood: NoGood) -> NoGoodId {
        self.registry.register(nogood)
    }

    /// Enablers and disablers of the choice points created since the last call.
    pub fn get_choice_atoms(&mut self) -> (ChoiceMap, ChoiceMap) {
        self.generator.choices.get_and_reset_choices()
    }
    /// Heads to bodies information created since the last call.
    pub fn get_heads_to_bodies(&mut self) -> HeadsToBodies {
        self.generator.choices.get_and_reset_heads_to_bodies()
    }
    /// Weak constraint violation atoms created since the last call.
    pub fn get_weak_constraints(&mut self) -> BTreeMap<AtomId, WeightAtLevel> {
        self.generator.weak.get_and_reset()
    }

    /// Adds the atoms the search engine decided true to working memory.
    pub fn update_assignment<I>(&mut self, atoms: I) -> Res<()>
    where
        I: IntoIterator<Item = AtomId>,
    {
        for id in atoms {
            let atom = match self.store.get(id) {
                Some(atom) => atom.to_atom(),
                None => bail!(ErrorKind::Internal(format!(
                    "assignment update on unknown atom {}",
                    id
                ))),
            };
            log! { @debug "  {} is true", atom }
            self.memory.add_atom(&atom)?;
        }
        Ok(())
    }

    /// Nogoods of the new ground instantiations.
    ///
    /// Bootstraps the grounder on the first call. When no assignment is given, everything in
    /// working memory is considered true.
    pub fn get_nogoods(
        &mut self,
        mut assignment: Option<&mut dyn Assignment>,
    ) -> Res<BTreeMap<NoGoodId, NoGood>> {
        profile! { self tick "get_nogoods" }
        let mut new = BTreeMap::new();

        if !self.bootstrapped {
            self.bootstrap(&mut new)?
        }
        self.ground_bridges(assignment.as_deref(), &mut new)?;

        let modified = self.memory.modified().to_vec();
        log! { @verb "{} modified storage(s)", modified.len() }
        for pred in &modified {
            if pred.solver_internal {
                continue;
            }
            let starts = match self.registered.get(pred) {
                Some(starts) => starts.clone(),
                None => continue,
            };
            let recent = match self.memory.get(pred) {
                Some(storage) => storage.recently_added().to_vec(),
                None => continue,
            };
            log! { @verb "  {}: {} new instance(s)", pred, recent.len() }

            for (rule, start) in starts {
                let (atom, order) = {
                    let rule = self.program.rule(rule);
                    match (rule.literal(start).basic(), rule.info().order_from(start)) {
                        (Some(lit), Some(order)) => (lit.atom.clone(), order.clone()),
                        _ => bail!(ErrorKind::Internal(format!(
                            "no grounding order for `{}` starting from literal {}",
                            rule, start
                        ))),
                    }
                };
                let empty = Subst::new();
                for instance in &recent {
                    let subst = match atom.specialize(instance, &empty) {
                        Some(subst) => subst.into_owned(),
                        None => continue,
                    };
                    let nogoods = self.ground_rule(rule, &order, &subst, assignment.as_deref())?;
                    self.registry.register_all(nogoods, &mut new)
                }
            }
        }

        for pred in &modified {
            if let Some(storage) = self.memory.get_mut(pred) {
                storage.mark_done()
            }
        }
        self.memory.reset();
        self.remove_stale()?;

        if let (Some(assignment), Some(max)) = (assignment.as_deref_mut(), self.store.max_atom_id())
        {
            assignment.grow_for_max_atom_id(max)
        }

        log! { @info "{} new nogood(s)", new.len() }
        if_log! { @debug
            for (id, nogood) in &new {
                log! { @debug "  {}: {} {}", id, nogood.typ(), self.store.nogood_to_string(nogood) }
            }
        }
        if self.conf.debug_checks {
            self.check_nogood_types(&new)?
        }
        profile! { self "nogoods" => add new.len() }
        profile! { self mark "get_nogoods" }
        Ok(new)
    }

    /// Loads the facts and grounds the rules with a fixed instantiation.
    fn bootstrap(&mut self, new: &mut BTreeMap<NoGoodId, NoGood>) -> Res<()> {
        log! { @info "bootstrapping" }
        for pred in self.program.preds().iter() {
            self.memory.initialize(pred)
        }
        for fact in self.program.facts() {
            self.memory.add_atom(fact)?;
        }
        let empty = Subst::new();
        for rule in self.fixed.clone() {
            let order = self.fixed_order(rule)?;
            let nogoods = self.ground_rule(rule, &order, &empty, None)?;
            self.registry.register_all(nogoods, new)
        }
        self.bootstrapped = true;
        Ok(())
    }

    /// Grounding order of a rule with a fixed instantiation.
    fn fixed_order(&self, rule: RuleId) -> Res<GroundingOrder> {
        let rule = self.program.rule(rule);
        match rule.info().fixed_order() {
            Some(order) => Ok(order.clone()),
            None => bail!(ErrorKind::Internal(format!(
                "rule `{}` has no fixed instantiation",
                rule
            ))),
        }
    }

    /// Queries the bridges and grounds the new rules they yield.
    fn ground_bridges(
        &mut self,
        assignment: Option<&dyn Assignment>,
        new: &mut BTreeMap<NoGoodId, NoGood>,
    ) -> Res<()> {
        let mut defs: Vec<RuleDef> = vec![];
        for bridge in self.bridges.iter_mut() {
            defs.extend(bridge.rules(assignment, &self.store)?)
        }
        let empty = Subst::new();
        for def in defs {
            if !self.bridge_rules.insert(def.to_string()) {
                continue;
            }
            log! { @verb "  bridge rule {}", def }
            let rule = self.program.add_rule(def)?;
            if !self.program.rule(rule).is_ground() {
                bail!(ErrorKind::Unsupported(format!(
                    "non-ground bridge rule `{}`",
                    self.program.rule(rule)
                )))
            }
            let order = self.fixed_order(rule)?;
            let nogoods = self.ground_rule(rule, &order, &empty, None)?;
            self.registry.register_all(nogoods, new)
        }
        Ok(())
    }

    /// Removes the stale instances from working memory.
    fn remove_stale(&mut self) -> Res<()> {
        for atom in self.instantiator.strategy_mut().collect_removal_candidates() {
            if let Some(storage) = self.memory.get_mut(&atom.pred) {
                let instance = atom.to_instance();
                if storage.contains(&instance) {
                    log! { @debug "  removing stale {}", atom }
                    storage.remove(&instance)?;
                }
            }
        }
        Ok(())
    }

    /// Grounds a rule from a grounding order and a partial substitution, and generates the
    /// nogoods of the resulting instantiations.
    fn ground_rule(
        &mut self,
        rule: RuleId,
        order: &GroundingOrder,
        subst: &Subst,
        assignment: Option<&dyn Assignment>,
    ) -> Res<Vec<NoGood>> {
        profile! { self tick "get_nogoods", "binding" }
        let bindings = self.ground_instantiations(rule, order, subst, assignment);
        profile! { self mark "get_nogoods", "binding" }
        let bindings = bindings?;

        let rule = self.program.rule(rule);
        let mut res = vec![];
        for (subst, unassigned) in bindings.iter() {
            if self.conf.debug_checks && !subst.binds_all(rule.vars()) {
                bail!(ErrorKind::Internal(format!(
                    "substitution {} does not bind all the variables of `{}`",
                    subst, rule
                )))
            }
            log! { @debug "  instantiating `{}` with {} ({} unassigned)", rule, subst, unassigned }
            res.extend(
                self.generator
                    .generate(&self.program, &mut self.store, rule, subst)?,
            )
        }
        Ok(res)
    }

    /// Ground substitutions of a rule, from a grounding order and a partial substitution.
    ///
    /// The tolerance is the one of the configuration for this kind of rule.
    pub fn ground_instantiations(
        &mut self,
        rule: RuleId,
        order: &GroundingOrder,
        subst: &Subst,
        assignment: Option<&dyn Assignment>,
    ) -> Res<BindingResult> {
        let rule = self.program.rule(rule);
        let tolerance = self.conf.tolerance(rule.is_constraint());
        let mut search = BindingSearch {
            instantiator: &mut self.instantiator,
            ctx: Context {
                memory: &self.memory,
                program: &self.program,
                store: &self.store,
                assignment,
            },
            rule,
        };
        search.bind(order, 0, tolerance, tolerance, subst)
    }

    /// Fails if a nogood that is not internal mentions a solver-internal atom other than a
    /// body-representative.
    pub fn check_nogood_types(&self, nogoods: &BTreeMap<NoGoodId, NoGood>) -> Res<()> {
        for nogood in nogoods.values() {
            if nogood.typ() == NoGoodType::Internal {
                continue;
            }
            for lit in nogood.lits() {
                let atom = match self.store.get(lit.atom()) {
                    Some(atom) => atom,
                    None => bail!(ErrorKind::Internal(format!(
                        "nogood {} mentions unknown atom {}",
                        nogood,
                        lit.atom()
                    ))),
                };
                if atom.pred().solver_internal && !atom.is_rule_atom() {
                    bail!(ErrorKind::Internal(format!(
                        "{} nogood {} mentions solver-internal atom {}",
                        nogood.typ(),
                        self.store.nogood_to_string(nogood),
                        atom
                    )))
                }
            }
        }
        Ok(())
    }

    /// Answer set corresponding to some true atoms.
    ///
    /// Internal atoms are dropped, facts are added. Only the predicates accepted by the filter
    /// are reported, if any.
    pub fn assignment_to_answer_set<I>(&self, true_atoms: I) -> AnswerSet
    where
        I: IntoIterator<Item = AtomId>,
    {
        let mut res = AnswerSet::new();
        let keep = |atom: &Atom| {
            !atom.pred.internal && self.filter.as_ref().map(|f| f(&atom.pred)).unwrap_or(true)
        };
        for id in true_atoms {
            if let Some(atom) = self.store.get(id).and_then(|atom| atom.basic()) {
                if keep(atom) {
                    res.add(atom);
                }
            }
        }
        for fact in self.program.facts() {
            if keep(fact) {
                res.add(fact);
            }
        }
        res
    }
}
