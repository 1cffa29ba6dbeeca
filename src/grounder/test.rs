//! Tests for the grounder.

use super::*;
use crate::assignment::{MapAssignment, ThriceTruth};
use crate::atoms::GroundAtom;
use crate::nogood::Lit;
use crate::program::Literal;

fn x() -> Term {
    term::var("X")
}
fn y() -> Term {
    term::var("Y")
}
fn atom(name: &str, args: Vec<Term>) -> Atom {
    Atom::of(name, args)
}
fn one(name: &str, i: i64) -> Atom {
    atom(name, vec![term::int(i)])
}

/// `a(1). c(X) :- a(X), b(X). b(X) :- e(X).`
fn lazy_program() -> Program {
    Program::new(
        vec![one("a", 1)],
        vec![
            RuleDef::normal(
                atom("c", vec![x()]),
                vec![
                    Literal::pos(atom("a", vec![x()])),
                    Literal::pos(atom("b", vec![x()])),
                ],
            ),
            RuleDef::normal(
                atom("b", vec![x()]),
                vec![Literal::pos(atom("e", vec![x()]))],
            ),
        ],
    )
    .unwrap()
}

/// `p(1). p(2). q(X) :- p(X).`
fn facts_program() -> Program {
    Program::new(
        vec![one("p", 1), one("p", 2)],
        vec![RuleDef::normal(
            atom("q", vec![x()]),
            vec![Literal::pos(atom("p", vec![x()]))],
        )],
    )
    .unwrap()
}

fn order_from(grounder: &NaiveGrounder, rule: usize, lit: usize) -> GroundingOrder {
    grounder
        .rule(RuleId::new(rule))
        .info()
        .order_from(LitIdx::new(lit))
        .unwrap()
        .clone()
}

fn x_is(i: i64) -> Subst {
    Subst::new().with(Var::new("X"), term::int(i)).unwrap()
}

#[test]
fn tolerance() {
    let b1 = one("b", 1);
    let run = |gconf: GrounderConf, truth: Option<ThriceTruth>| {
        let mut grounder = NaiveGrounder::new(lazy_program(), gconf);
        let id = grounder.store.put_if_absent(GroundAtom::Basic(b1.clone()));
        let mut assignment = MapAssignment::new();
        if let Some(truth) = truth {
            assignment.assign(id, truth);
        }
        let order = order_from(&grounder, 0, 0);
        grounder
            .ground_instantiations(RuleId::new(0), &order, &x_is(1), Some(&assignment))
            .unwrap()
    };

    // `b(1)` unassigned.
    assert!(run(GrounderConf::strict(), None).is_empty());
    assert!(run(GrounderConf::with_tolerances(1, 0), None).is_empty());
    let res = run(GrounderConf::with_tolerances(0, 1), None);
    assert_eq!(res, BindingResult::singleton(x_is(1), 1));
    let res = run(GrounderConf::permissive(), None);
    assert_eq!(res.unassigned, vec![1]);

    // `b(1)` true.
    let res = run(GrounderConf::strict(), Some(ThriceTruth::MustBeTrue));
    assert_eq!(res, BindingResult::singleton(x_is(1), 0));

    // `b(1)` false.
    assert!(run(GrounderConf::permissive(), Some(ThriceTruth::False)).is_empty());
}

#[test]
fn push_back() {
    // r(X, Y) :- p(X), q(Y), t(X, Y).
    let program = Program::new(
        vec![],
        vec![RuleDef::normal(
            atom("r", vec![x(), y()]),
            vec![
                Literal::pos(atom("p", vec![x()])),
                Literal::pos(atom("q", vec![y()])),
                Literal::pos(atom("t", vec![x(), y()])),
            ],
        )],
    )
    .unwrap();
    let run = |gconf: GrounderConf| {
        let mut grounder = NaiveGrounder::new(program.clone(), gconf);
        grounder.memory.add_atom(&one("q", 5)).unwrap();
        let order = order_from(&grounder, 0, 0);
        // `t` shares a variable with `p`, it comes first.
        assert_eq!(order.literal_at(0), Some(LitIdx::new(2)));
        grounder
            .ground_instantiations(RuleId::new(0), &order, &x_is(1), None)
            .unwrap()
    };

    // `t(1, Y)` has no instances, it can only be pushed back when the heuristic allows it.
    assert!(run(GrounderConf::strict()).is_empty());
    let res = run(GrounderConf::permissive());
    assert_eq!(res.len(), 1);
    assert_eq!(res.substs[0].to_string(), "{X->1,Y->5}");
    assert_eq!(res.unassigned, vec![0]);
}

#[test]
fn stale_instances() {
    let b1 = one("b", 1);
    let run = |gconf: GrounderConf| {
        let mut grounder = NaiveGrounder::new(lazy_program(), gconf);
        grounder.memory.add_atom(&b1).unwrap();
        let mut assignment = MapAssignment::new();
        let new = grounder.get_nogoods(Some(&mut assignment)).unwrap();
        // Starting from `b(1)`, `a(1)` is a fact.
        assert!(!new.is_empty());
        assert_eq!(assignment.max_atom_id(), grounder.atoms().max_atom_id());
        grounder
            .memory()
            .get(&b1.pred)
            .unwrap()
            .contains(&b1.to_instance())
    };
    // Starting from `a(1)`, `b(1)` is unassigned and becomes stale.
    assert!(!run(GrounderConf::strict()));
    assert!(run(GrounderConf::strict().accumulator(true)));
}

#[test]
fn lazy_rounds() {
    let mut grounder = NaiveGrounder::new(lazy_program(), GrounderConf::strict());
    let mut assignment = MapAssignment::new();
    // `b` only comes from `e`, which has no instance.
    assert!(grounder.get_nogoods(Some(&mut assignment)).unwrap().is_empty());

    // The search engine learns about `b(1)` through some other mean.
    let b1 = grounder.store.put_if_absent(GroundAtom::Basic(one("b", 1)));
    assignment.assign(b1, ThriceTruth::True);
    grounder.update_assignment(vec![b1]).unwrap();
    let new = grounder.get_nogoods(Some(&mut assignment)).unwrap();
    let strings: Vec<_> = new
        .values()
        .map(|nogood| grounder.atoms().nogood_to_string(nogood))
        .collect();
    let r = "_R_(\"0\",\"{X->1}\")";
    assert_eq!(
        strings,
        vec![
            format!("*{{ -c(1) +{} }}", r),
            format!("{{ -b(1) +{} }}", r),
            format!("*{{ -{} +b(1) }}", r),
            format!("{{ +c(1) -{} }}", r),
        ]
    );
    let heads = grounder.get_heads_to_bodies();
    assert_eq!(heads.len(), 1);
    assert!(grounder.get_heads_to_bodies().is_empty());

    // Nothing new.
    assert!(grounder.get_nogoods(Some(&mut assignment)).unwrap().is_empty());
}

#[test]
fn update_assignment() {
    let mut grounder = NaiveGrounder::new(facts_program(), GrounderConf::strict());
    let err = grounder
        .update_assignment(vec![AtomId::new(7)])
        .unwrap_err();
    assert!(err.is_internal());

    let q3 = one("q", 3);
    let id = grounder.store.put_if_absent(GroundAtom::Basic(q3.clone()));
    grounder.update_assignment(vec![id]).unwrap();
    assert!(grounder.memory().modified().contains(&q3.pred));
    assert!(grounder
        .memory()
        .get(&q3.pred)
        .unwrap()
        .contains(&q3.to_instance()));
}

#[test]
fn nogood_types() {
    let mut grounder = NaiveGrounder::new(facts_program(), GrounderConf::strict());
    let on = grounder.store.put_if_absent(GroundAtom::ChoiceOn(0));
    let p = grounder.store.put_if_absent(GroundAtom::Basic(one("p", 7)));

    let mut nogoods = BTreeMap::new();
    nogoods.insert(
        NoGoodId::new(0),
        NoGood::head_first_internal(vec![Lit::neg(on), Lit::pos(p)]),
    );
    grounder.check_nogood_types(&nogoods).unwrap();

    nogoods.insert(NoGoodId::new(1), NoGood::new(vec![Lit::pos(on), Lit::pos(p)]));
    assert!(grounder.check_nogood_types(&nogoods).unwrap_err().is_internal());

    let mut nogoods = BTreeMap::new();
    nogoods.insert(NoGoodId::new(0), NoGood::new(vec![Lit::pos(AtomId::new(42))]));
    assert!(grounder.check_nogood_types(&nogoods).unwrap_err().is_internal());
}

/// Yields the same rule on every call.
struct Repeat(RuleDef);
impl Bridge for Repeat {
    fn rules(&mut self, _: Option<&dyn Assignment>, _: &dyn AtomStore) -> Res<Vec<RuleDef>> {
        Ok(vec![self.0.clone()])
    }
}

#[test]
fn bridges() {
    // g :- not h.
    let rule = RuleDef::normal(atom("g", vec![]), vec![Literal::neg(atom("h", vec![]))]);
    let program = Program::new(vec![one("p", 1)], vec![]).unwrap();
    let mut grounder =
        NaiveGrounder::new(program, GrounderConf::strict()).with_bridge(Repeat(rule.clone()));

    let new = grounder.get_nogoods(None).unwrap();
    let strings: Vec<_> = new
        .values()
        .map(|nogood| grounder.atoms().nogood_to_string(nogood))
        .collect();
    let r = "_R_(\"0\",\"{}\")";
    assert_eq!(
        strings,
        vec![
            format!("*{{ -g +{} }}", r),
            format!("*{{ -{} }}", r),
            format!("{{ +g -{} }}", r),
        ]
    );
    // Yielded again, compiled once.
    assert!(grounder.get_nogoods(None).unwrap().is_empty());
    assert_eq!(grounder.program().rules().count(), 1);

    // Static bridges yield once.
    let program = Program::new(vec![], vec![]).unwrap();
    let mut grounder = NaiveGrounder::new(program, GrounderConf::strict())
        .with_bridge(bridge::StaticBridge::new(vec![rule]));
    assert_eq!(grounder.get_nogoods(None).unwrap().len(), 3);
    assert!(grounder.get_nogoods(None).unwrap().is_empty());

    // Non-ground bridge rules are not supported.
    let rule = RuleDef::normal(
        atom("q", vec![x()]),
        vec![Literal::pos(atom("p", vec![x()]))],
    );
    let program = Program::new(vec![], vec![]).unwrap();
    let mut grounder =
        NaiveGrounder::new(program, GrounderConf::strict()).with_bridge(Repeat(rule));
    assert!(grounder.get_nogoods(None).unwrap_err().is_unsupported());
}

#[test]
fn answer_sets() {
    let run = |grounder: &mut NaiveGrounder| {
        grounder.get_nogoods(None).unwrap();
        let q1 = grounder
            .atoms()
            .id_of(&GroundAtom::Basic(one("q", 1)))
            .unwrap();
        // Body-representatives are never reported.
        let body = grounder
            .atoms()
            .iter()
            .find(|(_, atom)| atom.is_rule_atom())
            .map(|(id, _)| id)
            .unwrap();
        grounder
            .assignment_to_answer_set(vec![q1, body])
            .to_string()
    };

    let mut grounder = NaiveGrounder::new(facts_program(), GrounderConf::strict());
    assert_eq!(run(&mut grounder), "{ p(1), p(2), q(1) }");

    let mut grounder = NaiveGrounder::new(facts_program(), GrounderConf::strict())
        .with_filter(|pred: &Pred| pred.name == "q");
    assert_eq!(run(&mut grounder), "{ q(1) }");
}

#[test]
fn registration() {
    let mut grounder = NaiveGrounder::new(facts_program(), GrounderConf::strict());
    let new = grounder.get_nogoods(None).unwrap();
    let (q1, body) = {
        let store = grounder.atoms();
        let q1 = store.id_of(&GroundAtom::Basic(one("q", 1))).unwrap();
        let body = store
            .id_of(&GroundAtom::Rule(crate::atoms::RuleAtom::new(
                RuleId::new(0),
                x_is(1),
            )))
            .unwrap();
        (q1, body)
    };
    // Same as the head nogood of `q(1)`.
    let id = grounder.register(NoGood::head_first(vec![Lit::neg(q1), Lit::pos(body)]));
    assert!(new.contains_key(&id));

    let learnt = NoGood::learnt(vec![Lit::pos(q1), Lit::neg(body)]);
    let fst = grounder.register(learnt.clone());
    assert_eq!(grounder.register(learnt), fst);
}

mod props {
    use super::*;
    use proptest::prelude::*;

    /// `a(1). c(X) :- a(X), b0(X), ..., bn(X). bi(X) :- e(X).`
    fn chain_program(n: usize) -> Program {
        let mut body = vec![Literal::pos(atom("a", vec![x()]))];
        let mut rules = vec![];
        for i in 0..n {
            let b = format!("b{}", i);
            body.push(Literal::pos(atom(&b, vec![x()])));
            rules.push(RuleDef::normal(
                atom(&b, vec![x()]),
                vec![Literal::pos(atom("e", vec![x()]))],
            ))
        }
        rules.insert(0, RuleDef::normal(atom("c", vec![x()]), body));
        Program::new(vec![one("a", 1)], rules).unwrap()
    }

    /// Number of unassigned literals of the instantiation `X = 1`, if accepted.
    fn accepted(statuses: &[Option<ThriceTruth>], tol: i64) -> Option<usize> {
        let gconf = GrounderConf::with_tolerances(0, tol);
        let mut grounder = NaiveGrounder::new(chain_program(statuses.len()), gconf);
        let mut assignment = MapAssignment::new();
        for (i, status) in statuses.iter().enumerate() {
            let id = grounder
                .store
                .put_if_absent(GroundAtom::Basic(one(&format!("b{}", i), 1)));
            if let Some(truth) = status {
                assignment.assign(id, *truth);
            }
        }
        let order = order_from(&grounder, 0, 0);
        let res = grounder
            .ground_instantiations(RuleId::new(0), &order, &x_is(1), Some(&assignment))
            .unwrap();
        assert!(res.len() <= 1);
        res.unassigned.first().cloned()
    }

    fn status() -> impl Strategy<Value = Option<ThriceTruth>> {
        prop_oneof![
            Just(None),
            Just(Some(ThriceTruth::True)),
            Just(Some(ThriceTruth::MustBeTrue)),
            Just(Some(ThriceTruth::False)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn tolerance_monotonicity(
            statuses in prop::collection::vec(status(), 1..5),
            tol in 0i64..5,
        ) {
            let unassigned = statuses.iter().filter(|status| status.is_none()).count();
            let has_false = statuses.contains(&Some(ThriceTruth::False));
            let expected = if has_false || unassigned as i64 > tol {
                None
            } else {
                Some(unassigned)
            };
            let res = accepted(&statuses, tol);
            prop_assert_eq!(res, expected);
            if let Some(n) = res {
                prop_assert_eq!(accepted(&statuses, tol + 1), Some(n));
                prop_assert_eq!(accepted(&statuses, PERMISSIVE), Some(n));
            }
        }
    }
}
