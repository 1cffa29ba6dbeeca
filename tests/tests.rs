//! Top-level tests on the demo programs and the public interface.
#![allow(non_upper_case_globals)]

extern crate lagro;
extern crate proptest;

use proptest::prelude::*;

use lagro::common::*;
use lagro::demo;
use lagro::subst::Subst;

macro_rules! run {
    ($f:expr) => {
        match $f {
            Ok(res) => res,
            Err(e) => {
                println!("Error:");
                for e in e.iter() {
                    let mut pref = "> ";
                    for line in format!("{}", e).lines() {
                        println!("{}{}", pref, line);
                        pref = "  "
                    }
                }
                panic!("failure")
            }
        }
    };
}

static max_rounds: usize = 50;

fn run_demo(name: &str, gconf: GrounderConf) -> demo::Outcome {
    let demo = match demo::get(name) {
        Some(demo) => demo,
        None => panic!("unknown demo `{}`", name),
    };
    let program = run!(demo.program());
    run!(demo::run(program, gconf, max_rounds, false)).0
}

#[test]
fn demos_terminate() {
    for demo in demo::demos() {
        for gconf in vec![
            GrounderConf::strict(),
            GrounderConf::permissive(),
            GrounderConf::strict().accumulator(true),
        ] {
            let outcome = run_demo(demo.name, gconf);
            assert!(
                outcome.rounds < max_rounds,
                "demo `{}` did not stabilize",
                demo.name
            )
        }
    }
}

#[test]
fn facts() {
    let outcome = run_demo("facts", GrounderConf::strict());
    assert_eq!(outcome.nogoods, 6);
    assert_eq!(outcome.atoms.to_string(), "{ p(1), p(2), q(1), q(2) }");
}

#[test]
fn path_heuristics_agree() {
    let strict = run_demo("path", GrounderConf::strict());
    let permissive = run_demo("path", GrounderConf::permissive());
    assert_eq!(strict.atoms, permissive.atoms);
    assert_eq!(strict.atoms.len(), 9);
}

#[test]
fn lazy() {
    for gconf in vec![GrounderConf::strict(), GrounderConf::permissive()] {
        let outcome = run_demo("lazy", gconf);
        assert_eq!(outcome.nogoods, 0);
    }
}

#[test]
fn subst_parse_errors() {
    for s in &["", "{", "{X}", "{X->}", "{x->1}", "{X->Y}", "{X->1,}", "{X->1} x"] {
        assert!(s.parse::<Subst>().is_err(), "`{}` should not parse", s)
    }
    let subst = run!("{ X -> f(a, -3), Y -> \"s t\" }".parse::<Subst>());
    assert_eq!(subst.to_string(), "{X->f(a,-3),Y->\"s t\"}");
}

fn ground_term() -> impl Strategy<Value = Term> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(term::int),
        "[a-z][a-z0-9_]{0,5}".prop_map(|s| term::sym(&s)),
        ".{0,6}".prop_map(|s| term::sym(&s)),
        ".{0,6}".prop_map(|s| term::string(&s)),
        "[a-z][a-z0-9_]{0,5}".prop_map(|s| term::fun(&s, vec![])),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        (".{0,5}", prop::collection::vec(inner, 0..3))
            .prop_map(|(name, args)| term::fun(&name, args))
    })
}

prop_compose! {
    fn ground_subst()(
        binds in prop::collection::btree_map("[A-Z][a-zA-Z0-9_]{0,4}", ground_term(), 0..4)
    ) -> Subst {
        let mut subst = Subst::new();
        for (var, term) in binds {
            subst = match subst.with(Var::new(&var), term) {
                Ok(subst) => subst,
                Err(e) => panic!("{}", e),
            }
        }
        subst
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn subst_round_trip(subst in ground_subst()) {
        let parsed = run!(subst.to_string().parse::<Subst>());
        prop_assert_eq!(parsed, subst);
    }
}
