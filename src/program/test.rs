//! Tests for program compilation.

use crate::common::*;
use crate::program::*;

fn x() -> Term {
    term::var("X")
}
fn y() -> Term {
    term::var("Y")
}
fn atom(name: &str, args: Vec<Term>) -> Atom {
    Atom::of(name, args)
}

#[test]
fn predicates() {
    assert_eq!(pred("p", 2), pred("p", 2));
    assert_ne!(pred("p", 2), pred("p", 1));
    assert_ne!(pred("p", 2), internal_pred("p", 2));
    let rule_atom = rule_atom_pred();
    assert!(rule_atom.internal && rule_atom.solver_internal);
    assert_eq!(rule_atom.to_string(), "_R_/2");
    assert_eq!(weak_pred().arity, 3);

    let err = Atom::new(pred("p", 2), vec![x()]).unwrap_err();
    assert!(err.is_invariant());
    assert!(Atom::new(pred("p", 1), vec![x()]).is_ok());
    assert_eq!(atom("a", vec![]).to_string(), "a");
}

#[test]
fn atoms() {
    let a = atom("p", vec![x(), term::fun("f", vec![y()])]);
    assert!(!a.is_ground());
    assert_eq!(a.vars().len(), 2);
    let subst = crate::subst::Subst::new()
        .with(Var::new("X"), term::int(1))
        .unwrap()
        .with(Var::new("Y"), term::sym("b"))
        .unwrap();
    let ground = a.apply(&subst);
    assert!(ground.is_ground());
    assert_eq!(ground.to_string(), "p(1,f(b))");
    assert_eq!(ground.to_instance().to_string(), "(1,f(b))");
    let instance = ground.to_instance();
    let empty = crate::subst::Subst::new();
    let res = a.specialize(&instance, &empty).unwrap();
    assert_eq!(res.into_owned(), subst);
}

#[test]
fn unsafe_and_unsupported() {
    // Head variable not bound by the body.
    let res = Program::new(
        vec![],
        vec![RuleDef::normal(
            atom("p", vec![x()]),
            vec![Literal::neg(atom("q", vec![x()]))],
        )],
    );
    assert!(res.unwrap_err().is_unsupported());

    // Non-ground fact.
    let res = Program::new(vec![atom("p", vec![x()])], vec![]);
    assert!(res.unwrap_err().is_unsupported());

    // Equality between two variables.
    let res = Program::new(
        vec![],
        vec![RuleDef::constraint(vec![
            Literal::pos(atom("p", vec![x()])),
            Literal::pos(atom("p", vec![y()])),
            Literal::cmp(x(), CmpOp::Eq, y()),
        ])],
    );
    assert!(res.unwrap_err().is_unsupported());

    // Weak constraint with a symbolic weight.
    assert!(RuleDef::weak(term::sym("a"), term::int(0), vec![], vec![]).is_err());

    // Deep terms.
    let mut deep = term::int(0);
    for _ in 0..MAX_TERM_DEPTH + 1 {
        deep = term::fun("s", vec![deep])
    }
    let res = Program::new(vec![atom("p", vec![deep])], vec![]);
    assert!(res.unwrap_err().is_unsupported());
}

#[test]
fn facts_and_display() {
    let program = Program::new(
        vec![
            atom("p", vec![term::int(1)]),
            atom("p", vec![term::int(1)]),
            atom("p", vec![term::arith(term::ArithOp::Add, term::int(1), term::int(1))]),
        ],
        vec![
            RuleDef::constraint(vec![
                Literal::pos(atom("p", vec![x()])),
                Literal::cmp(x(), CmpOp::Gt, term::int(1)),
            ]),
            RuleDef::weak(
                term::int(2),
                term::int(1),
                vec![x()],
                vec![Literal::pos(atom("p", vec![x()]))],
            )
            .unwrap(),
        ],
    )
    .unwrap();
    // Duplicates are dropped, facts are normalized.
    assert_eq!(program.facts().len(), 2);
    assert_eq!(program.facts_of(&pred("p", 1)).len(), 2);
    assert!(program.facts_of(&pred("q", 1)).is_empty());
    assert!(program.is_fact(&atom("p", vec![term::int(2)])));
    assert_eq!(
        program.to_string(),
        "p(1).\n\
         p(2).\n\
         :- p(X), X > 1.\n\
         :~ p(X). [2@1, _tuple(X)]\n"
    );
}

#[test]
fn unique_heads() {
    let program = Program::new(
        vec![atom("r", vec![term::int(0)])],
        vec![
            // Unique.
            RuleDef::normal(atom("a", vec![x()]), vec![Literal::pos(atom("p", vec![x()]))]),
            // Body binds `Y`, not in the head.
            RuleDef::normal(
                atom("b", vec![x()]),
                vec![Literal::pos(atom("p", vec![x(), y()]))],
            ),
            // Two rules.
            RuleDef::normal(atom("c", vec![x()]), vec![Literal::pos(atom("p", vec![x()]))]),
            RuleDef::normal(atom("c", vec![x()]), vec![Literal::pos(atom("q", vec![x()]))]),
            // Facts.
            RuleDef::normal(atom("r", vec![x()]), vec![Literal::pos(atom("p", vec![x()]))]),
            // Unique, `Y` is bound under a function symbol.
            RuleDef::normal(
                atom("e", vec![x(), term::fun("f", vec![y()])]),
                vec![Literal::pos(atom("p", vec![x(), y()]))],
            ),
            // `X` only appears in arithmetic in the head, `d(1)` has two instances.
            RuleDef::normal(
                atom("d", vec![term::arith(term::ArithOp::Mul, x(), x())]),
                vec![Literal::pos(atom("p", vec![x()]))],
            ),
        ],
    )
    .unwrap();
    let unique: Vec<_> = program
        .rules()
        .filter(|rule| program.is_unique_head(rule.id()))
        .map(|rule| rule.to_string())
        .collect();
    assert_eq!(unique, vec!["a(X) :- p(X).", "e(X,f(Y)) :- p(X,Y)."]);

    // Adding a second rule for `a` breaks uniqueness.
    let mut program = program;
    let id = program
        .add_rule(RuleDef::normal(
            atom("a", vec![term::int(7)]),
            vec![],
        ))
        .unwrap();
    assert!(!program.is_unique_head(id));
    assert!(!program.is_unique_head(RuleId::new(0)));
    assert_eq!(program.defining_rules(&pred("a", 1)).len(), 2);
    assert_eq!(program.rules_deriving(&atom("a", vec![term::int(7)])).unwrap().len(), 2);
    assert_eq!(program.rules_deriving(&atom("a", vec![term::int(3)])).unwrap().len(), 1);
}
