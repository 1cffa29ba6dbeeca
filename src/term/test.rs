//! Tests for the term structure.

use crate::common::*;
use crate::term::ArithOp;

macro_rules! assert_eval {
    ($term:expr => $val:expr) => {{
        let term = $term;
        assert_eq!(term::eval(&term), $val, "evaluating `{}`", term)
    }};
}

#[test]
fn cst_arith() {
    assert_eval!(term::arith(ArithOp::Add, term::int(7), term::int(3)) => Some(10));
    assert_eval!(term::arith(ArithOp::Sub, term::int(7), term::int(3)) => Some(4));
    assert_eval!(term::arith(ArithOp::Mul, term::int(7), term::int(3)) => Some(21));
    assert_eval!(term::arith(ArithOp::Div, term::int(7), term::int(3)) => Some(2));
    assert_eval!(term::arith(ArithOp::Div, term::int(-7), term::int(2)) => Some(-3));
    assert_eval!(term::arith(ArithOp::Mod, term::int(7), term::int(3)) => Some(1));
    assert_eval!(term::arith(ArithOp::Pow, term::int(3), term::int(3)) => Some(27));
    assert_eval!(term::arith(ArithOp::BitXor, term::int(6), term::int(3)) => Some(5));
}

#[test]
fn undefined_arith() {
    assert_eval!(term::arith(ArithOp::Div, term::int(7), term::int(0)) => None);
    assert_eval!(term::arith(ArithOp::Mod, term::int(7), term::int(0)) => None);
    assert_eval!(term::arith(ArithOp::Pow, term::int(7), term::int(-1)) => None);
    assert_eval!(term::arith(ArithOp::Add, term::int(i64::MAX), term::int(1)) => None);
    assert_eval!(term::arith(ArithOp::Add, term::var("X"), term::int(1)) => None);
    assert_eval!(term::arith(ArithOp::Add, term::string("1"), term::int(1)) => None);
}

#[test]
fn nested_arith() {
    let inner = term::arith(ArithOp::Sub, term::int(10), term::int(4));
    let t = term::arith(ArithOp::Mul, inner, term::int(2));
    assert_eval!(t.clone() => Some(12));
    assert_eq!(t.to_string(), "(10-4)*2");
    assert_eq!(t.depth(), 3)
}

#[test]
fn normalize() {
    let x = term::var("X");
    let sum = term::arith(ArithOp::Add, term::int(1), term::int(2));
    let t = term::fun("f", vec![sum.clone(), x.clone()]);
    assert_eq!(term::normalize(&t), term::fun("f", vec![term::int(3), x.clone()]));
    let open = term::arith(ArithOp::Add, x.clone(), sum);
    assert_eq!(
        term::normalize(&open),
        term::arith(ArithOp::Add, x, term::int(3))
    );
    let undef = term::arith(ArithOp::Div, term::int(1), term::int(0));
    assert_eq!(term::normalize(&undef), undef)
}

#[test]
fn hashconsing() {
    let t_1 = term::fun("f", vec![term::sym("a"), term::int(1)]);
    let t_2 = term::fun("f", vec![term::sym("a"), term::int(1)]);
    assert_eq!(t_1, t_2);
    assert_eq!(t_1.uid(), t_2.uid());
    assert_ne!(term::sym("a"), term::string("a"));
}

#[test]
fn vars() {
    let (x, y) = (term::var("X"), term::var("Y"));
    let t = term::fun(
        "f",
        vec![x.clone(), term::arith(ArithOp::Add, y.clone(), term::int(1))],
    );
    let all: Vec<_> = t.vars().into_iter().map(|v| v.name().to_string()).collect();
    assert_eq!(all, vec!["X", "Y"]);

    let mut matchable = VarSet::new();
    t.add_matchable_vars(&mut matchable);
    assert_eq!(matchable.len(), 1);
    assert!(matchable.contains(&Var::new("X")));
    assert!(!t.is_ground());
    assert!(term::fun("g", vec![term::int(3)]).is_ground())
}

#[test]
fn semantic_order() {
    let mut terms = vec![
        term::fun("f", vec![term::int(1)]),
        term::string("b"),
        term::sym("b"),
        term::int(10),
        term::sym("a"),
        term::int(-2),
        term::fun("f", vec![term::int(0)]),
        term::fun("a", vec![term::int(0), term::int(0)]),
    ];
    terms.sort_by(term::cmp);
    let strs: Vec<_> = terms.iter().map(|t| t.to_string()).collect();
    assert_eq!(
        strs,
        vec!["-2", "10", "a", "b", "\"b\"", "f(0)", "f(1)", "a(0,0)"]
    )
}

#[test]
fn display_quoting() {
    assert_eq!(term::fun("f", vec![]).to_string(), "f()");
    assert_eq!(term::sym("f").to_string(), "f");
    assert_eq!(term::sym("Abc").to_string(), "'Abc'");
    assert_eq!(term::sym("it's").to_string(), "'it\\'s'");
    assert_eq!(term::string("a\"b\\c").to_string(), "\"a\\\"b\\\\c\"");
    assert_eq!(
        term::fun("F", vec![term::sym("a b")]).to_string(),
        "F('a b')"
    );
    assert_eq!(term::fun("_t", vec![]).to_string(), "_t()");
    assert_eq!(term::fun("1f", vec![]).to_string(), "'1f'()");
    assert!(term::is_plain_sym("a_B1"));
    assert!(!term::is_plain_sym("_a"));
    assert!(!term::is_plain_sym(""));
    assert!(term::is_plain_fun_sym("_tuple"));
    assert!(!term::is_plain_fun_sym("a b"));
}

#[test]
fn depth() {
    let mut t = term::int(0);
    for _ in 0..MAX_TERM_DEPTH - 1 {
        t = term::fun("s", vec![t])
    }
    assert_eq!(t.depth(), MAX_TERM_DEPTH);
    assert!(term::check_depth(&t).is_ok());
    let t = term::fun("s", vec![t]);
    let err = term::check_depth(&t).unwrap_err();
    assert!(err.is_unsupported())
}
