//! Built-in demo programs and a driver simulating a search engine.
//!
//! The driver does not search for stable models. After each round it marks every head atom the
//! grounder derived as must-be-true and feeds it back, until nothing new shows up. The atoms it
//! ends up with over-approximate the atoms true in any answer set.

use crate::assignment::{Assignment, MapAssignment, ThriceTruth};
use crate::atoms::AtomStore;
use crate::common::*;
use crate::grounder::answer_set::AnswerSet;
use crate::grounder::NaiveGrounder;
use crate::program::{Atom, CmpOp, Literal, Program, RuleDef};

/// A demo program.
pub struct Demo {
    /// Name.
    pub name: &'static str,
    /// Description.
    pub desc: &'static str,
    /// Builds the program.
    build: fn() -> Res<Program>,
}
impl Demo {
    /// Builds the program of the demo.
    pub fn program(&self) -> Res<Program> {
        (self.build)().chain_err(|| format!("while building demo `{}`", self.name))
    }
}

/// All the demos.
pub fn demos() -> Vec<Demo> {
    vec![
        Demo {
            name: "facts",
            desc: "a rule over facts",
            build: facts,
        },
        Demo {
            name: "guess",
            desc: "a ground guess and a constraint",
            build: guess,
        },
        Demo {
            name: "lazy",
            desc: "a rule over an undefined predicate, never grounded",
            build: lazy,
        },
        Demo {
            name: "path",
            desc: "transitive closure of a graph",
            build: path,
        },
        Demo {
            name: "colors",
            desc: "graph coloring with a weak constraint",
            build: colors,
        },
        Demo {
            name: "enum",
            desc: "enumeration of the values of a predicate",
            build: enumeration,
        },
    ]
}

/// Demo with some name.
pub fn get(name: &str) -> Option<Demo> {
    demos().into_iter().find(|demo| demo.name == name)
}

fn x() -> Term {
    term::var("X")
}
fn y() -> Term {
    term::var("Y")
}
fn z() -> Term {
    term::var("Z")
}
fn int(i: i64) -> Term {
    term::int(i)
}
fn atom(name: &str, args: Vec<Term>) -> Atom {
    Atom::of(name, args)
}

/// `p(1). p(2). q(X) :- p(X).`
fn facts() -> Res<Program> {
    Program::new(
        vec![atom("p", vec![int(1)]), atom("p", vec![int(2)])],
        vec![RuleDef::normal(
            atom("q", vec![x()]),
            vec![Literal::pos(atom("p", vec![x()]))],
        )],
    )
}

/// `a :- not b. b :- not a. :- b.`
fn guess() -> Res<Program> {
    let (a, b) = (atom("a", vec![]), atom("b", vec![]));
    Program::new(
        vec![],
        vec![
            RuleDef::normal(a.clone(), vec![Literal::neg(b.clone())]),
            RuleDef::normal(b.clone(), vec![Literal::neg(a)]),
            RuleDef::constraint(vec![Literal::pos(b)]),
        ],
    )
}

/// `a(1). c(X) :- a(X), b(X).`
fn lazy() -> Res<Program> {
    Program::new(
        vec![atom("a", vec![int(1)])],
        vec![RuleDef::normal(
            atom("c", vec![x()]),
            vec![
                Literal::pos(atom("a", vec![x()])),
                Literal::pos(atom("b", vec![x()])),
            ],
        )],
    )
}

/// Edges of a chain, `path` is their transitive closure.
fn path() -> Res<Program> {
    let edges = (1..4)
        .map(|i| atom("edge", vec![int(i), int(i + 1)]))
        .collect();
    Program::new(
        edges,
        vec![
            RuleDef::normal(
                atom("path", vec![x(), y()]),
                vec![Literal::pos(atom("edge", vec![x(), y()]))],
            ),
            RuleDef::normal(
                atom("path", vec![x(), z()]),
                vec![
                    Literal::pos(atom("path", vec![x(), y()])),
                    Literal::pos(atom("edge", vec![y(), z()])),
                ],
            ),
        ],
    )
}

/// Two-coloring of a chain of three nodes, preferring green.
fn colors() -> Res<Program> {
    let c = term::var("C");
    let (red, green) = (term::sym("red"), term::sym("green"));
    let col = |node: Term, color: Term| atom("col", vec![node, color]);
    Program::new(
        vec![
            atom("edge", vec![int(1), int(2)]),
            atom("edge", vec![int(2), int(3)]),
        ],
        vec![
            RuleDef::normal(
                atom("node", vec![x()]),
                vec![Literal::interval(x(), int(1), int(3))],
            ),
            RuleDef::normal(
                col(x(), red.clone()),
                vec![
                    Literal::pos(atom("node", vec![x()])),
                    Literal::neg(col(x(), green.clone())),
                ],
            ),
            RuleDef::normal(
                col(x(), green),
                vec![
                    Literal::pos(atom("node", vec![x()])),
                    Literal::neg(col(x(), red.clone())),
                ],
            ),
            RuleDef::constraint(vec![
                Literal::pos(atom("edge", vec![x(), y()])),
                Literal::pos(col(x(), c.clone())),
                Literal::pos(col(y(), c)),
            ]),
            RuleDef::normal(
                atom("before", vec![x(), y()]),
                vec![
                    Literal::pos(atom("node", vec![x()])),
                    Literal::pos(atom("node", vec![y()])),
                    Literal::cmp(x(), CmpOp::Lt, y()),
                ],
            ),
            RuleDef::weak(
                int(1),
                int(1),
                vec![x()],
                vec![Literal::pos(col(x(), red))],
            )?,
        ],
    )
}

/// `item(a). item(b). item(c). idx(V, I) :- item(V), _Enumeration(items, V, I).`
fn enumeration() -> Res<Program> {
    let (v, i) = (term::var("V"), term::var("I"));
    Program::new(
        ["a", "b", "c"]
            .iter()
            .map(|s| atom("item", vec![term::sym(*s)]))
            .collect(),
        vec![RuleDef::normal(
            atom("idx", vec![v.clone(), i.clone()]),
            vec![
                Literal::pos(atom("item", vec![v.clone()])),
                Literal::enumeration(term::sym("items"), v, i),
            ],
        )],
    )
}

/// Result of a run of the driver.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Number of rounds.
    pub rounds: usize,
    /// Number of nogoods produced.
    pub nogoods: usize,
    /// Number of choice points created.
    pub choices: usize,
    /// Number of weak constraint violation atoms created.
    pub weak: usize,
    /// Derived atoms and facts.
    pub atoms: AnswerSet,
}

/// Runs the driver on a program.
///
/// Prints the nogoods of each round if `verbose`.
pub fn run(
    program: Program,
    gconf: GrounderConf,
    max_rounds: usize,
    verbose: bool,
) -> Res<(Outcome, Profiler)> {
    let mut grounder = NaiveGrounder::new(program, gconf);
    let mut assignment = MapAssignment::new();
    let (mut rounds, mut nogoods, mut choices, mut weak) = (0, 0, 0, 0);

    loop {
        if rounds >= max_rounds {
            log! { @info "reached the maximum number of rounds ({})", max_rounds }
            break;
        }
        rounds += 1;
        log! { @info "round {}", rounds }

        let new = grounder.get_nogoods(Some(&mut assignment))?;
        nogoods += new.len();
        if verbose && !new.is_empty() {
            println!("round {}", conf.emph(rounds.to_string()));
            for (id, nogood) in &new {
                println!(
                    "  {: >4} {: >8} {}",
                    id,
                    nogood.typ(),
                    grounder.atoms().nogood_to_string(nogood)
                )
            }
        }

        let (enablers, _) = grounder.get_choice_atoms();
        choices += enablers.len();
        weak += grounder.get_weak_constraints().len();

        let mut derived = vec![];
        for head in grounder.get_heads_to_bodies().keys() {
            if !assignment.is_assigned(*head) {
                assignment.assign(*head, ThriceTruth::MustBeTrue);
                derived.push(*head)
            }
        }
        log! { @verb "{} new nogood(s), {} derived atom(s)", new.len(), derived.len() }
        if new.is_empty() && derived.is_empty() {
            break;
        }
        grounder.update_assignment(derived)?
    }

    let atoms = grounder.assignment_to_answer_set(assignment.true_atoms());
    let outcome = Outcome {
        rounds,
        nogoods,
        choices,
        weak,
        atoms,
    };
    Ok((outcome, grounder.into_profiler()))
}
