//! Lagro is an incremental, semi-naive lazy grounder for answer set programs.
//!
//! Given a compiled [`Program`](program::Program) and the partial assignment of a conflict-driven
//! search engine, the [`NaiveGrounder`](grounder::NaiveGrounder) produces the ground
//! [`NoGood`](nogood::NoGood)s of the rule instantiations the assignment makes relevant, without
//! producing any instantiation twice. See the [`grounder`] module for the round protocol.
//!
//! Parsing is not provided. The binary runs built-in [`demo`] programs.

#![allow(non_upper_case_globals)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate mylib;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate clap;

pub mod errors;
#[macro_use]
pub mod common;
pub mod assignment;
pub mod atoms;
pub mod demo;
pub mod grounder;
pub mod nogood;
pub mod program;
pub mod subst;
pub mod term;

#[cfg(test)]
mod tests;

use crate::common::*;

/// Parses command-line arguments and works.
pub fn work() -> Res<()> {
    let name = match conf.demo() {
        Some(name) if name != "list" => name,
        _ => {
            println!("available demos:");
            for demo in demo::demos() {
                println!("  {: <8} {}", conf.emph(demo.name), demo.desc)
            }
            return Ok(());
        }
    };

    let demo = match demo::get(name) {
        Some(demo) => demo,
        None => bail!(
            "unknown demo `{}`, use `{}` to list the demos",
            conf.bad(name),
            conf.emph("list")
        ),
    };
    let program = demo.program()?;
    println!("{}", conf.emph(format!("demo `{}`: {}", demo.name, demo.desc)));
    for line in program.to_string().lines() {
        println!("  {}", line)
    }
    println!();

    let (outcome, profiler) = demo::run(program, conf.grounder.clone(), conf.max_rounds, true)?;

    println!();
    println!(
        "{} round(s), {} nogood(s), {} choice point(s), {} weak constraint atom(s)",
        outcome.rounds, outcome.nogoods, outcome.choices, outcome.weak
    );
    println!("{} {}", conf.happy("derived"), outcome.atoms);

    print_stats("grounder", profiler);
    Ok(())
}
