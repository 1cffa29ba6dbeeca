//! Base types and functions.

pub use std::borrow::Cow;
pub use std::cmp::Ordering;
pub use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
pub use std::fmt;
pub use std::sync::Arc;

pub use mylib::common::hash::*;

pub use hashconsing::coll::*;

pub use either::Either;

pub use crate::errors::*;
pub use crate::term;
pub use crate::term::{Cst, RTerm, Term, Var, VarSet};

mod wrappers;

#[macro_use]
pub mod macros;
pub mod config;
pub mod profiling;

pub use self::config::*;
pub use self::profiling::{CanPrint, Profiler};
pub use self::wrappers::*;

lazy_static! {
    /// Configuration from clap.
    pub static ref conf: Config = Config::clap();
    static ref version_string: String = crate_version!().to_string();
    /// Version string.
    pub static ref version: &'static str = &version_string;
}

/// Prints the stats if asked. Does nothing in bench mode.
#[cfg(feature = "bench")]
pub fn print_stats(_: &'static str, _: Profiler) {}
/// Prints the stats if asked. Does nothing in bench mode.
#[cfg(not(feature = "bench"))]
pub fn print_stats(name: &str, profiler: Profiler) {
    if conf.stats {
        println!();
        profiler.print(name);
        println!()
    }
}

/// Maximum nesting depth of terms.
///
/// Checked when a program is built, all recursive term traversals rely on it.
pub const MAX_TERM_DEPTH: usize = 64;

/// Tolerance value standing for "unbounded".
pub const PERMISSIVE: i64 = -1;
/// Tolerance value of the strict heuristic.
pub const STRICT: i64 = 0;

/// Writes a comma-separated sequence of displayable things.
pub fn write_sep<W, T, I>(w: &mut W, sep: &str, items: I) -> fmt::Result
where
    W: fmt::Write,
    T: fmt::Display,
    I: IntoIterator<Item = T>,
{
    for_first! {
        items.into_iter() => {
            |fst| write!(w, "{}", fst)?,
            then |nxt| write!(w, "{}{}", sep, nxt)?
        }
    }
    Ok(())
}
