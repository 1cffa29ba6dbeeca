#![doc = r#"Profiling stuff.

In `bench` mode, `Profiler` is a unit structure. Also, all macros are
deactivated, so all profiling is completely removed.
"#]

#[cfg(not(feature = "bench"))]
use std::cell::RefCell;
use std::time::{Duration, Instant};

use crate::common::*;

/// Extends duration with a pretty printing.
pub trait DurationExt {
    /// Nice string representation.
    fn to_str(&self) -> String;
}
impl DurationExt for Duration {
    fn to_str(&self) -> String {
        format!("{}.{:0>9}", self.as_secs(), self.subsec_nanos())
    }
}

/// Maps strings to counters.
pub type Stats = BTreeMap<String, usize>;

/// Provides a debug print function.
pub trait CanPrint {
    /// Debug print (multi-line).
    fn print(&self, name: &str);
}
impl CanPrint for Stats {
    fn print(&self, _: &str) {
        for (stat, count) in self {
            let stat_len = ::std::cmp::min(30, stat.len());
            println!(
                ";   {0: >1$}{2}: {3: >5}",
                "",
                30 - stat_len,
                conf.emph(stat),
                count
            )
        }
    }
}

/// Profiling structure, only in `not(bench)`.
///
/// Maintains durations indexed by scopes and counters indexed by strings. Internally, the
/// structures are wrapped in `RefCell`s so that mutation does not require `&mut self`.
#[cfg(not(feature = "bench"))]
pub struct Profiler {
    /// Scope-indexed durations, with the instant of the last tick if live.
    map: RefCell<BTreeMap<Vec<&'static str>, (Option<Instant>, Duration)>>,
    /// Starting tick, for total time.
    start: Instant,
    /// Other statistics.
    stats: RefCell<Stats>,
}
/// Profiling structure, unit in `bench` mode.
#[cfg(feature = "bench")]
pub struct Profiler;

impl Default for Profiler {
    fn default() -> Self {
        Profiler::new()
    }
}

#[cfg(feature = "bench")]
impl Profiler {
    /// Constructor.
    pub fn new() -> Self {
        Profiler
    }
}

#[cfg(not(feature = "bench"))]
impl Profiler {
    /// Constructor.
    pub fn new() -> Self {
        Profiler {
            map: RefCell::new(BTreeMap::new()),
            start: Instant::now(),
            stats: RefCell::new(BTreeMap::new()),
        }
    }

    /// Acts on a statistic.
    pub fn stat_do<F, S>(&self, stat: S, f: F)
    where
        F: Fn(usize) -> usize,
        S: Into<String>,
    {
        let stat = stat.into();
        let mut map = self.stats.borrow_mut();
        let val = map.get(&stat).cloned().unwrap_or(0);
        let _ = map.insert(stat, f(val));
    }

    /// Value of a statistic, zero if it was never touched.
    pub fn stat(&self, stat: &str) -> usize {
        self.stats.borrow().get(stat).cloned().unwrap_or(0)
    }

    /// Ticks.
    pub fn tick(&self, scope: Vec<&'static str>) {
        let mut map = self.map.borrow_mut();
        let time = map
            .entry(scope)
            .or_insert_with(|| (None, Duration::from_secs(0)));
        time.0 = Some(Instant::now())
    }

    /// Registers the time since the last tick.
    ///
    /// Does nothing if there was no tick since the last registration.
    pub fn mark(&self, scope: Vec<&'static str>) {
        let mut map = self.map.borrow_mut();
        if let Some((tick, sum)) = map.get_mut(&scope) {
            if let Some(instant) = tick.take() {
                *sum += Instant::now().duration_since(instant)
            }
        }
    }

    /// Prints the durations and the statistics.
    pub fn print(&self, name: &str) {
        println!(
            "; {} total {}s",
            conf.emph(name),
            Instant::now().duration_since(self.start).to_str()
        );
        for (scope, (_, time)) in self.map.borrow().iter() {
            println!(
                "; {0: >1$}|- {2}s {3}",
                "",
                2 * scope.len(),
                time.to_str(),
                scope.last().cloned().unwrap_or("?")
            )
        }
        self.stats.borrow().print(name)
    }
}
