//! Lagro's global configuration.

use ansi_term::{Colour, Style};
use clap::{Arg, ArgMatches, Command};

use crate::common::{PERMISSIVE, STRICT};

/// Clap `Command` with static lifetime.
pub type App = Command<'static>;
/// Clap `ArgMatches`.
pub type Matches = ArgMatches;

/// Grounder heuristics configuration.
///
/// Tolerances bound the number of positive body literals a ground instantiation may contain that
/// are still unassigned. A negative tolerance means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrounderConf {
    /// Tolerance for constraints.
    pub tol_constraints: i64,
    /// Tolerance for rules that are not constraints.
    pub tol_rules: i64,
    /// When active, stale working memory entries are never removed.
    pub accumulator: bool,
    /// Activates the internal checks on the types of the nogoods produced.
    pub debug_checks: bool,
}
impl Default for GrounderConf {
    fn default() -> Self {
        Self::strict()
    }
}
impl GrounderConf {
    /// Strict heuristic: nothing unassigned is tolerated.
    pub fn strict() -> Self {
        Self::with_tolerances(STRICT, STRICT)
    }
    /// Permissive heuristic: unbounded tolerance.
    pub fn permissive() -> Self {
        Self::with_tolerances(PERMISSIVE, PERMISSIVE)
    }
    /// Custom tolerances.
    pub fn with_tolerances(tol_constraints: i64, tol_rules: i64) -> Self {
        GrounderConf {
            tol_constraints,
            tol_rules,
            accumulator: false,
            debug_checks: cfg!(debug_assertions),
        }
    }

    /// Sets the accumulator flag.
    pub fn accumulator(mut self, on: bool) -> Self {
        self.accumulator = on;
        self
    }
    /// Sets the debug checks flag.
    pub fn debug_checks(mut self, on: bool) -> Self {
        self.debug_checks = on;
        self
    }

    /// Tolerance for a rule, `i64::MAX` if unbounded.
    pub fn tolerance(&self, is_constraint: bool) -> i64 {
        let tol = if is_constraint {
            self.tol_constraints
        } else {
            self.tol_rules
        };
        if tol < 0 {
            i64::MAX
        } else {
            tol
        }
    }

    /// True if the tolerance for this kind of rule is not strict.
    pub fn is_permissive(&self, is_constraint: bool) -> bool {
        self.tolerance(is_constraint) != STRICT
    }

    /// Adds clap options to a clap `Command`.
    pub fn add_args(app: App, mut order: usize) -> App {
        let mut order = || {
            order += 1;
            order
        };

        app.arg(
            Arg::new("tol_constraints")
                .long("tol_constraints")
                .help("tolerance of the grounder for constraints")
                .validator(tolerance_validator)
                .value_name(tol_format)
                .default_value("strict")
                .takes_value(true)
                .display_order(order()),
        )
        .arg(
            Arg::new("tol_rules")
                .long("tol_rules")
                .help("tolerance of the grounder for rules that are not constraints")
                .validator(tolerance_validator)
                .value_name(tol_format)
                .default_value("strict")
                .takes_value(true)
                .display_order(order()),
        )
        .arg(
            Arg::new("accumulator")
                .long("accumulator")
                .help("never removes stale atoms from the working memory")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value("off")
                .takes_value(true)
                .display_order(order()),
        )
        .arg(
            Arg::new("debug_checks")
                .long("debug_checks")
                .help("checks the types of the nogoods produced after each round")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value(if cfg!(debug_assertions) { "on" } else { "off" })
                .takes_value(true)
                .display_order(order()),
        )
    }

    /// Creates itself from some matches.
    pub fn new(matches: &Matches) -> Self {
        GrounderConf {
            tol_constraints: tol_of_matches(matches, "tol_constraints"),
            tol_rules: tol_of_matches(matches, "tol_rules"),
            accumulator: bool_of_matches(matches, "accumulator"),
            debug_checks: bool_of_matches(matches, "debug_checks"),
        }
    }
}

/// Global configuration.
pub struct Config {
    /// Demo to run, if any.
    demo: Option<String>,
    /// Verbosity.
    pub verb: usize,
    /// Statistics flag.
    pub stats: bool,
    /// Maximal number of rounds for the demo driver.
    pub max_rounds: usize,
    /// Styles, for coloring.
    styles: Styles,
    /// Grounder configuration.
    pub grounder: GrounderConf,
}
impl ColorExt for Config {
    fn styles(&self) -> &Styles {
        &self.styles
    }
}
impl Config {
    /// Demo program to run.
    #[inline]
    pub fn demo(&self) -> Option<&String> {
        self.demo.as_ref()
    }

    /// Builds the clap command.
    fn command() -> App {
        let mut app = Command::new(crate_name!());
        app = Self::add_args(app, 0);
        GrounderConf::add_args(app, 100)
    }

    /// Parses command-line arguments and generates the configuration.
    ///
    /// Falls back to the default configuration if the arguments cannot be parsed, which happens
    /// when running under a test harness. Help and version requests still exit.
    pub fn clap() -> Self {
        use clap::ErrorKind as ClapErr;
        let matches = match Self::command().try_get_matches() {
            Ok(matches) => matches,
            Err(e) => match e.kind() {
                ClapErr::DisplayHelp | ClapErr::DisplayVersion => e.exit(),
                _ => Self::command().get_matches_from(vec![crate_name!()]),
            },
        };
        Self::of_matches(&matches)
    }

    /// Creates the configuration from some matches.
    fn of_matches(matches: &Matches) -> Self {
        let demo = matches.value_of("demo").map(|s| s.to_string());

        // Verbosity.
        let mut verb = matches.occurrences_of("verb") as usize;
        for _ in 0..matches.occurrences_of("quiet") {
            if verb > 0 {
                verb -= 1
            }
        }

        // Colors.
        let color = atty::is(atty::Stream::Stdout) && bool_of_matches(matches, "color");
        let styles = Styles::new(color);

        let stats = bool_of_matches(matches, "stats");
        let max_rounds = int_of_matches(matches, "max_rounds");
        let grounder = GrounderConf::new(matches);

        Config {
            demo,
            verb,
            stats,
            max_rounds,
            styles,
            grounder,
        }
    }

    /// Adds clap options to a clap `Command`.
    pub fn add_args(app: App, mut order: usize) -> App {
        let mut order = || {
            order += 1;
            order
        };

        app.author(crate_authors!())
            .version(*crate::common::version)
            .about("Incremental lazy grounder for answer set programs.")
            .arg(
                Arg::new("demo")
                    .help("name of the demo program to ground, `list` to list them")
                    .index(1)
                    .display_order(order()),
            )
            .arg(
                Arg::new("verb")
                    .short('v')
                    .help("increases verbosity")
                    .takes_value(false)
                    .multiple_occurrences(true)
                    .display_order(order()),
            )
            .arg(
                Arg::new("quiet")
                    .short('q')
                    .help("decreases verbosity")
                    .takes_value(false)
                    .multiple_occurrences(true)
                    .display_order(order()),
            )
            .arg(
                Arg::new("color")
                    .long("color")
                    .short('c')
                    .help("(de)activates coloring (off if output is not a tty)")
                    .validator(bool_validator)
                    .value_name(bool_format)
                    .default_value("on")
                    .takes_value(true)
                    .display_order(order()),
            )
            .arg(
                Arg::new("stats")
                    .long("stats")
                    .help("reports some statistics at the end of the run")
                    .validator(bool_validator)
                    .value_name(bool_format)
                    .default_value("off")
                    .takes_value(true)
                    .display_order(order()),
            )
            .arg(
                Arg::new("max_rounds")
                    .long("max_rounds")
                    .help("maximum number of grounding rounds of the demo driver")
                    .validator(int_validator)
                    .value_name("int")
                    .default_value("100")
                    .takes_value(true)
                    .display_order(order()),
            )
    }
}

/// Contains some styles for coloring.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Emphasis style.
    emph: Style,
    /// Happy style.
    hap: Style,
    /// Sad style.
    sad: Style,
    /// Bad style.
    bad: Style,
}
impl Default for Styles {
    fn default() -> Self {
        Styles::new(true)
    }
}
impl ColorExt for Styles {
    fn styles(&self) -> &Styles {
        self
    }
}
impl Styles {
    /// Creates some styles.
    pub fn new(colored: bool) -> Self {
        Styles {
            emph: if colored {
                Style::new().bold()
            } else {
                Style::new()
            },
            hap: if colored {
                Colour::Green.normal().bold()
            } else {
                Style::new()
            },
            sad: if colored {
                Colour::Yellow.normal().bold()
            } else {
                Style::new()
            },
            bad: if colored {
                Colour::Red.normal().bold()
            } else {
                Style::new()
            },
        }
    }
}

/// Can color things.
pub trait ColorExt {
    /// The styles in the colorizer: emph, happy, sad, and bad.
    fn styles(&self) -> &Styles;
    /// String emphasis.
    #[inline]
    fn emph<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles().emph.paint(s.as_ref()))
    }
    /// Happy string.
    #[inline]
    fn happy<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles().hap.paint(s.as_ref()))
    }
    /// Sad string.
    #[inline]
    fn sad<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles().sad.paint(s.as_ref()))
    }
    /// Bad string.
    #[inline]
    fn bad<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles().bad.paint(s.as_ref()))
    }
}

/// Format for booleans.
pub static bool_format: &str = "on/true|no/off/false";
/// Format for tolerances.
pub static tol_format: &str = "strict|permissive|int";

/// Boolean of a string.
pub fn bool_of_str(s: &str) -> Option<bool> {
    match s {
        "on" | "true" => Some(true),
        "no" | "off" | "false" => Some(false),
        _ => None,
    }
}

/// Tolerance of a string.
pub fn tol_of_str(s: &str) -> Option<i64> {
    if s.eq_ignore_ascii_case("strict") {
        Some(STRICT)
    } else if s.eq_ignore_ascii_case("permissive") {
        Some(PERMISSIVE)
    } else {
        s.parse::<i64>().ok()
    }
}

/// Boolean of some matches.
///
/// Assumes a default is provided and the input has been validated with `bool_validator`.
pub fn bool_of_matches(matches: &Matches, key: &str) -> bool {
    matches
        .value_of(key)
        .and_then(bool_of_str)
        .unwrap_or(false)
}

/// Integer of some matches.
///
/// Assumes a default is provided and the input has been validated with `int_validator`.
pub fn int_of_matches(matches: &Matches, key: &str) -> usize {
    matches
        .value_of(key)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0)
}

/// Tolerance of some matches.
///
/// Assumes a default is provided and the input has been validated with `tolerance_validator`.
pub fn tol_of_matches(matches: &Matches, key: &str) -> i64 {
    matches
        .value_of(key)
        .and_then(tol_of_str)
        .unwrap_or(STRICT)
}

/// Validates integer input.
pub fn int_validator(s: &str) -> Result<(), String> {
    match s.parse::<usize>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("expected an integer, got `{}`", s)),
    }
}

/// Validates boolean input.
pub fn bool_validator(s: &str) -> Result<(), String> {
    if bool_of_str(s).is_some() {
        Ok(())
    } else {
        Err(format!("expected `on/true` or `off/false`, got `{}`", s))
    }
}

/// Validates tolerance input.
pub fn tolerance_validator(s: &str) -> Result<(), String> {
    if tol_of_str(s).is_some() {
        Ok(())
    } else {
        Err(format!(
            "expected `strict`, `permissive` or an integer, got `{}`",
            s
        ))
    }
}
