//! Substitutions: partial, monotonic maps from variables to ground terms.
//!
//! The hot path of the grounder only needs [`specialize`], a one-sided match of a template
//! against ground data. General two-sided unification lives in [`unify`] and is only used for
//! static analysis.
//!
//! Substitutions have a textual form, `{X->a,Y->f(1)}`, which [`Subst`] parses back with
//! [`FromStr`](::std::str::FromStr).

use std::str::FromStr;

use crate::common::*;

pub mod unify;


/// A substitution.
///
/// Variables are bound to ground terms only, and never rebound to a different term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subst {
    map: BTreeMap<Var, Term>,
}

impl Subst {
    /// Empty substitution.
    pub fn new() -> Self {
        Subst {
            map: BTreeMap::new(),
        }
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.map.len()
    }
    /// True if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Term a variable is bound to.
    pub fn get(&self, var: &Var) -> Option<&Term> {
        self.map.get(var)
    }
    /// True if the variable is bound.
    pub fn is_bound(&self, var: &Var) -> bool {
        self.map.contains_key(var)
    }
    /// True if all the variables of a set are bound.
    pub fn binds_all<'a>(&self, vars: impl IntoIterator<Item = &'a Var>) -> bool {
        vars.into_iter().all(|var| self.is_bound(var))
    }

    /// Iterator over the bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&Var, &Term)> {
        self.map.iter()
    }

    /// Binds a variable.
    ///
    /// Binding a variable to the term it is already bound to is a no-op. Fails if the term is not
    /// ground, or if the variable is bound to a different term.
    pub fn put(&mut self, var: Var, term: Term) -> Res<()> {
        if !term.is_ground() {
            bail!(ErrorKind::NonGroundBinding(var.to_string(), term.to_string()))
        }
        if let Some(old) = self.map.get(&var) {
            if old != &term {
                bail!(ErrorKind::Rebind(
                    var.to_string(),
                    old.to_string(),
                    term.to_string()
                ))
            }
            return Ok(());
        }
        self.map.insert(var, term);
        Ok(())
    }

    /// Binds a variable, consuming the substitution.
    pub fn with(mut self, var: Var, term: Term) -> Res<Self> {
        self.put(var, term)?;
        Ok(self)
    }

    /// Applies the substitution to a term.
    ///
    /// Ground arithmetic subterms of the result are evaluated.
    pub fn apply(&self, t: &Term) -> Term {
        if t.is_ground() {
            return term::normalize(t);
        }
        match t.get() {
            RTerm::Var(var) => self.map.get(var).cloned().unwrap_or_else(|| t.clone()),
            RTerm::Cst(_) => t.clone(),
            RTerm::Fun { sym, args, .. } => term::fun(sym.clone(), self.apply_all(args)),
            RTerm::Arith { op, lft, rgt, .. } => {
                term::normalize(&term::arith(*op, self.apply(lft), self.apply(rgt)))
            }
            RTerm::Interval { lo, hi, .. } => term::interval(self.apply(lo), self.apply(hi)),
        }
    }

    /// Applies the substitution to a list of terms.
    pub fn apply_all(&self, terms: &[Term]) -> Vec<Term> {
        terms.iter().map(|t| self.apply(t)).collect()
    }
}

impl_fmt! {
    Subst(self, fmt) {
        fmt.write_str("{")?;
        let mut sep = "";
        for (var, term) in &self.map {
            write!(fmt, "{}{}->{}", sep, var, term)?;
            sep = ","
        }
        fmt.write_str("}")
    }
}

impl FromStr for Subst {
    type Err = Error;
    fn from_str(s: &str) -> Res<Self> {
        let mut parser = Parser::new(s);
        let subst = parser.subst()?;
        parser.ws();
        if !parser.is_eoi() {
            bail!(parser.error("expected end of input"))
        }
        Ok(subst)
    }
}

/// Specializes a sequence of template terms against ground terms.
///
/// Returns `None` if the template does not match. The substitution passed is not modified: it
/// is cloned lazily, only when a new binding is actually needed. Arithmetic subterms of the
/// template are checked after all the other positions are matched, and only match if they are
/// ground once substituted and evaluate to the ground term.
///
/// ```rust
/// # use lagro::{term, subst::{self, Subst}};
/// # use lagro::term::ArithOp;
/// let (x, y) = (term::var("X"), term::var("Y"));
/// let template = vec![x.clone(), term::arith(ArithOp::Add, x.clone(), term::int(1)), y];
/// let empty = Subst::new();
///
/// let ground = vec![term::int(1), term::int(2), term::sym("a")];
/// let res = subst::specialize(&template, &ground, &empty).unwrap();
/// assert_eq!(res.to_string(), "{X->1,Y->a}");
///
/// let ground = vec![term::int(1), term::int(3), term::sym("a")];
/// assert!(subst::specialize(&template, &ground, &empty).is_none());
/// assert!(empty.is_empty());
/// ```
pub fn specialize<'a>(
    template: &[Term],
    ground: &[Term],
    subst: &'a Subst,
) -> Option<Cow<'a, Subst>> {
    if template.len() != ground.len() {
        return None;
    }
    let mut res = Cow::Borrowed(subst);
    let mut arith = vec![];
    for (tmpl, gnd) in template.iter().zip(ground.iter()) {
        if !specialize_term(tmpl, gnd, &mut res, &mut arith) {
            return None;
        }
    }
    for (tmpl, gnd) in arith {
        let value = res.apply(tmpl);
        match (term::eval(&value), gnd.int_val()) {
            (Some(val), Some(expected)) if val == expected => (),
            _ => return None,
        }
    }
    Some(res)
}

/// Specializes a template term, postpones arithmetic subterms.
fn specialize_term<'a, 't>(
    tmpl: &'t Term,
    gnd: &'t Term,
    subst: &mut Cow<'a, Subst>,
    arith: &mut Vec<(&'t Term, &'t Term)>,
) -> bool {
    match tmpl.get() {
        RTerm::Var(var) => match subst.get(var) {
            Some(bound) => bound == gnd,
            None => {
                subst.to_mut().map.insert(var.clone(), gnd.clone());
                true
            }
        },
        RTerm::Cst(_) => tmpl == gnd,
        RTerm::Fun { sym, args, .. } => {
            if tmpl.is_ground() {
                return &term::normalize(tmpl) == gnd;
            }
            match gnd.get() {
                RTerm::Fun {
                    sym: gsym,
                    args: gargs,
                    ..
                } if sym == gsym && args.len() == gargs.len() => args
                    .iter()
                    .zip(gargs.iter())
                    .all(|(t, g)| specialize_term(t, g, subst, arith)),
                _ => false,
            }
        }
        RTerm::Arith { .. } => {
            arith.push((tmpl, gnd));
            true
        }
        RTerm::Interval { .. } => tmpl == gnd,
    }
}

/// Parser for the textual form of substitutions and ground terms.
struct Parser<'a> {
    input: &'a str,
    cursor: usize,
}
impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser { input, cursor: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.cursor..]
    }
    fn is_eoi(&self) -> bool {
        self.cursor >= self.input.len()
    }
    fn ws(&mut self) {
        let rest = self.rest();
        self.cursor += rest.len() - rest.trim_start().len()
    }
    fn tag(&mut self, tag: &str) -> bool {
        self.ws();
        if self.rest().starts_with(tag) {
            self.cursor += tag.len();
            true
        } else {
            false
        }
    }
    fn error(&self, blah: &str) -> String {
        format!(
            "while parsing substitution `{}` at {}: {}",
            self.input, self.cursor, blah
        )
    }

    /// Parses an identifier: alphanumeric characters and underscores.
    fn ident(&mut self) -> Option<&'a str> {
        self.ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(idx, _)| idx)
            .unwrap_or_else(|| rest.len());
        if len == 0 {
            None
        } else {
            self.cursor += len;
            Some(&rest[0..len])
        }
    }

    fn subst(&mut self) -> Res<Subst> {
        if !self.tag("{") {
            bail!(self.error("expected `{`"))
        }
        let mut subst = Subst::new();
        if self.tag("}") {
            return Ok(subst);
        }
        loop {
            let var = match self.ident() {
                Some(id) if id.starts_with(|c: char| c.is_uppercase() || c == '_') => Var::new(id),
                _ => bail!(self.error("expected a variable")),
            };
            if !self.tag("->") {
                bail!(self.error("expected `->`"))
            }
            let term = self.term()?;
            subst.put(var, term)?;
            if self.tag(",") {
                continue;
            } else if self.tag("}") {
                return Ok(subst);
            } else {
                bail!(self.error("expected `,` or `}`"))
            }
        }
    }

    /// Parses the rest of some quoted text, the opening delimiter is already consumed.
    ///
    /// Backslashes escape the next character.
    fn quoted(&mut self, delim: char) -> Res<String> {
        let mut text = String::new();
        let mut escaped = false;
        for (idx, c) in self.rest().char_indices() {
            if escaped {
                text.push(c);
                escaped = false
            } else if c == '\\' {
                escaped = true
            } else if c == delim {
                self.cursor += idx + c.len_utf8();
                return Ok(text);
            } else {
                text.push(c)
            }
        }
        bail!(self.error("unterminated quoted text"))
    }

    fn term(&mut self) -> Res<Term> {
        if self.tag("\"") {
            return Ok(term::string(self.quoted('"')?));
        }
        let (sym, var_like) = if self.tag("'") {
            (self.quoted('\'')?, false)
        } else {
            let neg = self.tag("-");
            let id = match self.ident() {
                Some(id) => id,
                None => bail!(self.error("expected a term")),
            };
            if id.starts_with(|c: char| c.is_ascii_digit()) {
                // Sign and digits together, `i64::MIN` has no positive counterpart.
                let parsed = if neg {
                    i64::from_str(&format!("-{}", id))
                } else {
                    i64::from_str(id)
                };
                match parsed {
                    Ok(int) => return Ok(term::int(int)),
                    Err(e) => bail!(self.error(&e.to_string())),
                }
            } else if neg {
                bail!(self.error("expected an integer after `-`"))
            }
            let var_like = id.starts_with(|c: char| c.is_uppercase() || c == '_');
            (id.to_string(), var_like)
        };
        if self.tag("(") {
            let mut args = vec![];
            if !self.tag(")") {
                loop {
                    args.push(self.term()?);
                    if self.tag(",") {
                        continue;
                    } else if self.tag(")") {
                        break;
                    } else {
                        bail!(self.error("expected `,` or `)`"))
                    }
                }
            }
            Ok(term::fun(sym, args))
        } else if var_like {
            bail!(self.error("substitutions only bind ground terms"))
        } else {
            Ok(term::sym(sym))
        }
    }
}

/// Parses a ground term, used when decoding textual rule atoms.
pub fn parse_term(s: &str) -> Res<Term> {
    let mut parser = Parser::new(s);
    let term = parser.term()?;
    parser.ws();
    if !parser.is_eoi() {
        bail!(parser.error("expected end of input"))
    }
    Ok(term)
}
