//! Grounding orders.
//!
//! A grounding order is the sequence in which the body literals of a rule are bound, starting
//! from some *starting literal*. Orders are computed once per rule and starting literal when the
//! program is built. During the binding search, literals that cannot be bound yet are *pushed
//! back*: the search continues on a new order where the literal is appended after the current
//! end, and only considered again once some later literal binds successfully.

use crate::common::*;
use crate::program::literal::Literal;

/// An order over the literals of a rule body, excluding the starting literal unless the rule has
/// a fixed instantiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingOrder {
    /// Starting literal, `None` for fixed instantiations.
    start: Option<LitIdx>,
    /// Literals to bind, in order.
    others: Vec<LitIdx>,
    /// Position at which the binding stops.
    stop: usize,
    /// Position of the last literal binding new variables.
    last_var_bound: Option<usize>,
    /// True if the rule is ground.
    ground: bool,
}

impl GroundingOrder {
    /// Constructor.
    fn new(
        start: Option<LitIdx>,
        others: Vec<LitIdx>,
        last_var_bound: Option<usize>,
        ground: bool,
    ) -> Self {
        let stop = others.len();
        GroundingOrder {
            start,
            others,
            stop,
            last_var_bound,
            ground,
        }
    }

    /// Starting literal, `None` for fixed instantiations.
    pub fn start(&self) -> Option<LitIdx> {
        self.start
    }
    /// Number of literals in the order, including pushed back ones.
    pub fn len(&self) -> usize {
        self.others.len()
    }
    /// True if the order has no literals.
    pub fn is_empty(&self) -> bool {
        self.others.is_empty()
    }
    /// Position at which the binding currently stops.
    pub fn stop(&self) -> usize {
        self.stop
    }
    /// Position of the last literal binding new variables, if any.
    pub fn position_last_var_bound(&self) -> Option<usize> {
        self.last_var_bound
    }
    /// True if the rule is ground.
    pub fn is_ground(&self) -> bool {
        self.ground
    }

    /// Literal at some position, `None` if the position is at or past the stop position.
    pub fn literal_at(&self, pos: usize) -> Option<LitIdx> {
        if pos < self.stop {
            self.others.get(pos).cloned()
        } else {
            None
        }
    }

    /// Pushes back the literal at some position.
    ///
    /// Returns a new order where the literal is appended after the current end, with the same
    /// stop position. Returns `None` if `pos` is the last position before the stop position, in
    /// which case there is nothing left to try before the literal.
    pub fn push_back(&self, pos: usize) -> Option<GroundingOrder> {
        if pos + 1 >= self.stop {
            return None;
        }
        let lit = *self.others.get(pos)?;
        let mut res = self.clone();
        res.others.push(lit);
        Some(res)
    }

    /// New order where the stop position is the current end of the order.
    pub fn consider_until_current_end(&self) -> GroundingOrder {
        let mut res = self.clone();
        res.stop = res.others.len();
        res
    }

    /// String representation, given the body of the rule.
    ///
    /// Pushed back literals appear after `|`.
    pub fn to_string_info(&self, body: &[Literal]) -> String {
        let mut s = String::new();
        match self.start {
            Some(start) => s.push_str(&body[*start].to_string()),
            None => s.push_str("_"),
        }
        s.push_str(" :");
        for (pos, idx) in self.others.iter().enumerate() {
            if pos == self.stop {
                s.push_str(" |")
            } else if pos > 0 {
                s.push(',')
            }
            s.push(' ');
            s.push_str(&body[**idx].to_string())
        }
        s
    }
}

impl_fmt! {
    GroundingOrder(self, fmt) {
        match self.start {
            Some(start) => write!(fmt, "{}", start)?,
            None => fmt.write_str("_")?,
        }
        fmt.write_str(" :")?;
        for (pos, idx) in self.others.iter().enumerate() {
            if pos == self.stop {
                fmt.write_str(" |")?
            } else if pos > 0 {
                fmt.write_str(",")?
            }
            write!(fmt, " {}", idx)?
        }
        Ok(())
    }
}

/// Grounding information of a rule: starting literals and grounding orders.
#[derive(Debug, Clone)]
pub struct GroundingInfo {
    /// Starting literals.
    starting: Vec<LitIdx>,
    /// True if the rule has a fixed instantiation, independent of working memory.
    fixed: bool,
    /// Order for each starting literal. Empty for fixed instantiations.
    orders: BTreeMap<LitIdx, GroundingOrder>,
    /// Order of fixed instantiations.
    fixed_order: Option<GroundingOrder>,
}

impl GroundingInfo {
    /// Computes the grounding information of a rule body.
    ///
    /// A ground rule has a fixed instantiation and all its literals are starting literals.
    /// Otherwise the starting literals are the literals without non-binding variables. Positive
    /// basic ones are preferred, if there are none the instantiation is fixed and starts from
    /// the other ones.
    ///
    /// Fails if no starting literal exists, or if some literal can never be bound.
    pub fn new<R: fmt::Display>(rule: &R, body: &[Literal], ground: bool) -> Res<Self> {
        let mut ordinary = vec![];
        let mut others = vec![];
        if ground {
            others = (0..body.len()).map(LitIdx::new).collect()
        } else {
            for (idx, lit) in body.iter().enumerate() {
                if !lit.non_binding_vars().is_empty() {
                    continue;
                }
                if lit.is_pos_basic() {
                    ordinary.push(LitIdx::new(idx))
                } else {
                    others.push(LitIdx::new(idx))
                }
            }
        }

        let (starting, fixed) = if !ordinary.is_empty() {
            (ordinary, false)
        } else if !others.is_empty() || (ground && body.is_empty()) {
            (others, true)
        } else {
            bail!(ErrorKind::UnsafeRule(rule.to_string()))
        };

        let mut info = GroundingInfo {
            starting,
            fixed,
            orders: BTreeMap::new(),
            fixed_order: None,
        };

        if fixed {
            let order = match info.starting.first() {
                Some(start) => compute_order(rule, body, *start, true, ground)?,
                None => GroundingOrder::new(None, vec![], None, ground),
            };
            info.fixed_order = Some(order)
        } else {
            for start in &info.starting {
                let order = compute_order(rule, body, *start, false, ground)?;
                info.orders.insert(*start, order);
            }
        }

        Ok(info)
    }

    /// Starting literals.
    pub fn starting_literals(&self) -> &[LitIdx] {
        &self.starting
    }
    /// True if the rule has a fixed instantiation.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }
    /// Order starting from some literal.
    pub fn order_from(&self, start: LitIdx) -> Option<&GroundingOrder> {
        self.orders.get(&start)
    }
    /// Order of the fixed instantiation, if any.
    pub fn fixed_order(&self) -> Option<&GroundingOrder> {
        self.fixed_order.as_ref()
    }

    /// All the orders, the fixed one or the ones for each starting literal.
    pub fn orders(&self) -> impl Iterator<Item = &GroundingOrder> {
        match self.fixed_order {
            Some(ref order) => Either::Left(::std::iter::once(order)),
            None => Either::Right(self.orders.values()),
        }
    }
}

/// Computes the order starting from some literal.
///
/// Greedy: picks the first literal whose non-binding variables are all bound, preferring literals
/// sharing variables with the ones already bound to avoid cross products.
fn compute_order<R: fmt::Display>(
    rule: &R,
    body: &[Literal],
    start: LitIdx,
    fixed: bool,
    ground: bool,
) -> Res<GroundingOrder> {
    let mut bound = body[*start].binding_vars();
    let mut remaining: Vec<LitIdx> = (0..body.len())
        .map(LitIdx::new)
        .filter(|idx| *idx != start)
        .collect();
    let mut order = Vec::with_capacity(body.len());
    if fixed {
        order.push(start)
    }

    let mut last_var_bound = None;
    while !remaining.is_empty() {
        let mut best: Option<(usize, bool)> = None;
        for (pos, idx) in remaining.iter().enumerate() {
            let lit = &body[**idx];
            let non_binding = lit.non_binding_vars();
            if !non_binding.iter().all(|var| bound.contains(var)) {
                continue;
            }
            let shares = lit
                .binding_vars()
                .iter()
                .chain(non_binding.iter())
                .any(|var| bound.contains(var));
            match best {
                None => best = Some((pos, shares)),
                Some((_, false)) if shares => best = Some((pos, shares)),
                Some(_) => (),
            }
        }

        let pos = match best {
            Some((pos, _)) => pos,
            None => bail!(ErrorKind::UnsafeRule(format!(
                "{}, no grounding order starting from `{}`",
                rule, body[*start]
            ))),
        };
        let next = remaining.remove(pos);
        let mut new_vars = false;
        for var in body[*next].binding_vars() {
            new_vars = bound.insert(var) || new_vars
        }
        if new_vars {
            last_var_bound = Some(order.len())
        }
        order.push(next)
    }

    Ok(GroundingOrder::new(
        if fixed { None } else { Some(start) },
        order,
        last_var_bound,
        ground,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::program::{literal::CmpOp, Atom};

    fn x() -> Term {
        term::var("X")
    }
    fn y() -> Term {
        term::var("Y")
    }

    #[test]
    fn starting_literals() {
        // c(X) :- a(X), b(X), X < 3.
        let body = vec![
            Literal::pos(Atom::of("a", vec![x()])),
            Literal::pos(Atom::of("b", vec![x()])),
            Literal::cmp(x(), CmpOp::Lt, term::int(3)),
        ];
        let info = GroundingInfo::new(&"rule", &body, false).unwrap();
        assert!(!info.is_fixed());
        assert_eq!(info.starting_literals(), &[LitIdx::new(0), LitIdx::new(1)]);
        let order = info.order_from(LitIdx::new(0)).unwrap();
        assert_eq!(order.start(), Some(LitIdx::new(0)));
        assert_eq!(order.len(), 2);
        assert_eq!(order.literal_at(0), Some(LitIdx::new(1)));
        assert_eq!(order.literal_at(1), Some(LitIdx::new(2)));
        assert_eq!(order.literal_at(2), None);
        assert_eq!(order.position_last_var_bound(), None);
        assert_eq!(order.to_string_info(&body), "a(X) : b(X), X < 3");
        assert_eq!(info.orders().count(), 2)
    }

    #[test]
    fn fixed_instantiation() {
        // p(Y) :- X in 1..3, not q(X), Y = X + 2.
        let body = vec![
            Literal::neg(Atom::of("q", vec![x()])),
            Literal::cmp(
                y(),
                CmpOp::Eq,
                term::arith(term::ArithOp::Add, x(), term::int(2)),
            ),
            Literal::interval(x(), term::int(1), term::int(3)),
        ];
        let info = GroundingInfo::new(&"rule", &body, false).unwrap();
        assert!(info.is_fixed());
        assert_eq!(info.starting_literals(), &[LitIdx::new(2)]);
        let order = info.fixed_order().unwrap();
        assert_eq!(order.start(), None);
        assert_eq!(order.len(), 3);
        assert_eq!(order.literal_at(0), Some(LitIdx::new(2)));
        assert_eq!(order.position_last_var_bound(), Some(2));
        assert!(info.order_from(LitIdx::new(2)).is_none());
        assert_eq!(info.orders().count(), 1)
    }

    #[test]
    fn ground_rule() {
        let body = vec![
            Literal::neg(Atom::of("b", vec![])),
            Literal::pos(Atom::of("c", vec![])),
        ];
        let info = GroundingInfo::new(&"a :- not b, c.", &body, true).unwrap();
        assert!(info.is_fixed());
        assert_eq!(info.starting_literals().len(), 2);
        let order = info.fixed_order().unwrap();
        assert!(order.is_ground());
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn unsafe_rules() {
        // Only a negative literal.
        let body = vec![Literal::neg(Atom::of("q", vec![x()]))];
        let err = GroundingInfo::new(&"p(X) :- not q(X).", &body, false).unwrap_err();
        assert!(err.is_unsupported());
        // `Y` is never bound.
        let body = vec![
            Literal::pos(Atom::of("a", vec![x()])),
            Literal::cmp(x(), CmpOp::Lt, y()),
        ];
        let err = GroundingInfo::new(&"p(X) :- a(X), X < Y.", &body, false).unwrap_err();
        assert!(err.is_unsupported())
    }

    #[test]
    fn prefers_shared_variables() {
        // p :- a(X), b(Y), c(X, Y), d(X).
        let body = vec![
            Literal::pos(Atom::of("a", vec![x()])),
            Literal::pos(Atom::of("b", vec![y()])),
            Literal::pos(Atom::of("c", vec![x(), y()])),
            Literal::pos(Atom::of("d", vec![x()])),
        ];
        let info = GroundingInfo::new(&"rule", &body, false).unwrap();
        let order = info.order_from(LitIdx::new(0)).unwrap();
        let lits: Vec<_> = (0..order.len()).filter_map(|pos| order.literal_at(pos)).collect();
        assert_eq!(
            lits,
            vec![LitIdx::new(2), LitIdx::new(1), LitIdx::new(3)]
        );
        assert_eq!(order.position_last_var_bound(), Some(0))
    }

    #[test]
    fn push_back() {
        let body = vec![
            Literal::pos(Atom::of("a", vec![x()])),
            Literal::pos(Atom::of("b", vec![x()])),
            Literal::pos(Atom::of("c", vec![x()])),
            Literal::pos(Atom::of("d", vec![x()])),
        ];
        let info = GroundingInfo::new(&"rule", &body, false).unwrap();
        let order = info.order_from(LitIdx::new(0)).unwrap();
        assert_eq!(order.to_string_info(&body), "a(X) : b(X), c(X), d(X)");

        let pushed = order.push_back(0).unwrap();
        assert_eq!(pushed.len(), 4);
        assert_eq!(pushed.stop(), 3);
        assert_eq!(pushed.literal_at(3), None);
        assert_eq!(
            pushed.to_string_info(&body),
            "a(X) : b(X), c(X), d(X) | b(X)"
        );
        // Last position before the stop, nothing left to try.
        assert!(pushed.push_back(2).is_none());
        assert!(order.push_back(2).is_none());

        let widened = pushed.consider_until_current_end();
        assert_eq!(widened.stop(), 4);
        assert_eq!(widened.literal_at(3), Some(LitIdx::new(1)));
        // Original order untouched.
        assert_eq!(order.stop(), 3);
        assert_eq!(order.len(), 3)
    }
}
