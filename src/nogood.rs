//! NoGoods: ground constraints forbidding a combination of truth values.
//!
//! A nogood is a set of signed atoms, *literals*, that cannot all hold at the same time. A
//! positive literal holds when its atom is true, a negative one when its atom is false.
//!
//! Literals are encoded as `2 * atom + sign`, where the sign is `1` for negative literals. The
//! literals of a nogood are sorted on this encoding and deduplicated, except for the *head* of
//! head-first nogoods which stays in first position. The head is always negative: a head-first
//! nogood `{-h, l1, ..., ln}` reads *`h` holds if `l1`, ..., `ln` hold*, which lets the search
//! engine propagate toward the head.

use crate::common::*;

/// A literal: an atom and a sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(usize);
impl Lit {
    /// Positive literal.
    pub fn pos(atom: AtomId) -> Self {
        Lit(*atom << 1)
    }
    /// Negative literal.
    pub fn neg(atom: AtomId) -> Self {
        Lit((*atom << 1) | 1)
    }
    /// Literal from an atom and a sign.
    pub fn new(atom: AtomId, neg: bool) -> Self {
        if neg {
            Self::neg(atom)
        } else {
            Self::pos(atom)
        }
    }
    /// Atom of the literal.
    pub fn atom(self) -> AtomId {
        AtomId::new(self.0 >> 1)
    }
    /// True if negative.
    pub fn is_neg(self) -> bool {
        self.0 & 1 == 1
    }
    /// Negation of the literal.
    pub fn negate(self) -> Self {
        Lit(self.0 ^ 1)
    }
    /// Encoding of the literal.
    pub fn code(self) -> usize {
        self.0
    }
}
impl_fmt! {
    Lit(self, fmt) {
        write!(fmt, "{}{}", if self.is_neg() { "-" } else { "+" }, self.atom())
    }
}

/// Kinds of nogoods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoGoodType {
    /// Encodes the program.
    Static,
    /// Only mentions solver-internal atoms beyond body-representatives.
    Internal,
    /// Closes the justification of a head with a unique defining rule.
    Support,
    /// Learnt by the search engine.
    Learnt,
}
impl_fmt! {
    NoGoodType(self, fmt) {
        fmt.write_str(match self {
            NoGoodType::Static => "static",
            NoGoodType::Internal => "internal",
            NoGoodType::Support => "support",
            NoGoodType::Learnt => "learnt",
        })
    }
}

/// A nogood.
///
/// Equality and hashing ignore the kind.
#[derive(Debug, Clone)]
pub struct NoGood {
    /// Literals, head first if any.
    lits: Vec<Lit>,
    /// True if the first literal is the head.
    head: bool,
    /// Kind.
    typ: NoGoodType,
}

impl PartialEq for NoGood {
    fn eq(&self, other: &NoGood) -> bool {
        self.head == other.head && self.lits == other.lits
    }
}
impl Eq for NoGood {}
impl ::std::hash::Hash for NoGood {
    fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
        self.head.hash(state);
        self.lits.hash(state)
    }
}

impl NoGood {
    /// Constructor, sorts and deduplicates the literals after the head, if any.
    ///
    /// # Panics
    ///
    /// In debug, if `head` and the first literal is not negative.
    fn mk(typ: NoGoodType, mut lits: Vec<Lit>, head: bool) -> Self {
        debug_assert! { !head || lits.first().map(|lit| lit.is_neg()).unwrap_or(false) }
        let start = if head { 1.min(lits.len()) } else { 0 };
        lits[start..].sort_unstable();
        let mut tail = lits.split_off(start);
        tail.dedup();
        lits.extend(tail);
        NoGood { lits, head, typ }
    }

    /// Static nogood without head.
    pub fn new(lits: Vec<Lit>) -> Self {
        Self::mk(NoGoodType::Static, lits, false)
    }
    /// Nogood of some kind, without head.
    pub fn of_type(typ: NoGoodType, lits: Vec<Lit>) -> Self {
        Self::mk(typ, lits, false)
    }
    /// Learnt nogood.
    pub fn learnt(lits: Vec<Lit>) -> Self {
        Self::mk(NoGoodType::Learnt, lits, false)
    }
    /// Static head-first nogood, the first literal is the (negative) head.
    pub fn head_first(lits: Vec<Lit>) -> Self {
        Self::mk(NoGoodType::Static, lits, true)
    }
    /// Internal head-first nogood.
    pub fn head_first_internal(lits: Vec<Lit>) -> Self {
        Self::mk(NoGoodType::Internal, lits, true)
    }
    /// Nogood stating that a negative literal's atom is true.
    pub fn fact(lit: Lit) -> Self {
        Self::head_first(vec![lit])
    }
    /// Support nogood: the head cannot hold without the body-representative.
    pub fn support(head: Lit, body: Lit) -> Self {
        Self::mk(NoGoodType::Support, vec![head, body.negate()], false)
    }

    /// Nogood forbidding a constraint's body: positive atoms true, negative ones false.
    pub fn from_constraint(pos: &[AtomId], neg: &[AtomId]) -> Self {
        Self::new(Self::body_lits(vec![], pos, neg))
    }
    /// Static nogood: the body-representative holds if the body holds.
    pub fn from_body(pos: &[AtomId], neg: &[AtomId], body: Lit) -> Self {
        Self::mk(
            NoGoodType::Static,
            Self::body_lits(vec![body.negate()], pos, neg),
            true,
        )
    }
    /// Internal version of [`NoGood::from_body`].
    pub fn from_body_internal(pos: &[AtomId], neg: &[AtomId], body: Lit) -> Self {
        Self::mk(
            NoGoodType::Internal,
            Self::body_lits(vec![body.negate()], pos, neg),
            true,
        )
    }
    /// Appends the literals of a body.
    fn body_lits(mut lits: Vec<Lit>, pos: &[AtomId], neg: &[AtomId]) -> Vec<Lit> {
        lits.reserve(pos.len() + neg.len());
        lits.extend(pos.iter().map(|atom| Lit::pos(*atom)));
        lits.extend(neg.iter().map(|atom| Lit::neg(*atom)));
        lits
    }

    /// Literals, head first if any.
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }
    /// Number of literals.
    pub fn len(&self) -> usize {
        self.lits.len()
    }
    /// True for the empty nogood.
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }
    /// True if the nogood has a head.
    pub fn has_head(&self) -> bool {
        self.head
    }
    /// Head of the nogood.
    pub fn head(&self) -> Option<Lit> {
        if self.head {
            self.lits.first().cloned()
        } else {
            None
        }
    }
    /// Kind of the nogood.
    pub fn typ(&self) -> NoGoodType {
        self.typ
    }
    /// Literal at some position.
    pub fn lit(&self, idx: usize) -> Lit {
        self.lits[idx]
    }
    /// Same nogood without head.
    pub fn without_head(&self) -> Self {
        Self::mk(self.typ, self.lits.clone(), false)
    }
}

impl_fmt! {
    NoGood(self, fmt) {
        if self.head {
            fmt.write_str("*")?
        }
        fmt.write_str("{ ")?;
        for lit in &self.lits {
            write!(fmt, "{} ", lit)?
        }
        fmt.write_str("}")
    }
}

/// Assigns stable identifiers to nogoods.
#[derive(Debug, Clone, Default)]
pub struct NoGoodRegistry {
    /// Identifiers of the nogoods registered so far.
    ids: HashMap<NoGood, NoGoodId>,
    /// Next identifier.
    next: usize,
}
impl NoGoodRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }
    /// Number of nogoods registered.
    pub fn len(&self) -> usize {
        self.ids.len()
    }
    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Registers a nogood, returns its identifier.
    ///
    /// A nogood equal to a known one gets the identifier of the known one.
    pub fn register(&mut self, nogood: NoGood) -> NoGoodId {
        self.register_new(nogood).0
    }

    /// Registers a nogood, returns its identifier and true if it was not known before.
    pub fn register_new(&mut self, nogood: NoGood) -> (NoGoodId, bool) {
        if let Some(id) = self.ids.get(&nogood) {
            return (*id, false);
        }
        let id = NoGoodId::new(self.next);
        self.next += 1;
        self.ids.insert(nogood, id);
        (id, true)
    }

    /// Registers some nogoods, new ones are added to `new`.
    pub fn register_all<I>(&mut self, nogoods: I, new: &mut BTreeMap<NoGoodId, NoGood>)
    where
        I: IntoIterator<Item = NoGood>,
    {
        for nogood in nogoods {
            let (id, is_new) = self.register_new(nogood.clone());
            if is_new {
                new.insert(id, nogood);
            }
        }
    }
}
