//! Ground atoms and the atom store.
//!
//! The atom store interns ground atoms to stable [`AtomId`]s. It is shared with the search
//! engine, but only the grounder inserts atoms.

use crate::common::*;
use crate::nogood::NoGood;
use crate::program::{self, Atom, Pred};
use crate::subst::Subst;

/// A body-representative atom: identifies one ground instantiation of a rule.
///
/// Stored as a structured key, the textual form `_R_("id","{..}")` only appears when displaying
/// or materializing the atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleAtom {
    /// Rule.
    pub rule: RuleId,
    /// Ground substitution.
    pub subst: Subst,
}
impl RuleAtom {
    /// Constructor.
    pub fn new(rule: RuleId, subst: Subst) -> Self {
        RuleAtom { rule, subst }
    }
}

/// Ground atoms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroundAtom {
    /// Ground atom over an ordinary or a weak constraint predicate.
    Basic(Atom),
    /// Body-representative atom.
    Rule(RuleAtom),
    /// Choice enabler.
    ChoiceOn(usize),
    /// Choice disabler.
    ChoiceOff(usize),
}

impl GroundAtom {
    /// Predicate of the atom.
    pub fn pred(&self) -> Pred {
        match self {
            GroundAtom::Basic(atom) => atom.pred.clone(),
            GroundAtom::Rule(_) => program::rule_atom_pred(),
            GroundAtom::ChoiceOn(_) => program::choice_on_pred(),
            GroundAtom::ChoiceOff(_) => program::choice_off_pred(),
        }
    }

    /// Basic atom, if any.
    pub fn basic(&self) -> Option<&Atom> {
        match self {
            GroundAtom::Basic(atom) => Some(atom),
            _ => None,
        }
    }

    /// True for body-representative atoms.
    pub fn is_rule_atom(&self) -> bool {
        matches!(self, GroundAtom::Rule(_))
    }

    /// Materializes the atom as a plain ground atom.
    pub fn to_atom(&self) -> Atom {
        match self {
            GroundAtom::Basic(atom) => atom.clone(),
            GroundAtom::Rule(RuleAtom { rule, subst }) => Atom {
                pred: program::rule_atom_pred(),
                args: vec![
                    term::string(rule.to_string()),
                    term::string(subst.to_string()),
                ],
            },
            GroundAtom::ChoiceOn(id) => Atom {
                pred: program::choice_on_pred(),
                args: vec![term::int(*id as i64)],
            },
            GroundAtom::ChoiceOff(id) => Atom {
                pred: program::choice_off_pred(),
                args: vec![term::int(*id as i64)],
            },
        }
    }

    /// Decodes a plain ground atom, inverse of [`GroundAtom::to_atom`].
    pub fn from_atom(atom: Atom) -> Res<Self> {
        if atom.pred == program::rule_atom_pred() {
            let (rule, subst) = match atom.args.as_slice() {
                [rule, subst] => match (rule.get(), subst.get()) {
                    (RTerm::Cst(Cst::Str(rule)), RTerm::Cst(Cst::Str(subst))) => (rule, subst),
                    _ => bail!("illegal rule atom `{}`", atom),
                },
                _ => bail!("illegal rule atom `{}`", atom),
            };
            let rule = rule
                .parse::<usize>()
                .chain_err(|| format!("illegal rule id in `{}`", atom))?;
            let subst = subst
                .parse::<Subst>()
                .chain_err(|| format!("illegal substitution in `{}`", atom))?;
            return Ok(GroundAtom::Rule(RuleAtom::new(RuleId::new(rule), subst)));
        }
        let choice_on = atom.pred == program::choice_on_pred();
        if choice_on || atom.pred == program::choice_off_pred() {
            let id = match atom.args.first().and_then(|arg| arg.int_val()) {
                Some(id) if id >= 0 => id as usize,
                _ => bail!("illegal choice atom `{}`", atom),
            };
            return Ok(if choice_on {
                GroundAtom::ChoiceOn(id)
            } else {
                GroundAtom::ChoiceOff(id)
            });
        }
        if !atom.is_ground() {
            bail!(ErrorKind::Unsupported(format!(
                "non-ground atom `{}` cannot be stored",
                atom
            )))
        }
        Ok(GroundAtom::Basic(atom))
    }
}

impl_fmt! {
    GroundAtom(self, fmt) {
        match self {
            GroundAtom::Basic(atom) => write!(fmt, "{}", atom),
            GroundAtom::Rule(RuleAtom { rule, subst }) => {
                write!(fmt, "_R_(\"{}\",\"{}\")", rule, subst)
            }
            GroundAtom::ChoiceOn(id) => write!(fmt, "ChoiceOn({})", id),
            GroundAtom::ChoiceOff(id) => write!(fmt, "ChoiceOff({})", id),
        }
    }
}

impl From<Atom> for GroundAtom {
    fn from(atom: Atom) -> Self {
        GroundAtom::Basic(atom)
    }
}

/// Interning of ground atoms.
pub trait AtomStore {
    /// Identifier of an atom, interning it if needed.
    fn put_if_absent(&mut self, atom: GroundAtom) -> AtomId;
    /// Atom corresponding to an identifier.
    fn get(&self, id: AtomId) -> Option<&GroundAtom>;
    /// Identifier of an atom, if known.
    fn id_of(&self, atom: &GroundAtom) -> Option<AtomId>;
    /// Largest identifier assigned so far.
    fn max_atom_id(&self) -> Option<AtomId>;

    /// True if the atom is known.
    fn contains(&self, atom: &GroundAtom) -> bool {
        self.id_of(atom).is_some()
    }

    /// String representation of an atom.
    fn atom_to_string(&self, id: AtomId) -> String {
        match self.get(id) {
            Some(atom) => atom.to_string(),
            None => format!("<unknown atom {}>", id),
        }
    }

    /// String representation of a nogood, with atoms instead of identifiers.
    fn nogood_to_string(&self, nogood: &NoGood) -> String {
        let mut s = String::new();
        if nogood.has_head() {
            s.push('*')
        }
        s.push_str("{ ");
        for lit in nogood.lits() {
            s.push(if lit.is_neg() { '-' } else { '+' });
            s.push_str(&self.atom_to_string(lit.atom()));
            s.push(' ')
        }
        s.push('}');
        s
    }
}

/// Atom store backed by a vector and a hash map.
#[derive(Debug, Clone)]
pub struct AtomTable {
    /// Atoms by identifier.
    atoms: AtomMap<GroundAtom>,
    /// Identifiers of the atoms.
    ids: HashMap<GroundAtom, AtomId>,
}
impl AtomTable {
    /// Empty store.
    pub fn new() -> Self {
        AtomTable {
            atoms: AtomMap::with_capacity(1_000),
            ids: HashMap::with_capacity(1_000),
        }
    }
    /// Number of atoms.
    pub fn len(&self) -> usize {
        self.atoms.len()
    }
    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
    /// Iterator over the atoms and their identifiers.
    pub fn iter(&self) -> impl Iterator<Item = (AtomId, &GroundAtom)> {
        self.atoms.index_iter()
    }
}

impl AtomStore for AtomTable {
    fn put_if_absent(&mut self, atom: GroundAtom) -> AtomId {
        if let Some(id) = self.ids.get(&atom) {
            return *id;
        }
        let id = self.atoms.next_index();
        self.ids.insert(atom.clone(), id);
        self.atoms.push(atom);
        id
    }
    fn get(&self, id: AtomId) -> Option<&GroundAtom> {
        if *id < self.atoms.len() {
            Some(&self.atoms[id])
        } else {
            None
        }
    }
    fn id_of(&self, atom: &GroundAtom) -> Option<AtomId> {
        self.ids.get(atom).cloned()
    }
    fn max_atom_id(&self) -> Option<AtomId> {
        if self.atoms.is_empty() {
            None
        } else {
            Some(AtomId::new(self.atoms.len() - 1))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nogood::Lit;

    #[test]
    fn interning() {
        let mut store = AtomTable::new();
        assert!(store.is_empty());
        let p1 = GroundAtom::from(Atom::of("p", vec![term::int(1)]));
        let id = store.put_if_absent(p1.clone());
        assert_eq!(store.put_if_absent(p1.clone()), id);
        assert!(store.contains(&p1));
        assert_eq!(store.max_atom_id(), Some(id));
        let on = store.put_if_absent(GroundAtom::ChoiceOn(0));
        assert_ne!(on, id);
        assert_eq!(store.len(), 2);
        assert_eq!(store.atom_to_string(on), "ChoiceOn(0)");
        assert!(store.get(AtomId::new(7)).is_none());

        let nogood = NoGood::head_first(vec![Lit::neg(on), Lit::pos(id)]);
        assert_eq!(store.nogood_to_string(&nogood), "*{ -ChoiceOn(0) +p(1) }");
    }

    #[test]
    fn rule_atoms() {
        let subst = Subst::new()
            .with(Var::new("X"), term::sym("a"))
            .unwrap()
            .with(Var::new("Y"), term::int(3))
            .unwrap();
        let atom = GroundAtom::Rule(RuleAtom::new(RuleId::new(2), subst));
        assert_eq!(atom.to_string(), "_R_(\"2\",\"{X->a,Y->3}\")");
        assert!(atom.pred().solver_internal);
        let plain = atom.to_atom();
        assert_eq!(plain.to_string(), atom.to_string());
        assert_eq!(GroundAtom::from_atom(plain).unwrap(), atom);

        let off = GroundAtom::ChoiceOff(4);
        assert_eq!(GroundAtom::from_atom(off.to_atom()).unwrap(), off);
        assert!(GroundAtom::from_atom(Atom::of("p", vec![term::var("X")])).is_err());
    }
}
