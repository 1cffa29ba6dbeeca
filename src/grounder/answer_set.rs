//! Answer sets, as reported to the user.

use crate::common::*;
use crate::program::{Atom, Instance, Pred};

/// An answer set: the instances of each user predicate, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    /// Instances by predicate name and arity.
    preds: BTreeMap<(String, usize), Vec<Instance>>,
}

impl AnswerSet {
    /// Empty answer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a ground atom, returns true if it is new.
    pub fn add(&mut self, atom: &Atom) -> bool {
        let instances = self
            .preds
            .entry((atom.pred.name.clone(), atom.pred.arity))
            .or_insert_with(Vec::new);
        let instance = atom.to_instance();
        match instances.binary_search_by(|inst| term::cmp_slices(&inst.args, &instance.args)) {
            Ok(_) => false,
            Err(pos) => {
                instances.insert(pos, instance);
                true
            }
        }
    }

    /// Number of atoms.
    pub fn len(&self) -> usize {
        self.preds.values().map(|instances| instances.len()).sum()
    }
    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.preds.values().all(|instances| instances.is_empty())
    }

    /// Instances of a predicate, sorted.
    pub fn instances(&self, pred: &Pred) -> &[Instance] {
        self.preds
            .get(&(pred.name.clone(), pred.arity))
            .map(|instances| instances.as_slice())
            .unwrap_or(&[])
    }

    /// Atoms of the answer set, sorted by predicate then arguments.
    pub fn atoms(&self) -> impl Iterator<Item = String> + '_ {
        self.preds.iter().flat_map(|((name, _), instances)| {
            instances.iter().map(move |inst| {
                if inst.is_empty() {
                    name.clone()
                } else {
                    format!("{}{}", name, inst)
                }
            })
        })
    }
}

impl_fmt! {
    AnswerSet(self, fmt) {
        fmt.write_str("{ ")?;
        write_sep(fmt, ", ", self.atoms())?;
        fmt.write_str(" }")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sorted_and_deduplicated() {
        let mut set = AnswerSet::new();
        assert!(set.is_empty());
        assert!(set.add(&Atom::of("q", vec![term::sym("b")])));
        assert!(set.add(&Atom::of("q", vec![term::int(10)])));
        assert!(set.add(&Atom::of("q", vec![term::int(2)])));
        assert!(!set.add(&Atom::of("q", vec![term::int(2)])));
        assert!(set.add(&Atom::of("a", vec![])));
        assert_eq!(set.len(), 4);
        assert_eq!(set.to_string(), "{ a, q(2), q(10), q(b) }");
        let q = crate::program::pred("q", 1);
        assert_eq!(set.instances(&q).len(), 3);
    }
}
