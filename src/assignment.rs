//! Search engine assignment view.
//!
//! The grounder only reads the assignment of the search engine, through the [`Assignment`]
//! trait. [`MapAssignment`] is a simple implementation used by the demo driver and the tests.

use crate::common::*;

/// Truth values of the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThriceTruth {
    /// True.
    True,
    /// Must be true, true but not yet justified.
    MustBeTrue,
    /// False.
    False,
}
impl ThriceTruth {
    /// True for `True` and `MustBeTrue`.
    pub fn to_bool(self) -> bool {
        self != ThriceTruth::False
    }
}
impl_fmt! {
    ThriceTruth(self, fmt) {
        fmt.write_str(match self {
            ThriceTruth::True => "T",
            ThriceTruth::MustBeTrue => "M",
            ThriceTruth::False => "F",
        })
    }
}

/// Read access to a partial assignment of atoms.
pub trait Assignment {
    /// True if the atom is assigned.
    fn is_assigned(&self, atom: AtomId) -> bool {
        self.truth(atom).is_some()
    }
    /// Truth value of an atom, `None` if unassigned.
    fn truth(&self, atom: AtomId) -> Option<ThriceTruth>;
    /// Notifies the assignment that atoms up to some identifier may be queried.
    fn grow_for_max_atom_id(&mut self, max: AtomId);
}

/// Assignment stored in a hash map.
#[derive(Debug, Clone, Default)]
pub struct MapAssignment {
    /// Truth values.
    map: HashMap<AtomId, ThriceTruth>,
    /// Largest atom identifier the assignment was grown for.
    max: Option<AtomId>,
}
impl MapAssignment {
    /// Empty assignment.
    pub fn new() -> Self {
        Self::default()
    }
    /// Assigns an atom, returns the previous value if any.
    pub fn assign(&mut self, atom: AtomId, truth: ThriceTruth) -> Option<ThriceTruth> {
        self.map.insert(atom, truth)
    }
    /// Unassigns an atom.
    pub fn unassign(&mut self, atom: AtomId) -> Option<ThriceTruth> {
        self.map.remove(&atom)
    }
    /// Atoms assigned true or must-be-true, sorted.
    pub fn true_atoms(&self) -> Vec<AtomId> {
        let mut res: Vec<_> = self
            .map
            .iter()
            .filter(|(_, truth)| truth.to_bool())
            .map(|(atom, _)| *atom)
            .collect();
        res.sort();
        res
    }
    /// Number of assigned atoms.
    pub fn len(&self) -> usize {
        self.map.len()
    }
    /// True if nothing is assigned.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
    /// Largest atom identifier the assignment was grown for.
    pub fn max_atom_id(&self) -> Option<AtomId> {
        self.max
    }
}
impl Assignment for MapAssignment {
    fn truth(&self, atom: AtomId) -> Option<ThriceTruth> {
        self.map.get(&atom).cloned()
    }
    fn grow_for_max_atom_id(&mut self, max: AtomId) {
        if self.max.map(|old| old < max).unwrap_or(true) {
            self.max = Some(max)
        }
    }
}
