//! Working memory: indexed relations, one per predicate.
//!
//! Each [`Storage`] holds the instances of a predicate, with optional indices on positions and a
//! *delta*: the instances added since the last time the grounder consumed them. The
//! [`WorkingMemory`] maps predicates to storages and remembers which ones were modified during the
//! current round.

use crate::common::*;
use crate::program::{Atom, Instance, Pred};

/// Index on a position: maps terms to the stamps of the instances mentioning them.
type Index = HashMap<Term, BTreeSet<usize>>;

/// The relation of a predicate.
///
/// Instances are a set, adding a known instance is a no-op. Iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Predicate.
    pred: Pred,
    /// Instances by insertion stamp.
    instances: BTreeMap<usize, Instance>,
    /// Stamps of the instances.
    stamps: HashMap<Instance, usize>,
    /// Next stamp.
    next_stamp: usize,
    /// Indices, by position.
    indices: Vec<Option<Index>>,
    /// Instances added since the last call to `mark_done`.
    recent: Vec<Instance>,
}

impl Storage {
    /// Storage without indices.
    pub fn new(pred: Pred) -> Self {
        let indices = vec![None; pred.arity];
        Storage {
            pred,
            instances: BTreeMap::new(),
            stamps: HashMap::new(),
            next_stamp: 0,
            indices,
            recent: vec![],
        }
    }

    /// Storage with an index on every position.
    pub fn indexed(pred: Pred) -> Self {
        let mut storage = Self::new(pred);
        for index in storage.indices.iter_mut() {
            *index = Some(Index::new())
        }
        storage
    }

    /// Predicate of the storage.
    pub fn pred(&self) -> &Pred {
        &self.pred
    }
    /// Number of instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }
    /// True if there are no instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
    /// True if the storage contains some instance.
    pub fn contains(&self, instance: &Instance) -> bool {
        self.stamps.contains_key(instance)
    }
    /// All the instances, in insertion order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }
    /// True if some position is indexed.
    pub fn is_indexed(&self, pos: usize) -> bool {
        self.indices.get(pos).map(Option::is_some).unwrap_or(false)
    }

    /// Creates an index on a position.
    pub fn add_index(&mut self, pos: usize) -> Res<()> {
        self.check_pos(pos)?;
        let mut index = Index::new();
        for (stamp, instance) in &self.instances {
            index
                .entry(instance.args[pos].clone())
                .or_insert_with(BTreeSet::new)
                .insert(*stamp);
        }
        self.indices[pos] = Some(index);
        Ok(())
    }
    /// Drops the index on a position.
    pub fn remove_index(&mut self, pos: usize) {
        if let Some(index) = self.indices.get_mut(pos) {
            *index = None
        }
    }

    /// Adds an instance, returns true if it is new.
    ///
    /// New instances go in the delta.
    pub fn add(&mut self, instance: Instance) -> Res<bool> {
        if instance.len() != self.pred.arity {
            bail!(ErrorKind::ArityMismatch(
                self.pred.name.clone(),
                self.pred.arity,
                instance.len()
            ))
        }
        if self.stamps.contains_key(&instance) {
            return Ok(false);
        }
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        for (arg, index) in instance.args.iter().zip(self.indices.iter_mut()) {
            if let Some(index) = index {
                index
                    .entry(arg.clone())
                    .or_insert_with(BTreeSet::new)
                    .insert(stamp);
            }
        }
        self.stamps.insert(instance.clone(), stamp);
        self.instances.insert(stamp, instance.clone());
        self.recent.push(instance);
        Ok(true)
    }

    /// Removes an instance, returns true if it was present.
    ///
    /// Fails if the delta has not been consumed.
    pub fn remove(&mut self, instance: &Instance) -> Res<bool> {
        if !self.recent.is_empty() {
            bail!(ErrorKind::Pending(self.pred.to_string()))
        }
        let stamp = match self.stamps.remove(instance) {
            Some(stamp) => stamp,
            None => return Ok(false),
        };
        for (arg, index) in instance.args.iter().zip(self.indices.iter_mut()) {
            if let Some(index) = index {
                let now_empty = match index.get_mut(arg) {
                    Some(stamps) => {
                        stamps.remove(&stamp);
                        stamps.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    index.remove(arg);
                }
            }
        }
        self.instances.remove(&stamp);
        Ok(true)
    }

    /// Instances added since the last call to [`Storage::mark_done`].
    pub fn recently_added(&self) -> &[Instance] {
        &self.recent
    }
    /// Clears the delta.
    pub fn mark_done(&mut self) {
        self.recent.clear()
    }

    /// Fails if a position is beyond the arity of the predicate.
    fn check_pos(&self, pos: usize) -> Res<()> {
        if pos >= self.pred.arity {
            bail!(ErrorKind::PositionOutOfRange(self.pred.to_string(), pos))
        }
        Ok(())
    }

    /// Instances whose term at some position is some term.
    ///
    /// Scans all the instances if the position is not indexed.
    pub fn matching_position(&self, term: &Term, pos: usize) -> Res<Vec<&Instance>> {
        self.check_pos(pos)?;
        match self.indices.get(pos) {
            Some(Some(index)) => Ok(self.resolve(index.get(term))),
            _ => Ok(self
                .instances
                .values()
                .filter(|instance| instance.args[pos] == *term)
                .collect()),
        }
    }

    /// Candidate instances for a partially ground atom.
    ///
    /// Uses the indexed ground position with the fewest instances, or all the instances if no
    /// ground position is indexed. Candidates may not match the atom.
    pub fn candidates(&self, atom: &Atom) -> Vec<&Instance> {
        let mut best: Option<&BTreeSet<usize>> = None;
        for (arg, index) in atom.args.iter().zip(self.indices.iter()) {
            let index = match index {
                Some(index) if arg.is_ground() => index,
                _ => continue,
            };
            match index.get(arg) {
                None => return vec![],
                Some(stamps) => {
                    if best.map(|best| stamps.len() < best.len()).unwrap_or(true) {
                        best = Some(stamps)
                    }
                }
            }
        }
        match best {
            Some(stamps) => self.resolve(Some(stamps)),
            None => self.instances.values().collect(),
        }
    }

    /// Instances corresponding to some stamps.
    fn resolve(&self, stamps: Option<&BTreeSet<usize>>) -> Vec<&Instance> {
        stamps
            .into_iter()
            .flat_map(|stamps| stamps.iter())
            .filter_map(|stamp| self.instances.get(stamp))
            .collect()
    }
}

impl_fmt! {
    Storage(self, fmt) {
        write!(fmt, "{} [", self.pred)?;
        write_sep(fmt, ", ", self.instances.values())?;
        write!(fmt, "] ({} recent)", self.recent.len())
    }
}

/// Maps predicates to their storage.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    /// Storages.
    storages: HConMap<Pred, Storage>,
    /// Storages modified during this round, in order.
    modified: Vec<Pred>,
    /// Same as `modified`, for fast lookups.
    modified_set: HConSet<Pred>,
}

impl WorkingMemory {
    /// Empty working memory.
    pub fn new() -> Self {
        WorkingMemory {
            storages: HConMap::new(),
            modified: vec![],
            modified_set: HConSet::new(),
        }
    }

    /// Creates the storage for a predicate, if needed.
    pub fn initialize(&mut self, pred: &Pred) {
        if !self.storages.contains_key(pred) {
            self.storages
                .insert(pred.clone(), Storage::indexed(pred.clone()));
        }
    }

    /// Storage of a predicate.
    pub fn get(&self, pred: &Pred) -> Option<&Storage> {
        self.storages.get(pred)
    }
    /// Storage of a predicate, mutable version.
    pub fn get_mut(&mut self, pred: &Pred) -> Option<&mut Storage> {
        self.storages.get_mut(pred)
    }

    /// Adds an instance to a predicate, initializing its storage if needed.
    ///
    /// Returns true if the instance is new, in which case the storage is marked as modified.
    pub fn add(&mut self, pred: &Pred, instance: Instance) -> Res<bool> {
        self.initialize(pred);
        let is_new = match self.storages.get_mut(pred) {
            Some(storage) => storage.add(instance)?,
            None => bail!(ErrorKind::Internal(format!("no storage for `{}`", pred))),
        };
        if is_new && self.modified_set.insert(pred.clone()) {
            self.modified.push(pred.clone())
        }
        Ok(is_new)
    }
    /// Adds a ground atom.
    pub fn add_atom(&mut self, atom: &Atom) -> Res<bool> {
        self.add(&atom.pred, atom.to_instance())
    }

    /// Predicates modified during this round, in modification order.
    pub fn modified(&self) -> &[Pred] {
        &self.modified
    }
    /// Forgets the modifications of this round.
    pub fn reset(&mut self) {
        self.modified.clear();
        self.modified_set.clear()
    }

    /// Iterator over the storages.
    pub fn storages(&self) -> impl Iterator<Item = &Storage> {
        self.storages.values()
    }
}

impl_fmt! {
    WorkingMemory(self, fmt) {
        for storage in self.storages.values() {
            writeln!(fmt, "{}", storage)?
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::program::pred;

    fn inst(vals: &[i64]) -> Instance {
        Instance::new(vals.iter().map(|v| term::int(*v)).collect())
    }

    #[test]
    fn add_and_delta() {
        let mut storage = Storage::indexed(pred("p", 2));
        assert!(storage.add(inst(&[1, 2])).unwrap());
        assert!(!storage.add(inst(&[1, 2])).unwrap());
        assert!(storage.add(inst(&[1, 3])).unwrap());
        assert_eq!(storage.recently_added().len(), 2);
        storage.mark_done();
        assert!(storage.recently_added().is_empty());
        assert_eq!(storage.len(), 2);

        let err = storage.add(inst(&[1])).unwrap_err();
        assert!(err.is_invariant());
    }

    #[test]
    fn lookups() {
        let mut storage = Storage::indexed(pred("p", 2));
        for (a, b) in &[(1, 2), (1, 3), (2, 3)] {
            storage.add(inst(&[*a, *b])).unwrap();
        }
        let on_snd = storage.matching_position(&term::int(3), 1).unwrap();
        assert_eq!(on_snd, vec![&inst(&[1, 3]), &inst(&[2, 3])]);
        assert!(storage.matching_position(&term::int(7), 0).unwrap().is_empty());

        // Most selective ground position.
        let atom = Atom::of("p", vec![term::int(2), term::int(3)]);
        assert_eq!(storage.candidates(&atom), vec![&inst(&[2, 3])]);
        let atom = Atom::of("p", vec![term::var("X"), term::int(2)]);
        assert_eq!(storage.candidates(&atom), vec![&inst(&[1, 2])]);
        let atom = Atom::of("p", vec![term::var("X"), term::int(9)]);
        assert!(storage.candidates(&atom).is_empty());
        let atom = Atom::of("p", vec![term::var("X"), term::var("Y")]);
        assert_eq!(storage.candidates(&atom).len(), 3);

        storage.remove_index(1);
        assert!(!storage.is_indexed(1));
        assert_eq!(storage.matching_position(&term::int(3), 1).unwrap().len(), 2);
        storage.add_index(1).unwrap();
        assert_eq!(storage.matching_position(&term::int(3), 1).unwrap().len(), 2);
        assert!(storage.add_index(2).unwrap_err().is_invariant());
        assert!(storage
            .matching_position(&term::int(3), 2)
            .unwrap_err()
            .is_invariant());
    }

    #[test]
    fn unindexed_lookups() {
        let mut storage = Storage::new(pred("p", 2));
        assert!(!storage.is_indexed(0));
        for (a, b) in &[(1, 2), (1, 3), (2, 3)] {
            storage.add(inst(&[*a, *b])).unwrap();
        }
        assert_eq!(
            storage.matching_position(&term::int(1), 0).unwrap(),
            vec![&inst(&[1, 2]), &inst(&[1, 3])]
        );
        assert_eq!(
            storage.matching_position(&term::int(3), 1).unwrap(),
            vec![&inst(&[1, 3]), &inst(&[2, 3])]
        );
        assert!(storage.matching_position(&term::int(4), 1).unwrap().is_empty());
        storage.mark_done();
        storage.remove(&inst(&[1, 2])).unwrap();
        assert_eq!(
            storage.matching_position(&term::int(1), 0).unwrap(),
            vec![&inst(&[1, 3])]
        );
        let err = storage.matching_position(&term::int(1), 2).unwrap_err();
        assert!(err.is_invariant());
        // No index to select with, every instance is a candidate.
        let atom = Atom::of("p", vec![term::int(2), term::var("X")]);
        assert_eq!(storage.candidates(&atom).len(), 2);
    }

    #[test]
    fn removal() {
        let mut storage = Storage::indexed(pred("p", 1));
        storage.add(inst(&[1])).unwrap();
        assert!(storage.remove(&inst(&[1])).unwrap_err().is_invariant());
        storage.mark_done();
        assert!(storage.remove(&inst(&[1])).unwrap());
        assert!(!storage.remove(&inst(&[1])).unwrap());
        assert!(storage.matching_position(&term::int(1), 0).unwrap().is_empty());
        // Can be added again.
        assert!(storage.add(inst(&[1])).unwrap());
    }

    #[test]
    fn modified() {
        let mut memory = WorkingMemory::new();
        let (p, q) = (pred("p", 1), pred("q", 1));
        memory.initialize(&q);
        assert!(memory.get(&q).is_some());
        assert!(memory.add(&p, inst(&[1])).unwrap());
        assert!(memory.add(&q, inst(&[1])).unwrap());
        assert!(!memory.add(&p, inst(&[1])).unwrap());
        assert_eq!(memory.modified(), &[p.clone(), q.clone()]);
        memory.reset();
        assert!(memory.modified().is_empty());
        assert!(!memory.add(&p, inst(&[1])).unwrap());
        assert!(memory.modified().is_empty());
        assert_eq!(memory.storages().count(), 2);
    }
}
