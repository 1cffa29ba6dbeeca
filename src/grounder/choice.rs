//! Choice points, heads-to-bodies and weak constraint bookkeeping.
//!
//! All the maps recorded here follow a read-and-reset contract: the grounder hands them over to
//! the search engine and forgets them.

use crate::atoms::{AtomStore, GroundAtom};
use crate::common::*;
use crate::nogood::{Lit, NoGood};

/// Maps body-representative atoms to their enabler or disabler atom.
pub type ChoiceMap = BTreeMap<AtomId, AtomId>;

/// Maps head atoms to the body-representative atoms of the rules deriving them.
pub type HeadsToBodies = BTreeMap<AtomId, BTreeSet<AtomId>>;

/// Records choice points and heads-to-bodies information.
#[derive(Debug, Clone, Default)]
pub struct ChoiceRecorder {
    /// Next choice identifier.
    next_id: usize,
    /// Enablers recorded since the last read.
    enablers: ChoiceMap,
    /// Disablers recorded since the last read.
    disablers: ChoiceMap,
    /// Heads to bodies recorded since the last read.
    heads_to_bodies: HeadsToBodies,
}

impl ChoiceRecorder {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the choice nogoods of a body-representative atom.
    ///
    /// Creates a fresh enabler `ChoiceOn(i)` and disabler `ChoiceOff(i)`. The disabler holds as
    /// soon as some atom of the negative body holds. The enabler holds when the whole positive
    /// body holds.
    pub fn choice_nogoods<S: AtomStore + ?Sized>(
        &mut self,
        store: &mut S,
        pos: &[AtomId],
        neg: &[AtomId],
        body: AtomId,
    ) -> Vec<NoGood> {
        let id = self.next_id;
        self.next_id += 1;
        let on = store.put_if_absent(GroundAtom::ChoiceOn(id));
        self.enablers.insert(body, on);
        let off = store.put_if_absent(GroundAtom::ChoiceOff(id));
        self.disablers.insert(body, off);

        let mut nogoods = Vec::with_capacity(neg.len() + 1);
        for atom in neg {
            nogoods.push(NoGood::head_first_internal(vec![
                Lit::neg(off),
                Lit::pos(*atom),
            ]))
        }
        nogoods.push(NoGood::from_body_internal(pos, &[], Lit::pos(on)));
        nogoods
    }

    /// Records that some body-representative atom derives some head.
    pub fn add_head_to_body(&mut self, head: AtomId, body: AtomId) {
        self.heads_to_bodies
            .entry(head)
            .or_insert_with(BTreeSet::new)
            .insert(body);
    }

    /// Enablers and disablers recorded since the last call.
    pub fn get_and_reset_choices(&mut self) -> (ChoiceMap, ChoiceMap) {
        (
            ::std::mem::take(&mut self.enablers),
            ::std::mem::take(&mut self.disablers),
        )
    }

    /// Heads to bodies recorded since the last call.
    pub fn get_and_reset_heads_to_bodies(&mut self) -> HeadsToBodies {
        ::std::mem::take(&mut self.heads_to_bodies)
    }
}

impl_fmt! {
    ChoiceRecorder(self, fmt) {
        fmt.write_str("[enablers: ")?;
        for (body, on) in &self.enablers {
            write!(fmt, "{}/{}, ", body, on)?
        }
        fmt.write_str(" disablers: ")?;
        let mut sep = "";
        for (body, off) in &self.disablers {
            write!(fmt, "{}{}/{}", sep, body, off)?;
            sep = ", "
        }
        fmt.write_str("]")
    }
}

/// Weight and level of a ground weak constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeightAtLevel {
    /// Weight.
    pub weight: i64,
    /// Level.
    pub level: i64,
}
impl_fmt! {
    WeightAtLevel(self, fmt) {
        write!(fmt, "{}@{}", self.weight, self.level)
    }
}

/// Records the weight and level of weak constraint violation atoms.
#[derive(Debug, Clone, Default)]
pub struct WeakConstraintRecorder {
    /// Violation atoms recorded since the last read.
    recorded: BTreeMap<AtomId, WeightAtLevel>,
}
impl WeakConstraintRecorder {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }
    /// Records a violation atom. Only the first weight and level recorded for an atom are kept.
    pub fn add(&mut self, atom: AtomId, weight: i64, level: i64) {
        self.recorded
            .entry(atom)
            .or_insert(WeightAtLevel { weight, level });
    }
    /// Violation atoms recorded since the last call.
    pub fn get_and_reset(&mut self) -> BTreeMap<AtomId, WeightAtLevel> {
        ::std::mem::take(&mut self.recorded)
    }
}
