//! External sources of ground rules.

use crate::assignment::Assignment;
use crate::atoms::AtomStore;
use crate::common::*;
use crate::program::RuleDef;

/// Yields additional ground rules given the current assignment.
///
/// Bridges are queried once per round, before the working memory deltas are processed. Rules
/// yielded several times are only compiled and grounded once.
pub trait Bridge {
    /// Ground rules to add to the program.
    fn rules(
        &mut self,
        assignment: Option<&dyn Assignment>,
        store: &dyn AtomStore,
    ) -> Res<Vec<RuleDef>>;
}

/// A bridge yielding fixed rules on its first call.
#[derive(Debug, Clone, Default)]
pub struct StaticBridge {
    /// Rules not yielded yet.
    rules: Vec<RuleDef>,
}
impl StaticBridge {
    /// Constructor.
    pub fn new(rules: Vec<RuleDef>) -> Self {
        StaticBridge { rules }
    }
}
impl Bridge for StaticBridge {
    fn rules(&mut self, _: Option<&dyn Assignment>, _: &dyn AtomStore) -> Res<Vec<RuleDef>> {
        Ok(::std::mem::take(&mut self.rules))
    }
}

