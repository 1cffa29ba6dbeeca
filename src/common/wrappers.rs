//! Zero-cost wrappers for safe indexing.

wrap_usize! {
    #[doc = "Atom identifiers, assigned once by the atom store."]
    AtomId
    #[doc = "Total map from atoms to something."]
    map: AtomMap with iter: AtomMapIter
}

wrap_usize! {
    #[doc = "Rule indices."]
    RuleId
    #[doc = "Set of rules."]
    set: RuleSet
    #[doc = "Total map from rules to something."]
    map: RuleMap with iter: RuleMapIter
}

wrap_usize! {
    #[doc = "NoGood identifiers, assigned by the registry."]
    NoGoodId
    #[doc = "Hash map from nogoods to something."]
    hash map: NoGoodHMap
}

wrap_usize! {
    #[doc = "Position of a literal in the body of a rule."]
    LitIdx
    #[doc = "Total map from body literals to something."]
    map: LitMap with iter: LitMapIter
}
