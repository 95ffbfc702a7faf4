//! Per-variable unique tables.
//!
//! The manager keeps one subtable per allocated variable:
//!
//! ```text
//! subtables[0] → Subtable for x1
//! subtables[1] → Subtable for x2
//! ...
//! ```
//!
//! Each subtable is a hash map from `(low, high)` children to node id. Since all
//! nodes in a subtable have the same variable, it is not part of the key.
//! Looking a triple up before creating it is what makes the diagrams canonical.

use std::collections::HashMap;

use crate::reference::Ref;
use crate::types::Var;

/// A subtable storing BDD nodes for a single variable.
#[derive(Debug, Clone)]
pub struct Subtable {
    /// The variable for all nodes in this subtable.
    pub variable: Var,

    /// Map from (low, high) to node id in the arena.
    nodes: HashMap<(Ref, Ref), u32>,
}

impl Subtable {
    /// Create a new empty subtable for the given variable.
    pub fn new(variable: Var) -> Self {
        Self {
            variable,
            nodes: HashMap::new(),
        }
    }

    /// Look up a node by its children.
    pub fn find(&self, low: Ref, high: Ref) -> Option<u32> {
        self.nodes.get(&(low, high)).copied()
    }

    pub fn insert(&mut self, low: Ref, high: Ref, id: u32) {
        self.nodes.insert((low, high), id);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Keep only the nodes for which `keep` holds, returning the ids of the removed ones.
    pub fn retain(&mut self, mut keep: impl FnMut(u32) -> bool) -> Vec<u32> {
        let mut removed = Vec::new();
        self.nodes.retain(|_, &mut id| {
            if keep(id) {
                true
            } else {
                removed.push(id);
                false
            }
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtable_basic() {
        let mut st = Subtable::new(Var::new(1));

        let low = Ref::ZERO;
        let high = Ref::ONE;

        assert!(st.find(low, high).is_none());

        st.insert(low, high, 42);
        assert_eq!(st.find(low, high), Some(42));
        assert_eq!(st.len(), 1);
    }

    #[test]
    fn test_subtable_retain() {
        let mut st = Subtable::new(Var::new(1));

        st.insert(Ref::ZERO, Ref::ONE, 10);
        st.insert(Ref::positive(2), Ref::positive(3), 20);
        st.insert(Ref::ZERO, Ref::positive(3), 30);

        let mut removed = st.retain(|id| id != 20);
        removed.sort();
        assert_eq!(removed, vec![20]);
        assert_eq!(st.len(), 2);
        assert_eq!(st.find(Ref::positive(2), Ref::positive(3)), None);
        assert_eq!(st.find(Ref::ZERO, Ref::positive(3)), Some(30));

        st.retain(|_| false);
        assert!(st.is_empty());
    }
}
