use crate::reference::Ref;

/// A decision node `(variable, low, high)`.
///
/// Variable 0 marks the terminal. Nodes are never mutated after they are put
/// into the unique table; in canonical form the `high` edge is never complemented.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Node {
    pub variable: u32,
    pub low: Ref,
    pub high: Ref,
}

impl Node {
    pub const TERMINAL: Node = Node {
        variable: 0,
        low: Ref::ONE,
        high: Ref::ONE,
    };

    pub fn is_terminal(&self) -> bool {
        self.variable == 0
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::TERMINAL
    }
}
