//! Variable allocation for automata networks.
//!
//! The global order is laid out as follows:
//!
//! ```text
//! action variables | A current | A next | B current | B next | ...
//! ```
//!
//! Action variables encode the synchronization alphabet and sit above all
//! state blocks. Every automaton then gets a current-state block immediately
//! followed by its next-state block, automata in network order. Both blocks
//! are `ceil(log2(states))` variables wide.

use log::debug;

use crate::automaton::Network;
use crate::bdd::Bdd;
use crate::error::{Error, Result};
use crate::types::Var;

/// Number of bits needed to give `n` items distinct patterns.
///
/// ```
/// use bdd_reach::alloc::bit_width;
///
/// assert_eq!(bit_width(1), 0);
/// assert_eq!(bit_width(2), 1);
/// assert_eq!(bit_width(3), 2);
/// assert_eq!(bit_width(5), 3);
/// ```
pub fn bit_width(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

/// Paired current/next-state variables of one automaton.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StateBlock {
    current: Vec<Var>,
    next: Vec<Var>,
}

impl StateBlock {
    pub fn width(&self) -> usize {
        self.current.len()
    }

    /// Current-state variables, most significant bit first.
    pub fn current(&self) -> &[Var] {
        &self.current
    }

    /// Next-state variables, most significant bit first.
    pub fn next(&self) -> &[Var] {
        &self.next
    }

    /// `(current, next)` pairs, bit by bit.
    pub fn pairs(&self) -> impl Iterator<Item = (Var, Var)> + '_ {
        self.current.iter().copied().zip(self.next.iter().copied())
    }
}

/// Binary encoding of the synchronization alphabet over shared action variables.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ActionEncoding {
    vars: Vec<Var>,
    actions: Vec<String>,
}

impl ActionEncoding {
    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    /// Index of the action pattern, its position in the alphabet.
    pub fn index(&self, action: &str) -> Option<usize> {
        self.actions.iter().position(|a| a == action)
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }
}

/// Result of allocating the variables of a whole network.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub actions: ActionEncoding,
    pub blocks: Vec<StateBlock>,
}

impl Allocation {
    /// Current-state variables of every automaton, in order.
    pub fn current_vars(&self) -> Vec<Var> {
        self.blocks.iter().flat_map(|b| b.current.iter().copied()).collect()
    }

    pub fn next_vars(&self) -> Vec<Var> {
        self.blocks.iter().flat_map(|b| b.next.iter().copied()).collect()
    }

    /// Substitution shifting next-state variables into current-state position.
    pub fn next_to_current(&self) -> Vec<(Var, Var)> {
        self.blocks.iter().flat_map(|b| b.pairs().map(|(c, n)| (n, c))).collect()
    }
}

/// Assigns variable blocks to the automata of a network.
#[derive(Debug, Clone, Copy)]
pub struct VarAllocator {
    max_width: usize,
}

impl Default for VarAllocator {
    fn default() -> Self {
        Self::new(16)
    }
}

impl VarAllocator {
    /// An allocator refusing automata that need more than `max_width` bits.
    pub fn new(max_width: usize) -> Self {
        Self { max_width }
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Allocate the action variables and all state blocks of `network` in `bdd`.
    ///
    /// Widths are checked for every automaton before the first variable is
    /// allocated, so a failure leaves the manager untouched.
    pub fn allocate(&self, bdd: &Bdd, network: &Network) -> Result<Allocation> {
        let mut widths = Vec::with_capacity(network.automata().len());
        for automaton in network.automata() {
            let width = bit_width(automaton.num_states());
            if width > self.max_width {
                return Err(Error::TooManyStates {
                    automaton: automaton.id().to_string(),
                    states: automaton.num_states(),
                    width,
                    max_width: self.max_width,
                });
            }
            widths.push(width);
        }

        let action_width = bit_width(network.sync().len());
        let actions = ActionEncoding {
            vars: (0..action_width).map(|_| bdd.allocate_variable()).collect(),
            actions: network.sync().to_vec(),
        };
        debug!("Allocated {} action variables for {} actions", action_width, network.sync().len());

        let mut blocks = Vec::with_capacity(widths.len());
        for (automaton, width) in network.automata().iter().zip(widths) {
            let current = (0..width).map(|_| bdd.allocate_variable()).collect();
            let next = (0..width).map(|_| bdd.allocate_variable()).collect();
            let block = StateBlock { current, next };
            debug!("Automaton {}: current {:?}, next {:?}", automaton.id(), block.current, block.next);
            blocks.push(block);
        }

        Ok(Allocation { actions, blocks })
    }
}
