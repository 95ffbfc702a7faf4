//! Errors reported by the manager, the encoder, and the reachability engine.

use std::fmt;

use crate::types::Var;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A diagram operation referenced a variable that was never allocated,
    /// or a counting set that does not cover the support of the diagram.
    InvalidVariable { var: u32 },
    /// The state count of an automaton needs a wider block than allowed.
    TooManyStates {
        automaton: String,
        states: usize,
        width: usize,
        max_width: usize,
    },
    /// A transition references a state label that the automaton does not declare.
    UnknownState { automaton: String, label: String },
    /// An automaton without states has no initial state.
    NoStates { automaton: String },
    /// Garbage collection could not free enough nodes to stay within the budget.
    NodeBudgetExceeded { budget: usize },
    /// The progress sink requested cancellation.
    Cancelled { iteration: usize },
}

impl Error {
    pub(crate) fn invalid_var(var: Var) -> Self {
        Error::InvalidVariable { var: var.id() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidVariable { var } => write!(f, "invalid variable x{}", var),
            Error::TooManyStates {
                automaton,
                states,
                width,
                max_width,
            } => write!(
                f,
                "automaton '{}' has {} states, which needs {} bits (at most {} allowed)",
                automaton, states, width, max_width
            ),
            Error::UnknownState { automaton, label } => {
                write!(f, "automaton '{}' has no state '{}'", automaton, label)
            }
            Error::NoStates { automaton } => write!(f, "automaton '{}' has no states", automaton),
            Error::NodeBudgetExceeded { budget } => {
                write!(f, "node budget of {} nodes exceeded", budget)
            }
            Error::Cancelled { iteration } => write!(f, "cancelled at iteration {}", iteration),
        }
    }
}

impl std::error::Error for Error {}
