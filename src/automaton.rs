//! Automata networks.
//!
//! An [`Automaton`] is a finite set of labeled states with labeled
//! transitions between them. A [`Network`] groups several automata together
//! with the synchronization alphabet: the actions on which every automaton
//! declaring them has to move jointly.

use std::collections::BTreeSet;
use std::fmt;

use log::debug;

use crate::error::{Error, Result};

/// Label of the internal (unobservable) action.
pub const TAU: &str = "tau";

/// A labeled transition `(source, action, target)`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Transition {
    pub source: String,
    pub action: String,
    pub target: String,
}

impl Transition {
    pub fn new(source: impl Into<String>, action: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            action: action.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.source, self.action, self.target)
    }
}

/// A finite automaton. The first declared state is the initial one.
#[derive(Debug, Clone)]
pub struct Automaton {
    id: String,
    states: Vec<String>,
    actions: BTreeSet<String>,
    transitions: Vec<Transition>,
}

impl Automaton {
    /// Creates an automaton, checking that every transition only uses declared states.
    ///
    /// Repeated state labels are kept once, at their first position. A
    /// transition on an action the automaton does not declare is private: it
    /// is relabeled to [`TAU`], which then becomes a known action.
    ///
    /// ```
    /// use bdd_reach::automaton::{Automaton, Transition};
    ///
    /// let a = Automaton::new(
    ///     "A",
    ///     ["idle", "busy"],
    ///     ["tau", "start"],
    ///     vec![Transition::new("idle", "start", "busy"), Transition::new("busy", "tau", "idle")],
    /// )
    /// .unwrap();
    /// assert_eq!(a.initial(), "idle");
    /// assert_eq!(a.state_index("busy"), Some(1));
    /// ```
    pub fn new<S, A>(
        id: impl Into<String>,
        states: impl IntoIterator<Item = S>,
        actions: impl IntoIterator<Item = A>,
        mut transitions: Vec<Transition>,
    ) -> Result<Self>
    where
        S: Into<String>,
        A: Into<String>,
    {
        let id = id.into();

        let mut seen = BTreeSet::new();
        let mut unique = Vec::new();
        for state in states {
            let state = state.into();
            if seen.insert(state.clone()) {
                unique.push(state);
            }
        }
        if unique.is_empty() {
            return Err(Error::NoStates { automaton: id });
        }

        let mut actions: BTreeSet<String> = actions.into_iter().map(Into::into).collect();

        for t in &mut transitions {
            for label in [&t.source, &t.target] {
                if !seen.contains(label) {
                    return Err(Error::UnknownState {
                        automaton: id,
                        label: label.clone(),
                    });
                }
            }
            if !actions.contains(&t.action) {
                debug!("{}: undeclared action {} on {} is private", id, t.action, t);
                t.action = TAU.to_string();
                actions.insert(TAU.to_string());
            }
        }

        Ok(Self {
            id,
            states: unique,
            actions,
            transitions,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// State labels in declaration order.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// The designated initial state: the first declared one.
    pub fn initial(&self) -> &str {
        &self.states[0]
    }

    /// Position of the state in declaration order.
    pub fn state_index(&self, label: &str) -> Option<usize> {
        self.states.iter().position(|s| s == label)
    }

    /// Known actions, in lexicographic order.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(String::as_str)
    }

    pub fn declares(&self, action: &str) -> bool {
        self.actions.contains(action)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "automaton {} with:", self.id)?;
        writeln!(f, "states: [{}]", self.states.join(", "))?;
        if !self.actions.is_empty() {
            let actions: Vec<&str> = self.actions().collect();
            writeln!(f, "known actions: [{}]", actions.join(", "))?;
        }
        let transitions: Vec<String> = self.transitions.iter().map(|t| t.to_string()).collect();
        write!(f, "transitions: [{}]", transitions.join(", "))
    }
}

/// Automata in declaration order plus the synchronization alphabet.
#[derive(Debug, Clone)]
pub struct Network {
    automata: Vec<Automaton>,
    sync: Vec<String>,
}

impl Network {
    /// Repeated actions in `sync` are kept once, at their first position.
    pub fn new<A>(automata: Vec<Automaton>, sync: impl IntoIterator<Item = A>) -> Self
    where
        A: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let sync = sync.into_iter().map(Into::into).filter(|a: &String| seen.insert(a.clone())).collect();
        Self { automata, sync }
    }

    pub fn automata(&self) -> &[Automaton] {
        &self.automata
    }

    /// The synchronization alphabet in declaration order.
    pub fn sync(&self) -> &[String] {
        &self.sync
    }

    pub fn is_sync(&self, action: &str) -> bool {
        self.sync.iter().any(|a| a == action)
    }

    /// Indices of the automata declaring `action`.
    pub fn participants(&self, action: &str) -> Vec<usize> {
        self.automata
            .iter()
            .enumerate()
            .filter(|(_, a)| a.declares(action))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether `action` fires jointly: it is in the alphabet and at least two automata declare it.
    pub fn is_synchronized(&self, action: &str) -> bool {
        self.is_sync(action) && self.participants(action).len() >= 2
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn sample() -> Automaton {
        Automaton::new(
            "A",
            ["a0", "a1", "a2"],
            [TAU, "a", "c"],
            vec![
                Transition::new("a0", TAU, "a1"),
                Transition::new("a1", TAU, "a0"),
                Transition::new("a1", "a", "a2"),
                Transition::new("a2", "c", "a0"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_automaton() {
        let a = sample();
        assert_eq!(a.id(), "A");
        assert_eq!(a.num_states(), 3);
        assert_eq!(a.initial(), "a0");
        assert_eq!(a.state_index("a2"), Some(2));
        assert_eq!(a.state_index("b0"), None);
        assert_eq!(a.actions().collect::<Vec<_>>(), vec!["a", "c", "tau"]);
        assert!(a.declares("c"));
        assert!(!a.declares("b"));
        assert_eq!(a.transitions().len(), 4);
    }

    #[test]
    fn test_duplicate_states() {
        let a = Automaton::new("A", ["s", "t", "s"], Vec::<String>::new(), vec![]).unwrap();
        assert_eq!(a.states(), &["s".to_string(), "t".to_string()]);
    }

    #[test]
    fn test_validation() {
        let unknown_state = Automaton::new("A", ["s"], [TAU], vec![Transition::new("s", TAU, "t")]);
        assert_eq!(
            unknown_state.unwrap_err(),
            Error::UnknownState {
                automaton: "A".to_string(),
                label: "t".to_string()
            }
        );

        let empty = Automaton::new("E", Vec::<String>::new(), [TAU], vec![]);
        assert_eq!(
            empty.unwrap_err(),
            Error::NoStates {
                automaton: "E".to_string()
            }
        );
    }

    #[test]
    fn test_private_action() {
        let a = Automaton::new("A", ["s", "t"], ["go"], vec![Transition::new("s", "private_x", "t")]).unwrap();
        assert_eq!(a.transitions(), &[Transition::new("s", TAU, "t")]);
        assert_eq!(a.actions().collect::<Vec<_>>(), vec!["go", "tau"]);
        assert!(!a.declares("private_x"));

        // Declared actions are left alone.
        let b = Automaton::new("B", ["s"], ["go"], vec![Transition::new("s", "go", "s")]).unwrap();
        assert_eq!(b.actions().collect::<Vec<_>>(), vec!["go"]);
    }

    #[test]
    fn test_display() {
        let a = sample();
        let text = a.to_string();
        assert!(text.starts_with("automaton A with:"));
        assert!(text.contains("states: [a0, a1, a2]"));
        assert!(text.contains("known actions: [a, c, tau]"));
        assert!(text.contains("(a1, a, a2)"));
    }

    #[test]
    fn test_network() {
        let a = sample();
        let b = Automaton::new("B", ["b0", "b1"], ["a"], vec![Transition::new("b0", "a", "b1")]).unwrap();
        let network = Network::new(vec![a, b], ["a", "b", "c", "a"]);

        assert_eq!(network.sync(), &["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(network.participants("a"), vec![0, 1]);
        assert_eq!(network.participants("c"), vec![0]);
        assert!(network.participants("b").is_empty());

        assert!(network.is_synchronized("a"));
        assert!(!network.is_synchronized("c"));
        assert!(!network.is_synchronized(TAU));
    }
}
