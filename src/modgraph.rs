//! Reader for `.modgraph` automaton descriptions.
//!
//! A model file lists the states, then the transitions:
//!
//! ```text
//! states
//! s0
//! s1
//! transitions
//! (s0, a, s1)
//! (s1, tau, s0)
//! ```
//!
//! A sync file lists the actions of the synchronization alphabet, one per
//! line. Blank lines are ignored and surrounding whitespace is trimmed
//! everywhere. When an automaton is loaded against a sync alphabet, every
//! transition whose action is not in the alphabet is relabeled to
//! [`TAU`], and the automaton knows exactly the synchronized actions found on
//! its transitions plus `tau`.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::automaton::{Automaton, Transition, TAU};
use crate::error::Error;

#[derive(Debug)]
pub enum ParseError {
    /// File I/O error.
    Io(io::Error),
    /// Malformed input, with the 1-based line number.
    Parse { line: usize, message: String },
    /// Well-formed input describing an invalid automaton.
    Model(Error),
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}

impl From<Error> for ParseError {
    fn from(e: Error) -> Self {
        ParseError::Model(e)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io(e) => write!(f, "I/O error: {}", e),
            ParseError::Parse { line, message } => write!(f, "Parse error at line {}: {}", line, message),
            ParseError::Model(e) => write!(f, "Model error: {}", e),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            ParseError::Parse { .. } => None,
            ParseError::Model(e) => Some(e),
        }
    }
}

/// Raw contents of a model file, before relabeling.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Model {
    pub states: Vec<String>,
    pub transitions: Vec<Transition>,
}

/// Non-blank trimmed lines with their 1-based numbers.
fn lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn parse_transition(line: usize, text: &str) -> Result<Transition, ParseError> {
    let error = |message: &str| ParseError::Parse {
        line,
        message: format!("{}: '{}'", message, text),
    };

    let inner = text
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| error("expected '(source, action, target)'"))?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [source, action, target] if !source.is_empty() && !action.is_empty() && !target.is_empty() => {
            Ok(Transition::new(*source, *action, *target))
        }
        _ => Err(error("expected three non-empty fields")),
    }
}

/// Parses the contents of a model file.
pub fn parse_model(content: &str) -> Result<Model, ParseError> {
    let mut lines = lines(content);

    match lines.next() {
        Some((_, "states")) => {}
        Some((line, _)) => {
            return Err(ParseError::Parse {
                line,
                message: "expected leading 'states'".into(),
            })
        }
        None => {
            return Err(ParseError::Parse {
                line: 1,
                message: "empty model".into(),
            })
        }
    }

    let mut model = Model::default();
    let mut in_transitions = false;
    for (line, text) in lines {
        if in_transitions {
            model.transitions.push(parse_transition(line, text)?);
        } else if text == "transitions" {
            in_transitions = true;
        } else {
            model.states.push(text.to_string());
        }
    }

    if !in_transitions {
        return Err(ParseError::Parse {
            line: content.lines().count(),
            message: "missing 'transitions'".into(),
        });
    }
    Ok(model)
}

/// Parses the contents of a sync file.
pub fn parse_sync(content: &str) -> Vec<String> {
    lines(content).map(|(_, action)| action.to_string()).collect()
}

/// Builds an automaton from a parsed model, relabeling actions outside `sync` to `tau`.
pub fn build_automaton(id: &str, model: Model, sync: &[String]) -> Result<Automaton, ParseError> {
    let mut actions = vec![TAU.to_string()];
    let transitions: Vec<Transition> = model
        .transitions
        .into_iter()
        .map(|mut t| {
            if sync.contains(&t.action) {
                actions.push(t.action.clone());
            } else {
                t.action = TAU.to_string();
            }
            t
        })
        .collect();

    let automaton = Automaton::new(id, model.states, actions, transitions)?;
    debug!("Loaded {}", automaton);
    Ok(automaton)
}

/// Reads a sync file.
pub fn read_sync<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ParseError> {
    let content = fs::read_to_string(path)?;
    Ok(parse_sync(&content))
}

/// Reads a model file and builds the automaton `id` against the `sync` alphabet.
pub fn load_automaton<P: AsRef<Path>>(id: &str, path: P, sync: &[String]) -> Result<Automaton, ParseError> {
    let content = fs::read_to_string(path)?;
    let model = parse_model(&content)?;
    build_automaton(id, model, sync)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    const MODEL: &str = "states\n  s0\ns1\n\ns2\ntransitions\n(s0, a, s1)\n( s1 ,local, s2 )\n(s2, c, s0)\n";

    #[test]
    fn test_parse_model() {
        let model = parse_model(MODEL).unwrap();
        assert_eq!(model.states, vec!["s0", "s1", "s2"]);
        assert_eq!(
            model.transitions,
            vec![
                Transition::new("s0", "a", "s1"),
                Transition::new("s1", "local", "s2"),
                Transition::new("s2", "c", "s0"),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_model("transitions\n"),
            Err(ParseError::Parse { line: 1, .. })
        ));
        assert!(matches!(parse_model("states\ns0\n"), Err(ParseError::Parse { .. })));
        assert!(matches!(parse_model(""), Err(ParseError::Parse { .. })));
        assert!(matches!(
            parse_model("states\ns0\ntransitions\ns0, a, s0\n"),
            Err(ParseError::Parse { line: 4, .. })
        ));
        assert!(matches!(
            parse_model("states\ns0\ntransitions\n(s0, s0)\n"),
            Err(ParseError::Parse { line: 4, .. })
        ));
    }

    #[test]
    fn test_parse_sync() {
        assert_eq!(parse_sync("a\n b \n\nc\n"), vec!["a", "b", "c"]);
        assert!(parse_sync("\n").is_empty());
    }

    #[test]
    fn test_relabel() {
        let model = parse_model(MODEL).unwrap();
        let sync = parse_sync("a\nb\nc\n");
        let automaton = build_automaton("A", model, &sync).unwrap();

        assert_eq!(automaton.actions().collect::<Vec<_>>(), vec!["a", "c", "tau"]);
        assert_eq!(automaton.transitions()[1], Transition::new("s1", TAU, "s2"));
        assert!(!automaton.declares("b"));
    }

    #[test]
    fn test_unknown_state() {
        let model = parse_model("states\ns0\ntransitions\n(s0, tau, s1)\n").unwrap();
        let err = build_automaton("A", model, &[]).unwrap_err();
        assert!(matches!(err, ParseError::Model(Error::UnknownState { .. })));
        assert!(err.to_string().contains("has no state 's1'"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_sync("/nonexistent/sync.modgraph").unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }
}
