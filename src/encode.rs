//! Symbolic encoding of a single automaton.
//!
//! State `i` is encoded as the binary pattern of `i` over the block, most
//! significant bit on the first variable. Patterns beyond the number of
//! declared states never occur in any relation, so they are simply
//! unreachable. A transition `(s, a, t)` becomes the cube
//! `pattern(s) over current ∧ pattern(t) over next`; the relation of an action
//! is the disjunction of the cubes of its transitions. Only the automaton's
//! own block is constrained, every other variable is left free.

use std::collections::BTreeMap;

use log::debug;

use crate::alloc::{ActionEncoding, StateBlock};
use crate::automaton::Automaton;
use crate::bdd::Bdd;
use crate::error::{Error, Result};
use crate::reference::Ref;
use crate::types::Var;

/// Literals assigning the binary pattern of `index` to `vars`, most significant bit first.
fn pattern_literals(vars: &[Var], index: usize) -> impl Iterator<Item = (Var, bool)> + '_ {
    let width = vars.len();
    vars.iter()
        .enumerate()
        .map(move |(i, &v)| (v, (index >> (width - 1 - i)) & 1 == 1))
}

/// Diagrams of one automaton over its state block.
///
/// All handles are retained by the encoder and stay valid until
/// [`release`][EncodedAutomaton::release] is called.
#[derive(Debug, Clone)]
pub struct EncodedAutomaton {
    id: String,
    block: StateBlock,
    states: Vec<String>,
    patterns: Vec<Ref>,
    actions: BTreeMap<String, Ref>,
    relation: Ref,
    identity: Ref,
    alphabet: Ref,
}

impl EncodedAutomaton {
    /// Encode `automaton` over `block`.
    ///
    /// On error, every handle built so far is released again.
    pub fn encode(bdd: &Bdd, automaton: &Automaton, block: &StateBlock, encoding: &ActionEncoding) -> Result<Self> {
        debug!(
            "Encoding automaton {} ({} states, {} transitions) over {} bits",
            automaton.id(),
            automaton.num_states(),
            automaton.transitions().len(),
            block.width()
        );

        let mut encoded = Self {
            id: automaton.id().to_string(),
            block: block.clone(),
            states: automaton.states().to_vec(),
            patterns: Vec::with_capacity(automaton.num_states()),
            actions: automaton.actions().map(|a| (a.to_string(), Ref::ZERO)).collect(),
            relation: Ref::ZERO,
            identity: Ref::ONE,
            alphabet: Ref::ZERO,
        };
        match encoded.build(bdd, automaton, encoding) {
            Ok(()) => Ok(encoded),
            Err(e) => {
                encoded.release(bdd);
                Err(e)
            }
        }
    }

    fn build(&mut self, bdd: &Bdd, automaton: &Automaton, encoding: &ActionEncoding) -> Result<()> {
        for i in 0..automaton.num_states() {
            self.patterns.push(bdd.mk_cube(pattern_literals(self.block.current(), i))?);
        }

        let lookup = |label: &str| {
            automaton.state_index(label).ok_or_else(|| Error::UnknownState {
                automaton: automaton.id().to_string(),
                label: label.to_string(),
            })
        };

        for t in automaton.transitions() {
            let source = lookup(&t.source)?;
            let target = lookup(&t.target)?;
            let relation = self.actions.entry(t.action.clone()).or_insert(Ref::ZERO);

            let literals =
                pattern_literals(self.block.current(), source).chain(pattern_literals(self.block.next(), target));
            let cube = bdd.mk_cube(literals)?;
            let joined = bdd.apply_or(*relation, cube);
            bdd.release(cube);
            let joined = joined?;
            bdd.release(*relation);
            *relation = joined;
        }
        for (action, &relation) in &self.actions {
            debug!("{}: action {} has relation {} of size {}", self.id, action, relation, bdd.size(relation));
        }

        self.relation = bdd.apply_or_many(self.actions.values().copied())?;

        let mut equalities = Vec::with_capacity(self.block.width());
        for (c, n) in self.block.pairs() {
            let x = bdd.mk_var(c)?;
            let y = bdd.mk_var(n)?;
            let eq = bdd.apply_eq(x, y);
            bdd.release(x);
            bdd.release(y);
            match eq {
                Ok(eq) => equalities.push(eq),
                Err(e) => {
                    equalities.iter().for_each(|&e| bdd.release(e));
                    return Err(e);
                }
            }
        }
        let identity = bdd.apply_and_many(equalities.iter().copied());
        equalities.iter().for_each(|&e| bdd.release(e));
        self.identity = identity?;

        for action in automaton.actions() {
            if let Some(index) = encoding.index(action) {
                let code = bdd.mk_cube(pattern_literals(encoding.vars(), index))?;
                let joined = bdd.apply_or(self.alphabet, code);
                bdd.release(code);
                let joined = joined?;
                bdd.release(self.alphabet);
                self.alphabet = joined;
            }
        }

        Ok(())
    }

    /// Release every handle held by the encoding.
    pub fn release(&self, bdd: &Bdd) {
        self.patterns.iter().for_each(|&p| bdd.release(p));
        self.actions.values().for_each(|&r| bdd.release(r));
        bdd.release(self.relation);
        bdd.release(self.identity);
        bdd.release(self.alphabet);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn block(&self) -> &StateBlock {
        &self.block
    }

    /// Pattern of the initial state over the current block.
    pub fn initial(&self) -> Ref {
        self.patterns[0]
    }

    /// Pattern of the state over the current block.
    pub fn state(&self, label: &str) -> Option<Ref> {
        self.states.iter().position(|s| s == label).map(|i| self.patterns[i])
    }

    /// Disjunction of all transitions.
    pub fn relation(&self) -> Ref {
        self.relation
    }

    /// Relation of a declared action; false if it has no transitions, `None` if undeclared.
    pub fn action_relation(&self, action: &str) -> Option<Ref> {
        self.actions.get(action).copied()
    }

    /// Declared actions with their relations.
    pub fn actions(&self) -> impl Iterator<Item = (&str, Ref)> {
        self.actions.iter().map(|(a, &r)| (a.as_str(), r))
    }

    /// The block keeps its value: `current = next`, bit by bit.
    pub fn identity(&self) -> Ref {
        self.identity
    }

    /// Characteristic diagram of the known synchronized actions over the action variables.
    pub fn alphabet(&self) -> Ref {
        self.alphabet
    }
}
