//! Composition of per-automaton relations into the network relation.
//!
//! The network relation is kept as a list of partitions whose disjunction is
//! the global relation:
//!
//! - one [`PartitionKind::Synchronized`] partition per action of the
//!   synchronization alphabet declared by at least two automata: the
//!   conjunction of the participants' relations for that action;
//! - one [`PartitionKind::Local`] partition per automaton: the disjunction of
//!   its relations for every action it performs on its own.
//!
//! Every partition is conjoined with the identity of the blocks of the
//! automata that do not take part in the step, so their state is preserved
//! exactly.

use std::fmt;

use log::debug;

use crate::automaton::Network;
use crate::bdd::Bdd;
use crate::encode::EncodedAutomaton;
use crate::error::Result;
use crate::reference::Ref;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PartitionKind {
    /// Joint step of all automata declaring `action`.
    Synchronized { action: String, participants: Vec<String> },
    /// Independent step of a single automaton.
    Local { automaton: String },
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionKind::Synchronized { action, participants } => {
                write!(f, "{} [{}]", action, participants.join(", "))
            }
            PartitionKind::Local { automaton } => write!(f, "local {}", automaton),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Partition {
    pub kind: PartitionKind,
    /// Relation over the current and next blocks of all automata.
    pub relation: Ref,
}

/// Transition relation of a whole network.
#[derive(Debug, Clone)]
pub struct TransitionRelation {
    partitions: Vec<Partition>,
    global: Ref,
}

impl TransitionRelation {
    /// Build the relation of `network`, given the encoding of each of its automata in order.
    ///
    /// On error, every partition built so far is released again.
    pub(crate) fn compose(bdd: &Bdd, network: &Network, encoded: &[EncodedAutomaton]) -> Result<Self> {
        debug_assert_eq!(network.automata().len(), encoded.len());

        let mut relation = Self {
            partitions: Vec::new(),
            global: Ref::ZERO,
        };
        match relation.build(bdd, network, encoded) {
            Ok(()) => Ok(relation),
            Err(e) => {
                relation.release(bdd);
                Err(e)
            }
        }
    }

    fn build(&mut self, bdd: &Bdd, network: &Network, encoded: &[EncodedAutomaton]) -> Result<()> {
        for action in network.sync() {
            let participants = network.participants(action);
            if participants.len() < 2 {
                continue;
            }
            let mut parts = Vec::with_capacity(encoded.len());
            for (i, enc) in encoded.iter().enumerate() {
                if participants.contains(&i) {
                    parts.push(enc.action_relation(action).unwrap_or(Ref::ZERO));
                } else {
                    parts.push(enc.identity());
                }
            }
            let relation = bdd.apply_and_many(parts)?;
            let kind = PartitionKind::Synchronized {
                action: action.clone(),
                participants: participants.iter().map(|&i| encoded[i].id().to_string()).collect(),
            };
            self.push(bdd, kind, relation);
        }

        for (i, enc) in encoded.iter().enumerate() {
            let local: Vec<Ref> = enc
                .actions()
                .filter(|&(action, _)| !network.is_synchronized(action))
                .map(|(_, relation)| relation)
                .collect();
            let steps = bdd.apply_or_many(local)?;

            let mut parts = Vec::with_capacity(encoded.len());
            parts.push(steps);
            parts.extend(encoded.iter().enumerate().filter(|&(j, _)| j != i).map(|(_, e)| e.identity()));
            let relation = bdd.apply_and_many(parts);
            bdd.release(steps);

            let kind = PartitionKind::Local {
                automaton: enc.id().to_string(),
            };
            self.push(bdd, kind, relation?);
        }

        self.global = bdd.apply_or_many(self.partitions.iter().map(|p| p.relation))?;
        debug!("Global relation: {} partitions, {} nodes", self.partitions.len(), bdd.size(self.global));
        Ok(())
    }

    fn push(&mut self, bdd: &Bdd, kind: PartitionKind, relation: Ref) {
        if bdd.is_zero(relation) {
            debug!("Partition {} is empty, dropped", kind);
            return;
        }
        debug!("Partition {}: {} nodes", kind, bdd.size(relation));
        self.partitions.push(Partition { kind, relation });
    }

    /// Release every handle held by the relation.
    pub fn release(&self, bdd: &Bdd) {
        self.partitions.iter().for_each(|p| bdd.release(p.relation));
        bdd.release(self.global);
    }

    /// Non-empty partitions: synchronized actions first, in alphabet order, then local steps per automaton.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Disjunction of all partitions.
    pub fn global(&self) -> Ref {
        self.global
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use test_log::test;

    use super::*;
    use crate::alloc::{Allocation, VarAllocator};
    use crate::automaton::{Automaton, Transition, TAU};
    use crate::types::Var;

    // A: p0 --go--> p1 --tau--> p0
    // B: q0 --go--> q1, q1 --solo--> q0
    fn network() -> Network {
        let a = Automaton::new(
            "A",
            ["p0", "p1"],
            [TAU, "go"],
            vec![Transition::new("p0", "go", "p1"), Transition::new("p1", TAU, "p0")],
        )
        .unwrap();
        let b = Automaton::new(
            "B",
            ["q0", "q1"],
            ["go", "solo", "never"],
            vec![Transition::new("q0", "go", "q1"), Transition::new("q1", "solo", "q0")],
        )
        .unwrap();
        Network::new(vec![a, b], ["go", "solo", "never"])
    }

    fn build(bdd: &Bdd) -> (Allocation, Vec<EncodedAutomaton>, TransitionRelation) {
        let network = network();
        let alloc = VarAllocator::default().allocate(bdd, &network).unwrap();
        let encoded: Vec<EncodedAutomaton> = network
            .automata()
            .iter()
            .zip(&alloc.blocks)
            .map(|(a, b)| EncodedAutomaton::encode(bdd, a, b, &alloc.actions).unwrap())
            .collect();
        let relation = TransitionRelation::compose(bdd, &network, &encoded).unwrap();
        (alloc, encoded, relation)
    }

    fn state_vars(alloc: &Allocation) -> Vec<Var> {
        let mut vars = alloc.current_vars();
        vars.extend(alloc.next_vars());
        vars
    }

    #[test]
    fn test_partitions() {
        let bdd = Bdd::default();
        let (_, _, relation) = build(&bdd);

        let kinds: Vec<PartitionKind> = relation.partitions().iter().map(|p| p.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                PartitionKind::Synchronized {
                    action: "go".to_string(),
                    participants: vec!["A".to_string(), "B".to_string()],
                },
                PartitionKind::Local {
                    automaton: "A".to_string()
                },
                PartitionKind::Local {
                    automaton: "B".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_global_relation() {
        let bdd = Bdd::default();
        let (alloc, _, relation) = build(&bdd);
        let vars = state_vars(&alloc);

        // go: (p0,q0) -> (p1,q1); tau: (p1,*) -> (p0,*); solo: (*,q1) -> (*,q0)
        assert_eq!(bdd.sat_count(relation.global(), &vars).unwrap(), BigUint::from(5u32));

        let sum: BigUint = relation
            .partitions()
            .iter()
            .map(|p| bdd.sat_count(p.relation, &vars).unwrap())
            .sum();
        assert_eq!(sum, BigUint::from(5u32));
    }

    #[test]
    fn test_no_change() {
        let bdd = Bdd::default();
        let (_, encoded, relation) = build(&bdd);

        // In A's local steps, B keeps its state.
        let local_a = relation.partitions()[1].relation;
        let violation = bdd.apply_and(local_a, -encoded[1].identity()).unwrap();
        assert!(bdd.is_zero(violation));

        let local_b = relation.partitions()[2].relation;
        let violation = bdd.apply_and(local_b, -encoded[0].identity()).unwrap();
        assert!(bdd.is_zero(violation));
    }

    #[test]
    fn test_unshared_sync_action_is_local() {
        let bdd = Bdd::default();
        let a = Automaton::new("A", ["s", "t"], ["x"], vec![Transition::new("s", "x", "t")]).unwrap();
        let b = Automaton::new("B", ["u"], ["y"], vec![]).unwrap();
        let network = Network::new(vec![a, b], ["x"]);
        let alloc = VarAllocator::default().allocate(&bdd, &network).unwrap();
        let encoded: Vec<EncodedAutomaton> = network
            .automata()
            .iter()
            .zip(&alloc.blocks)
            .map(|(a, b)| EncodedAutomaton::encode(&bdd, a, b, &alloc.actions).unwrap())
            .collect();
        let relation = TransitionRelation::compose(&bdd, &network, &encoded).unwrap();

        // B has no steps at all, so only A's local partition remains.
        assert_eq!(relation.partitions().len(), 1);
        assert_eq!(
            relation.partitions()[0].kind,
            PartitionKind::Local {
                automaton: "A".to_string()
            }
        );
        assert_eq!(relation.global(), encoded[0].relation());
    }

    #[test]
    fn test_private_action_is_local() {
        let bdd = Bdd::default();
        // A's `private_x` is not declared, so it fires on its own.
        let a = Automaton::new(
            "A",
            ["s", "t"],
            ["go"],
            vec![Transition::new("s", "go", "s"), Transition::new("s", "private_x", "t")],
        )
        .unwrap();
        let b = Automaton::new("B", ["u", "v"], ["go"], vec![Transition::new("u", "go", "v")]).unwrap();
        let network = Network::new(vec![a, b], ["go"]);
        let alloc = VarAllocator::default().allocate(&bdd, &network).unwrap();
        let encoded: Vec<EncodedAutomaton> = network
            .automata()
            .iter()
            .zip(&alloc.blocks)
            .map(|(a, b)| EncodedAutomaton::encode(&bdd, a, b, &alloc.actions).unwrap())
            .collect();
        let relation = TransitionRelation::compose(&bdd, &network, &encoded).unwrap();

        let kinds: Vec<PartitionKind> = relation.partitions().iter().map(|p| p.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                PartitionKind::Synchronized {
                    action: "go".to_string(),
                    participants: vec!["A".to_string(), "B".to_string()],
                },
                PartitionKind::Local {
                    automaton: "A".to_string()
                },
            ]
        );

        // No action vars; A current x1, next x2; B current x3, next x4.
        let local = relation.partitions()[1].relation;
        assert!(bdd.evaluate(local, &[false, true, false, false]).unwrap());
        assert!(bdd.evaluate(local, &[false, true, true, true]).unwrap());
        assert!(!bdd.evaluate(local, &[false, true, false, true]).unwrap());
        assert!(!bdd.evaluate(local, &[true, false, false, false]).unwrap());

        // go: (s,u) -> (s,v); private: (s,*) -> (t,*)
        let vars = state_vars(&alloc);
        assert_eq!(bdd.sat_count(relation.global(), &vars).unwrap(), BigUint::from(3u32));
    }

    #[test]
    fn test_release() {
        let bdd = Bdd::default();
        let (_, encoded, relation) = build(&bdd);
        assert!(bdd.ref_count(relation.global()) > 0);

        relation.release(&bdd);
        encoded.iter().for_each(|enc| enc.release(&bdd));
        bdd.collect_garbage(&[]);
        assert_eq!(bdd.live_nodes(), 1);
    }
}
