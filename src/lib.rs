//! # bdd-reach: symbolic reachability for synchronizing automata
//!
//! **`bdd-reach`** computes the reachable state space of a network of finite
//! automata that synchronize on shared actions. Sets of global states and the
//! transition relation are represented as **Binary Decision Diagrams (BDDs)**,
//! so the state space is never enumerated explicitly.
//!
//! ## Architecture
//!
//! - **Manager-Centric Diagrams**: All diagram operations go through the
//!   [`Bdd`][crate::bdd::Bdd] manager, which owns the nodes and keeps them
//!   canonical (hash consing, complement edges). Callers hold lightweight
//!   [`Ref`][crate::reference::Ref] handles; equal functions have equal handles.
//! - **Variable Allocation**: every automaton gets a current-state and a
//!   next-state block of `ceil(log2(states))` variables, laid out automaton by
//!   automaton ([`alloc`]).
//! - **Encoding and Composition**: per-automaton relations ([`encode`]) are
//!   combined into a partitioned network relation honoring synchronization
//!   ([`compose`]).
//! - **Fixpoint**: [`reach`] iterates the relational image until the set of
//!   reachable states stops growing, reporting progress to a
//!   [`ProgressSink`][crate::reach::ProgressSink].
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_reach::automaton::{Automaton, Network, Transition, TAU};
//! use bdd_reach::bdd::Bdd;
//! use bdd_reach::reach::{ReachConfig, Reachability, Silent};
//! use num_bigint::BigUint;
//!
//! // A sender and a receiver synchronizing on `msg`.
//! let sender = Automaton::new(
//!     "sender",
//!     ["ready", "sent"],
//!     [TAU, "msg"],
//!     vec![Transition::new("ready", "msg", "sent"), Transition::new("sent", TAU, "ready")],
//! )
//! .unwrap();
//! let receiver = Automaton::new(
//!     "receiver",
//!     ["waiting", "got"],
//!     [TAU, "msg"],
//!     vec![Transition::new("waiting", "msg", "got"), Transition::new("got", TAU, "waiting")],
//! )
//! .unwrap();
//! let network = Network::new(vec![sender, receiver], ["msg"]);
//!
//! let bdd = Bdd::default();
//! let mut reach = Reachability::new(&bdd, &network, ReachConfig::default()).unwrap();
//! let outcome = reach.run(&mut Silent).unwrap();
//!
//! // (ready, waiting), (sent, got), (ready, got), (sent, waiting)
//! assert_eq!(outcome.states, BigUint::from(4u32));
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: The manager: node construction, ITE-based Boolean operations, reference counting and garbage collection.
//! - **[`quantify`]**, **[`rename`]**, **[`sat`]**: Quantification and relational product, variable substitution, model counting.
//! - **[`automaton`]**: Automata and networks.
//! - **[`modgraph`]**: Reading automata and synchronization alphabets from `.modgraph` files.
//!
//! For the representation details, check the [`bdd`] module documentation.

pub mod alloc;
pub mod automaton;
pub mod bdd;
pub mod cache;
pub mod compose;
pub mod encode;
pub mod error;
pub mod modgraph;
pub mod node;
pub mod quantify;
pub mod reach;
pub mod reference;
pub mod rename;
pub mod sat;
pub mod storage;
pub mod subtable;
pub mod types;
