//! Symbolic reachability.
//!
//! Starting from the initial global state, [`Reachability::run`] repeatedly
//! computes the one-step image of the states found so far and adds it to the
//! accumulated set, until the set stops growing:
//!
//! ```text
//! reached_0     = init
//! reached_{k+1} = reached_k ∨ rename(∃current. T ∧ frontier_k, next → current)
//! ```
//!
//! Since diagrams are canonical, convergence is detected by comparing handles.

use log::{debug, info};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::alloc::{Allocation, VarAllocator};
use crate::automaton::Network;
use crate::bdd::Bdd;
use crate::compose::TransitionRelation;
use crate::encode::EncodedAutomaton;
use crate::error::{Error, Result};
use crate::reference::Ref;
use crate::types::Var;

/// How images are computed.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ImageStrategy {
    /// One relational product with the global relation.
    Monolithic,
    /// Disjunction of one relational product per partition.
    #[default]
    Partitioned,
}

#[derive(Debug, Clone)]
pub struct ReachConfig {
    /// Widest state block an automaton may need.
    pub max_state_width: usize,
    pub strategy: ImageStrategy,
    /// Compute each image from the newly discovered states only.
    pub use_frontier: bool,
}

impl Default for ReachConfig {
    fn default() -> Self {
        Self {
            max_state_width: 16,
            strategy: ImageStrategy::default(),
            use_frontier: true,
        }
    }
}

impl ReachConfig {
    pub fn with_max_state_width(mut self, width: usize) -> Self {
        self.max_state_width = width;
        self
    }

    pub fn with_strategy(mut self, strategy: ImageStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_frontier(mut self, use_frontier: bool) -> Self {
        self.use_frontier = use_frontier;
        self
    }
}

/// Receives progress reports from [`Reachability::run`].
pub trait ProgressSink {
    /// Called at the start of iteration `index` (from 1) with the weight of the states found so far.
    fn iteration(&mut self, index: usize, weight: f64);

    /// Called once after convergence.
    fn converged(&mut self, states: f64, transitions: f64);

    /// Polled between iterations; returning `true` stops the run with [`Error::Cancelled`].
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Logs progress at `info` level.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn iteration(&mut self, index: usize, weight: f64) {
        info!("Iteration {}: {} states", index, weight);
    }

    fn converged(&mut self, states: f64, transitions: f64) {
        info!("Reachable states: {}, transitions: {}", states, transitions);
    }
}

/// Discards all reports.
#[derive(Debug, Default)]
pub struct Silent;

impl ProgressSink for Silent {
    fn iteration(&mut self, _index: usize, _weight: f64) {}

    fn converged(&mut self, _states: f64, _transitions: f64) {}
}

/// Records all reports.
#[derive(Debug, Default)]
pub struct Trace {
    pub weights: Vec<f64>,
    pub result: Option<(f64, f64)>,
    /// Cancel once this many iterations have been reported.
    pub cancel_after: Option<usize>,
}

impl ProgressSink for Trace {
    fn iteration(&mut self, _index: usize, weight: f64) {
        self.weights.push(weight);
    }

    fn converged(&mut self, states: f64, transitions: f64) {
        self.result = Some((states, transitions));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_after.is_some_and(|n| self.weights.len() >= n)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    Initial,
    Iterating { iteration: usize },
    Converged { iterations: usize },
}

#[derive(Debug, Clone)]
pub struct ReachOutcome {
    /// Reachable states over the current-state variables.
    pub reachable: Ref,
    pub states: BigUint,
    /// Distinct pairs of reachable states connected by one step.
    pub transitions: BigUint,
    pub iterations: usize,
    /// Weight of the accumulated set at the start of every iteration.
    pub history: Vec<f64>,
}

/// Reachability analysis of one network inside a manager.
pub struct Reachability<'a> {
    bdd: &'a Bdd,
    config: ReachConfig,
    allocation: Allocation,
    encoded: Vec<EncodedAutomaton>,
    relation: TransitionRelation,
    initial: Ref,
    current_vars: Vec<Var>,
    next_vars: Vec<Var>,
    next_to_current: Vec<(Var, Var)>,
    phase: Phase,
}

impl<'a> Reachability<'a> {
    /// Allocate, encode and compose `network` in `bdd`.
    ///
    /// All validation happens here; [`run`][Reachability::run] can only fail
    /// on the node budget or on cancellation. The diagrams built here are
    /// released when the engine is dropped.
    pub fn new(bdd: &'a Bdd, network: &Network, config: ReachConfig) -> Result<Self> {
        debug!("Preparing reachability with {:?}", config);
        let allocation = VarAllocator::new(config.max_state_width).allocate(bdd, network)?;

        let mut encoded = Vec::with_capacity(network.automata().len());
        for (automaton, block) in network.automata().iter().zip(&allocation.blocks) {
            match EncodedAutomaton::encode(bdd, automaton, block, &allocation.actions) {
                Ok(enc) => encoded.push(enc),
                Err(e) => {
                    encoded.iter().for_each(|enc| enc.release(bdd));
                    return Err(e);
                }
            }
        }

        let composed = TransitionRelation::compose(bdd, network, &encoded).and_then(|relation| {
            match bdd.apply_and_many(encoded.iter().map(|e| e.initial())) {
                Ok(initial) => Ok((relation, initial)),
                Err(e) => {
                    relation.release(bdd);
                    Err(e)
                }
            }
        });
        let (relation, initial) = match composed {
            Ok(res) => res,
            Err(e) => {
                encoded.iter().for_each(|enc| enc.release(bdd));
                return Err(e);
            }
        };

        Ok(Self {
            bdd,
            config,
            current_vars: allocation.current_vars(),
            next_vars: allocation.next_vars(),
            next_to_current: allocation.next_to_current(),
            allocation,
            encoded,
            relation,
            initial,
            phase: Phase::Initial,
        })
    }

    pub fn config(&self) -> &ReachConfig {
        &self.config
    }

    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    pub fn encoded(&self) -> &[EncodedAutomaton] {
        &self.encoded
    }

    pub fn relation(&self) -> &TransitionRelation {
        &self.relation
    }

    /// The initial global state over the current-state variables.
    pub fn initial(&self) -> Ref {
        self.initial
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_vars(&self) -> &[Var] {
        &self.current_vars
    }

    pub fn next_vars(&self) -> &[Var] {
        &self.next_vars
    }

    /// One-step successors of `states`, over the current-state variables.
    pub fn image(&self, states: Ref) -> Result<Ref> {
        let bdd = self.bdd;
        let successors = match self.config.strategy {
            ImageStrategy::Monolithic => bdd.and_exists(self.relation.global(), states, &self.current_vars)?,
            ImageStrategy::Partitioned => {
                let mut images = Vec::with_capacity(self.relation.partitions().len());
                for partition in self.relation.partitions() {
                    match bdd.and_exists(partition.relation, states, &self.current_vars) {
                        Ok(image) => images.push(image),
                        Err(e) => {
                            images.iter().for_each(|&f| bdd.release(f));
                            return Err(e);
                        }
                    }
                }
                let res = bdd.apply_or_many(images.iter().copied());
                images.iter().for_each(|&f| bdd.release(f));
                res?
            }
        };
        let res = bdd.rename(successors, &self.next_to_current);
        bdd.release(successors);
        res
    }

    /// Number of states in `states`, over the current-state variables.
    pub fn count_states(&self, states: Ref) -> Result<BigUint> {
        self.bdd.sat_count(states, &self.current_vars)
    }

    /// Number of steps between states of `states`.
    pub fn count_transitions(&self, states: Ref) -> Result<BigUint> {
        let pairs = self.bdd.apply_and(self.relation.global(), states)?;
        let mut vars = self.current_vars.clone();
        vars.extend_from_slice(&self.next_vars);
        let count = self.bdd.sat_count(pairs, &vars);
        self.bdd.release(pairs);
        count
    }

    /// Compute the reachable states, reporting progress to `sink`.
    ///
    /// Every call starts over from the initial state.
    pub fn run(&mut self, sink: &mut dyn ProgressSink) -> Result<ReachOutcome> {
        let bdd = self.bdd;
        let mut history = Vec::new();

        let mut reached = self.initial;
        let mut frontier = self.initial;
        bdd.retain(reached);
        bdd.retain(frontier);

        let result = loop {
            let iteration = history.len() + 1;
            self.phase = Phase::Iterating { iteration };

            let weight = match bdd.satisfying_weight(reached, &self.current_vars) {
                Ok(weight) => weight,
                Err(e) => break Err(e),
            };
            history.push(weight);
            sink.iteration(iteration, weight);
            if sink.is_cancelled() {
                info!("Cancelled at iteration {}", iteration);
                break Err(Error::Cancelled { iteration });
            }

            let from = if self.config.use_frontier { frontier } else { reached };
            let step = self.image(from).and_then(|image| {
                let next = bdd.apply_or(reached, image);
                bdd.release(image);
                next
            });
            let next = match step {
                Ok(next) => next,
                Err(e) => break Err(e),
            };

            if next == reached {
                bdd.release(next);
                debug!("Converged after {} iterations", iteration);
                break Ok(iteration);
            }

            let discovered = bdd.apply_and(next, -reached);
            bdd.release(frontier);
            bdd.release(reached);
            reached = next;
            frontier = match discovered {
                Ok(f) => f,
                Err(e) => {
                    bdd.release(reached);
                    self.phase = Phase::Initial;
                    return Err(e);
                }
            };
        };

        bdd.release(frontier);
        let iterations = match result {
            Ok(iterations) => iterations,
            Err(e) => {
                bdd.release(reached);
                self.phase = Phase::Initial;
                return Err(e);
            }
        };
        self.phase = Phase::Converged { iterations };

        let counts = self
            .count_states(reached)
            .and_then(|states| Ok((states, self.count_transitions(reached)?)));
        let (states, transitions) = match counts {
            Ok(counts) => counts,
            Err(e) => {
                bdd.release(reached);
                self.phase = Phase::Initial;
                return Err(e);
            }
        };
        sink.converged(
            states.to_f64().unwrap_or(f64::INFINITY),
            transitions.to_f64().unwrap_or(f64::INFINITY),
        );

        Ok(ReachOutcome {
            reachable: reached,
            states,
            transitions,
            iterations,
            history,
        })
    }
}

impl Drop for Reachability<'_> {
    fn drop(&mut self) {
        self.encoded.iter().for_each(|enc| enc.release(self.bdd));
        self.relation.release(self.bdd);
        self.bdd.release(self.initial);
    }
}
