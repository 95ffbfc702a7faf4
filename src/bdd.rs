//! The BDD manager.
//!
//! All diagrams live inside one [`Bdd`] manager, which owns the node arena, the
//! per-variable unique tables and the computed table. Callers only ever see
//! [`Ref`] handles. Every operation goes through the manager, which is passed
//! explicitly by reference; several managers can coexist, but handles must not
//! be mixed between them.
//!
//! # Canonicity
//!
//! Nodes are hash-consed: `mk_node` looks the `(variable, low, high)`
//! triple up in the unique table before creating it, removes redundant tests
//! (`low == high`), and keeps the high edge regular (complement edges are
//! pushed to the low edge and to the incoming handle). Together with the fixed
//! variable order this means that equal Boolean functions always get equal
//! handles, so equivalence is a handle comparison.
//!
//! # Memory
//!
//! Every handle returned by a public constructive operation has been retained
//! once; callers drop their interest with [`Bdd::release`]. Nodes are reclaimed
//! lazily: only when creating a node would exceed the configured node budget
//! is the running operation abandoned, a collection performed (keeping
//! everything reachable from a retained handle or from the operands), and the
//! operation restarted. If the retry still does not fit, the operation fails
//! with [`Error::NodeBudgetExceeded`].

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::{debug, trace};

use crate::cache::{Cache, OpKey};
use crate::error::{Error, Result};
use crate::node::Node;
use crate::reference::Ref;
use crate::storage::Storage;
use crate::subtable::Subtable;
use crate::types::Var;

/// Manager configuration.
///
/// ```
/// use bdd_reach::bdd::{Bdd, BddConfig};
///
/// let config = BddConfig::default().with_cache_bits(12).with_node_budget(1 << 16);
/// let bdd = Bdd::with_config(config);
/// assert_eq!(bdd.node_budget(), Some(1 << 16));
/// ```
#[derive(Debug, Clone)]
pub struct BddConfig {
    /// Initial arena capacity is `2^storage_bits` nodes.
    pub storage_bits: usize,
    /// Initial computed-table capacity is `2^cache_bits` entries.
    pub cache_bits: usize,
    /// Maximum number of live nodes (terminal included), or `None` for no limit.
    pub node_budget: Option<usize>,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            storage_bits: 16,
            cache_bits: 14,
            node_budget: None,
        }
    }
}

impl BddConfig {
    pub fn with_storage_bits(mut self, bits: usize) -> Self {
        self.storage_bits = bits;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }

    pub fn with_node_budget(mut self, budget: usize) -> Self {
        self.node_budget = Some(budget);
        self
    }
}

/// A Boolean operation over diagrams, for use with [`Bdd::apply`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BoolOp {
    Not(Ref),
    And(Ref, Ref),
    Or(Ref, Ref),
    Xor(Ref, Ref),
    /// Equivalence (XNOR).
    Eq(Ref, Ref),
    /// If-then-else: `(f ∧ g) ∨ (¬f ∧ h)`.
    Ite(Ref, Ref, Ref),
}

pub struct Bdd {
    storage: RefCell<Storage>,
    subtables: RefCell<Vec<Subtable>>,
    pub(crate) cache: RefCell<Cache<OpKey, Ref>>,
    node_budget: Option<usize>,
    gc_runs: Cell<usize>,
}

impl Bdd {
    pub fn new(storage_bits: usize) -> Self {
        Self::with_config(BddConfig::default().with_storage_bits(storage_bits))
    }

    pub fn with_config(config: BddConfig) -> Self {
        debug!("Creating BDD manager with {:?}", config);
        Self {
            storage: RefCell::new(Storage::new(config.storage_bits)),
            subtables: RefCell::new(Vec::new()),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            node_budget: config.node_budget,
            gc_runs: Cell::new(0),
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::with_config(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("num_vars", &self.num_vars())
            .field("size", &storage.size())
            .field("real_size", &storage.real_size())
            .field("peak_size", &storage.peak_size())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .field("gc_runs", &self.gc_runs.get())
            .finish()
    }
}

// Terminals, variables and node access
impl Bdd {
    pub fn one(&self) -> Ref {
        Ref::ONE
    }
    pub fn zero(&self) -> Ref {
        Ref::ZERO
    }

    /// Returns the canonical constant diagram.
    pub fn terminal(&self, value: bool) -> Ref {
        if value {
            Ref::ONE
        } else {
            Ref::ZERO
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == Ref::ZERO
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == Ref::ONE
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.is_terminal()
    }

    /// Appends a fresh variable at the bottom of the order.
    pub fn allocate_variable(&self) -> Var {
        let mut subtables = self.subtables.borrow_mut();
        let var = Var::new(subtables.len() as u32 + 1);
        subtables.push(Subtable::new(var));
        debug!("allocated variable {}", var);
        var
    }

    /// Number of allocated variables.
    pub fn num_vars(&self) -> usize {
        self.subtables.borrow().len()
    }

    pub(crate) fn check_var(&self, var: Var) -> Result<()> {
        if var.index() < self.num_vars() {
            Ok(())
        } else {
            Err(Error::invalid_var(var))
        }
    }

    pub(crate) fn check_vars<'a>(&self, vars: impl IntoIterator<Item = &'a Var>) -> Result<()> {
        vars.into_iter().try_for_each(|&v| self.check_var(v))
    }

    /// The node behind the handle, without the complement applied.
    pub fn node(&self, node: Ref) -> Node {
        self.storage.borrow().node(node.id())
    }

    /// Top variable of the diagram, or `None` for terminals.
    ///
    /// To build the diagram of a single variable, use [`mk_var`][Bdd::mk_var].
    pub fn variable(&self, node: Ref) -> Option<Var> {
        if node.is_terminal() {
            None
        } else {
            Some(Var::new(self.node(node).variable))
        }
    }

    /// Position of the top variable in the order; terminals sit below every variable.
    pub(crate) fn level(&self, node: Ref) -> u32 {
        if node.is_terminal() {
            u32::MAX
        } else {
            self.node(node).variable
        }
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        self.node(node).low.negate_if(node.is_negated())
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        self.node(node).high.negate_if(node.is_negated())
    }

    /// Cofactors of `node` with respect to variable `v`, which must not be below its top variable.
    pub(crate) fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if node.is_terminal() {
            return (node, node);
        }
        let n = self.node(node);
        if v < n.variable {
            return (node, node);
        }
        debug_assert_eq!(v, n.variable);
        let neg = node.is_negated();
        (n.low.negate_if(neg), n.high.negate_if(neg))
    }
}

// Node construction
impl Bdd {
    /// Find or create the node `(v, low, high)`.
    ///
    /// The result is not retained; this is the building block of all recursive operations.
    pub(crate) fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Result<Ref> {
        debug_assert_ne!(v, 0, "Variable index should not be zero");

        if low == high {
            return Ok(low);
        }
        if high.is_negated() {
            return Ok(-self.mk_node(v, -low, -high)?);
        }
        debug_assert!(v < self.level(low) && v < self.level(high), "variable order violated");

        let index = (v - 1) as usize;
        let existing = self.subtables.borrow()[index].find(low, high);
        if let Some(id) = existing {
            return Ok(Ref::positive(id));
        }

        if let Some(budget) = self.node_budget {
            if self.storage.borrow().real_size() >= budget {
                debug!("mk(v = {}): node budget of {} reached", v, budget);
                return Err(Error::NodeBudgetExceeded { budget });
            }
        }

        let id = self.storage.borrow_mut().add(Node {
            variable: v,
            low,
            high,
        });
        self.subtables.borrow_mut()[index].insert(low, high, id);
        trace!("mk(v = {}, low = {}, high = {}) -> @{}", v, low, high, id);
        Ok(Ref::positive(id))
    }

    /// Returns the diagram of the single variable `v`.
    pub fn mk_var(&self, v: Var) -> Result<Ref> {
        self.check_var(v)?;
        self.guarded(&[], || self.mk_node(v.id(), Ref::ZERO, Ref::ONE))
    }

    /// Returns `v` if `value` holds, `¬v` otherwise.
    pub fn mk_literal(&self, v: Var, value: bool) -> Result<Ref> {
        let x = self.mk_var(v)?;
        Ok(x.negate_if(!value))
    }

    /// Conjunction of literals. Contradictory literals yield the false diagram.
    pub fn mk_cube(&self, literals: impl IntoIterator<Item = (Var, bool)>) -> Result<Ref> {
        let mut assignment = BTreeMap::new();
        for (var, value) in literals {
            self.check_var(var)?;
            if *assignment.entry(var).or_insert(value) != value {
                debug!("mk_cube: contradictory literals on {}", var);
                return Ok(Ref::ZERO);
            }
        }
        debug!("mk_cube({:?})", assignment);
        self.guarded(&[], || {
            let mut current = Ref::ONE;
            for (&var, &value) in assignment.iter().rev() {
                current = if value {
                    self.mk_node(var.id(), Ref::ZERO, current)?
                } else {
                    self.mk_node(var.id(), current, Ref::ZERO)?
                };
            }
            Ok(current)
        })
    }

    /// Positive cube over `vars`, the representation of variable sets used by quantification.
    pub(crate) fn mk_var_set(&self, vars: &[Var]) -> Result<Ref> {
        self.mk_cube(vars.iter().map(|&v| (v, true)))
    }
}

// Boolean operations
impl Bdd {
    pub(crate) fn ite_rec(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref> {
        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if f == Ref::ONE {
            return Ok(g);
        }
        if f == Ref::ZERO {
            return Ok(h);
        }
        if g == h {
            return Ok(g);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        let (mut f, mut g, mut h) = (f, g, h);
        if g == f {
            g = Ref::ONE;
        } else if g == -f {
            g = Ref::ZERO;
        }
        if h == f {
            h = Ref::ZERO;
        } else if h == -f {
            h = Ref::ONE;
        }
        if g == h {
            return Ok(g);
        }
        if g.is_terminal() && h.is_terminal() {
            return Ok(f.negate_if(g == Ref::ZERO));
        }

        // Equivalent pairs, choose the one with the topmost first argument:
        //   ite(F,1,H) == ite(H,1,F)
        //   ite(F,G,0) == ite(G,F,0)
        //   ite(F,G,1) == ite(~G,~F,1)
        //   ite(F,0,H) == ite(~H,0,~F)
        //   ite(F,G,~G) == ite(G,F,~F)
        let i = self.level(f);
        let j = self.level(g);
        let k = self.level(h);
        if g == Ref::ONE && k < i {
            std::mem::swap(&mut f, &mut h);
        } else if h == Ref::ZERO && j < i {
            std::mem::swap(&mut f, &mut g);
        } else if h == Ref::ONE && j < i {
            (f, g) = (-g, -f);
        } else if g == Ref::ZERO && k < i {
            (f, h) = (-h, -f);
        } else if g == -h && j < i {
            (f, g, h) = (g, f, -f);
        }

        // ite(~F,G,H) => ite(F,H,G)
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        // ite(F,~G,H) => ~ite(F,G,~H)
        let negate = g.is_negated();
        if negate {
            g = -g;
            h = -h;
        }

        let key = OpKey::Ite(f, g, h);
        let cached = self.cache.borrow_mut().get(&key);
        if let Some(res) = cached {
            trace!("cache: ite({}, {}, {}) -> {}", f, g, h, res);
            return Ok(res.negate_if(negate));
        }

        let m = self.level(f).min(self.level(g)).min(self.level(h));
        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.ite_rec(f0, g0, h0)?;
        let t = self.ite_rec(f1, g1, h1)?;
        let res = self.mk_node(m, e, t)?;
        self.cache.borrow_mut().insert(key, res);

        Ok(res.negate_if(negate))
    }

    /// Apply a Boolean operation and return the canonical result.
    ///
    /// ```
    /// use bdd_reach::bdd::{Bdd, BoolOp};
    ///
    /// let bdd = Bdd::default();
    /// let a = bdd.allocate_variable();
    /// let b = bdd.allocate_variable();
    /// let x = bdd.mk_var(a).unwrap();
    /// let y = bdd.mk_var(b).unwrap();
    ///
    /// let f = bdd.apply(BoolOp::And(x, y)).unwrap();
    /// let not_x = bdd.apply(BoolOp::Not(x)).unwrap();
    /// let not_y = bdd.apply(BoolOp::Not(y)).unwrap();
    /// let g = bdd.apply(BoolOp::Or(not_x, not_y)).unwrap();
    /// assert_eq!(f, bdd.apply(BoolOp::Not(g)).unwrap());
    /// ```
    pub fn apply(&self, op: BoolOp) -> Result<Ref> {
        match op {
            BoolOp::Not(f) => Ok(self.apply_not(f)),
            BoolOp::And(f, g) => self.apply_and(f, g),
            BoolOp::Or(f, g) => self.apply_or(f, g),
            BoolOp::Xor(f, g) => self.apply_xor(f, g),
            BoolOp::Eq(f, g) => self.apply_eq(f, g),
            BoolOp::Ite(f, g, h) => self.apply_ite(f, g, h),
        }
    }

    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref> {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);
        self.guarded(&[f, g, h], || self.ite_rec(f, g, h))
    }

    /// Negation never allocates: it flips the complement bit.
    pub fn apply_not(&self, f: Ref) -> Ref {
        self.retain(f);
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Result<Ref> {
        debug!("apply_and(u = {}, v = {})", u, v);
        self.guarded(&[u, v], || self.ite_rec(u, v, Ref::ZERO))
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Result<Ref> {
        debug!("apply_or(u = {}, v = {})", u, v);
        self.guarded(&[u, v], || self.ite_rec(u, Ref::ONE, v))
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Result<Ref> {
        debug!("apply_xor(u = {}, v = {})", u, v);
        self.guarded(&[u, v], || self.ite_rec(u, -v, v))
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Result<Ref> {
        debug!("apply_eq(u = {}, v = {})", u, v);
        self.guarded(&[u, v], || self.ite_rec(u, v, -v))
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        let mut res = Ref::ONE;
        for node in nodes {
            let next = self.apply_and(res, node);
            self.release(res);
            res = next?;
        }
        Ok(res)
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        let mut res = Ref::ZERO;
        for node in nodes {
            let next = self.apply_or(res, node);
            self.release(res);
            res = next?;
        }
        Ok(res)
    }
}

// Reference counting and garbage collection
impl Bdd {
    /// Run a top-level operation, collecting garbage and retrying once if it hits the node budget.
    ///
    /// The result is retained.
    pub(crate) fn guarded(&self, operands: &[Ref], op: impl Fn() -> Result<Ref>) -> Result<Ref> {
        let res = match op() {
            Err(Error::NodeBudgetExceeded { budget }) => {
                let freed = self.collect_garbage(operands);
                debug!("node budget of {} reached: freed {} nodes, retrying", budget, freed);
                op()?
            }
            res => res?,
        };
        self.retain(res);
        Ok(res)
    }

    /// Increment the external reference count of the node behind `f`.
    pub fn retain(&self, f: Ref) {
        if !f.is_terminal() {
            self.storage.borrow_mut().inc_ref(f.id());
        }
    }

    /// Decrement the external reference count of the node behind `f`.
    ///
    /// The node stays in the table until a collection finds it unreachable.
    pub fn release(&self, f: Ref) {
        if f.is_terminal() {
            return;
        }
        let mut storage = self.storage.borrow_mut();
        if storage.is_occupied(f.id()) {
            storage.dec_ref(f.id());
        }
    }

    /// External reference count of the node behind `f` (always 0 for terminals).
    pub fn ref_count(&self, f: Ref) -> u32 {
        if f.is_terminal() {
            0
        } else {
            self.storage.borrow().refs(f.id())
        }
    }

    /// Ids of all nodes reachable from `nodes`, the terminal included.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<u32> {
        let mut visited = HashSet::new();
        visited.insert(0);
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            if visited.insert(node.id()) {
                let n = self.node(node);
                queue.push_back(n.low);
                queue.push_back(n.high);
            }
        }

        visited
    }

    /// Number of distinct nodes in the diagram, the terminal included.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Reclaim every node not reachable from a retained handle or from `extra_roots`.
    ///
    /// Clears the computed table. Returns the number of freed nodes.
    pub fn collect_garbage(&self, extra_roots: &[Ref]) -> usize {
        debug!("Collecting garbage...");
        self.cache.borrow_mut().clear();

        let mut roots: Vec<Ref> = self.storage.borrow().referenced().map(Ref::positive).collect();
        roots.extend_from_slice(extra_roots);
        let alive = self.descendants(roots);

        let mut freed = 0;
        let mut subtables = self.subtables.borrow_mut();
        let mut storage = self.storage.borrow_mut();
        for subtable in subtables.iter_mut() {
            for id in subtable.retain(|id| alive.contains(&id)) {
                storage.drop(id);
                freed += 1;
            }
        }
        self.gc_runs.set(self.gc_runs.get() + 1);

        debug!("Freed {} nodes, {} alive", freed, storage.real_size());
        freed
    }

    /// Number of nodes currently in the table, the terminal included.
    pub fn live_nodes(&self) -> usize {
        self.storage.borrow().real_size()
    }

    pub fn peak_nodes(&self) -> usize {
        self.storage.borrow().peak_size()
    }

    pub fn node_budget(&self) -> Option<usize> {
        self.node_budget
    }

    pub fn gc_runs(&self) -> usize {
        self.gc_runs.get()
    }

    pub fn cache_hits(&self) -> usize {
        self.cache.borrow().hits()
    }

    pub fn cache_misses(&self) -> usize {
        self.cache.borrow().misses()
    }
}
