use std::collections::{BTreeSet, HashMap};

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use crate::bdd::Bdd;
use crate::error::{Error, Result};
use crate::reference::Ref;
use crate::types::Var;

impl Bdd {
    /// Variables the diagram depends on, in order.
    pub fn support(&self, f: Ref) -> Vec<Var> {
        let mut vars = BTreeSet::new();
        for id in self.descendants([f]) {
            if id != 0 {
                vars.insert(self.node(Ref::positive(id)).variable);
            }
        }
        vars.into_iter().map(Var::new).collect()
    }

    /// Value of `f` under `assignment`, where `assignment[i]` is the value of variable `x{i+1}`.
    pub fn evaluate(&self, f: Ref, assignment: &[bool]) -> Result<bool> {
        let mut current = f;
        while !current.is_terminal() {
            let v = self.node(current).variable;
            let value = *assignment
                .get(v as usize - 1)
                .ok_or(Error::InvalidVariable { var: v })?;
            current = if value {
                self.high_node(current)
            } else {
                self.low_node(current)
            };
        }
        Ok(current == Ref::ONE)
    }

    /// Number of assignments to `vars` satisfying `f`.
    ///
    /// Variables in `vars` that the diagram does not test count twice each.
    /// Every variable `f` depends on must be in `vars`.
    ///
    /// ```
    /// use bdd_reach::bdd::Bdd;
    /// use num_bigint::BigUint;
    ///
    /// let bdd = Bdd::default();
    /// let vars: Vec<_> = (0..3).map(|_| bdd.allocate_variable()).collect();
    /// let x = bdd.mk_var(vars[0]).unwrap();
    ///
    /// assert_eq!(bdd.sat_count(x, &vars).unwrap(), BigUint::from(4u32));
    /// assert_eq!(bdd.sat_count(bdd.one(), &vars).unwrap(), BigUint::from(8u32));
    /// ```
    pub fn sat_count(&self, f: Ref, vars: &[Var]) -> Result<BigUint> {
        self.check_vars(vars)?;
        let vars: BTreeSet<Var> = vars.iter().copied().collect();
        if let Some(&v) = self.support(f).iter().find(|v| !vars.contains(v)) {
            return Err(Error::invalid_var(v));
        }

        let max = BigUint::one() << vars.len();
        let mut cache = HashMap::new();
        Ok(self.sat_count_rec(f, &max, &mut cache))
    }

    fn sat_count_rec(&self, f: Ref, max: &BigUint, cache: &mut HashMap<u32, BigUint>) -> BigUint {
        if f == Ref::ZERO {
            return BigUint::zero();
        } else if f == Ref::ONE {
            return max.clone();
        }

        let count = if let Some(count) = cache.get(&f.id()) {
            count.clone()
        } else {
            let n = self.node(f);
            let count_low = self.sat_count_rec(n.low, max, cache);
            let count_high = self.sat_count_rec(n.high, max, cache);
            let count: BigUint = (count_low + count_high) >> 1;
            cache.insert(f.id(), count.clone());
            count
        };

        if f.is_negated() {
            max - count
        } else {
            count
        }
    }

    /// [`sat_count`][Bdd::sat_count] as a float; saturates at infinity for huge counts.
    pub fn satisfying_weight(&self, f: Ref, vars: &[Var]) -> Result<f64> {
        let count = self.sat_count(f, vars)?;
        Ok(count.to_f64().unwrap_or(f64::INFINITY))
    }
}
