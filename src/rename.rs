//! Variable substitution.

use std::collections::HashMap;

use log::debug;

use crate::bdd::Bdd;
use crate::error::Result;
use crate::reference::Ref;
use crate::types::Var;

impl Bdd {
    /// Simultaneously replace every variable `from` by `to` for each `(from, to)` in `mapping`.
    ///
    /// Variables not mentioned in the mapping are kept. The mapping does not
    /// need to preserve the variable order; when it does (as for the
    /// next-to-current shift between reachability iterations) the result is
    /// rebuilt node by node without any intermediate conjunctions.
    ///
    /// # Examples
    ///
    /// ```
    /// use bdd_reach::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let a = bdd.allocate_variable();
    /// let b = bdd.allocate_variable();
    /// let c = bdd.allocate_variable();
    /// let x = bdd.mk_var(a).unwrap();
    /// let y = bdd.mk_var(b).unwrap();
    /// let z = bdd.mk_var(c).unwrap();
    ///
    /// let f = bdd.apply_and(x, -y).unwrap();
    /// let g = bdd.rename(f, &[(a, b), (b, c)]).unwrap();
    /// assert_eq!(g, bdd.apply_and(y, -z).unwrap());
    /// ```
    pub fn rename(&self, f: Ref, mapping: &[(Var, Var)]) -> Result<Ref> {
        debug!("rename(f = {}, mapping = {:?})", f, mapping);
        let mut map = HashMap::with_capacity(mapping.len());
        for &(from, to) in mapping {
            self.check_var(from)?;
            self.check_var(to)?;
            if from != to {
                map.insert(from.id(), to.id());
            }
        }
        if map.is_empty() {
            self.retain(f);
            return Ok(f);
        }
        self.guarded(&[f], || self.rename_rec(f, &map, &mut HashMap::new()))
    }

    fn rename_rec(&self, f: Ref, map: &HashMap<u32, u32>, cache: &mut HashMap<Ref, Ref>) -> Result<Ref> {
        if f.is_terminal() {
            return Ok(f);
        }

        // rename(¬f) = ¬rename(f), so only regular nodes are cached.
        let node = f.regular();
        if let Some(&res) = cache.get(&node) {
            return Ok(res.negate_if(f.is_negated()));
        }

        let n = self.node(node);
        let low = self.rename_rec(n.low, map, cache)?;
        let high = self.rename_rec(n.high, map, cache)?;
        let v = map.get(&n.variable).copied().unwrap_or(n.variable);

        let res = if v < self.level(low) && v < self.level(high) {
            self.mk_node(v, low, high)?
        } else {
            let x = self.mk_node(v, Ref::ZERO, Ref::ONE)?;
            self.ite_rec(x, high, low)?
        };

        cache.insert(node, res);
        Ok(res.negate_if(f.is_negated()))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::error::Error;

    fn setup(n: usize) -> (Bdd, Vec<Var>, Vec<Ref>) {
        let bdd = Bdd::default();
        let vars: Vec<Var> = (0..n).map(|_| bdd.allocate_variable()).collect();
        let refs = vars.iter().map(|&v| bdd.mk_var(v).unwrap()).collect();
        (bdd, vars, refs)
    }

    #[test]
    fn test_rename_order_preserving() {
        let (bdd, v, x) = setup(4);

        // (x3 ∧ ¬x4) renamed x3->x1, x4->x2
        let f = bdd.apply_and(x[2], -x[3]).unwrap();
        let g = bdd.rename(f, &[(v[2], v[0]), (v[3], v[1])]).unwrap();
        assert_eq!(g, bdd.apply_and(x[0], -x[1]).unwrap());

        // And back again
        let h = bdd.rename(g, &[(v[0], v[2]), (v[1], v[3])]).unwrap();
        assert_eq!(h, f);
    }

    #[test]
    fn test_rename_swap() {
        let (bdd, v, x) = setup(2);

        // x1 ∧ ¬x2 with x1 <-> x2 swapped is x2 ∧ ¬x1
        let f = bdd.apply_and(x[0], -x[1]).unwrap();
        let g = bdd.rename(f, &[(v[0], v[1]), (v[1], v[0])]).unwrap();
        assert_eq!(g, bdd.apply_and(x[1], -x[0]).unwrap());
    }

    #[test]
    fn test_rename_identity() {
        let (bdd, v, x) = setup(2);

        let f = bdd.apply_xor(x[0], x[1]).unwrap();
        assert_eq!(bdd.rename(f, &[]).unwrap(), f);
        assert_eq!(bdd.rename(f, &[(v[0], v[0])]).unwrap(), f);
        assert_eq!(bdd.rename(bdd.one(), &[(v[0], v[1])]).unwrap(), bdd.one());
    }

    #[test]
    fn test_rename_merge() {
        let (bdd, v, x) = setup(2);

        // x1 ⊕ x2 with x1 := x2 collapses to false
        let f = bdd.apply_xor(x[0], x[1]).unwrap();
        assert!(bdd.is_zero(bdd.rename(f, &[(v[0], v[1])]).unwrap()));
    }

    #[test]
    fn test_rename_invalid_variable() {
        let (bdd, v, x) = setup(1);
        assert_eq!(
            bdd.rename(x[0], &[(v[0], Var::new(3))]),
            Err(Error::InvalidVariable { var: 3 })
        );
    }
}
