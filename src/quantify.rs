//! Existential quantification and the relational product.
//!
//! A set of variables is passed down the recursion as a positive cube: the
//! conjunction of the quantified variables, a chain of nodes whose low edges
//! all point to false. Walking the chain along the high edges yields the
//! variables in order, which is what the recursions need to decide whether
//! the current top variable is quantified.

use log::debug;

use crate::bdd::Bdd;
use crate::cache::OpKey;
use crate::error::Result;
use crate::reference::Ref;
use crate::types::Var;

impl Bdd {
    /// Existential quantification `∃vars. f`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bdd_reach::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let a = bdd.allocate_variable();
    /// let b = bdd.allocate_variable();
    /// let x = bdd.mk_var(a).unwrap();
    /// let y = bdd.mk_var(b).unwrap();
    /// let f = bdd.apply_and(x, y).unwrap();
    ///
    /// // ∃x. x ∧ y = y
    /// assert_eq!(bdd.exists(f, &[a]).unwrap(), y);
    /// ```
    pub fn exists(&self, f: Ref, vars: &[Var]) -> Result<Ref> {
        debug!("exists(f = {}, vars = {:?})", f, vars);
        let cube = self.mk_var_set(vars)?;
        let res = self.guarded(&[f, cube], || self.exists_rec(f, cube));
        self.release(cube);
        res
    }

    /// Universal quantification `∀vars. f = ¬∃vars. ¬f`.
    pub fn forall(&self, f: Ref, vars: &[Var]) -> Result<Ref> {
        Ok(-self.exists(-f, vars)?)
    }

    /// Relational product `∃vars. f ∧ g`, without building the conjunction first.
    pub fn and_exists(&self, f: Ref, g: Ref, vars: &[Var]) -> Result<Ref> {
        debug!("and_exists(f = {}, g = {}, vars = {:?})", f, g, vars);
        let cube = self.mk_var_set(vars)?;
        let res = self.guarded(&[f, g, cube], || self.and_exists_rec(f, g, cube));
        self.release(cube);
        res
    }

    /// Drop the variables of `cube` that lie above `level`; `f` cannot depend on them.
    fn skip_vars_above(&self, cube: Ref, level: u32) -> Ref {
        let mut cube = cube;
        while !cube.is_terminal() && self.level(cube) < level {
            cube = self.node(cube).high;
        }
        cube
    }

    pub(crate) fn exists_rec(&self, f: Ref, cube: Ref) -> Result<Ref> {
        if f.is_terminal() {
            return Ok(f);
        }

        let top = self.level(f);
        let cube = self.skip_vars_above(cube, top);
        if cube == Ref::ONE {
            return Ok(f);
        }

        let key = OpKey::Exists(f, cube);
        let cached = self.cache.borrow_mut().get(&key);
        if let Some(res) = cached {
            return Ok(res);
        }

        let (f0, f1) = self.top_cofactors(f, top);
        let res = if self.level(cube) == top {
            // ∃v. f = f|v=0 ∨ f|v=1
            let rest = self.node(cube).high;
            let r0 = self.exists_rec(f0, rest)?;
            if r0 == Ref::ONE {
                Ref::ONE
            } else {
                let r1 = self.exists_rec(f1, rest)?;
                self.ite_rec(r0, Ref::ONE, r1)?
            }
        } else {
            let r0 = self.exists_rec(f0, cube)?;
            let r1 = self.exists_rec(f1, cube)?;
            self.mk_node(top, r0, r1)?
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    pub(crate) fn and_exists_rec(&self, f: Ref, g: Ref, cube: Ref) -> Result<Ref> {
        if f == Ref::ZERO || g == Ref::ZERO || f == -g {
            return Ok(Ref::ZERO);
        }
        if f == Ref::ONE || f == g {
            return self.exists_rec(g, cube);
        }
        if g == Ref::ONE {
            return self.exists_rec(f, cube);
        }

        let top = self.level(f).min(self.level(g));
        let cube = self.skip_vars_above(cube, top);
        if cube == Ref::ONE {
            return self.ite_rec(f, g, Ref::ZERO);
        }

        // Conjunction is commutative.
        let (f, g) = if f <= g { (f, g) } else { (g, f) };

        let key = OpKey::AndExists(f, g, cube);
        let cached = self.cache.borrow_mut().get(&key);
        if let Some(res) = cached {
            return Ok(res);
        }

        let (f0, f1) = self.top_cofactors(f, top);
        let (g0, g1) = self.top_cofactors(g, top);
        let res = if self.level(cube) == top {
            let rest = self.node(cube).high;
            let r0 = self.and_exists_rec(f0, g0, rest)?;
            if r0 == Ref::ONE {
                Ref::ONE
            } else {
                let r1 = self.and_exists_rec(f1, g1, rest)?;
                self.ite_rec(r0, Ref::ONE, r1)?
            }
        } else {
            let r0 = self.and_exists_rec(f0, g0, cube)?;
            let r1 = self.and_exists_rec(f1, g1, cube)?;
            self.mk_node(top, r0, r1)?
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }
}
