//! Randomized checks of the diagram manager against truth tables.

use num_bigint::BigUint;
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use bdd_reach::bdd::Bdd;
use bdd_reach::reference::Ref;
use bdd_reach::types::Var;

const NUM_VARS: usize = 4;

#[derive(Debug, Clone)]
enum Expr {
    Var(usize),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Ite(Box<Expr>, Box<Expr>, Box<Expr>),
}

fn gen_var(g: &mut Gen) -> Expr {
    Expr::Var(usize::arbitrary(g) % NUM_VARS)
}

fn gen_sub(g: &mut Gen, depth: usize) -> Box<Expr> {
    Box::new(gen_expr(g, depth - 1))
}

fn gen_expr(g: &mut Gen, depth: usize) -> Expr {
    if depth == 0 {
        return gen_var(g);
    }
    match u8::arbitrary(g) % 6 {
        0 => gen_var(g),
        1 => Expr::Not(gen_sub(g, depth)),
        2 => Expr::And(gen_sub(g, depth), gen_sub(g, depth)),
        3 => Expr::Or(gen_sub(g, depth), gen_sub(g, depth)),
        4 => Expr::Xor(gen_sub(g, depth), gen_sub(g, depth)),
        _ => Expr::Ite(gen_sub(g, depth), gen_sub(g, depth), gen_sub(g, depth)),
    }
}

impl Arbitrary for Expr {
    fn arbitrary(g: &mut Gen) -> Self {
        gen_expr(g, 4)
    }
}

impl Expr {
    fn eval(&self, a: &[bool]) -> bool {
        match self {
            Expr::Var(i) => a[*i],
            Expr::Not(e) => !e.eval(a),
            Expr::And(l, r) => l.eval(a) && r.eval(a),
            Expr::Or(l, r) => l.eval(a) || r.eval(a),
            Expr::Xor(l, r) => l.eval(a) ^ r.eval(a),
            Expr::Ite(c, t, e) => {
                if c.eval(a) {
                    t.eval(a)
                } else {
                    e.eval(a)
                }
            }
        }
    }

    fn build(&self, bdd: &Bdd) -> Ref {
        match self {
            Expr::Var(i) => bdd.mk_var(Var::new(*i as u32 + 1)).unwrap(),
            Expr::Not(e) => bdd.apply_not(e.build(bdd)),
            Expr::And(l, r) => bdd.apply_and(l.build(bdd), r.build(bdd)).unwrap(),
            Expr::Or(l, r) => bdd.apply_or(l.build(bdd), r.build(bdd)).unwrap(),
            Expr::Xor(l, r) => bdd.apply_xor(l.build(bdd), r.build(bdd)).unwrap(),
            Expr::Ite(c, t, e) => bdd.apply_ite(c.build(bdd), t.build(bdd), e.build(bdd)).unwrap(),
        }
    }

    /// The same function built differently: only NOT and OR, via De Morgan.
    fn build_nor(&self, bdd: &Bdd) -> Ref {
        let or = |f: Ref, g: Ref| bdd.apply_or(f, g).unwrap();
        let and = |f: Ref, g: Ref| -or(-f, -g);
        match self {
            Expr::Var(i) => bdd.mk_var(Var::new(*i as u32 + 1)).unwrap(),
            Expr::Not(e) => -e.build_nor(bdd),
            Expr::And(l, r) => and(l.build_nor(bdd), r.build_nor(bdd)),
            Expr::Or(l, r) => or(l.build_nor(bdd), r.build_nor(bdd)),
            Expr::Xor(l, r) => {
                let (f, g) = (l.build_nor(bdd), r.build_nor(bdd));
                or(and(f, -g), and(-f, g))
            }
            Expr::Ite(c, t, e) => {
                let c = c.build_nor(bdd);
                or(and(c, t.build_nor(bdd)), and(-c, e.build_nor(bdd)))
            }
        }
    }
}

fn setup() -> (Bdd, Vec<Var>) {
    let bdd = Bdd::default();
    let vars = (0..NUM_VARS).map(|_| bdd.allocate_variable()).collect();
    (bdd, vars)
}

fn assignments() -> impl Iterator<Item = Vec<bool>> {
    (0..1u32 << NUM_VARS).map(|bits| (0..NUM_VARS).map(|i| bits & (1 << i) != 0).collect())
}

#[quickcheck]
fn prop_matches_truth_table(e: Expr) -> bool {
    let (bdd, vars) = setup();
    let f = e.build(&bdd);

    let models = assignments().filter(|a| e.eval(a)).count();
    assignments().all(|a| bdd.evaluate(f, &a).unwrap() == e.eval(&a))
        && bdd.sat_count(f, &vars).unwrap() == BigUint::from(models)
}

#[quickcheck]
fn prop_canonical(e: Expr) -> bool {
    let (bdd, _) = setup();
    e.build(&bdd) == e.build_nor(&bdd)
}

#[quickcheck]
fn prop_equal_iff_equivalent(e1: Expr, e2: Expr) -> bool {
    let (bdd, _) = setup();
    let same_table = assignments().all(|a| e1.eval(&a) == e2.eval(&a));
    (e1.build(&bdd) == e2.build(&bdd)) == same_table
}

#[quickcheck]
fn prop_exists(e: Expr, v: usize) -> bool {
    let (bdd, vars) = setup();
    let v = v % NUM_VARS;
    let f = e.build(&bdd);
    let g = bdd.exists(f, &[vars[v]]).unwrap();

    assignments().all(|mut a| {
        a[v] = false;
        let low = e.eval(&a);
        a[v] = true;
        let high = e.eval(&a);
        bdd.evaluate(g, &a).unwrap() == (low || high)
    })
}

#[quickcheck]
fn prop_and_exists(e1: Expr, e2: Expr, v: usize, w: usize) -> bool {
    let (bdd, vars) = setup();
    let quantified = [vars[v % NUM_VARS], vars[w % NUM_VARS]];
    let (f, g) = (e1.build(&bdd), e2.build(&bdd));

    let fused = bdd.and_exists(f, g, &quantified).unwrap();
    let conj = bdd.apply_and(f, g).unwrap();
    fused == bdd.exists(conj, &quantified).unwrap()
}

#[quickcheck]
fn prop_rename_permutation(e: Expr, shift: usize) -> bool {
    let (bdd, vars) = setup();
    let shift = shift % NUM_VARS;
    // x_i := x_{(i + shift) mod n}
    let target = |i: usize| (i + shift) % NUM_VARS;
    let mapping: Vec<(Var, Var)> = (0..NUM_VARS).map(|i| (vars[i], vars[target(i)])).collect();

    let f = e.build(&bdd);
    let g = bdd.rename(f, &mapping).unwrap();

    assignments().all(|a| {
        let original: Vec<bool> = (0..NUM_VARS).map(|i| a[target(i)]).collect();
        bdd.evaluate(g, &a).unwrap() == e.eval(&original)
    })
}
