//! Sign-lattice arithmetic and boolean evaluation shared by Detection
//! of Signs. Encoded as small lookup tables indexed by enum rather
//! than cascades of `if`s, per the design notes: the nine-case
//! sign×sign matrix for each arithmetic operator is a single constant
//! table.

use std::cmp::Ordering;

use itertools::Itertools;
use mc_str::StrId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sign {
    Neg,
    Zero,
    Pos,
}

pub const ALL_SIGNS: [Sign; 3] = [Sign::Neg, Sign::Zero, Sign::Pos];

/// `𝒫({−, 0, +})`, ordered by subset; `∅` is `⊥`.
pub type SignSet = Vec<Sign>;

pub fn empty() -> SignSet {
    Vec::new()
}

pub fn singleton(s: Sign) -> SignSet {
    vec![s]
}

pub fn full() -> SignSet {
    ALL_SIGNS.to_vec()
}

pub fn sign_of(n: i64) -> SignSet {
    match n.cmp(&0) {
        Ordering::Less => singleton(Sign::Neg),
        Ordering::Equal => singleton(Sign::Zero),
        Ordering::Greater => singleton(Sign::Pos),
    }
}

fn normalize(mut set: SignSet) -> SignSet {
    set.sort();
    set.dedup();
    set
}

pub fn union(a: &SignSet, b: &SignSet) -> SignSet {
    let mut out = a.clone();
    out.extend(b.iter().copied());
    normalize(out)
}

pub fn intersection(a: &SignSet, b: &SignSet) -> SignSet {
    normalize(a.iter().copied().filter(|s| b.contains(s)).collect())
}

pub fn issubset(a: &SignSet, b: &SignSet) -> bool {
    a.iter().all(|s| b.contains(s))
}

pub fn complement(a: &SignSet) -> SignSet {
    normalize(ALL_SIGNS.iter().copied().filter(|s| !a.contains(s)).collect())
}

/// Abstract memory: every declared variable maps to a `SignSet`. `⊥`
/// is the memory where every variable maps to `∅`.
pub type Memory = FxHashMap<StrId, SignSet>;

pub fn bottom(vars: impl Iterator<Item = StrId>) -> Memory {
    vars.map(|x| (x, empty())).collect()
}

pub fn is_bottom(m: &Memory) -> bool {
    m.values().all(|s| s.is_empty())
}

pub fn memory_union(a: &Memory, b: &Memory) -> Memory {
    let mut out = a.clone();
    for (k, v) in b {
        let entry = out.entry(*k).or_insert_with(empty);
        *entry = union(entry, v);
    }
    out
}

/// Split an abstract memory into basic memories: take the Cartesian
/// product of every non-aggregate variable's sign set, producing one
/// memory per product element with each scalar pinned to a singleton.
/// Aggregate variables (arrays, records) are not part of the product —
/// they keep their set form and are copied into every produced memory
/// unchanged, since DS tracks them only coarsely (§4.7: RecordDeref
/// reads the whole-record sign set, ArrayDeref doesn't distinguish
/// slots).
pub fn split_into_basic_memories(m: &Memory, aggregates: &[StrId]) -> Vec<Memory> {
    if is_bottom(m) {
        return vec![];
    }
    let scalars: Vec<StrId> = m.keys().copied().filter(|x| !aggregates.contains(x)).collect();
    let mut sorted_scalars = scalars.clone();
    sorted_scalars.sort();

    if sorted_scalars.is_empty() {
        return vec![m.clone()];
    }

    let per_var_options: Vec<Vec<(StrId, Sign)>> = sorted_scalars
        .iter()
        .map(|&x| m[&x].iter().map(|&s| (x, s)).collect())
        .collect();

    per_var_options
        .into_iter()
        .multi_cartesian_product()
        .map(|combo| {
            let mut mem: Memory = aggregates
                .iter()
                .filter_map(|a| m.get(a).map(|s| (*a, s.clone())))
                .collect();
            for (x, s) in combo {
                mem.insert(x, singleton(s));
            }
            mem
        })
        .collect()
}

fn table3(rows: [[SignSet; 3]; 3], a: Sign, b: Sign) -> SignSet {
    rows[a as usize][b as usize].clone()
}

/// `sign(M, a) + sign(M, b)` per operand combination.
pub fn add(a: Sign, b: Sign) -> SignSet {
    use Sign::*;
    let s = |x: Sign| singleton(x);
    let f = full;
    table3(
        [
            [s(Neg), s(Neg), f()],
            [s(Neg), s(Zero), s(Pos)],
            [f(), s(Pos), s(Pos)],
        ],
        a,
        b,
    )
}

pub fn sub(a: Sign, b: Sign) -> SignSet {
    use Sign::*;
    let s = |x: Sign| singleton(x);
    let f = full;
    table3(
        [
            [f(), s(Neg), s(Neg)],
            [s(Pos), s(Zero), s(Neg)],
            [s(Pos), s(Pos), f()],
        ],
        a,
        b,
    )
}

pub fn mul(a: Sign, b: Sign) -> SignSet {
    use Sign::*;
    let s = |x: Sign| singleton(x);
    table3(
        [
            [s(Pos), s(Zero), s(Neg)],
            [s(Zero), s(Zero), s(Zero)],
            [s(Neg), s(Zero), s(Pos)],
        ],
        a,
        b,
    )
}

/// Division by a sign set that contains `0` is `⊥` — handled by the
/// caller inspecting the divisor set before calling this per-pair
/// table, since `0` can never appear as a divisor's `Sign`.
pub fn div(a: Sign, b: Sign) -> SignSet {
    use Sign::*;
    let s = |x: Sign| singleton(x);
    match b {
        Zero => empty(),
        Pos => match a {
            Neg => s(Neg),
            Zero => s(Zero),
            Pos => s(Pos),
        },
        Neg => match a {
            Neg => s(Pos),
            Zero => s(Zero),
            Pos => s(Neg),
        },
    }
}

/// Mod's result sign equals the divisor's sign (per spec §4.7), the
/// dividend's sign plays no part.
pub fn modulo(a: Sign, b: Sign) -> SignSet {
    let _ = a;
    match b {
        Sign::Zero => empty(),
        other => singleton(other),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bool {
    Tt,
    Ff,
}

pub type BoolSet = Vec<Bool>;

pub fn bool_singleton(b: Bool) -> BoolSet {
    vec![b]
}

pub fn bool_both() -> BoolSet {
    vec![Bool::Tt, Bool::Ff]
}

pub fn eq(a: Sign, b: Sign) -> BoolSet {
    use Sign::*;
    match (a, b) {
        (Zero, Zero) => bool_singleton(Bool::Tt),
        (Neg, Neg) | (Pos, Pos) => bool_both(),
        _ => bool_singleton(Bool::Ff),
    }
}

pub fn neq(a: Sign, b: Sign) -> BoolSet {
    let e = eq(a, b);
    if e == bool_singleton(Bool::Tt) {
        bool_singleton(Bool::Ff)
    } else if e == bool_singleton(Bool::Ff) {
        bool_singleton(Bool::Tt)
    } else {
        bool_both()
    }
}

pub fn lt(a: Sign, b: Sign) -> BoolSet {
    use Sign::*;
    match (a, b) {
        (Neg, Zero) | (Neg, Pos) | (Zero, Pos) => bool_singleton(Bool::Tt),
        (Zero, Zero) | (Pos, Zero) | (Pos, Neg) | (Zero, Neg) => bool_singleton(Bool::Ff),
        (Neg, Neg) | (Pos, Pos) => bool_both(),
    }
}

pub fn gt(a: Sign, b: Sign) -> BoolSet {
    lt(b, a)
}

fn bool_table3(rows: [[BoolSet; 3]; 3], a: Sign, b: Sign) -> BoolSet {
    rows[a as usize][b as usize].clone()
}

pub fn lte(a: Sign, b: Sign) -> BoolSet {
    let tt = || bool_singleton(Bool::Tt);
    let ff = || bool_singleton(Bool::Ff);
    bool_table3(
        [
            [bool_both(), tt(), tt()],
            [ff(), tt(), tt()],
            [ff(), ff(), bool_both()],
        ],
        a,
        b,
    )
}

pub fn gte(a: Sign, b: Sign) -> BoolSet {
    lte(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_negative_and_positive_is_unconstrained() {
        assert_eq!(add(Sign::Neg, Sign::Pos), full());
    }

    #[test]
    fn add_zero_is_identity() {
        assert_eq!(add(Sign::Zero, Sign::Pos), singleton(Sign::Pos));
        assert_eq!(add(Sign::Neg, Sign::Zero), singleton(Sign::Neg));
    }

    #[test]
    fn div_by_zero_is_bottom() {
        assert_eq!(div(Sign::Pos, Sign::Zero), empty());
    }

    #[test]
    fn mod_result_takes_divisor_sign() {
        assert_eq!(modulo(Sign::Pos, Sign::Neg), singleton(Sign::Neg));
        assert_eq!(modulo(Sign::Zero, Sign::Pos), singleton(Sign::Pos));
    }

    #[test]
    fn lt_strict_signs_are_decided() {
        assert_eq!(lt(Sign::Neg, Sign::Pos), bool_singleton(Bool::Tt));
        assert_eq!(lt(Sign::Pos, Sign::Neg), bool_singleton(Bool::Ff));
        assert_eq!(lt(Sign::Zero, Sign::Zero), bool_singleton(Bool::Ff));
    }

    #[test]
    fn eq_same_nonzero_sign_is_undecided() {
        assert_eq!(eq(Sign::Pos, Sign::Pos), bool_both());
    }

    #[test]
    fn lte_is_decided_where_union_of_lt_and_eq_would_not_be() {
        // lt(Zero, Zero) = {Ff}, eq(Zero, Zero) = {Tt}; the union would
        // give {Tt, Ff}, but 0 <= 0 is decided: {Tt}.
        assert_eq!(lte(Sign::Zero, Sign::Zero), bool_singleton(Bool::Tt));
        assert_eq!(lte(Sign::Neg, Sign::Zero), bool_singleton(Bool::Tt));
        assert_eq!(lte(Sign::Zero, Sign::Neg), bool_singleton(Bool::Ff));
    }

    #[test]
    fn gte_mirrors_lte_with_operands_swapped() {
        assert_eq!(gte(Sign::Zero, Sign::Zero), bool_singleton(Bool::Tt));
        assert_eq!(gte(Sign::Zero, Sign::Neg), bool_singleton(Bool::Tt));
        assert_eq!(gte(Sign::Neg, Sign::Zero), bool_singleton(Bool::Ff));
    }

    #[test]
    fn split_into_basic_memories_is_cartesian_product() {
        let mut m: Memory = Memory::default();
        let x = StrId(0);
        let y = StrId(1);
        m.insert(x, vec![Sign::Neg, Sign::Pos]);
        m.insert(y, vec![Sign::Zero]);
        let basics = split_into_basic_memories(&m, &[]);
        assert_eq!(basics.len(), 2);
        for basic in &basics {
            assert_eq!(basic[&x].len(), 1);
            assert_eq!(basic[&y], vec![Sign::Zero]);
        }
    }

    #[test]
    fn split_is_empty_for_bottom_memory() {
        let mut m: Memory = Memory::default();
        m.insert(StrId(0), empty());
        assert!(split_into_basic_memories(&m, &[]).is_empty());
    }
}
