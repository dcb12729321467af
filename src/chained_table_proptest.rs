#![cfg(test)]

// Property tests for ChainedTable kept inside the crate so they can check
// the structural invariants directly.

use crate::bucketing::{Bucketing, ExactBucket, PrefixBucket};
use crate::chained_table::ChainedTable;
use crate::object::StrBox;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations so shrinking moves towards earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Duplicate(usize, i32),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    // Short keys over a small alphabet share prefixes often.
    proptest::collection::vec("[a-c]{0,4}", 1..=10).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            3 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-d]{0,4}".prop_map(|s| s),
            ]
            .prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Duplicate(i, v)),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap:
// - insert returns the replaced value exactly when the model had the key;
// - remove hands back the stored key and value, or None when absent;
// - get/contains_key parity; iteration visits the model's key set once;
// - a duplicate diverges from the original after mutation of either;
// - after every op: len parity and the chain invariants hold.
fn run<B: Bucketing + Clone>(
    bucketing: B,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut sut: ChainedTable<i32, B> = ChainedTable::with_bucketing(bucketing);
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = &pool[i];
                let prev = sut.insert(StrBox::new(k), v);
                prop_assert_eq!(prev, model.insert(k.clone(), v));
            }
            Op::Remove(i) => {
                let k = &pool[i];
                let got = sut.remove(k);
                match model.remove(k) {
                    Some(mv) => {
                        let (kk, vv) = got.expect("present in table");
                        prop_assert_eq!(kk.as_str(), k.as_str());
                        prop_assert_eq!(vv, mv);
                    }
                    None => prop_assert!(got.is_none()),
                }
            }
            Op::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
            }
            Op::Mutate(i, d) => {
                let k = &pool[i];
                if let Some(v) = sut.get_mut(k) {
                    *v = v.saturating_add(d);
                    let mv = model.get_mut(k).expect("model has key");
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(!model.contains_key(k));
                }
            }
            Op::Iterate => {
                let keys: Vec<String> = sut.iter().map(|(k, _)| k.to_string()).collect();
                let unique: BTreeSet<String> = keys.iter().cloned().collect();
                prop_assert_eq!(keys.len(), unique.len());
                let m_keys: BTreeSet<String> = model.keys().cloned().collect();
                prop_assert_eq!(unique, m_keys);
            }
            Op::Duplicate(i, v) => {
                let mut dup = sut.duplicate();
                dup.assert_invariants();
                prop_assert_eq!(dup.len(), sut.len());
                let k = &pool[i];
                dup.insert(StrBox::new(k), v);
                dup.remove(&pool[0]);
                prop_assert_eq!(sut.get(k), model.get(k));
                prop_assert_eq!(sut.get(&pool[0]), model.get(&pool[0]));
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.entries().len(), model.len());
        sut.assert_invariants();
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(ExactBucket, &pool, ops)?;
    }

    // Keys sharing a first letter share a chain.
    #[test]
    fn prop_state_machine_prefix_chains((pool, ops) in arb_scenario()) {
        run(PrefixBucket::new(1), &pool, ops)?;
    }

    // Worst case: every key lands in one chain.
    #[test]
    fn prop_state_machine_single_chain((pool, ops) in arb_scenario()) {
        run(PrefixBucket::new(0), &pool, ops)?;
    }
}
