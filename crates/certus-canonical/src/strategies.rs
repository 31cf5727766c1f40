//! Value generators shared by the property tests.

use proptest::prelude::*;
use serde_json::{Map, Value};

/// Finite JSON leaves: null, bools, signed and unsigned integers, floats and
/// printable strings.
fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12).prop_map(Value::from),
        "\\PC{0,8}".prop_map(Value::from),
    ]
}

/// Map keys, including uppercase and a multibyte character.
pub(crate) fn arb_key() -> impl Strategy<Value = String> {
    "[a-zA-Zé_]{1,6}"
}

/// Arbitrary JSON values nested a few levels deep.
pub(crate) fn arb_json() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(arb_key(), inner, 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}
