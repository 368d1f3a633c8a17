//! Canonicalization of argument values into cache keys.
//!
//! The algorithm is recursive:
//!
//! 1. A value that is already keyable (scalar, or tuple of keyable values)
//!    is returned unchanged.
//! 2. A map becomes a tuple of `(key, canonical value)` pairs.
//! 3. Lists, sets and non-keyable tuples become a tuple of their canonical
//!    elements.
//! 4. Anything else is [`MemoError::Unhashable`].
//!
//! In cases 2 and 3 the elements are sorted when every pair of them is
//! comparable by [`Value::compare`]; otherwise insertion order is kept. Ties
//! between different values (`1` and `1.0`) are broken by variant. Sorting
//! makes unordered inputs order independent, and the fallback keeps mixed
//! inputs deterministic instead of failing.
//!
//! Keys are structural, not digests: two inputs that canonicalize to equal
//! values share a cache entry.

use crate::error::{MemoError, Result};
use crate::types::Value;

/// Converts `item` into a keyable value.
pub fn make_hashable(item: &Value) -> Result<Value> {
    if item.is_keyable() {
        return Ok(item.clone());
    }

    match item {
        Value::Map(pairs) => {
            let canonical = pairs
                .iter()
                .map(|(k, v)| Ok(Value::Tuple(vec![make_hashable(k)?, make_hashable(v)?])))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Tuple(sort_if_orderable(canonical)))
        }
        Value::Tuple(items) | Value::List(items) | Value::Set(items) => {
            let canonical = items.iter().map(make_hashable).collect::<Result<Vec<_>>>()?;
            Ok(Value::Tuple(sort_if_orderable(canonical)))
        }
        other => Err(MemoError::Unhashable(other.to_string())),
    }
}

/// Sorts `items` by their natural order if all of them are mutually
/// comparable, otherwise returns them untouched.
///
/// Items are sorted by [`Value::canonical_cmp`], which never fails, so
/// mixed input is never partially sorted. Comparability is then checked
/// between neighbours only: incomparable values never end up separated by
/// values comparable with both.
pub fn sort_if_orderable(items: Vec<Value>) -> Vec<Value> {
    let mut sorted = items.clone();
    sorted.sort_by(Value::canonical_cmp);
    if sorted.windows(2).all(|pair| pair[0].compare(&pair[1]).is_some()) {
        sorted
    } else {
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn canon(item: Value) -> Value {
        make_hashable(&item).unwrap()
    }

    #[test_case(Value::from(3) ; "int")]
    #[test_case(Value::from("abc") ; "string")]
    #[test_case(Value::Null ; "null")]
    #[test_case(Value::bytes(b"raw".to_vec()) ; "bytes")]
    #[test_case(Value::tuple(["b", "a"]) ; "keyable tuple keeps order")]
    fn test_keyable_values_unchanged(item: Value) {
        assert_eq!(canon(item.clone()), item);
    }

    #[test_case(Value::list([3, 1, 2]), Value::tuple([1, 2, 3]) ; "list sorted")]
    #[test_case(Value::set(["b", "a"]), Value::tuple(["a", "b"]) ; "set sorted")]
    #[test_case(Value::list(Vec::<Value>::new()), Value::Tuple(vec![]) ; "empty list")]
    #[test_case(Value::Map(vec![]), Value::Tuple(vec![]) ; "empty map")]
    #[test_case(
        Value::list([Value::from("a"), Value::from(1)]),
        Value::tuple([Value::from("a"), Value::from(1)]) ;
        "mixed kinds keep insertion order"
    )]
    #[test_case(
        Value::list([Value::from(2), Value::Float(1.5), Value::Bool(false)]),
        Value::tuple([Value::Bool(false), Value::Float(1.5), Value::from(2)]) ;
        "numbers sort across variants"
    )]
    fn test_iterables(item: Value, expected: Value) {
        assert_eq!(canon(item), expected);
    }

    #[test]
    fn test_map_becomes_sorted_pairs() {
        let m = Value::map([("b", 2), ("a", 1)]);
        assert_eq!(
            canon(m),
            Value::tuple([Value::tuple([Value::from("a"), Value::from(1)]), Value::tuple([Value::from("b"), Value::from(2)])])
        );
    }

    #[test]
    fn test_nested_structures_recurse() {
        let m = Value::map([("k", Value::list([Value::set([2, 1]), Value::set([0])]))]);
        let expected = Value::tuple([Value::tuple([
            Value::from("k"),
            Value::tuple([Value::tuple([0]), Value::tuple([1, 2])]),
        ])]);
        assert_eq!(canon(m), expected);
    }

    #[test]
    fn test_non_keyable_tuple_is_sorted() {
        let t = Value::tuple([Value::list([2]), Value::list([1])]);
        assert_eq!(canon(t), Value::tuple([Value::tuple([1]), Value::tuple([2])]));
    }

    #[test]
    fn test_unsupported_leaf_fails() {
        let err = make_hashable(&Value::list([Value::from(1), Value::unsupported("file handle")])).unwrap_err();
        match err {
            MemoError::Unhashable(desc) => assert!(desc.contains("file handle")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_numeric_ties_do_not_depend_on_order() {
        let a = canon(Value::set([Value::Int(1), Value::Bool(true)]));
        let b = canon(Value::set([Value::Bool(true), Value::Int(1)]));
        assert_eq!(a, b);
        assert_eq!(a, Value::tuple([Value::Bool(true), Value::Int(1)]));

        assert_eq!(
            canon(Value::set([Value::Int(1), Value::Float(1.0)])),
            canon(Value::set([Value::Float(1.0), Value::Int(1)]))
        );
    }

    #[test]
    fn test_large_list_is_sorted() {
        let items: Vec<i64> = (0..50_000).rev().collect();
        let Value::Tuple(sorted) = canon(Value::list(items)) else {
            panic!("expected a tuple");
        };
        assert_eq!(sorted.len(), 50_000);
        assert_eq!(sorted.first(), Some(&Value::Int(0)));
        assert!(sorted
            .windows(2)
            .all(|pair| pair[0].compare(&pair[1]) == Some(std::cmp::Ordering::Less)));
    }

    #[test]
    fn test_trailing_incomparable_keeps_insertion_order() {
        let items = vec![Value::from(3), Value::from(1), Value::from(2), Value::from("a")];
        assert_eq!(sort_if_orderable(items.clone()), items);
    }

    #[test]
    fn test_null_elements_are_not_sorted() {
        let items = vec![Value::from(2), Value::Null, Value::from(1)];
        assert_eq!(sort_if_orderable(items.clone()), items);
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Int),
            "[a-z]{0,6}".prop_map(Value::Str),
            any::<bool>().prop_map(Value::Bool),
        ]
    }

    /// Small numbers of every numeric variant, with plenty of equal values.
    fn number() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-3i64..3).prop_map(Value::Int),
            any::<bool>().prop_map(Value::Bool),
            (-3i64..3).prop_map(|i| Value::Float(i as f64)),
            (-3i64..3).prop_map(|i| Value::Float(i as f64 + 0.5)),
        ]
    }

    proptest! {
        #[test]
        fn prop_map_order_invariant(
            pairs in proptest::collection::btree_map("[a-z]{1,4}", scalar(), 0..8),
            seed in any::<u64>(),
        ) {
            let forward: Vec<(Value, Value)> =
                pairs.iter().map(|(k, v)| (Value::from(k.as_str()), v.clone())).collect();
            let mut shuffled = forward.clone();
            let len = shuffled.len();
            if len > 1 {
                shuffled.rotate_left((seed as usize) % len);
                shuffled.reverse();
            }
            prop_assert_eq!(
                make_hashable(&Value::Map(forward)).unwrap(),
                make_hashable(&Value::Map(shuffled)).unwrap()
            );
        }

        #[test]
        fn prop_mixed_number_set_order_invariant(
            (items, shuffled) in proptest::collection::vec(number(), 0..10)
                .prop_flat_map(|items| (Just(items.clone()), Just(items).prop_shuffle())),
        ) {
            prop_assert_eq!(
                make_hashable(&Value::Set(items)).unwrap(),
                make_hashable(&Value::Set(shuffled)).unwrap()
            );
        }

        #[test]
        fn prop_canonical_form_is_keyable_and_idempotent(
            items in proptest::collection::vec(scalar(), 0..8),
        ) {
            let once = make_hashable(&Value::List(items)).unwrap();
            prop_assert!(once.is_keyable());
            prop_assert_eq!(make_hashable(&once).unwrap(), once.clone());
        }
    }
}
