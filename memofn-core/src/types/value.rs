//! Argument values as a closed set of tagged variants.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A dynamically shaped argument value.
///
/// Variants fall into four families:
///
/// - **Scalars**: `Null`, `Bool`, `Int`, `Float`, `Str`, `Bytes`
/// - **Tuple**: ordered and immutable, keyable when all elements are
/// - **Sequence-like / mapping-like**: `List`, `Set`, `Map`, never keyable
///   as-is and canonicalized by sorting
/// - **Unsupported**: an opaque leaf that cannot take part in a key
///
/// Equality and hashing are structural. Floats compare by bit pattern so the
/// type can be `Eq`; as a consequence `Int(1) != Float(1.0)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Signed integer scalar.
    Int(i64),
    /// Floating point scalar.
    Float(f64),
    /// String scalar.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered immutable composite.
    Tuple(Vec<Value>),
    /// Ordered mutable sequence.
    List(Vec<Value>),
    /// Unordered collection.
    Set(Vec<Value>),
    /// Key/value pairs in insertion order.
    Map(Vec<(Value, Value)>),
    /// A value with no keyable form, described for error messages.
    Unsupported(String),
}

impl Value {
    /// Builds a `Tuple` from anything convertible to values.
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Builds a `List`.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a `Set`. Duplicates are kept; canonicalization does not dedupe.
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a `Map` from key/value pairs, preserving their order.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Builds a `Bytes` value.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    /// Builds an `Unsupported` leaf.
    pub fn unsupported(description: impl Into<String>) -> Self {
        Value::Unsupported(description.into())
    }

    /// Returns true for the scalar variants.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::Str(_)
                | Value::Bytes(_)
        )
    }

    /// Returns true if the value can be used as a key without conversion:
    /// a scalar, or a tuple whose elements are all keyable.
    pub fn is_keyable(&self) -> bool {
        match self {
            Value::Tuple(items) => items.iter().all(Value::is_keyable),
            other => other.is_scalar(),
        }
    }

    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Unsupported(_) => "unsupported",
        }
    }

    /// Returns the string slice of a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer of an `Int` value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Natural ordering between two values, if they are comparable.
    ///
    /// Numbers (`Bool`, `Int`, `Float`) compare by exact value with each other,
    /// strings with strings, bytes with bytes, and tuples lexicographically
    /// element by element. Every other pairing returns `None`, including
    /// `Null` against anything and any comparison involving NaN.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.compare(b),
                _ => None,
            },
        }
    }

    /// Total order used to lay out canonical forms.
    ///
    /// Agrees with [`compare`](Self::compare) wherever that returns `Less`
    /// or `Greater`. Values `compare` cannot order are grouped by kind, and
    /// values it calls equal but `==` does not (`Int(1)` and `Float(1.0)`)
    /// are split by variant, so `Equal` here means `==`.
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        self.coarse_cmp(other).then_with(|| self.variant_cmp(other))
    }

    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    fn family(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => 1,
            Value::Str(_) => 2,
            Value::Bytes(_) => 3,
            Value::Tuple(_) => 4,
            Value::List(_) => 5,
            Value::Set(_) => 6,
            Value::Map(_) => 7,
            Value::Unsupported(_) => 8,
        }
    }

    /// Family first, then natural order; numbers of equal value tie.
    fn coarse_cmp(&self, other: &Value) -> Ordering {
        let by_family = self.family().cmp(&other.family());
        if by_family.is_ne() {
            return by_family;
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b))
            | (Value::List(a), Value::List(b))
            | (Value::Set(a), Value::Set(b)) => lexicographic(a, b, Value::coarse_cmp),
            (Value::Map(a), Value::Map(b)) => lexicographic_pairs(a, b, Value::coarse_cmp),
            (Value::Unsupported(a), Value::Unsupported(b)) => a.cmp(b),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.total_cmp(b),
                _ => Ordering::Equal,
            },
        }
    }

    /// Breaks `coarse_cmp` ties between values that are not `==`.
    fn variant_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Tuple(a), Value::Tuple(b))
            | (Value::List(a), Value::List(b))
            | (Value::Set(a), Value::Set(b)) => lexicographic(a, b, Value::variant_cmp),
            (Value::Map(a), Value::Map(b)) => lexicographic_pairs(a, b, Value::variant_cmp),
            (Value::Float(a), Value::Float(b)) => a.to_bits().cmp(&b.to_bits()),
            _ => self.number_rank().cmp(&other.number_rank()),
        }
    }

    fn number_rank(&self) -> u8 {
        match self {
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            _ => 0,
        }
    }
}

fn lexicographic(a: &[Value], b: &[Value], cmp: fn(&Value, &Value) -> Ordering) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| cmp(x, y))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

fn lexicographic_pairs(
    a: &[(Value, Value)],
    b: &[(Value, Value)],
    cmp: fn(&Value, &Value) -> Ordering,
) -> Ordering {
    a.iter()
        .zip(b)
        .map(|((xk, xv), (yk, yv))| cmp(xk, yk).then_with(|| cmp(xv, yv)))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// 2^63, the first float past `i64::MAX`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (Number::Int(a), Number::Float(b)) => int_float_cmp(a, b),
            (Number::Float(a), Number::Int(b)) => int_float_cmp(b, a).map(Ordering::reverse),
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
        }
    }

    /// Like `compare`, with NaN above every other number.
    fn total_cmp(self, other: Number) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.is_nan().cmp(&other.is_nan()))
    }

    fn is_nan(self) -> bool {
        matches!(self, Number::Float(f) if f.is_nan())
    }
}

/// Exact comparison of an integer with a float, without rounding the
/// integer through `f64`.
fn int_float_cmp(i: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f >= I64_LIMIT {
        return Some(Ordering::Less);
    }
    if f < -I64_LIMIT {
        return Some(Ordering::Greater);
    }
    let whole = f.trunc();
    // In range, so the cast is exact.
    let by_whole = i.cmp(&(whole as i64));
    Some(by_whole.then_with(|| 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal)))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Unsupported(a), Value::Unsupported(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            // Bit pattern, consistent with `PartialEq`.
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => items.hash(state),
            Value::Map(pairs) => pairs.hash(state),
            Value::Unsupported(desc) => desc.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Value::Tuple(items) => write_items(f, "(", ")", items),
            Value::List(items) => write_items(f, "[", "]", items),
            Value::Set(items) => write_items(f, "{", "}", items),
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Unsupported(desc) => write!(f, "<{}>", desc),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, close: &str, items: &[Value]) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(x)) => Value::Float(x),
                (None, None) => Value::Str(n.to_string()),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keyable_variants() {
        assert!(Value::from(1).is_keyable());
        assert!(Value::from("a").is_keyable());
        assert!(Value::Null.is_keyable());
        assert!(Value::tuple([1, 2]).is_keyable());
        assert!(!Value::list([1, 2]).is_keyable());
        assert!(!Value::tuple([Value::list([1])]).is_keyable());
        assert!(!Value::map([("a", 1)]).is_keyable());
        assert!(!Value::unsupported("socket").is_keyable());
    }

    #[test]
    fn test_numeric_comparison_crosses_variants() {
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5)), Some(Ordering::Less));
        assert_eq!(Value::Bool(true).compare(&Value::Int(1)), Some(Ordering::Equal));
        assert_eq!(Value::Float(f64::NAN).compare(&Value::Int(0)), None);
    }

    #[test]
    fn test_int_float_comparison_is_exact() {
        let big = 1_i64 << 53;
        assert_eq!(Value::Int(big + 1).compare(&Value::Float(big as f64)), Some(Ordering::Greater));
        assert_eq!(Value::Int(-2).compare(&Value::Float(-1.5)), Some(Ordering::Less));
        assert_eq!(Value::Int(0).compare(&Value::Float(-0.0)), Some(Ordering::Equal));
        assert_eq!(Value::Int(i64::MAX).compare(&Value::Float(f64::INFINITY)), Some(Ordering::Less));
        assert_eq!(Value::Float(-1e300).compare(&Value::Int(i64::MIN)), Some(Ordering::Less));
    }

    #[test]
    fn test_canonical_cmp_splits_numeric_ties() {
        assert_eq!(Value::Bool(true).canonical_cmp(&Value::Int(1)), Ordering::Less);
        assert_eq!(Value::Int(1).canonical_cmp(&Value::Float(1.0)), Ordering::Less);
        assert!(Value::Float(-0.0).canonical_cmp(&Value::Float(0.0)).is_ne());
        assert_eq!(Value::Int(1).canonical_cmp(&Value::Int(1)), Ordering::Equal);
    }

    #[test]
    fn test_canonical_cmp_agrees_with_compare() {
        let a = Value::tuple([Value::from(1), Value::from(5)]);
        let b = Value::tuple([Value::Float(1.0), Value::from(3)]);
        assert_eq!(a.compare(&b), Some(Ordering::Greater));
        assert_eq!(a.canonical_cmp(&b), Ordering::Greater);

        // Kinds compare cannot order are grouped, NaN after every number.
        assert_eq!(Value::Null.canonical_cmp(&Value::from(0)), Ordering::Less);
        assert_eq!(Value::Float(f64::NAN).canonical_cmp(&Value::Float(f64::INFINITY)), Ordering::Greater);
        assert_eq!(Value::from("a").canonical_cmp(&Value::from(9)), Ordering::Greater);
    }

    #[test]
    fn test_incomparable_kinds() {
        assert_eq!(Value::from("a").compare(&Value::from(1)), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(Value::list([1]).compare(&Value::list([1])), None);
    }

    #[test]
    fn test_tuple_comparison_is_lexicographic() {
        let a = Value::tuple(["a", "b"]);
        let b = Value::tuple(["a", "c"]);
        let prefix = Value::tuple(["a"]);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(prefix.compare(&a), Some(Ordering::Less));

        // Only the first differing position has to be comparable.
        let mixed_a = Value::tuple([Value::from("a"), Value::from(1)]);
        let mixed_b = Value::tuple([Value::from("b"), Value::from("x")]);
        assert_eq!(mixed_a.compare(&mixed_b), Some(Ordering::Less));

        let clash = Value::tuple([Value::from("a"), Value::from("x")]);
        assert_eq!(mixed_a.compare(&clash), None);
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Int(1), Value::Float(1.0));

        let mut set = HashSet::new();
        set.insert(Value::Float(f64::NAN));
        assert!(set.contains(&Value::Float(f64::NAN)));
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"b": [1, 2.5], "a": null, "c": "x"});
        let value = Value::from(json);
        let Value::Map(pairs) = value else {
            panic!("expected a map");
        };
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&(Value::from("b"), Value::List(vec![Value::Int(1), Value::Float(2.5)]))));
        assert!(pairs.contains(&(Value::from("a"), Value::Null)));
    }

    #[test]
    fn test_display() {
        let v = Value::map([("k", Value::tuple([1, 2]))]);
        assert_eq!(v.to_string(), "{\"k\": (1, 2)}");
        assert_eq!(Value::unsupported("socket").to_string(), "<socket>");
        assert_eq!(Value::from(None::<i64>).to_string(), "null");
    }
}
