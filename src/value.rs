//! The dynamic property value carried by node and edge property maps.

use indexmap::IndexMap;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A property value. Node and edge property maps are `String -> Value`.
///
/// Comparisons between `Int` and `Real` coerce to `f64`; comparisons across
/// any other pair of differing variants are simply unequal/unordered rather
/// than an error — missing or incompatible properties suppress the
/// comparison, they never raise.
#[derive(Debug, Clone, derive_more::From, derive_more::IsVariant)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Bool(bool),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Ordering for `<`/`<=`/`>`/`>=` comparisons in `WHERE`: `None` when the
    /// two sides aren't meaningfully orderable (incompatible variants, or
    /// either side a list/map), in which case the comparison is simply false
    /// rather than an error.
    pub fn comparable_order(&self, other: &Value) -> Option<Ordering> {
        match (self.as_f64(), other.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => match (self, other) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
                _ => None,
            },
        }
    }

    /// Ordering used by ORDER BY and internal sort-key comparisons.
    ///
    /// `Null` sorts after every non-null value; callers wanting the
    /// DESC-flips-null-to-front rule negate the whole comparison, not just
    /// this ordering.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => match (a, b) {
                    (Value::String(x), Value::String(y)) => x.cmp(y),
                    (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
                    _ => Ordering::Equal,
                },
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Int(i) => {
                1u8.hash(state);
                (*i as f64).to_bits().hash(state);
            }
            Value::Real(r) => {
                1u8.hash(state);
                r.to_bits().hash(state);
            }
            Value::Bool(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            Value::String(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            Value::List(l) => {
                4u8.hash(state);
                l.hash(state);
            }
            Value::Map(m) => {
                5u8.hash(state);
                for (k, v) in m {
                    k.hash(state);
                    v.hash(state);
                }
            }
        }
    }
}

/// Case-insensitive substring test, used for `CONTAINS` and the node-filter
/// `~` operator.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive prefix test, used for `STARTS WITH`.
pub fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().starts_with(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion_compares_int_and_real() {
        assert_eq!(Value::Int(5), Value::Real(5.0));
        assert_eq!(Value::Int(5).sort_cmp(&Value::Real(5.0)), Ordering::Equal);
    }

    #[test]
    fn null_sorts_after_everything_ascending() {
        assert_eq!(Value::Null.sort_cmp(&Value::Int(1)), Ordering::Greater);
        assert_eq!(Value::Int(1).sort_cmp(&Value::Null), Ordering::Less);
    }

    #[test]
    fn incompatible_variants_are_never_equal() {
        assert_ne!(Value::String("5".into()), Value::Int(5));
        assert_ne!(Value::Bool(true), Value::Int(1));
    }

    #[test]
    fn comparable_order_is_none_across_incompatible_variants() {
        assert_eq!(Value::String("a".into()).comparable_order(&Value::Int(1)), None);
        assert_eq!(Value::Null.comparable_order(&Value::Int(1)), None);
        assert_eq!(
            Value::Int(1).comparable_order(&Value::Real(2.0)),
            Some(Ordering::Less)
        );
    }
}
