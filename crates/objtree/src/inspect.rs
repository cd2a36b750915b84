//! The reflection capability the tree uses to look inside values
//!
//! A type becomes browsable by implementing [`Inspect`]. The tree never owns
//! or mutates what it inspects; it only calls the probes below, one level at
//! a time, when the user expands a node or asks for a refresh.

use std::cmp::Ordering;

use derive_more::Display;

use crate::error::InspectError;

/// A value that can be browsed in an object tree.
///
/// The structural probes are checked in a fixed priority order by
/// [`Shape::of`]: sequence, then set, then mapping. Attributes are exposed
/// independently of the shape.
///
/// Implementations are expected to be cheap to clone: a clone is a handle
/// to the same underlying data, not a deep copy.
pub trait Inspect: Clone {
    /// Short name of the value's type, e.g. `list` or `Point`
    fn type_name(&self) -> String;

    /// True if the value supports ordered integer indexing.
    ///
    /// Text and byte strings must return false.
    fn is_sequence(&self) -> bool {
        false
    }

    /// The elements of a sequence, in index order
    fn sequence_items(&self) -> Result<Vec<Self>, InspectError> {
        Err(self.unsupported("sequence iteration"))
    }

    /// True if the value is an unordered, deduplicated collection
    fn is_set(&self) -> bool {
        false
    }

    /// The elements of a set, in iteration order
    fn set_items(&self) -> Result<Vec<Self>, InspectError> {
        Err(self.unsupported("set iteration"))
    }

    /// True if the value maps keys to values
    fn is_mapping(&self) -> bool {
        false
    }

    /// True if the mapping's iteration order is meaningful (insertion order).
    ///
    /// Entries of mappings that return false are sorted by key.
    fn preserves_insertion_order(&self) -> bool {
        false
    }

    /// The `(key, value)` entries of a mapping, in iteration order
    fn mapping_entries(&self) -> Result<Vec<(Self, Self)>, InspectError> {
        Err(self.unsupported("mapping iteration"))
    }

    /// Names of all attributes reachable by reflection, in any order
    fn attribute_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Read one attribute. May fail without affecting the other attributes.
    fn attribute(&self, name: &str) -> Result<Self, InspectError> {
        Err(InspectError::NoSuchAttribute(name.to_string()))
    }

    /// The user-facing string form (`str()`)
    fn to_text(&self) -> Result<String, InspectError>;

    /// The unambiguous string form (`repr()`), also used for mapping keys in paths
    fn repr(&self) -> Result<String, InspectError>;

    /// A multi-line pretty printed form
    fn pretty(&self) -> Result<String, InspectError> {
        self.repr()
    }

    /// Documentation attached to the value or its type
    fn doc(&self) -> Option<String> {
        None
    }

    /// Source text that defines the value, if known
    fn source(&self) -> Option<String> {
        None
    }

    /// Number of items for containers and strings
    fn length(&self) -> Option<usize> {
        None
    }

    /// A stable identity for shared values, e.g. an address
    fn identity(&self) -> Option<usize> {
        None
    }

    /// True if the value can be called
    fn is_callable(&self) -> bool {
        false
    }

    /// True if the value is a function or method
    fn is_routine(&self) -> bool {
        false
    }

    /// The key used to put values in their natural order
    fn sort_key(&self) -> Option<SortKey> {
        None
    }

    /// Cheap hint that the value will certainly enumerate no children
    fn is_leaf_hint(&self) -> bool {
        false
    }

    #[doc(hidden)]
    fn unsupported(&self, operation: &'static str) -> InspectError {
        InspectError::Unsupported {
            operation,
            type_name: self.type_name(),
        }
    }
}

/// The structural protocol a value is enumerated with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Shape {
    #[display(fmt = "sequence")]
    Sequence,
    #[display(fmt = "set")]
    Set,
    #[display(fmt = "mapping")]
    Mapping,
    #[display(fmt = "plain")]
    Plain,
}

impl Shape {
    /// Classify a value by probing sequence, set and mapping support, in that order
    pub fn of<V: Inspect>(value: &V) -> Shape {
        if value.is_sequence() {
            Shape::Sequence
        } else if value.is_set() {
            Shape::Set
        } else if value.is_mapping() {
            Shape::Mapping
        } else {
            Shape::Plain
        }
    }

    /// Returns true if values of this shape have structural children
    pub const fn is_container(self) -> bool {
        !matches!(self, Shape::Plain)
    }
}

/// A value's position in its natural ordering.
///
/// Numbers compare numerically with each other regardless of representation,
/// text with text, bytes with bytes and tuples element-wise. Keys of
/// different families are incomparable.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Tuple(Vec<SortKey>),
}

/// The comparability class of a [`SortKey`].
///
/// Keys with equal families always compare, and compare as a total order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Family {
    Number,
    Text,
    Bytes,
    Tuple(Vec<Family>),
}

impl SortKey {
    /// Compare two keys, or `None` if they cannot be ordered against each other
    pub fn try_cmp(&self, other: &SortKey) -> Option<Ordering> {
        use SortKey::*;
        match (self, other) {
            (Text(a), Text(b)) => Some(a.cmp(b)),
            (Bytes(a), Bytes(b)) => Some(a.cmp(b)),
            (Tuple(a), Tuple(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.try_cmp(y)? {
                        Ordering::Equal => continue,
                        unequal => return Some(unequal),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (a, b) => cmp_numbers(a.as_number()?, b.as_number()?),
        }
    }

    fn as_number(&self) -> Option<Number> {
        match *self {
            SortKey::Bool(b) => Some(Number::Int(i64::from(b))),
            SortKey::Int(i) => Some(Number::Int(i)),
            SortKey::Float(f) => Some(Number::Float(f)),
            _ => None,
        }
    }

    /// `None` for keys that are not even comparable with themselves (NaN)
    fn family(&self) -> Option<Family> {
        match self {
            SortKey::Float(f) if f.is_nan() => None,
            SortKey::Bool(_) | SortKey::Int(_) | SortKey::Float(_) => Some(Family::Number),
            SortKey::Text(_) => Some(Family::Text),
            SortKey::Bytes(_) => Some(Family::Bytes),
            SortKey::Tuple(items) => items
                .iter()
                .map(SortKey::family)
                .collect::<Option<Vec<_>>>()
                .map(Family::Tuple),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

/// Exact comparison; ints are never rounded through `f64`
fn cmp_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
        (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
        (Number::Int(i), Number::Float(f)) => cmp_int_float(i, f),
        (Number::Float(f), Number::Int(i)) => cmp_int_float(i, f).map(Ordering::reverse),
    }
}

fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    // 2^63, exactly representable
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return None;
    }
    if f >= LIMIT {
        return Some(Ordering::Less);
    }
    if f < -LIMIT {
        return Some(Ordering::Greater);
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)),
        unequal => Some(unequal),
    }
}

/// Sort `items` by their natural ordering.
///
/// Returns false and leaves `items` untouched if any key is missing or the
/// keys do not all belong to one family. The sort is stable.
pub fn sort_naturally<T>(items: &mut Vec<T>, key: impl Fn(&T) -> Option<SortKey>) -> bool {
    let Some(keys) = items.iter().map(key).collect::<Option<Vec<SortKey>>>() else {
        return false;
    };
    let Some(families) = keys.iter().map(SortKey::family).collect::<Option<Vec<_>>>() else {
        return false;
    };
    if families.windows(2).any(|pair| pair[0] != pair[1]) {
        return false;
    }

    // Keys of one family always compare, so the fallback is never taken.
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| keys[a].try_cmp(&keys[b]).unwrap_or(Ordering::Equal));

    let mut slots: Vec<Option<T>> = items.drain(..).map(Some).collect();
    items.extend(order.into_iter().filter_map(|i| slots[i].take()));
    true
}

/// Returns true for names that begin and end with a double underscore
pub fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_keys_compare_across_representations() {
        assert_eq!(
            SortKey::Int(2).try_cmp(&SortKey::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            SortKey::Bool(true).try_cmp(&SortKey::Int(1)),
            Some(Ordering::Equal)
        );
        assert_eq!(SortKey::Float(f64::NAN).try_cmp(&SortKey::Int(1)), None);
    }

    #[test]
    fn test_mixed_families_are_incomparable() {
        assert_eq!(SortKey::Int(1).try_cmp(&SortKey::Text("1".into())), None);
        assert_eq!(SortKey::Bytes(vec![1]).try_cmp(&SortKey::Text("a".into())), None);
    }

    #[test]
    fn test_tuple_keys() {
        let a = SortKey::Tuple(vec![SortKey::Int(1), SortKey::Text("b".into())]);
        let b = SortKey::Tuple(vec![SortKey::Int(1), SortKey::Text("c".into())]);
        let short = SortKey::Tuple(vec![SortKey::Int(1)]);
        assert_eq!(a.try_cmp(&b), Some(Ordering::Less));
        assert_eq!(short.try_cmp(&a), Some(Ordering::Less));
    }

    #[test]
    fn test_sort_naturally() {
        let mut items = vec![3, 1, 2];
        assert!(sort_naturally(&mut items, |i| Some(SortKey::Int(*i))));
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_naturally_keeps_order_when_incomparable() {
        let mut items = vec!["b", "1", "a"];
        let sorted = sort_naturally(&mut items, |s| {
            Some(match s.parse::<i64>() {
                Ok(i) => SortKey::Int(i),
                Err(_) => SortKey::Text(s.to_string()),
            })
        });
        assert!(!sorted);
        assert_eq!(items, vec!["b", "1", "a"]);

        let mut missing = vec![2, 1];
        assert!(!sort_naturally(&mut missing, |_| None));
        assert_eq!(missing, vec![2, 1]);
    }

    #[test]
    fn test_many_mixed_keys_stay_unsorted() {
        let mut items: Vec<SortKey> = (0..64)
            .map(|i| {
                if i % 3 == 0 {
                    SortKey::Text(format!("k{}", 64 - i))
                } else {
                    SortKey::Int(64 - i)
                }
            })
            .collect();
        let before = items.clone();
        assert!(!sort_naturally(&mut items, |k| Some(k.clone())));
        assert_eq!(items, before);
    }

    #[test]
    fn test_nan_keys_stay_unsorted() {
        let mut items: Vec<f64> = (0..25).map(|i| (25 - i) as f64).collect();
        items[12] = f64::NAN;
        let before: Vec<String> = items.iter().map(|f| f.to_string()).collect();
        assert!(!sort_naturally(&mut items, |f| Some(SortKey::Float(*f))));
        let after: Vec<String> = items.iter().map(|f| f.to_string()).collect();
        assert_eq!(after, before);
    }

    #[test]
    fn test_large_ints_compare_exactly_with_floats() {
        let big = 1_i64 << 53;
        let float = SortKey::Float(big as f64);
        assert_eq!(SortKey::Int(big + 1).try_cmp(&float), Some(Ordering::Greater));
        assert_eq!(float.try_cmp(&SortKey::Int(big)), Some(Ordering::Equal));
        assert_eq!(SortKey::Int(2).try_cmp(&SortKey::Float(2.5)), Some(Ordering::Less));
        assert_eq!(SortKey::Int(-2).try_cmp(&SortKey::Float(-2.5)), Some(Ordering::Greater));
        assert_eq!(SortKey::Int(i64::MAX).try_cmp(&SortKey::Float(1e300)), Some(Ordering::Less));

        let mut items = vec![
            SortKey::Int(big + 1),
            SortKey::Float(big as f64),
            SortKey::Int(big),
            SortKey::Float(0.5),
            SortKey::Bool(true),
        ];
        assert!(sort_naturally(&mut items, |k| Some(k.clone())));
        assert_eq!(items[0], SortKey::Float(0.5));
        assert_eq!(items[1], SortKey::Bool(true));
        assert_eq!(items[4], SortKey::Int(big + 1));
    }

    #[test]
    fn test_is_dunder() {
        assert!(is_dunder("__len__"));
        assert!(!is_dunder("__"));
        assert!(!is_dunder("____"));
        assert!(!is_dunder("_private"));
        assert!(!is_dunder("__mangled"));
    }
}
