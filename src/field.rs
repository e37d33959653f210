use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::status::SelectionStatus;

pub type DynamicFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// One field's constraint inside a specification.
///
/// Replaces runtime probing of field contents with an explicit tag; all
/// status and matching logic is an exhaustive match over it.
pub enum FieldSpec<T> {
    Unconstrained,
    Exact(T),
    AnyOf(BTreeSet<T>),
    Dynamic(DynamicFn<T>),
}

impl<T> FieldSpec<T> {
    pub fn dynamic(test: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        FieldSpec::Dynamic(Arc::new(test))
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, FieldSpec::Unconstrained)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, FieldSpec::Dynamic(_))
    }

    /// Write-intent cardinality of this field alone.
    pub fn write_status(&self) -> SelectionStatus {
        match self {
            FieldSpec::Unconstrained => SelectionStatus::Unspecified,
            FieldSpec::Exact(_) => SelectionStatus::Single,
            FieldSpec::AnyOf(set) => SelectionStatus::of_count(set.len()),
            FieldSpec::Dynamic(_) => SelectionStatus::Dynamic,
        }
    }

    /// The one value this field denotes, if it denotes exactly one.
    pub fn single(&self) -> Option<&T> {
        match self {
            FieldSpec::Exact(value) => Some(value),
            FieldSpec::AnyOf(set) if set.len() == 1 => set.iter().next(),
            _ => None,
        }
    }
}

impl<T: Ord> FieldSpec<T> {
    pub fn any_of(values: impl IntoIterator<Item = T>) -> Self {
        FieldSpec::AnyOf(values.into_iter().collect())
    }

    pub fn matches(&self, candidate: &T) -> bool {
        match self {
            FieldSpec::Unconstrained => true,
            FieldSpec::Exact(value) => value == candidate,
            FieldSpec::AnyOf(set) => set.contains(candidate),
            FieldSpec::Dynamic(test) => test(candidate),
        }
    }
}

impl<T> From<T> for FieldSpec<T> {
    fn from(value: T) -> Self {
        FieldSpec::Exact(value)
    }
}

impl From<&str> for FieldSpec<String> {
    fn from(value: &str) -> Self {
        FieldSpec::Exact(value.to_string())
    }
}

impl<T> Default for FieldSpec<T> {
    fn default() -> Self {
        FieldSpec::Unconstrained
    }
}

impl<T: Clone> Clone for FieldSpec<T> {
    fn clone(&self) -> Self {
        match self {
            FieldSpec::Unconstrained => FieldSpec::Unconstrained,
            FieldSpec::Exact(value) => FieldSpec::Exact(value.clone()),
            FieldSpec::AnyOf(set) => FieldSpec::AnyOf(set.clone()),
            FieldSpec::Dynamic(test) => FieldSpec::Dynamic(Arc::clone(test)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSpec::Unconstrained => write!(f, "Unconstrained"),
            FieldSpec::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            FieldSpec::AnyOf(set) => f.debug_tuple("AnyOf").field(set).finish(),
            FieldSpec::Dynamic(_) => write!(f, "Dynamic(..)"),
        }
    }
}

impl<T: PartialEq> PartialEq for FieldSpec<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldSpec::Unconstrained, FieldSpec::Unconstrained) => true,
            (FieldSpec::Exact(a), FieldSpec::Exact(b)) => a == b,
            (FieldSpec::AnyOf(a), FieldSpec::AnyOf(b)) => a == b,
            (FieldSpec::Dynamic(a), FieldSpec::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_status_per_tag() {
        assert_eq!(
            FieldSpec::<String>::Unconstrained.write_status(),
            SelectionStatus::Unspecified
        );
        assert_eq!(
            FieldSpec::<String>::from("A1").write_status(),
            SelectionStatus::Single
        );
        assert_eq!(
            FieldSpec::any_of([1u32, 3]).write_status(),
            SelectionStatus::Multiple
        );
        assert_eq!(
            FieldSpec::any_of([7u32]).write_status(),
            SelectionStatus::Single
        );
        assert_eq!(
            FieldSpec::<u32>::any_of([]).write_status(),
            SelectionStatus::None
        );
        assert_eq!(
            FieldSpec::<u32>::dynamic(|idx| *idx > 2).write_status(),
            SelectionStatus::Dynamic
        );
    }

    #[test]
    fn matching_per_tag() {
        let subject = "A1".to_string();
        assert!(FieldSpec::Unconstrained.matches(&subject));
        assert!(FieldSpec::from("A1").matches(&subject));
        assert!(!FieldSpec::from("A2").matches(&subject));
        assert!(FieldSpec::any_of(["A1".to_string(), "A2".to_string()]).matches(&subject));
        assert!(FieldSpec::dynamic(|s: &String| s.starts_with('A')).matches(&subject));
        assert!(!FieldSpec::dynamic(|s: &String| s.starts_with('B')).matches(&subject));
    }

    #[test]
    fn single_value() {
        assert_eq!(FieldSpec::from(5u32).single(), Some(&5));
        assert_eq!(FieldSpec::any_of([5u32]).single(), Some(&5));
        assert_eq!(FieldSpec::any_of([1u32, 2]).single(), None);
        assert_eq!(FieldSpec::<u32>::Unconstrained.single(), None);
    }
}
