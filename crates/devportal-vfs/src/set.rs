//! A minimal unordered set.
//!
//! Used to deduplicate directory entry names while merging layers. Iteration
//! order is unspecified; callers that display members sort them first.

use std::collections::HashSet;
use std::collections::hash_set;
use std::hash::Hash;

/// Unordered, deduplicating collection of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set<T: Eq + Hash> {
    members: HashSet<T>,
}

impl<T: Eq + Hash> Default for Set<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> Set<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            members: HashSet::new(),
        }
    }

    /// Insert zero or more values. Values already present are left alone.
    pub fn add(&mut self, values: impl IntoIterator<Item = T>) {
        self.members.extend(values);
    }

    /// Check whether `value` is a member.
    pub fn has(&self, value: &T) -> bool {
        self.members.contains(value)
    }

    /// Members of `self` that are not in `other`, as a new set.
    pub fn difference(&self, other: &Set<T>) -> Set<T>
    where
        T: Clone,
    {
        self.members
            .iter()
            .filter(|value| !other.has(value))
            .cloned()
            .collect()
    }

    /// Iterate over the current members, in no particular order.
    pub fn all(&self) -> hash_set::Iter<'_, T> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T: Eq + Hash> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl<T: Eq + Hash> IntoIterator for Set<T> {
    type Item = T;
    type IntoIter = hash_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a, T: Eq + Hash> IntoIterator for &'a Set<T> {
    type Item = &'a T;
    type IntoIter = hash_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut set = Set::new();
        set.add(["a", "b"]);
        set.add(["a"]);
        set.add([]);
        assert_eq!(set.len(), 2);
        assert!(set.has(&"a"));
        assert!(set.has(&"b"));
        assert!(!set.has(&"c"));
    }

    #[test]
    fn test_difference() {
        let left: Set<&str> = ["a.css", "b.css", "c.css"].into_iter().collect();
        let right: Set<&str> = ["b.css", "z.css"].into_iter().collect();

        let diff = left.difference(&right);
        let mut members: Vec<_> = diff.all().copied().collect();
        members.sort();
        assert_eq!(members, vec!["a.css", "c.css"]);

        // Receiver is untouched
        assert_eq!(left.len(), 3);
    }

    #[test]
    fn test_all_visits_every_member_once() {
        let mut set = Set::new();
        set.add(1..=5);
        set.add(3..=7);
        let mut seen: Vec<_> = set.all().copied().collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_empty_set() {
        let set: Set<String> = Set::default();
        assert!(set.is_empty());
        assert_eq!(set.all().count(), 0);
        assert!(set.difference(&Set::new()).is_empty());
    }

    proptest! {
        #[test]
        fn difference_holds_exactly_the_unshared_members(
            left in proptest::collection::vec(0u8..32, 0..24),
            right in proptest::collection::vec(0u8..32, 0..24),
        ) {
            let a: Set<u8> = left.iter().copied().collect();
            let b: Set<u8> = right.iter().copied().collect();
            let diff = a.difference(&b);

            for value in 0u8..32 {
                prop_assert_eq!(diff.has(&value), a.has(&value) && !b.has(&value));
            }
        }
    }
}
