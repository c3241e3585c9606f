//! Container serialization protocol.
//!
//! Backends never name concrete container types: one generic algorithm per
//! codec drives every ordered sequence through [`Sequence`] and every
//! key/value collection through [`Keyed`]. The std containers below are thin
//! adapters over those hooks; anything else that implements a hook set gets
//! both wire formats for free.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;

/// Hooks for list-like containers: an ordered, homogeneous sequence.
pub trait Sequence: Default {
    /// Element type.
    type Item;
    /// Borrowing iterator over elements in serialization order.
    type Iter<'a>: Iterator<Item = &'a Self::Item>
    where
        Self: 'a;

    /// Hint that `additional` elements are about to be appended. Push-based
    /// containers may ignore this.
    fn grow_hint(&mut self, additional: usize);

    /// Appends one decoded element.
    fn push_item(&mut self, item: Self::Item);

    /// Number of elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates elements for encoding.
    fn iter_items(&self) -> Self::Iter<'_>;
}

/// Hooks for collection-like containers: a key/value mapping.
pub trait Keyed: Default {
    /// Key type.
    type Key;
    /// Value type.
    type Value;
    /// Borrowing iterator over pairs in serialization order.
    type Iter<'a>: Iterator<Item = (&'a Self::Key, &'a Self::Value)>
    where
        Self: 'a;

    /// Hint that `additional` pairs are about to be inserted.
    fn grow_hint(&mut self, additional: usize);

    /// Commits one fully-built pair into the collection.
    fn insert_pair(&mut self, key: Self::Key, value: Self::Value);

    /// Number of pairs.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates pairs for encoding.
    fn iter_pairs(&self) -> Self::Iter<'_>;
}

impl<T> Sequence for Vec<T> {
    type Item = T;
    type Iter<'a>
        = std::slice::Iter<'a, T>
    where
        Self: 'a;

    fn grow_hint(&mut self, additional: usize) {
        self.reserve(additional);
    }

    fn push_item(&mut self, item: T) {
        self.push(item);
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn iter_items(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

impl<T> Sequence for VecDeque<T> {
    type Item = T;
    type Iter<'a>
        = std::collections::vec_deque::Iter<'a, T>
    where
        Self: 'a;

    fn grow_hint(&mut self, additional: usize) {
        self.reserve(additional);
    }

    fn push_item(&mut self, item: T) {
        self.push_back(item);
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn iter_items(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

impl<T> Sequence for LinkedList<T> {
    type Item = T;
    type Iter<'a>
        = std::collections::linked_list::Iter<'a, T>
    where
        Self: 'a;

    fn grow_hint(&mut self, _additional: usize) {}

    fn push_item(&mut self, item: T) {
        self.push_back(item);
    }

    fn len(&self) -> usize {
        LinkedList::len(self)
    }

    fn iter_items(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

// Sets are list-like on the wire: an ordered sequence of elements with
// insertion as the append hook.
impl<T: Eq + Hash> Sequence for HashSet<T> {
    type Item = T;
    type Iter<'a>
        = std::collections::hash_set::Iter<'a, T>
    where
        Self: 'a;

    fn grow_hint(&mut self, additional: usize) {
        self.reserve(additional);
    }

    fn push_item(&mut self, item: T) {
        self.insert(item);
    }

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn iter_items(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

impl<T: Ord> Sequence for BTreeSet<T> {
    type Item = T;
    type Iter<'a>
        = std::collections::btree_set::Iter<'a, T>
    where
        Self: 'a;

    fn grow_hint(&mut self, _additional: usize) {}

    fn push_item(&mut self, item: T) {
        self.insert(item);
    }

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn iter_items(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

impl<K: Eq + Hash, V> Keyed for HashMap<K, V> {
    type Key = K;
    type Value = V;
    type Iter<'a>
        = std::collections::hash_map::Iter<'a, K, V>
    where
        Self: 'a;

    fn grow_hint(&mut self, additional: usize) {
        self.reserve(additional);
    }

    fn insert_pair(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn iter_pairs(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

impl<K: Ord, V> Keyed for BTreeMap<K, V> {
    type Key = K;
    type Value = V;
    type Iter<'a>
        = std::collections::btree_map::Iter<'a, K, V>
    where
        Self: 'a;

    fn grow_hint(&mut self, _additional: usize) {}

    fn insert_pair(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn iter_pairs(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_sequence<S: Sequence>(items: Vec<S::Item>) -> S {
        let mut out = S::default();
        out.grow_hint(items.len());
        for item in items {
            out.push_item(item);
        }
        out
    }

    #[test]
    fn test_sequence_adapters_preserve_order() {
        let vec: Vec<u8> = collect_sequence(vec![3, 1, 2]);
        assert_eq!(vec.iter_items().copied().collect::<Vec<_>>(), vec![3, 1, 2]);

        let deque: VecDeque<u8> = collect_sequence(vec![3, 1, 2]);
        assert_eq!(
            deque.iter_items().copied().collect::<Vec<_>>(),
            vec![3, 1, 2]
        );

        let list: LinkedList<u8> = collect_sequence(vec![3, 1, 2]);
        assert_eq!(
            list.iter_items().copied().collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn test_set_adapters_deduplicate() {
        let set: BTreeSet<u8> = collect_sequence(vec![2, 1, 2]);
        assert_eq!(Sequence::len(&set), 2);
        assert_eq!(set.iter_items().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_keyed_adapters() {
        let mut map: BTreeMap<String, u32> = BTreeMap::default();
        map.insert_pair("b".into(), 2);
        map.insert_pair("a".into(), 1);
        assert_eq!(Keyed::len(&map), 2);
        let pairs: Vec<_> = map.iter_pairs().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(pairs, vec![("a".into(), 1), ("b".into(), 2)]);
    }
}
