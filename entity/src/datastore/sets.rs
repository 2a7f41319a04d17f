//! Insertion-ordered tag sets.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TagSet {
    order: Vec<Uuid>,
    members: BTreeSet<Uuid>,
}

/// Tag name to ordered set of entity IDs.
///
/// Empty sets are dropped so that an unused tag and a never-seen tag hash
/// identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSets {
    sets: BTreeMap<String, TagSet>,
}

impl TagSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` to `tag`. Returns false if it was already a member.
    pub fn insert(&mut self, tag: &str, id: Uuid) -> bool {
        let set = self.sets.entry(tag.to_string()).or_default();
        if !set.members.insert(id) {
            return false;
        }
        set.order.push(id);
        true
    }

    /// Put `id` back at `position`; used when undoing a removal.
    pub(crate) fn insert_at(&mut self, tag: &str, id: Uuid, position: usize) {
        let set = self.sets.entry(tag.to_string()).or_default();
        if set.members.insert(id) {
            let position = position.min(set.order.len());
            set.order.insert(position, id);
        }
    }

    /// Remove `id` from `tag`, returning its former position.
    pub fn remove(&mut self, tag: &str, id: Uuid) -> Option<usize> {
        let set = self.sets.get_mut(tag)?;
        if !set.members.remove(&id) {
            return None;
        }
        let position = set.order.iter().position(|member| *member == id)?;
        set.order.remove(position);
        if set.order.is_empty() {
            self.sets.remove(tag);
        }
        Some(position)
    }

    pub fn contains(&self, tag: &str, id: Uuid) -> bool {
        self.sets
            .get(tag)
            .map(|set| set.members.contains(&id))
            .unwrap_or(false)
    }

    pub fn len(&self, tag: &str) -> usize {
        self.sets.get(tag).map(|set| set.order.len()).unwrap_or(0)
    }

    /// Members of `tag` in insertion order; empty for an unknown tag.
    pub fn members(&self, tag: &str) -> &[Uuid] {
        self.sets
            .get(tag)
            .map(|set| set.order.as_slice())
            .unwrap_or(&[])
    }

    /// IDs present in every tag, in the insertion order of the first tag.
    pub fn intersect<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Uuid> {
        let Some((first, rest)) = tags.split_first() else {
            return Vec::new();
        };

        let others = rest
            .iter()
            .map(|tag| self.sets.get(tag.as_ref()))
            .collect::<Option<Vec<_>>>();
        let Some(others) = others else {
            return Vec::new();
        };

        self.members(first.as_ref())
            .iter()
            .filter(|id| others.iter().all(|set| set.members.contains(id)))
            .copied()
            .collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &[Uuid])> {
        self.sets
            .iter()
            .map(|(tag, set)| (tag.as_str(), set.order.as_slice()))
    }

    pub fn tag_count(&self) -> usize {
        self.sets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u128) -> Vec<Uuid> {
        (1..=n).map(Uuid::from_u128).collect()
    }

    #[test]
    fn test_insert_keeps_order_and_ignores_duplicates() {
        let mut sets = TagSets::new();
        let ids = ids(3);
        for id in ids.iter().rev() {
            assert!(sets.insert("all", *id));
        }
        assert!(!sets.insert("all", ids[0]));
        assert_eq!(sets.members("all"), &[ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_remove_drops_empty_sets() {
        let mut sets = TagSets::new();
        let id = Uuid::from_u128(9);
        sets.insert("only", id);
        assert_eq!(sets.remove("only", id), Some(0));
        assert_eq!(sets.tag_count(), 0);
        assert_eq!(sets.remove("only", id), None);
    }

    #[test]
    fn test_intersect_follows_first_tag_order() {
        let mut sets = TagSets::new();
        let ids = ids(4);
        for id in &ids {
            sets.insert("a", *id);
        }
        sets.insert("b", ids[3]);
        sets.insert("b", ids[1]);

        assert_eq!(sets.intersect(&["a", "b"]), vec![ids[1], ids[3]]);
        assert_eq!(sets.intersect(&["b", "a"]), vec![ids[3], ids[1]]);
        assert!(sets.intersect(&["a", "missing"]).is_empty());
        assert!(sets.intersect::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_insert_at_restores_position() {
        let mut sets = TagSets::new();
        let ids = ids(3);
        for id in &ids {
            sets.insert("t", *id);
        }
        let position = sets.remove("t", ids[1]).unwrap();
        sets.insert_at("t", ids[1], position);
        assert_eq!(sets.members("t"), ids.as_slice());
    }
}
