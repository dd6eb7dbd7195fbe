//! Insertion-ordered keyed accumulation used by both groupers.

use std::collections::HashMap;

/// Records keyed by a string, iterated in first-seen order.
#[derive(Debug, Clone)]
pub struct OrderedGroups<T> {
    index: HashMap<String, usize>,
    records: Vec<T>,
}

impl<T> OrderedGroups<T> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            records: Vec::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let i = *self.index.get(key)?;
        self.records.get_mut(i)
    }

    /// Insert a record for an unseen key. An existing key keeps its record.
    pub fn insert(&mut self, key: &str, record: T) {
        if self.contains(key) {
            return;
        }
        self.index.insert(key.to_string(), self.records.len());
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

impl<T> Default for OrderedGroups<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let mut groups = OrderedGroups::new();
        groups.insert("b", 1);
        groups.insert("a", 2);
        groups.insert("b", 3);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.into_records(), vec![1, 2]);
    }

    #[test]
    fn test_membership_is_explicit() {
        let mut groups: OrderedGroups<String> = OrderedGroups::new();
        groups.insert("alice", String::new());

        assert!(groups.contains("alice"));
        assert!(!groups.contains("bob"));
        groups.get_mut("alice").unwrap().push_str("x");
        assert_eq!(groups.into_records(), vec!["x".to_string()]);
    }
}
