use std::collections::{BTreeMap, HashMap};

use super::keys::{StateKey, StateValue};

/// Per-session key/value store.
///
/// Owned by the request handling one session; nothing else reads or writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    entries: HashMap<StateKey, StateValue>,
}

impl SessionState {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`.
    pub fn get(&self, key: StateKey) -> Option<&StateValue> {
        self.entries.get(&key)
    }

    /// Get a value, or `default` when absent.
    pub fn get_or(&self, key: StateKey, default: StateValue) -> StateValue {
        self.entries.get(&key).cloned().unwrap_or(default)
    }

    /// Store a value, replacing any previous one.
    pub fn set(&mut self, key: StateKey, value: impl Into<StateValue>) {
        self.entries.insert(key, value.into());
    }

    /// Remove a key. Removing an absent key is a no-op.
    pub fn pop(&mut self, key: StateKey) -> Option<StateValue> {
        self.entries.remove(&key)
    }

    /// Whether `key` is present, whatever its value.
    pub fn contains(&self, key: StateKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Whether a key is present with a truthy value.
    pub fn is_set(&self, key: StateKey) -> bool {
        self.entries.get(&key).is_some_and(StateValue::is_truthy)
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Present keys in pipeline order.
    pub fn keys(&self) -> Vec<StateKey> {
        let mut keys: Vec<StateKey> = self.entries.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (StateKey, &StateValue)> {
        let mut entries: Vec<(StateKey, &StateValue)> =
            self.entries.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries.into_iter()
    }

    /// Text value, if stored as text.
    pub fn text(&self, key: StateKey) -> Option<&str> {
        match self.entries.get(&key) {
            Some(StateValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// True only for a stored `Flag(true)`.
    pub fn flag(&self, key: StateKey) -> bool {
        matches!(self.entries.get(&key), Some(StateValue::Flag(true)))
    }

    /// Integer value, if stored as a number.
    pub fn number(&self, key: StateKey) -> Option<i64> {
        match self.entries.get(&key) {
            Some(StateValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// List value, if stored as a list.
    pub fn list(&self, key: StateKey) -> Option<&[String]> {
        match self.entries.get(&key) {
            Some(StateValue::List(items)) => Some(items),
            _ => None,
        }
    }

    /// Map value, if stored as a map.
    pub fn map(&self, key: StateKey) -> Option<&BTreeMap<String, String>> {
        match self.entries.get(&key) {
            Some(StateValue::Map(entries)) => Some(entries),
            _ => None,
        }
    }
}

impl FromIterator<(StateKey, StateValue)> for SessionState {
    fn from_iter<I: IntoIterator<Item = (StateKey, StateValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
