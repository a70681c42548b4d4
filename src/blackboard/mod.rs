//! Key-value signals read by the decision graph.
//!
//! The graph never owns agent data. Conditions, evaluations and key
//! triggers are looked up by name through [`KeyStore`], which host
//! contexts implement (usually by delegating to an embedded
//! [`Blackboard`]). A key that is missing resolves to "absent": it fails a
//! condition and contributes nothing to a score.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What the graph uses a key for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum KeyKind {
    /// Boolean read by a key trigger
    Trigger,
    /// Boolean gating a transition
    Condition,
    /// Float averaged into a transition score
    Evaluation,
}

/// Read access to named agent signals.
pub trait KeyStore {
    /// Boolean value of `key`, `None` when absent or not a boolean.
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// Float value of `key`, `None` when absent or not a float.
    fn get_f32(&self, key: &str) -> Option<f32>;

    /// Called once per key the graph reads, so the store knows its kind.
    fn declare(&mut self, _key: &str, _kind: KeyKind) {}
}

/// A stored signal value.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Float(f32),
}

/// Hashed string map implementing [`KeyStore`].
///
/// # Example
///
/// ```rust
/// use utility_hsm::blackboard::{Blackboard, KeyStore};
///
/// let mut board = Blackboard::new();
/// board.set_bool("enemy_visible", true);
/// board.set_f32("aggression", 0.8);
///
/// assert_eq!(board.get_bool("enemy_visible"), Some(true));
/// assert_eq!(board.get_f32("aggression"), Some(0.8));
/// assert_eq!(board.get_f32("fatigue"), None);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Blackboard {
    values: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    kinds: HashMap<String, KeyKind>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), Value::Bool(value));
    }

    pub fn set_f32(&mut self, key: impl Into<String>, value: f32) {
        self.values.insert(key.into(), Value::Float(value));
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).copied()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Kind a key was declared with by a graph, if any.
    pub fn kind_of(&self, key: &str) -> Option<KeyKind> {
        self.kinds.get(key).copied()
    }

    pub fn declared_keys(&self) -> impl Iterator<Item = (&str, KeyKind)> {
        self.kinds.iter().map(|(key, kind)| (key.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyStore for Blackboard {
    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            Value::Bool(value) => Some(*value),
            Value::Float(_) => None,
        }
    }

    fn get_f32(&self, key: &str) -> Option<f32> {
        match self.values.get(key)? {
            Value::Float(value) => Some(*value),
            Value::Bool(_) => None,
        }
    }

    fn declare(&mut self, key: &str, kind: KeyKind) {
        self.kinds.insert(key.to_string(), kind);
    }
}
