//! Surrogate-key arena: the in-memory index from natural key to surrogate id.
//!
//! A build seeds one arena per dimension from the rows already persisted,
//! assigns ids to natural keys it has not seen, and flushes only the newly
//! assigned rows. Ids are assigned monotonically and never reused.

use std::collections::HashMap;

use crate::dimension::NaturalKey;

#[derive(Debug, Clone)]
pub struct KeyArena {
  ids:     HashMap<NaturalKey, i64>,
  /// Rows assigned during this build, in assignment order.
  pending: Vec<(i64, NaturalKey)>,
  next_id: i64,
}

impl Default for KeyArena {
  fn default() -> Self {
    Self { ids: HashMap::new(), pending: Vec::new(), next_id: 1 }
  }
}

impl KeyArena {
  pub fn new() -> Self { Self::default() }

  /// Register a row that already exists in the store.
  ///
  /// If `key` is already present the first id wins; the later row is a
  /// stray duplicate (possible for NULL-bearing tuples, which a SQL UNIQUE
  /// constraint does not cover) and is never referenced by new facts.
  pub fn seed(&mut self, id: i64, key: NaturalKey) {
    self.next_id = self.next_id.max(id + 1);
    self.ids.entry(key).or_insert(id);
  }

  /// Return the id for `key`, assigning a fresh one on a miss.
  ///
  /// The boolean is `true` when the key was inserted by this call.
  pub fn upsert_if_absent(&mut self, key: &NaturalKey) -> (i64, bool) {
    if let Some(&id) = self.ids.get(key) {
      return (id, false);
    }
    let id = self.next_id;
    self.next_id += 1;
    self.ids.insert(key.clone(), id);
    self.pending.push((id, key.clone()));
    (id, true)
  }

  pub fn lookup(&self, key: &NaturalKey) -> Option<i64> { self.ids.get(key).copied() }

  /// Rows assigned since the arena was created, ready to be written.
  pub fn pending(&self) -> &[(i64, NaturalKey)] { &self.pending }

  /// Number of distinct natural keys known to the arena.
  pub fn len(&self) -> usize { self.ids.len() }

  pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dimension::KeyValue;

  fn key(s: &str) -> NaturalKey { NaturalKey(vec![KeyValue::Text(s.into())]) }

  #[test]
  fn hit_returns_existing_id() {
    let mut arena = KeyArena::new();
    let (a, inserted_a) = arena.upsert_if_absent(&key("x"));
    let (b, inserted_b) = arena.upsert_if_absent(&key("x"));
    assert_eq!(a, b);
    assert!(inserted_a);
    assert!(!inserted_b);
    assert_eq!(arena.pending().len(), 1);
  }

  #[test]
  fn ids_continue_after_seeded_rows() {
    let mut arena = KeyArena::new();
    arena.seed(7, key("old"));
    let (id, _) = arena.upsert_if_absent(&key("new"));
    assert_eq!(id, 8);
    assert_eq!(arena.lookup(&key("old")), Some(7));
    assert_eq!(arena.pending(), &[(8, key("new"))]);
  }

  #[test]
  fn seeded_duplicate_keeps_first_id() {
    let mut arena = KeyArena::new();
    arena.seed(3, key("dup"));
    arena.seed(5, key("dup"));
    assert_eq!(arena.lookup(&key("dup")), Some(3));
    assert_eq!(arena.len(), 1);
    assert_eq!(arena.upsert_if_absent(&key("next")).0, 6);
  }

  #[test]
  fn lookup_miss_is_none() {
    assert_eq!(KeyArena::new().lookup(&key("nope")), None);
  }
}
