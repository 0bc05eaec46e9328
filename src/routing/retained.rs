//! Retained Map: stores the most recent payload per concrete topic and serves it
//! back to wildcard filter queries.
//!
//! Same flat arena idea as the Subscription Map, but backed by an *ordered*
//! `BTreeMap<(parent_id, segment), Node>` so that a `+` or `#` in a query filter
//! can be answered with a range scan over a parent's children instead of a
//! pointer-graph walk.

use std::collections::BTreeMap;

use crate::error::RoutingError;
use crate::routing::path::tokenize;

type NodeId = u64;

const ROOT_ID: NodeId = 0;
const ROOT_PARENT: NodeId = NodeId::MAX;

struct Node<V> {
    id: NodeId,
    refcount: u32,
    payload: Option<V>,
}

/// The most recent payload per concrete topic, queryable by wildcard filter.
pub struct RetainedMap<V> {
    nodes: BTreeMap<(NodeId, String), Node<V>>,
    next_id: NodeId,
}

impl<V> Default for RetainedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RetainedMap<V> {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(Self::root_key(), Node { id: ROOT_ID, refcount: 0, payload: None });
        Self { nodes, next_id: ROOT_ID + 1 }
    }

    fn root_key() -> (NodeId, String) {
        (ROOT_PARENT, String::new())
    }

    /// Number of live nodes, including the permanent root.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Stores `payload` at `topic`, replacing any prior payload there.
    /// Refcount is incremented along the path only when this call adds a brand
    /// new live entry, never when it overwrites an existing one in place.
    pub fn insert_or_update(&mut self, topic: &str, payload: V) -> Result<(), RoutingError> {
        let tokens = tokenize(topic);
        for t in &tokens {
            if *t == "+" || *t == "#" {
                return Err(RoutingError::WildcardInRetainedTopic(topic.to_string()));
            }
        }

        if let Some(path) = self.find_path(&tokens) {
            let key = path.last().expect("non-empty token list");
            if self.nodes.get(key).map(|n| n.payload.is_some()).unwrap_or(false) {
                self.nodes.get_mut(key).expect("checked above").payload = Some(payload);
                return Ok(());
            }
        }

        let key = self.create_path(&tokens);
        self.nodes.get_mut(&key).expect("just created").payload = Some(payload);
        Ok(())
    }

    /// Returns whether a retained payload existed at `topic`.
    pub fn remove(&mut self, topic: &str) -> bool {
        let tokens = tokenize(topic);
        let Some(path) = self.find_path(&tokens) else { return false };
        let key = path.last().expect("non-empty token list").clone();
        if self.nodes.get(&key).map(|n| n.payload.is_none()).unwrap_or(true) {
            return false;
        }
        self.nodes.get_mut(&key).expect("checked above").payload = None;
        self.remove_path(&tokens)
    }

    /// Wildcard-aware query: `filter` may contain `+`/`#`.
    pub fn find<F: FnMut(&V)>(&self, filter: &str, mut callback: F) {
        let tokens = tokenize(filter);
        let mut frontier = vec![Self::root_key()];

        for t in &tokens {
            if *t == "+" {
                let mut next = Vec::new();
                for key in &frontier {
                    let Some(node) = self.nodes.get(key) else { continue };
                    next.extend(self.children_of(node.id));
                }
                if next.is_empty() {
                    return;
                }
                frontier = next;
            } else if *t == "#" {
                for key in &frontier {
                    let Some(node) = self.nodes.get(key) else { continue };
                    if let Some(v) = &node.payload {
                        callback(v);
                    }
                    self.collect_all_descendants(node.id, &mut callback);
                }
                return;
            } else {
                let mut next = Vec::new();
                for key in &frontier {
                    let Some(node) = self.nodes.get(key) else { continue };
                    let child_key = (node.id, (*t).to_string());
                    if self.nodes.contains_key(&child_key) {
                        next.push(child_key);
                    }
                }
                if next.is_empty() {
                    return;
                }
                frontier = next;
            }
        }

        for key in &frontier {
            if let Some(node) = self.nodes.get(key) {
                if let Some(v) = &node.payload {
                    callback(v);
                }
            }
        }
    }

    fn children_of(&self, parent: NodeId) -> Vec<(NodeId, String)> {
        self.nodes
            .range((parent, String::new())..(parent + 1, String::new()))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn collect_all_descendants<F: FnMut(&V)>(&self, parent: NodeId, callback: &mut F) {
        for (_, node) in self.nodes.range((parent, String::new())..(parent + 1, String::new())) {
            if let Some(v) = &node.payload {
                callback(v);
            }
            self.collect_all_descendants(node.id, callback);
        }
    }

    fn find_path(&self, tokens: &[&str]) -> Option<Vec<(NodeId, String)>> {
        let mut parent_key = Self::root_key();
        let mut path = Vec::with_capacity(tokens.len());
        for t in tokens {
            let parent_id = self.nodes.get(&parent_key)?.id;
            let key = (parent_id, (*t).to_string());
            self.nodes.get(&key)?;
            path.push(key.clone());
            parent_key = key;
        }
        Some(path)
    }

    fn create_path(&mut self, tokens: &[&str]) -> (NodeId, String) {
        let mut parent_key = Self::root_key();
        for t in tokens {
            let parent_id = self.nodes[&parent_key].id;
            let key = (parent_id, (*t).to_string());
            if let Some(node) = self.nodes.get_mut(&key) {
                node.refcount += 1;
            } else {
                let id = self.next_id;
                self.next_id += 1;
                self.nodes.insert(key.clone(), Node { id, refcount: 1, payload: None });
            }
            parent_key = key;
        }
        parent_key
    }

    fn remove_path(&mut self, tokens: &[&str]) -> bool {
        let Some(path) = self.find_path(tokens) else { return false };
        for key in path.iter().rev() {
            let erase = {
                let node = self.nodes.get_mut(key).expect("path node must exist");
                node.refcount -= 1;
                node.refcount == 0
            };
            if erase {
                self.nodes.remove(key);
            }
        }
        true
    }
}
