//! Subscription Map: a wildcard-aware trie from topic filter to subscriber value(s).
//!
//! Backing store is a flat arena keyed by `(parent_id, segment)` rather than a
//! pointer graph of child nodes — node ids are arena handles, never reused, and a
//! node's lifetime is governed purely by its refcount. `SingleSubscriptionMap` and
//! `MultiSubscriptionMap` are thin facades sharing the same trie mechanics; they
//! differ only in what a terminal node carries and in `insert`/`remove` semantics.

use std::collections::HashMap;

use crate::error::RoutingError;
use crate::routing::path::tokenize;

pub(crate) type NodeId = u64;

const ROOT_ID: NodeId = 0;
const ROOT_PARENT: NodeId = NodeId::MAX;

struct Node<P> {
    id: NodeId,
    refcount: u32,
    has_plus_child: bool,
    has_hash_child: bool,
    payload: P,
}

/// Shared trie mechanics for both subscription map flavors. `P` is the per-node
/// payload container: `Option<V>` for single-value, `Vec<V>` for multi-value.
struct SubscriptionTrie<P> {
    nodes: HashMap<(NodeId, String), Node<P>>,
    next_id: NodeId,
}

impl<P: Default> SubscriptionTrie<P> {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            Self::root_key(),
            Node {
                id: ROOT_ID,
                refcount: 0,
                has_plus_child: false,
                has_hash_child: false,
                payload: P::default(),
            },
        );
        Self { nodes, next_id: ROOT_ID + 1 }
    }

    fn root_key() -> (NodeId, String) {
        (ROOT_PARENT, String::new())
    }

    fn size(&self) -> usize {
        self.nodes.len()
    }

    /// `#` only as the final token; `+`/`#` never embedded in a longer segment.
    fn validate(filter: &str, tokens: &[&str]) -> Result<(), RoutingError> {
        let last = tokens.len() - 1;
        for (i, t) in tokens.iter().enumerate() {
            if *t == "#" && i != last {
                return Err(RoutingError::MalformedFilter(filter.to_string()));
            }
            if *t != "+" && *t != "#" && (t.contains('+') || t.contains('#')) {
                return Err(RoutingError::MalformedFilter(filter.to_string()));
            }
        }
        Ok(())
    }

    /// Walk the path, creating missing nodes (refcount 1) and incrementing
    /// refcount on nodes already traversed. Returns the terminal node's key.
    /// Only called after `validate` has already succeeded, so this cannot fail.
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
                self.nodes.insert(
                    key.clone(),
                    Node { id, refcount: 1, has_plus_child: false, has_hash_child: false, payload: P::default() },
                );
                let parent = self.nodes.get_mut(&parent_key).expect("parent must exist");
                if *t == "+" {
                    parent.has_plus_child = true;
                } else if *t == "#" {
                    parent.has_hash_child = true;
                }
            }
            parent_key = key;
        }
        parent_key
    }

    /// Locate the full path for `tokens`, or `None` if any segment is missing.
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

    /// Decrement refcount along the whole path, leaf to root, erasing nodes that
    /// reach zero and clearing the parent's wildcard hint as they go. No-op if
    /// the path doesn't exist.
    fn remove_path(&mut self, tokens: &[&str]) -> bool {
        let Some(path) = self.find_path(tokens) else { return false };
        for i in (0..path.len()).rev() {
            let key = path[i].clone();
            let parent_key = if i == 0 { Self::root_key() } else { path[i - 1].clone() };
            let erase = {
                let node = self.nodes.get_mut(&key).expect("path node must exist");
                node.refcount -= 1;
                node.refcount == 0
            };
            if erase {
                let segment = &key.1;
                if segment == "+" || segment == "#" {
                    if let Some(parent) = self.nodes.get_mut(&parent_key) {
                        if segment == "+" {
                            parent.has_plus_child = false;
                        } else {
                            parent.has_hash_child = false;
                        }
                    }
                }
                self.nodes.remove(&key);
            }
        }
        true
    }

    /// Wildcard-aware match of a concrete topic against every stored filter.
    /// `on_payload` is invoked once per matching node's payload container.
    fn find_match<F: FnMut(&P)>(&self, topic: &str, mut on_payload: F) {
        let tokens = tokenize(topic);
        let mut frontier = vec![Self::root_key()];

        for t in &tokens {
            self.emit_hash_children(&frontier, &mut on_payload);

            let mut next = Vec::new();
            for key in &frontier {
                let Some(node) = self.nodes.get(key) else { continue };
                let parent_id = node.id;

                let exact = (parent_id, (*t).to_string());
                if self.nodes.contains_key(&exact) {
                    next.push(exact);
                }

                if node.has_plus_child {
                    let plus = (parent_id, "+".to_string());
                    if self.nodes.contains_key(&plus) {
                        next.push(plus);
                    }
                }
            }

            if next.is_empty() {
                return;
            }
            frontier = next;
        }

        // A trailing `#` matches zero further segments too: a filter "a/#" must
        // match topic "a" itself, not only topics with at least one more token.
        self.emit_hash_children(&frontier, &mut on_payload);

        for key in &frontier {
            if let Some(node) = self.nodes.get(key) {
                on_payload(&node.payload);
            }
        }
    }

    fn emit_hash_children<F: FnMut(&P)>(&self, frontier: &[(NodeId, String)], on_payload: &mut F) {
        for key in frontier {
            let Some(node) = self.nodes.get(key) else { continue };
            if node.has_hash_child {
                if let Some(hash_node) = self.nodes.get(&(node.id, "#".to_string())) {
                    on_payload(&hash_node.payload);
                }
            }
        }
    }
}

// ==========================================
// SINGLE-VALUE FACADE
// ==========================================

/// At most one subscriber value per filter.
pub struct SingleSubscriptionMap<V> {
    trie: SubscriptionTrie<Option<V>>,
}

impl<V> Default for SingleSubscriptionMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SingleSubscriptionMap<V> {
    pub fn new() -> Self {
        Self { trie: SubscriptionTrie::new() }
    }

    /// Number of live nodes, including the permanent root.
    pub fn size(&self) -> usize {
        self.trie.size()
    }

    pub fn insert(&mut self, filter: &str, value: V) -> Result<(), RoutingError> {
        let tokens = tokenize(filter);
        SubscriptionTrie::<Option<V>>::validate(filter, &tokens)?;

        if let Some(path) = self.trie.find_path(&tokens) {
            let key = path.last().expect("non-empty token list");
            if self.trie.nodes[key].payload.is_some() {
                return Err(RoutingError::DuplicateSubscription(filter.to_string()));
            }
        }

        let key = self.trie.create_path(&tokens);
        self.trie.nodes.get_mut(&key).expect("just created").payload = Some(value);
        Ok(())
    }

    /// Returns whether a subscription existed at `filter`.
    pub fn remove(&mut self, filter: &str) -> bool {
        let tokens = tokenize(filter);
        let Some(path) = self.trie.find_path(&tokens) else { return false };
        let key = path.last().expect("non-empty token list").clone();
        if self.trie.nodes.get(&key).map(|n| n.payload.is_none()).unwrap_or(true) {
            return false;
        }
        self.trie.nodes.get_mut(&key).expect("checked above").payload = None;
        self.trie.remove_path(&tokens)
    }

    pub fn find<F: FnMut(&V)>(&self, topic: &str, mut callback: F) {
        self.trie.find_match(topic, |payload| {
            if let Some(v) = payload {
                callback(v);
            }
        });
    }
}

// ==========================================
// MULTI-VALUE FACADE
// ==========================================

/// A sequence of subscriber values per filter.
pub struct MultiSubscriptionMap<V> {
    trie: SubscriptionTrie<Vec<V>>,
}

impl<V> Default for MultiSubscriptionMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> MultiSubscriptionMap<V> {
    pub fn new() -> Self {
        Self { trie: SubscriptionTrie::new() }
    }

    pub fn size(&self) -> usize {
        self.trie.size()
    }

    pub fn insert(&mut self, filter: &str, value: V) -> Result<(), RoutingError> {
        let tokens = tokenize(filter);
        SubscriptionTrie::<Vec<V>>::validate(filter, &tokens)?;
        let key = self.trie.create_path(&tokens);
        self.trie.nodes.get_mut(&key).expect("just created").payload.push(value);
        Ok(())
    }

    /// Removes the first element equal to `value`. Returns whether anything was removed.
    pub fn remove(&mut self, filter: &str, value: &V) -> bool {
        let tokens = tokenize(filter);
        let Some(path) = self.trie.find_path(&tokens) else { return false };
        let key = path.last().expect("non-empty token list").clone();
        let Some(node) = self.trie.nodes.get_mut(&key) else { return false };
        let Some(pos) = node.payload.iter().position(|v| v == value) else { return false };
        node.payload.remove(pos);
        self.trie.remove_path(&tokens)
    }

    pub fn find<F: FnMut(&V)>(&self, topic: &str, mut callback: F) {
        self.trie.find_match(topic, |payload| {
            for v in payload {
                callback(v);
            }
        });
    }
}
