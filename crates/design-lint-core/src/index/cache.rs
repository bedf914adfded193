//! Per-type object caches and the node pointer map.

use super::node::{Node, NodeClass, NodeKey};
use std::collections::HashMap;

/// Nodes grouped by discriminator, each bucket in first-seen tree order.
///
/// Two synthetic buckets aggregate across types: every node with a frame
/// ([`ObjectCache::layers`]) and every node with a child list
/// ([`ObjectCache::groups`]).
#[derive(Debug, Default)]
pub struct ObjectCache<'a> {
    by_tag: HashMap<&'a str, Vec<Node<'a>>>,
    any_layer: Vec<Node<'a>>,
    any_group: Vec<Node<'a>>,
    len: usize,
}

impl<'a> ObjectCache<'a> {
    pub(crate) fn insert(&mut self, node: Node<'a>) {
        self.by_tag.entry(node.tag()).or_default().push(node);
        if node.is_layer() {
            self.any_layer.push(node);
        }
        if node.is_group() {
            self.any_group.push(node);
        }
        self.len += 1;
    }

    /// Nodes of a known class.
    #[must_use]
    pub fn of(&self, class: NodeClass) -> &[Node<'a>] {
        self.of_tag(class.tag())
    }

    /// Nodes with the given raw discriminator tag.
    #[must_use]
    pub fn of_tag(&self, tag: &str) -> &[Node<'a>] {
        self.by_tag.get(tag).map_or(&[][..], Vec::as_slice)
    }

    /// Every node with a bounding frame.
    #[must_use]
    pub fn layers(&self) -> &[Node<'a>] {
        &self.any_layer
    }

    /// Every node with a child list.
    #[must_use]
    pub fn groups(&self) -> &[Node<'a>] {
        &self.any_group
    }

    /// Discriminator tags present in this cache.
    pub fn tags(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.by_tag.keys().copied()
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no node was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when this exact node is cached here.
    #[must_use]
    pub fn contains(&self, node: Node<'_>) -> bool {
        self.of_tag(node.tag())
            .iter()
            .any(|n| n.key() == node.key())
    }
}

/// Canonical pointer of every indexed node, keyed by node identity.
#[derive(Debug, Default)]
pub struct PointerMap {
    pointers: HashMap<NodeKey, String>,
}

impl PointerMap {
    pub(crate) fn insert(&mut self, node: Node<'_>, pointer: String) {
        self.pointers.insert(node.key(), pointer);
    }

    /// The pointer of a node, if it was indexed.
    #[must_use]
    pub fn get(&self, node: Node<'_>) -> Option<&str> {
        self.pointers.get(&node.key()).map(String::as_str)
    }

    /// Number of pointers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    /// True when no pointer was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_buckets_and_aggregates() {
        let values = [
            json!({"_class": "page", "frame": {}, "layers": []}),
            json!({"_class": "oval", "frame": {}}),
            json!({"_class": "oval", "frame": {}}),
            json!({"_class": "color"}),
        ];
        let mut cache = ObjectCache::default();
        for value in &values {
            cache.insert(Node::from_value(value).unwrap());
        }

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.of(NodeClass::Oval).len(), 2);
        assert_eq!(cache.of(NodeClass::Page).len(), 1);
        assert_eq!(cache.layers().len(), 3);
        assert_eq!(cache.groups().len(), 1);
        assert!(cache.of(NodeClass::Text).is_empty());
        assert!(cache.contains(Node::from_value(&values[3]).unwrap()));
    }

    #[test]
    fn test_pointer_map_by_identity() {
        let a = json!({"_class": "oval"});
        let b = json!({"_class": "oval"});
        let mut map = PointerMap::default();
        map.insert(Node::from_value(&a).unwrap(), "/a".to_string());
        assert_eq!(map.get(Node::from_value(&a).unwrap()), Some("/a"));
        assert_eq!(map.get(Node::from_value(&b).unwrap()), None);
    }
}
