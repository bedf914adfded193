//! Single-pass indexing of the document tree.

use super::cache::{ObjectCache, PointerMap};
use super::node::{Node, NodeClass};
use crate::cancellation::CancellationToken;
use crate::context::DocumentFile;
use crate::utils::pointer;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

/// Fields holding library-sourced assets. Everything below them is foreign.
pub const FOREIGN_CONTEXT_FIELDS: &[&str] = &[
    "foreignLayerStyles",
    "foreignSymbols",
    "foreignTextStyles",
    "foreignSwatches",
];

/// Root keys carrying metadata outside the drawing hierarchy.
pub const NON_TREE_ROOT_KEYS: &[&str] = &["meta", "user", "workspace"];

/// Indices built from one traversal.
#[derive(Debug, Default)]
pub struct TreeIndex<'a> {
    /// Natively authored nodes.
    pub local: ObjectCache<'a>,
    /// Nodes below a foreign-context field.
    pub foreign: ObjectCache<'a>,
    /// Pointer of every indexed node.
    pub pointers: PointerMap,
    /// Ids of every indexed node, local and foreign.
    pub object_ids: HashSet<&'a str>,
    /// False when cancellation cut the walk short.
    pub complete: bool,
}

struct Pending<'a> {
    value: &'a Value,
    pointer: String,
    foreign: bool,
}

/// Traverses a tree, indexing every class object.
///
/// Objects descend by key and arrays by index, in document order. Once the
/// walk enters one of [`FOREIGN_CONTEXT_FIELDS`] it stays foreign for the
/// whole subtree. The cancellation flag is checked before every step; a
/// cancelled walk returns what was indexed so far with `complete` unset.
#[must_use]
pub fn traverse<'a>(root: &'a Value, cancel: &CancellationToken) -> TreeIndex<'a> {
    let mut index = TreeIndex::default();
    let mut stack = vec![Pending {
        value: root,
        pointer: pointer::ROOT.to_string(),
        foreign: false,
    }];

    while let Some(Pending {
        value,
        pointer: at,
        foreign,
    }) = stack.pop()
    {
        if cancel.is_cancelled() {
            debug!("Traversal cancelled at {at:?}");
            return index;
        }

        match value {
            Value::Object(fields) => {
                let node = Node::from_value(value);
                if let Some(node) = node {
                    if let Some(id) = node.id() {
                        index.object_ids.insert(id);
                    }
                    if foreign {
                        index.foreign.insert(node);
                    } else {
                        index.local.insert(node);
                    }
                }

                let is_root = at.is_empty();
                // Reverse push keeps pre-order on pop.
                for (key, child) in fields.iter().rev() {
                    let skipped = is_root && NON_TREE_ROOT_KEYS.contains(&key.as_str());
                    if skipped || !is_container(child) {
                        continue;
                    }
                    stack.push(Pending {
                        value: child,
                        pointer: pointer::child(&at, key),
                        foreign: foreign || FOREIGN_CONTEXT_FIELDS.contains(&key.as_str()),
                    });
                }

                if let Some(node) = node {
                    index.pointers.insert(node, at);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate().rev() {
                    if is_container(child) {
                        stack.push(Pending {
                            value: child,
                            pointer: pointer::child_index(&at, i),
                            foreign,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    index.complete = true;
    index
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Indexing statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexProfile {
    /// Number of indexed nodes.
    pub object_count: usize,
    /// Time spent indexing, in milliseconds.
    pub elapsed_ms: f64,
}

/// A document together with every index built over it.
///
/// Immutable once built; rules only ever read from it.
#[derive(Debug)]
pub struct ProcessedFile<'a> {
    /// The source document.
    pub file: &'a DocumentFile,
    /// Natively authored nodes.
    pub objects: ObjectCache<'a>,
    /// Library-sourced nodes.
    pub foreign_objects: ObjectCache<'a>,
    /// Pointer of every indexed node.
    pub pointers: PointerMap,
    /// Ids of every indexed node.
    pub object_ids: HashSet<&'a str>,
    /// False when indexing was cancelled, leaving the indices partial.
    pub complete: bool,
    /// Indexing statistics.
    pub profile: IndexProfile,
}

impl<'a> ProcessedFile<'a> {
    /// Indexes a document.
    #[must_use]
    pub fn new(file: &'a DocumentFile, cancel: &CancellationToken) -> Self {
        let start = Instant::now();
        let TreeIndex {
            local,
            foreign,
            pointers,
            object_ids,
            complete,
        } = traverse(&file.contents, cancel);
        let profile = IndexProfile {
            object_count: local.len() + foreign.len(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        debug!(
            "Indexed {} objects ({} foreign) in {:.2}ms",
            profile.object_count,
            foreign.len(),
            profile.elapsed_ms
        );

        Self {
            file,
            objects: local,
            foreign_objects: foreign,
            pointers,
            object_ids,
            complete,
            profile,
        }
    }

    /// The document root.
    #[must_use]
    pub fn root(&self) -> &'a Value {
        &self.file.contents
    }

    /// Local page nodes.
    #[must_use]
    pub fn pages(&self) -> &[Node<'a>] {
        self.objects.of(NodeClass::Page)
    }
}
