//! Object indexing over the document tree.
//!
//! ```text
//! DocumentFile
//!   ↓ traverse() (one pass, cancellable)
//! TreeIndex { local, foreign, pointers, object_ids, complete }
//!   ↓
//! ProcessedFile (immutable, shared by every rule)
//! ```

pub mod cache;
pub mod node;
pub mod traverse;

pub use cache::{ObjectCache, PointerMap};
pub use node::{Node, NodeClass, NodeKey};
pub use traverse::{traverse, IndexProfile, ProcessedFile, TreeIndex};
