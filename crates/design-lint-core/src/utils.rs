//! Utility functions shared by the engine and rule implementations.

pub mod hashing;
pub mod pointer;

#[doc(inline)]
pub use hashing::{stable_hash, structural_equal, structural_hash, style_hash, text_style_hash, Digest};
#[doc(inline)]
pub use pointer::{parent_of, resolve};
