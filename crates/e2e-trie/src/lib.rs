//! E2E Path Trie
//!
//! Hierarchical storage keyed by delimiter-separated paths.
//!
//! # Overview
//!
//! - **PathTrie**: ordered trie where each node is one path segment
//! - **TrieNode**: read-only view of a node (segment, payload, children)
//! - **TraversalOperation**: per-node control during [`PathTrie::traverse`]
//!
//! Shared prefixes share nodes, so removing an entry costs O(depth) rather
//! than touching every stored path.
//!
//! # Example
//!
//! ```rust
//! use e2e_trie::{PathTrie, TraversalOperation};
//!
//! let mut trie = PathTrie::new('/');
//! trie.insert("container/folder/file.txt", 42u32);
//! assert_eq!(trie.get("container/folder/file.txt"), Some(&42));
//!
//! trie.remove("container/folder/file.txt");
//! assert!(trie.root().child("container").is_none());
//!
//! trie.insert("a/b", 1);
//! trie.traverse(|_| TraversalOperation::Remove);
//! assert!(trie.is_empty());
//! ```

#![warn(missing_docs)]

pub mod trie;

pub use trie::{PathTrie, TraversalOperation, TrieNode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
