//! Segment trie implementation
//!
//! Provides [`PathTrie`], a map from delimiter-separated paths to payloads.

use std::collections::BTreeMap;

/// Instruction returned by a [`PathTrie::traverse`] callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalOperation {
    /// Keep the node and descend into its children
    #[default]
    Continue,

    /// Keep the node but skip its children
    Stop,

    /// Detach the node together with everything beneath it
    Remove,
}

/// A single node of a [`PathTrie`]
///
/// Nodes without a payload exist only to connect deeper entries. Such a node
/// is pruned as soon as it has no children left.
#[derive(Debug, Clone)]
pub struct TrieNode<T> {
    segment: String,
    children: BTreeMap<String, TrieNode<T>>,
    data: Option<T>,
}

impl<T> TrieNode<T> {
    fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            children: BTreeMap::new(),
            data: None,
        }
    }

    /// Path segment this node represents (empty for the root)
    #[inline]
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Payload stored at this node
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Direct child by segment
    #[inline]
    #[must_use]
    pub fn child(&self, segment: &str) -> Option<&TrieNode<T>> {
        self.children.get(segment)
    }

    /// Direct children in segment order
    pub fn children(&self) -> impl Iterator<Item = &TrieNode<T>> {
        self.children.values()
    }

    /// Number of direct children
    #[inline]
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// True when the node carries neither payload nor children
    #[inline]
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.data.is_none() && self.children.is_empty()
    }

    fn payload_count(&self) -> usize {
        usize::from(self.data.is_some())
            + self
                .children
                .values()
                .map(TrieNode::payload_count)
                .sum::<usize>()
    }

    fn remove_at(&mut self, segments: &[&str]) -> Option<Option<T>> {
        let (head, rest) = segments.split_first()?;

        if rest.is_empty() {
            return self.children.remove(*head).map(|mut node| node.data.take());
        }

        let child = self.children.get_mut(*head)?;
        let removed = child.remove_at(rest);
        if child.is_vacant() {
            self.children.remove(*head);
        }
        removed
    }

    fn visit<F>(&mut self, f: &mut F) -> TraversalOperation
    where
        F: FnMut(&mut T) -> TraversalOperation,
    {
        let op = match self.data.as_mut() {
            Some(data) => f(data),
            None => TraversalOperation::Continue,
        };

        if op == TraversalOperation::Continue {
            self.children.retain(|_, child| {
                let child_op = child.visit(f);
                child_op != TraversalOperation::Remove && !child.is_vacant()
            });
        }

        op
    }

    fn collect_entries<'a>(&'a self, prefix: &str, delimiter: char, out: &mut Vec<(String, &'a T)>) {
        if let Some(data) = &self.data {
            out.push((prefix.to_string(), data));
        }

        for (segment, child) in &self.children {
            let path = if prefix.is_empty() {
                segment.clone()
            } else {
                format!("{prefix}{delimiter}{segment}")
            };
            child.collect_entries(&path, delimiter, out);
        }
    }
}

/// Trie keyed by delimiter-separated path segments
///
/// Empty segments are ignored, so `"a//b"`, `"/a/b"` and `"a/b"` address the
/// same node and `""` addresses the root.
///
/// # Example
///
/// ```rust
/// use e2e_trie::PathTrie;
///
/// let mut trie = PathTrie::new('/');
/// trie.insert("a/b", "first");
/// trie.insert("a/c", "second");
///
/// trie.remove("a/b");
/// assert_eq!(trie.get("a/c"), Some(&"second"));
/// assert!(trie.root().child("a").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct PathTrie<T> {
    delimiter: char,
    root: TrieNode<T>,
}

impl<T> PathTrie<T> {
    /// Create an empty trie splitting paths on `delimiter`
    #[inline]
    #[must_use]
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            root: TrieNode::new(""),
        }
    }

    /// Delimiter used to split paths
    #[inline]
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> &TrieNode<T> {
        &self.root
    }

    fn segments<'p>(&self, path: &'p str) -> Vec<&'p str> {
        path.split(self.delimiter).filter(|s| !s.is_empty()).collect()
    }

    /// Store `data` at `path`, creating intermediate nodes as needed
    ///
    /// Returns the payload previously stored at `path`, if any.
    pub fn insert(&mut self, path: &str, data: T) -> Option<T> {
        let segments = self.segments_owned(path);
        let mut node = &mut self.root;
        for segment in segments {
            node = node
                .children
                .entry(segment.clone())
                .or_insert_with(|| TrieNode::new(segment));
        }

        node.data.replace(data)
    }

    fn segments_owned(&self, path: &str) -> Vec<String> {
        self.segments(path).into_iter().map(str::to_string).collect()
    }

    fn node(&self, path: &str) -> Option<&TrieNode<T>> {
        self.segments(path)
            .into_iter()
            .try_fold(&self.root, |node, segment| node.children.get(segment))
    }

    /// Payload stored at `path`
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&T> {
        self.node(path).and_then(TrieNode::data)
    }

    /// Mutable payload stored at `path`
    pub fn get_mut(&mut self, path: &str) -> Option<&mut T> {
        let segments = self.segments_owned(path);
        let mut node = &mut self.root;
        for segment in &segments {
            node = node.children.get_mut(segment)?;
        }
        node.data.as_mut()
    }

    /// True when a payload is stored at `path`
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Node at `path`, whether or not it carries a payload
    #[inline]
    #[must_use]
    pub fn get_node(&self, path: &str) -> Option<&TrieNode<T>> {
        self.node(path)
    }

    /// Detach the node at `path` and everything beneath it
    ///
    /// Ancestors left without payload or children are pruned on the way
    /// back to the root. Removing a path that was never inserted is a no-op.
    /// Returns the payload that was stored at `path`.
    pub fn remove(&mut self, path: &str) -> Option<T> {
        let segments = self.segments(path);
        if segments.is_empty() {
            self.root.children.clear();
            return self.root.data.take();
        }

        self.root.remove_at(&segments).flatten()
    }

    /// Depth-first walk over every payload, root first, children in segment order
    ///
    /// The callback decides per node whether to descend
    /// ([`TraversalOperation::Continue`]), skip the children
    /// ([`TraversalOperation::Stop`]) or detach the node and its subtree
    /// ([`TraversalOperation::Remove`]). Payload-less nodes are always
    /// descended into and are pruned once their last child is removed.
    pub fn traverse<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T) -> TraversalOperation,
    {
        if self.root.visit(&mut f) == TraversalOperation::Remove {
            self.root.data = None;
            self.root.children.clear();
        }
    }

    /// All stored payloads with their full paths, in traversal order
    #[must_use]
    pub fn entries(&self) -> Vec<(String, &T)> {
        let mut out = Vec::new();
        self.root.collect_entries("", self.delimiter, &mut out);
        out
    }

    /// Number of stored payloads
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.payload_count()
    }

    /// True when no payload is stored anywhere
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_vacant()
    }
}

impl<T> Default for PathTrie<T> {
    fn default() -> Self {
        Self::new('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn trie_insert_and_get() {
        let mut trie = PathTrie::new('/');
        assert!(trie.insert("a/b/c", 1).is_none());

        assert_eq!(trie.get("a/b/c"), Some(&1));
        assert_eq!(trie.get("a/b"), None);
        assert_eq!(trie.get("a/b/c/d"), None);
    }

    #[test]
    fn trie_insert_overwrites() {
        let mut trie = PathTrie::new('/');
        trie.insert("a", 1);
        let previous = trie.insert("a", 2);

        assert_eq!(previous, Some(1));
        assert_eq!(trie.get("a"), Some(&2));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn trie_custom_delimiter() {
        let mut trie = PathTrie::new('.');
        trie.insert("crate.module.func", "f");

        assert_eq!(trie.get("crate.module.func"), Some(&"f"));
        assert_eq!(trie.get("crate/module/func"), None);
        assert_eq!(trie.delimiter(), '.');
    }

    #[test]
    fn trie_ignores_empty_segments() {
        let mut trie = PathTrie::new('/');
        trie.insert("/a//b/", 7);

        assert_eq!(trie.get("a/b"), Some(&7));
        assert_eq!(trie.root().child_count(), 1);
    }

    #[test]
    fn trie_root_payload() {
        let mut trie = PathTrie::new('/');
        trie.insert("", 0);
        trie.insert("a", 1);

        assert_eq!(trie.get(""), Some(&0));
        assert_eq!(trie.remove(""), Some(0));
        assert!(trie.is_empty());
    }

    #[test]
    fn trie_remove_prunes_empty_ancestors() {
        let mut trie = PathTrie::new('/');
        trie.insert("a/b/c", 1);

        assert_eq!(trie.remove("a/b/c"), Some(1));
        assert_eq!(trie.get("a/b/c"), None);
        assert_eq!(trie.get("a/b"), None);
        assert_eq!(trie.get("a"), None);
        assert!(trie.root().child("a").is_none());
    }

    #[test]
    fn trie_remove_keeps_ancestor_with_payload() {
        let mut trie = PathTrie::new('/');
        trie.insert("a", 1);
        trie.insert("a/b/c", 2);

        trie.remove("a/b/c");

        assert_eq!(trie.get("a"), Some(&1));
        assert!(trie.get_node("a/b").is_none());
    }

    #[test]
    fn trie_remove_keeps_sibling() {
        let mut trie = PathTrie::new('/');
        trie.insert("a/b", 1);
        trie.insert("a/c", 2);

        trie.remove("a/b");

        assert_eq!(trie.get("a/c"), Some(&2));
        assert!(trie.root().child("a").is_some());
    }

    #[test]
    fn trie_remove_detaches_subtree() {
        let mut trie = PathTrie::new('/');
        trie.insert("a", 1);
        trie.insert("a/b", 2);
        trie.insert("a/b/c", 3);

        assert_eq!(trie.remove("a"), Some(1));
        assert!(trie.is_empty());
    }

    #[test]
    fn trie_remove_missing_is_noop() {
        let mut trie = PathTrie::new('/');
        trie.insert("a/b", 1);

        assert_eq!(trie.remove("x/y/z"), None);
        assert_eq!(trie.remove("a/b/c"), None);
        assert_eq!(trie.get("a/b"), Some(&1));
    }

    #[test]
    fn trie_remove_structural_node_without_payload() {
        let mut trie = PathTrie::new('/');
        trie.insert("a/b/c", 1);

        assert_eq!(trie.remove("a/b"), None);
        assert!(trie.is_empty());
    }

    #[test]
    fn trie_get_mut_updates_payload() {
        let mut trie = PathTrie::new('/');
        trie.insert("a/b", 1);

        if let Some(value) = trie.get_mut("a/b") {
            *value += 10;
        }

        assert_eq!(trie.get("a/b"), Some(&11));
        assert!(trie.get_mut("a").is_none());
    }

    #[test]
    fn traverse_visits_depth_first_in_order() {
        let mut trie = PathTrie::new('/');
        trie.insert("b", "b");
        trie.insert("a/y", "a/y");
        trie.insert("a", "a");
        trie.insert("a/x", "a/x");

        let mut seen = Vec::new();
        trie.traverse(|data| {
            seen.push(*data);
            TraversalOperation::Continue
        });

        assert_eq!(seen, vec!["a", "a/x", "a/y", "b"]);
    }

    #[test]
    fn traverse_stop_skips_children_and_keeps_node() {
        let mut trie = PathTrie::new('/');
        trie.insert("a", 1);
        trie.insert("a/b", 2);
        trie.insert("c", 3);

        let mut seen = Vec::new();
        trie.traverse(|data| {
            seen.push(*data);
            TraversalOperation::Stop
        });

        assert_eq!(seen, vec![1, 3]);
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn traverse_remove_prunes_subtree_and_structural_parents() {
        let mut trie = PathTrie::new('/');
        trie.insert("acct/container", 1);
        trie.insert("acct/container/blob", 2);
        trie.insert("other/keep", 3);

        let mut seen = Vec::new();
        trie.traverse(|data| {
            seen.push(*data);
            if *data == 1 {
                TraversalOperation::Remove
            } else {
                TraversalOperation::Continue
            }
        });

        // The blob is never visited: its parent was removed first.
        assert_eq!(seen, vec![1, 3]);
        assert!(trie.root().child("acct").is_none());
        assert_eq!(trie.get("other/keep"), Some(&3));
    }

    #[test]
    fn traverse_can_mutate_payloads() {
        let mut trie = PathTrie::new('/');
        trie.insert("a", 1);
        trie.insert("a/b", 2);

        trie.traverse(|data| {
            *data *= 100;
            TraversalOperation::Continue
        });

        assert_eq!(trie.get("a"), Some(&100));
        assert_eq!(trie.get("a/b"), Some(&200));
    }

    #[test]
    fn entries_report_full_paths() {
        let mut trie = PathTrie::new('/');
        trie.insert("a/b", 1);
        trie.insert("c", 2);

        let entries = trie.entries();
        assert_eq!(entries, vec![("a/b".to_string(), &1), ("c".to_string(), &2)]);
    }
}
