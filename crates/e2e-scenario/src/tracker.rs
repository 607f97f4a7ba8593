//! Created-resource tracking
//!
//! Resources a scenario provisions are recorded by canonical path so they can
//! be torn down once the scenario finishes. Deleting a parent (an account or
//! container) takes its children with it, so the walk removes the whole
//! subtree and never visits them.

use crate::error::ResourceError;
use crate::state::ResourceHandle;
use e2e_trie::{PathTrie, TraversalOperation};

/// Outcome of [`ResourceTracker::delete_all`]
#[derive(Debug, Default)]
pub struct CleanupSummary {
    /// Resources deleted successfully
    pub deleted: usize,
    /// Resources whose deletion failed
    pub errors: Vec<ResourceError>,
}

impl CleanupSummary {
    /// True when every deletion succeeded
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-scenario record of created resources
#[derive(Debug)]
pub struct ResourceTracker {
    created: PathTrie<ResourceHandle>,
}

impl ResourceTracker {
    /// Create an empty tracker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            created: PathTrie::new('/'),
        }
    }

    /// Record a resource under its canonical path
    pub fn track(&mut self, resource: ResourceHandle) {
        let canon = resource.canon();
        tracing::trace!(%canon, "tracking created resource");
        self.created.insert(&canon, resource);
    }

    /// True if a resource is tracked at `canon`
    #[inline]
    #[must_use]
    pub fn contains(&self, canon: &str) -> bool {
        self.created.contains(canon)
    }

    /// Number of tracked resources
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.created.len()
    }

    /// True if nothing is tracked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// Delete every deletable resource, parents first
    ///
    /// A deleted resource is removed together with its subtree. Resources
    /// without deletion support are skipped and their children visited. On a
    /// failed deletion the children are still attempted.
    pub fn delete_all(&mut self) -> CleanupSummary {
        let mut summary = CleanupSummary::default();

        self.created.traverse(|resource| {
            let Some(deletable) = resource.as_deletable() else {
                return TraversalOperation::Continue;
            };

            match deletable.delete() {
                Ok(()) => {
                    summary.deleted += 1;
                    TraversalOperation::Remove
                }
                Err(err) => {
                    tracing::warn!(canon = %resource.canon(), error = %err, "failed to delete resource");
                    summary.errors.push(err);
                    TraversalOperation::Continue
                }
            }
        });

        self.created = PathTrie::new('/');
        summary
    }
}

impl Default for ResourceTracker {
    fn default() -> Self {
        Self::new()
    }
}
