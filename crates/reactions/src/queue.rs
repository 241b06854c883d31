use serde::Serialize;

use crate::ReactionSpec;

/// Reactions to apply to one message, in insertion order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReactionQueue {
    entries: Vec<ReactionSpec>,
}

impl ReactionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `reaction` unless one with the same resolved name is queued.
    /// Returns whether it was added.
    pub fn push(&mut self, reaction: ReactionSpec) -> bool {
        if self.contains(&reaction) {
            return false;
        }
        self.entries.push(reaction);
        true
    }

    #[must_use]
    pub fn contains(&self, reaction: &ReactionSpec) -> bool {
        self.entries.iter().any(|r| r == reaction)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReactionSpec> {
        self.entries.iter()
    }

    /// Resolved names in order, mostly for logging.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(ReactionSpec::resolved_name).collect()
    }
}

impl IntoIterator for ReactionQueue {
    type IntoIter = std::vec::IntoIter<ReactionSpec>;
    type Item = ReactionSpec;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReactionQueue {
    type IntoIter = std::slice::Iter<'a, ReactionSpec>;
    type Item = &'a ReactionSpec;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
