use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::ids::LessonId;

/// The set of lessons a user has completed.
///
/// Unordered and deduplicated. The engine only reads and appends; removal is
/// deliberately not part of the API. Cleanup on lesson deletion is the
/// storage collaborator's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSet {
    lessons: BTreeSet<LessonId>,
}

impl CompletionSet {
    /// An empty set, as seen by anonymous or brand-new users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_lessons(lessons: impl IntoIterator<Item = LessonId>) -> Self {
        Self {
            lessons: lessons.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, lesson: LessonId) -> bool {
        self.lessons.contains(&lesson)
    }

    /// Idempotent insert. Returns true if the lesson was newly added.
    pub fn insert(&mut self, lesson: LessonId) -> bool {
        self.lessons.insert(lesson)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LessonId> + '_ {
        self.lessons.iter().copied()
    }
}

impl FromIterator<LessonId> for CompletionSet {
    fn from_iter<T: IntoIterator<Item = LessonId>>(iter: T) -> Self {
        Self::from_lessons(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut set = CompletionSet::new();
        assert!(set.insert(LessonId::new(1)));
        assert!(!set.insert(LessonId::new(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn from_lessons_deduplicates() {
        let set = CompletionSet::from_lessons([
            LessonId::new(2),
            LessonId::new(1),
            LessonId::new(2),
        ]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(LessonId::new(1)));
        assert!(set.contains(LessonId::new(2)));
    }

    #[test]
    fn empty_set_for_new_users() {
        let set = CompletionSet::new();
        assert!(set.is_empty());
        assert!(!set.contains(LessonId::new(1)));
    }
}
