//! The annotator's secondary-entity selection.
//!
//! For each document side, the set of mention keys the annotator believes
//! co-refer with the *opposite* side's primary mention: `science` holds
//! science mentions co-referring with the news primary, `news` holds news
//! mentions co-referring with the science primary. The selection is seeded
//! from the task's related "yes" answers and then toggled by clicks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::mention::{DocumentSide, MentionKey};
use crate::task::Task;

/// Secondary mentions per side, keyed by canonical mention key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryEntitySelection {
    /// News mentions co-referring with the science primary.
    #[serde(default)]
    pub news: BTreeSet<MentionKey>,
    /// Science mentions co-referring with the news primary.
    #[serde(default)]
    pub science: BTreeSet<MentionKey>,
}

impl SecondaryEntitySelection {
    /// Empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a selection from the task's related answers.
    ///
    /// Every related "yes" that shares one primary mention contributes its
    /// other mention to that side's set.
    #[must_use]
    pub fn seeded(task: &Task) -> Self {
        let mut selection = Self::new();
        for related in task.related_answers.iter().filter(|r| r.answer.is_yes()) {
            let (news, sci) = related.pair();
            if task.is_primary_pair(news, sci) {
                continue;
            }
            if task.news_ent.as_ref() == Some(news) {
                selection.science.insert(sci.clone());
            } else if task.sci_ent.as_ref() == Some(sci) {
                selection.news.insert(news.clone());
            }
        }
        log::debug!(
            "seeded selection for task {}: {} news, {} science",
            task.id,
            selection.news.len(),
            selection.science.len()
        );
        selection
    }

    /// Selected keys on `side`.
    #[must_use]
    pub fn get(&self, side: DocumentSide) -> &BTreeSet<MentionKey> {
        match side {
            DocumentSide::News => &self.news,
            DocumentSide::Science => &self.science,
        }
    }

    fn get_mut(&mut self, side: DocumentSide) -> &mut BTreeSet<MentionKey> {
        match side {
            DocumentSide::News => &mut self.news,
            DocumentSide::Science => &mut self.science,
        }
    }

    /// True when `key` is selected on `side`.
    #[must_use]
    pub fn contains(&self, side: DocumentSide, key: &MentionKey) -> bool {
        self.get(side).contains(key)
    }

    /// Add `key` on `side`. Returns false if it was already selected.
    pub fn insert(&mut self, side: DocumentSide, key: MentionKey) -> bool {
        self.get_mut(side).insert(key)
    }

    /// Remove `key` from `side`. Returns false if it was not selected.
    pub fn remove(&mut self, side: DocumentSide, key: &MentionKey) -> bool {
        self.get_mut(side).remove(key)
    }

    /// Flip membership of a clicked mention; returns the new membership.
    ///
    /// The task's own primary on that side cannot be a secondary and is ignored.
    pub fn toggle(&mut self, task: &Task, side: DocumentSide, key: &MentionKey) -> bool {
        if task.primary(side) == Some(key) {
            log::debug!("ignoring toggle of primary mention {key}");
            return false;
        }
        let set = self.get_mut(side);
        if set.remove(key) {
            false
        } else {
            set.insert(key.clone());
            true
        }
    }

    /// Total number of selected mentions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.news.len() + self.science.len()
    }

    /// True when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.news.is_empty() && self.science.is_empty()
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.news.clear();
        self.science.clear();
    }
}
