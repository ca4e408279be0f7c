//! Annotation tasks: one yes/no question about a news/science mention pair.
//!
//! A [`Task`] is delivered by the annotation session, read by the core, and
//! discarded on the next fetch. It is never mutated in place: swapping the
//! question's primary mentions goes through [`ProposedPrimaries`] and
//! [`Task::with_primaries`], which builds a new task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::mention::{DocumentSide, MentionKey};
use crate::tree::SpanTree;

// ============================================================================
// Answer
// ============================================================================

/// A yes/no coreference judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    /// The two mentions refer to the same thing.
    Yes,
    /// They do not.
    No,
}

impl Answer {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
        }
    }

    /// True for [`Answer::Yes`].
    #[must_use]
    pub const fn is_yes(self) -> bool {
        matches!(self, Answer::Yes)
    }

    /// Answer implied by whether a mention is selected as co-referring.
    #[must_use]
    pub const fn from_selected(selected: bool) -> Self {
        if selected {
            Answer::Yes
        } else {
            Answer::No
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Answer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(Answer::Yes),
            "no" | "n" => Ok(Answer::No),
            other => Err(Error::invalid_input(format!(
                "answer must be yes or no, got '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Judgments
// ============================================================================

/// This annotator's earlier answer to the task's pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
    /// The recorded answer.
    pub answer: Answer,
    /// When it was recorded.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A recorded judgment on another pair in the same document pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedAnswer {
    /// Task resource of the judged pair, when the store has one.
    #[serde(default)]
    pub task_id: Option<u64>,
    /// News-side mention.
    pub news_ent: MentionKey,
    /// Science-side mention.
    pub sci_ent: MentionKey,
    /// Recorded answer.
    pub answer: Answer,
    /// Annotator who recorded it.
    #[serde(default)]
    pub user_id: Option<u64>,
}

impl RelatedAnswer {
    /// `(news, science)` keys of the judged pair.
    #[must_use]
    pub fn pair(&self) -> (&MentionKey, &MentionKey) {
        (&self.news_ent, &self.sci_ent)
    }

    /// The mention on `side`.
    #[must_use]
    pub fn mention(&self, side: DocumentSide) -> &MentionKey {
        match side {
            DocumentSide::News => &self.news_ent,
            DocumentSide::Science => &self.sci_ent,
        }
    }
}

// ============================================================================
// Task
// ============================================================================

/// One entity-pair question with everything needed to render and judge it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task resource id.
    pub id: u64,
    /// Stable hash used to re-fetch this exact pair.
    pub hash: String,
    /// Primary news mention; absent on a science-only singleton.
    #[serde(default, with = "empty_key")]
    pub news_ent: Option<MentionKey>,
    /// Primary science mention; absent on a news-only singleton.
    #[serde(default, with = "empty_key")]
    pub sci_ent: Option<MentionKey>,
    /// News article id.
    pub news_article_id: u64,
    /// Science paper id.
    pub sci_paper_id: u64,
    /// Full news text.
    pub news_text: String,
    /// Full science text.
    pub sci_text: String,
    /// News article URL.
    #[serde(default)]
    pub news_url: String,
    /// Science paper DOI or URL.
    #[serde(default)]
    pub sci_url: String,
    /// Every known mention in the news text.
    #[serde(default)]
    pub news_ents: Vec<MentionKey>,
    /// Every known mention in the science text.
    #[serde(default)]
    pub sci_ents: Vec<MentionKey>,
    /// Similarity score used to prioritise the question.
    #[serde(default)]
    pub similarity: Option<f32>,
    /// Question is part of the inter-annotator agreement set.
    #[serde(default)]
    pub is_iaa: bool,
    /// Question has been reported as bad.
    #[serde(default)]
    pub is_bad: bool,
    /// Reason given in the bad report.
    #[serde(default)]
    pub is_bad_reason: Option<String>,
    /// This annotator's prior answer when amending.
    #[serde(default)]
    pub current_user_answer: Option<UserAnswer>,
    /// Judgments on other pairs of the same document pair, by anyone.
    #[serde(default)]
    pub related_answers: Vec<RelatedAnswer>,
}

impl Task {
    /// Parse a task from the JSON the session returns.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Primary mention on `side`.
    #[must_use]
    pub fn primary(&self, side: DocumentSide) -> Option<&MentionKey> {
        match side {
            DocumentSide::News => self.news_ent.as_ref(),
            DocumentSide::Science => self.sci_ent.as_ref(),
        }
    }

    /// Document text on `side`.
    #[must_use]
    pub fn text(&self, side: DocumentSide) -> &str {
        match side {
            DocumentSide::News => &self.news_text,
            DocumentSide::Science => &self.sci_text,
        }
    }

    /// All mention keys on `side`.
    #[must_use]
    pub fn mentions(&self, side: DocumentSide) -> &[MentionKey] {
        match side {
            DocumentSide::News => &self.news_ents,
            DocumentSide::Science => &self.sci_ents,
        }
    }

    /// Document id on `side`.
    #[must_use]
    pub fn doc_id(&self, side: DocumentSide) -> u64 {
        match side {
            DocumentSide::News => self.news_article_id,
            DocumentSide::Science => self.sci_paper_id,
        }
    }

    /// Document URL on `side`.
    #[must_use]
    pub fn url(&self, side: DocumentSide) -> &str {
        match side {
            DocumentSide::News => &self.news_url,
            DocumentSide::Science => &self.sci_url,
        }
    }

    /// True when one side has no mention.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.news_ent.is_none() || self.sci_ent.is_none()
    }

    /// True when this annotator already answered the pair.
    #[must_use]
    pub fn is_amending(&self) -> bool {
        self.current_user_answer.is_some()
    }

    /// True when `(news, sci)` is the task's own primary pair.
    #[must_use]
    pub fn is_primary_pair(&self, news: &MentionKey, sci: &MentionKey) -> bool {
        self.news_ent.as_ref() == Some(news) && self.sci_ent.as_ref() == Some(sci)
    }

    /// The question shown to the annotator.
    #[must_use]
    pub fn question(&self) -> String {
        fn label(key: Option<&MentionKey>) -> &str {
            key.map_or("(nothing)", MentionKey::label)
        }
        format!(
            "Are {} and {} mentions of the same thing?",
            label(self.news_ent.as_ref()),
            label(self.sci_ent.as_ref())
        )
    }

    /// Build the span tree for one document, inserting mentions by start offset.
    pub fn span_tree(&self, side: DocumentSide) -> Result<SpanTree> {
        SpanTree::from_keys(self.text(side), self.mentions(side))
    }

    /// A new task whose primaries are replaced by any proposed ones.
    ///
    /// If the pair changes, the prior user answer no longer applies and is dropped.
    #[must_use]
    pub fn with_primaries(&self, proposed: &ProposedPrimaries) -> Task {
        let mut task = self.clone();
        if let Some(news) = proposed.get(DocumentSide::News) {
            task.news_ent = Some(news.clone());
        }
        if let Some(sci) = proposed.get(DocumentSide::Science) {
            task.sci_ent = Some(sci.clone());
        }
        if task.news_ent != self.news_ent || task.sci_ent != self.sci_ent {
            task.current_user_answer = None;
        }
        task
    }
}

/// Request to flag (or unflag) a task as a bad question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadTaskReport {
    /// Task being reported.
    pub task_id: u64,
    /// New bad flag.
    pub is_bad: bool,
    /// Why it is bad; dropped when clearing the flag.
    #[serde(default, rename = "is_bad_reason")]
    pub reason: Option<String>,
}

impl BadTaskReport {
    /// Report `task` as bad.
    #[must_use]
    pub fn new(task: &Task, reason: impl Into<String>) -> Self {
        Self {
            task_id: task.id,
            is_bad: true,
            reason: Some(reason.into()),
        }
    }

    /// Clear an earlier report.
    #[must_use]
    pub fn clear(task: &Task) -> Self {
        Self {
            task_id: task.id,
            is_bad: false,
            reason: None,
        }
    }
}

// ============================================================================
// ProposedPrimaries
// ============================================================================

/// Pending replacement primaries, held apart from the task until confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedPrimaries {
    #[serde(default)]
    news: Option<MentionKey>,
    #[serde(default)]
    science: Option<MentionKey>,
}

impl ProposedPrimaries {
    /// Nothing proposed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Propose `key` as the primary mention on `side`.
    pub fn propose(&mut self, side: DocumentSide, key: MentionKey) {
        match side {
            DocumentSide::News => self.news = Some(key),
            DocumentSide::Science => self.science = Some(key),
        }
    }

    /// Proposed primary on `side`.
    #[must_use]
    pub fn get(&self, side: DocumentSide) -> Option<&MentionKey> {
        match side {
            DocumentSide::News => self.news.as_ref(),
            DocumentSide::Science => self.science.as_ref(),
        }
    }

    /// True when nothing is proposed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.news.is_none() && self.science.is_none()
    }

    /// Drop all proposals.
    pub fn clear(&mut self) {
        self.news = None;
        self.science = None;
    }
}

/// Serde adapter mapping the store's empty key string to `None`.
mod empty_key {
    use super::MentionKey;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &Option<MentionKey>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(key.as_ref().map(MentionKey::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<MentionKey>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw
            .filter(|s| !s.trim().is_empty())
            .map(MentionKey::from_raw))
    }
}
