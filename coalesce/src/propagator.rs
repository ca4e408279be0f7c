//! Consistency propagation for a yes/no judgment.
//!
//! Answering one (news, science) pair says something about every other pair
//! that shares one of its mentions. Given the task, the annotator's secondary
//! selection and the answer, [`CoreferencePropagator::plan_submission`]
//! computes the writes that keep all of those judgments consistent, plus the
//! fetch that should follow. Nothing here performs I/O.

use std::collections::BTreeMap;

use cdcr_core::{Answer, DocumentSide, Error, MentionKey, Result, SecondaryEntitySelection, Task};
use serde::{Deserialize, Serialize};

// ============================================================================
// Write plans
// ============================================================================

/// Whether a judgment is created or amended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMethod {
    /// New judgment.
    Create,
    /// Amend an existing judgment.
    Update,
}

/// Registration of a mention that has no counterpart on the other side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingletonRequest {
    /// News document id.
    pub news_article_id: u64,
    /// Science document id.
    pub sci_paper_id: u64,
    /// News mention; empty when the news side has none.
    pub news_ent: MentionKey,
    /// Science mention; empty when the science side has none.
    pub sci_ent: MentionKey,
    /// The answer given.
    pub answer: Answer,
}

/// One judgment written against the task's own resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleWrite {
    /// Create or amend.
    pub method: WriteMethod,
    /// Task the judgment belongs to.
    pub task_id: u64,
    /// News mention.
    pub news_ent: MentionKey,
    /// Science mention.
    pub sci_ent: MentionKey,
    /// The answer given.
    pub answer: Answer,
}

/// One judgment inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    /// News mention.
    pub news_ent: MentionKey,
    /// Science mention.
    pub sci_ent: MentionKey,
    /// Answer to record.
    pub answer: Answer,
    /// Create or amend.
    pub op: WriteMethod,
    /// Task of the judgment being amended, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
}

impl BatchItem {
    /// The `(news, science)` pair this item writes.
    #[must_use]
    pub fn pair(&self) -> (&MentionKey, &MentionKey) {
        (&self.news_ent, &self.sci_ent)
    }
}

/// Several judgments written together for one document pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchWrite {
    /// News document id.
    pub news_article_id: u64,
    /// Science document id.
    pub sci_paper_id: u64,
    /// Judgments, with the submitted pair last.
    pub items: Vec<BatchItem>,
}

impl BatchWrite {
    /// Item for `(news, sci)`, if present.
    #[must_use]
    pub fn item(&self, news: &MentionKey, sci: &MentionKey) -> Option<&BatchItem> {
        self.items
            .iter()
            .find(|item| &item.news_ent == news && &item.sci_ent == sci)
    }
}

/// What must be written to submit an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WritePlan {
    /// One side has no mention; no propagation.
    Singleton(SingletonRequest),
    /// Just the submitted pair.
    Single(SingleWrite),
    /// The submitted pair plus every judgment it affects.
    Batch(BatchWrite),
}

impl WritePlan {
    /// Short name of the plan kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Singleton(_) => "singleton",
            Self::Single(_) => "single",
            Self::Batch(_) => "batch",
        }
    }

    /// Number of judgments written.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Singleton(_) | Self::Single(_) => 1,
            Self::Batch(batch) => batch.items.len(),
        }
    }

    /// Always false; every plan writes at least the submitted pair.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Which task to load once a plan has been executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum TaskFetch {
    /// Let the server pick the next question.
    Next,
    /// The same task again, by its stable hash.
    Hash {
        /// Task hash.
        hash: String,
    },
    /// A specific pair of mentions in a specific document pair.
    Pair {
        /// News document id.
        news_article_id: u64,
        /// Science document id.
        sci_paper_id: u64,
        /// News mention.
        news_ent: MentionKey,
        /// Science mention.
        sci_ent: MentionKey,
    },
}

impl TaskFetch {
    /// Fetch a task by hash.
    #[must_use]
    pub fn by_hash(hash: impl Into<String>) -> Self {
        Self::Hash { hash: hash.into() }
    }

    /// Fetch the pair `(news_ent, sci_ent)` of the task's documents.
    #[must_use]
    pub fn by_pair(task: &Task, news_ent: MentionKey, sci_ent: MentionKey) -> Self {
        Self::Pair {
            news_article_id: task.news_article_id,
            sci_paper_id: task.sci_paper_id,
            news_ent,
            sci_ent,
        }
    }
}

/// A write plan and the fetch that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPlan {
    /// Writes to perform.
    pub write: WritePlan,
    /// Task to load afterwards.
    pub refresh: TaskFetch,
}

// ============================================================================
// Propagator
// ============================================================================

/// Computes consistent write plans for yes/no answers.
#[derive(Debug, Clone)]
pub struct CoreferencePropagator {
    strict_selection: bool,
}

impl Default for CoreferencePropagator {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreferencePropagator {
    /// Create a propagator that accepts any selected key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strict_selection: false,
        }
    }

    /// Whether selected keys must be mentions of their document.
    ///
    /// Off by default: seeded selections may carry keys of mentions that
    /// were since moved or resized.
    #[must_use]
    pub fn with_strict_selection(mut self, strict: bool) -> Self {
        self.strict_selection = strict;
        self
    }

    /// Plan the submission of `answer` for the task's primary pair.
    ///
    /// # Algorithm
    ///
    /// 1. If either primary is absent the task is a singleton: no
    ///    propagation, whatever the selection holds.
    /// 2. Related answers sharing one primary are flipped when they disagree
    ///    with the selection: a "yes" whose other mention is no longer
    ///    selected becomes "no", a "no" whose other mention is now selected
    ///    becomes "yes".
    /// 3. Every co-referring combination of selected and primary mentions
    ///    that has no judgment yet gets a "yes". For a "no" answer this is
    ///    deliberately narrower than the full cross product: only the
    ///    combinations through a primary are linked, since the two
    ///    secondary sets then denote different things.
    /// 4. Anything scheduled makes the plan a batch ending with the
    ///    submitted pair; otherwise it is a single create or update.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedTask`] when a primary key is present but does not
    /// parse; [`Error::InvalidInput`] when strict and the selection names a
    /// key that is not a mention of its document.
    pub fn plan_submission(
        &self,
        task: &Task,
        selection: &SecondaryEntitySelection,
        answer: Answer,
        want_next: bool,
    ) -> Result<SubmissionPlan> {
        let refresh = if want_next {
            TaskFetch::Next
        } else {
            TaskFetch::by_hash(task.hash.clone())
        };
        let write = self.plan_write(task, selection, answer)?;
        log::debug!(
            "task {}: {} plan with {} write(s), answer {}",
            task.id,
            write.kind(),
            write.len(),
            answer
        );
        Ok(SubmissionPlan { write, refresh })
    }

    fn plan_write(
        &self,
        task: &Task,
        selection: &SecondaryEntitySelection,
        answer: Answer,
    ) -> Result<WritePlan> {
        let (news_primary, sci_primary) = match (&task.news_ent, &task.sci_ent) {
            (Some(news), Some(sci)) => (news, sci),
            (news, sci) => {
                return Ok(WritePlan::Singleton(SingletonRequest {
                    news_article_id: task.news_article_id,
                    sci_paper_id: task.sci_paper_id,
                    news_ent: news.clone().unwrap_or_default(),
                    sci_ent: sci.clone().unwrap_or_default(),
                    answer,
                }))
            }
        };

        for key in [news_primary, sci_primary] {
            key.parts().map_err(|e| {
                Error::malformed_task(format!("task {} primary {key:?}: {e}", task.id))
            })?;
        }
        if self.strict_selection {
            check_selection(task, selection)?;
        }

        let mut scheduled: BTreeMap<(MentionKey, MentionKey), BatchItem> = BTreeMap::new();
        schedule_flips(task, selection, news_primary, sci_primary, &mut scheduled);
        schedule_closure(task, selection, answer, news_primary, sci_primary, &mut scheduled);

        let method = if task.is_amending() {
            WriteMethod::Update
        } else {
            WriteMethod::Create
        };

        if scheduled.is_empty() {
            return Ok(WritePlan::Single(SingleWrite {
                method,
                task_id: task.id,
                news_ent: news_primary.clone(),
                sci_ent: sci_primary.clone(),
                answer,
            }));
        }

        let mut items: Vec<BatchItem> = scheduled.into_values().collect();
        items.push(BatchItem {
            news_ent: news_primary.clone(),
            sci_ent: sci_primary.clone(),
            answer,
            op: method,
            task_id: Some(task.id),
        });
        Ok(WritePlan::Batch(BatchWrite {
            news_article_id: task.news_article_id,
            sci_paper_id: task.sci_paper_id,
            items,
        }))
    }
}

fn check_selection(task: &Task, selection: &SecondaryEntitySelection) -> Result<()> {
    for side in [DocumentSide::News, DocumentSide::Science] {
        let known = task.mentions(side);
        if let Some(unknown) = selection.get(side).iter().find(|k| !known.contains(k)) {
            return Err(Error::invalid_input(format!(
                "selected {side} mention {unknown} is not a mention of task {}",
                task.id
            )));
        }
    }
    Ok(())
}

/// Step 2: flip related answers on either primary axis that disagree with the selection.
fn schedule_flips(
    task: &Task,
    selection: &SecondaryEntitySelection,
    news_primary: &MentionKey,
    sci_primary: &MentionKey,
    scheduled: &mut BTreeMap<(MentionKey, MentionKey), BatchItem>,
) {
    for related in &task.related_answers {
        let (news, sci) = related.pair();
        if task.is_primary_pair(news, sci) {
            continue;
        }
        let wanted = if news == news_primary {
            Answer::from_selected(selection.contains(DocumentSide::Science, sci))
        } else if sci == sci_primary {
            Answer::from_selected(selection.contains(DocumentSide::News, news))
        } else {
            continue;
        };
        if wanted == related.answer {
            continue;
        }
        scheduled
            .entry((news.clone(), sci.clone()))
            .or_insert_with(|| BatchItem {
                news_ent: news.clone(),
                sci_ent: sci.clone(),
                answer: wanted,
                op: WriteMethod::Update,
                task_id: related.task_id,
            });
    }
}

/// Step 3: link every co-referring combination that has no judgment yet.
fn schedule_closure(
    task: &Task,
    selection: &SecondaryEntitySelection,
    answer: Answer,
    news_primary: &MentionKey,
    sci_primary: &MentionKey,
    scheduled: &mut BTreeMap<(MentionKey, MentionKey), BatchItem>,
) {
    let news_side: Vec<&MentionKey> = std::iter::once(news_primary)
        .chain(selection.news.iter())
        .collect();
    let sci_side: Vec<&MentionKey> = std::iter::once(sci_primary)
        .chain(selection.science.iter())
        .collect();

    for &news in &news_side {
        for &sci in &sci_side {
            if task.is_primary_pair(news, sci) {
                continue;
            }
            if !answer.is_yes() && news != news_primary && sci != sci_primary {
                continue;
            }
            let judged = task
                .related_answers
                .iter()
                .any(|r| &r.news_ent == news && &r.sci_ent == sci);
            if judged {
                continue;
            }
            scheduled
                .entry((news.clone(), sci.clone()))
                .or_insert_with(|| BatchItem {
                    news_ent: news.clone(),
                    sci_ent: sci.clone(),
                    answer: Answer::Yes,
                    op: WriteMethod::Create,
                    task_id: None,
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdcr_core::{RelatedAnswer, UserAnswer};

    fn key(label: &str, start: usize, end: usize) -> MentionKey {
        MentionKey::new(label, start, end)
    }

    /// News "A B" has mentions A and B; science "C D E" has C, D and E.
    fn task() -> Task {
        Task {
            id: 11,
            hash: "h11".into(),
            news_ent: Some(key("A", 0, 1)),
            sci_ent: Some(key("C", 0, 1)),
            news_article_id: 100,
            sci_paper_id: 200,
            news_text: "A B".into(),
            sci_text: "C D E".into(),
            news_url: String::new(),
            sci_url: String::new(),
            news_ents: vec![key("A", 0, 1), key("B", 2, 3)],
            sci_ents: vec![key("C", 0, 1), key("D", 2, 3), key("E", 4, 5)],
            similarity: None,
            is_iaa: false,
            is_bad: false,
            is_bad_reason: None,
            current_user_answer: None,
            related_answers: Vec::new(),
        }
    }

    fn related(news: MentionKey, sci: MentionKey, answer: Answer, task_id: u64) -> RelatedAnswer {
        RelatedAnswer {
            task_id: Some(task_id),
            news_ent: news,
            sci_ent: sci,
            answer,
            user_id: Some(1),
        }
    }

    fn batch(plan: &SubmissionPlan) -> &BatchWrite {
        match &plan.write {
            WritePlan::Batch(batch) => batch,
            other => panic!("expected batch, got {other:?}"),
        }
    }

    #[test]
    fn nothing_related_is_single_create() {
        let plan = CoreferencePropagator::new()
            .plan_submission(&task(), &SecondaryEntitySelection::new(), Answer::Yes, false)
            .unwrap();
        assert_eq!(
            plan.write,
            WritePlan::Single(SingleWrite {
                method: WriteMethod::Create,
                task_id: 11,
                news_ent: key("A", 0, 1),
                sci_ent: key("C", 0, 1),
                answer: Answer::Yes,
            })
        );
        assert_eq!(plan.refresh, TaskFetch::by_hash("h11"));
    }

    #[test]
    fn amending_is_single_update() {
        let mut task = task();
        task.current_user_answer = Some(UserAnswer {
            answer: Answer::No,
            created_at: None,
        });
        let plan = CoreferencePropagator::new()
            .plan_submission(&task, &SecondaryEntitySelection::new(), Answer::Yes, true)
            .unwrap();
        match plan.write {
            WritePlan::Single(single) => assert_eq!(single.method, WriteMethod::Update),
            other => panic!("expected single, got {other:?}"),
        }
        assert_eq!(plan.refresh, TaskFetch::Next);
    }

    #[test]
    fn deselected_yes_is_flipped_to_no() {
        let mut task = task();
        task.related_answers = vec![related(key("A", 0, 1), key("D", 2, 3), Answer::Yes, 12)];
        let plan = CoreferencePropagator::new()
            .plan_submission(&task, &SecondaryEntitySelection::new(), Answer::Yes, false)
            .unwrap();
        let batch = batch(&plan);
        assert_eq!((batch.news_article_id, batch.sci_paper_id), (100, 200));
        assert_eq!(batch.items.len(), 2);

        let flip = batch.item(&key("A", 0, 1), &key("D", 2, 3)).unwrap();
        assert_eq!(flip.answer, Answer::No);
        assert_eq!(flip.op, WriteMethod::Update);
        assert_eq!(flip.task_id, Some(12));

        let own = batch.items.last().unwrap();
        assert_eq!(own.pair(), (&key("A", 0, 1), &key("C", 0, 1)));
        assert_eq!(own.answer, Answer::Yes);
        assert_eq!(own.op, WriteMethod::Create);
    }

    #[test]
    fn selected_science_mention_is_linked() {
        let mut selection = SecondaryEntitySelection::new();
        selection.insert(DocumentSide::Science, key("D", 2, 3));
        let plan = CoreferencePropagator::new()
            .plan_submission(&task(), &selection, Answer::Yes, false)
            .unwrap();
        let batch = batch(&plan);
        let link = batch.item(&key("A", 0, 1), &key("D", 2, 3)).unwrap();
        assert_eq!(link.answer, Answer::Yes);
        assert_eq!(link.op, WriteMethod::Create);
        assert!(batch.item(&key("A", 0, 1), &key("C", 0, 1)).is_some());
        assert_eq!(batch.items.len(), 2);
    }

    #[test]
    fn reselected_no_is_flipped_to_yes() {
        let mut task = task();
        task.related_answers = vec![related(key("B", 2, 3), key("C", 0, 1), Answer::No, 13)];
        let mut selection = SecondaryEntitySelection::new();
        selection.insert(DocumentSide::News, key("B", 2, 3));
        let plan = CoreferencePropagator::new()
            .plan_submission(&task, &selection, Answer::Yes, false)
            .unwrap();
        let flip = batch(&plan).item(&key("B", 2, 3), &key("C", 0, 1)).unwrap().clone();
        assert_eq!(flip.answer, Answer::Yes);
        assert_eq!(flip.op, WriteMethod::Update);
    }

    #[test]
    fn consistent_related_answers_leave_single() {
        let mut task = task();
        task.related_answers = vec![
            related(key("A", 0, 1), key("D", 2, 3), Answer::Yes, 12),
            related(key("A", 0, 1), key("E", 4, 5), Answer::No, 14),
            related(key("A", 0, 1), key("C", 0, 1), Answer::No, 11),
        ];
        let selection = SecondaryEntitySelection::seeded(&task);
        let plan = CoreferencePropagator::new()
            .plan_submission(&task, &selection, Answer::Yes, false)
            .unwrap();
        assert_eq!(plan.write.kind(), "single");
    }

    #[test]
    fn yes_links_secondaries_to_each_other() {
        let mut selection = SecondaryEntitySelection::new();
        selection.insert(DocumentSide::News, key("B", 2, 3));
        selection.insert(DocumentSide::Science, key("D", 2, 3));
        selection.insert(DocumentSide::Science, key("E", 4, 5));
        let plan = CoreferencePropagator::new()
            .plan_submission(&task(), &selection, Answer::Yes, false)
            .unwrap();
        let batch = batch(&plan);
        // (2 x 3) minus the primary pair, plus the primary pair itself.
        assert_eq!(batch.items.len(), 6);
        assert!(batch.item(&key("B", 2, 3), &key("E", 4, 5)).is_some());
    }

    #[test]
    fn no_links_only_through_primaries() {
        let mut selection = SecondaryEntitySelection::new();
        selection.insert(DocumentSide::News, key("B", 2, 3));
        selection.insert(DocumentSide::Science, key("D", 2, 3));
        let plan = CoreferencePropagator::new()
            .plan_submission(&task(), &selection, Answer::No, false)
            .unwrap();
        let batch = batch(&plan);
        assert!(batch.item(&key("A", 0, 1), &key("D", 2, 3)).is_some());
        assert!(batch.item(&key("B", 2, 3), &key("C", 0, 1)).is_some());
        assert!(batch.item(&key("B", 2, 3), &key("D", 2, 3)).is_none());
        assert_eq!(batch.items.last().unwrap().answer, Answer::No);
    }

    #[test]
    fn singleton_skips_propagation() {
        let mut task = task();
        task.sci_ent = None;
        task.related_answers = vec![related(key("A", 0, 1), key("D", 2, 3), Answer::Yes, 12)];
        let mut selection = SecondaryEntitySelection::new();
        selection.insert(DocumentSide::Science, key("E", 4, 5));
        let plan = CoreferencePropagator::new()
            .plan_submission(&task, &selection, Answer::Yes, false)
            .unwrap();
        match plan.write {
            WritePlan::Singleton(request) => {
                assert_eq!(request.news_ent, key("A", 0, 1));
                assert!(request.sci_ent.is_empty());
                assert_eq!(request.sci_paper_id, 200);
            }
            other => panic!("expected singleton, got {other:?}"),
        }
    }

    #[test]
    fn missing_both_primaries_is_singleton() {
        let mut task = task();
        task.news_ent = None;
        task.sci_ent = None;
        let mut selection = SecondaryEntitySelection::new();
        selection.insert(DocumentSide::Science, key("D", 2, 3));
        let plan = CoreferencePropagator::new()
            .plan_submission(&task, &selection, Answer::Yes, false)
            .unwrap();
        match plan.write {
            WritePlan::Singleton(request) => {
                assert!(request.news_ent.is_empty());
                assert!(request.sci_ent.is_empty());
                assert_eq!(request.news_article_id, 100);
                assert_eq!(request.answer, Answer::Yes);
            }
            other => panic!("expected singleton, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_primary_is_rejected() {
        let mut task = task();
        task.sci_ent = Some(MentionKey::from_raw("C"));
        let err = CoreferencePropagator::new()
            .plan_submission(&task, &SecondaryEntitySelection::new(), Answer::No, false)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedTask(_)));
    }

    #[test]
    fn unknown_selected_mention() {
        let mut selection = SecondaryEntitySelection::new();
        selection.insert(DocumentSide::Science, key("Z", 9, 10));
        let plan = CoreferencePropagator::new()
            .plan_submission(&task(), &selection, Answer::Yes, false)
            .unwrap();
        assert_eq!(plan.write.len(), 2);

        let strict = CoreferencePropagator::new().with_strict_selection(true);
        assert!(matches!(
            strict.plan_submission(&task(), &selection, Answer::Yes, false),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn plan_serializes_with_kind_tag() {
        let mut selection = SecondaryEntitySelection::new();
        selection.insert(DocumentSide::Science, key("D", 2, 3));
        let plan = CoreferencePropagator::new()
            .plan_submission(&task(), &selection, Answer::Yes, true)
            .unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["write"]["kind"], "batch");
        assert_eq!(json["write"]["items"][0]["news_ent"], "A;0;1");
        assert_eq!(json["write"]["items"][0]["op"], "create");
        assert_eq!(json["refresh"]["by"], "next");

        let back: SubmissionPlan = serde_json::from_value(json).unwrap();
        assert_eq!(back, plan);
    }
}
