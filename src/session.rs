//! The annotation session boundary and the driver built on it.
//!
//! [`AnnotationSession`] is everything the annotator needs from the outside
//! world: fetching tasks and executing writes. [`Annotator`] owns a session
//! together with the active task, the secondary selection and the login
//! state, and runs the submit / refresh cycle:
//!
//! ```text
//! snapshot (task, selection) -> plan -> execute -> fetch -> reseed selection
//! ```
//!
//! A plan the core rejects is never executed. An expired login drops the
//! annotator into the logged-out state before anything else is attempted.

use std::collections::VecDeque;

use cdcr_coalesce::{CoreferencePropagator, SubmissionPlan, TaskFetch, WritePlan};
use cdcr_core::{
    Answer, BadTaskReport, DocumentSide, Error, MentionEdit, MentionEditor, MentionKey,
    ProposedPrimaries, SecondaryEntitySelection, Task,
};
use chrono::{DateTime, Utc};

use crate::config::DEFAULT_STALE_AFTER_SECS;
use crate::error::{Result, SessionError};

// ============================================================================
// Session trait
// ============================================================================

/// Transport to the task and judgment store.
pub trait AnnotationSession {
    /// Load a task.
    fn fetch_task(&mut self, fetch: &TaskFetch) -> Result<Task>;

    /// Perform the writes of a plan.
    fn execute(&mut self, plan: &WritePlan) -> Result<()>;

    /// Flag or unflag a task as a bad question.
    fn report_bad(&mut self, report: &BadTaskReport) -> Result<()>;

    /// Replace a mention in a document.
    fn save_mention(&mut self, edit: &MentionEdit) -> Result<()>;
}

// ============================================================================
// Refresh policy
// ============================================================================

/// When the displayed task should be fetched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    stale_after_secs: u64,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER_SECS)
    }
}

impl RefreshPolicy {
    /// Policy treating tasks older than `stale_after_secs` as stale.
    #[must_use]
    pub fn new(stale_after_secs: u64) -> Self {
        Self { stale_after_secs }
    }

    /// Staleness threshold in seconds.
    #[must_use]
    pub fn stale_after_secs(&self) -> u64 {
        self.stale_after_secs
    }

    /// Whether to fetch.
    ///
    /// True when there is no task, when a pinned hash names a different task,
    /// or when the task was loaded more than the threshold ago; never while a
    /// fetch is in flight or an error is on display.
    #[must_use]
    pub fn needs_fetch(
        &self,
        current: Option<&Task>,
        pinned_hash: Option<&str>,
        last_updated: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        fetching: bool,
        error: bool,
    ) -> bool {
        if fetching || error {
            return false;
        }
        let Some(task) = current else {
            return true;
        };
        if pinned_hash.is_some_and(|hash| hash != task.hash) {
            return true;
        }
        let threshold = i64::try_from(self.stale_after_secs).unwrap_or(i64::MAX);
        last_updated.is_some_and(|at| now.signed_duration_since(at).num_seconds() > threshold)
    }
}

// ============================================================================
// Annotator
// ============================================================================

/// Annotation state driven over a session.
#[derive(Debug)]
pub struct Annotator<S> {
    session: S,
    propagator: CoreferencePropagator,
    task: Option<Task>,
    selection: SecondaryEntitySelection,
    proposed: ProposedPrimaries,
    logged_in: bool,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl<S: AnnotationSession> Annotator<S> {
    /// A logged-in annotator with no task loaded.
    pub fn new(session: S) -> Self {
        Self {
            session,
            propagator: CoreferencePropagator::new(),
            task: None,
            selection: SecondaryEntitySelection::new(),
            proposed: ProposedPrimaries::new(),
            logged_in: true,
            last_updated: None,
            last_error: None,
        }
    }

    /// Use a differently configured propagator.
    #[must_use]
    pub fn with_propagator(mut self, propagator: CoreferencePropagator) -> Self {
        self.propagator = propagator;
        self
    }

    /// The underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The underlying session, mutably.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Give back the session.
    pub fn into_session(self) -> S {
        self.session
    }

    /// The active task.
    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Current secondary selection.
    pub fn selection(&self) -> &SecondaryEntitySelection {
        &self.selection
    }

    /// Pending primary replacements.
    pub fn proposed(&self) -> &ProposedPrimaries {
        &self.proposed
    }

    /// Whether session calls are allowed.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// When the active task was loaded.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Message of the last failed session call, until the next successful load.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Allow session calls again after a fresh login.
    pub fn log_in(&mut self) {
        self.logged_in = true;
        self.last_error = None;
    }

    /// Drop the login and all task state.
    pub fn log_out(&mut self) {
        self.logged_in = false;
        self.task = None;
        self.selection.clear();
        self.proposed.clear();
        self.last_updated = None;
    }

    /// Load a task, reseeding the selection from its related answers.
    pub fn load(&mut self, fetch: &TaskFetch) -> Result<&Task> {
        let task = self.call(|session| session.fetch_task(fetch))?;
        log::debug!("loaded task {} ({})", task.id, task.hash);
        self.selection = SecondaryEntitySelection::seeded(&task);
        self.proposed.clear();
        self.last_updated = Some(Utc::now());
        self.last_error = None;
        Ok(self.task.insert(task))
    }

    /// Fetch when `policy` says the active task is missing, wrong or stale.
    ///
    /// Returns whether a fetch happened.
    pub fn refresh_if_needed(
        &mut self,
        policy: &RefreshPolicy,
        pinned_hash: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let needed = policy.needs_fetch(
            self.task.as_ref(),
            pinned_hash,
            self.last_updated,
            now,
            false,
            self.last_error.is_some(),
        );
        if !needed {
            return Ok(false);
        }
        let fetch = pinned_hash.map_or(TaskFetch::Next, TaskFetch::by_hash);
        self.load(&fetch)?;
        Ok(true)
    }

    /// Toggle a secondary mention; returns whether it is now selected.
    pub fn toggle(&mut self, side: DocumentSide, key: &MentionKey) -> Result<bool> {
        let task = self.task.as_ref().ok_or(SessionError::NoTask)?;
        Ok(self.selection.toggle(task, side, key))
    }

    /// Propose `key` as the new primary mention on `side`.
    pub fn propose_primary(&mut self, side: DocumentSide, key: MentionKey) -> Result<()> {
        let task = self.task.as_ref().ok_or(SessionError::NoTask)?;
        if !task.mentions(side).contains(&key) {
            return Err(Error::invalid_input(format!(
                "{key} is not a {side} mention of task {}",
                task.id
            ))
            .into());
        }
        self.proposed.propose(side, key);
        Ok(())
    }

    /// Forget pending primary replacements.
    pub fn discard_proposal(&mut self) {
        self.proposed.clear();
    }

    /// Switch to the task for the proposed primary pair.
    ///
    /// The active task is left untouched until the new one has loaded.
    pub fn confirm_primaries(&mut self) -> Result<&Task> {
        if self.proposed.is_empty() {
            return self.task.as_ref().ok_or(SessionError::NoTask);
        }
        let task = self.task.as_ref().ok_or(SessionError::NoTask)?;
        let swapped = task.with_primaries(&self.proposed);
        let fetch = TaskFetch::by_pair(
            &swapped,
            swapped.news_ent.clone().unwrap_or_default(),
            swapped.sci_ent.clone().unwrap_or_default(),
        );
        self.load(&fetch)
    }

    /// Submit `answer` for the active pair and load the follow-up task.
    ///
    /// Returns the executed plan. Nothing is written if the core rejects
    /// the task.
    pub fn submit(&mut self, answer: Answer, want_next: bool) -> Result<SubmissionPlan> {
        if !self.logged_in {
            return Err(SessionError::LoggedOut);
        }
        let task = self.task.as_ref().ok_or(SessionError::NoTask)?;
        let plan = self
            .propagator
            .plan_submission(task, &self.selection, answer, want_next)?;
        self.call(|session| session.execute(&plan.write))?;
        self.load(&plan.refresh)?;
        Ok(plan)
    }

    /// Flag the active task as bad, or clear the flag with `None`.
    pub fn report_bad(&mut self, reason: Option<String>) -> Result<()> {
        let task = self.task.as_ref().ok_or(SessionError::NoTask)?;
        let report = match reason {
            Some(reason) => BadTaskReport::new(task, reason),
            None => BadTaskReport::clear(task),
        };
        let refresh = TaskFetch::by_hash(task.hash.clone());
        self.call(|session| session.report_bad(&report))?;
        self.load(&refresh)?;
        Ok(())
    }

    /// Open the mention editor on the active task's primary for `side`.
    pub fn open_editor(&self, side: DocumentSide) -> Result<MentionEditor> {
        let task = self.task.as_ref().ok_or(SessionError::NoTask)?;
        Ok(MentionEditor::open(task, side)?)
    }

    /// Save the editor's span and reload the task.
    ///
    /// Returns false when the span was unchanged and nothing was sent.
    pub fn save_mention(&mut self, editor: &MentionEditor) -> Result<bool> {
        let task = self.task.as_ref().ok_or(SessionError::NoTask)?;
        let edit = editor.to_edit()?;
        if edit.is_noop() {
            return Ok(false);
        }
        let refresh = TaskFetch::by_hash(task.hash.clone());
        self.call(|session| session.save_mention(&edit))?;
        self.load(&refresh)?;
        Ok(true)
    }

    fn call<T>(&mut self, op: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        if !self.logged_in {
            return Err(SessionError::LoggedOut);
        }
        match op(&mut self.session) {
            Err(SessionError::AuthExpired) => {
                log::warn!("authentication expired, logging out");
                self.log_out();
                Err(SessionError::AuthExpired)
            }
            Err(e) => {
                log::warn!("session call failed: {e}");
                self.last_error = Some(e.to_string());
                Err(e)
            }
            ok => ok,
        }
    }
}

// ============================================================================
// Mock session
// ============================================================================

/// In-memory session for testing.
///
/// Serves tasks by hash or by pair from a pool, and `Next` from a queue.
/// Every call is recorded.
///
/// # Example
///
/// ```rust
/// use cdcr::session::{Annotator, MockSession};
/// use cdcr::TaskFetch;
///
/// let mut annotator = Annotator::new(MockSession::new());
/// assert!(annotator.load(&TaskFetch::Next).is_err());
/// ```
#[derive(Debug, Default)]
pub struct MockSession {
    pool: Vec<Task>,
    queue: VecDeque<Task>,
    failure: Option<SessionError>,
    /// Fetches, in order.
    pub fetches: Vec<TaskFetch>,
    /// Executed plans, in order.
    pub executed: Vec<WritePlan>,
    /// Bad-task reports, in order.
    pub reports: Vec<BadTaskReport>,
    /// Mention edits, in order.
    pub edits: Vec<MentionEdit>,
}

impl MockSession {
    /// Empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `task` fetchable by hash or pair.
    #[must_use]
    pub fn with_task(mut self, task: Task) -> Self {
        self.pool.push(task);
        self
    }

    /// Queue `task` as a future `Next` result; it also joins the pool.
    #[must_use]
    pub fn with_next(mut self, task: Task) -> Self {
        self.pool.push(task.clone());
        self.queue.push_back(task);
        self
    }

    /// Fail the next call with `error`.
    pub fn fail_next(&mut self, error: SessionError) {
        self.failure = Some(error);
    }

    /// Replace the pooled task with the same hash.
    pub fn update_task(&mut self, task: Task) {
        self.pool.retain(|t| t.hash != task.hash);
        self.pool.push(task);
    }

    fn take_failure(&mut self) -> Result<()> {
        match self.failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AnnotationSession for MockSession {
    fn fetch_task(&mut self, fetch: &TaskFetch) -> Result<Task> {
        self.fetches.push(fetch.clone());
        self.take_failure()?;
        let found = match fetch {
            TaskFetch::Next => self.queue.pop_front(),
            TaskFetch::Hash { hash } => self.pool.iter().find(|t| &t.hash == hash).cloned(),
            TaskFetch::Pair {
                news_article_id,
                sci_paper_id,
                news_ent,
                sci_ent,
            } => self
                .pool
                .iter()
                .find(|t| {
                    t.news_article_id == *news_article_id
                        && t.sci_paper_id == *sci_paper_id
                        && t.news_ent.clone().unwrap_or_default() == *news_ent
                        && t.sci_ent.clone().unwrap_or_default() == *sci_ent
                })
                .cloned(),
        };
        found.ok_or_else(|| SessionError::not_found(format!("{fetch:?}")))
    }

    fn execute(&mut self, plan: &WritePlan) -> Result<()> {
        self.take_failure()?;
        self.executed.push(plan.clone());
        Ok(())
    }

    fn report_bad(&mut self, report: &BadTaskReport) -> Result<()> {
        self.take_failure()?;
        self.reports.push(report.clone());
        Ok(())
    }

    fn save_mention(&mut self, edit: &MentionEdit) -> Result<()> {
        self.take_failure()?;
        self.edits.push(edit.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(label: &str, start: usize, end: usize) -> MentionKey {
        MentionKey::new(label, start, end)
    }

    fn task(hash: &str, news: MentionKey, sci: MentionKey) -> Task {
        Task {
            id: 1,
            hash: hash.into(),
            news_ent: Some(news),
            sci_ent: Some(sci),
            news_article_id: 10,
            sci_paper_id: 20,
            news_text: "A B".into(),
            sci_text: "C D".into(),
            news_url: String::new(),
            sci_url: String::new(),
            news_ents: vec![key("A", 0, 1), key("B", 2, 3)],
            sci_ents: vec![key("C", 0, 1), key("D", 2, 3)],
            similarity: None,
            is_iaa: false,
            is_bad: false,
            is_bad_reason: None,
            current_user_answer: None,
            related_answers: Vec::new(),
        }
    }

    fn loaded() -> Annotator<MockSession> {
        let session = MockSession::new()
            .with_next(task("ac", key("A", 0, 1), key("C", 0, 1)))
            .with_task(task("bc", key("B", 2, 3), key("C", 0, 1)));
        let mut annotator = Annotator::new(session);
        annotator.load(&TaskFetch::Next).unwrap();
        annotator
    }

    #[test]
    fn submit_executes_and_refetches_by_hash() {
        let mut annotator = loaded();
        annotator.toggle(DocumentSide::Science, &key("D", 2, 3)).unwrap();
        let plan = annotator.submit(Answer::Yes, false).unwrap();
        assert_eq!(plan.write.kind(), "batch");

        let session = annotator.session();
        assert_eq!(session.executed, vec![plan.write.clone()]);
        assert_eq!(session.fetches.last(), Some(&TaskFetch::by_hash("ac")));
        // Reseeded from the refetched task, which has no related answers.
        assert!(annotator.selection().is_empty());
    }

    #[test]
    fn rejected_plan_writes_nothing() {
        let mut annotator = loaded();
        let mut broken = annotator.task().unwrap().clone();
        broken.sci_ent = Some(MentionKey::from_raw("no offsets"));
        annotator.task = Some(broken);
        let err = annotator.submit(Answer::Yes, true).unwrap_err();
        assert!(matches!(err, SessionError::Core(Error::MalformedTask(_))));
        assert!(annotator.session().executed.is_empty());
    }

    #[test]
    fn auth_expiry_logs_out() {
        let mut annotator = loaded();
        annotator.session_mut().fail_next(SessionError::AuthExpired);
        let err = annotator.submit(Answer::No, true).unwrap_err();
        assert!(matches!(err, SessionError::AuthExpired));
        assert!(!annotator.is_logged_in());
        assert!(annotator.task().is_none());

        assert!(matches!(
            annotator.load(&TaskFetch::Next),
            Err(SessionError::LoggedOut)
        ));
        annotator.log_in();
        assert!(annotator.is_logged_in());
    }

    #[test]
    fn transport_error_is_remembered() {
        let mut annotator = loaded();
        annotator
            .session_mut()
            .fail_next(SessionError::transport("connection reset"));
        assert!(annotator.submit(Answer::Yes, false).is_err());
        assert!(annotator.last_error().unwrap().contains("connection reset"));
        assert!(annotator.is_logged_in());
        assert!(annotator.task().is_some());
    }

    #[test]
    fn confirm_primaries_fetches_the_swapped_pair() {
        let mut annotator = loaded();
        annotator
            .propose_primary(DocumentSide::News, key("B", 2, 3))
            .unwrap();
        assert_eq!(annotator.task().unwrap().hash, "ac");
        let task = annotator.confirm_primaries().unwrap();
        assert_eq!(task.hash, "bc");
        assert!(annotator.proposed().is_empty());
    }

    #[test]
    fn proposing_unknown_mention_fails() {
        let mut annotator = loaded();
        assert!(annotator
            .propose_primary(DocumentSide::Science, key("Z", 0, 1))
            .is_err());
    }

    #[test]
    fn report_and_edit_reload() {
        let mut annotator = loaded();
        annotator.report_bad(Some("ambiguous".into())).unwrap();
        assert_eq!(annotator.session().reports[0].reason.as_deref(), Some("ambiguous"));

        let mut editor = annotator.open_editor(DocumentSide::News).unwrap();
        assert!(!annotator.save_mention(&editor).unwrap());
        editor.set_end(3);
        assert!(annotator.save_mention(&editor).unwrap());
        let edit = &annotator.session().edits[0];
        assert_eq!(edit.new_entity.as_str(), "A B;0;3");
        assert_eq!(annotator.session().fetches.len(), 3);
    }

    #[test]
    fn refresh_policy_rules() {
        let policy = RefreshPolicy::default();
        let now = Utc::now();
        let task = task("ac", key("A", 0, 1), key("C", 0, 1));

        assert!(policy.needs_fetch(None, None, None, now, false, false));
        assert!(!policy.needs_fetch(None, None, None, now, true, false));
        assert!(!policy.needs_fetch(None, None, None, now, false, true));

        let fresh = Some(now - Duration::seconds(10));
        let stale = Some(now - Duration::seconds(301));
        assert!(!policy.needs_fetch(Some(&task), None, fresh, now, false, false));
        assert!(!policy.needs_fetch(Some(&task), Some("ac"), fresh, now, false, false));
        assert!(policy.needs_fetch(Some(&task), Some("other"), fresh, now, false, false));
        assert!(policy.needs_fetch(Some(&task), None, stale, now, false, false));
    }

    #[test]
    fn refresh_if_needed_uses_pinned_hash() {
        let mut annotator = loaded();
        let now = Utc::now();
        let policy = RefreshPolicy::default();
        assert!(!annotator.refresh_if_needed(&policy, None, now).unwrap());
        assert!(annotator.refresh_if_needed(&policy, Some("bc"), now).unwrap());
        assert_eq!(annotator.task().unwrap().hash, "bc");
    }
}
