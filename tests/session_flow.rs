//! Submit / refresh cycles through the session driver.

use cdcr::{
    Answer, Annotator, DocumentSide, MentionKey, MockSession, RelatedAnswer, SessionError,
    Settings, Task, TaskFetch, WritePlan,
};

fn task(id: u64, hash: &str, related: Vec<RelatedAnswer>) -> Task {
    let json = serde_json::json!({
        "id": id,
        "hash": hash,
        "news_ent": "cat;4;7",
        "sci_ent": "Felis catus;0;11",
        "news_article_id": 1,
        "sci_paper_id": 2,
        "news_text": "The cat sat. A feline napped.",
        "sci_text": "Felis catus is a small carnivore. Cats purr.",
        "news_ents": ["The cat;0;7", "cat;4;7", "feline;15;21"],
        "sci_ents": ["Felis catus;0;11", "Cats;34;38"],
    });
    let mut task = Task::from_json(&json.to_string()).unwrap();
    task.related_answers = related;
    task
}

fn key(raw: &str) -> MentionKey {
    raw.parse().unwrap()
}

fn yes(news: &str, sci: &str) -> RelatedAnswer {
    RelatedAnswer {
        task_id: Some(99),
        news_ent: key(news),
        sci_ent: key(sci),
        answer: Answer::Yes,
        user_id: Some(1),
    }
}

#[test]
fn next_task_resets_selection() {
    let first = task(1, "first", Vec::new());
    let second = task(2, "second", vec![yes("feline;15;21", "Felis catus;0;11")]);
    let session = MockSession::new().with_next(first).with_next(second);
    let mut annotator = Annotator::new(session);

    annotator.load(&TaskFetch::Next).unwrap();
    assert!(annotator.selection().is_empty());
    assert!(annotator
        .toggle(DocumentSide::Science, &key("Cats;34;38"))
        .unwrap());

    let plan = annotator.submit(Answer::Yes, true).unwrap();
    let WritePlan::Batch(batch) = &plan.write else {
        panic!("expected batch, got {:?}", plan.write);
    };
    assert_eq!(batch.items.len(), 2);

    let loaded = annotator.task().unwrap();
    assert_eq!(loaded.hash, "second");
    let selection = annotator.selection();
    assert!(selection.science.is_empty());
    assert!(selection.contains(DocumentSide::News, &key("feline;15;21")));
    assert_eq!(annotator.session().executed.len(), 1);
}

#[test]
fn resubmitting_same_task_reloads_saved_state() {
    let first = task(1, "first", Vec::new());
    let mut annotator = Annotator::new(MockSession::new().with_next(first));
    annotator.load(&TaskFetch::Next).unwrap();

    let saved = task(1, "first", vec![yes("cat;4;7", "Cats;34;38")]);
    annotator.session_mut().update_task(saved);
    annotator
        .toggle(DocumentSide::Science, &key("Cats;34;38"))
        .unwrap();
    annotator.submit(Answer::Yes, false).unwrap();

    assert_eq!(
        annotator.session().fetches,
        vec![TaskFetch::Next, TaskFetch::by_hash("first")]
    );
    assert!(annotator
        .selection()
        .contains(DocumentSide::Science, &key("Cats;34;38")));
}

#[test]
fn expired_login_blocks_further_writes() {
    let mut annotator = Annotator::new(MockSession::new().with_next(task(1, "first", Vec::new())));
    annotator.load(&TaskFetch::Next).unwrap();
    annotator.session_mut().fail_next(SessionError::AuthExpired);

    assert!(matches!(
        annotator.report_bad(Some("duplicate".into())),
        Err(SessionError::AuthExpired)
    ));
    assert!(!annotator.is_logged_in());
    assert!(matches!(
        annotator.submit(Answer::Yes, true),
        Err(SessionError::LoggedOut)
    ));
    assert!(annotator.session().executed.is_empty());
    assert!(annotator.session().reports.is_empty());
}

#[test]
fn settings_drive_rendering() {
    let task = task(1, "first", vec![yes("cat;4;7", "Cats;34;38")]);
    let annotator_selection = cdcr::SecondaryEntitySelection::seeded(&task);
    let settings = Settings::from_toml("show_all = false\nsecondary_style = \"text-warning\"").unwrap();

    let tree = task.span_tree(DocumentSide::Science).unwrap();
    let options = settings.render_options(&task, &annotator_selection, DocumentSide::Science);
    let html = cdcr::render_html(tree.render(&options));
    assert_eq!(
        html,
        concat!(
            r#"<mark data-key="Felis catus;0;11">Felis catus</mark>"#,
            " is a small carnivore. ",
            r#"<span class="text-warning" data-key="Cats;34;38">Cats</span>"#,
            " purr."
        )
    );
}

#[test]
fn seeded_key_of_moved_mention_still_submits() {
    // The related answer still names the mention's span from before an edit.
    let moved = task(3, "moved", vec![yes("cat;4;7", "Cats;40;44")]);
    let mut annotator = Annotator::new(MockSession::new().with_next(moved));
    annotator.load(&TaskFetch::Next).unwrap();
    assert!(annotator
        .selection()
        .contains(DocumentSide::Science, &key("Cats;40;44")));

    let plan = annotator.submit(Answer::Yes, false).unwrap();
    assert_eq!(plan.write.kind(), "single");
    assert_eq!(annotator.session().executed, vec![plan.write.clone()]);
    assert!(annotator.last_error().is_none());
}
