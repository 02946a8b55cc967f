use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tempfile::TempDir;

use askseniors::{
    core::store::{LikeToggle, QaStore},
    identity::Identity,
    persist::{CollectionKey, PersistResult, StateSink, sqlite::SqliteStateSink},
    question::{QuestionDraft, ReplyDraft},
    runtime::{
        events::QaEvent,
        handle::{QaHandle, RuntimeConfig, RuntimeError, spawn_askseniors},
    },
    types::{Audience, Category, Generation, Role},
};

fn rahul() -> Identity {
    Identity::new("user-1", "Rahul Kumar", Role::Student)
}

fn priya() -> Identity {
    Identity::new("user-2", "Priya Sharma", Role::Alumni)
}

fn question_draft(author: &Identity, title: &str) -> QuestionDraft {
    QuestionDraft {
        title: title.to_string(),
        content: "body".to_string(),
        author: author.name.clone(),
        author_id: author.id.clone(),
        author_year: None,
        author_branch: None,
        author_role: author.role,
        tags: vec![],
        category: Category::General,
        target_audience: vec![Audience::All],
        is_anonymous: false,
    }
}

async fn collect_events(
    sub: &mut tokio::sync::broadcast::Receiver<QaEvent>,
    wanted: usize,
) -> Vec<QaEvent> {
    let mut seen = Vec::new();
    while seen.len() < wanted {
        let evt = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event timeout")
            .expect("recv");
        if !matches!(evt, QaEvent::SavedUpTo { .. }) {
            seen.push(evt);
        }
    }
    seen
}

struct SlowSink {
    written: Arc<Mutex<Vec<(CollectionKey, Generation)>>>,
    delay: Duration,
}

impl StateSink for SlowSink {
    fn write_collection(
        &mut self,
        key: CollectionKey,
        _payload: &[u8],
        generation: Generation,
    ) -> PersistResult<()> {
        std::thread::sleep(self.delay);
        self.written.lock().expect("lock").push((key, generation));
        Ok(())
    }
}

#[tokio::test]
async fn mutations_flow_through_the_handle_in_order() {
    let handle = spawn_askseniors(QaStore::new(), None, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    handle.sign_in(priya()).await.expect("sign in");
    let qid = handle
        .add_question(question_draft(&rahul(), "Runtime question"))
        .await
        .expect("add");
    let toggle = handle.like_question(qid.clone()).await.expect("like");
    assert_eq!(toggle, Some(LikeToggle::Liked));

    let rid = handle
        .add_reply(ReplyDraft {
            question_id: qid.clone(),
            content: "reply".to_string(),
            author: priya().name,
            author_id: priya().id,
            author_role: Role::Alumni,
        })
        .await
        .expect("reply");

    let events = collect_events(&mut sub, 3).await;
    assert_eq!(
        events,
        vec![
            QaEvent::QuestionAdded { id: qid.clone() },
            QaEvent::QuestionLikeToggled {
                id: qid.clone(),
                liked: true
            },
            QaEvent::ReplyAdded {
                id: rid.clone(),
                question_id: qid.clone()
            },
        ]
    );

    let q = handle
        .get_question(qid.clone())
        .await
        .expect("get")
        .expect("present");
    assert_eq!(q.likes, 1);
    assert_eq!(q.replies, 1);

    let replies = handle.replies_for(qid).await.expect("replies");
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].id, rid);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn signed_out_likes_are_silent_noops_and_deletes_fail() {
    let handle = spawn_askseniors(QaStore::new(), None, RuntimeConfig::default());

    handle.sign_in(rahul()).await.expect("sign in");
    let qid = handle
        .add_question(question_draft(&rahul(), "Gated"))
        .await
        .expect("add");
    handle.sign_out().await.expect("sign out");

    assert_eq!(handle.like_question(qid.clone()).await.expect("like"), None);
    let q = handle
        .get_question(qid.clone())
        .await
        .expect("get")
        .expect("present");
    assert_eq!(q.likes, 0);

    match handle.delete_question(qid.clone()).await {
        Err(RuntimeError::SignedOut) => {}
        other => panic!("expected SignedOut, got {other:?}"),
    }
    assert_eq!(handle.unread_count().await.expect("unread"), 0);
    assert!(handle.notifications().await.expect("notifications").is_empty());

    // Reads stay available while signed out.
    assert_eq!(handle.questions().await.expect("questions").len(), 1);
    let hits = handle.search_questions("gated").await.expect("search");
    assert_eq!(hits.len(), 1);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn notifications_and_unread_count_follow_the_session() {
    let handle = spawn_askseniors(QaStore::new(), None, RuntimeConfig::default());

    handle.sign_in(rahul()).await.expect("sign in");
    let qid = handle
        .add_question(question_draft(&rahul(), "Owned"))
        .await
        .expect("add");

    handle.sign_in(priya()).await.expect("switch user");
    handle.like_question(qid.clone()).await.expect("like");
    assert_eq!(handle.unread_count().await.expect("unread"), 0);

    handle.sign_in(rahul()).await.expect("switch back");
    assert_eq!(handle.unread_count().await.expect("unread"), 1);
    let notifications = handle.notifications().await.expect("notifications");
    assert_eq!(notifications.len(), 1);

    let marked = handle
        .mark_notification_read(notifications[0].id.clone())
        .await
        .expect("mark");
    assert!(marked);
    assert_eq!(handle.unread_count().await.expect("unread"), 0);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn slow_sink_still_reports_saved_generations() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let sink = SlowSink {
        written: Arc::clone(&written),
        delay: Duration::from_millis(20),
    };

    let handle: QaHandle = spawn_askseniors(
        QaStore::new(),
        Some(Box::new(sink)),
        RuntimeConfig::default(),
    );
    let mut sub = handle.subscribe();

    handle.sign_in(rahul()).await.expect("sign in");
    handle
        .add_question(question_draft(&rahul(), "Durable?"))
        .await
        .expect("add");
    let generation = handle.flush().await.expect("flush");
    assert!(generation > 0);

    let mut saw_saved = false;
    for _ in 0..8 {
        let evt = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event timeout")
            .expect("recv");
        if let QaEvent::SavedUpTo { generation: g } = evt {
            assert!(g <= generation);
            saw_saved = true;
            break;
        }
    }
    assert!(saw_saved, "no SavedUpTo event observed");
    assert!(
        written
            .lock()
            .expect("lock")
            .iter()
            .any(|(key, _)| *key == CollectionKey::Questions)
    );

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn shutdown_drains_writes_into_sqlite() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("state.db");

    {
        let sink = SqliteStateSink::open(&db_path).expect("open");
        let handle = spawn_askseniors(
            QaStore::new(),
            Some(Box::new(sink)),
            RuntimeConfig {
                // Exercise the coalescing path rather than per-write flushes.
                flush_on_write: false,
                coalesce_max_latency_ms: 5_000,
                ..RuntimeConfig::default()
            },
        );

        handle.sign_in(rahul()).await.expect("sign in");
        let qid = handle
            .add_question(question_draft(&rahul(), "Survives restart"))
            .await
            .expect("add");
        handle.sign_in(priya()).await.expect("switch");
        handle.like_question(qid).await.expect("like");
        handle.shutdown().await.expect("shutdown");
    }

    let reopened = SqliteStateSink::open(&db_path).expect("reopen");
    let store = reopened.load_store().expect("load");
    let questions = store.questions_cloned();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].title, "Survives restart");
    assert_eq!(questions[0].likes, 1);
    assert_eq!(store.notifications_cloned().len(), 1);
}
