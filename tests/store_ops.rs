use askseniors::{
    core::store::{LikeToggle, QaStore, StoreError},
    identity::Identity,
    question::{QuestionDraft, ReplyDraft},
    types::{Audience, Category, NotificationKind, Role},
};

fn rahul() -> Identity {
    Identity::new("user-1", "Rahul Kumar", Role::Student)
}

fn priya() -> Identity {
    Identity::new("user-2", "Priya Sharma", Role::Alumni)
}

fn question_draft(author: &Identity, title: &str, category: Category) -> QuestionDraft {
    QuestionDraft {
        title: title.to_string(),
        content: format!("{title} (details)"),
        author: author.name.clone(),
        author_id: author.id.clone(),
        author_year: Some("3rd Year".to_string()),
        author_branch: Some("CSE".to_string()),
        author_role: author.role,
        tags: vec!["Placement".to_string(), "Interview".to_string()],
        category,
        target_audience: vec![Audience::Seniors, Audience::Alumni],
        is_anonymous: false,
    }
}

fn reply_draft(author: &Identity, question_id: &str, content: &str) -> ReplyDraft {
    ReplyDraft {
        question_id: question_id.to_string(),
        content: content.to_string(),
        author: author.name.clone(),
        author_id: author.id.clone(),
        author_role: author.role,
    }
}

#[test]
fn new_questions_prepend_and_start_clean() {
    let mut store = QaStore::new();
    let first = store.add_question(question_draft(&rahul(), "First", Category::General));
    let second = store.add_question(question_draft(&rahul(), "Second", Category::General));

    let titles: Vec<String> = store
        .questions_cloned()
        .into_iter()
        .map(|q| q.title)
        .collect();
    assert_eq!(titles, vec!["Second".to_string(), "First".to_string()]);
    assert_ne!(first, second);

    let q = store.get_question(&first).expect("question");
    assert_eq!(q.likes, 0);
    assert_eq!(q.replies, 0);
    assert!(q.liked_by.is_empty());
    assert_eq!(q.created_at, q.updated_at);
}

#[test]
fn duplicate_tags_keep_first_occurrence() {
    let mut store = QaStore::new();
    let mut draft = question_draft(&rahul(), "Tagged", Category::Academic);
    draft.tags = vec![
        "DSA".to_string(),
        "Study".to_string(),
        "DSA".to_string(),
        "Resources".to_string(),
    ];
    let id = store.add_question(draft);

    assert_eq!(
        store.get_question(&id).expect("question").tags,
        vec!["DSA".to_string(), "Study".to_string(), "Resources".to_string()]
    );
}

#[test]
fn like_toggles_and_pairs_back_to_zero() {
    let mut store = QaStore::new();
    let owner = rahul();
    let liker = priya();
    let qid = store.add_question(question_draft(&owner, "Toggle me", Category::Life));

    assert_eq!(store.like_question(&liker, &qid), Ok(LikeToggle::Liked));
    let q = store.get_question(&qid).expect("question");
    assert_eq!(q.likes, 1);
    assert_eq!(q.liked_by, vec![liker.id.clone()]);

    assert_eq!(store.like_question(&liker, &qid), Ok(LikeToggle::Unliked));
    let q = store.get_question(&qid).expect("question");
    assert_eq!(q.likes, 0);
    assert!(q.liked_by.is_empty());
}

#[test]
fn self_like_never_notifies_others_do_once_per_transition() {
    let mut store = QaStore::new();
    let owner = rahul();
    let liker = priya();
    let qid = store.add_question(question_draft(&owner, "Notify me", Category::Placement));

    store.like_question(&owner, &qid).expect("self like");
    assert_eq!(store.notifications_cloned().len(), 0);
    store.like_question(&owner, &qid).expect("self unlike");

    store.like_question(&liker, &qid).expect("like");
    store.like_question(&liker, &qid).expect("unlike");
    store.like_question(&liker, &qid).expect("like again");

    // One notification per transition into liked; none on unlike.
    let notifications = store.notifications_cloned();
    assert_eq!(notifications.len(), 2);
    for n in &notifications {
        assert_eq!(n.kind, NotificationKind::Like);
        assert_eq!(n.user_id, owner.id);
        assert_eq!(n.from_user_id, liker.id);
        assert_eq!(n.question_id.as_deref(), Some(qid.as_str()));
        assert_eq!(n.reply_id, None);
        assert!(!n.is_read);
        assert_eq!(
            n.message,
            "Priya Sharma liked your question: \"Notify me\""
        );
    }
    assert_eq!(store.unread_count(&owner.id), 2);
}

#[test]
fn like_missing_question_is_an_error() {
    let mut store = QaStore::new();
    assert_eq!(
        store.like_question(&rahul(), &"question-0-0".to_string()),
        Err(StoreError::MissingQuestion("question-0-0".to_string()))
    );
}

#[test]
fn reply_adjusts_parent_counter_and_notifies_owner() {
    let mut store = QaStore::new();
    let owner = rahul();
    let replier = priya();
    let qid = store.add_question(question_draft(&owner, "Answer me", Category::Academic));

    let rid = store
        .add_reply(reply_draft(&replier, &qid, "Start with arrays."))
        .expect("reply");
    assert_eq!(store.get_question(&qid).expect("question").replies, 1);

    let notifications = store.notifications_cloned();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Reply);
    assert_eq!(notifications[0].user_id, owner.id);
    assert_eq!(notifications[0].question_id.as_deref(), Some(qid.as_str()));
    assert_eq!(notifications[0].reply_id.as_deref(), Some(rid.as_str()));
    assert_eq!(
        notifications[0].message,
        "Priya Sharma replied to your question: \"Answer me\""
    );

    store.delete_reply(&replier, &rid).expect("delete reply");
    assert_eq!(store.get_question(&qid).expect("question").replies, 0);
    // Cascade removed the reply notification.
    assert!(store.notifications_cloned().is_empty());
}

#[test]
fn self_reply_skips_notification() {
    let mut store = QaStore::new();
    let owner = rahul();
    let qid = store.add_question(question_draft(&owner, "Talking to myself", Category::Life));

    store
        .add_reply(reply_draft(&owner, &qid, "Bump."))
        .expect("reply");
    assert_eq!(store.get_question(&qid).expect("question").replies, 1);
    assert!(store.notifications_cloned().is_empty());
}

#[test]
fn reply_to_missing_question_is_rejected() {
    let mut store = QaStore::new();
    let err = store
        .add_reply(reply_draft(&priya(), "question-0-0", "Orphan?"))
        .expect_err("must reject");
    assert_eq!(err, StoreError::MissingQuestion("question-0-0".to_string()));
    assert!(store.is_empty());
}

#[test]
fn delete_question_requires_owner_and_leaves_state_untouched_on_failure() {
    let mut store = QaStore::new();
    let owner = rahul();
    let other = priya();
    let qid = store.add_question(question_draft(&owner, "Mine", Category::Project));
    store
        .add_reply(reply_draft(&other, &qid, "Nice one."))
        .expect("reply");

    let before = store.export_snapshot();
    assert_eq!(
        store.delete_question(&other, &qid),
        Err(StoreError::NotQuestionAuthor(qid.clone()))
    );
    assert_eq!(store.export_snapshot(), before);
}

#[test]
fn delete_question_cascades_to_replies_and_notifications() {
    let mut store = QaStore::new();
    let owner = rahul();
    let other = priya();
    let qid = store.add_question(question_draft(&owner, "Doomed", Category::General));
    let keep = store.add_question(question_draft(&other, "Kept", Category::General));

    store
        .add_reply(reply_draft(&other, &qid, "Reply one"))
        .expect("reply");
    store
        .add_reply(reply_draft(&owner, &qid, "Reply two"))
        .expect("reply");
    store.like_question(&other, &qid).expect("like");
    store.like_question(&owner, &keep).expect("like kept");

    store.delete_question(&owner, &qid).expect("delete");

    assert!(store.get_question(&qid).is_none());
    assert!(
        store
            .replies_cloned()
            .iter()
            .all(|r| r.question_id != qid)
    );
    assert!(
        store
            .notifications_cloned()
            .iter()
            .all(|n| n.question_id.as_ref() != Some(&qid))
    );
    // Unrelated state survives.
    assert!(store.get_question(&keep).is_some());
    assert_eq!(store.notifications_cloned().len(), 1);
}

#[test]
fn delete_reply_requires_author() {
    let mut store = QaStore::new();
    let owner = rahul();
    let replier = priya();
    let qid = store.add_question(question_draft(&owner, "Q", Category::General));
    let rid = store
        .add_reply(reply_draft(&replier, &qid, "My reply"))
        .expect("reply");

    assert_eq!(
        store.delete_reply(&owner, &rid),
        Err(StoreError::NotReplyAuthor(rid.clone()))
    );
    assert!(store.get_reply(&rid).is_some());
    assert_eq!(store.get_question(&qid).expect("question").replies, 1);
}

#[test]
fn like_reply_notifies_its_author_with_question_title() {
    let mut store = QaStore::new();
    let owner = rahul();
    let liker = priya();
    let qid = store.add_question(question_draft(&owner, "Parent", Category::Internship));
    let rid = store
        .add_reply(reply_draft(&owner, &qid, "Self answer"))
        .expect("reply");

    assert_eq!(store.like_reply(&liker, &rid), Ok(LikeToggle::Liked));
    let reply = store.get_reply(&rid).expect("reply");
    assert_eq!(reply.likes, 1);
    assert_eq!(reply.liked_by, vec![liker.id.clone()]);

    let notifications = store.notifications_cloned();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, owner.id);
    assert_eq!(notifications[0].reply_id.as_deref(), Some(rid.as_str()));
    assert_eq!(
        notifications[0].message,
        "Priya Sharma liked your reply on \"Parent\""
    );

    // Liking your own reply stays silent.
    store.like_reply(&owner, &rid).expect("self like");
    assert_eq!(store.notifications_cloned().len(), 1);
}

#[test]
fn mark_notification_read_is_one_way_and_idempotent() {
    let mut store = QaStore::new();
    let owner = rahul();
    let liker = priya();
    let qid = store.add_question(question_draft(&owner, "Q", Category::General));
    store.like_question(&liker, &qid).expect("like");

    let nid = store.notifications_cloned()[0].id.clone();
    assert_eq!(store.unread_count(&owner.id), 1);

    assert!(store.mark_notification_read(&nid));
    assert!(!store.mark_notification_read(&nid));
    assert!(!store.mark_notification_read(&"notif-0-0".to_string()));

    assert_eq!(store.unread_count(&owner.id), 0);
    assert!(store.get_notification(&nid).expect("notification").is_read);
}

#[test]
fn unread_count_is_scoped_to_the_recipient() {
    let mut store = QaStore::new();
    let owner = rahul();
    let liker = priya();
    let qid = store.add_question(question_draft(&owner, "Q", Category::General));
    store.like_question(&liker, &qid).expect("like");

    assert_eq!(store.unread_count(&owner.id), 1);
    assert_eq!(store.unread_count(&liker.id), 0);
}
