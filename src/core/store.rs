use chrono::Utc;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    identity::Identity,
    notification::Notification,
    question::{Question, QuestionDraft, Reply, ReplyDraft},
    types::{
        CategoryFilter, Generation, NotificationId, NotificationKind, QuestionId, ReplyId, UserId,
    },
};

/// Failure modes of store mutations.
///
/// Authorization and not-found failures never partially apply: the
/// collections are untouched whenever an `Err` is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No question with the given id.
    MissingQuestion(QuestionId),
    /// No reply with the given id.
    MissingReply(ReplyId),
    /// Acting identity does not own the question.
    NotQuestionAuthor(QuestionId),
    /// Acting identity does not own the reply.
    NotReplyAuthor(ReplyId),
}

/// Direction a like toggle took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    /// The actor was added to the liker set.
    Liked,
    /// The actor was removed from the liker set.
    Unliked,
}

/// Collections mutated since the last [`QaStore::drain_dirty`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dirty {
    /// Question collection changed.
    pub questions: bool,
    /// Reply collection changed.
    pub replies: bool,
    /// Notification collection changed.
    pub notifications: bool,
}

impl Dirty {
    /// True when any collection changed.
    pub fn any(&self) -> bool {
        self.questions || self.replies || self.notifications
    }
}

/// Serializable full-state snapshot, newest-first per collection.
///
/// This is exactly the persisted layout: three independent JSON arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreSnapshotV1 {
    /// All questions, newest first.
    pub questions: Vec<Question>,
    /// All replies, newest first.
    pub replies: Vec<Reply>,
    /// All notifications, newest first.
    pub notifications: Vec<Notification>,
}

/// Authoritative in-memory store of questions, replies, and notifications.
///
/// The store is the sole mutator of its three collections. Each collection
/// keeps newest-first insertion order; new items are prepended. Consumers
/// receive snapshots or borrowed views and funnel all writes through the
/// operations here, each of which runs to completion and is all-or-nothing.
#[derive(Debug, Default)]
pub struct QaStore {
    questions: HashMap<QuestionId, Question>,
    question_order: Vec<QuestionId>,
    replies: HashMap<ReplyId, Reply>,
    reply_order: Vec<ReplyId>,
    notifications: HashMap<NotificationId, Notification>,
    notification_order: Vec<NotificationId>,
    dirty: Dirty,
    generation: Generation,
    serial: u64,
}

impl QaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a snapshot.
    ///
    /// Derived fields are normalized on the way in: `likes` is recomputed
    /// from the liker set and the per-question reply counter is recounted
    /// from the reply collection, so drift in persisted data heals here.
    pub fn from_snapshot(snapshot: StoreSnapshotV1) -> Self {
        let mut store = Self::new();

        for mut q in snapshot.questions {
            q.likes = q.liked_by.len() as u32;
            q.replies = 0;
            store.question_order.push(q.id.clone());
            store.questions.insert(q.id.clone(), q);
        }

        for mut r in snapshot.replies {
            r.likes = r.liked_by.len() as u32;
            if let Some(q) = store.questions.get_mut(&r.question_id) {
                q.replies += 1;
            }
            store.reply_order.push(r.id.clone());
            store.replies.insert(r.id.clone(), r);
        }

        for n in snapshot.notifications {
            store.notification_order.push(n.id.clone());
            store.notifications.insert(n.id.clone(), n);
        }

        store
    }

    /// Exports the full state, newest-first per collection.
    pub fn export_snapshot(&self) -> StoreSnapshotV1 {
        StoreSnapshotV1 {
            questions: self.questions_cloned(),
            replies: self.replies_cloned(),
            notifications: self.notifications_cloned(),
        }
    }

    /// Creates a question from `draft` and prepends it.
    ///
    /// No validation beyond dropping duplicate tags; always succeeds.
    pub fn add_question(&mut self, draft: QuestionDraft) -> QuestionId {
        let id = self.fresh_id("question");
        let now = Utc::now();

        let mut tags = Vec::with_capacity(draft.tags.len());
        for tag in draft.tags {
            // Tags keep their first occurrence only.
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let question = Question {
            id: id.clone(),
            title: draft.title,
            content: draft.content,
            author: draft.author,
            author_id: draft.author_id,
            author_year: draft.author_year,
            author_branch: draft.author_branch,
            author_role: draft.author_role,
            tags,
            category: draft.category,
            target_audience: draft.target_audience,
            is_anonymous: draft.is_anonymous,
            likes: 0,
            replies: 0,
            liked_by: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.question_order.insert(0, id.clone());
        self.questions.insert(id.clone(), question);
        self.touch(Dirty {
            questions: true,
            ..Dirty::default()
        });
        id
    }

    /// Deletes a question owned by `actor`, cascading to its replies and to
    /// every notification referencing it.
    pub fn delete_question(&mut self, actor: &Identity, id: &QuestionId) -> Result<(), StoreError> {
        let question = self
            .questions
            .get(id)
            .ok_or_else(|| StoreError::MissingQuestion(id.clone()))?;
        if question.author_id != actor.id {
            return Err(StoreError::NotQuestionAuthor(id.clone()));
        }

        self.questions.remove(id);
        self.question_order.retain(|qid| qid != id);

        let had_replies = self.replies.len();
        self.replies.retain(|_, r| r.question_id != *id);
        if self.replies.len() != had_replies {
            let replies = &self.replies;
            self.reply_order.retain(|rid| replies.contains_key(rid));
        }

        let had_notifications = self.notifications.len();
        self.notifications
            .retain(|_, n| n.question_id.as_ref() != Some(id));
        if self.notifications.len() != had_notifications {
            let notifications = &self.notifications;
            self.notification_order
                .retain(|nid| notifications.contains_key(nid));
        }

        self.touch(Dirty {
            questions: true,
            replies: self.replies.len() != had_replies,
            notifications: self.notifications.len() != had_notifications,
        });
        Ok(())
    }

    /// Toggles `actor`'s like on a question.
    ///
    /// A transition into the liked state by a non-owner emits exactly one
    /// `like` notification to the owner; unliking emits nothing.
    pub fn like_question(
        &mut self,
        actor: &Identity,
        id: &QuestionId,
    ) -> Result<LikeToggle, StoreError> {
        let question = self
            .questions
            .get_mut(id)
            .ok_or_else(|| StoreError::MissingQuestion(id.clone()))?;

        let toggle = toggle_liker(&mut question.liked_by, &actor.id);
        question.likes = question.liked_by.len() as u32;
        question.updated_at = Utc::now();

        let notify = (toggle == LikeToggle::Liked && question.author_id != actor.id).then(|| {
            (
                question.author_id.clone(),
                format!("{} liked your question: \"{}\"", actor.name, question.title),
            )
        });

        let mut dirty = Dirty {
            questions: true,
            ..Dirty::default()
        };
        if let Some((owner, message)) = notify {
            let nid = self.fresh_id("notif");
            self.push_notification(Notification {
                id: nid,
                user_id: owner,
                kind: NotificationKind::Like,
                message,
                question_id: Some(id.clone()),
                reply_id: None,
                from_user_id: actor.id.clone(),
                from_user_name: actor.name.clone(),
                is_read: false,
                created_at: Utc::now(),
            });
            dirty.notifications = true;
        }

        self.touch(dirty);
        Ok(toggle)
    }

    /// Creates a reply from `draft` and prepends it.
    ///
    /// The parent question must exist; its reply counter and `updated_at`
    /// are bumped in the same operation, and the owner is notified when the
    /// reply author is someone else.
    pub fn add_reply(&mut self, draft: ReplyDraft) -> Result<ReplyId, StoreError> {
        let Some(question) = self.questions.get_mut(&draft.question_id) else {
            return Err(StoreError::MissingQuestion(draft.question_id));
        };
        question.replies += 1;
        question.updated_at = Utc::now();

        let notify = (question.author_id != draft.author_id).then(|| {
            (
                question.author_id.clone(),
                format!(
                    "{} replied to your question: \"{}\"",
                    draft.author, question.title
                ),
            )
        });

        let id = self.fresh_id("reply");
        let reply = Reply {
            id: id.clone(),
            question_id: draft.question_id.clone(),
            content: draft.content,
            author: draft.author.clone(),
            author_id: draft.author_id.clone(),
            author_role: draft.author_role,
            likes: 0,
            liked_by: Vec::new(),
            created_at: Utc::now(),
        };
        self.reply_order.insert(0, id.clone());
        self.replies.insert(id.clone(), reply);

        let mut dirty = Dirty {
            questions: true,
            replies: true,
            notifications: false,
        };
        if let Some((owner, message)) = notify {
            let nid = self.fresh_id("notif");
            self.push_notification(Notification {
                id: nid,
                user_id: owner,
                kind: NotificationKind::Reply,
                message,
                question_id: Some(draft.question_id),
                reply_id: Some(id.clone()),
                from_user_id: draft.author_id,
                from_user_name: draft.author,
                is_read: false,
                created_at: Utc::now(),
            });
            dirty.notifications = true;
        }

        self.touch(dirty);
        Ok(id)
    }

    /// Deletes a reply owned by `actor`, decrementing the parent counter
    /// (floor at zero) and removing notifications referencing the reply.
    pub fn delete_reply(&mut self, actor: &Identity, id: &ReplyId) -> Result<(), StoreError> {
        let reply = self
            .replies
            .get(id)
            .ok_or_else(|| StoreError::MissingReply(id.clone()))?;
        if reply.author_id != actor.id {
            return Err(StoreError::NotReplyAuthor(id.clone()));
        }
        let question_id = reply.question_id.clone();

        self.replies.remove(id);
        self.reply_order.retain(|rid| rid != id);

        let mut dirty = Dirty {
            replies: true,
            ..Dirty::default()
        };
        if let Some(question) = self.questions.get_mut(&question_id) {
            question.replies = question.replies.saturating_sub(1);
            question.updated_at = Utc::now();
            dirty.questions = true;
        }

        let had_notifications = self.notifications.len();
        self.notifications
            .retain(|_, n| n.reply_id.as_ref() != Some(id));
        if self.notifications.len() != had_notifications {
            let notifications = &self.notifications;
            self.notification_order
                .retain(|nid| notifications.contains_key(nid));
            dirty.notifications = true;
        }

        self.touch(dirty);
        Ok(())
    }

    /// Toggles `actor`'s like on a reply, notifying the reply author on a
    /// transition into liked by someone else.
    pub fn like_reply(&mut self, actor: &Identity, id: &ReplyId) -> Result<LikeToggle, StoreError> {
        let reply = self
            .replies
            .get_mut(id)
            .ok_or_else(|| StoreError::MissingReply(id.clone()))?;

        let toggle = toggle_liker(&mut reply.liked_by, &actor.id);
        reply.likes = reply.liked_by.len() as u32;
        let question_id = reply.question_id.clone();
        let reply_author = reply.author_id.clone();

        let mut dirty = Dirty {
            replies: true,
            ..Dirty::default()
        };
        if toggle == LikeToggle::Liked && reply_author != actor.id {
            let message = match self.questions.get(&question_id) {
                Some(q) => format!("{} liked your reply on \"{}\"", actor.name, q.title),
                None => format!("{} liked your reply", actor.name),
            };
            let nid = self.fresh_id("notif");
            self.push_notification(Notification {
                id: nid,
                user_id: reply_author,
                kind: NotificationKind::Like,
                message,
                question_id: Some(question_id),
                reply_id: Some(id.clone()),
                from_user_id: actor.id.clone(),
                from_user_name: actor.name.clone(),
                is_read: false,
                created_at: Utc::now(),
            });
            dirty.notifications = true;
        }

        self.touch(dirty);
        Ok(toggle)
    }

    /// Marks a notification as read. One-way and idempotent.
    ///
    /// Returns true when the flag transitioned; false when the notification
    /// is missing or was already read.
    pub fn mark_notification_read(&mut self, id: &NotificationId) -> bool {
        match self.notifications.get_mut(id) {
            Some(n) if !n.is_read => {
                n.is_read = true;
                self.touch(Dirty {
                    notifications: true,
                    ..Dirty::default()
                });
                true
            }
            _ => false,
        }
    }

    /// Number of unread notifications addressed to `user`.
    pub fn unread_count(&self, user: &UserId) -> usize {
        self.notification_order
            .iter()
            .filter_map(|id| self.notifications.get(id))
            .filter(|n| n.user_id == *user && !n.is_read)
            .count()
    }

    /// Questions matching `filter`, in stored (newest-first) order.
    pub fn questions_by_category(&self, filter: CategoryFilter) -> Vec<&Question> {
        self.questions_iter()
            .filter(|q| match filter {
                CategoryFilter::Feed => true,
                CategoryFilter::Only(category) => q.category == category,
            })
            .collect()
    }

    /// Case-insensitive substring search over title, content, tags, and
    /// author name. A blank query returns the full collection unfiltered.
    pub fn search_questions(&self, query: &str) -> Vec<&Question> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.questions_iter().collect();
        }

        self.questions_iter()
            .filter(|q| {
                q.title.to_lowercase().contains(&needle)
                    || q.content.to_lowercase().contains(&needle)
                    || q.tags.iter().any(|t| t.to_lowercase().contains(&needle))
                    || q.author.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Looks up a question by id.
    pub fn get_question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.get(id)
    }

    /// Looks up a reply by id.
    pub fn get_reply(&self, id: &ReplyId) -> Option<&Reply> {
        self.replies.get(id)
    }

    /// Looks up a notification by id.
    pub fn get_notification(&self, id: &NotificationId) -> Option<&Notification> {
        self.notifications.get(id)
    }

    /// All questions, newest first.
    pub fn questions_cloned(&self) -> Vec<Question> {
        self.questions_iter().cloned().collect()
    }

    /// All replies, newest first.
    pub fn replies_cloned(&self) -> Vec<Reply> {
        self.reply_order
            .iter()
            .filter_map(|id| self.replies.get(id))
            .cloned()
            .collect()
    }

    /// Replies attached to one question, newest first.
    pub fn replies_for_question(&self, id: &QuestionId) -> Vec<&Reply> {
        self.reply_order
            .iter()
            .filter_map(|rid| self.replies.get(rid))
            .filter(|r| r.question_id == *id)
            .collect()
    }

    /// All notifications, newest first.
    pub fn notifications_cloned(&self) -> Vec<Notification> {
        self.notification_order
            .iter()
            .filter_map(|id| self.notifications.get(id))
            .cloned()
            .collect()
    }

    /// Notifications addressed to `user`, newest first.
    pub fn notifications_for(&self, user: &UserId) -> Vec<&Notification> {
        self.notification_order
            .iter()
            .filter_map(|id| self.notifications.get(id))
            .filter(|n| n.user_id == *user)
            .collect()
    }

    /// (questions, replies, notifications) collection sizes.
    pub fn len(&self) -> (usize, usize, usize) {
        (
            self.questions.len(),
            self.replies.len(),
            self.notifications.len(),
        )
    }

    /// True when all three collections are empty.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty() && self.replies.is_empty() && self.notifications.is_empty()
    }

    /// Takes and clears the dirty-collection flags.
    pub fn drain_dirty(&mut self) -> Dirty {
        std::mem::take(&mut self.dirty)
    }

    /// Generation of the last applied mutation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    fn questions_iter(&self) -> impl Iterator<Item = &Question> {
        self.question_order
            .iter()
            .filter_map(|id| self.questions.get(id))
    }

    fn push_notification(&mut self, notification: Notification) {
        self.notification_order.insert(0, notification.id.clone());
        self.notifications
            .insert(notification.id.clone(), notification);
    }

    fn touch(&mut self, dirty: Dirty) {
        self.dirty.questions |= dirty.questions;
        self.dirty.replies |= dirty.replies;
        self.dirty.notifications |= dirty.notifications;
        self.generation += 1;
    }

    /// Ids combine a wall-clock millisecond stamp with a per-store serial;
    /// collisions across store instances are accepted as negligible.
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.serial += 1;
        format!(
            "{prefix}-{}-{}",
            Utc::now().timestamp_millis(),
            self.serial
        )
    }
}

fn toggle_liker(liked_by: &mut Vec<UserId>, user: &UserId) -> LikeToggle {
    if let Some(pos) = liked_by.iter().position(|u| u == user) {
        liked_by.remove(pos);
        LikeToggle::Unliked
    } else {
        liked_by.push(user.clone());
        LikeToggle::Liked
    }
}
