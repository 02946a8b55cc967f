//! Question and reply records plus their insert drafts.
//!
//! Field names serialize in camelCase to stay byte-compatible with the
//! persisted collection layout (`authorId`, `likedBy`, `targetAudience`, …).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Audience, Category, QuestionId, ReplyId, Role, UserId};

/// Fully materialized, authoritative question record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Stable question identifier.
    pub id: QuestionId,
    /// Question title.
    pub title: String,
    /// Question body text.
    pub content: String,
    /// Author display name (may be a pseudonym when anonymous).
    pub author: String,
    /// Owning user id; gates deletion.
    pub author_id: UserId,
    /// Author study year, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_year: Option<String>,
    /// Author branch/department, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_branch: Option<String>,
    /// Author role.
    pub author_role: Role,
    /// Free-form tags, insertion order, no duplicates.
    pub tags: Vec<String>,
    /// Question category.
    pub category: Category,
    /// Audiences the question is addressed to.
    pub target_audience: Vec<Audience>,
    /// True when posted anonymously.
    pub is_anonymous: bool,
    /// Like count; always equals `liked_by.len()`.
    pub likes: u32,
    /// Reply counter, maintained alongside reply mutations.
    pub replies: u32,
    /// User ids that currently like this question.
    pub liked_by: Vec<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert payload used to create a new [`Question`].
///
/// Everything except the id, the derived counters, and the timestamps.
/// The store performs no validation on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    /// Question title.
    pub title: String,
    /// Question body text.
    pub content: String,
    /// Author display name.
    pub author: String,
    /// Owning user id.
    pub author_id: UserId,
    /// Author study year, when provided.
    pub author_year: Option<String>,
    /// Author branch/department, when provided.
    pub author_branch: Option<String>,
    /// Author role.
    pub author_role: Role,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Question category.
    pub category: Category,
    /// Audiences the question is addressed to.
    pub target_audience: Vec<Audience>,
    /// True when posted anonymously.
    pub is_anonymous: bool,
}

/// Fully materialized reply record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Stable reply identifier.
    pub id: ReplyId,
    /// Parent question id. Weak reference: used for lookup and cascade.
    pub question_id: QuestionId,
    /// Reply body text.
    pub content: String,
    /// Author display name.
    pub author: String,
    /// Owning user id; gates deletion.
    pub author_id: UserId,
    /// Author role.
    pub author_role: Role,
    /// Like count; always equals `liked_by.len()`.
    pub likes: u32,
    /// User ids that currently like this reply.
    pub liked_by: Vec<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload used to create a new [`Reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    /// Parent question id.
    pub question_id: QuestionId,
    /// Reply body text.
    pub content: String,
    /// Author display name.
    pub author: String,
    /// Owning user id.
    pub author_id: UserId,
    /// Author role.
    pub author_role: Role,
}
