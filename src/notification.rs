//! Notification record emitted by like and reply mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{NotificationId, NotificationKind, QuestionId, ReplyId, UserId};

/// A notification addressed to one user.
///
/// Created only as a side effect of a like or reply mutation, never for
/// self-interaction. The read flag is one-way; deletion happens only by
/// cascade from the referenced question or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Stable notification identifier.
    pub id: NotificationId,
    /// Recipient user id.
    pub user_id: UserId,
    /// Notification kind.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Human-readable message.
    pub message: String,
    /// Referenced question, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
    /// Referenced reply, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_id: Option<ReplyId>,
    /// Acting user id.
    pub from_user_id: UserId,
    /// Acting user display name.
    pub from_user_name: String,
    /// True once the recipient has seen it.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
