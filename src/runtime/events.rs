//! Runtime event stream payloads.

use crate::types::{Generation, NotificationId, QuestionId, ReplyId};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QaEvent {
    /// A question was created.
    QuestionAdded {
        /// New question id.
        id: QuestionId,
    },
    /// A question was deleted, along with its replies and notifications.
    QuestionDeleted {
        /// Deleted question id.
        id: QuestionId,
    },
    /// A like on a question toggled.
    QuestionLikeToggled {
        /// Question id.
        id: QuestionId,
        /// True when the actor now likes it.
        liked: bool,
    },
    /// A reply was created.
    ReplyAdded {
        /// New reply id.
        id: ReplyId,
        /// Parent question id.
        question_id: QuestionId,
    },
    /// A reply was deleted.
    ReplyDeleted {
        /// Deleted reply id.
        id: ReplyId,
    },
    /// A like on a reply toggled.
    ReplyLikeToggled {
        /// Reply id.
        id: ReplyId,
        /// True when the actor now likes it.
        liked: bool,
    },
    /// A notification transitioned to read.
    NotificationRead {
        /// Notification id.
        id: NotificationId,
    },
    /// Persistence has covered at least this store generation.
    SavedUpTo {
        /// Highest generation known written.
        generation: Generation,
    },
}
