//! Shared id aliases and the fixed campus Q&A enumerations.

use serde::{Deserialize, Serialize};

/// Opaque unique question identifier.
pub type QuestionId = String;
/// Opaque unique reply identifier.
pub type ReplyId = String;
/// Opaque unique notification identifier.
pub type NotificationId = String;
/// Identifier of a user account.
pub type UserId = String;
/// Monotonic store mutation generation.
pub type Generation = u64;

/// Fixed question category set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Academic help.
    Academic,
    /// Placement and career.
    Placement,
    /// Internships.
    Internship,
    /// Projects and tech.
    Project,
    /// College life.
    Life,
    /// General discussion.
    General,
}

/// Category selector used on the read side.
///
/// `Feed` is the distinguished "everything" token; `Only` matches one
/// [`Category`] exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    /// All questions regardless of category.
    Feed,
    /// Questions whose category equals the given one.
    Only(Category),
}

/// Audience a question is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// Senior-year students.
    Seniors,
    /// Alumni.
    Alumni,
    /// Faculty members.
    Faculty,
    /// Everyone.
    All,
}

/// Role attached to an author or identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Current student.
    Student,
    /// Alumnus/alumna.
    Alumni,
    /// Faculty member.
    Faculty,
}

/// Kind of an emitted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Someone liked a question or reply.
    Like,
    /// Someone replied to a question.
    Reply,
    /// Someone was mentioned. Present in the wire format; no store
    /// operation currently emits it.
    Mention,
}
