//! Authoritative in-memory campus Q&A state with per-collection JSON
//! snapshots in a local SQLite key/value store.
//!
//! The crate owns three newest-first collections (questions, replies, and
//! notifications) and funnels every write through [`core::store::QaStore`].
//! Likes toggle, deletions cascade, and like/reply mutations fan out
//! notifications to the affected owner. A single-writer runtime
//! ([`runtime::handle::spawn_askseniors`]) serializes all operations and
//! persists dirty collections in the background, best-effort.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::QaStore`]:
//! ```
//! use askseniors::{
//!     core::store::QaStore,
//!     identity::Identity,
//!     question::QuestionDraft,
//!     types::{Audience, Category, Role},
//! };
//!
//! let mut store = QaStore::new();
//! let qid = store.add_question(QuestionDraft {
//!     title: "How to prepare for Google interviews?".to_string(),
//!     content: "3rd year CSE here, where do I start?".to_string(),
//!     author: "Rahul Kumar".to_string(),
//!     author_id: "user-1".to_string(),
//!     author_year: Some("3rd Year".to_string()),
//!     author_branch: Some("CSE".to_string()),
//!     author_role: Role::Student,
//!     tags: vec!["Placement".to_string(), "Interview".to_string()],
//!     category: Category::Placement,
//!     target_audience: vec![Audience::Seniors, Audience::Alumni],
//!     is_anonymous: false,
//! });
//!
//! let senior = Identity::new("user-2", "Priya Sharma", Role::Alumni);
//! store.like_question(&senior, &qid).expect("like");
//! assert_eq!(store.get_question(&qid).expect("question").likes, 1);
//! assert_eq!(store.unread_count(&"user-1".to_string()), 1);
//! ```
//!
//! Runtime usage with the SQLite sink:
//! ```no_run
//! use askseniors::{
//!     core::store::QaStore,
//!     identity::Identity,
//!     persist::sqlite::SqliteStateSink,
//!     runtime::handle::{RuntimeConfig, spawn_askseniors},
//!     types::Role,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let sink = SqliteStateSink::open("askseniors.db").expect("open sqlite");
//! let store = sink.load_store().expect("load");
//! let handle = spawn_askseniors(store, Some(Box::new(sink)), RuntimeConfig::default());
//! handle
//!     .sign_in(Identity::new("user-1", "Rahul Kumar", Role::Student))
//!     .await
//!     .expect("sign in");
//! let unread = handle.unread_count().await.expect("unread");
//! println!("{unread} unread notifications");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Core in-memory store.
pub mod core;
/// Acting-identity collaborator type.
pub mod identity;
/// Notification record.
pub mod notification;
/// Persistence abstraction and SQLite implementation.
pub mod persist;
/// Question and reply records and drafts.
pub mod question;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared id aliases and fixed enumerations.
pub mod types;
