use std::sync::Arc;

use hashbrown::HashMap;
use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};

use crate::{
    core::store::{LikeToggle, QaStore, StoreError},
    identity::Identity,
    notification::Notification,
    persist::{CollectionKey, PersistError, StateSink},
    question::{Question, QuestionDraft, Reply, ReplyDraft},
    types::{CategoryFilter, Generation, NotificationId, QuestionId, ReplyId},
};

use super::events::QaEvent;

/// Failure modes surfaced by [`QaHandle`] operations.
#[derive(Debug)]
pub enum RuntimeError {
    /// The store rejected the mutation.
    Store(StoreError),
    /// Persistence failed.
    Persist(PersistError),
    /// The operation needs a signed-in identity and none is set.
    SignedOut,
    /// The runtime loop is gone.
    ChannelClosed,
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PersistError> for RuntimeError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

/// Tunables for the runtime and its persistence worker.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Write dirty collections to the sink as soon as they arrive instead
    /// of waiting for the coalescing deadline.
    pub flush_on_write: bool,
    /// Upper bound on how long a dirty collection may sit unwritten, in
    /// milliseconds.
    pub coalesce_max_latency_ms: u64,
    /// Bound of the persistence queue. Enqueueing is best-effort; a full
    /// queue drops the write and a later one supersedes it.
    pub persist_queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            flush_on_write: true,
            coalesce_max_latency_ms: 75,
            persist_queue_bound: 64,
        }
    }
}

/// Cloneable handle to the single-writer runtime loop.
pub struct QaHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<QaEvent>,
}

impl Clone for QaHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    SignIn {
        identity: Identity,
        resp: oneshot::Sender<()>,
    },
    SignOut {
        resp: oneshot::Sender<()>,
    },
    AddQuestion {
        draft: QuestionDraft,
        resp: oneshot::Sender<QuestionId>,
    },
    DeleteQuestion {
        id: QuestionId,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    LikeQuestion {
        id: QuestionId,
        resp: oneshot::Sender<Result<Option<LikeToggle>, RuntimeError>>,
    },
    AddReply {
        draft: ReplyDraft,
        resp: oneshot::Sender<Result<ReplyId, RuntimeError>>,
    },
    DeleteReply {
        id: ReplyId,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    LikeReply {
        id: ReplyId,
        resp: oneshot::Sender<Result<Option<LikeToggle>, RuntimeError>>,
    },
    MarkNotificationRead {
        id: NotificationId,
        resp: oneshot::Sender<bool>,
    },
    UnreadCount {
        resp: oneshot::Sender<usize>,
    },
    Notifications {
        resp: oneshot::Sender<Vec<Notification>>,
    },
    GetQuestion {
        id: QuestionId,
        resp: oneshot::Sender<Option<Question>>,
    },
    Questions {
        resp: oneshot::Sender<Vec<Question>>,
    },
    RepliesFor {
        question_id: QuestionId,
        resp: oneshot::Sender<Vec<Reply>>,
    },
    ByCategory {
        filter: CategoryFilter,
        resp: oneshot::Sender<Vec<Question>>,
    },
    Search {
        query: String,
        resp: oneshot::Sender<Vec<Question>>,
    },
    Flush {
        resp: oneshot::Sender<Result<Generation, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

enum PersistMsg {
    Write {
        entries: Vec<(CollectionKey, Vec<u8>)>,
        generation: Generation,
    },
    Flush {
        resp: oneshot::Sender<Result<Generation, PersistError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Spawns the single-writer runtime around `store`.
///
/// With a sink, every mutation enqueues its dirty collections to a
/// persistence worker; the write is best-effort and never awaited by the
/// mutating caller. Without a sink, state is in-memory only.
pub fn spawn_askseniors(
    store: QaStore,
    sink: Option<Box<dyn StateSink>>,
    config: RuntimeConfig,
) -> QaHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<QaEvent>(1024);

    let (persist_tx_opt, mut durable_rx) = if let Some(sink) = sink {
        let (persist_tx, persist_rx) = mpsc::channel::<PersistMsg>(config.persist_queue_bound);
        let (durable_tx, durable_rx) = mpsc::unbounded_channel::<Result<Generation, PersistError>>();
        spawn_persistence_worker(sink, persist_rx, durable_tx, config.clone());
        (Some(persist_tx), Some(durable_rx))
    } else {
        (None, None)
    };

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut store = store;
        let mut session: Option<Identity> = None;

        loop {
            if let Some(rx) = durable_rx.as_mut() {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        let Some(cmd) = cmd else { break; };
                        let done = handle_command(
                            cmd,
                            &mut store,
                            &mut session,
                            &events_tx_loop,
                            persist_tx_opt.as_ref(),
                        ).await;
                        if done {
                            break;
                        }
                    }
                    durable = rx.recv() => {
                        if let Some(Ok(generation)) = durable {
                            let _ = events_tx_loop.send(QaEvent::SavedUpTo { generation });
                        }
                    }
                }
            } else {
                let Some(cmd) = cmd_rx.recv().await else { break; };
                let done = handle_command(
                    cmd,
                    &mut store,
                    &mut session,
                    &events_tx_loop,
                    persist_tx_opt.as_ref(),
                )
                .await;
                if done {
                    break;
                }
            }
        }
    });

    QaHandle { cmd_tx, events_tx }
}

impl QaHandle {
    /// Subscribes to the runtime event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<QaEvent> {
        self.events_tx.subscribe()
    }

    /// Sets the acting identity for subsequent attribution-gated calls.
    pub async fn sign_in(&self, identity: Identity) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SignIn { identity, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Clears the acting identity. Read-side queries keep working.
    pub async fn sign_out(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SignOut { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Creates a question. Never fails beyond a closed runtime.
    pub async fn add_question(&self, draft: QuestionDraft) -> Result<QuestionId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::AddQuestion { draft, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Deletes a question owned by the signed-in identity.
    pub async fn delete_question(&self, id: impl Into<QuestionId>) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::DeleteQuestion {
                id: id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Toggles the signed-in identity's like on a question.
    ///
    /// Returns `Ok(None)` without touching state when nobody is signed in.
    pub async fn like_question(
        &self,
        id: impl Into<QuestionId>,
    ) -> Result<Option<LikeToggle>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::LikeQuestion {
                id: id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Creates a reply to an existing question.
    pub async fn add_reply(&self, draft: ReplyDraft) -> Result<ReplyId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::AddReply { draft, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Deletes a reply owned by the signed-in identity.
    pub async fn delete_reply(&self, id: impl Into<ReplyId>) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::DeleteReply {
                id: id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Toggles the signed-in identity's like on a reply.
    pub async fn like_reply(
        &self,
        id: impl Into<ReplyId>,
    ) -> Result<Option<LikeToggle>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::LikeReply {
                id: id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// One-way mark-as-read; true when the flag transitioned.
    pub async fn mark_notification_read(
        &self,
        id: impl Into<NotificationId>,
    ) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::MarkNotificationRead {
                id: id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Unread notifications for the signed-in identity; zero when signed out.
    pub async fn unread_count(&self) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::UnreadCount { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Notifications addressed to the signed-in identity, newest first.
    pub async fn notifications(&self) -> Result<Vec<Notification>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Notifications { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Looks up one question.
    pub async fn get_question(
        &self,
        id: impl Into<QuestionId>,
    ) -> Result<Option<Question>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::GetQuestion {
                id: id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// All questions, newest first.
    pub async fn questions(&self) -> Result<Vec<Question>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Questions { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Replies attached to one question, newest first.
    pub async fn replies_for(
        &self,
        question_id: impl Into<QuestionId>,
    ) -> Result<Vec<Reply>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RepliesFor {
                question_id: question_id.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Questions matching a category filter, in stored order.
    pub async fn questions_by_category(
        &self,
        filter: CategoryFilter,
    ) -> Result<Vec<Question>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ByCategory { filter, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Case-insensitive substring search over questions.
    pub async fn search_questions(
        &self,
        query: impl Into<String>,
    ) -> Result<Vec<Question>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Search {
                query: query.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Drains the persistence worker and returns the covered generation.
    pub async fn flush(&self) -> Result<Generation, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Flush { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Flushes outstanding writes and stops the runtime.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }
}

async fn handle_command(
    cmd: Command,
    store: &mut QaStore,
    session: &mut Option<Identity>,
    events_tx: &broadcast::Sender<QaEvent>,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
) -> bool {
    match cmd {
        Command::SignIn { identity, resp } => {
            *session = Some(identity);
            let _ = resp.send(());
        }
        Command::SignOut { resp } => {
            *session = None;
            let _ = resp.send(());
        }
        Command::AddQuestion { draft, resp } => {
            let id = store.add_question(draft);
            persist_dirty(store, persist_tx, events_tx);
            let _ = events_tx.send(QaEvent::QuestionAdded { id: id.clone() });
            let _ = resp.send(id);
        }
        Command::DeleteQuestion { id, resp } => {
            let res = match session.as_ref() {
                None => Err(RuntimeError::SignedOut),
                Some(actor) => store
                    .delete_question(actor, &id)
                    .map_err(RuntimeError::from),
            };
            if res.is_ok() {
                persist_dirty(store, persist_tx, events_tx);
                let _ = events_tx.send(QaEvent::QuestionDeleted { id });
            }
            let _ = resp.send(res);
        }
        Command::LikeQuestion { id, resp } => {
            let res = match session.as_ref() {
                // Silent no-op without an identity.
                None => Ok(None),
                Some(actor) => store
                    .like_question(actor, &id)
                    .map(Some)
                    .map_err(RuntimeError::from),
            };
            if let Ok(Some(toggle)) = &res {
                persist_dirty(store, persist_tx, events_tx);
                let _ = events_tx.send(QaEvent::QuestionLikeToggled {
                    id,
                    liked: *toggle == LikeToggle::Liked,
                });
            }
            let _ = resp.send(res);
        }
        Command::AddReply { draft, resp } => {
            let question_id = draft.question_id.clone();
            let res = store.add_reply(draft).map_err(RuntimeError::from);
            if let Ok(id) = &res {
                persist_dirty(store, persist_tx, events_tx);
                let _ = events_tx.send(QaEvent::ReplyAdded {
                    id: id.clone(),
                    question_id,
                });
            }
            let _ = resp.send(res);
        }
        Command::DeleteReply { id, resp } => {
            let res = match session.as_ref() {
                None => Err(RuntimeError::SignedOut),
                Some(actor) => store.delete_reply(actor, &id).map_err(RuntimeError::from),
            };
            if res.is_ok() {
                persist_dirty(store, persist_tx, events_tx);
                let _ = events_tx.send(QaEvent::ReplyDeleted { id });
            }
            let _ = resp.send(res);
        }
        Command::LikeReply { id, resp } => {
            let res = match session.as_ref() {
                None => Ok(None),
                Some(actor) => store
                    .like_reply(actor, &id)
                    .map(Some)
                    .map_err(RuntimeError::from),
            };
            if let Ok(Some(toggle)) = &res {
                persist_dirty(store, persist_tx, events_tx);
                let _ = events_tx.send(QaEvent::ReplyLikeToggled {
                    id,
                    liked: *toggle == LikeToggle::Liked,
                });
            }
            let _ = resp.send(res);
        }
        Command::MarkNotificationRead { id, resp } => {
            let transitioned = store.mark_notification_read(&id);
            if transitioned {
                persist_dirty(store, persist_tx, events_tx);
                let _ = events_tx.send(QaEvent::NotificationRead { id });
            }
            let _ = resp.send(transitioned);
        }
        Command::UnreadCount { resp } => {
            let count = session
                .as_ref()
                .map_or(0, |actor| store.unread_count(&actor.id));
            let _ = resp.send(count);
        }
        Command::Notifications { resp } => {
            let out = session.as_ref().map_or_else(Vec::new, |actor| {
                store
                    .notifications_for(&actor.id)
                    .into_iter()
                    .cloned()
                    .collect()
            });
            let _ = resp.send(out);
        }
        Command::GetQuestion { id, resp } => {
            let _ = resp.send(store.get_question(&id).cloned());
        }
        Command::Questions { resp } => {
            let _ = resp.send(store.questions_cloned());
        }
        Command::RepliesFor { question_id, resp } => {
            let out = store
                .replies_for_question(&question_id)
                .into_iter()
                .cloned()
                .collect();
            let _ = resp.send(out);
        }
        Command::ByCategory { filter, resp } => {
            let out = store
                .questions_by_category(filter)
                .into_iter()
                .cloned()
                .collect();
            let _ = resp.send(out);
        }
        Command::Search { query, resp } => {
            let out = store
                .search_questions(&query)
                .into_iter()
                .cloned()
                .collect();
            let _ = resp.send(out);
        }
        Command::Flush { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (flush_tx, flush_rx) = oneshot::channel();
                if tx.send(PersistMsg::Flush { resp: flush_tx }).await.is_err() {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    flush_rx
                        .await
                        .map_err(|_| RuntimeError::ChannelClosed)
                        .and_then(|r| r.map_err(RuntimeError::from))
                }
            } else {
                Ok(store.generation())
            };
            let _ = resp.send(out);
        }
        Command::Shutdown { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (done_tx, done_rx) = oneshot::channel();
                if tx.send(PersistMsg::Shutdown { resp: done_tx }).await.is_err() {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    done_rx.await.map_err(|_| RuntimeError::ChannelClosed)
                }
            } else {
                Ok(())
            };
            let _ = resp.send(out);
            return true;
        }
    }

    false
}

/// Serializes the collections a mutation touched and hands them to the
/// persistence worker. Best-effort by contract: a full queue drops the
/// write and the next mutation's snapshot supersedes it.
fn persist_dirty(
    store: &mut QaStore,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
    events_tx: &broadcast::Sender<QaEvent>,
) {
    let dirty = store.drain_dirty();
    if !dirty.any() {
        return;
    }
    let generation = store.generation();

    let Some(tx) = persist_tx else {
        let _ = events_tx.send(QaEvent::SavedUpTo { generation });
        return;
    };

    let mut entries = Vec::new();
    if dirty.questions {
        if let Ok(payload) = serde_json::to_vec(&store.questions_cloned()) {
            entries.push((CollectionKey::Questions, payload));
        }
    }
    if dirty.replies {
        if let Ok(payload) = serde_json::to_vec(&store.replies_cloned()) {
            entries.push((CollectionKey::Replies, payload));
        }
    }
    if dirty.notifications {
        if let Ok(payload) = serde_json::to_vec(&store.notifications_cloned()) {
            entries.push((CollectionKey::Notifications, payload));
        }
    }

    let _ = tx.try_send(PersistMsg::Write {
        entries,
        generation,
    });
}

fn spawn_persistence_worker(
    sink: Box<dyn StateSink>,
    mut rx: mpsc::Receiver<PersistMsg>,
    durable_tx: mpsc::UnboundedSender<Result<Generation, PersistError>>,
    config: RuntimeConfig,
) {
    let sink = Arc::new(Mutex::new(sink));
    tokio::spawn(async move {
        let mut pending: HashMap<CollectionKey, Vec<u8>> = HashMap::new();
        let mut pending_generation: Generation = 0;
        let mut deadline = Instant::now() + Duration::from_millis(config.coalesce_max_latency_ms);
        let mut last_durable: Generation = 0;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        let _ = write_pending(&sink, &mut pending, pending_generation, &mut last_durable, &durable_tx, true).await;
                        break;
                    };

                    match msg {
                        PersistMsg::Write { entries, generation } => {
                            for (key, payload) in entries {
                                pending.insert(key, payload);
                            }
                            pending_generation = pending_generation.max(generation);

                            if config.flush_on_write {
                                let _ = write_pending(&sink, &mut pending, pending_generation, &mut last_durable, &durable_tx, true).await;
                                deadline = Instant::now() + Duration::from_millis(config.coalesce_max_latency_ms);
                            }
                        }
                        PersistMsg::Flush { resp } => {
                            let result = write_pending(&sink, &mut pending, pending_generation, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(result.map(|_| last_durable));
                            deadline = Instant::now() + Duration::from_millis(config.coalesce_max_latency_ms);
                        }
                        PersistMsg::Shutdown { resp } => {
                            let _ = write_pending(&sink, &mut pending, pending_generation, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if !pending.is_empty() => {
                    let _ = write_pending(&sink, &mut pending, pending_generation, &mut last_durable, &durable_tx, false).await;
                    deadline = Instant::now() + Duration::from_millis(config.coalesce_max_latency_ms);
                }
            }
        }
    });
}

async fn write_pending(
    sink: &Arc<Mutex<Box<dyn StateSink>>>,
    pending: &mut HashMap<CollectionKey, Vec<u8>>,
    generation: Generation,
    last_durable: &mut Generation,
    durable_tx: &mpsc::UnboundedSender<Result<Generation, PersistError>>,
    call_flush: bool,
) -> Result<(), PersistError> {
    if pending.is_empty() {
        if call_flush {
            let sink_ref = Arc::clone(sink);
            tokio::task::spawn_blocking(move || {
                let mut sink = sink_ref.blocking_lock();
                sink.flush()
            })
            .await
            .map_err(|e| PersistError::Message(format!("join error: {e}")))??;
        }
        return Ok(());
    }

    let entries: Vec<(CollectionKey, Vec<u8>)> = pending.drain().collect();
    let sink_ref = Arc::clone(sink);
    let write_res: Result<(), PersistError> = tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        for (key, payload) in &entries {
            sink.write_collection(*key, payload, generation)?;
        }
        if call_flush {
            sink.flush()?;
        }
        Ok(())
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))?;

    match write_res {
        Ok(()) => {
            *last_durable = (*last_durable).max(generation);
            let _ = durable_tx.send(Ok(*last_durable));
            Ok(())
        }
        Err(err) => {
            let _ = durable_tx.send(Err(PersistError::Message(format!(
                "write failed: {err:?}"
            ))));
            Err(err)
        }
    }
}
