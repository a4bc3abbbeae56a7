//! In-memory directory of remote chats and their messages.
//!
//! Built entirely from push updates and history fetches; nothing here is ever
//! created locally. One coarse mutex guards both maps (request volume is low),
//! and every mutation republishes a full snapshot through a watch channel so
//! downstream consumers never deal in deltas.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::models::{Chat, FileRef, Message};

/// Snapshot of every cached message list, keyed by chat id.
pub type MessageMap = Arc<HashMap<i64, Vec<Message>>>;

struct DirectoryState {
    chats:     HashMap<i64, Chat>,
    messages:  HashMap<i64, Vec<Message>>,
    /// Local paths of completed downloads, keyed by file ref.
    downloads: HashMap<FileRef, String>,
}

pub(crate) struct DirectoryCache {
    state:       Mutex<DirectoryState>,
    chats_tx:    watch::Sender<Vec<Chat>>,
    messages_tx: watch::Sender<MessageMap>,
}

impl DirectoryCache {
    pub(crate) fn new() -> Self {
        let (chats_tx, _) = watch::channel(Vec::new());
        let (messages_tx, _) = watch::channel(Arc::new(HashMap::new()));
        Self {
            state: Mutex::new(DirectoryState {
                chats:     HashMap::new(),
                messages:  HashMap::new(),
                downloads: HashMap::new(),
            }),
            chats_tx,
            messages_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Mutations ──────────────────────────────────────────────────────────
    //
    // Three writer contexts touch these: the dispatcher task, background
    // history-fetch tasks, and the caller thread via logout. Publishing
    // happens while the state lock is still held so snapshot order always
    // equals mutation order — a watcher can never be left on a snapshot that
    // contradicts the maps. `send_replace` does not block, so holding the
    // mutex across it is fine.

    /// Upsert a chat by id, then republish the full chat snapshot.
    pub(crate) fn apply_chat_update(&self, chat: Chat) {
        let mut state = self.lock();
        state.chats.insert(chat.id, chat);
        let _ = self.chats_tx.send_replace(chat_snapshot(&state.chats));
    }

    /// Append a live message to its chat's list, creating the list if absent.
    pub(crate) fn apply_message_update(&self, message: Message) {
        let mut state = self.lock();
        state.messages.entry(message.chat_id).or_default().push(message);
        let _ = self.messages_tx.send_replace(message_snapshot(&state.messages));
    }

    /// Replace a chat's cached history wholesale (newest-first, as fetched).
    ///
    /// Remote order is authoritative for a fresh fetch; live updates that
    /// raced the fetch are dropped — last write wins.
    pub(crate) fn replace_history(&self, chat_id: i64, messages: Vec<Message>) {
        let mut state = self.lock();
        state.messages.insert(chat_id, messages);
        let _ = self.messages_tx.send_replace(message_snapshot(&state.messages));
    }

    /// Record where a completed download landed.
    pub(crate) fn record_download(&self, file: FileRef, local_path: String) {
        tracing::debug!("{file} downloaded to {local_path}");
        self.lock().downloads.insert(file, local_path);
    }

    /// Empty every map and republish empty snapshots. Used on logout/close.
    pub(crate) fn clear(&self) {
        let mut state = self.lock();
        state.chats.clear();
        state.messages.clear();
        state.downloads.clear();
        let _ = self.chats_tx.send_replace(Vec::new());
        let _ = self.messages_tx.send_replace(Arc::new(HashMap::new()));
    }

    // ── Reads (any thread, never blocking on the dispatcher) ───────────────

    pub(crate) fn chats(&self) -> Vec<Chat> {
        self.chats_tx.borrow().clone()
    }

    pub(crate) fn subscribe_chats(&self) -> watch::Receiver<Vec<Chat>> {
        self.chats_tx.subscribe()
    }

    pub(crate) fn subscribe_messages(&self) -> watch::Receiver<MessageMap> {
        self.messages_tx.subscribe()
    }

    /// Up to `limit` most-recent-first messages for the chat, or `None` if
    /// the chat has no cached entry at all (not even an empty one).
    pub(crate) fn messages_snapshot(&self, chat_id: i64, limit: usize) -> Option<Vec<Message>> {
        let state = self.lock();
        state.messages.get(&chat_id).map(|list| {
            let mut out = list.clone();
            // Histories arrive newest-first, live updates append oldest-first;
            // sorting at read time makes both paths agree.
            out.sort_by(|a, b| b.id.cmp(&a.id));
            out.truncate(limit);
            out
        })
    }

    pub(crate) fn download_path(&self, file: FileRef) -> Option<String> {
        self.lock().downloads.get(&file).cloned()
    }
}

/// Full chat list, ordered by id for a stable presentation.
fn chat_snapshot(chats: &HashMap<i64, Chat>) -> Vec<Chat> {
    let mut out: Vec<Chat> = chats.values().cloned().collect();
    out.sort_by_key(|c| c.id);
    out
}

fn message_snapshot(messages: &HashMap<i64, Vec<Message>>) -> MessageMap {
    Arc::new(messages.clone())
}
