//! # telefilmes-client
//!
//! Async client for a remote messaging service used as a content source.
//! Drives an opaque, callback-based protocol adapter through the login
//! handshake, correlates fire-and-forget requests with eventually-arriving
//! responses, and maintains an in-memory directory of chats and messages
//! built entirely from push updates.
//!
//! ## Features
//! - Phone + code + password login, exposed as one observable [`AuthPhase`]
//! - Correlation-id request/response matching over a single pending table
//! - Chat directory and per-chat message lists as watchable snapshots
//! - Video message history (newest-first) and file download tracking
//! - Coarse shutdown: pending requests are abandoned, never left dangling
//!
//! The adapter itself (wire format, cryptography, transport) is external —
//! see [`adapter::ProtocolAdapter`] for the contract it must satisfy.

#![deny(unsafe_code)]

pub mod adapter;
mod auth;
mod correlator;
mod directory;
mod errors;
mod models;

pub use adapter::{AdapterEvent, AuthUpdate, EventReceiver, EventSender, ProtocolAdapter,
                  Request, RequestEnvelope, Response, Update, event_channel};
pub use auth::AuthPhase;
pub use directory::MessageMap;
pub use errors::{ClientError, RpcError};
pub use models::{Chat, ChatKind, FileRef, Message, VideoAttachment};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use auth::{AuthAction, AuthMachine};
use correlator::RequestCorrelator;
use directory::DirectoryCache;

/// Codes shorter than this are rejected locally, without a round trip.
const MIN_CODE_LEN: usize = 5;

// ─── Local validation ─────────────────────────────────────────────────────────
//
// Obviously invalid input never reaches the adapter. Failures are typed as
// [`ClientError::InvalidInput`] and then surfaced through the auth phase the
// same way a rejected request would be.

fn validate_phone(phone: &str) -> Result<&str, ClientError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(ClientError::InvalidInput("phone number must not be empty".into()));
    }
    Ok(phone)
}

fn validate_code(code: &str) -> Result<&str, ClientError> {
    let code = code.trim();
    if code.len() < MIN_CODE_LEN {
        return Err(ClientError::InvalidInput("code too short".into()));
    }
    Ok(code)
}

fn validate_password(password: &str) -> Result<&str, ClientError> {
    if password.is_empty() {
        return Err(ClientError::InvalidInput("password must not be empty".into()));
    }
    Ok(password)
}

// ─── Config ───────────────────────────────────────────────────────────────────

/// Configuration for [`Client::connect`].
///
/// Credentials are read once, at adapter initialization time; changing them
/// requires recreating the adapter and the client.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_id:   i32,
    pub api_hash: String,
    /// How many chats to ask for on the initial and refreshed chat-list fetch.
    pub chat_list_limit: i32,
    /// Default history slice size for background message fetches.
    pub history_limit:   i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_id:          0,
            api_hash:        String::new(),
            chat_list_limit: 100,
            history_limit:   50,
        }
    }
}

// ─── ClientInner ─────────────────────────────────────────────────────────────

struct ClientInner {
    adapter:    Arc<dyn ProtocolAdapter>,
    correlator: RequestCorrelator,
    auth:       AuthMachine,
    directory:  DirectoryCache,
    config:     Config,
    closed:     AtomicBool,
    dispatcher: std::sync::Mutex<Option<JoinHandle<()>>>,
}

/// The messaging facade. Cheap to clone — internally Arc-wrapped.
///
/// Every mutating operation is fire-and-forget: results surface later through
/// the observable auth phase, chat collection and message collections, not
/// through return values. [`Client::fetch_messages`] is the one exception —
/// it returns a cached snapshot immediately.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    // ── Construction ───────────────────────────────────────────────────────

    /// Wire the client to an adapter and start dispatching its events.
    ///
    /// The adapter must have been constructed with the sender half of the
    /// `events` channel (see [`event_channel`]). The client owns the adapter
    /// exclusively from here on; it is torn down by [`Client::shutdown`].
    ///
    /// Must be called from within a Tokio runtime — the dispatcher task is
    /// spawned here.
    pub fn connect(config: Config, adapter: Arc<dyn ProtocolAdapter>, events: EventReceiver) -> Self {
        let inner = Arc::new(ClientInner {
            adapter,
            correlator: RequestCorrelator::new(),
            auth:       AuthMachine::new(),
            directory:  DirectoryCache::new(),
            config,
            closed:     AtomicBool::new(false),
            dispatcher: std::sync::Mutex::new(None),
        });

        let handle = tokio::spawn(Self::run_dispatcher(Arc::clone(&inner), events));
        *inner.dispatcher.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);

        Self { inner }
    }

    // ── Dispatcher ─────────────────────────────────────────────────────────

    /// Single-writer task: drains adapter events in arrival order and applies
    /// every state mutation. Responses go to the correlator, updates to the
    /// auth machine and the directory cache.
    async fn run_dispatcher(inner: Arc<ClientInner>, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            match event {
                AdapterEvent::Response { id, result } => {
                    if let Err(rpc) = &result {
                        tracing::debug!("← req #{id} failed: {rpc}");
                    }
                    inner.correlator.resolve(id, result);
                }
                AdapterEvent::Update(update) => Self::apply_update(&inner, update),
            }
        }
        // Channel gone without an explicit shutdown: the adapter died on us.
        if !inner.closed.load(Ordering::SeqCst) {
            tracing::warn!("adapter event stream ended unexpectedly");
            inner.auth.set_phase(AuthPhase::Failed { reason: "adapter connection lost".into() });
            inner.correlator.abandon_all();
        }
    }

    fn apply_update(inner: &Arc<ClientInner>, update: Update) {
        match update {
            Update::Auth(auth_update) => {
                match inner.auth.handle(&auth_update) {
                    Some(AuthAction::SubmitParams) => {
                        let request = Request::SetConnectionParams {
                            api_id:   inner.config.api_id,
                            api_hash: inner.config.api_hash.clone(),
                        };
                        Self::fire(inner, request);
                    }
                    Some(AuthAction::FetchChats) => {
                        Self::fire(inner, Request::LoadChats { limit: inner.config.chat_list_limit });
                    }
                    Some(AuthAction::ClearCache) => inner.directory.clear(),
                    None => {}
                }
            }
            Update::NewChat(chat) | Update::ChatChanged(chat) => {
                inner.directory.apply_chat_update(chat);
            }
            Update::NewMessage(message) => {
                inner.directory.apply_message_update(message);
            }
            Update::FileDownloaded { file, local_path } => {
                inner.directory.record_download(file, local_path);
            }
        }
    }

    // ── Request plumbing ───────────────────────────────────────────────────

    /// Submit a request and await its response.
    ///
    /// Protocol errors on authentication steps additionally fold into
    /// [`AuthPhase::Failed`]; every other failure stays per-request.
    async fn invoke(inner: &Arc<ClientInner>, request: Request) -> Result<Response, ClientError> {
        if inner.closed.load(Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }
        let is_auth_step = request.is_auth_step();
        let handle = inner.correlator.submit(inner.adapter.as_ref(), request);
        match handle.await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(rpc)) => {
                if is_auth_step {
                    inner.auth.set_phase(AuthPhase::Failed { reason: rpc.message.clone() });
                }
                Err(rpc.into())
            }
            // Sender dropped: abandoned at shutdown.
            Err(_) => Err(ClientError::Dropped),
        }
    }

    /// Fire a request whose outcome only matters through observable state.
    fn fire(inner: &Arc<ClientInner>, request: Request) {
        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            if let Err(e) = Self::invoke(&inner, request).await {
                tracing::debug!("background request failed: {e}");
            }
        });
    }

    fn guard_open(&self) -> bool {
        if self.inner.closed.load(Ordering::SeqCst) {
            tracing::warn!("operation ignored: client is shut down");
            return false;
        }
        true
    }

    /// Surface a local validation failure the same way a rejected request is.
    fn reject_input(&self, error: ClientError) {
        tracing::debug!("rejected locally: {error}");
        self.inner.auth.set_phase(AuthPhase::Failed { reason: error.reason() });
    }

    // ── Login ──────────────────────────────────────────────────────────────

    /// Submit the user's phone number. Progress surfaces via [`AuthPhase`].
    pub fn submit_phone_number(&self, phone: &str) {
        if !self.guard_open() {
            return;
        }
        let phone = match validate_phone(phone) {
            Ok(p) => p,
            Err(e) => return self.reject_input(e),
        };
        self.inner.auth.note_phone(phone);
        Self::fire(&self.inner, Request::SetPhoneNumber { phone: phone.to_string() });
    }

    /// Submit the login code sent to the phone.
    ///
    /// Codes shorter than 5 digits are rejected locally — obviously invalid
    /// input is not worth a round trip.
    pub fn submit_code(&self, code: &str) {
        if !self.guard_open() {
            return;
        }
        let code = match validate_code(code) {
            Ok(c) => c,
            Err(e) => return self.reject_input(e),
        };
        Self::fire(&self.inner, Request::CheckCode { code: code.to_string() });
    }

    /// Submit the two-step password.
    pub fn submit_password(&self, password: &str) {
        if !self.guard_open() {
            return;
        }
        let password = match validate_password(password) {
            Ok(p) => p,
            Err(e) => return self.reject_input(e),
        };
        Self::fire(&self.inner, Request::CheckPassword { password: password.to_string() });
    }

    // ── Chats & messages ───────────────────────────────────────────────────

    /// Ask the service to resend the chat list. No-op unless authenticated.
    pub fn refresh_chats(&self) {
        if !self.guard_open() {
            return;
        }
        if !self.inner.auth.phase().is_authenticated() {
            tracing::debug!("refresh_chats ignored: not authenticated");
            return;
        }
        Self::fire(&self.inner, Request::LoadChats { limit: self.inner.config.chat_list_limit });
    }

    /// Up to `limit` most-recent-first messages for the chat.
    ///
    /// Returns the cached snapshot immediately. If the chat has no cached
    /// history yet, a background fetch is synthesized; its result replaces
    /// the cache wholesale and republishes the message observable.
    pub fn fetch_messages(&self, chat_id: i64, limit: usize) -> Vec<Message> {
        match self.inner.directory.messages_snapshot(chat_id, limit) {
            Some(snapshot) => snapshot,
            None => {
                if self.guard_open() {
                    let inner = Arc::clone(&self.inner);
                    let history_limit = self.inner.config.history_limit;
                    tokio::spawn(async move {
                        let request = Request::GetChatHistory {
                            chat_id,
                            from_message_id: 0,
                            limit: history_limit,
                        };
                        match Self::invoke(&inner, request).await {
                            Ok(Response::Messages(messages)) => {
                                inner.directory.replace_history(chat_id, messages);
                            }
                            Ok(other) => {
                                tracing::warn!("unexpected history response for chat {chat_id}: {other:?}");
                            }
                            Err(e) => tracing::debug!("history fetch for chat {chat_id} failed: {e}"),
                        }
                    });
                }
                Vec::new()
            }
        }
    }

    /// Start downloading a file. Completion surfaces as a `FileDownloaded`
    /// update; the landing path is then available via [`Client::download_path`].
    pub fn request_download(&self, file: FileRef) {
        if !self.guard_open() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match Self::invoke(&inner, Request::DownloadFile { file }).await {
                // Some adapters answer immediately when the file is local.
                Ok(Response::File { file, local_path }) => {
                    inner.directory.record_download(file, local_path);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("download of {file} failed: {e}"),
            }
        });
    }

    /// Local path of a completed download, if any.
    pub fn download_path(&self, file: FileRef) -> Option<String> {
        self.inner.directory.download_path(file)
    }

    // ── Session ────────────────────────────────────────────────────────────

    /// Invalidate the session and drop the directory cache.
    pub fn logout(&self) {
        if !self.guard_open() {
            return;
        }
        tracing::info!("logging out");
        Self::fire(&self.inner, Request::LogOut);
        self.inner.directory.clear();
        self.inner.auth.set_phase(AuthPhase::Idle);
    }

    /// Release the adapter and abandon all pending work.
    ///
    /// Requests still in flight resolve to [`ClientError::Dropped`] for any
    /// task awaiting them; the adapter must not be used afterwards.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return; // already down
        }
        tracing::info!("shutting down");
        // Best-effort goodbye; we do not wait for the acknowledgement.
        let _ = self.inner.correlator.submit(self.inner.adapter.as_ref(), Request::Close);
        self.inner.adapter.close();
        self.inner.correlator.abandon_all();
        if let Some(handle) = self.inner.dispatcher.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
        self.inner.auth.set_phase(AuthPhase::Idle);
    }

    // ── Observables ────────────────────────────────────────────────────────

    /// The current authentication phase.
    pub fn auth_phase(&self) -> AuthPhase {
        self.inner.auth.phase()
    }

    /// Watch the authentication phase.
    pub fn watch_auth_phase(&self) -> watch::Receiver<AuthPhase> {
        self.inner.auth.subscribe()
    }

    /// Snapshot of the current chat collection, ordered by chat id.
    pub fn chats(&self) -> Vec<Chat> {
        self.inner.directory.chats()
    }

    /// Watch the chat collection. Each published value is a full snapshot.
    pub fn watch_chats(&self) -> watch::Receiver<Vec<Chat>> {
        self.inner.directory.subscribe_chats()
    }

    /// Watch the per-chat message collections.
    pub fn watch_messages(&self) -> watch::Receiver<MessageMap> {
        self.inner.directory.subscribe_messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failures_are_invalid_input() {
        assert!(matches!(validate_phone("   "), Err(ClientError::InvalidInput(_))));
        assert!(matches!(validate_code("1234"), Err(ClientError::InvalidInput(_))));
        assert!(matches!(validate_password(""), Err(ClientError::InvalidInput(_))));
    }

    #[test]
    fn validation_reason_is_the_bare_message() {
        let e = validate_code("42").unwrap_err();
        assert_eq!(e.reason(), "code too short");
        assert_eq!(e.to_string(), "invalid input: code too short");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(validate_phone(" +55 11 98765 ").unwrap(), "+55 11 98765");
        assert_eq!(validate_code(" 12345 ").unwrap(), "12345");
    }
}
