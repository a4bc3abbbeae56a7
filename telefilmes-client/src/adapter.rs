//! The protocol adapter contract.
//!
//! The remote messaging protocol is driven through an opaque, callback-style
//! client: requests are fire-and-forget, each eventually answered by exactly
//! one response, while server-pushed updates arrive unbounded and unordered
//! relative to responses. This module pins that contract down as a trait plus
//! closed request/response/update sum types — the wire format itself never
//! crosses this boundary.
//!
//! An adapter implementation receives an [`AdapterEvent`] sender at
//! construction time and may invoke it from any thread; the unbounded channel
//! preserves arrival order into the client's single dispatcher task.

use tokio::sync::mpsc;

use crate::errors::RpcError;
use crate::models::{Chat, FileRef, Message};

// ─── Trait ────────────────────────────────────────────────────────────────────

/// An opaque protocol client capability.
///
/// Implementations must deliver exactly one [`AdapterEvent::Response`] per
/// envelope (carrying the envelope's correlation id), and may deliver any
/// number of [`AdapterEvent::Update`]s at any time. Both are sent through the
/// event sender the adapter was constructed with.
pub trait ProtocolAdapter: Send + Sync + 'static {
    /// Forward a request to the remote service. Must not block.
    fn send(&self, envelope: RequestEnvelope);

    /// Tear the connection down. After this returns the adapter may stop
    /// delivering events at any point; pending responses may never arrive.
    fn close(&self);
}

/// Convenience alias for the sender half an adapter writes events into.
pub type EventSender = mpsc::UnboundedSender<AdapterEvent>;

/// Convenience alias for the receiver half handed to [`crate::Client::connect`].
pub type EventReceiver = mpsc::UnboundedReceiver<AdapterEvent>;

/// Create the event channel shared between an adapter and the client.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

// ─── RequestEnvelope ─────────────────────────────────────────────────────────

/// A request tagged with its correlation id.
///
/// Ids are allocated by the correlator, strictly increasing from 0 for the
/// adapter's lifetime, and never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub id:      u64,
    pub request: Request,
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// The subset of the remote API this client drives.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Connection/registration parameters, sent when the service asks for them.
    SetConnectionParams { api_id: i32, api_hash: String },
    /// Begin login for the given phone number.
    SetPhoneNumber { phone: String },
    /// Verify the login code sent to the phone.
    CheckCode { code: String },
    /// Verify the two-step password.
    CheckPassword { password: String },
    /// Ask the service to (re)send the chat list; chats arrive as updates.
    LoadChats { limit: i32 },
    /// Fetch message history for one chat, newest-first.
    GetChatHistory { chat_id: i64, from_message_id: i64, limit: i32 },
    /// Start downloading a file; completion arrives as an update.
    DownloadFile { file: FileRef },
    /// Invalidate the session.
    LogOut,
    /// Close the connection.
    Close,
}

impl Request {
    /// `true` for requests that belong to the authentication handshake.
    ///
    /// Failures of these fold into [`crate::AuthPhase::Failed`]; failures of
    /// anything else stay per-request.
    pub fn is_auth_step(&self) -> bool {
        matches!(
            self,
            Self::SetConnectionParams { .. }
                | Self::SetPhoneNumber { .. }
                | Self::CheckCode { .. }
                | Self::CheckPassword { .. }
        )
    }
}

// ─── Response ────────────────────────────────────────────────────────────────

/// A successful result object for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Plain acknowledgement.
    Ok,
    /// History slice for a `GetChatHistory` request, newest-first.
    Messages(Vec<Message>),
    /// Immediate answer to `DownloadFile` when the file is already local.
    File { file: FileRef, local_path: String },
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Authorization-state notifications pushed by the service.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthUpdate {
    /// The service wants connection parameters before anything else.
    WaitParameters,
    /// The service is waiting for a phone number.
    WaitPhoneNumber,
    /// The service sent a code and is waiting for it.
    WaitCode,
    /// The account has a two-step password.
    WaitPassword,
    /// Authorization complete.
    Ready,
    /// The session is closed (logout finished, or connection torn down).
    Closed,
    /// The service rejected an authorization step.
    Error { message: String },
}

/// A server-pushed event, delivered outside the request/response cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Auth(AuthUpdate),
    /// A chat became known to the session.
    NewChat(Chat),
    /// An already-known chat changed (title, last message, photo…).
    ChatChanged(Chat),
    /// A message arrived in a chat.
    NewMessage(Message),
    /// A previously requested download finished.
    FileDownloaded { file: FileRef, local_path: String },
}

// ─── AdapterEvent ────────────────────────────────────────────────────────────

/// Everything an adapter can deliver back to the client.
#[derive(Debug)]
pub enum AdapterEvent {
    /// The answer to the envelope with correlation id `id`.
    Response { id: u64, result: Result<Response, RpcError> },
    /// A push update.
    Update(Update),
}
