//! Value types for chats, messages and video attachments.
//!
//! Everything here is a plain snapshot copied out of adapter updates — the
//! wire representation stays behind the adapter and never leaks into these
//! types.

use std::fmt;

// ─── FileRef ─────────────────────────────────────────────────────────────────

/// Opaque handle to a remote file, issued by the adapter.
///
/// Only meaningful when passed back to the same adapter instance (e.g. in a
/// [`crate::adapter::Request::DownloadFile`] request).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileRef(pub i32);

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

// ─── ChatKind ────────────────────────────────────────────────────────────────

/// Classification of a chat.
///
/// `Unknown` absorbs kinds the remote service may add later, so update
/// handling never has to reject a chat over its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChatKind {
    /// One-to-one conversation.
    Private,
    /// Small group chat.
    Group,
    /// Large group (megagroup).
    Supergroup,
    /// Broadcast channel.
    Channel,
    /// End-to-end encrypted chat.
    Secret,
    /// Anything the adapter could not classify.
    #[default]
    Unknown,
}

// ─── Chat ────────────────────────────────────────────────────────────────────

/// Summary of a remote chat, as assembled from push updates.
///
/// The `id` is stable for the lifetime of the adapter session and is the only
/// key the directory cache uses. Chats are never created locally — every
/// instance originates in a `NewChat` / `ChatChanged` update.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chat {
    pub id:           i64,
    pub title:        String,
    pub kind:         ChatKind,
    /// Preview text of the most recent message, if the service sent one.
    pub last_message: Option<String>,
    /// Avatar file, if the chat has one.
    pub photo:        Option<FileRef>,
}

// ─── VideoAttachment ─────────────────────────────────────────────────────────

/// Descriptor of a video attached to a message.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VideoAttachment {
    pub file:          FileRef,
    pub duration_secs: i32,
    pub size_bytes:    i64,
}

// ─── Message ─────────────────────────────────────────────────────────────────

/// A single message from a chat. Immutable once constructed.
///
/// Message ids are unique only within their chat — the composite key is
/// `(chat_id, id)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub id:      i64,
    pub chat_id: i64,
    /// Message text, or the caption for video messages. May be empty.
    pub text:    String,
    /// Origination time, seconds since the Unix epoch.
    pub date:    i64,
    pub video:   Option<VideoAttachment>,
}

impl Message {
    /// `true` if this message carries a video attachment.
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }
}
