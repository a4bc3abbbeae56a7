//! # telefilmes
//!
//! Integrates a local media catalog (series / seasons / episodes) with a
//! remote messaging service used as a content source. Two focused sub-crates
//! are wired together here for convenience:
//!
//! | Sub-crate            | Role                                              |
//! |----------------------|---------------------------------------------------|
//! | `telefilmes-client`  | Login handshake, chat directory, message history  |
//! | `telefilmes-catalog` | SQLite catalog and credential storage             |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use telefilmes::client::{Client, Config, event_channel};
//! use telefilmes::catalog::MediaStore;
//!
//! # fn wire(adapter: Arc<dyn telefilmes::client::ProtocolAdapter>) -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, rx) = event_channel();
//! // … hand `tx` to your protocol adapter implementation …
//! let client = Client::connect(Config { api_id: 94575, api_hash: "…".into(), ..Default::default() }, adapter, rx);
//! let catalog = MediaStore::open("telefilmes.sqlite")?;
//!
//! client.submit_phone_number("+550000");
//! // … later: file a video message into a season
//! if let Some(message) = client.fetch_messages(42, 10).into_iter().find(|m| m.has_video()) {
//!     catalog.save_video(&message, 1)?;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Re-export of [`telefilmes_client`] — the messaging core.
pub use telefilmes_client as client;

/// Re-export of [`telefilmes_catalog`] — catalog and credential storage.
pub use telefilmes_catalog as catalog;

// ─── Convenience re-exports ───────────────────────────────────────────────────

pub use telefilmes_client::{AuthPhase, Chat, ChatKind, Client, ClientError, Config, FileRef,
                            Message, VideoAttachment};

pub use telefilmes_catalog::{ApiCredentials, CatalogError, Episode, MediaStore, Season, Series};
