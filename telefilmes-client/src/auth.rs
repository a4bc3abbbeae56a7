//! The authentication state machine.
//!
//! The remote service drives login through authorization-state updates; this
//! module folds them into a single observable [`AuthPhase`]. The transition
//! logic itself is a pure function ([`next_phase`]) so the whole table can be
//! unit-tested by replaying event sequences; [`AuthMachine`] adds the watch
//! publishing and the side effects each transition asks for.

use tokio::sync::watch;

use crate::adapter::AuthUpdate;

// ─── AuthPhase ───────────────────────────────────────────────────────────────

/// The single current stage of the authentication handshake.
///
/// Exactly one phase is current at any time. `Failed` is recoverable by
/// resubmitting credentials; `Authenticated` regresses to `Idle` via logout
/// or session close.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuthPhase {
    #[default]
    Idle,
    AwaitingPhoneNumber,
    AwaitingCode { phone: String },
    AwaitingPassword { phone: String },
    Authenticated,
    Failed { reason: String },
}

impl AuthPhase {
    /// `true` once the handshake has completed.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

// ─── AuthAction ──────────────────────────────────────────────────────────────

/// Side effect a transition asks the dispatcher to perform.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AuthAction {
    /// Send connection/registration parameters.
    SubmitParams,
    /// Kick off the initial chat-list fetch.
    FetchChats,
    /// Drop the directory cache (session closed).
    ClearCache,
}

// ─── Pure transition function ────────────────────────────────────────────────

/// Fold one authorization update into the current phase.
///
/// `last_phone` is the most recently submitted phone number; the service's
/// wait-code/wait-password updates do not carry it, so the machine threads it
/// through. Transitions are idempotent under duplicate updates.
pub(crate) fn next_phase(current: &AuthPhase, update: &AuthUpdate, last_phone: &str) -> AuthPhase {
    match update {
        // Parameter requests leave the phase alone; the reply is a side effect.
        AuthUpdate::WaitParameters => current.clone(),
        AuthUpdate::WaitPhoneNumber => AuthPhase::AwaitingPhoneNumber,
        AuthUpdate::WaitCode => AuthPhase::AwaitingCode { phone: last_phone.to_string() },
        AuthUpdate::WaitPassword => AuthPhase::AwaitingPassword { phone: last_phone.to_string() },
        AuthUpdate::Ready => AuthPhase::Authenticated,
        AuthUpdate::Closed => AuthPhase::Idle,
        AuthUpdate::Error { message } => AuthPhase::Failed { reason: message.clone() },
    }
}

/// The side effect, if any, an update demands regardless of current phase.
pub(crate) fn action_for(update: &AuthUpdate) -> Option<AuthAction> {
    match update {
        AuthUpdate::WaitParameters => Some(AuthAction::SubmitParams),
        AuthUpdate::Ready => Some(AuthAction::FetchChats),
        AuthUpdate::Closed => Some(AuthAction::ClearCache),
        _ => None,
    }
}

// ─── AuthMachine ─────────────────────────────────────────────────────────────

/// Owns the current [`AuthPhase`] and publishes every change.
///
/// Mutated only by the dispatcher task (adapter updates) and by explicit
/// facade calls (validation failures, logout), so interior state stays behind
/// one mutex.
pub(crate) struct AuthMachine {
    phase_tx:   watch::Sender<AuthPhase>,
    last_phone: std::sync::Mutex<String>,
}

impl AuthMachine {
    pub(crate) fn new() -> Self {
        let (phase_tx, _) = watch::channel(AuthPhase::Idle);
        Self { phase_tx, last_phone: std::sync::Mutex::new(String::new()) }
    }

    pub(crate) fn phase(&self) -> AuthPhase {
        self.phase_tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<AuthPhase> {
        self.phase_tx.subscribe()
    }

    /// Remember the phone the caller just submitted.
    pub(crate) fn note_phone(&self, phone: &str) {
        let mut last = self.last_phone.lock().unwrap_or_else(|e| e.into_inner());
        *last = phone.to_string();
    }

    /// Apply one authorization update; returns the side effect to perform.
    pub(crate) fn handle(&self, update: &AuthUpdate) -> Option<AuthAction> {
        let last_phone = self.last_phone.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let next = next_phase(&self.phase_tx.borrow(), update, &last_phone);
        self.set_phase(next);
        action_for(update)
    }

    /// Force the phase (validation failures, logout, fatal adapter errors).
    pub(crate) fn set_phase(&self, phase: AuthPhase) {
        self.phase_tx.send_if_modified(|current| {
            if *current == phase {
                false
            } else {
                tracing::info!("auth phase: {current:?} → {phase:?}");
                *current = phase;
                true
            }
        });
    }
}
