use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    // ── Registration errors ──────────────────────────────────────────────────
    #[error("validator name is immutable: {key} is registered as {registered:?}")]
    IdentityMismatch { key: String, registered: String },

    #[error("registration closed: genesis document already finalized")]
    RegistrationClosed,

    // ── Coordinator lifecycle ────────────────────────────────────────────────
    #[error("coordinator shut down before genesis was finalized")]
    Shutdown,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}
