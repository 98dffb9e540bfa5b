//! Error types for the quickslot engine.

/// Top-level error type for slot storage, trust storage, and host plumbing.
///
/// Channel and command failures are not errors: they surface as
/// [`CommandOutcome`](crate::executor::CommandOutcome) values so dispatch can
/// degrade silently.
#[derive(Debug, thiserror::Error)]
pub enum QuickSlotError {
    /// Configuration load/save error.
    #[error("config error: {0}")]
    Config(String),

    /// Slot store read/write error.
    #[error("slot store error: {0}")]
    SlotStore(String),

    /// Trust store read/write error.
    #[error("trust store error: {0}")]
    TrustStore(String),

    /// Malformed host command or bridge request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Bridge request rejected before it reached the trust gate.
    #[error("bridge request rejected: {0}")]
    BridgeRejected(#[from] crate::bridge::BridgeRejection),

    /// Platform collaborator error (launch, torch, notifier).
    #[error("platform error: {0}")]
    Platform(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, QuickSlotError>;
