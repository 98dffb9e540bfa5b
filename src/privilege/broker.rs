//! Client interface to a brokered-privilege service.
//!
//! The broker is a separate privileged process that runs commands on our
//! behalf once the user has granted us its permission. Only its stable,
//! versioned surface is modelled here; a broker that cannot offer remote
//! process execution through that surface is simply unavailable.

/// Our permission standing with the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerPermission {
    Granted,
    Denied,
    /// The broker speaks a legacy protocol without a permission model.
    Unsupported,
}

/// Failure reported by the broker while running a remote process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    #[error("broker is not reachable: {0}")]
    NotReachable(String),
    #[error("broker refused the request: {0}")]
    Refused(String),
    #[error("remote process failed: {0}")]
    Remote(String),
}

/// Versioned client to the privilege broker.
pub trait PrivilegeBroker: Send + Sync {
    /// Cheap liveness check of the broker binder/socket.
    fn ping(&self) -> bool;

    /// Current permission state for this caller.
    fn permission(&self) -> BrokerPermission;

    /// Whether this broker version exposes remote process execution.
    fn supports_remote_process(&self) -> bool {
        true
    }

    /// Run `argv` as a remote process and wait for its exit code.
    fn run_process(&self, argv: &[&str]) -> Result<i32, BrokerError>;
}

/// Broker used when no broker integration is present on the device.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBroker;

impl PrivilegeBroker for NoBroker {
    fn ping(&self) -> bool {
        false
    }

    fn permission(&self) -> BrokerPermission {
        BrokerPermission::Denied
    }

    fn supports_remote_process(&self) -> bool {
        false
    }

    fn run_process(&self, _argv: &[&str]) -> Result<i32, BrokerError> {
        Err(BrokerError::NotReachable("no broker installed".to_owned()))
    }
}
