use std::fmt;

use crate::api::InvocationStatus;

/// Errors returned by transport runtime operations.
#[derive(Debug)]
pub enum TransportError {
    /// Missing or invalid option value. Raised at connection construction.
    Configuration(String),
    /// Address could not be mapped to a managed-instance id.
    Resolution(String),
    /// Resolved instance is not running or not reachable by the SSM agent.
    Precondition(String),
    /// Execution exceeded the configured timeout without a terminal status.
    Timeout(String),
    /// The remote command reached a non-success terminal status. This is a
    /// normal outcome for callers that inspect exit state, not a transport
    /// defect; `status` and `stderr` let them tell the two apart.
    ExecutionFailed {
        status: InvocationStatus,
        stderr: String,
    },
    /// Unrecognized AWS API failure, tagged with the failing operation.
    Provider(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            TransportError::Resolution(msg) => write!(f, "resolution error: {msg}"),
            TransportError::Precondition(msg) => write!(f, "precondition error: {msg}"),
            TransportError::Timeout(msg) => write!(f, "timeout: {msg}"),
            TransportError::ExecutionFailed { status, stderr } => {
                write!(f, "execution failed with status \"{status}\": {stderr}")
            }
            TransportError::Provider(msg) => write!(f, "provider error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;
