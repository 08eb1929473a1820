//! Caller-facing execution result.

use crate::api::InvocationRecord;

/// Normalized outcome of one command execution. Always fully populated:
/// output the provider omitted becomes the empty string, never a hole the
/// caller has to check for.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionResult {
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Map a terminal invocation record into the caller-facing result shape.
/// Pure and infallible.
pub fn map_invocation(invocation: &InvocationRecord) -> ExecutionResult {
    ExecutionResult {
        exit_status: invocation.response_code.unwrap_or(0),
        stdout: invocation.stdout.clone().unwrap_or_default(),
        stderr: invocation.stderr.clone().unwrap_or_default(),
    }
}
