//! Command submission and the invocation state machine.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::api::{InvocationRecord, SsmApi};
use crate::error::{Result, TransportError};
use crate::platform::Platform;

/// Poll intervals and the overall execution budget.
#[derive(Clone, Copy, Debug)]
pub struct ExecutionTiming {
    /// Upper bound on polling duration, measured from submission.
    pub execution_timeout: Duration,
    /// Sleep between registration-wait retries.
    pub recheck_invocation: Duration,
    /// Sleep between status polls.
    pub recheck_execution: Duration,
}

impl Default for ExecutionTiming {
    fn default() -> Self {
        Self {
            execution_timeout: Duration::from_secs(crate::DEFAULT_EXECUTION_TIMEOUT_SECS),
            recheck_invocation: Duration::from_secs(crate::DEFAULT_RECHECK_INVOCATION_SECS),
            recheck_execution: Duration::from_secs(crate::DEFAULT_RECHECK_EXECUTION_SECS),
        }
    }
}

/// Owns the end-to-end execution of one command against one instance:
/// submit, wait for the invocation to register, poll to a terminal status,
/// enforce the execution timeout.
///
/// Strictly sequential: each poll suspends the calling task for the
/// configured interval, and nothing polls the same command twice
/// concurrently. There is no client-side cancellation: once submitted, a
/// command runs until a terminal status or the timeout, whichever is first.
pub struct CommandExecutor {
    ssm: Arc<dyn SsmApi>,
    instance_id: String,
    platform: Platform,
    timing: ExecutionTiming,
}

impl CommandExecutor {
    pub fn new(
        ssm: Arc<dyn SsmApi>,
        instance_id: String,
        platform: Platform,
        timing: ExecutionTiming,
    ) -> Self {
        Self {
            ssm,
            instance_id,
            platform,
            timing,
        }
    }

    /// Run `command` to completion, returning the terminal invocation record
    /// on success. Submission failures propagate immediately (no retry);
    /// non-success terminal statuses become `ExecutionFailed`.
    pub async fn run(&self, command: &str) -> Result<InvocationRecord> {
        let command_id = self
            .ssm
            .send_command(&self.instance_id, self.platform.document_name(), command)
            .await?;
        debug!("exec: command {command_id} submitted to {}", self.instance_id);

        let deadline = Instant::now() + self.timing.execution_timeout;
        let mut invocation = self.wait_for_registration(&command_id).await?;

        // Timeout is checked before each re-fetch, never after: a terminal
        // status from the last fetch inside the budget is always honored.
        while invocation.status.is_in_progress() {
            if Instant::now() > deadline {
                return Err(TransportError::Timeout(format!(
                    "command {command_id} on {} did not reach a terminal status within {:?}",
                    self.instance_id, self.timing.execution_timeout
                )));
            }
            sleep(self.timing.recheck_execution).await;
            invocation = self.fetch_registered(&command_id).await?;
        }

        if invocation.status.is_success() {
            Ok(invocation)
        } else {
            // Cancelled, provider-side TimedOut, and other non-success
            // terminal statuses take the same path as Failed, carrying the
            // status name so callers can still see which one occurred.
            Err(TransportError::ExecutionFailed {
                status: invocation.status,
                stderr: invocation
                    .stderr
                    .unwrap_or_else(|| "unknown".to_string()),
            })
        }
    }

    /// Immediately after submission the invocation may not be queryable yet.
    /// The command was already accepted, so registration eventually appears;
    /// the wait is unbounded and paced only by the registration-recheck
    /// interval.
    async fn wait_for_registration(&self, command_id: &str) -> Result<InvocationRecord> {
        loop {
            match self.ssm.get_invocation(&self.instance_id, command_id).await? {
                Some(invocation) => return Ok(invocation),
                None => {
                    debug!("exec: invocation of {command_id} not registered yet");
                    sleep(self.timing.recheck_invocation).await;
                }
            }
        }
    }

    async fn fetch_registered(&self, command_id: &str) -> Result<InvocationRecord> {
        self.ssm
            .get_invocation(&self.instance_id, command_id)
            .await?
            .ok_or_else(|| {
                TransportError::Provider(format!(
                    "invocation of command {command_id} on {} disappeared after registration",
                    self.instance_id
                ))
            })
    }
}
