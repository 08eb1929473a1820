//! Provider-API seam: domain snapshot types and the `Ec2Api`/`SsmApi` traits.
//!
//! The rest of the runtime talks to AWS exclusively through these traits, so
//! resolution, gating, and the execution state machine can be exercised
//! against scripted fakes. Production adapters over the AWS SDK live in
//! `crate::aws`.

use async_trait::async_trait;

use crate::error::Result;
use crate::platform::Platform;

/// Immutable snapshot of one EC2 instance, reduced to the identity fields
/// address resolution matches against plus the power state and platform tag.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Instance {
    pub instance_id: String,
    pub platform: Platform,
    /// EC2 state name, e.g. "running" or "stopped".
    pub power_state: String,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub private_dns: Option<String>,
    pub public_dns: Option<String>,
}

impl Instance {
    /// Whether any of this instance's identity fields equals `address`.
    pub fn has_address(&self, address: &str) -> bool {
        [
            self.private_ip.as_deref(),
            self.public_ip.as_deref(),
            self.private_dns.as_deref(),
            self.public_dns.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field == address)
    }
}

/// One page of a DescribeInstances listing.
#[derive(Clone, Debug, Default)]
pub struct InstancePage {
    pub instances: Vec<Instance>,
    pub next_token: Option<String>,
}

/// SSM's view of a managed instance (DescribeInstanceInformation record).
#[derive(Clone, Debug)]
pub struct ManagedInstanceInfo {
    pub instance_id: String,
    /// Agent connectivity: "Online", "ConnectionLost", or "Inactive".
    pub ping_status: String,
}

impl ManagedInstanceInfo {
    pub fn is_online(&self) -> bool {
        self.ping_status == "Online"
    }
}

/// Status of a command invocation as reported by SSM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationStatus {
    Pending,
    InProgress,
    Delayed,
    Success,
    Cancelled,
    Cancelling,
    Failed,
    TimedOut,
    Other(String),
}

impl InvocationStatus {
    /// Non-terminal statuses. Note that `Cancelling` is treated as terminal:
    /// SSM will not transition it back to a running state the poll loop
    /// should keep waiting on.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            InvocationStatus::Pending | InvocationStatus::InProgress | InvocationStatus::Delayed
        )
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }

    pub fn is_success(&self) -> bool {
        *self == InvocationStatus::Success
    }
}

impl From<&str> for InvocationStatus {
    fn from(name: &str) -> Self {
        match name {
            "Pending" => InvocationStatus::Pending,
            "InProgress" => InvocationStatus::InProgress,
            "Delayed" => InvocationStatus::Delayed,
            "Success" => InvocationStatus::Success,
            "Cancelled" => InvocationStatus::Cancelled,
            "Cancelling" => InvocationStatus::Cancelling,
            "Failed" => InvocationStatus::Failed,
            "TimedOut" => InvocationStatus::TimedOut,
            other => InvocationStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InvocationStatus::Pending => "Pending",
            InvocationStatus::InProgress => "InProgress",
            InvocationStatus::Delayed => "Delayed",
            InvocationStatus::Success => "Success",
            InvocationStatus::Cancelled => "Cancelled",
            InvocationStatus::Cancelling => "Cancelling",
            InvocationStatus::Failed => "Failed",
            InvocationStatus::TimedOut => "TimedOut",
            InvocationStatus::Other(other) => other.as_str(),
        };
        f.write_str(name)
    }
}

/// The provider's record of one command execution against one instance.
/// Never mutated locally; the executor re-fetches it until terminal.
#[derive(Clone, Debug)]
pub struct InvocationRecord {
    pub command_id: String,
    pub instance_id: String,
    pub status: InvocationStatus,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub response_code: Option<i32>,
}

/// EC2 operations the runtime needs: point describe and paged listing.
#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Describe a single instance by id.
    async fn describe_instance(&self, instance_id: &str) -> Result<Instance>;

    /// Fetch one page of the account's instances. `next_token` of `None`
    /// requests the first page; the returned page carries the continuation
    /// token for the next call, if any.
    async fn list_instances(
        &self,
        page_size: Option<i32>,
        next_token: Option<String>,
    ) -> Result<InstancePage>;
}

/// SSM operations the runtime needs: command submission, invocation lookup,
/// and the managed-instance inventory check.
#[async_trait]
pub trait SsmApi: Send + Sync {
    /// Submit `command` to `instance_id` using `document_name`; returns the
    /// command id.
    async fn send_command(
        &self,
        instance_id: &str,
        document_name: &str,
        command: &str,
    ) -> Result<String>;

    /// Fetch the invocation record for (`instance_id`, `command_id`).
    /// `Ok(None)` means SSM has not registered the invocation yet, the one
    /// condition the executor retries; every other failure is an error.
    async fn get_invocation(
        &self,
        instance_id: &str,
        command_id: &str,
    ) -> Result<Option<InvocationRecord>>;

    /// Look up the SSM inventory record for `instance_id`, if the instance
    /// is managed at all.
    async fn describe_managed_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<ManagedInstanceInfo>>;
}
