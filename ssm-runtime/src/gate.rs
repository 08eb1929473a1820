//! Readiness checks for a resolved instance.

use std::sync::Arc;

use tracing::debug;

use crate::api::{Ec2Api, Instance, SsmApi};
use crate::error::{Result, TransportError};

/// Verifies that an instance is powered on and reachable by the SSM agent
/// before any command is attempted. Both checks run once, at connection
/// establishment; an instance that goes offline mid-session surfaces through
/// the next command's own failure.
pub struct ManagedInstanceGate {
    ec2: Arc<dyn Ec2Api>,
    ssm: Arc<dyn SsmApi>,
}

impl ManagedInstanceGate {
    pub fn new(ec2: Arc<dyn Ec2Api>, ssm: Arc<dyn SsmApi>) -> Self {
        Self { ec2, ssm }
    }

    /// Check power state and agent connectivity, returning the instance
    /// snapshot so the caller can derive the platform tag without a second
    /// describe call.
    pub async fn assert_ready(&self, instance_id: &str) -> Result<Instance> {
        let instance = self.ec2.describe_instance(instance_id).await?;
        if instance.power_state != "running" {
            return Err(TransportError::Precondition(format!(
                "instance {instance_id} is not running (state: {})",
                instance.power_state
            )));
        }

        let managed = self.ssm.describe_managed_instance(instance_id).await?;
        match managed {
            Some(info) if info.is_online() => {
                debug!("gate: instance {instance_id} is running and online");
                Ok(instance)
            }
            Some(info) => Err(TransportError::Precondition(format!(
                "instance {instance_id} agent is not reachable (ping status: {})",
                info.ping_status
            ))),
            None => Err(TransportError::Precondition(format!(
                "instance {instance_id} is not managed by SSM"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::testing::{FakeEc2, FakeSsm, instance};

    fn running_windows() -> crate::api::Instance {
        let mut i = instance("i-target", "10.0.0.1");
        i.platform = Platform::Windows;
        i
    }

    #[tokio::test]
    async fn ready_instance_passes_and_returns_snapshot() {
        let ec2 = Arc::new(FakeEc2::with_pages(vec![vec![running_windows()]]));
        let ssm = Arc::new(FakeSsm::new().online("i-target"));
        let gate = ManagedInstanceGate::new(ec2, ssm);

        let snapshot = gate.assert_ready("i-target").await.unwrap();
        assert_eq!(snapshot.platform, Platform::Windows);
    }

    #[tokio::test]
    async fn stopped_instance_is_rejected() {
        let mut stopped = instance("i-target", "10.0.0.1");
        stopped.power_state = "stopped".into();
        let ec2 = Arc::new(FakeEc2::with_pages(vec![vec![stopped]]));
        let ssm = Arc::new(FakeSsm::new().online("i-target"));
        let gate = ManagedInstanceGate::new(ec2, ssm);

        let err = gate.assert_ready("i-target").await.unwrap_err();
        assert!(matches!(err, TransportError::Precondition(_)));
        assert!(err.to_string().contains("not running"));
    }

    #[tokio::test]
    async fn unmanaged_instance_is_rejected() {
        let ec2 = Arc::new(FakeEc2::with_pages(vec![vec![running_windows()]]));
        let ssm = Arc::new(FakeSsm::new()); // no inventory record
        let gate = ManagedInstanceGate::new(ec2, ssm);

        let err = gate.assert_ready("i-target").await.unwrap_err();
        assert!(err.to_string().contains("not managed"));
    }

    #[tokio::test]
    async fn offline_agent_is_rejected() {
        let ec2 = Arc::new(FakeEc2::with_pages(vec![vec![running_windows()]]));
        let ssm = Arc::new(FakeSsm::new().with_ping("i-target", "ConnectionLost"));
        let gate = ManagedInstanceGate::new(ec2, ssm);

        let err = gate.assert_ready("i-target").await.unwrap_err();
        assert!(err.to_string().contains("ConnectionLost"));
    }
}
