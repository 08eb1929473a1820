//! AWS SDK adapters for the `Ec2Api`/`SsmApi` seam traits.
//!
//! These are thin conversions: SDK response shapes in, domain snapshots out,
//! every failure tagged with the operation and target id. The one piece of
//! classification lives in `get_invocation`, which maps SSM's
//! `InvocationDoesNotExist` to `Ok(None)` so the executor can drive its
//! registration wait as an explicit loop.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::types::PlatformValues;
use aws_sdk_ssm::types::InstanceInformationStringFilter;

use crate::api::{Ec2Api, Instance, InstancePage, InvocationRecord, ManagedInstanceInfo, SsmApi};
use crate::error::{Result, TransportError};
use crate::platform::Platform;

/// Load AWS configuration through the standard provider chain (environment,
/// shared config, instance metadata). Called once per connection.
pub async fn load_aws_config() -> aws_config::SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

/// `Ec2Api` backed by the real EC2 client.
pub struct Ec2SdkClient {
    client: aws_sdk_ec2::Client,
}

impl Ec2SdkClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ec2::Client::new(config),
        }
    }
}

#[async_trait]
impl Ec2Api for Ec2SdkClient {
    async fn describe_instance(&self, instance_id: &str) -> Result<Instance> {
        let resp = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| {
                TransportError::Provider(format!("DescribeInstances for {instance_id}: {e}"))
            })?;

        resp.reservations()
            .first()
            .and_then(|r| r.instances().first())
            .map(instance_snapshot)
            .ok_or_else(|| {
                TransportError::Provider(format!(
                    "DescribeInstances for {instance_id}: no instance in response"
                ))
            })
    }

    async fn list_instances(
        &self,
        page_size: Option<i32>,
        next_token: Option<String>,
    ) -> Result<InstancePage> {
        let resp = self
            .client
            .describe_instances()
            .set_max_results(page_size)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| TransportError::Provider(format!("DescribeInstances: {e}")))?;

        let instances = resp
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .map(instance_snapshot)
            .collect();

        Ok(InstancePage {
            instances,
            next_token: resp.next_token().map(str::to_string),
        })
    }
}

/// `SsmApi` backed by the real SSM client.
pub struct SsmSdkClient {
    client: aws_sdk_ssm::Client,
}

impl SsmSdkClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

#[async_trait]
impl SsmApi for SsmSdkClient {
    async fn send_command(
        &self,
        instance_id: &str,
        document_name: &str,
        command: &str,
    ) -> Result<String> {
        let resp = self
            .client
            .send_command()
            .instance_ids(instance_id)
            .document_name(document_name)
            .parameters("commands", vec![command.to_string()])
            .send()
            .await
            .map_err(|e| {
                TransportError::Provider(format!("SendCommand to {instance_id}: {e}"))
            })?;

        resp.command()
            .and_then(|c| c.command_id())
            .map(str::to_string)
            .ok_or_else(|| {
                TransportError::Provider(format!(
                    "SendCommand to {instance_id}: no command id in response"
                ))
            })
    }

    async fn get_invocation(
        &self,
        instance_id: &str,
        command_id: &str,
    ) -> Result<Option<InvocationRecord>> {
        let resp = self
            .client
            .get_command_invocation()
            .instance_id(instance_id)
            .command_id(command_id)
            .send()
            .await;

        match resp {
            Ok(out) => Ok(Some(InvocationRecord {
                command_id: command_id.to_string(),
                instance_id: instance_id.to_string(),
                status: out
                    .status()
                    .map(|s| s.as_str().into())
                    .unwrap_or(crate::api::InvocationStatus::Pending),
                stdout: non_empty(out.standard_output_content()),
                stderr: non_empty(out.standard_error_content()),
                response_code: Some(out.response_code()),
            })),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_invocation_does_not_exist() {
                    return Ok(None);
                }
                Err(TransportError::Provider(format!(
                    "GetCommandInvocation for command {command_id} on {instance_id}: {service_err}"
                )))
            }
        }
    }

    async fn describe_managed_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<ManagedInstanceInfo>> {
        let filter = InstanceInformationStringFilter::builder()
            .key("InstanceIds")
            .values(instance_id)
            .build()
            .map_err(|e| {
                TransportError::Provider(format!(
                    "DescribeInstanceInformation for {instance_id}: {e}"
                ))
            })?;

        let resp = self
            .client
            .describe_instance_information()
            .filters(filter)
            .send()
            .await
            .map_err(|e| {
                TransportError::Provider(format!(
                    "DescribeInstanceInformation for {instance_id}: {e}"
                ))
            })?;

        Ok(resp.instance_information_list().first().map(|info| {
            ManagedInstanceInfo {
                instance_id: info.instance_id().unwrap_or(instance_id).to_string(),
                ping_status: info
                    .ping_status()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
            }
        }))
    }
}

fn instance_snapshot(instance: &aws_sdk_ec2::types::Instance) -> Instance {
    let platform = if instance.platform() == Some(&PlatformValues::Windows) {
        Platform::Windows
    } else {
        Platform::Unix
    };

    Instance {
        instance_id: instance.instance_id().unwrap_or_default().to_string(),
        platform,
        power_state: instance
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string())
            .unwrap_or_default(),
        private_ip: non_empty(instance.private_ip_address()),
        public_ip: non_empty(instance.public_ip_address()),
        private_dns: non_empty(instance.private_dns_name()),
        public_dns: non_empty(instance.public_dns_name()),
    }
}

/// EC2 reports missing DNS names as empty strings; normalize those to `None`
/// so they can never match an address.
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
