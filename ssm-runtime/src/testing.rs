//! Scripted `Ec2Api`/`SsmApi` fakes for tests.
//!
//! No cloud access: `FakeEc2` serves instance pages with synthetic
//! continuation tokens, `FakeSsm` replays a scripted sequence of invocation
//! lookups (the last entry repeats once the script is exhausted). Both count
//! calls so tests can assert exact fetch/poll behavior.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::api::{
    Ec2Api, Instance, InstancePage, InvocationRecord, InvocationStatus, ManagedInstanceInfo,
    SsmApi,
};
use crate::error::{Result, TransportError};
use crate::platform::Platform;

/// A running unix instance with the given private IP and no other addresses.
pub fn instance(id: &str, private_ip: &str) -> Instance {
    Instance {
        instance_id: id.to_string(),
        platform: Platform::Unix,
        power_state: "running".into(),
        private_ip: Some(private_ip.to_string()),
        public_ip: None,
        private_dns: None,
        public_dns: None,
    }
}

/// An invocation record with the given status and nothing else captured.
pub fn invocation(status: InvocationStatus) -> InvocationRecord {
    InvocationRecord {
        command_id: "cmd-0001".into(),
        instance_id: "i-target".into(),
        status,
        stdout: None,
        stderr: None,
        response_code: None,
    }
}

/// `Ec2Api` fake serving fixed pages, with page index as the continuation
/// token.
pub struct FakeEc2 {
    pages: Vec<Vec<Instance>>,
    failure: Option<String>,
    list_calls: AtomicUsize,
}

impl FakeEc2 {
    pub fn with_pages(pages: Vec<Vec<Instance>>) -> Self {
        Self {
            pages,
            failure: None,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with a provider error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            pages: Vec::new(),
            failure: Some(message.to_string()),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ec2Api for FakeEc2 {
    async fn describe_instance(&self, instance_id: &str) -> Result<Instance> {
        if let Some(message) = &self.failure {
            return Err(TransportError::Provider(message.clone()));
        }
        self.pages
            .iter()
            .flatten()
            .find(|i| i.instance_id == instance_id)
            .cloned()
            .ok_or_else(|| {
                TransportError::Provider(format!(
                    "DescribeInstances for {instance_id}: not found"
                ))
            })
    }

    async fn list_instances(
        &self,
        _page_size: Option<i32>,
        next_token: Option<String>,
    ) -> Result<InstancePage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(TransportError::Provider(message.clone()));
        }

        let index: usize = next_token
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        let instances = self.pages.get(index).cloned().unwrap_or_default();
        let next_token = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());

        Ok(InstancePage {
            instances,
            next_token,
        })
    }
}

/// One recorded `send_command` call.
#[derive(Clone, Debug)]
pub struct SentCommand {
    pub instance_id: String,
    pub document_name: String,
    pub command: String,
}

/// `SsmApi` fake replaying a scripted sequence of invocation lookups.
pub struct FakeSsm {
    command_id: String,
    responses: Mutex<VecDeque<Option<InvocationRecord>>>,
    managed: Option<ManagedInstanceInfo>,
    send_failure: Option<String>,
    sent: Mutex<Vec<SentCommand>>,
    get_calls: AtomicUsize,
}

impl FakeSsm {
    pub fn new() -> Self {
        Self {
            command_id: "cmd-0001".into(),
            responses: Mutex::new(VecDeque::new()),
            managed: None,
            send_failure: None,
            sent: Mutex::new(Vec::new()),
            get_calls: AtomicUsize::new(0),
        }
    }

    /// Script the responses to consecutive `get_invocation` calls. `None`
    /// entries simulate "not yet registered". The final entry repeats
    /// forever, so a terminal last entry ends any poll loop and an
    /// in-progress one never does.
    pub fn scripted(responses: Vec<Option<InvocationRecord>>) -> Self {
        let fake = Self::new();
        *fake.responses.lock().unwrap() = responses.into();
        fake
    }

    /// Register an online SSM inventory record for `instance_id`.
    pub fn online(self, instance_id: &str) -> Self {
        self.with_ping(instance_id, "Online")
    }

    pub fn with_ping(mut self, instance_id: &str, ping_status: &str) -> Self {
        self.managed = Some(ManagedInstanceInfo {
            instance_id: instance_id.to_string(),
            ping_status: ping_status.to_string(),
        });
        self
    }

    pub fn fail_send(mut self, message: &str) -> Self {
        self.send_failure = Some(message.to_string());
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn sent_commands(&self) -> Vec<SentCommand> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for FakeSsm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SsmApi for FakeSsm {
    async fn send_command(
        &self,
        instance_id: &str,
        document_name: &str,
        command: &str,
    ) -> Result<String> {
        if let Some(message) = &self.send_failure {
            return Err(TransportError::Provider(message.clone()));
        }
        self.sent.lock().unwrap().push(SentCommand {
            instance_id: instance_id.to_string(),
            document_name: document_name.to_string(),
            command: command.to_string(),
        });
        Ok(self.command_id.clone())
    }

    async fn get_invocation(
        &self,
        _instance_id: &str,
        _command_id: &str,
    ) -> Result<Option<InvocationRecord>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            Ok(responses.pop_front().unwrap_or(None))
        } else {
            Ok(responses.front().cloned().unwrap_or(None))
        }
    }

    async fn describe_managed_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<ManagedInstanceInfo>> {
        Ok(self
            .managed
            .as_ref()
            .filter(|info| info.instance_id == instance_id)
            .cloned())
    }
}
