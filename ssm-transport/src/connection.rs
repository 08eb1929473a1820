//! Connection-scoped facade over the runtime components.

use std::sync::Arc;

use tracing::{debug, info};

use ssm_runtime::aws::{Ec2SdkClient, SsmSdkClient, load_aws_config};
use ssm_runtime::{
    AddressResolver, CommandExecutor, Ec2Api, ExecutionResult, Instance, InstanceDirectory,
    ManagedInstanceGate, Platform, Result, SsmApi, map_invocation,
};

use crate::options::ConnectionOptions;

/// One resolved, gated target instance and the executor bound to it.
///
/// Construction does all the up-front work: option validation, address
/// resolution against the (connection-scoped, cached) instance directory,
/// and the power-state/agent-reachability gate. After that each
/// `run_command` call drives one submission through the invocation state
/// machine. The design contract is sequential use: a connection holds at
/// most one outstanding command; callers wanting parallelism open separate
/// connections, each resolving and gating its own target.
pub struct Connection {
    options: ConnectionOptions,
    instance: Instance,
    executor: CommandExecutor,
}

impl Connection {
    /// Production entry point: load AWS configuration through the standard
    /// provider chain, build the EC2/SSM clients, and open the connection.
    pub async fn connect(options: ConnectionOptions) -> Result<Self> {
        let config = load_aws_config().await;
        let ec2 = Arc::new(Ec2SdkClient::new(&config));
        let ssm = Arc::new(SsmSdkClient::new(&config));
        Self::open(options, ec2, ssm).await
    }

    /// Open a connection over explicit API clients.
    pub async fn open(
        options: ConnectionOptions,
        ec2: Arc<dyn Ec2Api>,
        ssm: Arc<dyn SsmApi>,
    ) -> Result<Self> {
        options.validate()?;

        let directory = Arc::new(InstanceDirectory::new(
            ec2.clone(),
            options.instance_page_size,
        ));
        let resolver = AddressResolver::new(directory);
        let instance_id = resolver.resolve(&options.host).await?;

        let gate = ManagedInstanceGate::new(ec2, ssm.clone());
        let instance = gate.assert_ready(&instance_id).await?;

        let executor = CommandExecutor::new(
            ssm,
            instance.instance_id.clone(),
            instance.platform,
            options.timing(),
        );

        info!(
            "connection to {} established (instance {})",
            options.host, instance.instance_id
        );

        Ok(Self {
            options,
            instance,
            executor,
        })
    }

    /// Run one command on the target instance and return its normalized
    /// result. A non-success terminal status surfaces as
    /// `TransportError::ExecutionFailed`, which callers treat as a normal
    /// command outcome rather than a transport fault.
    pub async fn run_command(&self, command: &str) -> Result<ExecutionResult> {
        info!("sending command to {}", self.options.host);
        debug!("command: '{command}'");

        let invocation = self.executor.run(command).await?;
        Ok(map_invocation(&invocation))
    }

    /// Stateless teardown; nothing to release beyond logging.
    pub fn close(&self) {
        info!("closed connection to {}", self.options.host);
    }

    pub fn uri(&self) -> String {
        format!("aws-ssm://{}/", self.options.host)
    }

    pub fn instance_id(&self) -> &str {
        &self.instance.instance_id
    }

    /// Platform tag of the target; the remote-file collaborator selects its
    /// path and permission semantics from this.
    pub fn platform(&self) -> Platform {
        self.instance.platform
    }
}
