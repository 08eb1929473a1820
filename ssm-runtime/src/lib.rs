//! Core runtime for running commands on EC2 instances through AWS Systems
//! Manager, with no direct network path to the target.
//!
//! This crate provides the mechanics a transport façade composes per
//! connection: the instance directory, address resolution, the
//! managed-instance readiness gate, and the command-execution state machine.

pub mod api;
pub mod aws;
pub mod directory;
pub mod error;
pub mod executor;
pub mod gate;
pub mod platform;
pub mod resolve;
pub mod result;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use api::{
    Ec2Api, Instance, InvocationRecord, InvocationStatus, ManagedInstanceInfo, SsmApi,
};
pub use directory::InstanceDirectory;
pub use error::{Result, TransportError};
pub use executor::{CommandExecutor, ExecutionTiming};
pub use gate::ManagedInstanceGate;
pub use platform::Platform;
pub use resolve::AddressResolver;
pub use result::{ExecutionResult, map_invocation};

pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RECHECK_INVOCATION_SECS: u64 = 1;
pub const DEFAULT_RECHECK_EXECUTION_SECS: u64 = 1;
