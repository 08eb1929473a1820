//! Resolved connection options.
//!
//! Option parsing and defaults-from-CLI live in the host framework; by the
//! time a connection is constructed the options are a plain value object.
//! Validation happens here so a bad configuration fails the connection
//! immediately instead of surfacing mid-command.

use std::time::Duration;

use ssm_runtime::{ExecutionTiming, Result, TransportError};

/// Execution modes this transport supports.
pub const SUPPORTED_MODES: &[&str] = &["run-command"];

#[derive(Clone, Debug)]
pub struct ConnectionOptions {
    /// Address to resolve and target: instance id, IPv4 literal, or DNS name.
    pub host: String,
    /// Must be one of `SUPPORTED_MODES`.
    pub mode: String,
    /// Upper bound on polling duration per command.
    pub execution_timeout: Duration,
    /// Sleep between registration-wait retries.
    pub recheck_invocation: Duration,
    /// Sleep between status polls.
    pub recheck_execution: Duration,
    /// Page-size hint for DescribeInstances during address resolution.
    pub instance_page_size: Option<i32>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            mode: "run-command".into(),
            execution_timeout: Duration::from_secs(ssm_runtime::DEFAULT_EXECUTION_TIMEOUT_SECS),
            recheck_invocation: Duration::from_secs(ssm_runtime::DEFAULT_RECHECK_INVOCATION_SECS),
            recheck_execution: Duration::from_secs(ssm_runtime::DEFAULT_RECHECK_EXECUTION_SECS),
            instance_page_size: None,
        }
    }
}

impl ConnectionOptions {
    /// Default options targeting `host`.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Reject missing or unsupported option values.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(TransportError::Configuration(
                "missing required option host".into(),
            ));
        }

        if !SUPPORTED_MODES.contains(&self.mode.as_str()) {
            return Err(TransportError::Configuration(format!(
                "unsupported mode \"{}\", supported: {}",
                self.mode,
                SUPPORTED_MODES.join(", ")
            )));
        }

        Ok(())
    }

    pub fn timing(&self) -> ExecutionTiming {
        ExecutionTiming {
            execution_timeout: self.execution_timeout,
            recheck_invocation: self.recheck_invocation,
            recheck_execution: self.recheck_execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_option_table() {
        let options = ConnectionOptions::for_host("10.0.0.1");
        assert_eq!(options.mode, "run-command");
        assert_eq!(options.execution_timeout, Duration::from_secs(60));
        assert_eq!(options.recheck_invocation, Duration::from_secs(1));
        assert_eq!(options.recheck_execution, Duration::from_secs(1));
        assert_eq!(options.instance_page_size, None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn missing_host_is_a_configuration_error() {
        let err = ConnectionOptions::default().validate().unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn unsupported_mode_is_a_configuration_error() {
        let mut options = ConnectionOptions::for_host("10.0.0.1");
        options.mode = "interactive".into();

        let err = options.validate().unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
        assert!(err.to_string().contains("interactive"));
        assert!(err.to_string().contains("run-command"));
    }
}
