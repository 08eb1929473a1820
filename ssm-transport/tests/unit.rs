//! Connection-level tests for the SSM transport facade.
//!
//! No AWS access: everything runs against the scripted `FakeEc2`/`FakeSsm`
//! seam implementations from `ssm-runtime`'s test-utils.

use std::sync::Arc;
use std::time::Duration;

use ssm_runtime::testing::{FakeEc2, FakeSsm, instance, invocation};
use ssm_runtime::{InvocationStatus, Platform, TransportError};
use ssm_transport::{Connection, ConnectionOptions};

fn default_target() -> Arc<FakeEc2> {
    Arc::new(FakeEc2::with_pages(vec![vec![instance(
        "i-target",
        "10.0.0.5",
    )]]))
}

// ═══════════════════════════════════════════════════════════════════════════
// CONNECTION ESTABLISHMENT
// ═══════════════════════════════════════════════════════════════════════════

mod open_tests {
    use super::*;

    #[tokio::test]
    async fn resolves_address_and_gates_instance() {
        let ec2 = default_target();
        let ssm = Arc::new(FakeSsm::new().online("i-target"));

        let connection = Connection::open(ConnectionOptions::for_host("10.0.0.5"), ec2, ssm)
            .await
            .unwrap();

        assert_eq!(connection.instance_id(), "i-target");
        assert_eq!(connection.platform(), Platform::Unix);
        assert_eq!(connection.uri(), "aws-ssm://10.0.0.5/");
    }

    #[tokio::test]
    async fn instance_id_host_skips_the_directory() {
        let ec2 = default_target();
        let ssm = Arc::new(FakeSsm::new().online("i-target"));

        let connection =
            Connection::open(ConnectionOptions::for_host("i-target"), ec2.clone(), ssm)
                .await
                .unwrap();

        assert_eq!(connection.instance_id(), "i-target");
        assert_eq!(ec2.list_calls(), 0);
    }

    #[tokio::test]
    async fn invalid_options_fail_before_any_api_call() {
        let ec2 = default_target();
        let ssm = Arc::new(FakeSsm::new().online("i-target"));

        let err = Connection::open(ConnectionOptions::default(), ec2.clone(), ssm)
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Configuration(_)));
        assert_eq!(ec2.list_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_address_is_a_resolution_error() {
        let ec2 = default_target();
        let ssm = Arc::new(FakeSsm::new().online("i-target"));

        let err = Connection::open(ConnectionOptions::for_host("10.9.9.9"), ec2, ssm)
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Resolution(_)));
        assert!(err.to_string().contains("10.9.9.9"));
    }

    #[tokio::test]
    async fn stopped_instance_is_a_precondition_error() {
        let mut stopped = instance("i-target", "10.0.0.5");
        stopped.power_state = "stopped".into();
        let ec2 = Arc::new(FakeEc2::with_pages(vec![vec![stopped]]));
        let ssm = Arc::new(FakeSsm::new().online("i-target"));

        let err = Connection::open(ConnectionOptions::for_host("10.0.0.5"), ec2, ssm)
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Precondition(_)));
    }

    #[tokio::test]
    async fn offline_agent_is_a_precondition_error() {
        let ec2 = default_target();
        let ssm = Arc::new(FakeSsm::new().with_ping("i-target", "ConnectionLost"));

        let err = Connection::open(ConnectionOptions::for_host("10.0.0.5"), ec2, ssm)
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Precondition(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// COMMAND EXECUTION
// ═══════════════════════════════════════════════════════════════════════════

mod run_command_tests {
    use super::*;

    #[tokio::test]
    async fn maps_a_successful_invocation() {
        let mut success = invocation(InvocationStatus::Success);
        success.stdout = Some("Linux ip-10-0-0-5\n".into());
        success.response_code = Some(0);

        let ec2 = default_target();
        let ssm = Arc::new(FakeSsm::scripted(vec![Some(success)]).online("i-target"));

        let connection = Connection::open(ConnectionOptions::for_host("10.0.0.5"), ec2, ssm)
            .await
            .unwrap();
        let result = connection.run_command("uname -n").await.unwrap();

        assert_eq!(result.exit_status, 0);
        assert_eq!(result.stdout, "Linux ip-10-0-0-5\n");
        assert_eq!(result.stderr, "");
    }

    #[tokio::test]
    async fn command_failure_is_a_normal_outcome_with_stderr() {
        let mut failed = invocation(InvocationStatus::Failed);
        failed.stderr = Some("command not found".into());

        let ec2 = default_target();
        let ssm = Arc::new(FakeSsm::scripted(vec![Some(failed)]).online("i-target"));

        let connection = Connection::open(ConnectionOptions::for_host("10.0.0.5"), ec2, ssm)
            .await
            .unwrap();

        match connection.run_command("nope").await.unwrap_err() {
            TransportError::ExecutionFailed { status, stderr } => {
                assert_eq!(status, InvocationStatus::Failed);
                assert_eq!(stderr, "command not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_invocation_times_out() {
        let ec2 = default_target();
        let ssm = Arc::new(
            FakeSsm::scripted(vec![Some(invocation(InvocationStatus::InProgress))])
                .online("i-target"),
        );

        let mut options = ConnectionOptions::for_host("10.0.0.5");
        options.execution_timeout = Duration::from_secs(2);

        let connection = Connection::open(options, ec2, ssm).await.unwrap();
        let err = connection.run_command("sleep 600").await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[tokio::test]
    async fn windows_target_uses_the_powershell_document() {
        let mut target = instance("i-target", "10.0.0.5");
        target.platform = Platform::Windows;
        let ec2 = Arc::new(FakeEc2::with_pages(vec![vec![target]]));
        let ssm = Arc::new(
            FakeSsm::scripted(vec![Some(invocation(InvocationStatus::Success))])
                .online("i-target"),
        );

        let connection =
            Connection::open(ConnectionOptions::for_host("10.0.0.5"), ec2, ssm.clone())
                .await
                .unwrap();
        assert_eq!(connection.platform(), Platform::Windows);

        connection.run_command("Get-ChildItem").await.unwrap();
        let sent = ssm.sent_commands();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].document_name, "AWS-RunPowerShellScript");
        assert_eq!(sent[0].instance_id, "i-target");
    }
}
