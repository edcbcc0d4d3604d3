use super::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_production_runner_success() {
    let runner = TokioProcessRunner;
    let command = ProcessCommandBuilder::new("echo")
        .arg("hello world")
        .build();

    let output = runner.run(command).await.unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout.trim(), "hello world");
    assert!(output.stderr.is_empty());
}

#[tokio::test]
async fn test_production_runner_failure() {
    let runner = TokioProcessRunner;
    let command = ProcessCommandBuilder::new("false").build();

    let output = runner.run(command).await.unwrap();
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn test_production_runner_command_not_found() {
    let runner = TokioProcessRunner;
    let command = ProcessCommandBuilder::new("nonexistent-command-12345").build();

    let result = runner.run(command).await;
    assert!(matches!(result, Err(ProcessError::CommandNotFound(_))));
}

#[tokio::test]
async fn test_production_runner_timeout() {
    let runner = TokioProcessRunner;
    let command = ProcessCommandBuilder::new("sleep")
        .arg("5")
        .timeout(Some(Duration::from_millis(100)))
        .build();

    let output = runner.run(command.clone()).await.unwrap();
    assert_eq!(output.status, ExitStatus::Timeout);
    assert!(matches!(
        output.into_result(&command),
        Err(ProcessError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_production_runner_inherits_environment() {
    std::env::set_var("LABFLOW_RUNNER_TEST_VAR", "inherited");
    let runner = TokioProcessRunner;
    let command = ProcessCommandBuilder::new("sh")
        .args(["-c", "echo $LABFLOW_RUNNER_TEST_VAR"])
        .build();

    let output = runner.run(command).await.unwrap();
    assert_eq!(output.stdout.trim(), "inherited");
}

#[tokio::test]
async fn test_mock_runner_basic() {
    let mut mock = MockProcessRunner::new();

    mock.expect_command("mamba")
        .with_args(|args| args == ["env", "list", "--json"])
        .returns_stdout("{\"envs\": []}\n")
        .returns_success()
        .finish();

    let output = mock
        .run(
            ProcessCommandBuilder::new("mamba")
                .args(["env", "list", "--json"])
                .build(),
        )
        .await
        .unwrap();

    assert!(output.status.success());
    assert_eq!(output.stdout, "{\"envs\": []}\n");
    assert!(mock.verify_called("mamba", 1));
}

#[tokio::test]
async fn test_mock_runner_multiple_calls() {
    let mut mock = MockProcessRunner::new();

    mock.expect_command("git")
        .with_args(|args| args == ["clone", "repo"])
        .returns_success()
        .times(2)
        .finish();

    let command = || ProcessCommandBuilder::new("git").args(["clone", "repo"]).build();

    assert!(mock.run(command()).await.is_ok());
    assert!(mock.run(command()).await.is_ok());
    assert!(mock.run(command()).await.is_err());
}

#[tokio::test]
async fn test_mock_runner_side_effect() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("created");
    let marker_clone = marker.clone();

    let mut mock = MockProcessRunner::new();
    mock.expect_command("touch")
        .runs(move |_| {
            std::fs::write(&marker_clone, "").unwrap();
        })
        .finish();

    mock.run(ProcessCommandBuilder::new("touch").build())
        .await
        .unwrap();
    assert!(marker.exists());
}

#[tokio::test]
async fn test_subprocess_manager_spawn_with_mock() {
    let (manager, mut mock) = SubprocessManager::mock();

    mock.expect_command("ls")
        .returns_stdout("file1.txt\nfile2.txt\n")
        .returns_stderr("note\n")
        .returns_success()
        .finish();

    let logger = BufferLogger::new();
    let handle = manager
        .spawn(
            ProcessCommandBuilder::new("ls").build(),
            Some(Arc::new(logger.clone())),
        )
        .await
        .unwrap();

    let output = handle.wait().await.unwrap();
    assert_eq!(output.stdout, "file1.txt\nfile2.txt\n");
    assert_eq!(logger.output_lines(), vec!["file1.txt", "file2.txt"]);
    assert_eq!(logger.error_lines(), vec!["note"]);
}

#[tokio::test]
async fn test_handle_wait_reports_failure() {
    let (manager, mut mock) = SubprocessManager::mock();
    mock.expect_command("mamba")
        .returns_stderr("PackagesNotFoundError\n")
        .returns_exit_code(1)
        .finish();

    let handle = manager
        .spawn(
            ProcessCommandBuilder::new("mamba").arg("install").build(),
            None,
        )
        .await
        .unwrap();

    let err = handle.wait().await.unwrap_err();
    match err {
        ProcessError::ExitCode { code, stderr, .. } => {
            assert_eq!(code, 1);
            assert!(stderr.contains("PackagesNotFoundError"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_handle_cancel_stops_real_process() {
    let manager = SubprocessManager::production();
    let handle = manager
        .spawn(
            ProcessCommandBuilder::new("sh")
                .args(["-c", "echo started; sleep 30"])
                .build(),
            None,
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let output = tokio::time::timeout(Duration::from_secs(5), handle.cancel())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.status, ExitStatus::Cancelled);
    assert_eq!(output.stdout, "started\n");
}

#[tokio::test]
async fn test_handle_streams_lines_to_logger() {
    let manager = SubprocessManager::production();
    let logger = BufferLogger::new();
    let handle = manager
        .spawn(
            ProcessCommandBuilder::new("sh")
                .args(["-c", "echo one; echo two 1>&2; echo three"])
                .build(),
            Some(Arc::new(logger.clone())),
        )
        .await
        .unwrap();

    handle.wait().await.unwrap();
    assert_eq!(logger.output_lines(), vec!["one", "three"]);
    assert_eq!(logger.error_lines(), vec!["two"]);
}

#[test]
fn test_process_command_builder() {
    let command = ProcessCommandBuilder::new("test")
        .arg("arg1")
        .args(["arg2", "arg3"])
        .env("KEY1", "value1")
        .envs([("KEY2", "value2"), ("KEY3", "value3")])
        .current_dir(std::path::Path::new("/tmp"))
        .timeout(Some(Duration::from_secs(30)))
        .stdin("input data".to_string())
        .build();

    assert_eq!(command.program, "test");
    assert_eq!(command.args, vec!["arg1", "arg2", "arg3"]);
    assert_eq!(command.env.get("KEY1"), Some(&"value1".to_string()));
    assert_eq!(command.env.get("KEY3"), Some(&"value3".to_string()));
    assert_eq!(command.working_dir, Some(std::path::PathBuf::from("/tmp")));
    assert_eq!(command.timeout, Some(Duration::from_secs(30)));
    assert_eq!(command.stdin, Some("input data".to_string()));
}

#[test]
fn test_zero_timeout_is_unbounded() {
    let command = ProcessCommandBuilder::new("sleep")
        .timeout(Some(Duration::ZERO))
        .build();
    assert_eq!(command.timeout, None);
}
