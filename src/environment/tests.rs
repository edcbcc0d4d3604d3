use super::*;
use crate::command::Command;
use crate::error::{ErrorCode, LabflowError};
use crate::subprocess::{BufferLogger, MockProcessRunner, ProcessRunner};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const ENV_LIST: &str = r#"{
  "envs": [
    "/opt/conda",
    "/opt/conda/envs/align",
    "/opt/conda/envs/qc"
  ]
}"#;

fn service_with(mock: &MockProcessRunner) -> EnvironmentService {
    let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
    EnvironmentService::new(runner, EnvironmentManagerConfig::default())
}

fn expect_env_list(mock: &mut MockProcessRunner, stdout: &str) {
    mock.expect_command("mamba")
        .with_args(|args| args == ["env", "list", "--json"])
        .returns_stdout(stdout)
        .finish();
}

#[test]
fn test_listing_strips_roots_and_skips_base() {
    let listing: EnvironmentListing = serde_json::from_str(
        r#"{"envs": ["/opt/conda", "/opt/conda/envs/base", "/data/envs/tools/bwa", "/opt/conda/envs/qc"]}"#,
    )
    .unwrap();

    let names = listing.names(&[PathBuf::from("/data/envs")], "base");
    assert_eq!(names, vec!["tools/bwa", "qc"]);
}

#[tokio::test]
async fn test_environments_are_cached() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    let service = service_with(&mock);

    assert_eq!(service.environments().await.unwrap(), vec!["align", "qc"]);
    assert_eq!(service.environments().await.unwrap(), vec!["align", "qc"]);
    assert!(mock.verify_called("mamba", 1));

    service.refresh().await.unwrap();
    assert!(mock.verify_called("mamba", 2));
}

#[tokio::test]
async fn test_create_existing_environment_is_noop() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    let service = service_with(&mock);

    let env = service.create("align").await.unwrap();
    assert_eq!(env.name(), "align");
    assert_eq!(mock.command_lines(), vec!["mamba env list --json"]);
}

#[tokio::test]
async fn test_create_new_environment_updates_cache() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    mock.expect_command("mamba")
        .with_args(|args| args == ["create", "-y", "-n", "variants"])
        .returns_success()
        .times(1)
        .finish();
    let service = service_with(&mock);

    service.create("variants").await.unwrap();
    assert!(service.exists("variants").await.unwrap());
    // The second create is answered from the cache.
    service.create("variants").await.unwrap();
    assert!(mock.verify_called("mamba", 2));
}

#[tokio::test]
async fn test_create_rejects_invalid_name() {
    let mock = MockProcessRunner::new();
    let service = service_with(&mock);

    let err = service.create("two words").await.unwrap_err();
    assert!(matches!(err, LabflowError::Command { .. }));
    assert!(mock.get_call_history().is_empty());
}

#[tokio::test]
async fn test_unknown_environment_is_not_found() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    let service = service_with(&mock);

    let err = service.environment("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.code(), ErrorCode::NOT_FOUND_ENVIRONMENT);
}

#[tokio::test]
async fn test_env_list_failure_is_execution_error() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command("mamba")
        .returns_stdout("not json either")
        .returns_exit_code(2)
        .finish();
    let service = service_with(&mock);

    let err = service.environments().await.unwrap_err();
    assert!(matches!(err, LabflowError::Execution { .. }));
    assert_eq!(err.process_exit_code(), Some(2));
}

#[tokio::test]
async fn test_env_list_bad_json_is_protocol_error() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, "{ not json");
    let service = service_with(&mock);

    let err = service.environments().await.unwrap_err();
    assert!(matches!(err, LabflowError::Protocol { .. }));
    assert!(err.to_string().contains("mamba env list --json"));
}

#[tokio::test]
async fn test_run_failure_carries_command_line_and_status() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    mock.expect_command("mamba")
        .with_args(|args| args.first().map(String::as_str) == Some("run"))
        .returns_stderr("boom\n")
        .returns_exit_code(3)
        .finish();
    let service = service_with(&mock);
    let env = service.environment("align").await.unwrap();

    let command = Command::new(["samtools", "index"]).with_positional_argument("in.bam");
    let err = env
        .run(
            &command,
            RunOptions::new().timeout(Some(Duration::from_secs(60))),
        )
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("mamba run -n align samtools index in.bam"));
    assert!(message.contains('3'));
    assert_eq!(err.process_exit_code(), Some(3));
}

#[tokio::test]
async fn test_run_with_cwd_and_live_output() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    mock.expect_command("mamba")
        .with_args(|args| {
            args == [
                "run",
                "-n",
                "qc",
                "--cwd",
                "/work/run1",
                "--live-stream",
                "fastqc",
                "reads.fq",
            ]
        })
        .returns_stdout("Analysis complete\n")
        .finish();
    let service = service_with(&mock);
    let env = service.environment("qc").await.unwrap();
    let logger = BufferLogger::new();

    let output = env
        .run(
            &Command::new(["fastqc", "reads.fq"]),
            RunOptions::new()
                .cwd("/work/run1")
                .live(true)
                .output(Arc::new(logger.clone())),
        )
        .await
        .unwrap();

    assert!(output.status.success());
    assert_eq!(logger.output_lines(), vec!["Analysis complete"]);
}

#[tokio::test]
async fn test_install_uses_repeatable_channels() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    mock.expect_command("mamba")
        .with_args(|args| args.first().map(String::as_str) == Some("install"))
        .finish();

    let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
    let config = EnvironmentManagerConfig {
        default_channels: vec!["conda-forge".to_string()],
        ..Default::default()
    };
    let service = EnvironmentService::new(runner, config);
    let env = service.environment("align").await.unwrap();

    let handle = env.install(&["bwa", "samtools"], &["bioconda"]).await.unwrap();
    handle.wait().await.unwrap();

    let history = mock.command_lines();
    assert_eq!(
        history.last().unwrap(),
        "mamba install -n align -y -c conda-forge -c bioconda bwa samtools"
    );
}

#[tokio::test]
async fn test_list_packages() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    mock.expect_command("mamba")
        .with_args(|args| args == ["list", "-n", "align", "--json"])
        .returns_stdout(
            r#"[{"name": "bwa", "version": "0.7.17", "build_string": "h5bf99c6_8", "channel": "bioconda"},
                {"name": "zlib", "version": "1.2.13"}]"#,
        )
        .finish();
    let service = service_with(&mock);
    let env = service.environment("align").await.unwrap();

    let packages = env.packages().await.unwrap();
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0].name, "bwa");
    assert_eq!(packages[0].channel.as_deref(), Some("bioconda"));
    assert_eq!(packages[1].build_string, None);
}

#[tokio::test]
async fn test_remove_is_idempotent_and_invalidates_handles() {
    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    mock.expect_command("mamba")
        .with_args(|args| args == ["env", "remove", "-n", "qc", "-y"])
        .times(1)
        .finish();
    let service = service_with(&mock);
    let env = service.environment("qc").await.unwrap();
    let other = service.environment("qc").await.unwrap();

    env.remove().await.unwrap();
    env.remove().await.unwrap();

    assert!(other.is_removed());
    assert!(other.list().await.unwrap_err().is_not_found());
    assert_eq!(service.environments().await.unwrap(), vec!["align"]);
    assert!(service.environment("qc").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_run_json_decodes_output() {
    #[derive(serde::Deserialize)]
    struct Versions {
        samtools: String,
    }

    let mut mock = MockProcessRunner::new();
    expect_env_list(&mut mock, ENV_LIST);
    mock.expect_command("mamba")
        .with_args(|args| args.first().map(String::as_str) == Some("run"))
        .returns_stdout(r#"{"samtools": "1.17"}"#)
        .finish();
    let service = service_with(&mock);
    let env = service.environment("align").await.unwrap();

    let versions: Versions = env
        .run_json(&Command::new(["versions", "--json"]), RunOptions::new())
        .await
        .unwrap();
    assert_eq!(versions.samtools, "1.17");
}
