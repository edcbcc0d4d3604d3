use super::args::{EnvCommands, WorkflowCommands};
use super::*;
use crate::config::LabflowConfig;
use crate::error::LabflowError;
use crate::subprocess::SubprocessManager;
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("labflow").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_env_run_keeps_trailing_arguments() {
    let cli = parse(&[
        "-vv", "env", "run", "align", "--timeout", "30", "samtools", "view", "-h", "in.bam",
    ]);
    assert_eq!(cli.verbose, 2);

    let Commands::Env {
        command: EnvCommands::Run {
            name,
            timeout,
            command,
            live,
            ..
        },
    } = cli.command
    else {
        panic!("expected env run");
    };
    assert_eq!(name, "align");
    assert_eq!(timeout, Some(30));
    assert!(!live);
    assert_eq!(command, vec!["samtools", "view", "-h", "in.bam"]);
}

#[test]
fn test_install_collects_channels() {
    let cli = parse(&[
        "env", "install", "qc", "fastqc", "multiqc", "-C", "bioconda", "-C", "conda-forge",
    ]);
    let Commands::Env {
        command: EnvCommands::Install {
            packages, channels, ..
        },
    } = cli.command
    else {
        panic!("expected env install");
    };
    assert_eq!(packages, vec!["fastqc", "multiqc"]);
    assert_eq!(channels, vec!["bioconda", "conda-forge"]);
}

#[test]
fn test_workflow_run_arguments() {
    let cli = parse(&[
        "--config", "site.yml", "workflow", "run", "rnaseq.yml", "-d", "out", "-p", "params.yml",
        "--log-file", "run.log",
    ]);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("site.yml")));

    let Commands::Workflow {
        command: WorkflowCommands::Run { workflow, log_file },
    } = cli.command
    else {
        panic!("expected workflow run");
    };
    assert_eq!(workflow.manifest, std::path::PathBuf::from("rnaseq.yml"));
    assert_eq!(workflow.directory, std::path::PathBuf::from("out"));
    assert!(workflow.catalog.is_none());
    assert_eq!(log_file, Some(std::path::PathBuf::from("run.log")));
}

#[test]
fn test_workflow_requires_directory() {
    assert!(Cli::try_parse_from(["labflow", "workflow", "prepare", "rnaseq.yml"]).is_err());
}

#[tokio::test]
async fn test_env_remove_missing_environment_is_not_found() {
    let (processes, mut mock) = SubprocessManager::mock();
    mock.expect_command("mamba")
        .with_args(|args| args == ["env", "list", "--json"])
        .returns_stdout(r#"{"envs": ["/opt/conda", "/opt/conda/envs/align"]}"#)
        .finish();
    let services = Services::new(LabflowConfig::default(), processes);

    let err = execute_command(
        Commands::Env {
            command: EnvCommands::Remove {
                name: "qc".to_string(),
            },
        },
        &services,
    )
    .await
    .unwrap_err();

    let err = err.downcast_ref::<LabflowError>().unwrap();
    assert!(err.is_not_found());
    assert_eq!(mock.command_lines(), vec!["mamba env list --json"]);
}

#[tokio::test]
async fn test_env_create_runs_manager() {
    let (processes, mut mock) = SubprocessManager::mock();
    mock.expect_command("mamba")
        .with_args(|args| args == ["env", "list", "--json"])
        .returns_stdout(r#"{"envs": ["/opt/conda"]}"#)
        .finish();
    mock.expect_command("mamba")
        .with_args(|args| args == ["create", "-y", "-n", "qc"])
        .returns_success()
        .finish();
    let services = Services::new(LabflowConfig::default(), processes);

    execute_command(
        Commands::Env {
            command: EnvCommands::Create {
                name: "qc".to_string(),
            },
        },
        &services,
    )
    .await
    .unwrap();

    assert!(services.environments.exists("qc").await.unwrap());
    assert!(mock.verify_called("mamba", 2));
}
