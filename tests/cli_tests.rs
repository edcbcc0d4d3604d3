//! Integration tests for the CLI interface
//!
//! Tests the main entry point, settings handling and the env/workflow
//! subcommands against a scratch project.

mod common;

use assert_cmd::Command;
use common::Project;
use predicates::prelude::*;

/// The binary with settings isolated from the user's machine.
fn labflow(project: &Project) -> Command {
    let mut cmd = Command::cargo_bin("labflow").unwrap();
    cmd.current_dir(project.root())
        .env("XDG_CONFIG_HOME", project.path("xdg"))
        .env("HOME", project.root())
        .env_remove("RUST_LOG")
        .env("LABFLOW_TEMPLATES_DIR", project.templates_dir());
    for (name, _) in labflow::config::ENV_OVERRIDES {
        if *name != "LABFLOW_TEMPLATES_DIR" {
            cmd.env_remove(name);
        }
    }
    cmd
}

#[test]
fn test_cli_help_flag() {
    let project = Project::new();
    labflow(&project)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("env"))
        .stdout(predicate::str::contains("workflow"));
}

#[test]
fn test_workflow_help() {
    let project = Project::new();
    labflow(&project)
        .args(["workflow", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prepare"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_invalid_command() {
    let project = Project::new();
    labflow(&project)
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_config_prints_effective_settings() {
    let project = Project::new();
    project.write("labflow.yml", "log_level: warn\nrun:\n  timeout_secs: 60\n");

    labflow(&project)
        .env("LABFLOW_ENV_EXECUTABLE", "micromamba")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("log_level: warn"))
        .stdout(predicate::str::contains("executable: micromamba"))
        .stdout(predicate::str::contains("timeout_secs: 60"));
}

#[test]
fn test_missing_config_file_exits_with_config_code() {
    let project = Project::new();
    labflow(&project)
        .args(["--config", "nowhere.yml", "config"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_invalid_setting_is_reported() {
    let project = Project::new();
    project.write("labflow.yml", "log_level: loud\n");

    labflow(&project)
        .arg("config")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("loud"));
}

#[test]
fn test_workflow_prepare_stages_data_and_writes_configs() {
    let project = Project::new();
    labflow(&project)
        .args(["workflow", "prepare", "manifest.yml", "-d", "runs/pilot"])
        .args(["-p", "params.yml", "--catalog", "catalog.yml", "-m", "metadata.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Prepared 'rnaseq'"))
        .stdout(predicate::str::contains("config/samples.tsv"));

    assert!(project.path("runs/pilot/Snakefile").is_file());
    assert_eq!(
        project.read("runs/pilot/data/S1/reads.fastq"),
        project.read("files/S1.fastq")
    );
    assert!(!project.path("runs/pilot/data/S1/S1.bam").exists());

    let sheet = project.read("runs/pilot/config/samples.tsv");
    let mut lines = sheet.lines();
    assert_eq!(lines.next(), Some("sample\tdataset\tfastq\tcondition"));
    let staged = project.workdir().join("data/S1/reads.fastq");
    assert_eq!(
        lines.next(),
        Some(format!("S1\t10\t{}\tcontrol", staged.display()).as_str())
    );

    let config: serde_json::Value =
        serde_yaml::from_str(&project.read("runs/pilot/config/config.yaml")).unwrap();
    assert_eq!(config["parameters"]["threads"], 4);
    assert_eq!(config["metadata"]["condition"]["S2"], "treated");
}

#[test]
fn test_workflow_prepare_with_unknown_dataset_is_not_found() {
    let project = Project::new();
    project.write("params.yml", "reads:\n  datasets: [\"99\"]\n");

    labflow(&project)
        .args(["workflow", "prepare", "manifest.yml", "-d", "runs/pilot"])
        .args(["-p", "params.yml", "--catalog", "catalog.yml"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("99"));
}

#[test]
fn test_workflow_prepare_rejects_invalid_manifest() {
    let project = Project::new();
    project.write(
        "broken.yml",
        "name: rnaseq\nsource: {type: local, template: rnaseq}\ncommand: {base: [sh]}\n",
    );

    labflow(&project)
        .args(["workflow", "prepare", "broken.yml", "-d", "runs/pilot"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("without an environment"));
}

#[cfg(unix)]
mod with_fake_manager {
    use super::*;

    #[test]
    fn test_env_list() {
        let project = Project::new();
        let manager = project.fake_manager();

        labflow(&project)
            .env("LABFLOW_ENV_EXECUTABLE", &manager)
            .args(["env", "list"])
            .assert()
            .success()
            .stdout(predicate::eq("align\nsnakemake\n"));
    }

    #[test]
    fn test_env_list_json() {
        let project = Project::new();
        let manager = project.fake_manager();

        let output = labflow(&project)
            .env("LABFLOW_ENV_EXECUTABLE", &manager)
            .args(["env", "list", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(names, vec!["align", "snakemake"]);
    }

    #[test]
    fn test_env_run_streams_output() {
        let project = Project::new();
        let manager = project.fake_manager();

        labflow(&project)
            .env("LABFLOW_ENV_EXECUTABLE", &manager)
            .args(["env", "run", "align", "--", "echo", "hello from align"])
            .assert()
            .success()
            .stdout(predicate::str::contains("hello from align"));
    }

    #[test]
    fn test_env_run_in_missing_environment() {
        let project = Project::new();
        let manager = project.fake_manager();

        labflow(&project)
            .env("LABFLOW_ENV_EXECUTABLE", &manager)
            .args(["env", "run", "variants", "--", "true"])
            .assert()
            .code(8)
            .stderr(predicate::str::contains("Environment 'variants' does not exist"));
    }

    #[test]
    fn test_env_run_failure_exits_with_execution_code() {
        let project = Project::new();
        let manager = project.fake_manager();

        labflow(&project)
            .env("LABFLOW_ENV_EXECUTABLE", &manager)
            .args(["env", "run", "align", "--", "sh", "-c", "exit 4"])
            .assert()
            .code(5);
    }

    #[test]
    fn test_workflow_run_executes_in_workflow_directory() {
        let project = Project::new();
        let manager = project.fake_manager();

        labflow(&project)
            .env("LABFLOW_ENV_EXECUTABLE", &manager)
            .args(["workflow", "run", "manifest.yml", "-d", "runs/pilot"])
            .args(["-p", "params.yml", "--catalog", "catalog.yml"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "S2\t10\t{}",
                project.workdir().join("data/S2/reads.fastq").display()
            )))
            .stdout(predicate::str::contains("Workflow 'rnaseq' completed"));
    }

    #[test]
    fn test_workflow_run_failure_writes_log_file() {
        let project = Project::new();
        let manager = project.fake_manager();
        project.write("templates/rnaseq/run.sh", "echo starting\nexit 3\n");

        labflow(&project)
            .env("LABFLOW_ENV_EXECUTABLE", &manager)
            .args(["workflow", "run", "manifest.yml", "-d", "runs/pilot"])
            .args(["-p", "params.yml", "--catalog", "catalog.yml"])
            .args(["--log-file", "logs/run.log"])
            .assert()
            .code(5)
            .stderr(predicate::str::contains("Workflow 'rnaseq' failed"));

        assert!(project.read("logs/run.log").contains("starting"));
    }
}
