use super::*;
use crate::error::{ErrorCode, LabflowError};
use crate::subprocess::{BufferLogger, MockProcessRunner, ProcessRunner};
use std::sync::Arc;
use tempfile::TempDir;

fn git_source(mock: &MockProcessRunner, reference: GitRef) -> GitSource {
    let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
    GitSource::new("https://example.org/lab/rnaseq.git", runner).with_ref(reference)
}

#[test]
fn test_git_ref_from_parts() {
    assert_eq!(GitRef::from_parts(None, None).unwrap(), GitRef::Default);
    assert_eq!(
        GitRef::from_parts(Some("dev".into()), None).unwrap(),
        GitRef::Branch("dev".into())
    );
    assert_eq!(
        GitRef::from_parts(None, Some("v1.2".into())).unwrap(),
        GitRef::Tag("v1.2".into())
    );

    let err = GitRef::from_parts(Some("dev".into()), Some("v1.2".into())).unwrap_err();
    assert!(matches!(err, LabflowError::Config { .. }));
}

#[tokio::test]
async fn test_git_pull_clones_tag() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("workflow");

    let mut mock = MockProcessRunner::new();
    mock.expect_command("git")
        .runs(|command| {
            let target = command.args.last().unwrap();
            std::fs::create_dir_all(target).unwrap();
        })
        .returns_stderr("Cloning into 'workflow'...\n")
        .finish();

    let logger = BufferLogger::new();
    let source = git_source(&mock, GitRef::Tag("v1.2".into()));
    source
        .pull(&destination, Some(Arc::new(logger.clone())))
        .await
        .unwrap();

    assert!(destination.is_dir());
    let call = &mock.get_call_history()[0];
    assert_eq!(
        call.args,
        vec![
            "clone".to_string(),
            "--depth".to_string(),
            "1".to_string(),
            "--branch".to_string(),
            "v1.2".to_string(),
            "https://example.org/lab/rnaseq.git".to_string(),
            destination.to_string_lossy().to_string(),
        ]
    );
    assert_eq!(logger.error_lines(), vec!["Cloning into 'workflow'..."]);
}

#[tokio::test]
async fn test_git_pull_full_history_without_ref() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("workflow");

    let mut mock = MockProcessRunner::new();
    mock.expect_command("git")
        .runs(|command| {
            std::fs::create_dir_all(command.args.last().unwrap()).unwrap();
        })
        .finish();

    let source = git_source(&mock, GitRef::Default).with_settings(GitSettings {
        executable: "git".into(),
        depth: 0,
    });
    source.pull(&destination, None).await.unwrap();

    let call = &mock.get_call_history()[0];
    assert_eq!(call.args.len(), 3);
    assert_eq!(call.args[0], "clone");
}

#[tokio::test]
async fn test_git_pull_missing_tag_fails_and_leaves_no_directory() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("workflow");

    let mut mock = MockProcessRunner::new();
    mock.expect_command("git")
        .returns_stderr("fatal: Remote branch v9.9 not found in upstream origin\n")
        .returns_exit_code(128)
        .finish();

    let source = git_source(&mock, GitRef::Tag("v9.9".into()));
    let err = source.pull(&destination, None).await.unwrap_err();

    assert!(matches!(err, LabflowError::WorkflowPull { .. }));
    assert_eq!(err.code(), ErrorCode::PULL_TOOL_FAILED);
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_git_pull_without_destination_is_pull_error() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("workflow");

    let mut mock = MockProcessRunner::new();
    mock.expect_command("git").returns_success().finish();

    let source = git_source(&mock, GitRef::Default);
    let err = source.pull(&destination, None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::PULL_DESTINATION_MISSING);
}

#[tokio::test]
async fn test_local_source_copies_recursively() {
    let templates = TempDir::new().unwrap();
    let template = templates.path().join("variant-calling");
    std::fs::create_dir_all(template.join("rules")).unwrap();
    std::fs::write(template.join("Snakefile"), "include: 'rules/call.smk'\n").unwrap();
    std::fs::write(template.join("rules").join("call.smk"), "rule call:\n").unwrap();

    let work = TempDir::new().unwrap();
    let destination = work.path().join("run-1");

    let logger = BufferLogger::new();
    let source = LocalSource::new(templates.path(), "variant-calling");
    source
        .pull(&destination, Some(Arc::new(logger.clone())))
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(destination.join("rules").join("call.smk")).unwrap(),
        "rule call:\n"
    );
    assert!(destination.join("Snakefile").is_file());
    assert_eq!(logger.output_lines().len(), 1);
}

#[tokio::test]
async fn test_local_source_missing_template() {
    let templates = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let destination = work.path().join("run-1");

    let source = LocalSource::new(templates.path(), "absent");
    let err = source.pull(&destination, None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::PULL_TEMPLATE_MISSING);
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_local_source_rejects_paths_outside_templates() {
    let root = TempDir::new().unwrap();
    let templates = root.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::create_dir_all(root.path().join("secret")).unwrap();
    let destination = root.path().join("run-1");

    for name in ["../secret", "nested/rnaseq", "/etc", "", "."] {
        let source = LocalSource::new(&templates, name);
        assert!(source.template_path().is_err(), "{name}");
        let err = source.pull(&destination, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);
    }
    assert!(!destination.exists());
    assert_eq!(
        LocalSource::new(&templates, "rnaseq").template_path().unwrap(),
        templates.join("rnaseq")
    );
}

#[test]
fn test_source_spec_from_yaml() {
    let spec: SourceSpec = serde_yaml::from_str(
        "type: git\nurl: https://example.org/lab/rnaseq.git\ntag: v2.0\n",
    )
    .unwrap();
    assert_eq!(
        spec,
        SourceSpec::Git {
            url: "https://example.org/lab/rnaseq.git".into(),
            branch: None,
            tag: Some("v2.0".into()),
        }
    );

    let spec: SourceSpec = serde_yaml::from_str("type: local\ntemplate: qc\n").unwrap();
    assert!(matches!(spec, SourceSpec::Local { ref template, .. } if template == "qc"));
}

#[test]
fn test_source_spec_build_rejects_branch_and_tag() {
    let spec = SourceSpec::Git {
        url: "https://example.org/x.git".into(),
        branch: Some("main".into()),
        tag: Some("v1".into()),
    };
    let runner = Arc::new(MockProcessRunner::new()) as Arc<dyn ProcessRunner>;
    let err = spec
        .build(runner, &GitSettings::default(), None)
        .err()
        .unwrap();
    assert!(matches!(err, LabflowError::Config { .. }));
}

#[test]
fn test_local_spec_needs_templates_dir() {
    let spec = SourceSpec::Local {
        template: "qc".into(),
        templates_dir: None,
    };
    let runner = Arc::new(MockProcessRunner::new()) as Arc<dyn ProcessRunner>;
    assert!(spec.build(runner.clone(), &GitSettings::default(), None).is_err());
    let source = spec
        .build(runner, &GitSettings::default(), Some(std::path::Path::new("/srv/templates")))
        .unwrap();
    assert_eq!(source.describe(), "template 'qc'");
}
