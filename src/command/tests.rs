use super::*;
use std::sync::Mutex;

#[test]
fn test_channels_merge_into_one_flag() {
    let command = Command::new(["mamba", "install"])
        .with_flag("-c", "channelA")
        .unwrap()
        .with_flag("-c", "channelB")
        .unwrap();

    assert_eq!(
        command.to_command(),
        vec!["mamba", "install", "-c", "channelA", "channelB"]
    );
}

#[test]
fn test_repeatable_channels() {
    let command = Command::new(["mamba", "install"])
        .add_flag(Flag::new("-c", "channelA").unwrap().repeatable())
        .with_flag("-c", "channelB")
        .unwrap();

    assert_eq!(
        command.to_command(),
        vec!["mamba", "install", "-c", "channelA", "-c", "channelB"]
    );
}

#[test]
fn test_flags_precede_positional_arguments() {
    let command = Command::new(["snakemake"])
        .with_positional_argument("all")
        .with_flag("--cores", 4usize)
        .unwrap()
        .with_flag("--use-conda", true)
        .unwrap();

    assert_eq!(
        command.to_command(),
        vec!["snakemake", "--cores", "4", "--use-conda", "all"]
    );
}

#[test]
fn test_false_and_empty_flags_are_dropped() {
    let command = Command::new(["tool"])
        .with_flag("--quiet", false)
        .unwrap()
        .with_flag("--targets", Vec::<String>::new())
        .unwrap()
        .with_flag("--label", "")
        .unwrap();

    assert_eq!(command.to_command(), vec!["tool"]);
}

#[test]
fn test_empty_positional_argument_is_dropped() {
    let command = Command::new(["echo"])
        .with_positional_arguments(vec!["a".to_string(), String::new(), "b".to_string()]);

    assert_eq!(command.to_command(), vec!["echo", "a", "b"]);
}

#[test]
fn test_three_merges_with_deferred_middle() {
    let packages = std::sync::Arc::new(Mutex::new(Vec::<String>::new()));
    let source = std::sync::Arc::clone(&packages);

    let command = Command::new(["mamba", "install"])
        .with_flag("--pkg", "first")
        .unwrap()
        .with_flag(
            "--pkg",
            FlagValue::deferred(move || {
                FlagValue::List(source.lock().map(|p| p.clone()).unwrap_or_default())
            }),
        )
        .unwrap()
        .with_flag("--pkg", "last")
        .unwrap();

    // The deferred value is only known after the command was assembled.
    packages
        .lock()
        .unwrap()
        .extend(["mid1".to_string(), "mid2".to_string()]);

    assert_eq!(
        command.to_command(),
        vec!["mamba", "install", "--pkg", "first", "mid1", "mid2", "last"]
    );
}

#[test]
fn test_eager_and_deferred_merges_render_the_same() {
    let values: Vec<FlagValue> = vec![
        "a".into(),
        true.into(),
        vec!["b", "c"].into(),
        FlagValue::Absent,
        "d".into(),
    ];

    let mut eager = Command::new(["x"]);
    let mut lazy = Command::new(["x"]);
    for value in values {
        let deferred_copy = value.clone();
        eager = eager.with_flag("-v", value).unwrap();
        lazy = lazy
            .with_flag("-v", FlagValue::deferred(move || deferred_copy.clone()))
            .unwrap();
    }

    assert_eq!(eager.to_command(), lazy.to_command());
    assert_eq!(eager.to_command(), vec!["x", "-v", "a", "b", "c", "d"]);
}

#[test]
fn test_nested_command_as_positional() {
    let inner = Command::new(["fastqc"]).with_flag("-o", "out").unwrap();
    let outer = Command::new(["mamba", "run"])
        .with_flag("-n", "qc")
        .unwrap()
        .with_positional_argument(inner);

    assert_eq!(
        outer.to_command(),
        vec!["mamba", "run", "-n", "qc", "fastqc", "-o", "out"]
    );
}

#[test]
fn test_deferred_positional_arguments() {
    let command = Command::new(["ls"]).with_positional_argument(DeferredArgs::new(|| {
        vec!["-l".to_string(), String::new()]
    }));
    assert_eq!(command.to_command(), vec!["ls", "-l"]);
}

#[test]
fn test_command_line_is_quoted() {
    let command = Command::new(["echo"]).with_positional_argument("hello world");
    assert_eq!(command.command_line(), "echo 'hello world'");
}

#[test]
fn test_to_process_splits_program() {
    let command = Command::new(["git", "clone"]).with_positional_argument("repo");
    let process = command.to_process().unwrap().build();
    assert_eq!(process.program, "git");
    assert_eq!(process.args, vec!["clone", "repo"]);

    assert!(format!("{:?}", command.to_process().unwrap()).contains("clone"));

    let err = Command::default().to_process().unwrap_err();
    assert_eq!(err.code(), crate::error::ErrorCode::COMMAND_EMPTY);
}

#[test]
fn test_remove_flag() {
    let mut command = Command::new(["x"]).with_flag("-y", true).unwrap();
    assert!(command.has_flag("-y"));
    assert!(command.remove_flag("-y").is_some());
    assert_eq!(command.to_command(), vec!["x"]);
}
