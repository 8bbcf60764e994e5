//! Exit codes and filesystem effects of the detviz binary

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn detviz(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_detviz"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "detviz=info")
        .output()
        .expect("failed to launch detviz")
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
fn test_too_few_arguments_prints_usage_and_exits_1() {
    let dir = TempDir::new().unwrap();

    for args in [
        vec![],
        vec!["weights.onnx"],
        vec!["weights.onnx", "net.toml", "3"],
    ] {
        let output = detviz(&args, dir.path());
        let stderr = String::from_utf8_lossy(&output.stderr);

        assert_eq!(output.status.code(), Some(1), "args {:?}", args);
        assert!(stderr.contains("Usage"), "stderr: {}", stderr);
    }

    assert_eq!(entries(dir.path()), 0);
}

#[test]
fn test_unparsable_batch_count_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = detviz(&["w.onnx", "net.toml", "lots", "out"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_help_exits_0() {
    let dir = TempDir::new().unwrap();
    let output = detviz(&["--help"], dir.path());

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PRETRAINED_WEIGHTS"));
}

#[test]
fn test_missing_description_is_fatal_without_output() {
    let dir = TempDir::new().unwrap();
    let output = detviz(&["w.onnx", "missing.toml", "1", "out"], dir.path());
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Using CPU"), "stderr: {}", stderr);
    assert!(stderr.contains("missing.toml"), "stderr: {}", stderr);
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_gpu_mode_is_logged() {
    let dir = TempDir::new().unwrap();
    let output = detviz(&["w.onnx", "missing.toml", "1", "out", "GPU", "1"], dir.path());
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Using GPU"), "stderr: {}", stderr);
    assert!(stderr.contains("Using Device_id=1"), "stderr: {}", stderr);
}

#[test]
fn test_missing_weights_is_fatal_without_output() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("list.txt"), "a.png 0\n").unwrap();
    std::fs::write(
        dir.path().join("net.toml"),
        "[data]\nsource = \"list.txt\"\nbatch_size = 1\n",
    )
    .unwrap();

    let output = detviz(&["missing.onnx", "net.toml", "1", "out"], dir.path());
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("missing.onnx"), "stderr: {}", stderr);
    assert!(!dir.path().join("out").exists());
}
