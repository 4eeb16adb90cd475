// tests/integration_test.rs
use std::fs;
use std::process::Command;

fn module_builder() -> Command {
    Command::new(env!("CARGO_BIN_EXE_module-builder"))
}

#[test]
fn test_module_builder_help() {
    let output = module_builder()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("module-builder"));
    assert!(stdout.contains("module"));
    assert!(stdout.contains("sort"));
}

#[test]
fn test_module_without_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let output = module_builder()
        .current_dir(dir.path())
        .arg("module")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("No modules set, nothing to do."));
    assert!(!dir.path().join("index-dev.yaml").exists());
}

#[test]
fn test_invalid_promotion_rejected() {
    let output = module_builder()
        .args(["module", "--promote", "patch", "foo"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_missing_module_dir_exits_with_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = module_builder()
        .current_dir(dir.path())
        .args(["module", "does-not-exist"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("does-not-exist"), "got: {}", stderr);
}

#[test]
fn test_sort_orders_index() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("index.yaml"),
        "apiVersion: kaas.mirantis.com/v1alpha1\n\
         kind: HostOSConfigurationModules\n\
         metadata:\n  name: host-os-modules\n\
         spec:\n  modules:\n\
         \x20 - name: foo\n    version: 1.10.0\n    sha256sum: aa\n\
         \x20 - name: foo\n    version: 1.2.0\n    sha256sum: bb\n",
    )
    .unwrap();

    let output = module_builder()
        .current_dir(dir.path())
        .arg("sort")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let sorted = fs::read_to_string(dir.path().join("index.yaml")).unwrap();
    let first = sorted.find("1.2.0").unwrap();
    let second = sorted.find("1.10.0").unwrap();
    assert!(first < second, "got: {}", sorted);
    assert!(!dir.path().join("index-dev.yaml").exists());
}
