//! These tests run the actual niso binary against throwaway project trees.

use std::path::Path;
use tokio::process::Command;

fn niso(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_niso"));
    cmd.arg("-C").arg(dir);
    cmd
}

#[tokio::test]
async fn test_cli_version_works() {
    let output = Command::new(env!("CARGO_BIN_EXE_niso"))
        .arg("--version")
        .output()
        .await
        .expect("Failed to run niso --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("niso"));
}

#[tokio::test]
async fn test_compile_outside_project_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = niso(dir.path())
        .arg("compile")
        .output()
        .await
        .expect("Failed to run niso compile");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("niso.yml"), "unexpected stderr: {stderr}");
    assert!(!dir.path().join("compiled").exists());
}

#[tokio::test]
async fn test_create_then_compile_role() {
    let dir = tempfile::tempdir().unwrap();

    let created = niso(dir.path())
        .args(["create", "site"])
        .output()
        .await
        .expect("Failed to run niso create");
    assert!(created.status.success());

    let project = dir.path().join("site");
    let compiled = niso(&project)
        .args(["compile", "web"])
        .output()
        .await
        .expect("Failed to run niso compile");
    assert!(
        compiled.status.success(),
        "compile failed: {}",
        String::from_utf8_lossy(&compiled.stderr)
    );

    let install = std::fs::read_to_string(project.join("compiled/install.sh")).unwrap();
    let base = std::fs::read_to_string(project.join("install.sh")).unwrap();
    let role = std::fs::read_to_string(project.join("roles/web.sh")).unwrap();
    assert_eq!(install, format!("{base}\n{role}"));
    assert!(project.join("compiled/recipes/niso.sh").is_file());
}

#[tokio::test]
async fn test_unknown_role_fails_before_compiling() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("niso.yml"), "attributes:\n  env: dev\n").unwrap();
    std::fs::write(dir.path().join("install.sh"), "echo base").unwrap();

    let output = niso(dir.path())
        .args(["compile", "cache"])
        .output()
        .await
        .expect("Failed to run niso compile");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cache doesn't exist!"), "unexpected stderr: {stderr}");
    assert!(!dir.path().join("compiled").exists());
}

#[tokio::test]
async fn test_deploy_missing_instance_record_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("niso.yml"), "").unwrap();

    let output = niso(dir.path())
        .args(["deploy", "do", "ghost"])
        .output()
        .await
        .expect("Failed to run niso deploy");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ghost"), "unexpected stderr: {stderr}");
}
