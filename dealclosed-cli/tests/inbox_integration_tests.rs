//! Integration tests for the DealClosed CLI inbox commands.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;

#[tokio::test]
async fn test_open_command_help() {
    let mut cmd = cargo_bin_cmd!("dealclosed");
    cmd.arg("open").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains(
            "Open a conversation and follow it interactively",
        ))
        .stdout(predicates::str::contains("--conversation"))
        .stdout(predicates::str::contains("--show-echoes"))
        .stdout(predicates::str::contains("--config"));
}

#[tokio::test]
async fn test_open_command_requires_conversation() {
    let mut cmd = cargo_bin_cmd!("dealclosed");
    cmd.arg("open").timeout(std::time::Duration::from_secs(5));

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains(
            "the following required arguments were not provided",
        ))
        .stderr(predicates::str::contains("--conversation <CONVERSATION>"));
}

#[tokio::test]
async fn test_open_command_invalid_conversation_uuid() {
    let mut cmd = cargo_bin_cmd!("dealclosed");
    cmd.arg("open")
        .arg("--conversation")
        .arg("not-a-uuid")
        .timeout(std::time::Duration::from_secs(5));

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("invalid value"))
        .stderr(predicates::str::contains("--conversation <CONVERSATION>"));
}

#[tokio::test]
async fn test_inbox_command_without_session() {
    let missing = tempfile::tempdir().unwrap();
    let session_file = missing.path().join("session.json");

    let mut cmd = cargo_bin_cmd!("dealclosed");
    cmd.arg("inbox")
        .env("DEALCLOSED_SESSION_FILE", &session_file)
        .timeout(std::time::Duration::from_secs(10));

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("no active session found"));
}

#[tokio::test]
async fn test_session_me_without_session() {
    let missing = tempfile::tempdir().unwrap();
    let session_file = missing.path().join("session.json");

    let mut cmd = cargo_bin_cmd!("dealclosed");
    cmd.arg("session")
        .arg("me")
        .env("DEALCLOSED_SESSION_FILE", &session_file)
        .timeout(std::time::Duration::from_secs(10));

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("no active session found").or(
            predicates::str::contains("run `dealclosed session login` first"),
        ));
}

#[tokio::test]
async fn test_send_command_connection_failure() {
    let missing = tempfile::tempdir().unwrap();
    let session_file = missing.path().join("session.json");

    let mut cmd = cargo_bin_cmd!("dealclosed");
    cmd.arg("send")
        .arg("--conversation")
        .arg("00000000-0000-0000-0000-000000000001")
        .arg("hello")
        .env("DEALCLOSED_SESSION_FILE", &session_file)
        .timeout(std::time::Duration::from_secs(10));

    cmd.assert().failure().stderr(
        predicates::str::contains("no active session found")
            .or(predicates::str::contains("no conversation is selected")),
    );
}

#[tokio::test]
async fn test_config_command_writes_file() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = cargo_bin_cmd!("dealclosed");
    cmd.arg("config")
        .arg("--format")
        .arg("json")
        .current_dir(dir.path())
        .timeout(std::time::Duration::from_secs(10));

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("generated successfully"));
    assert!(dir.path().join("config.json").exists());
}

#[tokio::test]
async fn test_completion_command_emits_script() {
    let mut cmd = cargo_bin_cmd!("dealclosed");
    cmd.arg("completion").arg("--shell").arg("bash");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("dealclosed"));
}
