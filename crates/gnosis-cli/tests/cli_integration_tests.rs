//! CLI integration tests for gnosis
//!
//! Runs the binary end-to-end with `--local` services and an isolated
//! config directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with an isolated config dir and no provider keys
#[allow(deprecated)]
fn gnosis_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gnosis").unwrap();
    cmd.current_dir(config_dir.path())
        .env("GNOSIS_CONFIG_DIR", config_dir.path())
        .env_remove("VOYAGE_API_KEY")
        .env_remove("CEREBRAS_API_KEY")
        .env_remove("QDRANT_API_KEY")
        .env_remove("GNOSIS_QDRANT_URL")
        .env_remove("GNOSIS_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_config_path_uses_config_dir() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["config", "set", "vector_store.collection", "philosophy_graph"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set vector_store.collection"));

    assert!(dir.path().join("config.toml").exists());

    gnosis_cmd(&dir)
        .args(["config", "get", "vector_store.collection"])
        .assert()
        .success()
        .stdout(predicate::str::diff("philosophy_graph\n"));
}

#[test]
fn test_config_refuses_api_keys() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["config", "set", "llm.api_key", "csk-secret"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("environment"));
}

#[test]
fn test_config_list_json() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["config", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"embedding.model\": \"voyage-3\""))
        .stdout(predicate::str::contains("not set"));
}

#[test]
fn test_local_seed() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["--local", "seed", "Quantum Computing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quantum-computing"))
        .stdout(predicate::str::contains(
            "Created root node for 'Quantum Computing' and stored in vector database.",
        ));
}

#[test]
fn test_local_seed_json() {
    let dir = TempDir::new().unwrap();

    let output = gnosis_cmd(&dir)
        .args(["--local", "--format", "json", "seed", "Philosophy"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["node"]["id"], "philosophy");
    assert_eq!(json["node"]["type"], "root");
    assert_eq!(json["node"]["reason"], "User-provided seed topic");
}

#[test]
fn test_local_check_similarity_json() {
    let dir = TempDir::new().unwrap();

    let output = gnosis_cmd(&dir)
        .args([
            "--local",
            "--format",
            "json",
            "check-similarity",
            "Cats",
            "-c",
            "Cats",
            "-c",
            "Physics",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["closest_match"], "Cats");
    assert_eq!(json["suggested_action"], "expand");
    assert_eq!(json["is_related"], true);
}

#[test]
fn test_invalid_threshold_exits_with_2() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["--local", "check-similarity", "Cats", "-c", "Dogs", "-t", "1.5"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("threshold"));
}

#[test]
fn test_invalid_expansion_count_exits_with_2() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["--local", "expand", "Philosophy", "-n", "0"])
        .assert()
        .code(2);
}

#[test]
fn test_expand_without_model_key_fails() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["--local", "expand", "Philosophy"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CEREBRAS_API_KEY"));
}

#[test]
fn test_local_health() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["--local", "health", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"healthy\""));
}

#[test]
fn test_remote_services_need_embedding_key() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["health"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("VOYAGE_API_KEY"));
}

#[test]
fn test_json_errors_carry_code() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .args(["--local", "--format", "json", "seed", "   "])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("\"error_code\":\"INVALID_INPUT\""));
}

#[test]
fn test_config_set_does_not_persist_env_overrides() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .env("GNOSIS_QDRANT_URL", "http://ephemeral:6333")
        .env("GNOSIS_LOG_LEVEL", "trace")
        .args(["config", "set", "llm.model", "llama-3.3-70b"])
        .assert()
        .success();

    let contents = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(contents.contains("llama-3.3-70b"));
    assert!(!contents.contains("ephemeral"));
    assert!(!contents.contains("trace"));

    gnosis_cmd(&dir)
        .args(["config", "get", "vector_store.url"])
        .assert()
        .success()
        .stdout(predicate::str::diff("http://localhost:6333\n"));
}

#[test]
fn test_config_get_reads_stored_value() {
    let dir = TempDir::new().unwrap();

    gnosis_cmd(&dir)
        .env("GNOSIS_QDRANT_URL", "http://ephemeral:6333")
        .args(["config", "get", "vector_store.url"])
        .assert()
        .success()
        .stdout(predicate::str::diff("http://localhost:6333\n"));
}
