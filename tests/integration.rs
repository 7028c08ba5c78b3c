use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn smehub_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("smehub");
    path
}

fn write_config(extra: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[server]
bind = "127.0.0.1:0"

{}
"#,
        extra
    );

    let config_path = config_dir.join("smehub.toml");
    fs::write(&config_path, config_content).unwrap();
    (tmp, config_path)
}

fn run_smehub(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = smehub_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("CLAUDE_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("TAVILY_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run smehub binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

const ACME_ARGS: &[&str] = &[
    "generate",
    "--business-name",
    "Acme",
    "--postal-code",
    "90210",
    "--country",
    "US",
    "--industry",
    "Tech",
    "--prompt",
    "Summarize market",
];

#[test]
fn test_generate_fallback_only() {
    let (_tmp, config_path) = write_config("");
    let mut args = ACME_ARGS.to_vec();
    args.push("--fallback-only");

    let (stdout, stderr, success) = run_smehub(&config_path, &args);
    assert!(success, "generate failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("# Comprehensive Business Report for Acme"));
    assert!(stdout.contains("Summarize market"));
    assert!(stderr.contains("source: fallback"));
}

#[test]
fn test_generate_with_disabled_providers_falls_back() {
    let (_tmp, config_path) = write_config(
        r#"[completion]
provider = "disabled"

[search]
provider = "disabled"
"#,
    );

    let (stdout, stderr, success) = run_smehub(&config_path, ACME_ARGS);
    assert!(success, "generate failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Acme"));
    assert!(stdout.contains("Summarize market"));
    assert!(stderr.contains("source: fallback"));
}

#[test]
fn test_generate_is_deterministic_on_fallback() {
    let (_tmp, config_path) = write_config("");
    let mut args = ACME_ARGS.to_vec();
    args.push("--fallback-only");

    let (first, _, ok1) = run_smehub(&config_path, &args);
    let (second, _, ok2) = run_smehub(&config_path, &args);
    assert!(ok1 && ok2);
    assert_eq!(first, second);
}

#[test]
fn test_generate_without_config_file_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.toml");

    let (stdout, stderr, success) = run_smehub(&missing, ACME_ARGS);
    assert!(success, "generate failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Acme"));
}

#[test]
fn test_check_memory_store() {
    let (_tmp, config_path) = write_config("[store]\nprovider = \"memory\"\n");

    let (stdout, stderr, success) = run_smehub(&config_path, &["check"]);
    assert!(success, "check failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("store connected: true"));
    assert!(stdout.contains("completion"));
}

#[test]
fn test_check_shows_completion_model_defaults() {
    let (_tmp, config_path) = write_config("[completion]\nprovider = \"anthropic\"\n");

    let (stdout, stderr, success) = run_smehub(&config_path, &["check"]);
    assert!(success, "check failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("model=claude-3-5-sonnet-20241022"));
    assert!(stdout.contains("max_tokens=4000"));
}

#[test]
fn test_check_unreachable_firestore_fails() {
    let (_tmp, config_path) = write_config(
        r#"[store]
provider = "firestore"
project_id = "smehub"
base_url = "http://127.0.0.1:1"
timeout_secs = 2
"#,
    );

    let (stdout, _stderr, success) = run_smehub(&config_path, &["check"]);
    assert!(!success, "check should fail against an unreachable store");
    assert!(stdout.contains("store connected: false"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config_path) = write_config("[completion]\nprovider = \"llama\"\n");

    let (_stdout, stderr, success) = run_smehub(&config_path, &["check"]);
    assert!(!success);
    assert!(stderr.contains("Unknown completion provider"));
}

#[test]
fn test_missing_config_fails_for_serve() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.toml");

    let (_stdout, stderr, success) = run_smehub(&missing, &["serve"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
