// End-to-end tests for the vocab_tool binary (offline, synthetic cache).

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_table(dir: &Path) {
    let body: String = ["hello", "world"]
        .iter()
        .enumerate()
        .map(|(w, word)| {
            let values: Vec<String> = (0..50).map(|i| format!("{}", w as f32 + i as f32 / 100.0)).collect();
            format!("{word} {}\n", values.join(" "))
        })
        .collect();
    std::fs::write(dir.join("glove.6B.50d.txt"), body).unwrap();
}

fn tool(cache: &Path, logs: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vocab_tool").unwrap();
    cmd.env("GLOVE_VOCAB_LOG_DIR", logs)
        .arg("--dim")
        .arg("50")
        .arg("--cache")
        .arg(cache)
        .arg("--offline");
    cmd
}

#[test]
fn test_info() {
    let cache = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    write_table(cache.path());

    // h e l o w r d + uppercase = 14, + UNK
    tool(cache.path(), logs.path())
        .arg("--info")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""alphabetSize":15"#))
        .stdout(predicate::str::contains(r#""totalDim":65"#))
        .stdout(predicate::str::contains(r#""words":2"#));
}

#[test]
fn test_encode_lines() {
    let cache = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    write_table(cache.path());

    let output = tool(cache.path(), logs.path())
        .write_stdin("[\"Hello\", \"there\"]\n\nnot json\n[]\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0]["wordIndices"], serde_json::json!([0, 2]));
    assert_eq!(lines[0]["knownWords"], serde_json::json!([true, false]));
    assert_eq!(lines[0]["charShapes"], serde_json::json!([[5, 15], [5, 15]]));
    assert!(lines[0].get("wordVectors").is_none());

    assert!(lines[1]["error"].as_str().unwrap().contains("JSON array"));
    assert_eq!(lines[2]["tokens"], serde_json::json!([]));
}

#[test]
fn test_missing_cache_fails() {
    let cache = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();

    tool(cache.path(), logs.path())
        .arg("--info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
}

#[test]
fn test_unsupported_dim_fails() {
    let cache = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    write_table(cache.path());

    tool(cache.path(), logs.path())
        .args(["--dim", "64", "--info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported word vector dimension 64"));
}

#[test]
fn test_config_file() {
    let cache = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    write_table(cache.path());
    let config_path = cache.path().join("vocab.json");
    std::fs::write(
        &config_path,
        serde_json::json!({ "wordVecDim": 50, "cacheDir": cache.path(), "allowDownload": false }).to_string(),
    )
    .unwrap();

    Command::cargo_bin("vocab_tool")
        .unwrap()
        .env("GLOVE_VOCAB_LOG_DIR", logs.path())
        .arg("--config")
        .arg(&config_path)
        .arg("--vectors")
        .write_stdin("[\"world\"]\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""wordVectors":[[1.0,"#));
}
