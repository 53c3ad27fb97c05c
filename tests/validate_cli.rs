use std::io::Write;

use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

fn record(id: usize) -> Value {
    let difficulty = ["Easy", "Medium", "Hard", "Expert"][id % 4];
    json!({
        "id": id,
        "question": format!("Question {id}?"),
        "answers": ["w", "x", "y", "z"],
        "correctIndex": id % 4,
        "explanation": "because",
        "difficulty": difficulty,
    })
}

fn bank_file(records: &[Value]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&serde_json::to_vec(records).unwrap()).unwrap();
    file.flush().unwrap();
    file
}

fn full_bank() -> Vec<Value> {
    (1..=200).map(record).collect()
}

fn validate() -> Command {
    Command::cargo_bin("kwiz-validate").unwrap()
}

#[test]
fn accepts_a_full_bank() {
    let file = bank_file(&full_bank());
    let out = validate().arg(file.path()).assert().success();
    let stdout = String::from_utf8_lossy(&out.get_output().stdout).to_string();
    assert!(stdout.contains("OK: 200 questions valid"), "{stdout}");
    assert!(stdout.contains("Easy 50"), "{stdout}");
}

#[test]
fn rejects_wrong_size() {
    let file = bank_file(&full_bank()[..199]);
    let out = validate().arg(file.path()).assert().failure();
    let stderr = String::from_utf8_lossy(&out.get_output().stderr).to_string();
    assert!(stderr.contains("exactly 200"), "{stderr}");
    assert!(stderr.contains("found 199"), "{stderr}");
}

#[test]
fn rejects_duplicate_ids_naming_the_record() {
    let mut records = full_bank();
    records[10]["id"] = json!(3);
    let file = bank_file(&records);
    let out = validate().arg(file.path()).assert().failure();
    let stderr = String::from_utf8_lossy(&out.get_output().stderr).to_string();
    assert!(stderr.contains("record 10 (id 3): duplicate id 3"), "{stderr}");
}

#[test]
fn min_count_and_missing_ids() {
    let mut records: Vec<Value> = (1..=5).map(record).collect();
    for r in records.iter_mut() {
        r.as_object_mut().unwrap().remove("id");
    }
    let file = bank_file(&records);

    // ids are required by default
    validate()
        .args(["--min-count", "5"])
        .arg(file.path())
        .assert()
        .failure();

    validate()
        .args(["--min-count", "5", "--allow-missing-ids"])
        .arg(file.path())
        .assert()
        .success();

    validate()
        .args(["--min-count", "6", "--allow-missing-ids"])
        .arg(file.path())
        .assert()
        .failure();
}

#[test]
fn missing_file_fails() {
    validate()
        .arg("/nonexistent/kwiz-bank.json")
        .assert()
        .failure();
}
