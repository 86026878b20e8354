use assert_cmd::Command;
use tempfile::tempdir;

use examify::catalog::Catalog;
use examify::exam::ExamSession;
use examify::session::SessionConfig;
use examify::store::{ResultStore, SqliteResultStore};

fn examify(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("examify").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn list_shows_bundled_exams() {
    let home = tempdir().unwrap();
    let output = examify(home.path()).arg("--list").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    assert!(stdout.contains("athena"));
    assert!(stdout.contains("ai-practitioner"));
    assert!(stdout.contains("AWS Athena SerDe Practice Questions"));
}

#[test]
fn last_without_history() {
    let home = tempdir().unwrap();
    let output = examify(home.path()).arg("--last").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.trim(), "no stored result");
}

#[test]
fn last_prints_stored_result_json() {
    let home = tempdir().unwrap();
    let db = home.path().join(".local/state/examify/results.db");

    let catalog = Catalog::bundled().unwrap();
    let exam = catalog.get("athena").unwrap();
    let mut session =
        ExamSession::new(SessionConfig::new("athena", 60, 30), exam.questions.clone()).unwrap();
    session.start().unwrap();
    let result = session.complete().unwrap();
    SqliteResultStore::open(&db).unwrap().save(&result).unwrap();

    let output = examify(home.path()).arg("--last").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let printed: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(printed["examType"], "athena");
    assert_eq!(printed["totalQuestions"], exam.questions.len());
    assert_eq!(printed["correctAnswers"], 0);
}

#[test]
fn unknown_exam_is_an_error() {
    let home = tempdir().unwrap();
    examify(home.path())
        .args(["--exam", "no-such-exam"])
        .assert()
        .failure();
}

#[test]
fn broken_question_file_is_an_error() {
    let home = tempdir().unwrap();
    let file = home.path().join("broken.json");
    std::fs::write(&file, r#"[{"question": "?", "options": ["a"], "answer": "b"}]"#).unwrap();

    let output = examify(home.path())
        .arg("--questions")
        .arg(&file)
        .assert()
        .failure();
    let stderr = String::from_utf8(output.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("UnresolvedAnswer"));
}

#[test]
fn save_defaults_writes_config() {
    let home = tempdir().unwrap();
    examify(home.path())
        .args(["--total-secs", "900", "--save-defaults", "--list"])
        .assert()
        .success();

    let config = home.path().join(".config/examify/config.json");
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(config).unwrap()).unwrap();
    assert_eq!(saved["total_exam_seconds"], 900);
}
