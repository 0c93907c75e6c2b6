//! Integration tests for relaycast-queue stats command

use assert_cmd::Command;
use librelaycast::{Database, ScrapedPost};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn write_config(temp_dir: &TempDir) -> (String, String) {
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("x_posts.db");

    fs::write(
        &config_path,
        format!(
            "[telegram]\nbot_token = \"t\"\nchannel_id = 1\nadmin_id = 2\n\n\
             [translator]\napi_key = \"k\"\n\n\
             [database]\npath = \"{}\"\n",
            db_path.to_string_lossy().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    (
        config_path.to_string_lossy().to_string(),
        db_path.to_string_lossy().to_string(),
    )
}

fn relaycast_queue() -> Command {
    let mut cmd = Command::cargo_bin("relaycast-queue").unwrap();
    cmd.env_remove("TELEGRAM_BOT_TOKEN")
        .env_remove("OPENROUTER_API_KEY");
    cmd
}

#[tokio::test]
async fn test_stats_empty_queue() {
    let temp_dir = TempDir::new().unwrap();
    let (config_path, db_path) = write_config(&temp_dir);
    Database::new(&db_path).await.unwrap();

    relaycast_queue()
        .args(["stats", "--config", &config_path])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending: 0"))
        .stdout(predicate::str::contains("Total:   0"));
}

#[test]
fn test_stats_missing_database_is_not_created() {
    let temp_dir = TempDir::new().unwrap();
    let (config_path, db_path) = write_config(&temp_dir);

    relaycast_queue()
        .args(["stats", "--config", &config_path])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no queue database"));

    assert!(!std::path::Path::new(&db_path).exists());
}

#[tokio::test]
async fn test_stats_needs_only_database_section() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("x_posts.db");
    fs::write(
        &config_path,
        format!(
            "[database]\npath = \"{}\"\n",
            db_path.to_string_lossy().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
    db.insert_many("TechCrunch", &[ScrapedPost::new("1", "a", "2025-01-01 00:00:00")])
        .await
        .unwrap();
    drop(db);
    let before = fs::read(&db_path).unwrap();

    relaycast_queue()
        .args(["stats", "--config", &config_path.to_string_lossy()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending: 1"));

    assert_eq!(fs::read(&db_path).unwrap(), before);
}

#[test]
fn test_help_lists_exit_codes() {
    relaycast_queue()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 - Operation failed (including a missing or unreadable database)",
        ))
        .stdout(predicate::str::contains("2 - Configuration error"));
}

#[tokio::test]
async fn test_stats_counts_pending_and_sent() {
    let temp_dir = TempDir::new().unwrap();
    let (config_path, db_path) = write_config(&temp_dir);

    let db = Database::new(&db_path).await.unwrap();
    db.insert_many(
        "BusinessInsider",
        &[
            ScrapedPost::new("1", "a", "2025-01-01 00:00:00"),
            ScrapedPost::new("2", "b", "2025-01-01 00:00:00"),
            ScrapedPost::new("3", "c", "2025-01-01 00:00:00"),
        ],
    )
    .await
    .unwrap();
    db.mark_sent(1).await.unwrap();

    relaycast_queue()
        .args(["stats", "--config", &config_path])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending: 2"))
        .stdout(predicate::str::contains("Sent:    1"))
        .stdout(predicate::str::contains("Total:   3"));

    let output = relaycast_queue()
        .args(["stats", "--format", "json", "--config", &config_path])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["pending"], 2);
    assert_eq!(json["sent"], 1);
    assert_eq!(json["total"], 3);
}

#[test]
fn test_stats_invalid_format() {
    let temp_dir = TempDir::new().unwrap();
    let (config_path, _) = write_config(&temp_dir);

    relaycast_queue()
        .args(["stats", "--format", "xml", "--config", &config_path])
        .assert()
        .code(3);
}
