use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use fmcontainer::config::schema::DEFAULT_SQLITE_DB;
use fmcontainer::store::sqlite::SqliteStore;
use rstest::rstest;
use tempfile::{Builder, TempDir};

use crate::{populate, PNG_BYTES};

const TEST_CONFIG_FILE: &str = "fmcontainer-test.toml";

// Config file and a populated on-disk SQLite database next to it
async fn setup_temp_config_and_store() -> std::io::Result<TempDir> {
    let temp_dir = Builder::new()
        .prefix("fmcontainer-test-dir")
        .rand_bytes(5)
        .tempdir()?;

    let dsn = Path::new(&temp_dir.path().display().to_string())
        .join(DEFAULT_SQLITE_DB)
        .to_str()
        .unwrap()
        .to_string();

    let store = SqliteStore::try_new(&dsn, 1)
        .await
        .expect("test store created");
    populate(&store).await;
    store.executor.close().await;

    let mut conf_file = File::create(temp_dir.path().join(TEST_CONFIG_FILE))?;
    write!(
        conf_file,
        r#"
[store]
type = "sqlite"
dsn = "{}"
max_connections = 2

[pagination]
default_size = 4
max_size = 10
"#,
        dsn.escape_default(),
    )?;

    Ok(temp_dir)
}

fn fmcontainer(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fmcontainer").expect("fmcontainer bin exists");
    cmd.arg("-c").arg(temp_dir.path().join(TEST_CONFIG_FILE));
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("fmcontainer ran");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_render_without_config() {
    let output = Command::cargo_bin("fmcontainer")
        .unwrap()
        .args(["render", "download", "contact", "photo_content", "7", "jpg"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "SELECT GetAs(photo_content, 'JPEG') FROM contact WHERE id = ?\n"
    );
}

#[test]
fn test_invalid_page_request_fails() {
    let output = Command::cargo_bin("fmcontainer")
        .unwrap()
        .args(["render", "page", "contact", "--size", "0"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Page size must be positive"));
}

#[rstest]
#[case::plain_logs(false)]
#[case::json_logs(true)]
fn test_starts_with_either_log_format(#[case] json_logs: bool) {
    let mut cmd = Command::cargo_bin("fmcontainer").unwrap();
    if json_logs {
        cmd.arg("--json-logs");
    }
    let output = cmd
        .args(["render", "clear", "contact", "photo_content", "7"])
        .env("RUST_LOG", "debug")
        .output()
        .unwrap();

    assert_eq!(
        output.status.code(),
        Some(0),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(!String::from_utf8_lossy(&output.stderr).contains("panicked"));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "UPDATE contact SET photo_content = NULL WHERE id = ?\n"
    );
}

#[tokio::test]
async fn test_upload_then_download() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = setup_temp_config_and_store().await?;
    let photo_path = temp_dir.path().join("a.png");
    std::fs::write(&photo_path, PNG_BYTES)?;

    stdout_of(
        fmcontainer(&temp_dir)
            .args(["upload", "contact", "photo_content", "7"])
            .arg(&photo_path)
            .args(["--content-type-column", "photo_content_type"]),
    );

    assert_eq!(
        stdout_of(fmcontainer(&temp_dir).args(["reference", "contact", "photo_content", "7"])),
        "a.png\n"
    );

    let downloaded: PathBuf = temp_dir.path().join("downloaded");
    stdout_of(
        fmcontainer(&temp_dir)
            .args(["download", "contact", "photo_content", "7", "-o"])
            .arg(&downloaded),
    );
    assert_eq!(std::fs::read(&downloaded)?, PNG_BYTES);

    let info: serde_json::Value = serde_json::from_str(&stdout_of(
        fmcontainer(&temp_dir).args([
            "info",
            "contact",
            "photo_content",
            "7",
            "--content-type-column",
            "photo_content_type",
        ]),
    ))?;
    assert_eq!(
        info,
        serde_json::json!({
            "record_id": 7,
            "reference": "a.png",
            "content_type": "image/png",
            "has_content": true,
        })
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_record_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = setup_temp_config_and_store().await?;

    let output = fmcontainer(&temp_dir)
        .args(["download", "contact", "photo_content", "999999", "--format", "JPEG"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("No content in contact.photo_content for record 999999"));

    Ok(())
}

#[tokio::test]
async fn test_page() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = setup_temp_config_and_store().await?;

    // Default size comes from the config
    let page: serde_json::Value = serde_json::from_str(&stdout_of(
        fmcontainer(&temp_dir).args(["page", "contact", "--page", "1"]),
    ))?;
    assert_eq!(page["numberOfElements"], 4);
    assert_eq!(page["totalElements"], 17);
    assert_eq!(page["content"][0]["id"], 5);
    assert_eq!(page["content"][0]["email"], "user5@example.com");

    // Oversize requests are clamped to max_size
    let page: serde_json::Value = serde_json::from_str(&stdout_of(
        fmcontainer(&temp_dir).args(["page", "contact", "--size", "100", "--direction", "desc"]),
    ))?;
    assert_eq!(page["size"], 10);
    assert_eq!(page["content"][0]["id"], 17);

    Ok(())
}
