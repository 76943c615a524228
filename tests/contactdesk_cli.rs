#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use tempfile::tempdir;

use contactdesk_lib::model::Contact;

fn cli(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("contactdesk").unwrap();
    cmd.env_remove("CONTACTDESK_DB_BACKEND")
        .env("CONTACTDESK_LOG", "off")
        .arg("--db")
        .arg(db);
    cmd
}

const AMIT: [&str; 12] = [
    "--firstname", "Amit", "--lastname", "Shah", "--gender", "Male", "--age", "30",
    "--address", "Pune", "--contact", "9876543210",
];

#[test]
fn add_list_show_and_delete() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("contacts.sqlite3");

    let output = cli(&db).arg("add").args(AMIT).output()?;
    assert!(
        output.status.success(),
        "add failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Contact saved successfully."));

    let output = cli(&db).args(["list", "--json"]).output()?;
    assert!(output.status.success());
    let rows: Vec<Contact> = serde_json::from_slice(&output.stdout)?;
    assert_eq!(rows.len(), 1);
    let id = rows[0].id;

    let output = cli(&db).args(["list", "--search", "sha"]).output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Showing 1 contact(s) for search: 'sha'"));

    let output = cli(&db).args(["show", &id.to_string()]).output()?;
    let shown: Contact = serde_json::from_slice(&output.stdout)?;
    assert_eq!(shown.fields.contact, "9876543210");

    let output = cli(&db).args(["delete", &id.to_string()]).output()?;
    assert!(output.status.success());

    let output = cli(&db).args(["show", &id.to_string()]).output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Contact not found."));
    Ok(())
}

#[test]
fn validation_failure_prints_rule_and_writes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("contacts.sqlite3");

    let mut args = AMIT;
    args[7] = "0";
    let output = cli(&db).arg("add").args(args).output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Age must be greater than 0."));

    let output = cli(&db).args(["stats", "--json"]).output()?;
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(stats["total"], 0);
    Ok(())
}

#[test]
fn update_replaces_fields() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("contacts.sqlite3");
    cli(&db).arg("add").args(AMIT).assert().success();

    let mut args = AMIT;
    args[9] = "Mumbai";
    cli(&db).args(["update", "1"]).args(args).assert().success();

    let output = cli(&db).args(["show", "1"]).output()?;
    let shown: Contact = serde_json::from_slice(&output.stdout)?;
    assert_eq!(shown.fields.address, "Mumbai");
    Ok(())
}

#[test]
fn import_export_and_stats() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("contacts.sqlite3");
    let input = dir.path().join("in.csv");
    std::fs::write(
        &input,
        "firstname,lastname,gender,age,address,contact\n\
         Amit,Shah,Male,30,Pune,9876543210\n\
         Karan,Shah,Male,41,Delhi,9000011111\n\
         Neha,Agarwal,,35,Jaipur,9555512345\n\
         Riya,Patel,Female,28,Surat,\n",
    )?;

    let output = cli(&db).arg("import").arg(&input).output()?;
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Imported 3 contacts.\nSkipped: 1\n"
    );

    let output = cli(&db).args(["stats", "--json"]).output()?;
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["by_gender"]["Male"], 2);
    assert_eq!(stats["by_gender"]["Unknown"], 1);

    let out = dir.path().join("out.csv");
    let output = cli(&db).arg("export").arg(&out).output()?;
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Exported 3 contacts to:\n"));
    let text = std::fs::read_to_string(&out)?;
    assert!(text.starts_with("firstname,lastname,gender,age,address,contact\nNeha,Agarwal"));
    Ok(())
}

#[test]
fn import_of_missing_file_fails() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("contacts.sqlite3");
    let output = cli(&db)
        .arg("import")
        .arg(dir.path().join("absent.csv"))
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("File not found."));
    Ok(())
}

#[test]
fn unknown_backend_is_a_configuration_error() -> Result<()> {
    let output = Command::cargo_bin("contactdesk")?
        .env("CONTACTDESK_DB_BACKEND", "oracle")
        .env("CONTACTDESK_LOG", "off")
        .arg("init")
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("CONFIG/INVALID_BACKEND"));
    Ok(())
}

#[test]
fn log_dir_receives_json_events() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("contacts.sqlite3");
    let logs = dir.path().join("logs");

    let output = cli(&db)
        .env("CONTACTDESK_LOG", "contactdesk=info")
        .env("CONTACTDESK_LOG_DIR", &logs)
        .arg("add")
        .args(AMIT)
        .output()?;
    assert!(output.status.success());

    let mut text = String::new();
    for entry in std::fs::read_dir(&logs)? {
        let path = entry?.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("contactdesk.log"))
        {
            text.push_str(&std::fs::read_to_string(path)?);
        }
    }
    let events: Vec<serde_json::Value> = text
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert!(events
        .iter()
        .any(|e| e["target"] == "contactdesk" && e["fields"]["cmd"] == "contact_save"));
    Ok(())
}
