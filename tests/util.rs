#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::path::{Path, PathBuf};

use contactdesk_lib::{model::ContactDraft, model::ContactFields, Store, StoreConfig};
use sqlx::{Connection, SqliteConnection};
use tempfile::TempDir;

/// Gender value the strict table refuses.
pub const REFUSED_GENDER: &str = "Refused";

/// Fresh SQLite store in its own temp dir, table created.
pub async fn temp_store() -> (Store, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let store = Store::new(&StoreConfig::sqlite(dir.path().join("contacts.sqlite3")));
    store.ensure_schema().await.expect("create member table");
    (store, dir)
}

/// SQLite store whose `member` table was created up front with a CHECK
/// constraint, so the store itself rejects rows with [`REFUSED_GENDER`].
pub async fn strict_store() -> (Store, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let path = db_path(&dir);
    let mut conn = SqliteConnection::connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await
        .expect("open sqlite file");
    sqlx::query(&format!(
        "CREATE TABLE member (\
         mem_id INTEGER PRIMARY KEY AUTOINCREMENT, \
         firstname TEXT, lastname TEXT, \
         gender TEXT CHECK (gender <> '{REFUSED_GENDER}'), \
         age TEXT, address TEXT, contact TEXT)"
    ))
    .execute(&mut conn)
    .await
    .expect("create strict member table");
    conn.close().await.expect("close sqlite file");

    let store = Store::new(&StoreConfig::sqlite(path));
    store.ensure_schema().await.expect("keep existing member table");
    (store, dir)
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("contacts.sqlite3")
}

pub fn draft(
    first: &str,
    last: &str,
    gender: &str,
    age: &str,
    address: &str,
    contact: &str,
) -> ContactDraft {
    ContactDraft {
        first_name: first.into(),
        last_name: last.into(),
        gender: gender.into(),
        age: age.into(),
        address: address.into(),
        contact: contact.into(),
    }
}

pub fn fields(
    first: &str,
    last: &str,
    gender: &str,
    age: &str,
    address: &str,
    contact: &str,
) -> ContactFields {
    ContactFields {
        first_name: first.into(),
        last_name: last.into(),
        gender: gender.into(),
        age: age.into(),
        address: address.into(),
        contact: contact.into(),
    }
}

pub fn write_file(path: &Path, body: &str) {
    std::fs::write(path, body).expect("write fixture");
}
