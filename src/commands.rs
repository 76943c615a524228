//! Front-end operations: every action the contact form or list view can
//! trigger, each validated and logged in one place.

use std::path::Path;

use serde_json::json;

use crate::{
    db::Store,
    error::CONTACT_NOT_FOUND,
    export,
    import::{self, ImportReport},
    model::{Contact, ContactDraft, ContactStats},
    op_logging::LogScope,
    repo, search,
    validation::validate,
    AppError, AppResult,
};

fn not_found(id: i64) -> AppError {
    AppError::new(CONTACT_NOT_FOUND, "Contact not found.").with_context("id", id.to_string())
}

/// Validate `draft` and insert it. Nothing is written when validation fails.
pub async fn save_contact(store: &Store, draft: &ContactDraft) -> AppResult<i64> {
    let scope = LogScope::new("contact_save", None);
    let result = async {
        let fields = validate(draft)?;
        repo::insert(store, &fields).await
    }
    .await;
    match &result {
        Ok(id) => scope.success(Some(*id), json!({ "inserted": 1 })),
        Err(err) => scope.fail(err),
    }
    result
}

/// Replace all six fields of an existing contact.
pub async fn update_contact(store: &Store, id: i64, draft: &ContactDraft) -> AppResult<()> {
    let scope = LogScope::new("contact_update", Some(id));
    let result = async {
        let fields = validate(draft)?;
        match repo::update(store, id, &fields).await? {
            0 => Err(not_found(id)),
            _ => Ok(()),
        }
    }
    .await;
    scope.finish(result, |_| json!({ "updated": 1 }))
}

pub async fn delete_contact(store: &Store, id: i64) -> AppResult<()> {
    let scope = LogScope::new("contact_delete", Some(id));
    let result = match repo::delete(store, id).await {
        Ok(0) => Err(not_found(id)),
        Ok(_) => Ok(()),
        Err(err) => Err(err),
    };
    scope.finish(result, |_| json!({ "deleted": 1 }))
}

pub async fn get_contact(store: &Store, id: i64) -> AppResult<Contact> {
    let scope = LogScope::new("contact_get", Some(id));
    let result = repo::get(store, id)
        .await
        .and_then(|found| found.ok_or_else(|| not_found(id)));
    scope.finish(result, |_| json!({ "found": true }))
}

pub async fn list_contacts(store: &Store, search_term: &str) -> AppResult<Vec<Contact>> {
    let scope = LogScope::new("contact_list", None);
    let result = search::list(store, search_term).await;
    scope.finish(result, |rows| {
        json!({ "rows": rows.len(), "filtered": !search_term.trim().is_empty() })
    })
}

pub async fn contact_stats(store: &Store) -> AppResult<ContactStats> {
    let scope = LogScope::new("contact_stats", None);
    let result = search::stats(store).await;
    scope.finish(result, |stats| {
        json!({ "total": stats.total, "groups": stats.by_gender.len() })
    })
}

pub async fn import_contacts(store: &Store, path: &Path) -> AppResult<ImportReport> {
    let scope = LogScope::new("contact_import", None);
    let result = import::import_csv(store, path).await;
    scope.finish(result, |report| {
        json!({ "inserted": report.inserted, "skipped": report.skipped })
    })
}

pub async fn export_contacts(store: &Store, path: &Path) -> AppResult<usize> {
    let scope = LogScope::new("contact_export", None);
    let result = export::export_csv(store, path).await;
    scope.finish(result, |count| json!({ "rows": count }))
}
