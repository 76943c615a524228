//! List view queries and the aggregate report.

use crate::{
    db::Store,
    model::{Contact, ContactFilter, ContactStats, SortOrder, UNKNOWN_GENDER},
    repo, AppResult,
};

/// Build the read filter for a search box value. Blank input lists everything.
pub fn filter_for(search: &str, case_sensitive: bool) -> ContactFilter {
    let term = search.trim();
    if term.is_empty() {
        ContactFilter::All
    } else {
        ContactFilter::Contains {
            term: term.to_string(),
            case_sensitive,
        }
    }
}

/// Contacts whose first name, last name or contact number contains `search`,
/// ordered by last name (insertion order on ties).
pub async fn list(store: &Store, search: &str) -> AppResult<Vec<Contact>> {
    let filter = filter_for(search, store.search_options().case_sensitive);
    repo::query(store, &filter, SortOrder::LastNameAsc).await
}

pub async fn stats(store: &Store) -> AppResult<ContactStats> {
    let total = repo::count(store).await?;
    let groups = repo::count_by_gender(store).await?;
    Ok(fold_gender_counts(total, groups))
}

/// NULL and empty genders both land under `Unknown`.
pub fn fold_gender_counts(total: i64, groups: Vec<(Option<String>, i64)>) -> ContactStats {
    let mut stats = ContactStats {
        total,
        ..Default::default()
    };
    for (gender, count) in groups {
        let label = match gender {
            Some(g) if !g.is_empty() => g,
            _ => UNKNOWN_GENDER.to_string(),
        };
        *stats.by_gender.entry(label).or_insert(0) += count;
    }
    stats
}

/// Footer text for the list view.
pub fn status_line(count: usize, search: &str) -> String {
    let term = search.trim();
    if term.is_empty() {
        format!("Total contacts: {count}")
    } else {
        format!("Showing {count} contact(s) for search: '{term}'")
    }
}
