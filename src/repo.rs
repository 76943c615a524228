//! Persistence gateway for `member` rows: one connection and one
//! parameterized statement per call.

use sqlx::any::{AnyQueryResult, AnyRow};
use sqlx::{AnyConnection, Row};

use crate::{
    db::{store_error, Dialect, Store},
    model::{Contact, ContactFields, ContactFilter, SortOrder},
    AppError, AppResult,
};

const SELECT_COLUMNS: &str =
    "SELECT mem_id, firstname, lastname, gender, age, address, contact FROM member";

fn text(row: &AnyRow, column: &str) -> AppResult<String> {
    let value: Option<String> = row
        .try_get(column)
        .map_err(|err| AppError::from(err).with_context("column", column.to_string()))?;
    Ok(value.unwrap_or_default())
}

fn deserialize_contact(row: AnyRow) -> AppResult<Contact> {
    let id: i64 = row
        .try_get("mem_id")
        .map_err(|err| AppError::from(err).with_context("column", "mem_id"))?;
    Ok(Contact {
        id,
        fields: ContactFields {
            first_name: text(&row, "firstname")?,
            last_name: text(&row, "lastname")?,
            gender: text(&row, "gender")?,
            age: text(&row, "age")?,
            address: text(&row, "address")?,
            contact: text(&row, "contact")?,
        },
    })
}

fn insert_sql(dialect: Dialect) -> String {
    format!(
        "INSERT INTO member (firstname, lastname, gender, age, address, contact) VALUES ({})",
        dialect.placeholder_list(1, 6)
    )
}

async fn insert_on(
    conn: &mut AnyConnection,
    sql: &str,
    fields: &ContactFields,
) -> Result<AnyQueryResult, sqlx::Error> {
    sqlx::query(sql)
        .bind(fields.first_name.clone())
        .bind(fields.last_name.clone())
        .bind(fields.gender.clone())
        .bind(fields.age.clone())
        .bind(fields.address.clone())
        .bind(fields.contact.clone())
        .execute(conn)
        .await
}

/// Insert and read back the generated id on the same connection. The SQLite
/// `Any` driver reports no id in the query result, so fall back to asking.
async fn insert_returning_id(
    conn: &mut AnyConnection,
    dialect: Dialect,
    fields: &ContactFields,
) -> Result<i64, sqlx::Error> {
    let done = insert_on(conn, &insert_sql(dialect), fields).await?;
    if let Some(id) = done.last_insert_id() {
        return Ok(id);
    }
    let row = sqlx::query(dialect.last_insert_id_query())
        .fetch_one(conn)
        .await?;
    row.try_get::<i64, _>(0)
}

/// Insert a row and return the identifier the store assigned to it.
pub async fn insert(store: &Store, fields: &ContactFields) -> AppResult<i64> {
    let mut conn = store.connect("member_insert").await?;
    let result = insert_returning_id(&mut conn, store.dialect(), fields).await;
    store.release(conn, "member_insert").await;

    result.map_err(|err| store_error(err, "member_insert"))
}

/// What a bulk append does when the store rejects a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnRowError {
    /// Stop at the rejected row; rows written before it stay written.
    Stop,
    /// Record the rejection and carry on with the next row.
    Skip,
}

#[derive(Debug, Default)]
pub struct AppendOutcome {
    pub inserted: usize,
    /// Index into the input slice and the store's reason, for skipped rows.
    pub rejected: Vec<(usize, AppError)>,
}

/// Insert each row in order through a single connection.
pub async fn append_rows(
    store: &Store,
    rows: &[ContactFields],
    on_error: OnRowError,
) -> AppResult<AppendOutcome> {
    let sql = insert_sql(store.dialect());
    let mut conn = store.connect("member_append").await?;
    let mut outcome = AppendOutcome::default();
    let mut failure = None;
    for (idx, fields) in rows.iter().enumerate() {
        match insert_on(&mut conn, &sql, fields).await {
            Ok(_) => outcome.inserted += 1,
            Err(err) if on_error == OnRowError::Skip => {
                outcome
                    .rejected
                    .push((idx, store_error(err, "member_append")));
            }
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }
    store.release(conn, "member_append").await;

    match failure {
        Some(err) => Err(store_error(err, "member_append")
            .with_context("inserted_before_failure", outcome.inserted.to_string())),
        None => Ok(outcome),
    }
}

/// Replace all six business fields of `id`. Returns the affected row count.
pub async fn update(store: &Store, id: i64, fields: &ContactFields) -> AppResult<u64> {
    let d = store.dialect();
    let sql = format!(
        "UPDATE member SET firstname = {}, lastname = {}, gender = {}, age = {}, \
         address = {}, contact = {} WHERE mem_id = {}",
        d.placeholder(1),
        d.placeholder(2),
        d.placeholder(3),
        d.placeholder(4),
        d.placeholder(5),
        d.placeholder(6),
        d.placeholder(7),
    );

    let mut conn = store.connect("member_update").await?;
    let result = sqlx::query(&sql)
        .bind(fields.first_name.clone())
        .bind(fields.last_name.clone())
        .bind(fields.gender.clone())
        .bind(fields.age.clone())
        .bind(fields.address.clone())
        .bind(fields.contact.clone())
        .bind(id)
        .execute(&mut conn)
        .await;
    store.release(conn, "member_update").await;

    Ok(result
        .map_err(|err| store_error(err, "member_update"))?
        .rows_affected())
}

pub async fn delete(store: &Store, id: i64) -> AppResult<u64> {
    let sql = format!(
        "DELETE FROM member WHERE mem_id = {}",
        store.dialect().placeholder(1)
    );
    let mut conn = store.connect("member_delete").await?;
    let result = sqlx::query(&sql).bind(id).execute(&mut conn).await;
    store.release(conn, "member_delete").await;

    Ok(result
        .map_err(|err| store_error(err, "member_delete"))?
        .rows_affected())
}

/// Remove every row. Only the batch loader's replace mode uses this.
pub async fn clear(store: &Store) -> AppResult<u64> {
    let mut conn = store.connect("member_clear").await?;
    let result = sqlx::query("DELETE FROM member").execute(&mut conn).await;
    store.release(conn, "member_clear").await;

    Ok(result
        .map_err(|err| store_error(err, "member_clear"))?
        .rows_affected())
}

pub async fn query(
    store: &Store,
    filter: &ContactFilter,
    order: SortOrder,
) -> AppResult<Vec<Contact>> {
    let d = store.dialect();
    let mut sql = String::from(SELECT_COLUMNS);
    let mut binds: Vec<BindValue> = Vec::new();

    match filter {
        ContactFilter::All => {}
        ContactFilter::Id(id) => {
            sql.push_str(&format!(" WHERE mem_id = {}", d.placeholder(1)));
            binds.push(BindValue::Int(*id));
        }
        ContactFilter::Contains {
            term,
            case_sensitive,
        } => {
            let clauses = ["firstname", "lastname", "contact"]
                .iter()
                .enumerate()
                .map(|(idx, column)| d.contains(column, idx + 1, *case_sensitive))
                .collect::<Vec<_>>()
                .join(" OR ");
            sql.push_str(" WHERE ");
            sql.push_str(&clauses);
            for _ in 0..3 {
                binds.push(BindValue::Text(term.clone()));
            }
        }
    }

    sql.push_str(match order {
        SortOrder::LastNameAsc => " ORDER BY lastname ASC, mem_id ASC",
        SortOrder::IdAsc => " ORDER BY mem_id ASC",
    });

    let mut statement = sqlx::query::<sqlx::Any>(&sql);
    for value in binds {
        statement = match value {
            BindValue::Int(v) => statement.bind(v),
            BindValue::Text(v) => statement.bind(v),
        };
    }

    let mut conn = store.connect("member_query").await?;
    let result = statement.fetch_all(&mut conn).await;
    store.release(conn, "member_query").await;

    result
        .map_err(|err| store_error(err, "member_query"))?
        .into_iter()
        .map(deserialize_contact)
        .collect()
}

pub async fn get(store: &Store, id: i64) -> AppResult<Option<Contact>> {
    let rows = query(store, &ContactFilter::Id(id), SortOrder::IdAsc).await?;
    Ok(rows.into_iter().next())
}

pub async fn count(store: &Store) -> AppResult<i64> {
    let mut conn = store.connect("member_count").await?;
    let result = sqlx::query("SELECT COUNT(*) AS total FROM member")
        .fetch_one(&mut conn)
        .await;
    store.release(conn, "member_count").await;

    let row = result.map_err(|err| store_error(err, "member_count"))?;
    row.try_get::<i64, _>("total")
        .map_err(|err| store_error(err, "member_count"))
}

/// Raw `GROUP BY gender` counts; NULL genders come back as `None`.
pub async fn count_by_gender(store: &Store) -> AppResult<Vec<(Option<String>, i64)>> {
    let mut conn = store.connect("member_count_by_gender").await?;
    let result = sqlx::query(
        "SELECT gender, COUNT(*) AS total FROM member GROUP BY gender ORDER BY gender",
    )
    .fetch_all(&mut conn)
    .await;
    store.release(conn, "member_count_by_gender").await;

    result
        .map_err(|err| store_error(err, "member_count_by_gender"))?
        .into_iter()
        .map(|row| {
            let gender: Option<String> = row
                .try_get("gender")
                .map_err(|err| store_error(err, "member_count_by_gender"))?;
            let total: i64 = row
                .try_get("total")
                .map_err(|err| store_error(err, "member_count_by_gender"))?;
            Ok((gender, total))
        })
        .collect()
}

enum BindValue {
    Int(i64),
    Text(String),
}
