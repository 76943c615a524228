use crate::config::Backend;

/// SQL text differences between the supported stores. Values are always
/// bound; only statement text is produced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

const SQLITE_CREATE_MEMBER: &str = "CREATE TABLE IF NOT EXISTS member (\
     mem_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, \
     firstname TEXT, \
     lastname TEXT, \
     gender TEXT, \
     age TEXT, \
     address TEXT, \
     contact TEXT)";

const MYSQL_CREATE_MEMBER: &str = "CREATE TABLE IF NOT EXISTS member (\
     mem_id BIGINT NOT NULL PRIMARY KEY AUTO_INCREMENT, \
     firstname TEXT, \
     lastname TEXT, \
     gender TEXT, \
     age TEXT, \
     address TEXT, \
     contact TEXT)";

impl Dialect {
    pub fn for_backend(backend: &Backend) -> Self {
        match backend {
            Backend::Sqlite { .. } => Dialect::Sqlite,
            Backend::MySql { .. } => Dialect::MySql,
        }
    }

    /// Parameter marker for the 1-based bind position `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{index}"),
            Dialect::MySql => "?".to_string(),
        }
    }

    /// Comma separated markers for bind positions `start..start + count`.
    pub fn placeholder_list(self, start: usize, count: usize) -> String {
        (start..start + count)
            .map(|idx| self.placeholder(idx))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn create_member_table(self) -> &'static str {
        match self {
            Dialect::Sqlite => SQLITE_CREATE_MEMBER,
            Dialect::MySql => MYSQL_CREATE_MEMBER,
        }
    }

    /// Statement reading the id generated by the last insert on this connection.
    pub fn last_insert_id_query(self) -> &'static str {
        match self {
            Dialect::Sqlite => "SELECT last_insert_rowid()",
            Dialect::MySql => "SELECT CAST(LAST_INSERT_ID() AS SIGNED)",
        }
    }

    /// Predicate that holds when `column` contains the bound value as a substring.
    pub fn contains(self, column: &str, index: usize, case_sensitive: bool) -> String {
        let marker = self.placeholder(index);
        match (self, case_sensitive) {
            (Dialect::Sqlite, true) => format!("instr({column}, {marker}) > 0"),
            (Dialect::Sqlite, false) => format!("instr(lower({column}), lower({marker})) > 0"),
            (Dialect::MySql, true) => format!("LOCATE(BINARY {marker}, {column}) > 0"),
            (Dialect::MySql, false) => format!("LOCATE(LOWER({marker}), LOWER({column})) > 0"),
        }
    }
}
