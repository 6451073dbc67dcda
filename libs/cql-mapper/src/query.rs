//! Small CQL statement builders.
//!
//! Only the statement shapes the mapper needs are covered. Values are always
//! bind markers (`?`); builders never inline literals.

use std::fmt;

use crate::identifier::CqlIdentifier;

/// A table name, optionally qualified with its keyspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedTable {
    keyspace: Option<CqlIdentifier>,
    table: CqlIdentifier,
}

impl QualifiedTable {
    #[must_use]
    pub fn new(keyspace: Option<CqlIdentifier>, table: CqlIdentifier) -> Self {
        Self { keyspace, table }
    }

    #[must_use]
    pub fn keyspace(&self) -> Option<&CqlIdentifier> {
        self.keyspace.as_ref()
    }

    #[must_use]
    pub fn table(&self) -> &CqlIdentifier {
        &self.table
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.keyspace {
            Some(keyspace) => write!(f, "{keyspace}.{}", self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

fn join(columns: &[CqlIdentifier], separator: &str) -> String {
    columns
        .iter()
        .map(|c| c.as_cql(true))
        .collect::<Vec<_>>()
        .join(separator)
}

fn assignments(columns: &[CqlIdentifier], separator: &str) -> String {
    columns
        .iter()
        .map(|c| format!("{} = ?", c.as_cql(true)))
        .collect::<Vec<_>>()
        .join(separator)
}

fn where_clause(columns: &[CqlIdentifier]) -> String {
    if columns.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", assignments(columns, " AND "))
    }
}

/// Lightweight-transaction condition appended to a write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Condition {
    #[default]
    None,
    IfExists,
    IfNotExists,
    IfColumns(Vec<CqlIdentifier>),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::None => Ok(()),
            Condition::IfExists => f.write_str(" IF EXISTS"),
            Condition::IfNotExists => f.write_str(" IF NOT EXISTS"),
            Condition::IfColumns(columns) => write!(f, " IF {}", assignments(columns, " AND ")),
        }
    }
}

/// `INSERT INTO t (a, b) VALUES (?, ?)`
#[derive(Clone, Debug)]
pub struct Insert {
    table: QualifiedTable,
    columns: Vec<CqlIdentifier>,
    condition: Condition,
}

impl Insert {
    #[must_use]
    pub fn new(table: QualifiedTable) -> Self {
        Self {
            table,
            columns: Vec::new(),
            condition: Condition::None,
        }
    }

    #[must_use]
    pub fn columns(mut self, columns: impl IntoIterator<Item = CqlIdentifier>) -> Self {
        self.columns.extend(columns);
        self
    }

    #[must_use]
    pub fn if_not_exists(mut self) -> Self {
        self.condition = Condition::IfNotExists;
        self
    }

    #[must_use]
    pub fn build(&self) -> String {
        let markers = vec!["?"; self.columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({}){}",
            self.table,
            join(&self.columns, ", "),
            markers,
            self.condition
        )
    }
}

/// `SELECT a, b FROM t WHERE k = ?`
#[derive(Clone, Debug)]
pub struct Select {
    table: QualifiedTable,
    columns: Vec<CqlIdentifier>,
    restrictions: Vec<CqlIdentifier>,
}

impl Select {
    #[must_use]
    pub fn new(table: QualifiedTable) -> Self {
        Self {
            table,
            columns: Vec::new(),
            restrictions: Vec::new(),
        }
    }

    #[must_use]
    pub fn columns(mut self, columns: impl IntoIterator<Item = CqlIdentifier>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Adds `column = ?` restrictions, joined with `AND`.
    #[must_use]
    pub fn where_eq(mut self, columns: impl IntoIterator<Item = CqlIdentifier>) -> Self {
        self.restrictions.extend(columns);
        self
    }

    #[must_use]
    pub fn build(&self) -> String {
        let selectors = if self.columns.is_empty() {
            "*".to_owned()
        } else {
            join(&self.columns, ", ")
        };
        format!(
            "SELECT {} FROM {}{}",
            selectors,
            self.table,
            where_clause(&self.restrictions)
        )
    }
}

/// `DELETE FROM t WHERE k = ?`
#[derive(Clone, Debug)]
pub struct Delete {
    table: QualifiedTable,
    restrictions: Vec<CqlIdentifier>,
    condition: Condition,
}

impl Delete {
    #[must_use]
    pub fn new(table: QualifiedTable) -> Self {
        Self {
            table,
            restrictions: Vec::new(),
            condition: Condition::None,
        }
    }

    #[must_use]
    pub fn where_eq(mut self, columns: impl IntoIterator<Item = CqlIdentifier>) -> Self {
        self.restrictions.extend(columns);
        self
    }

    #[must_use]
    pub fn if_exists(mut self) -> Self {
        self.condition = Condition::IfExists;
        self
    }

    /// Only delete when every listed column equals its bound value.
    #[must_use]
    pub fn if_columns_eq(mut self, columns: impl IntoIterator<Item = CqlIdentifier>) -> Self {
        self.condition = Condition::IfColumns(columns.into_iter().collect());
        self
    }

    #[must_use]
    pub fn build(&self) -> String {
        format!(
            "DELETE FROM {}{}{}",
            self.table,
            where_clause(&self.restrictions),
            self.condition
        )
    }
}

/// `UPDATE t SET a = ?, b = ? WHERE k = ?`
#[derive(Clone, Debug)]
pub struct Update {
    table: QualifiedTable,
    assignments: Vec<CqlIdentifier>,
    restrictions: Vec<CqlIdentifier>,
}

impl Update {
    #[must_use]
    pub fn new(table: QualifiedTable) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            restrictions: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, columns: impl IntoIterator<Item = CqlIdentifier>) -> Self {
        self.assignments.extend(columns);
        self
    }

    #[must_use]
    pub fn where_eq(mut self, columns: impl IntoIterator<Item = CqlIdentifier>) -> Self {
        self.restrictions.extend(columns);
        self
    }

    #[must_use]
    pub fn build(&self) -> String {
        format!(
            "UPDATE {} SET {}{}",
            self.table,
            assignments(&self.assignments, ", "),
            where_clause(&self.restrictions)
        )
    }
}

/// `CREATE TABLE [IF NOT EXISTS] t (a int, b text, PRIMARY KEY (...))`
#[derive(Clone, Debug)]
pub struct CreateTable {
    table: QualifiedTable,
    if_not_exists: bool,
    columns: Vec<(CqlIdentifier, String)>,
    partition_key: Vec<CqlIdentifier>,
    clustering: Vec<CqlIdentifier>,
}

impl CreateTable {
    #[must_use]
    pub fn new(table: QualifiedTable) -> Self {
        Self {
            table,
            if_not_exists: false,
            columns: Vec::new(),
            partition_key: Vec::new(),
            clustering: Vec::new(),
        }
    }

    #[must_use]
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    #[must_use]
    pub fn column(mut self, name: CqlIdentifier, cql_type: impl Into<String>) -> Self {
        self.columns.push((name, cql_type.into()));
        self
    }

    #[must_use]
    pub fn partition_key(mut self, name: CqlIdentifier) -> Self {
        self.partition_key.push(name);
        self
    }

    #[must_use]
    pub fn clustering_column(mut self, name: CqlIdentifier) -> Self {
        self.clustering.push(name);
        self
    }

    #[must_use]
    pub fn build(&self) -> String {
        let mut definitions: Vec<String> = self
            .columns
            .iter()
            .map(|(name, ty)| format!("{} {ty}", name.as_cql(true)))
            .collect();

        let partition = if self.partition_key.len() == 1 {
            join(&self.partition_key, ", ")
        } else {
            format!("({})", join(&self.partition_key, ", "))
        };
        let key = if self.clustering.is_empty() {
            partition
        } else {
            format!("{partition}, {}", join(&self.clustering, ", "))
        };
        definitions.push(format!("PRIMARY KEY ({key})"));

        format!(
            "CREATE TABLE {}{} ({})",
            if self.if_not_exists { "IF NOT EXISTS " } else { "" },
            self.table,
            definitions.join(", ")
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<CqlIdentifier> {
        names.iter().map(|n| CqlIdentifier::from_internal(*n)).collect()
    }

    fn product() -> QualifiedTable {
        QualifiedTable::new(
            Some(CqlIdentifier::from_internal("lombok")),
            CqlIdentifier::from_internal("product"),
        )
    }

    #[test]
    fn test_insert() {
        let insert = Insert::new(product()).columns(ids(&["id", "description"]));
        assert_eq!(
            insert.build(),
            "INSERT INTO lombok.product (id, description) VALUES (?, ?)"
        );
        assert_eq!(
            insert.if_not_exists().build(),
            "INSERT INTO lombok.product (id, description) VALUES (?, ?) IF NOT EXISTS"
        );
    }

    #[test]
    fn test_select() {
        let select = Select::new(product())
            .columns(ids(&["id", "description"]))
            .where_eq(ids(&["id"]));
        assert_eq!(
            select.build(),
            "SELECT id, description FROM lombok.product WHERE id = ?"
        );
        assert_eq!(Select::new(product()).build(), "SELECT * FROM lombok.product");
    }

    #[test]
    fn test_delete_conditions() {
        let table = QualifiedTable::new(None, CqlIdentifier::from_internal("user_credentials"));
        assert_eq!(
            Delete::new(table.clone())
                .where_eq(ids(&["email"]))
                .if_exists()
                .build(),
            "DELETE FROM user_credentials WHERE email = ? IF EXISTS"
        );
        assert_eq!(
            Delete::new(table)
                .where_eq(ids(&["email"]))
                .if_columns_eq(ids(&["userid"]))
                .build(),
            "DELETE FROM user_credentials WHERE email = ? IF userid = ?"
        );
    }

    #[test]
    fn test_update() {
        let update = Update::new(product())
            .set(ids(&["description"]))
            .where_eq(ids(&["id"]));
        assert_eq!(
            update.build(),
            "UPDATE lombok.product SET description = ? WHERE id = ?"
        );
    }

    #[test]
    fn test_create_table_single_key() {
        let create = CreateTable::new(product())
            .if_not_exists()
            .column(CqlIdentifier::from_internal("id"), "int")
            .column(CqlIdentifier::from_internal("description"), "text")
            .partition_key(CqlIdentifier::from_internal("id"));
        assert_eq!(
            create.build(),
            "CREATE TABLE IF NOT EXISTS lombok.product (id int, description text, PRIMARY KEY (id))"
        );
    }

    #[test]
    fn test_create_table_composite_key() {
        let table = QualifiedTable::new(None, CqlIdentifier::from_internal("latest_videos"));
        let create = CreateTable::new(table)
            .column(CqlIdentifier::from_internal("yyyymmdd"), "text")
            .column(CqlIdentifier::from_internal("added_date"), "timestamp")
            .column(CqlIdentifier::from_internal("videoid"), "uuid")
            .partition_key(CqlIdentifier::from_internal("yyyymmdd"))
            .clustering_column(CqlIdentifier::from_internal("added_date"))
            .clustering_column(CqlIdentifier::from_internal("videoid"));
        assert_eq!(
            create.build(),
            "CREATE TABLE latest_videos (yyyymmdd text, added_date timestamp, videoid uuid, \
             PRIMARY KEY (yyyymmdd, added_date, videoid))"
        );
    }

    #[test]
    fn test_quoted_identifiers() {
        let table = QualifiedTable::new(None, CqlIdentifier::from_internal("Users"));
        assert_eq!(
            Select::new(table).where_eq(ids(&["userId"])).build(),
            "SELECT * FROM \"Users\" WHERE \"userId\" = ?"
        );
    }
}
