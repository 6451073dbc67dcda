//! Entity metadata and the statements derived from it.
//!
//! `#[derive(Entity)]` implements [`Entity`] with columns ordered as
//! partition key, clustering columns, then regular columns. Binding
//! (`to_values`) and decoding (`from_row`) use that same order, which is
//! also the order every rendered statement lists columns in.

use crate::identifier::CqlIdentifier;
use crate::query::{CreateTable, Delete, Insert, QualifiedTable, Select, Update};
use crate::value::{BoundValue, CqlValue, FromCql, MaybeUnset, Row};
use crate::{MapperError, Result};

/// Role of a column in the table's primary key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Position within the partition key.
    PartitionKey(usize),
    /// Position among the clustering columns.
    ClusteringColumn(usize),
    Regular,
}

impl ColumnKind {
    #[must_use]
    pub fn is_partition_key(self) -> bool {
        matches!(self, ColumnKind::PartitionKey(_))
    }

    #[must_use]
    pub fn is_primary_key(self) -> bool {
        !matches!(self, ColumnKind::Regular)
    }
}

/// One mapped column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    name: &'static str,
    cql_type: &'static str,
    kind: ColumnKind,
}

impl ColumnDef {
    #[must_use]
    pub const fn new(name: &'static str, cql_type: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            cql_type,
            kind,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn cql_type(&self) -> &'static str {
        self.cql_type
    }

    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    #[must_use]
    pub fn identifier(&self) -> CqlIdentifier {
        CqlIdentifier::from_internal(self.name)
    }
}

/// A struct mapped onto a CQL table. Implement with `#[derive(Entity)]`.
pub trait Entity: Sized + Send + Sync + 'static {
    /// Table name in internal form.
    const TABLE: &'static str;

    /// Mapped columns: partition key, clustering columns, regular columns.
    const COLUMNS: &'static [ColumnDef];

    /// Column values in `COLUMNS` order; `None` is `null`.
    fn to_values(&self) -> Vec<Option<CqlValue>>;

    /// Decodes a row whose columns are in `COLUMNS` order.
    ///
    /// # Errors
    /// Returns an error when a column is missing or has an unexpected type.
    fn from_row(row: Row) -> Result<Self>;

    #[must_use]
    fn partition_key() -> &'static [ColumnDef] {
        let len = Self::COLUMNS
            .iter()
            .take_while(|c| c.kind().is_partition_key())
            .count();
        &Self::COLUMNS[..len]
    }

    #[must_use]
    fn primary_key() -> &'static [ColumnDef] {
        let len = Self::COLUMNS
            .iter()
            .take_while(|c| c.kind().is_primary_key())
            .count();
        &Self::COLUMNS[..len]
    }

    #[must_use]
    fn regular_columns() -> &'static [ColumnDef] {
        &Self::COLUMNS[Self::primary_key().len()..]
    }
}

/// Reads row values in column order, naming the column in any error.
pub struct RowReader {
    table: &'static str,
    values: std::vec::IntoIter<Option<CqlValue>>,
}

impl RowReader {
    #[must_use]
    pub fn new(table: &'static str, row: Row) -> Self {
        Self {
            table,
            values: row.columns.into_iter(),
        }
    }

    /// Reads the next column.
    ///
    /// # Errors
    /// Returns `MapperError::MissingColumn` when the row has no more columns,
    /// or a conversion error from [`FromCql`].
    pub fn read<T: FromCql>(&mut self, column: &str) -> Result<T> {
        let value = self.values.next().ok_or_else(|| MapperError::MissingColumn {
            table: self.table.to_owned(),
            column: column.to_owned(),
        })?;
        T::from_cql(column, value)
    }
}

/// How `None` fields are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NullSavingStrategy {
    /// Leave the column untouched (bind as unset).
    DoNotSet,
    /// Overwrite the column with `null`.
    #[default]
    SetToNull,
}

impl NullSavingStrategy {
    #[must_use]
    pub fn bind(self, values: Vec<Option<CqlValue>>) -> Vec<BoundValue> {
        values
            .into_iter()
            .map(|value| match (self, value) {
                (NullSavingStrategy::DoNotSet, None) => MaybeUnset::Unset,
                (_, value) => MaybeUnset::Set(value),
            })
            .collect()
    }
}

/// Every statement the generic DAO runs for one entity, rendered once.
#[derive(Clone, Debug)]
pub struct EntityQueries {
    table: QualifiedTable,
    insert: String,
    insert_if_not_exists: String,
    select_by_primary_key: String,
    select_by_partition_key: String,
    delete_by_primary_key: String,
    delete_if_exists: String,
    update_by_primary_key: Option<String>,
    create_table: String,
}

impl EntityQueries {
    /// Renders the statements for `E`, qualified with `keyspace` when given.
    #[must_use]
    pub fn of<E: Entity>(keyspace: Option<&CqlIdentifier>) -> Self {
        let table = QualifiedTable::new(keyspace.cloned(), CqlIdentifier::from_internal(E::TABLE));
        let all = || E::COLUMNS.iter().map(ColumnDef::identifier);
        let primary_key = || E::primary_key().iter().map(ColumnDef::identifier);
        let partition_key = || E::partition_key().iter().map(ColumnDef::identifier);
        let regular = || E::regular_columns().iter().map(ColumnDef::identifier);

        let insert = Insert::new(table.clone()).columns(all());
        let update_by_primary_key = (!E::regular_columns().is_empty()).then(|| {
            Update::new(table.clone())
                .set(regular())
                .where_eq(primary_key())
                .build()
        });

        let mut create_table = CreateTable::new(table.clone()).if_not_exists();
        for column in E::COLUMNS {
            create_table = create_table.column(column.identifier(), column.cql_type());
            create_table = match column.kind() {
                ColumnKind::PartitionKey(_) => create_table.partition_key(column.identifier()),
                ColumnKind::ClusteringColumn(_) => {
                    create_table.clustering_column(column.identifier())
                }
                ColumnKind::Regular => create_table,
            };
        }

        Self {
            insert: insert.build(),
            insert_if_not_exists: insert.if_not_exists().build(),
            select_by_primary_key: Select::new(table.clone())
                .columns(all())
                .where_eq(primary_key())
                .build(),
            select_by_partition_key: Select::new(table.clone())
                .columns(all())
                .where_eq(partition_key())
                .build(),
            delete_by_primary_key: Delete::new(table.clone())
                .where_eq(primary_key())
                .build(),
            delete_if_exists: Delete::new(table.clone())
                .where_eq(primary_key())
                .if_exists()
                .build(),
            update_by_primary_key,
            create_table: create_table.build(),
            table,
        }
    }

    #[must_use]
    pub fn table(&self) -> &QualifiedTable {
        &self.table
    }

    #[must_use]
    pub fn insert(&self) -> &str {
        &self.insert
    }

    #[must_use]
    pub fn insert_if_not_exists(&self) -> &str {
        &self.insert_if_not_exists
    }

    #[must_use]
    pub fn select_by_primary_key(&self) -> &str {
        &self.select_by_primary_key
    }

    #[must_use]
    pub fn select_by_partition_key(&self) -> &str {
        &self.select_by_partition_key
    }

    #[must_use]
    pub fn delete_by_primary_key(&self) -> &str {
        &self.delete_by_primary_key
    }

    #[must_use]
    pub fn delete_if_exists(&self) -> &str {
        &self.delete_if_exists
    }

    /// `None` when the entity has no regular columns to assign.
    #[must_use]
    pub fn update_by_primary_key(&self) -> Option<&str> {
        self.update_by_primary_key.as_deref()
    }

    #[must_use]
    pub fn create_table(&self) -> &str {
        &self.create_table
    }
}
