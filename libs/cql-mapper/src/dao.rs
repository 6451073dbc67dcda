//! Generic data access for one entity type.
//!
//! [`EntityDao`] prepares the statements rendered by
//! [`EntityQueries`](crate::entity::EntityQueries) and runs them with values
//! bound from the entity. Application DAOs wrap it and expose only the
//! operations they need.
//!
//! Keys are passed as tuples in primary key order, e.g. `(id,)` or
//! `(userid, added_date, videoid)`; partition selects take the partition key
//! columns only.

use std::marker::PhantomData;
use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use scylla::response::query_result::QueryResult;
use scylla::serialize::row::SerializeRow;
use scylla::statement::prepared::PreparedStatement;
use tokio::sync::OnceCell;

use crate::entity::{Entity, EntityQueries, NullSavingStrategy};
use crate::mapper::MapperContext;
use crate::session::CqlSession;
use crate::value::{BoundValue, CqlValue, MaybeUnset, Row};
use crate::{MapperError, Result};

/// Reads the `[applied]` flag of a lightweight transaction.
///
/// Conditional statements answer with a row whose first column is the flag;
/// a result without rows counts as applied.
///
/// # Errors
/// Returns an error if the result rows cannot be read.
pub fn was_applied(result: QueryResult) -> Result<bool> {
    if !result.is_rows() {
        return Ok(true);
    }
    let rows = result.into_rows_result()?;
    let Some(row) = rows.maybe_first_row::<Row>()? else {
        return Ok(true);
    };
    Ok(matches!(
        row.columns.first(),
        Some(Some(CqlValue::Boolean(true)))
    ))
}

/// Prepared-statement backed DAO for `E`.
///
/// Insert, select and delete by primary key are prepared up front, so a
/// missing table fails at construction. The remaining statements are
/// prepared on first use.
pub struct EntityDao<E: Entity> {
    session: CqlSession,
    queries: Arc<EntityQueries>,
    insert: PreparedStatement,
    select_by_primary_key: PreparedStatement,
    delete_by_primary_key: PreparedStatement,
    insert_if_not_exists: OnceCell<PreparedStatement>,
    select_by_partition_key: OnceCell<PreparedStatement>,
    delete_if_exists: OnceCell<PreparedStatement>,
    update_by_primary_key: OnceCell<PreparedStatement>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityDao<E> {
    /// # Errors
    /// Returns `MapperError::Prepare` if a core statement is rejected.
    pub async fn new(context: &MapperContext) -> Result<Self> {
        let session = context.session().clone();
        let queries = Arc::new(EntityQueries::of::<E>(context.keyspace()));

        let insert = session.prepare(queries.insert()).await?;
        let select_by_primary_key = session.prepare(queries.select_by_primary_key()).await?;
        let delete_by_primary_key = session.prepare(queries.delete_by_primary_key()).await?;
        tracing::debug!(table = %queries.table(), "entity DAO ready");

        Ok(Self {
            session,
            queries,
            insert,
            select_by_primary_key,
            delete_by_primary_key,
            insert_if_not_exists: OnceCell::new(),
            select_by_partition_key: OnceCell::new(),
            delete_if_exists: OnceCell::new(),
            update_by_primary_key: OnceCell::new(),
            _entity: PhantomData,
        })
    }

    #[must_use]
    pub fn session(&self) -> &CqlSession {
        &self.session
    }

    #[must_use]
    pub fn queries(&self) -> &EntityQueries {
        &self.queries
    }

    /// The prepared insert, for use in batches together with [`Self::bind_insert`].
    #[must_use]
    pub fn insert_statement(&self) -> &PreparedStatement {
        &self.insert
    }

    async fn lazy<'a>(
        &'a self,
        cell: &'a OnceCell<PreparedStatement>,
        cql: &str,
    ) -> Result<&'a PreparedStatement> {
        cell.get_or_try_init(|| self.session.prepare(cql)).await
    }

    fn checked_values(entity: &E) -> Result<Vec<Option<CqlValue>>> {
        let values = entity.to_values();
        for (column, value) in E::primary_key().iter().zip(&values) {
            if value.is_none() {
                return Err(MapperError::NullPrimaryKey {
                    table: E::TABLE.to_owned(),
                    column: column.name().to_owned(),
                });
            }
        }
        Ok(values)
    }

    /// Values for the insert statement; `None` fields are bound as `null`.
    ///
    /// # Errors
    /// Returns `MapperError::NullPrimaryKey` if a key column is `None`.
    pub fn bind_insert(&self, entity: &E) -> Result<Vec<BoundValue>> {
        self.bind_insert_with(entity, NullSavingStrategy::SetToNull)
    }

    /// # Errors
    /// Returns `MapperError::NullPrimaryKey` if a key column is `None`.
    pub fn bind_insert_with(
        &self,
        entity: &E,
        strategy: NullSavingStrategy,
    ) -> Result<Vec<BoundValue>> {
        Ok(strategy.bind(Self::checked_values(entity)?))
    }

    /// Selects one row by its full primary key.
    ///
    /// # Errors
    /// Returns an error if the request fails or the row cannot be decoded.
    #[tracing::instrument(level = "debug", skip_all, fields(table = E::TABLE))]
    pub async fn get(&self, key: impl SerializeRow) -> Result<Option<E>> {
        let result = self
            .session
            .execute_prepared(&self.select_by_primary_key, key)
            .await?;
        result
            .into_rows_result()?
            .maybe_first_row::<Row>()?
            .map(E::from_row)
            .transpose()
    }

    /// Upserts the entity, overwriting `None` columns with `null`.
    ///
    /// # Errors
    /// Returns an error if a key column is `None` or the request fails.
    pub async fn save(&self, entity: &E) -> Result<()> {
        self.insert_with(entity, NullSavingStrategy::SetToNull).await
    }

    /// Upserts the entity with an explicit null strategy.
    ///
    /// # Errors
    /// Returns an error if a key column is `None` or the request fails.
    #[tracing::instrument(level = "debug", skip_all, fields(table = E::TABLE))]
    pub async fn insert_with(&self, entity: &E, strategy: NullSavingStrategy) -> Result<()> {
        let values = self.bind_insert_with(entity, strategy)?;
        self.session.execute_prepared(&self.insert, values).await?;
        Ok(())
    }

    /// Inserts only when no row has this primary key. Returns `[applied]`.
    ///
    /// # Errors
    /// Returns an error if a key column is `None` or the request fails.
    #[tracing::instrument(level = "debug", skip_all, fields(table = E::TABLE))]
    pub async fn insert_if_not_exists(&self, entity: &E) -> Result<bool> {
        let values = self.bind_insert(entity)?;
        let prepared = self
            .lazy(&self.insert_if_not_exists, self.queries.insert_if_not_exists())
            .await?;
        was_applied(self.session.execute_prepared(prepared, values).await?)
    }

    /// # Errors
    /// Returns an error if the request fails.
    #[tracing::instrument(level = "debug", skip_all, fields(table = E::TABLE))]
    pub async fn delete(&self, key: impl SerializeRow) -> Result<()> {
        self.session
            .execute_prepared(&self.delete_by_primary_key, key)
            .await?;
        Ok(())
    }

    /// Deletes the row only if it exists. Returns `[applied]`.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    #[tracing::instrument(level = "debug", skip_all, fields(table = E::TABLE))]
    pub async fn delete_if_exists(&self, key: impl SerializeRow) -> Result<bool> {
        let prepared = self
            .lazy(&self.delete_if_exists, self.queries.delete_if_exists())
            .await?;
        was_applied(self.session.execute_prepared(prepared, key).await?)
    }

    /// Updates the regular columns of the row identified by the entity's key.
    ///
    /// With `DoNotSet`, `None` fields keep their stored value.
    ///
    /// # Errors
    /// Returns an error if a key column is `None`, the entity has no regular
    /// columns, or the request fails.
    #[tracing::instrument(level = "debug", skip_all, fields(table = E::TABLE))]
    pub async fn update(&self, template: &E, strategy: NullSavingStrategy) -> Result<()> {
        let Some(cql) = self.queries.update_by_primary_key() else {
            return Err(MapperError::Other(anyhow::anyhow!(
                "table '{}' has no regular columns to update",
                E::TABLE
            )));
        };
        let mut key = Self::checked_values(template)?;
        let regular = key.split_off(E::primary_key().len());

        let mut values = strategy.bind(regular);
        values.extend(key.into_iter().map(MaybeUnset::Set));

        let prepared = self.lazy(&self.update_by_primary_key, cql).await?;
        self.session.execute_prepared(prepared, values).await?;
        Ok(())
    }

    /// Streams every row of one partition, fetching pages as needed.
    ///
    /// # Errors
    /// Returns an error if the first page cannot be fetched; later failures
    /// are yielded by the stream.
    pub async fn stream_partition(
        &self,
        partition_key: impl SerializeRow,
    ) -> Result<BoxStream<'static, Result<E>>> {
        let prepared = self
            .lazy(
                &self.select_by_partition_key,
                self.queries.select_by_partition_key(),
            )
            .await?
            .clone();
        let rows = self
            .session
            .execute_paged(prepared, partition_key)
            .await?
            .rows_stream::<Row>()?;
        Ok(rows
            .map(|row| row.map_err(MapperError::from).and_then(E::from_row))
            .boxed())
    }

    /// Collects every row of one partition.
    ///
    /// # Errors
    /// Returns an error if any page fails or a row cannot be decoded.
    #[tracing::instrument(level = "debug", skip_all, fields(table = E::TABLE))]
    pub async fn select_partition(&self, partition_key: impl SerializeRow) -> Result<Vec<E>> {
        self.stream_partition(partition_key)
            .await?
            .try_collect()
            .await
    }
}
