#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Maps an immutable value type onto the `record.product` table.

pub mod dao;
pub mod model;

use std::io::Write;

use anyhow::anyhow;
use cql_mapper::CqlSession;
use cql_mapper::schema::SchemaBootstrap;

use crate::dao::{ProductDao, ProductMapper};
use crate::model::Product;

pub const KEYSPACE: &str = "record";

/// # Errors
/// Returns the first failing schema statement.
pub async fn maybe_create_schema(session: &CqlSession) -> cql_mapper::Result<()> {
    SchemaBootstrap::new(KEYSPACE)?
        .with_table::<Product>()
        .ensure(session)
        .await
}

/// # Errors
/// Returns any schema, statement or output error.
pub async fn run(session: &CqlSession) -> anyhow::Result<()> {
    maybe_create_schema(session).await?;

    let dao = ProductMapper::builder(session)
        .with_default_keyspace(KEYSPACE)?
        .build()
        .dao()
        .await?;
    tracing::info!(keyspace = KEYSPACE, "product mapper ready");

    demo(&dao, &mut std::io::stdout()).await
}

/// Saves product 1 and prints it as read back.
///
/// # Errors
/// Returns any DAO or output error, or an error if the product is missing
/// after saving.
pub async fn demo(dao: &dyn ProductDao, out: &mut (dyn Write + Send)) -> anyhow::Result<()> {
    let initial_product = Product::new(1, Some("test".to_owned()));
    writeln!(out, "Saving {initial_product}...")?;
    dao.save(&initial_product).await?;

    let retrieved_product = dao
        .get(1)
        .await?
        .ok_or_else(|| anyhow!("product 1 not found"))?;
    writeln!(out, "Retrieved {retrieved_product}")?;
    Ok(())
}
