#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Saves a product through a mutable entity and reads it back through both a
//! mutable and an immutable entity mapped onto the same `product` table.

pub mod dao;
pub mod model;

use std::io::Write;

use anyhow::anyhow;
use cql_mapper::CqlSession;
use cql_mapper::schema::SchemaBootstrap;

use crate::dao::{ProductDao, ProductMapper};
use crate::model::Product;

pub const KEYSPACE: &str = "lombok";

/// Creates the keyspace and the `product` table when missing.
///
/// # Errors
/// Returns the first failing schema statement.
pub async fn maybe_create_schema(session: &CqlSession) -> cql_mapper::Result<()> {
    SchemaBootstrap::new(KEYSPACE)?
        .with_replication(1)
        .with_table::<Product>()
        .ensure(session)
        .await
}

/// Full program: schema, mapper, save and read back, output on stdout.
///
/// # Errors
/// Returns any schema, statement or output error.
pub async fn run(session: &CqlSession) -> anyhow::Result<()> {
    maybe_create_schema(session).await?;

    let mapper = ProductMapper::builder(session)
        .with_default_keyspace(KEYSPACE)?
        .build();
    let dao = mapper.dao().await?;
    tracing::info!(keyspace = KEYSPACE, "product mapper ready");

    demo(&dao, &mut std::io::stdout()).await
}

/// Saves product 1 and prints it as read back by each representation.
///
/// # Errors
/// Returns any DAO or output error, or an error if the product is not found
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

    let retrieved_immutable_product = dao
        .get_immutable(1)
        .await?
        .ok_or_else(|| anyhow!("product 1 not found"))?;
    writeln!(out, "Retrieved {retrieved_immutable_product}")?;

    Ok(())
}
