#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! A small video catalogue over the `killrvideo` keyspace.
//!
//! DAOs here combine several generic `EntityDao`s: user creation spans two
//! tables and a lightweight transaction, video creation writes four tables
//! in one logged batch.

pub mod app;
pub mod error;
pub mod mapper;
pub mod password;
pub mod user;
pub mod video;

use std::fmt;

use cql_mapper::CqlSession;
use cql_mapper::schema::{SchemaBootstrap, SchemaScript};

pub use error::KillrVideoError;
pub use mapper::KillrVideoMapper;

pub const KEYSPACE: &str = "killrvideo";

/// Table definitions, applied after the keyspace is created.
pub const SCHEMA: &str = include_str!("../schema/killrvideo_schema.cql");

/// # Errors
/// Returns the first failing schema statement.
pub async fn maybe_create_schema(session: &CqlSession) -> cql_mapper::Result<()> {
    SchemaBootstrap::new(KEYSPACE)?
        .with_script(&SchemaScript::parse(SCHEMA))
        .ensure(session)
        .await
}

/// # Errors
/// Returns any schema, statement or output error.
pub async fn run(session: &CqlSession) -> anyhow::Result<()> {
    maybe_create_schema(session).await?;
    let mapper = KillrVideoMapper::builder(session)
        .with_default_keyspace(KEYSPACE)?
        .build();
    app::run_demo(&mapper, &mut std::io::stdout()).await
}

/// Displays an optional value, or `null`.
pub(crate) struct OrNull<'a, T>(pub &'a Option<T>);

impl<T: fmt::Display> fmt::Display for OrNull<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => fmt::Display::fmt(value, f),
            None => f.write_str("null"),
        }
    }
}
