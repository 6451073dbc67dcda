#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Entity mapping over the `scylla` CQL driver.
//!
//! This crate is the runtime half of the mapper: `#[derive(Entity)]` (from
//! `cql-mapper-macros`) describes how a struct maps onto a table, and the
//! types here turn that description into CQL, bind values, decode rows and
//! run everything against a shared session.
//!
//! # Layout
//! - [`config`]: figment-backed configuration (`MapperConfig`)
//! - [`logging`]: tracing subscriber setup
//! - [`session`]: scoped access to the driver session and execution profiles
//! - [`schema`]: idempotent keyspace / table bootstrap
//! - [`mapper`]: mapper builder with a default keyspace
//! - [`dao`]: generic prepared-statement backed DAO (`EntityDao`)
//! - [`entity`], [`query`], [`value`], [`identifier`]: mapping metadata and CQL rendering
//!
//! # Example
//! ```rust,no_run
//! use cql_mapper::{Entity, Mapper, MapperBuilder, MapperConfig};
//! use cql_mapper::schema::SchemaBootstrap;
//! use cql_mapper::session::with_session;
//!
//! #[derive(Entity)]
//! #[entity(table = "product")]
//! struct Product {
//!     #[entity(partition_key)]
//!     id: i32,
//!     description: Option<String>,
//! }
//!
//! # async fn run() -> cql_mapper::Result<()> {
//! let config = MapperConfig::load()?;
//! with_session(&config.session, |session| async move {
//!     SchemaBootstrap::new("shop")?
//!         .with_replication(1)
//!         .with_table::<Product>()
//!         .ensure(&session)
//!         .await?;
//!     let mapper: Mapper = MapperBuilder::new(&session)
//!         .with_default_keyspace("shop")?
//!         .build();
//!     let dao = mapper.dao::<Product>().await?;
//!     dao.save(&Product { id: 1, description: Some("test".to_owned()) }).await?;
//!     let _found = dao.get((1,)).await?;
//!     Ok::<_, cql_mapper::MapperError>(())
//! })
//! .await
//! # }
//! ```

// Lets `#[derive(Entity)]` expand to `::cql_mapper::...` inside this crate's own tests.
extern crate self as cql_mapper;

pub mod config;
pub mod dao;
pub mod entity;
pub mod identifier;
pub mod logging;
pub mod mapper;
pub mod query;
pub mod schema;
pub mod session;
pub mod value;

pub use config::{LoggingConfig, MapperConfig, SessionConfig};
pub use cql_mapper_macros::Entity;
pub use dao::EntityDao;
pub use entity::NullSavingStrategy;
pub use identifier::CqlIdentifier;
pub use mapper::{Mapper, MapperBuilder, MapperContext};
pub use session::CqlSession;

use scylla::errors::{
    ExecutionError, NewSessionError, NextRowError, PagerExecutionError, PrepareError,
    TypeCheckError,
};
use scylla::response::query_result::{IntoRowsResultError, MaybeFirstRowError, RowsError};
use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, MapperError>;

/// Typed error for the mapper, session and schema helpers.
///
/// Driver errors are boxed to keep `Result<T>` small.
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown execution profile: {0}")]
    UnknownProfile(String),

    #[error("Invalid CQL identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Column '{column}' of table '{table}' is missing from the result row")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}': expected {expected}, found {found}")]
    Conversion {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("Primary key column '{column}' of table '{table}' is null")]
    NullPrimaryKey { table: String, column: String },

    #[error("Failed to open CQL session: {0}")]
    NewSession(#[from] Box<NewSessionError>),

    #[error("Failed to prepare statement: {0}")]
    Prepare(#[from] Box<PrepareError>),

    #[error("Statement execution failed: {0}")]
    Execution(#[from] Box<ExecutionError>),

    #[error("Paged execution failed: {0}")]
    PagerExecution(#[from] Box<PagerExecutionError>),

    #[error("Failed to fetch next row: {0}")]
    NextRow(#[from] Box<NextRowError>),

    #[error("Result is not a rows result: {0}")]
    IntoRows(#[from] Box<IntoRowsResultError>),

    #[error("Failed to read rows: {0}")]
    Rows(#[from] Box<RowsError>),

    #[error("Failed to read first row: {0}")]
    MaybeFirstRow(#[from] Box<MaybeFirstRowError>),

    #[error("Row type check failed: {0}")]
    TypeCheck(#[from] Box<TypeCheckError>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

macro_rules! boxed_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for MapperError {
                fn from(err: $source) -> Self {
                    Self::$variant(Box::new(err))
                }
            }
        )*
    };
}

boxed_from! {
    figment::Error => Config,
    NewSessionError => NewSession,
    PrepareError => Prepare,
    ExecutionError => Execution,
    PagerExecutionError => PagerExecution,
    NextRowError => NextRow,
    IntoRowsResultError => IntoRows,
    RowsError => Rows,
    MaybeFirstRowError => MaybeFirstRow,
    TypeCheckError => TypeCheck,
}
