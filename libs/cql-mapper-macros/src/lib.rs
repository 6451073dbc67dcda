// Proc-macro crate for cql-mapper entity derives
//
//! # cql-mapper-macros
//!
//! Procedural macros for the `cql-mapper` entity layer.
//!
//! ## `#[derive(Entity)]`
//!
//! Implements `cql_mapper::entity::Entity` for a struct with named fields: table
//! metadata, column definitions, binding to statement values and decoding
//! from result rows. Queries themselves are rendered at runtime from this
//! metadata by `cql_mapper::entity::EntityQueries`.
//!
//! ### Example
//!
//! ```ignore
//! use cql_mapper::Entity;
//!
//! #[derive(Clone, Debug, PartialEq, Entity)]
//! #[entity(table = "product")]
//! pub struct Product {
//!     #[entity(partition_key)]
//!     pub id: i32,
//!     pub description: Option<String>,
//! }
//! ```
//!
//! ### Attributes
//!
//! Struct level, `#[entity(...)]`:
//! - `table = "name"`: table name; defaults to the `snake_case` struct name
//!
//! Field level, `#[entity(...)]`:
//! - `partition_key` or `partition_key = N`: part of the partition key
//! - `clustering_column` or `clustering_column = N`: clustering column
//! - `name = "column"`: column name; defaults to the field name
//! - `transient`: not mapped; filled with `Default::default()` on decode

use proc_macro::TokenStream;
use proc_macro_error2::proc_macro_error;
use syn::{DeriveInput, parse_macro_input};

mod entity;

/// Derive macro for implementing `Entity`.
///
/// Every entity needs at least one `#[entity(partition_key)]` field. Indexes on
/// `partition_key` / `clustering_column` are optional; fields without an index
/// are ordered by declaration.
///
/// # Example
///
/// ```ignore
/// #[derive(Entity)]
/// #[entity(table = "user_videos")]
/// pub struct UserVideo {
///     #[entity(partition_key)]
///     pub userid: Uuid,
///     #[entity(clustering_column = 0)]
///     pub added_date: DateTime<Utc>,
///     #[entity(clustering_column = 1)]
///     pub videoid: Uuid,
///     pub name: Option<String>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity))]
#[proc_macro_error]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand_derive_entity(input).into()
}
