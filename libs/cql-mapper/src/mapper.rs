//! Mapper construction.
//!
//! A mapper owns a [`MapperContext`] (session plus default keyspace) and hands
//! out DAOs. Applications declare their own mapper type by implementing
//! [`BuildMapper`] and build it through [`MapperBuilder`]:
//!
//! ```rust,no_run
//! use cql_mapper::mapper::{BuildMapper, MapperBuilder, MapperContext};
//! # use cql_mapper::CqlSession;
//!
//! struct InventoryMapper {
//!     context: MapperContext,
//! }
//!
//! impl BuildMapper for InventoryMapper {
//!     fn from_context(context: MapperContext) -> Self {
//!         Self { context }
//!     }
//! }
//!
//! # fn build(session: &CqlSession) -> cql_mapper::Result<()> {
//! let mapper: InventoryMapper = MapperBuilder::new(session)
//!     .with_default_keyspace("inventory")?
//!     .build();
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;

use crate::dao::EntityDao;
use crate::entity::Entity;
use crate::identifier::CqlIdentifier;
use crate::session::CqlSession;
use crate::Result;

/// Everything a DAO needs: the session and the keyspace to qualify tables with.
#[derive(Clone)]
pub struct MapperContext {
    session: CqlSession,
    keyspace: Option<CqlIdentifier>,
}

impl MapperContext {
    #[must_use]
    pub fn new(session: CqlSession, keyspace: Option<CqlIdentifier>) -> Self {
        Self { session, keyspace }
    }

    #[must_use]
    pub fn session(&self) -> &CqlSession {
        &self.session
    }

    /// Default keyspace; `None` leaves table names unqualified.
    #[must_use]
    pub fn keyspace(&self) -> Option<&CqlIdentifier> {
        self.keyspace.as_ref()
    }
}

/// Implemented by application mapper types built through [`MapperBuilder`].
pub trait BuildMapper: Sized {
    fn from_context(context: MapperContext) -> Self;
}

/// Builder for a mapper of type `M`.
pub struct MapperBuilder<M = Mapper> {
    session: CqlSession,
    keyspace: Option<CqlIdentifier>,
    _mapper: PhantomData<fn() -> M>,
}

impl<M: BuildMapper> MapperBuilder<M> {
    #[must_use]
    pub fn new(session: &CqlSession) -> Self {
        Self {
            session: session.clone(),
            keyspace: None,
            _mapper: PhantomData,
        }
    }

    /// Sets the default keyspace from CQL syntax (unquoted names fold to lower case).
    ///
    /// # Errors
    /// Returns `MapperError::InvalidIdentifier` for an invalid keyspace name.
    pub fn with_default_keyspace(self, keyspace: &str) -> Result<Self> {
        Ok(self.with_default_keyspace_id(CqlIdentifier::from_cql(keyspace)?))
    }

    #[must_use]
    pub fn with_default_keyspace_id(mut self, keyspace: CqlIdentifier) -> Self {
        self.keyspace = Some(keyspace);
        self
    }

    #[must_use]
    pub fn build(self) -> M {
        M::from_context(MapperContext::new(self.session, self.keyspace))
    }
}

/// General-purpose mapper producing an [`EntityDao`] for any entity.
#[derive(Clone)]
pub struct Mapper {
    context: MapperContext,
}

impl BuildMapper for Mapper {
    fn from_context(context: MapperContext) -> Self {
        Self { context }
    }
}

impl Mapper {
    /// Builds a DAO for `E`, preparing its core statements.
    ///
    /// # Errors
    /// Returns `MapperError::Prepare` if a statement is rejected, e.g. because
    /// the table does not exist.
    pub async fn dao<E: Entity>(&self) -> Result<EntityDao<E>> {
        EntityDao::new(&self.context).await
    }
}
