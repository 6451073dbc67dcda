//! Idempotent schema bootstrap.
//!
//! Every statement uses `IF NOT EXISTS` (or is expected to, for scripts), so
//! running the bootstrap on each start is safe. Statements run in order with
//! the `slow` execution profile since schema agreement can take a while.

use tracing::{debug, info};

use crate::config::SLOW_PROFILE;
use crate::entity::{Entity, EntityQueries};
use crate::identifier::CqlIdentifier;
use crate::session::CqlSession;
use crate::Result;

/// `CREATE KEYSPACE IF NOT EXISTS` with `SimpleStrategy` replication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyspaceSchema {
    keyspace: CqlIdentifier,
    replication_factor: u32,
}

impl KeyspaceSchema {
    #[must_use]
    pub fn simple(keyspace: CqlIdentifier, replication_factor: u32) -> Self {
        Self {
            keyspace,
            replication_factor,
        }
    }

    #[must_use]
    pub fn keyspace(&self) -> &CqlIdentifier {
        &self.keyspace
    }

    #[must_use]
    pub fn create_statement(&self) -> String {
        format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = \
             {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
            self.keyspace, self.replication_factor
        )
    }
}

/// `CREATE TABLE IF NOT EXISTS` rendered from entity metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    create: String,
}

impl TableSchema {
    #[must_use]
    pub fn of<E: Entity>(keyspace: &CqlIdentifier) -> Self {
        Self {
            create: EntityQueries::of::<E>(Some(keyspace))
                .create_table()
                .to_owned(),
        }
    }

    #[must_use]
    pub fn create_statement(&self) -> &str {
        &self.create
    }
}

/// Statements of a `.cql` script.
///
/// Statements are separated by `;`. Whole-line comments starting with `--`
/// or `//` are dropped, as are empty statements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaScript {
    statements: Vec<String>,
}

impl SchemaScript {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let body: Vec<&str> = text
            .lines()
            .filter(|line| {
                let line = line.trim_start();
                !(line.starts_with("--") || line.starts_with("//"))
            })
            .collect();

        let statements = body
            .join("\n")
            .split(';')
            .map(|statement| {
                statement
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|statement| !statement.is_empty())
            .collect();

        Self { statements }
    }

    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }
}

/// Collects the statements that make a keyspace ready for use.
#[derive(Clone, Debug)]
pub struct SchemaBootstrap {
    keyspace: KeyspaceSchema,
    statements: Vec<String>,
}

impl SchemaBootstrap {
    /// Starts a bootstrap for `keyspace` (CQL syntax) with replication factor 1.
    ///
    /// # Errors
    /// Returns `MapperError::InvalidIdentifier` for an invalid keyspace name.
    pub fn new(keyspace: &str) -> Result<Self> {
        Ok(Self::for_keyspace(CqlIdentifier::from_cql(keyspace)?))
    }

    #[must_use]
    pub fn for_keyspace(keyspace: CqlIdentifier) -> Self {
        Self {
            keyspace: KeyspaceSchema::simple(keyspace, 1),
            statements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_replication(mut self, replication_factor: u32) -> Self {
        self.keyspace = KeyspaceSchema::simple(self.keyspace.keyspace, replication_factor);
        self
    }

    #[must_use]
    pub fn with_table<E: Entity>(mut self) -> Self {
        let table = TableSchema::of::<E>(self.keyspace.keyspace());
        self.statements.push(table.create);
        self
    }

    #[must_use]
    pub fn with_script(mut self, script: &SchemaScript) -> Self {
        self.statements.extend(script.statements().iter().cloned());
        self
    }

    /// All statements in execution order, keyspace first.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        std::iter::once(self.keyspace.create_statement())
            .chain(self.statements.iter().cloned())
            .collect()
    }

    /// Runs every statement in order. Errors propagate; nothing is retried.
    ///
    /// # Errors
    /// Returns the first statement failure.
    pub async fn ensure(&self, session: &CqlSession) -> Result<()> {
        let statements = self.statements();
        for statement in &statements {
            debug!(cql = statement.as_str(), "applying schema statement");
            session
                .execute_with_profile(statement.as_str(), SLOW_PROFILE, ())
                .await?;
        }
        info!(
            keyspace = %self.keyspace.keyspace(),
            statements = statements.len(),
            "schema ready"
        );
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::Entity as DeriveEntity;

    #[derive(DeriveEntity)]
    struct Product {
        #[entity(partition_key)]
        id: i32,
        description: Option<String>,
    }

    #[test]
    fn test_keyspace_statement() {
        let keyspace = KeyspaceSchema::simple(CqlIdentifier::from_internal("lombok"), 1);
        assert_eq!(
            keyspace.create_statement(),
            "CREATE KEYSPACE IF NOT EXISTS lombok WITH replication = \
             {'class': 'SimpleStrategy', 'replication_factor': 1}"
        );
    }

    #[test]
    fn test_bootstrap_orders_keyspace_first() {
        let bootstrap = SchemaBootstrap::new("Record")
            .unwrap()
            .with_replication(3)
            .with_table::<Product>();
        let statements = bootstrap.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE KEYSPACE IF NOT EXISTS record "));
        assert!(statements[0].ends_with("'replication_factor': 3}"));
        assert_eq!(
            statements[1],
            "CREATE TABLE IF NOT EXISTS record.product (id int, description text, PRIMARY KEY (id))"
        );
    }

    #[test]
    fn test_script_parsing() {
        let script = SchemaScript::parse(
            "-- users\n\
             CREATE TABLE IF NOT EXISTS killrvideo.users (\n\
                 userid uuid PRIMARY KEY,\n\
                 email text\n\
             );\n\
             \n\
             // credentials\n\
             CREATE TABLE IF NOT EXISTS killrvideo.user_credentials (email text PRIMARY KEY);\n\
             ;\n",
        );
        assert_eq!(
            script.statements(),
            [
                "CREATE TABLE IF NOT EXISTS killrvideo.users ( userid uuid PRIMARY KEY, email text )",
                "CREATE TABLE IF NOT EXISTS killrvideo.user_credentials (email text PRIMARY KEY)",
            ]
        );
    }

    #[test]
    fn test_script_statements_follow_tables() {
        let script = SchemaScript::parse("CREATE INDEX IF NOT EXISTS ON t (c);");
        let statements = SchemaBootstrap::new("ks")
            .unwrap()
            .with_table::<Product>()
            .with_script(&script)
            .statements();
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[2], "CREATE INDEX IF NOT EXISTS ON t (c)");
    }
}
