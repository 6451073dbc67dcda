//! Shared access to the driver session.
//!
//! [`CqlSession`] is a cheap handle over one `scylla` session plus the named
//! execution profiles from configuration. The demos acquire it with
//! [`with_session`], which closes it on every exit path.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use scylla::client::execution_profile::{ExecutionProfile, ExecutionProfileHandle};
use scylla::client::pager::QueryPager;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::policies::load_balancing::DefaultPolicy;
use scylla::response::query_result::QueryResult;
use scylla::serialize::batch::BatchValues;
use scylla::serialize::row::SerializeRow;
use scylla::statement::batch::Batch;
use scylla::statement::prepared::PreparedStatement;
use scylla::statement::unprepared::Statement;
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::config::{ProfileConfig, SessionConfig};
use crate::{MapperError, Result};

/// Cloneable handle to an open session.
#[derive(Clone)]
pub struct CqlSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    session: Session,
    profiles: HashMap<String, ExecutionProfileHandle>,
    contact_points: String,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        debug!(contact_points = %self.contact_points, "CQL session released");
    }
}

fn build_profile(profile: &ProfileConfig, local_datacenter: Option<&str>) -> ExecutionProfile {
    let mut builder = ExecutionProfile::builder().request_timeout(profile.request_timeout);
    if let Some(consistency) = profile.consistency {
        builder = builder.consistency(consistency.into());
    }
    if let Some(datacenter) = local_datacenter {
        let policy = DefaultPolicy::builder()
            .prefer_datacenter(datacenter.to_owned())
            .token_aware(true)
            .build();
        builder = builder.load_balancing_policy(policy);
    }
    builder.build()
}

impl CqlSession {
    /// Opens a session to the configured cluster.
    ///
    /// # Errors
    /// Returns `MapperError::NewSession` if no contact point can be reached.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        let local_datacenter = config.local_datacenter.as_deref();
        let default_profile = build_profile(&config.default_profile, local_datacenter);

        let mut builder = SessionBuilder::new()
            .known_nodes(&config.contact_points)
            .connection_timeout(config.connection_timeout)
            .default_execution_profile_handle(default_profile.into_handle());
        if let Some(credentials) = &config.credentials {
            builder = builder.user(
                credentials.username.clone(),
                credentials.password.expose_secret().to_owned(),
            );
        }

        let contact_points = config.contact_points.join(",");
        debug!(%contact_points, "connecting to CQL cluster");
        let session = builder.build().await?;

        let profiles = config
            .profiles
            .iter()
            .map(|(name, profile)| {
                let merged = profile.inherit(&config.default_profile);
                (
                    name.clone(),
                    build_profile(&merged, local_datacenter).into_handle(),
                )
            })
            .collect();

        info!(
            %contact_points,
            datacenter = local_datacenter.unwrap_or("any"),
            "CQL session opened"
        );

        Ok(Self {
            inner: Arc::new(SessionInner {
                session,
                profiles,
                contact_points,
            }),
        })
    }

    /// Looks up a named execution profile.
    ///
    /// # Errors
    /// Returns `MapperError::UnknownProfile` when no profile has that name.
    pub fn profile(&self, name: &str) -> Result<ExecutionProfileHandle> {
        self.inner
            .profiles
            .get(name)
            .cloned()
            .ok_or_else(|| MapperError::UnknownProfile(name.to_owned()))
    }

    /// Runs an unprepared statement with the default profile.
    ///
    /// # Errors
    /// Returns `MapperError::Execution` if the request fails.
    pub async fn execute(
        &self,
        statement: impl Into<Statement>,
        values: impl SerializeRow,
    ) -> Result<QueryResult> {
        Ok(self.inner.session.query_unpaged(statement, values).await?)
    }

    /// Runs an unprepared statement with a named execution profile.
    ///
    /// # Errors
    /// Returns `MapperError::UnknownProfile` or `MapperError::Execution`.
    pub async fn execute_with_profile(
        &self,
        statement: impl Into<Statement>,
        profile: &str,
        values: impl SerializeRow,
    ) -> Result<QueryResult> {
        let mut statement = statement.into();
        statement.set_execution_profile_handle(Some(self.profile(profile)?));
        self.execute(statement, values).await
    }

    /// # Errors
    /// Returns `MapperError::Prepare` if the server rejects the statement.
    pub async fn prepare(&self, cql: &str) -> Result<PreparedStatement> {
        debug!(cql, "preparing statement");
        Ok(self.inner.session.prepare(cql).await?)
    }

    /// # Errors
    /// Returns `MapperError::Execution` if the request fails.
    pub async fn execute_prepared(
        &self,
        prepared: &PreparedStatement,
        values: impl SerializeRow,
    ) -> Result<QueryResult> {
        Ok(self.inner.session.execute_unpaged(prepared, values).await?)
    }

    /// Executes a prepared statement and pages through its rows lazily.
    ///
    /// # Errors
    /// Returns `MapperError::PagerExecution` if the first page cannot be fetched.
    pub async fn execute_paged(
        &self,
        prepared: PreparedStatement,
        values: impl SerializeRow,
    ) -> Result<QueryPager> {
        Ok(self.inner.session.execute_iter(prepared, values).await?)
    }

    /// # Errors
    /// Returns `MapperError::Execution` if the batch fails.
    pub async fn batch(&self, batch: &Batch, values: impl BatchValues) -> Result<QueryResult> {
        Ok(self.inner.session.batch(batch, values).await?)
    }

    /// Releases this handle. The driver session closes once the last clone is gone.
    pub fn close(self) {
        let other_handles = Arc::strong_count(&self.inner) - 1;
        info!(
            contact_points = %self.inner.contact_points,
            other_handles,
            "closing CQL session"
        );
    }
}

/// Opens a session, runs `f` with it and closes it again, on success and on
/// error alike. Returns whatever `f` returns.
///
/// # Errors
/// Returns the connection error, or the error produced by `f`.
pub async fn with_session<F, Fut, T, E>(config: &SessionConfig, f: F) -> std::result::Result<T, E>
where
    F: FnOnce(CqlSession) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: From<MapperError>,
{
    let session = CqlSession::connect(config).await?;
    let result = f(session.clone()).await;
    session.close();
    result
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::ConsistencyLevel;
    use scylla::statement::Consistency;
    use std::time::Duration;

    #[test]
    fn test_profile_settings_are_applied() {
        let profile = build_profile(
            &ProfileConfig {
                request_timeout: Some(Duration::from_secs(10)),
                consistency: Some(ConsistencyLevel::LocalQuorum),
            },
            Some("dc1"),
        );
        assert_eq!(profile.get_request_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(profile.get_consistency(), Consistency::LocalQuorum);
    }

    #[tokio::test]
    async fn test_unreachable_cluster_fails_without_running_closure() {
        let config = SessionConfig {
            contact_points: vec!["127.0.0.1:1".to_owned()],
            connection_timeout: Duration::from_millis(500),
            ..SessionConfig::default()
        };
        let mut ran = false;
        let result: Result<()> = with_session(&config, |_session| {
            ran = true;
            async { Ok(()) }
        })
        .await;
        assert!(matches!(result, Err(MapperError::NewSession(_))));
        assert!(!ran);
    }
}
