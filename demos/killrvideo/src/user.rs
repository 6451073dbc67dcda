//! Users and their login credentials.
//!
//! A user lives in two tables: `users` keyed by id and `user_credentials`
//! keyed by email. Creation writes the user row first, then claims the email
//! with a lightweight transaction, so credentials never point to a user that
//! was not written.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use cql_mapper::query::Delete;
use cql_mapper::{
    CqlIdentifier, CqlSession, Entity, EntityDao, MapperContext, NullSavingStrategy,
};
use scylla::statement::prepared::PreparedStatement;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::OrNull;
use crate::error::KillrVideoError;
use crate::password;

#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[entity(table = "users")]
pub struct User {
    #[entity(partition_key)]
    pub userid: Option<Uuid>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
}

impl User {
    /// A new user with a random id, created now.
    #[must_use]
    pub fn new(firstname: &str, lastname: &str, email: &str) -> Self {
        Self {
            userid: Some(Uuid::new_v4()),
            firstname: Some(firstname.to_owned()),
            lastname: Some(lastname.to_owned()),
            email: Some(email.to_owned()),
            created_date: Some(Utc::now().trunc_subsecs(3)),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User(userid={}, firstname={}, lastname={}, email={})",
            OrNull(&self.userid),
            OrNull(&self.firstname),
            OrNull(&self.lastname),
            OrNull(&self.email),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[entity(table = "user_credentials")]
pub struct UserCredentials {
    #[entity(partition_key)]
    pub email: String,
    /// bcrypt hash, never the clear text.
    pub password: String,
    pub userid: Uuid,
}

pub struct UserDao {
    session: CqlSession,
    users: EntityDao<User>,
    credentials: EntityDao<UserCredentials>,
    delete_credentials_if_owner: PreparedStatement,
}

impl UserDao {
    /// # Errors
    /// Returns an error if a statement cannot be prepared.
    pub async fn new(context: &MapperContext) -> cql_mapper::Result<Self> {
        let users = EntityDao::new(context).await?;
        let credentials: EntityDao<UserCredentials> = EntityDao::new(context).await?;

        let delete_credentials_if_owner = Delete::new(credentials.queries().table().clone())
            .where_eq([CqlIdentifier::from_internal("email")])
            .if_columns_eq([CqlIdentifier::from_internal("userid")])
            .build();
        let delete_credentials_if_owner = context
            .session()
            .prepare(&delete_credentials_if_owner)
            .await?;

        Ok(Self {
            session: context.session().clone(),
            users,
            credentials,
            delete_credentials_if_owner,
        })
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get(&self, userid: Uuid) -> Result<Option<User>, KillrVideoError> {
        Ok(self.users.get((userid,)).await?)
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_credentials(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, KillrVideoError> {
        Ok(self.credentials.get((email,)).await?)
    }

    /// Looks the user up through the credentials table.
    ///
    /// # Errors
    /// Returns an error if a request fails.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, KillrVideoError> {
        match self.get_credentials(email).await? {
            Some(credentials) => self.get(credentials.userid).await,
            None => Ok(None),
        }
    }

    /// Creates the user with a hashed password.
    ///
    /// Returns `false` when the email is already taken; the user row written
    /// for this attempt is removed again.
    ///
    /// # Errors
    /// Returns `KillrVideoError::MissingUserIdentity` if the user has no id or
    /// email. Any other failure triggers a best-effort cleanup of both rows;
    /// cleanup failures are attached to the returned error.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn create(&self, user: &User, password: &str) -> Result<bool, KillrVideoError> {
        let (Some(userid), Some(email)) = (user.userid, user.email.as_deref()) else {
            return Err(KillrVideoError::MissingUserIdentity);
        };

        match self
            .insert_user_then_credentials(user, userid, email, password)
            .await
        {
            Ok(created) => Ok(created),
            Err(err) => {
                warn!(%userid, error = %err, "user creation failed, cleaning up");
                let suppressed = self.clean_up(userid, email).await;
                Err(err.with_suppressed(suppressed))
            }
        }
    }

    async fn insert_user_then_credentials(
        &self,
        user: &User,
        userid: Uuid,
        email: &str,
        password: &str,
    ) -> Result<bool, KillrVideoError> {
        let mut user = user.clone();
        user
            .created_date
            .get_or_insert_with(|| Utc::now().trunc_subsecs(3));
        self.users
            .insert_with(&user, NullSavingStrategy::DoNotSet)
            .await?;

        let credentials = UserCredentials {
            email: email.to_owned(),
            password: password::hash(password).await?,
            userid,
        };
        if !self.credentials.insert_if_not_exists(&credentials).await? {
            debug!(%userid, "email already registered");
            self.users.delete((userid,)).await?;
            return Ok(false);
        }
        info!(%userid, "user created");
        Ok(true)
    }

    async fn clean_up(&self, userid: Uuid, email: &str) -> Vec<cql_mapper::MapperError> {
        let mut suppressed = Vec::new();
        if let Err(err) = self.users.delete_if_exists((userid,)).await {
            suppressed.push(err);
        }
        if let Err(err) = self
            .session
            .execute_prepared(&self.delete_credentials_if_owner, (email, userid))
            .await
        {
            suppressed.push(err);
        }
        suppressed
    }

    /// Checks the password against the stored hash.
    ///
    /// Returns `None` for an unknown email or a wrong password.
    ///
    /// # Errors
    /// Returns `KillrVideoError::DanglingCredentials` if the credentials point
    /// to a user row that does not exist, or any request error.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, KillrVideoError> {
        let Some(credentials) = self.get_credentials(email).await? else {
            return Ok(None);
        };
        if !password::matches(password, &credentials.password).await? {
            return Ok(None);
        }
        match self.get(credentials.userid).await? {
            Some(user) => Ok(Some(user)),
            None => Err(KillrVideoError::DanglingCredentials {
                email: credentials.email,
                userid: credentials.userid,
            }),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use cql_mapper::entity::{ColumnDef, Entity as _, EntityQueries};

    #[test]
    fn test_user_display() {
        let mut user = User::new("test", "user", "testuser@example.com");
        let userid = user.userid.unwrap();
        assert_eq!(
            user.to_string(),
            format!(
                "User(userid={userid}, firstname=test, lastname=user, email=testuser@example.com)"
            )
        );
        user.lastname = None;
        assert!(user.to_string().contains("lastname=null"));
    }

    #[test]
    fn test_credentials_mapping() {
        let names: Vec<&str> = UserCredentials::COLUMNS.iter().map(ColumnDef::name).collect();
        assert_eq!(names, ["email", "password", "userid"]);

        let keyspace = CqlIdentifier::from_internal("killrvideo");
        let queries = EntityQueries::of::<UserCredentials>(Some(&keyspace));
        assert_eq!(
            queries.insert_if_not_exists(),
            "INSERT INTO killrvideo.user_credentials (email, password, userid) \
             VALUES (?, ?, ?) IF NOT EXISTS"
        );
        assert_eq!(
            Delete::new(queries.table().clone())
                .where_eq([CqlIdentifier::from_internal("email")])
                .if_columns_eq([CqlIdentifier::from_internal("userid")])
                .build(),
            "DELETE FROM killrvideo.user_credentials WHERE email = ? IF userid = ?"
        );
    }
}
