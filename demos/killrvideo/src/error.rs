use cql_mapper::MapperError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum KillrVideoError {
    #[error("userid and email must not be null")]
    MissingUserIdentity,

    #[error("video '{videoid}' has no owner")]
    MissingVideoOwner { videoid: Uuid },

    #[error("credentials for '{email}' refer to missing user {userid}")]
    DanglingCredentials { email: String, userid: Uuid },

    #[error("password hashing failed: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    PasswordTask(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Mapper(#[from] MapperError),

    /// A failed user creation whose cleanup failed as well.
    #[error("{source} (cleanup failed {} time(s))", .suppressed.len())]
    CreateUser {
        source: Box<KillrVideoError>,
        suppressed: Vec<MapperError>,
    },
}

impl KillrVideoError {
    /// Attaches cleanup failures to `self`; returns `self` unchanged when there are none.
    #[must_use]
    pub fn with_suppressed(self, suppressed: Vec<MapperError>) -> Self {
        if suppressed.is_empty() {
            self
        } else {
            Self::CreateUser {
                source: Box::new(self),
                suppressed,
            }
        }
    }

    /// Cleanup failures attached to this error.
    #[must_use]
    pub fn suppressed(&self) -> &[MapperError] {
        match self {
            Self::CreateUser { suppressed, .. } => suppressed,
            _ => &[],
        }
    }
}
