use cql_mapper::mapper::BuildMapper;
use cql_mapper::{CqlSession, MapperBuilder, MapperContext};

use crate::user::UserDao;
use crate::video::VideoDao;

pub struct KillrVideoMapper {
    context: MapperContext,
}

impl BuildMapper for KillrVideoMapper {
    fn from_context(context: MapperContext) -> Self {
        Self { context }
    }
}

impl KillrVideoMapper {
    #[must_use]
    pub fn builder(session: &CqlSession) -> MapperBuilder<KillrVideoMapper> {
        MapperBuilder::new(session)
    }

    /// # Errors
    /// Returns an error if a user statement cannot be prepared.
    pub async fn user_dao(&self) -> cql_mapper::Result<UserDao> {
        UserDao::new(&self.context).await
    }

    /// # Errors
    /// Returns an error if a video statement cannot be prepared.
    pub async fn video_dao(&self) -> cql_mapper::Result<VideoDao> {
        VideoDao::new(&self.context).await
    }
}
