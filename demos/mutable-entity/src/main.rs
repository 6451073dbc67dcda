use anyhow::Result;
use cql_mapper::session::with_session;
use cql_mapper::{MapperConfig, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let config = MapperConfig::load()?;
    logging::init(&config.logging)?;

    with_session(&config.session, |session| async move {
        mutable_entity_demo::run(&session).await
    })
    .await
}
