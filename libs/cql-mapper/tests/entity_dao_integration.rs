#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(feature = "integration")]

//! `EntityDao` against a live single-node cluster.

mod common;

use anyhow::Result;
use chrono::{DateTime, Utc};
use cql_mapper::schema::SchemaBootstrap;
use cql_mapper::session::with_session;
use cql_mapper::{CqlSession, Entity, Mapper, MapperBuilder, NullSavingStrategy};
use futures::TryStreamExt;
use uuid::Uuid;

const KEYSPACE: &str = "mapper_it";

#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[entity(table = "product")]
struct Product {
    #[entity(partition_key)]
    id: i32,
    description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[entity(table = "user_videos")]
struct UserVideo {
    #[entity(partition_key)]
    userid: Uuid,
    #[entity(clustering_column = 0)]
    added_date: DateTime<Utc>,
    #[entity(clustering_column = 1)]
    videoid: Uuid,
    name: Option<String>,
}

async fn bootstrap(session: &CqlSession) -> Result<Mapper> {
    SchemaBootstrap::new(KEYSPACE)?
        .with_table::<Product>()
        .with_table::<UserVideo>()
        .ensure(session)
        .await?;
    Ok(MapperBuilder::new(session)
        .with_default_keyspace(KEYSPACE)?
        .build())
}

fn product(id: i32, description: Option<&str>) -> Product {
    Product {
        id,
        description: description.map(str::to_owned),
    }
}

#[tokio::test]
async fn entity_dao_suite() -> Result<()> {
    let cluster = common::bring_up_scylla().await?;
    with_session(&cluster.config, |session| async move {
        let mapper = bootstrap(&session).await?;
        // bootstrap is idempotent
        bootstrap(&session).await?;

        save_then_get(&mapper).await?;
        lightweight_transactions(&mapper).await?;
        update_templates(&mapper).await?;
        partition_reads(&mapper).await?;
        Ok(())
    })
    .await
}

async fn save_then_get(mapper: &Mapper) -> Result<()> {
    let dao = mapper.dao::<Product>().await?;

    let initial = product(1, Some("test"));
    dao.save(&initial).await?;
    assert_eq!(dao.get((1,)).await?, Some(initial));

    // upsert overwrites, including with null
    dao.save(&product(1, Some("second"))).await?;
    assert_eq!(dao.get((1,)).await?, Some(product(1, Some("second"))));
    dao.save(&product(1, None)).await?;
    assert_eq!(dao.get((1,)).await?, Some(product(1, None)));

    assert_eq!(dao.get((404,)).await?, None);

    dao.delete((1,)).await?;
    assert_eq!(dao.get((1,)).await?, None);
    Ok(())
}

async fn lightweight_transactions(mapper: &Mapper) -> Result<()> {
    let dao = mapper.dao::<Product>().await?;

    assert!(dao.insert_if_not_exists(&product(10, Some("first"))).await?);
    assert!(!dao.insert_if_not_exists(&product(10, Some("other"))).await?);
    assert_eq!(dao.get((10,)).await?, Some(product(10, Some("first"))));

    assert!(dao.delete_if_exists((10,)).await?);
    assert!(!dao.delete_if_exists((10,)).await?);
    Ok(())
}

async fn update_templates(mapper: &Mapper) -> Result<()> {
    let dao = mapper.dao::<Product>().await?;
    dao.save(&product(20, Some("kept"))).await?;

    dao.update(&product(20, None), NullSavingStrategy::DoNotSet)
        .await?;
    assert_eq!(dao.get((20,)).await?, Some(product(20, Some("kept"))));

    dao.update(&product(20, None), NullSavingStrategy::SetToNull)
        .await?;
    assert_eq!(dao.get((20,)).await?, Some(product(20, None)));
    Ok(())
}

async fn partition_reads(mapper: &Mapper) -> Result<()> {
    let dao = mapper.dao::<UserVideo>().await?;
    let userid = Uuid::new_v4();
    let base = Utc::now().timestamp_millis();

    for offset in 0..3 {
        let video = UserVideo {
            userid,
            added_date: DateTime::from_timestamp_millis(base + offset).unwrap(),
            videoid: Uuid::new_v4(),
            name: Some(format!("video {offset}")),
        };
        dao.save(&video).await?;
    }
    // another partition must not leak into the result
    dao.save(&UserVideo {
        userid: Uuid::new_v4(),
        added_date: Utc::now(),
        videoid: Uuid::new_v4(),
        name: None,
    })
    .await?;

    let videos = dao.select_partition((userid,)).await?;
    assert_eq!(videos.len(), 3);
    assert!(videos.iter().all(|v| v.userid == userid));

    let streamed: Vec<UserVideo> = dao.stream_partition((userid,)).await?.try_collect().await?;
    assert_eq!(streamed, videos);
    Ok(())
}
