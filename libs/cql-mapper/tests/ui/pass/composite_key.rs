use chrono::{DateTime, Utc};
use cql_mapper::Entity;
use cql_mapper::entity::{ColumnKind, Entity as _};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Entity)]
#[entity(table = "videos_by_tag")]
pub struct VideoByTag {
    #[entity(partition_key)]
    pub tag: String,
    #[entity(clustering_column)]
    pub videoid: Uuid,
    #[entity(name = "added_date")]
    pub added: Option<DateTime<Utc>>,
    pub tags: HashSet<String>,
    #[entity(transient)]
    pub cached: Vec<String>,
}

#[derive(Entity)]
#[entity(table = "events")]
pub struct Event {
    #[entity(partition_key = 1)]
    pub day: String,
    #[entity(partition_key = 0)]
    pub source: String,
    #[entity(clustering_column = 0)]
    pub at: DateTime<Utc>,
    pub r#type: Option<i64>,
}

fn main() {
    let names: Vec<&str> = VideoByTag::COLUMNS.iter().map(|c| c.name()).collect();
    assert_eq!(names, ["tag", "videoid", "added_date", "tags"]);
    assert_eq!(VideoByTag::COLUMNS[1].kind(), ColumnKind::ClusteringColumn(0));
    assert_eq!(VideoByTag::COLUMNS[3].cql_type(), "set<text>");

    let names: Vec<&str> = Event::COLUMNS.iter().map(|c| c.name()).collect();
    assert_eq!(names, ["source", "day", "at", "type"]);
    assert_eq!(Event::partition_key().len(), 2);
}
