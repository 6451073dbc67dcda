// A field is either part of the partition key or a clustering column.

use cql_mapper::Entity;

#[derive(Entity)]
struct Reading {
    #[entity(partition_key, clustering_column)]
    sensor: i32,
}

fn main() {}
