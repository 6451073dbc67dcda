// Two clustering columns claiming the same position.

use cql_mapper::Entity;

#[derive(Entity)]
struct Event {
    #[entity(partition_key)]
    day: i32,
    #[entity(clustering_column = 0)]
    hour: i32,
    #[entity(clustering_column = 0)]
    minute: i32,
}

fn main() {}
