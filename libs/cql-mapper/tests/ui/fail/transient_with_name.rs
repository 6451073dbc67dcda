// A transient field is not mapped, so it cannot be renamed.

use cql_mapper::Entity;

#[derive(Entity)]
struct Product {
    #[entity(partition_key)]
    id: i32,
    #[entity(transient, name = "cache")]
    cache: Option<String>,
}

fn main() {}
