// Key indexes must be given on every partition key field or on none.

use cql_mapper::Entity;

#[derive(Entity)]
struct Reading {
    #[entity(partition_key = 0)]
    sensor: i32,
    #[entity(partition_key)]
    day: i32,
}

fn main() {}
