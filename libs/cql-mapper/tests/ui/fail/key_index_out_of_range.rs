// Key indexes must start at 0 and leave no gaps.

use cql_mapper::Entity;

#[derive(Entity)]
struct Reading {
    #[entity(partition_key = 0)]
    sensor: i32,
    #[entity(partition_key = 2)]
    day: i32,
}

fn main() {}
