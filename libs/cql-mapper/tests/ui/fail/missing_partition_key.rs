// An entity without a partition key has no primary key and is rejected.

use cql_mapper::Entity;

#[derive(Entity)]
struct Product {
    id: i32,
    description: Option<String>,
}

fn main() {}
