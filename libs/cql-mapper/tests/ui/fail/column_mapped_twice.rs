// Renaming a field onto a column that is already mapped.

use cql_mapper::Entity;

#[derive(Entity)]
struct Product {
    #[entity(partition_key)]
    id: i32,
    #[entity(name = "id")]
    legacy_id: i32,
}

fn main() {}
