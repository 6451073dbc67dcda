// Unknown field attributes abort with the list of valid ones.

use cql_mapper::Entity;

#[derive(Entity)]
struct Product {
    #[entity(primary_key)]
    id: i32,
}

fn main() {}
