// Only structs can be entities.

use cql_mapper::Entity;

#[derive(Entity)]
enum Shape {
    Circle,
    Square,
}

fn main() {}
