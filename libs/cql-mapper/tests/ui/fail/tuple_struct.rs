// Columns are named after fields, so tuple structs are rejected.

use cql_mapper::Entity;

#[derive(Entity)]
struct Pair(i32, i32);

fn main() {}
