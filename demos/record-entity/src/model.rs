use std::fmt;

use cql_mapper::Entity;

/// Value-type product. Built once, compared by value, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Entity)]
#[entity(table = "product")]
pub struct Product {
    #[entity(partition_key)]
    id: i32,
    description: Option<String>,
}

impl Product {
    #[must_use]
    pub fn new(id: i32, description: Option<String>) -> Self {
        Self { id, description }
    }

    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product[id={}, description={}]",
            self.id,
            self.description().unwrap_or("null")
        )
    }
}
