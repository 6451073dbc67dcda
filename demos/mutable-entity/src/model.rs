//! Two views of the `product` table.

use std::fmt;

use cql_mapper::Entity;

/// Mutable product: public fields, settable after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Entity)]
#[entity(table = "product")]
pub struct Product {
    #[entity(partition_key)]
    pub id: i32,
    pub description: Option<String>,
}

impl Product {
    #[must_use]
    pub fn new(id: i32, description: Option<String>) -> Self {
        Self { id, description }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product(id={}, description={})",
            self.id,
            self.description.as_deref().unwrap_or("null")
        )
    }
}

/// Read-only projection of the same table. Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[entity(table = "product")]
pub struct ImmutableProduct {
    #[entity(partition_key)]
    id: i32,
    description: Option<String>,
}

impl ImmutableProduct {
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

impl fmt::Display for ImmutableProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImmutableProduct(id={}, description={})",
            self.id,
            self.description().unwrap_or("null")
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use cql_mapper::entity::Entity as _;

    #[test]
    fn test_display() {
        let product = Product::new(1, Some("test".to_owned()));
        assert_eq!(product.to_string(), "Product(id=1, description=test)");
        assert_eq!(
            ImmutableProduct::new(1, None).to_string(),
            "ImmutableProduct(id=1, description=null)"
        );
    }

    #[test]
    fn test_default_then_set() {
        let mut product = Product::default();
        product.id = 2;
        product.description = Some("changed".to_owned());
        assert_eq!(product, Product::new(2, Some("changed".to_owned())));
    }

    #[test]
    fn test_both_views_share_the_table() {
        assert_eq!(Product::TABLE, ImmutableProduct::TABLE);
        assert_eq!(Product::COLUMNS, ImmutableProduct::COLUMNS);
    }
}
