use cql_mapper::Entity;
use cql_mapper::entity::{ColumnKind, Entity as _};

#[derive(Entity)]
#[entity(table = "product")]
pub struct Product {
    #[entity(partition_key)]
    pub id: i32,
    pub description: Option<String>,
}

#[derive(Entity)]
pub struct ImmutableProduct {
    #[entity(partition_key)]
    id: i32,
    description: Option<String>,
}

fn main() {
    assert_eq!(Product::TABLE, "product");
    assert_eq!(ImmutableProduct::TABLE, "immutable_product");
    assert_eq!(Product::COLUMNS.len(), 2);
    assert_eq!(Product::COLUMNS[0].kind(), ColumnKind::PartitionKey(0));
    assert_eq!(Product::COLUMNS[1].cql_type(), "text");

    let product = ImmutableProduct {
        id: 1,
        description: None,
    };
    assert_eq!(product.to_values().len(), 2);
    assert_eq!(product.id, 1);
    assert!(product.description.is_none());
}
