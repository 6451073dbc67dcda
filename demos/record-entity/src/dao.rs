use async_trait::async_trait;
use cql_mapper::mapper::BuildMapper;
use cql_mapper::{CqlSession, EntityDao, MapperBuilder, MapperContext};

use crate::model::Product;

#[async_trait]
pub trait ProductDao: Send + Sync {
    async fn get(&self, id: i32) -> anyhow::Result<Option<Product>>;
    async fn save(&self, product: &Product) -> anyhow::Result<()>;
}

pub struct CqlProductDao {
    products: EntityDao<Product>,
}

#[async_trait]
impl ProductDao for CqlProductDao {
    async fn get(&self, id: i32) -> anyhow::Result<Option<Product>> {
        Ok(self.products.get((id,)).await?)
    }

    async fn save(&self, product: &Product) -> anyhow::Result<()> {
        Ok(self.products.save(product).await?)
    }
}

pub struct ProductMapper {
    context: MapperContext,
}

impl BuildMapper for ProductMapper {
    fn from_context(context: MapperContext) -> Self {
        Self { context }
    }
}

impl ProductMapper {
    #[must_use]
    pub fn builder(session: &CqlSession) -> MapperBuilder<ProductMapper> {
        MapperBuilder::new(session)
    }

    /// # Errors
    /// Returns an error if the product statements cannot be prepared.
    pub async fn dao(&self) -> cql_mapper::Result<CqlProductDao> {
        Ok(CqlProductDao {
            products: EntityDao::new(&self.context).await?,
        })
    }
}
