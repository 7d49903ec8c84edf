use crate::{Error, Product, ProductId};
use async_trait::async_trait;

#[async_trait]
pub trait ProductRepository: Send + Sync + 'static {
    /// Insert a product. Fails with `StorageError::Constraint` when the name
    /// is already listed.
    async fn create(&self, product: Product) -> Result<Product, Error>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, Error>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, Error>;

    /// All products, in insertion order
    async fn list(&self) -> Result<Vec<Product>, Error>;

    async fn update(&self, product: &Product) -> Result<Product, Error>;

    async fn delete(&self, id: &ProductId) -> Result<(), Error>;
}
