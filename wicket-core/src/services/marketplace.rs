//! Marketplace product listings
use crate::{
    Error, Product, ProductId,
    error::{StorageError, utilities::FoundExt},
    listing::case_insensitive,
    product::{NewProduct, ProductUpdate},
    repositories::ProductRepository,
    validation::{validate_new_product, validate_product_update},
};
use chrono::Utc;
use std::sync::Arc;

pub struct MarketplaceService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> MarketplaceService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// All products, optionally filtered by a case-insensitive regex on the name
    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, Error> {
        let products = self.repository.list().await?;
        let Some(pattern) = search.filter(|s| !s.is_empty()) else {
            return Ok(products);
        };

        let pattern = case_insensitive(pattern)?;
        Ok(products
            .into_iter()
            .filter(|p| pattern.is_match(&p.name))
            .collect())
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, Error> {
        self.repository.find_by_id(id).await
    }

    pub async fn product_is_registered(&self, name: &str) -> Result<bool, Error> {
        Ok(self.repository.find_by_name(name).await?.is_some())
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, Error> {
        validate_new_product(&product)?;

        if self.product_is_registered(&product.name).await? {
            return Err(StorageError::Constraint(
                "Product name is already registered".to_string(),
            )
            .into());
        }

        let product = self
            .repository
            .create(product.into_product(ProductId::new_random(), Utc::now()))
            .await?;
        tracing::info!(product_id = %product.id, name = %product.name, "Listed product");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Product, Error> {
        validate_product_update(&update)?;

        let mut product = self
            .repository
            .find_by_id(id)
            .await?
            .or_not_found()?;
        product.apply(update, Utc::now());
        self.repository.update(&product).await
    }

    pub async fn delete_product(&self, id: &ProductId) -> Result<(), Error> {
        self.repository.delete(id).await
    }
}
