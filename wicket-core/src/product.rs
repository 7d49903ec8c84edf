//! Marketplace products
use crate::id::{generate_prefixed_id, validate_prefixed_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: &str) -> Self {
        ProductId(id.to_string())
    }

    pub fn new_random() -> Self {
        ProductId(generate_prefixed_id("prd"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "prd")
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: u32,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Apply a partial update. Fields left as `None` keep their current value.
    pub fn apply(&mut self, update: ProductUpdate, now: DateTime<Utc>) {
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        self.updated_at = now;
    }
}

/// A product listing about to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: u32,
    pub stock: u32,
}

impl NewProduct {
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a product. The name is immutable once listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<u32>,
    #[serde(default)]
    pub stock: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_product_id_prefixed() {
        let id = ProductId::new_random();
        assert!(id.as_str().starts_with("prd_"));
        assert!(id.is_valid());
        assert!(!ProductId::new("usr_AAAAAAAAAAAAAAAA").is_valid());
    }

    #[test]
    fn test_apply_partial_update() {
        let created = Utc::now();
        let mut product = NewProduct {
            name: "Kopi".to_string(),
            description: None,
            price: 15000,
            stock: 3,
        }
        .into_product(ProductId::new_random(), created);

        let later = created + Duration::minutes(1);
        product.apply(
            ProductUpdate {
                price: Some(12000),
                ..Default::default()
            },
            later,
        );

        assert_eq!(product.price, 12000);
        assert_eq!(product.stock, 3);
        assert_eq!(product.description, None);
        assert_eq!(product.name, "Kopi");
        assert_eq!(product.created_at, created);
        assert_eq!(product.updated_at, later);
    }
}
