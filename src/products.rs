//! Products

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::prices::Price;

/// Catalog identifier of a product.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        ProductId(value)
    }
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product price
    pub price: Price,
}

/// Product price lookup supplied by the catalog collaborator.
pub trait Catalog {
    /// Find a product by id.
    fn find_product(&self, id: ProductId) -> Option<&Product>;
}

/// Catalog held in memory, keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: FxHashMap<ProductId, Product>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product, returning the previous entry.
    pub fn insert(&mut self, product: Product) -> Option<Product> {
        self.products.insert(product.id, product)
    }

    /// Change the price of a product already in the catalog.
    ///
    /// Returns `false` when the product is unknown.
    pub fn set_price(&mut self, id: ProductId, price: Price) -> bool {
        match self.products.get_mut(&id) {
            Some(product) => {
                product.price = price;
                true
            }
            None => false,
        }
    }

    /// Remove a product from the catalog.
    pub fn remove(&mut self, id: ProductId) -> Option<Product> {
        self.products.remove(&id)
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn find_product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }
}

impl FromIterator<Product> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        Self {
            products: iter.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}
