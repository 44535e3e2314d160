use std::collections::BTreeMap;

use serde::Serialize;

/// A product and its price in credits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Product {
    pub name: String,
    pub price: i64,
}

/// Price lookup consumed by the shopping flow.
///
/// Implementations must be pure: lookups have no side effects and never
/// mutate the stores that call them.
pub trait Catalog: Send + Sync {
    /// Price of `name` in credits, or `None` if the product is unknown.
    fn price_of(&self, name: &str) -> Option<i64>;

    /// Every product with its price, in display order.
    fn products(&self) -> Vec<Product>;
}

/// `BTreeMap`-backed catalog for embedding and tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    prices: BTreeMap<String, i64>,
}

impl InMemoryCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog stocked with the standard demo products.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for (name, price) in [
            ("bike", 750),
            ("boat", 120_000),
            ("book", 40),
            ("car", 30_000),
            ("pen", 5),
        ] {
            catalog.insert(name, price);
        }
        catalog
    }

    /// Add or replace a product.
    pub fn insert(&mut self, name: impl Into<String>, price: i64) {
        self.prices.insert(name.into(), price);
    }
}

impl Catalog for InMemoryCatalog {
    fn price_of(&self, name: &str) -> Option<i64> {
        self.prices.get(name).copied()
    }

    fn products(&self) -> Vec<Product> {
        self.prices
            .iter()
            .map(|(name, price)| Product {
                name: name.clone(),
                price: *price,
            })
            .collect()
    }
}
