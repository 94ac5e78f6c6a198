//! Shopping cart held in the visitor's session.
//!
//! A cart line snapshots the product fields needed for display and pricing, so
//! the cart page renders without a database round trip. Lines are keyed by
//! product, or by product and variant when one is selected, and adding the same
//! key twice merges quantities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, ProductVariant};
use crate::types::{ProductId, round_money};

/// Product fields copied into a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image_or_placeholder().to_string(),
            category: product.category.clone(),
        }
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// `productId` or `productId-variantId`.
    pub id: String,
    pub product: CartProduct,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variant: Option<ProductVariant>,
}

impl CartItem {
    /// Key for a product and optional variant.
    #[must_use]
    pub fn key(product_id: &ProductId, variant: Option<&ProductVariant>) -> String {
        match variant {
            Some(v) => format!("{product_id}-{}", v.id),
            None => product_id.to_string(),
        }
    }

    /// Price of a single unit: the variant price if set, else the product price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.selected_variant
            .as_ref()
            .and_then(|v| v.price)
            .unwrap_or(self.product.price)
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        round_money(self.unit_price() * Decimal::from(self.quantity))
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Restore a cart from its stored JSON. Corrupt data yields an empty cart.
    #[must_use]
    pub fn from_json_lossy(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Add `quantity` units of a product. Merges with an existing line.
    ///
    /// Returns the key of the affected line, or `None` when `quantity` is zero.
    pub fn add(
        &mut self,
        product: &Product,
        quantity: u32,
        variant: Option<&ProductVariant>,
    ) -> Option<String> {
        if quantity == 0 {
            return None;
        }
        let key = CartItem::key(&product.id, variant);

        if let Some(existing) = self.items.iter_mut().find(|item| item.id == key) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                id: key.clone(),
                product: CartProduct::from(product),
                quantity,
                selected_variant: variant.cloned(),
            });
        }
        Some(key)
    }

    /// Units already in the line with this key.
    #[must_use]
    pub fn quantity_of(&self, key: &str) -> u32 {
        self.items
            .iter()
            .find(|item| item.id == key)
            .map_or(0, |item| item.quantity)
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        self.items.len() != before
    }

    /// Set the quantity of a line; zero or less removes it.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove(item_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) {
            item.quantity = quantity;
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        round_money(self.items.iter().map(CartItem::line_total).sum())
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::tests::{product, variant};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_merges_same_key() {
        let mut cart = Cart::new();
        let p = product("p1", "100", "misc");
        cart.add(&p, 1, None);
        cart.add(&p, 2, None);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_variants_get_separate_lines() {
        let mut cart = Cart::new();
        let p = product("p1", "500", "t-shirts");
        let m = variant("m", None, 5);
        let xl = variant("xl", Some("550"), 5);
        assert_eq!(cart.add(&p, 1, Some(&m)).as_deref(), Some("p1-m"));
        assert_eq!(cart.add(&p, 2, Some(&xl)).as_deref(), Some("p1-xl"));
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.total(), d("1600"));
    }

    #[test]
    fn test_quantity_of_line() {
        let mut cart = Cart::new();
        let p = product("p1", "500", "t-shirts");
        let m = variant("m", None, 5);
        cart.add(&p, 2, Some(&m));
        cart.add(&p, 1, Some(&m));
        assert_eq!(cart.quantity_of("p1-m"), 3);
        assert_eq!(cart.quantity_of("p1"), 0);
    }

    #[test]
    fn test_zero_quantity_add_ignored() {
        let mut cart = Cart::new();
        assert!(cart.add(&product("p1", "10", "misc"), 0, None).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_and_remove() {
        let mut cart = Cart::new();
        let p = product("p1", "12.50", "misc");
        cart.add(&p, 1, None);
        cart.update_quantity("p1", 4);
        assert_eq!(cart.total(), d("50"));

        cart.update_quantity("p1", 0);
        assert!(cart.is_empty());

        cart.add(&p, 1, None);
        cart.update_quantity("p1", -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(&product("a", "1", "misc"), 1, None);
        cart.add(&product("b", "1", "misc"), 1, None);
        assert!(cart.remove("a"));
        assert!(!cart.remove("a"));
        assert_eq!(cart.items.len(), 1);
        cart.clear();
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_corrupt_json_gives_empty_cart() {
        let cart = Cart::from_json_lossy(serde_json::json!({"items": "nope"}));
        assert!(cart.is_empty());

        let mut stored = Cart::new();
        stored.add(&product("a", "2.5", "misc"), 2, None);
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(Cart::from_json_lossy(value), stored);
    }
}
