//! Product catalog types and rules.
//!
//! Products are stored under `products/{id}` in the document database. A
//! product either has a single price and stock figure, or a list of variants
//! (sizes for t-shirts, weights for fruit) each with its own stock and an
//! optional price override.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, VariantId, format_taka};

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";

/// Validation failures for products entered in the admin.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    #[error("product name is required")]
    MissingName,
    #[error("product category is required")]
    MissingCategory,
    #[error("product price must be greater than zero")]
    InvalidPrice,
    #[error("add at least one variant or disable variants")]
    NoVariants,
    #[error("variant name is required")]
    MissingVariantName,
    #[error("price is required for fruit variant '{0}'")]
    MissingVariantPrice(String),
    #[error("variant not found: {0}")]
    VariantNotFound(String),
}

/// Why a requested quantity cannot be sold.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("{0} is out of stock")]
    SoldOut(String),
    #[error("Only {available} of {name} left in stock")]
    Insufficient { name: String, available: u32 },
}

/// A purchasable option of a product (a size or a weight).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub name: String,
    /// Price override; `None` means the product price applies.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub default: bool,
}

impl ProductVariant {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub has_variants: bool,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Price for one unit of the given variant (or of the product itself).
    #[must_use]
    pub fn unit_price(&self, variant: Option<&ProductVariant>) -> Decimal {
        variant.and_then(|v| v.price).unwrap_or(self.price)
    }

    /// Find a variant by id.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// The variant pre-selected for customers: the flagged default, else the first.
    #[must_use]
    pub fn default_variant(&self) -> Option<&ProductVariant> {
        self.variants
            .iter()
            .find(|v| v.default)
            .or_else(|| self.variants.first())
    }

    /// The variant to sell when the customer picked none: the default if it
    /// has stock, else the first variant that does, else the default.
    #[must_use]
    pub fn purchasable_variant(&self) -> Option<&ProductVariant> {
        self.default_variant()
            .filter(|v| v.in_stock())
            .or_else(|| self.variants.iter().find(|v| v.in_stock()))
            .or_else(|| self.default_variant())
    }

    /// Units left of the given variant (or of the product itself).
    #[must_use]
    pub fn available(&self, variant: Option<&ProductVariant>) -> u32 {
        variant.map_or(self.stock, |v| v.stock)
    }

    /// Check that `requested` units of the product (or variant) can be sold.
    ///
    /// # Errors
    ///
    /// Returns `StockError::SoldOut` when nothing is left, and
    /// `StockError::Insufficient` when fewer than `requested` units are.
    pub fn check_stock(
        &self,
        variant: Option<&ProductVariant>,
        requested: u32,
    ) -> Result<(), StockError> {
        let name = match variant {
            Some(v) => format!("{} ({})", self.name, v.name),
            None => self.name.clone(),
        };
        let available = self.available(variant);
        if available == 0 {
            return Err(StockError::SoldOut(name));
        }
        if requested > available {
            return Err(StockError::Insufficient { name, available });
        }
        Ok(())
    }

    /// Image URL to display, falling back to the placeholder.
    #[must_use]
    pub fn image_or_placeholder(&self) -> &str {
        if self.image.trim().is_empty() {
            PLACEHOLDER_IMAGE
        } else {
            &self.image
        }
    }

    /// Display price, e.g. `৳250.00`. Shows a range when variants override it.
    #[must_use]
    pub fn price_label(&self) -> String {
        let prices: Vec<Decimal> = self
            .variants
            .iter()
            .map(|v| v.price.unwrap_or(self.price))
            .collect();
        match (prices.iter().min(), prices.iter().max()) {
            (Some(min), Some(max)) if min != max => {
                format!("{} - {}", format_taka(*min), format_taka(*max))
            }
            (Some(only), _) => format_taka(*only),
            _ => format_taka(self.price),
        }
    }

    /// Whether anything is left to sell.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Bring the variant list into its stored shape.
    ///
    /// Exactly one variant is flagged default when variants exist (the last
    /// flagged one wins, else the first). With variants enabled, `stock` is the
    /// sum of variant stocks; with variants disabled the list is emptied.
    pub fn normalize_variants(&mut self) {
        if !self.has_variants {
            self.variants.clear();
            return;
        }

        let chosen = self
            .variants
            .iter()
            .rposition(|v| v.default)
            .unwrap_or(0);
        for (index, variant) in self.variants.iter_mut().enumerate() {
            variant.default = index == chosen;
        }

        self.stock = self
            .variants
            .iter()
            .map(|v| v.stock)
            .fold(0u32, u32::saturating_add);
    }

    /// Add a variant. The first variant, or one flagged default, becomes the default.
    pub fn add_variant(&mut self, mut variant: ProductVariant) {
        if self.variants.is_empty() || variant.default {
            for existing in &mut self.variants {
                existing.default = false;
            }
            variant.default = true;
        }
        self.has_variants = true;
        self.variants.push(variant);
        self.normalize_variants();
    }

    /// Remove a variant by id.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::VariantNotFound` if no variant has that id.
    pub fn remove_variant(&mut self, id: &VariantId) -> Result<ProductVariant, ProductError> {
        let index = self
            .variants
            .iter()
            .position(|v| &v.id == id)
            .ok_or_else(|| ProductError::VariantNotFound(id.to_string()))?;
        let removed = self.variants.remove(index);
        if self.variants.is_empty() {
            self.has_variants = false;
        } else if removed.default
            && let Some(first) = self.variants.first_mut()
        {
            first.default = true;
        }
        self.normalize_variants();
        Ok(removed)
    }

    /// Mark one variant as the default.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::VariantNotFound` if no variant has that id.
    pub fn set_default_variant(&mut self, id: &VariantId) -> Result<(), ProductError> {
        if self.variant(id).is_none() {
            return Err(ProductError::VariantNotFound(id.to_string()));
        }
        for variant in &mut self.variants {
            variant.default = &variant.id == id;
        }
        Ok(())
    }

    /// Check the fields an admin must fill in.
    ///
    /// # Errors
    ///
    /// Returns the first `ProductError` found.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::MissingName);
        }
        if self.category.trim().is_empty() {
            return Err(ProductError::MissingCategory);
        }
        if self.price <= Decimal::ZERO {
            return Err(ProductError::InvalidPrice);
        }
        if self.has_variants && self.variants.is_empty() {
            return Err(ProductError::NoVariants);
        }
        let is_fruit = Category::from_slug(&self.category) == Some(Category::Fruits);
        for variant in &self.variants {
            if variant.name.trim().is_empty() {
                return Err(ProductError::MissingVariantName);
            }
            if is_fruit && variant.price.is_none() {
                return Err(ProductError::MissingVariantPrice(variant.name.clone()));
            }
        }
        Ok(())
    }
}

/// The shop's dedicated category pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Fruits,
    TShirts,
}

impl Category {
    /// All categories with their own page.
    pub const ALL: [Self; 2] = [Self::TShirts, Self::Fruits];

    /// URL slug and canonical stored name.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Fruits => "fruits",
            Self::TShirts => "t-shirts",
        }
    }

    /// Heading shown on the category page.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fruits => "Fresh Fruits",
            Self::TShirts => "T-Shirts",
        }
    }

    /// Name of the variant dimension in this category.
    #[must_use]
    pub const fn variant_label(&self) -> &'static str {
        match self {
            Self::Fruits => "Amount",
            Self::TShirts => "Size",
        }
    }

    /// Spellings that refer to this category.
    #[must_use]
    pub const fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Fruits => &["fruits", "fruit"],
            Self::TShirts => &["t-shirts", "t-shirt", "tshirts", "tshirt"],
        }
    }

    /// Resolve a slug or alias (case-insensitive, trimmed).
    #[must_use]
    pub fn from_slug(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.aliases().contains(&normalized.as_str()))
    }
}

/// Whether a product's stored category matches the requested one.
///
/// Known categories match any of their aliases; anything else must match
/// exactly after trimming and lower-casing.
#[must_use]
pub fn matches_category(product_category: &str, wanted: &str) -> bool {
    let product_category = product_category.trim().to_lowercase();
    Category::from_slug(wanted).map_or_else(
        || product_category == wanted.trim().to_lowercase(),
        |category| category.aliases().contains(&product_category.as_str()),
    )
}

/// Products belonging to a category.
#[must_use]
pub fn filter_by_category(products: &[Product], wanted: &str) -> Vec<Product> {
    products
        .iter()
        .filter(|p| matches_category(&p.category, wanted))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    pub(crate) fn variant(id: &str, price: Option<&str>, stock: u32) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(id),
            name: id.to_uppercase(),
            price: price.map(d),
            stock,
            default: false,
        }
    }

    pub(crate) fn product(id: &str, price: &str, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: d(price),
            category: category.to_string(),
            image: String::new(),
            stock: 10,
            has_variants: false,
            variants: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unit_price_prefers_variant_override() {
        let mut shirt = product("p1", "500", "t-shirts");
        shirt.add_variant(variant("m", None, 3));
        shirt.add_variant(variant("xl", Some("550"), 2));

        let m = shirt.variant(&VariantId::new("m")).cloned();
        let xl = shirt.variant(&VariantId::new("xl")).cloned();
        assert_eq!(shirt.unit_price(m.as_ref()), d("500"));
        assert_eq!(shirt.unit_price(xl.as_ref()), d("550"));
        assert_eq!(shirt.unit_price(None), d("500"));
    }

    #[test]
    fn test_first_variant_becomes_default_and_stock_sums() {
        let mut mango = product("p2", "300", "fruits");
        mango.add_variant(variant("1kg", Some("300"), 5));
        mango.add_variant(variant("5kg", Some("1400"), 2));

        assert!(mango.has_variants);
        assert_eq!(mango.default_variant().unwrap().id.as_str(), "1kg");
        assert_eq!(mango.stock, 7);
    }

    #[test]
    fn test_variant_stock_total_saturates() {
        let mut p = product("p9", "100", "t-shirts");
        p.add_variant(variant("s", None, u32::MAX));
        p.add_variant(variant("m", None, u32::MAX));
        assert_eq!(p.stock, u32::MAX);
    }

    #[test]
    fn test_purchasable_variant_skips_sold_out_default() {
        let mut shirt = product("p5", "500", "t-shirts");
        shirt.add_variant(variant("s", None, 0));
        shirt.add_variant(variant("m", None, 0));
        shirt.add_variant(variant("l", None, 4));

        assert_eq!(shirt.default_variant().unwrap().id.as_str(), "s");
        assert_eq!(shirt.purchasable_variant().unwrap().id.as_str(), "l");

        shirt.variants[2].stock = 0;
        assert_eq!(shirt.purchasable_variant().unwrap().id.as_str(), "s");
        assert!(product("p6", "10", "misc").purchasable_variant().is_none());
    }

    #[test]
    fn test_check_stock() {
        let mut p = product("p7", "100", "misc");
        p.name = "Mug".into();
        p.stock = 3;
        assert_eq!(p.check_stock(None, 3), Ok(()));
        assert_eq!(
            p.check_stock(None, 4),
            Err(StockError::Insufficient { name: "Mug".into(), available: 3 })
        );

        p.stock = 0;
        assert_eq!(p.check_stock(None, 1), Err(StockError::SoldOut("Mug".into())));

        let mut shirt = product("p8", "500", "t-shirts");
        shirt.name = "Tee".into();
        shirt.add_variant(variant("m", None, 0));
        shirt.add_variant(variant("l", None, 2));
        let m = shirt.variant(&VariantId::new("m")).cloned();
        let l = shirt.variant(&VariantId::new("l")).cloned();
        assert_eq!(
            shirt.check_stock(m.as_ref(), 1).unwrap_err().to_string(),
            "Tee (M) is out of stock"
        );
        assert_eq!(shirt.check_stock(l.as_ref(), 2), Ok(()));
        assert_eq!(
            shirt.check_stock(l.as_ref(), 5).unwrap_err().to_string(),
            "Only 2 of Tee (L) left in stock"
        );
    }

    #[test]
    fn test_flagged_variant_takes_default() {
        let mut mango = product("p2", "300", "fruits");
        mango.add_variant(variant("1kg", Some("300"), 5));
        let mut bulk = variant("5kg", Some("1400"), 2);
        bulk.default = true;
        mango.add_variant(bulk);

        let defaults: Vec<_> = mango.variants.iter().filter(|v| v.default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id.as_str(), "5kg");
    }

    #[test]
    fn test_normalize_without_variants_clears_list() {
        let mut p = product("p3", "100", "misc");
        p.variants.push(variant("x", None, 1));
        p.has_variants = false;
        p.normalize_variants();
        assert!(p.variants.is_empty());
        assert_eq!(p.stock, 10);
    }

    #[test]
    fn test_remove_default_variant_promotes_first() {
        let mut p = product("p4", "100", "t-shirts");
        p.add_variant(variant("s", None, 1));
        p.add_variant(variant("m", None, 1));
        p.remove_variant(&VariantId::new("s")).unwrap();
        assert_eq!(p.default_variant().unwrap().id.as_str(), "m");
        assert!(p.variants[0].default);

        p.remove_variant(&VariantId::new("m")).unwrap();
        assert!(!p.has_variants);
        assert!(p.remove_variant(&VariantId::new("m")).is_err());
    }

    #[test]
    fn test_validate() {
        let mut p = product("p5", "0", "fruits");
        assert_eq!(p.validate(), Err(ProductError::InvalidPrice));
        p.price = d("100");
        assert_eq!(p.validate(), Ok(()));

        p.has_variants = true;
        assert_eq!(p.validate(), Err(ProductError::NoVariants));

        p.variants.push(variant("1kg", None, 1));
        assert_eq!(
            p.validate(),
            Err(ProductError::MissingVariantPrice("1KG".to_string()))
        );

        p.category = "t-shirts".to_string();
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn test_category_aliases() {
        assert!(matches_category("Fruit", "fruits"));
        assert!(matches_category(" TSHIRT ", "t-shirts"));
        assert!(matches_category("t-shirts", "tshirt"));
        assert!(!matches_category("fruits", "t-shirts"));
        assert!(matches_category("Gadgets", "gadgets"));
        assert!(!matches_category("gadget", "gadgets"));
    }

    #[test]
    fn test_filter_by_category() {
        let products = vec![
            product("a", "10", "fruits"),
            product("b", "10", "T-Shirt"),
            product("c", "10", "fruit"),
        ];
        let fruits = filter_by_category(&products, "fruits");
        let ids: Vec<_> = fruits.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_price_label_range() {
        let mut p = product("p6", "300", "fruits");
        assert_eq!(p.price_label(), "৳300.00");
        p.add_variant(variant("1kg", Some("300"), 1));
        p.add_variant(variant("5kg", Some("1400"), 1));
        assert_eq!(p.price_label(), "৳300.00 - ৳1400.00");
    }

    #[test]
    fn test_deserialize_stored_product() {
        let json = r#"{
            "id": "-Nabc",
            "name": "Himsagar Mango",
            "price": 250,
            "category": "fruits",
            "stock": 40,
            "hasVariants": true,
            "variants": [
                {"id": "1", "name": "1kg", "price": null, "stock": 40, "default": true}
            ],
            "createdAt": 1717000000000
        }"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.price, d("250"));
        assert_eq!(p.variants[0].price, None);
        assert_eq!(p.created_at.timestamp_millis(), 1_717_000_000_000);
        assert_eq!(p.image_or_placeholder(), PLACEHOLDER_IMAGE);
    }
}
