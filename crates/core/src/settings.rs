//! Site-wide settings record stored at `settings`.
//!
//! The record predates some of its sections, so `paymentNumbers`,
//! `categoryThumbnails` and `featureIcons` may be absent in stored data.
//! Readers call [`SiteSettings::fill_missing`] and write the result back when
//! it reports a change.

use serde::{Deserialize, Serialize};

use crate::catalog::Category;
use crate::types::PaymentMethod;

pub const DEFAULT_PAYMENT_NUMBER: &str = "+88019191191919";
pub const DEFAULT_TSHIRTS_THUMBNAIL: &str =
    "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=400&h=400&fit=crop";
pub const DEFAULT_FRUITS_THUMBNAIL: &str =
    "https://images.unsplash.com/photo-1619566636858-adf3ef46400b?w=400&h=400&fit=crop";

/// Icon names the admin can pick for the home page feature cards.
pub const FEATURE_ICON_CHOICES: [&str; 10] = [
    "truck",
    "shield-check",
    "zap",
    "headphones",
    "star",
    "heart",
    "award",
    "users",
    "globe",
    "smartphone",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNumbers {
    pub bkash: String,
    pub nagad: String,
    pub rocket: String,
}

impl Default for PaymentNumbers {
    fn default() -> Self {
        Self {
            bkash: DEFAULT_PAYMENT_NUMBER.to_string(),
            nagad: DEFAULT_PAYMENT_NUMBER.to_string(),
            rocket: DEFAULT_PAYMENT_NUMBER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryThumbnails {
    pub tshirts: String,
    pub fruits: String,
}

impl Default for CategoryThumbnails {
    fn default() -> Self {
        Self {
            tshirts: DEFAULT_TSHIRTS_THUMBNAIL.to_string(),
            fruits: DEFAULT_FRUITS_THUMBNAIL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureIcons {
    pub delivery: String,
    pub quality: String,
    pub support: String,
}

impl Default for FeatureIcons {
    fn default() -> Self {
        Self {
            delivery: "truck".to_string(),
            quality: "shield-check".to_string(),
            support: "zap".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default = "enabled")]
    pub it_solutions_available: bool,
    #[serde(default = "enabled")]
    pub tshirt_page_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_numbers: Option<PaymentNumbers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_thumbnails: Option<CategoryThumbnails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_icons: Option<FeatureIcons>,
}

const fn enabled() -> bool {
    true
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            it_solutions_available: true,
            tshirt_page_available: true,
            payment_numbers: Some(PaymentNumbers::default()),
            category_thumbnails: Some(CategoryThumbnails::default()),
            feature_icons: Some(FeatureIcons::default()),
        }
    }
}

impl SiteSettings {
    /// Default any missing optional section. Returns whether anything changed.
    pub fn fill_missing(&mut self) -> bool {
        let mut changed = false;
        if self.payment_numbers.is_none() {
            self.payment_numbers = Some(PaymentNumbers::default());
            changed = true;
        }
        if self.category_thumbnails.is_none() {
            self.category_thumbnails = Some(CategoryThumbnails::default());
            changed = true;
        }
        if self.feature_icons.is_none() {
            self.feature_icons = Some(FeatureIcons::default());
            changed = true;
        }
        changed
    }

    /// Shop number customers pay with the given method.
    #[must_use]
    pub fn payment_number(&self, method: PaymentMethod) -> String {
        let numbers = self.payment_numbers.clone().unwrap_or_default();
        match method {
            PaymentMethod::Bkash => numbers.bkash,
            PaymentMethod::Nagad => numbers.nagad,
            PaymentMethod::Rocket => numbers.rocket,
        }
    }

    #[must_use]
    pub fn thumbnail(&self, category: Category) -> String {
        let thumbs = self.category_thumbnails.clone().unwrap_or_default();
        match category {
            Category::TShirts => thumbs.tshirts,
            Category::Fruits => thumbs.fruits,
        }
    }

    #[must_use]
    pub fn icons(&self) -> FeatureIcons {
        self.feature_icons.clone().unwrap_or_default()
    }

    /// Whether a category page is open to customers.
    #[must_use]
    pub const fn category_available(&self, category: Category) -> bool {
        match category {
            Category::TShirts => self.tshirt_page_available,
            Category::Fruits => true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = SiteSettings::default();
        assert!(s.it_solutions_available);
        assert!(s.tshirt_page_available);
        assert_eq!(s.payment_number(PaymentMethod::Rocket), DEFAULT_PAYMENT_NUMBER);
        assert_eq!(s.icons().quality, "shield-check");
        assert_eq!(s.thumbnail(Category::Fruits), DEFAULT_FRUITS_THUMBNAIL);
    }

    #[test]
    fn test_fill_missing_on_legacy_record() {
        let mut s: SiteSettings = serde_json::from_str(
            r#"{"itSolutionsAvailable":false,"tshirtPageAvailable":false,
                "paymentNumbers":{"bkash":"017","nagad":"018","rocket":"019"}}"#,
        )
        .unwrap();
        assert!(s.category_thumbnails.is_none());
        assert!(s.fill_missing());
        assert!(!s.fill_missing());
        assert_eq!(s.payment_number(PaymentMethod::Nagad), "018");
        assert!(!s.category_available(Category::TShirts));
        assert!(s.category_available(Category::Fruits));
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(SiteSettings::default()).unwrap();
        assert_eq!(value["itSolutionsAvailable"], serde_json::json!(true));
        assert_eq!(value["featureIcons"]["support"], serde_json::json!("zap"));
    }
}
