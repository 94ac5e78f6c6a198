//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use innovacart_core::catalog::PLACEHOLDER_IMAGE;

use crate::cloudinary::optimized_url;

/// Edge of the square list thumbnails, in pixels.
const THUMBNAIL_SIZE: u32 = 96;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Small cropped rendition of a product image for tables.
///
/// Usage in templates: `<img src="{{ product.image|thumbnail }}">`
#[askama::filter_fn]
pub fn thumbnail(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(thumbnail_url(&value.to_string()))
}

fn thumbnail_url(image: &str) -> String {
    if image.trim().is_empty() {
        PLACEHOLDER_IMAGE.to_string()
    } else {
        optimized_url(image, THUMBNAIL_SIZE, THUMBNAIL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_url() {
        assert_eq!(thumbnail_url(""), PLACEHOLDER_IMAGE);
        assert_eq!(
            thumbnail_url("https://res.cloudinary.com/demo/image/upload/v1/mango.png"),
            "https://res.cloudinary.com/demo/image/upload/q_auto,f_auto,w_96,h_96,c_fill/v1/mango.png"
        );
        assert_eq!(
            thumbnail_url("https://images.unsplash.com/photo-1"),
            "https://images.unsplash.com/photo-1"
        );
    }
}
