//! Product management route handlers.
//!
//! Products are created with a single price and stock figure; variants are
//! managed from the edit page, one form post per change.

#![allow(clippy::used_underscore_binding)]

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use innovacart_core::catalog::{Category, Product, ProductVariant};
use innovacart_core::review::{Rating, Review};
use innovacart_core::{ProductId, VariantId, parse_amount};
use innovacart_firebase::RepositoryError;
use innovacart_firebase::push_id::push_id;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::models::session::{push_flash, take_flash};
use crate::state::AppState;

use super::dashboard::AdminUserView;

/// Product row in the list table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub stock: u32,
    pub image: String,
    pub variant_count: usize,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: category_label(&product.category),
            price: product.price_label(),
            stock: product.stock,
            image: product.image.clone(),
            variant_count: product.variants.len(),
        }
    }
}

fn category_label(value: &str) -> String {
    Category::from_slug(value).map_or_else(|| value.to_string(), |c| c.label().to_string())
}

/// A `<select>` option.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

fn category_options(current: &str) -> Vec<CategoryOption> {
    let mut options: Vec<CategoryOption> = Category::ALL
        .iter()
        .map(|c| CategoryOption {
            value: c.slug().to_string(),
            label: c.label().to_string(),
        })
        .collect();
    let current = current.trim();
    if !current.is_empty() && Category::from_slug(current).is_none() {
        options.push(CategoryOption {
            value: current.to_string(),
            label: current.to_string(),
        });
    }
    options
}

/// Product form data, kept as strings so a rejected submission re-renders
/// exactly what was typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub stock: String,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            category: product.category.clone(),
            image: product.image.clone(),
            stock: product.stock.to_string(),
        }
    }
}

impl ProductForm {
    /// Copy the submitted fields onto `product`. Variants are untouched.
    fn apply_to(&self, product: &mut Product) -> std::result::Result<(), String> {
        product.name = self.name.trim().to_string();
        product.description = self.description.trim().to_string();
        product.price = parse_amount(&self.price).map_err(|e| format!("Price: {e}"))?;
        product.category = self.category.trim().to_string();
        product.image = self.image.trim().to_string();
        if !product.has_variants {
            product.stock = parse_stock(&self.stock)?;
        }
        Ok(())
    }
}

fn parse_stock(input: &str) -> std::result::Result<u32, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse()
        .map_err(|_| format!("Stock must be a whole number, got '{trimmed}'"))
}

fn blank_product() -> Product {
    Product {
        id: ProductId::default(),
        name: String::new(),
        description: String::new(),
        price: rust_decimal::Decimal::ZERO,
        category: String::new(),
        image: String::new(),
        stock: 0,
        has_variants: false,
        variants: Vec::new(),
        created_at: Utc::now(),
    }
}

/// Variant row on the edit page.
#[derive(Debug, Clone)]
pub struct VariantRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub stock: u32,
    pub default: bool,
}

/// Review row on the edit page.
#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub rating: u8,
    pub comment: String,
    pub date: String,
}

impl From<&Review> for ReviewRow {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.to_string(),
            user_name: review.user_name.clone(),
            user_email: review.user_email.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            date: review.created_at.format("%b %d, %Y").to_string(),
        }
    }
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub products: Vec<ProductRow>,
}

/// New product page template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
    pub error: Option<String>,
    pub upload_enabled: bool,
    pub stock_editable: bool,
}

/// Edit product page template.
#[derive(Template)]
#[template(path = "products/edit.html")]
pub struct ProductEditTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub product_id: String,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
    pub error: Option<String>,
    pub upload_enabled: bool,
    pub stock_editable: bool,
    pub variant_label: String,
    pub variants: Vec<VariantRow>,
    pub reviews: Vec<ReviewRow>,
    pub rating: Rating,
}

/// Products list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let products = state.repos().products.list().await?;

    let template = ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        flash: take_flash(&session).await,
        products: products.iter().map(ProductRow::from).collect(),
    };
    Ok(Html(template.render()?))
}

/// New product form handler.
pub async fn new_product(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let template = ProductFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        flash: None,
        form: ProductForm::default(),
        categories: category_options(""),
        error: None,
        upload_enabled: state.cloudinary().is_some(),
        stock_editable: true,
    };
    Ok(Html(template.render()?))
}

/// Create product handler.
#[instrument(skip(admin, state, session, form), fields(name = %form.name))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let mut product = blank_product();
    let outcome = match form.apply_to(&mut product) {
        Ok(()) => state.repos().products.add(product).await.map_err(|e| match e {
            RepositoryError::Product(err) => Ok(err.to_string()),
            other => Err(AppError::from(other)),
        }),
        Err(message) => Err(Ok(message)),
    };

    match outcome {
        Ok(product) => {
            info!(product_id = %product.id, "Product created");
            push_flash(&session, Flash::success(format!("Product \"{}\" created", product.name)))
                .await;
            Ok(Redirect::to(&format!("/products/{}/edit", product.id)).into_response())
        }
        Err(Ok(message)) => {
            let template = ProductFormTemplate {
                admin_user: AdminUserView::from(&admin),
                current_path: "/products".to_string(),
                flash: None,
                categories: category_options(&form.category),
                form,
                error: Some(message),
                upload_enabled: state.cloudinary().is_some(),
                stock_editable: true,
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(template.render()?)).into_response())
        }
        Err(Err(e)) => Err(e),
    }
}

async fn render_edit(
    admin: &crate::models::CurrentAdmin,
    state: &AppState,
    product: &Product,
    form: ProductForm,
    flash: Option<Flash>,
    error: Option<String>,
) -> Result<String> {
    let mut reviews = state.repos().reviews.list_for_product(&product.id).await?;
    innovacart_core::review::sort_newest_first(&mut reviews);
    let category = Category::from_slug(&product.category);

    let template = ProductEditTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: "/products".to_string(),
        flash,
        product_id: product.id.to_string(),
        categories: category_options(&form.category),
        form,
        error,
        upload_enabled: state.cloudinary().is_some(),
        stock_editable: !product.has_variants,
        variant_label: category.map_or("Variant", |c| c.variant_label()).to_string(),
        variants: product
            .variants
            .iter()
            .map(|v| VariantRow {
                id: v.id.to_string(),
                name: v.name.clone(),
                price: innovacart_core::format_taka(product.unit_price(Some(v))),
                stock: v.stock,
                default: v.default,
            })
            .collect(),
        rating: Rating::from_reviews(&reviews),
        reviews: reviews.iter().map(ReviewRow::from).collect(),
    };
    Ok(template.render()?)
}

/// Edit product page handler.
#[instrument(skip(admin, state, session), fields(product_id = %id))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let product = state.repos().products.require(&ProductId::new(id)).await?;
    let flash = take_flash(&session).await;
    let form = ProductForm::from(&product);
    Ok(Html(
        render_edit(&admin, &state, &product, form, flash, None).await?,
    ))
}

/// Update product handler. Variants are kept as stored.
#[instrument(skip(admin, state, session, form), fields(product_id = %id))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let existing = state.repos().products.require(&id).await?;

    let mut product = existing.clone();
    let outcome = match form.apply_to(&mut product) {
        Ok(()) => state
            .repos()
            .products
            .update(&id, product)
            .await
            .map_err(|e| match e {
                RepositoryError::Product(err) => Ok(err.to_string()),
                other => Err(AppError::from(other)),
            }),
        Err(message) => Err(Ok(message)),
    };

    match outcome {
        Ok(product) => {
            push_flash(&session, Flash::success(format!("Product \"{}\" saved", product.name)))
                .await;
            Ok(Redirect::to(&format!("/products/{id}/edit")).into_response())
        }
        Err(Ok(message)) => {
            let body = render_edit(&admin, &state, &existing, form, None, Some(message)).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response())
        }
        Err(Err(e)) => Err(e),
    }
}

/// Delete product handler.
#[instrument(skip(_admin, state, session), fields(product_id = %id))]
pub async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = ProductId::new(id);
    let product = state.repos().products.require(&id).await?;
    state.repos().products.delete(&id).await?;
    push_flash(&session, Flash::success(format!("Product \"{}\" deleted", product.name))).await;
    Ok(Redirect::to("/products"))
}

/// Add variant form data.
#[derive(Debug, Deserialize)]
pub struct VariantForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    /// Checkbox; present only when ticked.
    pub default: Option<String>,
}

impl VariantForm {
    fn into_variant(self) -> std::result::Result<ProductVariant, String> {
        let price = if self.price.trim().is_empty() {
            None
        } else {
            Some(parse_amount(&self.price).map_err(|e| format!("Variant price: {e}"))?)
        };
        Ok(ProductVariant {
            id: VariantId::new(push_id()),
            name: self.name.trim().to_string(),
            price,
            stock: parse_stock(&self.stock)?,
            default: self.default.is_some(),
        })
    }
}

/// Save `product` after a variant change and flash the outcome.
async fn save_variants(
    state: &AppState,
    session: &Session,
    product: Product,
    success: String,
) -> Result<Redirect> {
    let id = product.id.clone();
    match state.repos().products.update(&id, product).await {
        Ok(_) => push_flash(session, Flash::success(success)).await,
        Err(RepositoryError::Product(err)) => push_flash(session, Flash::error(err.to_string())).await,
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(&format!("/products/{id}/edit")))
}

/// Add a variant to a product.
#[instrument(skip(_admin, state, session, form), fields(product_id = %id))]
pub async fn add_variant(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<VariantForm>,
) -> Result<Redirect> {
    let mut product = state.repos().products.require(&ProductId::new(id)).await?;

    let variant = match form.into_variant() {
        Ok(variant) => variant,
        Err(message) => {
            push_flash(&session, Flash::error(message)).await;
            return Ok(Redirect::to(&format!("/products/{}/edit", product.id)));
        }
    };

    let message = format!("Variant \"{}\" added", variant.name);
    product.add_variant(variant);
    save_variants(&state, &session, product, message).await
}

/// Remove a variant from a product.
#[instrument(skip(_admin, state, session), fields(product_id = %id, variant_id = %variant_id))]
pub async fn delete_variant(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((id, variant_id)): Path<(String, String)>,
) -> Result<Redirect> {
    let mut product = state.repos().products.require(&ProductId::new(id)).await?;
    let removed = product
        .remove_variant(&VariantId::new(variant_id))
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    let message = format!("Variant \"{}\" removed", removed.name);
    save_variants(&state, &session, product, message).await
}

/// Make a variant the one pre-selected for customers.
#[instrument(skip(_admin, state, session), fields(product_id = %id, variant_id = %variant_id))]
pub async fn set_default_variant(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((id, variant_id)): Path<(String, String)>,
) -> Result<Redirect> {
    let mut product = state.repos().products.require(&ProductId::new(id)).await?;
    let variant_id = VariantId::new(variant_id);
    product
        .set_default_variant(&variant_id)
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    let name = product
        .variant(&variant_id)
        .map(|v| v.name.clone())
        .unwrap_or_default();
    save_variants(&state, &session, product, format!("\"{name}\" is now the default")).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn form(price: &str, stock: &str) -> ProductForm {
        ProductForm {
            name: " Mango ".to_string(),
            description: "Fresh".to_string(),
            price: price.to_string(),
            category: "fruits".to_string(),
            image: String::new(),
            stock: stock.to_string(),
        }
    }

    #[test]
    fn test_form_applies_trimmed_fields() {
        let mut product = blank_product();
        form("120.50", "7").apply_to(&mut product).unwrap();
        assert_eq!(product.name, "Mango");
        assert_eq!(product.price, Decimal::new(12050, 2));
        assert_eq!(product.stock, 7);
    }

    #[test]
    fn test_form_rejects_bad_numbers() {
        let mut product = blank_product();
        assert!(form("abc", "1").apply_to(&mut product).unwrap_err().starts_with("Price"));
        assert!(form("10", "-2").apply_to(&mut product).unwrap_err().contains("whole number"));
    }

    #[test]
    fn test_stock_ignored_with_variants() {
        let mut product = blank_product();
        product.has_variants = true;
        product.stock = 12;
        form("10", "not a number").apply_to(&mut product).unwrap();
        assert_eq!(product.stock, 12);
    }

    #[test]
    fn test_variant_form_optional_price() {
        let variant = VariantForm {
            name: "XL".to_string(),
            price: "  ".to_string(),
            stock: "3".to_string(),
            default: Some("on".to_string()),
        }
        .into_variant()
        .unwrap();
        assert_eq!(variant.price, None);
        assert_eq!(variant.stock, 3);
        assert!(variant.default);
        assert!(!variant.id.is_empty());
    }

    #[test]
    fn test_unknown_category_kept_as_option() {
        let options = category_options("gadgets");
        assert_eq!(options.len(), Category::ALL.len() + 1);
        assert_eq!(options.last().unwrap().value, "gadgets");
        assert_eq!(category_options("fruits").len(), Category::ALL.len());
    }
}
