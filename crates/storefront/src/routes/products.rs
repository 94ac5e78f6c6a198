//! Catalog route handlers: store, category pages, product detail and reviews.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use innovacart_core::catalog::{Category, Product};
use innovacart_core::review::{Rating, Review};
use innovacart_core::{ProductId, format_taka};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, login_url};
use crate::models::Flash;
use crate::models::session::push_flash;
use crate::page::PageContext;
use crate::routes::home::CategoryTile;
use crate::state::AppState;

/// Product card data for listings.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub price: String,
    pub category: String,
    pub in_stock: bool,
    pub has_variants: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            image: product.image_or_placeholder().to_string(),
            price: product.price_label(),
            category: product.category.clone(),
            in_stock: product.in_stock(),
            has_variants: product.has_variants && !product.variants.is_empty(),
        }
    }
}

/// Variant option on the product page.
#[derive(Debug, Clone)]
pub struct VariantOptionView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub in_stock: bool,
    pub selected: bool,
}

/// Review as shown under a product.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub date: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            user_name: review.user_name.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            date: review.created_at.format("%b %d, %Y").to_string(),
        }
    }
}

/// Product listing template, used for the store and category pages.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub title: String,
    pub subtitle: &'static str,
    pub categories: Vec<CategoryTile>,
    pub products: Vec<ProductCardView>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub category: String,
    pub price: String,
    pub in_stock: bool,
    pub variant_label: &'static str,
    pub variants: Vec<VariantOptionView>,
    pub rating: Rating,
    pub reviews: Vec<ReviewView>,
    pub login_href: String,
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// Display every product, newest first.
#[instrument(skip(state, page))]
pub async fn store(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    let settings = state.repos().settings.get().await;
    let products = state.repos().products.list().await?;

    let categories = Category::ALL
        .into_iter()
        .filter(|c| settings.category_available(*c))
        .map(|c| CategoryTile {
            label: c.label(),
            href: format!("/shop/{}", c.slug()),
            thumbnail: settings.thumbnail(c),
        })
        .collect();

    Ok(ProductsIndexTemplate {
        page,
        title: "Our Store".to_string(),
        subtitle: "Discover our curated collection of quality products",
        categories,
        products: products.iter().map(ProductCardView::from).collect(),
    })
}

/// Display a category page.
///
/// The t-shirt page sends visitors back to the store while it is switched off.
#[instrument(skip(state, page))]
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    page: PageContext,
) -> Result<Response> {
    let category =
        Category::from_slug(&slug).ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    if !state
        .repos()
        .settings
        .get()
        .await
        .category_available(category)
    {
        return Ok(Redirect::to("/store").into_response());
    }

    let products = state.repos().products.by_category(category.slug()).await?;

    Ok(ProductsIndexTemplate {
        page,
        title: category.label().to_string(),
        subtitle: match category {
            Category::Fruits => "Farm-fresh fruits delivered to your doorstep",
            Category::TShirts => "High-quality cotton t-shirts with modern designs",
        },
        categories: Vec::new(),
        products: products.iter().map(ProductCardView::from).collect(),
    }
    .into_response())
}

/// Display a product with its variants and reviews.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = state.repos().products.require(&id).await?;
    let reviews = state.repos().reviews.list_for_product(&id).await?;

    let selected = product.purchasable_variant().map(|v| v.id.clone());
    let variants = if product.has_variants {
        product
            .variants
            .iter()
            .map(|v| VariantOptionView {
                id: v.id.to_string(),
                name: v.name.clone(),
                price: format_taka(product.unit_price(Some(v))),
                in_stock: v.in_stock(),
                selected: selected.as_ref() == Some(&v.id),
            })
            .collect()
    } else {
        Vec::new()
    };

    let price = product
        .purchasable_variant()
        .filter(|_| product.has_variants)
        .map_or(product.price, |v| product.unit_price(Some(v)));

    let variant_label = Category::from_slug(&product.category)
        .map_or("Option", |c| c.variant_label());

    Ok(ProductShowTemplate {
        login_href: login_url(&format!("/products/{id}")),
        id: id.to_string(),
        name: product.name.clone(),
        description: product.description.clone(),
        image: product.image_or_placeholder().to_string(),
        category: product.category.clone(),
        price: format_taka(price),
        in_stock: product.in_stock(),
        variant_label,
        variants,
        rating: Rating::from_reviews(&reviews),
        reviews: reviews.iter().map(ReviewView::from).collect(),
        page,
    })
}

/// Post a review for a product.
#[instrument(skip(state, session, user, form), fields(user_id = %user.uid))]
pub async fn add_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let product_id = ProductId::new(id);
    let product = state.repos().products.require(&product_id).await?;
    let back = format!("/products/{product_id}");

    let review = match Review::new(
        product.id,
        user.uid.clone(),
        Some(&user.name),
        &user.email,
        form.rating,
        &form.comment,
    ) {
        Ok(review) => review,
        Err(e) => {
            push_flash(&session, Flash::error(e.to_string())).await;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    state.repos().reviews.add(review).await?;
    add_breadcrumb("review", "Review posted", Some(&[("product_id", product_id.as_str())]));
    push_flash(&session, Flash::success("Thanks for your review!")).await;

    Ok(Redirect::to(&back).into_response())
}
