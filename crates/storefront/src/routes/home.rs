//! Home page and the IT solutions page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use innovacart_core::catalog::Category;
use innovacart_core::settings::FeatureIcons;

use crate::filters;
use crate::page::PageContext;
use crate::state::AppState;

/// Category tile on the home page.
#[derive(Debug, Clone)]
pub struct CategoryTile {
    pub label: &'static str,
    pub href: String,
    pub thumbnail: String,
}

/// A service offered on the IT solutions page.
#[derive(Debug, Clone, Copy)]
pub struct Solution {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub features: [&'static str; 4],
}

pub const SOLUTIONS: [Solution; 4] = [
    Solution {
        icon: "palette",
        title: "Graphics Design",
        description: "Stunning visual designs that captivate and convert your audience",
        features: ["Logo Design", "Brand Identity", "Print Design", "Digital Art"],
    },
    Solution {
        icon: "smartphone",
        title: "UI/UX Design",
        description: "User-centered designs that create exceptional digital experiences",
        features: ["User Research", "Wireframing", "Prototyping", "User Testing"],
    },
    Solution {
        icon: "globe",
        title: "Website Development",
        description: "Modern, responsive websites built with cutting-edge technology",
        features: [
            "Responsive Design",
            "SEO Optimization",
            "Performance",
            "Security",
        ],
    },
    Solution {
        icon: "code",
        title: "App Development",
        description: "Native and cross-platform mobile applications",
        features: [
            "iOS Development",
            "Android Development",
            "React Native",
            "Flutter",
        ],
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryTile>,
    pub icons: FeatureIcons,
    pub solutions: &'static [Solution],
}

/// IT solutions page template.
#[derive(Template, WebTemplate)]
#[template(path = "it_solutions.html")]
pub struct ItSolutionsTemplate {
    pub page: PageContext,
    pub solutions: &'static [Solution],
}

/// Display the home page.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let settings = state.repos().settings.get().await;

    let categories = Category::ALL
        .into_iter()
        .filter(|c| settings.category_available(*c))
        .map(|c| CategoryTile {
            label: c.label(),
            href: format!("/shop/{}", c.slug()),
            thumbnail: settings.thumbnail(c),
        })
        .collect();

    HomeTemplate {
        page,
        categories,
        icons: settings.icons(),
        solutions: &SOLUTIONS,
    }
}

/// Display the IT solutions page, or send visitors home when it is switched off.
#[instrument(skip(page))]
pub async fn it_solutions(page: PageContext) -> Response {
    if !page.show_it_solutions {
        return Redirect::to("/").into_response();
    }

    ItSolutionsTemplate {
        page,
        solutions: &SOLUTIONS,
    }
    .into_response()
}
