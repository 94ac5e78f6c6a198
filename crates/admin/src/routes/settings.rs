//! Site settings route handlers.
//!
//! One form covers the page toggles, the feature icons on the home page, the
//! mobile-payment numbers shown at checkout and the category thumbnails.

#![allow(clippy::used_underscore_binding)]

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use innovacart_core::settings::{
    CategoryThumbnails, DEFAULT_FRUITS_THUMBNAIL, DEFAULT_TSHIRTS_THUMBNAIL, FEATURE_ICON_CHOICES,
    FeatureIcons, PaymentNumbers, SiteSettings,
};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::models::session::{push_flash, take_flash};
use crate::state::AppState;

use super::dashboard::AdminUserView;

/// Settings form data. Checkboxes are present only when ticked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    pub it_solutions_available: Option<String>,
    pub tshirt_page_available: Option<String>,
    #[serde(default)]
    pub icon_delivery: String,
    #[serde(default)]
    pub icon_quality: String,
    #[serde(default)]
    pub icon_support: String,
    #[serde(default)]
    pub bkash: String,
    #[serde(default)]
    pub nagad: String,
    #[serde(default)]
    pub rocket: String,
    #[serde(default)]
    pub thumbnail_tshirts: String,
    #[serde(default)]
    pub thumbnail_fruits: String,
}

impl From<&SiteSettings> for SettingsForm {
    fn from(settings: &SiteSettings) -> Self {
        let numbers = settings.payment_numbers.clone().unwrap_or_default();
        let thumbs = settings.category_thumbnails.clone().unwrap_or_default();
        let icons = settings.icons();
        let checked = |on: bool| on.then(|| "on".to_string());
        Self {
            it_solutions_available: checked(settings.it_solutions_available),
            tshirt_page_available: checked(settings.tshirt_page_available),
            icon_delivery: icons.delivery,
            icon_quality: icons.quality,
            icon_support: icons.support,
            bkash: numbers.bkash,
            nagad: numbers.nagad,
            rocket: numbers.rocket,
            thumbnail_tshirts: thumbs.tshirts,
            thumbnail_fruits: thumbs.fruits,
        }
    }
}

fn icon(value: &str, label: &str) -> std::result::Result<String, String> {
    let value = value.trim();
    if FEATURE_ICON_CHOICES.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(format!("Unknown {label} icon '{value}'"))
    }
}

fn payment_number(value: &str, label: &str) -> std::result::Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("{label} number is required"))
    } else {
        Ok(value.to_string())
    }
}

fn thumbnail(value: &str, fallback: &str) -> String {
    let value = value.trim();
    let chosen = if value.is_empty() { fallback } else { value };
    chosen.to_string()
}

impl SettingsForm {
    fn to_settings(&self) -> std::result::Result<SiteSettings, String> {
        Ok(SiteSettings {
            it_solutions_available: self.it_solutions_available.is_some(),
            tshirt_page_available: self.tshirt_page_available.is_some(),
            payment_numbers: Some(PaymentNumbers {
                bkash: payment_number(&self.bkash, "bKash")?,
                nagad: payment_number(&self.nagad, "Nagad")?,
                rocket: payment_number(&self.rocket, "Rocket")?,
            }),
            category_thumbnails: Some(CategoryThumbnails {
                tshirts: thumbnail(&self.thumbnail_tshirts, DEFAULT_TSHIRTS_THUMBNAIL),
                fruits: thumbnail(&self.thumbnail_fruits, DEFAULT_FRUITS_THUMBNAIL),
            }),
            feature_icons: Some(FeatureIcons {
                delivery: icon(&self.icon_delivery, "delivery")?,
                quality: icon(&self.icon_quality, "quality")?,
                support: icon(&self.icon_support, "support")?,
            }),
        })
    }
}

/// One feature-icon `<select>`.
#[derive(Debug, Clone)]
pub struct IconSelect {
    pub name: &'static str,
    pub label: &'static str,
    pub selected: String,
}

impl IconSelect {
    /// Whether `choice` is the selected option.
    #[must_use]
    pub fn is_selected(&self, choice: &str) -> bool {
        self.selected == choice
    }
}

/// Settings page template.
#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub form: SettingsForm,
    pub icon_selects: Vec<IconSelect>,
    pub icon_choices: &'static [&'static str],
    pub error: Option<String>,
    pub upload_enabled: bool,
}

fn render(
    state: &AppState,
    admin_user: AdminUserView,
    flash: Option<Flash>,
    form: SettingsForm,
    error: Option<String>,
) -> Result<String> {
    let icon_selects = vec![
        IconSelect {
            name: "icon_delivery",
            label: "Delivery",
            selected: form.icon_delivery.clone(),
        },
        IconSelect {
            name: "icon_quality",
            label: "Quality",
            selected: form.icon_quality.clone(),
        },
        IconSelect {
            name: "icon_support",
            label: "Support",
            selected: form.icon_support.clone(),
        },
    ];
    let template = SettingsTemplate {
        admin_user,
        current_path: "/settings".to_string(),
        flash,
        form,
        icon_selects,
        icon_choices: &FEATURE_ICON_CHOICES,
        error,
        upload_enabled: state.cloudinary().is_some(),
    };
    Ok(template.render()?)
}

/// Settings page handler.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let settings = state.repos().settings.get().await;
    let flash = take_flash(&session).await;
    let body = render(
        &state,
        AdminUserView::from(&admin),
        flash,
        SettingsForm::from(&settings),
        None,
    )?;
    Ok(Html(body))
}

/// Save settings handler.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    match form.to_settings() {
        Ok(settings) => {
            state.repos().settings.update(&settings).await?;
            info!(
                it_solutions = settings.it_solutions_available,
                tshirts = settings.tshirt_page_available,
                "Site settings saved"
            );
            push_flash(&session, Flash::success("Settings saved")).await;
            Ok(Redirect::to("/settings").into_response())
        }
        Err(message) => {
            let body = render(&state, AdminUserView::from(&admin), None, form, Some(message))?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response())
        }
    }
}

/// Restore the default settings.
#[instrument(skip(_admin, state, session))]
pub async fn reset(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect> {
    state.repos().settings.reset().await?;
    push_flash(&session, Flash::success("Settings restored to defaults")).await;
    Ok(Redirect::to("/settings"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_form() {
        let defaults = SiteSettings::default();
        let form = SettingsForm::from(&defaults);
        assert_eq!(form.it_solutions_available.as_deref(), Some("on"));
        assert_eq!(form.to_settings().unwrap(), defaults);
    }

    #[test]
    fn test_unticked_boxes_disable_pages() {
        let mut form = SettingsForm::from(&SiteSettings::default());
        form.it_solutions_available = None;
        form.tshirt_page_available = None;
        let settings = form.to_settings().unwrap();
        assert!(!settings.it_solutions_available);
        assert!(!settings.tshirt_page_available);
    }

    #[test]
    fn test_rejects_unknown_icon_and_blank_number() {
        let mut form = SettingsForm::from(&SiteSettings::default());
        form.icon_quality = "rocket-ship".to_string();
        assert!(form.to_settings().unwrap_err().contains("quality"));

        let mut form = SettingsForm::from(&SiteSettings::default());
        form.nagad = "  ".to_string();
        assert_eq!(form.to_settings().unwrap_err(), "Nagad number is required");
    }

    #[test]
    fn test_blank_thumbnail_uses_default() {
        let mut form = SettingsForm::from(&SiteSettings::default());
        form.thumbnail_fruits = String::new();
        let thumbs = form.to_settings().unwrap().category_thumbnails.unwrap();
        assert_eq!(thumbs.fruits, DEFAULT_FRUITS_THUMBNAIL);
    }
}
