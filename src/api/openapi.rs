//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, catalog, health, items, SESSION_COOKIE};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Booktoshare API",
        version = "0.2.0",
        description = "Personal library and book sharing server"
    ),
    paths(
        // Health
        health::health_check,
        // Library
        books::index,
        items::item_history,
        // Catalog
        catalog::search,
        catalog::google_volume,
    ),
    components(
        schemas(
            // Library
            crate::models::item::ItemView,
            crate::models::item::UserItems,
            crate::models::item::LendForm,
            crate::models::history::History,
            crate::models::history::HistoryEvent,
            crate::models::book::NewBookForm,
            // Accounts
            crate::models::user::LoginForm,
            crate::models::user::RegisterForm,
            // Catalog
            catalog::SearchForm,
            catalog::AddVolumeForm,
            catalog::SearchResults,
            crate::models::volume::VolumeSummary,
            crate::models::volume::VolumeDetail,
            crate::models::volume::VolumeInfo,
            crate::models::volume::IndustryIdentifier,
            crate::models::volume::ImageLinks,
            // Forms
            crate::api::FormPage,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SessionCookie),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "library", description = "Owned and borrowed items"),
        (name = "catalog", description = "Google Books search")
    )
)]
pub struct ApiDoc;

struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
