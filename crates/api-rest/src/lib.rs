//! # API REST
//!
//! REST backend for carebook.
//!
//! Handles:
//! - The `patients` and `custom-fields` resources under `/api/`, scoped per provider
//! - Bearer-token authentication
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON errors, pagination links, CORS)
//!
//! Records live in an in-memory [`Store`]; restarting the server discards them.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod config;
pub mod custom_fields;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod patients;
pub mod seed;
pub mod store;

use std::sync::Arc;

use api_shared::{HealthRes, HealthService};
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::{middleware, Router};
use carebook_core::model::{
    AddressCreate, AddressListed, AddressType, CustomFieldCreate, CustomFieldDefinition,
    CustomFieldPatch, CustomFieldValueCreate, CustomFieldValueListed, PaginatedCustomFieldList,
    PaginatedPatientList, PatientCreate, PatientList, PatientStatus, PatientUpdate, UsState,
};
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub use config::{ConfigError, ServerConfig};
pub use error::{FieldErrors, RestError, RestResult};
pub use store::{Provider, Store};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<Store>,
}

impl AppState {
    /// State with an empty store.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(Store::new()),
        }
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        patients::list_patients,
        patients::create_patient,
        patients::retrieve_patient,
        patients::update_patient,
        patients::partial_update_patient,
        patients::delete_patient,
        custom_fields::list_custom_fields,
        custom_fields::create_custom_field,
        custom_fields::retrieve_custom_field,
        custom_fields::update_custom_field,
        custom_fields::partial_update_custom_field,
        custom_fields::delete_custom_field,
    ),
    components(schemas(
        HealthRes,
        PatientStatus,
        AddressType,
        UsState,
        AddressCreate,
        AddressListed,
        CustomFieldDefinition,
        CustomFieldCreate,
        CustomFieldPatch,
        CustomFieldValueCreate,
        CustomFieldValueListed,
        PatientCreate,
        PatientUpdate,
        PatientList,
        PaginatedPatientList,
        PaginatedCustomFieldList,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Builds the full application router for `state`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/patients/",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            "/api/patients/:id/",
            get(patients::retrieve_patient)
                .put(patients::update_patient)
                .patch(patients::partial_update_patient)
                .delete(patients::delete_patient),
        )
        .route(
            "/api/custom-fields/",
            get(custom_fields::list_custom_fields).post(custom_fields::create_custom_field),
        )
        .route(
            "/api/custom-fields/:id/",
            get(custom_fields::retrieve_custom_field)
                .put(custom_fields::update_custom_field)
                .patch(custom_fields::partial_update_custom_field)
                .delete(custom_fields::delete_custom_field),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used by monitoring and load balancer health checks. Not authenticated.
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}
