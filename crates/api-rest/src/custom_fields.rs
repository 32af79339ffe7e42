//! Handlers for `/api/custom-fields/`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::{Extension, Json};
use carebook_core::model::{
    CustomFieldCreate, CustomFieldDefinition, CustomFieldPatch, PaginatedCustomFieldList,
};

use crate::error::RestResult;
use crate::extract::{json_body, record_id};
use crate::pagination::{collection_url, paginate, PageQuery};
use crate::store::Provider;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/custom-fields/",
    params(PageQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "One page of the provider's custom fields", body = PaginatedCustomFieldList),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Page out of range")
    )
)]
#[axum::debug_handler]
pub async fn list_custom_fields(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> RestResult<Json<PaginatedCustomFieldList>> {
    let fields = state.store.list_custom_fields(&provider);
    let base_url = collection_url(&headers, &uri);
    Ok(Json(paginate(fields, &query, state.config.page_size, &base_url)?))
}

#[utoipa::path(
    post,
    path = "/api/custom-fields/",
    request_body = CustomFieldCreate,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Custom field created", body = CustomFieldDefinition),
        (status = 400, description = "Blank or duplicate name, or unknown type")
    )
)]
/// Define a new custom field. Names are unique per provider.
#[axum::debug_handler]
pub async fn create_custom_field(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    body: Result<Json<CustomFieldCreate>, JsonRejection>,
) -> RestResult<(StatusCode, Json<CustomFieldDefinition>)> {
    let body = json_body(body)?;
    let created = state.store.create_custom_field(&provider, body)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/custom-fields/{id}/",
    params(("id" = i64, Path, description = "Custom field id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The custom field", body = CustomFieldDefinition),
        (status = 404, description = "No such custom field for this provider")
    )
)]
#[axum::debug_handler]
pub async fn retrieve_custom_field(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    id: Result<Path<i64>, PathRejection>,
) -> RestResult<Json<CustomFieldDefinition>> {
    let id = record_id(id)?;
    Ok(Json(state.store.get_custom_field(&provider, id)?))
}

#[utoipa::path(
    put,
    path = "/api/custom-fields/{id}/",
    params(("id" = i64, Path, description = "Custom field id")),
    request_body = CustomFieldCreate,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom field replaced", body = CustomFieldDefinition),
        (status = 400, description = "Blank or duplicate name, or unknown type"),
        (status = 404, description = "No such custom field for this provider")
    )
)]
#[axum::debug_handler]
pub async fn update_custom_field(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<CustomFieldCreate>, JsonRejection>,
) -> RestResult<Json<CustomFieldDefinition>> {
    let id = record_id(id)?;
    let body = json_body(body)?;
    let patch = CustomFieldPatch {
        name: Some(body.name),
        field_type: Some(body.field_type),
        // a replacement without a description clears it
        description: Some(body.description.unwrap_or_default()),
    };
    Ok(Json(state.store.update_custom_field(&provider, id, patch)?))
}

#[utoipa::path(
    patch,
    path = "/api/custom-fields/{id}/",
    params(("id" = i64, Path, description = "Custom field id")),
    request_body = CustomFieldPatch,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom field updated", body = CustomFieldDefinition),
        (status = 400, description = "Blank or duplicate name, or unknown type"),
        (status = 404, description = "No such custom field for this provider")
    )
)]
#[axum::debug_handler]
pub async fn partial_update_custom_field(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<CustomFieldPatch>, JsonRejection>,
) -> RestResult<Json<CustomFieldDefinition>> {
    let id = record_id(id)?;
    let patch = json_body(body)?;
    Ok(Json(state.store.update_custom_field(&provider, id, patch)?))
}

#[utoipa::path(
    delete,
    path = "/api/custom-fields/{id}/",
    params(("id" = i64, Path, description = "Custom field id")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Custom field and its patient values deleted"),
        (status = 404, description = "No such custom field for this provider")
    )
)]
/// Delete a custom field. Every patient value recorded for it is deleted too.
#[axum::debug_handler]
pub async fn delete_custom_field(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    id: Result<Path<i64>, PathRejection>,
) -> RestResult<StatusCode> {
    let id = record_id(id)?;
    state.store.delete_custom_field(&provider, id)?;
    Ok(StatusCode::NO_CONTENT)
}
