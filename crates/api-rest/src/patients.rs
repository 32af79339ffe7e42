//! Handlers for `/api/patients/`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::{Extension, Json};
use carebook_core::model::{PaginatedPatientList, PatientCreate, PatientList, PatientUpdate};

use crate::error::RestResult;
use crate::extract::{json_body, record_id};
use crate::pagination::{collection_url, paginate, PageQuery};
use crate::store::Provider;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/patients/",
    params(PageQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "One page of the provider's patients", body = PaginatedPatientList),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Page out of range")
    )
)]
/// List the caller's patients, one page at a time.
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> RestResult<Json<PaginatedPatientList>> {
    let patients = state.store.list_patients(&provider);
    let base_url = collection_url(&headers, &uri);
    Ok(Json(paginate(patients, &query, state.config.page_size, &base_url)?))
}

#[utoipa::path(
    post,
    path = "/api/patients/",
    request_body = PatientCreate,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Patient created", body = PatientCreate),
        (status = 400, description = "Invalid patient, as a map of field to messages"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
/// Register a new patient together with its addresses and custom-field values.
#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    body: Result<Json<PatientCreate>, JsonRejection>,
) -> RestResult<(StatusCode, Json<PatientCreate>)> {
    let body = json_body(body)?;
    let (_, created) = state.store.create_patient(&provider, body)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}/",
    params(("id" = i64, Path, description = "Patient id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The patient", body = PatientList),
        (status = 404, description = "No such patient for this provider")
    )
)]
#[axum::debug_handler]
pub async fn retrieve_patient(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    id: Result<Path<i64>, PathRejection>,
) -> RestResult<Json<PatientList>> {
    let id = record_id(id)?;
    Ok(Json(state.store.get_patient(&provider, id)?))
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}/",
    params(("id" = i64, Path, description = "Patient id")),
    request_body = PatientCreate,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Patient replaced", body = PatientCreate),
        (status = 400, description = "Invalid patient"),
        (status = 404, description = "No such patient for this provider")
    )
)]
/// Replace every field of a patient, including its addresses and custom-field values.
#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PatientCreate>, JsonRejection>,
) -> RestResult<Json<PatientCreate>> {
    let id = record_id(id)?;
    let body = json_body(body)?;
    let updated = state
        .store
        .update_patient(&provider, id, PatientUpdate::from(body))?;
    Ok(Json(updated))
}

#[utoipa::path(
    patch,
    path = "/api/patients/{id}/",
    params(("id" = i64, Path, description = "Patient id")),
    request_body = PatientUpdate,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Patient updated", body = PatientCreate),
        (status = 400, description = "Invalid patient"),
        (status = 404, description = "No such patient for this provider")
    )
)]
/// Update the fields present in the body. Addresses and custom-field values are
/// replaced as a whole when given and kept otherwise.
#[axum::debug_handler]
pub async fn partial_update_patient(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PatientUpdate>, JsonRejection>,
) -> RestResult<Json<PatientCreate>> {
    let id = record_id(id)?;
    let patch = json_body(body)?;
    Ok(Json(state.store.update_patient(&provider, id, patch)?))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}/",
    params(("id" = i64, Path, description = "Patient id")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "No such patient for this provider")
    )
)]
#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    Extension(provider): Extension<Provider>,
    id: Result<Path<i64>, PathRejection>,
) -> RestResult<StatusCode> {
    let id = record_id(id)?;
    state.store.delete_patient(&provider, id)?;
    Ok(StatusCode::NO_CONTENT)
}
