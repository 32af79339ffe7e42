//! # Carebook Client
//!
//! HTTP implementation of the [`PatientsApi`] and [`CustomFieldsApi`] traits.
//!
//! Every request carries `Authorization: Bearer <token>` from the caller's
//! [`Session`]. Non-2xx responses become [`ApiError::Status`] with the most useful
//! message the body offers: a `detail` string, else the first field error, else the
//! HTTP reason phrase.

#![warn(rust_2018_idioms)]

use std::time::Duration;

use api_shared::bearer_header_value;
use carebook_core::config::api_config_from_env_value;
use carebook_core::constants::{CUSTOM_FIELDS_PATH, PATIENTS_PATH, UNKNOWN_ERROR_MESSAGE};
use carebook_core::model::{
    CustomFieldCreate, CustomFieldDefinition, CustomFieldPatch, Paginated, PatientCreate,
    PatientList, PatientUpdate,
};
use carebook_core::{
    ApiConfig, ApiError, ApiResult, CoreResult, CustomFieldsApi, PatientsApi, Session,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the patients API rooted at an [`ApiConfig`] base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the TLS backend cannot be initialised.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("carebook-client/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self { http, config })
    }

    /// Client for the URL in `API_URL`, or the localhost fallback.
    pub fn from_env() -> CoreResult<Self> {
        let config = api_config_from_env_value(std::env::var("API_URL").ok())?;
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, session: &Session, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.config.url(path))
            .header(AUTHORIZATION, bearer_header_value(session.access_token()))
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_owned();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::warn!(status = status.as_u16(), %url, %message, "API request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        self.send(request).await.map(|_| ())
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

fn record_path(collection: &str, id: i64) -> String {
    format!("{collection}{id}/")
}

fn with_page(request: RequestBuilder, page: Option<u32>) -> RequestBuilder {
    match page {
        Some(page) => request.query(&[("page", page)]),
        None => request,
    }
}

/// Picks the message to show for a failed response body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(detail)) = map.get("detail") {
            return detail.clone();
        }
        if let Some(message) = map.values().find_map(first_message) {
            return message.to_owned();
        }
    }
    status
        .canonical_reason()
        .unwrap_or(UNKNOWN_ERROR_MESSAGE)
        .to_owned()
}

/// First string in a field-error value. Nested serializers report errors as lists
/// of per-item maps, e.g. `{"addresses": [{}, {"city": ["..."]}]}`.
fn first_message(value: &Value) -> Option<&str> {
    match value {
        Value::String(message) => Some(message.as_str()),
        Value::Array(items) => items.iter().find_map(first_message),
        Value::Object(fields) => fields.values().find_map(first_message),
        _ => None,
    }
}

impl PatientsApi for ApiClient {
    async fn list_patients(
        &self,
        session: &Session,
        page: Option<u32>,
    ) -> ApiResult<Paginated<PatientList>> {
        let request = with_page(self.request(Method::GET, session, PATIENTS_PATH), page);
        self.send_json(request).await
    }

    async fn create_patient(
        &self,
        session: &Session,
        body: &PatientCreate,
    ) -> ApiResult<PatientCreate> {
        let request = self.request(Method::POST, session, PATIENTS_PATH).json(body);
        self.send_json(request).await
    }

    async fn retrieve_patient(&self, session: &Session, id: i64) -> ApiResult<PatientList> {
        let path = record_path(PATIENTS_PATH, id);
        self.send_json(self.request(Method::GET, session, &path)).await
    }

    async fn update_patient(
        &self,
        session: &Session,
        id: i64,
        body: &PatientCreate,
    ) -> ApiResult<PatientCreate> {
        let path = record_path(PATIENTS_PATH, id);
        let request = self.request(Method::PUT, session, &path).json(body);
        self.send_json(request).await
    }

    async fn partial_update_patient(
        &self,
        session: &Session,
        id: i64,
        body: &PatientUpdate,
    ) -> ApiResult<PatientCreate> {
        let path = record_path(PATIENTS_PATH, id);
        let request = self.request(Method::PATCH, session, &path).json(body);
        self.send_json(request).await
    }

    async fn delete_patient(&self, session: &Session, id: i64) -> ApiResult<()> {
        let path = record_path(PATIENTS_PATH, id);
        self.send_empty(self.request(Method::DELETE, session, &path)).await
    }
}

impl CustomFieldsApi for ApiClient {
    async fn list_custom_fields(
        &self,
        session: &Session,
        page: Option<u32>,
    ) -> ApiResult<Paginated<CustomFieldDefinition>> {
        let request = with_page(self.request(Method::GET, session, CUSTOM_FIELDS_PATH), page);
        self.send_json(request).await
    }

    async fn create_custom_field(
        &self,
        session: &Session,
        body: &CustomFieldCreate,
    ) -> ApiResult<CustomFieldDefinition> {
        let request = self.request(Method::POST, session, CUSTOM_FIELDS_PATH).json(body);
        self.send_json(request).await
    }

    async fn retrieve_custom_field(
        &self,
        session: &Session,
        id: i64,
    ) -> ApiResult<CustomFieldDefinition> {
        let path = record_path(CUSTOM_FIELDS_PATH, id);
        self.send_json(self.request(Method::GET, session, &path)).await
    }

    async fn update_custom_field(
        &self,
        session: &Session,
        id: i64,
        body: &CustomFieldCreate,
    ) -> ApiResult<CustomFieldDefinition> {
        let path = record_path(CUSTOM_FIELDS_PATH, id);
        let request = self.request(Method::PUT, session, &path).json(body);
        self.send_json(request).await
    }

    async fn partial_update_custom_field(
        &self,
        session: &Session,
        id: i64,
        body: &CustomFieldPatch,
    ) -> ApiResult<CustomFieldDefinition> {
        let path = record_path(CUSTOM_FIELDS_PATH, id);
        let request = self.request(Method::PATCH, session, &path).json(body);
        self.send_json(request).await
    }

    async fn delete_custom_field(&self, session: &Session, id: i64) -> ApiResult<()> {
        let path = record_path(CUSTOM_FIELDS_PATH, id);
        self.send_empty(self.request(Method::DELETE, session, &path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_detail() {
        let message = error_message(StatusCode::UNAUTHORIZED, r#"{"detail":"Invalid token."}"#);
        assert_eq!(message, "Invalid token.");
    }

    #[test]
    fn test_error_message_uses_first_field_error() {
        let body = r#"{"addresses":["At least one address is required."]}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "At least one address is required."
        );
    }

    #[test]
    fn test_error_message_finds_nested_field_errors() {
        let body = r#"{"addresses":[{},{"city":["This field may not be blank."]}]}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "This field may not be blank."
        );
    }

    #[test]
    fn test_error_message_falls_back_to_reason() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            "Internal Server Error"
        );
        assert_eq!(error_message(StatusCode::NOT_FOUND, "{}"), "Not Found");
    }

    #[test]
    fn test_record_path_appends_id_and_slash() {
        assert_eq!(record_path(PATIENTS_PATH, 7), "/api/patients/7/");
    }
}
