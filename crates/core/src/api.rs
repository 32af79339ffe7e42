//! Seams to the patients HTTP API.
//!
//! The traits describe the operations of the `patients` and `custom-fields`
//! resources. `carebook-client` implements them over HTTP; tests substitute
//! in-memory fakes. Every call carries the caller's [`Session`].

use std::future::Future;

use crate::constants::UNKNOWN_ERROR_MESSAGE;
use crate::model::{
    CustomFieldCreate, CustomFieldDefinition, CustomFieldPatch, Paginated, PatientCreate,
    PatientList, PatientUpdate,
};

/// Bearer credentials for the signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Failure of a single API call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("{0}")]
    Transport(String),
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The text shown to the user: the underlying message when there is one, a generic
    /// message otherwise.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_owned()
        } else {
            message
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Operations on `/api/patients/`.
pub trait PatientsApi: Send + Sync {
    fn list_patients(
        &self,
        session: &Session,
        page: Option<u32>,
    ) -> impl Future<Output = ApiResult<Paginated<PatientList>>> + Send;

    fn create_patient(
        &self,
        session: &Session,
        body: &PatientCreate,
    ) -> impl Future<Output = ApiResult<PatientCreate>> + Send;

    fn retrieve_patient(
        &self,
        session: &Session,
        id: i64,
    ) -> impl Future<Output = ApiResult<PatientList>> + Send;

    fn update_patient(
        &self,
        session: &Session,
        id: i64,
        body: &PatientCreate,
    ) -> impl Future<Output = ApiResult<PatientCreate>> + Send;

    fn partial_update_patient(
        &self,
        session: &Session,
        id: i64,
        body: &PatientUpdate,
    ) -> impl Future<Output = ApiResult<PatientCreate>> + Send;

    fn delete_patient(
        &self,
        session: &Session,
        id: i64,
    ) -> impl Future<Output = ApiResult<()>> + Send;
}

/// Operations on `/api/custom-fields/`.
pub trait CustomFieldsApi: Send + Sync {
    fn list_custom_fields(
        &self,
        session: &Session,
        page: Option<u32>,
    ) -> impl Future<Output = ApiResult<Paginated<CustomFieldDefinition>>> + Send;

    fn create_custom_field(
        &self,
        session: &Session,
        body: &CustomFieldCreate,
    ) -> impl Future<Output = ApiResult<CustomFieldDefinition>> + Send;

    fn retrieve_custom_field(
        &self,
        session: &Session,
        id: i64,
    ) -> impl Future<Output = ApiResult<CustomFieldDefinition>> + Send;

    fn update_custom_field(
        &self,
        session: &Session,
        id: i64,
        body: &CustomFieldCreate,
    ) -> impl Future<Output = ApiResult<CustomFieldDefinition>> + Send;

    fn partial_update_custom_field(
        &self,
        session: &Session,
        id: i64,
        body: &CustomFieldPatch,
    ) -> impl Future<Output = ApiResult<CustomFieldDefinition>> + Send;

    fn delete_custom_field(
        &self,
        session: &Session,
        id: i64,
    ) -> impl Future<Output = ApiResult<()>> + Send;
}

/// Fetches every page of the custom-field collection.
///
/// # Errors
///
/// Returns the first `ApiError` encountered; no partial list is returned.
pub async fn list_all_custom_fields<A: CustomFieldsApi>(
    api: &A,
    session: &Session,
) -> ApiResult<Vec<CustomFieldDefinition>> {
    let mut definitions = Vec::new();
    let mut page = 1u32;
    loop {
        let batch = api.list_custom_fields(session, Some(page)).await?;
        definitions.extend(batch.results);
        if batch.next.is_none() {
            break;
        }
        page += 1;
    }
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_falls_back_to_generic_text() {
        let err = ApiError::Transport(String::new());
        assert_eq!(err.user_message(), UNKNOWN_ERROR_MESSAGE);

        let err = ApiError::Status {
            status: 400,
            message: "At least one address is required.".into(),
        };
        assert_eq!(err.user_message(), "At least one address is required.");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_session_debug_hides_token() {
        let session = Session::new("secret-token");
        assert!(!format!("{session:?}").contains("secret-token"));
    }
}
