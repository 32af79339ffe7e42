//! # Carebook Core
//!
//! Client-side logic for the carebook patient records application.
//!
//! This crate holds everything between the HTTP client and the screens:
//! - The wire model of patients and custom fields
//! - The custom-field registry and the form schema generated from it
//! - The patient form and custom-field dialog controllers
//! - Table presentation of a patient page
//! - A query cache and toast queue, passed explicitly through [`AppContext`]
//!
//! **No transport concerns**: the HTTP implementation of [`PatientsApi`] and
//! [`CustomFieldsApi`] lives in `carebook-client`, the server in `api-rest`.

pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod context;
pub mod custom_fields;
pub mod directory;
pub mod error;
pub mod form;
pub mod model;
pub mod registry;
pub mod schema;
pub mod table;
pub mod toast;

#[cfg(test)]
mod test_support;

pub use api::{ApiError, ApiResult, CustomFieldsApi, PatientsApi, Session};
pub use cache::{QueryCache, QueryKey};
pub use config::ApiConfig;
pub use context::AppContext;
pub use error::{CoreError, CoreResult};
pub use form::{FormMode, PatientForm, SubmitOutcome};
pub use registry::CustomFieldRegistry;
pub use schema::{FormSchema, SchemaOptions};
pub use toast::{Toast, ToastQueue, Toaster};
