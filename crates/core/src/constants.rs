/// Base URL used when `API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Collection paths, relative to the base URL.
pub const PATIENTS_PATH: &str = "/api/patients/";
pub const CUSTOM_FIELDS_PATH: &str = "/api/custom-fields/";

/// Message shown when a failure carries no usable description.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";
