//! Wire model for the patients and custom-fields resources.
//!
//! These types mirror the JSON exchanged with the backend. The read shapes
//! (`PatientList`, `AddressListed`, `CustomFieldValueListed`) carry server-derived
//! projections; the write shapes (`PatientCreate`, `PatientUpdate`, `AddressCreate`,
//! `CustomFieldValueCreate`) carry only what the client is allowed to set.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle stage of a patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatientStatus {
    Inquiry,
    Onboarding,
    Active,
    Churned,
}

impl PatientStatus {
    pub const ALL: [PatientStatus; 4] = [
        PatientStatus::Inquiry,
        PatientStatus::Onboarding,
        PatientStatus::Active,
        PatientStatus::Churned,
    ];

    /// Wire value, e.g. `"ACTIVE"`.
    pub fn as_str(self) -> &'static str {
        match self {
            PatientStatus::Inquiry => "INQUIRY",
            PatientStatus::Onboarding => "ONBOARDING",
            PatientStatus::Active => "ACTIVE",
            PatientStatus::Churned => "CHURNED",
        }
    }

    /// Human label used by the status facet.
    pub fn label(self) -> &'static str {
        match self {
            PatientStatus::Inquiry => "Inquiry",
            PatientStatus::Onboarding => "Onboarding",
            PatientStatus::Active => "Active",
            PatientStatus::Churned => "Churned",
        }
    }
}

impl std::fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    #[default]
    Home,
    Work,
}

/// Region codes accepted for an address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum UsState {
    #[default]
    Ca,
    Ny,
    Tx,
    Fl,
    Il,
    Ma,
    Wa,
}

impl UsState {
    pub const ALL: [UsState; 7] = [
        UsState::Ca,
        UsState::Ny,
        UsState::Tx,
        UsState::Fl,
        UsState::Il,
        UsState::Ma,
        UsState::Wa,
    ];

    /// Two-letter code as sent on the wire.
    pub fn code(self) -> &'static str {
        match self {
            UsState::Ca => "CA",
            UsState::Ny => "NY",
            UsState::Tx => "TX",
            UsState::Fl => "FL",
            UsState::Il => "IL",
            UsState::Ma => "MA",
            UsState::Wa => "WA",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UsState::Ca => "California",
            UsState::Ny => "New York",
            UsState::Tx => "Texas",
            UsState::Fl => "Florida",
            UsState::Il => "Illinois",
            UsState::Ma => "Massachusetts",
            UsState::Wa => "Washington",
        }
    }
}

// ============================================================================
// Custom fields
// ============================================================================

/// Value type of a custom field.
///
/// `Text` and `Number` are the types the backend offers today. Any other string is
/// kept verbatim in `Other` so that a newer backend cannot make the registry fail to
/// load; such fields are treated as text when submitting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomFieldType {
    Text,
    Number,
    Other(String),
}

impl CustomFieldType {
    pub fn as_str(&self) -> &str {
        match self {
            CustomFieldType::Text => "TEXT",
            CustomFieldType::Number => "NUMBER",
            CustomFieldType::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CustomFieldType::Text => "Text",
            CustomFieldType::Number => "Number",
            CustomFieldType::Other(raw) => raw,
        }
    }
}

impl From<String> for CustomFieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "TEXT" => CustomFieldType::Text,
            "NUMBER" => CustomFieldType::Number,
            _ => CustomFieldType::Other(value),
        }
    }
}

impl From<CustomFieldType> for String {
    fn from(value: CustomFieldType) -> Self {
        match value {
            CustomFieldType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for CustomFieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server-defined extra attribute that can be attached to a patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomFieldDefinition {
    pub id: i64,
    pub name: String,
    #[schema(value_type = String, example = "TEXT")]
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomFieldCreate {
    pub name: String,
    #[schema(value_type = String, example = "NUMBER")]
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomFieldPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub field_type: Option<CustomFieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A custom-field value as written by the client, keyed by definition id.
///
/// Exactly one of the two slots is expected to be populated, chosen by the type of
/// the owning definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomFieldValueCreate {
    pub custom_field: i64,
    #[serde(default)]
    pub text_value: Option<String>,
    #[serde(default)]
    pub number_value: Option<String>,
}

/// A scalar as reported by the list endpoint: numbers may arrive as JSON numbers or
/// as decimal strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListedValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for ListedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListedValue::Number(n) => write!(f, "{n}"),
            ListedValue::Text(s) => f.write_str(s),
        }
    }
}

/// A custom-field value as read back, keyed by definition name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomFieldValueListed {
    pub custom_field: String,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub value: Option<ListedValue>,
}

// ============================================================================
// Addresses and patients
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddressCreate {
    pub address_type: AddressType,
    pub street_address: String,
    pub city: String,
    pub state: UsState,
    pub postal_code: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddressListed {
    pub address_type: AddressType,
    pub street_address: String,
    pub city: String,
    pub state: UsState,
    pub postal_code: String,
    pub full_address: String,
    pub is_primary: bool,
}

impl AddressListed {
    /// Builds the read projection of a stored address.
    pub fn from_create(address: AddressCreate) -> Self {
        let full_address = full_address(
            &address.street_address,
            &address.city,
            address.state,
            &address.postal_code,
        );
        Self {
            address_type: address.address_type,
            street_address: address.street_address,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            full_address,
            is_primary: address.is_primary,
        }
    }
}

/// Body of `POST /api/patients/` and `PUT /api/patients/{id}/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientCreate {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[schema(value_type = String, format = Date, example = "1990-03-03")]
    pub date_of_birth: NaiveDate,
    pub status: PatientStatus,
    pub addresses: Vec<AddressCreate>,
    #[serde(default)]
    pub custom_field_values: Vec<CustomFieldValueCreate>,
}

/// Body of `PATCH /api/patients/{id}/`; absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PatientStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<AddressCreate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_field_values: Option<Vec<CustomFieldValueCreate>>,
}

/// A full replacement expressed as a patch. The middle name is always sent, so an
/// absent one clears the stored value.
impl From<PatientCreate> for PatientUpdate {
    fn from(value: PatientCreate) -> Self {
        Self {
            first_name: Some(value.first_name),
            middle_name: Some(value.middle_name.unwrap_or_default()),
            last_name: Some(value.last_name),
            date_of_birth: Some(value.date_of_birth),
            status: Some(value.status),
            addresses: Some(value.addresses),
            custom_field_values: Some(value.custom_field_values),
        }
    }
}

/// A patient as returned by the list and retrieve endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientList {
    pub id: i64,
    pub full_name: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[schema(value_type = String, format = Date)]
    pub date_of_birth: NaiveDate,
    pub status: PatientStatus,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    pub addresses: Vec<AddressListed>,
    #[serde(default)]
    pub custom_field_values: Vec<CustomFieldValueListed>,
}

impl PatientList {
    /// The first address flagged primary, if any.
    pub fn primary_address(&self) -> Option<&AddressListed> {
        self.addresses.iter().find(|a| a.is_primary)
    }
}

/// One page of a paginated collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(
    PaginatedPatientList = Paginated<PatientList>,
    PaginatedCustomFieldList = Paginated<CustomFieldDefinition>
)]
pub struct Paginated<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

// ============================================================================
// Projections
// ============================================================================

/// `"first middle last"`, or `"first last"` when there is no middle name.
pub fn full_name(first_name: &str, middle_name: Option<&str>, last_name: &str) -> String {
    match middle_name.filter(|m| !m.is_empty()) {
        Some(middle) => format!("{first_name} {middle} {last_name}"),
        None => format!("{first_name} {last_name}"),
    }
}

/// `"street, city, ST postal"`.
pub fn full_address(street_address: &str, city: &str, state: UsState, postal_code: &str) -> String {
    format!("{street_address}, {city}, {} {postal_code}", state.code())
}

/// Calendar-date wire format (`yyyy-MM-dd`).
pub fn format_date_of_birth(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
