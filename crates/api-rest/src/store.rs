//! In-memory, provider-scoped storage for patients and custom fields.
//!
//! Every record belongs to the provider that created it and is invisible to every
//! other provider. Input is validated here, before anything is stored, so a rejected
//! write never leaves partial state behind.

use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use carebook_core::model::{
    full_name, AddressCreate, AddressListed, CustomFieldCreate, CustomFieldDefinition,
    CustomFieldPatch, CustomFieldType, CustomFieldValueCreate, CustomFieldValueListed,
    ListedValue, PatientCreate, PatientList, PatientStatus, PatientUpdate,
};
use carebook_types::{NonEmptyText, TextError};
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{FieldErrors, RestError, RestResult};

const NAME_MAX: usize = 100;
const STREET_MAX: usize = 255;
const CITY_MAX: usize = 100;
const POSTAL_CODE_MAX: usize = 20;
/// Largest magnitude a stored number may have (15 digits, 2 of them decimals).
const NUMBER_MAX_DIGITS: usize = 15;
const NUMBER_DECIMAL_PLACES: usize = 2;

/// Owner of a set of records, resolved from the bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Provider(String);

impl Provider {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug)]
struct StoredField {
    provider: Provider,
    definition: CustomFieldDefinition,
}

#[derive(Clone, Debug)]
struct StoredValue {
    field_id: i64,
    text_value: Option<String>,
    /// Normalised to two decimals.
    number_value: Option<String>,
}

#[derive(Clone, Debug)]
struct StoredPatient {
    provider: Provider,
    first_name: String,
    middle_name: Option<String>,
    last_name: String,
    date_of_birth: NaiveDate,
    status: PatientStatus,
    created_at: DateTime<Utc>,
    addresses: Vec<AddressCreate>,
    values: Vec<StoredValue>,
}

#[derive(Default)]
struct Tables {
    next_patient_id: i64,
    next_field_id: i64,
    patients: BTreeMap<i64, StoredPatient>,
    fields: BTreeMap<i64, StoredField>,
}

impl Tables {
    fn field(&self, provider: &Provider, id: i64) -> Option<&StoredField> {
        self.fields.get(&id).filter(|f| &f.provider == provider)
    }

    fn patient(&self, provider: &Provider, id: i64) -> Option<&StoredPatient> {
        self.patients.get(&id).filter(|p| &p.provider == provider)
    }

    fn listed(&self, id: i64, patient: &StoredPatient) -> PatientList {
        PatientList {
            id,
            full_name: full_name(
                &patient.first_name,
                patient.middle_name.as_deref(),
                &patient.last_name,
            ),
            first_name: patient.first_name.clone(),
            middle_name: patient.middle_name.clone(),
            last_name: patient.last_name.clone(),
            date_of_birth: patient.date_of_birth,
            status: patient.status,
            created_at: patient.created_at,
            addresses: patient
                .addresses
                .iter()
                .cloned()
                .map(AddressListed::from_create)
                .collect(),
            custom_field_values: patient
                .values
                .iter()
                .filter_map(|value| {
                    let field = self.fields.get(&value.field_id)?;
                    let shown = match field.definition.field_type {
                        CustomFieldType::Number => value.number_value.clone(),
                        _ => value.text_value.clone(),
                    };
                    Some(CustomFieldValueListed {
                        custom_field: field.definition.name.clone(),
                        value: shown.map(ListedValue::Text),
                    })
                })
                .collect(),
        }
    }

    fn write_shape(patient: &StoredPatient) -> PatientCreate {
        PatientCreate {
            first_name: patient.first_name.clone(),
            middle_name: patient.middle_name.clone(),
            last_name: patient.last_name.clone(),
            date_of_birth: patient.date_of_birth,
            status: patient.status,
            addresses: patient.addresses.clone(),
            custom_field_values: patient
                .values
                .iter()
                .map(|v| CustomFieldValueCreate {
                    custom_field: v.field_id,
                    text_value: v.text_value.clone(),
                    number_value: v.number_value.clone(),
                })
                .collect(),
        }
    }
}

/// Shared record store; cheap to share behind an `Arc`.
#[derive(Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------------
    // Custom fields
    // ------------------------------------------------------------------------

    pub fn list_custom_fields(&self, provider: &Provider) -> Vec<CustomFieldDefinition> {
        self.read()
            .fields
            .values()
            .filter(|f| &f.provider == provider)
            .map(|f| f.definition.clone())
            .collect()
    }

    pub fn get_custom_field(&self, provider: &Provider, id: i64) -> RestResult<CustomFieldDefinition> {
        self.read()
            .field(provider, id)
            .map(|f| f.definition.clone())
            .ok_or(RestError::NotFound)
    }

    pub fn create_custom_field(
        &self,
        provider: &Provider,
        body: CustomFieldCreate,
    ) -> RestResult<CustomFieldDefinition> {
        let mut tables = self.write();
        let (name, field_type, description) =
            check_field(&tables, provider, None, &body.name, &body.field_type, body.description)?;

        tables.next_field_id += 1;
        let definition = CustomFieldDefinition {
            id: tables.next_field_id,
            name,
            field_type,
            description,
        };
        tables.fields.insert(
            definition.id,
            StoredField {
                provider: provider.clone(),
                definition: definition.clone(),
            },
        );
        tracing::info!(%provider, id = definition.id, name = %definition.name, "custom field created");
        Ok(definition)
    }

    /// Applies `patch`; absent fields keep their stored value.
    pub fn update_custom_field(
        &self,
        provider: &Provider,
        id: i64,
        patch: CustomFieldPatch,
    ) -> RestResult<CustomFieldDefinition> {
        let mut tables = self.write();
        let current = tables
            .field(provider, id)
            .map(|f| f.definition.clone())
            .ok_or(RestError::NotFound)?;

        let name = patch.name.unwrap_or(current.name);
        let field_type = patch.field_type.unwrap_or(current.field_type);
        let description = match patch.description {
            Some(description) => Some(description),
            None => current.description,
        };
        let (name, field_type, description) =
            check_field(&tables, provider, Some(id), &name, &field_type, description)?;

        let definition = CustomFieldDefinition {
            id,
            name,
            field_type,
            description,
        };
        if let Some(stored) = tables.fields.get_mut(&id) {
            stored.definition = definition.clone();
        }
        Ok(definition)
    }

    /// Deletes the definition together with every patient value that uses it.
    pub fn delete_custom_field(&self, provider: &Provider, id: i64) -> RestResult<()> {
        let mut tables = self.write();
        if tables.field(provider, id).is_none() {
            return Err(RestError::NotFound);
        }
        tables.fields.remove(&id);
        let mut cascaded = 0usize;
        for patient in tables.patients.values_mut() {
            let before = patient.values.len();
            patient.values.retain(|v| v.field_id != id);
            cascaded += before - patient.values.len();
        }
        tracing::info!(%provider, id, cascaded, "custom field deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Patients
    // ------------------------------------------------------------------------

    pub fn list_patients(&self, provider: &Provider) -> Vec<PatientList> {
        let tables = self.read();
        tables
            .patients
            .iter()
            .filter(|(_, p)| &p.provider == provider)
            .map(|(id, p)| tables.listed(*id, p))
            .collect()
    }

    pub fn get_patient(&self, provider: &Provider, id: i64) -> RestResult<PatientList> {
        let tables = self.read();
        let patient = tables.patient(provider, id).ok_or(RestError::NotFound)?;
        Ok(tables.listed(id, patient))
    }

    pub fn create_patient(&self, provider: &Provider, body: PatientCreate) -> RestResult<(i64, PatientCreate)> {
        self.create_patient_at(provider, body, Utc::now())
    }

    pub(crate) fn create_patient_at(
        &self,
        provider: &Provider,
        body: PatientCreate,
        created_at: DateTime<Utc>,
    ) -> RestResult<(i64, PatientCreate)> {
        let mut tables = self.write();
        let mut errors = FieldErrors::new();
        let first_name = check_name(&mut errors, "first_name", &body.first_name);
        let middle_name = check_middle_name(&mut errors, body.middle_name.as_deref());
        let last_name = check_name(&mut errors, "last_name", &body.last_name);
        let addresses = check_addresses(&mut errors, body.addresses);
        let values = check_values(&mut errors, &tables, provider, &body.custom_field_values);
        errors.into_result()?;

        let patient = StoredPatient {
            provider: provider.clone(),
            first_name,
            middle_name,
            last_name,
            date_of_birth: body.date_of_birth,
            status: body.status,
            created_at,
            addresses,
            values,
        };
        tables.next_patient_id += 1;
        let id = tables.next_patient_id;
        let shape = Tables::write_shape(&patient);
        tables.patients.insert(id, patient);
        tracing::info!(%provider, id, "patient created");
        Ok((id, shape))
    }

    /// Applies `patch`. Addresses and custom-field values are replaced only when present.
    pub fn update_patient(
        &self,
        provider: &Provider,
        id: i64,
        patch: PatientUpdate,
    ) -> RestResult<PatientCreate> {
        let mut tables = self.write();
        let mut patient = tables
            .patient(provider, id)
            .cloned()
            .ok_or(RestError::NotFound)?;

        let mut errors = FieldErrors::new();
        if let Some(first_name) = &patch.first_name {
            patient.first_name = check_name(&mut errors, "first_name", first_name);
        }
        if let Some(middle_name) = &patch.middle_name {
            patient.middle_name = check_middle_name(&mut errors, Some(middle_name));
        }
        if let Some(last_name) = &patch.last_name {
            patient.last_name = check_name(&mut errors, "last_name", last_name);
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            patient.date_of_birth = date_of_birth;
        }
        if let Some(status) = patch.status {
            patient.status = status;
        }
        if let Some(addresses) = patch.addresses {
            patient.addresses = check_addresses(&mut errors, addresses);
        }
        if let Some(values) = &patch.custom_field_values {
            patient.values = check_values(&mut errors, &tables, provider, values);
        }
        errors.into_result()?;

        let shape = Tables::write_shape(&patient);
        tables.patients.insert(id, patient);
        tracing::info!(%provider, id, "patient updated");
        Ok(shape)
    }

    pub fn delete_patient(&self, provider: &Provider, id: i64) -> RestResult<()> {
        let mut tables = self.write();
        if tables.patient(provider, id).is_none() {
            return Err(RestError::NotFound);
        }
        tables.patients.remove(&id);
        tracing::info!(%provider, id, "patient deleted");
        Ok(())
    }
}

// ============================================================================
// Validation
// ============================================================================

fn text_message(err: &TextError) -> String {
    match err {
        TextError::Empty => "This field may not be blank.".into(),
        TextError::TooLong { max } => format!("Ensure this field has no more than {max} characters."),
    }
}

fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> String {
    match NonEmptyText::bounded(value, max) {
        Ok(text) => text.into_inner(),
        Err(err) => {
            errors.add(field, text_message(&err));
            String::new()
        }
    }
}

fn check_name(errors: &mut FieldErrors, field: &str, value: &str) -> String {
    check_text(errors, field, value, NAME_MAX)
}

fn check_middle_name(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    Some(check_text(errors, "middle_name", value, NAME_MAX))
}

fn check_addresses(errors: &mut FieldErrors, addresses: Vec<AddressCreate>) -> Vec<AddressCreate> {
    if addresses.is_empty() {
        errors.add("addresses", "At least one address is required.");
    }
    addresses
        .into_iter()
        .enumerate()
        .map(|(index, address)| {
            let path = |field: &str| format!("addresses.{index}.{field}");
            AddressCreate {
                street_address: check_text(
                    errors,
                    &path("street_address"),
                    &address.street_address,
                    STREET_MAX,
                ),
                city: check_text(errors, &path("city"), &address.city, CITY_MAX),
                postal_code: check_text(
                    errors,
                    &path("postal_code"),
                    &address.postal_code,
                    POSTAL_CODE_MAX,
                ),
                ..address
            }
        })
        .collect()
}

fn check_values(
    errors: &mut FieldErrors,
    tables: &Tables,
    provider: &Provider,
    values: &[CustomFieldValueCreate],
) -> Vec<StoredValue> {
    const FIELD: &str = "custom_field_values";
    let mut seen = HashSet::new();
    let mut stored = Vec::with_capacity(values.len());

    for value in values {
        let Some(field) = tables.field(provider, value.custom_field) else {
            errors.add(
                FIELD,
                format!("Invalid pk \"{}\" - object does not exist.", value.custom_field),
            );
            continue;
        };
        if !seen.insert(value.custom_field) {
            errors.add(
                FIELD,
                format!("\"{}\" can only be set once per patient.", field.definition.name),
            );
            continue;
        }

        let text = value.text_value.as_deref().filter(|t| !t.is_empty());
        let number = value.number_value.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let name = &field.definition.name;

        match &field.definition.field_type {
            CustomFieldType::Number => {
                if text.is_some() {
                    errors.add(FIELD, format!("{name}: Text value should be null for number custom fields."));
                    continue;
                }
                let Some(raw) = number else {
                    errors.add(FIELD, format!("{name}: Number value is required for number custom fields."));
                    continue;
                };
                match normalise_number(raw) {
                    Ok(number) => stored.push(StoredValue {
                        field_id: value.custom_field,
                        text_value: None,
                        number_value: Some(number),
                    }),
                    Err(message) => errors.add(FIELD, format!("{name}: {message}")),
                }
            }
            _ => {
                if number.is_some() {
                    errors.add(FIELD, format!("{name}: Number value should be null for text custom fields."));
                    continue;
                }
                let Some(text) = text else {
                    errors.add(FIELD, format!("{name}: Text value is required for text custom fields."));
                    continue;
                };
                stored.push(StoredValue {
                    field_id: value.custom_field,
                    text_value: Some(text.to_owned()),
                    number_value: None,
                });
            }
        }
    }
    stored
}

/// Parses a decimal and renders it with exactly two decimals.
fn normalise_number(raw: &str) -> Result<String, String> {
    const INVALID: &str = "A valid number is required.";

    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(INVALID.into());
    }

    let whole = whole.trim_start_matches('0');
    if whole.len() + fraction.len() > NUMBER_MAX_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {NUMBER_MAX_DIGITS} digits in total."
        ));
    }
    if fraction.len() > NUMBER_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {NUMBER_DECIMAL_PLACES} decimal places."
        ));
    }
    let whole_max = NUMBER_MAX_DIGITS - NUMBER_DECIMAL_PLACES;
    if whole.len() > whole_max {
        return Err(format!(
            "Ensure that there are no more than {whole_max} digits before the decimal point."
        ));
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let is_zero = whole == "0" && fraction.bytes().all(|b| b == b'0');
    let sign = if negative && !is_zero { "-" } else { "" };
    Ok(format!("{sign}{whole}.{fraction:0<width$}", width = NUMBER_DECIMAL_PLACES))
}

/// Validates a custom-field definition. `existing` is the id being updated, if any.
fn check_field(
    tables: &Tables,
    provider: &Provider,
    existing: Option<i64>,
    name: &str,
    field_type: &CustomFieldType,
    description: Option<String>,
) -> RestResult<(String, CustomFieldType, Option<String>)> {
    let mut errors = FieldErrors::new();
    let name = check_text(&mut errors, "name", name, NAME_MAX);

    let taken = tables.fields.iter().any(|(id, f)| {
        &f.provider == provider && Some(*id) != existing && f.definition.name == name
    });
    if !name.is_empty() && taken {
        errors.add("name", "custom field with this name already exists.");
    }
    if let CustomFieldType::Other(raw) = field_type {
        errors.add("field_type", format!("\"{raw}\" is not a valid choice."));
    }
    errors.into_result()?;

    let description = description.filter(|d| !d.trim().is_empty());
    Ok((name, field_type.clone(), description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use carebook_core::model::{AddressType, UsState};

    fn provider() -> Provider {
        Provider::new("clinic-a")
    }

    fn address() -> AddressCreate {
        AddressCreate {
            address_type: AddressType::Home,
            street_address: "1 Main St".into(),
            city: "Austin".into(),
            state: UsState::Tx,
            postal_code: "73301".into(),
            is_primary: true,
        }
    }

    fn patient(values: Vec<CustomFieldValueCreate>) -> PatientCreate {
        PatientCreate {
            first_name: "Ada".into(),
            middle_name: Some("King".into()),
            last_name: "Lovelace".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 3, 3).unwrap(),
            status: PatientStatus::Active,
            addresses: vec![address()],
            custom_field_values: values,
        }
    }

    fn field(store: &Store, name: &str, field_type: CustomFieldType) -> i64 {
        store
            .create_custom_field(
                &provider(),
                CustomFieldCreate {
                    name: name.into(),
                    field_type,
                    description: None,
                },
            )
            .expect("field should be created")
            .id
    }

    fn validation(err: RestError) -> FieldErrors {
        match err {
            RestError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_field_names_are_unique_per_provider() {
        let store = Store::new();
        field(&store, "Referred By", CustomFieldType::Text);

        let err = store
            .create_custom_field(
                &provider(),
                CustomFieldCreate {
                    name: "Referred By".into(),
                    field_type: CustomFieldType::Number,
                    description: None,
                },
            )
            .expect_err("duplicate name");
        assert_eq!(
            validation(err).messages("name"),
            &["custom field with this name already exists.".to_string()]
        );

        let other = Provider::new("clinic-b");
        assert!(store
            .create_custom_field(
                &other,
                CustomFieldCreate {
                    name: "Referred By".into(),
                    field_type: CustomFieldType::Text,
                    description: Some(String::new()),
                },
            )
            .is_ok());
        assert_eq!(store.list_custom_fields(&provider()).len(), 1);
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        let store = Store::new();
        let err = store
            .create_custom_field(
                &provider(),
                CustomFieldCreate {
                    name: "Since".into(),
                    field_type: CustomFieldType::Other("DATE".into()),
                    description: None,
                },
            )
            .expect_err("DATE is not offered");
        assert_eq!(
            validation(err).messages("field_type"),
            &["\"DATE\" is not a valid choice.".to_string()]
        );
    }

    #[test]
    fn test_values_are_stored_in_the_matching_slot() {
        let store = Store::new();
        let referred = field(&store, "Referred By", CustomFieldType::Text);
        let visits = field(&store, "Visits", CustomFieldType::Number);

        let (id, shape) = store
            .create_patient(
                &provider(),
                patient(vec![
                    CustomFieldValueCreate {
                        custom_field: referred,
                        text_value: Some("Dr. Who".into()),
                        number_value: None,
                    },
                    CustomFieldValueCreate {
                        custom_field: visits,
                        text_value: Some(String::new()),
                        number_value: Some("42".into()),
                    },
                ]),
            )
            .expect("patient should be created");
        assert_eq!(shape.custom_field_values[1].number_value.as_deref(), Some("42.00"));

        let listed = store.get_patient(&provider(), id).unwrap();
        assert_eq!(listed.full_name, "Ada King Lovelace");
        assert_eq!(listed.addresses[0].full_address, "1 Main St, Austin, TX 73301");
        assert_eq!(
            listed.custom_field_values,
            vec![
                CustomFieldValueListed {
                    custom_field: "Referred By".into(),
                    value: Some(ListedValue::Text("Dr. Who".into())),
                },
                CustomFieldValueListed {
                    custom_field: "Visits".into(),
                    value: Some(ListedValue::Text("42.00".into())),
                },
            ]
        );
    }

    #[test]
    fn test_value_rules() {
        let store = Store::new();
        let referred = field(&store, "Referred By", CustomFieldType::Text);
        let visits = field(&store, "Visits", CustomFieldType::Number);
        let value = |custom_field, text: Option<&str>, number: Option<&str>| CustomFieldValueCreate {
            custom_field,
            text_value: text.map(str::to_owned),
            number_value: number.map(str::to_owned),
        };

        let cases = [
            (value(referred, None, None), "Referred By: Text value is required for text custom fields."),
            (value(referred, Some("x"), Some("1")), "Referred By: Number value should be null for text custom fields."),
            (value(visits, None, None), "Visits: Number value is required for number custom fields."),
            (value(visits, Some("x"), Some("1")), "Visits: Text value should be null for number custom fields."),
            (value(visits, None, Some("many")), "Visits: A valid number is required."),
            (value(99, Some("x"), None), "Invalid pk \"99\" - object does not exist."),
        ];
        for (value, expected) in cases {
            let err = store
                .create_patient(&provider(), patient(vec![value]))
                .expect_err(expected);
            assert_eq!(
                validation(err).messages("custom_field_values"),
                &[expected.to_string()]
            );
        }

        let err = store
            .create_patient(
                &provider(),
                patient(vec![value(referred, Some("a"), None), value(referred, Some("b"), None)]),
            )
            .expect_err("duplicate value");
        assert_eq!(
            validation(err).messages("custom_field_values"),
            &["\"Referred By\" can only be set once per patient.".to_string()]
        );
        assert!(store.list_patients(&provider()).is_empty());
    }

    #[test]
    fn test_fields_of_other_providers_cannot_be_referenced() {
        let store = Store::new();
        let referred = field(&store, "Referred By", CustomFieldType::Text);
        let err = store
            .create_patient(
                &Provider::new("clinic-b"),
                patient(vec![CustomFieldValueCreate {
                    custom_field: referred,
                    text_value: Some("x".into()),
                    number_value: None,
                }]),
            )
            .expect_err("foreign field");
        assert!(!validation(err).messages("custom_field_values").is_empty());
    }

    #[test]
    fn test_patient_needs_an_address_and_names() {
        let store = Store::new();
        let mut body = patient(vec![]);
        body.addresses.clear();
        body.first_name = "  ".into();

        let errors = validation(store.create_patient(&provider(), body).expect_err("invalid"));
        assert_eq!(errors.messages("addresses"), &["At least one address is required.".to_string()]);
        assert_eq!(errors.messages("first_name"), &["This field may not be blank.".to_string()]);
    }

    #[test]
    fn test_patch_keeps_absent_collections() {
        let store = Store::new();
        let referred = field(&store, "Referred By", CustomFieldType::Text);
        let (id, _) = store
            .create_patient(
                &provider(),
                patient(vec![CustomFieldValueCreate {
                    custom_field: referred,
                    text_value: Some("Dr. Who".into()),
                    number_value: None,
                }]),
            )
            .unwrap();

        let updated = store
            .update_patient(
                &provider(),
                id,
                PatientUpdate {
                    status: Some(PatientStatus::Churned),
                    middle_name: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, PatientStatus::Churned);
        assert_eq!(updated.middle_name, None);
        assert_eq!(updated.addresses.len(), 1);
        assert_eq!(updated.custom_field_values.len(), 1);

        let replaced = store
            .update_patient(
                &provider(),
                id,
                PatientUpdate {
                    custom_field_values: Some(vec![]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(replaced.custom_field_values.is_empty());
    }

    #[test]
    fn test_delete_field_cascades_to_values() {
        let store = Store::new();
        let visits = field(&store, "Visits", CustomFieldType::Number);
        let (id, _) = store
            .create_patient(
                &provider(),
                patient(vec![CustomFieldValueCreate {
                    custom_field: visits,
                    text_value: None,
                    number_value: Some("3.5".into()),
                }]),
            )
            .unwrap();

        store.delete_custom_field(&provider(), visits).unwrap();

        assert!(store.get_patient(&provider(), id).unwrap().custom_field_values.is_empty());
        assert!(matches!(
            store.get_custom_field(&provider(), visits),
            Err(RestError::NotFound)
        ));
    }

    #[test]
    fn test_records_are_scoped_to_their_provider() {
        let store = Store::new();
        let (id, _) = store.create_patient(&provider(), patient(vec![])).unwrap();
        let other = Provider::new("clinic-b");

        assert!(matches!(store.get_patient(&other, id), Err(RestError::NotFound)));
        assert!(matches!(store.delete_patient(&other, id), Err(RestError::NotFound)));
        assert!(store.list_patients(&other).is_empty());
        assert!(store.delete_patient(&provider(), id).is_ok());
    }

    #[test]
    fn test_normalise_number() {
        assert_eq!(normalise_number("42"), Ok("42.00".into()));
        assert_eq!(normalise_number("71.5"), Ok("71.50".into()));
        assert_eq!(normalise_number("-007.25"), Ok("-7.25".into()));
        assert_eq!(normalise_number(".5"), Ok("0.50".into()));
        assert_eq!(normalise_number("-0"), Ok("0.00".into()));
        assert_eq!(
            normalise_number("9999999999999.99"),
            Ok("9999999999999.99".into())
        );
        for raw in ["NaN", "1e14", "", ".", "1.2.3", "--1", "12 000"] {
            assert_eq!(normalise_number(raw), Err("A valid number is required.".into()), "{raw}");
        }
    }

    #[test]
    fn test_normalise_number_never_rounds() {
        let places = Err("Ensure that there are no more than 2 decimal places.".to_string());
        assert_eq!(normalise_number("12.345"), places);
        assert_eq!(normalise_number("0.005"), places);
        assert_eq!(
            normalise_number("9999999999999.999"),
            Err("Ensure that there are no more than 15 digits in total.".into())
        );
        assert_eq!(
            normalise_number("12345678901234"),
            Err("Ensure that there are no more than 13 digits before the decimal point.".into())
        );
    }
}
