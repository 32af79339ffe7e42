//! Form schema for registering and editing patients.
//!
//! The static part of the schema is fixed (names, date of birth, status, addresses).
//! The dynamic part is generated from the [`CustomFieldRegistry`]: one rule per
//! custom-field name, so the form follows whatever fields the backend defines without
//! a code change.
//!
//! Dynamic values are a union of string, number and null. The schema does not coerce
//! them; type-specific conversion happens when the payload is built.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};

use crate::model::{AddressType, CustomFieldType, ListedValue, PatientStatus, UsState};
use crate::registry::CustomFieldRegistry;

const NAME_MIN_CHARS: usize = 2;

// ============================================================================
// FORM VALUES
// ============================================================================

/// In-progress value of a dynamic (custom) field.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Null,
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// `true` for null and for the empty string; such values are never submitted.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Number(_) => false,
        }
    }

    /// The value as it goes into a `text_value` / `number_value` slot.
    pub fn to_wire_string(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// One address row of the form.
#[derive(Clone, Debug, PartialEq)]
pub struct AddressValues {
    pub address_type: Option<AddressType>,
    pub street_address: String,
    pub city: String,
    pub state: Option<UsState>,
    pub postal_code: String,
    pub is_primary: bool,
}

impl AddressValues {
    /// A blank `HOME` address in `CA`.
    pub fn blank(is_primary: bool) -> Self {
        Self {
            address_type: Some(AddressType::Home),
            street_address: String::new(),
            city: String::new(),
            state: Some(UsState::Ca),
            postal_code: String::new(),
            is_primary,
        }
    }
}

/// The edit buffer behind the patient dialog.
#[derive(Clone, Debug, PartialEq)]
pub struct FormValues {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub status: Option<PatientStatus>,
    pub addresses: Vec<AddressValues>,
    pub custom_fields: BTreeMap<String, FieldValue>,
}

impl FormValues {
    /// Appends a blank, non-primary address.
    pub fn add_address(&mut self) {
        self.addresses.push(AddressValues::blank(false));
    }

    /// Removes the address at `index`. The first address cannot be removed.
    pub fn remove_address(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.addresses.len() {
            return false;
        }
        self.addresses.remove(index);
        true
    }

    /// Sets a dynamic field. Unknown names are kept; they are ignored on submit.
    pub fn set_custom_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.custom_fields.insert(name.into(), value.into());
    }
}

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted path of the offending field, e.g. `addresses.0.city`.
    pub path: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// First message reported for `path`.
    pub fn message_for(&self, path: &str) -> Option<&str> {
        self.issues
            .iter()
            .find(|issue| issue.path == path)
            .map(|issue| issue.message.as_str())
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for issue in &self.issues {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", issue.path, issue.message)?;
            first = false;
        }
        Ok(())
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Validation rule for one custom field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DynamicFieldRule {
    Text { name: String },
    Number { name: String },
    /// A field type this client does not know; handled like text.
    Passthrough { name: String, field_type: String },
}

impl DynamicFieldRule {
    fn from_type(name: &str, field_type: &CustomFieldType) -> Self {
        let name = name.to_owned();
        match field_type {
            CustomFieldType::Text => DynamicFieldRule::Text { name },
            CustomFieldType::Number => DynamicFieldRule::Number { name },
            CustomFieldType::Other(raw) => DynamicFieldRule::Passthrough {
                name,
                field_type: raw.clone(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DynamicFieldRule::Text { name }
            | DynamicFieldRule::Number { name }
            | DynamicFieldRule::Passthrough { name, .. } => name,
        }
    }

    /// `null` for number fields, `""` for everything else.
    pub fn default_value(&self) -> FieldValue {
        match self {
            DynamicFieldRule::Number { .. } => FieldValue::Null,
            DynamicFieldRule::Text { .. } | DynamicFieldRule::Passthrough { .. } => {
                FieldValue::Text(String::new())
            }
        }
    }

    /// Converts a stored value into the form representation of this field.
    pub fn seed(&self, stored: &ListedValue) -> FieldValue {
        match (self, stored) {
            (DynamicFieldRule::Number { .. }, ListedValue::Number(n)) => FieldValue::Number(*n),
            (DynamicFieldRule::Number { .. }, ListedValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(FieldValue::Number)
                .unwrap_or_else(|_| FieldValue::Text(s.clone())),
            (_, ListedValue::Number(n)) => FieldValue::Text(n.to_string()),
            (_, ListedValue::Text(s)) => FieldValue::Text(s.clone()),
        }
    }

    /// Every arm accepts the whole string | number | null union; only a NaN number
    /// is outside it.
    fn check(&self, value: &FieldValue) -> Option<&'static str> {
        match (self, value) {
            (_, FieldValue::Number(n)) if n.is_nan() => Some("Expected number, received nan"),
            (DynamicFieldRule::Text { .. }, _)
            | (DynamicFieldRule::Number { .. }, _)
            | (DynamicFieldRule::Passthrough { .. }, _) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Reject forms that do not mark exactly one address as primary.
    pub require_single_primary_address: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormSchema {
    dynamic: Vec<DynamicFieldRule>,
    options: SchemaOptions,
}

impl FormSchema {
    /// Builds the schema for the given registry.
    ///
    /// Definitions sharing a name collapse into one rule (the first one wins), since
    /// form values are keyed by name.
    pub fn build(registry: &CustomFieldRegistry) -> Self {
        let mut dynamic: Vec<DynamicFieldRule> = Vec::with_capacity(registry.len());
        for definition in registry.definitions() {
            if dynamic.iter().any(|rule| rule.name() == definition.name) {
                continue;
            }
            dynamic.push(DynamicFieldRule::from_type(
                &definition.name,
                &definition.field_type,
            ));
        }
        Self {
            dynamic,
            options: SchemaOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> SchemaOptions {
        self.options
    }

    pub fn dynamic_fields(&self) -> &[DynamicFieldRule] {
        &self.dynamic
    }

    pub fn rule(&self, name: &str) -> Option<&DynamicFieldRule> {
        self.dynamic.iter().find(|rule| rule.name() == name)
    }

    /// One entry per dynamic rule, set to its default.
    pub fn default_custom_fields(&self) -> BTreeMap<String, FieldValue> {
        self.dynamic
            .iter()
            .map(|rule| (rule.name().to_owned(), rule.default_value()))
            .collect()
    }

    /// Create-mode defaults, with today's date in the viewer's time zone.
    pub fn default_values(&self) -> FormValues {
        self.default_values_on(Local::now().date_naive())
    }

    pub fn default_values_on(&self, today: NaiveDate) -> FormValues {
        FormValues {
            first_name: String::new(),
            middle_name: String::new(),
            last_name: String::new(),
            date_of_birth: Some(today),
            status: Some(PatientStatus::Inquiry),
            addresses: vec![AddressValues::blank(true)],
            custom_fields: self.default_custom_fields(),
        }
    }

    /// Validates `values`, collecting every issue rather than stopping at the first.
    pub fn validate(&self, values: &FormValues) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if values.first_name.chars().count() < NAME_MIN_CHARS {
            errors.push(
                "first_name",
                "First name is required and must be at least 2 characters.",
            );
        }
        if values.last_name.chars().count() < NAME_MIN_CHARS {
            errors.push(
                "last_name",
                "Last name is required and must be at least 2 characters.",
            );
        }
        if values.date_of_birth.is_none() {
            errors.push("date_of_birth", "Date of birth is required.");
        }
        if values.status.is_none() {
            errors.push("status", "Please select a status.");
        }

        if values.addresses.is_empty() {
            errors.push("addresses", "At least one address is required.");
        }
        for (index, address) in values.addresses.iter().enumerate() {
            let path = |field: &str| format!("addresses.{index}.{field}");
            if address.address_type.is_none() {
                errors.push(path("address_type"), "Please select an address type.");
            }
            if address.street_address.is_empty() {
                errors.push(path("street_address"), "Street address is required.");
            }
            if address.city.is_empty() {
                errors.push(path("city"), "City is required.");
            }
            if address.state.is_none() {
                errors.push(path("state"), "Please select a state.");
            }
            if address.postal_code.is_empty() {
                errors.push(path("postal_code"), "Postal code is required.");
            }
        }
        if self.options.require_single_primary_address && !values.addresses.is_empty() {
            let primaries = values.addresses.iter().filter(|a| a.is_primary).count();
            if primaries != 1 {
                errors.push(
                    "addresses",
                    "Exactly one address must be marked as primary.",
                );
            }
        }

        for (name, value) in &values.custom_fields {
            if let Some(message) = self.rule(name).and_then(|rule| rule.check(value)) {
                errors.push(format!("custom_fields.{name}"), message);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::definition;

    fn registry() -> CustomFieldRegistry {
        CustomFieldRegistry::new(vec![
            definition(1, "Referred By", CustomFieldType::Text),
            definition(2, "Visits", CustomFieldType::Number),
            definition(3, "Allergy Since", CustomFieldType::Other("DATE".into())),
        ])
    }

    fn valid_values(schema: &FormSchema) -> FormValues {
        let mut values = schema.default_values_on(NaiveDate::from_ymd_opt(1990, 3, 3).unwrap());
        values.first_name = "Ada".into();
        values.last_name = "Lovelace".into();
        values.addresses[0].street_address = "1 Main St".into();
        values.addresses[0].city = "Austin".into();
        values.addresses[0].postal_code = "73301".into();
        values
    }

    #[test]
    fn test_defaults_have_one_entry_per_definition() {
        let schema = FormSchema::build(&registry());
        let defaults = schema.default_custom_fields();

        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults["Referred By"], FieldValue::Text(String::new()));
        assert_eq!(defaults["Visits"], FieldValue::Null);
        assert_eq!(defaults["Allergy Since"], FieldValue::Text(String::new()));
    }

    #[test]
    fn test_create_defaults_match_static_layout() {
        let schema = FormSchema::build(&CustomFieldRegistry::default());
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let values = schema.default_values_on(today);

        assert_eq!(values.date_of_birth, Some(today));
        assert_eq!(values.status, Some(PatientStatus::Inquiry));
        assert_eq!(values.addresses, vec![AddressValues::blank(true)]);
        assert!(values.custom_fields.is_empty());
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let schema = FormSchema::build(&registry());
        assert_eq!(schema.validate(&valid_values(&schema)), Ok(()));
    }

    #[test]
    fn test_validate_reports_each_missing_field() {
        let schema = FormSchema::build(&registry());
        let mut values = valid_values(&schema);
        values.first_name = "A".into();
        values.date_of_birth = None;
        values.status = None;
        values.add_address();

        let errors = schema.validate(&values).expect_err("should reject");
        assert_eq!(
            errors.message_for("first_name"),
            Some("First name is required and must be at least 2 characters.")
        );
        assert_eq!(errors.message_for("date_of_birth"), Some("Date of birth is required."));
        assert_eq!(errors.message_for("status"), Some("Please select a status."));
        assert_eq!(
            errors.message_for("addresses.1.street_address"),
            Some("Street address is required.")
        );
        assert_eq!(errors.message_for("addresses.1.city"), Some("City is required."));
        assert_eq!(
            errors.message_for("addresses.1.postal_code"),
            Some("Postal code is required.")
        );
        assert!(errors.message_for("last_name").is_none());
    }

    #[test]
    fn test_validate_requires_an_address() {
        let schema = FormSchema::build(&registry());
        let mut values = valid_values(&schema);
        values.addresses.clear();

        let errors = schema.validate(&values).expect_err("should reject");
        assert_eq!(
            errors.message_for("addresses"),
            Some("At least one address is required.")
        );
    }

    #[test]
    fn test_primary_address_is_lenient_unless_required() {
        let lenient = FormSchema::build(&registry());
        let mut values = valid_values(&lenient);
        values.addresses.push(values.addresses[0].clone());
        assert!(lenient.validate(&values).is_ok());

        let strict = lenient.with_options(SchemaOptions {
            require_single_primary_address: true,
        });
        let errors = strict.validate(&values).expect_err("two primaries should be rejected");
        assert_eq!(
            errors.message_for("addresses"),
            Some("Exactly one address must be marked as primary.")
        );
    }

    #[test]
    fn test_dynamic_fields_accept_any_union_member_but_nan() {
        let schema = FormSchema::build(&registry());
        let mut values = valid_values(&schema);
        values.set_custom_field("Visits", "not a number");
        values.set_custom_field("Referred By", 12.0);
        assert!(schema.validate(&values).is_ok());

        values.set_custom_field("Visits", f64::NAN);
        let errors = schema.validate(&values).expect_err("NaN is not a number");
        assert_eq!(
            errors.message_for("custom_fields.Visits"),
            Some("Expected number, received nan")
        );
    }

    #[test]
    fn test_first_address_cannot_be_removed() {
        let schema = FormSchema::build(&registry());
        let mut values = valid_values(&schema);
        values.add_address();
        assert!(!values.remove_address(0));
        assert!(values.remove_address(1));
        assert_eq!(values.addresses.len(), 1);
    }

    #[test]
    fn test_seed_converts_by_rule() {
        let number = DynamicFieldRule::Number { name: "Visits".into() };
        let text = DynamicFieldRule::Text { name: "Notes".into() };

        assert_eq!(number.seed(&ListedValue::Text("42.00".into())), FieldValue::Number(42.0));
        assert_eq!(number.seed(&ListedValue::Text("n/a".into())), FieldValue::Text("n/a".into()));
        assert_eq!(text.seed(&ListedValue::Number(3.5)), FieldValue::Text("3.5".into()));
    }

    #[test]
    fn test_wire_string_drops_trailing_zeroes() {
        assert_eq!(FieldValue::Number(42.0).to_wire_string(), Some("42".into()));
        assert_eq!(FieldValue::Number(71.25).to_wire_string(), Some("71.25".into()));
        assert!(FieldValue::Text(String::new()).is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
    }
}
