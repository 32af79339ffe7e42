//! Patient registration / edit form controller.
//!
//! The controller owns the form state behind the patient dialog, validates it
//! against the generated [`FormSchema`], converts it to the API representation and
//! issues the create (POST) or update (PATCH) call.
//!
//! Outcome handling:
//! - validation failure: issues are stored for inline display, nothing is sent
//! - API failure: logged, one destructive toast, the dialog stays open with the
//!   entered values intact
//! - success: one toast, the form resets to its defaults, the dialog closes and the
//!   patients query is invalidated

use std::collections::BTreeMap;

use crate::api::{ApiError, PatientsApi};
use crate::cache::QueryKey;
use crate::context::AppContext;
use crate::error::{CoreError, CoreResult};
use crate::model::{
    AddressCreate, CustomFieldDefinition, CustomFieldType, CustomFieldValueCreate,
    PatientCreate, PatientList, PatientUpdate,
};
use crate::registry::CustomFieldRegistry;
use crate::schema::{
    AddressValues, FieldValue, FormSchema, FormValues, SchemaOptions, ValidationErrors,
};
use crate::toast::{Toast, Toaster};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The form did not pass validation; no request was sent.
    Invalid(ValidationErrors),
    /// The server accepted the payload.
    Saved(PatientCreate),
    /// The request failed; the form is unchanged.
    Failed(ApiError),
}

#[derive(Clone, Debug)]
pub struct PatientForm {
    mode: FormMode,
    patient_id: Option<i64>,
    registry: CustomFieldRegistry,
    schema: FormSchema,
    defaults: FormValues,
    values: FormValues,
    errors: ValidationErrors,
    open: bool,
    submitting: bool,
}

impl PatientForm {
    /// Builds the schema and default values for `definitions`.
    ///
    /// In edit mode every static field and every known custom field is seeded from
    /// `existing`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if `mode` is `Edit` and no patient is given.
    pub fn initialize(
        mode: FormMode,
        definitions: &[CustomFieldDefinition],
        existing: Option<&PatientList>,
    ) -> CoreResult<Self> {
        let registry = CustomFieldRegistry::new(definitions.to_vec());
        let schema = FormSchema::build(&registry);

        let (defaults, patient_id) = match (mode, existing) {
            (FormMode::Create, _) => (schema.default_values(), None),
            (FormMode::Edit, Some(patient)) => (
                values_from_patient(patient, &schema, &registry),
                Some(patient.id),
            ),
            (FormMode::Edit, None) => {
                return Err(CoreError::InvalidInput(
                    "edit mode requires an existing patient".into(),
                ))
            }
        };

        Ok(Self {
            mode,
            patient_id,
            registry,
            schema,
            values: defaults.clone(),
            defaults,
            errors: ValidationErrors::default(),
            open: false,
            submitting: false,
        })
    }

    pub fn with_schema_options(mut self, options: SchemaOptions) -> Self {
        self.schema = self.schema.with_options(options);
        self
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut FormValues {
        &mut self.values
    }

    pub fn defaults(&self) -> &FormValues {
        &self.defaults
    }

    /// Issues from the last validation.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closes the dialog and discards any edits.
    pub fn close(&mut self) {
        self.reset();
        self.open = false;
    }

    /// Alias of [`close`](Self::close) for the cancel button.
    pub fn cancel(&mut self) {
        self.close();
    }

    pub fn reset(&mut self) {
        self.values = self.defaults.clone();
        self.errors = ValidationErrors::default();
    }

    /// Validates the form and converts it into the API representation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` with every issue found.
    pub fn build_payload(&self) -> CoreResult<PatientCreate> {
        self.payload().map_err(CoreError::Validation)
    }

    fn payload(&self) -> Result<PatientCreate, ValidationErrors> {
        self.schema.validate(&self.values)?;

        let values = &self.values;
        let addresses = values
            .addresses
            .iter()
            .map(|a| {
                Some(AddressCreate {
                    address_type: a.address_type?,
                    street_address: a.street_address.clone(),
                    city: a.city.clone(),
                    state: a.state?,
                    postal_code: a.postal_code.clone(),
                    is_primary: a.is_primary,
                })
            })
            .collect::<Option<Vec<_>>>();

        let (Some(date_of_birth), Some(status), Some(addresses)) =
            (values.date_of_birth, values.status, addresses)
        else {
            // validate() rejects every missing value above
            return Err(ValidationErrors::default());
        };

        Ok(PatientCreate {
            first_name: values.first_name.clone(),
            middle_name: Some(values.middle_name.clone()).filter(|m| !m.is_empty()),
            last_name: values.last_name.clone(),
            date_of_birth,
            status,
            addresses,
            custom_field_values: encode_custom_fields(&values.custom_fields, &self.registry),
        })
    }

    /// Validates and sends the form, reporting the result through `ctx.toaster`.
    ///
    /// Failures never escape as errors: they are logged, toasted and returned as
    /// [`SubmitOutcome::Failed`] with the form left as it was.
    pub async fn submit<A, T>(&mut self, ctx: &AppContext<A, T>) -> SubmitOutcome
    where
        A: PatientsApi,
        T: Toaster,
    {
        let payload = match self.payload() {
            Ok(payload) => payload,
            Err(errors) => {
                tracing::debug!(issues = errors.issues().len(), "patient form rejected");
                self.errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }
        };
        self.errors = ValidationErrors::default();

        self.submitting = true;
        let result = match (self.mode, self.patient_id) {
            (FormMode::Edit, Some(id)) => {
                let patch = PatientUpdate::from(payload);
                ctx.api
                    .partial_update_patient(&ctx.session, id, &patch)
                    .await
            }
            _ => ctx.api.create_patient(&ctx.session, &payload).await,
        };
        self.submitting = false;

        match result {
            Ok(saved) => {
                ctx.toaster.toast(match self.mode {
                    FormMode::Edit => Toast::success(
                        "Patient Updated",
                        Some("The patient has been successfully updated."),
                    ),
                    FormMode::Create => Toast::success(
                        "New Patient Created",
                        Some("The patient has been successfully registered in the system."),
                    ),
                });
                self.reset();
                self.open = false;
                ctx.cache.invalidate(QueryKey::Patients);
                SubmitOutcome::Saved(saved)
            }
            Err(err) => {
                let title = match self.mode {
                    FormMode::Edit => "Error updating patient",
                    FormMode::Create => "Error creating patient",
                };
                tracing::error!(error = %err, "{}", title);
                ctx.toaster
                    .toast(Toast::error(title, Some(err.user_message())));
                SubmitOutcome::Failed(err)
            }
        }
    }
}

/// Reshapes the dynamic side-map into `CustomFieldValueCreate` entries.
///
/// Blank values (null or `""`) are omitted. Each remaining entry is resolved to its
/// definition by name and placed in `number_value` or `text_value` according to the
/// definition's type. Names that do not resolve are skipped.
pub fn encode_custom_fields(
    fields: &BTreeMap<String, FieldValue>,
    registry: &CustomFieldRegistry,
) -> Vec<CustomFieldValueCreate> {
    let mut encoded = Vec::new();
    for (name, value) in fields {
        if value.is_blank() {
            continue;
        }
        let Some(definition) = registry.resolve(name) else {
            tracing::debug!(field = %name, "skipping value for unknown custom field");
            continue;
        };
        let Some(raw) = value.to_wire_string() else {
            continue;
        };
        let (text_value, number_value) = match definition.field_type {
            CustomFieldType::Number => (None, Some(raw)),
            CustomFieldType::Text | CustomFieldType::Other(_) => (Some(raw), None),
        };
        encoded.push(CustomFieldValueCreate {
            custom_field: definition.id,
            text_value,
            number_value,
        });
    }
    encoded
}

fn values_from_patient(
    patient: &PatientList,
    schema: &FormSchema,
    registry: &CustomFieldRegistry,
) -> FormValues {
    let mut custom_fields = schema.default_custom_fields();
    for rule in schema.dynamic_fields() {
        let stored = registry
            .resolve(rule.name())
            .and_then(|definition| registry.listed_value(definition, &patient.custom_field_values));
        if let Some(stored) = stored {
            custom_fields.insert(rule.name().to_owned(), rule.seed(stored));
        }
    }

    FormValues {
        first_name: patient.first_name.clone(),
        middle_name: patient.middle_name.clone().unwrap_or_default(),
        last_name: patient.last_name.clone(),
        date_of_birth: Some(patient.date_of_birth),
        status: Some(patient.status),
        addresses: patient
            .addresses
            .iter()
            .map(|a| AddressValues {
                address_type: Some(a.address_type),
                street_address: a.street_address.clone(),
                city: a.city.clone(),
                state: Some(a.state),
                postal_code: a.postal_code.clone(),
                is_primary: a.is_primary,
            })
            .collect(),
        custom_fields,
    }
}
