//! In-memory stand-in for the HTTP API used by controller tests.

use std::sync::Mutex;

use chrono::{TimeZone, Utc};

use crate::api::{ApiError, ApiResult, CustomFieldsApi, PatientsApi, Session};
use crate::model::{
    full_name, AddressListed, CustomFieldCreate, CustomFieldDefinition, CustomFieldPatch,
    CustomFieldValueListed, ListedValue, Paginated, PatientCreate, PatientList, PatientUpdate,
};

#[derive(Default)]
pub(crate) struct Calls {
    pub created: Vec<PatientCreate>,
    pub patched: Vec<(i64, PatientUpdate)>,
    pub created_fields: Vec<CustomFieldCreate>,
    pub deleted_fields: Vec<i64>,
    pub patient_lists: usize,
    pub field_lists: usize,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub patients: Mutex<Vec<PatientList>>,
    pub fields: Mutex<Vec<CustomFieldDefinition>>,
    pub calls: Mutex<Calls>,
    pub fail_with: Mutex<Option<ApiError>>,
    pub field_page_size: usize,
}

impl FakeApi {
    pub fn with_fields(fields: Vec<CustomFieldDefinition>) -> Self {
        Self {
            fields: Mutex::new(fields),
            field_page_size: 2,
            ..Default::default()
        }
    }

    pub fn fail_next(&self, err: ApiError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    fn check(&self) -> ApiResult<()> {
        match self.fail_with.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Builds the listed form of `body` the way the server would.
    pub fn listed(&self, id: i64, body: &PatientCreate) -> PatientList {
        let fields = self.fields.lock().unwrap();
        PatientList {
            id,
            full_name: full_name(&body.first_name, body.middle_name.as_deref(), &body.last_name),
            first_name: body.first_name.clone(),
            middle_name: body.middle_name.clone(),
            last_name: body.last_name.clone(),
            date_of_birth: body.date_of_birth,
            status: body.status,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap(),
            addresses: body
                .addresses
                .iter()
                .cloned()
                .map(AddressListed::from_create)
                .collect(),
            custom_field_values: body
                .custom_field_values
                .iter()
                .filter_map(|v| {
                    let def = fields.iter().find(|d| d.id == v.custom_field)?;
                    let value = match (&v.number_value, &v.text_value) {
                        (Some(n), _) => ListedValue::Text(format!(
                            "{:.2}",
                            n.parse::<f64>().unwrap_or_default()
                        )),
                        (None, Some(t)) => ListedValue::Text(t.clone()),
                        (None, None) => return None,
                    };
                    Some(CustomFieldValueListed {
                        custom_field: def.name.clone(),
                        value: Some(value),
                    })
                })
                .collect(),
        }
    }
}

impl PatientsApi for FakeApi {
    async fn list_patients(
        &self,
        _session: &Session,
        _page: Option<u32>,
    ) -> ApiResult<Paginated<PatientList>> {
        self.calls.lock().unwrap().patient_lists += 1;
        self.check()?;
        let results = self.patients.lock().unwrap().clone();
        Ok(Paginated {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        })
    }

    async fn create_patient(&self, _session: &Session, body: &PatientCreate) -> ApiResult<PatientCreate> {
        self.calls.lock().unwrap().created.push(body.clone());
        self.check()?;
        let id = self.patients.lock().unwrap().len() as i64 + 1;
        let listed = self.listed(id, body);
        self.patients.lock().unwrap().push(listed);
        Ok(body.clone())
    }

    async fn retrieve_patient(&self, _session: &Session, id: i64) -> ApiResult<PatientList> {
        self.check()?;
        self.patients
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: "Not found.".into(),
            })
    }

    async fn update_patient(
        &self,
        _session: &Session,
        _id: i64,
        body: &PatientCreate,
    ) -> ApiResult<PatientCreate> {
        self.check()?;
        Ok(body.clone())
    }

    async fn partial_update_patient(
        &self,
        _session: &Session,
        id: i64,
        body: &PatientUpdate,
    ) -> ApiResult<PatientCreate> {
        self.calls.lock().unwrap().patched.push((id, body.clone()));
        self.check()?;
        Ok(PatientCreate {
            first_name: body.first_name.clone().unwrap_or_default(),
            middle_name: body.middle_name.clone().filter(|m| !m.is_empty()),
            last_name: body.last_name.clone().unwrap_or_default(),
            date_of_birth: body.date_of_birth.unwrap_or_default(),
            status: body.status.unwrap_or(crate::model::PatientStatus::Inquiry),
            addresses: body.addresses.clone().unwrap_or_default(),
            custom_field_values: body.custom_field_values.clone().unwrap_or_default(),
        })
    }

    async fn delete_patient(&self, _session: &Session, _id: i64) -> ApiResult<()> {
        self.check()
    }
}

impl CustomFieldsApi for FakeApi {
    async fn list_custom_fields(
        &self,
        _session: &Session,
        page: Option<u32>,
    ) -> ApiResult<Paginated<CustomFieldDefinition>> {
        self.calls.lock().unwrap().field_lists += 1;
        self.check()?;
        let fields = self.fields.lock().unwrap().clone();
        let size = self.field_page_size.max(1);
        let page = page.unwrap_or(1).max(1) as usize;
        let start = (page - 1) * size;
        let results: Vec<_> = fields.iter().skip(start).take(size).cloned().collect();
        let next = (start + size < fields.len()).then(|| format!("?page={}", page + 1));
        Ok(Paginated {
            count: fields.len() as u64,
            next,
            previous: None,
            results,
        })
    }

    async fn create_custom_field(
        &self,
        _session: &Session,
        body: &CustomFieldCreate,
    ) -> ApiResult<CustomFieldDefinition> {
        self.calls.lock().unwrap().created_fields.push(body.clone());
        self.check()?;
        let mut fields = self.fields.lock().unwrap();
        let definition = CustomFieldDefinition {
            id: fields.iter().map(|f| f.id).max().unwrap_or_default() + 1,
            name: body.name.clone(),
            field_type: body.field_type.clone(),
            description: body.description.clone(),
        };
        fields.push(definition.clone());
        Ok(definition)
    }

    async fn retrieve_custom_field(&self, _session: &Session, id: i64) -> ApiResult<CustomFieldDefinition> {
        self.check()?;
        self.fields
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: "Not found.".into(),
            })
    }

    async fn update_custom_field(
        &self,
        session: &Session,
        id: i64,
        _body: &CustomFieldCreate,
    ) -> ApiResult<CustomFieldDefinition> {
        self.retrieve_custom_field(session, id).await
    }

    async fn partial_update_custom_field(
        &self,
        session: &Session,
        id: i64,
        _body: &CustomFieldPatch,
    ) -> ApiResult<CustomFieldDefinition> {
        self.retrieve_custom_field(session, id).await
    }

    async fn delete_custom_field(&self, _session: &Session, id: i64) -> ApiResult<()> {
        self.calls.lock().unwrap().deleted_fields.push(id);
        self.check()?;
        self.fields.lock().unwrap().retain(|f| f.id != id);
        Ok(())
    }
}
