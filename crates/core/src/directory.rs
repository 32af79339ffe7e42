//! Loading the data behind the patients page.
//!
//! The patient page and the custom-field list are independent queries. They are
//! fetched concurrently through the query cache and reported separately, so one can
//! be shown while the other is still failing.

use std::sync::Arc;

use crate::api::{list_all_custom_fields, ApiError, CustomFieldsApi, PatientsApi};
use crate::cache::QueryKey;
use crate::context::AppContext;
use crate::model::CustomFieldDefinition;
use crate::table::{PatientTable, PatientsPage};

#[derive(Debug, PartialEq)]
pub enum Loadable<T> {
    Ready(Arc<T>),
    Failed(String),
}

impl<T> Loadable<T> {
    fn from_result(result: Result<Arc<T>, ApiError>, what: &str) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(err) => {
                tracing::error!(error = %err, "failed to load {what}");
                Loadable::Failed(err.user_message())
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            Loadable::Failed(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Loadable::Ready(_))
    }
}

#[derive(Debug)]
pub struct Directory {
    pub patients: Loadable<PatientsPage>,
    pub custom_fields: Loadable<Vec<CustomFieldDefinition>>,
}

impl Directory {
    /// The table for the loaded page. Custom-field columns are omitted when the
    /// definitions could not be loaded.
    pub fn table(&self) -> Option<PatientTable> {
        let page = self.patients.ready()?.clone();
        let definitions = self
            .custom_fields
            .ready()
            .map(Vec::as_slice)
            .unwrap_or_default();
        Some(PatientTable::new(page, definitions))
    }
}

/// Cached list of every custom-field definition.
pub async fn load_custom_fields<A, T>(
    ctx: &AppContext<A, T>,
) -> Result<Arc<Vec<CustomFieldDefinition>>, ApiError>
where
    A: CustomFieldsApi,
{
    ctx.cache
        .fetch(QueryKey::CustomFields, || {
            list_all_custom_fields(&ctx.api, &ctx.session)
        })
        .await
}

/// Cached patient page `page` (1-based).
pub async fn load_patients<A, T>(
    ctx: &AppContext<A, T>,
    page: u32,
) -> Result<Arc<PatientsPage>, ApiError>
where
    A: PatientsApi,
{
    let scope = format!("page={page}");
    ctx.cache
        .fetch_scoped(QueryKey::Patients, &scope, || async {
            let listed = ctx.api.list_patients(&ctx.session, Some(page)).await?;
            Ok(PatientsPage::from(listed))
        })
        .await
}

pub async fn load_directory<A, T>(ctx: &AppContext<A, T>, page: u32) -> Directory
where
    A: PatientsApi + CustomFieldsApi,
{
    let (patients, custom_fields) = tokio::join!(load_patients(ctx, page), load_custom_fields(ctx));
    Directory {
        patients: Loadable::from_result(patients, "patients"),
        custom_fields: Loadable::from_result(custom_fields, "custom fields"),
    }
}
