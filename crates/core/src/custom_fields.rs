//! Controller for the custom-field management dialog.
//!
//! Lists the existing definitions, creates new ones and deletes them behind a
//! confirmation step. Definitions are never edited from here.

use carebook_types::NonEmptyText;

use crate::api::{ApiError, CustomFieldsApi};
use crate::cache::QueryKey;
use crate::context::AppContext;
use crate::error::{CoreError, CoreResult};
use crate::model::{CustomFieldCreate, CustomFieldDefinition, CustomFieldType};
use crate::toast::{Toast, Toaster};

/// Longest name the backend accepts.
pub const NAME_MAX_CHARS: usize = 100;

/// Field types offered when creating a definition.
pub const CREATABLE_TYPES: [CustomFieldType; 2] = [CustomFieldType::Text, CustomFieldType::Number];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomFieldDraft {
    pub name: String,
    field_type: CustomFieldType,
    pub description: String,
}

impl Default for CustomFieldDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            field_type: CustomFieldType::Text,
            description: String::new(),
        }
    }
}

impl CustomFieldDraft {
    pub fn field_type(&self) -> &CustomFieldType {
        &self.field_type
    }

    /// Selects the type of the new field. Only `TEXT` and `NUMBER` are accepted.
    pub fn set_field_type(&mut self, field_type: CustomFieldType) -> CoreResult<()> {
        if !CREATABLE_TYPES.contains(&field_type) {
            return Err(CoreError::InvalidInput(format!(
                "custom fields of type {field_type} cannot be created"
            )));
        }
        self.field_type = field_type;
        Ok(())
    }

    /// The request body; an empty description is sent as absent.
    pub fn to_create(&self) -> CoreResult<CustomFieldCreate> {
        let name = NonEmptyText::bounded(&self.name, NAME_MAX_CHARS)?;
        let description = self.description.trim();
        Ok(CustomFieldCreate {
            name: name.into_inner(),
            field_type: self.field_type.clone(),
            description: (!description.is_empty()).then(|| description.to_owned()),
        })
    }
}

#[derive(Debug, Default)]
pub struct CustomFieldManager {
    draft: CustomFieldDraft,
    pending_delete: Option<i64>,
    open: bool,
    saving: bool,
}

impl CustomFieldManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closes the dialog, dropping the draft and any unconfirmed delete.
    pub fn close(&mut self) {
        self.open = false;
        self.draft = CustomFieldDraft::default();
        self.pending_delete = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn draft(&self) -> &CustomFieldDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut CustomFieldDraft {
        &mut self.draft
    }

    pub fn can_save(&self) -> bool {
        !self.saving && !self.draft.name.trim().is_empty()
    }

    /// Creates the drafted field.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Text` when the draft name is empty or too long; nothing is
    /// sent in that case. API failures are toasted and returned as `CoreError::Api`.
    pub async fn save<A, T>(&mut self, ctx: &AppContext<A, T>) -> CoreResult<CustomFieldDefinition>
    where
        A: CustomFieldsApi,
        T: Toaster,
    {
        let body = self.draft.to_create()?;

        self.saving = true;
        let result = ctx.api.create_custom_field(&ctx.session, &body).await;
        self.saving = false;

        match result {
            Ok(created) => {
                tracing::info!(id = created.id, name = %created.name, "custom field created");
                ctx.toaster.toast(Toast::success(
                    "Custom Field Created",
                    Some(format!("\"{}\" has been added.", created.name).as_str()),
                ));
                ctx.cache.invalidate(QueryKey::CustomFields);
                self.draft = CustomFieldDraft::default();
                Ok(created)
            }
            Err(err) => Err(self.report(ctx, "Failed to create custom field", err)),
        }
    }

    /// First step of deleting: remembers `id` until the user confirms.
    pub fn request_delete(&mut self, id: i64) {
        self.pending_delete = Some(id);
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes the field chosen with [`request_delete`](Self::request_delete).
    ///
    /// Returns `Ok(None)` when no delete was pending.
    pub async fn confirm_delete<A, T>(&mut self, ctx: &AppContext<A, T>) -> CoreResult<Option<i64>>
    where
        A: CustomFieldsApi,
        T: Toaster,
    {
        let Some(id) = self.pending_delete.take() else {
            return Ok(None);
        };

        match ctx.api.delete_custom_field(&ctx.session, id).await {
            Ok(()) => {
                tracing::info!(id, "custom field deleted");
                ctx.toaster.toast(Toast::success(
                    "Custom Field Deleted",
                    Some("The custom field has been removed."),
                ));
                ctx.cache.invalidate(QueryKey::CustomFields);
                Ok(Some(id))
            }
            Err(err) => Err(self.report(ctx, "Failed to delete custom field", err)),
        }
    }

    fn report<A, T: Toaster>(&self, ctx: &AppContext<A, T>, title: &str, err: ApiError) -> CoreError {
        tracing::error!(error = %err, "{}", title);
        ctx.toaster.toast(Toast::error(title, Some(err.user_message())));
        CoreError::Api(err)
    }
}
