//! The set of custom-field definitions known for the current session.
//!
//! Read-side lookups (seeding an edit form, rendering a table cell) are keyed by the
//! definition **name**, because that is all the list endpoint reports for a stored
//! value. The write side sends the definition **id** resolved from that name.
//!
//! The backend keeps names unique per provider, but nothing stops a stale or foreign
//! list from containing the same name twice. Such names are recorded as ambiguous and
//! never resolved; callers fall back to the empty value instead of guessing.

use std::collections::{BTreeSet, HashMap};

use crate::model::{CustomFieldDefinition, CustomFieldValueListed, ListedValue};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomFieldRegistry {
    definitions: Vec<CustomFieldDefinition>,
    by_name: HashMap<String, usize>,
    ambiguous: BTreeSet<String>,
}

impl CustomFieldRegistry {
    pub fn new(definitions: Vec<CustomFieldDefinition>) -> Self {
        let mut by_name = HashMap::new();
        let mut ambiguous = BTreeSet::new();
        for (index, definition) in definitions.iter().enumerate() {
            if by_name.insert(definition.name.clone(), index).is_some() {
                ambiguous.insert(definition.name.clone());
            }
        }
        for name in &ambiguous {
            by_name.remove(name);
            tracing::warn!(
                field = %name,
                "custom field name is shared by several definitions; values for it will not be resolved"
            );
        }
        Self {
            definitions,
            by_name,
            ambiguous,
        }
    }

    /// Definitions in server order.
    pub fn definitions(&self) -> &[CustomFieldDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Resolve a definition by display name. Ambiguous names resolve to nothing.
    pub fn resolve(&self, name: &str) -> Option<&CustomFieldDefinition> {
        if self.ambiguous.contains(name) {
            tracing::warn!(field = %name, "refusing to resolve ambiguous custom field name");
            return None;
        }
        self.by_name.get(name).map(|&i| &self.definitions[i])
    }

    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous.contains(name)
    }

    pub fn ambiguous_names(&self) -> impl Iterator<Item = &str> {
        self.ambiguous.iter().map(String::as_str)
    }

    /// The stored value of `definition` within a patient's listed values.
    ///
    /// Returns `None` when the patient has no value for it, or when its name is
    /// ambiguous.
    pub fn listed_value<'a>(
        &self,
        definition: &CustomFieldDefinition,
        values: &'a [CustomFieldValueListed],
    ) -> Option<&'a ListedValue> {
        if self.ambiguous.contains(&definition.name) {
            return None;
        }
        values
            .iter()
            .find(|v| v.custom_field == definition.name)
            .and_then(|v| v.value.as_ref())
    }
}

#[cfg(test)]
pub(crate) fn definition(
    id: i64,
    name: &str,
    field_type: crate::model::CustomFieldType,
) -> CustomFieldDefinition {
    CustomFieldDefinition {
        id,
        name: name.to_owned(),
        field_type,
        description: None,
    }
}
