//! Demo data for local development.

use carebook_core::model::{
    AddressCreate, AddressType, CustomFieldCreate, CustomFieldType, CustomFieldValueCreate,
    PatientCreate, PatientStatus, UsState,
};
use chrono::{Days, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::RestResult;
use crate::store::{Provider, Store};

const FIRST_NAMES: &[&str] = &[
    "Olivia", "Liam", "Emma", "Noah", "Ava", "Elijah", "Sophia", "Mateo", "Isabella", "Lucas",
    "Mia", "Amelia", "James", "Harper", "Benjamin", "Evelyn",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Lopez", "Wilson", "Anderson", "Thomas", "Moore", "Jackson",
];
const STREETS: &[&str] = &[
    "Maple Ave", "Oak St", "Cedar Ln", "Pine Rd", "Elm St", "Lakeview Dr", "Hillcrest Blvd",
];
const CITIES: &[&str] = &[
    "Springfield", "Riverside", "Fairview", "Franklin", "Greenville", "Madison", "Georgetown",
];

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn date_of_birth<R: Rng>(rng: &mut R, today: NaiveDate) -> NaiveDate {
    let age_days = rng.gen_range(18 * 365..90 * 365);
    today.checked_sub_days(Days::new(age_days)).unwrap_or(today)
}

/// The demo field each provider gets, by position: the first provider records who
/// referred the patient, the second counts visits.
fn demo_field(position: usize) -> Option<CustomFieldCreate> {
    match position {
        0 => Some(CustomFieldCreate {
            name: "Referred By".into(),
            field_type: CustomFieldType::Text,
            description: Some("Name of the person who referred the patient".into()),
        }),
        1 => Some(CustomFieldCreate {
            name: "Number of Visits".into(),
            field_type: CustomFieldType::Number,
            description: Some("Total number of visits by the patient".into()),
        }),
        _ => None,
    }
}

/// Creates `patients_per_provider` random patients for each of the first two providers,
/// each with one primary home address and a value for the provider's demo field.
///
/// Returns the number of patients created.
pub fn seed_demo_data<R: Rng>(
    store: &Store,
    providers: &[Provider],
    patients_per_provider: usize,
    rng: &mut R,
) -> RestResult<usize> {
    let today = Utc::now().date_naive();
    let mut created = 0;

    for (position, provider) in providers.iter().enumerate() {
        let Some(field) = demo_field(position) else {
            break;
        };
        let field = store.create_custom_field(provider, field)?;

        for _ in 0..patients_per_provider {
            let value = match field.field_type {
                CustomFieldType::Number => CustomFieldValueCreate {
                    custom_field: field.id,
                    text_value: None,
                    number_value: Some(rng.gen_range(1..=20).to_string()),
                },
                _ => CustomFieldValueCreate {
                    custom_field: field.id,
                    text_value: Some(format!("Dr. {}", pick(rng, LAST_NAMES))),
                    number_value: None,
                },
            };
            let body = PatientCreate {
                first_name: pick(rng, FIRST_NAMES).into(),
                middle_name: rng
                    .gen_bool(0.5)
                    .then(|| pick(rng, FIRST_NAMES).to_owned()),
                last_name: pick(rng, LAST_NAMES).into(),
                date_of_birth: date_of_birth(rng, today),
                status: *PatientStatus::ALL.choose(rng).unwrap_or(&PatientStatus::Inquiry),
                addresses: vec![AddressCreate {
                    address_type: AddressType::Home,
                    street_address: format!("{} {}", rng.gen_range(1..=9999), pick(rng, STREETS)),
                    city: pick(rng, CITIES).into(),
                    state: *UsState::ALL.choose(rng).unwrap_or(&UsState::Ca),
                    postal_code: format!("{:05}", rng.gen_range(1000..=99999)),
                    is_primary: true,
                }],
                custom_field_values: vec![value],
            };
            store.create_patient(provider, body)?;
            created += 1;
        }
        tracing::info!(%provider, patients = patients_per_provider, field = %field.name, "seeded demo data");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seeds_both_demo_fields() {
        let store = Store::new();
        let providers = [Provider::new("a"), Provider::new("b"), Provider::new("c")];
        let mut rng = StdRng::seed_from_u64(7);

        let created = seed_demo_data(&store, &providers, 4, &mut rng).unwrap();

        assert_eq!(created, 8);
        let first = store.list_patients(&providers[0]);
        assert_eq!(first.len(), 4);
        assert!(first
            .iter()
            .all(|p| p.custom_field_values[0].custom_field == "Referred By"));
        assert!(first.iter().all(|p| p.primary_address().is_some()));

        let second_fields = store.list_custom_fields(&providers[1]);
        assert_eq!(second_fields[0].name, "Number of Visits");
        assert!(store.list_patients(&providers[2]).is_empty());
    }
}
