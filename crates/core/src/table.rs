//! Patient table presentation.
//!
//! Turns a loaded page of patients into rows of display cells. The fixed columns come
//! first, followed by one column per custom-field definition in registry order.
//! Sorting and filtering apply to the loaded page only.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{Local, TimeZone};

use crate::model::{
    format_date_of_birth, CustomFieldDefinition, Paginated, PatientList, PatientStatus,
};
use crate::registry::CustomFieldRegistry;

const CREATED_AT_FORMAT: &str = "%m/%d/%Y %H:%M";

/// One page of patients plus its paging metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatientsPage {
    pub rows: Vec<PatientList>,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl From<Paginated<PatientList>> for PatientsPage {
    fn from(page: Paginated<PatientList>) -> Self {
        Self {
            count: page.count,
            has_next: page.next.is_some(),
            has_previous: page.previous.is_some(),
            rows: page.results,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnId {
    Name,
    FirstName,
    MiddleName,
    LastName,
    DateOfBirth,
    Status,
    PrimaryAddress,
    CreatedAt,
    /// Custom field, by definition id.
    Custom(i64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub id: ColumnId,
    pub header: String,
    pub sortable: bool,
}

impl Column {
    fn fixed(id: ColumnId, header: &str, sortable: bool) -> Self {
        Self {
            id,
            header: header.to_owned(),
            sortable,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeVariant {
    Success,
    Warning,
    Error,
    Info,
}

/// Badge colour for a patient status.
pub fn status_badge(status: PatientStatus) -> BadgeVariant {
    match status {
        PatientStatus::Active => BadgeVariant::Success,
        PatientStatus::Inquiry => BadgeVariant::Warning,
        PatientStatus::Churned => BadgeVariant::Error,
        PatientStatus::Onboarding => BadgeVariant::Info,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Badge { label: String, variant: BadgeVariant },
    Blank,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// The displayed text; blank cells render as `""`.
    pub fn display(&self) -> &str {
        match self {
            Cell::Text(text) => text,
            Cell::Badge { label, .. } => label,
            Cell::Blank => "",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortState {
    pub column: ColumnId,
    pub direction: SortDirection,
}

pub struct PatientTable<Tz: TimeZone = Local> {
    page: PatientsPage,
    registry: CustomFieldRegistry,
    columns: Vec<Column>,
    sort: Option<SortState>,
    name_filter: String,
    status_filter: BTreeSet<PatientStatus>,
    time_zone: Tz,
}

impl PatientTable<Local> {
    pub fn new(page: PatientsPage, definitions: &[CustomFieldDefinition]) -> Self {
        Self::with_time_zone(page, definitions, Local)
    }
}

impl<Tz> PatientTable<Tz>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    pub fn with_time_zone(
        page: PatientsPage,
        definitions: &[CustomFieldDefinition],
        time_zone: Tz,
    ) -> Self {
        let registry = CustomFieldRegistry::new(definitions.to_vec());
        let mut columns = vec![
            Column::fixed(ColumnId::Name, "Name", true),
            Column::fixed(ColumnId::FirstName, "First Name", false),
            Column::fixed(ColumnId::MiddleName, "Middle Name", false),
            Column::fixed(ColumnId::LastName, "Last Name", true),
            Column::fixed(ColumnId::DateOfBirth, "Date of Birth", false),
            Column::fixed(ColumnId::Status, "Status", false),
            Column::fixed(ColumnId::PrimaryAddress, "Primary Address", false),
            Column::fixed(ColumnId::CreatedAt, "Created At", false),
        ];
        columns.extend(registry.definitions().iter().map(|definition| Column {
            id: ColumnId::Custom(definition.id),
            header: definition.name.clone(),
            sortable: false,
        }));

        Self {
            page,
            registry,
            columns,
            sort: None,
            name_filter: String::new(),
            status_filter: BTreeSet::new(),
            time_zone,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn page(&self) -> &PatientsPage {
        &self.page
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Advances the sort of `column`: none, ascending, descending, ascending, ...
    ///
    /// Sorting a different column replaces the current sort. Returns `false` for
    /// columns that are not sortable.
    pub fn toggle_sort(&mut self, column: ColumnId) -> bool {
        let sortable = self
            .columns
            .iter()
            .any(|c| c.id == column && c.sortable);
        if !sortable {
            return false;
        }
        let direction = match &self.sort {
            Some(current) if current.column == column => match current.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            },
            _ => SortDirection::Ascending,
        };
        self.sort = Some(SortState { column, direction });
        true
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    pub fn set_name_filter(&mut self, filter: impl Into<String>) {
        self.name_filter = filter.into();
    }

    pub fn name_filter(&self) -> &str {
        &self.name_filter
    }

    /// Adds `status` to the facet selection, or removes it when already selected.
    pub fn toggle_status(&mut self, status: PatientStatus) {
        if !self.status_filter.remove(&status) {
            self.status_filter.insert(status);
        }
    }

    pub fn status_filter(&self) -> &BTreeSet<PatientStatus> {
        &self.status_filter
    }

    pub fn reset_filters(&mut self) {
        self.name_filter.clear();
        self.status_filter.clear();
    }

    pub fn is_filtered(&self) -> bool {
        !self.name_filter.is_empty() || !self.status_filter.is_empty()
    }

    /// Number of loaded rows per status, for the facet counters.
    pub fn status_counts(&self) -> Vec<(PatientStatus, usize)> {
        PatientStatus::ALL
            .iter()
            .map(|&status| {
                let n = self.page.rows.iter().filter(|r| r.status == status).count();
                (status, n)
            })
            .collect()
    }

    fn matches(&self, row: &PatientList) -> bool {
        let needle = self.name_filter.to_lowercase();
        (needle.is_empty() || row.full_name.to_lowercase().contains(&needle))
            && (self.status_filter.is_empty() || self.status_filter.contains(&row.status))
    }

    /// Filtered and sorted rows of the loaded page.
    pub fn visible_rows(&self) -> Vec<&PatientList> {
        let mut rows: Vec<&PatientList> =
            self.page.rows.iter().filter(|row| self.matches(row)).collect();

        if let Some(sort) = &self.sort {
            let key = |row: &PatientList| match sort.column {
                ColumnId::LastName => row.last_name.to_lowercase(),
                _ => row.full_name.to_lowercase(),
            };
            rows.sort_by(|a, b| {
                let ordering: Ordering = key(a).cmp(&key(b));
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        rows
    }

    pub fn cell(&self, row: &PatientList, column: &ColumnId) -> Cell {
        match column {
            ColumnId::Name => Cell::text(&row.full_name),
            ColumnId::FirstName => Cell::text(&row.first_name),
            ColumnId::MiddleName => match row.middle_name.as_deref() {
                Some(middle) if !middle.is_empty() => Cell::text(middle),
                _ => Cell::Blank,
            },
            ColumnId::LastName => Cell::text(&row.last_name),
            ColumnId::DateOfBirth => Cell::text(format_date_of_birth(row.date_of_birth)),
            ColumnId::Status => Cell::Badge {
                label: row.status.label().to_owned(),
                variant: status_badge(row.status),
            },
            ColumnId::PrimaryAddress => row
                .primary_address()
                .map(|a| Cell::text(&a.full_address))
                .unwrap_or(Cell::Blank),
            ColumnId::CreatedAt => Cell::text(
                row.created_at
                    .with_timezone(&self.time_zone)
                    .format(CREATED_AT_FORMAT)
                    .to_string(),
            ),
            ColumnId::Custom(id) => self
                .registry
                .definitions()
                .iter()
                .find(|d| d.id == *id)
                .and_then(|d| self.registry.listed_value(d, &row.custom_field_values))
                .map(|value| Cell::text(value.to_string()))
                .unwrap_or(Cell::Blank),
        }
    }

    /// Every visible row rendered across every column.
    pub fn render(&self) -> Vec<Vec<Cell>> {
        self.visible_rows()
            .into_iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| self.cell(row, &column.id))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AddressListed, AddressType, CustomFieldType, CustomFieldValueListed, ListedValue,
        UsState,
    };
    use crate::registry::definition;
    use chrono::{FixedOffset, NaiveDate, Utc};

    fn patient(id: i64, first: &str, last: &str, status: PatientStatus) -> PatientList {
        PatientList {
            id,
            full_name: format!("{first} {last}"),
            first_name: first.into(),
            middle_name: None,
            last_name: last.into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 3, 3).unwrap(),
            status,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 23, 30, 0).unwrap(),
            addresses: vec![],
            custom_field_values: vec![],
        }
    }

    fn page() -> PatientsPage {
        PatientsPage {
            rows: vec![
                patient(1, "Ada", "Lovelace", PatientStatus::Active),
                patient(2, "Alan", "Turing", PatientStatus::Inquiry),
                patient(3, "Grace", "Hopper", PatientStatus::Churned),
            ],
            count: 3,
            has_next: false,
            has_previous: false,
        }
    }

    fn table() -> PatientTable<Utc> {
        PatientTable::with_time_zone(page(), &[], Utc)
    }

    #[test]
    fn test_status_facet_filters_and_reset_restores() {
        let mut table = table();
        table.toggle_status(PatientStatus::Active);

        let ids: Vec<i64> = table.visible_rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
        assert!(table.is_filtered());

        table.reset_filters();
        assert_eq!(table.visible_rows().len(), 3);
        assert!(!table.is_filtered());
    }

    #[test]
    fn test_name_filter_is_case_insensitive_substring() {
        let mut table = table();
        table.set_name_filter("TUR");
        let ids: Vec<i64> = table.visible_rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_sort_cycles_and_switches_column() {
        let mut table = table();
        assert!(table.toggle_sort(ColumnId::LastName));
        let names: Vec<&str> = table.visible_rows().iter().map(|r| r.last_name.as_str()).collect();
        assert_eq!(names, vec!["Hopper", "Lovelace", "Turing"]);

        table.toggle_sort(ColumnId::LastName);
        assert_eq!(
            table.sort().map(|s| s.direction),
            Some(SortDirection::Descending)
        );
        assert_eq!(table.visible_rows()[0].last_name, "Turing");

        table.toggle_sort(ColumnId::Name);
        assert_eq!(
            table.sort(),
            Some(&SortState {
                column: ColumnId::Name,
                direction: SortDirection::Ascending
            })
        );
        assert_eq!(table.visible_rows()[0].first_name, "Ada");

        assert!(!table.toggle_sort(ColumnId::Status));
    }

    #[test]
    fn test_status_badges() {
        assert_eq!(status_badge(PatientStatus::Active), BadgeVariant::Success);
        assert_eq!(status_badge(PatientStatus::Inquiry), BadgeVariant::Warning);
        assert_eq!(status_badge(PatientStatus::Churned), BadgeVariant::Error);
        assert_eq!(status_badge(PatientStatus::Onboarding), BadgeVariant::Info);
    }

    #[test]
    fn test_custom_columns_follow_registry_and_blank_when_absent() {
        let definitions = vec![
            definition(4, "Referred By", CustomFieldType::Text),
            definition(5, "Visits", CustomFieldType::Number),
        ];
        let mut page = page();
        page.rows[0].custom_field_values = vec![CustomFieldValueListed {
            custom_field: "Visits".into(),
            value: Some(ListedValue::Text("42.00".into())),
        }];
        let table = PatientTable::with_time_zone(page, &definitions, Utc);

        let headers: Vec<&str> = table.columns().iter().map(|c| c.header.as_str()).collect();
        assert_eq!(&headers[8..], &["Referred By", "Visits"]);

        let row = &table.page().rows[0];
        assert_eq!(table.cell(row, &ColumnId::Custom(5)), Cell::Text("42.00".into()));
        assert_eq!(table.cell(row, &ColumnId::Custom(4)), Cell::Blank);
    }

    #[test]
    fn test_fixed_cells() {
        let mut page = page();
        page.rows[0].addresses = vec![
            AddressListed {
                address_type: AddressType::Work,
                street_address: "2 Side St".into(),
                city: "Boston".into(),
                state: UsState::Ma,
                postal_code: "02108".into(),
                full_address: "2 Side St, Boston, MA 02108".into(),
                is_primary: false,
            },
            AddressListed {
                address_type: AddressType::Home,
                street_address: "1 Main St".into(),
                city: "Austin".into(),
                state: UsState::Tx,
                postal_code: "73301".into(),
                full_address: "1 Main St, Austin, TX 73301".into(),
                is_primary: true,
            },
        ];
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let table = PatientTable::with_time_zone(page, &[], offset);
        let row = &table.page().rows[0];

        assert_eq!(
            table.cell(row, &ColumnId::PrimaryAddress).display(),
            "1 Main St, Austin, TX 73301"
        );
        assert_eq!(table.cell(row, &ColumnId::DateOfBirth).display(), "1990-03-03");
        assert_eq!(table.cell(row, &ColumnId::CreatedAt).display(), "01/03/2024 01:30");
        assert_eq!(table.cell(row, &ColumnId::MiddleName), Cell::Blank);
        assert_eq!(
            table.cell(row, &ColumnId::Status),
            Cell::Badge {
                label: "Active".into(),
                variant: BadgeVariant::Success
            }
        );
        assert_eq!(table.render()[0].len(), table.columns().len());
    }

    #[test]
    fn test_page_metadata_from_paginated() {
        let page = PatientsPage::from(Paginated {
            count: 25,
            next: Some("http://localhost:8000/api/patients/?page=2".into()),
            previous: None,
            results: vec![patient(1, "Ada", "Lovelace", PatientStatus::Active)],
        });
        assert!(page.has_next);
        assert!(!page.has_previous);
        assert_eq!(page.count, 25);
    }
}
