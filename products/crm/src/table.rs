//! In-memory filter/sort over the records already held by the view.
//!
//! Everything is recomputed from scratch on each call; there is no index or
//! pagination.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::opportunity::Opportunity;
use crate::stage::Stage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Name,
    Company,
    Stage,
    Value,
    Probability,
    Contact,
    #[serde(alias = "ownerName")]
    OwnerName,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    Contains,
    #[serde(alias = "greater", alias = "greaterThan")]
    GreaterThan,
    #[serde(alias = "less", alias = "lessThan")]
    LessThan,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub field: FilterField,
    pub operator: FilterOperator,
    pub value: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Company,
    Contact,
    Value,
    Probability,
    Stage,
    CloseDate,
    CreatedAt,
    #[default]
    UpdatedAt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header click: same column flips direction, a new column starts descending.
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            let direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
            Self { field, direction }
        } else {
            Self::new(field, SortDirection::Desc)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub search: String,
    /// `None` shows every stage.
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub rules: Vec<FilterRule>,
    #[serde(default)]
    pub sort: SortSpec,
}

impl TableQuery {
    pub fn matches(&self, record: &Opportunity) -> bool {
        matches_search(record, &self.search)
            && self.stage.is_none_or(|stage| record.stage == stage)
            && self
                .rules
                .iter()
                .filter(|rule| !rule.value.trim().is_empty())
                .all(|rule| rule.matches(record))
    }

    /// Filtered, sorted view over `records`. The sort is stable.
    pub fn apply<'a>(&self, records: &'a [Opportunity]) -> Vec<&'a Opportunity> {
        let mut rows: Vec<&Opportunity> = records.iter().filter(|r| self.matches(r)).collect();
        rows.sort_by(|a, b| {
            let ordering = compare(a, b, self.sort.field);
            match self.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        rows
    }
}

fn matches_search(record: &Opportunity, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [&record.name, &record.company, &record.contact]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

impl FilterRule {
    pub fn matches(&self, record: &Opportunity) -> bool {
        let expected = self.value.trim();
        match self.cell(record) {
            Cell::Text(actual) => match self.operator {
                FilterOperator::Equals => actual == expected,
                FilterOperator::Contains => {
                    actual.to_lowercase().contains(&expected.to_lowercase())
                }
                FilterOperator::GreaterThan => actual > expected,
                FilterOperator::LessThan => actual < expected,
            },
            Cell::Number(actual) => match (self.operator, expected.parse::<f64>()) {
                (FilterOperator::Contains, _) => actual.to_string().contains(expected),
                (_, Err(_)) => false,
                (FilterOperator::Equals, Ok(wanted)) => actual == wanted,
                (FilterOperator::GreaterThan, Ok(wanted)) => actual > wanted,
                (FilterOperator::LessThan, Ok(wanted)) => actual < wanted,
            },
        }
    }

    fn cell<'a>(&self, record: &'a Opportunity) -> Cell<'a> {
        match self.field {
            FilterField::Name => Cell::Text(&record.name),
            FilterField::Company => Cell::Text(&record.company),
            FilterField::Contact => Cell::Text(&record.contact),
            FilterField::Stage => Cell::Text(record.stage.label()),
            FilterField::OwnerName => Cell::Text(record.owner_name()),
            FilterField::Value => Cell::Number(record.value),
            FilterField::Probability => Cell::Number(f64::from(record.probability)),
        }
    }
}

fn compare(a: &Opportunity, b: &Opportunity, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Company => a.company.to_lowercase().cmp(&b.company.to_lowercase()),
        SortField::Contact => a.contact.to_lowercase().cmp(&b.contact.to_lowercase()),
        SortField::Value => a.value.total_cmp(&b.value),
        SortField::Probability => a.probability.cmp(&b.probability),
        SortField::Stage => a.stage.position().cmp(&b.stage.position()),
        SortField::CloseDate => a.close_date.cmp(&b.close_date),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}
