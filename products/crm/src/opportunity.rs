use chrono::{DateTime, NaiveDate, Utc};
use platform_authn::Role;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::stage::Stage;

pub const DEFAULT_PROBABILITY: i16 = 30;

/// Joined user summary shown next to a record (owner or last modifier).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub contact: String,
    pub value: f64,
    pub stage: Stage,
    pub probability: i16,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    pub owner_id: Uuid,
    #[serde(default)]
    pub last_modified_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<Party>,
}

impl Opportunity {
    pub fn owner_name(&self) -> &str {
        self.owner.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    pub fn owner_email(&self) -> &str {
        self.owner.as_ref().map(|p| p.email.as_str()).unwrap_or("")
    }

    pub fn modifier_name(&self) -> &str {
        self.modifier.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    /// Probability-weighted value.
    pub fn expected_value(&self) -> f64 {
        self.value * f64::from(self.probability) / 100.0
    }
}

/// Create form payload. Owner and audit columns are filled in by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpportunityDraft {
    pub name: String,
    pub company: String,
    pub contact: String,
    pub value: f64,
    #[serde(default)]
    pub stage: Stage,
    #[serde(default = "default_probability")]
    pub probability: i16,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
}

fn default_probability() -> i16 {
    DEFAULT_PROBABILITY
}

impl OpportunityDraft {
    pub fn new(
        name: impl Into<String>,
        company: impl Into<String>,
        contact: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            company: company.into(),
            contact: contact.into(),
            value,
            stage: Stage::default(),
            probability: DEFAULT_PROBABILITY,
            description: None,
            close_date: None,
        }
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<i16>,
    /// `Some(None)` (JSON `null`) clears the description.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    /// `Some(None)` (JSON `null`) clears the close date.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub close_date: Option<Option<NaiveDate>>,
}

/// Keeps an explicit `null` apart from a missing key: a present field always
/// deserialises to `Some`, with `null` becoming `Some(None)`.
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl OpportunityPatch {
    pub fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, target: &mut Opportunity) {
        if let Some(name) = &self.name {
            target.name = name.trim().to_string();
        }
        if let Some(company) = &self.company {
            target.company = company.trim().to_string();
        }
        if let Some(contact) = &self.contact {
            target.contact = contact.trim().to_string();
        }
        if let Some(value) = self.value {
            target.value = value;
        }
        if let Some(stage) = self.stage {
            target.stage = stage;
        }
        if let Some(probability) = self.probability {
            target.probability = probability;
        }
        if let Some(description) = &self.description {
            target.description = description.clone();
        }
        if let Some(close_date) = self.close_date {
            target.close_date = close_date;
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn opportunity(name: &str, value: f64, stage: Stage) -> Opportunity {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Opportunity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            company: format!("{name} SA"),
            contact: "Marta Ríos".to_string(),
            value,
            stage,
            probability: DEFAULT_PROBABILITY,
            description: None,
            close_date: None,
            owner_id: Uuid::nil(),
            last_modified_by: None,
            created_at: ts,
            updated_at: ts,
            owner: None,
            modifier: None,
        }
    }
}
