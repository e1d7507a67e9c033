use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::opportunity::{Opportunity, Party};

pub const OPPORTUNITY_ENTITY: &str = "opportunity";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
}

/// Audit row as shown in the admin panel, with the acting user joined in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: ActivityAction,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub entity_name: String,
    pub details: Value,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Party>,
}

pub fn creation_details(record: &Opportunity) -> Value {
    json!({ "stage": record.stage.label(), "value": record.value })
}

pub fn update_details(before: &Opportunity, after: &Opportunity) -> Value {
    json!({ "changes": diff_changes(before, after) })
}

pub fn deletion_details() -> Value {
    json!({})
}

/// Human-readable summary of the audited fields that differ.
pub fn diff_changes(before: &Opportunity, after: &Opportunity) -> Vec<String> {
    let mut changes = Vec::new();
    if before.name != after.name {
        changes.push(format!("name: {} → {}", before.name, after.name));
    }
    if before.stage != after.stage {
        changes.push(format!("stage: {} → {}", before.stage, after.stage));
    }
    if before.value != after.value {
        changes.push(format!(
            "value: ${} → ${}",
            format_amount(before.value),
            format_amount(after.value)
        ));
    }
    if before.probability != after.probability {
        changes.push(format!(
            "probability: {}% → {}%",
            before.probability, after.probability
        ));
    }
    changes
}

pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
