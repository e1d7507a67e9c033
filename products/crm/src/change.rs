use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::opportunity::Opportunity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }
}

/// One row-level change pushed over the realtime feed. Deletes carry no record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Opportunity>,
}

impl ChangeEvent {
    pub fn inserted(record: Opportunity) -> Self {
        Self {
            kind: ChangeKind::Insert,
            id: record.id,
            owner_id: record.owner_id,
            record: Some(record),
        }
    }

    pub fn updated(record: Opportunity) -> Self {
        Self {
            kind: ChangeKind::Update,
            id: record.id,
            owner_id: record.owner_id,
            record: Some(record),
        }
    }

    pub fn deleted(id: Uuid, owner_id: Uuid) -> Self {
        Self {
            kind: ChangeKind::Delete,
            id,
            owner_id,
            record: None,
        }
    }

    pub fn visible_to(&self, owner_id: Uuid) -> bool {
        self.owner_id == owner_id
    }
}
