//! Consultoria call tracker.
//!
//! A small contact list worked by the phone team. Records live only in memory,
//! seeded from the bundled fixture; nothing here is persisted server-side.

use std::{cmp::Ordering, collections::BTreeMap, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::table::SortDirection;

const FIXTURE: &str = include_str!("../data/consultoria.json");

pub const STATUS_ORDER: [&str; 6] = [
    "Nuevo",
    "Contactar Luego",
    "Contactado",
    "Cotizando",
    "Cerrado",
    "Cerrado Ganado",
];
pub const UNGROUPED: &str = "Sin Agrupar";
pub const ALL_RECORDS: &str = "Todos los registros";
pub const DEFAULT_CALLER: &str = "Sistema";
pub const NEW_RECORD_NAME: &str = "NUEVO CLIENTE (Editar)";
pub const NEW_RECORD_STATUS: &str = "Nuevo";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid fixture: {0}")]
    Fixture(#[from] serde_json::Error),
    #[error("no record with id {0}")]
    UnknownRecord(i64),
    #[error("field {0} cannot be edited")]
    ReadOnly(&'static str),
    #[error("field {field} expects text")]
    NotText { field: &'static str },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: i64,
    pub fecha_carga: String,
    pub caller: String,
    pub derivados: String,
    pub razon_social: String,
    pub contacto: String,
    pub tel1: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_alta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tel2: Option<String>,
    /// Columns added from the drawer that have no dedicated slot.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordField {
    Id,
    FechaCarga,
    Caller,
    Derivados,
    RazonSocial,
    Contacto,
    Tel1,
    Status,
    Observaciones,
    FechaAlta,
    Tel2,
}

impl RecordField {
    pub fn key(self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::FechaCarga => "fechaCarga",
            RecordField::Caller => "caller",
            RecordField::Derivados => "derivados",
            RecordField::RazonSocial => "razonSocial",
            RecordField::Contacto => "contacto",
            RecordField::Tel1 => "tel1",
            RecordField::Status => "status",
            RecordField::Observaciones => "observaciones",
            RecordField::FechaAlta => "fechaAlta",
            RecordField::Tel2 => "tel2",
        }
    }
}

impl FromStr for RecordField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [RecordField; 11] = [
            RecordField::Id,
            RecordField::FechaCarga,
            RecordField::Caller,
            RecordField::Derivados,
            RecordField::RazonSocial,
            RecordField::Contacto,
            RecordField::Tel1,
            RecordField::Status,
            RecordField::Observaciones,
            RecordField::FechaAlta,
            RecordField::Tel2,
        ];
        ALL.into_iter().find(|field| field.key() == s).ok_or(())
    }
}

impl ClientRecord {
    pub fn text(&self, field: RecordField) -> &str {
        match field {
            RecordField::Id => "",
            RecordField::FechaCarga => &self.fecha_carga,
            RecordField::Caller => &self.caller,
            RecordField::Derivados => &self.derivados,
            RecordField::RazonSocial => &self.razon_social,
            RecordField::Contacto => &self.contacto,
            RecordField::Tel1 => &self.tel1,
            RecordField::Status => &self.status,
            RecordField::Observaciones => self.observaciones.as_deref().unwrap_or(""),
            RecordField::FechaAlta => self.fecha_alta.as_deref().unwrap_or(""),
            RecordField::Tel2 => self.tel2.as_deref().unwrap_or(""),
        }
    }

    fn compare(&self, other: &Self, field: RecordField) -> Ordering {
        match field {
            RecordField::Id => self.id.cmp(&other.id),
            _ => self.text(field).cmp(other.text(field)),
        }
    }

    fn matches_search(&self, term: &str) -> bool {
        self.razon_social.to_lowercase().contains(term)
            || self.contacto.to_lowercase().contains(term)
            || self.tel1.contains(term)
    }
}

/// Saved view: a fixed caller filter plus an optional grouping column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct View {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub caller: Option<&'static str>,
    pub group_by: Option<RecordField>,
}

pub const VIEWS: [View; 4] = [
    View {
        id: "all",
        name: "Todos",
        description: "Todos los registros.",
        caller: None,
        group_by: Some(RecordField::Status),
    },
    View {
        id: "juan",
        name: "Juan",
        description: "Registros cargados por Juan.",
        caller: Some("Juan"),
        group_by: Some(RecordField::Status),
    },
    View {
        id: "florencia",
        name: "Florencia",
        description: "Registros cargados por Florencia.",
        caller: Some("Florencia"),
        group_by: Some(RecordField::Status),
    },
    View {
        id: "cecilia",
        name: "Cecilia",
        description: "Registros cargados por Cecilia.",
        caller: Some("Cecilia"),
        group_by: Some(RecordField::Status),
    },
];

/// Looks up a view by id; unknown ids fall back to `all`.
pub fn view(id: &str) -> &'static View {
    VIEWS.iter().find(|v| v.id == id).unwrap_or(&VIEWS[0])
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSort {
    pub field: RecordField,
    pub direction: SortDirection,
}

impl RecordSort {
    /// Header click: an ascending sort on the same column flips to descending,
    /// anything else starts ascending.
    pub fn toggle(current: Option<RecordSort>, field: RecordField) -> RecordSort {
        let direction = match current {
            Some(sort) if sort.field == field && sort.direction == SortDirection::Asc => {
                SortDirection::Desc
            }
            _ => SortDirection::Asc,
        };
        RecordSort { field, direction }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group<'a> {
    pub name: String,
    pub items: Vec<&'a ClientRecord>,
}

#[derive(Debug, Default)]
pub struct Tracker {
    records: Vec<ClientRecord>,
}

#[derive(Deserialize)]
struct Fixture {
    clients: Vec<ClientRecord>,
}

impl Tracker {
    pub fn new(records: Vec<ClientRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> Result<Self, TrackerError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self::new(fixture.clients))
    }

    pub fn from_fixture() -> Result<Self, TrackerError> {
        Self::from_json(FIXTURE)
    }

    pub fn records(&self) -> &[ClientRecord] {
        &self.records
    }

    pub fn get(&self, id: i64) -> Option<&ClientRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// View filter, then search, then an optional stable sort.
    pub fn process(
        &self,
        view: &View,
        search: &str,
        sort: Option<RecordSort>,
    ) -> Vec<&ClientRecord> {
        let term = search.to_lowercase();
        let mut rows: Vec<&ClientRecord> = self
            .records
            .iter()
            .filter(|r| view.caller.is_none_or(|caller| r.caller == caller))
            .filter(|r| term.is_empty() || r.matches_search(&term))
            .collect();
        if let Some(sort) = sort {
            rows.sort_by(|a, b| {
                let ord = a.compare(b, sort.field);
                match sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        rows
    }

    pub fn grouped(&self, view: &View, search: &str, sort: Option<RecordSort>) -> Vec<Group<'_>> {
        let rows = self.process(view, search, sort);
        let Some(field) = view.group_by else {
            return vec![Group {
                name: ALL_RECORDS.to_string(),
                items: rows,
            }];
        };

        let mut groups: Vec<Group<'_>> = Vec::new();
        for row in rows {
            let name = match row.text(field) {
                "" => UNGROUPED,
                other => other,
            };
            match groups.iter_mut().find(|g| g.name == name) {
                Some(group) => group.items.push(row),
                None => groups.push(Group {
                    name: name.to_string(),
                    items: vec![row],
                }),
            }
        }
        if field == RecordField::Status {
            groups.sort_by_key(|g| status_rank(&g.name));
        } else {
            groups.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups
    }

    /// Appends a blank record for `view` and returns it for editing.
    pub fn add_record(&mut self, view: &View, today: NaiveDate) -> &ClientRecord {
        let id = self.records.iter().map(|r| r.id).max().unwrap_or(0).max(0) + 1;
        self.records.push(ClientRecord {
            id,
            fecha_carga: today.format("%Y-%m-%d").to_string(),
            caller: view.caller.unwrap_or(DEFAULT_CALLER).to_string(),
            derivados: String::new(),
            razon_social: NEW_RECORD_NAME.to_string(),
            contacto: String::new(),
            tel1: String::new(),
            status: NEW_RECORD_STATUS.to_string(),
            observaciones: None,
            fecha_alta: None,
            tel2: None,
            extra: BTreeMap::new(),
        });
        &self.records[self.records.len() - 1]
    }

    /// Sets one column on a record. Unknown column names land in `extra`.
    pub fn update_field(&mut self, id: i64, field: &str, value: Value) -> Result<(), TrackerError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(TrackerError::UnknownRecord(id))?;
        let Ok(known) = field.parse::<RecordField>() else {
            record.extra.insert(field.to_string(), value);
            return Ok(());
        };
        let text = match value {
            Value::String(text) => text,
            Value::Null => String::new(),
            _ => return Err(TrackerError::NotText { field: known.key() }),
        };
        let optional = |text: String| (!text.is_empty()).then_some(text);
        match known {
            RecordField::Id => return Err(TrackerError::ReadOnly("id")),
            RecordField::FechaCarga => record.fecha_carga = text,
            RecordField::Caller => record.caller = text,
            RecordField::Derivados => record.derivados = text,
            RecordField::RazonSocial => record.razon_social = text,
            RecordField::Contacto => record.contacto = text,
            RecordField::Tel1 => record.tel1 = text,
            RecordField::Status => record.status = text,
            RecordField::Observaciones => record.observaciones = optional(text),
            RecordField::FechaAlta => record.fecha_alta = optional(text),
            RecordField::Tel2 => record.tel2 = optional(text),
        }
        Ok(())
    }
}

fn status_rank(status: &str) -> usize {
    STATUS_ORDER
        .iter()
        .position(|known| *known == status)
        .unwrap_or(99)
}
