use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::opportunity::Opportunity;

pub const OPPORTUNITY_HEADERS: [&str; 12] = [
    "Nombre",
    "Valor",
    "Probabilidad",
    "Etapa",
    "Empresa",
    "Contacto",
    "Propietario",
    "Email Propietario",
    "Fecha de Cierre",
    "Creado",
    "Última Modificación",
    "Modificado Por",
];

pub const RENEWAL_HEADERS: [&str; 6] = [
    "ID",
    "Cliente",
    "Póliza",
    "Fecha Vencimiento",
    "Monto",
    "Riesgo",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer: {0}")]
    Buffer(String),
    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    High,
    Medium,
    Low,
}

impl Risk {
    pub fn as_str(self) -> &'static str {
        match self {
            Risk::High => "high",
            Risk::Medium => "medium",
            Risk::Low => "low",
        }
    }
}

/// Policy up for renewal, as listed on the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Renewal {
    pub id: i64,
    pub client: String,
    pub policy: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub risk: Risk,
}

pub fn export_opportunities<'a>(
    records: impl IntoIterator<Item = &'a Opportunity>,
) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(OPPORTUNITY_HEADERS)?;
    for record in records {
        writer.write_record([
            record.name.clone(),
            record.value.to_string(),
            format!("{}%", record.probability),
            record.stage.label().to_string(),
            record.company.clone(),
            record.contact.clone(),
            record.owner_name().to_string(),
            record.owner_email().to_string(),
            record
                .close_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            timestamp(record.created_at),
            timestamp(record.updated_at),
            record.modifier_name().to_string(),
        ])?;
    }
    finish(writer)
}

pub fn export_renewals<'a>(
    renewals: impl IntoIterator<Item = &'a Renewal>,
) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(RENEWAL_HEADERS)?;
    for renewal in renewals {
        writer.write_record([
            renewal.id.to_string(),
            renewal.client.clone(),
            renewal.policy.clone(),
            renewal.date.format("%Y-%m-%d").to_string(),
            renewal.amount.to_string(),
            renewal.risk.as_str().to_string(),
        ])?;
    }
    finish(writer)
}

/// `prefix_YYYY-MM-DD.csv`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.csv", date.format("%Y-%m-%d"))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
