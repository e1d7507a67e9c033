//! Demo data: one admin, one employee, a handful of records across every stage.

use chrono::{Duration, Utc};
use entity::users;
use platform_authn::{CurrentUser, hash_password};
use platform_db::{DbPool, NewUser};
use products_crm::{OpportunityDraft, Stage};
use tracing::info;

use crate::{convert::current_user, realtime::ChangeHub, service};

pub const ADMIN_EMAIL: &str = "admin@nexo.test";
pub const EMPLOYEE_EMAIL: &str = "ventas@nexo.test";
pub const DEMO_PASSWORD: &str = "demo1234";

struct Sample {
    name: &'static str,
    company: &'static str,
    contact: &'static str,
    value: f64,
    stage: Stage,
    probability: i16,
    closes_in_days: i64,
}

const SAMPLES: [Sample; 6] = [
    Sample {
        name: "Flota Transportes Andes",
        company: "Transportes Andes SRL",
        contact: "Lucía Ferreyra",
        value: 18500.0,
        stage: Stage::Prospecto,
        probability: 10,
        closes_in_days: 60,
    },
    Sample {
        name: "Integral Comercio Don Elio",
        company: "Panadería Don Elio",
        contact: "Elio Suárez",
        value: 2400.0,
        stage: Stage::Calificado,
        probability: 30,
        closes_in_days: 45,
    },
    Sample {
        name: "Mala praxis Clínica San Roque",
        company: "Clínica San Roque",
        contact: "Inés Molina",
        value: 32000.0,
        stage: Stage::Propuesta,
        probability: 50,
        closes_in_days: 30,
    },
    Sample {
        name: "ART Metalúrgica Oeste",
        company: "Metalúrgica Oeste SA",
        contact: "Ramiro Castro",
        value: 27750.5,
        stage: Stage::Negociacion,
        probability: 75,
        closes_in_days: 14,
    },
    Sample {
        name: "Caución Estudio Paz",
        company: "Estudio Contable Paz",
        contact: "Mariana Paz",
        value: 5600.0,
        stage: Stage::CerradoGanado,
        probability: 100,
        closes_in_days: -5,
    },
    Sample {
        name: "Granizo Agro La Pampa",
        company: "Agro La Pampa",
        contact: "Hernán Gil",
        value: 12000.0,
        stage: Stage::CerradoPerdido,
        probability: 0,
        closes_in_days: -20,
    },
];

/// Idempotent on users: existing accounts are reused. Records are only
/// created for an employee who owns none yet.
pub async fn run(pool: &DbPool) -> anyhow::Result<()> {
    let admin = ensure_user(pool, ADMIN_EMAIL, "Administración", users::Role::Admin).await?;
    let employee = ensure_user(pool, EMPLOYEE_EMAIL, "Equipo Ventas", users::Role::Employee).await?;

    let existing = service::list_opportunities(pool, &employee, false).await?;
    if !existing.is_empty() {
        info!(count = existing.len(), "demo opportunities already present");
        return Ok(());
    }

    let hub = ChangeHub::new(1);
    let today = Utc::now().date_naive();
    for (index, sample) in SAMPLES.iter().enumerate() {
        let owner = if index % 2 == 0 { &employee } else { &admin };
        let mut draft =
            OpportunityDraft::new(sample.name, sample.company, sample.contact, sample.value);
        draft.stage = sample.stage;
        draft.probability = sample.probability;
        draft.close_date = Some(today + Duration::days(sample.closes_in_days));
        service::create_opportunity(pool, &hub, owner, draft).await?;
    }
    info!(count = SAMPLES.len(), "demo opportunities created");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    email: &str,
    name: &str,
    role: users::Role,
) -> anyhow::Result<CurrentUser> {
    if let Some(row) = platform_db::find_user_by_email(pool, email).await? {
        return Ok(current_user(&row));
    }
    let row = platform_db::insert_user(
        pool,
        NewUser {
            email,
            name,
            role,
            password_hash: hash_password(DEMO_PASSWORD)?,
        },
    )
    .await?;
    info!(email, "demo user created");
    Ok(current_user(&row))
}
