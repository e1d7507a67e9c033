//! Row ↔ wire conversions between sea-orm models and `products_crm` types.

use chrono::Utc;
use entity::{activity_logs, opportunities, users};
use platform_authn::{CurrentUser, Role};
use products_crm::{ActivityAction, ActivityLog, Opportunity, Party, Stage, User};

pub fn stage_from_row(stage: opportunities::Stage) -> Stage {
    match stage {
        opportunities::Stage::Prospecto => Stage::Prospecto,
        opportunities::Stage::Calificado => Stage::Calificado,
        opportunities::Stage::Propuesta => Stage::Propuesta,
        opportunities::Stage::Negociacion => Stage::Negociacion,
        opportunities::Stage::CerradoGanado => Stage::CerradoGanado,
        opportunities::Stage::CerradoPerdido => Stage::CerradoPerdido,
    }
}

pub fn stage_to_row(stage: Stage) -> opportunities::Stage {
    match stage {
        Stage::Prospecto => opportunities::Stage::Prospecto,
        Stage::Calificado => opportunities::Stage::Calificado,
        Stage::Propuesta => opportunities::Stage::Propuesta,
        Stage::Negociacion => opportunities::Stage::Negociacion,
        Stage::CerradoGanado => opportunities::Stage::CerradoGanado,
        Stage::CerradoPerdido => opportunities::Stage::CerradoPerdido,
    }
}

pub fn role_from_row(role: users::Role) -> Role {
    match role {
        users::Role::Admin => Role::Admin,
        users::Role::Employee => Role::Employee,
    }
}

pub fn role_to_row(role: Role) -> users::Role {
    match role {
        Role::Admin => users::Role::Admin,
        Role::Employee => users::Role::Employee,
    }
}

pub fn action_to_row(action: ActivityAction) -> activity_logs::Action {
    match action {
        ActivityAction::Create => activity_logs::Action::Create,
        ActivityAction::Update => activity_logs::Action::Update,
        ActivityAction::Delete => activity_logs::Action::Delete,
    }
}

pub fn action_from_row(action: activity_logs::Action) -> ActivityAction {
    match action {
        activity_logs::Action::Create => ActivityAction::Create,
        activity_logs::Action::Update => ActivityAction::Update,
        activity_logs::Action::Delete => ActivityAction::Delete,
    }
}

pub fn user_from_row(row: &users::Model) -> User {
    User {
        id: row.id,
        email: row.email.clone(),
        name: row.name.clone(),
        role: role_from_row(row.role),
        is_active: row.is_active,
        created_at: row.created_at.with_timezone(&Utc),
    }
}

pub fn current_user(row: &users::Model) -> CurrentUser {
    CurrentUser {
        id: row.id,
        email: row.email.clone(),
        name: row.name.clone(),
        role: role_from_row(row.role),
    }
}

pub fn party_from_row(row: &users::Model) -> Party {
    Party {
        name: row.name.clone(),
        email: row.email.clone(),
        role: Some(role_from_row(row.role)),
    }
}

pub fn party_from_current(user: &CurrentUser) -> Party {
    Party {
        name: user.name.clone(),
        email: user.email.clone(),
        role: Some(user.role),
    }
}

/// Owner and modifier summaries are left empty; callers join them.
pub fn opportunity_from_row(row: opportunities::Model) -> Opportunity {
    Opportunity {
        id: row.id,
        name: row.name,
        company: row.company,
        contact: row.contact,
        value: row.value,
        stage: stage_from_row(row.stage),
        probability: row.probability,
        description: row.description,
        close_date: row.close_date,
        owner_id: row.owner_id,
        last_modified_by: row.last_modified_by,
        created_at: row.created_at.with_timezone(&Utc),
        updated_at: row.updated_at.with_timezone(&Utc),
        owner: None,
        modifier: None,
    }
}

pub fn activity_from_row(row: activity_logs::Model, user: Option<&users::Model>) -> ActivityLog {
    ActivityLog {
        id: row.id,
        user_id: row.user_id,
        action: action_from_row(row.action),
        entity_type: row.entity_type,
        entity_id: row.entity_id,
        entity_name: row.entity_name,
        details: row.details,
        created_at: row.created_at.with_timezone(&Utc),
        user: user.map(party_from_row),
    }
}
