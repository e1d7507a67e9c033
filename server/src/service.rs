//! Opportunity persistence. Every mutation writes its activity-log row in the
//! same transaction and publishes to the change hub only after commit.

use std::collections::HashMap;

use chrono::Utc;
use entity::{activity_logs, opportunities, users};
use platform_api::{ApiError, ApiResult};
use platform_authn::CurrentUser;
use platform_db::DbPool;
use products_crm::{
    ActivityAction, ActivityLog, ChangeEvent, Opportunity, OpportunityDraft, OpportunityPatch,
    User,
    activity::{OPPORTUNITY_ENTITY, creation_details, deletion_details, update_details},
    validation::{validate_draft, validate_patch},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    convert::{
        action_to_row, activity_from_row, opportunity_from_row, party_from_current,
        party_from_row, stage_to_row, user_from_row,
    },
    realtime::ChangeHub,
};

pub const RECENT_ACTIVITY_LIMIT: u64 = 100;

fn db_error(err: sea_orm::DbErr) -> ApiError {
    ApiError::internal(err)
}

/// Records visible to `viewer`, newest first. `see_all` only widens the
/// result for admins and also joins the last-modifier summary.
pub async fn list_opportunities(
    pool: &DbPool,
    viewer: &CurrentUser,
    see_all: bool,
) -> ApiResult<Vec<Opportunity>> {
    let see_all = see_all && viewer.is_admin();
    let mut query = opportunities::Entity::find().order_by_desc(opportunities::Column::CreatedAt);
    if !see_all {
        query = query.filter(opportunities::Column::OwnerId.eq(viewer.id));
    }
    let rows = query.all(pool).await.map_err(db_error)?;
    let records = rows.into_iter().map(opportunity_from_row).collect();
    attach_parties(pool, records, see_all).await
}

pub async fn get_opportunity(
    pool: &DbPool,
    viewer: &CurrentUser,
    id: Uuid,
) -> ApiResult<Opportunity> {
    let row = find_visible(pool, viewer, id).await?;
    let mut records =
        attach_parties(pool, vec![opportunity_from_row(row)], viewer.is_admin()).await?;
    records.pop().ok_or(ApiError::NotFound)
}

#[instrument(skip_all, fields(user_id = %actor.id))]
pub async fn create_opportunity(
    pool: &DbPool,
    hub: &ChangeHub,
    actor: &CurrentUser,
    draft: OpportunityDraft,
) -> ApiResult<Opportunity> {
    validate_draft(&draft).map_err(|err| ApiError::validation(err.to_string()))?;
    let now = Utc::now();
    let txn = pool.begin().await.map_err(db_error)?;
    let row = opportunities::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(draft.name.trim().to_string()),
        company: Set(draft.company.trim().to_string()),
        contact: Set(draft.contact.trim().to_string()),
        value: Set(draft.value),
        stage: Set(stage_to_row(draft.stage)),
        probability: Set(draft.probability),
        description: Set(draft.description),
        close_date: Set(draft.close_date),
        owner_id: Set(actor.id),
        last_modified_by: Set(Some(actor.id)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(db_error)?;

    let mut record = opportunity_from_row(row);
    record_activity(
        &txn,
        actor,
        ActivityAction::Create,
        &record,
        creation_details(&record),
    )
    .await?;
    txn.commit().await.map_err(db_error)?;

    record.owner = Some(party_from_current(actor));
    record.modifier = Some(party_from_current(actor));
    info!(opportunity_id = %record.id, user_id = %actor.id, "opportunity created");
    hub.publish(ChangeEvent::inserted(record.clone()));
    Ok(record)
}

#[instrument(skip(pool, hub, actor, patch), fields(user_id = %actor.id))]
pub async fn update_opportunity(
    pool: &DbPool,
    hub: &ChangeHub,
    actor: &CurrentUser,
    id: Uuid,
    patch: OpportunityPatch,
) -> ApiResult<Opportunity> {
    validate_patch(&patch).map_err(|err| ApiError::validation(err.to_string()))?;
    let txn = pool.begin().await.map_err(db_error)?;
    let row = find_visible(&txn, actor, id).await?;
    let before = opportunity_from_row(row.clone());
    let mut after = before.clone();
    patch.apply_to(&mut after);
    after.last_modified_by = Some(actor.id);
    after.updated_at = Utc::now();

    let mut active: opportunities::ActiveModel = row.into();
    active.name = Set(after.name.clone());
    active.company = Set(after.company.clone());
    active.contact = Set(after.contact.clone());
    active.value = Set(after.value);
    active.stage = Set(stage_to_row(after.stage));
    active.probability = Set(after.probability);
    active.description = Set(after.description.clone());
    active.close_date = Set(after.close_date);
    active.last_modified_by = Set(after.last_modified_by);
    active.updated_at = Set(after.updated_at.into());
    let saved = active.update(&txn).await.map_err(db_error)?;

    let mut record = opportunity_from_row(saved);
    record_activity(
        &txn,
        actor,
        ActivityAction::Update,
        &record,
        update_details(&before, &record),
    )
    .await?;
    txn.commit().await.map_err(db_error)?;

    record.modifier = Some(party_from_current(actor));
    record.owner = if record.owner_id == actor.id {
        Some(party_from_current(actor))
    } else {
        users::Entity::find_by_id(record.owner_id)
            .one(pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(party_from_row)
    };
    info!(opportunity_id = %record.id, user_id = %actor.id, "opportunity updated");
    hub.publish(ChangeEvent::updated(record.clone()));
    Ok(record)
}

#[instrument(skip(pool, hub, actor), fields(user_id = %actor.id))]
pub async fn delete_opportunity(
    pool: &DbPool,
    hub: &ChangeHub,
    actor: &CurrentUser,
    id: Uuid,
) -> ApiResult<()> {
    let txn = pool.begin().await.map_err(db_error)?;
    let row = find_visible(&txn, actor, id).await?;
    let record = opportunity_from_row(row);
    opportunities::Entity::delete_by_id(record.id)
        .exec(&txn)
        .await
        .map_err(db_error)?;
    record_activity(
        &txn,
        actor,
        ActivityAction::Delete,
        &record,
        deletion_details(),
    )
    .await?;
    txn.commit().await.map_err(db_error)?;

    info!(opportunity_id = %record.id, user_id = %actor.id, "opportunity deleted");
    hub.publish(ChangeEvent::deleted(record.id, record.owner_id));
    Ok(())
}

pub async fn recent_activities(pool: &DbPool, limit: u64) -> ApiResult<Vec<ActivityLog>> {
    let rows = activity_logs::Entity::find()
        .order_by_desc(activity_logs::Column::CreatedAt)
        .limit(limit)
        .find_also_related(users::Entity)
        .all(pool)
        .await
        .map_err(db_error)?;
    Ok(rows
        .into_iter()
        .map(|(row, user)| activity_from_row(row, user.as_ref()))
        .collect())
}

pub async fn all_activities(pool: &DbPool) -> ApiResult<Vec<ActivityLog>> {
    let rows = activity_logs::Entity::find()
        .all(pool)
        .await
        .map_err(db_error)?;
    Ok(rows
        .into_iter()
        .map(|row| activity_from_row(row, None))
        .collect())
}

pub async fn all_users(pool: &DbPool) -> ApiResult<Vec<User>> {
    let rows = platform_db::list_users(pool)
        .await
        .map_err(ApiError::internal)?;
    Ok(rows.iter().map(user_from_row).collect())
}

/// Admins see any record; everyone else gets 404 for records they do not own.
async fn find_visible<C: ConnectionTrait>(
    conn: &C,
    viewer: &CurrentUser,
    id: Uuid,
) -> ApiResult<opportunities::Model> {
    opportunities::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_error)?
        .filter(|row| viewer.is_admin() || row.owner_id == viewer.id)
        .ok_or(ApiError::NotFound)
}

async fn attach_parties(
    pool: &DbPool,
    mut records: Vec<Opportunity>,
    with_modifier: bool,
) -> ApiResult<Vec<Opportunity>> {
    if records.is_empty() {
        return Ok(records);
    }
    let mut ids: Vec<Uuid> = records.iter().map(|r| r.owner_id).collect();
    if with_modifier {
        ids.extend(records.iter().filter_map(|r| r.last_modified_by));
    }
    ids.sort_unstable();
    ids.dedup();
    let people: HashMap<Uuid, users::Model> = users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(pool)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();
    for record in &mut records {
        record.owner = people.get(&record.owner_id).map(party_from_row);
        if with_modifier {
            record.modifier = record
                .last_modified_by
                .and_then(|id| people.get(&id))
                .map(party_from_row);
        }
    }
    Ok(records)
}

async fn record_activity<C: ConnectionTrait>(
    conn: &C,
    actor: &CurrentUser,
    action: ActivityAction,
    record: &Opportunity,
    details: Value,
) -> ApiResult<()> {
    activity_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(actor.id),
        action: Set(action_to_row(action)),
        entity_type: Set(OPPORTUNITY_ENTITY.to_string()),
        entity_id: Set(record.id),
        entity_name: Set(record.name.clone()),
        details: Set(details),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(db_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_authn::Role;
    use products_crm::Stage;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn actor(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "ana@nexo.test".into(),
            name: "Ana".into(),
            role,
        }
    }

    fn row(owner_id: Uuid, stage: opportunities::Stage) -> opportunities::Model {
        let now = Utc::now();
        opportunities::Model {
            id: Uuid::new_v4(),
            name: "Flota Norte".into(),
            company: "Transportes Norte".into(),
            contact: "Lucía".into(),
            value: 8000.0,
            stage,
            probability: 30,
            description: None,
            close_date: None,
            owner_id,
            last_modified_by: Some(owner_id),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn log_row(user_id: Uuid, entity_id: Uuid, action: activity_logs::Action) -> activity_logs::Model {
        activity_logs::Model {
            id: Uuid::new_v4(),
            user_id,
            action,
            entity_type: OPPORTUNITY_ENTITY.into(),
            entity_id,
            entity_name: "Flota Norte".into(),
            details: serde_json::json!({}),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_database() {
        let pool = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let hub = ChangeHub::new(4);
        let draft = OpportunityDraft::new("ab", "Transportes", "Lucía", 10.0);
        let err = create_opportunity(&pool, &hub, &actor(Role::Employee), draft)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(pool.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn create_writes_activity_and_publishes() {
        let user = actor(Role::Employee);
        let inserted = row(user.id, opportunities::Stage::Prospecto);
        let log = log_row(user.id, inserted.id, activity_logs::Action::Create);
        let pool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![inserted.clone()]])
            .append_query_results([vec![log]])
            .into_connection();
        let hub = ChangeHub::new(4);
        let mut rx = hub.subscribe();

        let draft = OpportunityDraft::new("Flota Norte", "Transportes Norte", "Lucía", 8000.0);
        let created = create_opportunity(&pool, &hub, &user, draft).await.unwrap();
        assert_eq!(created.id, inserted.id);
        assert_eq!(created.owner_name(), "Ana");

        let event = rx.try_recv().unwrap();
        assert_eq!(event, ChangeEvent::inserted(created));
    }

    #[tokio::test]
    async fn employee_cannot_touch_foreign_records() {
        let foreign = row(Uuid::new_v4(), opportunities::Stage::Propuesta);
        let pool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![foreign.clone()]])
            .into_connection();
        let hub = ChangeHub::new(4);
        let mut rx = hub.subscribe();
        let err = update_opportunity(
            &pool,
            &hub,
            &actor(Role::Employee),
            foreign.id,
            OpportunityPatch::stage(Stage::Negociacion),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stage_update_logs_the_transition() {
        let user = actor(Role::Employee);
        let existing = row(user.id, opportunities::Stage::Propuesta);
        let mut saved = existing.clone();
        saved.stage = opportunities::Stage::Negociacion;
        let log = log_row(user.id, existing.id, activity_logs::Action::Update);
        let pool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![saved]])
            .append_query_results([vec![log]])
            .into_connection();
        let hub = ChangeHub::new(4);
        let mut rx = hub.subscribe();

        let updated = update_opportunity(
            &pool,
            &hub,
            &user,
            existing.id,
            OpportunityPatch::stage(Stage::Negociacion),
        )
        .await
        .unwrap();
        assert_eq!(updated.stage, Stage::Negociacion);
        assert_eq!(rx.try_recv().unwrap().kind, products_crm::ChangeKind::Update);

        let log = format!("{:?}", pool.into_transaction_log());
        assert!(log.contains("Propuesta → Negociación"));
    }

    fn user_row(id: Uuid, name: &str) -> users::Model {
        let now = Utc::now();
        users::Model {
            id,
            email: format!("{}@nexo.test", name.to_lowercase()),
            name: name.into(),
            role: users::Role::Employee,
            is_active: true,
            password_hash: String::new(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn admin_update_keeps_the_owner_summary() {
        let owner = Uuid::new_v4();
        let admin = actor(Role::Admin);
        let existing = row(owner, opportunities::Stage::Propuesta);
        let mut saved = existing.clone();
        saved.stage = opportunities::Stage::Negociacion;
        saved.last_modified_by = Some(admin.id);
        let log = log_row(admin.id, existing.id, activity_logs::Action::Update);
        let pool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![saved]])
            .append_query_results([vec![log]])
            .append_query_results([vec![user_row(owner, "Bruno")]])
            .into_connection();
        let hub = ChangeHub::new(4);
        let mut rx = hub.subscribe();

        let updated = update_opportunity(
            &pool,
            &hub,
            &admin,
            existing.id,
            OpportunityPatch::stage(Stage::Negociacion),
        )
        .await
        .unwrap();
        assert_eq!(updated.owner_name(), "Bruno");
        assert_eq!(updated.modifier.as_ref().map(|p| p.name.as_str()), Some("Ana"));

        let event = rx.try_recv().unwrap();
        let pushed = event.record.unwrap();
        assert_eq!(pushed.owner.as_ref().map(|p| p.email.as_str()), Some("bruno@nexo.test"));
    }

    #[tokio::test]
    async fn patched_text_fields_are_trimmed() {
        let user = actor(Role::Employee);
        let existing = row(user.id, opportunities::Stage::Propuesta);
        let mut saved = existing.clone();
        saved.name = "Flota Sur".into();
        let log = log_row(user.id, existing.id, activity_logs::Action::Update);
        let pool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![saved]])
            .append_query_results([vec![log]])
            .into_connection();
        let hub = ChangeHub::new(4);
        let patch = OpportunityPatch {
            name: Some("  Flota Sur  ".into()),
            ..OpportunityPatch::default()
        };

        update_opportunity(&pool, &hub, &user, existing.id, patch)
            .await
            .unwrap();
        let log = format!("{:?}", pool.into_transaction_log());
        assert!(log.contains("\"Flota Sur\""));
        assert!(!log.contains("  Flota Sur  "));
    }

    #[tokio::test]
    async fn admin_deletes_any_record() {
        let owner = Uuid::new_v4();
        let existing = row(owner, opportunities::Stage::Prospecto);
        let admin = actor(Role::Admin);
        let log = log_row(admin.id, existing.id, activity_logs::Action::Delete);
        let pool = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![log]])
            .into_connection();
        let hub = ChangeHub::new(4);
        let mut rx = hub.subscribe();

        delete_opportunity(&pool, &hub, &admin, existing.id)
            .await
            .unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event, ChangeEvent::deleted(existing.id, owner));
    }
}
