//! Database primitives shared by the server and the end-to-end suite.

use std::time::Duration;

use chrono::Utc;
use entity::users;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Shared Postgres pool alias.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing (set {0})")]
    MissingUrl(String),
    #[error("duplicate value: {0}")]
    Duplicate(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    url_key: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connect_timeout: Duration::from_secs(8),
            url_key: "DATABASE_URL".to_string(),
        }
    }
}

impl DatabaseSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_connections);
        Self {
            url: std::env::var(&defaults.url_key).ok(),
            max_connections,
            ..defaults
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn database_url(&self) -> DbResult<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| DbError::MissingUrl(self.url_key.clone()))
    }
}

pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let url = settings.database_url()?;
    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(settings.max_connections)
        .connect_timeout(settings.connect_timeout)
        .sqlx_logging(false);
    let pool = Database::connect(options).await?;
    info!(max_connections = settings.max_connections, "database pool ready");
    Ok(pool)
}

pub async fn find_user_by_email(pool: &DbPool, email: &str) -> DbResult<Option<users::Model>> {
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(pool)
        .await?;
    Ok(user)
}

pub async fn find_user(pool: &DbPool, id: Uuid) -> DbResult<Option<users::Model>> {
    Ok(users::Entity::find_by_id(id).one(pool).await?)
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub role: users::Role,
    pub password_hash: String,
}

pub async fn insert_user(pool: &DbPool, new_user: NewUser<'_>) -> DbResult<users::Model> {
    let now = Utc::now();
    let model = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(new_user.email.to_string()),
        name: Set(new_user.name.to_string()),
        role: Set(new_user.role),
        is_active: Set(true),
        password_hash: Set(new_user.password_hash),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    model.insert(pool).await.map_err(classify_insert)
}

/// Unique-constraint violations become `Duplicate` so callers can answer 409
/// even when a concurrent insert slipped past their existence check.
fn classify_insert(err: DbErr) -> DbError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => DbError::Duplicate(detail),
        _ => DbError::Db(err),
    }
}

pub async fn list_users(pool: &DbPool) -> DbResult<Vec<users::Model>> {
    Ok(users::Entity::find()
        .order_by_desc(users::Column::CreatedAt)
        .all(pool)
        .await?)
}

pub async fn set_user_active(
    pool: &DbPool,
    id: Uuid,
    is_active: bool,
) -> DbResult<Option<users::Model>> {
    let Some(existing) = users::Entity::find_by_id(id).one(pool).await? else {
        return Ok(None);
    };
    let mut active: users::ActiveModel = existing.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now().into());
    Ok(Some(active.update(pool).await?))
}

pub async fn user_count(pool: &DbPool) -> DbResult<u64> {
    Ok(users::Entity::find().count(pool).await?)
}
