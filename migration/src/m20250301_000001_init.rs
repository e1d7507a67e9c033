use sea_orm_migration::prelude::*;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id uuid PRIMARY KEY,
    email text NOT NULL UNIQUE,
    name text NOT NULL,
    role varchar(16) NOT NULL DEFAULT 'employee' CHECK (role IN ('admin', 'employee')),
    is_active boolean NOT NULL DEFAULT true,
    password_hash text NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now(),
    updated_at timestamptz NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS opportunities (
    id uuid PRIMARY KEY,
    name text NOT NULL,
    company text NOT NULL,
    contact text NOT NULL,
    value double precision NOT NULL CHECK (value > 0),
    stage varchar(32) NOT NULL DEFAULT 'Prospecto' CHECK (stage IN (
        'Prospecto',
        'Calificado',
        'Propuesta',
        'Negociación',
        'Cerrado Ganado',
        'Cerrado Perdido'
    )),
    probability smallint NOT NULL DEFAULT 30 CHECK (probability BETWEEN 0 AND 100),
    description text NULL,
    close_date date NULL,
    owner_id uuid NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    last_modified_by uuid NULL REFERENCES users(id) ON DELETE SET NULL,
    created_at timestamptz NOT NULL DEFAULT now(),
    updated_at timestamptz NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_opportunities_owner ON opportunities (owner_id);
CREATE INDEX IF NOT EXISTS idx_opportunities_created ON opportunities (created_at DESC);
"#;

const DOWN_SQL: &str = r#"
DROP TABLE IF EXISTS opportunities CASCADE;
DROP TABLE IF EXISTS users CASCADE;
"#;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(UP_SQL)
            .await
            .map(|_| ())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DOWN_SQL)
            .await
            .map(|_| ())
    }
}
