use sea_orm::prelude::{Date, DateTimeWithTimeZone, *};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "opportunities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub contact: String,
    #[sea_orm(column_type = "Double")]
    pub value: f64,
    pub stage: Stage,
    pub probability: i16,
    pub description: Option<String>,
    pub close_date: Option<Date>,
    #[sea_orm(indexed)]
    pub owner_id: Uuid,
    pub last_modified_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::LastModifiedBy",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Modifier,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Stage {
    #[sea_orm(string_value = "Prospecto")]
    Prospecto,
    #[sea_orm(string_value = "Calificado")]
    Calificado,
    #[sea_orm(string_value = "Propuesta")]
    Propuesta,
    #[sea_orm(string_value = "Negociación")]
    Negociacion,
    #[sea_orm(string_value = "Cerrado Ganado")]
    CerradoGanado,
    #[sea_orm(string_value = "Cerrado Perdido")]
    CerradoPerdido,
}

impl ActiveModelBehavior for ActiveModel {}
