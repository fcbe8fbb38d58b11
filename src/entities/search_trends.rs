use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One row per normalized search query.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "search_trends")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub query: String,
    pub search_count: i64,
    pub daily_count: i64,
    pub weekly_count: i64,
    pub last_searched: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
