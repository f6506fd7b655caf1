//! Participants entity

use morph_core::DBDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "participants")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Sequential participant identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub pid: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub college_name: String,
    pub year_of_study: i32,
    pub dual_boot: bool,
    pub mail_sent: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DBDateTime,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
