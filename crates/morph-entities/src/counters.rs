//! Named sequence counters

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the counter that hands out participant PIDs
pub const PARTICIPANT_PID: &str = "participant_pid";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub seq: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
