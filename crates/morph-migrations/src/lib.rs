//! Database migrations for the Metamorphosis registration backend

pub use sea_orm_migration::prelude::*;

mod migration;

pub use migration::Migrator;
