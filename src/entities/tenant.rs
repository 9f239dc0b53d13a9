//! Tenant entity - Represents one renter whose bills are tracked.
//!
//! Tenants are identified by a unique display name. Deleting a tenant removes
//! all of their bills.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tenant database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    /// Unique identifier for the tenant
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across tenants
    #[sea_orm(unique)]
    pub name: String,
    /// Discord user ID of the tenant, if linked
    pub discord_user_id: Option<String>,
    /// When the tenant was added
    pub created_at: DateTime,
}

/// Defines relationships between Tenant and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One tenant has many bills
    #[sea_orm(has_many = "super::bill::Entity")]
    Bills,
}

impl Related<super::bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
