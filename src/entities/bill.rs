//! Bill entity - One month of rent and utilities for one tenant.
//!
//! The month is stored as its calendar label (e.g. `"Baisakh"`) and the status
//! as `"paid"`, `"unpaid"` or `"partially_paid"`. Use [`Model::period`] and
//! [`Model::status`] to get the typed values back.

use crate::core::{calendar::Period, money::PaymentStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bill database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    /// Unique identifier for the bill
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant this bill belongs to
    pub tenant_id: i64,
    /// Calendar month label
    pub month: String,
    /// Calendar year
    pub year: i32,
    /// Monthly rent
    pub rent: f64,
    /// Meter reading at month start
    pub prev_unit: f64,
    /// Meter reading at month end
    pub curr_unit: f64,
    /// Price per electricity unit
    pub electricity_rate: f64,
    /// Water fee
    pub water: f64,
    /// Waste fee
    pub waste: f64,
    /// Whether internet was billed this month
    pub internet: bool,
    /// Internet charge, zero when not billed
    pub internet_amount: f64,
    /// Sum of all charges
    pub total: f64,
    /// Stored payment status
    pub payment_status: String,
    /// Amount paid so far
    pub paid_amount: f64,
    /// Amount still owed
    pub remaining_amount: f64,
    /// Set when a bulk-payment surplus was credited to this bill
    pub is_surplus_adjusted: bool,
    /// When the bill was created
    pub created_at: DateTime,
    /// When the bill was last modified
    pub updated_at: DateTime,
}

impl Model {
    /// Typed billing period of this bill.
    pub fn period(&self) -> crate::errors::Result<Period> {
        Period::parse(&self.month, self.year)
    }

    /// Typed payment status of this bill.
    pub fn status(&self) -> crate::errors::Result<PaymentStatus> {
        self.payment_status.parse()
    }

    /// Metered units for the month, never negative.
    #[must_use]
    pub fn usage(&self) -> f64 {
        (self.curr_unit - self.prev_unit).max(0.0)
    }

    /// Electricity charge for the month.
    #[must_use]
    pub fn electricity_charge(&self) -> f64 {
        crate::core::money::round2(self.usage() * self.electricity_rate)
    }
}

/// Defines relationships between Bill and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each bill belongs to one tenant
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id",
        on_delete = "Cascade"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
