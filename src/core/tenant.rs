//! Tenant business logic - creating, finding, and removing tenants.
//!
//! Removing a tenant removes every bill they own in the same database
//! transaction.

use crate::{
    config::settings::Settings,
    entities::{Bill, Tenant, bill, tenant},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument, warn};

/// Retrieves all tenants, ordered alphabetically by name.
pub async fn get_all_tenants(db: &DatabaseConnection) -> Result<Vec<tenant::Model>> {
    Tenant::find()
        .order_by_asc(tenant::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a tenant by exact name.
pub async fn get_tenant_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<tenant::Model>> {
    Tenant::find()
        .filter(tenant::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a tenant by ID.
pub async fn get_tenant_by_id(
    db: &DatabaseConnection,
    tenant_id: i64,
) -> Result<Option<tenant::Model>> {
    Tenant::find_by_id(tenant_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_tenant_by_name`] but a missing tenant is an error.
pub async fn require_tenant(db: &DatabaseConnection, name: &str) -> Result<tenant::Model> {
    get_tenant_by_name(db, name)
        .await?
        .ok_or_else(|| Error::TenantNotFound {
            name: name.trim().to_string(),
        })
}

/// Creates a tenant with a trimmed, non-empty, unused name.
#[instrument(skip(db))]
pub async fn create_tenant(
    db: &DatabaseConnection,
    name: &str,
    discord_user_id: Option<String>,
) -> Result<tenant::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid("Tenant name cannot be empty"));
    }

    if get_tenant_by_name(db, name).await?.is_some() {
        return Err(Error::TenantExists {
            name: name.to_string(),
        });
    }

    let model = tenant::ActiveModel {
        name: Set(name.to_string()),
        discord_user_id: Set(discord_user_id),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(tenant_id = created.id, "Created tenant '{}'", created.name);
    Ok(created)
}

/// Deletes a tenant and all of their bills.
///
/// Returns the number of bills removed.
#[instrument(skip(db))]
pub async fn delete_tenant(db: &DatabaseConnection, tenant_id: i64) -> Result<u64> {
    let txn = db.begin().await?;

    let tenant = Tenant::find_by_id(tenant_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::TenantNotFound {
            name: tenant_id.to_string(),
        })?;

    let removed = Bill::delete_many()
        .filter(bill::Column::TenantId.eq(tenant_id))
        .exec(&txn)
        .await?
        .rows_affected;

    tenant.delete(&txn).await?;
    txn.commit().await?;

    info!(tenant_id, removed, "Deleted tenant and their bills");
    Ok(removed)
}

/// Creates the tenants listed in the settings, skipping names that already exist.
///
/// Returns the number of tenants created.
pub async fn seed_tenants(db: &DatabaseConnection, settings: &Settings) -> Result<usize> {
    let mut created = 0;
    for cfg in &settings.tenants {
        if get_tenant_by_name(db, &cfg.name).await?.is_some() {
            warn!("Tenant '{}' already exists. Skipping.", cfg.name);
            continue;
        }
        create_tenant(db, &cfg.name, cfg.discord_user_id.clone()).await?;
        created += 1;
    }
    Ok(created)
}
