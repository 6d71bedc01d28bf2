//! Campaign database operations
//!
//! This module provides CRUD operations for template and tenant campaigns.

use sqlx::SqliteConnection;

use super::models::CampaignRecord;
use super::schema::{CLONE_ORDER, JOIN_TABLES};
use super::Database;

/// Extension trait for campaign-related database operations
pub trait CampaignOps {
    fn create_campaign(&self, campaign: &CampaignRecord) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_campaign(&self, id: &str) -> impl std::future::Future<Output = Result<Option<CampaignRecord>, sqlx::Error>> + Send;
    fn list_templates(&self) -> impl std::future::Future<Output = Result<Vec<CampaignRecord>, sqlx::Error>> + Send;
    fn list_tenant_campaigns(&self, tenant_id: &str) -> impl std::future::Future<Output = Result<Vec<CampaignRecord>, sqlx::Error>> + Send;
    fn delete_campaign(&self, id: &str) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
}

impl CampaignOps for Database {
    async fn create_campaign(&self, campaign: &CampaignRecord) -> Result<(), sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        insert_campaign(&mut conn, campaign).await
    }

    async fn get_campaign(&self, id: &str) -> Result<Option<CampaignRecord>, sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        fetch_campaign(&mut conn, id).await
    }

    async fn list_templates(&self) -> Result<Vec<CampaignRecord>, sqlx::Error> {
        sqlx::query_as::<_, CampaignRecord>(
            r#"
            SELECT * FROM campaigns
            WHERE tenant_id IS NULL AND template_campaign_id IS NULL AND deleted_at IS NULL
            ORDER BY name
            "#
        )
        .fetch_all(self.pool())
        .await
    }

    async fn list_tenant_campaigns(&self, tenant_id: &str) -> Result<Vec<CampaignRecord>, sqlx::Error> {
        sqlx::query_as::<_, CampaignRecord>(
            "SELECT * FROM campaigns WHERE tenant_id = ? AND deleted_at IS NULL ORDER BY updated_at DESC"
        )
        .bind(tenant_id)
        .fetch_all(self.pool())
        .await
    }

    async fn delete_campaign(&self, id: &str) -> Result<(), sqlx::Error> {
        // Use transaction to ensure atomic deletion of campaign and all related data
        let mut tx = self.pool().begin().await?;

        // Join rows first, from either side
        for join in JOIN_TABLES.iter() {
            for endpoint in [&join.left, &join.right] {
                let sql = format!(
                    "DELETE FROM {} WHERE {} IN (SELECT id FROM {} WHERE campaign_id = ?1 OR template_campaign_id = ?1)",
                    join.table,
                    endpoint.column,
                    endpoint.kind.table(),
                );
                sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
            }
        }

        // Content tables in reverse clone order so references go first
        for table in CLONE_ORDER.iter().rev() {
            let sql = format!(
                "DELETE FROM {} WHERE campaign_id = ?1 OR template_campaign_id = ?1",
                table.table()
            );
            sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        }

        sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Insert a campaign row on an open connection or transaction.
pub(crate) async fn insert_campaign(
    conn: &mut SqliteConnection,
    campaign: &CampaignRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO campaigns (id, tenant_id, template_campaign_id, name, system, description,
            created_by, created_at, updated_at, deleted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#
    )
    .bind(&campaign.id)
    .bind(&campaign.tenant_id)
    .bind(&campaign.template_campaign_id)
    .bind(&campaign.name)
    .bind(&campaign.system)
    .bind(&campaign.description)
    .bind(&campaign.created_by)
    .bind(&campaign.created_at)
    .bind(&campaign.updated_at)
    .bind(&campaign.deleted_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Record the template a tenant campaign was cloned from.
pub(crate) async fn set_template_source(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    template_campaign_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE campaigns SET template_campaign_id = ?, updated_at = ? WHERE id = ?")
        .bind(template_campaign_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(campaign_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn fetch_campaign(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<CampaignRecord>, sqlx::Error> {
    sqlx::query_as::<_, CampaignRecord>(
        "SELECT * FROM campaigns WHERE id = ? AND deleted_at IS NULL"
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}
