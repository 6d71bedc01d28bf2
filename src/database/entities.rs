//! Content row queries
//!
//! Read-side helpers over the content and join tables, addressed by
//! [`EntityKind`] and [`JoinSpec`] rather than raw table names.

use sqlx::SqliteConnection;

use super::models::NamedEntityRecord;
use super::schema::{EntityKind, JoinSpec, CLONE_ORDER};
use super::Database;

/// Which side of the template/tenant split a campaign id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignScope {
    /// Rows instantiated into a tenant campaign (`campaign_id`)
    Tenant,
    /// Rows belonging to a template (`template_campaign_id`)
    Template,
}

impl CampaignScope {
    fn column(&self) -> &'static str {
        match self {
            CampaignScope::Tenant => "campaign_id",
            CampaignScope::Template => "template_campaign_id",
        }
    }
}

/// Extension trait for content row queries
pub trait EntityOps {
    fn count_entities(&self, kind: EntityKind, scope: CampaignScope, campaign_id: &str) -> impl std::future::Future<Output = Result<i64, sqlx::Error>> + Send;
    fn list_entity_names(&self, kind: EntityKind, scope: CampaignScope, campaign_id: &str) -> impl std::future::Future<Output = Result<Vec<NamedEntityRecord>, sqlx::Error>> + Send;
    fn list_join_pairs(&self, join: &JoinSpec, scope: CampaignScope, campaign_id: &str) -> impl std::future::Future<Output = Result<Vec<(String, String)>, sqlx::Error>> + Send;
}

impl EntityOps for Database {
    async fn count_entities(&self, kind: EntityKind, scope: CampaignScope, campaign_id: &str) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ? AND deleted_at IS NULL",
            kind.table(),
            scope.column()
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(campaign_id)
            .fetch_one(self.pool())
            .await
    }

    async fn list_entity_names(&self, kind: EntityKind, scope: CampaignScope, campaign_id: &str) -> Result<Vec<NamedEntityRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT id, name FROM {} WHERE {} = ? AND deleted_at IS NULL ORDER BY name, id",
            kind.table(),
            scope.column()
        );
        sqlx::query_as::<_, NamedEntityRecord>(&sql)
            .bind(campaign_id)
            .fetch_all(self.pool())
            .await
    }

    /// Endpoint pairs of `join` whose left endpoint belongs to the campaign
    async fn list_join_pairs(&self, join: &JoinSpec, scope: CampaignScope, campaign_id: &str) -> Result<Vec<(String, String)>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT j.{left} AS left_id, j.{right} AS right_id
            FROM {table} j
            JOIN {left_table} l ON l.id = j.{left}
            WHERE l.{scope} = ?
            ORDER BY left_id, right_id
            "#,
            left = join.left.column,
            right = join.right.column,
            table = join.table,
            left_table = join.left.kind.table(),
            scope = scope.column(),
        );
        sqlx::query_as::<_, (String, String)>(&sql)
            .bind(campaign_id)
            .fetch_all(self.pool())
            .await
    }
}

/// Whether a tenant campaign already holds any content rows.
pub(crate) async fn campaign_has_content(
    conn: &mut SqliteConnection,
    campaign_id: &str,
) -> Result<bool, sqlx::Error> {
    for table in CLONE_ORDER.iter() {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE campaign_id = ?",
            table.table()
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(campaign_id)
            .fetch_one(&mut *conn)
            .await?;
        if count > 0 {
            return Ok(true);
        }
    }
    Ok(false)
}
