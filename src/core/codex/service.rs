//! Adventure Codex entry points.
//!
//! Each public operation validates its parameters before touching the
//! database, then runs inside one transaction that is committed only on
//! success. Dropping the transaction on any error or cancellation rolls back
//! everything the operation wrote.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::SqliteConnection;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::cloner::{clone_campaign_graph, CloneScope, CloneStats};
use super::extraction::{AdventureExtraction, CodexExtractor};
use super::import::{import_template, ImportSummary};
use super::resolver::resolve_template_relationships;
use super::{CodexError, CodexResult};
use crate::config::CodexConfig;
use crate::database::campaigns::{fetch_campaign, insert_campaign, set_template_source};
use crate::database::entities::campaign_has_content;
use crate::database::{CampaignRecord, Database, EntityKind, TenantContext};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Clone a template into an existing, empty tenant campaign
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneRequest {
    pub template_campaign_id: String,
    pub tenant_campaign_id: String,
    pub tenant_id: String,
    pub created_by: String,
}

impl CloneRequest {
    fn validate(&self) -> CodexResult<()> {
        require("templateCampaignId", &self.template_campaign_id)?;
        require("tenantCampaignId", &self.tenant_campaign_id)?;
        require("tenantId", &self.tenant_id)?;
        require("createdBy", &self.created_by)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneOutcome {
    pub success: bool,
    pub tenant_campaign_id: String,
    pub entities_cloned: BTreeMap<EntityKind, usize>,
    pub joins_inserted: usize,
    pub joins_skipped: usize,
}

impl CloneOutcome {
    fn new(tenant_campaign_id: String, stats: CloneStats) -> Self {
        Self {
            success: true,
            tenant_campaign_id,
            entities_cloned: stats.entities,
            joins_inserted: stats.joins.inserted,
            joins_skipped: stats.joins.skipped,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub template_campaign_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOutcome {
    pub success: bool,
    pub encounters_processed: usize,
    pub joins_inserted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub import: ImportSummary,
    /// Absent when resolution on import is disabled
    pub resolution: Option<ResolveOutcome>,
}

/// Behaviour switches for the codex pipeline
#[derive(Debug, Clone)]
pub struct CodexOptions {
    /// System tag for extractions that do not name one
    pub default_system: String,
    /// Resolve relationships as part of `ingest`
    pub resolve_on_import: bool,
}

impl Default for CodexOptions {
    fn default() -> Self {
        Self {
            default_system: "Unknown".to_string(),
            resolve_on_import: true,
        }
    }
}

impl From<&CodexConfig> for CodexOptions {
    fn from(config: &CodexConfig) -> Self {
        Self {
            default_system: config.default_system.clone(),
            resolve_on_import: config.resolve_on_import,
        }
    }
}

// ============================================================================
// Codex Service
// ============================================================================

pub struct CodexService {
    pool: Arc<SqlitePool>,
    options: CodexOptions,
}

impl CodexService {
    pub fn new(pool: Arc<SqlitePool>, options: CodexOptions) -> Self {
        Self { pool, options }
    }

    pub fn from_database(db: &Database, options: CodexOptions) -> Self {
        Self::new(Arc::new(db.pool().clone()), options)
    }

    pub fn options(&self) -> &CodexOptions {
        &self.options
    }

    /// Copy a template's entities and joins into a tenant campaign.
    ///
    /// The destination must exist, belong to `tenant_id` and hold no content
    /// yet. Its `template_campaign_id` is set to the source template. On any
    /// failure nothing is written.
    pub async fn clone_adventure_codex_to_tenant(
        &self,
        request: CloneRequest,
        cancel: &CancellationToken,
    ) -> CodexResult<CloneOutcome> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        load_template(&mut tx, &request.template_campaign_id).await?;

        let destination = fetch_campaign(&mut tx, &request.tenant_campaign_id)
            .await?
            .filter(|campaign| campaign.is_owned_by(&request.tenant_id))
            .ok_or_else(|| CodexError::CampaignNotFound(request.tenant_campaign_id.clone()))?;

        if campaign_has_content(&mut tx, &destination.id).await? {
            return Err(CodexError::DestinationNotEmpty(destination.id));
        }

        let scope = CloneScope {
            template_campaign_id: &request.template_campaign_id,
            destination_campaign_id: &destination.id,
            tenant_id: &request.tenant_id,
            actor_id: &request.created_by,
        };
        let stats = clone_campaign_graph(&mut tx, &scope, cancel).await?;
        set_template_source(&mut tx, &destination.id, &request.template_campaign_id).await?;

        tx.commit().await?;

        info!(
            template_campaign_id = %request.template_campaign_id,
            tenant_campaign_id = %destination.id,
            tenant_id = %request.tenant_id,
            joins_inserted = stats.joins.inserted,
            joins_skipped = stats.joins.skipped,
            "Cloned adventure codex to tenant"
        );
        Ok(CloneOutcome::new(destination.id, stats))
    }

    /// Create a new tenant campaign from a template and clone into it.
    ///
    /// The campaign row and its content are written in the same transaction,
    /// so no other clone can target the destination. `name` defaults to the
    /// template's name.
    pub async fn instantiate_codex(
        &self,
        template_campaign_id: &str,
        context: &TenantContext,
        name: Option<String>,
        cancel: &CancellationToken,
    ) -> CodexResult<CloneOutcome> {
        require("templateCampaignId", template_campaign_id)?;
        require("tenantId", &context.tenant_id)?;
        require("actorId", &context.actor_id)?;

        let mut tx = self.pool.begin().await?;

        let template = load_template(&mut tx, template_campaign_id).await?;

        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| template.name.clone());
        let mut campaign = CampaignRecord::new_tenant(context, name, template.system.clone())
            .instantiated_from(template.id.clone());
        campaign.description = template.description.clone();
        insert_campaign(&mut tx, &campaign).await?;

        let scope = CloneScope {
            template_campaign_id: &template.id,
            destination_campaign_id: &campaign.id,
            tenant_id: &context.tenant_id,
            actor_id: &context.actor_id,
        };
        let stats = clone_campaign_graph(&mut tx, &scope, cancel).await?;

        tx.commit().await?;

        info!(
            template_campaign_id = %template.id,
            tenant_campaign_id = %campaign.id,
            tenant_id = %context.tenant_id,
            "Instantiated adventure codex"
        );
        Ok(CloneOutcome::new(campaign.id, stats))
    }

    /// Turn the template's encounter name references into join rows.
    pub async fn resolve_encounter_relationships(
        &self,
        request: ResolveRequest,
        cancel: &CancellationToken,
    ) -> CodexResult<ResolveOutcome> {
        require("templateCampaignId", &request.template_campaign_id)?;

        let mut tx = self.pool.begin().await?;
        load_template(&mut tx, &request.template_campaign_id).await?;
        let stats = resolve_template_relationships(&mut tx, &request.template_campaign_id, cancel).await?;
        tx.commit().await?;

        info!(
            template_campaign_id = %request.template_campaign_id,
            encounters_processed = stats.encounters_processed,
            joins_inserted = stats.joins_inserted,
            "Resolved encounter relationships"
        );
        Ok(ResolveOutcome {
            success: true,
            encounters_processed: stats.encounters_processed,
            joins_inserted: stats.joins_inserted,
        })
    }

    /// Store an extraction as a new template campaign.
    pub async fn import_template(&self, extraction: &AdventureExtraction) -> CodexResult<ImportSummary> {
        let mut tx = self.pool.begin().await?;
        let summary = import_template(&mut tx, extraction, &self.options.default_system).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// Extract, import and (unless disabled) resolve in one transaction.
    pub async fn ingest<E>(
        &self,
        extractor: &E,
        source_text: &str,
        cancel: &CancellationToken,
    ) -> CodexResult<IngestOutcome>
    where
        E: CodexExtractor + ?Sized,
    {
        let extraction = extractor.extract(source_text).await?;
        if cancel.is_cancelled() {
            return Err(CodexError::Cancelled);
        }

        let mut tx = self.pool.begin().await?;
        let import = import_template(&mut tx, &extraction, &self.options.default_system).await?;

        let resolution = if self.options.resolve_on_import {
            let stats = resolve_template_relationships(&mut tx, &import.template_campaign_id, cancel).await?;
            Some(ResolveOutcome {
                success: true,
                encounters_processed: stats.encounters_processed,
                joins_inserted: stats.joins_inserted,
            })
        } else {
            None
        };

        tx.commit().await?;
        Ok(IngestOutcome { import, resolution })
    }
}

fn require(name: &'static str, value: &str) -> CodexResult<()> {
    if value.trim().is_empty() {
        return Err(CodexError::MissingParameter(name));
    }
    Ok(())
}

async fn load_template(
    conn: &mut SqliteConnection,
    template_campaign_id: &str,
) -> CodexResult<CampaignRecord> {
    fetch_campaign(conn, template_campaign_id)
        .await?
        .filter(CampaignRecord::is_template)
        .ok_or_else(|| CodexError::TemplateNotFound(template_campaign_id.to_string()))
}
