//! Core Records
//!
//! Database records for campaigns and the slices of content rows read by the
//! Adventure Codex pipeline.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Campaign Record
// ============================================================================

/// Campaign database record.
///
/// A template campaign ("Adventure Codex") has neither `tenant_id` nor
/// `template_campaign_id`. A tenant campaign is owned by exactly one tenant and
/// may record the template it was instantiated from.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CampaignRecord {
    pub id: String,
    pub tenant_id: Option<String>,
    pub template_campaign_id: Option<String>,
    pub name: String,
    pub system: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl CampaignRecord {
    /// New tenant-less template campaign
    pub fn new_template(name: String, system: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: None,
            template_campaign_id: None,
            name,
            system,
            description: None,
            created_by: None,
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
        }
    }

    /// New campaign owned by the tenant in `context`
    pub fn new_tenant(context: &TenantContext, name: String, system: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: Some(context.tenant_id.clone()),
            template_campaign_id: None,
            name,
            system,
            description: None,
            created_by: Some(context.actor_id.clone()),
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Record the template this campaign was instantiated from
    pub fn instantiated_from(mut self, template_campaign_id: impl Into<String>) -> Self {
        self.template_campaign_id = Some(template_campaign_id.into());
        self
    }

    pub fn is_template(&self) -> bool {
        self.tenant_id.is_none() && self.template_campaign_id.is_none()
    }

    pub fn is_owned_by(&self, tenant_id: &str) -> bool {
        self.tenant_id.as_deref() == Some(tenant_id)
    }
}

// ============================================================================
// Tenant Context
// ============================================================================

/// Authenticated tenant and acting user, stamped onto created rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContext {
    pub tenant_id: String,
    pub actor_id: String,
}

impl TenantContext {
    pub fn new(tenant_id: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            actor_id: actor_id.into(),
        }
    }
}

// ============================================================================
// Content Slices
// ============================================================================

/// Id and display name of any content row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NamedEntityRecord {
    pub id: String,
    pub name: String,
}

/// An encounter together with its extracted cross-reference names.
/// The `related_*` fields hold JSON string arrays.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EncounterReferencesRecord {
    pub id: String,
    pub name: String,
    pub related_npcs: Option<String>,
    pub related_items: Option<String>,
    pub related_locations: Option<String>,
    pub related_events: Option<String>,
}
