//! Adventure Codex
//!
//! Template campaigns ("Adventure Codices") are tenant-less content graphs
//! built from an extracted adventure. This module covers their whole
//! lifecycle:
//!
//! ```text
//! extraction → import (template rows) → relationship resolution (join rows)
//!            → clone into tenant campaign (fresh ids, remapped joins)
//! ```
//!
//! # Key Types
//!
//! - [`CodexService`] - entry points used by the HTTP layer and the CLI
//! - [`IdRemapper`] - per-kind old-id → new-id mapping for one clone
//! - [`NameLookup`] - normalized name → id index for one template table
//! - [`CodexExtractor`] - seam to the external structured-extraction step
//!
//! Every operation that writes runs inside a single transaction, so a failed
//! import, resolution or clone leaves no rows behind.

pub mod cloner;
pub mod extraction;
pub mod import;
pub mod normalize;
pub mod remap;
pub mod resolver;
pub mod service;

use thiserror::Error;

use crate::database::EntityKind;

pub use cloner::{CloneScope, CloneStats, JoinCloneStats};
pub use extraction::{AdventureExtraction, CodexExtractor, JsonExtractor};
pub use import::ImportSummary;
pub use normalize::normalize_name;
pub use remap::IdRemapper;
pub use resolver::{NameLookup, ResolveStats};
pub use service::{
    CloneOutcome, CloneRequest, CodexOptions, CodexService, IngestOutcome, ResolveOutcome,
    ResolveRequest,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum CodexError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Template campaign not found: {0}")]
    TemplateNotFound(String),

    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    #[error("Destination campaign {0} already has content")]
    DestinationNotEmpty(String),

    #[error("Duplicate {kind} name '{name}' (rows {first_id} and {second_id})")]
    DuplicateName {
        kind: EntityKind,
        name: String,
        first_id: String,
        second_id: String,
    },

    #[error("{source_kind} '{source_name}' ({source_id}) references unknown {target_kind} '{name}'")]
    UnresolvedReference {
        source_kind: EntityKind,
        source_id: String,
        source_name: String,
        target_kind: EntityKind,
        name: String,
    },

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type CodexResult<T> = std::result::Result<T, CodexError>;
