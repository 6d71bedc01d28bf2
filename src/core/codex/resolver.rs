//! Relationship resolution for freshly imported templates.
//!
//! Extraction leaves encounters with name lists (`related_npcs`,
//! `related_items`, `related_locations`, `related_events`). Resolution turns
//! every name into an explicit join row. Unlike clone-time joins, nothing is
//! skipped here: an ambiguous or unknown name means the extraction is wrong
//! and the whole resolution fails.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::normalize::normalize_name;
use super::{CodexError, CodexResult};
use crate::database::{EncounterReferencesRecord, EntityKind, JoinSpec, NamedEntityRecord};

/// Entity kinds an encounter can reference by name
pub const ENCOUNTER_REFERENCE_KINDS: [EntityKind; 4] = [
    EntityKind::Npc,
    EntityKind::Item,
    EntityKind::Location,
    EntityKind::Event,
];

// ============================================================================
// Name Lookup
// ============================================================================

/// Normalized name → row id for one table of one template campaign
#[derive(Debug, Clone)]
pub struct NameLookup {
    kind: EntityKind,
    ids: HashMap<String, String>,
}

impl NameLookup {
    /// Build a lookup from named rows.
    ///
    /// Fails with [`CodexError::DuplicateName`] when two rows share a key.
    /// Rows whose name normalizes to nothing cannot be referenced and are left
    /// out.
    pub fn from_records<I>(kind: EntityKind, records: I) -> CodexResult<Self>
    where
        I: IntoIterator<Item = NamedEntityRecord>,
    {
        let mut ids: HashMap<String, String> = HashMap::new();
        for record in records {
            let key = normalize_name(&record.name);
            if key.is_empty() {
                continue;
            }
            if let Some(first_id) = ids.get(&key) {
                return Err(CodexError::DuplicateName {
                    kind,
                    name: record.name,
                    first_id: first_id.clone(),
                    second_id: record.id,
                });
            }
            ids.insert(key, record.id);
        }
        Ok(Self { kind, ids })
    }

    /// Load the lookup for `kind` restricted to one template campaign.
    pub async fn load(
        conn: &mut SqliteConnection,
        kind: EntityKind,
        template_campaign_id: &str,
    ) -> CodexResult<Self> {
        let sql = format!(
            "SELECT id, name FROM {} WHERE template_campaign_id = ? AND deleted_at IS NULL ORDER BY created_at, id",
            kind.table()
        );
        let records = sqlx::query_as::<_, NamedEntityRecord>(&sql)
            .bind(template_campaign_id)
            .fetch_all(&mut *conn)
            .await?;
        Self::from_records(kind, records)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Id of the row whose name normalizes like `name`
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.ids.get(&normalize_name(name)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ============================================================================
// Encounter Resolution
// ============================================================================

/// Result of resolving one template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveStats {
    pub encounters_processed: usize,
    /// Join rows added; pairs that already existed are not counted
    pub joins_inserted: usize,
}

/// Turn every encounter's extracted names into join rows.
///
/// Runs on the caller's connection; callers wrap it in a transaction so an
/// error leaves no partial joins.
pub async fn resolve_template_relationships(
    conn: &mut SqliteConnection,
    template_campaign_id: &str,
    cancel: &CancellationToken,
) -> CodexResult<ResolveStats> {
    let encounters = sqlx::query_as::<_, EncounterReferencesRecord>(
        r#"
        SELECT id, name, related_npcs, related_items, related_locations, related_events
        FROM encounters
        WHERE template_campaign_id = ? AND deleted_at IS NULL
        ORDER BY created_at, id
        "#
    )
    .bind(template_campaign_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut lookups = Vec::with_capacity(ENCOUNTER_REFERENCE_KINDS.len());
    for kind in ENCOUNTER_REFERENCE_KINDS {
        lookups.push(NameLookup::load(conn, kind, template_campaign_id).await?);
    }

    let mut stats = ResolveStats::default();

    for encounter in &encounters {
        if cancel.is_cancelled() {
            return Err(CodexError::Cancelled);
        }

        for lookup in &lookups {
            let names = parse_name_list(related_names(encounter, lookup.kind()))?;
            if names.is_empty() {
                continue;
            }

            let join = JoinSpec::for_encounter_reference(lookup.kind())
                .ok_or_else(|| {
                    CodexError::Extraction(format!(
                        "no join table for encounter references to {}",
                        lookup.kind()
                    ))
                })?;
            let insert_sql = format!(
                "INSERT INTO {table} ({left}, {right}) VALUES (?, ?) ON CONFLICT({left}, {right}) DO NOTHING",
                table = join.table,
                left = join.left.column,
                right = join.right.column,
            );

            for name in &names {
                let target_id = lookup.resolve(name).ok_or_else(|| {
                    CodexError::UnresolvedReference {
                        source_kind: EntityKind::Encounter,
                        source_id: encounter.id.clone(),
                        source_name: encounter.name.clone(),
                        target_kind: lookup.kind(),
                        name: name.clone(),
                    }
                })?;

                let result = sqlx::query(&insert_sql)
                    .bind(&encounter.id)
                    .bind(target_id)
                    .execute(&mut *conn)
                    .await?;
                stats.joins_inserted += result.rows_affected() as usize;
            }
        }

        stats.encounters_processed += 1;
        debug!(encounter_id = %encounter.id, "Resolved encounter references");
    }

    Ok(stats)
}

fn related_names(encounter: &EncounterReferencesRecord, kind: EntityKind) -> Option<&str> {
    match kind {
        EntityKind::Npc => encounter.related_npcs.as_deref(),
        EntityKind::Item => encounter.related_items.as_deref(),
        EntityKind::Location => encounter.related_locations.as_deref(),
        EntityKind::Event => encounter.related_events.as_deref(),
        EntityKind::Session | EntityKind::Encounter => None,
    }
}

/// Parse a stored JSON name array. NULL, blank and `null` mean no names;
/// blank entries are dropped.
pub(crate) fn parse_name_list(raw: Option<&str>) -> CodexResult<Vec<String>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Vec::new());
    };
    let names: Option<Vec<String>> = serde_json::from_str(raw)?;
    Ok(names
        .unwrap_or_default()
        .into_iter()
        .filter(|name| !name.trim().is_empty())
        .collect())
}
