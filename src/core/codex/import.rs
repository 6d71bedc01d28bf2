//! Template import.
//!
//! Writes an [`AdventureExtraction`] as a new template campaign. Session and
//! location names on events and encounters are resolved against the rows
//! inserted by the same import; the `related_*` name lists are stored as JSON
//! for the relationship resolver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use super::extraction::AdventureExtraction;
use super::resolver::NameLookup;
use super::{CodexError, CodexResult};
use crate::database::campaigns::insert_campaign;
use crate::database::{CampaignRecord, EntityKind, NamedEntityRecord};

/// Result of importing one extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub template_campaign_id: String,
    pub counts: BTreeMap<EntityKind, usize>,
}

/// Insert the template campaign and all of its content rows.
///
/// `default_system` is used when the extraction carries no system tag.
pub async fn import_template(
    conn: &mut SqliteConnection,
    extraction: &AdventureExtraction,
    default_system: &str,
) -> CodexResult<ImportSummary> {
    extraction.validate()?;

    let system = extraction
        .system
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default_system);

    let mut campaign = CampaignRecord::new_template(extraction.name.trim().to_string(), system.to_string());
    campaign.description = extraction.description.clone();
    insert_campaign(conn, &campaign).await?;

    let template_id = campaign.id.as_str();
    let now = chrono::Utc::now().to_rfc3339();
    let mut counts = BTreeMap::new();

    // Sessions
    let mut sessions = Vec::with_capacity(extraction.sessions.len());
    for session in &extraction.sessions {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO sessions (id, template_campaign_id, name, session_number, summary, notes,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id)
        .bind(template_id)
        .bind(session.name.trim())
        .bind(session.session_number)
        .bind(&session.summary)
        .bind(&session.notes)
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
        sessions.push(NamedEntityRecord { id, name: session.name.clone() });
    }
    counts.insert(EntityKind::Session, sessions.len());
    let session_lookup = NameLookup::from_records(EntityKind::Session, sessions)?;

    // Locations
    let mut locations = Vec::with_capacity(extraction.locations.len());
    for location in &extraction.locations {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO locations (id, template_campaign_id, name, location_type, description, notes,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id)
        .bind(template_id)
        .bind(location.name.trim())
        .bind(&location.location_type)
        .bind(&location.description)
        .bind(&location.notes)
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
        locations.push(NamedEntityRecord { id, name: location.name.clone() });
    }
    counts.insert(EntityKind::Location, locations.len());
    let location_lookup = NameLookup::from_records(EntityKind::Location, locations)?;

    // Events
    for (index, event) in extraction.events.iter().enumerate() {
        let id = Uuid::new_v4().to_string();
        let session_id = resolve_optional(
            &session_lookup,
            event.session.as_deref(),
            EntityKind::Event,
            &id,
            &event.name,
        )?;
        sqlx::query(
            r#"
            INSERT INTO events (id, template_campaign_id, session_id, name, description, event_type,
                sort_order, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id)
        .bind(template_id)
        .bind(session_id)
        .bind(event.name.trim())
        .bind(&event.description)
        .bind(&event.event_type)
        .bind(event.sort_order.unwrap_or(index as i64))
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }
    counts.insert(EntityKind::Event, extraction.events.len());

    // NPCs
    for npc in &extraction.npcs {
        let stats_json = npc.stats.as_ref().map(serde_json::to_string).transpose()?;
        sqlx::query(
            r#"
            INSERT INTO npcs (id, template_campaign_id, name, role, description, motivation,
                stats_json, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(template_id)
        .bind(npc.name.trim())
        .bind(&npc.role)
        .bind(&npc.description)
        .bind(&npc.motivation)
        .bind(stats_json)
        .bind(&npc.notes)
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }
    counts.insert(EntityKind::Npc, extraction.npcs.len());

    // Items
    for item in &extraction.items {
        let properties_json = item.properties.as_ref().map(serde_json::to_string).transpose()?;
        sqlx::query(
            r#"
            INSERT INTO items (id, template_campaign_id, name, item_type, description, rarity,
                properties_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(template_id)
        .bind(item.name.trim())
        .bind(&item.item_type)
        .bind(&item.description)
        .bind(&item.rarity)
        .bind(properties_json)
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }
    counts.insert(EntityKind::Item, extraction.items.len());

    // Encounters
    for encounter in &extraction.encounters {
        let id = Uuid::new_v4().to_string();
        let session_id = resolve_optional(
            &session_lookup,
            encounter.session.as_deref(),
            EntityKind::Encounter,
            &id,
            &encounter.name,
        )?;
        let location_id = resolve_optional(
            &location_lookup,
            encounter.location.as_deref(),
            EntityKind::Encounter,
            &id,
            &encounter.name,
        )?;
        sqlx::query(
            r#"
            INSERT INTO encounters (id, template_campaign_id, session_id, location_id, name,
                description, difficulty, encounter_type, related_npcs, related_items,
                related_locations, related_events, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id)
        .bind(template_id)
        .bind(session_id)
        .bind(location_id)
        .bind(encounter.name.trim())
        .bind(&encounter.description)
        .bind(&encounter.difficulty)
        .bind(&encounter.encounter_type)
        .bind(serde_json::to_string(&encounter.related_npcs)?)
        .bind(serde_json::to_string(&encounter.related_items)?)
        .bind(serde_json::to_string(&encounter.related_locations)?)
        .bind(serde_json::to_string(&encounter.related_events)?)
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }
    counts.insert(EntityKind::Encounter, extraction.encounters.len());

    info!(
        template_campaign_id = %campaign.id,
        name = %campaign.name,
        "Imported adventure codex template"
    );

    Ok(ImportSummary {
        template_campaign_id: campaign.id.clone(),
        counts,
    })
}

/// Resolve an optional name reference made by a row being imported
fn resolve_optional(
    lookup: &NameLookup,
    name: Option<&str>,
    source_kind: EntityKind,
    source_id: &str,
    source_name: &str,
) -> CodexResult<Option<String>> {
    let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
        return Ok(None);
    };
    lookup
        .resolve(name)
        .map(|id| Some(id.to_string()))
        .ok_or_else(|| CodexError::UnresolvedReference {
            source_kind,
            source_id: source_id.to_string(),
            source_name: source_name.to_string(),
            target_kind: lookup.kind(),
            name: name.to_string(),
        })
}
