//! Test Fixtures
//!
//! Provides shared test helpers for creating test databases, template and
//! tenant campaigns, content rows and join rows.

use std::sync::Arc;

use tempfile::TempDir;
use uuid::Uuid;

use crate::core::codex::extraction::{
    ExtractedEncounter, ExtractedEvent, ExtractedItem, ExtractedLocation, ExtractedNpc,
    ExtractedSession,
};
use crate::core::codex::{AdventureExtraction, CodexOptions, CodexService};
use crate::database::{
    CampaignOps, CampaignRecord, Database, EntityKind, JoinSpec, TenantContext, JOIN_TABLES,
};

// =============================================================================
// Database Fixtures
// =============================================================================

/// Create a test database in a temporary directory.
/// Returns both the database and the TempDir (which must be kept alive).
pub async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db = Database::new(temp_dir.path())
        .await
        .expect("Failed to create test database");
    (db, temp_dir)
}

pub fn codex_service(db: &Database) -> CodexService {
    CodexService::new(Arc::new(db.pool().clone()), CodexOptions::default())
}

pub fn tenant_context(tenant_id: &str) -> TenantContext {
    TenantContext::new(tenant_id, format!("{tenant_id}-gm"))
}

// =============================================================================
// Campaign Fixtures
// =============================================================================

pub async fn create_template(db: &Database, name: &str) -> CampaignRecord {
    let template = CampaignRecord::new_template(name.to_string(), "D&D 5e".to_string());
    db.create_campaign(&template)
        .await
        .expect("Failed to create template");
    template
}

pub async fn create_tenant_campaign(
    db: &Database,
    context: &TenantContext,
    name: &str,
) -> CampaignRecord {
    let campaign = CampaignRecord::new_tenant(context, name.to_string(), "D&D 5e".to_string());
    db.create_campaign(&campaign)
        .await
        .expect("Failed to create tenant campaign");
    campaign
}

// =============================================================================
// Content Row Fixtures
// =============================================================================

/// Insert a bare template row of `kind` and return its id.
pub async fn insert_entity(
    db: &Database,
    kind: EntityKind,
    template_campaign_id: &str,
    name: &str,
) -> String {
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let sql = format!(
        "INSERT INTO {} (id, template_campaign_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        kind.table()
    );
    sqlx::query(&sql)
        .bind(&id)
        .bind(template_campaign_id)
        .bind(name)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await
        .expect("Failed to insert entity");
    id
}

/// Set one column of a content row.
pub async fn set_column(db: &Database, kind: EntityKind, id: &str, column: &str, value: &str) {
    let sql = format!("UPDATE {} SET {} = ? WHERE id = ?", kind.table(), column);
    sqlx::query(&sql)
        .bind(value)
        .bind(id)
        .execute(db.pool())
        .await
        .expect("Failed to update entity");
}

pub fn join_spec(table: &str) -> &'static JoinSpec {
    JOIN_TABLES
        .iter()
        .find(|join| join.table == table)
        .expect("Unknown join table")
}

/// Insert a join row between two existing content rows.
pub async fn link(db: &Database, table: &str, left_id: &str, right_id: &str) {
    let join = join_spec(table);
    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES (?, ?)",
        join.table, join.left.column, join.right.column
    );
    sqlx::query(&sql)
        .bind(left_id)
        .bind(right_id)
        .execute(db.pool())
        .await
        .expect("Failed to insert join row");
}

pub async fn count_rows(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .expect("Failed to count rows")
}

// =============================================================================
// Seeded Template
// =============================================================================

/// Ids of a small, fully linked template
#[derive(Debug, Clone)]
pub struct SunlessMine {
    pub template: CampaignRecord,
    pub session: String,
    pub gate: String,
    pub shaft: String,
    pub cave_in: String,
    pub hale: String,
    pub tom: String,
    pub lantern: String,
    pub ambush: String,
}

impl SunlessMine {
    pub const ENTITY_COUNT: i64 = 8;
    pub const JOIN_COUNT: usize = 8;

    pub fn id(&self) -> &str {
        &self.template.id
    }
}

/// Seed a template with one row of every kind and one row in every join table
/// (two in `encounter_npcs`).
pub async fn seed_sunless_mine(db: &Database) -> SunlessMine {
    let template = create_template(db, "The Sunless Mine").await;
    let tid = template.id.clone();

    let session = insert_entity(db, EntityKind::Session, &tid, "Session One").await;
    let gate = insert_entity(db, EntityKind::Location, &tid, "Mine Gate").await;
    let shaft = insert_entity(db, EntityKind::Location, &tid, "Collapsed Shaft").await;
    let cave_in = insert_entity(db, EntityKind::Event, &tid, "Cave-In").await;
    let hale = insert_entity(db, EntityKind::Npc, &tid, "Sheriff Hale").await;
    let tom = insert_entity(db, EntityKind::Npc, &tid, "Old Tom").await;
    let lantern = insert_entity(db, EntityKind::Item, &tid, "Miner's Lantern").await;
    let ambush = insert_entity(db, EntityKind::Encounter, &tid, "Ambush at the Gate").await;

    set_column(db, EntityKind::Event, &cave_in, "session_id", &session).await;
    set_column(db, EntityKind::Encounter, &ambush, "session_id", &session).await;
    set_column(db, EntityKind::Encounter, &ambush, "location_id", &gate).await;
    set_column(db, EntityKind::Npc, &hale, "motivation", "Keep the town quiet").await;
    set_column(db, EntityKind::Item, &lantern, "rarity", "common").await;

    link(db, "encounter_npcs", &ambush, &hale).await;
    link(db, "encounter_npcs", &ambush, &tom).await;
    link(db, "encounter_items", &ambush, &lantern).await;
    link(db, "encounter_locations", &ambush, &shaft).await;
    link(db, "encounter_events", &ambush, &cave_in).await;
    link(db, "session_npcs", &session, &hale).await;
    link(db, "session_locations", &session, &gate).await;
    link(db, "location_npcs", &gate, &tom).await;

    sqlx::query("UPDATE encounter_npcs SET role = 'leader' WHERE npc_id = ?")
        .bind(&hale)
        .execute(db.pool())
        .await
        .expect("Failed to set join role");
    sqlx::query("UPDATE encounter_items SET quantity = 3, notes = 'hanging by the door'")
        .execute(db.pool())
        .await
        .expect("Failed to set join quantity");

    SunlessMine {
        template,
        session,
        gate,
        shaft,
        cave_in,
        hale,
        tom,
        lantern,
        ambush,
    }
}

// =============================================================================
// Extraction Fixtures
// =============================================================================

/// Extraction of the same adventure, with references spelled loosely.
/// Resolves into six encounter join rows.
pub fn sample_extraction() -> AdventureExtraction {
    AdventureExtraction {
        name: "The Sunless Mine".to_string(),
        description: Some("A mining town with a buried secret".to_string()),
        system: None,
        sessions: vec![ExtractedSession {
            name: "Session One".to_string(),
            session_number: Some(1),
            ..Default::default()
        }],
        events: vec![ExtractedEvent {
            name: "Cave-In".to_string(),
            session: Some("session one".to_string()),
            ..Default::default()
        }],
        npcs: vec![
            ExtractedNpc {
                name: "Sheriff Hale".to_string(),
                role: Some("lawkeeper".to_string()),
                stats: Some(serde_json::json!({ "ac": 15, "hp": 32 })),
                ..Default::default()
            },
            ExtractedNpc {
                name: "Old Tom".to_string(),
                ..Default::default()
            },
        ],
        locations: vec![
            ExtractedLocation {
                name: "Mine Gate".to_string(),
                ..Default::default()
            },
            ExtractedLocation {
                name: "Collapsed Shaft".to_string(),
                ..Default::default()
            },
        ],
        items: vec![ExtractedItem {
            name: "Miner's Lantern".to_string(),
            rarity: Some("common".to_string()),
            ..Default::default()
        }],
        encounters: vec![
            ExtractedEncounter {
                name: "Ambush at the Gate".to_string(),
                session: Some("Session One".to_string()),
                location: Some("mine gate".to_string()),
                related_npcs: vec!["sheriff hale!".to_string(), "OLD TOM".to_string()],
                related_items: vec!["Miner\u{2019}s Lantern".to_string()],
                related_locations: vec!["Collapsed Shaft".to_string()],
                related_events: vec!["Cave-In".to_string()],
                ..Default::default()
            },
            ExtractedEncounter {
                name: "Lantern Light".to_string(),
                related_items: vec!["miners lantern".to_string()],
                ..Default::default()
            },
        ],
    }
}
