//! Database Migrations
//!
//! Handles schema creation and versioned migrations.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{info, warn};

/// Current database schema version
pub const SCHEMA_VERSION: i32 = 3;

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create migrations table if it doesn't exist
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#
    )
    .execute(pool)
    .await?;

    let current_version = get_current_version(pool).await?;

    info!(current_version, target_version = SCHEMA_VERSION, "Checking database migrations");

    if current_version < SCHEMA_VERSION {
        info!("Running database migrations from v{} to v{}", current_version, SCHEMA_VERSION);

        for version in (current_version + 1)..=SCHEMA_VERSION {
            run_migration(pool, version).await?;
        }

        info!("Database migrations completed successfully");
    }

    Ok(())
}

/// Get the current schema version
pub async fn get_current_version(pool: &SqlitePool) -> Result<i32, sqlx::Error> {
    let result = sqlx::query("SELECT MAX(version) as version FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(result
        .and_then(|row| row.try_get::<i32, _>("version").ok())
        .unwrap_or(0))
}

/// Run a specific migration version inside its own transaction
async fn run_migration(pool: &SqlitePool, version: i32) -> Result<(), sqlx::Error> {
    let (name, sql) = match version {
        1 => ("campaign_content", MIGRATION_V1),
        2 => ("join_tables", MIGRATION_V2),
        3 => ("template_indexes", MIGRATION_V3),
        _ => {
            warn!("Unknown migration version: {}", version);
            return Ok(());
        }
    };

    info!("Applying migration v{}: {}", version, name);

    let mut tx = pool.begin().await?;

    for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement.trim())
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(version)
        .bind(name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Migration v1: campaigns and content tables
const MIGRATION_V1: &str = r#"
-- Campaigns. Templates have neither tenant_id nor template_campaign_id.
CREATE TABLE IF NOT EXISTS campaigns (
    id TEXT PRIMARY KEY,
    tenant_id TEXT,
    template_campaign_id TEXT,
    name TEXT NOT NULL,
    system TEXT NOT NULL,
    description TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (template_campaign_id) REFERENCES campaigns(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_campaigns_tenant ON campaigns(tenant_id);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    tenant_id TEXT,
    campaign_id TEXT,
    template_campaign_id TEXT,
    created_by TEXT,
    name TEXT NOT NULL,
    session_number INTEGER,
    summary TEXT,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'planned',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE,
    FOREIGN KEY (template_campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS locations (
    id TEXT PRIMARY KEY,
    tenant_id TEXT,
    campaign_id TEXT,
    template_campaign_id TEXT,
    created_by TEXT,
    name TEXT NOT NULL,
    location_type TEXT,
    description TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE,
    FOREIGN KEY (template_campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    tenant_id TEXT,
    campaign_id TEXT,
    template_campaign_id TEXT,
    created_by TEXT,
    session_id TEXT,
    name TEXT NOT NULL,
    description TEXT,
    event_type TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE,
    FOREIGN KEY (template_campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE,
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS npcs (
    id TEXT PRIMARY KEY,
    tenant_id TEXT,
    campaign_id TEXT,
    template_campaign_id TEXT,
    created_by TEXT,
    name TEXT NOT NULL,
    role TEXT,
    description TEXT,
    motivation TEXT,
    stats_json TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE,
    FOREIGN KEY (template_campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS items (
    id TEXT PRIMARY KEY,
    tenant_id TEXT,
    campaign_id TEXT,
    template_campaign_id TEXT,
    created_by TEXT,
    name TEXT NOT NULL,
    item_type TEXT,
    description TEXT,
    rarity TEXT,
    properties_json TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE,
    FOREIGN KEY (template_campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE
);

-- related_* columns hold JSON arrays of extracted names
CREATE TABLE IF NOT EXISTS encounters (
    id TEXT PRIMARY KEY,
    tenant_id TEXT,
    campaign_id TEXT,
    template_campaign_id TEXT,
    created_by TEXT,
    session_id TEXT,
    location_id TEXT,
    name TEXT NOT NULL,
    description TEXT,
    difficulty TEXT,
    encounter_type TEXT,
    related_npcs TEXT,
    related_items TEXT,
    related_locations TEXT,
    related_events TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE,
    FOREIGN KEY (template_campaign_id) REFERENCES campaigns(id) ON DELETE CASCADE,
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE SET NULL,
    FOREIGN KEY (location_id) REFERENCES locations(id) ON DELETE SET NULL
)
"#;

/// Migration v2: many-to-many join tables keyed by their endpoint pair
const MIGRATION_V2: &str = r#"
CREATE TABLE IF NOT EXISTS encounter_npcs (
    encounter_id TEXT NOT NULL,
    npc_id TEXT NOT NULL,
    role TEXT,
    notes TEXT,
    PRIMARY KEY (encounter_id, npc_id),
    FOREIGN KEY (encounter_id) REFERENCES encounters(id) ON DELETE CASCADE,
    FOREIGN KEY (npc_id) REFERENCES npcs(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS encounter_items (
    encounter_id TEXT NOT NULL,
    item_id TEXT NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 1,
    notes TEXT,
    PRIMARY KEY (encounter_id, item_id),
    FOREIGN KEY (encounter_id) REFERENCES encounters(id) ON DELETE CASCADE,
    FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS encounter_locations (
    encounter_id TEXT NOT NULL,
    location_id TEXT NOT NULL,
    notes TEXT,
    PRIMARY KEY (encounter_id, location_id),
    FOREIGN KEY (encounter_id) REFERENCES encounters(id) ON DELETE CASCADE,
    FOREIGN KEY (location_id) REFERENCES locations(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS encounter_events (
    encounter_id TEXT NOT NULL,
    event_id TEXT NOT NULL,
    notes TEXT,
    PRIMARY KEY (encounter_id, event_id),
    FOREIGN KEY (encounter_id) REFERENCES encounters(id) ON DELETE CASCADE,
    FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS session_npcs (
    session_id TEXT NOT NULL,
    npc_id TEXT NOT NULL,
    notes TEXT,
    PRIMARY KEY (session_id, npc_id),
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE,
    FOREIGN KEY (npc_id) REFERENCES npcs(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS session_locations (
    session_id TEXT NOT NULL,
    location_id TEXT NOT NULL,
    notes TEXT,
    PRIMARY KEY (session_id, location_id),
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE,
    FOREIGN KEY (location_id) REFERENCES locations(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS location_npcs (
    location_id TEXT NOT NULL,
    npc_id TEXT NOT NULL,
    role TEXT,
    PRIMARY KEY (location_id, npc_id),
    FOREIGN KEY (location_id) REFERENCES locations(id) ON DELETE CASCADE,
    FOREIGN KEY (npc_id) REFERENCES npcs(id) ON DELETE CASCADE
)
"#;

/// Migration v3: lookups by template and by destination campaign
const MIGRATION_V3: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sessions_template ON sessions(template_campaign_id);
CREATE INDEX IF NOT EXISTS idx_sessions_campaign ON sessions(campaign_id);
CREATE INDEX IF NOT EXISTS idx_locations_template ON locations(template_campaign_id);
CREATE INDEX IF NOT EXISTS idx_locations_campaign ON locations(campaign_id);
CREATE INDEX IF NOT EXISTS idx_events_template ON events(template_campaign_id);
CREATE INDEX IF NOT EXISTS idx_events_campaign ON events(campaign_id);
CREATE INDEX IF NOT EXISTS idx_npcs_template ON npcs(template_campaign_id);
CREATE INDEX IF NOT EXISTS idx_npcs_campaign ON npcs(campaign_id);
CREATE INDEX IF NOT EXISTS idx_items_template ON items(template_campaign_id);
CREATE INDEX IF NOT EXISTS idx_items_campaign ON items(campaign_id);
CREATE INDEX IF NOT EXISTS idx_encounters_template ON encounters(template_campaign_id);
CREATE INDEX IF NOT EXISTS idx_encounters_campaign ON encounters(campaign_id);
CREATE INDEX IF NOT EXISTS idx_encounter_npcs_npc ON encounter_npcs(npc_id);
CREATE INDEX IF NOT EXISTS idx_encounter_items_item ON encounter_items(item_id);
CREATE INDEX IF NOT EXISTS idx_encounter_locations_location ON encounter_locations(location_id);
CREATE INDEX IF NOT EXISTS idx_encounter_events_event ON encounter_events(event_id);
CREATE INDEX IF NOT EXISTS idx_session_npcs_npc ON session_npcs(npc_id);
CREATE INDEX IF NOT EXISTS idx_session_locations_location ON session_locations(location_id);
CREATE INDEX IF NOT EXISTS idx_location_npcs_npc ON location_npcs(npc_id)
"#;
