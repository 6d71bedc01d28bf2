//! Table Catalogue
//!
//! Static description of the campaign content tables: which attribute columns
//! are copied when a template is cloned, which columns point at other content
//! rows, and which join tables connect them. Nothing here is derived from row
//! contents at runtime; a column that is not listed is never copied.

use serde::{Deserialize, Serialize};

// ============================================================================
// Entity Kinds
// ============================================================================

/// Kind of campaign content row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Session,
    Event,
    Npc,
    Location,
    Item,
    Encounter,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Session,
        EntityKind::Event,
        EntityKind::Npc,
        EntityKind::Location,
        EntityKind::Item,
        EntityKind::Encounter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Session => "session",
            EntityKind::Event => "event",
            EntityKind::Npc => "npc",
            EntityKind::Location => "location",
            EntityKind::Item => "item",
            EntityKind::Encounter => "encounter",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "session" => Some(EntityKind::Session),
            "event" => Some(EntityKind::Event),
            "npc" => Some(EntityKind::Npc),
            "location" => Some(EntityKind::Location),
            "item" => Some(EntityKind::Item),
            "encounter" => Some(EntityKind::Encounter),
            _ => None,
        }
    }

    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Session => "sessions",
            EntityKind::Event => "events",
            EntityKind::Npc => "npcs",
            EntityKind::Location => "locations",
            EntityKind::Item => "items",
            EntityKind::Encounter => "encounters",
        }
    }

    pub fn definition(&self) -> &'static EntityTable {
        match self {
            EntityKind::Session => &SESSIONS,
            EntityKind::Event => &EVENTS,
            EntityKind::Npc => &NPCS,
            EntityKind::Location => &LOCATIONS,
            EntityKind::Item => &ITEMS,
            EntityKind::Encounter => &ENCOUNTERS,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entity Tables
// ============================================================================

/// Identity, ownership and timestamp columns shared by every content table.
/// These are rewritten by the cloner and must never appear on an allow-list.
pub const OWNERSHIP_COLUMNS: &[&str] = &[
    "id",
    "tenant_id",
    "campaign_id",
    "template_campaign_id",
    "created_by",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Column holding the id of another content row in the same graph
#[derive(Debug, Clone, Copy)]
pub struct ReferenceColumn {
    pub column: &'static str,
    pub target: EntityKind,
}

/// Cloning definition of one content table
#[derive(Debug, Clone, Copy)]
pub struct EntityTable {
    pub kind: EntityKind,
    /// Attribute columns copied verbatim
    pub copy_columns: &'static [&'static str],
    /// Columns rewritten through the id mapping of their target kind
    pub reference_columns: &'static [ReferenceColumn],
}

impl EntityTable {
    pub fn table(&self) -> &'static str {
        self.kind.table()
    }
}

pub static SESSIONS: EntityTable = EntityTable {
    kind: EntityKind::Session,
    copy_columns: &["name", "session_number", "summary", "notes", "status"],
    reference_columns: &[],
};

pub static LOCATIONS: EntityTable = EntityTable {
    kind: EntityKind::Location,
    copy_columns: &["name", "location_type", "description", "notes"],
    reference_columns: &[],
};

pub static EVENTS: EntityTable = EntityTable {
    kind: EntityKind::Event,
    copy_columns: &["name", "description", "event_type", "sort_order"],
    reference_columns: &[ReferenceColumn {
        column: "session_id",
        target: EntityKind::Session,
    }],
};

pub static NPCS: EntityTable = EntityTable {
    kind: EntityKind::Npc,
    copy_columns: &["name", "role", "description", "motivation", "stats_json", "notes"],
    reference_columns: &[],
};

pub static ITEMS: EntityTable = EntityTable {
    kind: EntityKind::Item,
    copy_columns: &["name", "item_type", "description", "rarity", "properties_json"],
    reference_columns: &[],
};

pub static ENCOUNTERS: EntityTable = EntityTable {
    kind: EntityKind::Encounter,
    copy_columns: &[
        "name",
        "description",
        "difficulty",
        "encounter_type",
        "related_npcs",
        "related_items",
        "related_locations",
        "related_events",
    ],
    reference_columns: &[
        ReferenceColumn {
            column: "session_id",
            target: EntityKind::Session,
        },
        ReferenceColumn {
            column: "location_id",
            target: EntityKind::Location,
        },
    ],
};

/// Order in which content tables are cloned. Reference targets come first.
pub static CLONE_ORDER: [&EntityTable; 6] =
    [&SESSIONS, &LOCATIONS, &EVENTS, &NPCS, &ITEMS, &ENCOUNTERS];

// ============================================================================
// Join Tables
// ============================================================================

/// One side of a join table
#[derive(Debug, Clone, Copy)]
pub struct JoinEndpoint {
    pub column: &'static str,
    pub kind: EntityKind,
}

/// Many-to-many join table. The endpoint pair is the natural key.
#[derive(Debug, Clone, Copy)]
pub struct JoinSpec {
    pub table: &'static str,
    pub left: JoinEndpoint,
    pub right: JoinEndpoint,
    /// Relationship metadata copied verbatim
    pub metadata_columns: &'static [&'static str],
}

impl JoinSpec {
    /// Join table backing an encounter's `related_*` list for `kind`
    pub fn for_encounter_reference(kind: EntityKind) -> Option<&'static JoinSpec> {
        JOIN_TABLES.iter().find(|spec| {
            spec.left.kind == EntityKind::Encounter && spec.right.kind == kind
        })
    }
}

pub static JOIN_TABLES: [JoinSpec; 7] = [
    JoinSpec {
        table: "encounter_npcs",
        left: JoinEndpoint { column: "encounter_id", kind: EntityKind::Encounter },
        right: JoinEndpoint { column: "npc_id", kind: EntityKind::Npc },
        metadata_columns: &["role", "notes"],
    },
    JoinSpec {
        table: "encounter_items",
        left: JoinEndpoint { column: "encounter_id", kind: EntityKind::Encounter },
        right: JoinEndpoint { column: "item_id", kind: EntityKind::Item },
        metadata_columns: &["quantity", "notes"],
    },
    JoinSpec {
        table: "encounter_locations",
        left: JoinEndpoint { column: "encounter_id", kind: EntityKind::Encounter },
        right: JoinEndpoint { column: "location_id", kind: EntityKind::Location },
        metadata_columns: &["notes"],
    },
    JoinSpec {
        table: "encounter_events",
        left: JoinEndpoint { column: "encounter_id", kind: EntityKind::Encounter },
        right: JoinEndpoint { column: "event_id", kind: EntityKind::Event },
        metadata_columns: &["notes"],
    },
    JoinSpec {
        table: "session_npcs",
        left: JoinEndpoint { column: "session_id", kind: EntityKind::Session },
        right: JoinEndpoint { column: "npc_id", kind: EntityKind::Npc },
        metadata_columns: &["notes"],
    },
    JoinSpec {
        table: "session_locations",
        left: JoinEndpoint { column: "session_id", kind: EntityKind::Session },
        right: JoinEndpoint { column: "location_id", kind: EntityKind::Location },
        metadata_columns: &["notes"],
    },
    JoinSpec {
        table: "location_npcs",
        left: JoinEndpoint { column: "location_id", kind: EntityKind::Location },
        right: JoinEndpoint { column: "npc_id", kind: EntityKind::Npc },
        metadata_columns: &["role"],
    },
];
