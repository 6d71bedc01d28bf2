//! Template graph cloning.
//!
//! Copies every content row of a template campaign into a tenant campaign,
//! then re-creates the template's join rows between the copies. Both phases
//! run on one connection (the caller's transaction); all entity tables are
//! finished before the first join table is touched, since a join needs the
//! mappings of both of its endpoint tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CodexError, CodexResult, IdRemapper};
use crate::database::{EntityKind, EntityTable, JoinSpec, CLONE_ORDER, JOIN_TABLES};

/// Source template and destination ownership for one clone
#[derive(Debug, Clone, Copy)]
pub struct CloneScope<'a> {
    pub template_campaign_id: &'a str,
    pub destination_campaign_id: &'a str,
    pub tenant_id: &'a str,
    pub actor_id: &'a str,
}

/// Result of cloning one join table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinCloneStats {
    pub inserted: usize,
    /// Candidates with an endpoint that has no mapping
    pub skipped: usize,
    /// Pairs already present in the destination
    pub duplicates: usize,
}

impl JoinCloneStats {
    fn absorb(&mut self, other: JoinCloneStats) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
        self.duplicates += other.duplicates;
    }
}

/// Result of cloning a whole template graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloneStats {
    pub entities: BTreeMap<EntityKind, usize>,
    pub joins: JoinCloneStats,
}

/// Clone every content table, then every join table, of the template.
pub async fn clone_campaign_graph(
    conn: &mut SqliteConnection,
    scope: &CloneScope<'_>,
    cancel: &CancellationToken,
) -> CodexResult<CloneStats> {
    let mut remapper = IdRemapper::new();

    for table in CLONE_ORDER.iter() {
        clone_table(conn, table, scope, &mut remapper, cancel).await?;
    }

    let mut joins = JoinCloneStats::default();
    for join in JOIN_TABLES.iter() {
        let stats = clone_joins(conn, join, scope.template_campaign_id, &remapper, cancel).await?;
        joins.absorb(stats);
    }

    Ok(CloneStats {
        entities: remapper.counts(),
        joins,
    })
}

// ============================================================================
// Entity Table Cloner
// ============================================================================

/// Copy every live template row of `table` into the destination campaign,
/// recording each old → new id in `remapper`. Returns the number of rows.
pub async fn clone_table(
    conn: &mut SqliteConnection,
    table: &EntityTable,
    scope: &CloneScope<'_>,
    remapper: &mut IdRemapper,
    cancel: &CancellationToken,
) -> CodexResult<usize> {
    if cancel.is_cancelled() {
        return Err(CodexError::Cancelled);
    }

    let rows = sqlx::query(&select_template_rows_sql(table))
        .bind(scope.template_campaign_id)
        .fetch_all(&mut *conn)
        .await?;

    let insert_sql = insert_clone_sql(table);
    let now = chrono::Utc::now().to_rfc3339();

    for row in &rows {
        if cancel.is_cancelled() {
            return Err(CodexError::Cancelled);
        }

        let old_id: String = row.try_get("id")?;
        let new_id = Uuid::new_v4().to_string();

        let mut query = sqlx::query(&insert_sql)
            .bind(&new_id)
            .bind(scope.tenant_id)
            .bind(scope.destination_campaign_id)
            .bind(scope.actor_id)
            .bind(&now)
            .bind(&now);

        for reference in table.reference_columns {
            let source: Option<String> = row.try_get(reference.column)?;
            let mapped = source.as_deref().and_then(|id| {
                let mapped = remapper.get(reference.target, id);
                if mapped.is_none() {
                    warn!(
                        table = table.table(),
                        column = reference.column,
                        row_id = %old_id,
                        target_id = id,
                        "Reference outside the cloned graph, clearing"
                    );
                }
                mapped.map(str::to_owned)
            });
            query = query.bind(mapped);
        }

        query.bind(&old_id).execute(&mut *conn).await?;
        remapper.record(table.kind, old_id, new_id);
    }

    debug!(table = table.table(), rows = rows.len(), "Cloned entity table");
    Ok(rows.len())
}

fn select_template_rows_sql(table: &EntityTable) -> String {
    let mut columns = vec!["id"];
    columns.extend(table.reference_columns.iter().map(|r| r.column));
    format!(
        "SELECT {} FROM {} WHERE template_campaign_id = ? AND deleted_at IS NULL ORDER BY created_at, id",
        columns.join(", "),
        table.table()
    )
}

/// `INSERT … SELECT` copying the allow-listed columns of one source row.
///
/// Bind order: new id, tenant, campaign, actor, created_at, updated_at,
/// one value per reference column, source id.
pub(crate) fn insert_clone_sql(table: &EntityTable) -> String {
    let mut targets = vec![
        "id",
        "tenant_id",
        "campaign_id",
        "template_campaign_id",
        "created_by",
        "created_at",
        "updated_at",
    ];
    let mut values = vec!["?", "?", "?", "NULL", "?", "?", "?"];

    for reference in table.reference_columns {
        targets.push(reference.column);
        values.push("?");
    }
    for column in table.copy_columns {
        targets.push(*column);
        values.push(*column);
    }

    format!(
        "INSERT INTO {table} ({targets}) SELECT {values} FROM {table} WHERE id = ?",
        table = table.table(),
        targets = targets.join(", "),
        values = values.join(", "),
    )
}

// ============================================================================
// Join Table Cloner
// ============================================================================

/// Re-create the template's rows of `join` between cloned endpoints.
///
/// Candidates are join rows whose both endpoints belong to the template. A
/// candidate with an endpoint missing from `remapper` is skipped, and a pair
/// already present in the destination is left as is.
pub async fn clone_joins(
    conn: &mut SqliteConnection,
    join: &JoinSpec,
    template_campaign_id: &str,
    remapper: &IdRemapper,
    cancel: &CancellationToken,
) -> CodexResult<JoinCloneStats> {
    if cancel.is_cancelled() {
        return Err(CodexError::Cancelled);
    }

    let candidates = sqlx::query_as::<_, (String, String)>(&select_template_joins_sql(join))
        .bind(template_campaign_id)
        .fetch_all(&mut *conn)
        .await?;

    let insert_sql = insert_join_sql(join);
    let mut stats = JoinCloneStats::default();

    for (left_id, right_id) in &candidates {
        if cancel.is_cancelled() {
            return Err(CodexError::Cancelled);
        }

        let (Some(new_left), Some(new_right)) = (
            remapper.get(join.left.kind, left_id),
            remapper.get(join.right.kind, right_id),
        ) else {
            stats.skipped += 1;
            continue;
        };

        let result = sqlx::query(&insert_sql)
            .bind(new_left)
            .bind(new_right)
            .bind(left_id)
            .bind(right_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            stats.duplicates += 1;
        } else {
            stats.inserted += 1;
        }
    }

    if stats.skipped > 0 {
        warn!(
            table = join.table,
            skipped = stats.skipped,
            "Skipped join rows with unmapped endpoints"
        );
    }
    debug!(
        table = join.table,
        inserted = stats.inserted,
        duplicates = stats.duplicates,
        "Cloned join table"
    );
    Ok(stats)
}

fn select_template_joins_sql(join: &JoinSpec) -> String {
    format!(
        r#"
        SELECT j.{left} AS left_id, j.{right} AS right_id
        FROM {table} j
        JOIN {left_table} l ON l.id = j.{left}
        JOIN {right_table} r ON r.id = j.{right}
        WHERE l.template_campaign_id = ?1 AND r.template_campaign_id = ?1
        ORDER BY left_id, right_id
        "#,
        table = join.table,
        left = join.left.column,
        right = join.right.column,
        left_table = join.left.kind.table(),
        right_table = join.right.kind.table(),
    )
}

/// Bind order: new left, new right, source left, source right.
fn insert_join_sql(join: &JoinSpec) -> String {
    let mut targets = vec![join.left.column, join.right.column];
    let mut values = vec!["?", "?"];
    for column in join.metadata_columns {
        targets.push(*column);
        values.push(*column);
    }

    format!(
        r#"
        INSERT INTO {table} ({targets})
        SELECT {values} FROM {table} WHERE {left} = ? AND {right} = ?
        ON CONFLICT({left}, {right}) DO NOTHING
        "#,
        table = join.table,
        targets = targets.join(", "),
        values = values.join(", "),
        left = join.left.column,
        right = join.right.column,
    )
}
