//! Import and Ingest Tests
//!
//! The extractor is mocked; everything after it runs against a real database.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::codex::extraction::MockCodexExtractor;
use crate::core::codex::{CodexError, CodexOptions, CodexService};
use crate::database::{CampaignOps, CampaignScope, EntityKind, EntityOps};
use crate::tests::common::{codex_service, count_rows, create_test_db, sample_extraction};

fn extractor_returning(
    result: fn() -> Result<crate::core::codex::AdventureExtraction, CodexError>,
) -> MockCodexExtractor {
    let mut extractor = MockCodexExtractor::new();
    extractor
        .expect_extract()
        .times(1)
        .returning(move |_| result());
    extractor
}

#[tokio::test]
async fn test_import_writes_template_rows() {
    let (db, _temp) = create_test_db().await;

    let summary = codex_service(&db)
        .import_template(&sample_extraction())
        .await
        .expect("Import failed");

    let template = db
        .get_campaign(&summary.template_campaign_id)
        .await
        .unwrap()
        .expect("template not stored");
    assert!(template.is_template());
    assert_eq!(template.system, "Unknown");
    assert_eq!(summary.counts[&EntityKind::Npc], 2);
    assert_eq!(summary.counts[&EntityKind::Encounter], 2);

    let count = db
        .count_entities(EntityKind::Location, CampaignScope::Template, &template.id)
        .await
        .unwrap();
    assert_eq!(count, 2);

    // Import alone creates no join rows
    assert_eq!(count_rows(&db, "encounter_npcs").await, 0);
}

#[tokio::test]
async fn test_import_links_sessions_and_locations_by_name() {
    let (db, _temp) = create_test_db().await;
    let summary = codex_service(&db)
        .import_template(&sample_extraction())
        .await
        .unwrap();

    let (session_id, location_id): (Option<String>, Option<String>) = sqlx::query_as(
        "SELECT session_id, location_id FROM encounters WHERE template_campaign_id = ? AND name = 'Ambush at the Gate'",
    )
    .bind(&summary.template_campaign_id)
    .fetch_one(db.pool())
    .await
    .unwrap();

    let session: String = sqlx::query_scalar("SELECT name FROM sessions WHERE id = ?")
        .bind(session_id.expect("session not linked"))
        .fetch_one(db.pool())
        .await
        .unwrap();
    let location: String = sqlx::query_scalar("SELECT name FROM locations WHERE id = ?")
        .bind(location_id.expect("location not linked"))
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(session, "Session One");
    assert_eq!(location, "Mine Gate");

    let stats: Option<String> =
        sqlx::query_scalar("SELECT stats_json FROM npcs WHERE name = 'Sheriff Hale'")
            .fetch_one(db.pool())
            .await
            .unwrap();
    let stats: serde_json::Value = serde_json::from_str(&stats.unwrap()).unwrap();
    assert_eq!(stats["hp"], 32);
}

#[tokio::test]
async fn test_import_with_unknown_session_stores_nothing() {
    let (db, _temp) = create_test_db().await;
    let mut extraction = sample_extraction();
    extraction.events[0].session = Some("Session Nine".to_string());

    let err = codex_service(&db)
        .import_template(&extraction)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CodexError::UnresolvedReference { target_kind: EntityKind::Session, .. }
    ));
    assert!(db.list_templates().await.unwrap().is_empty());
    assert_eq!(count_rows(&db, "npcs").await, 0);
}

#[tokio::test]
async fn test_ingest_imports_and_resolves() {
    let (db, _temp) = create_test_db().await;
    let extractor = extractor_returning(|| Ok(sample_extraction()));

    let outcome = codex_service(&db)
        .ingest(&extractor, "raw adventure text", &CancellationToken::new())
        .await
        .expect("Ingest failed");

    let resolution = outcome.resolution.expect("resolution skipped");
    assert_eq!(resolution.encounters_processed, 2);
    assert_eq!(resolution.joins_inserted, 6);

    let template_id = &outcome.import.template_campaign_id;
    let item_links = db
        .list_join_pairs(
            crate::tests::common::join_spec("encounter_items"),
            CampaignScope::Template,
            template_id,
        )
        .await
        .unwrap();
    assert_eq!(item_links.len(), 2);
}

#[tokio::test]
async fn test_ingest_can_skip_resolution() {
    let (db, _temp) = create_test_db().await;
    let service = CodexService::new(
        Arc::new(db.pool().clone()),
        CodexOptions {
            default_system: "Mothership".to_string(),
            resolve_on_import: false,
        },
    );
    let extractor = extractor_returning(|| Ok(sample_extraction()));

    let outcome = service
        .ingest(&extractor, "raw adventure text", &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.resolution.is_none());
    assert_eq!(count_rows(&db, "encounter_npcs").await, 0);

    let template = db
        .get_campaign(&outcome.import.template_campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(template.system, "Mothership");
}

#[tokio::test]
async fn test_failed_resolution_rolls_back_import() {
    let (db, _temp) = create_test_db().await;
    let extractor = extractor_returning(|| {
        let mut extraction = sample_extraction();
        extraction.encounters[1].related_npcs = vec!["Deputy Marsh".to_string()];
        Ok(extraction)
    });

    let err = codex_service(&db)
        .ingest(&extractor, "raw adventure text", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CodexError::UnresolvedReference { .. }));
    assert!(db.list_templates().await.unwrap().is_empty());
    assert_eq!(count_rows(&db, "encounters").await, 0);
}

#[tokio::test]
async fn test_extractor_failure_is_propagated() {
    let (db, _temp) = create_test_db().await;
    let extractor =
        extractor_returning(|| Err(CodexError::Extraction("model refused".to_string())));

    let err = codex_service(&db)
        .ingest(&extractor, "raw adventure text", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CodexError::Extraction(message) if message == "model refused"));
    assert!(db.list_templates().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_ingest_stores_nothing() {
    let (db, _temp) = create_test_db().await;
    let extractor = extractor_returning(|| Ok(sample_extraction()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = codex_service(&db)
        .ingest(&extractor, "raw adventure text", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, CodexError::Cancelled));
    assert!(db.list_templates().await.unwrap().is_empty());
}
