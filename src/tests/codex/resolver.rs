//! Relationship Resolution Tests

use tokio_util::sync::CancellationToken;

use crate::core::codex::{CodexError, ResolveRequest};
use crate::database::{CampaignScope, Database, EntityKind, EntityOps};
use crate::tests::common::{
    codex_service, count_rows, create_template, create_test_db, insert_entity, join_spec,
    set_column,
};

fn resolve_request(template_id: &str) -> ResolveRequest {
    ResolveRequest {
        template_campaign_id: template_id.to_string(),
    }
}

async fn insert_encounter(
    db: &Database,
    template_id: &str,
    name: &str,
    references: &[(&str, &str)],
) -> String {
    let id = insert_entity(db, EntityKind::Encounter, template_id, name).await;
    for (column, json) in references {
        set_column(db, EntityKind::Encounter, &id, column, json).await;
    }
    id
}

#[tokio::test]
async fn test_resolves_names_into_join_rows() {
    let (db, _temp) = create_test_db().await;
    let template = create_template(&db, "Harbor Heist").await;
    let marta = insert_entity(&db, EntityKind::Npc, &template.id, "Marta Quill").await;
    let vault = insert_entity(&db, EntityKind::Location, &template.id, "The Vault").await;
    let key = insert_entity(&db, EntityKind::Item, &template.id, "Harbormaster's Key").await;
    let alarm = insert_entity(&db, EntityKind::Event, &template.id, "Alarm Bell").await;
    let heist = insert_encounter(
        &db,
        &template.id,
        "The Heist",
        &[
            ("related_npcs", r#"["marta  quill"]"#),
            ("related_locations", r#"["THE VAULT!"]"#),
            ("related_items", r#"["Harbormaster’s Key"]"#),
            ("related_events", r#"["alarm bell"]"#),
        ],
    )
    .await;

    let outcome = codex_service(&db)
        .resolve_encounter_relationships(resolve_request(&template.id), &CancellationToken::new())
        .await
        .expect("Resolution failed");

    assert!(outcome.success);
    assert_eq!(outcome.encounters_processed, 1);
    assert_eq!(outcome.joins_inserted, 4);

    for (table, target) in [
        ("encounter_npcs", &marta),
        ("encounter_locations", &vault),
        ("encounter_items", &key),
        ("encounter_events", &alarm),
    ] {
        let pairs = db
            .list_join_pairs(join_spec(table), CampaignScope::Template, &template.id)
            .await
            .unwrap();
        assert_eq!(pairs, vec![(heist.clone(), target.clone())], "{table}");
    }
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let (db, _temp) = create_test_db().await;
    let template = create_template(&db, "Harbor Heist").await;
    insert_entity(&db, EntityKind::Npc, &template.id, "Marta Quill").await;
    insert_encounter(&db, &template.id, "The Heist", &[("related_npcs", r#"["Marta Quill"]"#)]).await;

    let service = codex_service(&db);
    let cancel = CancellationToken::new();

    let first = service
        .resolve_encounter_relationships(resolve_request(&template.id), &cancel)
        .await
        .unwrap();
    let second = service
        .resolve_encounter_relationships(resolve_request(&template.id), &cancel)
        .await
        .unwrap();

    assert_eq!(first.joins_inserted, 1);
    assert_eq!(second.joins_inserted, 0);
    assert_eq!(second.encounters_processed, 1);
    assert_eq!(count_rows(&db, "encounter_npcs").await, 1);
}

#[tokio::test]
async fn test_encounters_without_references_are_processed() {
    let (db, _temp) = create_test_db().await;
    let template = create_template(&db, "Quiet Night").await;
    insert_encounter(&db, &template.id, "Nothing Happens", &[]).await;
    insert_encounter(&db, &template.id, "Still Nothing", &[("related_npcs", "[]"), ("related_items", "null")]).await;

    let outcome = codex_service(&db)
        .resolve_encounter_relationships(resolve_request(&template.id), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.encounters_processed, 2);
    assert_eq!(outcome.joins_inserted, 0);
}

#[tokio::test]
async fn test_unknown_name_fails_without_partial_joins() {
    let (db, _temp) = create_test_db().await;
    let template = create_template(&db, "Harbor Heist").await;
    insert_entity(&db, EntityKind::Npc, &template.id, "Marta Quill").await;
    insert_encounter(&db, &template.id, "The Heist", &[("related_npcs", r#"["Marta Quill"]"#)]).await;
    insert_encounter(&db, &template.id, "The Getaway", &[("related_npcs", r#"["Captain Vell"]"#)]).await;

    let err = codex_service(&db)
        .resolve_encounter_relationships(resolve_request(&template.id), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        CodexError::UnresolvedReference {
            source_kind,
            source_name,
            target_kind,
            name,
            ..
        } => {
            assert_eq!(source_kind, EntityKind::Encounter);
            assert_eq!(source_name, "The Getaway");
            assert_eq!(target_kind, EntityKind::Npc);
            assert_eq!(name, "Captain Vell");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(count_rows(&db, "encounter_npcs").await, 0);
}

#[tokio::test]
async fn test_ambiguous_names_fail() {
    let (db, _temp) = create_test_db().await;
    let template = create_template(&db, "Twin Trouble").await;
    insert_entity(&db, EntityKind::Npc, &template.id, "NPC: Hale").await;
    insert_entity(&db, EntityKind::Npc, &template.id, "npc hale").await;
    insert_encounter(&db, &template.id, "Double Take", &[("related_npcs", r#"["npc hale"]"#)]).await;

    let err = codex_service(&db)
        .resolve_encounter_relationships(resolve_request(&template.id), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CodexError::DuplicateName { kind: EntityKind::Npc, .. }));
    assert_eq!(count_rows(&db, "encounter_npcs").await, 0);
}

#[tokio::test]
async fn test_names_resolve_only_within_their_template() {
    let (db, _temp) = create_test_db().await;
    let heist = create_template(&db, "Harbor Heist").await;
    let abbey = create_template(&db, "Drowned Abbey").await;
    insert_entity(&db, EntityKind::Npc, &abbey.id, "Marta Quill").await;
    insert_encounter(&db, &heist.id, "The Heist", &[("related_npcs", r#"["Marta Quill"]"#)]).await;

    let err = codex_service(&db)
        .resolve_encounter_relationships(resolve_request(&heist.id), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CodexError::UnresolvedReference { .. }));

    // The same name in both templates is not ambiguous
    let local = insert_entity(&db, EntityKind::Npc, &heist.id, "Marta Quill").await;
    codex_service(&db)
        .resolve_encounter_relationships(resolve_request(&heist.id), &CancellationToken::new())
        .await
        .unwrap();
    let pairs = db
        .list_join_pairs(join_spec("encounter_npcs"), CampaignScope::Template, &heist.id)
        .await
        .unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].1, local);
}

#[tokio::test]
async fn test_malformed_reference_list_fails() {
    let (db, _temp) = create_test_db().await;
    let template = create_template(&db, "Broken").await;
    insert_encounter(&db, &template.id, "Garbled", &[("related_items", "Marta, Vell")]).await;

    let err = codex_service(&db)
        .resolve_encounter_relationships(resolve_request(&template.id), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CodexError::Serialization(_)));
}

#[tokio::test]
async fn test_resolve_requires_existing_template() {
    let (db, _temp) = create_test_db().await;
    let service = codex_service(&db);
    let cancel = CancellationToken::new();

    let err = service
        .resolve_encounter_relationships(resolve_request(""), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, CodexError::MissingParameter("templateCampaignId")));

    let err = service
        .resolve_encounter_relationships(resolve_request("no-such-template"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, CodexError::TemplateNotFound(_)));
}
