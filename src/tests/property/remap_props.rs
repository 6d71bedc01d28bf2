//! Property-based tests for the id remapper
//!
//! Tests invariants:
//! - Every recorded id maps forward and back
//! - Kinds never share mappings

use std::collections::HashSet;

use proptest::prelude::*;

use crate::core::codex::IdRemapper;
use crate::database::EntityKind;

fn arb_ids() -> impl Strategy<Value = HashSet<String>> {
    prop::collection::hash_set("[a-z0-9]{1,12}", 0..50)
}

proptest! {
    #[test]
    fn recorded_ids_round_trip(ids in arb_ids()) {
        let mut remapper = IdRemapper::new();
        for id in &ids {
            remapper.record(EntityKind::Npc, id.clone(), format!("new-{id}"));
        }

        prop_assert_eq!(remapper.len(EntityKind::Npc), ids.len());
        for id in &ids {
            let expected = format!("new-{id}");
            prop_assert_eq!(remapper.get(EntityKind::Npc, id), Some(expected.as_str()));
            prop_assert_eq!(remapper.original(EntityKind::Npc, &expected), Some(id.as_str()));
        }
    }

    #[test]
    fn kinds_are_isolated(ids in arb_ids()) {
        let mut remapper = IdRemapper::new();
        for id in &ids {
            remapper.record(EntityKind::Item, id.clone(), format!("item-{id}"));
        }

        for id in &ids {
            prop_assert_eq!(remapper.get(EntityKind::Npc, id), None);
        }
        let counts = remapper.counts();
        prop_assert_eq!(counts[&EntityKind::Item], ids.len());
        prop_assert_eq!(counts[&EntityKind::Npc], 0);
    }
}
